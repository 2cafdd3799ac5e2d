//! A small regex-rule highlighter.
//!
//! Each grammar is a flat list of rules, optionally with nested rules applied
//! inside a match (escapes inside strings, variables inside shell strings).
//! Grammars are compiled on [`HighlightEngine::load_language`], not up front.

mod grammars;


use std::sync::{Arc, OnceLock};

use folio_primitives::BoxFutureStatic;
use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;

pub use self::grammars::RuleDef;
use crate::{HighlightEngine, HighlightError, TokenTree};

struct Rule {
	class: &'static str,
	regex: Regex,
	inner: Vec<Rule>,
}

/// A compiled grammar.
struct Grammar {
	rules: Vec<Rule>,
}

impl Grammar {
	fn compile(language: &str, defs: &[RuleDef]) -> Result<Grammar, HighlightError> {
		Ok(Grammar {
			rules: compile_rules(language, defs)?,
		})
	}
}

fn compile_rules(language: &str, defs: &[RuleDef]) -> Result<Vec<Rule>, HighlightError> {
	defs.iter()
		.map(|def| {
			let regex = Regex::new(def.pattern).map_err(|e| HighlightError::Pattern {
				language: language.to_string(),
				message: e.to_string(),
			})?;
			Ok(Rule {
				class: def.class,
				regex,
				inner: compile_rules(language, def.inner)?,
			})
		})
		.collect()
}

/// Regex-rule highlighting engine with lazily compiled grammars.
#[derive(Clone)]
pub struct RuleEngine {
	definitions: Arc<FxHashMap<String, &'static [RuleDef]>>,
	loaded: Arc<RwLock<FxHashMap<String, Arc<Grammar>>>>,
}

impl Default for RuleEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for RuleEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut languages: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
		languages.sort_unstable();
		f.debug_struct("RuleEngine").field("languages", &languages).finish()
	}
}

impl RuleEngine {
	/// Creates an engine knowing the built-in grammars, none of them loaded.
	pub fn new() -> Self {
		Self::with_grammars(grammars::BUILTIN.iter().copied())
	}

	/// Returns the process-wide engine over the built-in grammars.
	///
	/// Clones share loaded grammars, so a language loaded through one editor
	/// is loaded for all of them.
	pub fn shared() -> Self {
		static SHARED: OnceLock<RuleEngine> = OnceLock::new();
		SHARED.get_or_init(RuleEngine::new).clone()
	}

	/// Creates an engine knowing exactly the given grammars.
	pub fn with_grammars(grammars: impl IntoIterator<Item = (&'static str, &'static [RuleDef])>) -> Self {
		Self {
			definitions: Arc::new(grammars.into_iter().map(|(id, defs)| (id.to_string(), defs)).collect()),
			loaded: Arc::default(),
		}
	}

	/// Canonical ids of every grammar this engine can load, sorted.
	pub fn languages(&self) -> Vec<&str> {
		let mut languages: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
		languages.sort_unstable();
		languages
	}

	fn grammar(&self, language: &str) -> Result<Arc<Grammar>, HighlightError> {
		if let Some(grammar) = self.loaded.read().get(language) {
			return Ok(Arc::clone(grammar));
		}
		if self.supports_language(language) {
			Err(HighlightError::NotLoaded(language.to_string()))
		} else {
			Err(HighlightError::UnknownLanguage(language.to_string()))
		}
	}
}

impl HighlightEngine for RuleEngine {
	fn supports_language(&self, language: &str) -> bool {
		self.definitions.contains_key(language)
	}

	fn is_language_loaded(&self, language: &str) -> bool {
		self.loaded.read().contains_key(language)
	}

	fn load_language(&self, language: &str) -> BoxFutureStatic<Result<(), HighlightError>> {
		let language = language.to_string();
		let definition = self.definitions.get(&language).copied();
		let loaded = Arc::clone(&self.loaded);
		Box::pin(async move {
			let defs = definition.ok_or_else(|| HighlightError::UnknownLanguage(language.clone()))?;
			if loaded.read().contains_key(&language) {
				return Ok(());
			}
			let grammar = Grammar::compile(&language, defs)?;
			tracing::debug!(%language, rules = grammar.rules.len(), "grammar loaded");
			loaded.write().insert(language, Arc::new(grammar));
			Ok(())
		})
	}

	fn highlight(&self, text: &str, language: &str) -> Result<Vec<TokenTree>, HighlightError> {
		let grammar = self.grammar(language)?;
		Ok(tokenize(text, &grammar.rules))
	}
}

/// Splits `text` into plain runs and classed scopes.
fn tokenize(text: &str, rules: &[Rule]) -> Vec<TokenTree> {
	let mut out = Vec::new();
	let mut pos = 0;
	while pos < text.len() {
		let mut best: Option<(usize, usize, &Rule)> = None;
		for rule in rules {
			let Some(m) = rule.regex.find_at(text, pos) else {
				continue;
			};
			if m.is_empty() {
				continue;
			}
			if best.is_none_or(|(start, _, _)| m.start() < start) {
				best = Some((m.start(), m.end(), rule));
			}
		}
		let Some((start, end, rule)) = best else {
			break;
		};
		if start > pos {
			out.push(TokenTree::Text(text[pos..start].to_string()));
		}
		let matched = &text[start..end];
		let children = if rule.inner.is_empty() {
			vec![TokenTree::Text(matched.to_string())]
		} else {
			tokenize(matched, &rule.inner)
		};
		out.push(TokenTree::Scope {
			classes: vec![rule.class.to_string()],
			children,
		});
		pos = end;
	}
	if pos < text.len() {
		out.push(TokenTree::Text(text[pos..].to_string()));
	}
	out
}
