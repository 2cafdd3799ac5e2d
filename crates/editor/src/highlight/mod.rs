//! Code-block syntax highlighting.
//!
//! State is an arena of per-block entries keyed by the block's position at
//! the last recompute. Keys only ever move through a transaction's mapping.
//! An entry is reused while its snapshot node is structurally equal to the
//! block at the same position, so a keystroke in one block never
//! re-highlights another.


use std::sync::Arc;

use folio_primitives::{AppliedTransaction, Bias, Document, Mapping, Node, NodeType, Signal};
use folio_syntax::{HighlightEngine, LanguageRegistry, PendingLanguages, Resolution, flatten, line_gutter};
use rustc_hash::FxHashMap;

use crate::decoration::{Decoration, Widget};
use crate::error::ProviderError;
use crate::provider::{DecorationProvider, ProviderKind, Recompute, plan_recompute};

/// Highlighting collaborators shared with the engine.
#[derive(Clone)]
pub struct HighlightServices {
	pub engine: Arc<dyn HighlightEngine>,
	pub registry: LanguageRegistry,
	/// Grammar loads in flight, shared by every editor using the engine.
	pub pending: PendingLanguages,
}

impl HighlightServices {
	/// Services using the process-wide pending set.
	pub fn new(engine: Arc<dyn HighlightEngine>) -> Self {
		Self {
			engine,
			registry: LanguageRegistry::new(),
			pending: PendingLanguages::global(),
		}
	}

	pub fn with_registry(mut self, registry: LanguageRegistry) -> Self {
		self.registry = registry;
		self
	}

	pub fn with_pending(mut self, pending: PendingLanguages) -> Self {
		self.pending = pending;
		self
	}
}

/// Decorations derived for one code block, relative to its content start.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HighlightEntry {
	node: Node,
	decorations: Vec<Decoration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightState {
	entries: FxHashMap<usize, HighlightEntry>,
	/// Unloaded languages met by the last update, each listed once.
	load_requests: Vec<String>,
}

impl HighlightState {
	/// Number of blocks with derived decorations.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Whether the block at `pos` has an entry.
	pub fn contains(&self, pos: usize) -> bool {
		self.entries.contains_key(&pos)
	}

	pub fn load_requests(&self) -> &[String] {
		&self.load_requests
	}

	pub fn take_load_requests(&mut self) -> Vec<String> {
		std::mem::take(&mut self.load_requests)
	}
}

/// Syntax highlight provider.
pub struct HighlightProvider {
	services: HighlightServices,
	line_numbers: bool,
}

impl HighlightProvider {
	pub fn new(services: HighlightServices, line_numbers: bool) -> Self {
		Self { services, line_numbers }
	}

	pub fn services(&self) -> &HighlightServices {
		&self.services
	}

	/// Recomputes every code block of `doc`, reusing `cached` entries whose
	/// snapshot still matches.
	fn recompute(&self, doc: &Document, mut cached: FxHashMap<usize, HighlightEntry>) -> HighlightState {
		let mut state = HighlightState::default();
		let mut reused = 0usize;
		for (pos, node) in doc.find_all(NodeType::CodeBlock) {
			if let Some(entry) = cached.remove(&pos).filter(|entry| entry.node == node) {
				reused += 1;
				state.entries.insert(pos, entry);
				continue;
			}
			if let Some(entry) = self.compute(node, &mut state.load_requests) {
				state.entries.insert(pos, entry);
			}
		}
		if !cached.is_empty() {
			tracing::debug!(pruned = cached.len(), "highlight.prune");
		}
		tracing::trace!(blocks = state.entries.len(), reused, "highlight.recompute");
		state
	}

	fn compute(&self, node: Node, load_requests: &mut Vec<String>) -> Option<HighlightEntry> {
		let text = node.text_content();
		let mut decorations = Vec::new();
		if self.line_numbers {
			let gutter = line_gutter(&text);
			decorations.push(Decoration::widget(
				ProviderKind::Highlight,
				0,
				Widget::LineNumbers {
					width: gutter.width,
					labels: gutter.labels,
				},
			));
		}

		let engine = &self.services.engine;
		match self.services.registry.resolve(node.language()) {
			Resolution::Plain => {}
			Resolution::Language(language) if !engine.supports_language(&language) => {
				tracing::trace!(%language, "highlight.unsupported_language");
			}
			Resolution::Language(language) if !engine.is_language_loaded(&language) => {
				if !load_requests.contains(&language) {
					load_requests.push(language);
				}
				return None;
			}
			Resolution::Language(language) => match engine.highlight(&text, &language) {
				Ok(tokens) => decorations.extend(flatten(&tokens).into_iter().map(|span| {
					Decoration::inline(ProviderKind::Highlight, span.from, span.to, span.classes.join(" "))
				})),
				Err(error) => tracing::warn!(%language, %error, "highlight.failed"),
			},
		}
		Some(HighlightEntry { node, decorations })
	}
}

/// Moves entry keys through `mapping`.
///
/// With `strict`, a key that cannot be mapped is an error; otherwise it is
/// dropped along with keys whose block was deleted.
fn remap(
	entries: &FxHashMap<usize, HighlightEntry>,
	mapping: &Mapping,
	strict: bool,
) -> Result<FxHashMap<usize, HighlightEntry>, ProviderError> {
	let mut out = FxHashMap::default();
	for (pos, entry) in entries {
		if *pos > mapping.old_size() {
			if strict {
				return Err(ProviderError::LostPosition {
					provider: ProviderKind::Highlight,
					pos: *pos,
				});
			}
			continue;
		}
		let mapped = mapping.map_result(*pos, Bias::Right);
		if mapped.deleted && !strict {
			continue;
		}
		out.insert(mapped.pos, entry.clone());
	}
	Ok(out)
}

impl DecorationProvider for HighlightProvider {
	type State = HighlightState;

	const KIND: ProviderKind = ProviderKind::Highlight;

	fn init(&self, doc: &Document) -> Result<HighlightState, ProviderError> {
		Ok(self.recompute(doc, FxHashMap::default()))
	}

	fn apply(&self, state: &HighlightState, tx: &AppliedTransaction) -> Result<HighlightState, ProviderError> {
		let loaded = tx.signals().any(|s| matches!(s, Signal::LanguageLoaded(_)));
		match plan_recompute(Self::KIND, tx, |node| node.kind().is_code(), loaded) {
			Recompute::Full(_) => {
				let cached = remap(&state.entries, &tx.mapping, false)?;
				Ok(self.recompute(&tx.doc, cached))
			}
			Recompute::Remap => Ok(HighlightState {
				entries: remap(&state.entries, &tx.mapping, true)?,
				load_requests: Vec::new(),
			}),
		}
	}

	fn decorate(&self, state: &HighlightState, _doc: &Document) -> Result<Vec<Decoration>, ProviderError> {
		let mut positions: Vec<usize> = state.entries.keys().copied().collect();
		positions.sort_unstable();
		Ok(positions
			.into_iter()
			.filter_map(|pos| state.entries.get(&pos).map(|entry| (pos, entry)))
			.flat_map(|(pos, entry)| entry.decorations.iter().cloned().map(move |d| d.shifted(pos + 1)))
			.collect())
	}
}
