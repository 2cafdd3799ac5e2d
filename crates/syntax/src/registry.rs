use rustc_hash::FxHashMap;

/// How a declared code-block language should be highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
	/// No highlighting (missing language or an explicit plain-text name).
	Plain,
	/// Highlight with the given canonical language id.
	Language(String),
}

/// Resolves user-declared language names to canonical engine ids.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
	aliases: FxHashMap<String, String>,
	plain: Vec<String>,
}

const DEFAULT_ALIASES: &[(&str, &str)] = &[
	("js", "javascript"),
	("jsx", "javascript"),
	("mjs", "javascript"),
	("node", "javascript"),
	("ts", "typescript"),
	("tsx", "typescript"),
	("py", "python"),
	("python3", "python"),
	("sh", "bash"),
	("shell", "bash"),
	("zsh", "bash"),
	("console", "bash"),
	("rs", "rust"),
	("yml", "yaml"),
	("md", "markdown"),
	("jsonc", "json"),
];

const DEFAULT_PLAIN: &[&str] = &["none", "text", "plaintext", "plain", "txt"];

impl Default for LanguageRegistry {
	fn default() -> Self {
		Self {
			aliases: DEFAULT_ALIASES
				.iter()
				.map(|(alias, id)| (alias.to_string(), id.to_string()))
				.collect(),
			plain: DEFAULT_PLAIN.iter().map(|s| s.to_string()).collect(),
		}
	}
}

impl LanguageRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces an alias.
	pub fn with_alias(mut self, alias: &str, id: &str) -> Self {
		self.aliases.insert(alias.to_ascii_lowercase(), id.to_ascii_lowercase());
		self
	}

	/// Resolves a declared language, case-insensitively.
	pub fn resolve(&self, declared: Option<&str>) -> Resolution {
		let Some(name) = declared.map(|s| s.trim().to_ascii_lowercase()) else {
			return Resolution::Plain;
		};
		if name.is_empty() || self.plain.contains(&name) {
			return Resolution::Plain;
		}
		match self.aliases.get(&name) {
			Some(id) => Resolution::Language(id.clone()),
			None => Resolution::Language(name),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aliases_and_plain_names() {
		let registry = LanguageRegistry::new();
		assert_eq!(registry.resolve(Some("JS")), Resolution::Language("javascript".into()));
		assert_eq!(registry.resolve(Some("sh")), Resolution::Language("bash".into()));
		assert_eq!(registry.resolve(Some("haskell")), Resolution::Language("haskell".into()));
		assert_eq!(registry.resolve(Some("plaintext")), Resolution::Plain);
		assert_eq!(registry.resolve(Some("  ")), Resolution::Plain);
		assert_eq!(registry.resolve(None), Resolution::Plain);
	}

	#[test]
	fn custom_alias() {
		let registry = LanguageRegistry::new().with_alias("Zig0", "zig");
		assert_eq!(registry.resolve(Some("zig0")), Resolution::Language("zig".into()));
	}
}
