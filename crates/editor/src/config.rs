//! Editor configuration loaded from TOML.
//!
//! Every section and field is optional; missing values take the defaults
//! below.
//!
//! ```toml
//! [highlight]
//! line_numbers = true
//!
//! [diagram]
//! languages = ["mermaid", "mermaidjs"]
//! debounce_ms = 500
//! theme = "light"
//!
//! [paste]
//! markdown_threshold = 0.05
//! slice_marker = "data-folio-slice"
//!
//! [fold]
//! scope = "default"
//! store_path = "folds.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_primitives::DiagramTheme;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Hosts recognised by the default embed matcher.
pub const DEFAULT_EMBED_HOSTS: &[&str] = &[
	"youtube.com",
	"youtu.be",
	"vimeo.com",
	"loom.com",
	"figma.com",
	"codepen.io",
	"twitter.com",
	"x.com",
	"gist.github.com",
];

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
	pub highlight: HighlightConfig,
	pub diagram: DiagramConfig,
	pub paste: PasteConfig,
	pub fold: FoldConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightConfig {
	/// Emit a line-number gutter for every code block.
	pub line_numbers: bool,
}

impl Default for HighlightConfig {
	fn default() -> Self {
		Self { line_numbers: true }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagramConfig {
	/// Code-block languages rendered as diagrams, compared case-insensitively.
	pub languages: Vec<String>,
	/// Quiet period after the last edit before a render starts.
	pub debounce_ms: u64,
	pub theme: DiagramTheme,
}

impl Default for DiagramConfig {
	fn default() -> Self {
		Self {
			languages: vec!["mermaid".into(), "mermaidjs".into()],
			debounce_ms: 500,
			theme: DiagramTheme::Light,
		}
	}
}

impl DiagramConfig {
	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasteConfig {
	/// Markdown score above which plain text is parsed as markdown.
	pub markdown_threshold: f64,
	pub embed_hosts: Vec<String>,
	/// Attribute marking HTML copied out of this editor.
	pub slice_marker: String,
}

impl Default for PasteConfig {
	fn default() -> Self {
		Self {
			markdown_threshold: 0.05,
			embed_hosts: DEFAULT_EMBED_HOSTS.iter().map(|h| h.to_string()).collect(),
			slice_marker: "data-folio-slice".into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoldConfig {
	/// Prefix separating this document's fold keys from other documents'.
	pub scope: String,
	/// JSON file for persisted fold state; session-only when absent.
	pub store_path: Option<PathBuf>,
}

impl Default for FoldConfig {
	fn default() -> Self {
		Self {
			scope: "default".into(),
			store_path: None,
		}
	}
}

impl EditorConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
		let config: EditorConfig = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses the file at `path`.
	pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&raw)?;
		tracing::debug!(path = %path.display(), "config.loaded");
		Ok(config)
	}

	fn validate(&self) -> ConfigResult<()> {
		let threshold = self.paste.markdown_threshold;
		if !threshold.is_finite() || threshold < 0.0 {
			return Err(ConfigError::Invalid(format!(
				"paste.markdown_threshold must be a non-negative number, got {threshold}"
			)));
		}
		if self.fold.scope.is_empty() {
			return Err(ConfigError::Invalid("fold.scope must not be empty".into()));
		}
		if self.diagram.languages.iter().any(|l| l.trim().is_empty()) {
			return Err(ConfigError::Invalid("diagram.languages must not contain blank names".into()));
		}
		Ok(())
	}

	/// Whether a code block declaring `language` renders as a diagram.
	pub fn is_diagram_language(&self, language: Option<&str>) -> bool {
		language.is_some_and(|lang| {
			let lang = lang.trim();
			self.diagram.languages.iter().any(|l| l.eq_ignore_ascii_case(lang))
		})
	}
}
