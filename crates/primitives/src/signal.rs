//! Out-of-band requests carried by transactions.
//!
//! Providers never reach outside their own state. Events from outside the
//! document, such as a loaded grammar or a finished render, arrive as a
//! [`Signal`] on a transaction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::direction::SeqDirection;
use crate::ids::DiagramId;

/// Colour theme passed to the diagram renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramTheme {
	#[default]
	Light,
	Dark,
}

impl fmt::Display for DiagramTheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			DiagramTheme::Light => "light",
			DiagramTheme::Dark => "dark",
		})
	}
}

/// Outcome of one diagram render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
	/// Rendered markup.
	Rendered(String),
	/// Renderer failure message.
	Failed(String),
}

/// An out-of-band request attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
	/// A grammar finished loading; highlighters should recompute.
	LanguageLoaded(String),
	/// Time passed; debounced work that is due should start.
	Tick,
	/// Flip the collapsed state of a heading by stable key.
	ToggleFold(String),
	/// Flip raw-source visibility of a diagram.
	ToggleDiagramSource(DiagramId),
	/// Switch the diagram theme.
	DiagramTheme(DiagramTheme),
	/// A diagram render finished.
	DiagramRendered {
		/// Target diagram.
		id: DiagramId,
		/// Generation the render was started for.
		generation: u64,
		/// Renderer result.
		outcome: RenderOutcome,
	},
	/// Move the diff cursor.
	DiffNavigate(SeqDirection),
}
