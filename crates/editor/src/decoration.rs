//! Decoration descriptors consumed by renderers.
//!
//! A decoration is valid against exactly one document version. Providers
//! regenerate them from their own state on every version; nothing here is
//! persisted.

use folio_primitives::DiagramId;
use serde::Serialize;

use crate::provider::ProviderKind;

/// One visual annotation over the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decoration {
	/// A class applied to the characters in `from..to`.
	Inline {
		source: ProviderKind,
		from: usize,
		to: usize,
		class: String,
	},
	/// A class applied to the node spanning `from..to`.
	Node {
		source: ProviderKind,
		from: usize,
		to: usize,
		class: String,
	},
	/// Out-of-flow content anchored at `pos`.
	Widget {
		source: ProviderKind,
		pos: usize,
		widget: Widget,
	},
}

impl Decoration {
	pub fn inline(source: ProviderKind, from: usize, to: usize, class: impl Into<String>) -> Self {
		Decoration::Inline {
			source,
			from,
			to,
			class: class.into(),
		}
	}

	pub fn node(source: ProviderKind, from: usize, to: usize, class: impl Into<String>) -> Self {
		Decoration::Node {
			source,
			from,
			to,
			class: class.into(),
		}
	}

	pub fn widget(source: ProviderKind, pos: usize, widget: Widget) -> Self {
		Decoration::Widget { source, pos, widget }
	}

	/// Provider that produced this decoration.
	pub fn source(&self) -> ProviderKind {
		match self {
			Decoration::Inline { source, .. } | Decoration::Node { source, .. } | Decoration::Widget { source, .. } => {
				*source
			}
		}
	}

	/// Covered range; widgets cover the empty range at their anchor.
	pub fn range(&self) -> (usize, usize) {
		match self {
			Decoration::Inline { from, to, .. } | Decoration::Node { from, to, .. } => (*from, *to),
			Decoration::Widget { pos, .. } => (*pos, *pos),
		}
	}

	pub fn class(&self) -> Option<&str> {
		match self {
			Decoration::Inline { class, .. } | Decoration::Node { class, .. } => Some(class),
			Decoration::Widget { .. } => None,
		}
	}

	pub fn is_widget(&self) -> bool {
		matches!(self, Decoration::Widget { .. })
	}

	/// Moves the decoration `by` positions to the right.
	pub fn shifted(mut self, by: usize) -> Self {
		match &mut self {
			Decoration::Inline { from, to, .. } | Decoration::Node { from, to, .. } => {
				*from += by;
				*to += by;
			}
			Decoration::Widget { pos, .. } => *pos += by,
		}
		self
	}
}

/// Widget payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
	/// Line-number gutter for a code block.
	LineNumbers {
		/// Digits every label is padded to.
		width: usize,
		labels: Vec<String>,
	},
	/// Rendered diagram preview.
	Diagram {
		id: DiagramId,
		view: DiagramView,
		/// Whether the raw source is shown next to the preview.
		show_source: bool,
	},
}

/// What a diagram preview currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DiagramView {
	/// The source is blank; the renderer is never called.
	Empty,
	/// No artifact yet; a render is scheduled or running.
	Pending,
	/// Markup from the last successful render.
	Rendered { markup: String },
	/// The last render failed.
	Error { message: String },
}
