//! Merges provider decorations into one overlay per document version.
//!
//! Range decorations come first, layered by provider priority (diff, then
//! highlight, then fold, then diagram) and by position within a layer.
//! Widgets follow, ordered by position only; widgets at the same position
//! keep the order their providers produced them in.

use serde::Serialize;

use crate::decoration::Decoration;
use crate::error::ProviderError;
use crate::provider::ProviderKind;

/// The merged decorations for one document version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlay {
	pub version: u64,
	pub decorations: Vec<Decoration>,
}

impl Overlay {
	pub fn len(&self) -> usize {
		self.decorations.len()
	}

	pub fn is_empty(&self) -> bool {
		self.decorations.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Decoration> {
		self.decorations.iter()
	}

	/// Decorations produced by one provider, in overlay order.
	pub fn from_source(&self, source: ProviderKind) -> impl Iterator<Item = &Decoration> {
		self.decorations.iter().filter(move |d| d.source() == source)
	}

	/// Serializes the overlay for renderers in other processes.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}
}

fn sort_key(decoration: &Decoration) -> (u8, u8, usize, usize) {
	match decoration {
		Decoration::Widget { pos, .. } => (1, 0, *pos, 0),
		Decoration::Inline { source, from, to, .. } | Decoration::Node { source, from, to, .. } => {
			(0, source.priority(), *from, *to)
		}
	}
}

/// Composes provider outputs for document `version`.
///
/// A provider whose decorations could not be produced is skipped with a
/// warning; the rest are still merged.
pub fn compose(
	version: u64,
	parts: impl IntoIterator<Item = (ProviderKind, Result<Vec<Decoration>, ProviderError>)>,
) -> Overlay {
	let mut decorations = Vec::new();
	for (kind, part) in parts {
		match part {
			Ok(part) => decorations.extend(part),
			Err(error) => tracing::warn!(provider = kind.as_str(), %error, version, "compositor.skip_provider"),
		}
	}
	decorations.sort_by_key(sort_key);
	Overlay { version, decorations }
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::decoration::Widget;

	fn gutter(pos: usize, label: &str) -> Decoration {
		Decoration::widget(
			ProviderKind::Highlight,
			pos,
			Widget::LineNumbers {
				width: 1,
				labels: vec![label.into()],
			},
		)
	}

	#[test]
	fn diff_orders_before_overlapping_highlight() {
		let overlay = compose(
			3,
			[
				(ProviderKind::Highlight, Ok(vec![Decoration::inline(ProviderKind::Highlight, 2, 6, "hl-keyword")])),
				(ProviderKind::Diff, Ok(vec![Decoration::inline(ProviderKind::Diff, 4, 9, "diff-insertion")])),
			],
		);
		assert_eq!(overlay.decorations[0].source(), ProviderKind::Diff);
		assert_eq!(overlay.decorations[1].source(), ProviderKind::Highlight);
	}

	#[test]
	fn widgets_keep_input_order_at_equal_positions() {
		let overlay = compose(
			1,
			[
				(ProviderKind::Highlight, Ok(vec![gutter(8, "b"), gutter(4, "a")])),
				(ProviderKind::Diagram, Ok(vec![gutter(8, "c")])),
			],
		);
		let labels: Vec<_> = overlay
			.iter()
			.map(|d| match d {
				Decoration::Widget {
					widget: Widget::LineNumbers { labels, .. },
					..
				} => labels[0].as_str(),
				_ => "",
			})
			.collect();
		assert_eq!(labels, vec!["a", "b", "c"]);
	}

	#[test]
	fn failed_providers_are_skipped() {
		let overlay = compose(
			1,
			[
				(ProviderKind::Fold, Err(ProviderError::Unavailable(ProviderKind::Fold))),
				(ProviderKind::Diff, Ok(vec![Decoration::inline(ProviderKind::Diff, 1, 2, "diff-deletion")])),
			],
		);
		assert_eq!(overlay.len(), 1);
		assert_eq!(overlay.from_source(ProviderKind::Fold).count(), 0);
	}

	#[test]
	fn composing_is_byte_identical() {
		let parts = || -> [(ProviderKind, Result<Vec<Decoration>, ProviderError>); 2] {
			[
				(ProviderKind::Fold, Ok(vec![Decoration::node(ProviderKind::Fold, 0, 7, "collapsed")])),
				(ProviderKind::Highlight, Ok(vec![gutter(8, "1"), Decoration::inline(ProviderKind::Highlight, 8, 10, "hl-keyword")])),
			]
		};
		assert_eq!(compose(2, parts()).to_json().unwrap(), compose(2, parts()).to_json().unwrap());
	}
}
