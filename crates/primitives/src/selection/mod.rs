use serde::{Deserialize, Serialize};

use crate::transaction::{Bias, Mapping};


/// A text selection between two document positions.
///
/// `anchor` is the fixed end and `head` the end that moves when the
/// selection is extended; either may come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
	pub anchor: usize,
	pub head: usize,
}

impl Selection {
	/// Creates a selection from anchor to head.
	pub fn new(anchor: usize, head: usize) -> Self {
		Self { anchor, head }
	}

	/// Creates a point selection (zero-width cursor).
	pub fn cursor(pos: usize) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the smaller endpoint.
	pub fn from(&self) -> usize {
		self.anchor.min(self.head)
	}

	/// Returns the larger endpoint.
	pub fn to(&self) -> usize {
		self.anchor.max(self.head)
	}

	/// Returns true for a zero-width selection.
	pub fn is_empty(&self) -> bool {
		self.anchor == self.head
	}

	/// Returns true when `head` comes before `anchor`.
	pub fn is_backward(&self) -> bool {
		self.head < self.anchor
	}

	/// Maps this selection through a transaction's mapping.
	///
	/// A cursor follows text inserted at its position. A range keeps
	/// insertions at its edges outside, and collapses to a cursor if its
	/// content is deleted.
	pub fn map(&self, mapping: &Mapping) -> Selection {
		if self.is_empty() {
			return Selection::cursor(mapping.map(self.head, Bias::Right));
		}
		let from = mapping.map(self.from(), Bias::Right);
		let to = mapping.map(self.to(), Bias::Left).max(from);
		if self.is_backward() {
			Selection::new(to, from)
		} else {
			Selection::new(from, to)
		}
	}
}
