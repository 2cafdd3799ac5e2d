use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// Bias determines how positions at change boundaries are mapped.
///
/// When mapping a position through a change, bias determines whether the position
/// moves with insertions or stays before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	Right,
}

/// One replaced range: `old_len` positions at `start` became `new_len` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRange {
	pub start: usize,
	pub old_len: usize,
	pub new_len: usize,
}

/// Result of mapping a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
	/// Mapped position.
	pub pos: usize,
	/// Whether the content on the biased side of the position was deleted.
	pub deleted: bool,
}

/// Position map produced by a single step.
///
/// Ranges are sorted by `start` and expressed in the coordinates of the
/// document before the step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
	ranges: SmallVec<[MapRange; 1]>,
}

impl StepMap {
	/// The identity map, used by steps that never move content.
	pub fn identity() -> Self {
		Self::default()
	}

	/// Map for a single replaced range.
	pub fn replace(start: usize, old_len: usize, new_len: usize) -> Self {
		if old_len == 0 && new_len == 0 {
			return Self::identity();
		}
		Self {
			ranges: smallvec![MapRange { start, old_len, new_len }],
		}
	}

	pub fn ranges(&self) -> &[MapRange] {
		&self.ranges
	}

	pub fn is_identity(&self) -> bool {
		self.ranges.is_empty()
	}

	/// Maps `pos` through this step.
	///
	/// A position strictly inside a replaced range moves to the side chosen by
	/// `bias`. A position at the edge of a deletion stays on that edge; only a
	/// pure insertion point consults the bias.
	pub fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
		let mut diff: isize = 0;
		for range in &self.ranges {
			if range.start > pos {
				break;
			}
			let end = range.start + range.old_len;
			if pos <= end {
				let side = if range.old_len == 0 {
					bias
				} else if pos == range.start {
					Bias::Left
				} else if pos == end {
					Bias::Right
				} else {
					bias
				};
				let base = shift(range.start, diff);
				let mapped = match side {
					Bias::Left => base,
					Bias::Right => base + range.new_len,
				};
				let deleted = range.old_len > 0
					&& match bias {
						Bias::Left => pos > range.start,
						Bias::Right => pos < end,
					};
				return MapResult { pos: mapped, deleted };
			}
			diff += range.new_len as isize - range.old_len as isize;
		}
		MapResult {
			pos: shift(pos, diff),
			deleted: false,
		}
	}

	pub fn map(&self, pos: usize, bias: Bias) -> usize {
		self.map_result(pos, bias).pos
	}
}

fn shift(pos: usize, diff: isize) -> usize {
	pos.checked_add_signed(diff).unwrap_or(0)
}

/// The ordered step maps of one transaction: a total map from the old
/// document's positions to the new document's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
	maps: Vec<StepMap>,
	old_size: usize,
	new_size: usize,
}

impl Mapping {
	/// Identity mapping over a document of `size` positions.
	pub fn identity(size: usize) -> Self {
		Self {
			maps: Vec::new(),
			old_size: size,
			new_size: size,
		}
	}

	pub(crate) fn push(&mut self, map: StepMap, new_size: usize) {
		if !map.is_identity() {
			self.maps.push(map);
		}
		self.new_size = new_size;
	}

	pub fn maps(&self) -> &[StepMap] {
		&self.maps
	}

	/// Returns true when no position moves.
	pub fn is_identity(&self) -> bool {
		self.maps.is_empty()
	}

	pub fn old_size(&self) -> usize {
		self.old_size
	}

	pub fn new_size(&self) -> usize {
		self.new_size
	}

	/// Maps `pos` through every step, reporting whether it was deleted on the way.
	///
	/// Positions beyond the old document are clamped to its end.
	pub fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
		let mut result = MapResult {
			pos: pos.min(self.old_size),
			deleted: false,
		};
		for map in &self.maps {
			let step = map.map_result(result.pos, bias);
			result = MapResult {
				pos: step.pos,
				deleted: result.deleted || step.deleted,
			};
		}
		result.pos = result.pos.min(self.new_size);
		result
	}

	pub fn map(&self, pos: usize, bias: Bias) -> usize {
		self.map_result(pos, bias).pos
	}

	/// Maps a position that must be valid in the old document.
	///
	/// Returns `None` when the position lies outside the old document, meaning
	/// whoever stored it has lost track of the document version.
	pub fn try_map(&self, pos: usize, bias: Bias) -> Option<usize> {
		(pos <= self.old_size).then(|| self.map(pos, bias))
	}

	/// Maps a half-open range, returning `None` when it was deleted or collapsed.
	///
	/// The start moves right and the end moves left, so content inserted at
	/// either edge stays outside the range.
	pub fn map_range(&self, from: usize, to: usize) -> Option<(usize, usize)> {
		if to > self.old_size || from > to {
			return None;
		}
		let start = self.map(from, Bias::Right);
		let end = self.map(to, Bias::Left);
		(start < end).then_some((start, end))
	}
}
