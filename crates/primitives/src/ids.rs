use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a rendered diagram.
///
/// Generated once when a diagram block is first seen and kept across edits,
/// so late async results can be matched to their block without positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagramId(Uuid);

impl DiagramId {
	/// Generates a fresh random id.
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	pub const fn from_uuid(uuid: Uuid) -> Self {
		Self(uuid)
	}

	pub const fn as_uuid(&self) -> Uuid {
		self.0
	}
}

impl Default for DiagramId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for DiagramId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "diagram-{}", self.0.as_simple())
	}
}
