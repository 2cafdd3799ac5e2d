use std::fmt;

bitflags::bitflags! {
	/// Origin markers written onto a transaction by the boundary that created it.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct OriginMarkers: u8 {
		/// Received from the collaboration transport.
		const REMOTE = 1 << 0;
		/// Produced by the clipboard pipeline.
		const PASTE = 1 << 1;
		/// Produced by an API call, command or async signal.
		const PROGRAMMATIC = 1 << 2;
	}
}

/// Where a transaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Origin {
	/// Typed or otherwise produced by the local user.
	#[default]
	Local,
	/// Applied from a remote collaborator.
	Remote,
	/// Inserted from the clipboard.
	Paste,
	/// Issued by code rather than by a user.
	Programmatic,
}

impl Origin {
	/// Classifies a marker set. Remote wins over Paste, which wins over Programmatic.
	pub const fn classify(markers: OriginMarkers) -> Origin {
		if markers.contains(OriginMarkers::REMOTE) {
			Origin::Remote
		} else if markers.contains(OriginMarkers::PASTE) {
			Origin::Paste
		} else if markers.contains(OriginMarkers::PROGRAMMATIC) {
			Origin::Programmatic
		} else {
			Origin::Local
		}
	}

	/// Returns the marker that classifies as this origin.
	pub const fn as_marker(self) -> OriginMarkers {
		match self {
			Origin::Local => OriginMarkers::empty(),
			Origin::Remote => OriginMarkers::REMOTE,
			Origin::Paste => OriginMarkers::PASTE,
			Origin::Programmatic => OriginMarkers::PROGRAMMATIC,
		}
	}

	pub fn is_remote(self) -> bool {
		self == Origin::Remote
	}
}

impl From<Origin> for OriginMarkers {
	fn from(origin: Origin) -> Self {
		origin.as_marker()
	}
}

impl fmt::Display for Origin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Origin::Local => "local",
			Origin::Remote => "remote",
			Origin::Paste => "paste",
			Origin::Programmatic => "programmatic",
		})
	}
}
