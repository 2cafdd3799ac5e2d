//! Error types for the editor engine.

use std::path::PathBuf;

use folio_primitives::{PositionError, SchemaError, StepError};
use thiserror::Error;

use crate::provider::ProviderKind;

/// Failure inside a decoration provider.
///
/// Providers never surface these to the user. The engine logs them and
/// rebuilds the failing provider from the current document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
	/// A stored position could not be mapped into the new document.
	#[error("{provider} lost track of position {pos}")]
	LostPosition {
		/// Provider whose state went stale.
		provider: ProviderKind,
		/// Position recorded against the previous document.
		pos: usize,
	},

	/// A position did not resolve in the document.
	#[error(transparent)]
	Position(#[from] PositionError),

	/// The provider has no state to decorate from.
	#[error("{0} has no state")]
	Unavailable(ProviderKind),
}

/// Failure reported by a diagram renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
	/// The renderer rejected the diagram source.
	#[error("invalid diagram: {0}")]
	Syntax(String),

	/// The renderer could not be reached or crashed.
	#[error("renderer unavailable: {0}")]
	Unavailable(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value parsed but is out of range.
	#[error("invalid configuration: {0}")]
	Invalid(String),
}

/// Errors surfaced by [`Editor`](crate::Editor) commands.
#[derive(Debug, Error)]
pub enum EditorError {
	/// A transaction could not be applied; the document is unchanged.
	#[error(transparent)]
	Step(#[from] StepError),

	/// Building a node for an edit violated the schema.
	#[error(transparent)]
	Schema(#[from] SchemaError),

	/// A selection or command position is outside the document.
	#[error(transparent)]
	Position(#[from] PositionError),

	/// A remote payload could not be decoded; nothing was applied.
	#[error("failed to decode remote payload: {0}")]
	Decode(#[from] serde_json::Error),

	/// A command referenced a diagram the editor does not know.
	#[error("unknown diagram {0}")]
	UnknownDiagram(folio_primitives::DiagramId),

	/// A command referenced a heading key the editor does not know.
	#[error("unknown fold key {0:?}")]
	UnknownFoldKey(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
