//! Core types for the folio document engine: schema, nodes, positions,
//! steps, mappings and transactions.

/// Node attribute values.
pub mod attrs;
/// Directional types for sequence navigation.
pub mod direction;
/// Versioned documents and position resolution.
pub mod document;
/// Async future aliases.
pub mod future;
/// Identifier types for editor entities.
pub mod ids;
/// Immutable nodes and fragments.
pub mod node;
/// Static node and mark registry.
pub mod schema;
/// Text selections.
pub mod selection;
/// Out-of-band transaction signals.
pub mod signal;
mod text;
/// Steps, mappings and transactions.
pub mod transaction;

pub use attrs::{AttrValue, Attrs};
pub use direction::SeqDirection;
pub use document::{Document, PositionError, ResolvedPos};
pub use future::BoxFutureStatic;
pub use ids::DiagramId;
pub use node::{Fragment, MarkSet, Node};
pub use schema::{Mark, NodeType, SchemaError};
pub use selection::Selection;
pub use signal::{DiagramTheme, RenderOutcome, Signal};
pub use transaction::{
	AppliedTransaction, Bias, MapResult, Mapping, Origin, OriginMarkers, Step, StepError, StepMap, Transaction,
};
