//! Code-block highlighting for folio.
//!
//! The editor talks to highlighters through [`HighlightEngine`]. Engines
//! return nested [`TokenTree`]s which [`flatten`] turns into class-annotated
//! character spans. Grammars load asynchronously; languages waiting for a
//! grammar are tracked in a process-wide [`PendingLanguages`] set, where the
//! first claimant loads and everyone else waits on that load.

mod engine;
mod error;
mod gutter;
mod pending;
mod registry;
mod rules;
mod token;

pub use engine::HighlightEngine;
pub use error::HighlightError;
pub use gutter::{LineGutter, line_gutter};
pub use pending::{LoadClaim, LoadGuard, LoadWaiter, PendingLanguages};
pub use registry::{LanguageRegistry, Resolution};
pub use rules::{RuleDef, RuleEngine};
pub use token::{HighlightSpan, TokenTree, flatten};
