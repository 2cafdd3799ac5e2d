#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Document decoration and transaction coordination engine.
//!
//! Transactions enter through [`Editor::dispatch`], are tagged with an
//! origin once, and are folded into four decoration providers (fold,
//! syntax highlight, diagram render and diff). The [`compositor`] merges
//! their output into one [`Overlay`] per document version.
//!
//! # Main Types
//!
//! - [`Editor`] - owns the document, the provider slots and background work
//! - [`DecorationProvider`] - the init/apply/decorate contract every provider implements
//! - [`Overlay`] - merged, ordered decorations for one document version
//! - [`PastePipeline`] - clipboard classification and fragment building
//!
//! # Architecture
//!
//! ```text
//! Editor
//! ├── doc: Document                      // current version
//! ├── diff / highlight / fold / diagram  // Slot<Provider> each
//! ├── store: Arc<dyn FoldStore>          // sole writer of fold state
//! ├── loads / renders: TaskSet           // grammar loads, diagram renders
//! └── remote queue                       // RemoteSender -> process_remote
//! ```
//!
//! Async work never touches provider state directly: completions re-enter
//! as signal transactions, so every state change goes through the same path.

/// Merging provider output into one overlay.
pub mod compositor;
/// TOML configuration.
pub mod config;
/// Decorations and widgets.
pub mod decoration;
/// Diagram render provider.
pub mod diagram;
/// Diff provider.
pub mod diff;
mod editor;
/// Error types.
pub mod error;
/// Fold/collapse provider.
pub mod fold;
/// Syntax highlight provider.
pub mod highlight;
/// Clipboard ingestion.
pub mod paste;
/// Provider contract and recompute policy.
pub mod provider;
/// Collaboration transport adapter.
pub mod remote;
/// Fold state persistence.
pub mod store;
/// Background task sets.
pub mod tasks;

pub use compositor::{Overlay, compose};
pub use config::EditorConfig;
pub use decoration::{Decoration, DiagramView, Widget};
pub use diagram::{DiagramProvider, DiagramRenderer, NoRenderer};
pub use diff::{ChangeKind, ChangeSpan, DiffProvider};
pub use editor::{Editor, EditorBuilder};
pub use error::{ConfigError, EditorError, ProviderError, RenderError};
pub use fold::FoldProvider;
pub use highlight::{HighlightProvider, HighlightServices};
pub use paste::{ClipboardPayload, EditorMeta, PasteKind, PastePipeline};
pub use provider::{DecorationProvider, ProviderKind};
pub use remote::{RemotePayload, RemoteSender};
pub use store::{FoldStore, JsonFileFoldStore, MemoryFoldStore, UnavailableFoldStore};
