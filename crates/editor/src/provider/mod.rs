//! The decoration provider contract and the recompute policy shared by
//! every provider.
//!
//! A provider is a pure state machine: `init` derives state from a document,
//! `apply` folds one applied transaction into the previous state, and
//! `decorate` turns state into decorations for the current document. The
//! engine owns each provider's state in a [`Slot`], which isolates failures
//! so one broken provider cannot take the others down.


use std::fmt;

use folio_primitives::{AppliedTransaction, Document, Node};
use serde::Serialize;

use crate::decoration::Decoration;
use crate::error::ProviderError;

/// Identifies a provider in logs, errors and decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
	Diff,
	Highlight,
	Fold,
	Diagram,
}

impl ProviderKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Diff => "diff",
			Self::Highlight => "highlight",
			Self::Fold => "fold",
			Self::Diagram => "diagram",
		}
	}

	/// Layering priority for overlapping ranges; lower wins and sorts first.
	pub const fn priority(self) -> u8 {
		match self {
			Self::Diff => 0,
			Self::Highlight => 1,
			Self::Fold => 2,
			Self::Diagram => 3,
		}
	}
}

impl fmt::Display for ProviderKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A source of decorations with incremental state.
///
/// Identical `(state, transaction)` pairs must produce identical states, and
/// therefore identical decorations. Side effects a provider wants performed
/// (persistence writes, grammar loads, renders) are returned inside its state
/// for the engine to drain.
pub trait DecorationProvider {
	type State;

	const KIND: ProviderKind;

	/// Derives state from scratch.
	fn init(&self, doc: &Document) -> Result<Self::State, ProviderError>;

	/// Produces the state for `tx.doc` from the state for `tx.doc_before`.
	fn apply(&self, state: &Self::State, tx: &AppliedTransaction) -> Result<Self::State, ProviderError>;

	/// Decorations for `doc`, which must be the document `state` was derived for.
	fn decorate(&self, state: &Self::State, doc: &Document) -> Result<Vec<Decoration>, ProviderError>;
}

/// Why a provider recomputes from the document instead of remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
	/// No state existed yet.
	Initial,
	/// The edit intersects a node the provider derives state from.
	Touched,
	/// The edit came from a collaborator.
	Remote,
	/// A signal on the transaction asked for it.
	Signal,
}

/// Outcome of [`plan_recompute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recompute {
	Full(RecomputeReason),
	/// Translate existing state through the mapping.
	Remap,
}

impl Recompute {
	pub fn is_full(self) -> bool {
		matches!(self, Recompute::Full(_))
	}
}

/// Decides between full recompute and remapping for one transaction.
///
/// # Parameters
/// - `cares`: true for node types whose edits invalidate the provider's state
/// - `signalled`: whether the transaction carries a signal aimed at the provider
pub fn plan_recompute(
	kind: ProviderKind,
	tx: &AppliedTransaction,
	cares: impl FnMut(&Node) -> bool,
	signalled: bool,
) -> Recompute {
	let plan = if signalled {
		Recompute::Full(RecomputeReason::Signal)
	} else if !tx.doc_changed() {
		Recompute::Remap
	} else if tx.origin.is_remote() {
		Recompute::Full(RecomputeReason::Remote)
	} else if tx.touches(cares) {
		Recompute::Full(RecomputeReason::Touched)
	} else {
		Recompute::Remap
	};
	tracing::trace!(provider = kind.as_str(), ?plan, origin = %tx.origin, version = tx.doc.version(), "provider.plan");
	plan
}

/// Engine-side holder of one provider and its state.
///
/// A missing state means the provider failed and could not be rebuilt; it
/// contributes nothing until the next transaction rebuilds it.
pub struct Slot<P: DecorationProvider> {
	provider: P,
	state: Option<P::State>,
}

impl<P: DecorationProvider> Slot<P> {
	pub fn new(provider: P, doc: &Document) -> Self {
		let state = Self::init_logged(&provider, doc);
		Self { provider, state }
	}

	fn init_logged(provider: &P, doc: &Document) -> Option<P::State> {
		match provider.init(doc) {
			Ok(state) => Some(state),
			Err(error) => {
				tracing::warn!(provider = P::KIND.as_str(), %error, "provider.init_failed");
				None
			}
		}
	}

	/// Folds `tx` into the state, rebuilding from `tx.doc` if that fails.
	pub fn apply(&mut self, tx: &AppliedTransaction) {
		let next = match &self.state {
			Some(state) => match self.provider.apply(state, tx) {
				Ok(next) => Some(next),
				Err(error) => {
					tracing::warn!(provider = P::KIND.as_str(), %error, "provider.apply_failed; rebuilding");
					Self::init_logged(&self.provider, &tx.doc)
				}
			},
			None => {
				tracing::trace!(provider = P::KIND.as_str(), reason = ?RecomputeReason::Initial, "provider.plan");
				Self::init_logged(&self.provider, &tx.doc)
			}
		};
		self.state = next;
	}

	pub fn decorate(&self, doc: &Document) -> Result<Vec<Decoration>, ProviderError> {
		let state = self.state.as_ref().ok_or(ProviderError::Unavailable(P::KIND))?;
		self.provider.decorate(state, doc)
	}

	pub fn provider(&self) -> &P {
		&self.provider
	}

	pub fn state(&self) -> Option<&P::State> {
		self.state.as_ref()
	}

	pub fn state_mut(&mut self) -> Option<&mut P::State> {
		self.state.as_mut()
	}
}
