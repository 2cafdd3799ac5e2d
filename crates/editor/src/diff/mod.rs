//! Diff highlighting and change navigation.
//!
//! The provider is handed its change spans up front and never derives them
//! from the document, so every transaction simply remaps them. Spans that
//! collapse to nothing are dropped.


use folio_primitives::{AppliedTransaction, Document, Signal};
use serde::{Deserialize, Serialize};

use crate::decoration::Decoration;
use crate::error::ProviderError;
use crate::provider::{DecorationProvider, ProviderKind};

/// Class added to the span the navigation cursor is on.
pub const CURRENT_CLASS: &str = "current-diff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
	Insertion,
	Deletion,
}

impl ChangeKind {
	pub const fn class(self) -> &'static str {
		match self {
			Self::Insertion => "diff-insertion",
			Self::Deletion => "diff-deletion",
		}
	}
}

/// A changed range of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeSpan {
	pub from: usize,
	pub to: usize,
	pub kind: ChangeKind,
}

impl ChangeSpan {
	pub fn new(from: usize, to: usize, kind: ChangeKind) -> Self {
		Self { from, to, kind }
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffState {
	spans: Vec<ChangeSpan>,
	current: Option<usize>,
}

impl DiffState {
	pub fn spans(&self) -> &[ChangeSpan] {
		&self.spans
	}

	pub fn total_changes(&self) -> usize {
		self.spans.len()
	}

	pub fn current_change_index(&self) -> Option<usize> {
		self.current
	}

	pub fn current_span(&self) -> Option<ChangeSpan> {
		self.current.and_then(|i| self.spans.get(i).copied())
	}
}

/// Diff provider over a fixed list of change spans.
pub struct DiffProvider {
	spans: Vec<ChangeSpan>,
}

impl DiffProvider {
	pub fn new(spans: impl IntoIterator<Item = ChangeSpan>) -> Self {
		Self {
			spans: spans.into_iter().collect(),
		}
	}

	/// Diff highlighting is inactive without changes.
	pub fn is_active(&self) -> bool {
		!self.spans.is_empty()
	}
}

impl DecorationProvider for DiffProvider {
	type State = DiffState;

	const KIND: ProviderKind = ProviderKind::Diff;

	fn init(&self, doc: &Document) -> Result<DiffState, ProviderError> {
		let size = doc.content_size();
		let mut spans: Vec<ChangeSpan> = self
			.spans
			.iter()
			.filter(|span| span.from < span.to && span.to <= size)
			.copied()
			.collect();
		if spans.len() != self.spans.len() {
			tracing::debug!(dropped = self.spans.len() - spans.len(), size, "diff.invalid_spans");
		}
		spans.sort_by_key(|span| (span.from, span.to));
		Ok(DiffState { spans, current: None })
	}

	fn apply(&self, state: &DiffState, tx: &AppliedTransaction) -> Result<DiffState, ProviderError> {
		let mut spans = Vec::with_capacity(state.spans.len());
		let mut current = None;
		for (index, span) in state.spans.iter().enumerate() {
			let Some((from, to)) = tx.mapping.map_range(span.from, span.to) else {
				continue;
			};
			if state.current == Some(index) {
				current = Some(spans.len());
			}
			spans.push(ChangeSpan { from, to, ..*span });
		}
		if current.is_none() && !spans.is_empty() {
			current = state.current.map(|i| i.min(spans.len() - 1));
		}
		let mut next = DiffState { spans, current };
		for signal in tx.signals() {
			if let Signal::DiffNavigate(direction) = signal {
				next.current = direction.step(next.current, next.spans.len());
				tracing::trace!(?direction, current = ?next.current, total = next.spans.len(), "diff.navigate");
			}
		}
		Ok(next)
	}

	fn decorate(&self, state: &DiffState, _doc: &Document) -> Result<Vec<Decoration>, ProviderError> {
		Ok(state
			.spans
			.iter()
			.enumerate()
			.map(|(index, span)| {
				let class = if state.current == Some(index) {
					format!("{} {CURRENT_CLASS}", span.kind.class())
				} else {
					span.kind.class().to_string()
				};
				Decoration::inline(Self::KIND, span.from, span.to, class)
			})
			.collect())
	}
}
