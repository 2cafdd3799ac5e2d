use folio_primitives::{DiagramId, DiagramTheme, SeqDirection, Signal, StepError, Transaction};
use tracing::{debug, warn};

use super::Editor;
use crate::diff::{ChangeSpan, DiffProvider};
use crate::error::EditorError;
use crate::paste::{ClipboardPayload, PasteKind, PastePlan};
use crate::provider::Slot;

impl Editor {
	/// Collapses or expands the heading with stable key `key`.
	///
	/// The new state is persisted through the fold store.
	pub fn toggle_fold(&mut self, key: &str) -> Result<(), EditorError> {
		let known = self.fold.state().is_some_and(|state| state.heading(key).is_some());
		if !known {
			return Err(EditorError::UnknownFoldKey(key.to_string()));
		}
		self.dispatch(Transaction::signal(Signal::ToggleFold(key.to_string())))
	}

	/// Enters diff mode with `spans`, replacing any previous spans.
	pub fn set_diff(&mut self, spans: impl IntoIterator<Item = ChangeSpan>) {
		self.diff = Some(Slot::new(DiffProvider::new(spans), &self.doc));
	}

	/// Leaves diff mode.
	pub fn clear_diff(&mut self) {
		self.diff = None;
	}

	/// Moves to the next change, wrapping to the first. Returns the new index.
	pub fn next_change(&mut self) -> Option<usize> {
		self.navigate_changes(SeqDirection::Next)
	}

	/// Moves to the previous change, wrapping to the last. Returns the new index.
	pub fn prev_change(&mut self) -> Option<usize> {
		self.navigate_changes(SeqDirection::Prev)
	}

	fn navigate_changes(&mut self, direction: SeqDirection) -> Option<usize> {
		self.diff.as_ref()?;
		self.dispatch_signal(Signal::DiffNavigate(direction));
		self.current_change_index()
	}

	/// Number of changes in diff mode, zero otherwise.
	pub fn total_changes(&self) -> usize {
		self.diff_state().map_or(0, |state| state.total_changes())
	}

	pub fn current_change_index(&self) -> Option<usize> {
		self.diff_state().and_then(|state| state.current_change_index())
	}

	/// Shows or hides the raw source behind a diagram preview.
	pub fn toggle_diagram_visibility(&mut self, id: DiagramId) -> Result<(), EditorError> {
		let known = self.diagram.state().is_some_and(|state| state.handle(id).is_some());
		if !known {
			return Err(EditorError::UnknownDiagram(id));
		}
		self.dispatch(Transaction::signal(Signal::ToggleDiagramSource(id)))
	}

	/// Switches the diagram theme; every diagram re-renders on the next tick.
	pub fn set_diagram_theme(&mut self, theme: DiagramTheme) {
		self.dispatch_signal(Signal::DiagramTheme(theme));
	}

	/// Pastes `payload` over the current selection.
	///
	/// Returns how the payload was ingested, or `None` when it held nothing
	/// to insert. When the classified content cannot be placed at the
	/// selection, the text is inserted as plain inline text instead.
	pub fn paste(&mut self, payload: &ClipboardPayload) -> Result<Option<PasteKind>, EditorError> {
		let Some(plan) = self.paste.prepare(&self.doc, self.selection, payload)? else {
			debug!("paste.empty");
			return Ok(None);
		};
		let PastePlan { kind, transaction } = plan;
		match transaction.apply(&self.doc) {
			Ok(applied) => {
				self.commit(applied);
				Ok(Some(kind))
			}
			Err(error) => self.paste_fallback(payload, kind, error),
		}
	}

	fn paste_fallback(
		&mut self,
		payload: &ClipboardPayload,
		kind: PasteKind,
		error: StepError,
	) -> Result<Option<PasteKind>, EditorError> {
		warn!(?kind, %error, "paste.apply_failed; inserting plain text");
		let Some(plan) = self.paste.plain_fallback(&self.doc, self.selection, payload)? else {
			return Err(error.into());
		};
		let applied = plan.transaction.apply(&self.doc)?;
		self.commit(applied);
		Ok(Some(plan.kind))
	}
}
