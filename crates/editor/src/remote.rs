//! Collaboration transport adapter.
//!
//! Remote edits arrive as opaque byte payloads: JSON of
//! `{ "steps": [...], "selection": {...}? }`. They are queued through a
//! [`RemoteSender`] from any thread and applied by the editor in arrival
//! order as ordinary transactions marked remote.

use bytes::Bytes;
use folio_primitives::{OriginMarkers, Selection, Step, Transaction};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Decoded remote payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePayload {
	pub steps: Vec<Step>,
	/// The collaborator's selection after their edit.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selection: Option<Selection>,
}

impl RemotePayload {
	pub fn new(steps: Vec<Step>) -> Self {
		Self { steps, selection: None }
	}

	pub fn with_selection(mut self, selection: Selection) -> Self {
		self.selection = Some(selection);
		self
	}

	pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
		serde_json::from_slice(bytes)
	}

	pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
		serde_json::to_vec(self).map(Bytes::from)
	}

	/// Builds the remote-marked transaction for this payload.
	pub fn into_transaction(self) -> Transaction {
		let tx = self
			.steps
			.into_iter()
			.fold(Transaction::new().with_marker(OriginMarkers::REMOTE), Transaction::step);
		match self.selection {
			Some(selection) => tx.with_selection_after(selection),
			None => tx,
		}
	}
}

/// Cloneable handle for queueing remote payloads.
#[derive(Debug, Clone)]
pub struct RemoteSender {
	tx: mpsc::UnboundedSender<Bytes>,
}

impl RemoteSender {
	/// Queues a payload. Returns false when the editor has been dropped.
	pub fn send(&self, payload: impl Into<Bytes>) -> bool {
		self.tx.send(payload.into()).is_ok()
	}
}

pub(crate) fn channel() -> (RemoteSender, mpsc::UnboundedReceiver<Bytes>) {
	let (tx, rx) = mpsc::unbounded_channel();
	(RemoteSender { tx }, rx)
}
