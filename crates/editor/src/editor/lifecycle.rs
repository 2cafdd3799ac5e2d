use std::time::Instant;

use folio_primitives::{RenderOutcome, Signal, Transaction};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinError;
use tracing::{debug, trace, warn};

use super::{Editor, LoadDone, RenderDone};
use crate::error::EditorError;
use crate::remote::RemotePayload;

impl Editor {
	/// Advances time-driven state to `now`.
	///
	/// Diagram renders whose quiet period has passed start here.
	pub fn tick(&mut self, now: Instant) {
		trace!(pending = self.pending_tasks(), "editor.tick");
		if let Err(error) = self.dispatch(Transaction::signal(Signal::Tick).at(now)) {
			warn!(%error, "editor.tick_failed");
		}
	}

	/// Handles every background task that has already finished, without
	/// waiting. Returns the number handled.
	pub fn poll_async(&mut self) -> usize {
		let mut handled = 0;
		while let Some(joined) = self.loads.try_join_next() {
			self.finish_load(joined);
			handled += 1;
		}
		while let Some(joined) = self.renders.try_join_next() {
			self.finish_render(joined);
			handled += 1;
		}
		handled
	}

	/// Waits for every in-flight background task and handles it. Returns
	/// the number handled.
	pub async fn drain_async(&mut self) -> usize {
		let mut handled = 0;
		loop {
			if let Some(joined) = self.loads.join_next().await {
				self.finish_load(joined);
			} else if let Some(joined) = self.renders.join_next().await {
				self.finish_render(joined);
			} else {
				break;
			}
			handled += 1;
		}
		handled
	}

	fn finish_load(&mut self, joined: Result<LoadDone, JoinError>) {
		let done = match joined {
			Ok(done) => done,
			Err(error) => {
				warn!(%error, "highlight.load_task_failed");
				return;
			}
		};
		self.awaiting.remove(&done.language);
		match done.result {
			Ok(()) => {
				debug!(language = %done.language, "highlight.language_loaded");
				self.dispatch_signal(Signal::LanguageLoaded(done.language));
			}
			Err(error) => warn!(language = %done.language, %error, "highlight.load_failed"),
		}
	}

	fn finish_render(&mut self, joined: Result<RenderDone, JoinError>) {
		let done = match joined {
			Ok(done) => done,
			Err(error) => {
				warn!(%error, "diagram.render_task_failed");
				return;
			}
		};
		let outcome = match done.result {
			Ok(markup) => RenderOutcome::Rendered(markup),
			Err(error) => RenderOutcome::Failed(error.to_string()),
		};
		self.dispatch_signal(Signal::DiagramRendered {
			id: done.id,
			generation: done.generation,
			outcome,
		});
	}

	/// Decodes one collaboration payload and applies it as a remote
	/// transaction. Nothing is applied when decoding or applying fails.
	pub fn apply_remote(&mut self, bytes: &[u8]) -> Result<(), EditorError> {
		let payload = RemotePayload::decode(bytes)?;
		trace!(steps = payload.steps.len(), "remote.apply");
		self.dispatch(payload.into_transaction())
	}

	/// Applies queued remote payloads in arrival order.
	///
	/// Stops at the first payload that fails; that payload is dropped and
	/// later ones stay queued. Returns the number applied.
	pub fn process_remote(&mut self) -> Result<usize, EditorError> {
		let mut applied = 0;
		loop {
			match self.remote_rx.try_recv() {
				Ok(bytes) => {
					if let Err(error) = self.apply_remote(&bytes) {
						warn!(%error, applied, "remote.payload_rejected");
						return Err(error);
					}
					applied += 1;
				}
				Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Ok(applied),
			}
		}
	}
}
