use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::watch;

/// Outcome slot of an in-flight load: `None` while loading.
type Outcome = watch::Receiver<Option<bool>>;

/// Languages whose grammar has been requested but not loaded yet.
///
/// The first [`claim`](Self::claim) for a language makes the caller the
/// loader; later claims wait for that load instead of starting another.
/// Cloning yields another handle to the same set. [`PendingLanguages::global`]
/// is shared by every editor in the process; independent sets are mainly
/// useful in tests.
#[derive(Debug, Clone, Default)]
pub struct PendingLanguages {
	inner: Arc<Mutex<FxHashMap<String, Outcome>>>,
}

/// Result of [`PendingLanguages::claim`].
#[derive(Debug)]
pub enum LoadClaim {
	/// Nobody was loading the language; the holder must load it.
	Load(LoadGuard),
	/// Another load is in flight.
	Wait(LoadWaiter),
}

impl PendingLanguages {
	/// Creates an independent, empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the process-wide set.
	pub fn global() -> Self {
		static GLOBAL: OnceLock<PendingLanguages> = OnceLock::new();
		GLOBAL.get_or_init(PendingLanguages::new).clone()
	}

	/// Marks `language` pending, or joins the load already in flight.
	pub fn claim(&self, language: &str) -> LoadClaim {
		let mut inner = self.inner.lock();
		if let Some(outcome) = inner.get(language) {
			return LoadClaim::Wait(LoadWaiter {
				outcome: outcome.clone(),
			});
		}
		let (tx, rx) = watch::channel(None);
		inner.insert(language.to_string(), rx);
		LoadClaim::Load(LoadGuard {
			language: language.to_string(),
			set: self.clone(),
			tx,
			finished: false,
		})
	}

	pub fn contains(&self, language: &str) -> bool {
		self.inner.lock().contains_key(language)
	}

	pub fn is_empty(&self) -> bool {
		self.inner.lock().is_empty()
	}

	/// Sorted copy of the pending languages.
	pub fn snapshot(&self) -> Vec<String> {
		let mut languages: Vec<String> = self.inner.lock().keys().cloned().collect();
		languages.sort();
		languages
	}
}

/// Ownership of one pending load.
///
/// Finishing, or dropping without finishing, clears the language and wakes
/// every waiter. A dropped guard reports the load as failed.
#[derive(Debug)]
pub struct LoadGuard {
	language: String,
	set: PendingLanguages,
	tx: watch::Sender<Option<bool>>,
	finished: bool,
}

impl LoadGuard {
	pub fn language(&self) -> &str {
		&self.language
	}

	/// Publishes the outcome of the load.
	pub fn finish(mut self, loaded: bool) {
		self.release(loaded);
	}

	fn release(&mut self, loaded: bool) {
		if std::mem::replace(&mut self.finished, true) {
			return;
		}
		self.set.inner.lock().remove(&self.language);
		self.tx.send_replace(Some(loaded));
	}
}

impl Drop for LoadGuard {
	fn drop(&mut self) {
		self.release(false);
	}
}

/// Waits for a load started elsewhere.
#[derive(Debug)]
pub struct LoadWaiter {
	outcome: Outcome,
}

impl LoadWaiter {
	/// Resolves once the loader finishes. Returns whether the load succeeded.
	pub async fn wait(mut self) -> bool {
		match self.outcome.wait_for(Option::is_some).await {
			Ok(outcome) => *outcome == Some(true),
			Err(_) => false,
		}
	}
}
