//! Persistence adapters for fold state.
//!
//! Storage is best-effort: every operation is infallible from the caller's
//! point of view, failures are logged and the editor carries on with
//! session-only state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Key-value storage for collapsed headings.
pub trait FoldStore: Send + Sync {
	fn get(&self, key: &str) -> Option<String>;

	fn set(&self, key: &str, value: &str);

	fn remove(&self, key: &str);
}

/// In-memory store; lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryFoldStore {
	entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryFoldStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Copy of every stored entry, sorted by key.
	pub fn entries(&self) -> BTreeMap<String, String> {
		self.entries.lock().clone()
	}
}

impl FoldStore for MemoryFoldStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.lock().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) {
		self.entries.lock().insert(key.to_string(), value.to_string());
	}

	fn remove(&self, key: &str) {
		self.entries.lock().remove(key);
	}
}

/// Store backed by one JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileFoldStore {
	path: PathBuf,
	entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileFoldStore {
	/// Opens the store at `path`.
	///
	/// A missing file starts empty. An unreadable or malformed file is
	/// logged and also starts empty; it is overwritten on the next change.
	pub fn open(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let entries = match std::fs::read_to_string(&path) {
			Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
				tracing::warn!(path = %path.display(), %error, "fold_store.malformed");
				BTreeMap::new()
			}),
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
			Err(error) => {
				tracing::warn!(path = %path.display(), %error, "fold_store.read_failed");
				BTreeMap::new()
			}
		};
		Self {
			path,
			entries: Mutex::new(entries),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn flush(&self, entries: &BTreeMap<String, String>) {
		let json = match serde_json::to_string_pretty(entries) {
			Ok(json) => json,
			Err(error) => {
				tracing::warn!(path = %self.path.display(), %error, "fold_store.encode_failed");
				return;
			}
		};
		if let Err(error) = std::fs::write(&self.path, json) {
			tracing::warn!(path = %self.path.display(), %error, "fold_store.write_failed");
		}
	}
}

impl FoldStore for JsonFileFoldStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.lock().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) {
		let mut entries = self.entries.lock();
		if entries.get(key).map(String::as_str) == Some(value) {
			return;
		}
		entries.insert(key.to_string(), value.to_string());
		self.flush(&entries);
	}

	fn remove(&self, key: &str) {
		let mut entries = self.entries.lock();
		if entries.remove(key).is_some() {
			self.flush(&entries);
		}
	}
}

/// Store used when no persistence is available; nothing survives.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableFoldStore;

impl FoldStore for UnavailableFoldStore {
	fn get(&self, _key: &str) -> Option<String> {
		None
	}

	fn set(&self, key: &str, _value: &str) {
		tracing::trace!(key, "fold_store.unavailable");
	}

	fn remove(&self, _key: &str) {}
}
