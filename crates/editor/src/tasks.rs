//! Background task tracking for grammar loads and diagram renders.

use std::future::Future;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinSet};

/// Kind of background work, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Loading a highlighting grammar.
	LanguageLoad,
	/// Rendering a diagram preview.
	DiagramRender,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::LanguageLoad => "language-load",
			Self::DiagramRender => "diagram-render",
		}
	}
}

/// Spawning needs an entered tokio runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no tokio runtime available to spawn {0:?} work")]
pub struct NoRuntime(pub TaskClass);

/// A tokio [`JoinSet`] tagged with the class of work it runs.
#[derive(Debug)]
pub struct TaskSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> TaskSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty set for the given task class.
	pub fn new(class: TaskClass) -> Self {
		Self {
			class,
			inner: JoinSet::new(),
		}
	}

	/// Returns the number of tasks currently in the set.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if the set is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns a future onto the current runtime.
	pub fn spawn<F>(&mut self, fut: F) -> Result<(), NoRuntime>
	where
		F: Future<Output = T> + Send + 'static,
	{
		let handle = Handle::try_current().map_err(|_| NoRuntime(self.class))?;
		tracing::trace!(task_class = self.class.as_str(), pending = self.inner.len(), "task_set.spawn");
		self.inner.spawn_on(fut, &handle);
		Ok(())
	}

	/// Waits for the next completed task.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	/// Returns one ready completion without waiting.
	pub fn try_join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.try_join_next()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn spawning_without_runtime_fails() {
		let mut set: TaskSet<u8> = TaskSet::new(TaskClass::DiagramRender);
		assert_eq!(set.spawn(async { 1 }), Err(NoRuntime(TaskClass::DiagramRender)));
		assert!(set.is_empty());
	}

	#[tokio::test]
	async fn completions_are_joined() {
		let mut set = TaskSet::new(TaskClass::LanguageLoad);
		set.spawn(async { 7 }).unwrap();
		set.spawn(async { 8 }).unwrap();
		assert_eq!(set.len(), 2);
		let mut results = Vec::new();
		while let Some(result) = set.join_next().await {
			results.push(result.unwrap());
		}
		results.sort_unstable();
		assert_eq!(results, vec![7, 8]);
	}
}
