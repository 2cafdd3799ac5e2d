//! The editor engine.
//!
//! [`Editor`] owns the current document and selection, one state slot per
//! decoration provider, and the background work those providers ask for.
//! Every change, local or not, enters through [`Editor::dispatch`]; the
//! applied transaction is folded into each provider in turn and the
//! providers' requested side effects are performed afterwards. The
//! implementation is split across:
//!
//! - [`commands`] - user-facing commands (folds, diff navigation, diagrams, paste)
//! - [`lifecycle`] - ticks, background task completion and the remote queue

/// User-facing commands.
mod commands;
/// Ticks, async completions and remote payloads.
mod lifecycle;


use std::sync::Arc;

use bytes::Bytes;
use folio_primitives::{AppliedTransaction, DiagramId, Document, RenderOutcome, Selection, Signal, Transaction};
use folio_syntax::{HighlightEngine, HighlightError, LoadClaim, RuleEngine};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::compositor::{Overlay, compose};
use crate::config::EditorConfig;
use crate::diagram::{DiagramProvider, DiagramRenderer, DiagramState, NoRenderer};
use crate::diff::{ChangeSpan, DiffProvider, DiffState};
use crate::error::{EditorError, RenderError};
use crate::fold::{COLLAPSED_VALUE, FoldProvider, FoldState, FoldWrite};
use crate::highlight::{HighlightProvider, HighlightServices, HighlightState};
use crate::paste::{EmbedMatcher, HtmlImporter, PastePipeline};
use crate::provider::{ProviderKind, Slot};
use crate::remote::{self, RemoteSender};
use crate::store::{FoldStore, JsonFileFoldStore, MemoryFoldStore};
use crate::tasks::{TaskClass, TaskSet};

/// Completion of a grammar load.
struct LoadDone {
	language: String,
	result: Result<(), HighlightError>,
}

/// Completion of a diagram render.
struct RenderDone {
	id: DiagramId,
	generation: u64,
	result: Result<String, RenderError>,
}

/// Document editing engine with decoration providers.
///
/// # Creating an Editor
///
/// ```ignore
/// let doc = Document::from_blocks([Node::heading(1, "Notes")?])?;
/// let mut editor = Editor::builder(doc)
///     .config(EditorConfig::load("folio.toml")?)
///     .renderer(Arc::new(MyMermaid))
///     .build();
/// editor.dispatch(Transaction::new().insert(8, text))?;
/// let overlay = editor.overlay();
/// ```
pub struct Editor {
	doc: Document,
	selection: Selection,
	/// Last selection reported by a collaborator, mapped through later edits.
	remote_selection: Option<Selection>,
	config: EditorConfig,
	store: Arc<dyn FoldStore>,
	fold: Slot<FoldProvider>,
	highlight: Slot<HighlightProvider>,
	diagram: Slot<DiagramProvider>,
	diff: Option<Slot<DiffProvider>>,
	renderer: Arc<dyn DiagramRenderer>,
	paste: PastePipeline,
	loads: TaskSet<LoadDone>,
	/// Languages this editor is loading or waiting on.
	awaiting: FxHashSet<String>,
	renders: TaskSet<RenderDone>,
	remote_tx: RemoteSender,
	remote_rx: mpsc::UnboundedReceiver<Bytes>,
}

impl std::fmt::Debug for Editor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Editor")
			.field("version", &self.doc.version())
			.field("selection", &self.selection)
			.field("loads", &self.loads.len())
			.field("renders", &self.renders.len())
			.finish_non_exhaustive()
	}
}

/// Builder for [`Editor`].
///
/// Every collaborator is optional. Without them the editor highlights with
/// the built-in rule grammars, keeps folds in the file named by
/// `[fold] store_path` (or in memory), and fails every diagram render.
pub struct EditorBuilder {
	doc: Document,
	config: EditorConfig,
	selection: Option<Selection>,
	engine: Option<Arc<dyn HighlightEngine>>,
	services: Option<HighlightServices>,
	renderer: Option<Arc<dyn DiagramRenderer>>,
	store: Option<Arc<dyn FoldStore>>,
	diff: Option<Vec<ChangeSpan>>,
	matcher: Option<Arc<dyn EmbedMatcher>>,
	importer: Option<Arc<dyn HtmlImporter>>,
}

impl EditorBuilder {
	pub fn config(mut self, config: EditorConfig) -> Self {
		self.config = config;
		self
	}

	pub fn selection(mut self, selection: Selection) -> Self {
		self.selection = Some(selection);
		self
	}

	/// Highlighting engine, used with the default registry and the
	/// process-wide pending set. Defaults to [`RuleEngine::shared`].
	pub fn engine(mut self, engine: Arc<dyn HighlightEngine>) -> Self {
		self.engine = Some(engine);
		self
	}

	/// Full highlighting services; takes precedence over [`Self::engine`].
	pub fn highlight_services(mut self, services: HighlightServices) -> Self {
		self.services = Some(services);
		self
	}

	pub fn renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
		self.renderer = Some(renderer);
		self
	}

	pub fn store(mut self, store: Arc<dyn FoldStore>) -> Self {
		self.store = Some(store);
		self
	}

	/// Starts in diff mode with the given change spans.
	pub fn diff(mut self, spans: impl IntoIterator<Item = ChangeSpan>) -> Self {
		self.diff = Some(spans.into_iter().collect());
		self
	}

	pub fn embed_matcher(mut self, matcher: Arc<dyn EmbedMatcher>) -> Self {
		self.matcher = Some(matcher);
		self
	}

	pub fn html_importer(mut self, importer: Arc<dyn HtmlImporter>) -> Self {
		self.importer = Some(importer);
		self
	}

	pub fn build(self) -> Editor {
		let config = self.config;
		let store: Arc<dyn FoldStore> = match (self.store, &config.fold.store_path) {
			(Some(store), _) => store,
			(None, Some(path)) => Arc::new(JsonFileFoldStore::open(path.clone())),
			(None, None) => Arc::new(MemoryFoldStore::new()),
		};
		let services = self.services.unwrap_or_else(|| {
			HighlightServices::new(self.engine.unwrap_or_else(|| Arc::new(RuleEngine::shared())))
		});
		let mut paste = PastePipeline::new(&config.paste);
		if let Some(matcher) = self.matcher {
			paste = paste.with_matcher(matcher);
		}
		if let Some(importer) = self.importer {
			paste = paste.with_importer(importer);
		}

		let doc = self.doc;
		let fold = Slot::new(FoldProvider::new(Arc::clone(&store), config.fold.scope.clone()), &doc);
		let highlight = Slot::new(HighlightProvider::new(services, config.highlight.line_numbers), &doc);
		let diagram = Slot::new(DiagramProvider::new(&config.diagram), &doc);
		let diff = self.diff.map(|spans| Slot::new(DiffProvider::new(spans), &doc));
		let selection = clamp(self.selection.unwrap_or(Selection::cursor(0)), &doc);
		let (remote_tx, remote_rx) = remote::channel();

		let mut editor = Editor {
			doc,
			selection,
			remote_selection: None,
			config,
			store,
			fold,
			highlight,
			diagram,
			diff,
			renderer: self.renderer.unwrap_or_else(|| Arc::new(NoRenderer)),
			paste,
			loads: TaskSet::new(TaskClass::LanguageLoad),
			awaiting: FxHashSet::default(),
			renders: TaskSet::new(TaskClass::DiagramRender),
			remote_tx,
			remote_rx,
		};
		editor.flush_effects();
		editor
	}
}

fn clamp(selection: Selection, doc: &Document) -> Selection {
	let size = doc.content_size();
	Selection::new(selection.anchor.min(size), selection.head.min(size))
}

impl Editor {
	/// Creates an editor with default configuration and collaborators.
	pub fn new(doc: Document) -> Self {
		Self::builder(doc).build()
	}

	pub fn builder(doc: Document) -> EditorBuilder {
		EditorBuilder {
			doc,
			config: EditorConfig::default(),
			selection: None,
			engine: None,
			services: None,
			renderer: None,
			store: None,
			diff: None,
			matcher: None,
			importer: None,
		}
	}

	pub fn document(&self) -> &Document {
		&self.doc
	}

	pub fn selection(&self) -> Selection {
		self.selection
	}

	/// Moves the local selection, clamped to the document.
	pub fn set_selection(&mut self, selection: Selection) {
		self.selection = clamp(selection, &self.doc);
	}

	/// The collaborator's selection from the last remote payload that carried one.
	pub fn remote_selection(&self) -> Option<Selection> {
		self.remote_selection
	}

	pub fn config(&self) -> &EditorConfig {
		&self.config
	}

	pub fn store(&self) -> &Arc<dyn FoldStore> {
		&self.store
	}

	pub fn fold_state(&self) -> Option<&FoldState> {
		self.fold.state()
	}

	pub fn highlight_state(&self) -> Option<&HighlightState> {
		self.highlight.state()
	}

	pub fn diagram_state(&self) -> Option<&DiagramState> {
		self.diagram.state()
	}

	pub fn diff_state(&self) -> Option<&DiffState> {
		self.diff.as_ref().and_then(Slot::state)
	}

	/// Number of grammar loads and renders still running.
	pub fn pending_tasks(&self) -> usize {
		self.loads.len() + self.renders.len()
	}

	/// Applies `tx` and folds it into every provider.
	///
	/// A transaction that fails to apply leaves the document, the selection
	/// and every provider untouched.
	pub fn dispatch(&mut self, tx: Transaction) -> Result<(), EditorError> {
		let applied = tx.apply(&self.doc)?;
		self.commit(applied);
		Ok(())
	}

	fn commit(&mut self, applied: AppliedTransaction) {
		debug!(
			origin = %applied.origin,
			version = applied.doc.version(),
			steps = applied.steps.len(),
			signals = applied.signals.len(),
			"editor.dispatch"
		);
		let mapped = self.selection.map(&applied.mapping);
		let remote_mapped = self.remote_selection.map(|sel| sel.map(&applied.mapping));
		if applied.origin.is_remote() {
			self.selection = mapped;
			self.remote_selection = applied.selection.or(remote_mapped);
		} else {
			self.selection = applied.selection.unwrap_or(mapped);
			self.remote_selection = remote_mapped;
		}

		if let Some(diff) = self.diff.as_mut() {
			diff.apply(&applied);
		}
		self.highlight.apply(&applied);
		self.fold.apply(&applied);
		self.diagram.apply(&applied);

		self.doc = applied.doc;
		self.selection = clamp(self.selection, &self.doc);
		self.remote_selection = self.remote_selection.map(|sel| clamp(sel, &self.doc));
		self.flush_effects();
	}

	/// Dispatches a step-less programmatic transaction carrying `signal`.
	fn dispatch_signal(&mut self, signal: Signal) {
		if let Err(error) = self.dispatch(Transaction::signal(signal)) {
			warn!(%error, "editor.signal_failed");
		}
	}

	/// Performs the side effects providers queued in their state: fold
	/// persistence, grammar loads and diagram renders.
	fn flush_effects(&mut self) {
		if let Some(state) = self.fold.state_mut() {
			for write in state.take_writes() {
				match write {
					FoldWrite::Collapse(key) => self.store.set(&key, COLLAPSED_VALUE),
					FoldWrite::Expand(key) => self.store.remove(&key),
				}
			}
		}

		let requests = self.highlight.state_mut().map(HighlightState::take_load_requests).unwrap_or_default();
		for language in requests {
			self.spawn_load(language);
		}

		let jobs = self.diagram.state_mut().map(DiagramState::take_jobs).unwrap_or_default();
		let mut failed = Vec::new();
		for job in jobs {
			let future = self.renderer.render(&job.source, &job.notation, job.theme);
			let (id, generation) = (job.id, job.generation);
			let spawned = self.renders.spawn(async move {
				RenderDone {
					id,
					generation,
					result: future.await,
				}
			});
			if let Err(error) = spawned {
				warn!(%id, %error, "diagram.render_not_started");
				failed.push(Signal::DiagramRendered {
					id,
					generation,
					outcome: RenderOutcome::Failed(error.to_string()),
				});
			}
		}
		for signal in failed {
			self.dispatch_signal(signal);
		}
	}

	/// Loads `language`, or waits for another editor's load of it.
	///
	/// Either way the completion comes back as a `LanguageLoaded` signal.
	fn spawn_load(&mut self, language: String) {
		if self.awaiting.contains(&language) {
			return;
		}
		let services = self.highlight.provider().services();
		let task_language = language.clone();
		let spawned = match services.pending.claim(&language) {
			LoadClaim::Load(guard) => {
				let future = services.engine.load_language(&language);
				self.loads.spawn(async move {
					let result = future.await;
					guard.finish(result.is_ok());
					LoadDone {
						language: task_language,
						result,
					}
				})
			}
			LoadClaim::Wait(waiter) => {
				trace!(%language, "highlight.load_joined");
				self.loads.spawn(async move {
					let result = if waiter.wait().await {
						Ok(())
					} else {
						Err(HighlightError::NotLoaded(task_language.clone()))
					};
					LoadDone {
						language: task_language,
						result,
					}
				})
			}
		};
		match spawned {
			Ok(()) => {
				self.awaiting.insert(language);
			}
			Err(error) => warn!(%language, %error, "highlight.load_not_started"),
		}
	}

	/// Merged decorations of every provider for the current document.
	pub fn overlay(&self) -> Overlay {
		let mut parts = Vec::with_capacity(4);
		if let Some(diff) = &self.diff {
			parts.push((ProviderKind::Diff, diff.decorate(&self.doc)));
		}
		parts.push((ProviderKind::Highlight, self.highlight.decorate(&self.doc)));
		parts.push((ProviderKind::Fold, self.fold.decorate(&self.doc)));
		parts.push((ProviderKind::Diagram, self.diagram.decorate(&self.doc)));
		compose(self.doc.version(), parts)
	}

	/// Queue handle for collaboration payloads.
	pub fn remote_sender(&self) -> RemoteSender {
		self.remote_tx.clone()
	}
}
