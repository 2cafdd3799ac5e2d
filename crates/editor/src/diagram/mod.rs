//! Diagram previews for code blocks in a diagram notation.
//!
//! Each diagram block owns a render handle with a stable [`DiagramId`].
//! Debouncing is explicit handle state: an edit stamps `last_edit_at` with
//! the transaction time and marks the handle pending; a later `Tick` whose
//! time is at least one quiet period past the last edit starts a render by
//! bumping the handle's generation and listing a [`RenderJob`]. Results
//! carry the generation back, so a result for anything but the latest
//! render is ignored.

#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

use folio_primitives::{
	AppliedTransaction, Bias, BoxFutureStatic, DiagramId, DiagramTheme, Document, Mapping, Node, NodeType,
	RenderOutcome, Signal,
};
use rustc_hash::FxHashMap;

use crate::config::DiagramConfig;
use crate::decoration::{Decoration, DiagramView, Widget};
use crate::error::{ProviderError, RenderError};
use crate::provider::{DecorationProvider, ProviderKind, Recompute, plan_recompute};

/// Class for diagram blocks whose raw source is hidden behind the preview.
pub const SOURCE_HIDDEN_CLASS: &str = "diagram-source-hidden";

/// External diagram renderer.
pub trait DiagramRenderer: Send + Sync {
	/// Renders `source` written in `notation` (the block's declared language).
	fn render(&self, source: &str, notation: &str, theme: DiagramTheme) -> BoxFutureStatic<Result<String, RenderError>>;
}

/// Renderer used when none is configured; every render fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRenderer;

impl DiagramRenderer for NoRenderer {
	fn render(&self, _source: &str, notation: &str, _theme: DiagramTheme) -> BoxFutureStatic<Result<String, RenderError>> {
		let message = format!("no renderer configured for {notation}");
		Box::pin(async move { Err(RenderError::Unavailable(message)) })
	}
}

/// A render the engine should start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
	pub id: DiagramId,
	pub generation: u64,
	pub source: String,
	pub notation: String,
	pub theme: DiagramTheme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramHandle {
	pub id: DiagramId,
	pub notation: String,
	pub source: String,
	/// Size of the owning block.
	pub size: usize,
	pub view: DiagramView,
	pub show_source: bool,
	/// Time of the last source change; `None` means due immediately.
	pub last_edit_at: Option<Instant>,
	/// A render is wanted once the quiet period has passed.
	pub pending: bool,
	/// Generation of the most recently started render.
	pub generation: u64,
	pub in_flight: Option<u64>,
}

impl DiagramHandle {
	/// A handle for a block first seen at `seen_at`; `None` when the block
	/// was part of the initial document.
	fn new(node: &Node, notation: String, seen_at: Option<Instant>) -> Self {
		let source = node.text_content();
		let empty = source.trim().is_empty();
		Self {
			id: DiagramId::new(),
			notation,
			size: node.node_size(),
			view: if empty { DiagramView::Empty } else { DiagramView::Pending },
			show_source: false,
			last_edit_at: seen_at.filter(|_| !empty),
			pending: !empty,
			generation: 0,
			in_flight: None,
			source,
		}
	}

	fn is_empty(&self) -> bool {
		self.source.trim().is_empty()
	}

	fn is_due(&self, now: Instant, debounce: Duration) -> bool {
		self.pending
			&& self
				.last_edit_at
				.is_none_or(|at| now.saturating_duration_since(at) >= debounce)
	}

	/// Records new source, keeping the previous artifact on screen.
	fn edit(&mut self, source: String, at: Instant) {
		self.source = source;
		if self.is_empty() {
			self.view = DiagramView::Empty;
			self.pending = false;
			self.last_edit_at = None;
			// Anything still rendering belongs to the old source.
			self.generation += 1;
			self.in_flight = None;
		} else {
			if self.view == DiagramView::Empty {
				self.view = DiagramView::Pending;
			}
			self.pending = true;
			self.last_edit_at = Some(at);
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramState {
	handles: FxHashMap<usize, DiagramHandle>,
	theme: DiagramTheme,
	jobs: Vec<RenderJob>,
}

impl DiagramState {
	pub fn theme(&self) -> DiagramTheme {
		self.theme
	}

	/// Handles sorted by block position.
	pub fn handles(&self) -> Vec<(usize, &DiagramHandle)> {
		let mut handles: Vec<_> = self.handles.iter().map(|(pos, h)| (*pos, h)).collect();
		handles.sort_unstable_by_key(|(pos, _)| *pos);
		handles
	}

	pub fn handle(&self, id: DiagramId) -> Option<(usize, &DiagramHandle)> {
		self.handles.iter().find(|(_, h)| h.id == id).map(|(pos, h)| (*pos, h))
	}

	fn handle_mut(&mut self, id: DiagramId) -> Option<&mut DiagramHandle> {
		self.handles.values_mut().find(|h| h.id == id)
	}

	/// Renders started by the last update.
	pub fn jobs(&self) -> &[RenderJob] {
		&self.jobs
	}

	pub fn take_jobs(&mut self) -> Vec<RenderJob> {
		std::mem::take(&mut self.jobs)
	}

	fn remap(&self, mapping: &Mapping, strict: bool) -> Result<FxHashMap<usize, DiagramHandle>, ProviderError> {
		let mut out = FxHashMap::default();
		for (pos, handle) in &self.handles {
			if *pos > mapping.old_size() {
				if strict {
					return Err(ProviderError::LostPosition {
						provider: ProviderKind::Diagram,
						pos: *pos,
					});
				}
				continue;
			}
			let mapped = mapping.map_result(*pos, Bias::Right);
			if mapped.deleted && !strict {
				continue;
			}
			out.insert(mapped.pos, handle.clone());
		}
		Ok(out)
	}
}

/// Diagram render provider.
pub struct DiagramProvider {
	languages: Vec<String>,
	debounce: Duration,
	theme: DiagramTheme,
}

impl DiagramProvider {
	pub fn new(config: &DiagramConfig) -> Self {
		Self {
			languages: config.languages.iter().map(|l| l.trim().to_ascii_lowercase()).collect(),
			debounce: config.debounce(),
			theme: config.theme,
		}
	}

	/// Declared notation of `node` when it is a diagram block.
	fn notation(&self, node: &Node) -> Option<String> {
		if node.kind() != NodeType::CodeBlock {
			return None;
		}
		let language = node.language()?.trim().to_ascii_lowercase();
		self.languages.contains(&language).then_some(language)
	}

	/// Matches diagram blocks in `doc` against remapped handles.
	///
	/// `time` is the transaction time; blocks found without one (at init)
	/// are due on the first tick.
	fn reconcile(
		&self,
		doc: &Document,
		mut cached: FxHashMap<usize, DiagramHandle>,
		time: Option<Instant>,
	) -> FxHashMap<usize, DiagramHandle> {
		let mut handles = FxHashMap::default();
		for (pos, node) in doc.find_all(NodeType::CodeBlock) {
			let Some(notation) = self.notation(&node) else {
				continue;
			};
			let handle = match cached.remove(&pos) {
				Some(mut handle) => {
					handle.size = node.node_size();
					let source = node.text_content();
					let at = time.unwrap_or_else(Instant::now);
					if handle.notation != notation {
						handle.notation = notation;
						handle.edit(source, at);
					} else if handle.source != source {
						handle.edit(source, at);
					}
					handle
				}
				None => {
					let handle = DiagramHandle::new(&node, notation, time);
					tracing::trace!(id = %handle.id, pos, "diagram.handle_created");
					handle
				}
			};
			handles.insert(pos, handle);
		}
		for handle in cached.values() {
			tracing::debug!(id = %handle.id, "diagram.prune");
		}
		handles
	}

	fn on_signal(&self, state: &mut DiagramState, signal: &Signal, now: Instant) {
		match signal {
			Signal::ToggleDiagramSource(id) => match state.handle_mut(*id) {
				Some(handle) => handle.show_source = !handle.show_source,
				None => tracing::debug!(%id, "diagram.toggle_unknown"),
			},
			Signal::DiagramTheme(theme) if *theme != state.theme => {
				state.theme = *theme;
				for handle in state.handles.values_mut().filter(|h| !h.is_empty()) {
					handle.pending = true;
					handle.last_edit_at = None;
				}
			}
			Signal::DiagramRendered { id, generation, outcome } => {
				let Some(handle) = state.handle_mut(*id) else {
					tracing::debug!(%id, generation, "diagram.result_for_unknown_block");
					return;
				};
				if handle.generation != *generation {
					tracing::debug!(%id, generation, current = handle.generation, "diagram.stale_result");
					return;
				}
				handle.in_flight = None;
				handle.view = match outcome {
					RenderOutcome::Rendered(markup) => DiagramView::Rendered { markup: markup.clone() },
					RenderOutcome::Failed(message) => {
						tracing::warn!(%id, %message, "diagram.render_failed");
						DiagramView::Error {
							message: message.clone(),
						}
					}
				};
			}
			Signal::Tick => {
				let mut due: Vec<(usize, DiagramId)> = state
					.handles
					.iter()
					.filter(|(_, h)| h.is_due(now, self.debounce))
					.map(|(pos, h)| (*pos, h.id))
					.collect();
				due.sort_unstable_by_key(|(pos, _)| *pos);
				let theme = state.theme;
				for (pos, _) in due {
					let Some(handle) = state.handles.get_mut(&pos) else {
						continue;
					};
					handle.generation += 1;
					handle.in_flight = Some(handle.generation);
					handle.pending = false;
					tracing::trace!(id = %handle.id, generation = handle.generation, "diagram.render_scheduled");
					state.jobs.push(RenderJob {
						id: handle.id,
						generation: handle.generation,
						source: handle.source.clone(),
						notation: handle.notation.clone(),
						theme,
					});
				}
			}
			_ => {}
		}
	}
}

impl DecorationProvider for DiagramProvider {
	type State = DiagramState;

	const KIND: ProviderKind = ProviderKind::Diagram;

	fn init(&self, doc: &Document) -> Result<DiagramState, ProviderError> {
		Ok(DiagramState {
			handles: self.reconcile(doc, FxHashMap::default(), None),
			theme: self.theme,
			jobs: Vec::new(),
		})
	}

	fn apply(&self, state: &DiagramState, tx: &AppliedTransaction) -> Result<DiagramState, ProviderError> {
		let handles = match plan_recompute(Self::KIND, tx, |node| self.notation(node).is_some(), false) {
			Recompute::Full(_) => self.reconcile(&tx.doc, state.remap(&tx.mapping, false)?, Some(tx.time)),
			Recompute::Remap => state.remap(&tx.mapping, true)?,
		};
		let mut next = DiagramState {
			handles,
			theme: state.theme,
			jobs: Vec::new(),
		};
		for signal in tx.signals() {
			self.on_signal(&mut next, signal, tx.time);
		}
		Ok(next)
	}

	fn decorate(&self, state: &DiagramState, _doc: &Document) -> Result<Vec<Decoration>, ProviderError> {
		let mut decorations = Vec::new();
		for (pos, handle) in state.handles() {
			decorations.push(Decoration::widget(
				Self::KIND,
				pos,
				Widget::Diagram {
					id: handle.id,
					view: handle.view.clone(),
					show_source: handle.show_source,
				},
			));
			if !handle.show_source {
				decorations.push(Decoration::node(Self::KIND, pos, pos + handle.size, SOURCE_HIDDEN_CLASS));
			}
		}
		Ok(decorations)
	}
}
