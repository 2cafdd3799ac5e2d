//! Transactions: ordered steps plus metadata, and their applied form.

mod mapping;
mod origin;
mod step;


use std::time::Instant;

pub use mapping::{Bias, MapRange, MapResult, Mapping, StepMap};
pub use origin::{Origin, OriginMarkers};
pub use step::{Step, StepError};

use crate::attrs::AttrValue;
use crate::document::Document;
use crate::node::{Fragment, Node};
use crate::schema::Mark;
use crate::selection::Selection;
use crate::signal::Signal;

/// An ordered batch of steps with origin markers, selections and signals.
///
/// Transactions are built with the chaining methods below and consumed by
/// [`Transaction::apply`]. Step positions are interpreted against the document
/// as it is after all preceding steps of the same transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
	steps: Vec<Step>,
	markers: OriginMarkers,
	selection_before: Option<Selection>,
	selection_after: Option<Selection>,
	signals: Vec<Signal>,
	time: Instant,
}

impl Default for Transaction {
	fn default() -> Self {
		Self::new()
	}
}

impl Transaction {
	/// Creates an empty local transaction stamped with the current time.
	pub fn new() -> Self {
		Self {
			steps: Vec::new(),
			markers: OriginMarkers::empty(),
			selection_before: None,
			selection_after: None,
			signals: Vec::new(),
			time: Instant::now(),
		}
	}

	/// Creates a step-less programmatic transaction carrying one signal.
	pub fn signal(signal: Signal) -> Self {
		Self::new().with_marker(OriginMarkers::PROGRAMMATIC).with_signal(signal)
	}

	pub fn step(mut self, step: Step) -> Self {
		self.steps.push(step);
		self
	}

	pub fn replace(self, from: usize, to: usize, content: Fragment) -> Self {
		self.step(Step::Replace { from, to, content })
	}

	pub fn insert(self, pos: usize, content: Fragment) -> Self {
		self.step(Step::insert(pos, content))
	}

	/// Inserts a single node at `pos`.
	pub fn insert_node(self, pos: usize, node: Node) -> Self {
		self.insert(pos, Fragment::single(node))
	}

	pub fn delete(self, from: usize, to: usize) -> Self {
		self.step(Step::delete(from, to))
	}

	pub fn set_node_attr(self, pos: usize, name: &str, value: impl Into<AttrValue>) -> Self {
		self.step(Step::SetNodeAttr {
			pos,
			name: name.to_string(),
			value: value.into(),
		})
	}

	pub fn add_mark(self, from: usize, to: usize, mark: Mark) -> Self {
		self.step(Step::AddMark { from, to, mark })
	}

	pub fn remove_mark(self, from: usize, to: usize, mark: Mark) -> Self {
		self.step(Step::RemoveMark { from, to, mark })
	}

	/// Adds an origin marker.
	pub fn with_marker(mut self, marker: OriginMarkers) -> Self {
		self.markers |= marker;
		self
	}

	pub fn with_signal(mut self, signal: Signal) -> Self {
		self.signals.push(signal);
		self
	}

	pub fn with_selection_before(mut self, selection: Selection) -> Self {
		self.selection_before = Some(selection);
		self
	}

	pub fn with_selection_after(mut self, selection: Selection) -> Self {
		self.selection_after = Some(selection);
		self
	}

	/// Overrides the timestamp.
	pub fn at(mut self, time: Instant) -> Self {
		self.time = time;
		self
	}

	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	pub fn markers(&self) -> OriginMarkers {
		self.markers
	}

	pub fn signals(&self) -> &[Signal] {
		&self.signals
	}

	pub fn time(&self) -> Instant {
		self.time
	}

	/// Classifies this transaction's origin from its markers.
	pub fn origin(&self) -> Origin {
		Origin::classify(self.markers)
	}

	pub fn has_steps(&self) -> bool {
		!self.steps.is_empty()
	}

	/// Applies every step in order to `doc`.
	///
	/// Fails atomically: on error nothing of the transaction is applied and
	/// `doc` remains the current version.
	///
	/// # Returns
	/// The new document together with the mapping, classified origin and
	/// everything providers need to update their state.
	pub fn apply(self, doc: &Document) -> Result<AppliedTransaction, StepError> {
		let origin = self.origin();
		let mut mapping = Mapping::identity(doc.content_size());
		let mut current = doc.clone();
		let mut step_docs = Vec::with_capacity(self.steps.len());
		for step in &self.steps {
			let (root, map) = step.apply(&current)?;
			let next = Document::new(root)?;
			mapping.push(map, next.content_size());
			step_docs.push(current);
			current = next;
		}

		let doc_after = if self.steps.is_empty() {
			doc.clone()
		} else {
			doc.successor(current.root().clone())
		};
		let selection = self
			.selection_after
			.or_else(|| self.selection_before.map(|sel| sel.map(&mapping)));

		Ok(AppliedTransaction {
			origin,
			markers: self.markers,
			doc_before: doc.clone(),
			doc: doc_after,
			mapping,
			steps: self.steps,
			step_docs,
			signals: self.signals,
			selection,
			time: self.time,
		})
	}
}

/// A transaction after it has been applied to a document.
#[derive(Debug, Clone)]
pub struct AppliedTransaction {
	/// Classified once, when the transaction was applied.
	pub origin: Origin,
	pub markers: OriginMarkers,
	pub doc_before: Document,
	pub doc: Document,
	/// Maps `doc_before` positions to `doc` positions.
	pub mapping: Mapping,
	pub steps: Vec<Step>,
	/// Document each step was applied to, parallel to `steps`.
	step_docs: Vec<Document>,
	pub signals: Vec<Signal>,
	/// Selection after the transaction, when one was supplied or mapped.
	pub selection: Option<Selection>,
	pub time: Instant,
}

impl AppliedTransaction {
	/// Returns true when the document changed.
	pub fn doc_changed(&self) -> bool {
		!self.steps.is_empty()
	}

	/// Iterates the carried signals.
	pub fn signals(&self) -> impl Iterator<Item = &Signal> {
		self.signals.iter()
	}

	/// Returns the first signal matching `f`.
	pub fn find_signal<T>(&self, f: impl FnMut(&Signal) -> Option<T>) -> Option<T> {
		self.signals.iter().find_map(f)
	}

	/// Returns true when any step's edited range intersects a node matching `pred`.
	///
	/// Checks the nodes around each step in the document it was applied to,
	/// plus every node the step inserts. An attribute change is checked
	/// against the node both before and after the step.
	pub fn touches(&self, mut pred: impl FnMut(&Node) -> bool) -> bool {
		let afters = self.step_docs.iter().skip(1).chain(std::iter::once(&self.doc));
		self.steps.iter().zip(&self.step_docs).zip(afters).any(|((step, before), after)| match step {
			Step::Replace { from, to, content } => {
				any_between(before, *from, *to, &mut pred) || content.iter().any(|node| any_within(node, &mut pred))
			}
			Step::SetNodeAttr { pos, .. } => {
				before.node_at(*pos).is_some_and(&mut pred) || after.node_at(*pos).is_some_and(&mut pred)
			}
			Step::AddMark { from, to, .. } | Step::RemoveMark { from, to, .. } => {
				any_between(before, *from, *to, &mut pred)
			}
		})
	}
}

fn any_between(doc: &Document, from: usize, to: usize, pred: &mut impl FnMut(&Node) -> bool) -> bool {
	let mut hit = false;
	doc.nodes_between(from, to, |node, _| {
		hit = hit || pred(node);
		!hit
	});
	hit
}

fn any_within(node: &Node, pred: &mut impl FnMut(&Node) -> bool) -> bool {
	if pred(node) {
		return true;
	}
	let mut hit = false;
	node.descendants(0, &mut |child: &Node, _| {
		hit = hit || pred(child);
		!hit
	});
	hit
}
