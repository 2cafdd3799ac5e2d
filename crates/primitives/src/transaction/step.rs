use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mapping::StepMap;
use crate::attrs::AttrValue;
use crate::document::{Document, PositionError, ResolvedPos};
use crate::node::{Fragment, MarkSet, Node};
use crate::schema::{Mark, SchemaError};

/// Errors raised when a step cannot be applied to a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
	/// A step position does not exist in the document.
	#[error(transparent)]
	Position(#[from] PositionError),
	/// The edit would produce a tree the schema rejects.
	#[error(transparent)]
	Schema(#[from] SchemaError),
	/// `from` is after `to`.
	#[error("inverted range {from}..{to}")]
	InvertedRange {
		/// Range start.
		from: usize,
		/// Range end.
		to: usize,
	},
	/// The two ends of a replacement live in different parent nodes.
	#[error("replace range {from}..{to} crosses node boundaries")]
	CrossesParent {
		/// Range start.
		from: usize,
		/// Range end.
		to: usize,
	},
	/// A replacement boundary cuts through a non-text child.
	#[error("position {0} does not sit on a child boundary")]
	NotOnBoundary(usize),
	/// No node starts at the addressed position.
	#[error("no node starts at position {0}")]
	NoNodeAt(usize),
}

/// A primitive document edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
	/// Replaces `from..to` (same parent) with `content`.
	Replace {
		from: usize,
		to: usize,
		#[serde(default)]
		content: Fragment,
	},
	/// Sets one attribute on the node starting at `pos`.
	SetNodeAttr { pos: usize, name: String, value: AttrValue },
	/// Adds `mark` to text inside `from..to`.
	AddMark { from: usize, to: usize, mark: Mark },
	/// Removes `mark` from text inside `from..to`.
	RemoveMark { from: usize, to: usize, mark: Mark },
}

impl Step {
	/// Inserts `content` at `pos`.
	pub fn insert(pos: usize, content: Fragment) -> Step {
		Step::Replace {
			from: pos,
			to: pos,
			content,
		}
	}

	/// Deletes `from..to`.
	pub fn delete(from: usize, to: usize) -> Step {
		Step::Replace {
			from,
			to,
			content: Fragment::empty(),
		}
	}

	/// Applies this step, producing the new root and the step's position map.
	pub fn apply(&self, doc: &Document) -> Result<(Node, StepMap), StepError> {
		match self {
			Step::Replace { from, to, content } => replace(doc, *from, *to, content),
			Step::SetNodeAttr { pos, name, value } => {
				let rpos = doc.resolve(*pos)?;
				let target = rpos.node_after().ok_or(StepError::NoNodeAt(*pos))?;
				let mut attrs = target.attrs().clone();
				attrs.insert(name, value.clone());
				let updated = target.with_attrs(attrs)?;
				let depth = rpos.depth();
				let parent = rpos.parent();
				let content = parent
					.content()
					.replace_child(rpos.index(depth), updated)
					.ok_or(StepError::NoNodeAt(*pos))?;
				let root = rebuild(&rpos, parent.with_content(content)?)?;
				Ok((root, StepMap::identity()))
			}
			Step::AddMark { from, to, mark } => {
				let root = remark(doc, *from, *to, &|marks: &MarkSet| marks.with(mark.clone()))?;
				Ok((root, StepMap::identity()))
			}
			Step::RemoveMark { from, to, mark } => {
				let root = remark(doc, *from, *to, &|marks: &MarkSet| marks.without(mark))?;
				Ok((root, StepMap::identity()))
			}
		}
	}

	/// Position range this step reads or writes, in pre-step coordinates.
	pub fn range(&self) -> (usize, usize) {
		match self {
			Step::Replace { from, to, .. } | Step::AddMark { from, to, .. } | Step::RemoveMark { from, to, .. } => {
				(*from, *to)
			}
			Step::SetNodeAttr { pos, .. } => (*pos, *pos),
		}
	}
}

fn replace(doc: &Document, from: usize, to: usize, content: &Fragment) -> Result<(Node, StepMap), StepError> {
	if from > to {
		return Err(StepError::InvertedRange { from, to });
	}
	let start = doc.resolve(from)?;
	let end = doc.resolve(to)?;
	if !start.same_parent(&end) {
		return Err(StepError::CrossesParent { from, to });
	}

	let parent = start.parent();
	let old = parent.content();
	let head = old.cut(0, start.parent_offset()).ok_or(StepError::NotOnBoundary(from))?;
	let tail = old
		.cut(end.parent_offset(), old.size())
		.ok_or(StepError::NotOnBoundary(to))?;
	let updated = parent.with_content(head.append(content).append(&tail))?;
	let root = rebuild(&start, updated)?;
	Ok((root, StepMap::replace(from, to - from, content.size())))
}

/// Replaces the innermost ancestor of `rpos` with `node` and rebuilds the path to the root.
fn rebuild(rpos: &ResolvedPos, node: Node) -> Result<Node, StepError> {
	let mut node = node;
	for depth in (0..rpos.depth()).rev() {
		let ancestor = rpos.node(depth);
		let content = ancestor
			.content()
			.replace_child(rpos.index(depth), node)
			.ok_or(StepError::NoNodeAt(rpos.pos()))?;
		node = ancestor.with_content(content)?;
	}
	Ok(node)
}

fn remark<F>(doc: &Document, from: usize, to: usize, f: &F) -> Result<Node, StepError>
where
	F: Fn(&MarkSet) -> MarkSet,
{
	if from > to {
		return Err(StepError::InvertedRange { from, to });
	}
	let size = doc.content_size();
	if to > size {
		return Err(PositionError::OutOfRange { pos: to, size }.into());
	}
	Ok(remark_node(doc.root(), from, to, f)?)
}

/// Rewrites marks on text overlapping `from..to` (content-relative to `node`).
fn remark_node<F>(node: &Node, from: usize, to: usize, f: &F) -> Result<Node, SchemaError>
where
	F: Fn(&MarkSet) -> MarkSet,
{
	if node.kind().is_code() {
		return Ok(node.clone());
	}
	let mut changed = false;
	let mut children = Vec::with_capacity(node.child_count());
	let mut pos = 0;
	for child in node.children() {
		let end = pos + child.node_size();
		if end <= from || pos >= to {
			children.push(child.clone());
		} else if let Some(text) = child.text() {
			let chars: Vec<char> = text.chars().collect();
			let cut_from = from.saturating_sub(pos);
			let cut_to = (to - pos).min(chars.len());
			let pieces = [
				(0, cut_from, child.marks().clone()),
				(cut_from, cut_to, f(child.marks())),
				(cut_to, chars.len(), child.marks().clone()),
			];
			for (a, b, marks) in pieces {
				if a < b {
					children.push(Node::new_text(chars[a..b].iter().collect::<String>(), marks)?);
				}
			}
			changed = true;
		} else if child.content_size() > 0 {
			let start = pos + 1;
			children.push(remark_node(
				child,
				from.saturating_sub(start),
				to.saturating_sub(start).min(child.content_size()),
				f,
			)?);
			changed = true;
		} else {
			children.push(child.clone());
		}
		pos = end;
	}
	if !changed {
		return Ok(node.clone());
	}
	node.with_content(Fragment::from_nodes(children))
}
