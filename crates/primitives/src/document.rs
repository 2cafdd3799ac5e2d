//! Versioned document trees and position resolution.

use thiserror::Error;

use crate::node::{Fragment, Node};
use crate::schema::{NodeType, SchemaError};

/// Errors raised when resolving a position against a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
	/// The position lies beyond the end of the document content.
	#[error("position {pos} is outside the document (size {size})")]
	OutOfRange {
		/// Requested position.
		pos: usize,
		/// Content size of the document.
		size: usize,
	},
}

/// An immutable document version.
///
/// Editing never mutates a document; applying a transaction produces a new
/// document whose version is one higher and which shares every untouched
/// subtree with its predecessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	root: Node,
	version: u64,
}

impl Document {
	/// Wraps a `doc` node as version zero.
	pub fn new(root: Node) -> Result<Self, SchemaError> {
		if root.kind() != NodeType::Doc {
			return Err(SchemaError::InvalidRoot(root.kind().name()));
		}
		Ok(Self { root, version: 0 })
	}

	/// Builds a document from top-level blocks.
	pub fn from_blocks(blocks: impl IntoIterator<Item = Node>) -> Result<Self, SchemaError> {
		Self::new(Node::block(NodeType::Doc, blocks)?)
	}

	/// Decodes a serialized `doc` node, re-validating the schema.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		let root: Node = serde_json::from_str(json)?;
		Self::new(root).map_err(serde::de::Error::custom)
	}

	/// Returns the successor version with a new root.
	pub(crate) fn successor(&self, root: Node) -> Self {
		Self {
			root,
			version: self.version + 1,
		}
	}

	pub fn root(&self) -> &Node {
		&self.root
	}

	pub fn version(&self) -> u64 {
		self.version
	}

	/// Size of the document content; valid positions are `0..=content_size()`.
	pub fn content_size(&self) -> usize {
		self.root.content_size()
	}

	pub fn content(&self) -> &Fragment {
		self.root.content()
	}

	/// Iterates top-level blocks with their start positions.
	pub fn blocks(&self) -> impl Iterator<Item = (usize, &Node)> {
		self.root.children().iter().scan(0, |pos, node| {
			let start = *pos;
			*pos += node.node_size();
			Some((start, node))
		})
	}

	/// Calls `f` for every node with its absolute start position.
	///
	/// Returning `false` from `f` skips that node's children.
	pub fn descendants<F>(&self, mut f: F)
	where
		F: FnMut(&Node, usize) -> bool,
	{
		self.root.descendants(0, &mut f);
	}

	/// Calls `f` for every node overlapping `from..to`.
	pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
	where
		F: FnMut(&Node, usize) -> bool,
	{
		self.root.nodes_between(from, to, 0, &mut f);
	}

	/// Collects every node of the given type with its start position.
	pub fn find_all(&self, kind: NodeType) -> Vec<(usize, Node)> {
		let mut found = Vec::new();
		self.descendants(|node, pos| {
			if node.kind() == kind {
				found.push((pos, node.clone()));
			}
			!node.is_textblock()
		});
		found
	}

	/// Returns the node starting exactly at `pos`, if any.
	pub fn node_at(&self, pos: usize) -> Option<&Node> {
		let mut node = &self.root;
		let mut offset = pos;
		loop {
			let (index, start) = node.content().find_index(offset)?;
			let child = node.child(index)?;
			if start == offset {
				return Some(child);
			}
			if child.is_text() || child.is_leaf() {
				return None;
			}
			offset -= start + 1;
			node = child;
		}
	}

	/// Resolves `pos` into its ancestor path.
	pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, PositionError> {
		let size = self.content_size();
		if pos > size {
			return Err(PositionError::OutOfRange { pos, size });
		}

		let mut levels = Vec::new();
		let mut node = self.root.clone();
		let mut start = 0;
		loop {
			let offset = pos - start;
			let Some((index, child_start)) = node.content().find_index(offset) else {
				return Err(PositionError::OutOfRange { pos, size });
			};
			let descend = node
				.child(index)
				.filter(|child| child_start < offset && !child.is_text() && !child.is_leaf())
				.cloned();
			levels.push(Level {
				node,
				index,
				start,
				child_start,
			});
			match descend {
				Some(child) => {
					start += child_start + 1;
					node = child;
				}
				None => break,
			}
		}

		Ok(ResolvedPos { pos, levels })
	}

	/// Concatenated text of the whole document.
	pub fn text_content(&self) -> String {
		self.root.text_content()
	}

	/// Markdown-flavoured rendering of the document.
	pub fn to_text(&self) -> String {
		self.root.to_text()
	}
}

#[derive(Debug, Clone)]
struct Level {
	node: Node,
	index: usize,
	/// Absolute position where this node's content starts.
	start: usize,
	/// Offset (within the content) where the child at `index` starts.
	child_start: usize,
}

/// A position together with the chain of nodes containing it.
///
/// Depth 0 is the document root; [`ResolvedPos::depth`] is the innermost
/// non-text node whose content contains the position.
#[derive(Debug, Clone)]
pub struct ResolvedPos {
	pos: usize,
	levels: Vec<Level>,
}

impl ResolvedPos {
	pub fn pos(&self) -> usize {
		self.pos
	}

	pub fn depth(&self) -> usize {
		self.levels.len() - 1
	}

	fn level(&self, depth: usize) -> &Level {
		&self.levels[depth.min(self.depth())]
	}

	/// Innermost ancestor containing the position.
	pub fn parent(&self) -> &Node {
		&self.level(self.depth()).node
	}

	/// Ancestor at `depth`, clamped to [`Self::depth`].
	pub fn node(&self, depth: usize) -> &Node {
		&self.level(depth).node
	}

	/// Child index within the ancestor at `depth`.
	pub fn index(&self, depth: usize) -> usize {
		self.level(depth).index
	}

	/// Absolute position where the content of the ancestor at `depth` starts.
	pub fn start(&self, depth: usize) -> usize {
		self.level(depth).start
	}

	/// Absolute position where the content of the ancestor at `depth` ends.
	pub fn end(&self, depth: usize) -> usize {
		let level = self.level(depth);
		level.start + level.node.content_size()
	}

	/// Absolute position directly before the ancestor at `depth` (`depth >= 1`).
	pub fn before(&self, depth: usize) -> Option<usize> {
		(depth >= 1 && depth <= self.depth()).then(|| self.start(depth) - 1)
	}

	/// Absolute position directly after the ancestor at `depth` (`depth >= 1`).
	pub fn after(&self, depth: usize) -> Option<usize> {
		(depth >= 1 && depth <= self.depth()).then(|| self.end(depth) + 1)
	}

	/// Offset of the position within its parent's content.
	pub fn parent_offset(&self) -> usize {
		self.pos - self.start(self.depth())
	}

	/// Offset into the text node at the position, zero at a node boundary.
	pub fn text_offset(&self) -> usize {
		let level = self.level(self.depth());
		self.parent_offset() - level.child_start
	}

	/// Node directly after the position, when it sits on a child boundary.
	pub fn node_after(&self) -> Option<&Node> {
		(self.text_offset() == 0)
			.then(|| self.parent().child(self.index(self.depth())))
			.flatten()
	}

	/// Returns true when `other` shares this position's parent node.
	pub fn same_parent(&self, other: &ResolvedPos) -> bool {
		self.depth() == other.depth() && self.start(self.depth()) == other.start(other.depth())
	}

	/// Iterates ancestors from the root down to the parent.
	pub fn ancestors(&self) -> impl Iterator<Item = &Node> {
		self.levels.iter().map(|level| &level.node)
	}

	/// Returns true when any ancestor is a code node.
	pub fn in_code(&self) -> bool {
		self.ancestors().any(|node| node.kind().is_code())
	}
}
