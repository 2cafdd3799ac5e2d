//! Immutable document nodes.
//!
//! Nodes are cheap to clone: children live behind an [`Arc`], so editing a
//! deep node only rebuilds the path from the root to that node while every
//! untouched subtree is shared between versions.
//!
//! # Positions
//!
//! A node's *size* is the number of positions it spans in its parent:
//! text nodes count one per `char`, leaf nodes count one, and every other node
//! counts its content plus two for the opening and closing boundary.


use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attrs::{AttrValue, Attrs};
use crate::schema::{ContentRule, Mark, NodeType, SchemaError};

/// Sorted set of marks on a text node, at most one per [`Mark::rank`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkSet(SmallVec<[Mark; 2]>);

impl MarkSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a set from arbitrary marks, later marks replacing earlier ones of the same rank.
	pub fn from_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
		marks.into_iter().fold(Self::new(), |set, mark| set.with(mark))
	}

	/// Returns a copy with `mark` added (replacing a mark of the same rank).
	pub fn with(&self, mark: Mark) -> Self {
		let mut marks = self.0.clone();
		marks.retain(|m| m.rank() != mark.rank());
		let at = marks.iter().position(|m| m.rank() > mark.rank()).unwrap_or(marks.len());
		marks.insert(at, mark);
		Self(marks)
	}

	/// Returns a copy without any mark of the same rank as `mark`.
	pub fn without(&self, mark: &Mark) -> Self {
		let mut marks = self.0.clone();
		marks.retain(|m| m.rank() != mark.rank());
		Self(marks)
	}

	pub fn contains(&self, mark: &Mark) -> bool {
		self.0.contains(mark)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Mark> {
		self.0.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Ordered, shared list of child nodes.
#[derive(Clone, Default)]
pub struct Fragment {
	nodes: Arc<[Node]>,
	size: usize,
}

impl Fragment {
	pub fn empty() -> Self {
		Self::default()
	}

	/// Builds a fragment, merging adjacent text nodes that carry identical marks.
	pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
		let mut out: Vec<Node> = Vec::new();
		for node in nodes {
			if let (Some(prev), Some(text)) = (out.last_mut(), node.text())
				&& let Some(prev_text) = prev.text()
				&& prev.marks == node.marks
			{
				let joined = format!("{prev_text}{text}");
				*prev = Node::text_unchecked(joined, prev.marks.clone());
				continue;
			}
			out.push(node);
		}
		let size = out.iter().map(Node::node_size).sum();
		Self { nodes: out.into(), size }
	}

	pub fn single(node: Node) -> Self {
		Self::from_nodes([node])
	}

	/// Total size of the fragment in positions.
	pub fn size(&self) -> usize {
		self.size
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn child(&self, index: usize) -> Option<&Node> {
		self.nodes.get(index)
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Node> {
		self.nodes.iter()
	}

	/// Finds the child containing `offset`.
	///
	/// Returns `(index, child_start)`. An offset equal to the fragment size
	/// yields `(len, size)`; offsets beyond it yield `None`.
	pub fn find_index(&self, offset: usize) -> Option<(usize, usize)> {
		if offset > self.size {
			return None;
		}
		let mut pos = 0;
		for (index, child) in self.nodes.iter().enumerate() {
			let end = pos + child.node_size();
			if offset < end {
				return Some((index, pos));
			}
			pos = end;
		}
		Some((self.nodes.len(), pos))
	}

	/// Returns the part of this fragment between two offsets.
	///
	/// Text nodes are split at char boundaries; cutting through any other
	/// child yields `None`.
	pub fn cut(&self, from: usize, to: usize) -> Option<Fragment> {
		if from > to || to > self.size {
			return None;
		}
		let mut out = Vec::new();
		let mut pos = 0;
		for child in self.nodes.iter() {
			let end = pos + child.node_size();
			if end > from && pos < to {
				if from <= pos && end <= to {
					out.push(child.clone());
				} else if let Some(text) = child.text() {
					let start = from.saturating_sub(pos);
					let stop = (to - pos).min(end - pos);
					let piece: String = text.chars().skip(start).take(stop - start).collect();
					out.push(Node::text_unchecked(piece, child.marks.clone()));
				} else {
					return None;
				}
			}
			pos = end;
		}
		Some(Fragment::from_nodes(out))
	}

	/// Concatenates two fragments.
	pub fn append(&self, other: &Fragment) -> Fragment {
		Fragment::from_nodes(self.nodes.iter().chain(other.nodes.iter()).cloned())
	}

	/// Returns a copy with the child at `index` replaced, or `None` if out of range.
	pub fn replace_child(&self, index: usize, node: Node) -> Option<Fragment> {
		let mut nodes = self.nodes.to_vec();
		*nodes.get_mut(index)? = node;
		Some(Fragment::from_nodes(nodes))
	}

	/// Concatenated text of all descendants.
	pub fn text_content(&self) -> String {
		let mut out = String::new();
		for node in self.nodes.iter() {
			node.push_text(&mut out);
		}
		out
	}
}

impl PartialEq for Fragment {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.nodes, &other.nodes) || (self.size == other.size && self.nodes == other.nodes)
	}
}

impl Eq for Fragment {}

impl Hash for Fragment {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.nodes.hash(state);
	}
}

impl fmt::Debug for Fragment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.nodes.iter()).finish()
	}
}

impl Serialize for Fragment {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_seq(self.nodes.iter())
	}
}

impl<'de> Deserialize<'de> for Fragment {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let nodes = Vec::<Node>::deserialize(deserializer)?;
		Ok(Fragment::from_nodes(nodes))
	}
}

/// An immutable document node.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
	kind: NodeType,
	attrs: Attrs,
	content: Fragment,
	text: Option<Arc<str>>,
	marks: MarkSet,
	size: usize,
}

impl Node {
	/// Builds a non-text node, validating attributes and children.
	pub fn new(kind: NodeType, attrs: Attrs, content: Fragment) -> Result<Node, SchemaError> {
		if kind == NodeType::Text {
			return Err(SchemaError::EmptyText);
		}
		let attrs = kind.check_attrs(attrs)?;
		check_content(kind, &content)?;
		let size = if kind.is_leaf() { 1 } else { content.size() + 2 };
		Ok(Node {
			kind,
			attrs,
			content,
			text: None,
			marks: MarkSet::new(),
			size,
		})
	}

	/// Builds a node with default attributes from a list of children.
	pub fn block(kind: NodeType, children: impl IntoIterator<Item = Node>) -> Result<Node, SchemaError> {
		Node::new(kind, Attrs::new(), Fragment::from_nodes(children))
	}

	/// Builds a leaf node with default attributes.
	pub fn leaf(kind: NodeType) -> Result<Node, SchemaError> {
		Node::new(kind, Attrs::new(), Fragment::empty())
	}

	/// Builds a text node. Text must be non-empty.
	pub fn new_text(text: impl Into<String>, marks: MarkSet) -> Result<Node, SchemaError> {
		let text = text.into();
		if text.is_empty() {
			return Err(SchemaError::EmptyText);
		}
		Ok(Node::text_unchecked(text, marks))
	}

	/// Builds an unmarked text node.
	pub fn plain_text(text: impl Into<String>) -> Result<Node, SchemaError> {
		Node::new_text(text, MarkSet::new())
	}

	pub(crate) fn text_unchecked(text: String, marks: MarkSet) -> Node {
		let size = text.chars().count();
		Node {
			kind: NodeType::Text,
			attrs: Attrs::new(),
			content: Fragment::empty(),
			text: Some(text.into()),
			marks,
			size,
		}
	}

	/// Builds a paragraph holding `text`, or an empty paragraph for empty input.
	pub fn paragraph(text: &str) -> Result<Node, SchemaError> {
		let children = (!text.is_empty()).then(|| Node::plain_text(text)).transpose()?;
		Node::block(NodeType::Paragraph, children)
	}

	/// Builds a heading of the given level holding `text`.
	pub fn heading(level: i64, text: &str) -> Result<Node, SchemaError> {
		let children = (!text.is_empty()).then(|| Node::plain_text(text)).transpose()?;
		Node::new(
			NodeType::Heading,
			Attrs::new().with("level", level),
			Fragment::from_nodes(children),
		)
	}

	/// Builds a code block with an optional declared language.
	pub fn code_block(language: Option<&str>, text: &str) -> Result<Node, SchemaError> {
		let children = (!text.is_empty()).then(|| Node::plain_text(text)).transpose()?;
		Node::new(
			NodeType::CodeBlock,
			Attrs::new().with("language", language),
			Fragment::from_nodes(children),
		)
	}

	pub fn kind(&self) -> NodeType {
		self.kind
	}

	pub fn attrs(&self) -> &Attrs {
		&self.attrs
	}

	pub fn attr(&self, name: &str) -> Option<&AttrValue> {
		self.attrs.get(name)
	}

	pub fn content(&self) -> &Fragment {
		&self.content
	}

	pub fn children(&self) -> &[Node] {
		self.content.nodes()
	}

	pub fn child(&self, index: usize) -> Option<&Node> {
		self.content.child(index)
	}

	pub fn child_count(&self) -> usize {
		self.content.len()
	}

	/// Text payload for text nodes.
	pub fn text(&self) -> Option<&str> {
		self.text.as_deref()
	}

	pub fn marks(&self) -> &MarkSet {
		&self.marks
	}

	/// Number of positions this node spans in its parent.
	pub fn node_size(&self) -> usize {
		self.size
	}

	/// Size of this node's content.
	pub fn content_size(&self) -> usize {
		self.content.size()
	}

	pub fn is_text(&self) -> bool {
		self.kind == NodeType::Text
	}

	pub fn is_leaf(&self) -> bool {
		self.kind.is_leaf()
	}

	pub fn is_block(&self) -> bool {
		self.kind.is_block()
	}

	pub fn is_textblock(&self) -> bool {
		self.kind.is_textblock()
	}

	/// Heading level for headings.
	pub fn heading_level(&self) -> Option<u8> {
		if !self.kind.is_heading() {
			return None;
		}
		self.attr("level").and_then(AttrValue::as_int).and_then(|n| u8::try_from(n).ok())
	}

	/// Declared language for code blocks.
	pub fn language(&self) -> Option<&str> {
		if !self.kind.is_code() {
			return None;
		}
		self.attr("language").and_then(AttrValue::as_str)
	}

	/// Concatenated text of all descendants.
	pub fn text_content(&self) -> String {
		let mut out = String::new();
		self.push_text(&mut out);
		out
	}

	fn push_text(&self, out: &mut String) {
		match &self.text {
			Some(text) => out.push_str(text),
			None if self.kind == NodeType::HardBreak => out.push('\n'),
			None => {
				for child in self.content.iter() {
					child.push_text(out);
				}
			}
		}
	}

	/// Returns a copy with new content, re-validated against the schema.
	pub fn with_content(&self, content: Fragment) -> Result<Node, SchemaError> {
		Node::new(self.kind, self.attrs.clone(), content)
	}

	/// Returns a copy with new attributes, re-validated against the schema.
	pub fn with_attrs(&self, attrs: Attrs) -> Result<Node, SchemaError> {
		if self.is_text() {
			return if attrs.is_empty() {
				Ok(self.clone())
			} else {
				Err(SchemaError::UnknownAttr {
					node: "text",
					attr: attrs.names().next().unwrap_or_default().to_string(),
				})
			};
		}
		Node::new(self.kind, attrs, self.content.clone())
	}

	/// Returns a copy of a text node with different marks.
	pub fn with_marks(&self, marks: MarkSet) -> Result<Node, SchemaError> {
		match &self.text {
			Some(text) => Ok(Node::text_unchecked(text.to_string(), marks)),
			None => Err(SchemaError::UnexpectedMarks),
		}
	}

	/// Calls `f` for every descendant with its position relative to `base`.
	///
	/// `base` is the absolute position of this node's content start. Returning
	/// `false` from `f` skips the node's children.
	pub fn descendants<F>(&self, base: usize, f: &mut F)
	where
		F: FnMut(&Node, usize) -> bool,
	{
		self.nodes_between(0, self.content_size(), base, f);
	}

	/// Calls `f` for every descendant overlapping `from..to` (content-relative).
	///
	/// `base` is the absolute position of this node's content start. Returning
	/// `false` from `f` skips the node's children.
	pub fn nodes_between<F>(&self, from: usize, to: usize, base: usize, f: &mut F)
	where
		F: FnMut(&Node, usize) -> bool,
	{
		let mut pos = 0;
		for child in self.content.iter() {
			if pos >= to {
				break;
			}
			let end = pos + child.node_size();
			if end > from && f(child, base + pos) && child.content_size() > 0 {
				let start = pos + 1;
				child.nodes_between(
					from.saturating_sub(start),
					to.saturating_sub(start).min(child.content_size()),
					base + start,
					f,
				);
			}
			pos = end;
		}
	}

	/// Markdown-flavoured plain text rendering of this node.
	pub fn to_text(&self) -> String {
		crate::text::to_text(self)
	}
}

fn check_content(kind: NodeType, content: &Fragment) -> Result<(), SchemaError> {
	let spec = kind.spec();
	for child in content.iter() {
		if !kind.allows_child(child.kind) {
			return Err(SchemaError::InvalidChild {
				parent: spec.name,
				child: child.kind.name(),
			});
		}
		if spec.content == ContentRule::PlainText && !child.marks.is_empty() {
			return Err(SchemaError::UnexpectedMarks);
		}
	}
	Ok(())
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.text {
			Some(text) if self.marks.is_empty() => write!(f, "{text:?}"),
			Some(text) => write!(f, "{text:?}{:?}", self.marks),
			None if self.content.is_empty() && self.attrs.is_empty() => f.write_str(self.kind.name()),
			None => {
				write!(f, "{}", self.kind.name())?;
				if !self.attrs.is_empty() {
					write!(f, "{:?}", self.attrs)?;
				}
				write!(f, "{:?}", self.content)
			}
		}
	}
}

/// Serialized form of a [`Node`]; converting back re-validates the schema.
#[derive(Serialize, Deserialize)]
struct RawNode {
	#[serde(rename = "type")]
	kind: NodeType,
	#[serde(default, skip_serializing_if = "Attrs::is_empty")]
	attrs: Attrs,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	content: Vec<Node>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	text: Option<String>,
	#[serde(default, skip_serializing_if = "MarkSet::is_empty")]
	marks: MarkSet,
}

impl TryFrom<RawNode> for Node {
	type Error = SchemaError;

	fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
		match (raw.kind, raw.text) {
			(NodeType::Text, Some(text)) => {
				if !raw.attrs.is_empty() {
					return Err(SchemaError::UnknownAttr {
						node: "text",
						attr: raw.attrs.names().next().unwrap_or_default().to_string(),
					});
				}
				// Re-normalize through from_marks so duplicate ranks collapse.
				Node::new_text(text, MarkSet::from_marks(raw.marks.iter().cloned()))
			}
			(NodeType::Text, None) => Err(SchemaError::EmptyText),
			(kind, Some(_)) => Err(SchemaError::UnexpectedText(kind.name())),
			(_, None) if !raw.marks.is_empty() => Err(SchemaError::UnexpectedMarks),
			(kind, None) => Node::new(kind, raw.attrs, Fragment::from_nodes(raw.content)),
		}
	}
}

impl From<Node> for RawNode {
	fn from(node: Node) -> Self {
		RawNode {
			kind: node.kind,
			attrs: node.attrs,
			content: node.content.nodes().to_vec(),
			text: node.text.map(|t| t.to_string()),
			marks: node.marks,
		}
	}
}
