//! Static node and mark registry.
//!
//! Every node type is a variant of [`NodeType`] and resolves to a `'static`
//! [`NodeSpec`] describing its attributes and allowed content. Type-specific
//! behaviour is looked up here once instead of being registered at runtime.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attrs::{AttrValue, Attrs};

/// Errors raised when a node or mark violates its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
	/// An attribute name is not declared by the node type.
	#[error("{node} does not accept attribute `{attr}`")]
	UnknownAttr {
		/// Offending node type name.
		node: &'static str,
		/// Attribute name.
		attr: String,
	},
	/// An attribute value has the wrong scalar type or is out of range.
	#[error("{node}.{attr} expects {expected}")]
	InvalidAttr {
		/// Offending node type name.
		node: &'static str,
		/// Attribute name.
		attr: &'static str,
		/// Human-readable expectation.
		expected: &'static str,
	},
	/// A required attribute is absent.
	#[error("{node} requires attribute `{attr}`")]
	MissingAttr {
		/// Offending node type name.
		node: &'static str,
		/// Attribute name.
		attr: &'static str,
	},
	/// A child is not allowed by the parent's content rule.
	#[error("{parent} cannot contain {child}")]
	InvalidChild {
		/// Parent node type name.
		parent: &'static str,
		/// Child node type name.
		child: &'static str,
	},
	/// A node that must carry text was built without it, or with an empty string.
	#[error("text nodes must carry non-empty text")]
	EmptyText,
	/// Text was supplied to a non-text node type.
	#[error("{0} cannot carry text")]
	UnexpectedText(&'static str),
	/// Marks were attached to something other than a text node.
	#[error("marks are only allowed on text nodes")]
	UnexpectedMarks,
	/// The document root must be a `doc` node.
	#[error("document root must be `doc`, found {0}")]
	InvalidRoot(&'static str),
}

/// Node types known to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
	Doc,
	Paragraph,
	Heading,
	CodeBlock,
	Blockquote,
	BulletList,
	OrderedList,
	CheckboxList,
	ListItem,
	CheckboxItem,
	HorizontalRule,
	Embed,
	Text,
	HardBreak,
}

/// Broad placement class of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGroup {
	/// The document root.
	Root,
	/// Block-level content.
	Block,
	/// Inline content (text and inline leaves).
	Inline,
}

/// What a node type may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRule {
	/// Leaf node, no children.
	Empty,
	/// Any block-level nodes.
	Blocks,
	/// Inline nodes: marked text and inline leaves.
	Inline,
	/// Unmarked text only.
	PlainText,
	/// Only nodes of the given item type.
	Items(NodeType),
}

/// Scalar type accepted by an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
	/// String value.
	Str,
	/// String or null.
	OptStr,
	/// Integer within an inclusive range.
	Int { min: i64, max: i64 },
	/// Boolean value.
	Bool,
}

/// Value used when an attribute is not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrDefault {
	/// Construction fails without the attribute.
	Required,
	/// Defaults to null.
	Null,
	/// Defaults to an integer.
	Int(i64),
	/// Defaults to a boolean.
	Bool(bool),
}

/// Declaration of one attribute on a node type.
#[derive(Debug, Clone, Copy)]
pub struct AttrSpec {
	pub name: &'static str,
	pub kind: AttrKind,
	pub default: AttrDefault,
}

/// Static description of a node type.
#[derive(Debug)]
pub struct NodeSpec {
	/// Serialized type name.
	pub name: &'static str,
	pub group: NodeGroup,
	pub content: ContentRule,
	pub attrs: &'static [AttrSpec],
}

const NO_ATTRS: &[AttrSpec] = &[];

const HEADING_ATTRS: &[AttrSpec] = &[AttrSpec {
	name: "level",
	kind: AttrKind::Int { min: 1, max: 6 },
	default: AttrDefault::Int(1),
}];

const CODE_BLOCK_ATTRS: &[AttrSpec] = &[AttrSpec {
	name: "language",
	kind: AttrKind::OptStr,
	default: AttrDefault::Null,
}];

const ORDERED_LIST_ATTRS: &[AttrSpec] = &[AttrSpec {
	name: "order",
	kind: AttrKind::Int { min: 0, max: i64::MAX },
	default: AttrDefault::Int(1),
}];

const CHECKBOX_ITEM_ATTRS: &[AttrSpec] = &[AttrSpec {
	name: "checked",
	kind: AttrKind::Bool,
	default: AttrDefault::Bool(false),
}];

const EMBED_ATTRS: &[AttrSpec] = &[
	AttrSpec {
		name: "href",
		kind: AttrKind::Str,
		default: AttrDefault::Required,
	},
	AttrSpec {
		name: "provider",
		kind: AttrKind::OptStr,
		default: AttrDefault::Null,
	},
];

macro_rules! spec {
	($name:literal, $group:ident, $content:expr, $attrs:expr) => {{
		const SPEC: NodeSpec = NodeSpec {
			name: $name,
			group: NodeGroup::$group,
			content: $content,
			attrs: $attrs,
		};
		&SPEC
	}};
}

impl NodeType {
	/// All node types, in declaration order.
	pub const ALL: [NodeType; 14] = [
		NodeType::Doc,
		NodeType::Paragraph,
		NodeType::Heading,
		NodeType::CodeBlock,
		NodeType::Blockquote,
		NodeType::BulletList,
		NodeType::OrderedList,
		NodeType::CheckboxList,
		NodeType::ListItem,
		NodeType::CheckboxItem,
		NodeType::HorizontalRule,
		NodeType::Embed,
		NodeType::Text,
		NodeType::HardBreak,
	];

	/// Returns the static schema for this type.
	pub fn spec(self) -> &'static NodeSpec {
		match self {
			NodeType::Doc => spec!("doc", Root, ContentRule::Blocks, NO_ATTRS),
			NodeType::Paragraph => spec!("paragraph", Block, ContentRule::Inline, NO_ATTRS),
			NodeType::Heading => spec!("heading", Block, ContentRule::Inline, HEADING_ATTRS),
			NodeType::CodeBlock => spec!("code_block", Block, ContentRule::PlainText, CODE_BLOCK_ATTRS),
			NodeType::Blockquote => spec!("blockquote", Block, ContentRule::Blocks, NO_ATTRS),
			NodeType::BulletList => spec!("bullet_list", Block, ContentRule::Items(NodeType::ListItem), NO_ATTRS),
			NodeType::OrderedList => {
				spec!("ordered_list", Block, ContentRule::Items(NodeType::ListItem), ORDERED_LIST_ATTRS)
			}
			NodeType::CheckboxList => {
				spec!("checkbox_list", Block, ContentRule::Items(NodeType::CheckboxItem), NO_ATTRS)
			}
			NodeType::ListItem => spec!("list_item", Block, ContentRule::Blocks, NO_ATTRS),
			NodeType::CheckboxItem => spec!("checkbox_item", Block, ContentRule::Blocks, CHECKBOX_ITEM_ATTRS),
			NodeType::HorizontalRule => spec!("horizontal_rule", Block, ContentRule::Empty, NO_ATTRS),
			NodeType::Embed => spec!("embed", Block, ContentRule::Empty, EMBED_ATTRS),
			NodeType::Text => spec!("text", Inline, ContentRule::Empty, NO_ATTRS),
			NodeType::HardBreak => spec!("hard_break", Inline, ContentRule::Empty, NO_ATTRS),
		}
	}

	/// Looks a type up by its serialized name.
	pub fn from_name(name: &str) -> Option<NodeType> {
		Self::ALL.into_iter().find(|ty| ty.spec().name == name)
	}

	/// Serialized type name.
	pub fn name(self) -> &'static str {
		self.spec().name
	}

	pub fn is_block(self) -> bool {
		self.spec().group == NodeGroup::Block
	}

	pub fn is_inline(self) -> bool {
		self.spec().group == NodeGroup::Inline
	}

	/// Returns true for types whose content is inline (paragraphs, headings, code).
	pub fn is_textblock(self) -> bool {
		matches!(self.spec().content, ContentRule::Inline | ContentRule::PlainText)
	}

	/// Returns true for node types that never have children.
	pub fn is_leaf(self) -> bool {
		self.spec().content == ContentRule::Empty
	}

	/// Returns true for code-type nodes, whose content must never be reformatted.
	pub fn is_code(self) -> bool {
		self == NodeType::CodeBlock
	}

	pub fn is_heading(self) -> bool {
		self == NodeType::Heading
	}

	/// Returns true when `child` may appear directly inside this type.
	pub fn allows_child(self, child: NodeType) -> bool {
		match self.spec().content {
			ContentRule::Empty => false,
			ContentRule::Blocks => child.is_block(),
			ContentRule::Inline => child.is_inline(),
			ContentRule::PlainText => child == NodeType::Text,
			ContentRule::Items(item) => child == item,
		}
	}

	/// Validates `attrs` against this type, filling defaults for absent entries.
	pub fn check_attrs(self, mut attrs: Attrs) -> Result<Attrs, SchemaError> {
		let spec = self.spec();
		if let Some(unknown) = attrs.names().find(|name| !spec.attrs.iter().any(|a| a.name == *name)) {
			return Err(SchemaError::UnknownAttr {
				node: spec.name,
				attr: unknown.to_string(),
			});
		}

		for decl in spec.attrs {
			match attrs.get(decl.name) {
				Some(value) => check_value(spec.name, decl, value)?,
				None => {
					let value = match decl.default {
						AttrDefault::Required => {
							return Err(SchemaError::MissingAttr {
								node: spec.name,
								attr: decl.name,
							});
						}
						AttrDefault::Null => AttrValue::Null,
						AttrDefault::Int(n) => AttrValue::Int(n),
						AttrDefault::Bool(b) => AttrValue::Bool(b),
					};
					attrs.insert(decl.name, value);
				}
			}
		}
		Ok(attrs)
	}
}

fn check_value(node: &'static str, decl: &AttrSpec, value: &AttrValue) -> Result<(), SchemaError> {
	let invalid = |expected| SchemaError::InvalidAttr {
		node,
		attr: decl.name,
		expected,
	};
	match (decl.kind, value) {
		(AttrKind::Str, AttrValue::Str(_)) => Ok(()),
		(AttrKind::Str, _) => Err(invalid("a string")),
		(AttrKind::OptStr, AttrValue::Str(_) | AttrValue::Null) => Ok(()),
		(AttrKind::OptStr, _) => Err(invalid("a string or null")),
		(AttrKind::Int { min, max }, AttrValue::Int(n)) if (min..=max).contains(n) => Ok(()),
		(AttrKind::Int { .. }, _) => Err(invalid("an integer in range")),
		(AttrKind::Bool, AttrValue::Bool(_)) => Ok(()),
		(AttrKind::Bool, _) => Err(invalid("a boolean")),
	}
}

/// Inline formatting attached to text nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
	Strong,
	Em,
	Code,
	Strikethrough,
	Link { href: String },
}

impl Mark {
	/// Ordering rank; mark sets are kept sorted by it and hold one mark per rank.
	pub fn rank(&self) -> u8 {
		match self {
			Mark::Link { .. } => 0,
			Mark::Strong => 1,
			Mark::Em => 2,
			Mark::Strikethrough => 3,
			Mark::Code => 4,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Mark::Strong => "strong",
			Mark::Em => "em",
			Mark::Code => "code",
			Mark::Strikethrough => "strikethrough",
			Mark::Link { .. } => "link",
		}
	}
}
