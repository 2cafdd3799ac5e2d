//! Node attribute values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
	Null,
	Bool(bool),
	Int(i64),
	Str(String),
}

impl AttrValue {
	/// Returns the string payload, if any.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttrValue::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			AttrValue::Int(n) => Some(*n),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			AttrValue::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, AttrValue::Null)
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		AttrValue::Str(value.to_string())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		AttrValue::Str(value)
	}
}

impl From<i64> for AttrValue {
	fn from(value: i64) -> Self {
		AttrValue::Int(value)
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		AttrValue::Bool(value)
	}
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(AttrValue::Null, Into::into)
	}
}

impl fmt::Display for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AttrValue::Null => f.write_str("null"),
			AttrValue::Bool(b) => write!(f, "{b}"),
			AttrValue::Int(n) => write!(f, "{n}"),
			AttrValue::Str(s) => f.write_str(s),
		}
	}
}

/// Ordered attribute map of a node.
///
/// Ordered so that structural equality and hashing are independent of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attrs(BTreeMap<String, AttrValue>);

impl Attrs {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert.
	pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
		self.insert(name, value.into());
		self
	}

	pub fn insert(&mut self, name: &str, value: AttrValue) {
		self.0.insert(name.to_string(), value);
	}

	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.0.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
