//! Collapsible sections under headings.
//!
//! Each top-level heading gets a stable key derived from its text, so fold
//! preferences survive reloads and edits elsewhere in the document. A
//! collapsed heading hides every following top-level block up to the next
//! heading of the same or a shallower level. An outer collapse wins: a
//! deeper heading inside a hidden region is hidden itself and cannot expose
//! anything.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use folio_primitives::{AppliedTransaction, Bias, Document, Mapping, Node, Signal};
use heck::ToKebabCase;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::decoration::Decoration;
use crate::error::ProviderError;
use crate::provider::{DecorationProvider, ProviderKind, Recompute, plan_recompute};
use crate::store::FoldStore;

/// Value persisted for a collapsed heading. Expanded headings are removed.
pub const COLLAPSED_VALUE: &str = "collapsed";

/// Class for blocks hidden by a collapsed heading.
pub const FOLDED_CLASS: &str = "folded-content";

/// Class for the collapsed heading itself.
pub const COLLAPSED_CLASS: &str = "collapsed";

/// Stable keys for the given heading texts, in document order.
///
/// The key is `h-` plus a kebab-case slug of the text. The N-th repeat of a
/// slug gets `-N` appended, so the second "Intro" is `h-intro-1`.
pub fn heading_keys<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
	let mut repeats: FxHashMap<String, usize> = FxHashMap::default();
	let mut taken: FxHashSet<String> = FxHashSet::default();
	let mut keys = Vec::new();
	for text in texts {
		let slug = text.to_kebab_case();
		let base = if slug.is_empty() {
			"h-heading".to_string()
		} else {
			format!("h-{slug}")
		};
		let count = repeats.entry(base.clone()).or_insert(0);
		let mut key = if *count == 0 { base.clone() } else { format!("{base}-{count}") };
		while taken.contains(&key) {
			*count += 1;
			key = format!("{base}-{count}");
		}
		*count += 1;
		taken.insert(key.clone());
		keys.push(key);
	}
	keys
}

/// A top-level heading as seen by the fold provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldHeading {
	pub pos: usize,
	pub size: usize,
	pub level: u8,
	pub key: String,
	pub collapsed: bool,
}

impl FoldHeading {
	pub fn end(&self) -> usize {
		self.pos + self.size
	}
}

/// A persistence change requested by a toggle, keyed by scoped key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldWrite {
	Collapse(String),
	Expand(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldState {
	headings: Vec<FoldHeading>,
	/// Session view of collapse flags by stable key, seeded from the store.
	collapsed: FxHashMap<String, bool>,
	/// Hidden top-level blocks as `(from, to)`.
	hidden: Vec<(usize, usize)>,
	writes: Vec<FoldWrite>,
}

impl FoldState {
	pub fn headings(&self) -> &[FoldHeading] {
		&self.headings
	}

	pub fn heading(&self, key: &str) -> Option<&FoldHeading> {
		self.headings.iter().find(|h| h.key == key)
	}

	pub fn is_collapsed(&self, key: &str) -> bool {
		self.heading(key).is_some_and(|h| h.collapsed)
	}

	pub fn hidden_ranges(&self) -> &[(usize, usize)] {
		&self.hidden
	}

	/// Whether the block starting at `pos` is folded away.
	pub fn is_hidden(&self, pos: usize) -> bool {
		self.hidden.iter().any(|(from, _)| *from == pos)
	}

	pub fn take_writes(&mut self) -> Vec<FoldWrite> {
		std::mem::take(&mut self.writes)
	}

	fn any_collapsed(&self) -> bool {
		self.headings.iter().any(|h| h.collapsed)
	}

	fn remap(&self, mapping: &Mapping) -> Result<Vec<FoldHeading>, ProviderError> {
		self.headings
			.iter()
			.map(|heading| {
				let pos = mapping.try_map(heading.pos, Bias::Right).ok_or(ProviderError::LostPosition {
					provider: ProviderKind::Fold,
					pos: heading.pos,
				})?;
				Ok(FoldHeading { pos, ..heading.clone() })
			})
			.collect()
	}
}

/// Fold/collapse provider.
pub struct FoldProvider {
	store: Arc<dyn FoldStore>,
	scope: String,
}

impl FoldProvider {
	pub fn new(store: Arc<dyn FoldStore>, scope: impl Into<String>) -> Self {
		Self {
			store,
			scope: scope.into(),
		}
	}

	/// Persistence key for a heading's stable key.
	pub fn scoped_key(&self, key: &str) -> String {
		format!("{}:{key}", self.scope)
	}

	/// Re-derives headings from `doc`, resolving collapse flags from the
	/// session cache first and the store second.
	fn derive(&self, doc: &Document, cache: &FxHashMap<String, bool>) -> (Vec<FoldHeading>, FxHashMap<String, bool>) {
		let found: Vec<(usize, &Node, String)> = doc
			.blocks()
			.filter(|(_, node)| node.kind().is_heading())
			.map(|(pos, node)| (pos, node, node.text_content()))
			.collect();
		let keys = heading_keys(found.iter().map(|(_, _, text)| text.as_str()));

		let mut collapsed = FxHashMap::default();
		let headings = found
			.into_iter()
			.zip(keys)
			.map(|((pos, node, _), key)| {
				let flag = cache.get(&key).copied().unwrap_or_else(|| {
					self.store.get(&self.scoped_key(&key)).as_deref() == Some(COLLAPSED_VALUE)
				});
				collapsed.insert(key.clone(), flag);
				FoldHeading {
					pos,
					size: node.node_size(),
					level: node.heading_level().unwrap_or(1),
					key,
					collapsed: flag,
				}
			})
			.collect();
		(headings, collapsed)
	}

	fn toggle(&self, state: &mut FoldState, key: &str) {
		let Some(heading) = state.headings.iter_mut().find(|h| h.key == key) else {
			tracing::debug!(key, "fold.toggle_unknown_key");
			return;
		};
		heading.collapsed = !heading.collapsed;
		state.collapsed.insert(key.to_string(), heading.collapsed);
		let scoped = self.scoped_key(key);
		state.writes.push(if heading.collapsed {
			FoldWrite::Collapse(scoped)
		} else {
			FoldWrite::Expand(scoped)
		});
	}
}

/// Top-level blocks hidden by collapsed headings.
fn hidden_blocks(doc: &Document, headings: &[FoldHeading]) -> Vec<(usize, usize)> {
	let collapsed: FxHashMap<usize, u8> = headings
		.iter()
		.filter(|h| h.collapsed)
		.map(|h| (h.pos, h.level))
		.collect();
	if collapsed.is_empty() {
		return Vec::new();
	}

	let mut hidden = Vec::new();
	let mut hiding_below: Option<u8> = None;
	for (pos, node) in doc.blocks() {
		let level = node.heading_level().filter(|_| node.kind().is_heading());
		if let Some(limit) = hiding_below {
			if level.is_some_and(|l| l <= limit) {
				hiding_below = None;
			} else {
				hidden.push((pos, pos + node.node_size()));
				continue;
			}
		}
		if let Some(level) = collapsed.get(&pos) {
			hiding_below = Some(*level);
		}
	}
	hidden
}

impl DecorationProvider for FoldProvider {
	type State = FoldState;

	const KIND: ProviderKind = ProviderKind::Fold;

	fn init(&self, doc: &Document) -> Result<FoldState, ProviderError> {
		let (headings, collapsed) = self.derive(doc, &FxHashMap::default());
		let hidden = hidden_blocks(doc, &headings);
		Ok(FoldState {
			headings,
			collapsed,
			hidden,
			writes: Vec::new(),
		})
	}

	fn apply(&self, state: &FoldState, tx: &AppliedTransaction) -> Result<FoldState, ProviderError> {
		let toggles: Vec<&str> = tx
			.signals()
			.filter_map(|signal| match signal {
				Signal::ToggleFold(key) => Some(key.as_str()),
				_ => None,
			})
			.collect();
		let structural = state.any_collapsed();
		let plan = plan_recompute(
			Self::KIND,
			tx,
			|node| node.kind().is_heading() || (structural && node.is_block()),
			!toggles.is_empty(),
		);

		let mut next = match plan {
			Recompute::Full(_) => {
				let (headings, collapsed) = self.derive(&tx.doc, &state.collapsed);
				FoldState {
					headings,
					collapsed,
					hidden: Vec::new(),
					writes: Vec::new(),
				}
			}
			Recompute::Remap => FoldState {
				headings: state.remap(&tx.mapping)?,
				collapsed: state.collapsed.clone(),
				hidden: Vec::new(),
				writes: Vec::new(),
			},
		};
		for key in toggles {
			self.toggle(&mut next, key);
		}
		next.hidden = hidden_blocks(&tx.doc, &next.headings);
		Ok(next)
	}

	fn decorate(&self, state: &FoldState, _doc: &Document) -> Result<Vec<Decoration>, ProviderError> {
		let mut decorations: Vec<Decoration> = state
			.headings
			.iter()
			.filter(|h| h.collapsed)
			.map(|h| Decoration::node(Self::KIND, h.pos, h.end(), COLLAPSED_CLASS))
			.chain(
				state
					.hidden
					.iter()
					.map(|(from, to)| Decoration::node(Self::KIND, *from, *to, FOLDED_CLASS)),
			)
			.collect();
		decorations.sort_by_key(Decoration::range);
		Ok(decorations)
	}
}
