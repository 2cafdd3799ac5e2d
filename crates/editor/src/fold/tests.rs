use std::sync::Arc;

use folio_primitives::{Document, Fragment, Node, Signal, Transaction};
use pretty_assertions::assert_eq;

use super::*;
use crate::store::{FoldStore, MemoryFoldStore};

fn provider(store: &Arc<MemoryFoldStore>) -> FoldProvider {
	FoldProvider::new(store.clone(), "doc")
}

fn outline() -> Document {
	Document::from_blocks([
		Node::heading(1, "Intro").unwrap(),
		Node::paragraph("welcome").unwrap(),
		Node::heading(2, "Details").unwrap(),
		Node::paragraph("fine print").unwrap(),
		Node::heading(1, "Usage").unwrap(),
		Node::paragraph("run it").unwrap(),
	])
	.unwrap()
}

fn toggle(p: &FoldProvider, state: &FoldState, doc: &Document, key: &str) -> FoldState {
	let tx = Transaction::signal(Signal::ToggleFold(key.into())).apply(doc).unwrap();
	p.apply(state, &tx).unwrap()
}

#[test]
fn keys_slug_heading_text() {
	assert_eq!(
		heading_keys(["Getting Started!", "Intro", "Intro", "", "Intro 1"]),
		vec!["h-getting-started", "h-intro", "h-intro-1", "h-heading", "h-intro-1-1"]
	);
}

#[test]
fn repeated_slug_skips_taken_keys() {
	assert_eq!(heading_keys(["Intro 1", "Intro", "Intro"]), vec!["h-intro-1", "h-intro", "h-intro-2"]);
}

#[test]
fn collapsing_hides_until_same_level() {
	let store = Arc::new(MemoryFoldStore::new());
	let p = provider(&store);
	let doc = outline();
	let state = p.init(&doc).unwrap();
	assert!(state.hidden_ranges().is_empty());

	let mut collapsed = toggle(&p, &state, &doc, "h-intro");
	let hidden: Vec<usize> = collapsed.hidden_ranges().iter().map(|(from, _)| *from).collect();
	let blocks: Vec<usize> = doc.blocks().map(|(pos, _)| pos).collect();
	assert_eq!(hidden, vec![blocks[1], blocks[2], blocks[3]]);
	assert_eq!(collapsed.take_writes(), vec![FoldWrite::Collapse("doc:h-intro".into())]);
}

#[test]
fn outer_collapse_wins() {
	let store = Arc::new(MemoryFoldStore::new());
	let p = provider(&store);
	let doc = outline();
	let state = p.init(&doc).unwrap();
	let inner = toggle(&p, &state, &doc, "h-details");
	let both = toggle(&p, &inner, &doc, "h-intro");
	let only_outer = toggle(&p, &state, &doc, "h-intro");
	assert_eq!(both.hidden_ranges(), only_outer.hidden_ranges());

	// Expanding the outer heading leaves the inner collapse in effect.
	let outer_open = toggle(&p, &both, &doc, "h-intro");
	assert_eq!(outer_open.hidden_ranges(), inner.hidden_ranges());
}

#[test]
fn toggling_twice_restores_visible_set() {
	let store = Arc::new(MemoryFoldStore::new());
	let p = provider(&store);
	let doc = outline();
	let state = p.init(&doc).unwrap();
	let before = p.decorate(&state, &doc).unwrap();

	let once = toggle(&p, &state, &doc, "h-usage");
	assert_ne!(p.decorate(&once, &doc).unwrap(), before);
	let mut twice = toggle(&p, &once, &doc, "h-usage");
	assert_eq!(p.decorate(&twice, &doc).unwrap(), before);
	assert_eq!(twice.take_writes(), vec![FoldWrite::Expand("doc:h-usage".into())]);
}

#[test]
fn init_seeds_from_store() {
	let store = Arc::new(MemoryFoldStore::new());
	store.set("doc:h-details", COLLAPSED_VALUE);
	store.set("other:h-usage", COLLAPSED_VALUE);
	let p = provider(&store);
	let doc = outline();
	let state = p.init(&doc).unwrap();
	assert!(state.is_collapsed("h-details"));
	assert!(!state.is_collapsed("h-usage"));

	let decorations = p.decorate(&state, &doc).unwrap();
	let classes: Vec<_> = decorations.iter().filter_map(Decoration::class).collect();
	assert_eq!(classes, vec![COLLAPSED_CLASS, FOLDED_CLASS]);
}

#[test]
fn duplicate_headings_fold_independently() {
	let store = Arc::new(MemoryFoldStore::new());
	let p = provider(&store);
	let doc = Document::from_blocks([
		Node::heading(1, "Notes").unwrap(),
		Node::paragraph("a").unwrap(),
		Node::heading(1, "Notes").unwrap(),
		Node::paragraph("b").unwrap(),
	])
	.unwrap();
	let state = p.init(&doc).unwrap();
	let keys: Vec<_> = state.headings().iter().map(|h| h.key.as_str()).collect();
	assert_eq!(keys, vec!["h-notes", "h-notes-1"]);

	let second = toggle(&p, &state, &doc, "h-notes-1");
	assert!(!second.is_collapsed("h-notes"));
	assert!(second.is_collapsed("h-notes-1"));
}

#[test]
fn edits_elsewhere_remap_headings() {
	let store = Arc::new(MemoryFoldStore::new());
	let p = provider(&store);
	let doc = outline();
	let state = p.init(&doc).unwrap();
	let tx = Transaction::new()
		.insert(8, Fragment::single(Node::plain_text("!!").unwrap()))
		.apply(&doc)
		.unwrap();
	let next = p.apply(&state, &tx).unwrap();
	assert_eq!(next, p.init(&tx.doc).unwrap());
}

#[test]
fn renaming_a_heading_rederives_its_key() {
	let store = Arc::new(MemoryFoldStore::new());
	let p = provider(&store);
	let doc = outline();
	let state = p.init(&doc).unwrap();
	// "Intro" spans 1..6; append to it.
	let tx = Transaction::new()
		.insert(6, Fragment::single(Node::plain_text("duction").unwrap()))
		.apply(&doc)
		.unwrap();
	let next = p.apply(&state, &tx).unwrap();
	assert_eq!(next.headings()[0].key, "h-introduction");
}

#[test]
fn new_block_in_folded_region_is_hidden() {
	let store = Arc::new(MemoryFoldStore::new());
	let p = provider(&store);
	let doc = outline();
	let state = toggle(&p, &p.init(&doc).unwrap(), &doc, "h-usage");
	let end = doc.content_size();
	let tx = Transaction::new()
		.insert_node(end, Node::paragraph("appended").unwrap())
		.apply(&doc)
		.unwrap();
	let next = p.apply(&state, &tx).unwrap();
	let last = tx.doc.blocks().last().map(|(pos, _)| pos).unwrap();
	assert!(next.is_hidden(last));
}
