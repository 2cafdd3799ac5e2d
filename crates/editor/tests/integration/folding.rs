use std::sync::Arc;

use folio_editor::{Editor, EditorConfig, MemoryFoldStore, ProviderKind, UnavailableFoldStore};
use folio_primitives::{Document, Node, Transaction};
use folio_syntax::RuleEngine;
use pretty_assertions::assert_eq;

use crate::common::{builder, text};

fn outline() -> Document {
	Document::from_blocks([
		Node::heading(1, "Intro").unwrap(),
		Node::paragraph("first").unwrap(),
		Node::heading(2, "Intro").unwrap(),
		Node::paragraph("second").unwrap(),
		Node::heading(1, "Usage").unwrap(),
		Node::paragraph("run it").unwrap(),
	])
	.unwrap()
}

fn scoped() -> EditorConfig {
	EditorConfig::from_toml_str("[fold]\nscope = \"notes\"\n").unwrap()
}

fn open(store: &Arc<MemoryFoldStore>) -> Editor {
	builder(outline(), &RuleEngine::new())
		.config(scoped())
		.store(store.clone())
		.build()
}

#[test]
fn toggling_twice_restores_the_visible_set() {
	let store = Arc::new(MemoryFoldStore::new());
	let mut editor = open(&store);
	let before = editor.overlay();

	editor.toggle_fold("h-intro").unwrap();
	let hidden: Vec<_> = editor.fold_state().unwrap().hidden_ranges().to_vec();
	assert_eq!(hidden.len(), 3);
	assert!(editor.overlay().from_source(ProviderKind::Fold).count() > 0);

	editor.toggle_fold("h-intro").unwrap();
	assert!(editor.fold_state().unwrap().hidden_ranges().is_empty());
	assert_eq!(editor.overlay().decorations, before.decorations);
	assert!(store.entries().is_empty());
}

#[test]
fn duplicate_headings_persist_independently() {
	let store = Arc::new(MemoryFoldStore::new());
	let mut editor = open(&store);
	let keys: Vec<String> = editor.fold_state().unwrap().headings().iter().map(|h| h.key.clone()).collect();
	assert_eq!(keys, vec!["h-intro", "h-intro-1", "h-usage"]);

	editor.toggle_fold("h-intro-1").unwrap();
	assert_eq!(store.entries().keys().collect::<Vec<_>>(), vec!["notes:h-intro-1"]);
	drop(editor);

	let reopened = open(&store);
	let state = reopened.fold_state().unwrap();
	assert!(!state.is_collapsed("h-intro"));
	assert!(state.is_collapsed("h-intro-1"));
	// The level-2 heading hides only its own paragraph.
	assert_eq!(state.hidden_ranges().len(), 1);
}

#[test]
fn collapse_survives_edits_elsewhere() {
	let store = Arc::new(MemoryFoldStore::new());
	let mut editor = open(&store);
	editor.toggle_fold("h-usage").unwrap();

	editor.dispatch(Transaction::new().insert(8, text("very "))).unwrap();
	let state = editor.fold_state().unwrap();
	assert!(state.is_collapsed("h-usage"));
	let usage = state.heading("h-usage").unwrap();
	let (_, paragraph) = editor
		.document()
		.blocks()
		.find(|(pos, _)| *pos == usage.end())
		.unwrap();
	assert_eq!(paragraph.text_content(), "run it");
	assert!(state.is_hidden(usage.end()));
}

#[test]
fn unavailable_storage_keeps_session_state() {
	let mut editor = builder(outline(), &RuleEngine::new())
		.store(Arc::new(UnavailableFoldStore))
		.build();
	editor.toggle_fold("h-usage").unwrap();
	assert!(editor.fold_state().unwrap().is_collapsed("h-usage"));

	let fresh = builder(outline(), &RuleEngine::new())
		.store(Arc::new(UnavailableFoldStore))
		.build();
	assert!(!fresh.fold_state().unwrap().is_collapsed("h-usage"));
}
