//! Incremental provider updates must agree with recomputing from scratch.

use std::sync::Arc;

use folio_editor::config::DiagramConfig;
use folio_editor::{Decoration, DecorationProvider, DiagramProvider, FoldProvider, FoldStore, HighlightProvider, MemoryFoldStore, Widget};
use folio_primitives::{DiagramId, Document, Node, Transaction};
use proptest::prelude::*;

use crate::common::{article, loaded_engine, services, text};

#[derive(Debug, Clone)]
enum Edit {
	/// Text typed at `(block, offset)`.
	Type(usize, usize, String),
	/// A new block before block `index` (or at the end).
	Insert(usize, Block),
	Delete(usize),
	/// Changes a code block's language; other blocks are left alone.
	Language(usize, &'static str),
}

#[derive(Debug, Clone)]
enum Block {
	Heading(u8, String),
	Paragraph(String),
	Code(&'static str, String),
}

impl Block {
	fn node(&self) -> Node {
		match self {
			Block::Heading(level, text) => Node::heading(i64::from(*level), text).unwrap(),
			Block::Paragraph(text) => Node::paragraph(text).unwrap(),
			Block::Code(language, text) => Node::code_block(Some(*language), text).unwrap(),
		}
	}
}

const LANGUAGES: [&str; 4] = ["rust", "mermaid", "python", "text"];

fn block() -> impl Strategy<Value = Block> {
	prop_oneof![
		(1u8..4, "[A-Za-z ]{1,8}").prop_map(|(level, text)| Block::Heading(level, text)),
		"[a-z ]{0,8}".prop_map(Block::Paragraph),
		(prop::sample::select(LANGUAGES.to_vec()), "[a-z ;=]{0,10}").prop_map(|(language, text)| Block::Code(language, text)),
	]
}

fn edit() -> impl Strategy<Value = Edit> {
	prop_oneof![
		4 => (0usize..8, 0usize..40, "[a-z #;]{1,6}").prop_map(|(block, offset, text)| Edit::Type(block, offset, text)),
		2 => (0usize..8, block()).prop_map(|(index, block)| Edit::Insert(index, block)),
		1 => (0usize..8).prop_map(Edit::Delete),
		2 => (0usize..8, prop::sample::select(LANGUAGES.to_vec())).prop_map(|(index, language)| Edit::Language(index, language)),
	]
}

fn edits() -> impl Strategy<Value = Vec<Edit>> {
	prop::collection::vec(edit(), 1..10)
}

/// Builds the transaction for `edit`, or `None` when it does not apply to `doc`.
fn transaction(doc: &Document, edit: &Edit) -> Option<Transaction> {
	let blocks: Vec<(usize, Node)> = doc.blocks().map(|(pos, node)| (pos, node.clone())).collect();
	match edit {
		Edit::Type(block, offset, inserted) => {
			let (pos, node) = &blocks[block % blocks.len()];
			let at = pos + 1 + offset % (node.content_size() + 1);
			Some(Transaction::new().insert(at, text(inserted)))
		}
		Edit::Insert(index, block) => {
			let at = blocks.get(*index).map_or(doc.content_size(), |(pos, _)| *pos);
			Some(Transaction::new().insert_node(at, block.node()))
		}
		Edit::Delete(index) if blocks.len() > 1 => {
			let (pos, node) = &blocks[index % blocks.len()];
			Some(Transaction::new().delete(*pos, pos + node.node_size()))
		}
		Edit::Delete(_) => None,
		Edit::Language(index, language) => {
			let (pos, node) = &blocks[index % blocks.len()];
			node.kind()
				.is_code()
				.then(|| Transaction::new().set_node_attr(*pos, "language", *language))
		}
	}
}

/// Decorations with every diagram id replaced by `blank`, since a fresh
/// init mints new ones.
fn without_ids(decorations: Vec<Decoration>, blank: DiagramId) -> Vec<Decoration> {
	decorations
		.into_iter()
		.map(|decoration| match decoration {
			Decoration::Widget {
				source,
				pos,
				widget: Widget::Diagram { view, show_source, .. },
			} => Decoration::widget(source, pos, Widget::Diagram { id: blank, view, show_source }),
			other => other,
		})
		.collect()
}

fn check<P: DecorationProvider>(provider: &P, edits: &[Edit]) -> Result<(), TestCaseError> {
	let blank = DiagramId::new();
	let mut doc = article();
	let mut state = provider.init(&doc).unwrap();
	for edit in edits {
		let Some(tx) = transaction(&doc, edit) else {
			continue;
		};
		let tx = tx.apply(&doc).unwrap();
		state = provider.apply(&state, &tx).unwrap();
		doc = tx.doc;

		let incremental = without_ids(provider.decorate(&state, &doc).unwrap(), blank);
		let fresh = without_ids(provider.decorate(&provider.init(&doc).unwrap(), &doc).unwrap(), blank);
		prop_assert_eq!(incremental, fresh, "after {:?}", edit);
	}
	Ok(())
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn highlight_remap_matches_recompute(edits in edits()) {
		let engine = loaded_engine();
		check(&HighlightProvider::new(services(&engine), true), &edits)?;
	}

	#[test]
	fn fold_remap_matches_recompute(edits in edits()) {
		let store = Arc::new(MemoryFoldStore::new());
		store.set("doc:h-title", "collapsed");
		check(&FoldProvider::new(store, "doc"), &edits)?;
	}

	#[test]
	fn diagram_remap_matches_recompute(edits in edits()) {
		check(&DiagramProvider::new(&DiagramConfig::default()), &edits)?;
	}
}
