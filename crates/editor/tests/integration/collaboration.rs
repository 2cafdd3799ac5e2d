use folio_editor::error::EditorError;
use folio_editor::{ProviderKind, RemotePayload};
use folio_primitives::{Selection, Step};
use pretty_assertions::assert_eq;

use crate::common::{article, builder, loaded_engine, text};

#[test]
fn bad_payload_is_dropped_and_the_queue_continues() {
	let engine = loaded_engine();
	let mut editor = builder(article(), &engine).build();
	let sender = editor.remote_sender();
	let good = RemotePayload::new(vec![Step::insert(8, text("more "))]).encode().unwrap();

	assert!(sender.send(&b"{\"steps\": 7}"[..]));
	assert!(sender.send(good));

	let before = editor.document().version();
	assert!(matches!(editor.process_remote(), Err(EditorError::Decode(_))));
	assert_eq!(editor.document().version(), before);

	assert_eq!(editor.process_remote().unwrap(), 1);
	assert_eq!(editor.document().root().child(1).unwrap().text_content(), "more some prose");
}

#[test]
fn payload_that_does_not_apply_changes_nothing() {
	let engine = loaded_engine();
	let mut editor = builder(article(), &engine).build();
	let overlay = editor.overlay();
	let bytes = RemotePayload::new(vec![Step::insert(8, text("ok")), Step::delete(40, 90)])
		.encode()
		.unwrap();
	assert!(matches!(editor.apply_remote(&bytes), Err(EditorError::Step(_))));
	assert_eq!(editor.overlay(), overlay);
}

#[test]
fn remote_edits_move_local_decorations() {
	let engine = loaded_engine();
	let mut editor = builder(article(), &engine).selection(Selection::new(8, 12)).build();
	let keyword = |editor: &folio_editor::Editor| {
		editor
			.overlay()
			.from_source(ProviderKind::Highlight)
			.find(|d| !d.is_widget())
			.map(|d| d.range())
	};
	assert_eq!(keyword(&editor), Some((20, 23)));

	let bytes = RemotePayload::new(vec![Step::insert(1, text("My "))])
		.with_selection(Selection::cursor(4))
		.encode()
		.unwrap();
	editor.apply_remote(&bytes).unwrap();

	assert_eq!(keyword(&editor), Some((23, 26)));
	assert_eq!(editor.selection(), Selection::new(11, 15));
	assert_eq!(editor.remote_selection(), Some(Selection::cursor(4)));
	assert_eq!(editor.fold_state().unwrap().headings()[0].key, "h-my-title");
}
