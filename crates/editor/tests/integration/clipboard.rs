use folio_editor::{ClipboardPayload, EditorMeta, PasteKind};
use folio_primitives::{AttrValue, Document, Mark, Node, NodeType, Selection};
use folio_syntax::RuleEngine;
use pretty_assertions::assert_eq;

use crate::common::{builder, init_tracing};

/// Paragraph "intro" at 0 (content 1..6), empty paragraph at 7 (content 8).
fn notes() -> Document {
	Document::from_blocks([Node::paragraph("intro").unwrap(), Node::paragraph("").unwrap()]).unwrap()
}

fn kinds(doc: &Document) -> Vec<NodeType> {
	doc.blocks().map(|(_, node)| node.kind()).collect()
}

#[test]
fn bare_video_url_becomes_an_embed() {
	let mut editor = builder(notes(), &RuleEngine::new()).selection(Selection::cursor(8)).build();
	let kind = editor
		.paste(&ClipboardPayload::text("https://www.youtube.com/watch?v=abc"))
		.unwrap();
	assert_eq!(kind, Some(PasteKind::Embed));

	let doc = editor.document();
	assert_eq!(kinds(doc), vec![NodeType::Paragraph, NodeType::Embed]);
	let (_, embed) = doc.blocks().nth(1).unwrap();
	assert_eq!(
		embed.attr("href").and_then(AttrValue::as_str),
		Some("https://www.youtube.com/watch?v=abc")
	);
	assert_eq!(embed.attr("provider").and_then(AttrValue::as_str), Some("youtube"));
}

#[test]
fn bare_url_over_a_selection_links_it() {
	let mut editor = builder(notes(), &RuleEngine::new()).selection(Selection::new(1, 6)).build();
	let kind = editor.paste(&ClipboardPayload::text("https://example.com/docs")).unwrap();
	assert_eq!(kind, Some(PasteKind::Link));

	let doc = editor.document();
	assert_eq!(doc.text_content(), "intro");
	let text = doc.root().child(0).unwrap().child(0).unwrap();
	assert!(text.marks().contains(&Mark::Link {
		href: "https://example.com/docs".into()
	}));
}

#[test]
fn markdown_checklists_are_normalized_before_parsing() {
	let mut editor = builder(notes(), &RuleEngine::new()).selection(Selection::cursor(8)).build();
	let kind = editor
		.paste(&ClipboardPayload::text("# Plan\n\n[x] Ship it\n[ ] Tell people"))
		.unwrap();
	assert_eq!(kind, Some(PasteKind::Markdown));

	let doc = editor.document();
	assert_eq!(kinds(doc), vec![NodeType::Paragraph, NodeType::Heading, NodeType::CheckboxList]);
	let (_, list) = doc.blocks().nth(2).unwrap();
	let checked: Vec<Option<bool>> = list
		.children()
		.iter()
		.map(|item| item.attr("checked").and_then(AttrValue::as_bool))
		.collect();
	assert_eq!(checked, vec![Some(true), Some(false)]);
	assert_eq!(list.text_content(), "Ship itTell people");
	assert_eq!(editor.fold_state().unwrap().headings()[0].key, "h-plan");
}

#[test]
fn markdown_metadata_forces_markdown() {
	let mut editor = builder(notes(), &RuleEngine::new()).selection(Selection::cursor(8)).build();
	let payload = ClipboardPayload::text("plain words").with_editor_meta(EditorMeta::new("markdown"));
	assert_eq!(editor.paste(&payload).unwrap(), Some(PasteKind::Markdown));
	assert_eq!(editor.document().text_content(), "introplain words");
}

#[test]
fn rich_html_keeps_inline_marks() {
	init_tracing();
	let mut editor = builder(notes(), &RuleEngine::new()).selection(Selection::cursor(8)).build();
	let payload = ClipboardPayload::text("Hello there").with_html("<meta charset=\"utf-8\"><p>Hello <strong>there</strong></p>");
	assert_eq!(editor.paste(&payload).unwrap(), Some(PasteKind::Html));

	let (_, paragraph) = editor.document().blocks().nth(1).unwrap();
	let marked: Vec<(String, bool)> = paragraph
		.children()
		.iter()
		.map(|node| (node.text().unwrap_or_default().to_string(), node.marks().contains(&Mark::Strong)))
		.collect();
	assert_eq!(marked, vec![("Hello".to_string(), false), (" there".to_string(), true)]);
	assert_eq!(editor.selection(), Selection::cursor(19));
}

#[test]
fn code_blocks_take_text_verbatim() {
	let doc = Document::from_blocks([Node::code_block(Some("rust"), "fn a() {}").unwrap()]).unwrap();
	let mut editor = builder(doc, &RuleEngine::new()).selection(Selection::cursor(10)).build();
	let text = "# not a heading\r\n- nor a list";
	assert_eq!(editor.paste(&ClipboardPayload::text(text)).unwrap(), Some(PasteKind::Code));
	let expected = "fn a() {}# not a heading\n- nor a list";
	assert_eq!(editor.document().text_content(), expected);
	assert_eq!(
		editor.document().root().child(0).map(Node::kind),
		Some(NodeType::CodeBlock)
	);
}
