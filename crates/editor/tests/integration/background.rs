use std::sync::Arc;
use std::time::{Duration, Instant};

use folio_editor::{DiagramView, Editor, HighlightServices, ProviderKind};
use folio_primitives::{Document, Node, Transaction};
use folio_syntax::{PendingLanguages, RuleEngine};

use crate::common::{CountingRenderer, article, builder, diagram_doc, init_tracing, loaded_engine, text};

fn inline_highlights(editor: &folio_editor::Editor) -> usize {
	editor
		.overlay()
		.from_source(ProviderKind::Highlight)
		.filter(|d| !d.is_widget())
		.count()
}

#[tokio::test]
async fn unloaded_language_highlights_after_load() {
	init_tracing();
	let engine = RuleEngine::new();
	let mut editor = builder(article(), &engine).build();
	assert_eq!(inline_highlights(&editor), 0);
	assert_eq!(editor.highlight_state().unwrap().len(), 0);

	// Edits while the load runs do not request it twice.
	editor.dispatch(Transaction::new().insert(8, text("more "))).unwrap();
	assert_eq!(editor.pending_tasks(), 1);

	assert_eq!(editor.drain_async().await, 1);
	assert_eq!(editor.highlight_state().unwrap().len(), 1);
	let first = editor.overlay().from_source(ProviderKind::Highlight).find(|d| !d.is_widget()).map(|d| d.range());
	// "let" opens the code block, whose content now starts at 25.
	assert_eq!(first, Some((25, 28)));
}

#[tokio::test]
async fn poll_only_handles_finished_work() {
	let engine = loaded_engine();
	let renderer = Arc::new(CountingRenderer::default());
	let mut editor = builder(diagram_doc(), &engine).renderer(renderer.clone()).build();
	assert_eq!(editor.poll_async(), 0);

	editor.tick(Instant::now());
	assert_eq!(editor.pending_tasks(), 1);
	let mut handled = 0;
	for _ in 0..16 {
		tokio::task::yield_now().await;
		handled += editor.poll_async();
		if handled > 0 {
			break;
		}
	}
	assert_eq!(handled, 1);
	assert_eq!(editor.pending_tasks(), 0);
	assert_eq!(renderer.calls(), 1);
}

#[tokio::test]
async fn rapid_diagram_edits_render_once_after_quiet_period() {
	let engine = loaded_engine();
	let renderer = Arc::new(CountingRenderer::default());
	let mut editor = builder(diagram_doc(), &engine).renderer(renderer.clone()).build();
	let t0 = Instant::now();

	editor.tick(t0);
	editor.drain_async().await;
	let initial = renderer.calls();
	assert_eq!(initial, 1);

	for (i, ms) in [10u64, 50, 90].into_iter().enumerate() {
		let tx = Transaction::new().insert(22 + i, text(";")).at(t0 + Duration::from_millis(ms));
		editor.dispatch(tx).unwrap();
	}
	for ms in [100u64, 300, 589] {
		editor.tick(t0 + Duration::from_millis(ms));
		assert_eq!(editor.pending_tasks(), 0, "render started early at {ms}ms");
	}

	editor.tick(t0 + Duration::from_millis(590));
	editor.drain_async().await;
	editor.tick(t0 + Duration::from_millis(2_000));
	editor.drain_async().await;
	assert_eq!(renderer.calls() - initial, 1);

	let (_, handle) = editor.diagram_state().unwrap().handles()[0];
	assert_eq!(
		handle.view,
		DiagramView::Rendered {
			markup: "<svg>graph TD; A-->B;;;</svg>".into()
		}
	);
}

#[tokio::test]
async fn previous_artifact_stays_visible_while_pending() {
	let engine = loaded_engine();
	let renderer = Arc::new(CountingRenderer::default());
	let mut editor = builder(diagram_doc(), &engine).renderer(renderer).build();
	let t0 = Instant::now();
	editor.tick(t0);
	editor.drain_async().await;

	editor
		.dispatch(Transaction::new().insert(22, text(";")).at(t0 + Duration::from_millis(5)))
		.unwrap();
	let (_, handle) = editor.diagram_state().unwrap().handles()[0];
	assert_eq!(
		handle.view,
		DiagramView::Rendered {
			markup: "<svg>graph TD; A-->B</svg>".into()
		}
	);
}

#[tokio::test]
async fn default_editors_both_highlight_a_shared_language() {
	init_tracing();
	let mut first = Editor::new(article());
	let mut second = Editor::new(article());
	second.drain_async().await;
	first.drain_async().await;
	assert!(inline_highlights(&first) > 0);
	assert!(inline_highlights(&second) > 0);
}

#[tokio::test]
async fn waiting_editor_loads_its_own_engine_after_the_shared_load() {
	let pending = PendingLanguages::new();
	let open = || {
		let services = HighlightServices::new(Arc::new(RuleEngine::new())).with_pending(pending.clone());
		Editor::builder(article()).highlight_services(services).build()
	};
	let mut first = open();
	let mut second = open();
	assert_eq!((first.pending_tasks(), second.pending_tasks()), (1, 1));

	// The wait ends with the first editor's load, then the second loads into
	// its own engine.
	assert_eq!(second.drain_async().await, 2);
	assert_eq!(first.drain_async().await, 1);
	assert!(inline_highlights(&first) > 0);
	assert!(inline_highlights(&second) > 0);
	assert!(pending.is_empty());
}

#[tokio::test]
async fn new_diagram_block_renders_once_after_quiet_period() {
	let engine = loaded_engine();
	let renderer = Arc::new(CountingRenderer::default());
	let doc = Document::from_blocks([Node::paragraph("flow").unwrap()]).unwrap();
	let mut editor = builder(doc, &engine).renderer(renderer.clone()).build();
	let t0 = Instant::now();

	let block = Node::code_block(Some("mermaid"), "graph TD").unwrap();
	editor.dispatch(Transaction::new().insert_node(6, block).at(t0)).unwrap();
	editor.tick(t0 + Duration::from_millis(30));
	assert_eq!(editor.pending_tasks(), 0);

	for (i, ms) in [50u64, 90].into_iter().enumerate() {
		let tx = Transaction::new().insert(15 + i, text(";")).at(t0 + Duration::from_millis(ms));
		editor.dispatch(tx).unwrap();
	}
	editor.tick(t0 + Duration::from_millis(589));
	assert_eq!(editor.pending_tasks(), 0);
	editor.tick(t0 + Duration::from_millis(700));
	editor.drain_async().await;
	assert_eq!(renderer.calls(), 1);

	let (_, handle) = editor.diagram_state().unwrap().handles()[0];
	assert_eq!(
		handle.view,
		DiagramView::Rendered {
			markup: "<svg>graph TD;;</svg>".into()
		}
	);
}
