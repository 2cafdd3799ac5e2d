//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use folio_editor::error::RenderError;
use folio_editor::{DiagramRenderer, Editor, EditorBuilder, HighlightServices};
use folio_primitives::{BoxFutureStatic, DiagramTheme, Document, Fragment, Node};
use folio_syntax::{HighlightEngine, PendingLanguages, RuleEngine};

/// Routes `tracing` output through the test harness so it shows on failure.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::TRACE)
		.try_init();
}

pub fn block_on<F>(fut: F) -> F::Output
where
	F: std::future::Future + Send,
	F::Output: Send,
{
	let run = || {
		tokio::runtime::Builder::new_current_thread()
			.enable_time()
			.build()
			.unwrap()
			.block_on(fut)
	};
	// A runtime cannot be started on a thread that is already driving one
	// (e.g. inside `#[tokio::test]`), so run on a scoped thread in that case.
	if tokio::runtime::Handle::try_current().is_ok() {
		std::thread::scope(|s| s.spawn(run).join().unwrap())
	} else {
		run()
	}
}

pub fn loaded_engine() -> RuleEngine {
	let engine = RuleEngine::new();
	block_on(engine.load_language("rust")).unwrap();
	engine
}

/// Services over `engine` with a pending set private to the test.
pub fn services(engine: &RuleEngine) -> HighlightServices {
	HighlightServices::new(Arc::new(engine.clone())).with_pending(PendingLanguages::new())
}

pub fn builder(doc: Document, engine: &RuleEngine) -> EditorBuilder {
	Editor::builder(doc).highlight_services(services(engine))
}

pub fn text(s: &str) -> Fragment {
	Fragment::single(Node::plain_text(s).unwrap())
}

/// Heading "Title" at 0, paragraph at 7 (content 8..18), rust code at 19
/// (content 20..30).
pub fn article() -> Document {
	Document::from_blocks([
		Node::heading(1, "Title").unwrap(),
		Node::paragraph("some prose").unwrap(),
		Node::code_block(Some("rust"), "let x = 1;").unwrap(),
	])
	.unwrap()
}

/// Paragraph at 0 (content 1..5), mermaid at 6 (content 7..22).
pub fn diagram_doc() -> Document {
	Document::from_blocks([
		Node::paragraph("flow").unwrap(),
		Node::code_block(Some("mermaid"), "graph TD; A-->B").unwrap(),
	])
	.unwrap()
}

/// Renders to `<svg>` around the source and counts calls.
#[derive(Default)]
pub struct CountingRenderer {
	calls: AtomicUsize,
}

impl CountingRenderer {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl DiagramRenderer for CountingRenderer {
	fn render(&self, source: &str, _notation: &str, _theme: DiagramTheme) -> BoxFutureStatic<Result<String, RenderError>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let markup = format!("<svg>{source}</svg>");
		Box::pin(async move { Ok(markup) })
	}
}
