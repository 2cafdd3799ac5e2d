use std::time::{Duration, Instant};

use folio_primitives::{DiagramTheme, Document, Fragment, Node, RenderOutcome, Signal, Transaction};
use pretty_assertions::assert_eq;

use super::*;
use crate::config::DiagramConfig;

fn provider() -> DiagramProvider {
	DiagramProvider::new(&DiagramConfig::default())
}

fn doc() -> Document {
	Document::from_blocks([
		Node::paragraph("flow").unwrap(),
		Node::code_block(Some("mermaid"), "graph TD; A-->B").unwrap(),
		Node::code_block(Some("rust"), "fn main() {}").unwrap(),
	])
	.unwrap()
}

fn signal(p: &DiagramProvider, state: &DiagramState, doc: &Document, signal: Signal, at: Instant) -> DiagramState {
	let tx = Transaction::signal(signal).at(at).apply(doc).unwrap();
	p.apply(state, &tx).unwrap()
}

fn type_at(p: &DiagramProvider, state: &DiagramState, doc: &Document, pos: usize, text: &str, at: Instant) -> (DiagramState, Document) {
	let tx = Transaction::new()
		.insert(pos, Fragment::single(Node::plain_text(text).unwrap()))
		.at(at)
		.apply(doc)
		.unwrap();
	(p.apply(state, &tx).unwrap(), tx.doc)
}

fn finish(p: &DiagramProvider, state: &DiagramState, doc: &Document, job: &RenderJob, at: Instant) -> DiagramState {
	signal(
		p,
		state,
		doc,
		Signal::DiagramRendered {
			id: job.id,
			generation: job.generation,
			outcome: RenderOutcome::Rendered(format!("<svg>{}</svg>", job.source)),
		},
		at,
	)
}

#[test]
fn only_diagram_languages_get_handles() {
	let p = provider();
	let state = p.init(&doc()).unwrap();
	let handles = state.handles();
	assert_eq!(handles.len(), 1);
	assert_eq!(handles[0].0, 6);
	assert_eq!(handles[0].1.view, DiagramView::Pending);
}

#[test]
fn new_handles_render_on_first_tick() {
	let p = provider();
	let d = doc();
	let state = p.init(&d).unwrap();
	let ticked = signal(&p, &state, &d, Signal::Tick, Instant::now());
	assert_eq!(ticked.jobs().len(), 1);
	assert_eq!(ticked.jobs()[0].source, "graph TD; A-->B");
	assert_eq!(ticked.jobs()[0].notation, "mermaid");

	let job = ticked.jobs()[0].clone();
	let done = finish(&p, &ticked, &d, &job, Instant::now());
	let (_, handle) = done.handle(job.id).unwrap();
	assert_eq!(
		handle.view,
		DiagramView::Rendered {
			markup: "<svg>graph TD; A-->B</svg>".into()
		}
	);
	assert_eq!(handle.in_flight, None);
}

#[test]
fn rapid_edits_coalesce_into_one_render() {
	let p = provider();
	let d = doc();
	let t0 = Instant::now();
	let state = p.init(&d).unwrap();
	let ticked = signal(&p, &state, &d, Signal::Tick, t0);
	let job = ticked.jobs()[0].clone();
	let mut state = finish(&p, &ticked, &d, &job, t0);
	let mut d = d;

	let mut renders = 0;
	for (i, ms) in [0u64, 40, 80].into_iter().enumerate() {
		let at = t0 + Duration::from_millis(1000 + ms);
		let (next, next_doc) = type_at(&p, &state, &d, 8 + i, "x", at);
		let ticked = signal(&p, &next, &next_doc, Signal::Tick, at + Duration::from_millis(10));
		renders += ticked.jobs().len();
		state = ticked;
		d = next_doc;
	}
	assert_eq!(renders, 0);
	// The previous artifact stays visible meanwhile.
	let (_, handle) = state.handle(job.id).unwrap();
	assert!(matches!(handle.view, DiagramView::Rendered { .. }));

	let quiet = t0 + Duration::from_millis(1080 + 500);
	let ticked = signal(&p, &state, &d, Signal::Tick, quiet);
	assert_eq!(ticked.jobs().len(), 1);
	assert_eq!(ticked.jobs()[0].source, "gxxxraph TD; A-->B");
	assert_eq!(ticked.jobs()[0].id, job.id);
	let again = signal(&p, &ticked, &d, Signal::Tick, quiet + Duration::from_secs(5));
	assert!(again.jobs().is_empty());
}

#[test]
fn stale_and_unknown_results_are_ignored() {
	let p = provider();
	let d = doc();
	let t0 = Instant::now();
	let first = signal(&p, &p.init(&d).unwrap(), &d, Signal::Tick, t0);
	let old_job = first.jobs()[0].clone();

	let (edited, d2) = type_at(&p, &first, &d, 8, "y", t0);
	let second = signal(&p, &edited, &d2, Signal::Tick, t0 + Duration::from_secs(1));
	let new_job = second.jobs()[0].clone();
	assert_eq!(new_job.generation, old_job.generation + 1);

	let late = finish(&p, &second, &d2, &old_job, t0);
	assert_eq!(late.handle(old_job.id).unwrap().1.view, DiagramView::Pending);

	let unknown = signal(
		&p,
		&second,
		&d2,
		Signal::DiagramRendered {
			id: DiagramId::new(),
			generation: 1,
			outcome: RenderOutcome::Rendered("x".into()),
		},
		t0,
	);
	assert_eq!(unknown.handles(), second.handles());
}

#[test]
fn failures_become_error_artifacts() {
	let p = provider();
	let d = doc();
	let ticked = signal(&p, &p.init(&d).unwrap(), &d, Signal::Tick, Instant::now());
	let job = ticked.jobs()[0].clone();
	let failed = signal(
		&p,
		&ticked,
		&d,
		Signal::DiagramRendered {
			id: job.id,
			generation: job.generation,
			outcome: RenderOutcome::Failed("parse error on line 1".into()),
		},
		Instant::now(),
	);
	assert_eq!(
		failed.handle(job.id).unwrap().1.view,
		DiagramView::Error {
			message: "parse error on line 1".into()
		}
	);
}

#[test]
fn empty_source_never_renders() {
	let p = provider();
	let d = Document::from_blocks([Node::code_block(Some("mermaid"), "").unwrap()]).unwrap();
	let state = p.init(&d).unwrap();
	assert_eq!(state.handles()[0].1.view, DiagramView::Empty);
	let ticked = signal(&p, &state, &d, Signal::Tick, Instant::now());
	assert!(ticked.jobs().is_empty());
}

#[test]
fn theme_change_rerenders() {
	let p = provider();
	let d = doc();
	let t0 = Instant::now();
	let ticked = signal(&p, &p.init(&d).unwrap(), &d, Signal::Tick, t0);
	let job = ticked.jobs()[0].clone();
	let done = finish(&p, &ticked, &d, &job, t0);

	let dark = signal(&p, &done, &d, Signal::DiagramTheme(DiagramTheme::Dark), t0);
	assert_eq!(dark.theme(), DiagramTheme::Dark);
	let ticked = signal(&p, &dark, &d, Signal::Tick, t0);
	assert_eq!(ticked.jobs().len(), 1);
	assert_eq!(ticked.jobs()[0].theme, DiagramTheme::Dark);

	let same = signal(&p, &ticked, &d, Signal::DiagramTheme(DiagramTheme::Dark), t0);
	assert!(signal(&p, &same, &d, Signal::Tick, t0).jobs().is_empty());
}

#[test]
fn source_visibility_toggles_by_id() {
	let p = provider();
	let d = doc();
	let state = p.init(&d).unwrap();
	let id = state.handles()[0].1.id;
	let hidden = p.decorate(&state, &d).unwrap();
	assert_eq!(hidden.len(), 2);
	assert_eq!(hidden[1], Decoration::node(ProviderKind::Diagram, 6, 23, SOURCE_HIDDEN_CLASS));

	let shown = signal(&p, &state, &d, Signal::ToggleDiagramSource(id), Instant::now());
	let decorations = p.decorate(&shown, &d).unwrap();
	assert_eq!(decorations.len(), 1);
	assert!(decorations[0].is_widget());
}

#[test]
fn ids_survive_edits_and_blocks_are_pruned() {
	let p = provider();
	let d = doc();
	let state = p.init(&d).unwrap();
	let id = state.handles()[0].1.id;

	let (typed, d2) = type_at(&p, &state, &d, 1, "chart ", Instant::now());
	assert_eq!(typed.handles()[0], (12, typed.handle(id).unwrap().1));

	let tx = Transaction::new().delete(12, 29).apply(&d2).unwrap();
	let removed = p.apply(&typed, &tx).unwrap();
	assert!(removed.handles().is_empty());
}

#[test]
fn switching_a_block_to_a_diagram_language_creates_a_handle() {
	let p = provider();
	let d = doc();
	let state = p.init(&d).unwrap();
	let tx = Transaction::new().set_node_attr(23, "language", "mermaid").apply(&d).unwrap();
	let switched = p.apply(&state, &tx).unwrap();
	let positions: Vec<usize> = switched.handles().iter().map(|(pos, _)| *pos).collect();
	assert_eq!(positions, vec![6, 23]);

	let back = Transaction::new().set_node_attr(23, "language", "rust").apply(&tx.doc).unwrap();
	assert_eq!(p.apply(&switched, &back).unwrap().handles().len(), 1);
}

#[test]
fn inserted_blocks_wait_out_the_quiet_period() {
	let p = provider();
	let d = Document::from_blocks([Node::paragraph("flow").unwrap()]).unwrap();
	let t0 = Instant::now();
	let state = p.init(&d).unwrap();
	let tx = Transaction::new()
		.insert_node(6, Node::code_block(Some("mermaid"), "graph TD;").unwrap())
		.at(t0)
		.apply(&d)
		.unwrap();
	let created = p.apply(&state, &tx).unwrap();
	assert_eq!(created.handles().len(), 1);

	let early = signal(&p, &created, &tx.doc, Signal::Tick, t0 + Duration::from_millis(30));
	assert!(early.jobs().is_empty());
	let quiet = signal(&p, &early, &tx.doc, Signal::Tick, t0 + Duration::from_millis(500));
	assert_eq!(quiet.jobs().len(), 1);
}
