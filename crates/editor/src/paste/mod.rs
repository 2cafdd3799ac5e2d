//! Clipboard ingestion: classify a payload, build a fragment, and wrap the
//! insertion in a paste transaction.

mod embed;
mod html;
mod markdown;
mod normalize;


use std::sync::Arc;

use folio_primitives::{Attrs, Document, Fragment, Mark, MarkSet, Node, NodeType, OriginMarkers, Selection, Transaction};
use tracing::{debug, trace};

pub use self::embed::{EmbedMatch, EmbedMatcher, HostEmbedMatcher, bare_url};
pub use self::html::{BasicHtmlImporter, HtmlImporter, plain_paragraphs};
pub use self::markdown::{parse_inline, parse_markdown};
pub use self::normalize::{markdown_score, normalize_markdown, normalize_to_lf};
use crate::config::PasteConfig;
use crate::error::EditorError;

/// Metadata some editors attach to copied text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorMeta {
	/// Language mode of the source editor, e.g. `rust` or `markdown`.
	pub mode: String,
}

impl EditorMeta {
	pub fn new(mode: impl Into<String>) -> Self {
		Self { mode: mode.into() }
	}

	fn is_markdown(&self) -> bool {
		self.mode.eq_ignore_ascii_case("markdown")
	}
}

/// Everything the clipboard offered for one paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
	pub text: String,
	pub html: Option<String>,
	pub editor_meta: Option<EditorMeta>,
}

impl ClipboardPayload {
	pub fn text(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			..Self::default()
		}
	}

	pub fn with_html(mut self, html: impl Into<String>) -> Self {
		self.html = Some(html.into());
		self
	}

	pub fn with_editor_meta(mut self, meta: EditorMeta) -> Self {
		self.editor_meta = Some(meta);
		self
	}
}

/// How a payload is turned into content, in classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteKind {
	/// A bare URL at a cursor becomes an embed node.
	Embed,
	/// A bare URL over a selection links the selection; at a cursor, one
	/// with no embed is inserted as linked text.
	Link,
	/// Text pasted into code goes in verbatim.
	Code,
	/// Text from an editor declaring a language becomes a code block.
	CodeBlock,
	/// HTML copied out of this editor.
	EditorSlice,
	Markdown,
	Html,
	PlainText,
}

/// A classified paste ready to dispatch.
#[derive(Debug, Clone)]
pub struct PastePlan {
	pub kind: PasteKind,
	pub transaction: Transaction,
}

/// Classifies clipboard payloads and builds paste transactions.
pub struct PastePipeline {
	threshold: f64,
	slice_marker: String,
	matcher: Arc<dyn EmbedMatcher>,
	importer: Arc<dyn HtmlImporter>,
}

impl std::fmt::Debug for PastePipeline {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PastePipeline")
			.field("threshold", &self.threshold)
			.field("slice_marker", &self.slice_marker)
			.finish_non_exhaustive()
	}
}

impl PastePipeline {
	pub fn new(config: &PasteConfig) -> Self {
		Self {
			threshold: config.markdown_threshold,
			slice_marker: config.slice_marker.clone(),
			matcher: Arc::new(HostEmbedMatcher::new(config.embed_hosts.iter().cloned())),
			importer: Arc::new(BasicHtmlImporter),
		}
	}

	pub fn with_matcher(mut self, matcher: Arc<dyn EmbedMatcher>) -> Self {
		self.matcher = matcher;
		self
	}

	pub fn with_importer(mut self, importer: Arc<dyn HtmlImporter>) -> Self {
		self.importer = importer;
		self
	}

	/// Picks the ingestion path for `payload` pasted over `selection`.
	pub fn classify(&self, doc: &Document, selection: Selection, payload: &ClipboardPayload) -> PasteKind {
		let in_code = selection_in_code(doc, selection);
		if !in_code && let Some(url) = bare_url(&payload.text) {
			if !selection.is_empty() {
				return PasteKind::Link;
			}
			if self.matcher.match_url(&url).is_some() {
				return PasteKind::Embed;
			}
			return PasteKind::Link;
		}
		if in_code {
			return PasteKind::Code;
		}
		let meta = payload.editor_meta.as_ref();
		if meta.is_some_and(|meta| !meta.is_markdown() && !meta.mode.trim().is_empty()) {
			return PasteKind::CodeBlock;
		}
		if let Some(html) = &payload.html
			&& html.contains(self.slice_marker.as_str())
		{
			return PasteKind::EditorSlice;
		}
		if meta.is_some_and(EditorMeta::is_markdown) || markdown_score(&payload.text) > self.threshold {
			return PasteKind::Markdown;
		}
		if payload.html.as_deref().is_some_and(|html| !html.trim().is_empty()) {
			return PasteKind::Html;
		}
		PasteKind::PlainText
	}

	/// Builds the paste transaction, or `None` when there is nothing to insert.
	pub fn prepare(
		&self,
		doc: &Document,
		selection: Selection,
		payload: &ClipboardPayload,
	) -> Result<Option<PastePlan>, EditorError> {
		let kind = self.classify(doc, selection, payload);
		trace!(?kind, "paste.classify");
		let base = Transaction::new()
			.with_marker(OriginMarkers::PASTE)
			.with_selection_before(selection);
		let text = normalize_to_lf(payload.text.clone());

		let transaction = match kind {
			PasteKind::Link => {
				let href = bare_url(&text).map(String::from).unwrap_or_else(|| text.trim().to_string());
				if selection.is_empty() {
					let marks = MarkSet::new().with(Mark::Link { href: href.clone() });
					let linked = Node::new_text(href, marks)?;
					let paragraph = Node::new(NodeType::Paragraph, Attrs::new(), Fragment::single(linked))?;
					insert_fragment(base, doc, selection, Fragment::single(paragraph))?
				} else {
					Some(base.add_mark(selection.from(), selection.to(), Mark::Link { href }))
				}
			}
			PasteKind::Embed => match bare_url(&text).and_then(|url| self.matcher.match_url(&url)) {
				Some(found) => Some(insert_embed(base, doc, selection, found)?),
				None => None,
			},
			PasteKind::Code => {
				if text.is_empty() {
					None
				} else {
					let (from, to) = collapse(doc, selection)?;
					let inserted = Fragment::single(Node::plain_text(text)?);
					let end = from + inserted.size();
					Some(base.replace(from, to, inserted).with_selection_after(Selection::cursor(end)))
				}
			}
			PasteKind::CodeBlock => {
				let language = payload.editor_meta.as_ref().map(|meta| meta.mode.trim());
				let block = Node::code_block(language, &text)?;
				insert_fragment(base, doc, selection, Fragment::single(block))?
			}
			PasteKind::EditorSlice | PasteKind::Html => {
				let html = payload.html.as_deref().unwrap_or_default();
				let fragment = self.importer.import(html);
				let fragment = if fragment.is_empty() { plain_paragraphs(&text) } else { fragment };
				insert_fragment(base, doc, selection, fragment)?
			}
			PasteKind::Markdown => {
				let fragment = parse_markdown(&normalize_markdown(&text))?;
				insert_fragment(base, doc, selection, fragment)?
			}
			PasteKind::PlainText => insert_fragment(base, doc, selection, plain_paragraphs(&text))?,
		};

		Ok(transaction.map(|transaction| PastePlan { kind, transaction }))
	}

	/// Builds a plain inline text insertion, used when a richer paste fails
	/// to apply.
	pub fn plain_fallback(
		&self,
		doc: &Document,
		selection: Selection,
		payload: &ClipboardPayload,
	) -> Result<Option<PastePlan>, EditorError> {
		let text = normalize_to_lf(payload.text.clone()).replace('\n', " ");
		if text.trim().is_empty() {
			return Ok(None);
		}
		let base = Transaction::new()
			.with_marker(OriginMarkers::PASTE)
			.with_selection_before(selection);
		let paragraph = Node::paragraph(&text)?;
		let transaction = insert_fragment(base, doc, selection, Fragment::single(paragraph))?;
		Ok(transaction.map(|transaction| PastePlan {
			kind: PasteKind::PlainText,
			transaction,
		}))
	}
}

fn selection_in_code(doc: &Document, selection: Selection) -> bool {
	let (Ok(from), Ok(to)) = (doc.resolve(selection.from()), doc.resolve(selection.to())) else {
		return false;
	};
	from.in_code() && from.same_parent(&to)
}

/// Resolves the selection, collapsing it to its start when its ends sit in
/// different parents.
fn collapse(doc: &Document, selection: Selection) -> Result<(usize, usize), EditorError> {
	let from = doc.resolve(selection.from())?;
	let to = doc.resolve(selection.to())?;
	if from.same_parent(&to) {
		Ok((selection.from(), selection.to()))
	} else {
		debug!(from = selection.from(), to = selection.to(), "paste selection spans parents; collapsing");
		Ok((selection.from(), selection.from()))
	}
}

/// Inserts `fragment` over the selection.
///
/// A lone paragraph contributes only its inline content. Blocks landing
/// inside a textblock replace that textblock with its head, the blocks and
/// its tail in one step.
fn insert_fragment(
	base: Transaction,
	doc: &Document,
	selection: Selection,
	fragment: Fragment,
) -> Result<Option<Transaction>, EditorError> {
	if fragment.is_empty() {
		return Ok(None);
	}
	let (from, to) = collapse(doc, selection)?;
	let rpos = doc.resolve(from)?;
	let parent_is_textblock = rpos.depth() >= 1 && rpos.parent().is_textblock();

	let single_paragraph = fragment.len() == 1 && fragment.child(0).is_some_and(|n| n.kind() == NodeType::Paragraph);
	if single_paragraph && let Some(paragraph) = fragment.child(0) {
		let inline = paragraph.content().clone();
		if inline.is_empty() {
			return Ok(None);
		}
		if parent_is_textblock {
			let end = from + inline.size();
			return Ok(Some(
				base.replace(from, to, inline).with_selection_after(Selection::cursor(end)),
			));
		}
	}

	if !parent_is_textblock {
		let end = from + fragment.size();
		return Ok(Some(
			base.replace(from, to, fragment).with_selection_after(Selection::cursor(end)),
		));
	}

	let depth = rpos.depth();
	let textblock = rpos.parent();
	let (Some(before), Some(after)) = (rpos.before(depth), rpos.after(depth)) else {
		return Ok(None);
	};
	let head_end = rpos.parent_offset();
	let tail_start = head_end + (to - from);
	let content = textblock.content();
	let head = content.cut(0, head_end).unwrap_or_else(Fragment::empty);
	let tail = content.cut(tail_start, content.size()).unwrap_or_else(Fragment::empty);

	let mut nodes = Vec::with_capacity(fragment.len() + 2);
	if !head.is_empty() {
		nodes.push(textblock.with_content(head)?);
	}
	nodes.extend(fragment.iter().cloned());
	let end = before + nodes.iter().map(Node::node_size).sum::<usize>();
	if !tail.is_empty() {
		nodes.push(textblock.with_content(tail)?);
	}
	Ok(Some(
		base.replace(before, after, Fragment::from_nodes(nodes))
			.with_selection_after(Selection::cursor(end)),
	))
}

/// Places an embed for `found` relative to the cursor.
///
/// Inside a container the embed goes at the cursor. An empty textblock is
/// replaced. Otherwise the embed follows the current textblock.
fn insert_embed(
	base: Transaction,
	doc: &Document,
	selection: Selection,
	found: EmbedMatch,
) -> Result<Transaction, EditorError> {
	let embed = Node::new(
		NodeType::Embed,
		Attrs::new().with("href", found.href).with("provider", found.provider),
		Fragment::empty(),
	)?;
	let rpos = doc.resolve(selection.head)?;
	let depth = rpos.depth();
	let placement = if depth >= 1 && rpos.parent().is_textblock() {
		match (rpos.before(depth), rpos.after(depth)) {
			(Some(before), Some(after)) if rpos.parent().content_size() == 0 => Some((before, after)),
			(_, Some(after)) => Some((after, after)),
			_ => None,
		}
	} else {
		None
	};
	let (from, to) = placement.unwrap_or((selection.head, selection.head));
	Ok(base
		.replace(from, to, Fragment::single(embed))
		.with_selection_after(Selection::cursor(from + 1)))
}
