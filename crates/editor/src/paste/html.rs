//! Clipboard HTML import.
//!
//! [`BasicHtmlImporter`] tokenizes tag soup into a small element tree and
//! maps the elements it knows onto document nodes. Unknown elements are
//! transparent, so their text survives even when their structure does not.

use folio_primitives::{Attrs, Fragment, Mark, MarkSet, Node, NodeType, SchemaError};
use tracing::debug;

/// Converts clipboard HTML into a block fragment. Never fails: the worst
/// case is plain paragraphs.
pub trait HtmlImporter: Send + Sync {
	fn import(&self, html: &str) -> Fragment;
}

/// Default importer for the common formatting subset.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicHtmlImporter;

impl HtmlImporter for BasicHtmlImporter {
	fn import(&self, html: &str) -> Fragment {
		let dom = parse_dom(html);
		match convert(&dom) {
			Ok(blocks) if !blocks.is_empty() => Fragment::from_nodes(blocks),
			Ok(_) => Fragment::empty(),
			Err(error) => {
				debug!(%error, "html import fell back to plain paragraphs");
				plain_paragraphs(&text_of(&dom))
			}
		}
	}
}

/// One paragraph per non-blank line of `text`.
pub fn plain_paragraphs(text: &str) -> Fragment {
	Fragment::from_nodes(
		text.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.filter_map(|line| Node::paragraph(line).ok()),
	)
}

#[derive(Debug, Clone, PartialEq)]
enum Dom {
	Element {
		tag: String,
		attrs: Vec<(String, String)>,
		children: Vec<Dom>,
	},
	Text(String),
}

impl Dom {
	fn attr(&self, name: &str) -> Option<&str> {
		match self {
			Dom::Element { attrs, .. } => attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str()),
			Dom::Text(_) => None,
		}
	}
}

const VOID: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr", "col", "source", "area", "base"];
const RAW_TEXT: &[&str] = &["script", "style", "title", "head", "template"];

fn text_of(nodes: &[Dom]) -> String {
	let mut out = String::new();
	for node in nodes {
		match node {
			Dom::Text(text) => out.push_str(text),
			Dom::Element { tag, children, .. } if !RAW_TEXT.contains(&tag.as_str()) => {
				if is_block_tag(tag) && !out.ends_with('\n') {
					out.push('\n');
				}
				if tag == "br" {
					out.push('\n');
				}
				out.push_str(&text_of(children));
			}
			Dom::Element { .. } => {}
		}
	}
	out
}

fn is_block_tag(tag: &str) -> bool {
	matches!(
		tag,
		"p" | "div"
			| "h1" | "h2" | "h3"
			| "h4" | "h5" | "h6"
			| "pre" | "ul" | "ol"
			| "li" | "blockquote"
			| "hr" | "section"
			| "article" | "header"
			| "footer" | "main"
			| "table" | "tr"
			| "figure"
	)
}

struct Open {
	tag: String,
	attrs: Vec<(String, String)>,
	children: Vec<Dom>,
}

struct TreeBuilder {
	stack: Vec<Open>,
}

impl TreeBuilder {
	fn new() -> Self {
		Self {
			stack: vec![Open {
				tag: String::new(),
				attrs: Vec::new(),
				children: Vec::new(),
			}],
		}
	}

	fn push(&mut self, node: Dom) {
		if let Some(top) = self.stack.last_mut() {
			top.children.push(node);
		}
	}

	fn text(&mut self, text: String) {
		if text.is_empty() {
			return;
		}
		if let Some(top) = self.stack.last_mut() {
			if let Some(Dom::Text(prev)) = top.children.last_mut() {
				prev.push_str(&text);
				return;
			}
			top.children.push(Dom::Text(text));
		}
	}

	fn open(&mut self, tag: String, attrs: Vec<(String, String)>) {
		// Paragraphs and list items close implicitly.
		match tag.as_str() {
			"li" => self.close_until(&["li"], &["ul", "ol"]),
			_ if is_block_tag(&tag) => self.close_until(&["p"], &["div", "blockquote", "li", "td", "th"]),
			_ => {}
		}
		if VOID.contains(&tag.as_str()) {
			self.push(Dom::Element {
				tag,
				attrs,
				children: Vec::new(),
			});
			return;
		}
		self.stack.push(Open {
			tag,
			attrs,
			children: Vec::new(),
		});
	}

	/// Closes the innermost open `targets` element unless a `scope` element
	/// is nearer.
	fn close_until(&mut self, targets: &[&str], scope: &[&str]) {
		let found = self
			.stack
			.iter()
			.enumerate()
			.skip(1)
			.rev()
			.find(|(_, open)| targets.contains(&open.tag.as_str()) || scope.contains(&open.tag.as_str()));
		if let Some((index, open)) = found
			&& targets.contains(&open.tag.as_str())
		{
			self.pop_to(index);
		}
	}

	fn close(&mut self, tag: &str) {
		if let Some(index) = self.stack.iter().skip(1).rposition(|open| open.tag == tag) {
			self.pop_to(index + 1);
		}
	}

	fn pop_to(&mut self, index: usize) {
		while self.stack.len() > index.max(1) {
			let Some(open) = self.stack.pop() else {
				break;
			};
			self.push(Dom::Element {
				tag: open.tag,
				attrs: open.attrs,
				children: open.children,
			});
		}
	}

	fn finish(mut self) -> Vec<Dom> {
		self.pop_to(1);
		self.stack.pop().map(|root| root.children).unwrap_or_default()
	}
}

fn parse_dom(html: &str) -> Vec<Dom> {
	let mut builder = TreeBuilder::new();
	let mut rest = html;
	while !rest.is_empty() {
		let Some(lt) = rest.find('<') else {
			builder.text(decode_entities(rest));
			break;
		};
		builder.text(decode_entities(&rest[..lt]));
		rest = &rest[lt..];

		if let Some(comment) = rest.strip_prefix("<!--") {
			rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
			continue;
		}
		if rest.starts_with("<!") || rest.starts_with("<?") {
			rest = rest.find('>').map_or("", |end| &rest[end + 1..]);
			continue;
		}
		if let Some(closing) = rest.strip_prefix("</") {
			let end = closing.find('>').unwrap_or(closing.len());
			let name = closing[..end].trim().to_ascii_lowercase();
			builder.close(&name);
			rest = closing.get(end + 1..).unwrap_or("");
			continue;
		}

		let Some((tag, attrs, consumed)) = open_tag(rest) else {
			// A stray `<` is text.
			builder.text("<".to_string());
			rest = &rest[1..];
			continue;
		};
		rest = &rest[consumed..];
		if RAW_TEXT.contains(&tag.as_str()) {
			let close = format!("</{tag}");
			let end = rest.to_ascii_lowercase().find(&close).unwrap_or(rest.len());
			rest = &rest[end..];
			rest = rest.find('>').map_or("", |gt| &rest[gt + 1..]);
			continue;
		}
		builder.open(tag, attrs);
	}
	builder.finish()
}

/// Reads `<name attr="v" ...>` at the start of `input`.
fn open_tag(input: &str) -> Option<(String, Vec<(String, String)>, usize)> {
	let body = &input[1..];
	let name_len = body.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-')).unwrap_or(body.len());
	if name_len == 0 || !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
		return None;
	}
	let tag = body[..name_len].to_ascii_lowercase();
	let mut attrs = Vec::new();
	let mut rest = &body[name_len..];
	loop {
		rest = rest.trim_start();
		if let Some(after) = rest.strip_prefix("/>") {
			return Some((tag, attrs, input.len() - after.len()));
		}
		if let Some(after) = rest.strip_prefix('>') {
			return Some((tag, attrs, input.len() - after.len()));
		}
		if rest.is_empty() {
			return None;
		}
		let name_end = rest
			.find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
			.unwrap_or(rest.len());
		if name_end == 0 {
			rest = &rest[1..];
			continue;
		}
		let name = rest[..name_end].to_ascii_lowercase();
		rest = rest[name_end..].trim_start();
		let Some(after_eq) = rest.strip_prefix('=') else {
			attrs.push((name, String::new()));
			continue;
		};
		let after_eq = after_eq.trim_start();
		let (value, remaining) = match after_eq.chars().next() {
			Some(quote @ ('"' | '\'')) => {
				let inner = &after_eq[1..];
				let end = inner.find(quote)?;
				(&inner[..end], &inner[end + 1..])
			}
			_ => {
				let end = after_eq
					.find(|c: char| c.is_whitespace() || c == '>')
					.unwrap_or(after_eq.len());
				(&after_eq[..end], &after_eq[end..])
			}
		};
		attrs.push((name, decode_entities(value)));
		rest = remaining;
	}
}

fn decode_entities(text: &str) -> String {
	if !text.contains('&') {
		return text.to_string();
	}
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(amp) = rest.find('&') {
		out.push_str(&rest[..amp]);
		rest = &rest[amp..];
		let decoded = rest[1..].find(';').filter(|&end| end <= 10).and_then(|end| {
			let entity = &rest[1..1 + end];
			entity_char(entity).map(|ch| (ch, end + 2))
		});
		match decoded {
			Some((ch, len)) => {
				out.push(ch);
				rest = &rest[len..];
			}
			None => {
				out.push('&');
				rest = &rest[1..];
			}
		}
	}
	out.push_str(rest);
	out
}

fn entity_char(entity: &str) -> Option<char> {
	if let Some(num) = entity.strip_prefix('#') {
		let code = match num.strip_prefix(['x', 'X']) {
			Some(hex) => u32::from_str_radix(hex, 16).ok()?,
			None => num.parse().ok()?,
		};
		return char::from_u32(code);
	}
	Some(match entity {
		"amp" => '&',
		"lt" => '<',
		"gt" => '>',
		"quot" => '"',
		"apos" => '\'',
		"nbsp" => '\u{a0}',
		"ndash" => '\u{2013}',
		"mdash" => '\u{2014}',
		"hellip" => '\u{2026}',
		"copy" => '\u{a9}',
		_ => return None,
	})
}

enum Inline {
	Text(String, MarkSet),
	Break,
}

/// Accumulates inline content and emits it as paragraphs or heading bodies.
#[derive(Default)]
struct InlineRun {
	items: Vec<Inline>,
}

impl InlineRun {
	fn is_blank(&self) -> bool {
		self.items.iter().all(|item| match item {
			Inline::Text(text, _) => text.trim_ascii().is_empty(),
			Inline::Break => false,
		})
	}

	fn take_nodes(&mut self) -> Result<Vec<Node>, SchemaError> {
		let items = std::mem::take(&mut self.items);
		let mut nodes = Vec::new();
		// A space is owed before the next word on the current line.
		let mut space = false;
		let mut started = false;
		for item in items {
			match item {
				Inline::Break => {
					nodes.push(Node::leaf(NodeType::HardBreak)?);
					space = false;
					started = false;
				}
				Inline::Text(text, marks) => {
					let words: Vec<&str> = text.split_ascii_whitespace().collect();
					if text.starts_with(|c: char| c.is_ascii_whitespace()) {
						space = true;
					}
					if !words.is_empty() {
						let mut collapsed = String::new();
						if space && started {
							collapsed.push(' ');
						}
						collapsed.push_str(&words.join(" "));
						nodes.push(Node::new_text(collapsed, marks)?);
						started = true;
						space = false;
					}
					if text.ends_with(|c: char| c.is_ascii_whitespace()) {
						space = true;
					}
				}
			}
		}
		Ok(nodes)
	}
}

/// Converts top-level nodes into blocks.
fn convert(nodes: &[Dom]) -> Result<Vec<Node>, SchemaError> {
	let mut blocks = Vec::new();
	let mut run = InlineRun::default();
	convert_into(nodes, &mut blocks, &mut run)?;
	flush_paragraph(&mut blocks, &mut run)?;
	Ok(blocks)
}

fn flush_paragraph(blocks: &mut Vec<Node>, run: &mut InlineRun) -> Result<(), SchemaError> {
	if run.is_blank() {
		run.items.clear();
		return Ok(());
	}
	let children = run.take_nodes()?;
	blocks.push(Node::block(NodeType::Paragraph, children)?);
	Ok(())
}

fn convert_into(nodes: &[Dom], blocks: &mut Vec<Node>, run: &mut InlineRun) -> Result<(), SchemaError> {
	for node in nodes {
		let Dom::Element { tag, children, .. } = node else {
			inline_into(node, &MarkSet::new(), run);
			continue;
		};
		match tag.as_str() {
			"p" => {
				flush_paragraph(blocks, run)?;
				let mut inner = InlineRun::default();
				convert_into(children, blocks, &mut inner)?;
				flush_paragraph(blocks, &mut inner)?;
			}
			"h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
				flush_paragraph(blocks, run)?;
				let level = i64::from(tag.as_bytes()[1] - b'0');
				let mut inner = InlineRun::default();
				for child in children {
					inline_into(child, &MarkSet::new(), &mut inner);
				}
				blocks.push(Node::new(
					NodeType::Heading,
					Attrs::new().with("level", level),
					Fragment::from_nodes(inner.take_nodes()?),
				)?);
			}
			"pre" => {
				flush_paragraph(blocks, run)?;
				let language = code_language(node);
				let text = text_of(children);
				let text = text.strip_suffix('\n').unwrap_or(&text);
				blocks.push(Node::code_block(language.as_deref(), text)?);
			}
			"ul" | "ol" => {
				flush_paragraph(blocks, run)?;
				blocks.push(list(node)?);
			}
			"blockquote" => {
				flush_paragraph(blocks, run)?;
				blocks.push(Node::block(NodeType::Blockquote, convert(children)?)?);
			}
			"hr" => {
				flush_paragraph(blocks, run)?;
				blocks.push(Node::leaf(NodeType::HorizontalRule)?);
			}
			_ if is_block_tag(tag) => {
				flush_paragraph(blocks, run)?;
				convert_into(children, blocks, run)?;
				flush_paragraph(blocks, run)?;
			}
			_ => inline_into(node, &MarkSet::new(), run),
		}
	}
	Ok(())
}

fn code_language(pre: &Dom) -> Option<String> {
	let from_class = |node: &Dom| {
		node.attr("class")?
			.split_whitespace()
			.find_map(|class| class.strip_prefix("language-").or_else(|| class.strip_prefix("lang-")))
			.filter(|lang| !lang.is_empty())
			.map(str::to_string)
	};
	if let Some(lang) = from_class(pre) {
		return Some(lang);
	}
	let Dom::Element { children, .. } = pre else {
		return None;
	};
	children.iter().find_map(|child| match child {
		Dom::Element { tag, .. } if tag == "code" => from_class(child),
		_ => None,
	})
}

fn is_checkbox(node: &Dom) -> bool {
	matches!(node, Dom::Element { tag, .. } if tag == "input")
		&& node.attr("type").is_some_and(|ty| ty.eq_ignore_ascii_case("checkbox"))
}

/// Returns the checkbox state when the item leads with a checkbox input.
fn leading_checkbox(children: &[Dom]) -> Option<bool> {
	for child in children {
		match child {
			Dom::Text(text) if text.trim_ascii().is_empty() => continue,
			Dom::Element { children, .. } if !is_checkbox(child) => return leading_checkbox(children),
			_ if is_checkbox(child) => return Some(child.attr("checked").is_some()),
			_ => return None,
		}
	}
	None
}

fn list(node: &Dom) -> Result<Node, SchemaError> {
	let Dom::Element { tag, children, .. } = node else {
		return Node::block(NodeType::BulletList, []);
	};
	let items: Vec<&Vec<Dom>> = children
		.iter()
		.filter_map(|child| match child {
			Dom::Element { tag, children, .. } if tag == "li" => Some(children),
			_ => None,
		})
		.collect();

	let checks: Vec<Option<bool>> = items.iter().map(|item| leading_checkbox(item)).collect();
	if !items.is_empty() && checks.iter().all(Option::is_some) {
		let mut nodes = Vec::with_capacity(items.len());
		for (item, checked) in items.iter().zip(checks) {
			nodes.push(Node::new(
				NodeType::CheckboxItem,
				Attrs::new().with("checked", checked.unwrap_or(false)),
				Fragment::from_nodes(item_blocks(item)?),
			)?);
		}
		return Node::block(NodeType::CheckboxList, nodes);
	}

	let mut nodes = Vec::with_capacity(items.len());
	for item in &items {
		nodes.push(Node::block(NodeType::ListItem, item_blocks(item)?)?);
	}
	if tag == "ol" {
		let order = node.attr("start").and_then(|s| s.trim().parse::<i64>().ok()).filter(|n| *n >= 0).unwrap_or(1);
		Node::new(NodeType::OrderedList, Attrs::new().with("order", order), Fragment::from_nodes(nodes))
	} else {
		Node::block(NodeType::BulletList, nodes)
	}
}

fn item_blocks(children: &[Dom]) -> Result<Vec<Node>, SchemaError> {
	let mut blocks = convert(children)?;
	if blocks.is_empty() {
		blocks.push(Node::paragraph("")?);
	}
	Ok(blocks)
}

fn inline_into(node: &Dom, marks: &MarkSet, run: &mut InlineRun) {
	match node {
		Dom::Text(text) => run.items.push(Inline::Text(text.clone(), marks.clone())),
		Dom::Element { tag, children, .. } => {
			let marks = match tag.as_str() {
				"br" => {
					run.items.push(Inline::Break);
					return;
				}
				"strong" | "b" => marks.with(Mark::Strong),
				"em" | "i" => marks.with(Mark::Em),
				"code" | "kbd" | "samp" => marks.with(Mark::Code),
				"s" | "del" | "strike" => marks.with(Mark::Strikethrough),
				"a" => match node.attr("href").map(str::trim).filter(|href| !href.is_empty()) {
					Some(href) => marks.with(Mark::Link { href: href.to_string() }),
					None => marks.clone(),
				},
				_ if RAW_TEXT.contains(&tag.as_str()) => return,
				_ => marks.clone(),
			};
			for child in children {
				inline_into(child, &marks, run);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn import(html: &str) -> Fragment {
		BasicHtmlImporter.import(html)
	}

	fn kinds(fragment: &Fragment) -> Vec<NodeType> {
		fragment.iter().map(Node::kind).collect()
	}

	#[test]
	fn maps_known_blocks() {
		let fragment = import(
			"<h2>Title</h2><p>One <b>bold</b> word</p><ul><li>a</li><li>b</li></ul><hr><blockquote><p>q</p></blockquote>",
		);
		assert_eq!(
			kinds(&fragment),
			vec![
				NodeType::Heading,
				NodeType::Paragraph,
				NodeType::BulletList,
				NodeType::HorizontalRule,
				NodeType::Blockquote
			]
		);
		assert_eq!(fragment.child(0).unwrap().heading_level(), Some(2));
		let para = fragment.child(1).unwrap();
		assert_eq!(para.text_content(), "One bold word");
		assert!(para.child(1).unwrap().marks().contains(&Mark::Strong));
	}

	#[test]
	fn collapses_whitespace() {
		let fragment = import("<p>\n  hello\n   <em>big</em>   world  \n</p>");
		assert_eq!(fragment.child(0).unwrap().text_content(), "hello big world");
	}

	#[test]
	fn pre_keeps_text_and_language() {
		let fragment = import("<pre><code class=\"language-rust\">fn a() {\n  1 &lt; 2\n}\n</code></pre>");
		let code = fragment.child(0).unwrap();
		assert_eq!(code.language(), Some("rust"));
		assert_eq!(code.text_content(), "fn a() {\n  1 < 2\n}");
	}

	#[test]
	fn links_and_breaks() {
		let fragment = import("<p><a href=\"https://x.test/a?b=1&amp;c=2\">link</a><br>next</p>");
		let para = fragment.child(0).unwrap();
		assert_eq!(
			para.child(0).unwrap().marks().iter().next(),
			Some(&Mark::Link {
				href: "https://x.test/a?b=1&c=2".into()
			})
		);
		assert_eq!(para.child(1).unwrap().kind(), NodeType::HardBreak);
		assert_eq!(para.child(2).unwrap().text(), Some("next"));
	}

	#[test]
	fn unclosed_tags_close_implicitly() {
		let fragment = import("<p>one<p>two<ol start=\"4\"><li>x<li>y</ol>");
		assert_eq!(kinds(&fragment), vec![NodeType::Paragraph, NodeType::Paragraph, NodeType::OrderedList]);
		let list = fragment.child(2).unwrap();
		assert_eq!(list.child_count(), 2);
		assert_eq!(list.attr("order"), Some(&4i64.into()));
	}

	#[test]
	fn checkbox_lists() {
		let fragment =
			import("<ul><li><input type=\"checkbox\" checked> done</li><li><input type=\"checkbox\"> open</li></ul>");
		let list = fragment.child(0).unwrap();
		assert_eq!(list.kind(), NodeType::CheckboxList);
		assert_eq!(list.child(0).unwrap().attr("checked"), Some(&true.into()));
		assert_eq!(list.child(1).unwrap().text_content(), "open");
	}

	#[test]
	fn scripts_and_unknown_tags() {
		let fragment = import("<script>alert(1)</script><custom-tag>kept <span>text</span></custom-tag><!-- c -->");
		assert_eq!(kinds(&fragment), vec![NodeType::Paragraph]);
		assert_eq!(fragment.text_content(), "kept text");
	}

	#[test]
	fn garbage_is_text() {
		let fragment = import("a < b && c > d");
		assert_eq!(fragment.text_content(), "a < b && c > d");
	}
}
