//! A small block-and-inline markdown reader producing document fragments.
//!
//! Covers what clipboard text realistically carries: ATX headings, fenced
//! code, bullet, ordered and checkbox lists, block quotes, thematic breaks
//! and paragraphs, with strong, emphasis, code, strikethrough and link
//! spans inline. Anything else reads as paragraph text.

use std::sync::LazyLock;

use folio_primitives::{Attrs, Fragment, Mark, MarkSet, Node, NodeType, SchemaError};
use regex::Regex;

use super::normalize::normalize_to_lf;

static ATX_HEADING: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s{0,3}(#{1,6})(?:[ \t]+(.*?))?[ \t]*$").expect("valid pattern"));
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s{0,3}(`{3,}|~{3,})(.*)$").expect("valid pattern"));
static THEMATIC_BREAK: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s{0,3}(?:-{3,}|\*{3,}|_{3,})\s*$").expect("valid pattern"));
static TASK_ITEM: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^( *)[*+-][ \t]+\[([xX_\- ])\](?:[ \t]+(.*))?$").expect("valid pattern"));
static BULLET_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^( *)[*+-][ \t]+(.*)$").expect("valid pattern"));
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^( *)(\d{1,9})[.)][ \t]+(.*)$").expect("valid pattern"));
static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s{0,3}>[ ]?(.*)$").expect("valid pattern"));

/// Lines indented at least this far continue the previous list item.
const CONTINUATION_INDENT: usize = 2;

/// Parses markdown text into a block fragment.
pub fn parse_markdown(text: &str) -> Result<Fragment, SchemaError> {
	let text = normalize_to_lf(text.to_string());
	let lines: Vec<&str> = text.split('\n').collect();
	Ok(Fragment::from_nodes(parse_blocks(&lines)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
	Bullet,
	Ordered,
	Checkbox,
}

impl ListKind {
	fn list_type(self) -> NodeType {
		match self {
			ListKind::Bullet => NodeType::BulletList,
			ListKind::Ordered => NodeType::OrderedList,
			ListKind::Checkbox => NodeType::CheckboxList,
		}
	}
}

struct ItemStart<'a> {
	indent: usize,
	kind: ListKind,
	order: i64,
	checked: bool,
	content: &'a str,
}

fn item_start(line: &str) -> Option<ItemStart<'_>> {
	if THEMATIC_BREAK.is_match(line) {
		return None;
	}
	if let Some(caps) = TASK_ITEM.captures(line) {
		return Some(ItemStart {
			indent: caps[1].len(),
			kind: ListKind::Checkbox,
			order: 0,
			checked: matches!(&caps[2], "x" | "X"),
			content: caps.get(3).map_or("", |m| m.as_str()),
		});
	}
	if let Some(caps) = BULLET_ITEM.captures(line) {
		return Some(ItemStart {
			indent: caps[1].len(),
			kind: ListKind::Bullet,
			order: 0,
			checked: false,
			content: caps.get(2).map_or("", |m| m.as_str()),
		});
	}
	let caps = ORDERED_ITEM.captures(line)?;
	Some(ItemStart {
		indent: caps[1].len(),
		kind: ListKind::Ordered,
		order: caps[2].parse().unwrap_or(1),
		checked: false,
		content: caps.get(3).map_or("", |m| m.as_str()),
	})
}

fn top_level_item(line: &str) -> Option<ItemStart<'_>> {
	item_start(line).filter(|item| item.indent < CONTINUATION_INDENT)
}

fn starts_block(line: &str) -> bool {
	CODE_FENCE.is_match(line)
		|| ATX_HEADING.is_match(line)
		|| THEMATIC_BREAK.is_match(line)
		|| BLOCKQUOTE.is_match(line)
		|| top_level_item(line).is_some()
}

fn indent_of(line: &str) -> usize {
	line.len() - line.trim_start_matches(' ').len()
}

fn parse_blocks(lines: &[&str]) -> Result<Vec<Node>, SchemaError> {
	let mut blocks = Vec::new();
	let mut i = 0;
	while i < lines.len() {
		let line = lines[i];
		if line.trim().is_empty() {
			i += 1;
			continue;
		}

		if let Some(caps) = CODE_FENCE.captures(line) {
			let fence = &caps[1];
			let language = caps[2].split_whitespace().next().filter(|lang| !lang.contains('`'));
			let mut body = Vec::new();
			i += 1;
			while i < lines.len() {
				let current = lines[i];
				i += 1;
				if closes_fence(current, fence) {
					break;
				}
				body.push(current);
			}
			blocks.push(Node::code_block(language, &body.join("\n"))?);
			continue;
		}

		if THEMATIC_BREAK.is_match(line) {
			blocks.push(Node::leaf(NodeType::HorizontalRule)?);
			i += 1;
			continue;
		}

		if let Some(caps) = ATX_HEADING.captures(line) {
			let level = caps[1].len() as i64;
			let text = caps.get(2).map_or("", |m| m.as_str());
			let text = strip_closing_hashes(text);
			blocks.push(Node::new(
				NodeType::Heading,
				Attrs::new().with("level", level),
				Fragment::from_nodes(parse_inline(text)?),
			)?);
			i += 1;
			continue;
		}

		if BLOCKQUOTE.is_match(line) {
			let mut inner = Vec::new();
			while i < lines.len() {
				let Some(caps) = BLOCKQUOTE.captures(lines[i]) else {
					break;
				};
				inner.push(caps.get(1).map_or("", |m| m.as_str()));
				i += 1;
			}
			blocks.push(Node::block(NodeType::Blockquote, parse_blocks(&inner)?)?);
			continue;
		}

		if let Some(first) = top_level_item(line) {
			let (list, consumed) = parse_list(&lines[i..], first)?;
			blocks.push(list);
			i += consumed;
			continue;
		}

		let start = i;
		i += 1;
		while i < lines.len() && !lines[i].trim().is_empty() && !starts_block(lines[i]) {
			i += 1;
		}
		blocks.push(paragraph(&lines[start..i])?);
	}
	Ok(blocks)
}

fn closes_fence(line: &str, fence: &str) -> bool {
	let trimmed = line.trim();
	let Some(marker) = fence.chars().next() else {
		return false;
	};
	trimmed.len() >= fence.len() && trimmed.chars().all(|c| c == marker)
}

fn strip_closing_hashes(text: &str) -> &str {
	let stripped = text.trim_end_matches('#');
	if stripped.len() == text.len() {
		return text;
	}
	if stripped.is_empty() {
		return stripped;
	}
	if stripped.ends_with([' ', '\t']) {
		stripped.trim_end()
	} else {
		text
	}
}

/// Parses the list starting at `lines[0]`. Returns the list and the number
/// of lines it consumed.
fn parse_list(lines: &[&str], first: ItemStart<'_>) -> Result<(Node, usize), SchemaError> {
	let kind = first.kind;
	let order = first.order;
	let mut items = Vec::new();
	let mut i = 0;
	while i < lines.len() {
		let Some(item) = top_level_item(lines[i]) else {
			break;
		};
		if item.kind != kind {
			break;
		}
		let mut body = vec![item.content];
		i += 1;
		while i < lines.len() {
			let line = lines[i];
			if line.trim().is_empty() {
				// A blank line only continues the item when indented content follows.
				let next = lines[i + 1..].iter().find(|l| !l.trim().is_empty());
				match next {
					Some(next) if indent_of(next) >= CONTINUATION_INDENT => {
						body.push("");
						i += 1;
						continue;
					}
					_ => break,
				}
			}
			if indent_of(line) < CONTINUATION_INDENT {
				break;
			}
			body.push(dedent(line, CONTINUATION_INDENT));
			i += 1;
		}
		items.push(list_item(kind, item.checked, &body)?);

		// Blank lines between items of the same list keep the list open.
		let mut peek = i;
		while peek < lines.len() && lines[peek].trim().is_empty() {
			peek += 1;
		}
		match lines.get(peek).and_then(|line| top_level_item(line)) {
			Some(next) if next.kind == kind && peek > i => i = peek,
			_ => {}
		}
	}

	let list = match kind {
		ListKind::Ordered => Node::new(
			NodeType::OrderedList,
			Attrs::new().with("order", order),
			Fragment::from_nodes(items),
		)?,
		_ => Node::block(kind.list_type(), items)?,
	};
	Ok((list, i.max(1)))
}

fn dedent(line: &str, by: usize) -> &str {
	let spaces = indent_of(line).min(by);
	&line[spaces..]
}

fn list_item(kind: ListKind, checked: bool, body: &[&str]) -> Result<Node, SchemaError> {
	let mut blocks = parse_blocks(body)?;
	if blocks.is_empty() {
		blocks.push(Node::paragraph("")?);
	}
	match kind {
		ListKind::Checkbox => Node::new(
			NodeType::CheckboxItem,
			Attrs::new().with("checked", checked),
			Fragment::from_nodes(blocks),
		),
		_ => Node::block(NodeType::ListItem, blocks),
	}
}

/// Builds a paragraph from consecutive lines.
///
/// A line ending in `\`, or a line holding only `\`, ends in a hard break.
/// Other line ends read as a single space.
fn paragraph(lines: &[&str]) -> Result<Node, SchemaError> {
	let mut children = Vec::new();
	for (index, line) in lines.iter().enumerate() {
		let line = line.trim();
		let last = index + 1 == lines.len();
		if let Some(body) = line.strip_suffix('\\') {
			children.extend(parse_inline(body.trim_end())?);
			children.push(Node::leaf(NodeType::HardBreak)?);
		} else {
			children.extend(parse_inline(line)?);
			if !last {
				children.push(Node::plain_text(" ")?);
			}
		}
	}
	Node::block(NodeType::Paragraph, children)
}

/// Parses inline markdown into text and hard-break nodes.
pub fn parse_inline(text: &str) -> Result<Vec<Node>, SchemaError> {
	let mut out = Vec::new();
	inline_into(text, &MarkSet::new(), &mut out)?;
	Ok(out)
}

fn flush(buf: &mut String, marks: &MarkSet, out: &mut Vec<Node>) -> Result<(), SchemaError> {
	if !buf.is_empty() {
		out.push(Node::new_text(std::mem::take(buf), marks.clone())?);
	}
	Ok(())
}

fn delimiter(rest: &str) -> Option<(&'static str, Mark)> {
	[
		("**", Mark::Strong),
		("__", Mark::Strong),
		("~~", Mark::Strikethrough),
		("*", Mark::Em),
		("_", Mark::Em),
	]
	.into_iter()
	.find(|(delim, _)| rest.starts_with(delim))
}

/// Splits `[label](href)` at the start of `rest` into label, href and the
/// byte length consumed.
fn link(rest: &str) -> Option<(&str, &str, usize)> {
	let close = rest.find("](")?;
	let label = &rest[1..close];
	if label.is_empty() || label.contains(['\n', '[']) {
		return None;
	}
	let after = &rest[close + 2..];
	let end = after.find(')')?;
	let href = after[..end].trim();
	if href.is_empty() || href.contains(char::is_whitespace) {
		return None;
	}
	Some((label, href, close + 2 + end + 1))
}

fn inline_into(text: &str, marks: &MarkSet, out: &mut Vec<Node>) -> Result<(), SchemaError> {
	let mut buf = String::new();
	let mut rest = text;
	while let Some(ch) = rest.chars().next() {
		match ch {
			'\\' => {
				if let Some(next) = rest[1..].chars().next()
					&& next.is_ascii_punctuation()
				{
					buf.push(next);
					rest = &rest[1 + next.len_utf8()..];
					continue;
				}
			}
			'`' => {
				if let Some(end) = rest[1..].find('`')
					&& end > 0
				{
					flush(&mut buf, marks, out)?;
					out.push(Node::new_text(&rest[1..1 + end], marks.with(Mark::Code))?);
					rest = &rest[end + 2..];
					continue;
				}
			}
			'*' | '_' | '~' => {
				let intraword = ch == '_' && buf.chars().last().is_some_and(char::is_alphanumeric);
				if !intraword && let Some((delim, mark)) = delimiter(rest) {
					let open = delim.len();
					if let Some(end) = rest[open..].find(delim)
						&& end > 0
					{
						let inner = &rest[open..open + end];
						if !inner.starts_with(char::is_whitespace) && !inner.ends_with(char::is_whitespace) {
							flush(&mut buf, marks, out)?;
							inline_into(inner, &marks.with(mark), out)?;
							rest = &rest[open * 2 + end..];
							continue;
						}
					}
				}
			}
			'[' => {
				if let Some((label, href, len)) = link(rest) {
					flush(&mut buf, marks, out)?;
					let href = href.to_string();
					inline_into(label, &marks.with(Mark::Link { href }), out)?;
					rest = &rest[len..];
					continue;
				}
			}
			_ => {}
		}
		buf.push(ch);
		rest = &rest[ch.len_utf8()..];
	}
	flush(&mut buf, marks, out)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn kinds(fragment: &Fragment) -> Vec<NodeType> {
		fragment.iter().map(Node::kind).collect()
	}

	#[test]
	fn reads_common_blocks() {
		let fragment = parse_markdown("# Title\n\nSome text\nwrapped\n\n---\n\n> quoted").unwrap();
		assert_eq!(
			kinds(&fragment),
			vec![
				NodeType::Heading,
				NodeType::Paragraph,
				NodeType::HorizontalRule,
				NodeType::Blockquote
			]
		);
		assert_eq!(fragment.child(0).unwrap().heading_level(), Some(1));
		assert_eq!(fragment.child(1).unwrap().text_content(), "Some text wrapped");
		assert_eq!(fragment.child(3).unwrap().text_content(), "quoted");
	}

	#[test]
	fn fenced_code_keeps_language_and_body() {
		let fragment = parse_markdown("```rust\nfn main() {\n    **not bold**\n}\n```\nafter").unwrap();
		let code = fragment.child(0).unwrap();
		assert_eq!(code.language(), Some("rust"));
		assert_eq!(code.text_content(), "fn main() {\n    **not bold**\n}");
		assert_eq!(fragment.child(1).unwrap().text_content(), "after");
	}

	#[test]
	fn lists_nest_and_number() {
		let fragment = parse_markdown("3. three\n4. four\n   - nested\n\n- bullet").unwrap();
		assert_eq!(kinds(&fragment), vec![NodeType::OrderedList, NodeType::BulletList]);
		let ordered = fragment.child(0).unwrap();
		assert_eq!(ordered.attr("order"), Some(&3i64.into()));
		assert_eq!(ordered.child_count(), 2);
		let second = ordered.child(1).unwrap();
		assert_eq!(
			second.children().iter().map(Node::kind).collect::<Vec<_>>(),
			vec![NodeType::Paragraph, NodeType::BulletList]
		);
	}

	#[test]
	fn checkbox_items_carry_checked_state() {
		let fragment = parse_markdown("- [x] done\n- [ ] open\n- [_] skipped").unwrap();
		let list = fragment.child(0).unwrap();
		assert_eq!(list.kind(), NodeType::CheckboxList);
		let checked: Vec<_> = list.children().iter().map(|item| item.attr("checked").cloned()).collect();
		assert_eq!(checked, vec![Some(true.into()), Some(false.into()), Some(false.into())]);
	}

	#[test]
	fn backslash_lines_become_hard_breaks() {
		let fragment = parse_markdown("Line one\n\n\\\nLine two").unwrap();
		assert_eq!(kinds(&fragment), vec![NodeType::Paragraph, NodeType::Paragraph]);
		let second = fragment.child(1).unwrap();
		assert_eq!(second.child(0).unwrap().kind(), NodeType::HardBreak);
		assert_eq!(second.child(1).unwrap().text(), Some("Line two"));
	}

	#[test]
	fn inline_marks() {
		let nodes = parse_inline("a **b** *c* `d` ~~e~~ [f](https://x.test) snake_case_name \\*g").unwrap();
		let fragment = Fragment::from_nodes(nodes);
		let marked: Vec<(String, Vec<&'static str>)> = fragment
			.iter()
			.map(|n| (n.text().unwrap().to_string(), n.marks().iter().map(Mark::name).collect()))
			.collect();
		assert_eq!(
			marked,
			vec![
				("a ".to_string(), vec![]),
				("b".to_string(), vec!["strong"]),
				(" ".to_string(), vec![]),
				("c".to_string(), vec!["em"]),
				(" ".to_string(), vec![]),
				("d".to_string(), vec!["code"]),
				(" ".to_string(), vec![]),
				("e".to_string(), vec!["strikethrough"]),
				(" ".to_string(), vec![]),
				("f".to_string(), vec!["link"]),
				(" snake_case_name *g".to_string(), vec![]),
			]
		);
	}

	#[test]
	fn unmatched_delimiters_stay_literal() {
		let fragment = Fragment::from_nodes(parse_inline("2 * 3 = 6 and [not a link]").unwrap());
		assert_eq!(fragment.len(), 1);
		assert_eq!(fragment.text_content(), "2 * 3 = 6 and [not a link]");
	}
}
