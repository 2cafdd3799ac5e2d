//! Markdown-flavoured plain text rendering of nodes.
//!
//! This is a lossy, human-readable view used for debugging, tests and plain
//! text clipboard fallbacks. It is not a serialization format.

use crate::node::Node;
use crate::schema::{Mark, NodeType};

pub(crate) fn to_text(node: &Node) -> String {
	let mut out = String::new();
	write_node(node, "", &mut out);
	while out.ends_with('\n') {
		out.pop();
	}
	out
}

fn write_node(node: &Node, indent: &str, out: &mut String) {
	match node.kind() {
		NodeType::Doc => write_blocks(node, indent, out),
		NodeType::Paragraph => {
			out.push_str(indent);
			write_inline(node, out);
			out.push_str("\n\n");
		}
		NodeType::Heading => {
			out.push_str(indent);
			let level = usize::from(node.heading_level().unwrap_or(1));
			out.push_str(&"#".repeat(level));
			out.push(' ');
			write_inline(node, out);
			out.push_str("\n\n");
		}
		NodeType::CodeBlock => {
			out.push_str(indent);
			out.push_str("```");
			out.push_str(node.language().unwrap_or_default());
			out.push('\n');
			for line in node.text_content().split('\n') {
				out.push_str(indent);
				out.push_str(line);
				out.push('\n');
			}
			out.push_str(indent);
			out.push_str("```\n\n");
		}
		NodeType::Blockquote => write_blocks(node, &format!("{indent}> "), out),
		NodeType::BulletList | NodeType::OrderedList | NodeType::CheckboxList => {
			let start = node
				.attr("order")
				.and_then(|v| v.as_int())
				.unwrap_or(1);
			for (i, item) in node.children().iter().enumerate() {
				let marker = match node.kind() {
					NodeType::OrderedList => format!("{}. ", start + i as i64),
					NodeType::CheckboxList => {
						let checked = item.attr("checked").and_then(|v| v.as_bool()).unwrap_or(false);
						if checked { "- [x] ".to_string() } else { "- [ ] ".to_string() }
					}
					_ => "- ".to_string(),
				};
				write_item(item, indent, &marker, out);
			}
			out.push('\n');
		}
		NodeType::ListItem | NodeType::CheckboxItem => write_item(node, indent, "- ", out),
		NodeType::HorizontalRule => {
			out.push_str(indent);
			out.push_str("---\n\n");
		}
		NodeType::Embed => {
			out.push_str(indent);
			out.push_str(node.attr("href").and_then(|v| v.as_str()).unwrap_or_default());
			out.push_str("\n\n");
		}
		NodeType::Text | NodeType::HardBreak => write_inline_node(node, out),
	}
}

fn write_blocks(node: &Node, indent: &str, out: &mut String) {
	for child in node.children() {
		write_node(child, indent, out);
	}
}

fn write_item(item: &Node, indent: &str, marker: &str, out: &mut String) {
	let mut body = String::new();
	write_blocks(item, "", &mut body);
	let pad = " ".repeat(marker.len());
	let mut first = true;
	for line in body.trim_end_matches('\n').split('\n') {
		if line.is_empty() {
			continue;
		}
		out.push_str(indent);
		out.push_str(if first { marker } else { &pad });
		out.push_str(line);
		out.push('\n');
		first = false;
	}
}

fn write_inline(node: &Node, out: &mut String) {
	for child in node.children() {
		write_inline_node(child, out);
	}
}

fn write_inline_node(node: &Node, out: &mut String) {
	let Some(text) = node.text() else {
		if node.kind() == NodeType::HardBreak {
			out.push_str("\\\n");
		}
		return;
	};
	let mut open = String::new();
	let mut close = String::new();
	let mut link = None;
	for mark in node.marks().iter() {
		let delim = match mark {
			Mark::Strong => "**",
			Mark::Em => "*",
			Mark::Code => "`",
			Mark::Strikethrough => "~~",
			Mark::Link { href } => {
				link = Some(href.as_str());
				continue;
			}
		};
		open.push_str(delim);
		close.insert_str(0, delim);
	}
	if link.is_some() {
		out.push('[');
	}
	out.push_str(&open);
	out.push_str(text);
	out.push_str(&close);
	if let Some(href) = link {
		out.push_str("](");
		out.push_str(href);
		out.push(')');
	}
}
