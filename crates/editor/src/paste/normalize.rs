//! Text normalization and markdown detection for pasted plain text.

use std::sync::LazyLock;

use regex::Regex;

/// Normalizes text to LF (`\n`) newlines.
///
/// Converts both CRLF (`\r\n`) and bare CR (`\r`) into LF.
/// If the input contains no carriage returns, the original string is returned.
pub fn normalize_to_lf(mut s: String) -> String {
	if !s.contains('\r') {
		return s;
	}

	let mut out = String::with_capacity(s.len());
	let mut chars = s.drain(..).peekable();
	while let Some(ch) = chars.next() {
		if ch == '\r' {
			if chars.peek() == Some(&'\n') {
				chars.next();
			}
			out.push('\n');
		} else {
			out.push(ch);
		}
	}

	out
}

static CHECKBOX_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ ?\[([xX_\- ])\] ").expect("valid pattern"));
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid pattern"));
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]\n]+\]\([^)\s]+\)").expect("valid pattern"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+\S").expect("valid pattern"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+[.)])[ \t]+\S").expect("valid pattern"));
static TABLE_SEPARATOR: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\|?[ \t]*:?-{3,}:?[ \t]*(?:\|[ \t]*:?-{3,}:?[ \t]*)+\|?[ \t]*$").expect("valid pattern"));
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*[^*\n]+\*\*|`[^`\n]+`").expect("valid pattern"));

fn is_fence(line: &str) -> bool {
	let trimmed = line.trim_start();
	trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// How strongly `text` looks like markdown.
///
/// Weighted counts of fences (3), links (2), headings (2), list markers (1),
/// table separators (3) and bold or inline code (1), divided by the number
/// of lines.
pub fn markdown_score(text: &str) -> f64 {
	let lines = text.lines().count().max(1);
	let fences = text.lines().filter(|line| is_fence(line)).count();
	let weighted = fences * 3
		+ LINK.find_iter(text).count() * 2
		+ HEADING.find_iter(text).count() * 2
		+ LIST_ITEM.find_iter(text).count()
		+ TABLE_SEPARATOR.find_iter(text).count() * 3
		+ EMPHASIS.find_iter(text).count();
	weighted as f64 / lines as f64
}

const PLACEHOLDER: char = '\u{E000}';

/// Prepares markdown-like text for parsing.
///
/// Fenced code is set aside first and restored byte for byte at the end.
/// In between, bare checkbox lines (`[x] task`, at most one leading space)
/// become list items and runs of three or more newlines collapse to an
/// explicit empty line (`\n\n\\\n`).
pub fn normalize_markdown(text: &str) -> String {
	let text = normalize_to_lf(text.to_string());

	let mut fences: Vec<String> = Vec::new();
	let mut prose = String::with_capacity(text.len());
	let mut open: Option<String> = None;
	for line in text.split_inclusive('\n') {
		match open.as_mut() {
			Some(block) => {
				block.push_str(line);
				if is_fence(line) {
					let (body, newline) = split_newline(block);
					prose.push(PLACEHOLDER);
					prose.push_str(&fences.len().to_string());
					prose.push(PLACEHOLDER);
					prose.push_str(newline);
					fences.push(body.to_string());
					open = None;
				}
			}
			None if is_fence(line) => open = Some(line.to_string()),
			None => prose.push_str(line),
		}
	}
	if let Some(block) = open {
		// Unterminated fences run to the end of the text.
		prose.push(PLACEHOLDER);
		prose.push_str(&fences.len().to_string());
		prose.push(PLACEHOLDER);
		fences.push(block);
	}

	let prose = CHECKBOX_LINE.replace_all(&prose, "- [$1] ");
	let prose = BLANK_RUN.replace_all(&prose, "\n\n\\\n");

	let mut out = String::with_capacity(prose.len());
	let mut rest: &str = &prose;
	while let Some(start) = rest.find(PLACEHOLDER) {
		out.push_str(&rest[..start]);
		let after = &rest[start + PLACEHOLDER.len_utf8()..];
		let Some(end) = after.find(PLACEHOLDER) else {
			out.push_str(&rest[start..]);
			rest = "";
			break;
		};
		match after[..end].parse::<usize>().ok().and_then(|i| fences.get(i)) {
			Some(fence) => out.push_str(fence),
			None => out.push_str(&rest[start..start + PLACEHOLDER.len_utf8() + end + PLACEHOLDER.len_utf8()]),
		}
		rest = &after[end + PLACEHOLDER.len_utf8()..];
	}
	out.push_str(rest);
	out
}

fn split_newline(block: &str) -> (&str, &str) {
	match block.strip_suffix('\n') {
		Some(body) => (body, "\n"),
		None => (block, ""),
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn crlf_to_lf() {
		assert_eq!(normalize_to_lf("a\r\nb\r\n".to_string()), "a\nb\n");
	}

	#[test]
	fn cr_to_lf() {
		assert_eq!(normalize_to_lf("a\rb\rc".to_string()), "a\nb\nc");
	}

	#[test]
	fn checkbox_lines_become_list_items() {
		assert_eq!(normalize_markdown("[x] Task"), "- [x] Task");
		assert_eq!(normalize_markdown(" [ ] open\n[X] done\n[_] skip\n[-] dropped"), "- [ ] open\n- [X] done\n- [_] skip\n- [-] dropped");
		assert_eq!(normalize_markdown("  [x] too deep"), "  [x] too deep");
	}

	#[test]
	fn blank_runs_collapse_to_explicit_break() {
		assert_eq!(normalize_markdown("Line one\n\n\n\nLine two"), "Line one\n\n\\\nLine two");
		assert_eq!(normalize_markdown("a\n\nb"), "a\n\nb");
	}

	#[test]
	fn fenced_code_is_untouched() {
		let text = "intro\n```\n[x] not a task\n\n\n\nstill code\r\n```\n\n\n\n[x] task";
		let expected = "intro\n```\n[x] not a task\n\n\n\nstill code\n```\n\n\\\n- [x] task";
		assert_eq!(normalize_markdown(text), expected);
	}

	#[test]
	fn unterminated_fence_runs_to_end() {
		let text = "```rust\nfn a() {}\n\n\n\n[x] b";
		assert_eq!(normalize_markdown(text), text);
	}

	#[test]
	fn scores_markdown_above_prose() {
		let markdown = "# Title\n\nSome [link](https://example.com) text\n\n- one\n- two\n\n```\ncode\n```";
		let prose = "Dear team,\nthe meeting moved to Thursday.\nThanks";
		assert!(markdown_score(markdown) > 0.5);
		assert_eq!(markdown_score(prose), 0.0);
		assert!(markdown_score("| a | b |\n|---|---|\n| 1 | 2 |") >= 1.0);
	}
}
