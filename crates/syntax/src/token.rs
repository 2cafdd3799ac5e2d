/// Nested highlighter output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenTree {
	/// Raw text with no classes of its own.
	Text(String),
	/// A classed scope around nested tokens.
	Scope {
		/// Classes applied to everything inside the scope.
		classes: Vec<String>,
		children: Vec<TokenTree>,
	},
}

impl TokenTree {
	pub fn text(text: impl Into<String>) -> Self {
		TokenTree::Text(text.into())
	}

	/// A single-class scope around plain text.
	pub fn scoped(class: &str, text: impl Into<String>) -> Self {
		TokenTree::Scope {
			classes: vec![class.to_string()],
			children: vec![TokenTree::Text(text.into())],
		}
	}
}

/// A highlighted run of characters, offsets relative to the highlighted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
	pub from: usize,
	pub to: usize,
	/// Union of every enclosing scope's classes, outermost first.
	pub classes: Vec<String>,
}

/// Flattens token trees depth-first into leaf spans.
///
/// Offsets count chars. Leaves without any enclosing class produce no span.
pub fn flatten(tokens: &[TokenTree]) -> Vec<HighlightSpan> {
	let mut spans = Vec::new();
	let mut pos = 0;
	let mut stack: Vec<&str> = Vec::new();
	for token in tokens {
		walk(token, &mut stack, &mut pos, &mut spans);
	}
	spans
}

fn walk<'a>(token: &'a TokenTree, stack: &mut Vec<&'a str>, pos: &mut usize, spans: &mut Vec<HighlightSpan>) {
	match token {
		TokenTree::Text(text) => {
			let len = text.chars().count();
			if len > 0 && !stack.is_empty() {
				let mut classes: Vec<String> = Vec::with_capacity(stack.len());
				for class in stack.iter() {
					if !classes.iter().any(|c| c == class) {
						classes.push(class.to_string());
					}
				}
				spans.push(HighlightSpan {
					from: *pos,
					to: *pos + len,
					classes,
				});
			}
			*pos += len;
		}
		TokenTree::Scope { classes, children } => {
			let depth = stack.len();
			stack.extend(classes.iter().map(String::as_str));
			for child in children {
				walk(child, stack, pos, spans);
			}
			stack.truncate(depth);
		}
	}
}
