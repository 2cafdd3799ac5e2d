/// Line-number gutter for one code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineGutter {
	/// Digits in the largest line number.
	pub width: usize,
	/// One zero-padded label per line.
	pub labels: Vec<String>,
}

/// Builds the gutter for `text`, padding every label to the width of the line count.
pub fn line_gutter(text: &str) -> LineGutter {
	let lines = text.split('\n').count();
	let width = lines.to_string().len();
	let labels = (1..=lines).map(|n| format!("{n:0width$}")).collect();
	LineGutter { width, labels }
}
