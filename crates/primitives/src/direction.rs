/// Direction through an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqDirection {
	/// Towards the end, wrapping to the first element.
	Next,
	/// Towards the start, wrapping to the last element.
	Prev,
}

impl SeqDirection {
	/// Steps `current` through `len` elements in this direction, wrapping at the ends.
	///
	/// With no current element, `Next` lands on the first and `Prev` on the last.
	pub fn step(self, current: Option<usize>, len: usize) -> Option<usize> {
		if len == 0 {
			return None;
		}
		Some(match (self, current) {
			(SeqDirection::Next, None) => 0,
			(SeqDirection::Prev, None) => len - 1,
			(SeqDirection::Next, Some(i)) => (i + 1) % len,
			(SeqDirection::Prev, Some(i)) => (i + len - 1) % len,
		})
	}
}
