//! Cursor positions and visual selections.
//!
//! Both are plain value types. Selections keep their raw `anchor`/`head` endpoints;
//! the normalized ordering is always derived, never stored.

use serde::Serialize;

/// A zero-based (line, column) position in the buffer.
///
/// Columns count grapheme clusters, not bytes. Ordering is by line first,
/// then column, which is what range normalization relies on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Serialize)]
pub struct CursorPosition {
	pub line: usize,
	pub col: usize,
}

impl CursorPosition {
	pub fn new(line: usize, col: usize) -> Self {
		Self { line, col }
	}
	pub fn origin() -> Self {
		Self::default()
	}
}

/// Order two positions so the smaller comes first.
pub fn ordered(a: CursorPosition, b: CursorPosition) -> (CursorPosition, CursorPosition) {
	if b < a { (b, a) } else { (a, b) }
}

/// The shape of a visual selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum SelectKind {
	Char,
	Line,
	Block,
}

/// An active visual selection.
///
/// `anchor` is where the selection started; `head` follows the cursor.
/// The kind never changes during a single visual session.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Selection {
	pub anchor: CursorPosition,
	pub head: CursorPosition,
	pub kind: SelectKind,
}

impl Selection {
	pub fn new(anchor: CursorPosition, head: CursorPosition, kind: SelectKind) -> Self {
		Self { anchor, head, kind }
	}
	/// The selection endpoints in buffer order.
	pub fn ordered(&self) -> (CursorPosition, CursorPosition) {
		ordered(self.anchor, self.head)
	}
	/// The inclusive span of lines the selection touches.
	pub fn line_span(&self) -> (usize, usize) {
		let (start, end) = self.ordered();
		(start.line, end.line)
	}
	pub fn swap_ends(&mut self) {
		std::mem::swap(&mut self.anchor, &mut self.head);
	}
}
