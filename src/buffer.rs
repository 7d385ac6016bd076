//! The line-oriented text buffer.
//!
//! `TextBuffer` owns the document as a vector of lines (no embedded newlines) and
//! is the only thing that mutates it. All column arithmetic is done in **grapheme
//! clusters**, never bytes, so multi-byte text behaves predictably.
//!
//! Contracts:
//! * The buffer always holds at least one line; clearing it leaves one empty line.
//! * Coordinate arguments never panic. Out-of-range positions clamp (mutations)
//!   or read as empty (queries).
//! * Every mutation sets the `modified` flag; `mark_saved` clears it.

use unicode_segmentation::UnicodeSegmentation;

use crate::cursor::CursorPosition;

const EMPTY: &str = "";

/// Byte offset of grapheme column `col` in `line`, clamped to the line end.
pub fn byte_of_col(line: &str, col: usize) -> usize {
	line.grapheme_indices(true)
		.nth(col)
		.map(|(i, _)| i)
		.unwrap_or(line.len())
}

/// Number of grapheme clusters in `line`.
pub fn grapheme_len(line: &str) -> usize {
	line.graphemes(true).count()
}

/// Grapheme column of byte offset `byte` in `line`.
pub fn col_of_byte(line: &str, byte: usize) -> usize {
	line.grapheme_indices(true)
		.take_while(|(i, _)| *i < byte)
		.count()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBuffer {
	lines: Vec<String>,
	modified: bool,
}

impl Default for TextBuffer {
	fn default() -> Self {
		Self::new()
	}
}

impl TextBuffer {
	pub fn new() -> Self {
		Self { lines: vec![String::new()], modified: false }
	}

	/// Build a buffer from raw text. CRLF and lone CR line endings are
	/// normalized to LF before splitting.
	pub fn from_text(text: &str) -> Self {
		let mut buf = Self::new();
		buf.set_lines(split_text(text));
		buf.modified = false;
		buf
	}

	fn set_lines(&mut self, lines: Vec<String>) {
		self.lines = lines;
		if self.lines.is_empty() {
			self.lines.push(String::new());
		}
		self.modified = true;
	}

	pub fn line_count(&self) -> usize {
		self.lines.len()
	}

	pub fn line(&self, index: usize) -> &str {
		self.lines.get(index).map(|l| l.as_str()).unwrap_or(EMPTY)
	}

	/// Owned copies of lines `start..=end`, both clamped.
	pub fn lines(&self, start: usize, end: usize) -> Vec<String> {
		let last = self.lines.len().saturating_sub(1);
		let start = start.min(last);
		let end = end.min(last).max(start);
		self.lines[start..=end].to_vec()
	}

	pub fn line_len(&self, index: usize) -> usize {
		grapheme_len(self.line(index))
	}

	pub fn text(&self) -> String {
		self.lines.join("\n")
	}

	pub fn set_text(&mut self, text: &str) {
		self.set_lines(split_text(text));
	}

	pub fn is_modified(&self) -> bool {
		self.modified
	}

	pub fn mark_saved(&mut self) {
		self.modified = false;
	}

	/// The grapheme at `pos`. `col == line_len` reads as a virtual `"\n"` when a
	/// following line exists, which lets motion code treat the document as one
	/// flat sequence.
	pub fn grapheme_at(&self, pos: CursorPosition) -> Option<&str> {
		if pos.line >= self.lines.len() {
			return None
		}
		let line = &self.lines[pos.line];
		match line.graphemes(true).nth(pos.col) {
			Some(g) => Some(g),
			None => {
				if pos.col == grapheme_len(line) && pos.line + 1 < self.lines.len() {
					Some("\n")
				} else {
					None
				}
			}
		}
	}

	pub fn insert_char(&mut self, line: usize, col: usize, ch: char) {
		let mut buf = [0u8; 4];
		self.insert_text(line, col, ch.encode_utf8(&mut buf));
	}

	/// Insert `text` at (line, col), clamping col to `[0, len]`. Text containing
	/// newlines is inserted literally; callers split multi-line text themselves.
	pub fn insert_text(&mut self, line: usize, col: usize, text: &str) {
		if text.is_empty() {
			return
		}
		let Some(target) = self.lines.get_mut(line) else { return };
		let at = byte_of_col(target, col);
		target.insert_str(at, text);
		self.modified = true;
	}

	/// Split `line` at `col`; the suffix becomes a new line below.
	pub fn break_line(&mut self, line: usize, col: usize) {
		let Some(target) = self.lines.get_mut(line) else { return };
		let at = byte_of_col(target, col);
		let suffix = target.split_off(at);
		self.lines.insert(line + 1, suffix);
		self.modified = true;
	}

	/// Remove the single grapheme at (line, col). No-op when out of range.
	pub fn delete_char(&mut self, line: usize, col: usize) {
		let Some(target) = self.lines.get_mut(line) else { return };
		let Some((start, g)) = target.grapheme_indices(true).nth(col) else { return };
		let end = start + g.len();
		target.replace_range(start..end, "");
		self.modified = true;
	}

	/// Remove the half-open column range `[start_col, end_col)` from `line`,
	/// returning the removed text. Both bounds clamp.
	pub fn delete_range(&mut self, line: usize, start_col: usize, end_col: usize) -> String {
		let Some(target) = self.lines.get_mut(line) else { return String::new() };
		let start = byte_of_col(target, start_col);
		let end = byte_of_col(target, end_col.max(start_col));
		if start >= end {
			return String::new()
		}
		let removed = target[start..end].to_string();
		target.replace_range(start..end, "");
		self.modified = true;
		removed
	}

	/// Concatenate line `line + 1` into `line`. No separator is inserted; the
	/// `J` command decides whether a space belongs between the halves.
	pub fn join_lines(&mut self, line: usize) {
		if line + 1 >= self.lines.len() {
			return
		}
		let next = self.lines.remove(line + 1);
		self.lines[line].push_str(&next);
		self.modified = true;
	}

	/// Remove lines `start..=end` (clamped), returning them. If every line is
	/// removed a single empty line remains.
	pub fn delete_lines(&mut self, start: usize, end: usize) -> Vec<String> {
		let last = self.lines.len().saturating_sub(1);
		let start = start.min(last);
		let end = end.min(last).max(start);
		let removed: Vec<String> = self.lines.drain(start..=end).collect();
		if self.lines.is_empty() {
			self.lines.push(String::new());
		}
		self.modified = true;
		removed
	}

	/// Insert `lines` below `after_line`.
	pub fn insert_lines(&mut self, after_line: usize, lines: Vec<String>) {
		if lines.is_empty() {
			return
		}
		let at = (after_line + 1).min(self.lines.len());
		self.lines.splice(at..at, lines);
		self.modified = true;
	}

	pub fn insert_line_above(&mut self, line: usize, text: String) {
		let at = line.min(self.lines.len());
		self.lines.insert(at, text);
		self.modified = true;
	}

	pub fn replace_line(&mut self, line: usize, text: String) {
		let Some(target) = self.lines.get_mut(line) else { return };
		*target = text;
		self.modified = true;
	}

	/// Normalize `pos` against the buffer. In insert mode the column may sit one
	/// past the last grapheme (between characters); in normal mode it must rest
	/// on a character.
	pub fn clamp_cursor(&self, pos: CursorPosition, insert_mode: bool) -> CursorPosition {
		let line = pos.line.min(self.lines.len().saturating_sub(1));
		let len = self.line_len(line);
		let max_col = if insert_mode { len } else { len.saturating_sub(1) };
		CursorPosition::new(line, pos.col.min(max_col))
	}

	/// Column of the first non-blank grapheme on `line` (0 for a blank line).
	pub fn first_non_blank(&self, line: usize) -> usize {
		self.line(line)
			.graphemes(true)
			.position(|g| !g.chars().all(char::is_whitespace))
			.unwrap_or(0)
	}

	pub fn is_blank_line(&self, line: usize) -> bool {
		self.line(line).chars().all(char::is_whitespace)
	}

	/// An owned copy of the line vector, suitable for undo.
	pub fn snapshot(&self) -> Vec<String> {
		self.lines.clone()
	}

	pub fn restore_snapshot(&mut self, lines: Vec<String>) {
		self.set_lines(lines);
	}

	/// Find the next literal occurrence of `pattern` relative to `from`.
	///
	/// Forward scans start one column past `from` so the current position is
	/// never re-matched; backward scans consider only columns strictly before
	/// `from`. With `wrap_scan` the search continues past the buffer edge back
	/// to (and including) the starting position.
	pub fn find_next(
		&self,
		pattern: &str,
		from: CursorPosition,
		forward: bool,
		ignore_case: bool,
		wrap_scan: bool,
	) -> Option<CursorPosition> {
		if pattern.is_empty() {
			return None
		}
		let from = self.clamp_cursor(from, true);
		if forward {
			if let Some(col) = match_in_line(self.line(from.line), pattern, ignore_case)
				.into_iter()
				.find(|c| *c > from.col)
			{
				return Some(CursorPosition::new(from.line, col))
			}
			for line in from.line + 1..self.lines.len() {
				if let Some(col) = match_in_line(self.line(line), pattern, ignore_case).into_iter().next() {
					return Some(CursorPosition::new(line, col))
				}
			}
			if wrap_scan {
				for line in 0..from.line {
					if let Some(col) = match_in_line(self.line(line), pattern, ignore_case).into_iter().next() {
						return Some(CursorPosition::new(line, col))
					}
				}
				if let Some(col) = match_in_line(self.line(from.line), pattern, ignore_case)
					.into_iter()
					.find(|c| *c <= from.col)
				{
					return Some(CursorPosition::new(from.line, col))
				}
			}
			None
		} else {
			if let Some(col) = match_in_line(self.line(from.line), pattern, ignore_case)
				.into_iter()
				.filter(|c| *c < from.col)
				.next_back()
			{
				return Some(CursorPosition::new(from.line, col))
			}
			for line in (0..from.line).rev() {
				if let Some(col) = match_in_line(self.line(line), pattern, ignore_case).into_iter().next_back() {
					return Some(CursorPosition::new(line, col))
				}
			}
			if wrap_scan {
				for line in (from.line + 1..self.lines.len()).rev() {
					if let Some(col) = match_in_line(self.line(line), pattern, ignore_case).into_iter().next_back() {
						return Some(CursorPosition::new(line, col))
					}
				}
				if let Some(col) = match_in_line(self.line(from.line), pattern, ignore_case)
					.into_iter()
					.filter(|c| *c >= from.col)
					.next_back()
				{
					return Some(CursorPosition::new(from.line, col))
				}
			}
			None
		}
	}

	/// All non-overlapping matches of `pattern`, in buffer order.
	pub fn find_all(&self, pattern: &str, ignore_case: bool) -> Vec<CursorPosition> {
		if pattern.is_empty() {
			return vec![]
		}
		let mut found = vec![];
		for (line_no, line) in self.lines.iter().enumerate() {
			for col in match_in_line(line, pattern, ignore_case) {
				found.push(CursorPosition::new(line_no, col));
			}
		}
		found
	}
}

/// Grapheme columns of every non-overlapping occurrence of `needle` in `line`.
fn match_in_line(line: &str, needle: &str, ignore_case: bool) -> Vec<usize> {
	let (haystack, needle) = if ignore_case {
		(line.to_lowercase(), needle.to_lowercase())
	} else {
		(line.to_string(), needle.to_string())
	};
	if needle.is_empty() {
		return vec![]
	}
	haystack
		.match_indices(&needle)
		.map(|(byte, _)| col_of_byte(&haystack, byte))
		.collect()
}

fn split_text(text: &str) -> Vec<String> {
	let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
	normalized.split('\n').map(|s| s.to_string()).collect()
}
