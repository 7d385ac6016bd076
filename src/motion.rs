//! Stateless motion evaluation.
//!
//! `evaluate` resolves a parsed motion against a buffer and a small context of
//! persisted state (last find, last search, sticky column, marks) into a
//! concrete target plus its exclusive/inclusive/linewise classification. No
//! hidden state: the same inputs always produce the same result, which is what
//! makes operators composable and motions trivially testable.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::buffer::TextBuffer;
use crate::cursor::CursorPosition;
use crate::jumps::Marks;
use crate::options::Options;
use crate::vicmd::{Bound, Dest, Direction, LineAddr, Motion, MotionCmd, TextObj, To, Verb, Word};

/// Fallback line offset for the viewport-relative motions `H` and `L`, since
/// the core does not know the viewport height.
const SCREEN_OFFSET: usize = 10;

/// How an operator treats the motion's endpoint.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MotionFlavor {
	/// Endpoint column excluded from the operator range
	Exclusive,
	/// Endpoint column included
	Inclusive,
	/// Whole lines; columns are ignored
	Linewise,
}

/// A resolved motion: either a single target relative to the cursor, or an
/// explicit span (text objects, ex ranges, stored visual ranges).
#[derive(Clone, PartialEq, Debug)]
pub enum MotionEval {
	Target { pos: CursorPosition, flavor: MotionFlavor },
	/// Both endpoints inclusive
	Span { start: CursorPosition, end: CursorPosition, linewise: bool },
}

/// The last committed search, persisted by the dispatcher for `n`/`N`.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchState {
	pub pattern: String,
	pub direction: Direction,
}

/// Persisted state a motion may consult. Owned by the dispatcher, borrowed per
/// evaluation.
pub struct MotionContext<'a> {
	/// Sticky display column for vertical motion; `usize::MAX` means line end
	pub preferred_col: Option<usize>,
	pub last_find: Option<(Direction, Dest, char)>,
	pub last_search: Option<&'a SearchState>,
	pub marks: &'a Marks,
	pub options: &'a Options,
	/// Insert-style column bounds (cursor may rest past the last grapheme)
	pub insert: bool,
	/// An operator is pending, which widens some column clamps (`dl`, `d$`)
	pub has_operator: bool,
}

/// Character classes used by word motions.
#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum CharClass {
	#[default]
	Whitespace,
	Word,
	Symbol,
}

/// Classify a grapheme for `Word::Normal` motions.
pub fn class_of(gr: &str) -> CharClass {
	let Some(first) = gr.chars().next() else {
		return CharClass::Whitespace
	};
	if first.is_whitespace() {
		CharClass::Whitespace
	} else if first.is_alphanumeric() || first == '_' {
		CharClass::Word
	} else {
		CharClass::Symbol
	}
}

fn class_for(gr: &str, word: Word) -> CharClass {
	match word {
		Word::Normal => class_of(gr),
		Word::Big => {
			if class_of(gr) == CharClass::Whitespace {
				CharClass::Whitespace
			} else {
				CharClass::Word
			}
		}
	}
}

/// Class at a position; the end of the buffer reads as whitespace so scans
/// terminate cleanly.
fn class_at(buf: &TextBuffer, pos: CursorPosition, word: Word) -> CharClass {
	buf.grapheme_at(pos).map(|g| class_for(g, word)).unwrap_or(CharClass::Whitespace)
}

/// Step one grapheme forward through the document, treating line ends as a
/// virtual newline column.
pub fn flat_next(buf: &TextBuffer, pos: CursorPosition) -> Option<CursorPosition> {
	if pos.col < buf.line_len(pos.line) {
		Some(CursorPosition::new(pos.line, pos.col + 1))
	} else if pos.line + 1 < buf.line_count() {
		Some(CursorPosition::new(pos.line + 1, 0))
	} else {
		None
	}
}

pub fn flat_prev(buf: &TextBuffer, pos: CursorPosition) -> Option<CursorPosition> {
	if pos.col > 0 {
		Some(CursorPosition::new(pos.line, pos.col - 1))
	} else if pos.line > 0 {
		Some(CursorPosition::new(pos.line - 1, buf.line_len(pos.line - 1)))
	} else {
		None
	}
}

/// Display width of the first `gcol` graphemes of `line`.
pub fn display_col(line: &str, gcol: usize) -> usize {
	line.graphemes(true).take(gcol).map(|g| g.width()).sum()
}

/// Grapheme column whose display position covers `target`.
pub fn col_for_display(line: &str, target: usize) -> usize {
	let mut width = 0;
	for (idx, g) in line.graphemes(true).enumerate() {
		let w = g.width();
		if width + w > target {
			return idx
		}
		width += w;
	}
	grapheme_len_of(line)
}

fn grapheme_len_of(line: &str) -> usize {
	line.graphemes(true).count()
}

/// Resolve the sticky column on `line`: either the saved display column or the
/// cursor's current one; `usize::MAX` pins to the last character.
fn vertical_col(buf: &TextBuffer, cursor: CursorPosition, target_line: usize, ctx: &MotionContext) -> usize {
	let goal = ctx
		.preferred_col
		.unwrap_or_else(|| display_col(buf.line(cursor.line), cursor.col));
	if goal == usize::MAX {
		return buf.line_len(target_line).saturating_sub(1)
	}
	let col = col_for_display(buf.line(target_line), goal);
	col.min(buf.line_len(target_line).saturating_sub(1))
}

/// Resolve `(motion, count)` to a target. `verb` is consulted for the handful
/// of motions whose reach changes under an operator (`cw` acting like `ce`).
pub fn evaluate(
	buf: &TextBuffer,
	cursor: CursorPosition,
	verb: Option<&Verb>,
	motion: &MotionCmd,
	ctx: &MotionContext,
) -> Option<MotionEval> {
	use MotionFlavor as F;
	let MotionCmd(count, motion) = motion;
	let count = (*count).max(1);
	let last_line = buf.line_count().saturating_sub(1);

	match motion {
		Motion::WholeLine => {
			let end = (cursor.line + count - 1).min(last_line);
			Some(MotionEval::Span {
				start: CursorPosition::new(cursor.line, 0),
				end: CursorPosition::new(end, 0),
				linewise: true,
			})
		}
		Motion::BackwardChar => Some(MotionEval::Target {
			pos: CursorPosition::new(cursor.line, cursor.col.saturating_sub(count)),
			flavor: F::Exclusive,
		}),
		Motion::ForwardChar => {
			let len = buf.line_len(cursor.line);
			let max_col = if ctx.insert || ctx.has_operator {
				len
			} else {
				len.saturating_sub(1)
			};
			Some(MotionEval::Target {
				pos: CursorPosition::new(cursor.line, (cursor.col + count).min(max_col)),
				flavor: F::Exclusive,
			})
		}
		Motion::BackwardCharForced => {
			let mut pos = cursor;
			for _ in 0..count {
				match flat_prev(buf, pos) {
					Some(p) => pos = p,
					None => break,
				}
			}
			Some(MotionEval::Target { pos, flavor: F::Exclusive })
		}
		Motion::ForwardCharForced => {
			let mut pos = cursor;
			for _ in 0..count {
				match flat_next(buf, pos) {
					Some(p) => pos = p,
					None => break,
				}
			}
			Some(MotionEval::Target { pos, flavor: F::Exclusive })
		}
		Motion::LineUp | Motion::LineUpCharwise => {
			if cursor.line == 0 {
				return None
			}
			let line = cursor.line.saturating_sub(count);
			let col = vertical_col(buf, cursor, line, ctx);
			let flavor = if matches!(motion, Motion::LineUp) { F::Linewise } else { F::Exclusive };
			Some(MotionEval::Target { pos: CursorPosition::new(line, col), flavor })
		}
		Motion::LineDown | Motion::LineDownCharwise => {
			if cursor.line >= last_line {
				return None
			}
			let line = (cursor.line + count).min(last_line);
			let col = vertical_col(buf, cursor, line, ctx);
			let flavor = if matches!(motion, Motion::LineDown) { F::Linewise } else { F::Exclusive };
			Some(MotionEval::Target { pos: CursorPosition::new(line, col), flavor })
		}
		Motion::BeginningOfLine => Some(MotionEval::Target {
			pos: CursorPosition::new(cursor.line, 0),
			flavor: F::Exclusive,
		}),
		Motion::BeginningOfFirstWord => Some(MotionEval::Target {
			pos: CursorPosition::new(cursor.line, buf.first_non_blank(cursor.line)),
			flavor: F::Exclusive,
		}),
		Motion::EndOfLine => {
			let line = (cursor.line + count - 1).min(last_line);
			let col = buf.line_len(line).saturating_sub(1);
			Some(MotionEval::Target { pos: CursorPosition::new(line, col), flavor: F::Inclusive })
		}
		Motion::WordMotion(to, word, dir) => {
			// `cw` on a word acts like `ce`: it must not eat the whitespace
			// after the word
			let change_word = verb == Some(&Verb::Change)
				&& matches!((to, dir), (To::Start, Direction::Forward))
				&& class_at(buf, cursor, *word) != CharClass::Whitespace;
			let mut pos = cursor;
			for _ in 0..count {
				pos = match (to, dir) {
					(To::Start, Direction::Forward) if change_word => word_end_forward(buf, pos, *word),
					(To::Start, Direction::Forward) => word_start_forward(buf, pos, *word),
					(To::Start, Direction::Backward) => word_start_backward(buf, pos, *word),
					(To::End, Direction::Forward) => word_end_forward(buf, pos, *word),
					(To::End, Direction::Backward) => word_end_backward(buf, pos, *word),
				};
			}
			if !ctx.has_operator {
				// As a plain motion the cursor must land on a character; an
				// operator may reach the virtual line end
				pos = buf.clamp_cursor(pos, ctx.insert);
			}
			let flavor = if change_word || *to == To::End { F::Inclusive } else { F::Exclusive };
			Some(MotionEval::Target { pos, flavor })
		}
		Motion::CharSearch(dir, dest, ch) => {
			let pos = char_search(buf, cursor, *dir, *dest, *ch, count)?;
			Some(MotionEval::Target { pos, flavor: F::Inclusive })
		}
		Motion::RepeatFind => {
			let (dir, dest, ch) = ctx.last_find?;
			let pos = char_search(buf, cursor, dir, dest, ch, count)?;
			Some(MotionEval::Target { pos, flavor: F::Inclusive })
		}
		Motion::RepeatFindRev => {
			let (dir, dest, ch) = ctx.last_find?;
			let dir = match dir {
				Direction::Forward => Direction::Backward,
				Direction::Backward => Direction::Forward,
			};
			let pos = char_search(buf, cursor, dir, dest, ch, count)?;
			Some(MotionEval::Target { pos, flavor: F::Inclusive })
		}
		Motion::NextMatch | Motion::PrevMatch => {
			let search = ctx.last_search?;
			let mut forward = search.direction == Direction::Forward;
			if matches!(motion, Motion::PrevMatch) {
				forward = !forward;
			}
			let ignore_case = ctx.options.fold_case(&search.pattern);
			let mut pos = cursor;
			for _ in 0..count {
				pos = buf.find_next(&search.pattern, pos, forward, ignore_case, ctx.options.wrapscan)?;
			}
			Some(MotionEval::Target { pos, flavor: F::Exclusive })
		}
		Motion::PatternSearch(pattern, dir) => {
			let ignore_case = ctx.options.fold_case(pattern);
			let forward = *dir == Direction::Forward;
			let pos = buf.find_next(pattern, cursor, forward, ignore_case, ctx.options.wrapscan)?;
			Some(MotionEval::Target { pos, flavor: F::Exclusive })
		}
		Motion::BeginningOfBuffer => Some(MotionEval::Target {
			pos: CursorPosition::new(0, buf.first_non_blank(0)),
			flavor: F::Linewise,
		}),
		Motion::EndOfBuffer => Some(MotionEval::Target {
			pos: CursorPosition::new(last_line, buf.first_non_blank(last_line)),
			flavor: F::Linewise,
		}),
		Motion::GoToLine(n) => {
			let line = n.saturating_sub(1).min(last_line);
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, buf.first_non_blank(line)),
				flavor: F::Linewise,
			})
		}
		Motion::Paragraph(dir) => {
			let mut line = cursor.line;
			for _ in 0..count {
				line = match dir {
					Direction::Forward => next_paragraph_bound(buf, line),
					Direction::Backward => prev_paragraph_bound(buf, line),
				};
			}
			Some(MotionEval::Target { pos: CursorPosition::new(line, 0), flavor: F::Linewise })
		}
		Motion::ToDelimMatch => {
			let pos = delim_match(buf, cursor)?;
			Some(MotionEval::Target { pos, flavor: F::Inclusive })
		}
		Motion::ToColumn => {
			let col = count.saturating_sub(1).min(buf.line_len(cursor.line).saturating_sub(1));
			Some(MotionEval::Target { pos: CursorPosition::new(cursor.line, col), flavor: F::Exclusive })
		}
		Motion::LineDownToFirstNonBlank => {
			let line = (cursor.line + count).min(last_line);
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, buf.first_non_blank(line)),
				flavor: F::Linewise,
			})
		}
		Motion::LineUpToFirstNonBlank => {
			let line = cursor.line.saturating_sub(count);
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, buf.first_non_blank(line)),
				flavor: F::Linewise,
			})
		}
		Motion::FirstNonBlankDown => {
			let line = (cursor.line + count - 1).min(last_line);
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, buf.first_non_blank(line)),
				flavor: F::Linewise,
			})
		}
		Motion::ScreenTop => {
			let line = cursor.line.saturating_sub(SCREEN_OFFSET);
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, buf.first_non_blank(line)),
				flavor: F::Linewise,
			})
		}
		Motion::ScreenBottom => {
			let line = (cursor.line + SCREEN_OFFSET).min(last_line);
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, buf.first_non_blank(line)),
				flavor: F::Linewise,
			})
		}
		Motion::ScreenMiddle => {
			let top = cursor.line.saturating_sub(SCREEN_OFFSET);
			let bottom = (cursor.line + SCREEN_OFFSET).min(last_line);
			let line = top + (bottom - top) / 2;
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, buf.first_non_blank(line)),
				flavor: F::Linewise,
			})
		}
		Motion::ToMark(name) => {
			let pos = ctx.marks.get(*name)?;
			Some(MotionEval::Target { pos: buf.clamp_cursor(pos, false), flavor: F::Exclusive })
		}
		Motion::ToMarkLine(name) => {
			let pos = ctx.marks.get(*name)?;
			let line = pos.line.min(last_line);
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, buf.first_non_blank(line)),
				flavor: F::Linewise,
			})
		}
		Motion::TextObj(obj) => text_object(buf, cursor, *obj),
		Motion::Line(addr) => {
			let line = eval_line_addr(buf, cursor, addr)?;
			Some(MotionEval::Target {
				pos: CursorPosition::new(line, 0),
				flavor: F::Linewise,
			})
		}
		Motion::LineRange(start, end) => {
			let start_line = eval_line_addr(buf, cursor, start)?;
			let end_line = eval_line_addr(buf, cursor, end)?;
			let (start_line, end_line) = if end_line < start_line {
				(end_line, start_line)
			} else {
				(start_line, end_line)
			};
			Some(MotionEval::Span {
				start: CursorPosition::new(start_line, 0),
				end: CursorPosition::new(end_line, 0),
				linewise: true,
			})
		}
		Motion::Range(sel) => {
			let (start, end) = sel.ordered();
			Some(MotionEval::Span {
				start,
				end,
				linewise: sel.kind == crate::cursor::SelectKind::Line,
			})
		}
		Motion::Null => None,
	}
}

/// 0-based line for an ex address, clamped to the buffer.
pub fn eval_line_addr(buf: &TextBuffer, cursor: CursorPosition, addr: &LineAddr) -> Option<usize> {
	let last_line = buf.line_count().saturating_sub(1);
	let line = match addr {
		LineAddr::Number(n) => n.saturating_sub(1),
		LineAddr::Current => cursor.line,
		LineAddr::Last => last_line,
		LineAddr::Offset(o) => cursor.line.saturating_add_signed(*o),
		LineAddr::Pattern(pat, dir) => {
			let regex = regex::Regex::new(pat).ok()?;
			let total = buf.line_count();
			match dir {
				Direction::Forward => (1..=total)
					.map(|i| (cursor.line + i) % total)
					.find(|l| regex.is_match(buf.line(*l)))?,
				Direction::Backward => (1..=total)
					.map(|i| (cursor.line + total - i) % total)
					.find(|l| regex.is_match(buf.line(*l)))?,
			}
		}
	};
	Some(line.min(last_line))
}

fn word_start_forward(buf: &TextBuffer, pos: CursorPosition, word: Word) -> CursorPosition {
	let mut cur = pos;
	let start_cls = class_at(buf, cur, word);
	if start_cls != CharClass::Whitespace {
		while class_at(buf, cur, word) == start_cls {
			match flat_next(buf, cur) {
				Some(n) => cur = n,
				None => return cur,
			}
		}
	}
	while class_at(buf, cur, word) == CharClass::Whitespace {
		match flat_next(buf, cur) {
			Some(n) => cur = n,
			None => return cur,
		}
	}
	cur
}

fn word_end_forward(buf: &TextBuffer, pos: CursorPosition, word: Word) -> CursorPosition {
	let mut cur = match flat_next(buf, pos) {
		Some(n) => n,
		None => return pos,
	};
	while class_at(buf, cur, word) == CharClass::Whitespace {
		match flat_next(buf, cur) {
			Some(n) => cur = n,
			None => return cur,
		}
	}
	let cls = class_at(buf, cur, word);
	while let Some(next) = flat_next(buf, cur) {
		if class_at(buf, next, word) != cls {
			break
		}
		cur = next;
	}
	cur
}

fn word_start_backward(buf: &TextBuffer, pos: CursorPosition, word: Word) -> CursorPosition {
	let mut cur = match flat_prev(buf, pos) {
		Some(p) => p,
		None => return pos,
	};
	while class_at(buf, cur, word) == CharClass::Whitespace {
		match flat_prev(buf, cur) {
			Some(p) => cur = p,
			None => return cur,
		}
	}
	let cls = class_at(buf, cur, word);
	while let Some(prev) = flat_prev(buf, cur) {
		if class_at(buf, prev, word) != cls {
			break
		}
		cur = prev;
	}
	cur
}

fn word_end_backward(buf: &TextBuffer, pos: CursorPosition, word: Word) -> CursorPosition {
	let mut cur = match flat_prev(buf, pos) {
		Some(p) => p,
		None => return pos,
	};
	let orig_cls = class_at(buf, pos, word);
	if orig_cls != CharClass::Whitespace {
		while class_at(buf, cur, word) == orig_cls {
			match flat_prev(buf, cur) {
				Some(p) => cur = p,
				None => return cur,
			}
		}
	}
	while class_at(buf, cur, word) == CharClass::Whitespace {
		match flat_prev(buf, cur) {
			Some(p) => cur = p,
			None => return cur,
		}
	}
	cur
}

/// `f`/`F`/`t`/`T`: scan the current line only.
fn char_search(
	buf: &TextBuffer,
	cursor: CursorPosition,
	dir: Direction,
	dest: Dest,
	ch: char,
	count: usize,
) -> Option<CursorPosition> {
	let mut ch_buf = [0u8; 4];
	let needle = ch.encode_utf8(&mut ch_buf);
	let len = buf.line_len(cursor.line);
	let mut col = cursor.col;
	for _ in 0..count {
		match dir {
			Direction::Forward => {
				col = (col + 1..len).find(|c| {
					buf.grapheme_at(CursorPosition::new(cursor.line, *c)) == Some(needle)
				})?;
			}
			Direction::Backward => {
				col = (0..col).rev().find(|c| {
					buf.grapheme_at(CursorPosition::new(cursor.line, *c)) == Some(needle)
				})?;
			}
		}
	}
	if dest == Dest::Before {
		col = match dir {
			Direction::Forward => col.saturating_sub(1),
			Direction::Backward => col + 1,
		};
	}
	Some(CursorPosition::new(cursor.line, col))
}

/// `}`: the next blank line after the paragraph under `line`.
fn next_paragraph_bound(buf: &TextBuffer, mut line: usize) -> usize {
	let last = buf.line_count().saturating_sub(1);
	while line < last && buf.is_blank_line(line) {
		line += 1;
	}
	while line < last && !buf.is_blank_line(line) {
		line += 1;
	}
	line
}

fn prev_paragraph_bound(buf: &TextBuffer, mut line: usize) -> usize {
	while line > 0 && buf.is_blank_line(line) {
		line -= 1;
	}
	while line > 0 && !buf.is_blank_line(line) {
		line -= 1;
	}
	line
}

const OPENERS: [(&str, &str); 3] = [("(", ")"), ("[", "]"), ("{", "}")];

/// `%`: find a bracket at or after the cursor on this line, then its match.
fn delim_match(buf: &TextBuffer, cursor: CursorPosition) -> Option<CursorPosition> {
	let len = buf.line_len(cursor.line);
	let (col, gr) = (cursor.col..len).find_map(|c| {
		let g = buf.grapheme_at(CursorPosition::new(cursor.line, c))?;
		OPENERS
			.iter()
			.any(|(o, cl)| g == *o || g == *cl)
			.then(|| (c, g.to_string()))
	})?;
	let from = CursorPosition::new(cursor.line, col);
	for (open, close) in OPENERS {
		if gr == open {
			return scan_delim_forward(buf, from, open, close)
		}
		if gr == close {
			return scan_delim_backward(buf, from, open, close)
		}
	}
	None
}

/// First unmatched `close` at or after `from`; `from` itself only counts when
/// it already sits on the closer.
fn scan_delim_forward(buf: &TextBuffer, from: CursorPosition, open: &str, close: &str) -> Option<CursorPosition> {
	let mut depth = 0usize;
	let mut p = Some(from);
	while let Some(cur) = p {
		match buf.grapheme_at(cur) {
			Some(g) if g == close => {
				if depth == 0 {
					return Some(cur)
				}
				depth -= 1;
			}
			Some(g) if g == open && cur != from => depth += 1,
			_ => {}
		}
		p = flat_next(buf, cur);
	}
	None
}

fn scan_delim_backward(buf: &TextBuffer, from: CursorPosition, open: &str, close: &str) -> Option<CursorPosition> {
	let mut depth = 0usize;
	let mut p = Some(from);
	while let Some(cur) = p {
		match buf.grapheme_at(cur) {
			Some(g) if g == open => {
				if depth == 0 {
					return Some(cur)
				}
				depth -= 1;
			}
			Some(g) if g == close && cur != from => depth += 1,
			_ => {}
		}
		p = flat_prev(buf, cur);
	}
	None
}

/// Resolve a text object into an inclusive span.
fn text_object(buf: &TextBuffer, cursor: CursorPosition, obj: TextObj) -> Option<MotionEval> {
	match obj {
		TextObj::Word(word, bound) => word_object(buf, cursor, word, bound),
		TextObj::DoubleQuote(bound) => quote_object(buf, cursor, '"', bound),
		TextObj::SingleQuote(bound) => quote_object(buf, cursor, '\'', bound),
		TextObj::BacktickQuote(bound) => quote_object(buf, cursor, '`', bound),
		TextObj::Paren(bound) => delim_object(buf, cursor, "(", ")", bound),
		TextObj::Bracket(bound) => delim_object(buf, cursor, "[", "]", bound),
		TextObj::Brace(bound) => delim_object(buf, cursor, "{", "}", bound),
		TextObj::Angle(bound) => delim_object(buf, cursor, "<", ">", bound),
	}
}

/// `iw`/`aw`: the run of same-class graphemes under the cursor; `aw` extends
/// over trailing whitespace, or leading whitespace when there is none trailing.
fn word_object(buf: &TextBuffer, cursor: CursorPosition, word: Word, bound: Bound) -> Option<MotionEval> {
	let len = buf.line_len(cursor.line);
	if len == 0 {
		return None
	}
	let col = cursor.col.min(len - 1);
	let cls = class_at(buf, CursorPosition::new(cursor.line, col), word);
	let class_of_col = |c: usize| class_at(buf, CursorPosition::new(cursor.line, c), word);

	let mut start = col;
	while start > 0 && class_of_col(start - 1) == cls {
		start -= 1;
	}
	let mut end = col;
	while end + 1 < len && class_of_col(end + 1) == cls {
		end += 1;
	}

	if bound == Bound::Around && cls != CharClass::Whitespace {
		let orig_end = end;
		while end + 1 < len && class_of_col(end + 1) == CharClass::Whitespace {
			end += 1;
		}
		if end == orig_end {
			while start > 0 && class_of_col(start - 1) == CharClass::Whitespace {
				start -= 1;
			}
		}
	}

	Some(MotionEval::Span {
		start: CursorPosition::new(cursor.line, start),
		end: CursorPosition::new(cursor.line, end),
		linewise: false,
	})
}

/// Quote objects work on the current line only: the pair surrounding the
/// cursor, or the next pair after it.
fn quote_object(buf: &TextBuffer, cursor: CursorPosition, quote: char, bound: Bound) -> Option<MotionEval> {
	let mut qbuf = [0u8; 4];
	let needle = quote.encode_utf8(&mut qbuf);
	let len = buf.line_len(cursor.line);
	let positions: Vec<usize> = (0..len)
		.filter(|c| buf.grapheme_at(CursorPosition::new(cursor.line, *c)) == Some(needle))
		.collect();

	let pair = positions
		.chunks_exact(2)
		.map(|pair| (pair[0], pair[1]))
		.find(|(_, close)| *close >= cursor.col)?;

	let (start, end) = match bound {
		Bound::Inside => {
			if pair.1 == pair.0 + 1 {
				return None
			}
			(pair.0 + 1, pair.1 - 1)
		}
		Bound::Around => pair,
	};
	Some(MotionEval::Span {
		start: CursorPosition::new(cursor.line, start),
		end: CursorPosition::new(cursor.line, end),
		linewise: false,
	})
}

/// Bracket objects may span lines: the innermost enclosing pair.
fn delim_object(
	buf: &TextBuffer,
	cursor: CursorPosition,
	open: &str,
	close: &str,
	bound: Bound,
) -> Option<MotionEval> {
	let open_pos = scan_delim_backward(buf, cursor, open, close)?;
	let close_pos = scan_delim_forward(buf, cursor, open, close)?;
	let (start, end) = match bound {
		Bound::Inside => {
			let start = flat_next(buf, open_pos)?;
			let end = flat_prev(buf, close_pos)?;
			if end < start {
				// Nothing between the delimiters
				return None
			}
			(start, end)
		}
		Bound::Around => (open_pos, close_pos),
	};
	Some(MotionEval::Span { start, end, linewise: false })
}
