use pretty_assertions::assert_eq;

use crate::buffer::TextBuffer;
use crate::cursor::CursorPosition;

#[test]
fn buffer_never_empty() {
	let mut buf = TextBuffer::new();
	assert_eq!(buf.line_count(), 1);
	assert_eq!(buf.line(0), "");

	buf.set_text("a\nb\nc");
	buf.delete_lines(0, 10);
	assert_eq!(buf.line_count(), 1);
	assert_eq!(buf.line(0), "");
}

#[test]
fn line_endings_normalized() {
	let buf = TextBuffer::from_text("one\r\ntwo\rthree");
	assert_eq!(buf.line_count(), 3);
	assert_eq!(buf.text(), "one\ntwo\nthree");
}

#[test]
fn out_of_range_reads_are_empty() {
	let buf = TextBuffer::from_text("short");
	assert_eq!(buf.line(99), "");
	assert_eq!(buf.line_len(99), 0);
}

#[test]
fn insert_clamps_column() {
	let mut buf = TextBuffer::from_text("ab");
	buf.insert_text(0, 100, "!");
	assert_eq!(buf.line(0), "ab!");
	buf.insert_char(0, 0, '>');
	assert_eq!(buf.line(0), ">ab!");
}

#[test]
fn break_and_join_are_inverses() {
	let mut buf = TextBuffer::from_text("hello world");
	buf.break_line(0, 5);
	assert_eq!(buf.line_count(), 2);
	assert_eq!(buf.line(0), "hello");
	assert_eq!(buf.line(1), " world");
	buf.join_lines(0);
	assert_eq!(buf.text(), "hello world");
}

#[test]
fn join_at_last_line_is_noop() {
	let mut buf = TextBuffer::from_text("only");
	buf.join_lines(0);
	assert_eq!(buf.text(), "only");
}

#[test]
fn delete_range_is_half_open_and_clamped() {
	let mut buf = TextBuffer::from_text("abcdef");
	let removed = buf.delete_range(0, 1, 3);
	assert_eq!(removed, "bc");
	assert_eq!(buf.line(0), "adef");

	// end before start clamps to empty
	let removed = buf.delete_range(0, 3, 1);
	assert_eq!(removed, "");
	assert_eq!(buf.line(0), "adef");

	let removed = buf.delete_range(0, 2, 100);
	assert_eq!(removed, "ef");
	assert_eq!(buf.line(0), "ad");
}

#[test]
fn delete_char_out_of_range_is_noop() {
	let mut buf = TextBuffer::from_text("xy");
	buf.delete_char(0, 5);
	assert_eq!(buf.line(0), "xy");
	buf.delete_char(0, 1);
	assert_eq!(buf.line(0), "x");
}

#[test]
fn modified_flag_tracks_mutations() {
	let mut buf = TextBuffer::from_text("data");
	assert!(!buf.is_modified());
	buf.insert_char(0, 0, 'x');
	assert!(buf.is_modified());
	buf.mark_saved();
	assert!(!buf.is_modified());
}

#[test]
fn clamp_cursor_normal_vs_insert() {
	let buf = TextBuffer::from_text("abc");
	let pos = CursorPosition::new(5, 10);
	assert_eq!(buf.clamp_cursor(pos, false), CursorPosition::new(0, 2));
	assert_eq!(buf.clamp_cursor(pos, true), CursorPosition::new(0, 3));
}

#[test]
fn clamp_cursor_empty_line() {
	let buf = TextBuffer::from_text("");
	assert_eq!(buf.clamp_cursor(CursorPosition::new(0, 4), false), CursorPosition::origin());
}

#[test]
fn grapheme_columns_not_bytes() {
	let mut buf = TextBuffer::from_text("héllo");
	assert_eq!(buf.line_len(0), 5);
	buf.insert_char(0, 2, 'x');
	assert_eq!(buf.line(0), "héxllo");
	let removed = buf.delete_range(0, 0, 2);
	assert_eq!(removed, "hé");
}

#[test]
fn snapshot_restore_round_trip() {
	let mut buf = TextBuffer::from_text("a\nb\nc");
	let snapshot = buf.snapshot();
	buf.delete_lines(0, 1);
	buf.insert_text(0, 0, "zzz");
	assert_ne!(buf.text(), "a\nb\nc");
	buf.restore_snapshot(snapshot);
	assert_eq!(buf.text(), "a\nb\nc");
}

#[test]
fn find_next_skips_current_position() {
	let buf = TextBuffer::from_text("abc abc abc");
	let first = buf.find_next("abc", CursorPosition::origin(), true, false, true);
	assert_eq!(first, Some(CursorPosition::new(0, 4)));
	let second = buf.find_next("abc", CursorPosition::new(0, 4), true, false, true);
	assert_eq!(second, Some(CursorPosition::new(0, 8)));
}

#[test]
fn find_next_wraps_when_enabled() {
	let buf = TextBuffer::from_text("abc\nxyz");
	let hit = buf.find_next("abc", CursorPosition::new(1, 1), true, false, true);
	assert_eq!(hit, Some(CursorPosition::origin()));
	let missed = buf.find_next("abc", CursorPosition::new(1, 1), true, false, false);
	assert_eq!(missed, None);
}

#[test]
fn find_next_backward() {
	let buf = TextBuffer::from_text("foo bar\nfoo baz");
	let hit = buf.find_next("foo", CursorPosition::new(1, 4), false, false, false);
	assert_eq!(hit, Some(CursorPosition::new(1, 0)));
	let hit = buf.find_next("foo", CursorPosition::new(1, 0), false, false, false);
	assert_eq!(hit, Some(CursorPosition::new(0, 0)));
}

#[test]
fn find_ignore_case() {
	let buf = TextBuffer::from_text("Foo FOO foo");
	let all = buf.find_all("foo", true);
	assert_eq!(all.len(), 3);
	let all = buf.find_all("foo", false);
	assert_eq!(all.len(), 1);
}

#[test]
fn find_all_non_overlapping() {
	let buf = TextBuffer::from_text("aaaa");
	let all = buf.find_all("aa", false);
	assert_eq!(all, vec![CursorPosition::new(0, 0), CursorPosition::new(0, 2)]);
}

#[test]
fn empty_pattern_never_matches() {
	let buf = TextBuffer::from_text("anything");
	assert_eq!(buf.find_next("", CursorPosition::origin(), true, false, true), None);
	assert!(buf.find_all("", false).is_empty());
}
