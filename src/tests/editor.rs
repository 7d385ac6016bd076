use pretty_assertions::assert_eq;

use crate::capability::MemoryClipboard;
use crate::cursor::CursorPosition;
use crate::event::{Mode, ViEvent, ViewportAlign};
use crate::register::RegisterContent;

use super::{engine, has_status, ESC};

#[test]
fn dd_deletes_line() {
	let mut vim = engine("line1\nline2\nline3");
	let events = vim.process_keys("dd");
	assert_eq!(vim.text(), "line2\nline3");
	assert_eq!(vim.cursor(), CursorPosition::origin());
	assert!(events.contains(&ViEvent::TextChanged));
}

#[test]
fn yy_then_p_duplicates_line() {
	let mut vim = engine("hello\nworld");
	vim.process_keys("yyp");
	assert_eq!(vim.buffer().line_count(), 3);
	assert_eq!(vim.buffer().line(1), "hello");
	assert_eq!(vim.cursor(), CursorPosition::new(1, 0));
}

#[test]
fn ciw_replaces_word() {
	let mut vim = engine("foo bar");
	vim.process_keys("ciwX");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "X bar");
}

#[test]
fn count_prefix_repeats_motion() {
	let mut vim = engine("hello world foo bar");
	vim.process_keys("3l");
	assert_eq!(vim.cursor().col, 3);
}

#[test]
fn undo_restores_text() {
	let mut vim = engine("hello");
	vim.process_keys("ix");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "xhello");
	vim.process_keys("u");
	assert_eq!(vim.text(), "hello");
	assert_eq!(vim.cursor(), CursorPosition::origin());
}

#[test]
fn substitute_across_buffer() {
	let mut vim = engine("foo foo\nfoo");
	let events = vim.process_keys(":%s/foo/bar/g\r");
	assert_eq!(vim.text(), "bar bar\nbar");
	assert!(has_status(&events, "3 substitution(s) made"));
}

#[test]
fn search_wraps_past_eof() {
	let mut vim = engine("abc\nabc");
	vim.process_keys("j2l");
	assert_eq!(vim.cursor(), CursorPosition::new(1, 2));
	vim.process_keys("/abc\r");
	assert_eq!(vim.cursor(), CursorPosition::origin());
}

#[test]
fn uppercase_register_appends() {
	let mut vim = engine("hello\nworld");
	vim.process_keys("\"ayyj\"Ayy");
	assert_eq!(
		vim.registers().get('a'),
		Some(&RegisterContent::Line("hello\nworld".into()))
	);
}

#[test]
fn xp_swaps_characters() {
	let mut vim = engine("ab");
	vim.process_keys("xp");
	assert_eq!(vim.text(), "ba");
}

#[test]
fn capital_p_pastes_line_above() {
	let mut vim = engine("a\nb");
	vim.process_keys("yyjP");
	assert_eq!(vim.text(), "a\na\nb");
	assert_eq!(vim.cursor(), CursorPosition::new(1, 0));
}

#[test]
fn dj_deletes_two_lines() {
	let mut vim = engine("1\n2\n3");
	vim.process_keys("dj");
	assert_eq!(vim.text(), "3");
}

#[test]
fn d_dollar_deletes_to_line_end() {
	let mut vim = engine("hello");
	vim.process_keys("ld$");
	assert_eq!(vim.text(), "h");
	assert_eq!(
		vim.registers().unnamed(),
		&RegisterContent::Span("ello".into())
	);
}

#[test]
fn shift_d_and_c() {
	let mut vim = engine("hello");
	vim.process_keys("lD");
	assert_eq!(vim.text(), "h");

	let mut vim = engine("hello");
	vim.process_keys("lCxy");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "hxy");
}

#[test]
fn join_inserts_single_space() {
	let mut vim = engine("foo\n  bar");
	vim.process_keys("J");
	assert_eq!(vim.text(), "foo bar");
	assert_eq!(vim.cursor(), CursorPosition::new(0, 3));
}

#[test]
fn join_respects_trailing_space() {
	let mut vim = engine("foo \nbar");
	vim.process_keys("J");
	assert_eq!(vim.text(), "foo bar");
}

#[test]
fn counted_join() {
	let mut vim = engine("a\nb\nc");
	vim.process_keys("3J");
	assert_eq!(vim.text(), "a b c");
}

#[test]
fn open_line_carries_indent() {
	let mut vim = engine("  foo");
	vim.process_keys("obar");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "  foo\n  bar");

	let mut vim = engine("  foo");
	vim.process_keys("Obar");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "  bar\n  foo");
}

#[test]
fn replace_char_in_place() {
	let mut vim = engine("abc");
	vim.process_keys("rX");
	assert_eq!(vim.text(), "Xbc");
	assert_eq!(vim.cursor(), CursorPosition::origin());
}

#[test]
fn counted_replace_char() {
	let mut vim = engine("abcd");
	vim.process_keys("3rX");
	assert_eq!(vim.text(), "XXXd");
	assert_eq!(vim.cursor(), CursorPosition::new(0, 2));
}

#[test]
fn counted_replace_past_eol_refused() {
	let mut vim = engine("ab");
	vim.process_keys("9rX");
	assert_eq!(vim.text(), "ab");
}

#[test]
fn tilde_toggles_case() {
	let mut vim = engine("abc");
	vim.process_keys("~");
	assert_eq!(vim.text(), "Abc");
	assert_eq!(vim.cursor().col, 1);
}

#[test]
fn cc_keeps_indent() {
	let mut vim = engine("  foo");
	vim.process_keys("ccbar");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "  bar");
}

#[test]
fn replace_mode_overwrites() {
	let mut vim = engine("abcd");
	vim.process_keys("Rxy");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "xycd");
	assert_eq!(vim.cursor().col, 1);
}

#[test]
fn find_char_and_repeat() {
	let mut vim = engine("foo boo");
	vim.process_keys("fo");
	assert_eq!(vim.cursor().col, 1);
	vim.process_keys(";");
	assert_eq!(vim.cursor().col, 2);
	vim.process_keys(";");
	assert_eq!(vim.cursor().col, 5);
	vim.process_keys(",");
	assert_eq!(vim.cursor().col, 2);
}

#[test]
fn marks_jump_back() {
	let mut vim = engine("ab\ncd");
	vim.process_keys("majl`a");
	assert_eq!(vim.cursor(), CursorPosition::origin());
}

#[test]
fn jump_list_navigation() {
	let mut vim = engine("a\nb\nc");
	vim.process_keys("G");
	assert_eq!(vim.cursor().line, 2);
	vim.process_key("o", true, false, false);
	assert_eq!(vim.cursor().line, 0);
	vim.process_key("i", true, false, false);
	assert_eq!(vim.cursor().line, 2);
}

#[test]
fn macro_record_and_replay() {
	let mut vim = engine("abcd");
	vim.process_keys("qaxq");
	assert_eq!(vim.text(), "bcd");
	vim.process_keys("@a");
	assert_eq!(vim.text(), "cd");
	vim.process_keys("@@");
	assert_eq!(vim.text(), "d");
}

#[test]
fn dot_repeats_delete() {
	let mut vim = engine("abcdef");
	vim.process_keys("x.");
	assert_eq!(vim.text(), "cdef");
	vim.process_keys("3.");
	assert_eq!(vim.text(), "f");
}

#[test]
fn dot_repeats_insert_session() {
	let mut vim = engine("xyz");
	vim.process_keys("iab");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "abxyz");
	vim.process_keys(".");
	assert_eq!(vim.text(), "aabbxyz");
}

#[test]
fn append_at_line_end() {
	let mut vim = engine("ab");
	vim.process_keys("Ac");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "abc");
	assert_eq!(vim.cursor().col, 2);
}

#[test]
fn insert_at_first_non_blank() {
	let mut vim = engine("  ab");
	vim.process_keys("Ix");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "  xab");
}

#[test]
fn counted_insert_repeats_text() {
	let mut vim = engine("");
	vim.process_keys("3iab");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "ababab");
}

#[test]
fn search_miss_reports_and_stays() {
	let mut vim = engine("abc");
	vim.process_keys("l");
	let events = vim.process_keys("/zzz\r");
	assert!(has_status(&events, "Pattern not found: zzz"));
	assert_eq!(vim.cursor(), CursorPosition::new(0, 1));
}

#[test]
fn n_repeats_search() {
	let mut vim = engine("abc abc\nabc");
	vim.process_keys("/abc\r");
	assert_eq!(vim.cursor(), CursorPosition::new(0, 4));
	vim.process_keys("n");
	assert_eq!(vim.cursor(), CursorPosition::new(1, 0));
	vim.process_keys("n");
	assert_eq!(vim.cursor(), CursorPosition::origin());
	vim.process_keys("N");
	assert_eq!(vim.cursor(), CursorPosition::new(1, 0));
}

#[test]
fn incsearch_previews_and_escape_restores() {
	let mut vim = engine("hello\nworld");
	vim.process_keys("/wor");
	assert_eq!(vim.cursor(), CursorPosition::new(1, 0));
	vim.process_keys(ESC);
	assert_eq!(vim.cursor(), CursorPosition::origin());
	assert_eq!(vim.mode(), Mode::Normal);
}

#[test]
fn indent_uses_shiftwidth() {
	let mut vim = engine("foo");
	vim.process_keys(">>");
	assert_eq!(vim.text(), "    foo");

	vim.process_keys(":set shiftwidth=2\r");
	vim.process_keys(">>");
	assert_eq!(vim.text(), "      foo");
}

#[test]
fn dedent_removes_at_most_shiftwidth() {
	let mut vim = engine("      foo");
	vim.process_keys("<<");
	assert_eq!(vim.text(), "  foo");
	vim.process_keys("<<");
	assert_eq!(vim.text(), "foo");
	vim.process_keys("<<");
	assert_eq!(vim.text(), "foo");
}

#[test]
fn sticky_column_across_short_line() {
	let mut vim = engine("long line here\nab\nanother long one");
	vim.process_keys("8l");
	assert_eq!(vim.cursor().col, 8);
	vim.process_keys("j");
	assert_eq!(vim.cursor(), CursorPosition::new(1, 1));
	vim.process_keys("j");
	assert_eq!(vim.cursor(), CursorPosition::new(2, 8));
}

#[test]
fn dollar_pins_column_to_line_end() {
	let mut vim = engine("abc\nlonger line");
	vim.process_keys("$j");
	assert_eq!(vim.cursor(), CursorPosition::new(1, 10));
}

#[test]
fn mode_change_events() {
	let mut vim = engine("");
	let events = vim.process_keys("i");
	assert!(events.contains(&ViEvent::ModeChanged(Mode::Insert)));
	let events = vim.process_keys(ESC);
	assert!(events.contains(&ViEvent::ModeChanged(Mode::Normal)));
}

#[test]
fn viewport_align_requests() {
	let mut vim = engine("text");
	let events = vim.process_keys("zz");
	assert!(events.contains(&ViEvent::ViewportAlignRequested(ViewportAlign::Center)));
	let events = vim.process_keys("zt");
	assert!(events.contains(&ViEvent::ViewportAlignRequested(ViewportAlign::Top)));
}

#[test]
fn go_to_definition_request() {
	let mut vim = engine("symbol");
	let events = vim.process_keys("gd");
	assert!(events.contains(&ViEvent::GoToDefinitionRequested));
}

#[test]
fn clipboard_register_round_trip() {
	let mut vim = engine("hello\nworld");
	vim.set_clipboard(Box::new(MemoryClipboard::new()));
	vim.process_keys("\"+yydd\"+p");
	assert_eq!(vim.text(), "world\nhello");
}

#[test]
fn blackhole_register_discards() {
	let mut vim = engine("hello");
	vim.process_keys("yy");
	vim.process_keys("\"_dd");
	// The blackhole delete must not clobber the unnamed register
	assert_eq!(
		vim.registers().unnamed(),
		&RegisterContent::Line("hello".into())
	);
}

#[test]
fn yank_register_zero_survives_delete() {
	let mut vim = engine("keep\ndrop");
	vim.process_keys("yyj\"add");
	vim.process_keys("\"0p");
	assert_eq!(vim.text(), "keep\nkeep");
}

#[test]
fn mapping_expands_before_parsing() {
	let mut vim = engine("one\ntwo");
	vim.process_keys(":nnoremap Q dd\r");
	vim.process_keys("Q");
	assert_eq!(vim.text(), "two");
}

#[test]
fn command_history_recall() {
	let mut vim = engine("x");
	vim.process_keys(":set nu\r");
	vim.process_keys(":");
	let events = vim.process_key("Up", false, false, false);
	assert!(events.contains(&ViEvent::CommandLineChanged(":set nu".into())));
}

#[test]
fn unknown_ex_command_reports() {
	let mut vim = engine("x");
	let events = vim.process_keys(":frobnicate\r");
	assert!(has_status(&events, "Not an editor command: frobnicate"));
	assert_eq!(vim.mode(), Mode::Normal);
}

#[test]
fn set_rejects_bad_values_and_ignores_unknown() {
	let mut vim = engine("x");
	let events = vim.process_keys(":set shiftwidth=banana\r");
	assert!(has_status(&events, "E: Number required"));

	let events = vim.process_keys(":set nosuchoption\r");
	assert!(!has_status(&events, "E:"));
}

#[test]
fn go_to_line_with_bare_range() {
	let mut vim = engine("a\nb\nc\nd");
	vim.process_keys(":3\r");
	assert_eq!(vim.cursor().line, 2);
}

#[test]
fn edit_emits_open_file_request() {
	let mut vim = engine("x");
	let events = vim.process_keys(":e src/main.rs\r");
	assert!(events.contains(&ViEvent::OpenFileRequested("src/main.rs".into())));

	let events = vim.process_keys(":e\r");
	assert!(has_status(&events, "No file name"));
}

#[test]
fn undo_redo_round_trip() {
	let mut vim = engine("abcdef");
	vim.process_keys("xxx");
	let edited = vim.text();
	assert_eq!(edited, "def");
	vim.process_keys("uuu");
	assert_eq!(vim.text(), "abcdef");
	assert_eq!(vim.cursor(), CursorPosition::origin());
	for _ in 0..3 {
		vim.process_key("r", true, false, false);
	}
	assert_eq!(vim.text(), edited);
}

#[test]
fn enter_moves_to_next_line_start() {
	let mut vim = engine("one\n  two");
	vim.process_keys("ll");
	vim.process_key("Return", false, false, false);
	assert_eq!(vim.cursor(), CursorPosition::new(1, 2));
}
