use pretty_assertions::assert_eq;

use crate::cursor::{CursorPosition, SelectKind};
use crate::event::Mode;
use crate::register::RegisterContent;
use crate::tests::{engine, ESC};

#[test]
fn charwise_selection_delete() {
	let mut vim = engine("abcde");
	vim.process_keys("vlld");
	assert_eq!(vim.text(), "de");
	assert_eq!(vim.mode(), Mode::Normal);
	assert!(vim.selection().is_none());
}

#[test]
fn linewise_selection_delete() {
	let mut vim = engine("a\nb\nc");
	vim.process_keys("Vjd");
	assert_eq!(vim.text(), "c");
}

#[test]
fn selection_yank_sets_register_kind() {
	let mut vim = engine("one two");
	vim.process_keys("vey");
	assert_eq!(vim.registers().unnamed(), &RegisterContent::Span("one".into()));

	let mut vim = engine("one\ntwo");
	vim.process_keys("Vy");
	assert_eq!(vim.registers().unnamed(), &RegisterContent::Line("one".into()));
}

#[test]
fn kind_switch_keeps_selection() {
	let mut vim = engine("abc\ndef");
	vim.process_keys("vl");
	assert_eq!(vim.selection().map(|s| s.kind), Some(SelectKind::Char));
	vim.process_keys("V");
	assert_eq!(vim.selection().map(|s| s.kind), Some(SelectKind::Line));
	assert_eq!(vim.mode(), Mode::VisualLine);
	// Same kind again leaves visual entirely
	vim.process_keys("V");
	assert_eq!(vim.mode(), Mode::Normal);
}

#[test]
fn escape_leaves_visual() {
	let mut vim = engine("abc");
	vim.process_keys("vl");
	assert!(vim.selection().is_some());
	vim.process_keys(ESC);
	assert!(vim.selection().is_none());
	assert_eq!(vim.mode(), Mode::Normal);
}

#[test]
fn swap_anchor_with_o() {
	let mut vim = engine("abcde");
	vim.process_keys("llvll");
	let sel = vim.selection().unwrap();
	assert_eq!(sel.anchor, CursorPosition::new(0, 2));
	assert_eq!(sel.head, CursorPosition::new(0, 4));
	vim.process_keys("o");
	assert_eq!(vim.cursor(), CursorPosition::new(0, 2));
	let sel = vim.selection().unwrap();
	assert_eq!(sel.anchor, CursorPosition::new(0, 4));
}

#[test]
fn text_object_reshapes_selection() {
	let mut vim = engine("foo bar baz");
	vim.process_keys("lviw");
	let sel = vim.selection().unwrap();
	assert_eq!(sel.anchor, CursorPosition::new(0, 0));
	assert_eq!(sel.head, CursorPosition::new(0, 2));
	vim.process_keys("d");
	assert_eq!(vim.text(), " bar baz");
}

#[test]
fn visual_paste_replaces_selection() {
	let mut vim = engine("abc def");
	vim.process_keys("vlly");
	vim.process_keys("wvllp");
	assert_eq!(vim.text(), "abc abc");
}

#[test]
fn visual_change_enters_insert() {
	let mut vim = engine("foo bar");
	vim.process_keys("vllcnew");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "new bar");
}

#[test]
fn visual_indent() {
	let mut vim = engine("a\nb");
	vim.process_keys("Vj>");
	assert_eq!(vim.text(), "    a\n    b");
}

#[test]
fn visual_fill_with_r() {
	let mut vim = engine("abcde");
	vim.process_keys("vllrx");
	assert_eq!(vim.text(), "xxxde");
}

#[test]
fn visual_ex_range_substitutes_selection_only() {
	let mut vim = engine("foo\nfoo\nfoo");
	vim.process_keys("Vj:s/foo/bar/\r");
	assert_eq!(vim.text(), "bar\nbar\nfoo");
}

#[test]
fn block_selection_delete() {
	let mut vim = engine("abc\ndef\nghi");
	vim.process_key("v", true, false, false);
	vim.process_keys("jjl");
	vim.process_keys("d");
	assert_eq!(vim.text(), "c\nf\ni");
}

#[test]
fn join_selected_lines() {
	let mut vim = engine("a\nb\nc");
	vim.process_keys("VjJ");
	assert_eq!(vim.text(), "a b\nc");
}
