use pretty_assertions::assert_eq;

use crate::cursor::CursorPosition;
use crate::tests::{engine, ESC};

#[test]
fn typed_text_lands_at_cursor() {
	let mut vim = engine("world");
	vim.process_keys("ihello ");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "hello world");
}

#[test]
fn escape_steps_cursor_left() {
	let mut vim = engine("");
	vim.process_keys("iab");
	assert_eq!(vim.cursor().col, 2);
	vim.process_keys(ESC);
	assert_eq!(vim.cursor().col, 1);
}

#[test]
fn backspace_crosses_line_boundaries() {
	let mut vim = engine("ab\ncd");
	vim.process_keys("ji");
	vim.process_key("Back", false, false, false);
	assert_eq!(vim.text(), "abcd");
	assert_eq!(vim.cursor(), CursorPosition::new(0, 2));
}

#[test]
fn return_splits_line_with_autoindent() {
	let mut vim = engine("  indented");
	vim.process_keys("A");
	vim.process_key("Return", false, false, false);
	vim.process_keys("more");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "  indented\n  more");
}

#[test]
fn return_without_autoindent() {
	let mut vim = engine("  indented");
	vim.process_keys(":set noautoindent\r");
	vim.process_keys("A");
	vim.process_key("Return", false, false, false);
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "  indented\n");
}

#[test]
fn tab_expands_to_spaces() {
	let mut vim = engine("");
	vim.process_keys("i");
	vim.process_key("Tab", false, false, false);
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "    ");

	let mut vim = engine("");
	vim.process_keys(":set noexpandtab\r");
	vim.process_keys("i");
	vim.process_key("Tab", false, false, false);
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "\t");
}

#[test]
fn delete_key_removes_under_cursor() {
	let mut vim = engine("abc");
	vim.process_keys("i");
	vim.process_key("Delete", false, false, false);
	assert_eq!(vim.text(), "bc");
}

#[test]
fn multibyte_input() {
	let mut vim = engine("");
	vim.process_keys("icafé ☕");
	vim.process_keys(ESC);
	assert_eq!(vim.text(), "café ☕");
}
