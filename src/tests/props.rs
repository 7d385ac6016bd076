//! Property-based invariants for the buffer and the engine as a whole.

use proptest::prelude::*;

use crate::buffer::TextBuffer;
use crate::cursor::CursorPosition;
use crate::event::Mode;

use super::engine;

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn clamp_cursor_is_idempotent(
		text in "[ -~\\n]{0,80}",
		line in 0usize..10,
		col in 0usize..20,
	) {
		let buf = TextBuffer::from_text(&text);
		for insert in [false, true] {
			let once = buf.clamp_cursor(CursorPosition::new(line, col), insert);
			let twice = buf.clamp_cursor(once, insert);
			prop_assert_eq!(once, twice);
		}
	}

	#[test]
	fn find_all_is_deterministic(text in "[a-c \\n]{0,60}", pat in "[a-c]{1,3}") {
		let buf = TextBuffer::from_text(&text);
		prop_assert_eq!(buf.find_all(&pat, false), buf.find_all(&pat, false));
	}

	#[test]
	fn snapshot_restore_round_trips(text in "[ -~\\n]{0,80}") {
		let mut buf = TextBuffer::from_text(&text);
		let snapshot = buf.snapshot();
		let original = buf.text();
		buf.insert_text(0, 0, "mutation");
		buf.delete_lines(0, 0);
		buf.restore_snapshot(snapshot);
		prop_assert_eq!(buf.text(), original);
	}

	#[test]
	fn h_then_l_returns_to_start(col in 1usize..9) {
		let mut vim = engine("0123456789");
		vim.process_keys(&format!("{col}l"));
		let before = vim.cursor();
		vim.process_keys("hl");
		prop_assert_eq!(vim.cursor(), before);
	}

	#[test]
	fn engine_invariants_hold_under_arbitrary_keys(
		keys in proptest::collection::vec("[ -~]", 0..40),
	) {
		let mut vim = engine("alpha beta\ngamma\n\ndelta epsilon zeta");
		for key in &keys {
			vim.process_key(key, false, false, false);
		}
		prop_assert!(vim.buffer().line_count() >= 1);
		let insert = matches!(vim.mode(), Mode::Insert | Mode::Replace);
		let clamped = vim.buffer().clamp_cursor(vim.cursor(), insert);
		prop_assert_eq!(vim.cursor(), clamped);
	}
}
