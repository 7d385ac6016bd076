use crate::event::ViEvent;
use crate::exec::ViEngine;

pub mod buffer;
pub mod editor;
pub mod files;
pub mod modes;
pub mod props;

/// Escape, as the raw byte tests can embed in a key string.
pub const ESC: &str = "\u{1b}";

pub fn engine(text: &str) -> ViEngine {
	let _ = env_logger::builder().is_test(true).try_init();
	ViEngine::with_text(text)
}

pub fn has_status(events: &[ViEvent], needle: &str) -> bool {
	events.iter().any(|e| match e {
		ViEvent::StatusMessage(msg) => msg.contains(needle),
		_ => false,
	})
}

// Integration tests: whole key sequences through the engine.

#[test]
fn word_deletion_round_trip() {
	let mut vim = engine("alpha beta gamma");
	vim.process_keys("dw");
	assert_eq!(vim.text(), "beta gamma");
	vim.process_keys("u");
	assert_eq!(vim.text(), "alpha beta gamma");
}

#[test]
fn counted_operators_compose() {
	let mut vim = engine("one two three four five");
	vim.process_keys("2d2w");
	assert_eq!(vim.text(), "five");
}

#[test]
fn quit_on_modified_buffer_is_refused() {
	let mut vim = engine("stuff");
	vim.process_keys("x");
	let events = vim.process_keys(":q\r");
	assert!(has_status(&events, "No write since last change"));
	assert!(!events.contains(&ViEvent::QuitRequested { force: false }));

	let events = vim.process_keys(":q!\r");
	assert!(events.contains(&ViEvent::QuitRequested { force: true }));
}

#[test]
fn tab_and_split_requests_flow_through() {
	let mut vim = engine("");
	let events = vim.process_keys(":tabnew\r");
	assert!(events.contains(&ViEvent::NewTabRequested(None)));

	let events = vim.process_keys(":vsplit\r");
	assert!(events.contains(&ViEvent::SplitRequested { vertical: true }));

	let events = vim.process_keys(":tabc\r");
	assert!(events.contains(&ViEvent::CloseTabRequested { force: false }));

	let events = vim.process_keys("gt");
	assert!(events.contains(&ViEvent::NextTabRequested));
}
