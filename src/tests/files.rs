use pretty_assertions::assert_eq;

use crate::capability::FsFileIo;
use crate::event::ViEvent;

use super::{engine, has_status};

#[test]
fn write_saves_through_capability() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("scratch.txt");

	let mut vim = engine("hello\nworld");
	vim.set_file_io(Box::new(FsFileIo));
	vim.set_file_path(Some(path.clone()));

	vim.process_keys("x");
	assert!(vim.buffer().is_modified());

	let events = vim.process_keys(":w\r");
	assert!(has_status(&events, "2L written"));
	assert!(!vim.buffer().is_modified());
	assert_eq!(std::fs::read_to_string(&path).unwrap(), "ello\nworld");

	// Saved buffer quits cleanly now
	let events = vim.process_keys(":q\r");
	assert!(events.contains(&ViEvent::QuitRequested { force: false }));
}

#[test]
fn write_with_explicit_path() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("other.txt");

	let mut vim = engine("data");
	vim.set_file_io(Box::new(FsFileIo));
	vim.process_keys(&format!(":w {}\r", path.display()));
	assert_eq!(std::fs::read_to_string(&path).unwrap(), "data");
}

#[test]
fn unnamed_write_requests_host_prompt() {
	let mut vim = engine("data");
	let events = vim.process_keys(":w\r");
	assert!(events.contains(&ViEvent::SaveRequested(None)));
}

#[test]
fn write_failure_is_reported() {
	let mut vim = engine("data");
	// The default engine has no file access at all
	let events = vim.process_keys(":w /nowhere/nothing.txt\r");
	assert!(has_status(&events, "E: Cannot write"));
}

#[test]
fn load_file_clears_undo() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("input.txt");
	std::fs::write(&path, "fresh content").unwrap();

	let mut vim = engine("old");
	vim.set_file_io(Box::new(FsFileIo));
	vim.process_keys("x");
	vim.load_file(&path).unwrap();
	assert_eq!(vim.text(), "fresh content");

	// Nothing left to undo
	let events = vim.process_keys("u");
	assert!(has_status(&events, "Already at oldest change"));
	assert_eq!(vim.text(), "fresh content");
}

#[test]
fn wq_saves_then_requests_quit() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("out.txt");

	let mut vim = engine("bye");
	vim.set_file_io(Box::new(FsFileIo));
	vim.set_file_path(Some(path.clone()));
	let events = vim.process_keys(":wq\r");
	assert!(events.contains(&ViEvent::QuitRequested { force: false }));
	assert_eq!(std::fs::read_to_string(&path).unwrap(), "bye");
}
