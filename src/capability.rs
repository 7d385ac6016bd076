//! Injected capabilities: the only two seams through which the engine touches
//! the outside world.
//!
//! The core owns no I/O. Clipboard access and file reads/writes go through
//! these traits; the host wires up real implementations, tests use the
//! in-memory ones.

use std::io;
use std::path::Path;

/// Platform clipboard bridge used by the `+` and `*` registers.
///
/// Best-effort by contract: failures are represented as `None`/silent drops
/// and never surface as errors.
pub trait ClipboardProvider {
	fn get_text(&mut self) -> Option<String>;
	fn set_text(&mut self, text: &str);
}

/// A clipboard that drops everything. The default.
#[derive(Default, Debug)]
pub struct NoopClipboard;

impl ClipboardProvider for NoopClipboard {
	fn get_text(&mut self) -> Option<String> {
		None
	}
	fn set_text(&mut self, _text: &str) {}
}

/// An in-memory clipboard for tests and embedded hosts.
#[derive(Default, Debug)]
pub struct MemoryClipboard {
	text: Option<String>,
}

impl MemoryClipboard {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ClipboardProvider for MemoryClipboard {
	fn get_text(&mut self) -> Option<String> {
		self.text.clone()
	}
	fn set_text(&mut self, text: &str) {
		self.text = Some(text.to_string());
	}
}

/// File access used by `:w` and file loading. The host supplies paths.
pub trait FileIo {
	fn read_to_string(&mut self, path: &Path) -> io::Result<String>;
	fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;
}

/// A `FileIo` that refuses everything; the default for a bare engine.
#[derive(Default, Debug)]
pub struct NoFileIo;

impl FileIo for NoFileIo {
	fn read_to_string(&mut self, _path: &Path) -> io::Result<String> {
		Err(io::Error::new(io::ErrorKind::Unsupported, "no file access configured"))
	}
	fn write(&mut self, _path: &Path, _contents: &str) -> io::Result<()> {
		Err(io::Error::new(io::ErrorKind::Unsupported, "no file access configured"))
	}
}

/// Real filesystem access through `std::fs`, for hosts that want it.
#[derive(Default, Debug)]
pub struct FsFileIo;

impl FileIo for FsFileIo {
	fn read_to_string(&mut self, path: &Path) -> io::Result<String> {
		std::fs::read_to_string(path)
	}
	fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
		std::fs::write(path, contents)
	}
}
