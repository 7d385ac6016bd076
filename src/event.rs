//! The outbound interface: semantic events describing what a key press did.
//!
//! Every call to [`ViEngine::process_key`](crate::exec::ViEngine::process_key) returns
//! the ordered list of events it produced. Hosts reflect these into UI actions.
//! Request events (save, quit, tabs, splits, viewport alignment) are advisory;
//! the host may refuse or prompt.

use std::path::PathBuf;

use serde::Serialize;

use crate::cursor::{CursorPosition, Selection};

/// The engine's modal state, as reported to hosts.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Mode {
	Normal,
	Insert,
	Replace,
	Visual,
	VisualLine,
	VisualBlock,
	Command,
	SearchForward,
	SearchBackward,
}

/// Where the host should place the cursor line in the viewport (`zz`, `zt`, `zb`).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ViewportAlign {
	Top,
	Center,
	Bottom,
}

/// A semantic event emitted by the engine.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub enum ViEvent {
	ModeChanged(Mode),
	TextChanged,
	CursorMoved(CursorPosition),
	SelectionChanged(Option<Selection>),
	StatusMessage(String),
	CommandLineChanged(String),
	SearchResultChanged { pattern: String, match_count: usize },
	SaveRequested(Option<PathBuf>),
	QuitRequested { force: bool },
	OpenFileRequested(PathBuf),
	NewTabRequested(Option<PathBuf>),
	SplitRequested { vertical: bool },
	NextTabRequested,
	PrevTabRequested,
	CloseTabRequested { force: bool },
	NextBufferRequested,
	PrevBufferRequested,
	GoToBufferRequested(usize),
	CloseBufferRequested { force: bool },
	ViewportAlignRequested(ViewportAlign),
	GoToDefinitionRequested,
	FormatDocumentRequested,
}
