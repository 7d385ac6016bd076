//! Snapshot-based undo and redo.
//!
//! Every mutating command pushes a whole-buffer snapshot before it runs. The
//! stacks are bounded; loading a file clears them.

use crate::cursor::CursorPosition;

const MAX_UNDO_DEPTH: usize = 1000;

/// One saved buffer state: the full line vector plus the cursor at the time.
#[derive(Clone, Debug, PartialEq)]
pub struct UndoState {
	pub lines: Vec<String>,
	pub cursor: CursorPosition,
}

#[derive(Default, Debug)]
pub struct UndoManager {
	undo_stack: Vec<UndoState>,
	redo_stack: Vec<UndoState>,
}

impl UndoManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record the pre-mutation state. Any pending redo history is invalidated.
	pub fn push_snapshot(&mut self, state: UndoState) {
		self.redo_stack.clear();
		if self.undo_stack.len() == MAX_UNDO_DEPTH {
			self.undo_stack.remove(0);
		}
		self.undo_stack.push(state);
	}

	/// Pop the most recent snapshot, saving `current` for redo.
	pub fn undo(&mut self, current: UndoState) -> Option<UndoState> {
		let state = self.undo_stack.pop()?;
		self.redo_stack.push(current);
		Some(state)
	}

	/// Inverse of [`undo`](Self::undo).
	pub fn redo(&mut self, current: UndoState) -> Option<UndoState> {
		let state = self.redo_stack.pop()?;
		self.undo_stack.push(current);
		Some(state)
	}

	pub fn clear(&mut self) {
		self.undo_stack.clear();
		self.redo_stack.clear();
	}

	pub fn undo_depth(&self) -> usize {
		self.undo_stack.len()
	}

	pub fn redo_depth(&self) -> usize {
		self.redo_stack.len()
	}
}
