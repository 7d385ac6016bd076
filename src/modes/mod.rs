//! Per-mode key parsing.
//!
//! Each mode turns `KeyEvent`s into `ViCmd`s; all parsing of key sequences
//! lives here. Execution is the dispatcher's job. Normal and visual mode run
//! the accumulator parser; insert, replace, command-line and search modes
//! consume keys directly.

use crate::event::Mode;
use crate::keys::{KeyCode as K, KeyEvent as E, ModKeys as M};
use crate::vicmd::{Motion, MotionCmd, Verb, VerbCmd, ViCmd};

pub mod normal;
pub mod insert;
pub mod replace;
pub mod visual;
pub mod search;
pub mod ex;

/// A stored change for `.` repeat: either one command, or the command list an
/// insert-style session produced (entry command, typed text, exit).
#[derive(Debug, Clone)]
pub enum CmdReplay {
	ModeReplay { cmds: Vec<ViCmd>, repeat: u16 },
	Single(ViCmd),
}

impl CmdReplay {
	pub fn mode(cmds: Vec<ViCmd>, repeat: u16) -> Self {
		Self::ModeReplay { cmds, repeat }
	}
	pub fn single(cmd: ViCmd) -> Self {
		Self::Single(cmd)
	}
}

/// Parser verdict for an accumulated key sequence.
pub enum CmdState {
	Pending,
	Complete,
	Invalid,
}

pub trait ViMode {
	fn handle_key(&mut self, key: E) -> Option<ViCmd>;
	fn handle_key_fallible(&mut self, key: E) -> Result<Option<ViCmd>, String> {
		// Default behavior
		Ok(self.handle_key(key))
	}
	/// Whether leaving this mode should capture it as the last change
	fn is_repeatable(&self) -> bool;
	fn as_replay(&self) -> Option<CmdReplay>;
	/// The accumulated-but-incomplete input, if this mode keeps any
	fn pending_seq(&self) -> Option<String>;
	/// Replace the pending line; used by command/search history recall
	fn set_pending(&mut self, _line: String) {}
	/// Insert-style column clamping (cursor may rest past the last grapheme)
	fn clamp_insert(&self) -> bool;
	fn report_mode(&self) -> Mode;
}

/// Keys that behave the same across modes: arrows, Home/End, Delete.
pub fn common_cmds(key: E) -> Option<ViCmd> {
	let mut pending_cmd = ViCmd::new();
	match key {
		E(K::Home, M::NONE) => pending_cmd.set_motion(MotionCmd(1, Motion::BeginningOfLine)),
		E(K::End, M::NONE) => pending_cmd.set_motion(MotionCmd(1, Motion::EndOfLine)),
		E(K::Left, M::NONE) => pending_cmd.set_motion(MotionCmd(1, Motion::BackwardChar)),
		E(K::Right, M::NONE) => pending_cmd.set_motion(MotionCmd(1, Motion::ForwardChar)),
		E(K::Up, M::NONE) => pending_cmd.set_motion(MotionCmd(1, Motion::LineUp)),
		E(K::Down, M::NONE) => pending_cmd.set_motion(MotionCmd(1, Motion::LineDown)),
		E(K::Delete, M::NONE) => {
			pending_cmd.set_verb(VerbCmd(1, Verb::Delete));
			pending_cmd.set_motion(MotionCmd(1, Motion::ForwardChar));
		}
		_ => return None,
	}
	Some(pending_cmd)
}
