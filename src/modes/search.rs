use crate::event::Mode;
use crate::keys::{KeyCode as K, KeyEvent as E, ModKeys as M};
use crate::vicmd::{CmdFlags, Direction, Motion, MotionCmd, Verb, VerbCmd, ViCmd};

use super::{CmdReplay, ViMode};

/// Search mode: keys build the pattern, Return commits it, Escape abandons it.
/// Backspace on an empty pattern also exits, like the command line.
pub struct ViSearch {
	pending_pattern: String,
	direction: Direction,
}

impl ViSearch {
	pub fn new(direction: Direction) -> Self {
		Self {
			pending_pattern: String::new(),
			direction,
		}
	}
	pub fn direction(&self) -> Direction {
		self.direction
	}
	fn prompt(&self) -> char {
		match self.direction {
			Direction::Forward => '/',
			Direction::Backward => '?',
		}
	}
}

impl ViMode for ViSearch {
	fn handle_key(&mut self, key: E) -> Option<ViCmd> {
		match key {
			E(K::Enter, M::NONE) => {
				let raw_seq = format!("{}{}\r", self.prompt(), self.pending_pattern);
				let pattern = std::mem::take(&mut self.pending_pattern);
				Some(ViCmd {
					verb: Some(VerbCmd(1, Verb::NormalMode)),
					motion: Some(MotionCmd(1, Motion::PatternSearch(pattern, self.direction))),
					flags: CmdFlags::EXIT_CUR_MODE,
					raw_seq,
					..Default::default()
				})
			}
			E(K::Esc, M::NONE) => {
				Some(ViCmd {
					verb: Some(VerbCmd(1, Verb::NormalMode)),
					flags: CmdFlags::EXIT_CUR_MODE,
					..Default::default()
				})
			}
			E(K::Backspace, M::NONE) => {
				if self.pending_pattern.pop().is_none() {
					return Some(ViCmd {
						verb: Some(VerbCmd(1, Verb::NormalMode)),
						flags: CmdFlags::EXIT_CUR_MODE,
						..Default::default()
					})
				}
				None
			}
			E(K::Char(ch), M::NONE) => {
				self.pending_pattern.push(ch);
				None
			}
			E(K::Grapheme(g), M::NONE) => {
				self.pending_pattern.push_str(&g);
				None
			}
			_ => None
		}
	}

	fn is_repeatable(&self) -> bool {
		false
	}

	fn as_replay(&self) -> Option<CmdReplay> {
		None
	}

	fn pending_seq(&self) -> Option<String> {
		Some(self.pending_pattern.clone())
	}

	fn set_pending(&mut self, line: String) {
		self.pending_pattern = line;
	}

	fn clamp_insert(&self) -> bool {
		false
	}

	fn report_mode(&self) -> Mode {
		match self.direction {
			Direction::Forward => Mode::SearchForward,
			Direction::Backward => Mode::SearchBackward,
		}
	}
}
