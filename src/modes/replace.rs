use crate::event::Mode;
use crate::keys::{KeyCode as K, KeyEvent as E, ModKeys as M};
use crate::vicmd::{Motion, MotionCmd, Verb, VerbCmd, ViCmd};

use super::{common_cmds, CmdReplay, ViMode};

/// Replace mode: typed characters overwrite instead of inserting.
#[derive(Default, Debug)]
pub struct ViReplace {
	cmds: Vec<ViCmd>,
	pending_cmd: ViCmd,
}

impl ViReplace {
	pub fn new() -> Self {
		Self::default()
	}
	pub fn with_entry(mut self, entry: ViCmd) -> Self {
		self.cmds.push(entry);
		self
	}
	pub fn register_and_return(&mut self) -> Option<ViCmd> {
		let mut cmd = self.take_cmd();
		cmd.normalize_counts();
		self.register_cmd(&cmd);
		Some(cmd)
	}
	pub fn register_cmd(&mut self, cmd: &ViCmd) {
		self.cmds.push(cmd.clone())
	}
	pub fn take_cmd(&mut self) -> ViCmd {
		std::mem::take(&mut self.pending_cmd)
	}
}

impl ViMode for ViReplace {
	fn handle_key(&mut self, key: E) -> Option<ViCmd> {
		match key {
			E(K::Char(ch), M::NONE) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::ReplaceChar(ch)));
				self.register_and_return()
			}
			E(K::Enter, M::NONE) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::AcceptLineOrNewline));
				self.register_and_return()
			}
			E(K::Char('H'), M::CTRL) |
			E(K::Backspace, M::NONE) => {
				self.pending_cmd.set_motion(MotionCmd(1, Motion::BackwardChar));
				self.register_and_return()
			}
			E(K::Esc, M::NONE) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::NormalMode));
				self.register_and_return()
			}
			_ => common_cmds(key)
		}
	}

	fn is_repeatable(&self) -> bool {
		true
	}

	fn as_replay(&self) -> Option<CmdReplay> {
		Some(CmdReplay::mode(self.cmds.clone(), 0))
	}

	fn pending_seq(&self) -> Option<String> {
		None
	}

	fn clamp_insert(&self) -> bool {
		true
	}

	fn report_mode(&self) -> Mode {
		Mode::Replace
	}
}
