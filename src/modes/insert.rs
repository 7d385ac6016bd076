use crate::event::Mode;
use crate::keys::{KeyCode as K, KeyEvent as E, ModKeys as M};
use crate::vicmd::{Motion, MotionCmd, Verb, VerbCmd, ViCmd};

use super::{common_cmds, CmdReplay, ViMode};

/// Insert mode consumes keys directly; no accumulator.
///
/// Every command the session produces is recorded (including the command that
/// entered the mode and the final Escape) so the whole change can be replayed
/// by `.`.
#[derive(Default, Debug)]
pub struct ViInsert {
	cmds: Vec<ViCmd>,
	pending_cmd: ViCmd,
	repeat_count: u16,
}

impl ViInsert {
	pub fn new() -> Self {
		Self::default()
	}
	pub fn with_count(mut self, repeat_count: u16) -> Self {
		self.repeat_count = repeat_count;
		self
	}
	/// Seed the session with the command that opened it (`i`, `ciw`, `o`, ...)
	/// so a later `.` replays the entire change.
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

impl ViMode for ViInsert {
	fn handle_key(&mut self, key: E) -> Option<ViCmd> {
		match key {
			E(K::Char(ch), M::NONE) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::InsertChar(ch)));
				self.register_and_return()
			}
			E(K::Grapheme(g), M::NONE) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::Insert(g.to_string())));
				self.register_and_return()
			}
			E(K::Tab, M::NONE) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::InsertChar('\t')));
				self.register_and_return()
			}
			E(K::Enter, M::NONE) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::AcceptLineOrNewline));
				self.register_and_return()
			}
			E(K::Char('W'), M::CTRL) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::Delete));
				self.pending_cmd.set_motion(MotionCmd(1, Motion::WordMotion(crate::vicmd::To::Start, crate::vicmd::Word::Normal, crate::vicmd::Direction::Backward)));
				self.register_and_return()
			}
			E(K::Char('H'), M::CTRL) |
			E(K::Backspace, M::NONE) => {
				self.pending_cmd.set_verb(VerbCmd(1, Verb::Delete));
				self.pending_cmd.set_motion(MotionCmd(1, Motion::BackwardCharForced));
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
		Some(CmdReplay::mode(self.cmds.clone(), self.repeat_count))
	}

	fn pending_seq(&self) -> Option<String> {
		None
	}

	fn clamp_insert(&self) -> bool {
		true
	}

	fn report_mode(&self) -> Mode {
		Mode::Insert
	}
}
