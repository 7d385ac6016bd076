use std::iter::Peekable;
use std::str::Chars;

use crate::keys::{KeyCode as K, KeyEvent as E, ModKeys as M};
use crate::register::RegisterName;
use crate::event::{Mode, ViewportAlign};
use crate::vicmd::{Anchor, Bound, Dest, Direction, Motion, MotionCmd, TextObj, To, Verb, VerbCmd, ViCmd, Word};

use super::{common_cmds, CmdReplay, CmdState, ViMode};

/// The normal-mode accumulator parser.
///
/// Keys append to `pending_seq`; every key triggers a full re-parse of the
/// accumulated sequence as `[count]["register][count]operator?[count]motion?`.
/// An incomplete sequence leaves the accumulator in place, an invalid one
/// silently resets it.
#[derive(Default, Debug)]
pub struct ViNormal {
	pending_seq: String,
}

impl ViNormal {
	pub fn new() -> Self {
		Self::default()
	}
	pub fn clear_cmd(&mut self) {
		self.pending_seq = String::new();
	}
	pub fn take_cmd(&mut self) -> String {
		std::mem::take(&mut self.pending_seq)
	}
	fn validate_combination(&self, verb: Option<&Verb>, motion: Option<&Motion>) -> CmdState {
		match (verb, motion) {
			// A bare text object is not a motion
			(None, Some(Motion::TextObj(_))) => CmdState::Invalid,
			(None, Some(_)) => CmdState::Complete,
			(None, None) => CmdState::Pending,
			// Operator waiting for its motion
			(Some(_), None) => CmdState::Pending,
			(Some(_), Some(_)) => CmdState::Complete,
		}
	}
	pub fn parse_count(&self, chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
		let mut count = String::new();
		let Some(_digit @ '1'..='9') = chars.peek() else {
			return None
		};
		count.push(chars.next().unwrap());
		while let Some(_digit @ '0'..='9') = chars.peek() {
			count.push(chars.next().unwrap());
		}
		count.parse::<usize>().ok()
	}
	/// End the parse and clear the pending sequence
	pub fn quit_parse(&mut self) -> Option<ViCmd> {
		self.clear_cmd();
		None
	}
	fn complete(&mut self, register: RegisterName, verb: Option<VerbCmd>, motion: Option<MotionCmd>) -> Option<ViCmd> {
		Some(ViCmd {
			register,
			verb,
			motion,
			raw_seq: self.take_cmd(),
			flags: Default::default(),
		})
	}
	pub fn try_parse(&mut self, ch: char) -> Option<ViCmd> {
		self.pending_seq.push(ch);
		let mut chars = self.pending_seq.chars().peekable();

		/*
		 * Parse the register prefix.
		 *
		 * A count may precede the register name; it multiplies into the verb
		 * count, so `2"add` equals `"a2dd`.
		 */
		let (register, reg_count) = 'reg_parse: {
			let mut chars_clone = chars.clone();
			let count = self.parse_count(&mut chars_clone);

			let Some('"') = chars_clone.next() else {
				break 'reg_parse (RegisterName::default(), None)
			};

			let Some(reg_name) = chars_clone.next() else {
				return None // Pending register name
			};
			match reg_name {
				'a'..='z' |
				'A'..='Z' |
				'0' | '+' | '*' | '_' => { /* proceed */ }
				_ => return self.quit_parse()
			}

			chars = chars_clone;
			(RegisterName::new(Some(reg_name)), count)
		};

		/*
		 * Parse the verb.
		 *
		 * Invalid sequences call 'return self.quit_parse()', which clears the
		 * pending command and returns None. Incomplete sequences return None
		 * directly, leaving the accumulator where it is. Standalone actions
		 * return a complete command from inside this block; operators break
		 * out of it so a motion can follow.
		 */
		let verb = 'verb_parse: {
			let mut chars_clone = chars.clone();
			let count = self.parse_count(&mut chars_clone).unwrap_or(1) * reg_count.unwrap_or(1);

			let Some(ch) = chars_clone.next() else {
				break 'verb_parse None
			};
			match ch {
				'g' => {
					// 'g' is a motion prefix, never an operator; only the few
					// g-commands that are actions complete here
					match chars_clone.peek() {
						Some('t') => return self.complete(register, Some(VerbCmd(count, Verb::NextTab)), None),
						Some('T') => return self.complete(register, Some(VerbCmd(count, Verb::PrevTab)), None),
						Some('d') => return self.complete(register, Some(VerbCmd(1, Verb::GoToDefinition)), None),
						_ => break 'verb_parse None
					}
				}
				'z' => {
					let align = match chars_clone.next() {
						Some('z') => ViewportAlign::Center,
						Some('t') => ViewportAlign::Top,
						Some('b') => ViewportAlign::Bottom,
						Some(_) => return self.quit_parse(),
						None => return None
					};
					return self.complete(register, Some(VerbCmd(1, Verb::ViewportAlign(align))), None)
				}
				'.' => {
					return self.complete(register, Some(VerbCmd(count, Verb::RepeatLast)), None)
				}
				'u' => {
					return self.complete(register, Some(VerbCmd(count, Verb::Undo)), None)
				}
				'x' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::Delete)),
						Some(MotionCmd(1, Motion::ForwardChar)),
					)
				}
				'X' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::Delete)),
						Some(MotionCmd(1, Motion::BackwardChar)),
					)
				}
				's' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::Change)),
						Some(MotionCmd(1, Motion::ForwardChar)),
					)
				}
				'S' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::Change)),
						Some(MotionCmd(1, Motion::WholeLine)),
					)
				}
				'D' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::Delete)),
						Some(MotionCmd(1, Motion::EndOfLine)),
					)
				}
				'C' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::Change)),
						Some(MotionCmd(1, Motion::EndOfLine)),
					)
				}
				'Y' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::Yank)),
						Some(MotionCmd(1, Motion::WholeLine)),
					)
				}
				'p' => {
					return self.complete(register, Some(VerbCmd(count, Verb::Put(Anchor::After))), None)
				}
				'P' => {
					return self.complete(register, Some(VerbCmd(count, Verb::Put(Anchor::Before))), None)
				}
				'>' => {
					chars = chars_clone;
					break 'verb_parse Some(VerbCmd(count, Verb::Indent));
				}
				'<' => {
					chars = chars_clone;
					break 'verb_parse Some(VerbCmd(count, Verb::Dedent));
				}
				'=' => {
					chars = chars_clone;
					break 'verb_parse Some(VerbCmd(count, Verb::Equalize));
				}
				'y' => {
					chars = chars_clone;
					break 'verb_parse Some(VerbCmd(count, Verb::Yank))
				}
				'd' => {
					chars = chars_clone;
					break 'verb_parse Some(VerbCmd(count, Verb::Delete))
				}
				'c' => {
					chars = chars_clone;
					break 'verb_parse Some(VerbCmd(count, Verb::Change))
				}
				'r' => {
					let ch = chars_clone.next()?;
					return self.complete(
						register,
						Some(VerbCmd(1, Verb::ReplaceCharInplace(ch, count as u16))),
						None,
					)
				}
				'R' => {
					return self.complete(register, Some(VerbCmd(count, Verb::ReplaceMode)), None)
				}
				'~' => {
					return self.complete(
						register,
						Some(VerbCmd(1, Verb::ToggleCaseInplace(count as u16))),
						None,
					)
				}
				'v' => {
					return self.complete(register, Some(VerbCmd(count, Verb::VisualMode)), None)
				}
				'V' => {
					return self.complete(register, Some(VerbCmd(count, Verb::VisualModeLine)), None)
				}
				'o' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::InsertModeLineBreak(Anchor::After))),
						None,
					)
				}
				'O' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::InsertModeLineBreak(Anchor::Before))),
						None,
					)
				}
				'a' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::InsertMode)),
						Some(MotionCmd(1, Motion::ForwardChar)),
					)
				}
				'A' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::InsertMode)),
						Some(MotionCmd(1, Motion::EndOfLine)),
					)
				}
				'i' => {
					return self.complete(register, Some(VerbCmd(count, Verb::InsertMode)), None)
				}
				'I' => {
					return self.complete(
						register,
						Some(VerbCmd(count, Verb::InsertMode)),
						Some(MotionCmd(1, Motion::BeginningOfFirstWord)),
					)
				}
				'J' => {
					return self.complete(register, Some(VerbCmd(count, Verb::JoinLines)), None)
				}
				'm' => {
					let ch = chars_clone.next()?;
					return self.complete(register, Some(VerbCmd(1, Verb::SetMark(ch))), None)
				}
				'q' => {
					let ch = chars_clone.next()?;
					match ch {
						'a'..='z' | 'A'..='Z' | '0'..='9' => {
							return self.complete(register, Some(VerbCmd(1, Verb::RecordMacro(ch))), None)
						}
						_ => return self.quit_parse()
					}
				}
				'@' => {
					let ch = chars_clone.next()?;
					match ch {
						'@' => return self.complete(register, Some(VerbCmd(count, Verb::PlayLastMacro)), None),
						'a'..='z' | 'A'..='Z' | '0'..='9' => {
							return self.complete(register, Some(VerbCmd(count, Verb::PlayMacro(ch))), None)
						}
						_ => return self.quit_parse()
					}
				}
				':' => {
					return self.complete(register, Some(VerbCmd(1, Verb::ExMode)), None)
				}
				'/' => {
					return self.complete(
						register,
						Some(VerbCmd(1, Verb::SearchMode(Direction::Forward))),
						None,
					)
				}
				'?' => {
					return self.complete(
						register,
						Some(VerbCmd(1, Verb::SearchMode(Direction::Backward))),
						None,
					)
				}
				_ => break 'verb_parse None
			}
		};

		let motion = 'motion_parse: {
			let mut chars_clone = chars.clone();
			let count_given = self.parse_count(&mut chars_clone);
			let count = count_given.unwrap_or(1);

			let Some(ch) = chars_clone.next() else {
				break 'motion_parse None
			};
			// Operator doubling: 'dd', 'cc', 'yy', '>>', '<<', '=='
			match (ch, &verb) {
				('d', Some(VerbCmd(_, Verb::Delete))) |
				('c', Some(VerbCmd(_, Verb::Change))) |
				('y', Some(VerbCmd(_, Verb::Yank))) |
				('>', Some(VerbCmd(_, Verb::Indent))) |
				('<', Some(VerbCmd(_, Verb::Dedent))) |
				('=', Some(VerbCmd(_, Verb::Equalize))) => {
					break 'motion_parse Some(MotionCmd(count, Motion::WholeLine))
				}
				_ => { /* Nothing special, continue */ }
			}
			match ch {
				'g' => {
					let Some(ch) = chars_clone.peek() else {
						break 'motion_parse None
					};
					match ch {
						'g' => {
							break 'motion_parse Some(match count_given {
								Some(n) => MotionCmd(1, Motion::GoToLine(n)),
								None => MotionCmd(count, Motion::BeginningOfBuffer),
							})
						}
						'e' => break 'motion_parse Some(MotionCmd(count, Motion::WordMotion(To::End, Word::Normal, Direction::Backward))),
						'E' => break 'motion_parse Some(MotionCmd(count, Motion::WordMotion(To::End, Word::Big, Direction::Backward))),
						'j' => break 'motion_parse Some(MotionCmd(count, Motion::LineDownCharwise)),
						'k' => break 'motion_parse Some(MotionCmd(count, Motion::LineUpCharwise)),
						_ => return self.quit_parse()
					}
				}
				'G' => {
					break 'motion_parse Some(match count_given {
						Some(n) => MotionCmd(1, Motion::GoToLine(n)),
						None => MotionCmd(1, Motion::EndOfBuffer),
					})
				}
				'f' => {
					let Some(ch) = chars_clone.peek() else {
						break 'motion_parse None
					};
					break 'motion_parse Some(MotionCmd(count, Motion::CharSearch(Direction::Forward, Dest::On, *ch)))
				}
				'F' => {
					let Some(ch) = chars_clone.peek() else {
						break 'motion_parse None
					};
					break 'motion_parse Some(MotionCmd(count, Motion::CharSearch(Direction::Backward, Dest::On, *ch)))
				}
				't' => {
					let Some(ch) = chars_clone.peek() else {
						break 'motion_parse None
					};
					break 'motion_parse Some(MotionCmd(count, Motion::CharSearch(Direction::Forward, Dest::Before, *ch)))
				}
				'T' => {
					let Some(ch) = chars_clone.peek() else {
						break 'motion_parse None
					};
					break 'motion_parse Some(MotionCmd(count, Motion::CharSearch(Direction::Backward, Dest::Before, *ch)))
				}
				'`' => {
					let Some(ch) = chars_clone.peek() else {
						break 'motion_parse None
					};
					break 'motion_parse Some(MotionCmd(1, Motion::ToMark(*ch)))
				}
				'\'' => {
					let Some(ch) = chars_clone.peek() else {
						break 'motion_parse None
					};
					break 'motion_parse Some(MotionCmd(1, Motion::ToMarkLine(*ch)))
				}
				';' => break 'motion_parse Some(MotionCmd(count, Motion::RepeatFind)),
				',' => break 'motion_parse Some(MotionCmd(count, Motion::RepeatFindRev)),
				'n' => break 'motion_parse Some(MotionCmd(count, Motion::NextMatch)),
				'N' => break 'motion_parse Some(MotionCmd(count, Motion::PrevMatch)),
				'%' => break 'motion_parse Some(MotionCmd(count, Motion::ToDelimMatch)),
				'|' => break 'motion_parse Some(MotionCmd(count, Motion::ToColumn)),
				'^' => break 'motion_parse Some(MotionCmd(count, Motion::BeginningOfFirstWord)),
				'0' => break 'motion_parse Some(MotionCmd(count, Motion::BeginningOfLine)),
				'$' => break 'motion_parse Some(MotionCmd(count, Motion::EndOfLine)),
				'k' => break 'motion_parse Some(MotionCmd(count, Motion::LineUp)),
				'j' => break 'motion_parse Some(MotionCmd(count, Motion::LineDown)),
				'h' => break 'motion_parse Some(MotionCmd(count, Motion::BackwardChar)),
				'l' => break 'motion_parse Some(MotionCmd(count, Motion::ForwardChar)),
				'w' => break 'motion_parse Some(MotionCmd(count, Motion::WordMotion(To::Start, Word::Normal, Direction::Forward))),
				'W' => break 'motion_parse Some(MotionCmd(count, Motion::WordMotion(To::Start, Word::Big, Direction::Forward))),
				'e' => break 'motion_parse Some(MotionCmd(count, Motion::WordMotion(To::End, Word::Normal, Direction::Forward))),
				'E' => break 'motion_parse Some(MotionCmd(count, Motion::WordMotion(To::End, Word::Big, Direction::Forward))),
				'b' => break 'motion_parse Some(MotionCmd(count, Motion::WordMotion(To::Start, Word::Normal, Direction::Backward))),
				'B' => break 'motion_parse Some(MotionCmd(count, Motion::WordMotion(To::Start, Word::Big, Direction::Backward))),
				'{' => break 'motion_parse Some(MotionCmd(count, Motion::Paragraph(Direction::Backward))),
				'}' => break 'motion_parse Some(MotionCmd(count, Motion::Paragraph(Direction::Forward))),
				'+' => break 'motion_parse Some(MotionCmd(count, Motion::LineDownToFirstNonBlank)),
				'-' => break 'motion_parse Some(MotionCmd(count, Motion::LineUpToFirstNonBlank)),
				'_' => break 'motion_parse Some(MotionCmd(count, Motion::FirstNonBlankDown)),
				'H' => break 'motion_parse Some(MotionCmd(1, Motion::ScreenTop)),
				'M' => break 'motion_parse Some(MotionCmd(1, Motion::ScreenMiddle)),
				'L' => break 'motion_parse Some(MotionCmd(1, Motion::ScreenBottom)),
				ch if ch == 'i' || ch == 'a' => {
					let bound = match ch {
						'i' => Bound::Inside,
						'a' => Bound::Around,
						_ => unreachable!()
					};
					if chars_clone.peek().is_none() {
						break 'motion_parse None
					}
					let obj = match chars_clone.next().unwrap() {
						'w' => TextObj::Word(Word::Normal, bound),
						'W' => TextObj::Word(Word::Big, bound),
						'"' => TextObj::DoubleQuote(bound),
						'\'' => TextObj::SingleQuote(bound),
						'`' => TextObj::BacktickQuote(bound),
						'(' | ')' | 'b' => TextObj::Paren(bound),
						'{' | '}' | 'B' => TextObj::Brace(bound),
						'[' | ']' => TextObj::Bracket(bound),
						'<' | '>' => TextObj::Angle(bound),
						_ => return self.quit_parse()
					};
					break 'motion_parse Some(MotionCmd(count, Motion::TextObj(obj)))
				}
				_ => return self.quit_parse(),
			}
		};

		let verb_ref = verb.as_ref().map(|v| &v.1);
		let motion_ref = motion.as_ref().map(|m| &m.1);

		match self.validate_combination(verb_ref, motion_ref) {
			CmdState::Complete => self.complete(register, verb, motion),
			CmdState::Pending => None,
			CmdState::Invalid => {
				self.pending_seq.clear();
				None
			}
		}
	}
}

impl ViMode for ViNormal {
	fn handle_key(&mut self, key: E) -> Option<ViCmd> {
		let mut cmd = match key {
			E(K::Char(ch), M::NONE) => self.try_parse(ch),
			E(K::Char('M'), M::CTRL) |
			E(K::Enter, M::NONE) => {
				self.clear_cmd();
				Some(ViCmd {
					motion: Some(MotionCmd(1, Motion::LineDownToFirstNonBlank)),
					..Default::default()
				})
			}
			E(K::Backspace, M::NONE) => {
				self.clear_cmd();
				Some(ViCmd {
					motion: Some(MotionCmd(1, Motion::BackwardChar)),
					..Default::default()
				})
			}
			E(K::Char('R'), M::CTRL) => {
				let mut chars = self.pending_seq.chars().peekable();
				let count = self.parse_count(&mut chars).unwrap_or(1);
				self.clear_cmd();
				Some(ViCmd {
					verb: Some(VerbCmd(count, Verb::Redo)),
					..Default::default()
				})
			}
			E(K::Char('V'), M::CTRL) => {
				self.clear_cmd();
				Some(ViCmd {
					verb: Some(VerbCmd(1, Verb::VisualModeBlock)),
					..Default::default()
				})
			}
			E(K::Char('O'), M::CTRL) => {
				self.clear_cmd();
				Some(ViCmd {
					verb: Some(VerbCmd(1, Verb::JumpBack)),
					..Default::default()
				})
			}
			E(K::Char('I'), M::CTRL) |
			E(K::Tab, M::NONE) => {
				self.clear_cmd();
				Some(ViCmd {
					verb: Some(VerbCmd(1, Verb::JumpForward)),
					..Default::default()
				})
			}
			E(K::Esc, M::NONE) => {
				self.clear_cmd();
				None
			}
			_ => {
				if let Some(cmd) = common_cmds(key) {
					self.clear_cmd();
					Some(cmd)
				} else {
					None
				}
			}
		};

		if let Some(cmd) = cmd.as_mut() {
			cmd.normalize_counts();
		};
		cmd
	}

	fn is_repeatable(&self) -> bool {
		false
	}

	fn as_replay(&self) -> Option<CmdReplay> {
		None
	}

	fn pending_seq(&self) -> Option<String> {
		Some(self.pending_seq.clone())
	}

	fn clamp_insert(&self) -> bool {
		false
	}

	fn report_mode(&self) -> Mode {
		Mode::Normal
	}
}
