use std::iter::Peekable;
use std::str::Chars;

use crate::cursor::SelectKind;
use crate::event::Mode;
use crate::keys::{KeyCode as K, KeyEvent as E, ModKeys as M};
use crate::register::RegisterName;
use crate::vicmd::{Anchor, Bound, Dest, Direction, Motion, MotionCmd, TextObj, To, Verb, VerbCmd, ViCmd, Word};

use super::{common_cmds, CmdReplay, CmdState, ViMode};

/// The visual-mode parser. Same accumulator scheme as normal mode, but
/// operators complete immediately against the active selection, and text
/// objects are valid without an operator (they reshape the selection).
#[derive(Debug)]
pub struct ViVisual {
	pending_seq: String,
	kind: SelectKind,
}

impl ViVisual {
	pub fn new(kind: SelectKind) -> Self {
		Self { pending_seq: String::new(), kind }
	}
	pub fn kind(&self) -> SelectKind {
		self.kind
	}
	pub fn clear_cmd(&mut self) {
		self.pending_seq = String::new();
	}
	pub fn take_cmd(&mut self) -> String {
		std::mem::take(&mut self.pending_seq)
	}
	fn validate_combination(&self, verb: Option<&Verb>, motion: Option<&Motion>) -> CmdState {
		match (verb, motion) {
			(None, Some(_)) => CmdState::Complete,
			(None, None) => CmdState::Pending,
			(Some(_), _) => CmdState::Complete,
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

		let register = 'reg_parse: {
			let mut chars_clone = chars.clone();

			let Some('"') = chars_clone.next() else {
				break 'reg_parse RegisterName::default()
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
			RegisterName::new(Some(reg_name))
		};

		/*
		 * Operators act on the selection and complete immediately. Everything
		 * else falls through to the motion parse, which moves the selection
		 * head.
		 */
		'verb_parse: {
			let mut chars_clone = chars.clone();
			let count = self.parse_count(&mut chars_clone).unwrap_or(1);

			let Some(ch) = chars_clone.next() else {
				break 'verb_parse
			};
			match ch {
				'd' | 'x' => {
					return self.complete(register, Some(VerbCmd(1, Verb::Delete)), None)
				}
				'c' | 's' => {
					return self.complete(register, Some(VerbCmd(1, Verb::Change)), None)
				}
				'y' => {
					return self.complete(register, Some(VerbCmd(1, Verb::Yank)), None)
				}
				'>' => {
					return self.complete(register, Some(VerbCmd(count, Verb::Indent)), None)
				}
				'<' => {
					return self.complete(register, Some(VerbCmd(count, Verb::Dedent)), None)
				}
				'=' => {
					return self.complete(register, Some(VerbCmd(1, Verb::Equalize)), None)
				}
				'p' | 'P' => {
					return self.complete(register, Some(VerbCmd(1, Verb::Put(Anchor::Before))), None)
				}
				'r' => {
					let ch = chars_clone.next()?;
					return self.complete(register, Some(VerbCmd(1, Verb::ReplaceChar(ch))), None)
				}
				'J' => {
					return self.complete(register, Some(VerbCmd(1, Verb::JoinLines)), None)
				}
				'o' | 'O' => {
					return self.complete(register, Some(VerbCmd(1, Verb::SwapVisualAnchor)), None)
				}
				'I' => {
					return self.complete(register, Some(VerbCmd(1, Verb::InsertMode)), None)
				}
				'A' => {
					return self.complete(
						register,
						Some(VerbCmd(1, Verb::InsertMode)),
						Some(MotionCmd(1, Motion::ForwardChar)),
					)
				}
				'v' => {
					return self.complete(register, Some(VerbCmd(1, Verb::VisualMode)), None)
				}
				'V' => {
					return self.complete(register, Some(VerbCmd(1, Verb::VisualModeLine)), None)
				}
				':' => {
					return self.complete(register, Some(VerbCmd(1, Verb::ExMode)), None)
				}
				_ => break 'verb_parse
			}
		};

		let motion = 'motion_parse: {
			let mut chars_clone = chars.clone();
			let count_given = self.parse_count(&mut chars_clone);
			let count = count_given.unwrap_or(1);

			let Some(ch) = chars_clone.next() else {
				break 'motion_parse None
			};
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
				'k' => break 'motion_parse Some(MotionCmd(count, Motion::LineUpCharwise)),
				'j' => break 'motion_parse Some(MotionCmd(count, Motion::LineDownCharwise)),
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

		let motion_ref = motion.as_ref().map(|m| &m.1);

		match self.validate_combination(None, motion_ref) {
			CmdState::Complete => self.complete(register, None, motion),
			CmdState::Pending => None,
			CmdState::Invalid => {
				self.pending_seq.clear();
				None
			}
		}
	}
}

impl ViMode for ViVisual {
	fn handle_key(&mut self, key: E) -> Option<ViCmd> {
		let mut cmd = match key {
			E(K::Char(ch), M::NONE) => self.try_parse(ch),
			E(K::Char('V'), M::CTRL) => {
				self.clear_cmd();
				Some(ViCmd {
					verb: Some(VerbCmd(1, Verb::VisualModeBlock)),
					..Default::default()
				})
			}
			E(K::Esc, M::NONE) => {
				self.clear_cmd();
				Some(ViCmd {
					verb: Some(VerbCmd(1, Verb::NormalMode)),
					..Default::default()
				})
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
		match self.kind {
			SelectKind::Char => Mode::Visual,
			SelectKind::Line => Mode::VisualLine,
			SelectKind::Block => Mode::VisualBlock,
		}
	}
}
