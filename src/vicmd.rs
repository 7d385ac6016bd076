//! The vocabulary of parsed commands.
//!
//! Parsing happens in the `modes` module; this module holds the structs and
//! enums. `ViCmd` is the unit of work the dispatcher executes: an optional
//! verb, an optional motion, a register, and execution flags.

use bitflags::bitflags;

use crate::cursor::Selection;
use crate::event::ViewportAlign;
use crate::modes::ex::ExCommand;
use crate::register::RegisterName;

bitflags! {
	#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct CmdFlags: u32 {
		/// Return to normal mode after executing, e.g. Enter in ex or search mode
		const EXIT_CUR_MODE = 1<<0;
	}
}

/// A parsed Vim command.
///
/// `raw_seq` preserves the keystrokes that produced the command, which is what
/// macro registers and the pending-command display consume.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct ViCmd {
	pub register: RegisterName,
	pub verb: Option<VerbCmd>,
	pub motion: Option<MotionCmd>,
	pub raw_seq: String,
	pub flags: CmdFlags,
}

impl ViCmd {
	pub fn new() -> Self {
		Self::default()
	}
	pub fn set_verb(&mut self, verb: VerbCmd) {
		self.verb = Some(verb)
	}
	pub fn set_motion(&mut self, motion: MotionCmd) {
		self.motion = Some(motion)
	}
	pub fn verb(&self) -> Option<&VerbCmd> {
		self.verb.as_ref()
	}
	pub fn motion(&self) -> Option<&MotionCmd> {
		self.motion.as_ref()
	}
	pub fn verb_count(&self) -> usize {
		self.verb.as_ref().map(|v| v.0).unwrap_or(1)
	}
	pub fn motion_count(&self) -> usize {
		self.motion.as_ref().map(|m| m.0).unwrap_or(1)
	}
	/// Fold the verb count into the motion count, so `2d3w` executes as `d6w`.
	/// Always applied when a command finishes parsing.
	pub fn normalize_counts(&mut self) {
		let Some(verb) = self.verb.as_mut() else { return };
		let Some(motion) = self.motion.as_mut() else { return };
		let VerbCmd(v_count, _) = verb;
		let MotionCmd(m_count, _) = motion;
		let product = *v_count * *m_count;
		verb.0 = 1;
		motion.0 = product;
	}
	pub fn is_repeatable(&self) -> bool {
		self.verb.as_ref().is_some_and(|v| v.1.is_repeatable())
	}
	pub fn is_cmd_repeat(&self) -> bool {
		self.verb.as_ref().is_some_and(|v| matches!(v.1, Verb::RepeatLast))
	}
	pub fn is_char_search(&self) -> bool {
		self.motion.as_ref().is_some_and(|m| matches!(m.1, Motion::CharSearch(..)))
	}
	pub fn is_mode_transition(&self) -> bool {
		self.verb.as_ref().is_some_and(|v| {
			matches!(v.1,
				Verb::Change |
				Verb::InsertMode |
				Verb::InsertModeLineBreak(_) |
				Verb::NormalMode |
				Verb::ReplaceMode |
				Verb::VisualMode |
				Verb::VisualModeLine |
				Verb::VisualModeBlock |
				Verb::ExMode |
				Verb::SearchMode(_)
			)
		})
	}
}

/// A count, and a `Verb`
#[derive(Clone, Debug, PartialEq)]
pub struct VerbCmd(pub usize, pub Verb);

/// A count, and a `Motion`
#[derive(Clone, Debug, PartialEq)]
pub struct MotionCmd(pub usize, pub Motion);

/// Everything a command can *do*. Operators (`Delete`, `Yank`, ...) consume a
/// motion; standalone actions carry their own effect.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Verb {
	Delete,
	Change,
	Yank,
	Indent,
	Dedent,
	Equalize,
	Put(Anchor),
	/// Overwrite in replace mode
	ReplaceChar(char),
	/// `r{c}`: replace n chars in place
	ReplaceCharInplace(char, u16),
	/// `~`: toggle case of n chars
	ToggleCaseInplace(u16),
	JoinLines,
	InsertChar(char),
	Insert(String),
	Undo,
	Redo,
	RepeatLast,
	InsertMode,
	InsertModeLineBreak(Anchor),
	NormalMode,
	ReplaceMode,
	VisualMode,
	VisualModeLine,
	VisualModeBlock,
	SwapVisualAnchor,
	ExMode,
	SearchMode(Direction),
	SetMark(char),
	RecordMacro(char),
	PlayMacro(char),
	PlayLastMacro,
	JumpBack,
	JumpForward,
	ViewportAlign(ViewportAlign),
	NextTab,
	PrevTab,
	GoToDefinition,
	AcceptLineOrNewline,
	Ex(ExCommand),
}

impl Verb {
	/// Verbs `.` will replay when stored as a single command. Insert sessions
	/// are captured separately as a command-list replay.
	pub fn is_repeatable(&self) -> bool {
		matches!(self,
			Self::Delete |
			Self::ReplaceCharInplace(_, _) |
			Self::ToggleCaseInplace(_) |
			Self::Put(_) |
			Self::JoinLines |
			Self::Indent |
			Self::Dedent |
			Self::Equalize
		)
	}
	pub fn is_edit(&self) -> bool {
		matches!(self,
			Self::Delete |
			Self::Change |
			Self::ReplaceChar(_) |
			Self::ReplaceCharInplace(_, _) |
			Self::ToggleCaseInplace(_) |
			Self::Put(_) |
			Self::JoinLines |
			Self::InsertChar(_) |
			Self::Insert(_) |
			Self::Indent |
			Self::Dedent |
			Self::Equalize
		)
	}
}

/// Cursor targets. Parsed in `modes`, resolved against the buffer in `motion`.
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
	/// Operator doubling (`dd`, `yy`, ...): the whole current line, count lines down
	WholeLine,
	BackwardChar,
	ForwardChar,
	/// Can cross line boundaries
	BackwardCharForced,
	/// Can cross line boundaries
	ForwardCharForced,
	LineUp,
	LineDown,
	/// `gk`/`gj`: same targets, charwise classification
	LineUpCharwise,
	LineDownCharwise,
	BeginningOfLine,
	BeginningOfFirstWord,
	EndOfLine,
	WordMotion(To, Word, Direction),
	CharSearch(Direction, Dest, char),
	/// `;` / `,`
	RepeatFind,
	RepeatFindRev,
	/// `n` / `N`
	NextMatch,
	PrevMatch,
	/// Committed search pattern from `/` or `?`
	PatternSearch(String, Direction),
	BeginningOfBuffer,
	EndOfBuffer,
	/// 1-based absolute line, from counted `G`/`gg`
	GoToLine(usize),
	/// `{` / `}`
	Paragraph(Direction),
	/// `%`
	ToDelimMatch,
	/// `|`
	ToColumn,
	/// `+`
	LineDownToFirstNonBlank,
	/// `-`
	LineUpToFirstNonBlank,
	/// `_`
	FirstNonBlankDown,
	/// `H`/`M`/`L`; the core has no viewport, so these use fixed line offsets
	ScreenTop,
	ScreenMiddle,
	ScreenBottom,
	/// `` `{mark} ``
	ToMark(char),
	/// `'{mark}`
	ToMarkLine(char),
	TextObj(TextObj),
	/// Ex addresses
	Line(LineAddr),
	LineRange(LineAddr, LineAddr),
	/// A stored visual span, used when repeating a visual-mode operator
	Range(Selection),
	Null,
}

/// Apply a verb before, or after the target. Used by `p`/`P` and `o`/`O`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Anchor {
	After,
	Before,
}

/// Text objects, valid only inside an operator or visual context.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TextObj {
	/// `iw`, `aw`, `iW`, `aW`
	Word(Word, Bound),
	/// `i"`, `a"`
	DoubleQuote(Bound),
	/// `i'`, `a'`
	SingleQuote(Bound),
	/// `` i` ``, `` a` ``
	BacktickQuote(Bound),
	/// `i)`, `a)`
	Paren(Bound),
	/// `i]`, `a]`
	Bracket(Bound),
	/// `i}`, `a}`
	Brace(Bound),
	/// `i<`, `a<`
	Angle(Bound),
}

/// Line addresses used by ex mode.
#[derive(Debug, Clone, PartialEq)]
pub enum LineAddr {
	/// 1-based
	Number(usize),
	Current,
	Last,
	Offset(isize),
	Pattern(String, Direction),
}

/// Word sizes for motions like `w` and `B`.
///
/// `Word::Big` counts any span of non-whitespace as a word; `Word::Normal`
/// distinguishes alphanumeric-underscore runs from symbol runs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Word {
	Big,
	Normal,
}

/// Whether a text object takes the inside of its delimiters or the whole thing.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Bound {
	Inside,
	Around,
}

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Direction {
	#[default]
	Forward,
	Backward,
}

/// Target destination for char search motions: `f` lands on the char, `t` one
/// before it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Dest {
	On,
	Before,
}

/// Word motion target: the start of a word (`w`, `b`) or its end (`e`, `ge`).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum To {
	Start,
	End,
}
