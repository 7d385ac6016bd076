//! The `:` command line.
//!
//! `ViEx` collects the line; `parse_ex_cmd` turns it into an `ExCommand` the
//! dispatcher executes. Parse errors surface through `handle_key_fallible` and
//! become `E:`-prefixed status messages.

use std::iter::Peekable;
use std::path::PathBuf;
use std::str::Chars;

use bitflags::bitflags;
use itertools::Itertools;

use crate::event::Mode;
use crate::keys::{KeyCode as K, KeyEvent as E, ModKeys as M};
use crate::vicmd::{CmdFlags, Direction, LineAddr, Verb, VerbCmd, ViCmd};

use super::{CmdReplay, ViMode};

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct SubFlags: u16 {
		const GLOBAL         = 1 << 0; // g
		const CONFIRM        = 1 << 1; // c (parsed, UI-deferred)
		const IGNORE_CASE    = 1 << 2; // i
		const NO_IGNORE_CASE = 1 << 3; // I
	}
}

/// Which mode a `:map` variant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapTarget {
	Normal,
	Visual,
	Insert,
}

/// An inclusive ex address range. A single address has `start == end`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExRange {
	pub start: LineAddr,
	pub end: LineAddr,
}

/// A fully parsed ex command, ready for the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ExCommand {
	pub range: Option<ExRange>,
	pub kind: ExKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExKind {
	Quit { force: bool, all: bool },
	Write { path: Option<PathBuf>, quit: bool },
	EditFile(PathBuf),
	Set(String),
	ColorScheme(String),
	Syntax(bool),
	BufferNext,
	BufferPrev,
	BufferGo(usize),
	BufferDelete { force: bool },
	TabNew(Option<PathBuf>),
	TabNext,
	TabPrev,
	TabClose { force: bool },
	Split { vertical: bool },
	GoToLine,
	Substitute { pattern: String, replacement: String, flags: SubFlags },
	Map { target: MapTarget, lhs: String, rhs: String, noremap: bool },
}

/// Outcome of executing an ex command. Failures are non-fatal; the dispatcher
/// prefixes the message with `E:` and reports it as a status event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExResult {
	pub success: bool,
	pub message: Option<String>,
}

impl ExResult {
	pub fn ok() -> Self {
		Self { success: true, message: None }
	}
	pub fn msg(message: impl Into<String>) -> Self {
		Self { success: true, message: Some(message.into()) }
	}
	pub fn err(message: impl Into<String>) -> Self {
		Self { success: false, message: Some(message.into()) }
	}
}

/// The command-line mode itself: line editing plus submit.
#[derive(Clone, Debug)]
pub struct ViEx {
	pending_cmd: String,
	/// 1-based line range carried in from a visual selection
	visual_range: Option<(usize, usize)>,
}

impl ViEx {
	pub fn new(visual_range: Option<(usize, usize)>) -> Self {
		Self {
			pending_cmd: String::new(),
			visual_range,
		}
	}
}

impl ViMode for ViEx {
	// Ex parsing can fail, so the fallible entry point is the real one
	fn handle_key_fallible(&mut self, key: E) -> Result<Option<ViCmd>, String> {
		match key {
			E(K::Enter, M::NONE) => {
				let raw = std::mem::take(&mut self.pending_cmd);
				match parse_ex_cmd(&raw, self.visual_range) {
					Ok(Some(cmd)) => Ok(Some(ViCmd {
						verb: Some(VerbCmd(1, Verb::Ex(cmd))),
						flags: CmdFlags::EXIT_CUR_MODE,
						raw_seq: raw,
						..Default::default()
					})),
					Ok(None) => Ok(Some(ViCmd {
						verb: Some(VerbCmd(1, Verb::NormalMode)),
						flags: CmdFlags::EXIT_CUR_MODE,
						..Default::default()
					})),
					Err(e) => Err(e),
				}
			}
			E(K::Esc, M::NONE) => {
				Ok(Some(ViCmd {
					verb: Some(VerbCmd(1, Verb::NormalMode)),
					flags: CmdFlags::EXIT_CUR_MODE,
					..Default::default()
				}))
			}
			E(K::Backspace, M::NONE) => {
				if self.pending_cmd.pop().is_none() {
					return Ok(Some(ViCmd {
						verb: Some(VerbCmd(1, Verb::NormalMode)),
						flags: CmdFlags::EXIT_CUR_MODE,
						..Default::default()
					}))
				}
				Ok(None)
			}
			E(K::Char(ch), M::NONE) => {
				self.pending_cmd.push(ch);
				Ok(None)
			}
			E(K::Grapheme(g), M::NONE) => {
				self.pending_cmd.push_str(&g);
				Ok(None)
			}
			_ => Ok(None)
		}
	}

	fn handle_key(&mut self, key: E) -> Option<ViCmd> {
		self.handle_key_fallible(key).ok().flatten()
	}

	fn is_repeatable(&self) -> bool {
		false
	}

	fn as_replay(&self) -> Option<CmdReplay> {
		None
	}

	fn pending_seq(&self) -> Option<String> {
		Some(self.pending_cmd.clone())
	}

	fn set_pending(&mut self, line: String) {
		self.pending_cmd = line;
	}

	fn clamp_insert(&self) -> bool {
		false
	}

	fn report_mode(&self) -> Mode {
		Mode::Command
	}
}

/// Parse a full command line: `[range]cmd[!] [args]`.
pub fn parse_ex_cmd(raw: &str, visual_range: Option<(usize, usize)>) -> Result<Option<ExCommand>, String> {
	let raw = raw.trim();
	if raw.is_empty() {
		return Ok(None)
	}
	let mut chars = raw.chars().peekable();

	let mut range = parse_ex_address(&mut chars);
	if range.is_none() {
		range = visual_range.map(|(s, e)| ExRange {
			start: LineAddr::Number(s),
			end: LineAddr::Number(e),
		});
	}

	chars.peeking_take_while(|c| c.is_whitespace()).for_each(drop);

	if chars.peek().is_none() {
		// A bare range moves the cursor to its last line
		return match range {
			Some(range) => Ok(Some(ExCommand { range: Some(range), kind: ExKind::GoToLine })),
			None => Ok(None),
		}
	}

	let kind = parse_ex_kind(&mut chars)?;
	Ok(Some(ExCommand { range, kind }))
}

fn parse_ex_address(chars: &mut Peekable<Chars<'_>>) -> Option<ExRange> {
	if chars.peek() == Some(&'%') {
		chars.next();
		return Some(ExRange { start: LineAddr::Number(1), end: LineAddr::Last })
	}
	let mut chars_clone = chars.clone();
	let start = parse_one_addr(&mut chars_clone)?;
	if chars_clone.peek() == Some(&',') {
		chars_clone.next();
		match parse_one_addr(&mut chars_clone) {
			Some(end) => {
				*chars = chars_clone;
				Some(ExRange { start, end })
			}
			None => {
				*chars = chars_clone;
				Some(ExRange { start: start.clone(), end: start })
			}
		}
	} else {
		*chars = chars_clone;
		Some(ExRange { start: start.clone(), end: start })
	}
}

fn parse_one_addr(chars: &mut Peekable<Chars<'_>>) -> Option<LineAddr> {
	let first = *chars.peek()?;
	match first {
		'0'..='9' => {
			let digits: String = chars.peeking_take_while(|c| c.is_ascii_digit()).collect();
			digits.parse::<usize>().ok().map(LineAddr::Number)
		}
		'+' | '-' => {
			chars.next();
			let digits: String = chars.peeking_take_while(|c| c.is_ascii_digit()).collect();
			let n = digits.parse::<isize>().unwrap_or(1);
			let n = if first == '-' { -n } else { n };
			Some(LineAddr::Offset(n))
		}
		'/' | '?' => {
			chars.next();
			let mut pattern = String::new();
			while let Some(ch) = chars.next() {
				match ch {
					'\\' => {
						pattern.push('\\');
						if let Some(esc_ch) = chars.next() {
							pattern.push(esc_ch)
						}
					}
					_ if ch == first => break,
					_ => pattern.push(ch),
				}
			}
			let dir = if first == '/' { Direction::Forward } else { Direction::Backward };
			Some(LineAddr::Pattern(pattern, dir))
		}
		'.' => {
			chars.next();
			Some(LineAddr::Current)
		}
		'$' => {
			chars.next();
			Some(LineAddr::Last)
		}
		_ => None,
	}
}

fn parse_ex_kind(chars: &mut Peekable<Chars<'_>>) -> Result<ExKind, String> {
	let mut cmd_name = String::new();
	while let Some(ch) = chars.peek() {
		if *ch == '!' {
			cmd_name.push(*ch);
			chars.next();
			break
		} else if !ch.is_alphanumeric() {
			break
		}
		cmd_name.push(*ch);
		chars.next();
	}

	let (name, force) = match cmd_name.strip_suffix('!') {
		Some(stripped) => (stripped, true),
		None => (cmd_name.as_str(), false),
	};

	chars.peeking_take_while(|c| c.is_whitespace()).for_each(drop);
	let args: String = chars.collect();
	let args = args.trim().to_string();

	let kind = match name {
		"q" | "quit" => ExKind::Quit { force, all: false },
		"qa" | "qall" => ExKind::Quit { force, all: true },
		"w" | "write" => ExKind::Write {
			path: arg_path(&args),
			quit: false,
		},
		"wq" | "x" | "xit" => ExKind::Write {
			path: arg_path(&args),
			quit: true,
		},
		"e" | "edit" => match arg_path(&args) {
			Some(path) => ExKind::EditFile(path),
			None => return Err("No file name".into()),
		},
		"set" | "se" => ExKind::Set(args),
		"colorscheme" | "colo" => ExKind::ColorScheme(args),
		"syntax" | "syn" => match args.as_str() {
			"on" => ExKind::Syntax(true),
			"off" => ExKind::Syntax(false),
			_ => return Err(format!("Invalid argument: {args}")),
		},
		"bn" | "bnext" => ExKind::BufferNext,
		"bp" | "bprev" | "bprevious" => ExKind::BufferPrev,
		"b" | "buffer" => match args.parse::<usize>() {
			Ok(n) => ExKind::BufferGo(n),
			Err(_) => return Err(format!("Invalid argument: {args}")),
		},
		"bd" | "bdelete" => ExKind::BufferDelete { force },
		"tabnew" | "tabedit" | "tabe" => ExKind::TabNew(arg_path(&args)),
		"tabn" | "tabnext" => ExKind::TabNext,
		"tabp" | "tabprev" | "tabprevious" => ExKind::TabPrev,
		"tabc" | "tabclose" => ExKind::TabClose { force },
		"split" | "sp" | "new" => ExKind::Split { vertical: false },
		"vsplit" | "vs" | "vnew" => ExKind::Split { vertical: true },
		"s" | "su" | "sub" | "substitute" => return parse_substitute(&args),
		"nmap" => map_kind(MapTarget::Normal, false, &args)?,
		"nnoremap" => map_kind(MapTarget::Normal, true, &args)?,
		"vmap" => map_kind(MapTarget::Visual, false, &args)?,
		"vnoremap" => map_kind(MapTarget::Visual, true, &args)?,
		"imap" => map_kind(MapTarget::Insert, false, &args)?,
		"inoremap" => map_kind(MapTarget::Insert, true, &args)?,
		"map" => map_kind(MapTarget::Normal, false, &args)?,
		"noremap" => map_kind(MapTarget::Normal, true, &args)?,
		_ => return Err(format!("Not an editor command: {cmd_name}")),
	};
	Ok(kind)
}

fn arg_path(args: &str) -> Option<PathBuf> {
	if args.is_empty() {
		None
	} else {
		Some(PathBuf::from(args))
	}
}

fn map_kind(target: MapTarget, noremap: bool, args: &str) -> Result<ExKind, String> {
	let mut parts = args.splitn(2, char::is_whitespace);
	let lhs = parts.next().unwrap_or_default().trim();
	let rhs = parts.next().unwrap_or_default().trim();
	if lhs.is_empty() || rhs.is_empty() {
		return Err("Argument required".into())
	}
	Ok(ExKind::Map {
		target,
		lhs: lhs.to_string(),
		rhs: rhs.to_string(),
		noremap,
	})
}

/// `s/pat/repl/[gicI]`. `tail` starts at the delimiter.
fn parse_substitute(tail: &str) -> Result<ExKind, String> {
	let mut chars = tail.chars().peekable();
	let Some(delimiter) = chars.next() else {
		return Err("Pattern required".into())
	};
	if delimiter.is_alphanumeric() || delimiter.is_whitespace() {
		return Err("Pattern required".into())
	}
	let pattern = parse_pattern(&mut chars, delimiter)?;
	let replacement = parse_pattern(&mut chars, delimiter).unwrap_or_default();
	let mut flags = SubFlags::empty();
	for ch in chars {
		match ch {
			'g' => flags |= SubFlags::GLOBAL,
			'c' => flags |= SubFlags::CONFIRM,
			'i' => flags |= SubFlags::IGNORE_CASE,
			'I' => flags |= SubFlags::NO_IGNORE_CASE,
			ch if ch.is_whitespace() => break,
			_ => return Err(format!("Invalid flag: {ch}")),
		}
	}
	Ok(ExKind::Substitute { pattern, replacement, flags })
}

/// Collect text up to an unescaped `delimiter`. A missing closing delimiter is
/// fine for the final field (`:s/foo/bar`).
fn parse_pattern(chars: &mut Peekable<Chars<'_>>, delimiter: char) -> Result<String, String> {
	let mut pat = String::new();
	while let Some(ch) = chars.next() {
		match ch {
			'\\' => {
				if chars.peek() == Some(&delimiter) {
					pat.push(chars.next().unwrap());
				} else {
					pat.push(ch);
					if let Some(esc_ch) = chars.next() {
						pat.push(esc_ch)
					}
				}
			}
			_ if ch == delimiter => break,
			_ => pat.push(ch),
		}
	}
	Ok(pat)
}
