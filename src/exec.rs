//! The execution dispatcher: `ViEngine`, the central container for state.
//!
//! Everything that moves through the engine passes through `ViEngine` at some
//! point. It routes keys to the active mode's parser, executes the commands
//! that come back against the buffer, and collects the semantic events each
//! key produced. `process_key` is the sole entry point for state mutation:
//! single-threaded, synchronous, returning a complete ordered event list.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use regex::Regex;

use crate::buffer::{grapheme_len, TextBuffer};
use crate::capability::{ClipboardProvider, FileIo, NoFileIo, NoopClipboard};
use crate::cursor::{CursorPosition, SelectKind, Selection};
use crate::event::{Mode, ViEvent};
use crate::jumps::{JumpList, Marks};
use crate::keys::{KeyCode as K, KeyEvent, ModKeys as M};
use crate::mappings::{MapMatch, MapMode, MapSet};
use crate::modes::ex::{ExCommand, ExKind, ExRange, ExResult, MapTarget, SubFlags, ViEx};
use crate::modes::insert::ViInsert;
use crate::modes::normal::ViNormal;
use crate::modes::replace::ViReplace;
use crate::modes::search::ViSearch;
use crate::modes::visual::ViVisual;
use crate::modes::{CmdReplay, ViMode};
use crate::motion::{self, MotionContext, MotionEval, MotionFlavor, SearchState};
use crate::options::Options;
use crate::register::{RegisterContent, RegisterName, Registers};
use crate::undo::{UndoManager, UndoState};
use crate::vicmd::{Anchor, Dest, Direction, Motion, MotionCmd, Verb, VerbCmd, ViCmd};

/// Guard against self-referential macros: `@a` inside register `a`.
const MAX_REPLAY_DEPTH: usize = 100;
/// Hard ceiling on keys replayed per `process_key` call.
const MAX_REPLAY_STEPS: usize = 100_000;

/// An operator's resolved target range.
#[derive(Clone, Debug, PartialEq)]
enum OpRange {
	/// Charwise, end-exclusive; may span lines
	Char { start: CursorPosition, end: CursorPosition },
	/// Linewise, inclusive
	Lines { start: usize, end: usize },
	/// Blockwise: per-line `(line, start_col, end_col)` windows, end-exclusive
	Block { windows: Vec<(usize, usize, usize)> },
}

pub struct ViEngine {
	buffer: TextBuffer,
	cursor: CursorPosition,
	mode: Box<dyn ViMode>,
	selection: Option<Selection>,
	registers: Registers,
	undo: UndoManager,
	marks: Marks,
	jumps: JumpList,
	options: Options,
	mappings: MapSet,
	clipboard: Box<dyn ClipboardProvider>,
	file_io: Box<dyn FileIo>,
	file_path: Option<PathBuf>,

	events: Vec<ViEvent>,
	text_changed: bool,

	preferred_col: Option<usize>,
	last_find: Option<(Direction, Dest, char)>,
	last_search: Option<SearchState>,
	search_origin: Option<CursorPosition>,

	repeat_action: Option<CmdReplay>,
	replaying: bool,

	recording: Option<(char, Vec<KeyEvent>)>,
	macros: HashMap<char, Vec<KeyEvent>>,
	last_played: Option<char>,
	replay_depth: usize,
	replay_steps: usize,

	ex_history: Vec<String>,
	search_history: Vec<String>,
	hist_cursor: Option<usize>,
	hist_stash: String,

	map_pending: String,
	maps_disabled: bool,
}

impl Default for ViEngine {
	fn default() -> Self {
		Self::new()
	}
}

impl ViEngine {
	pub fn new() -> Self {
		Self {
			buffer: TextBuffer::new(),
			cursor: CursorPosition::origin(),
			mode: Box::new(ViNormal::new()),
			selection: None,
			registers: Registers::new(),
			undo: UndoManager::new(),
			marks: Marks::new(),
			jumps: JumpList::new(),
			options: Options::default(),
			mappings: MapSet::new(),
			clipboard: Box::new(NoopClipboard),
			file_io: Box::new(NoFileIo),
			file_path: None,
			events: vec![],
			text_changed: false,
			preferred_col: None,
			last_find: None,
			last_search: None,
			search_origin: None,
			repeat_action: None,
			replaying: false,
			recording: None,
			macros: HashMap::new(),
			last_played: None,
			replay_depth: 0,
			replay_steps: 0,
			ex_history: vec![],
			search_history: vec![],
			hist_cursor: None,
			hist_stash: String::new(),
			map_pending: String::new(),
			maps_disabled: false,
		}
	}

	pub fn with_text(text: &str) -> Self {
		let mut engine = Self::new();
		engine.buffer = TextBuffer::from_text(text);
		engine
	}

	pub fn set_clipboard(&mut self, clipboard: Box<dyn ClipboardProvider>) {
		self.clipboard = clipboard;
	}

	pub fn set_file_io(&mut self, file_io: Box<dyn FileIo>) {
		self.file_io = file_io;
	}

	pub fn set_file_path(&mut self, path: Option<PathBuf>) {
		self.file_path = path;
	}

	pub fn file_path(&self) -> Option<&Path> {
		self.file_path.as_deref()
	}

	pub fn mode(&self) -> Mode {
		self.mode.report_mode()
	}

	pub fn cursor(&self) -> CursorPosition {
		self.cursor
	}

	pub fn selection(&self) -> Option<Selection> {
		self.selection
	}

	pub fn text(&self) -> String {
		self.buffer.text()
	}

	pub fn buffer(&self) -> &TextBuffer {
		&self.buffer
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	pub fn options_mut(&mut self) -> &mut Options {
		&mut self.options
	}

	pub fn registers(&self) -> &Registers {
		&self.registers
	}

	/// Replace the buffer contents wholesale. Undo history, marks and the
	/// selection are discarded, as with a file load.
	pub fn set_text(&mut self, text: &str) {
		self.buffer = TextBuffer::from_text(text);
		self.cursor = CursorPosition::origin();
		self.undo.clear();
		self.marks.clear();
		self.selection = None;
		self.mode = Box::new(ViNormal::new());
	}

	/// Load a file through the injected `FileIo` capability. Clears undo
	/// history per the buffer lifecycle contract.
	pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), String> {
		let path = path.as_ref();
		let text = self
			.file_io
			.read_to_string(path)
			.map_err(|e| format!("Cannot open file {}: {e}", path.display()))?;
		self.set_text(&text);
		self.file_path = Some(path.to_path_buf());
		Ok(())
	}

	/// The sole entry point: feed one key, drain the events it produced.
	///
	/// Named keys (`"Escape"`, `"Return"`, `"Back"`, ...), raw control bytes
	/// and plain graphemes are all accepted; modifiers arrive as flags.
	pub fn process_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool) -> Vec<ViEvent> {
		let key = KeyEvent::from_host(key, ctrl, shift, alt);
		trace!("key: {key:?}");
		self.events.clear();
		self.text_changed = false;
		self.replay_steps = 0;
		let entry_cursor = self.cursor;

		self.handle_key_event(key);

		self.finish_call(entry_cursor)
	}

	/// Convenience for hosts and tests: feed each grapheme of `keys` as an
	/// unmodified key press and collect all events.
	pub fn process_keys(&mut self, keys: &str) -> Vec<ViEvent> {
		use unicode_segmentation::UnicodeSegmentation;
		let mut all = vec![];
		for g in keys.graphemes(true).collect::<Vec<_>>() {
			all.extend(self.process_key(g, false, false, false));
		}
		all
	}

	fn finish_call(&mut self, entry_cursor: CursorPosition) -> Vec<ViEvent> {
		self.cursor = self.buffer.clamp_cursor(self.cursor, self.mode.clamp_insert());
		if self.text_changed {
			self.events.push(ViEvent::TextChanged);
		}
		if self.text_changed || self.cursor != entry_cursor {
			self.events.push(ViEvent::CursorMoved(self.cursor));
		}
		self.text_changed = false;
		std::mem::take(&mut self.events)
	}

	fn emit(&mut self, event: ViEvent) {
		self.events.push(event);
	}

	fn mark_text_changed(&mut self) {
		self.text_changed = true;
	}

	fn in_visual(&self) -> bool {
		matches!(
			self.mode.report_mode(),
			Mode::Visual | Mode::VisualLine | Mode::VisualBlock
		)
	}

	fn in_cmdline(&self) -> bool {
		matches!(
			self.mode.report_mode(),
			Mode::Command | Mode::SearchForward | Mode::SearchBackward
		)
	}

	fn handle_key_event(&mut self, key: KeyEvent) {
		// Macro recording: the stopping `q` is intercepted before the parser
		// ever sees it; every other key is captured verbatim
		if self.recording.is_some() {
			let parser_idle = self
				.mode
				.pending_seq()
				.map(|s| s.is_empty())
				.unwrap_or(true);
			let is_stop = self.mode.report_mode() == Mode::Normal
				&& parser_idle
				&& key == KeyEvent(K::Char('q'), M::NONE);
			if is_stop {
				if let Some((reg, keys)) = self.recording.take() {
					debug!("macro recorded: @{reg} ({} keys)", keys.len());
					self.macros.insert(reg, keys);
				}
				return;
			}
			if let Some((_, keys)) = self.recording.as_mut() {
				keys.push(key.clone());
			}
		}

		// Command-line history recall
		if self.in_cmdline() {
			match key {
				KeyEvent(K::Up, _) => return self.history_scroll(true),
				KeyEvent(K::Down, _) => return self.history_scroll(false),
				_ => self.hist_cursor = None,
			}
		}

		// Remap expansion: a pre-step that rewrites input before the parser.
		// Only normal mode accumulates; prefix ambiguity is resolved by the
		// mapping trie.
		if !self.maps_disabled
			&& self.mode.report_mode() == Mode::Normal
			&& self.mappings.has_mappings(MapMode::Normal)
			&& self
				.mode
				.pending_seq()
				.map(|s| s.is_empty())
				.unwrap_or(true)
		{
			if let KeyEvent(K::Char(ch), mods) = &key {
				if *mods == M::NONE {
					self.map_pending.push(*ch);
					match self.mappings.lookup(MapMode::Normal, &self.map_pending) {
						MapMatch::Full { rhs, noremap } => {
							self.map_pending.clear();
							self.feed_keys(&rhs, noremap);
							return;
						}
						MapMatch::Prefix => return,
						MapMatch::None => {
							let held = std::mem::take(&mut self.map_pending);
							self.maps_disabled = true;
							for ch in held.chars() {
								let mut buf = [0u8; 4];
								self.dispatch_key(KeyEvent::new(ch.encode_utf8(&mut buf), M::NONE));
							}
							self.maps_disabled = false;
							return;
						}
					}
				}
			}
		}

		self.dispatch_key(key);
	}

	fn feed_keys(&mut self, keys: &str, noremap: bool) {
		use unicode_segmentation::UnicodeSegmentation;
		if noremap {
			self.maps_disabled = true;
		}
		for g in keys.graphemes(true).collect::<Vec<_>>() {
			self.dispatch_key(KeyEvent::new(g, M::NONE));
		}
		self.maps_disabled = false;
	}

	fn dispatch_key(&mut self, key: KeyEvent) {
		match self.mode.handle_key_fallible(key) {
			Err(msg) => {
				self.emit(ViEvent::StatusMessage(format!("E: {msg}")));
				self.set_normal_mode();
			}
			Ok(None) => {}
			Ok(Some(cmd)) => {
				let exit = cmd.flags.contains(crate::vicmd::CmdFlags::EXIT_CUR_MODE);
				if let Err(msg) = self.exec_cmd(cmd) {
					self.emit(ViEvent::StatusMessage(format!("E: {msg}")));
				}
				if exit && self.mode.report_mode() != Mode::Normal {
					self.set_normal_mode();
				}
			}
		}

		// Reactive command-line events
		match self.mode.report_mode() {
			Mode::Command => {
				let pending = self.mode.pending_seq().unwrap_or_default();
				self.emit(ViEvent::CommandLineChanged(format!(":{pending}")));
			}
			Mode::SearchForward | Mode::SearchBackward => {
				let pending = self.mode.pending_seq().unwrap_or_default();
				let prompt = if self.mode.report_mode() == Mode::SearchForward { '/' } else { '?' };
				self.emit(ViEvent::CommandLineChanged(format!("{prompt}{pending}")));
				self.incsearch_preview();
			}
			_ => {}
		}
	}

	/// Execute one parsed command. The routing mirrors the command's shape:
	/// mode transitions, the `.` repeat, then plain verb/motion execution.
	pub fn exec_cmd(&mut self, cmd: ViCmd) -> Result<(), String> {
		trace!("exec: {cmd:?}");
		if cmd.is_mode_transition() {
			return self.handle_mode_transition(cmd);
		}
		if cmd.is_cmd_repeat() {
			return self.handle_cmd_repeat(cmd);
		}

		if cmd.is_repeatable() && !self.replaying {
			let mut stored = cmd.clone();
			if self.in_visual() {
				// The selection is gone by the time `.` runs, so freeze it
				// into the stored command
				if let Some(sel) = self.selection {
					stored.motion = Some(MotionCmd(1, Motion::Range(sel)));
				}
			}
			self.repeat_action = Some(CmdReplay::single(stored));
		}
		if cmd.is_char_search() {
			if let Some(MotionCmd(_, Motion::CharSearch(dir, dest, ch))) = cmd.motion {
				self.last_find = Some((dir, dest, ch));
			}
		}

		let result = match cmd.verb.clone() {
			Some(VerbCmd(count, verb)) => self.exec_verb(verb, count, &cmd),
			None => self.exec_motion_only(&cmd),
		};

		// Operators on a visual selection finish the visual session
		if self.in_visual()
			&& cmd
				.verb()
				.is_some_and(|v| v.1.is_edit() || matches!(v.1, Verb::Yank))
		{
			self.set_normal_mode();
		}
		result
	}

	fn exec_motion_only(&mut self, cmd: &ViCmd) -> Result<(), String> {
		let Some(mcmd) = cmd.motion.clone() else {
			return Ok(())
		};
		let pre_display = motion::display_col(self.buffer.line(self.cursor.line), self.cursor.col);
		let eval = motion::evaluate(&self.buffer, self.cursor, None, &mcmd, &self.motion_ctx(false, self.mode.clamp_insert()));

		let Some(eval) = eval else {
			if matches!(mcmd.1, Motion::NextMatch | Motion::PrevMatch) {
				let pat = self
					.last_search
					.as_ref()
					.map(|s| s.pattern.clone())
					.unwrap_or_default();
				self.emit(ViEvent::StatusMessage(format!("Pattern not found: {pat}")));
			}
			return Ok(())
		};

		if is_jump_motion(&mcmd.1) {
			self.jumps.add(self.cursor);
		}

		match eval {
			MotionEval::Target { pos, .. } => {
				self.cursor = pos;
			}
			MotionEval::Span { start, end, .. } => {
				// A text object in visual mode reshapes the selection
				if self.in_visual() && matches!(mcmd.1, Motion::TextObj(_)) {
					if let Some(sel) = self.selection.as_mut() {
						sel.anchor = start;
						sel.head = end;
					}
					self.cursor = end;
				} else {
					self.cursor = start;
				}
			}
		}

		match mcmd.1 {
			Motion::LineUp | Motion::LineDown | Motion::LineUpCharwise | Motion::LineDownCharwise => {
				if self.preferred_col.is_none() {
					self.preferred_col = Some(pre_display);
				}
			}
			Motion::EndOfLine => self.preferred_col = Some(usize::MAX),
			_ => self.preferred_col = None,
		}

		if self.in_visual() {
			if let Some(sel) = self.selection.as_mut() {
				if !matches!(mcmd.1, Motion::TextObj(_)) {
					sel.head = self.cursor;
				}
				let sel = *sel;
				self.emit(ViEvent::SelectionChanged(Some(sel)));
			}
		}
		Ok(())
	}

	fn exec_verb(&mut self, verb: Verb, count: usize, cmd: &ViCmd) -> Result<(), String> {
		match verb {
			Verb::Delete => {
				let Some(range) = self.operator_range(cmd) else { return Ok(()) };
				self.op_delete(range, cmd.register);
				self.preferred_col = None;
				Ok(())
			}
			Verb::Yank => {
				let Some(range) = self.operator_range(cmd) else { return Ok(()) };
				self.op_yank(range, cmd.register);
				Ok(())
			}
			Verb::Indent | Verb::Dedent => {
				let dedent = matches!(verb, Verb::Dedent);
				let Some(range) = self.operator_range(cmd) else { return Ok(()) };
				let (start, end) = match range {
					OpRange::Lines { start, end } => (start, end),
					OpRange::Char { start, end } => (start.line, end.line),
					OpRange::Block { windows } => {
						let first = windows.first().map(|w| w.0).unwrap_or(0);
						let last = windows.last().map(|w| w.0).unwrap_or(first);
						(first, last)
					}
				};
				self.op_shift_lines(start, end, dedent);
				Ok(())
			}
			Verb::Equalize => {
				let Some(range) = self.operator_range(cmd) else { return Ok(()) };
				let start = match range {
					OpRange::Lines { start, .. } => start,
					OpRange::Char { start, .. } => start.line,
					OpRange::Block { ref windows } => windows.first().map(|w| w.0).unwrap_or(0),
				};
				// Language-agnostic reindent is deliberately a no-op; hosts
				// with a formatter listen for the change event instead
				self.snapshot_undo();
				self.mark_text_changed();
				self.cursor = CursorPosition::new(start, self.buffer.first_non_blank(start));
				Ok(())
			}
			Verb::Put(anchor) => {
				self.op_put(anchor, count, cmd.register);
				Ok(())
			}
			Verb::JoinLines => {
				self.op_join(count);
				Ok(())
			}
			Verb::ReplaceCharInplace(ch, n) => {
				self.op_replace_inplace(ch, n as usize);
				Ok(())
			}
			Verb::ToggleCaseInplace(n) => {
				self.op_toggle_case(n as usize);
				Ok(())
			}
			Verb::ReplaceChar(ch) => {
				if self.in_visual() {
					self.op_visual_fill(ch, cmd.register);
				} else {
					self.op_overwrite_char(ch);
				}
				Ok(())
			}
			Verb::InsertChar(ch) => {
				self.op_insert_char(ch);
				Ok(())
			}
			Verb::Insert(s) => {
				self.buffer.insert_text(self.cursor.line, self.cursor.col, &s);
				self.cursor.col += grapheme_len(&s);
				self.mark_text_changed();
				Ok(())
			}
			Verb::AcceptLineOrNewline => {
				self.op_newline();
				Ok(())
			}
			Verb::Undo => {
				for _ in 0..count.max(1) {
					let current = UndoState { lines: self.buffer.snapshot(), cursor: self.cursor };
					match self.undo.undo(current) {
						Some(state) => {
							self.buffer.restore_snapshot(state.lines);
							self.cursor = state.cursor;
							self.mark_text_changed();
						}
						None => {
							self.emit(ViEvent::StatusMessage("Already at oldest change".into()));
							break;
						}
					}
				}
				Ok(())
			}
			Verb::Redo => {
				for _ in 0..count.max(1) {
					let current = UndoState { lines: self.buffer.snapshot(), cursor: self.cursor };
					match self.undo.redo(current) {
						Some(state) => {
							self.buffer.restore_snapshot(state.lines);
							self.cursor = state.cursor;
							self.mark_text_changed();
						}
						None => {
							self.emit(ViEvent::StatusMessage("Already at newest change".into()));
							break;
						}
					}
				}
				Ok(())
			}
			Verb::SwapVisualAnchor => {
				if let Some(sel) = self.selection.as_mut() {
					sel.swap_ends();
					self.cursor = sel.head;
					let sel = *sel;
					self.emit(ViEvent::SelectionChanged(Some(sel)));
				}
				Ok(())
			}
			Verb::SetMark(name) => {
				self.marks.set(name, self.cursor);
				Ok(())
			}
			Verb::RecordMacro(reg) => {
				let reg = reg.to_ascii_lowercase();
				self.recording = Some((reg, vec![]));
				self.emit(ViEvent::StatusMessage(format!("recording @{reg}")));
				Ok(())
			}
			Verb::PlayMacro(reg) => self.play_macro(reg.to_ascii_lowercase(), count),
			Verb::PlayLastMacro => {
				match self.last_played {
					Some(reg) => self.play_macro(reg, count),
					None => Ok(()),
				}
			}
			Verb::JumpBack => {
				for _ in 0..count.max(1) {
					match self.jumps.back(self.cursor) {
						Some(pos) => self.cursor = self.buffer.clamp_cursor(pos, false),
						None => break,
					}
				}
				Ok(())
			}
			Verb::JumpForward => {
				for _ in 0..count.max(1) {
					match self.jumps.forward() {
						Some(pos) => self.cursor = self.buffer.clamp_cursor(pos, false),
						None => break,
					}
				}
				Ok(())
			}
			Verb::ViewportAlign(align) => {
				self.emit(ViEvent::ViewportAlignRequested(align));
				Ok(())
			}
			Verb::NextTab => {
				self.emit(ViEvent::NextTabRequested);
				Ok(())
			}
			Verb::PrevTab => {
				self.emit(ViEvent::PrevTabRequested);
				Ok(())
			}
			Verb::GoToDefinition => {
				self.emit(ViEvent::GoToDefinitionRequested);
				Ok(())
			}
			Verb::Ex(excmd) => {
				if !cmd.raw_seq.is_empty() && !self.replaying {
					self.push_ex_history(cmd.raw_seq.clone());
				}
				let result = self.exec_ex(excmd);
				if let Some(msg) = result.message {
					let msg = if result.success { msg } else { format!("E: {msg}") };
					self.emit(ViEvent::StatusMessage(msg));
				}
				Ok(())
			}
			Verb::RepeatLast
			| Verb::Change
			| Verb::InsertMode
			| Verb::InsertModeLineBreak(_)
			| Verb::NormalMode
			| Verb::ReplaceMode
			| Verb::VisualMode
			| Verb::VisualModeLine
			| Verb::VisualModeBlock
			| Verb::ExMode
			| Verb::SearchMode(_) => unreachable!("handled before exec_verb"),
		}
	}

	// ------------------------------------------------------------------
	// Mode transitions
	// ------------------------------------------------------------------

	fn handle_mode_transition(&mut self, cmd: ViCmd) -> Result<(), String> {
		let verb = cmd.verb().cloned().expect("mode transition carries a verb");
		let count = cmd.verb_count();
		match verb.1 {
			Verb::InsertMode => {
				if self.replaying {
					self.apply_insert_entry_motion(&cmd);
					return Ok(());
				}
				let entry = cmd.clone();
				if self.in_visual() {
					if let Some(sel) = self.selection {
						let (start, end) = sel.ordered();
						match &cmd.motion {
							// Visual `A` appends after the selection
							Some(MotionCmd(_, Motion::ForwardChar)) => {
								self.cursor = CursorPosition::new(end.line, end.col + 1);
							}
							_ => self.cursor = start,
						}
					}
				} else {
					self.apply_insert_entry_motion(&cmd);
				}
				self.snapshot_undo();
				self.stop_selecting();
				self.swap_mode(Box::new(ViInsert::new().with_count(count as u16).with_entry(entry)));
				Ok(())
			}
			Verb::Change => {
				let mut entry = cmd.clone();
				if self.in_visual() {
					if let Some(sel) = self.selection {
						entry.motion = Some(MotionCmd(1, Motion::Range(sel)));
					}
				}
				if self.apply_change_mutation(&cmd).is_none() {
					return Ok(());
				}
				if self.replaying {
					return Ok(());
				}
				self.stop_selecting();
				self.swap_mode(Box::new(ViInsert::new().with_count(count as u16).with_entry(entry)));
				Ok(())
			}
			Verb::InsertModeLineBreak(anchor) => {
				self.snapshot_undo();
				self.op_open_line(anchor);
				if self.replaying {
					return Ok(());
				}
				let entry = cmd.clone();
				self.stop_selecting();
				self.swap_mode(Box::new(ViInsert::new().with_count(count as u16).with_entry(entry)));
				Ok(())
			}
			Verb::ReplaceMode => {
				if self.replaying {
					return Ok(());
				}
				self.snapshot_undo();
				let entry = cmd.clone();
				self.swap_mode(Box::new(ViReplace::new().with_entry(entry)));
				Ok(())
			}
			Verb::VisualMode => self.toggle_visual(SelectKind::Char),
			Verb::VisualModeLine => self.toggle_visual(SelectKind::Line),
			Verb::VisualModeBlock => self.toggle_visual(SelectKind::Block),
			Verb::ExMode => {
				let visual_range = self
					.selection
					.filter(|_| self.in_visual())
					.map(|sel| {
						let (start, end) = sel.line_span();
						(start + 1, end + 1)
					});
				self.hist_cursor = None;
				self.swap_mode(Box::new(ViEx::new(visual_range)));
				Ok(())
			}
			Verb::SearchMode(dir) => {
				self.search_origin = Some(self.cursor);
				self.hist_cursor = None;
				self.swap_mode(Box::new(ViSearch::new(dir)));
				Ok(())
			}
			Verb::NormalMode => {
				if self.replaying {
					// Leaving insert during replay is just the cursor step
					if self.cursor.col > 0 {
						self.cursor.col -= 1;
					}
					return Ok(());
				}
				let origin = self.search_origin.take();
				if let Some(MotionCmd(_, Motion::PatternSearch(pattern, dir))) = cmd.motion.clone() {
					self.set_normal_mode();
					self.commit_search(pattern, dir, origin.unwrap_or(self.cursor));
				} else {
					// Abandoned search: restore the pre-search cursor
					if matches!(self.mode.report_mode(), Mode::SearchForward | Mode::SearchBackward) {
						if let Some(origin) = origin {
							self.cursor = origin;
						}
					}
					self.set_normal_mode();
				}
				Ok(())
			}
			_ => unreachable!("not a mode transition"),
		}
	}

	fn toggle_visual(&mut self, kind: SelectKind) -> Result<(), String> {
		if self.in_visual() {
			let current = self.selection.map(|s| s.kind);
			if current == Some(kind) {
				self.set_normal_mode();
			} else {
				if let Some(sel) = self.selection.as_mut() {
					sel.kind = kind;
					let sel = *sel;
					self.emit(ViEvent::SelectionChanged(Some(sel)));
				}
				self.swap_mode(Box::new(ViVisual::new(kind)));
			}
			return Ok(());
		}
		let sel = Selection::new(self.cursor, self.cursor, kind);
		self.selection = Some(sel);
		self.emit(ViEvent::SelectionChanged(Some(sel)));
		self.swap_mode(Box::new(ViVisual::new(kind)));
		Ok(())
	}

	fn swap_mode(&mut self, new_mode: Box<dyn ViMode>) {
		let old = std::mem::replace(&mut self.mode, new_mode);
		let new_report = self.mode.report_mode();
		if old.report_mode() != new_report {
			self.emit(ViEvent::ModeChanged(new_report));
		}
	}

	/// Return to normal mode, capturing an insert/replace session for `.` and
	/// applying the teardown each mode needs.
	fn set_normal_mode(&mut self) {
		let old = std::mem::replace(&mut self.mode, Box::new(ViNormal::new()));
		let old_report = old.report_mode();

		if matches!(old_report, Mode::Insert | Mode::Replace) {
			if old.is_repeatable() && !self.replaying {
				if let Some(CmdReplay::ModeReplay { cmds, repeat }) = old.as_replay() {
					// A counted insert (`3i`) replays the session the
					// remaining times before the final cursor step
					if repeat > 1 {
						let body: Vec<ViCmd> = cmds
							.iter()
							.filter(|c| !matches!(c.verb(), Some(VerbCmd(_, Verb::NormalMode))))
							.cloned()
							.collect();
						self.replaying = true;
						for _ in 1..repeat {
							for c in body.clone() {
								let _ = self.exec_cmd(c);
							}
						}
						self.replaying = false;
					}
					self.repeat_action = Some(CmdReplay::mode(cmds, 1));
				}
			}
			// Leaving insert shifts the cursor left off the end of the line
			if self.cursor.col > 0 {
				self.cursor.col -= 1;
			}
		}

		if matches!(old_report, Mode::Visual | Mode::VisualLine | Mode::VisualBlock) {
			self.stop_selecting();
		}
		if matches!(old_report, Mode::Command | Mode::SearchForward | Mode::SearchBackward) {
			self.emit(ViEvent::CommandLineChanged(String::new()));
			self.search_origin = None;
		}
		self.hist_cursor = None;
		if old_report != Mode::Normal {
			self.emit(ViEvent::ModeChanged(Mode::Normal));
		}
	}

	fn stop_selecting(&mut self) {
		if self.selection.take().is_some() {
			self.emit(ViEvent::SelectionChanged(None));
		}
	}

	// ------------------------------------------------------------------
	// Repeat and replay
	// ------------------------------------------------------------------

	fn handle_cmd_repeat(&mut self, cmd: ViCmd) -> Result<(), String> {
		let Some(replay) = self.repeat_action.clone() else {
			return Ok(())
		};
		let count = cmd.verb_count();
		self.snapshot_undo();
		self.replaying = true;
		let result = (|| match replay {
			CmdReplay::ModeReplay { cmds, mut repeat } => {
				if count > 1 {
					repeat = count as u16;
				}
				let repeat = repeat.max(1);
				let body: Vec<ViCmd> = cmds
					.iter()
					.filter(|c| !matches!(c.verb(), Some(VerbCmd(_, Verb::NormalMode))))
					.cloned()
					.collect();
				for _ in 0..repeat {
					for c in body.clone() {
						self.exec_cmd(c)?;
					}
				}
				// The final cursor step that leaving insert would apply
				if self.cursor.col > 0 {
					self.cursor.col -= 1;
				}
				Ok(())
			}
			CmdReplay::Single(mut stored) => {
				if count > 1 {
					if stored.verb.is_none() {
						return Ok(());
					}
					if let Some(v) = stored.verb.as_mut() {
						v.0 = count;
					}
					if let Some(m) = stored.motion.as_mut() {
						m.0 = 1;
					}
					stored.normalize_counts();
				}
				self.exec_cmd(stored)
			}
		})();
		self.replaying = false;
		result
	}

	fn play_macro(&mut self, reg: char, count: usize) -> Result<(), String> {
		let Some(keys) = self.macros.get(&reg).cloned() else {
			return Ok(())
		};
		if self.replay_depth >= MAX_REPLAY_DEPTH {
			return Err("recursive macro".into());
		}
		self.replay_depth += 1;
		self.last_played = Some(reg);
		for _ in 0..count.max(1) {
			for key in keys.clone() {
				self.replay_steps += 1;
				if self.replay_steps > MAX_REPLAY_STEPS {
					self.replay_depth -= 1;
					return Err("macro replay interrupted".into());
				}
				self.dispatch_key(key);
			}
		}
		self.replay_depth -= 1;
		Ok(())
	}

	/// Apply the cursor motion of an insert-entering command (`a`, `A`, `I`).
	fn apply_insert_entry_motion(&mut self, cmd: &ViCmd) {
		let Some(mcmd) = cmd.motion.clone() else { return };
		match mcmd.1 {
			// Append at end of line: one past the last grapheme
			Motion::EndOfLine => {
				self.cursor.col = self.buffer.line_len(self.cursor.line);
			}
			_ => {
				let eval = motion::evaluate(&self.buffer, self.cursor, None, &mcmd, &self.motion_ctx(false, true));
				if let Some(MotionEval::Target { pos, .. }) = eval {
					self.cursor = pos;
				}
			}
		}
	}

	// ------------------------------------------------------------------
	// Operator execution
	// ------------------------------------------------------------------

	fn motion_ctx<'a>(&'a self, has_operator: bool, insert: bool) -> MotionContext<'a> {
		MotionContext {
			preferred_col: self.preferred_col,
			last_find: self.last_find,
			last_search: self.last_search.as_ref(),
			marks: &self.marks,
			options: &self.options,
			insert,
			has_operator,
		}
	}

	/// Resolve the range an operator applies to: the visual selection when one
	/// is active, otherwise the evaluated motion with its classification.
	fn operator_range(&mut self, cmd: &ViCmd) -> Option<OpRange> {
		if cmd.motion.is_none() {
			let sel = self.selection.filter(|_| self.in_visual())?;
			return Some(self.selection_range(sel));
		}
		let mcmd = cmd.motion.clone()?;
		if let MotionCmd(_, Motion::Range(sel)) = &mcmd {
			return Some(self.selection_range(*sel));
		}
		let verb = cmd.verb().map(|v| &v.1);
		let eval = motion::evaluate(&self.buffer, self.cursor, verb, &mcmd, &self.motion_ctx(true, false))?;
		Some(match eval {
			MotionEval::Target { pos, flavor } => {
				let (start, end) = crate::cursor::ordered(self.cursor, pos);
				match flavor {
					MotionFlavor::Linewise => OpRange::Lines { start: start.line, end: end.line },
					MotionFlavor::Exclusive => OpRange::Char { start, end },
					MotionFlavor::Inclusive => OpRange::Char {
						start,
						end: CursorPosition::new(end.line, end.col + 1),
					},
				}
			}
			MotionEval::Span { start, end, linewise } => {
				if linewise {
					OpRange::Lines { start: start.line, end: end.line }
				} else {
					OpRange::Char {
						start,
						end: CursorPosition::new(end.line, end.col + 1),
					}
				}
			}
		})
	}

	fn selection_range(&self, sel: Selection) -> OpRange {
		match sel.kind {
			SelectKind::Char => {
				let (start, end) = sel.ordered();
				OpRange::Char {
					start,
					end: CursorPosition::new(end.line, end.col + 1),
				}
			}
			SelectKind::Line => {
				let (start, end) = sel.line_span();
				OpRange::Lines { start, end }
			}
			SelectKind::Block => {
				let (start, end) = sel.ordered();
				let (c1, c2) = if sel.anchor.col <= sel.head.col {
					(sel.anchor.col, sel.head.col)
				} else {
					(sel.head.col, sel.anchor.col)
				};
				let mut windows = vec![];
				for line in start.line..=end.line {
					let len = self.buffer.line_len(line);
					windows.push((line, c1.min(len), (c2 + 1).min(len)));
				}
				OpRange::Block { windows }
			}
		}
	}

	fn slice_line(&self, line: usize, start_col: usize, end_col: usize) -> String {
		let l = self.buffer.line(line);
		let a = crate::buffer::byte_of_col(l, start_col);
		let b = crate::buffer::byte_of_col(l, end_col.max(start_col));
		l[a..b].to_string()
	}

	fn read_span(&self, start: CursorPosition, end: CursorPosition) -> String {
		if start.line == end.line {
			return self.slice_line(start.line, start.col, end.col);
		}
		let mut out = self.slice_line(start.line, start.col, self.buffer.line_len(start.line));
		for line in start.line + 1..end.line {
			out.push('\n');
			out.push_str(self.buffer.line(line));
		}
		out.push('\n');
		out.push_str(&self.slice_line(end.line, 0, end.col));
		out
	}

	/// Remove the half-open span `[start, end)`, merging the boundary lines.
	fn delete_span(&mut self, start: CursorPosition, end: CursorPosition) -> String {
		let text = self.read_span(start, end);
		if start.line == end.line {
			self.buffer.delete_range(start.line, start.col, end.col);
		} else {
			let first_len = self.buffer.line_len(start.line);
			self.buffer.delete_range(start.line, start.col, first_len);
			self.buffer.delete_range(end.line, 0, end.col);
			if end.line > start.line + 1 {
				self.buffer.delete_lines(start.line + 1, end.line - 1);
			}
			self.buffer.join_lines(start.line);
		}
		self.mark_text_changed();
		text
	}

	fn write_register(&mut self, name: RegisterName, content: RegisterContent) {
		self.registers.write(name, content, self.clipboard.as_mut());
	}

	fn read_register(&mut self, name: RegisterName) -> Option<RegisterContent> {
		self.registers.read(name, self.clipboard.as_mut())
	}

	fn op_delete(&mut self, range: OpRange, register: RegisterName) {
		self.snapshot_undo();
		match range {
			OpRange::Char { start, end } => {
				let text = self.delete_span(start, end);
				self.write_register(register, RegisterContent::Span(text));
				self.cursor = start;
			}
			OpRange::Lines { start, end } => {
				let removed = self.buffer.delete_lines(start, end);
				self.write_register(register, RegisterContent::Line(removed.join("\n")));
				let line = start.min(self.buffer.line_count() - 1);
				self.cursor = CursorPosition::new(line, self.buffer.first_non_blank(line));
				self.mark_text_changed();
			}
			OpRange::Block { windows } => {
				let mut parts = vec![];
				for (line, s, e) in &windows {
					parts.push(self.buffer.delete_range(*line, *s, *e));
				}
				self.write_register(register, RegisterContent::Line(parts.join("\n")));
				if let Some((line, s, _)) = windows.first() {
					self.cursor = CursorPosition::new(*line, *s);
				}
				self.mark_text_changed();
			}
		}
	}

	fn op_yank(&mut self, range: OpRange, register: RegisterName) {
		match range {
			OpRange::Char { start, end } => {
				let text = self.read_span(start, end);
				self.write_register(register, RegisterContent::Span(text));
				self.cursor = start;
			}
			OpRange::Lines { start, end } => {
				let text = self.buffer.lines(start, end).join("\n");
				self.write_register(register, RegisterContent::Line(text));
				self.cursor.line = start.min(self.cursor.line);
			}
			OpRange::Block { windows } => {
				let mut parts = vec![];
				for (line, s, e) in &windows {
					parts.push(self.slice_line(*line, *s, *e));
				}
				self.write_register(register, RegisterContent::Line(parts.join("\n")));
				if let Some((line, s, _)) = windows.first() {
					self.cursor = CursorPosition::new(*line, *s);
				}
			}
		}
	}

	fn op_shift_lines(&mut self, start: usize, end: usize, dedent: bool) {
		self.snapshot_undo();
		let unit = if self.options.expandtab {
			" ".repeat(self.options.shiftwidth)
		} else {
			"\t".to_string()
		};
		for line in start..=end.min(self.buffer.line_count() - 1) {
			if dedent {
				let leading = self
					.buffer
					.line(line)
					.chars()
					.take_while(|c| c.is_whitespace())
					.count()
					.min(self.options.shiftwidth);
				if leading > 0 {
					self.buffer.delete_range(line, 0, leading);
				}
			} else if !self.buffer.line(line).is_empty() {
				self.buffer.insert_text(line, 0, &unit);
			}
		}
		self.cursor = CursorPosition::new(start, self.buffer.first_non_blank(start));
		self.mark_text_changed();
	}

	fn op_put(&mut self, anchor: Anchor, count: usize, register: RegisterName) {
		let Some(content) = self.read_register(register) else {
			return
		};
		if content.is_empty() {
			return
		}
		self.snapshot_undo();
		let mut anchor = anchor;

		// Visual paste replaces the selection
		if let Some(sel) = self.selection.filter(|_| self.in_visual()) {
			match self.selection_range(sel) {
				OpRange::Char { start, end } => {
					let old = self.delete_span(start, end);
					self.write_register(RegisterName::default(), RegisterContent::Span(old));
					self.cursor = start;
				}
				OpRange::Lines { start, end } => {
					let old = self.buffer.delete_lines(start, end);
					self.write_register(RegisterName::default(), RegisterContent::Line(old.join("\n")));
					self.cursor = CursorPosition::new(start.min(self.buffer.line_count() - 1), 0);
					self.mark_text_changed();
				}
				OpRange::Block { windows } => {
					for (line, s, e) in &windows {
						self.buffer.delete_range(*line, *s, *e);
					}
					if let Some((line, s, _)) = windows.first() {
						self.cursor = CursorPosition::new(*line, *s);
					}
					self.mark_text_changed();
				}
			}
			anchor = Anchor::Before;
		}

		match content {
			RegisterContent::Line(text) => {
				let mut lines: Vec<String> = vec![];
				for _ in 0..count.max(1) {
					lines.extend(text.split('\n').map(String::from));
				}
				match anchor {
					Anchor::After => {
						self.buffer.insert_lines(self.cursor.line, lines);
						let line = self.cursor.line + 1;
						self.cursor = CursorPosition::new(line, self.buffer.first_non_blank(line));
					}
					Anchor::Before => {
						let at = self.cursor.line;
						for (i, l) in lines.into_iter().enumerate() {
							self.buffer.insert_line_above(at + i, l);
						}
						self.cursor = CursorPosition::new(at, self.buffer.first_non_blank(at));
					}
				}
			}
			RegisterContent::Span(text) => {
				let repeated = text.repeat(count.max(1));
				let line_len = self.buffer.line_len(self.cursor.line);
				let at_col = match anchor {
					Anchor::After => (self.cursor.col + 1).min(line_len),
					Anchor::Before => self.cursor.col.min(line_len),
				};
				let at = CursorPosition::new(self.cursor.line, at_col);
				self.cursor = self.insert_charwise(at, &repeated);
			}
			RegisterContent::Empty => return,
		}
		self.mark_text_changed();
	}

	/// Insert charwise text (possibly containing newlines) at `pos`, returning
	/// the position of the last inserted grapheme.
	fn insert_charwise(&mut self, pos: CursorPosition, text: &str) -> CursorPosition {
		if !text.contains('\n') {
			self.buffer.insert_text(pos.line, pos.col, text);
			return CursorPosition::new(pos.line, pos.col + grapheme_len(text).saturating_sub(1));
		}
		let parts: Vec<&str> = text.split('\n').collect();
		self.buffer.break_line(pos.line, pos.col);
		self.buffer.insert_text(pos.line, pos.col, parts[0]);
		let mut line = pos.line;
		for part in &parts[1..parts.len() - 1] {
			line += 1;
			self.buffer.insert_line_above(line, part.to_string());
		}
		let last = parts[parts.len() - 1];
		line += 1;
		self.buffer.insert_text(line, 0, last);
		CursorPosition::new(line, grapheme_len(last).saturating_sub(1))
	}

	fn op_join(&mut self, count: usize) {
		self.snapshot_undo();
		let (line, times) = match self.selection.filter(|_| self.in_visual()) {
			Some(sel) => {
				let (s, e) = sel.line_span();
				(s, (e.saturating_sub(s)).max(1))
			}
			None => (self.cursor.line, count.max(2) - 1),
		};
		let mut join_col = 0;
		for _ in 0..times {
			if line + 1 >= self.buffer.line_count() {
				break;
			}
			let next = self.buffer.line(line + 1).trim_start().to_string();
			self.buffer.replace_line(line + 1, next);
			let cur = self.buffer.line(line).to_string();
			join_col = grapheme_len(&cur);
			if !cur.is_empty() && !cur.ends_with(' ') && !self.buffer.line(line + 1).is_empty() {
				self.buffer.insert_text(line, join_col, " ");
			}
			self.buffer.join_lines(line);
		}
		self.cursor = CursorPosition::new(line, join_col);
		self.mark_text_changed();
	}

	fn op_replace_inplace(&mut self, ch: char, n: usize) {
		let n = n.max(1);
		let len = self.buffer.line_len(self.cursor.line);
		if self.cursor.col + n > len {
			// Not enough characters under the cursor; vim refuses silently
			return;
		}
		self.snapshot_undo();
		let replacement: String = std::iter::repeat(ch).take(n).collect();
		self.buffer.delete_range(self.cursor.line, self.cursor.col, self.cursor.col + n);
		self.buffer.insert_text(self.cursor.line, self.cursor.col, &replacement);
		self.cursor.col += n - 1;
		self.mark_text_changed();
	}

	fn op_toggle_case(&mut self, n: usize) {
		let n = n.max(1);
		let len = self.buffer.line_len(self.cursor.line);
		if self.cursor.col >= len {
			return;
		}
		self.snapshot_undo();
		let end = (self.cursor.col + n).min(len);
		let seg = self.slice_line(self.cursor.line, self.cursor.col, end);
		let toggled: String = seg
			.chars()
			.map(|c| {
				if c.is_uppercase() {
					c.to_lowercase().next().unwrap_or(c)
				} else if c.is_lowercase() {
					c.to_uppercase().next().unwrap_or(c)
				} else {
					c
				}
			})
			.collect();
		self.buffer.delete_range(self.cursor.line, self.cursor.col, end);
		self.buffer.insert_text(self.cursor.line, self.cursor.col, &toggled);
		self.cursor.col = end.min(len.saturating_sub(1));
		self.mark_text_changed();
	}

	/// Visual `r{c}`: overwrite every selected character.
	fn op_visual_fill(&mut self, ch: char, _register: RegisterName) {
		let Some(sel) = self.selection.filter(|_| self.in_visual()) else {
			return
		};
		self.snapshot_undo();
		let windows = match self.selection_range(sel) {
			OpRange::Char { start, end } => {
				if start.line == end.line {
					vec![(start.line, start.col, end.col)]
				} else {
					let mut w = vec![(start.line, start.col, self.buffer.line_len(start.line))];
					for line in start.line + 1..end.line {
						w.push((line, 0, self.buffer.line_len(line)));
					}
					w.push((end.line, 0, end.col));
					w
				}
			}
			OpRange::Lines { start, end } => (start..=end)
				.map(|l| (l, 0, self.buffer.line_len(l)))
				.collect(),
			OpRange::Block { windows } => windows,
		};
		for (line, s, e) in windows {
			if e > s {
				let fill: String = std::iter::repeat(ch).take(e - s).collect();
				self.buffer.delete_range(line, s, e);
				self.buffer.insert_text(line, s, &fill);
			}
		}
		let (start, _) = sel.ordered();
		self.cursor = start;
		self.mark_text_changed();
	}

	/// Replace-mode overwrite: replace the grapheme under the cursor, or
	/// append past the end of line.
	fn op_overwrite_char(&mut self, ch: char) {
		let len = self.buffer.line_len(self.cursor.line);
		if self.cursor.col < len {
			self.buffer.delete_char(self.cursor.line, self.cursor.col);
		}
		self.buffer.insert_char(self.cursor.line, self.cursor.col, ch);
		self.cursor.col += 1;
		self.mark_text_changed();
	}

	fn op_insert_char(&mut self, ch: char) {
		if ch == '\t' && self.options.expandtab {
			let ts = self.options.tabstop.max(1);
			let n = ts - (self.cursor.col % ts);
			let spaces = " ".repeat(n);
			self.buffer.insert_text(self.cursor.line, self.cursor.col, &spaces);
			self.cursor.col += n;
		} else {
			self.buffer.insert_char(self.cursor.line, self.cursor.col, ch);
			self.cursor.col += 1;
		}
		self.mark_text_changed();
	}

	/// Insert-mode line break with autoindent.
	fn op_newline(&mut self) {
		let indent = if self.options.autoindent {
			leading_whitespace(self.buffer.line(self.cursor.line))
		} else {
			String::new()
		};
		self.buffer.break_line(self.cursor.line, self.cursor.col);
		if !indent.is_empty() {
			self.buffer.insert_text(self.cursor.line + 1, 0, &indent);
		}
		self.cursor = CursorPosition::new(self.cursor.line + 1, grapheme_len(&indent));
		self.mark_text_changed();
	}

	/// `o` / `O`: open a new line below or above, carrying indent.
	fn op_open_line(&mut self, anchor: Anchor) {
		let indent = if self.options.autoindent {
			leading_whitespace(self.buffer.line(self.cursor.line))
		} else {
			String::new()
		};
		let col = grapheme_len(&indent);
		match anchor {
			Anchor::After => {
				self.buffer.insert_lines(self.cursor.line, vec![indent]);
				self.cursor = CursorPosition::new(self.cursor.line + 1, col);
			}
			Anchor::Before => {
				self.buffer.insert_line_above(self.cursor.line, indent);
				self.cursor = CursorPosition::new(self.cursor.line, col);
			}
		}
		self.mark_text_changed();
	}

	/// `c` family shared mutation: delete the target, leave the cursor ready
	/// for insertion.
	fn apply_change_mutation(&mut self, cmd: &ViCmd) -> Option<()> {
		let range = self.operator_range(cmd)?;
		self.snapshot_undo();
		match range {
			OpRange::Char { start, end } => {
				let text = self.delete_span(start, end);
				self.write_register(cmd.register, RegisterContent::Span(text));
				self.cursor = start;
			}
			OpRange::Lines { start, end } => {
				let old_last = self.buffer.line_count() - 1;
				let removed = self.buffer.lines(start, end).join("\n");
				self.write_register(cmd.register, RegisterContent::Line(removed));
				let indent = if self.options.autoindent {
					leading_whitespace(self.buffer.line(start))
				} else {
					String::new()
				};
				if start == 0 && end >= old_last {
					self.buffer.delete_lines(start, end);
					self.buffer.replace_line(0, indent.clone());
				} else {
					self.buffer.delete_lines(start, end);
					self.buffer.insert_line_above(start, indent.clone());
				}
				self.cursor = CursorPosition::new(start, grapheme_len(&indent));
				self.mark_text_changed();
			}
			OpRange::Block { windows } => {
				for (line, s, e) in &windows {
					self.buffer.delete_range(*line, *s, *e);
				}
				if let Some((line, s, _)) = windows.first() {
					self.cursor = CursorPosition::new(*line, *s);
				}
				self.mark_text_changed();
			}
		}
		Some(())
	}

	fn snapshot_undo(&mut self) {
		// A replayed change is one edit; the snapshot was taken when the
		// replay began
		if self.replaying {
			return;
		}
		self.undo.push_snapshot(UndoState {
			lines: self.buffer.snapshot(),
			cursor: self.cursor,
		});
	}

	// ------------------------------------------------------------------
	// Search
	// ------------------------------------------------------------------

	fn commit_search(&mut self, pattern: String, dir: Direction, origin: CursorPosition) {
		if pattern.is_empty() {
			self.cursor = origin;
			return;
		}
		self.last_search = Some(SearchState {
			pattern: pattern.clone(),
			direction: dir,
		});
		self.push_search_history(pattern.clone());
		let ignore_case = self.options.fold_case(&pattern);
		let forward = dir == Direction::Forward;
		match self
			.buffer
			.find_next(&pattern, origin, forward, ignore_case, self.options.wrapscan)
		{
			Some(pos) => {
				self.jumps.add(origin);
				self.cursor = pos;
				if self.options.hlsearch {
					let match_count = self.buffer.find_all(&pattern, ignore_case).len();
					self.emit(ViEvent::SearchResultChanged { pattern, match_count });
				}
			}
			None => {
				self.cursor = origin;
				self.emit(ViEvent::StatusMessage(format!("Pattern not found: {pattern}")));
			}
		}
	}

	fn incsearch_preview(&mut self) {
		if !self.options.incsearch {
			return;
		}
		let Some(origin) = self.search_origin else { return };
		let pattern = self.mode.pending_seq().unwrap_or_default();
		if pattern.is_empty() {
			self.cursor = origin;
			return;
		}
		let forward = self.mode.report_mode() == Mode::SearchForward;
		let ignore_case = self.options.fold_case(&pattern);
		match self
			.buffer
			.find_next(&pattern, origin, forward, ignore_case, self.options.wrapscan)
		{
			Some(pos) => self.cursor = pos,
			None => self.cursor = origin,
		}
	}

	// ------------------------------------------------------------------
	// History
	// ------------------------------------------------------------------

	fn push_ex_history(&mut self, line: String) {
		if self.ex_history.last() != Some(&line) {
			self.ex_history.push(line);
		}
		let cap = self.options.history.max(1);
		while self.ex_history.len() > cap {
			self.ex_history.remove(0);
		}
	}

	fn push_search_history(&mut self, pattern: String) {
		if self.search_history.last() != Some(&pattern) {
			self.search_history.push(pattern);
		}
		let cap = self.options.history.max(1);
		while self.search_history.len() > cap {
			self.search_history.remove(0);
		}
	}

	fn history_scroll(&mut self, up: bool) {
		let report = self.mode.report_mode();
		let is_command = match report {
			Mode::Command => true,
			Mode::SearchForward | Mode::SearchBackward => false,
			_ => return,
		};
		let len = if is_command { self.ex_history.len() } else { self.search_history.len() };
		if len == 0 {
			return;
		}
		let new_idx = match self.hist_cursor {
			None if up => {
				self.hist_stash = self.mode.pending_seq().unwrap_or_default();
				Some(len - 1)
			}
			None => None,
			Some(i) if up => Some(i.saturating_sub(1)),
			Some(i) => {
				if i + 1 < len {
					Some(i + 1)
				} else {
					None
				}
			}
		};
		self.hist_cursor = new_idx;
		let line = match new_idx {
			Some(i) => {
				if is_command {
					self.ex_history[i].clone()
				} else {
					self.search_history[i].clone()
				}
			}
			None => std::mem::take(&mut self.hist_stash),
		};
		self.mode.set_pending(line.clone());
		let prompt = match report {
			Mode::Command => ':',
			Mode::SearchForward => '/',
			_ => '?',
		};
		self.emit(ViEvent::CommandLineChanged(format!("{prompt}{line}")));
	}

	// ------------------------------------------------------------------
	// Ex commands
	// ------------------------------------------------------------------

	fn exec_ex(&mut self, ex: ExCommand) -> ExResult {
		debug!("ex: {ex:?}");
		let ExCommand { range, kind } = ex;
		match kind {
			ExKind::Quit { force, all: _ } => {
				if !force && self.buffer.is_modified() {
					return ExResult::err("No write since last change");
				}
				self.emit(ViEvent::QuitRequested { force });
				ExResult::ok()
			}
			ExKind::Write { path, quit } => {
				let target = path.or_else(|| self.file_path.clone());
				match target {
					None => {
						self.emit(ViEvent::SaveRequested(None));
						if quit {
							self.emit(ViEvent::QuitRequested { force: false });
						}
						ExResult::ok()
					}
					Some(p) => match self.file_io.write(&p, &self.buffer.text()) {
						Ok(()) => {
							self.buffer.mark_saved();
							if self.file_path.is_none() {
								self.file_path = Some(p.clone());
							}
							if quit {
								self.emit(ViEvent::QuitRequested { force: false });
							}
							ExResult::msg(format!(
								"\"{}\" {}L written",
								p.display(),
								self.buffer.line_count()
							))
						}
						Err(e) => ExResult::err(format!("Cannot write {}: {e}", p.display())),
					},
				}
			}
			ExKind::EditFile(path) => {
				self.emit(ViEvent::OpenFileRequested(path));
				ExResult::ok()
			}
			ExKind::Set(args) => {
				for arg in args.split_whitespace() {
					if let Err(msg) = self.options.apply_set(arg) {
						return ExResult::err(msg);
					}
				}
				ExResult::ok()
			}
			ExKind::ColorScheme(name) => {
				if !name.is_empty() {
					self.options.colorscheme = name;
				}
				ExResult::ok()
			}
			ExKind::Syntax(on) => {
				self.options.syntax = on;
				ExResult::ok()
			}
			ExKind::BufferNext => {
				self.emit(ViEvent::NextBufferRequested);
				ExResult::ok()
			}
			ExKind::BufferPrev => {
				self.emit(ViEvent::PrevBufferRequested);
				ExResult::ok()
			}
			ExKind::BufferGo(n) => {
				self.emit(ViEvent::GoToBufferRequested(n));
				ExResult::ok()
			}
			ExKind::BufferDelete { force } => {
				self.emit(ViEvent::CloseBufferRequested { force });
				ExResult::ok()
			}
			ExKind::TabNew(path) => {
				self.emit(ViEvent::NewTabRequested(path));
				ExResult::ok()
			}
			ExKind::TabNext => {
				self.emit(ViEvent::NextTabRequested);
				ExResult::ok()
			}
			ExKind::TabPrev => {
				self.emit(ViEvent::PrevTabRequested);
				ExResult::ok()
			}
			ExKind::TabClose { force } => {
				self.emit(ViEvent::CloseTabRequested { force });
				ExResult::ok()
			}
			ExKind::Split { vertical } => {
				self.emit(ViEvent::SplitRequested { vertical });
				ExResult::ok()
			}
			ExKind::GoToLine => {
				let Some(range) = range else { return ExResult::ok() };
				let Some(line) = motion::eval_line_addr(&self.buffer, self.cursor, &range.end) else {
					return ExResult::err("Invalid range");
				};
				self.jumps.add(self.cursor);
				self.cursor = CursorPosition::new(line, self.buffer.first_non_blank(line));
				ExResult::ok()
			}
			ExKind::Substitute { pattern, replacement, flags } => {
				self.exec_substitute(range, &pattern, &replacement, flags)
			}
			ExKind::Map { target, lhs, rhs, noremap } => {
				let mode = match target {
					MapTarget::Normal => MapMode::Normal,
					MapTarget::Visual => MapMode::Visual,
					MapTarget::Insert => MapMode::Insert,
				};
				self.mappings.add(mode, &lhs, &rhs, noremap);
				ExResult::ok()
			}
		}
	}

	fn exec_substitute(
		&mut self,
		range: Option<ExRange>,
		pattern: &str,
		replacement: &str,
		flags: SubFlags,
	) -> ExResult {
		let (start, end) = match range {
			None => (self.cursor.line, self.cursor.line),
			Some(r) => {
				let Some(a) = motion::eval_line_addr(&self.buffer, self.cursor, &r.start) else {
					return ExResult::err("Invalid range");
				};
				let Some(b) = motion::eval_line_addr(&self.buffer, self.cursor, &r.end) else {
					return ExResult::err("Invalid range");
				};
				if b < a { (b, a) } else { (a, b) }
			}
		};

		let ignore_case = if flags.contains(SubFlags::NO_IGNORE_CASE) {
			false
		} else if flags.contains(SubFlags::IGNORE_CASE) {
			true
		} else {
			self.options.fold_case(pattern)
		};
		let source = if ignore_case {
			format!("(?i){pattern}")
		} else {
			pattern.to_string()
		};
		let regex = match Regex::new(&source) {
			Ok(r) => r,
			Err(_) => return ExResult::err(format!("Invalid pattern: {pattern}")),
		};

		let global = flags.contains(SubFlags::GLOBAL);
		let mut total = 0usize;
		let mut last_changed = None;
		let mut changes: Vec<(usize, String)> = vec![];
		for line in start..=end.min(self.buffer.line_count() - 1) {
			let text = self.buffer.line(line);
			let hits = regex.find_iter(text).count();
			if hits == 0 {
				continue;
			}
			let replaced = if global {
				total += hits;
				regex.replace_all(text, replacement).into_owned()
			} else {
				total += 1;
				regex.replace(text, replacement).into_owned()
			};
			changes.push((line, replaced));
			last_changed = Some(line);
		}

		if total == 0 {
			return ExResult::err("No matches");
		}

		self.snapshot_undo();
		for (line, text) in changes {
			self.buffer.replace_line(line, text);
		}
		if let Some(line) = last_changed {
			self.cursor = CursorPosition::new(line, self.buffer.first_non_blank(line));
		}
		self.mark_text_changed();
		ExResult::msg(format!("{total} substitution(s) made"))
	}
}

fn leading_whitespace(line: &str) -> String {
	line.chars().take_while(|c| c.is_whitespace()).collect()
}

fn is_jump_motion(motion: &Motion) -> bool {
	matches!(
		motion,
		Motion::BeginningOfBuffer
			| Motion::EndOfBuffer
			| Motion::GoToLine(_)
			| Motion::Paragraph(_)
			| Motion::ToDelimMatch
			| Motion::ToMark(_)
			| Motion::ToMarkLine(_)
			| Motion::NextMatch
			| Motion::PrevMatch
			| Motion::ScreenTop
			| Motion::ScreenMiddle
			| Motion::ScreenBottom
	)
}
