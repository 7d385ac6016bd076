//! Emulation of Vim's registers.
//!
//! Registers hold yanked or deleted text along with a *kind*: a `Line` register
//! pastes as whole lines, a `Span` register pastes as an inline substring. The
//! store routes writes across the unnamed register, the named registers `a`-`z`,
//! the last-yank register `0`, the clipboard registers `+`/`*`, and the blackhole
//! register `_`.

use crate::capability::ClipboardProvider;

/// The name a command addressed a register by, normalized for routing.
///
/// Uppercase names fold to their lowercase slot with `append` set.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct RegisterName {
	name: Option<char>,
	append: bool,
}

impl RegisterName {
	pub fn new(name: Option<char>) -> Self {
		let Some(ch) = name else {
			return Self::default()
		};
		if ch.is_ascii_uppercase() {
			Self { name: Some(ch.to_ascii_lowercase()), append: true }
		} else {
			Self { name: Some(ch), append: false }
		}
	}
	pub fn name(&self) -> Option<char> {
		self.name
	}
	pub fn is_append(&self) -> bool {
		self.append
	}
	pub fn is_blackhole(&self) -> bool {
		self.name == Some('_')
	}
	pub fn is_clipboard(&self) -> bool {
		matches!(self.name, Some('+') | Some('*'))
	}
}

/// Register payloads. `Line` text yields whole lines on paste (multi-line
/// content is joined with `\n`); `Span` text is an inline substring.
#[derive(Default, Clone, Debug, PartialEq)]
pub enum RegisterContent {
	Span(String),
	Line(String),
	#[default]
	Empty,
}

impl RegisterContent {
	pub fn text(&self) -> &str {
		match self {
			Self::Span(s) | Self::Line(s) => s,
			Self::Empty => "",
		}
	}
	pub fn is_line(&self) -> bool {
		matches!(self, Self::Line(_))
	}
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Span(s) | Self::Line(s) => s.is_empty(),
			Self::Empty => true,
		}
	}
}

/// A single register slot.
#[derive(Clone, Default, Debug)]
pub struct Register {
	content: RegisterContent,
}

impl Register {
	pub const fn new() -> Self {
		Self { content: RegisterContent::Empty }
	}
	pub fn content(&self) -> &RegisterContent {
		&self.content
	}
	pub fn write(&mut self, content: RegisterContent) {
		self.content = content;
	}
	/// Append semantics for uppercase register names: if either side is
	/// linewise the halves are joined with a newline and the result is
	/// linewise, otherwise plain concatenation.
	pub fn append(&mut self, content: RegisterContent) {
		if matches!(content, RegisterContent::Empty) {
			return
		}
		match std::mem::take(&mut self.content) {
			RegisterContent::Empty => self.content = content,
			RegisterContent::Span(existing) => match content {
				RegisterContent::Span(s) => self.content = RegisterContent::Span(existing + &s),
				RegisterContent::Line(s) => self.content = RegisterContent::Line(format!("{existing}\n{s}")),
				RegisterContent::Empty => unreachable!(),
			},
			RegisterContent::Line(existing) => {
				let rest = content.text();
				self.content = RegisterContent::Line(format!("{existing}\n{rest}"));
			}
		}
	}
}

/// The register store owned by the engine.
#[derive(Default, Debug)]
pub struct Registers {
	named: [Register; 26],
	unnamed: Register,
	last_yank: Register,
}

impl Registers {
	pub fn new() -> Self {
		Self::default()
	}

	fn slot(&self, ch: char) -> Option<&Register> {
		ch.is_ascii_lowercase().then(|| &self.named[ch as usize - 'a' as usize])
	}

	fn slot_mut(&mut self, ch: char) -> Option<&mut Register> {
		ch.is_ascii_lowercase().then(|| &mut self.named[ch as usize - 'a' as usize])
	}

	/// Route a write through the register name rules.
	pub fn write(
		&mut self,
		name: RegisterName,
		content: RegisterContent,
		clipboard: &mut dyn ClipboardProvider,
	) {
		if name.is_blackhole() {
			return
		}
		if name.is_clipboard() {
			// Linewise content gets a trailing newline, the convention platform
			// clipboards use for whole-line copies
			let mut text = content.text().to_string();
			if content.is_line() {
				text.push('\n');
			}
			clipboard.set_text(&text);
			self.unnamed.write(content);
			return
		}
		match name.name() {
			None => {
				self.unnamed.write(content.clone());
				self.last_yank.write(content);
			}
			Some(ch) => {
				if let Some(slot) = self.slot_mut(ch) {
					if name.is_append() {
						slot.append(content.clone());
					} else {
						slot.write(content.clone());
					}
					let merged = slot.content().clone();
					self.unnamed.write(merged);
				}
			}
		}
	}

	/// Read through the register name rules. Clipboard reads go through the
	/// capability; a missing clipboard reads as `None`.
	pub fn read(
		&self,
		name: RegisterName,
		clipboard: &mut dyn ClipboardProvider,
	) -> Option<RegisterContent> {
		if name.is_blackhole() {
			return None
		}
		if name.is_clipboard() {
			let text = clipboard.get_text()?;
			// Text ending in a newline pastes linewise, matching what most
			// platform clipboards produce for whole-line copies
			return if let Some(stripped) = text.strip_suffix('\n') {
				Some(RegisterContent::Line(stripped.to_string()))
			} else {
				Some(RegisterContent::Span(text))
			}
		}
		match name.name() {
			None => Some(self.unnamed.content().clone()),
			Some('0') => Some(self.last_yank.content().clone()),
			Some(ch) => self.slot(ch).map(|r| r.content().clone()),
		}
	}

	/// Direct read of a named slot, bypassing routing. Used by tests and hosts.
	pub fn get(&self, ch: char) -> Option<&RegisterContent> {
		self.slot(ch).map(|r| r.content())
	}

	pub fn unnamed(&self) -> &RegisterContent {
		self.unnamed.content()
	}
}
