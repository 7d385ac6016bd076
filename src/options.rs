//! Editor options recognized from `:set`.
//!
//! The engine consumes a pre-built options struct; parsing a vimrc belongs to the
//! host. Unknown option names are silently ignored, invalid values for known
//! options produce an error string.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Options {
	// Hints for the host; not read by core logic
	pub number: bool,
	pub relativenumber: bool,
	pub cursorline: bool,
	pub wrap: bool,
	pub showmode: bool,
	pub showcmd: bool,
	pub ruler: bool,
	pub tabstop: usize,

	// Consumed by the core
	pub shiftwidth: usize,
	pub expandtab: bool,
	pub autoindent: bool,
	pub ignorecase: bool,
	pub smartcase: bool,
	pub hlsearch: bool,
	pub incsearch: bool,
	pub wrapscan: bool,
	pub history: usize,

	pub colorscheme: String,
	pub syntax: bool,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			number: true,
			relativenumber: false,
			cursorline: false,
			wrap: true,
			showmode: true,
			showcmd: true,
			ruler: true,
			tabstop: 4,
			shiftwidth: 4,
			expandtab: true,
			autoindent: true,
			ignorecase: true,
			smartcase: true,
			hlsearch: true,
			incsearch: true,
			wrapscan: true,
			history: 1000,
			colorscheme: "default".into(),
			syntax: true,
		}
	}
}

impl Options {
	/// Apply one `:set` argument: `opt`, `noopt`, `opt=val` or `opt&`.
	///
	/// Returns `Ok(())` for applied or unknown options, `Err(msg)` for a known
	/// option given an invalid value.
	pub fn apply_set(&mut self, arg: &str) -> Result<(), String> {
		let arg = arg.trim();
		if arg.is_empty() {
			return Ok(())
		}

		if let Some(name) = arg.strip_suffix('&') {
			return self.reset_default(name)
		}
		if let Some((name, value)) = arg.split_once('=') {
			return self.set_value(name, value)
		}
		if let Some(name) = arg.strip_prefix("no") {
			if self.set_bool(name, false) {
				return Ok(())
			}
			// "no" might just be part of the option name itself
		}
		if self.set_bool(arg, true) {
			return Ok(())
		}
		if self.is_number_opt(arg) {
			return Err(format!("Argument required: {arg}"))
		}
		// Unknown option names are not an error
		Ok(())
	}

	fn is_number_opt(&self, name: &str) -> bool {
		matches!(name, "tabstop" | "ts" | "shiftwidth" | "sw" | "history")
	}

	fn set_bool(&mut self, name: &str, value: bool) -> bool {
		match name {
			"number" | "nu" => self.number = value,
			"relativenumber" | "rnu" => self.relativenumber = value,
			"cursorline" | "cul" => self.cursorline = value,
			"wrap" => self.wrap = value,
			"showmode" | "smd" => self.showmode = value,
			"showcmd" | "sc" => self.showcmd = value,
			"ruler" | "ru" => self.ruler = value,
			"expandtab" | "et" => self.expandtab = value,
			"autoindent" | "ai" => self.autoindent = value,
			"ignorecase" | "ic" => self.ignorecase = value,
			"smartcase" | "scs" => self.smartcase = value,
			"hlsearch" | "hls" => self.hlsearch = value,
			"incsearch" | "is" => self.incsearch = value,
			"wrapscan" | "ws" => self.wrapscan = value,
			"syntax" | "syn" => self.syntax = value,
			_ => return false
		}
		true
	}

	fn set_value(&mut self, name: &str, value: &str) -> Result<(), String> {
		match name {
			"tabstop" | "ts" => self.tabstop = parse_number(name, value)?,
			"shiftwidth" | "sw" => self.shiftwidth = parse_number(name, value)?,
			"history" | "hi" => self.history = parse_number(name, value)?,
			"colorscheme" => self.colorscheme = value.to_string(),
			_ => {
				// A bool option given a value is an error; unknown names are not
				if self.is_bool_opt(name) {
					return Err(format!("Invalid argument: {name}={value}"))
				}
			}
		}
		Ok(())
	}

	fn is_bool_opt(&self, name: &str) -> bool {
		matches!(name,
			"number" | "nu" | "relativenumber" | "rnu" | "cursorline" | "cul" |
			"wrap" | "showmode" | "smd" | "showcmd" | "sc" | "ruler" | "ru" |
			"expandtab" | "et" | "autoindent" | "ai" | "ignorecase" | "ic" |
			"smartcase" | "scs" | "hlsearch" | "hls" | "incsearch" | "is" |
			"wrapscan" | "ws" | "syntax" | "syn"
		)
	}

	fn reset_default(&mut self, name: &str) -> Result<(), String> {
		let defaults = Options::default();
		match name {
			"number" | "nu" => self.number = defaults.number,
			"relativenumber" | "rnu" => self.relativenumber = defaults.relativenumber,
			"cursorline" | "cul" => self.cursorline = defaults.cursorline,
			"wrap" => self.wrap = defaults.wrap,
			"showmode" | "smd" => self.showmode = defaults.showmode,
			"showcmd" | "sc" => self.showcmd = defaults.showcmd,
			"ruler" | "ru" => self.ruler = defaults.ruler,
			"tabstop" | "ts" => self.tabstop = defaults.tabstop,
			"shiftwidth" | "sw" => self.shiftwidth = defaults.shiftwidth,
			"expandtab" | "et" => self.expandtab = defaults.expandtab,
			"autoindent" | "ai" => self.autoindent = defaults.autoindent,
			"ignorecase" | "ic" => self.ignorecase = defaults.ignorecase,
			"smartcase" | "scs" => self.smartcase = defaults.smartcase,
			"hlsearch" | "hls" => self.hlsearch = defaults.hlsearch,
			"incsearch" | "is" => self.incsearch = defaults.incsearch,
			"wrapscan" | "ws" => self.wrapscan = defaults.wrapscan,
			"history" | "hi" => self.history = defaults.history,
			_ => {}
		}
		Ok(())
	}

	/// Case folding for a search pattern: `ignorecase` unless `smartcase` and the
	/// pattern contains an uppercase letter.
	pub fn fold_case(&self, pattern: &str) -> bool {
		if self.ignorecase && self.smartcase && pattern.chars().any(|c| c.is_uppercase()) {
			return false
		}
		self.ignorecase
	}
}

fn parse_number(name: &str, value: &str) -> Result<usize, String> {
	value.parse::<usize>().map_err(|_| format!("Number required: {name}={value}"))
}
