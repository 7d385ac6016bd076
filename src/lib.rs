//! `vicore` is a headless, modal text-editing engine that emulates Vim's
//! normal, insert, replace, visual, command-line and search modes over an
//! in-memory line-oriented buffer.
//!
//! A host (GUI shell, terminal UI, test harness) feeds the engine discrete key
//! events through [`ViEngine::process_key`] and consumes the stream of
//! [`ViEvent`]s each key produces: cursor movement, mode changes, text
//! changes, and host-level requests such as save, quit and tab manipulation.
//! The engine owns no I/O and no rendering; the platform clipboard and the
//! filesystem are reached through the small capabilities in [`capability`].
//!
//! ```
//! use vicore::ViEngine;
//!
//! let mut vim = ViEngine::with_text("hello world");
//! vim.process_keys("wdw");
//! assert_eq!(vim.text(), "hello ");
//! ```

pub mod buffer;
pub mod capability;
pub mod cursor;
pub mod event;
pub mod exec;
pub mod jumps;
pub mod keys;
pub mod mappings;
pub mod modes;
pub mod motion;
pub mod options;
pub mod register;
pub mod undo;
pub mod vicmd;

#[cfg(test)]
mod tests;

pub use buffer::TextBuffer;
pub use capability::{ClipboardProvider, FileIo};
pub use cursor::{CursorPosition, SelectKind, Selection};
pub use event::{Mode, ViEvent, ViewportAlign};
pub use exec::ViEngine;
pub use options::Options;
