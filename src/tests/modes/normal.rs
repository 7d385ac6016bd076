//! Parser-level tests: keys in, `ViCmd`s out, no buffer involved.

use pretty_assertions::assert_eq;

use crate::keys::{KeyEvent, ModKeys};
use crate::modes::normal::ViNormal;
use crate::modes::ViMode;
use crate::vicmd::{Dest, Direction, Motion, MotionCmd, TextObj, To, Verb, VerbCmd, ViCmd, Word};

fn feed(parser: &mut ViNormal, keys: &str) -> Vec<ViCmd> {
	let mut cmds = vec![];
	for ch in keys.chars() {
		let mut buf = [0u8; 4];
		let key = KeyEvent::new(ch.encode_utf8(&mut buf), ModKeys::NONE);
		if let Some(cmd) = parser.handle_key(key) {
			cmds.push(cmd);
		}
	}
	cmds
}

fn single(keys: &str) -> ViCmd {
	let mut parser = ViNormal::new();
	let cmds = feed(&mut parser, keys);
	assert_eq!(cmds.len(), 1, "expected exactly one completed command for {keys:?}");
	cmds.into_iter().next().unwrap()
}

#[test]
fn every_proper_prefix_is_incomplete() {
	let seq = "2d3w";
	for split in 1..seq.len() {
		let mut parser = ViNormal::new();
		let cmds = feed(&mut parser, &seq[..split]);
		assert!(cmds.is_empty(), "prefix {:?} completed early", &seq[..split]);
	}
	let cmd = single(seq);
	// Counts are normalized: 2 * 3 folds into the motion
	assert_eq!(cmd.verb, Some(VerbCmd(1, Verb::Delete)));
	assert_eq!(
		cmd.motion,
		Some(MotionCmd(6, Motion::WordMotion(To::Start, Word::Normal, Direction::Forward)))
	);
}

#[test]
fn double_operator_is_linewise() {
	let cmd = single("dd");
	assert_eq!(cmd.verb, Some(VerbCmd(1, Verb::Delete)));
	assert_eq!(cmd.motion, Some(MotionCmd(1, Motion::WholeLine)));

	let cmd = single("3yy");
	assert_eq!(cmd.motion, Some(MotionCmd(3, Motion::WholeLine)));
}

#[test]
fn register_prefix_routes() {
	let cmd = single("\"ayy");
	assert_eq!(cmd.register.name(), Some('a'));
	assert!(!cmd.register.is_append());

	let cmd = single("\"Add");
	assert_eq!(cmd.register.name(), Some('a'));
	assert!(cmd.register.is_append());

	let cmd = single("\"_dd");
	assert!(cmd.register.is_blackhole());
}

#[test]
fn leading_zero_is_a_motion_not_a_count() {
	let cmd = single("0");
	assert_eq!(cmd.motion, Some(MotionCmd(1, Motion::BeginningOfLine)));

	let cmd = single("10l");
	assert_eq!(cmd.motion, Some(MotionCmd(10, Motion::ForwardChar)));
}

#[test]
fn find_motion_waits_for_its_char() {
	let mut parser = ViNormal::new();
	assert!(feed(&mut parser, "df").is_empty());
	let cmds = feed(&mut parser, "x");
	assert_eq!(cmds.len(), 1);
	assert_eq!(
		cmds[0].motion,
		Some(MotionCmd(1, Motion::CharSearch(Direction::Forward, Dest::On, 'x')))
	);
}

#[test]
fn g_prefix_is_never_an_operator() {
	let cmd = single("gg");
	assert_eq!(cmd.motion, Some(MotionCmd(1, Motion::BeginningOfBuffer)));

	let cmd = single("5gg");
	assert_eq!(cmd.motion, Some(MotionCmd(1, Motion::GoToLine(5))));

	let cmd = single("ge");
	assert_eq!(
		cmd.motion,
		Some(MotionCmd(1, Motion::WordMotion(To::End, Word::Normal, Direction::Backward)))
	);

	let cmd = single("gt");
	assert_eq!(cmd.verb, Some(VerbCmd(1, Verb::NextTab)));
}

#[test]
fn counted_capital_g_is_absolute() {
	let cmd = single("42G");
	assert_eq!(cmd.motion, Some(MotionCmd(1, Motion::GoToLine(42))));

	let cmd = single("G");
	assert_eq!(cmd.motion, Some(MotionCmd(1, Motion::EndOfBuffer)));
}

#[test]
fn text_objects_require_an_operator() {
	// Bare `i` completes as insert-mode entry before any object char arrives
	let mut parser = ViNormal::new();
	let cmds = feed(&mut parser, "i");
	assert_eq!(cmds[0].verb, Some(VerbCmd(1, Verb::InsertMode)));

	let cmd = single("diw");
	assert_eq!(
		cmd.motion,
		Some(MotionCmd(1, Motion::TextObj(TextObj::Word(Word::Normal, crate::vicmd::Bound::Inside))))
	);
}

#[test]
fn invalid_sequence_resets_silently() {
	let mut parser = ViNormal::new();
	// `d` then an impossible motion clears the accumulator
	assert!(feed(&mut parser, "d!").is_empty());
	// The parser recovers immediately
	let cmds = feed(&mut parser, "x");
	assert_eq!(cmds.len(), 1);
	assert_eq!(cmds[0].verb, Some(VerbCmd(1, Verb::Delete)));
}

#[test]
fn mark_and_macro_keys_take_arguments() {
	let cmd = single("ma");
	assert_eq!(cmd.verb, Some(VerbCmd(1, Verb::SetMark('a'))));

	let cmd = single("`a");
	assert_eq!(cmd.motion, Some(MotionCmd(1, Motion::ToMark('a'))));

	let cmd = single("qa");
	assert_eq!(cmd.verb, Some(VerbCmd(1, Verb::RecordMacro('a'))));

	let cmd = single("@a");
	assert_eq!(cmd.verb, Some(VerbCmd(1, Verb::PlayMacro('a'))));

	let cmd = single("@@");
	assert_eq!(cmd.verb, Some(VerbCmd(1, Verb::PlayLastMacro)));
}

#[test]
fn escape_clears_pending_state() {
	let mut parser = ViNormal::new();
	assert!(feed(&mut parser, "2d").is_empty());
	parser.handle_key(KeyEvent::new("\u{1b}", ModKeys::NONE));
	// `w` alone is now a plain motion, not `d2w`
	let cmds = feed(&mut parser, "w");
	assert_eq!(cmds.len(), 1);
	assert!(cmds[0].verb.is_none());
	assert_eq!(cmds[0].motion, Some(MotionCmd(1, Motion::WordMotion(To::Start, Word::Normal, Direction::Forward))));
}
