//! Unit tests for the ex command-line parser.

use pretty_assertions::assert_eq;

use crate::modes::ex::{parse_ex_cmd, ExKind, ExRange, MapTarget, SubFlags};
use crate::vicmd::{Direction, LineAddr};

fn parse(raw: &str) -> crate::modes::ex::ExCommand {
	parse_ex_cmd(raw, None)
		.expect("parse succeeds")
		.expect("non-empty command")
}

#[test]
fn quit_variants() {
	assert_eq!(parse("q").kind, ExKind::Quit { force: false, all: false });
	assert_eq!(parse("q!").kind, ExKind::Quit { force: true, all: false });
	assert_eq!(parse("qall!").kind, ExKind::Quit { force: true, all: true });
	assert_eq!(parse("quit").kind, ExKind::Quit { force: false, all: false });
}

#[test]
fn write_variants() {
	assert_eq!(parse("w").kind, ExKind::Write { path: None, quit: false });
	assert_eq!(
		parse("w /tmp/out.txt").kind,
		ExKind::Write { path: Some("/tmp/out.txt".into()), quit: false }
	);
	assert_eq!(parse("wq").kind, ExKind::Write { path: None, quit: true });
	assert_eq!(parse("x").kind, ExKind::Write { path: None, quit: true });
}

#[test]
fn percent_range() {
	let cmd = parse("%s/a/b/");
	assert_eq!(
		cmd.range,
		Some(ExRange { start: LineAddr::Number(1), end: LineAddr::Last })
	);
}

#[test]
fn numeric_and_symbolic_ranges() {
	let cmd = parse("2,5s/a/b/");
	assert_eq!(
		cmd.range,
		Some(ExRange { start: LineAddr::Number(2), end: LineAddr::Number(5) })
	);

	let cmd = parse(".,$s/a/b/");
	assert_eq!(
		cmd.range,
		Some(ExRange { start: LineAddr::Current, end: LineAddr::Last })
	);

	let cmd = parse("+2");
	assert_eq!(
		cmd.range,
		Some(ExRange { start: LineAddr::Offset(2), end: LineAddr::Offset(2) })
	);
	assert_eq!(cmd.kind, ExKind::GoToLine);
}

#[test]
fn substitute_flags() {
	let ExKind::Substitute { pattern, replacement, flags } = parse("s/foo/bar/gi").kind else {
		panic!("not a substitute")
	};
	assert_eq!(pattern, "foo");
	assert_eq!(replacement, "bar");
	assert!(flags.contains(SubFlags::GLOBAL));
	assert!(flags.contains(SubFlags::IGNORE_CASE));
}

#[test]
fn substitute_escaped_delimiter() {
	let ExKind::Substitute { pattern, replacement, .. } = parse(r"s/a\/b/c/").kind else {
		panic!("not a substitute")
	};
	assert_eq!(pattern, "a/b");
	assert_eq!(replacement, "c");
}

#[test]
fn substitute_missing_trailing_delimiter() {
	let ExKind::Substitute { pattern, replacement, flags } = parse("s/foo/bar").kind else {
		panic!("not a substitute")
	};
	assert_eq!(pattern, "foo");
	assert_eq!(replacement, "bar");
	assert!(flags.is_empty());
}

#[test]
fn map_commands() {
	let ExKind::Map { target, lhs, rhs, noremap } = parse("nnoremap Q dd").kind else {
		panic!("not a map")
	};
	assert_eq!(target, MapTarget::Normal);
	assert_eq!(lhs, "Q");
	assert_eq!(rhs, "dd");
	assert!(noremap);

	let ExKind::Map { target, noremap, .. } = parse("vmap x y").kind else {
		panic!("not a map")
	};
	assert_eq!(target, MapTarget::Visual);
	assert!(!noremap);
}

#[test]
fn tab_and_buffer_commands() {
	assert_eq!(parse("tabe notes.md").kind, ExKind::TabNew(Some("notes.md".into())));
	assert_eq!(parse("tabn").kind, ExKind::TabNext);
	assert_eq!(parse("bd!").kind, ExKind::BufferDelete { force: true });
	assert_eq!(parse("b 3").kind, ExKind::BufferGo(3));
	assert_eq!(parse("sp").kind, ExKind::Split { vertical: false });
	assert_eq!(parse("vs").kind, ExKind::Split { vertical: true });
}

#[test]
fn unknown_command_is_an_error() {
	assert!(parse_ex_cmd("nonsense", None).is_err());
}

#[test]
fn empty_line_is_nothing() {
	assert!(parse_ex_cmd("", None).unwrap().is_none());
	assert!(parse_ex_cmd("   ", None).unwrap().is_none());
}

#[test]
fn visual_range_is_picked_up() {
	let cmd = parse_ex_cmd("s/a/b/", Some((2, 4))).unwrap().unwrap();
	assert_eq!(
		cmd.range,
		Some(ExRange { start: LineAddr::Number(2), end: LineAddr::Number(4) })
	);
}

#[test]
fn search_pattern_addresses() {
	let cmd = parse("/foo/,/bar/s/x/y/");
	assert_eq!(
		cmd.range,
		Some(ExRange {
			start: LineAddr::Pattern("foo".into(), Direction::Forward),
			end: LineAddr::Pattern("bar".into(), Direction::Forward),
		})
	);
}
