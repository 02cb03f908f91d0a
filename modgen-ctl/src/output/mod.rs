//! Styled terminal output for `modgen-ctl`.
//!
//! Generated file listings and summaries go to stdout; errors, warnings and
//! naming hints go to stderr so they survive `modgen-ctl generate ... > files.txt`.
//! `anstream` strips the styling when the stream is not a terminal.

mod styles;

use std::fmt::Display;
use std::io::Write;

use anstyle::Style;

pub(crate) use styles::clap_styles;

use styles::{DIM, ERROR, HEADER, HINT, LABEL, SUCCESS, WARNING};

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn emit(stream: Stream, style: Style, msg: impl Display) {
    match stream {
        Stream::Stdout => writeln!(anstream::stdout().lock(), "{style}{msg}{style:#}").ok(),
        Stream::Stderr => writeln!(anstream::stderr().lock(), "{style}{msg}{style:#}").ok(),
    };
}

pub(crate) fn success(msg: impl Display) {
    emit(Stream::Stdout, SUCCESS, format_args!("✓ {msg}"));
}

pub(crate) fn error(msg: impl Display) {
    emit(Stream::Stderr, ERROR, format_args!("✗ {msg}"));
}

pub(crate) fn warning(msg: impl Display) {
    emit(Stream::Stderr, WARNING, format_args!("! {msg}"));
}

pub(crate) fn header(msg: impl Display) {
    emit(Stream::Stdout, HEADER, msg);
}

/// `  Label: value`, label in bold.
pub(crate) fn label(name: impl Display, value: impl Display) {
    writeln!(anstream::stdout().lock(), "  {LABEL}{name}:{LABEL:#} {value}").ok();
}

pub(crate) fn dim(msg: impl Display) {
    emit(Stream::Stdout, DIM, msg);
}

pub(crate) fn hint(msg: impl Display) {
    emit(Stream::Stderr, HINT, msg);
}

/// One bulleted entry, e.g. a written file.
pub(crate) fn item(msg: impl Display) {
    writeln!(anstream::stdout().lock(), "  • {msg}").ok();
}

pub(crate) fn blank() {
    writeln!(anstream::stdout().lock()).ok();
}
