//! Palette for terminal output and `--help`.

use anstyle::{AnsiColor, Color, Effects, Style};

const fn fg(color: AnsiColor) -> Style {
    Style::new().fg_color(Some(Color::Ansi(color)))
}

pub(crate) const SUCCESS: Style = fg(AnsiColor::Green);
pub(crate) const ERROR: Style = fg(AnsiColor::Red);
pub(crate) const WARNING: Style = fg(AnsiColor::Yellow);

/// Module headers and the label half of "Label: value" lines.
pub(crate) const HEADER: Style = Style::new().effects(Effects::BOLD);
pub(crate) const LABEL: Style = HEADER;

/// Extraction paths and other secondary detail.
pub(crate) const DIM: Style = Style::new().effects(Effects::DIMMED);
/// Notes about how outputs were named.
pub(crate) const HINT: Style = DIM;

/// Help styling: green section headers, cyan flags and value names.
pub(crate) fn clap_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .header(fg(AnsiColor::Green).effects(Effects::BOLD))
        .usage(fg(AnsiColor::Green).effects(Effects::BOLD))
        .literal(fg(AnsiColor::Cyan).effects(Effects::BOLD))
        .placeholder(fg(AnsiColor::Cyan))
        .error(fg(AnsiColor::Red).effects(Effects::BOLD))
}
