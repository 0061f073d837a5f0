//! How deskboard decides to render: output mode, colors, glyphs, width.

use std::io::IsTerminal;

use super::mode::{FormatFlag, OutputMode};

const FALLBACK_WIDTH: usize = 80;

/// What the process can tell about stdout and the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    pub is_tty: bool,
    pub dumb: bool,
    pub no_color: bool,
    pub width: Option<usize>,
}

impl Terminal {
    pub fn detect() -> Self {
        Self {
            is_tty: std::io::stdout().is_terminal(),
            dumb: std::env::var("TERM").is_ok_and(|term| term == "dumb"),
            no_color: std::env::var_os("NO_COLOR").is_some(),
            width: columns_env().or_else(tty_columns),
        }
    }
}

/// Rendering decisions shared by every command.
#[derive(Debug, Clone)]
pub struct UiContext {
    pub color: bool,
    /// Box-drawing and badge glyphs; off with `--ascii`
    pub unicode: bool,
    pub width: usize,
    pub mode: OutputMode,
}

impl UiContext {
    /// Resolve from the global `--no-color`/`--ascii` flags and a command's
    /// `--json`/`--format` flags.
    pub fn from_env(
        json: bool,
        format: Option<FormatFlag>,
        no_color: bool,
        ascii: bool,
    ) -> Self {
        Self::for_terminal(Terminal::detect(), json, format, no_color, ascii)
    }

    pub fn for_terminal(
        terminal: Terminal,
        json: bool,
        format: Option<FormatFlag>,
        no_color: bool,
        ascii: bool,
    ) -> Self {
        let mode = OutputMode::resolve(json, format, terminal.is_tty, terminal.dumb);
        Self {
            color: terminal.is_tty && !terminal.dumb && !terminal.no_color && !no_color,
            unicode: !ascii,
            width: terminal.width.unwrap_or(FALLBACK_WIDTH),
            mode,
        }
    }
}

fn columns_env() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|width| *width > 0)
}

#[cfg(unix)]
fn tty_columns() -> Option<usize> {
    let mut size = std::mem::MaybeUninit::<libc::winsize>::uninit();
    // SAFETY: TIOCGWINSZ fills the winsize on success and leaves it alone otherwise
    let status = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, size.as_mut_ptr()) };
    if status != 0 {
        return None;
    }
    // SAFETY: initialized by the successful ioctl above
    let size = unsafe { size.assume_init() };
    (size.ws_col > 0).then_some(usize::from(size.ws_col))
}

#[cfg(not(unix))]
fn tty_columns() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tty() -> Terminal {
        Terminal {
            is_tty: true,
            dumb: false,
            no_color: false,
            width: Some(120),
        }
    }

    #[test]
    fn test_tty_gets_pretty_colored_output() {
        let ui = UiContext::for_terminal(tty(), false, None, false, false);
        assert_eq!(ui.mode, OutputMode::Pretty);
        assert!(ui.color);
        assert_eq!(ui.width, 120);
    }

    #[test]
    fn test_pipe_gets_plain_output_without_color() {
        let piped = Terminal {
            is_tty: false,
            width: None,
            ..tty()
        };
        let ui = UiContext::for_terminal(piped, false, None, false, false);
        assert_eq!(ui.mode, OutputMode::Plain);
        assert!(!ui.color);
        assert_eq!(ui.width, FALLBACK_WIDTH);
    }

    #[test]
    fn test_color_switches() {
        let no_color_env = Terminal {
            no_color: true,
            ..tty()
        };
        assert!(!UiContext::for_terminal(no_color_env, false, None, false, false).color);
        assert!(!UiContext::for_terminal(tty(), false, None, true, false).color);

        let dumb = Terminal { dumb: true, ..tty() };
        let ui = UiContext::for_terminal(dumb, false, None, false, false);
        assert!(!ui.color);
        assert_eq!(ui.mode, OutputMode::Plain);
    }

    #[test]
    fn test_json_and_ascii_flags() {
        let ui = UiContext::for_terminal(tty(), true, None, false, true);
        assert_eq!(ui.mode, OutputMode::Json);
        assert!(!ui.unicode);

        let ui = UiContext::for_terminal(tty(), false, Some(FormatFlag::Plain), false, false);
        assert_eq!(ui.mode, OutputMode::Plain);
    }
}
