//! Output mode routing logic.

use clap::ValueEnum;

/// Value of the `--format` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatFlag {
    /// Tables and colors when stdout is a terminal
    Pretty,
    /// Stable `key=value` and space-separated rows
    Plain,
    /// Machine-readable JSON
    Json,
}

/// Output mode determines how results are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Machine-readable JSON output only
    Json,
    /// Plain text, stable for logs and scripts
    #[default]
    Plain,
    /// Human-friendly with colors and formatting (TTY only)
    Pretty,
}

impl OutputMode {
    /// Resolve output mode from flags and environment.
    ///
    /// Routing rules:
    /// 1. `--json` or `--format json` is exclusive
    /// 2. `--format plain` forces plain
    /// 3. `TERM=dumb` forces plain
    /// 4. Pretty only when stdout is a TTY, even with `--format pretty`
    pub fn resolve(
        json_flag: bool,
        format_flag: Option<FormatFlag>,
        is_tty: bool,
        term_is_dumb: bool,
    ) -> Self {
        match (json_flag, format_flag) {
            (true, _) | (_, Some(FormatFlag::Json)) => Self::Json,
            (_, Some(FormatFlag::Plain)) => Self::Plain,
            _ if term_is_dumb || !is_tty => Self::Plain,
            _ => Self::Pretty,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_wins_over_format() {
        let mode = OutputMode::resolve(true, Some(FormatFlag::Plain), true, false);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn test_format_json_without_flag() {
        let mode = OutputMode::resolve(false, Some(FormatFlag::Json), false, false);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn test_plain_forces() {
        let mode = OutputMode::resolve(false, Some(FormatFlag::Plain), true, false);
        assert_eq!(mode, OutputMode::Plain);
    }

    #[test]
    fn test_term_dumb_forces_plain() {
        let mode = OutputMode::resolve(false, None, true, true);
        assert_eq!(mode, OutputMode::Plain);
    }

    #[test]
    fn test_tty_gets_pretty() {
        assert_eq!(OutputMode::resolve(false, None, true, false), OutputMode::Pretty);
        assert_eq!(
            OutputMode::resolve(false, Some(FormatFlag::Pretty), true, false),
            OutputMode::Pretty
        );
    }

    #[test]
    fn test_pretty_request_off_tty_stays_plain() {
        let mode = OutputMode::resolve(false, Some(FormatFlag::Pretty), false, false);
        assert_eq!(mode, OutputMode::Plain);
    }
}
