//! Color resolution: determines whether to emit ANSI color codes.
//!
//! Priority chain (highest first):
//! 1. `NO_COLOR` env (any value) → false
//! 2. `CLICOLOR_FORCE=1` env → true
//! 3. Config `"always"` or `"true"` → true
//! 4. Config `"never"` or `"false"` → false
//! 5. `CLICOLOR=0` env → false
//! 6. TTY detection on stdout → true if terminal, false otherwise

// ---------------------------------------------------------------------------
// ANSI escape constants
// ---------------------------------------------------------------------------
//
// Suites and tests differ by weight as well as hue, so the tree stays
// readable without color perception.

/// Reset all attributes.
pub const RESET: &str = "\x1b[0m";
/// File paths: magenta + bold.
pub const FILE: &str = "\x1b[35m\x1b[1m";
/// Line numbers: green.
pub const LINE_NO: &str = "\x1b[32m";
/// Separators (colons): cyan.
pub const SEP: &str = "\x1b[36m";
/// Suite names: blue + bold.
pub const SUITE: &str = "\x1b[34m\x1b[1m";
/// Test names: plain yellow.
pub const TEST: &str = "\x1b[33m";

// ---------------------------------------------------------------------------
// Color resolution
// ---------------------------------------------------------------------------

/// Resolve whether to use color based on environment variables, config, and TTY.
pub fn resolve_color(config_color: &str) -> bool {
    use std::io::IsTerminal;

    let no_color = std::env::var_os("NO_COLOR").is_some();
    let clicolor_force = std::env::var("CLICOLOR_FORCE").ok();
    let clicolor = std::env::var("CLICOLOR").ok();
    resolve_color_inner(
        no_color,
        clicolor_force.as_deref(),
        config_color,
        clicolor.as_deref(),
        std::io::stdout().is_terminal(),
    )
}

/// Inner resolution logic, parameterized so tests need no environment.
fn resolve_color_inner(
    no_color: bool,
    clicolor_force: Option<&str>,
    config_color: &str,
    clicolor: Option<&str>,
    is_tty: bool,
) -> bool {
    if no_color {
        return false;
    }
    if clicolor_force == Some("1") {
        return true;
    }
    match config_color {
        "always" | "true" => return true,
        "never" | "false" => return false,
        _ => {} // "auto" or unrecognized
    }
    if clicolor == Some("0") {
        return false;
    }
    is_tty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_color_wins_over_everything() {
        assert!(!resolve_color_inner(true, Some("1"), "always", None, true));
    }

    #[test]
    fn clicolor_force_overrides_config_never() {
        assert!(resolve_color_inner(false, Some("1"), "never", None, false));
    }

    #[test]
    fn config_values() {
        assert!(resolve_color_inner(false, None, "always", Some("0"), false));
        assert!(resolve_color_inner(false, None, "true", None, false));
        assert!(!resolve_color_inner(false, None, "never", None, true));
        assert!(!resolve_color_inner(false, None, "false", None, true));
    }

    #[test]
    fn auto_mode_follows_clicolor_then_tty() {
        assert!(!resolve_color_inner(false, None, "auto", Some("0"), true));
        assert!(resolve_color_inner(false, None, "auto", None, true));
        assert!(!resolve_color_inner(false, None, "auto", None, false));
        assert!(!resolve_color_inner(false, None, "bogus", None, false));
    }
}
