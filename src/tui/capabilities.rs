//! Terminal capability detection
//!
//! Decides whether raw single-key input and Unicode glyphs can be used.
//! Detection never fails; anything that cannot be probed counts as
//! unsupported, which selects the line-buffered simple mode.

use std::env;
use std::io::{self, IsTerminal};

/// Environment markers set by notebook front-ends
const NOTEBOOK_MARKERS: &[&str] = &["JPY_PARENT_PID", "COLAB_GPU", "BINDER_SERVICE_PORT"];

/// What the current terminal can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalCapabilities {
    /// Both stdin and stdout are attached to a terminal
    pub is_interactive_tty: bool,
    /// Running under a notebook host that proxies stdin/stdout
    pub is_notebook_like: bool,
    /// The user asked for the simple UI
    pub force_simple_mode: bool,
    /// The locale can display the menu's non-ASCII glyphs
    pub supports_unicode_glyph: bool,
}

impl TerminalCapabilities {
    /// Raw single-key reads are worth attempting
    pub fn supports_raw_input(&self) -> bool {
        self.is_interactive_tty && !self.is_notebook_like && !self.force_simple_mode
    }
}

/// Probes the environment, holding the configured simple-mode override
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityDetector {
    force_simple: bool,
}

impl CapabilityDetector {
    pub fn new(force_simple: bool) -> Self {
        Self { force_simple }
    }

    /// Query the real process environment
    pub fn detect(&self) -> TerminalCapabilities {
        let is_tty = io::stdin().is_terminal() && io::stdout().is_terminal();
        self.detect_with(is_tty, |key| env::var(key).ok())
    }

    /// Query through an injected TTY flag and environment lookup
    pub fn detect_with<F>(&self, is_tty: bool, lookup: F) -> TerminalCapabilities
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_notebook_like = NOTEBOOK_MARKERS
            .iter()
            .any(|key| lookup(key).is_some_and(|v| !v.is_empty()));

        TerminalCapabilities {
            is_interactive_tty: is_tty,
            is_notebook_like,
            force_simple_mode: self.force_simple,
            supports_unicode_glyph: locale_is_utf8(&lookup) || is_notebook_like,
        }
    }
}

/// First non-empty of LC_ALL, LC_CTYPE, LANG must name a UTF-8 codeset
fn locale_is_utf8<F>(lookup: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.is_empty())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("utf-8") || value.contains("utf8")
        })
        .unwrap_or(false)
}
