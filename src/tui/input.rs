//! Key input for menus
//!
//! Produces one normalized [`KeyEvent`] per call, either from a raw-mode
//! terminal (single keystrokes) or from line-buffered stdin.

use std::collections::VecDeque;
use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::core::Interrupt;
use crate::error::{PodrigError, Result};
use crate::tui::capabilities::CapabilityDetector;

/// A normalized input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Up,
    Down,
    Enter,
    Escape,
    /// A digit in raw mode, a whole number in line mode
    Number(u64),
    /// A single letter, lowercased
    Letter(char),
    /// Anything else that was typed
    Text(String),
}

/// How a key was (or will be) read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// One keystroke at a time
    Raw,
    /// A whole line after Enter
    Line,
}

/// Source of key events for the menu engine
pub trait KeySource {
    /// Block until the next event
    fn read_key(&mut self) -> KeyEvent;

    /// Mode used by the most recent read, or the mode the next read will try
    fn input_mode(&self) -> InputMode;
}

/// Holds the terminal in raw mode; restores the previous mode on drop
pub struct RawModeGuard {
    restore: bool,
}

impl RawModeGuard {
    pub fn acquire() -> Result<Self> {
        let already = terminal::is_raw_mode_enabled()
            .map_err(|e| PodrigError::TerminalInput(e.to_string()))?;
        if !already {
            terminal::enable_raw_mode().map_err(|e| PodrigError::TerminalInput(e.to_string()))?;
        }
        Ok(Self { restore: !already })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.restore {
            if let Err(e) = terminal::disable_raw_mode() {
                tracing::warn!("Failed to restore terminal mode: {}", e);
            }
        }
    }
}

/// Translate a crossterm key press
///
/// Ctrl-C and Ctrl-D read as Escape. Other control chords never count as
/// menu letters.
pub fn map_key(key: &TermKeyEvent) -> KeyEvent {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => KeyEvent::Escape,
            KeyCode::Char(c) => KeyEvent::Text(format!("^{}", c.to_ascii_uppercase())),
            _ => KeyEvent::Text(String::new()),
        };
    }

    match key.code {
        KeyCode::Up => KeyEvent::Up,
        KeyCode::Down => KeyEvent::Down,
        KeyCode::Enter => KeyEvent::Enter,
        KeyCode::Esc => KeyEvent::Escape,
        KeyCode::Char(c) => match c.to_digit(10) {
            Some(d) => KeyEvent::Number(u64::from(d)),
            None if c.is_alphabetic() => KeyEvent::Letter(c.to_ascii_lowercase()),
            None => KeyEvent::Text(c.to_string()),
        },
        _ => KeyEvent::Text(String::new()),
    }
}

/// Read one key press in raw mode
fn read_raw_key() -> Result<KeyEvent> {
    let _guard = RawModeGuard::acquire()?;

    loop {
        let evt = event::read().map_err(|e| PodrigError::TerminalInput(e.to_string()))?;
        if let Event::Key(key) = evt {
            if key.kind != KeyEventKind::Release {
                return Ok(map_key(&key));
            }
        }
    }
}

/// Classify one line of line-buffered input
pub fn parse_line(line: &str) -> KeyEvent {
    let line = line.trim();
    if line.is_empty() {
        return KeyEvent::Enter;
    }

    if line.chars().all(|c| c.is_ascii_digit()) {
        return match line.parse::<u64>() {
            Ok(n) => KeyEvent::Number(n),
            Err(_) => KeyEvent::Text(line.to_string()),
        };
    }

    let mut chars = line.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_alphabetic() {
            return KeyEvent::Letter(c.to_ascii_lowercase());
        }
    }

    KeyEvent::Text(line.to_string())
}

/// Classify the outcome of one line read
///
/// End of input, a read error and a raised interrupt all read as Escape. A
/// line typed after Ctrl-C is discarded.
pub fn line_key(read: io::Result<usize>, line: &str, interrupt: &Interrupt) -> KeyEvent {
    if interrupt.take() {
        tracing::debug!("line read interrupted");
        return KeyEvent::Escape;
    }
    match read {
        Ok(0) => KeyEvent::Escape,
        Ok(_) => parse_line(line),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => KeyEvent::Escape,
        Err(e) => {
            tracing::debug!("Line input failed: {}", e);
            KeyEvent::Escape
        }
    }
}

type RawRead = Box<dyn FnMut() -> Result<KeyEvent>>;
type LineRead = Box<dyn FnMut(&mut String) -> io::Result<usize>>;

/// Key reader for the real terminal
///
/// Capabilities are checked on every read; a failed raw read falls back to
/// line input for that read.
pub struct TerminalKeyReader {
    raw_supported: Box<dyn Fn() -> bool>,
    raw: RawRead,
    line: LineRead,
    interrupt: Interrupt,
    mode: InputMode,
}

impl TerminalKeyReader {
    pub fn new(detector: CapabilityDetector, interrupt: Interrupt) -> Self {
        Self::with_sources(
            move || detector.detect().supports_raw_input(),
            read_raw_key,
            // Shares stdin's buffer with the prompts
            |buf: &mut String| io::stdin().read_line(buf),
            interrupt,
        )
    }

    /// Reader over explicit raw and line sources
    pub fn with_sources(
        raw_supported: impl Fn() -> bool + 'static,
        raw: impl FnMut() -> Result<KeyEvent> + 'static,
        line: impl FnMut(&mut String) -> io::Result<usize> + 'static,
        interrupt: Interrupt,
    ) -> Self {
        let mode = if raw_supported() {
            InputMode::Raw
        } else {
            InputMode::Line
        };
        Self {
            raw_supported: Box::new(raw_supported),
            raw: Box::new(raw),
            line: Box::new(line),
            interrupt,
            mode,
        }
    }

    fn read_line_key(&mut self) -> KeyEvent {
        self.mode = InputMode::Line;
        if self.interrupt.take() {
            return KeyEvent::Escape;
        }
        let mut line = String::new();
        let read = (self.line)(&mut line);
        line_key(read, &line, &self.interrupt)
    }
}

impl KeySource for TerminalKeyReader {
    fn read_key(&mut self) -> KeyEvent {
        if (self.raw_supported)() {
            match (self.raw)() {
                Ok(key) => {
                    self.mode = InputMode::Raw;
                    return key;
                }
                Err(e) => tracing::debug!("Raw input unavailable, using line input: {}", e),
            }
        }

        self.read_line_key()
    }

    fn input_mode(&self) -> InputMode {
        self.mode
    }
}

/// Replays a fixed sequence of events; reads Escape once exhausted
pub struct ScriptedKeys {
    keys: VecDeque<KeyEvent>,
    mode: InputMode,
}

impl ScriptedKeys {
    pub fn new(mode: InputMode, keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            mode,
        }
    }

    pub fn raw(keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self::new(InputMode::Raw, keys)
    }

    pub fn line(keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self::new(InputMode::Line, keys)
    }

    /// Events not consumed yet
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl KeySource for ScriptedKeys {
    fn read_key(&mut self) -> KeyEvent {
        self.keys.pop_front().unwrap_or(KeyEvent::Escape)
    }

    fn input_mode(&self) -> InputMode {
        self.mode
    }
}

/// Line source for tests. A `None` entry raises `interrupt` and then
/// delivers "1", as if the user pressed Ctrl-C and typed a choice.
#[cfg(test)]
pub(crate) fn scripted_lines(
    lines: Vec<Option<&'static str>>,
    interrupt: Interrupt,
) -> impl FnMut(&mut String) -> io::Result<usize> {
    let mut lines: VecDeque<Option<&'static str>> = lines.into();
    move |buf: &mut String| match lines.pop_front() {
        Some(Some(line)) => {
            buf.push_str(line);
            Ok(line.len())
        }
        Some(None) => {
            interrupt.raise();
            buf.push_str("1\n");
            Ok(2)
        }
        None => Ok(0),
    }
}
