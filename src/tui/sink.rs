//! Output sinks
//!
//! Everything podrig shows goes through an [`OutputSink`]. The console sink
//! writes styled text to stdout; the memory sink records it for tests.

use std::cell::RefCell;
use std::io::{self, IsTerminal, Stdout, Write};
use std::rc::Rc;

use crossterm::cursor::MoveTo;
use crossterm::style::{Print, PrintStyledContent, StyledContent};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;

use crate::tui::theme::{Theme, Tone};

/// A run of text with one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
}

impl Span {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// One line of output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, Tone::Normal)
    }

    pub fn styled(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            spans: vec![Span::new(text, tone)],
        }
    }

    pub fn push(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.spans.push(Span::new(text, tone));
        self
    }

    /// The line without styling
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// A complete screenful
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Clear the screen before drawing
    pub clear: bool,
    pub lines: Vec<Line>,
    /// Text left on the last line, without a newline, before input is read
    pub prompt: Option<String>,
}

impl Frame {
    /// All lines as plain text, newline separated
    pub fn text(&self) -> String {
        let mut out: Vec<String> = self.lines.iter().map(Line::text).collect();
        if let Some(prompt) = &self.prompt {
            out.push(prompt.clone());
        }
        out.join("\n")
    }
}

/// Destination for rendered output
pub trait OutputSink {
    /// Draw a full frame
    fn draw(&mut self, frame: &Frame);

    /// Append a single line
    fn print(&mut self, line: Line);

    /// Clear the display if the sink supports it
    fn clear(&mut self) {}
}

/// `\r\n` on a terminal, which may still be in raw mode; plain `\n` for
/// pipes and notebooks
fn line_end(terminal: bool) -> &'static str {
    if terminal {
        "\r\n"
    } else {
        "\n"
    }
}

/// Writes to stdout, coloured when stdout is a terminal
pub struct ConsoleSink {
    out: Stdout,
    color: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        let out = io::stdout();
        let color = out.is_terminal();
        Self { out, color }
    }

    fn queue_line(&mut self, line: &Line) -> io::Result<()> {
        for span in &line.spans {
            if self.color && span.tone != Tone::Normal {
                queue!(
                    self.out,
                    PrintStyledContent(StyledContent::new(Theme::style(span.tone), span.text.as_str()))
                )?;
            } else {
                queue!(self.out, Print(&span.text))?;
            }
        }
        queue!(self.out, Print(line_end(self.color)))
    }

    fn queue_clear(&mut self) -> io::Result<()> {
        if self.color {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        Ok(())
    }

    fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        if frame.clear {
            self.queue_clear()?;
        }
        for line in &frame.lines {
            self.queue_line(line)?;
        }
        if let Some(prompt) = &frame.prompt {
            queue!(self.out, Print(prompt))?;
        }
        self.out.flush()
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for ConsoleSink {
    fn draw(&mut self, frame: &Frame) {
        self.write_frame(frame).ok();
    }

    fn print(&mut self, line: Line) {
        if self.queue_line(&line).is_ok() {
            self.out.flush().ok();
        }
    }

    fn clear(&mut self) {
        if self.queue_clear().is_ok() {
            self.out.flush().ok();
        }
    }
}

/// Something a [`MemorySink`] recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Frame(Frame),
    Line(Line),
    Clear,
}

/// Records output in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    log: Rc<RefCell<Vec<Recorded>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All frames drawn so far
    pub fn frames(&self) -> Vec<Frame> {
        self.log
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Recorded::Frame(f) => Some(f.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent frame
    pub fn last_frame(&self) -> Option<Frame> {
        self.frames().pop()
    }

    /// Everything recorded, as plain text
    pub fn text(&self) -> String {
        self.log
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Recorded::Frame(f) => Some(f.text()),
                Recorded::Line(l) => Some(l.text()),
                Recorded::Clear => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lines printed with the given tone
    pub fn lines_with(&self, tone: Tone) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|r| match r {
                Recorded::Line(l) if l.spans.iter().any(|s| s.tone == tone) => Some(l.text()),
                _ => None,
            })
            .collect()
    }
}

impl OutputSink for MemorySink {
    fn draw(&mut self, frame: &Frame) {
        self.log.borrow_mut().push(Recorded::Frame(frame.clone()));
    }

    fn print(&mut self, line: Line) {
        self.log.borrow_mut().push(Recorded::Line(line));
    }

    fn clear(&mut self) {
        self.log.borrow_mut().push(Recorded::Clear);
    }
}
