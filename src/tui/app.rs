//! Interactive session state
//!
//! [`App`] owns every collaborator a screen or action talks to: the key
//! source, the output sink, the prompt and the command runner. The real
//! terminal is wired in [`App::new`]; tests swap parts with the `with_*`
//! builders.

use std::path::PathBuf;

use unicode_width::UnicodeWidthStr;

use crate::core::{CommandRunner, Config, Interrupt, PodEnvironment, SystemRunner};
use crate::error::Result;
use crate::tui::capabilities::CapabilityDetector;
use crate::tui::input::{KeySource, TerminalKeyReader};
use crate::tui::menu::{panel, MenuEngine, MenuSpec};
use crate::tui::prompt::{Prompt, StdinPrompt};
use crate::tui::screen::run_screen;
use crate::tui::screens::MainMenu;
use crate::tui::sink::{ConsoleSink, Line, OutputSink};
use crate::tui::theme::{Glyphs, Tone};

/// One interactive (or flag-driven) session
pub struct App {
    keys: Box<dyn KeySource>,
    out: Box<dyn OutputSink>,
    prompt: Box<dyn Prompt>,
    runner: Box<dyn CommandRunner>,
    interrupt: Interrupt,
    config: Config,
    env: PodEnvironment,
    glyphs: Glyphs,
}

impl App {
    /// Session on the real terminal
    pub fn new(config: Config) -> Self {
        let detector = CapabilityDetector::new(config.simple_ui);
        let glyphs = Glyphs::for_unicode(detector.detect().supports_unicode_glyph);
        let interrupt = Interrupt::new();

        Self {
            keys: Box::new(TerminalKeyReader::new(detector, interrupt.clone())),
            out: Box::new(ConsoleSink::new()),
            prompt: Box::new(StdinPrompt::new(interrupt.clone())),
            runner: Box::new(SystemRunner),
            interrupt,
            config,
            env: PodEnvironment::detect(),
            glyphs,
        }
    }

    pub fn with_keys(mut self, keys: impl KeySource + 'static) -> Self {
        self.keys = Box::new(keys);
        self
    }

    pub fn with_output(mut self, out: impl OutputSink + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Flag checked by attached commands and leaf actions; key sources built
    /// for tests take their own clone
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_env(mut self, env: PodEnvironment) -> Self {
        self.env = env;
        self
    }

    pub fn with_glyphs(mut self, glyphs: Glyphs) -> Self {
        self.glyphs = glyphs;
        self
    }

    /// Run the interactive menu tree until the user exits
    pub fn run(&mut self) -> Result<()> {
        tracing::info!(workspace = %self.config.workspace_dir.display(), "starting menu");
        run_screen(self, &mut MainMenu);
        self.say(Tone::Warning, "Goodbye!");
        Ok(())
    }

    /// Show a menu and return the chosen index
    pub fn menu(&mut self, spec: &MenuSpec) -> usize {
        MenuEngine::new(self.keys.as_mut(), self.out.as_mut(), self.glyphs).run(spec)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn env(&self) -> &PodEnvironment {
        &self.env
    }

    pub fn glyphs(&self) -> Glyphs {
        self.glyphs
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Ctrl-C flag shared with the key reader and the prompt
    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Path of a file inside the workspace directory
    pub fn workspace_file(&self, name: &str) -> PathBuf {
        self.config.workspace_file(name)
    }

    /// Print one status line
    pub fn say(&mut self, tone: Tone, message: impl Into<String>) {
        self.out.print(Line::styled(message, tone));
    }

    /// Print a pre-built line
    pub fn print(&mut self, line: Line) {
        self.out.print(line);
    }

    /// Print a bullet item
    pub fn bullet(&mut self, tone: Tone, message: impl Into<String>) {
        let line = Line::plain(format!("{} ", self.glyphs.bullet)).push(message, tone);
        self.out.print(line);
    }

    /// Print a `label: value` pair
    pub fn field(&mut self, label: &str, value: impl Into<String>) {
        let line = Line::styled(format!("{}: ", label), Tone::Heading).push(value, Tone::Normal);
        self.out.print(line);
    }

    pub fn blank(&mut self) {
        self.out.print(Line::new());
    }

    /// Clear the screen and show a boxed title
    pub fn heading(&mut self, title: &str) {
        self.out.clear();
        for line in panel(&[(title.to_string(), Tone::Title)], &self.glyphs) {
            self.out.print(line);
        }
    }

    /// Bold section label inside an action's output
    pub fn section(&mut self, title: &str) {
        self.blank();
        self.say(Tone::Heading, title);
    }

    /// Print rows as left-aligned columns under a header
    pub fn table(&mut self, header: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.width());
                }
            }
        }

        let pad = |cells: &[String]| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{}{}", cell, " ".repeat(w - cell.width())))
                .collect();
            format!("  {}", padded.join("  ").trim_end())
        };

        let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        let header_line = pad(header.as_slice());
        self.say(Tone::Heading, header_line);
        for row in rows {
            let line = pad(row.as_slice());
            self.say(Tone::Normal, line);
        }
    }

    /// Print a command's captured output verbatim
    pub fn echo(&mut self, text: &str) {
        for line in text.lines() {
            self.out.print(Line::plain(line));
        }
    }

    pub fn ask(&mut self, question: &str, default: Option<&str>) -> Option<String> {
        self.prompt.ask(question, default)
    }

    pub fn confirm(&mut self, question: &str, default: bool) -> bool {
        self.prompt.confirm(question, default)
    }

    pub fn pause(&mut self) {
        self.prompt.pause();
    }
}
