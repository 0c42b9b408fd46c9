//! The menu engine
//!
//! A single generic selectable list. Every menu in podrig is a [`MenuSpec`]
//! run through [`MenuEngine::run`], which only ever returns the chosen index;
//! what that index means is up to the caller.
//!
//! By convention the last option of every menu is "Back" or "Exit": Escape,
//! `q` and `b` all select it.

use unicode_width::UnicodeWidthStr;

use crate::error::{PodrigError, Result};
use crate::tui::input::{InputMode, KeyEvent, KeySource};
use crate::tui::sink::{Frame, Line, OutputSink};
use crate::tui::theme::{Glyphs, Tone};

/// Help shown when a menu does not provide its own
pub const DEFAULT_HELP: &[&str] = &[
    "Navigation: use the arrow keys to move, Enter to select.",
    "Selection: type an option number, then Enter.",
    "Exit/Back: press B to go back or Q to quit.",
    "Help: press H to show this help.",
    "Tip: in limited terminals, use numbers + Enter.",
];

/// One selectable entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    label: String,
    description: Option<String>,
}

impl MenuOption {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: Some(description.into()),
        }
    }

    pub fn label_only(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Build options from `(label, description)` pairs
pub fn options(items: &[(&str, &str)]) -> Vec<MenuOption> {
    items
        .iter()
        .map(|(label, desc)| MenuOption::new(*label, *desc))
        .collect()
}

/// Everything needed to show one menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSpec {
    title: String,
    subtitle: Option<String>,
    breadcrumbs: Vec<String>,
    options: Vec<MenuOption>,
    help_lines: Vec<String>,
}

impl MenuSpec {
    /// A menu needs at least one option
    pub fn new(title: impl Into<String>, options: Vec<MenuOption>) -> Result<Self> {
        let title = title.into();
        if options.is_empty() {
            return Err(PodrigError::EmptyMenu(title));
        }
        Ok(Self {
            title,
            subtitle: None,
            breadcrumbs: Vec::new(),
            options,
            help_lines: DEFAULT_HELP.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn breadcrumbs<I, S>(mut self, crumbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.breadcrumbs = crumbs.into_iter().map(Into::into).collect();
        self
    }

    pub fn help<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.help_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle_text(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn breadcrumb_trail(&self) -> &[String] {
        &self.breadcrumbs
    }

    pub fn options(&self) -> &[MenuOption] {
        &self.options
    }

    pub fn help_lines(&self) -> &[String] {
        &self.help_lines
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Index of the Back/Exit option
    pub fn last_index(&self) -> usize {
        self.options.len() - 1
    }
}

/// What an input event did to the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed; draw again
    Redraw,
    /// Nothing changed
    Ignore,
    /// The user chose this index
    Select(usize),
    /// Show the help overlay
    Help,
}

/// Cursor and pending digits of a running menu
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    cursor: usize,
    digit_buffer: String,
}

impl MenuState {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn digit_buffer(&self) -> &str {
        &self.digit_buffer
    }

    /// Apply one event to a menu of `len` options (`len >= 1`)
    pub fn apply(&mut self, event: &KeyEvent, mode: InputMode, len: usize) -> Transition {
        let last = len.saturating_sub(1);

        match event {
            KeyEvent::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                self.digit_buffer.clear();
                Transition::Redraw
            }
            KeyEvent::Down => {
                self.cursor = (self.cursor + 1).min(last);
                self.digit_buffer.clear();
                Transition::Redraw
            }
            KeyEvent::Number(n) => match mode {
                InputMode::Raw => {
                    self.digit_buffer.push_str(&n.to_string());
                    match one_based(&self.digit_buffer, len) {
                        Some(index) => {
                            self.cursor = index;
                            Transition::Redraw
                        }
                        None => Transition::Ignore,
                    }
                }
                InputMode::Line => match one_based(&n.to_string(), len) {
                    Some(index) => Transition::Select(index),
                    None => Transition::Ignore,
                },
            },
            KeyEvent::Enter => {
                if !self.digit_buffer.is_empty() {
                    if let Some(index) = one_based(&self.digit_buffer, len) {
                        return Transition::Select(index);
                    }
                }
                Transition::Select(self.cursor)
            }
            KeyEvent::Escape | KeyEvent::Letter('q') | KeyEvent::Letter('b') => {
                Transition::Select(last)
            }
            KeyEvent::Letter('h') => {
                self.digit_buffer.clear();
                Transition::Help
            }
            _ => Transition::Ignore,
        }
    }
}

/// Resolve a 1-based number to an index, if it names an option
fn one_based(digits: &str, len: usize) -> Option<usize> {
    digits
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}

/// Draw a box around title lines
pub fn panel(rows: &[(String, Tone)], glyphs: &Glyphs) -> Vec<Line> {
    let inner = rows.iter().map(|(text, _)| text.width()).max().unwrap_or(0) + 2;
    let rule = glyphs.horizontal.repeat(inner);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(Line::styled(
        format!("{}{}{}", glyphs.top_left, rule, glyphs.top_right),
        Tone::Title,
    ));
    for (text, tone) in rows {
        let pad = " ".repeat(inner - 1 - text.width());
        lines.push(
            Line::styled(format!("{} ", glyphs.vertical), Tone::Title)
                .push(text.clone(), *tone)
                .push(pad, Tone::Normal)
                .push(glyphs.vertical, Tone::Title),
        );
    }
    lines.push(Line::styled(
        format!("{}{}{}", glyphs.bottom_left, rule, glyphs.bottom_right),
        Tone::Title,
    ));
    lines
}

/// Renders a [`MenuSpec`] and turns key events into a selection
pub struct MenuEngine<'a> {
    keys: &'a mut dyn KeySource,
    out: &'a mut dyn OutputSink,
    glyphs: Glyphs,
}

impl<'a> MenuEngine<'a> {
    pub fn new(keys: &'a mut dyn KeySource, out: &'a mut dyn OutputSink, glyphs: Glyphs) -> Self {
        Self { keys, out, glyphs }
    }

    /// Show the menu until the user selects an option; returns its index
    pub fn run(&mut self, spec: &MenuSpec) -> usize {
        let mut state = MenuState::default();
        self.draw(spec, &state);

        loop {
            let event = self.keys.read_key();
            let mode = self.keys.input_mode();

            match state.apply(&event, mode, spec.len()) {
                Transition::Redraw => self.draw(spec, &state),
                Transition::Ignore => {}
                Transition::Select(index) => {
                    tracing::debug!(menu = spec.title(), index, "menu selection");
                    return index;
                }
                Transition::Help => {
                    self.show_help(spec);
                    self.draw(spec, &state);
                }
            }
        }
    }

    fn draw(&mut self, spec: &MenuSpec, state: &MenuState) {
        let frame = render_menu(spec, state, self.keys.input_mode(), &self.glyphs);
        self.out.draw(&frame);
    }

    fn show_help(&mut self, spec: &MenuSpec) {
        let frame = render_help(spec, self.keys.input_mode(), &self.glyphs);
        self.out.draw(&frame);

        loop {
            match self.keys.read_key() {
                KeyEvent::Enter
                | KeyEvent::Escape
                | KeyEvent::Letter('q')
                | KeyEvent::Letter('b')
                | KeyEvent::Letter('h') => return,
                _ => {}
            }
        }
    }
}

/// Frame for the option list
pub fn render_menu(spec: &MenuSpec, state: &MenuState, mode: InputMode, glyphs: &Glyphs) -> Frame {
    let mut lines = Vec::new();

    if !spec.breadcrumbs.is_empty() {
        let sep = format!(" {} ", glyphs.separator);
        lines.push(Line::styled(spec.breadcrumbs.join(&sep), Tone::Muted));
    }

    let mut header = vec![(spec.title.clone(), Tone::Title)];
    if let Some(subtitle) = &spec.subtitle {
        header.push((subtitle.clone(), Tone::Muted));
    }
    lines.extend(panel(&header, glyphs));
    lines.push(Line::new());

    let number_width = spec.len().to_string().len();
    let label_width = spec.options.iter().map(|o| o.label.width()).max().unwrap_or(0);

    for (i, option) in spec.options.iter().enumerate() {
        let selected = i == state.cursor;
        let marker = if selected { glyphs.pointer } else { " " };
        let (label_tone, desc_tone) = if selected {
            (Tone::Selected, Tone::Success)
        } else {
            (Tone::Normal, Tone::Muted)
        };

        let number = format!("{:>width$}.", i + 1, width = number_width);
        let pad = " ".repeat(label_width - option.label.width());
        let mut line = Line::styled(format!("  {} {} ", marker, number), label_tone)
            .push(option.label.clone(), label_tone);
        if let Some(desc) = &option.description {
            line = line.push(format!("{}   ", pad), Tone::Normal).push(desc.clone(), desc_tone);
        }
        lines.push(line);
    }

    lines.push(Line::new());
    let bullet = format!(" {} ", glyphs.bullet);
    let footer = match mode {
        InputMode::Raw => [
            format!("{} navigate", glyphs.arrows),
            "1-9 jump".to_string(),
            "Enter select".to_string(),
            "B back".to_string(),
            "Q quit".to_string(),
            "H help".to_string(),
        ]
        .join(&bullet),
        InputMode::Line => ["Type a number and press Enter", "B back", "Q quit", "H help"].join(&bullet),
    };
    lines.push(Line::styled(footer, Tone::Muted));

    Frame {
        clear: mode == InputMode::Raw,
        lines,
        prompt: (mode == InputMode::Line).then(|| "Select: ".to_string()),
    }
}

/// Frame for the help overlay
pub fn render_help(spec: &MenuSpec, mode: InputMode, glyphs: &Glyphs) -> Frame {
    let mut lines = panel(&[(format!("{} Help", spec.title), Tone::Title)], glyphs);
    lines.push(Line::new());
    for help in &spec.help_lines {
        lines.push(Line::plain(format!("  {} {}", glyphs.bullet, help)));
    }
    lines.push(Line::new());
    lines.push(Line::styled("Press Enter (or Esc) to return", Tone::Muted));

    Frame {
        clear: mode == InputMode::Raw,
        lines,
        prompt: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::input::ScriptedKeys;
    use crate::tui::sink::MemorySink;

    fn spec_of(n: usize) -> MenuSpec {
        let opts = (1..=n)
            .map(|i| MenuOption::new(format!("Option {}", i), "desc"))
            .collect();
        MenuSpec::new("Test", opts).unwrap()
    }

    fn run(spec: &MenuSpec, keys: &mut ScriptedKeys) -> (usize, MemorySink) {
        let sink = MemorySink::new();
        let mut out = sink.clone();
        let index = MenuEngine::new(keys, &mut out, Glyphs::ASCII).run(spec);
        (index, sink)
    }

    #[test]
    fn test_empty_menu_is_error() {
        let err = MenuSpec::new("Nothing", Vec::new()).unwrap_err();
        assert!(matches!(err, PodrigError::EmptyMenu(t) if t == "Nothing"));
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        // Deterministic pseudo-random walks over several menu sizes
        let mut seed: u32 = 0x2545_f491;
        for len in 1..=7 {
            let mut state = MenuState::default();
            for _ in 0..500 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                let event = if seed % 2 == 0 { KeyEvent::Up } else { KeyEvent::Down };
                let before = state.cursor();
                assert_eq!(state.apply(&event, InputMode::Raw, len), Transition::Redraw);
                assert!(state.cursor() < len);
                // Moves are single steps and never wrap
                assert!(state.cursor().abs_diff(before) <= 1);
            }
        }
    }

    #[test]
    fn test_up_at_top_and_down_at_bottom_clamp() {
        let mut state = MenuState::default();
        state.apply(&KeyEvent::Up, InputMode::Raw, 3);
        assert_eq!(state.cursor(), 0);
        for _ in 0..5 {
            state.apply(&KeyEvent::Down, InputMode::Raw, 3);
        }
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn test_line_number_selects_immediately() {
        let mut keys = ScriptedKeys::line([KeyEvent::Number(3)]);
        let (index, _) = run(&spec_of(5), &mut keys);
        assert_eq!(index, 2);
    }

    #[test]
    fn test_line_out_of_range_number_ignored() {
        let mut keys = ScriptedKeys::line([KeyEvent::Number(0), KeyEvent::Number(9), KeyEvent::Number(1)]);
        let (index, sink) = run(&spec_of(5), &mut keys);
        assert_eq!(index, 0);
        // Ignored numbers do not redraw
        assert_eq!(sink.frames().len(), 1);
    }

    #[test]
    fn test_raw_down_down_enter() {
        let mut keys = ScriptedKeys::raw([KeyEvent::Down, KeyEvent::Down, KeyEvent::Enter]);
        let (index, sink) = run(&spec_of(5), &mut keys);
        assert_eq!(index, 2);
        assert_eq!(sink.frames().len(), 3);
    }

    #[test]
    fn test_escape_selects_last() {
        for n in 1..=8 {
            let mut keys = ScriptedKeys::raw([KeyEvent::Escape]);
            assert_eq!(run(&spec_of(n), &mut keys).0, n - 1);

            // End of input in line mode reads as Escape
            let mut keys = ScriptedKeys::line(Vec::new());
            assert_eq!(run(&spec_of(n), &mut keys).0, n - 1);
        }
    }

    #[test]
    fn test_q_and_b_select_last() {
        let mut keys = ScriptedKeys::raw([KeyEvent::Down, KeyEvent::Letter('q')]);
        assert_eq!(run(&spec_of(4), &mut keys).0, 3);
        let mut keys = ScriptedKeys::line([KeyEvent::Letter('b')]);
        assert_eq!(run(&spec_of(4), &mut keys).0, 3);
    }

    #[test]
    fn test_raw_multi_digit_jump() {
        let mut keys = ScriptedKeys::raw([KeyEvent::Number(1), KeyEvent::Number(2), KeyEvent::Enter]);
        let (index, _) = run(&spec_of(15), &mut keys);
        assert_eq!(index, 11);
    }

    #[test]
    fn test_raw_digit_moves_cursor_without_selecting() {
        let mut state = MenuState::default();
        assert_eq!(state.apply(&KeyEvent::Number(4), InputMode::Raw, 5), Transition::Redraw);
        assert_eq!(state.cursor(), 3);
        assert_eq!(state.digit_buffer(), "4");
    }

    #[test]
    fn test_invalid_buffer_cleared_by_navigation() {
        let mut state = MenuState::default();
        state.apply(&KeyEvent::Number(9), InputMode::Raw, 15);
        assert_eq!(state.cursor(), 8);
        assert_eq!(state.apply(&KeyEvent::Number(9), InputMode::Raw, 15), Transition::Ignore);
        assert_eq!(state.digit_buffer(), "99");
        assert_eq!(state.cursor(), 8);

        state.apply(&KeyEvent::Down, InputMode::Raw, 15);
        assert_eq!(state.digit_buffer(), "");
        assert_eq!(state.cursor(), 9);
    }

    #[test]
    fn test_enter_with_invalid_buffer_selects_cursor() {
        let mut state = MenuState::default();
        state.apply(&KeyEvent::Number(2), InputMode::Raw, 3);
        state.apply(&KeyEvent::Number(7), InputMode::Raw, 3);
        assert_eq!(state.apply(&KeyEvent::Enter, InputMode::Raw, 3), Transition::Select(1));
    }

    #[test]
    fn test_zero_digit_stays_buffered() {
        let mut state = MenuState::default();
        assert_eq!(state.apply(&KeyEvent::Number(0), InputMode::Raw, 5), Transition::Ignore);
        assert_eq!(state.apply(&KeyEvent::Number(3), InputMode::Raw, 5), Transition::Redraw);
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn test_unknown_input_ignored() {
        let mut keys = ScriptedKeys::raw([
            KeyEvent::Text("?".into()),
            KeyEvent::Letter('x'),
            KeyEvent::Down,
            KeyEvent::Enter,
        ]);
        let (index, sink) = run(&spec_of(3), &mut keys);
        assert_eq!(index, 1);
        // Initial draw plus the Down redraw only
        assert_eq!(sink.frames().len(), 2);
    }

    #[test]
    fn test_help_preserves_cursor() {
        let spec = spec_of(4).help(["Custom help line"]);
        let mut keys = ScriptedKeys::raw([
            KeyEvent::Down,
            KeyEvent::Down,
            KeyEvent::Letter('h'),
            KeyEvent::Up,
            KeyEvent::Letter('x'),
            KeyEvent::Enter,
            KeyEvent::Enter,
        ]);
        let (index, sink) = run(&spec, &mut keys);
        // Keys inside the overlay do not move the cursor
        assert_eq!(index, 2);

        let frames = sink.frames();
        let help = &frames[3];
        assert!(help.text().contains("Test Help"));
        assert!(help.text().contains("Custom help line"));
        assert!(frames[4].text().contains("> 3. Option 3"));
    }

    #[test]
    fn test_render_contents() {
        let spec = MenuSpec::new(
            "File Transfer Options",
            options(&[("Croc", "peer to peer"), ("SFTP", "direct"), ("Back", "Return")]),
        )
        .unwrap()
        .subtitle("Pick one")
        .breadcrumbs(["Home", "File Transfer"]);

        let frame = render_menu(&spec, &MenuState::default(), InputMode::Raw, &Glyphs::ASCII);
        let text = frame.text();
        assert!(frame.clear);
        assert!(frame.prompt.is_none());
        assert!(text.starts_with("Home > File Transfer"));
        assert!(text.contains("| File Transfer Options |"));
        assert!(text.contains("  > 1. Croc   peer to peer"));
        assert!(text.contains("    2. SFTP   direct"));
        assert!(text.contains("Up/Down navigate"));

        let frame = render_menu(&spec, &MenuState::default(), InputMode::Line, &Glyphs::UNICODE);
        assert!(!frame.clear);
        assert_eq!(frame.prompt.as_deref(), Some("Select: "));
        assert!(frame.text().contains("Home › File Transfer"));
        assert!(frame.text().contains("► 1. Croc"));
    }
}
