//! TUI theme, styles and glyphs

use crossterm::style::{Attribute, Color, ContentStyle};

/// Semantic style of a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Normal,
    Muted,
    Title,
    Heading,
    Selected,
    Info,
    Success,
    Warning,
    Error,
}

/// Application color theme
pub struct Theme;

impl Theme {
    /// Primary accent color
    pub const PRIMARY: Color = Color::Blue;

    /// Secondary accent color
    pub const SECONDARY: Color = Color::Cyan;

    /// Success color
    pub const SUCCESS: Color = Color::Green;

    /// Error color
    pub const ERROR: Color = Color::Red;

    /// Warning color
    pub const WARNING: Color = Color::Yellow;

    /// Muted text color
    pub const MUTED: Color = Color::DarkGrey;

    /// Terminal style for a tone
    pub fn style(tone: Tone) -> ContentStyle {
        let mut style = ContentStyle::new();
        match tone {
            Tone::Normal => {}
            Tone::Muted => style.foreground_color = Some(Self::MUTED),
            Tone::Title => {
                style.foreground_color = Some(Self::PRIMARY);
                style.attributes.set(Attribute::Bold);
            }
            Tone::Heading => {
                style.foreground_color = Some(Self::SECONDARY);
                style.attributes.set(Attribute::Bold);
            }
            Tone::Selected => {
                style.foreground_color = Some(Self::SUCCESS);
                style.attributes.set(Attribute::Bold);
            }
            Tone::Info => style.foreground_color = Some(Self::PRIMARY),
            Tone::Success => style.foreground_color = Some(Self::SUCCESS),
            Tone::Warning => style.foreground_color = Some(Self::WARNING),
            Tone::Error => style.foreground_color = Some(Self::ERROR),
        }
        style
    }
}

/// Characters used to draw menus, in a Unicode and an ASCII flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub pointer: &'static str,
    pub bullet: &'static str,
    pub separator: &'static str,
    pub horizontal: &'static str,
    pub vertical: &'static str,
    pub top_left: &'static str,
    pub top_right: &'static str,
    pub bottom_left: &'static str,
    pub bottom_right: &'static str,
    pub ok: &'static str,
    pub issue: &'static str,
    pub arrows: &'static str,
}

impl Glyphs {
    pub const UNICODE: Glyphs = Glyphs {
        pointer: "►",
        bullet: "•",
        separator: "›",
        horizontal: "─",
        vertical: "│",
        top_left: "╭",
        top_right: "╮",
        bottom_left: "╰",
        bottom_right: "╯",
        ok: "✓",
        issue: "⚠",
        arrows: "↑/↓",
    };

    pub const ASCII: Glyphs = Glyphs {
        pointer: ">",
        bullet: "*",
        separator: ">",
        horizontal: "-",
        vertical: "|",
        top_left: "+",
        top_right: "+",
        bottom_left: "+",
        bottom_right: "+",
        ok: "OK",
        issue: "!!",
        arrows: "Up/Down",
    };

    pub fn for_unicode(supported: bool) -> Self {
        if supported {
            Self::UNICODE
        } else {
            Self::ASCII
        }
    }
}

impl Default for Glyphs {
    fn default() -> Self {
        Self::ASCII
    }
}
