//! Rendering attributes of a style
//!
//! Grammars only name styles; what a style looks like is decided here and
//! by the theme. The same attributes drive terminal output and the HTML
//! preview.

use std::fmt::Write as _;

use serde::Deserialize;

/// One of the sixteen ANSI colors, or the host default. Named in
/// kebab-case in configuration files (`bright-black`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl Color {
    /// CSS value for the preview, `None` for the host default
    pub fn css(self) -> Option<&'static str> {
        let value = match self {
            Color::Default => return None,
            Color::Black => "#000000",
            Color::Red => "#aa0000",
            Color::Green => "#00aa00",
            Color::Yellow => "#aa5500",
            Color::Blue => "#0000aa",
            Color::Magenta => "#aa00aa",
            Color::Cyan => "#00aaaa",
            Color::White => "#aaaaaa",
            Color::BrightBlack => "#555555",
            Color::BrightRed => "#ff5555",
            Color::BrightGreen => "#55ff55",
            Color::BrightYellow => "#ffff55",
            Color::BrightBlue => "#5555ff",
            Color::BrightMagenta => "#ff55ff",
            Color::BrightCyan => "#55ffff",
            Color::BrightWhite => "#ffffff",
        };
        Some(value)
    }
}

/// How a resolved style is drawn. Missing keys in a theme table keep
/// their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextStyle {
    /// A style that only sets the text color
    pub fn fg(color: Color) -> Self {
        Self {
            fg: color,
            ..Default::default()
        }
    }

    pub fn with_bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// True when drawing with this style changes nothing
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Inline CSS declarations, empty for the default style
    pub fn css(&self) -> String {
        let mut css = String::new();
        if let Some(fg) = self.fg.css() {
            let _ = write!(css, "color:{};", fg);
        }
        if let Some(bg) = self.bg.css() {
            let _ = write!(css, "background-color:{};", bg);
        }
        if self.bold {
            css.push_str("font-weight:bold;");
        }
        if self.italic {
            css.push_str("font-style:italic;");
        }
        if self.underline {
            css.push_str("text-decoration:underline;");
        }
        css
    }
}
