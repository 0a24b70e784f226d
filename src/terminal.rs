//! Terminal output using crossterm
//!
//! Prints highlighted blocks line by line. When writing to a terminal, lines
//! are clipped to its width and styled with ANSI attributes; otherwise the
//! text goes out plain and whole.

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Attribute, Color as TermColor, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal,
    tty::IsTty,
};
use unicode_width::UnicodeWidthChar;

use blocklight::syntax::{segments, Color, Paint, StyleId, TextStyle};
use blocklight::Result;

/// Columns between tab stops
const TAB_WIDTH: usize = 8;

/// Line printer for highlighted text
pub struct Terminal<W: Write> {
    out: W,
    /// Terminal width in columns; `None` disables clipping
    cols: Option<usize>,
    /// Whether styles are rendered
    color: bool,
}

impl Terminal<io::Stdout> {
    /// Printer on stdout, styled and clipped only if stdout is a terminal
    pub fn stdout() -> Self {
        let out = io::stdout();
        let tty = out.is_tty();
        let cols = if tty {
            terminal::size().ok().map(|(cols, _)| cols as usize)
        } else {
            None
        };
        Self::new(out, cols, tty)
    }
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, cols: Option<usize>, color: bool) -> Self {
        Self { out, cols, color }
    }

    /// Print one block with its paints, then a line break
    pub fn write_block<F>(&mut self, text: &str, paints: &[Paint], style_of: F) -> Result<()>
    where
        F: Fn(StyleId) -> TextStyle,
    {
        let mut col = 0;
        for segment in segments(text, paints) {
            let style = segment.style.map(&style_of).unwrap_or_default();
            let mut run = String::with_capacity(segment.text.len());
            let mut clipped = false;
            for ch in segment.text.chars() {
                let width = match ch {
                    '\t' => TAB_WIDTH - col % TAB_WIDTH,
                    _ => UnicodeWidthChar::width(ch).unwrap_or(1),
                };
                if self.cols.map_or(false, |cols| col + width > cols) {
                    clipped = true;
                    break;
                }
                match ch {
                    '\t' => run.extend(std::iter::repeat(' ').take(width)),
                    _ => run.push(ch),
                }
                col += width;
            }
            self.write_styled(&run, style)?;
            if clipped {
                break;
            }
        }
        queue!(self.out, Print("\n"))?;
        Ok(())
    }

    fn write_styled(&mut self, text: &str, style: TextStyle) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if !self.color || style.is_default() {
            queue!(self.out, Print(text))?;
            return Ok(());
        }

        if style.fg != Color::Default {
            queue!(self.out, SetForegroundColor(term_color(style.fg)))?;
        }
        if style.bg != Color::Default {
            queue!(self.out, SetBackgroundColor(term_color(style.bg)))?;
        }
        if style.bold {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        if style.italic {
            queue!(self.out, SetAttribute(Attribute::Italic))?;
        }
        if style.underline {
            queue!(self.out, SetAttribute(Attribute::Underlined))?;
        }
        queue!(self.out, Print(text), SetAttribute(Attribute::Reset))?;
        Ok(())
    }

    /// Flush output buffer
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

fn term_color(color: Color) -> TermColor {
    match color {
        Color::Default => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::White => TermColor::Grey,
        Color::BrightBlack => TermColor::DarkGrey,
        Color::BrightRed => TermColor::Red,
        Color::BrightGreen => TermColor::Green,
        Color::BrightYellow => TermColor::Yellow,
        Color::BrightBlue => TermColor::Blue,
        Color::BrightMagenta => TermColor::Magenta,
        Color::BrightCyan => TermColor::Cyan,
        Color::BrightWhite => TermColor::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use blocklight::syntax::{GrammarLoader, Highlighter, MemorySource};

    const GRAMMAR: &str = r#"<language id="t">
      <definitions>
        <context id="kw" style-ref="def:keyword"><keyword>fn</keyword></context>
        <context id="t"><include><context ref="kw"/></include></context>
      </definitions>
    </language>"#;

    fn paints(text: &str) -> Vec<Paint> {
        let source = MemorySource::new().with("t", GRAMMAR);
        let language = GrammarLoader::new(&source).into_language("t").unwrap();
        Highlighter::new(Arc::new(language)).highlight(text, 0, None).paints
    }

    fn printed(cols: Option<usize>, color: bool, text: &str) -> String {
        let mut terminal = Terminal::new(Vec::new(), cols, color);
        let style = TextStyle::fg(Color::Red).with_bold();
        terminal.write_block(text, &paints(text), |_| style).unwrap();
        String::from_utf8(terminal.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_output_is_unclipped() {
        assert_eq!(printed(None, false, "fn main() {}"), "fn main() {}\n");
    }

    #[test]
    fn test_clip_to_width() {
        assert_eq!(printed(Some(5), false, "fn main() {}"), "fn ma\n");
        // wide characters never straddle the edge
        assert_eq!(printed(Some(5), false, "日本語"), "日本\n");
    }

    #[test]
    fn test_tabs_expand() {
        assert_eq!(printed(None, false, "a\tb"), "a       b\n");
    }

    #[test]
    fn test_styled_output() {
        let out = printed(None, true, "fn x");
        assert!(out.starts_with("\x1b["));
        assert!(out.contains("fn"));
        assert!(out.ends_with(" x\n"));
    }

    #[test]
    fn test_term_color() {
        assert_eq!(term_color(Color::Default), TermColor::Reset);
        assert_eq!(term_color(Color::BrightWhite), TermColor::White);
    }
}
