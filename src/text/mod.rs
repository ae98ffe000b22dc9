//! # Text Layout
//!
//! Greedy line breaking and text measurement for left-to-right Latin text.
//!
//! Every wrapped value in a report is wrapped twice: once while a block
//! measures its height and once while it draws. Both passes must call
//! [`TextLayout::wrap`] with the same [`TextStyle`] and width, which is why
//! renderers keep their styles in constants rather than computing them at
//! each call site.

use crate::font::{Font, FontContext};

const ELLIPSIS: char = '…';

/// Font selection plus vertical rhythm for a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f64,
    /// Baseline-to-baseline distance in points.
    pub line_height: f64,
}

impl TextStyle {
    pub const fn new(font: Font, size: f64, line_height: f64) -> Self {
        Self {
            font,
            size,
            line_height,
        }
    }
}

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    /// Measured width in points.
    pub width: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextLayout {
    fonts: FontContext,
}

impl TextLayout {
    pub fn new() -> Self {
        Self {
            fonts: FontContext::new(),
        }
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    pub fn measure(&self, text: &str, style: &TextStyle) -> f64 {
        self.fonts.measure(text, style.font, style.size)
    }

    /// Break a string into lines that fit within `max_width`.
    ///
    /// Tokens are the whitespace-separated words of `text`, rejoined with a
    /// single space. A token that is wider than `max_width` on its own is
    /// split between characters; its last chunk may be followed by further
    /// tokens on the same line. Empty input yields no lines.
    pub fn wrap(&self, text: &str, style: &TextStyle, max_width: f64) -> Vec<WrappedLine> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for token in text.split_whitespace() {
            if !current.is_empty() {
                let candidate = format!("{} {}", current, token);
                if self.measure(&candidate, style) <= max_width {
                    current = candidate;
                    continue;
                }
                lines.push(self.make_line(std::mem::take(&mut current), style));
            }

            if self.measure(token, style) <= max_width {
                current.push_str(token);
            } else {
                current = self.break_token(token, style, max_width, &mut lines);
            }
        }

        if !current.is_empty() {
            lines.push(self.make_line(current, style));
        }

        lines
    }

    /// Number of lines `text` occupies; used by measurement passes.
    pub fn line_count(&self, text: &str, style: &TextStyle, max_width: f64) -> usize {
        self.wrap(text, style, max_width).len()
    }

    /// Split an over-long token into chunks that each fit. Full chunks are
    /// pushed to `lines`; the trailing chunk is returned as the new open line.
    fn break_token(
        &self,
        token: &str,
        style: &TextStyle,
        max_width: f64,
        lines: &mut Vec<WrappedLine>,
    ) -> String {
        let mut chunk = String::new();
        for ch in token.chars() {
            let mut candidate = chunk.clone();
            candidate.push(ch);
            if !chunk.is_empty() && self.measure(&candidate, style) > max_width {
                lines.push(self.make_line(std::mem::take(&mut chunk), style));
                chunk.push(ch);
            } else {
                chunk = candidate;
            }
        }
        chunk
    }

    /// Fit a single line into `max_width`, cutting the tail and appending an
    /// ellipsis when it doesn't fit. Table cells use this instead of wrapping.
    pub fn elide(&self, text: &str, style: &TextStyle, max_width: f64) -> String {
        let text = text.trim();
        if self.measure(text, style) <= max_width {
            return text.to_string();
        }

        let mut fitted = String::new();
        for ch in text.chars() {
            let mut candidate = fitted.clone();
            candidate.push(ch);
            candidate.push(ELLIPSIS);
            if self.measure(&candidate, style) > max_width {
                break;
            }
            fitted.push(ch);
        }

        let trimmed = fitted.trim_end();
        if trimmed.is_empty() {
            return String::new();
        }
        format!("{}{}", trimmed, ELLIPSIS)
    }

    fn make_line(&self, text: String, style: &TextStyle) -> WrappedLine {
        let width = self.measure(&text, style);
        WrappedLine { text, width }
    }
}
