//! # Block Layout
//!
//! Reports are built from self-contained blocks (cards, tables, image
//! strips) stacked down fixed A4 pages. Every block follows the same
//! protocol against the [`flow::PageFlow`]:
//!
//! 1. measure its height with the exact wrap parameters it will draw with
//! 2. `ensure_space(height)`, which may open a new page
//! 3. draw at the cursor
//! 4. `advance(height)`
//!
//! Blocks are never split across pages. Coordinates here are PDF user space:
//! points from the bottom-left corner of the page.

pub mod card;
pub mod columns;
pub mod flow;
pub mod image_block;
pub mod table;

use crate::font::Font;
use crate::image_loader::LoadedImage;
use crate::style::Color;
use crate::text::TextStyle;

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

/// What to actually draw. Positions are absolute on the page.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// A filled and/or stroked rectangle; `(x, y)` is its bottom-left corner.
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
    /// A single line of text; `(x, y)` is the start of the baseline.
    /// `{{pageNumber}}` and `{{totalPages}}` are substituted at write time.
    Text {
        x: f64,
        y: f64,
        text: String,
        font: Font,
        size: f64,
        color: Color,
    },
    /// An image scaled into the box with bottom-left corner `(x, y)`.
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: LoadedImage,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub const fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// The region a block occupied after drawing. Never stored past a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBlock {
    pub x: f64,
    /// Top edge of the block.
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Page index the block was drawn on.
    pub page: usize,
}

impl LayoutPage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            fill: Some(color),
            stroke: None,
        });
    }

    /// A filled rectangle with a border, drawn as a block background.
    pub fn panel(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Color, stroke: Stroke) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            fill: Some(fill),
            stroke: Some(stroke),
        });
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64, stroke: Stroke) {
        self.commands.push(DrawCommand::Rect {
            x,
            y,
            width,
            height,
            fill: None,
            stroke: Some(stroke),
        });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) {
        self.commands.push(DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        });
    }

    pub fn text(&mut self, x: f64, y: f64, text: impl Into<String>, style: &TextStyle, color: Color) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text,
            font: style.font,
            size: style.size,
            color,
        });
    }

    pub fn image(&mut self, x: f64, y: f64, width: f64, height: f64, image: LoadedImage) {
        self.commands.push(DrawCommand::Image {
            x,
            y,
            width,
            height,
            image,
        });
    }

    /// All text runs on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Baseline for text whose line box starts at `box_top`.
pub fn baseline_below(box_top: f64, style: &TextStyle) -> f64 {
    box_top - (style.line_height - style.size) / 2.0 - style.size * 0.8
}

/// Fit an image of `px_w × px_h` into a `box_w × box_h` frame, keeping its
/// aspect ratio. Returns `(x_offset, y_offset, width, height)` within the frame.
pub fn fit_image(px_w: u32, px_h: u32, box_w: f64, box_h: f64) -> (f64, f64, f64, f64) {
    if px_w == 0 || px_h == 0 || box_w <= 0.0 || box_h <= 0.0 {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let scale = (box_w / px_w as f64).min(box_h / px_h as f64);
    let w = px_w as f64 * scale;
    let h = px_h as f64 * scale;
    ((box_w - w) / 2.0, (box_h - h) / 2.0, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_wide_image_into_square() {
        let (dx, dy, w, h) = fit_image(200, 100, 100.0, 100.0);
        assert!((w - 100.0).abs() < 1e-9);
        assert!((h - 50.0).abs() < 1e-9);
        assert!(dx.abs() < 1e-9);
        assert!((dy - 25.0).abs() < 1e-9);
    }

    #[test]
    fn fit_degenerate_image() {
        assert_eq!(fit_image(0, 10, 50.0, 50.0), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn baseline_sits_inside_line_box() {
        let style = TextStyle::new(Font::Regular, 9.5, 12.0);
        let b = baseline_below(100.0, &style);
        assert!(b < 100.0 - style.size * 0.7);
        assert!(b - style.size * 0.25 > 100.0 - style.line_height);
    }

    #[test]
    fn empty_text_is_not_recorded() {
        let mut page = LayoutPage::new(100.0, 100.0);
        let style = TextStyle::new(Font::Regular, 9.0, 11.0);
        page.text(0.0, 0.0, "", &style, Color::BLACK);
        page.text(0.0, 0.0, "x", &style, Color::BLACK);
        assert_eq!(page.texts().collect::<Vec<_>>(), vec!["x"]);
    }
}
