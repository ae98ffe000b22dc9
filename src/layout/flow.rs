//! # Page Flow
//!
//! The one place pagination happens. Blocks ask [`PageFlow::ensure_space`]
//! for their measured height before drawing and report it back through
//! [`PageFlow::advance`] afterwards; nothing else moves the cursor or opens
//! pages.
//!
//! Blocks are unbreakable. A block that doesn't fit moves whole to a new
//! page; a block taller than an empty page is drawn on its fresh page and
//! overflows the bottom margin rather than triggering page after page.

use crate::font::Font;
use crate::style::{Color, Palette};
use crate::text::{TextLayout, TextStyle};
use crate::units::{A4_HEIGHT_PT, A4_WIDTH_PT};

use super::{baseline_below, LayoutPage};

/// Vertical gap inserted after every block.
pub const BLOCK_GAP: f64 = 10.0;

pub const PAGE_MARGIN: f64 = 40.0;
pub const HEADER_HEIGHT: f64 = 56.0;
/// Space between the header bar and the first block.
pub const HEADER_GAP: f64 = 18.0;
/// Blocks may not extend below this line; the footer lives underneath.
pub const BOTTOM_SAFE: f64 = 48.0;
pub const ACCENT_STRIPE_WIDTH: f64 = 6.0;

const TITLE_STYLE: TextStyle = TextStyle::new(Font::Bold, 15.0, 18.0);
const SUBTITLE_STYLE: TextStyle = TextStyle::new(Font::Regular, 8.5, 11.0);
const FOOTER_STYLE: TextStyle = TextStyle::new(Font::Regular, 7.5, 9.0);

/// What to do with a block of a given height at the current cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakDecision {
    /// The block fits above the bottom safe margin.
    Place,
    /// Start a new page first.
    MoveToNextPage,
    /// The cursor is already at the top of a fresh page and the block is
    /// taller than the page can hold. Place it anyway.
    Overflow,
}

/// Fixed page dimensions and the content box inside them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub header_height: f64,
    pub bottom_safe: f64,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width: A4_WIDTH_PT,
            height: A4_HEIGHT_PT,
            margin: PAGE_MARGIN,
            header_height: HEADER_HEIGHT,
            bottom_safe: BOTTOM_SAFE,
        }
    }

    pub fn content_left(&self) -> f64 {
        self.margin
    }

    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Where the cursor starts on every page.
    pub fn content_top(&self) -> f64 {
        self.height - self.header_height - HEADER_GAP
    }
}

/// The single live vertical position of a render, in PDF points from the
/// bottom of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    y: f64,
    top: f64,
    bottom_safe: f64,
}

impl PageCursor {
    pub fn new(top: f64, bottom_safe: f64) -> Self {
        Self {
            y: top,
            top,
            bottom_safe,
        }
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn remaining(&self) -> f64 {
        self.y - self.bottom_safe
    }

    pub fn is_at_top(&self) -> bool {
        self.y >= self.top
    }

    pub fn decide(&self, height: f64) -> BreakDecision {
        if self.y - height >= self.bottom_safe {
            BreakDecision::Place
        } else if self.is_at_top() {
            BreakDecision::Overflow
        } else {
            BreakDecision::MoveToNextPage
        }
    }

    fn advance(&mut self, height: f64) {
        self.y -= height + BLOCK_GAP;
    }

    fn reset(&mut self) {
        self.y = self.top;
    }
}

/// Header and footer text repeated on every page.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub title: String,
    pub subtitle: String,
    /// Left part of the footer. The page counter is appended.
    pub footer: String,
}

pub struct PageFlow {
    geometry: PageGeometry,
    chrome: Chrome,
    text: TextLayout,
    pages: Vec<LayoutPage>,
    cursor: PageCursor,
}

impl PageFlow {
    /// Start a document with its first page already carrying chrome.
    pub fn new(geometry: PageGeometry, chrome: Chrome) -> Self {
        let cursor = PageCursor::new(geometry.content_top(), geometry.bottom_safe);
        let mut flow = Self {
            geometry,
            chrome,
            text: TextLayout::new(),
            pages: Vec::new(),
            cursor,
        };
        flow.push_page();
        flow
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn text(&self) -> &TextLayout {
        &self.text
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn page_index(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The page blocks currently draw on.
    pub fn page(&mut self) -> &mut LayoutPage {
        let idx = self.pages.len() - 1;
        &mut self.pages[idx]
    }

    /// Make room for a block of `height`. Returns whether a new page was
    /// started.
    pub fn ensure_space(&mut self, height: f64) -> bool {
        match self.cursor.decide(height) {
            BreakDecision::Place => false,
            BreakDecision::Overflow => {
                log::warn!(
                    "block of {:.1}pt exceeds empty page ({:.1}pt available); drawing it anyway",
                    height,
                    self.cursor.remaining()
                );
                false
            }
            BreakDecision::MoveToNextPage => {
                self.push_page();
                self.cursor.reset();
                true
            }
        }
    }

    /// Move below a block that was just drawn.
    pub fn advance(&mut self, height: f64) {
        self.cursor.advance(height);
    }

    pub fn into_pages(self) -> Vec<LayoutPage> {
        self.pages
    }

    fn push_page(&mut self) {
        let mut page = LayoutPage::new(self.geometry.width, self.geometry.height);
        self.draw_chrome(&mut page);
        self.pages.push(page);
    }

    fn draw_chrome(&self, page: &mut LayoutPage) {
        let g = &self.geometry;
        let bar_bottom = g.height - g.header_height;

        page.fill_rect(0.0, bar_bottom, g.width, g.header_height, Palette::ACCENT);
        page.fill_rect(0.0, 0.0, ACCENT_STRIPE_WIDTH, bar_bottom, Palette::ACCENT);

        let title_top = g.height - 12.0;
        page.text(
            g.margin,
            baseline_below(title_top, &TITLE_STYLE),
            self.text.elide(&self.chrome.title, &TITLE_STYLE, g.content_width()),
            &TITLE_STYLE,
            Color::WHITE,
        );
        page.text(
            g.margin,
            baseline_below(title_top - TITLE_STYLE.line_height - 2.0, &SUBTITLE_STYLE),
            self.text.elide(&self.chrome.subtitle, &SUBTITLE_STYLE, g.content_width()),
            &SUBTITLE_STYLE,
            Color::WHITE,
        );

        let footer_y = g.bottom_safe / 2.0;
        let counter = "Seite {{pageNumber}} von {{totalPages}}";
        let footer = if self.chrome.footer.is_empty() {
            counter.to_string()
        } else {
            format!("{}  |  {}", self.chrome.footer, counter)
        };
        page.text(g.margin, footer_y, footer, &FOOTER_STYLE, Palette::MUTED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow() -> PageFlow {
        PageFlow::new(
            PageGeometry::a4(),
            Chrome {
                title: "Prüfprotokoll".to_string(),
                subtitle: "Auftrag 4711".to_string(),
                footer: String::new(),
            },
        )
    }

    #[test]
    fn cursor_decisions() {
        let c = PageCursor::new(700.0, 50.0);
        assert_eq!(c.decide(650.0), BreakDecision::Place);
        assert_eq!(c.decide(651.0), BreakDecision::Overflow);

        let mut c = c;
        c.advance(100.0);
        assert!(!c.is_at_top());
        assert_eq!(c.decide(600.0), BreakDecision::MoveToNextPage);
        assert!((c.remaining() - (700.0 - 110.0 - 50.0)).abs() < 1e-9);
    }

    #[test]
    fn advance_subtracts_height_and_gap() {
        let mut f = flow();
        let before = f.cursor().y();
        assert!(!f.ensure_space(120.0));
        f.advance(120.0);
        assert!((f.cursor().y() - (before - 120.0 - BLOCK_GAP)).abs() < 1e-9);
        assert_eq!(f.page_count(), 1);
    }

    #[test]
    fn oversized_request_opens_exactly_one_page() {
        let mut f = flow();
        f.advance(500.0);
        assert!(f.ensure_space(300.0));
        assert_eq!(f.page_count(), 2);
        assert!((f.cursor().y() - f.geometry().content_top()).abs() < 1e-9);
    }

    #[test]
    fn fresh_page_does_not_allocate_again() {
        let mut f = flow();
        f.advance(500.0);
        assert!(f.ensure_space(2000.0));
        assert!(!f.ensure_space(2000.0));
        assert_eq!(f.page_count(), 2);
    }

    #[test]
    fn every_page_carries_chrome() {
        let mut f = flow();
        f.advance(700.0);
        f.ensure_space(100.0);
        let pages = f.into_pages();
        assert_eq!(pages.len(), 2);
        for page in &pages {
            let texts: Vec<&str> = page.texts().collect();
            assert!(texts.contains(&"Prüfprotokoll"));
            assert!(texts.iter().any(|t| t.contains("{{pageNumber}}")));
        }
    }

    #[test]
    fn content_box_inside_page() {
        let g = PageGeometry::a4();
        assert!(g.content_top() < g.height - g.header_height);
        assert!(g.content_left() > ACCENT_STRIPE_WIDTH);
        assert!((g.content_left() + g.content_width() + g.margin - g.width).abs() < 1e-9);
    }
}
