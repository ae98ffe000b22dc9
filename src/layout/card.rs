//! # Cards
//!
//! A card is a bordered block with a title and label/value rows, in one
//! column or two parallel columns. Labels are small uppercase accent text;
//! values wrap at the column width.

use crate::font::Font;
use crate::style::Palette;
use crate::text::{TextLayout, TextStyle};

use super::flow::PageFlow;
use super::{baseline_below, LayoutBlock, Stroke};

pub const CARD_PADDING: f64 = 12.0;
/// Space reserved for the card title above the first row.
pub const CARD_TITLE_HEIGHT: f64 = 20.0;
pub const ROW_GAP: f64 = 6.0;
pub const COLUMN_GAP: f64 = 18.0;

pub const TITLE_STYLE: TextStyle = TextStyle::new(Font::Bold, 11.0, 14.0);
pub const LABEL_STYLE: TextStyle = TextStyle::new(Font::Bold, 6.5, 9.0);
pub const VALUE_STYLE: TextStyle = TextStyle::new(Font::Regular, 9.5, 12.0);

const EMPTY_VALUE: &str = "-";

#[derive(Debug, Clone, PartialEq)]
pub struct CardRow {
    pub label: String,
    pub value: String,
}

impl CardRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// The text actually drawn for the value.
    pub fn display_value(&self) -> &str {
        let v = self.value.trim();
        if v.is_empty() {
            EMPTY_VALUE
        } else {
            v
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardBody {
    Single(Vec<CardRow>),
    Double(Vec<CardRow>, Vec<CardRow>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub body: CardBody,
}

impl Card {
    pub fn single(title: impl Into<String>, rows: Vec<CardRow>) -> Self {
        Self {
            title: title.into(),
            body: CardBody::Single(rows),
        }
    }

    pub fn double(title: impl Into<String>, left: Vec<CardRow>, right: Vec<CardRow>) -> Self {
        Self {
            title: title.into(),
            body: CardBody::Double(left, right),
        }
    }
}

/// Result of the measurement pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CardMetrics {
    pub height: f64,
    pub column_width: f64,
    /// Height of each row, per column.
    pub row_heights: Vec<Vec<f64>>,
}

pub struct CardRenderer<'a> {
    text: &'a TextLayout,
}

impl<'a> CardRenderer<'a> {
    pub fn new(text: &'a TextLayout) -> Self {
        Self { text }
    }

    /// Height of a single row at `column_width`.
    pub fn row_height(&self, row: &CardRow, column_width: f64) -> f64 {
        let lines = self
            .text
            .line_count(row.display_value(), &VALUE_STYLE, column_width)
            .max(1);
        LABEL_STYLE.line_height + lines as f64 * VALUE_STYLE.line_height + ROW_GAP
    }

    pub fn measure(&self, card: &Card, width: f64) -> CardMetrics {
        let inner = width - 2.0 * CARD_PADDING;
        let (columns, column_width): (Vec<&[CardRow]>, f64) = match &card.body {
            CardBody::Single(rows) => (vec![rows.as_slice()], inner),
            CardBody::Double(left, right) => (
                vec![left.as_slice(), right.as_slice()],
                (inner - COLUMN_GAP) / 2.0,
            ),
        };

        let row_heights: Vec<Vec<f64>> = columns
            .iter()
            .map(|rows| rows.iter().map(|r| self.row_height(r, column_width)).collect())
            .collect();
        let tallest = row_heights
            .iter()
            .map(|col| col.iter().sum::<f64>())
            .fold(0.0, f64::max);

        CardMetrics {
            height: CARD_PADDING + CARD_TITLE_HEIGHT + tallest + CARD_PADDING,
            column_width,
            row_heights,
        }
    }

    /// Measure, make room, draw, and advance past the card.
    pub fn render(&self, flow: &mut PageFlow, card: &Card) -> LayoutBlock {
        let x = flow.geometry().content_left();
        let width = flow.geometry().content_width();
        let metrics = self.measure(card, width);

        flow.ensure_space(metrics.height);
        let top = flow.cursor().y();
        let page_index = flow.page_index();
        let page = flow.page();

        page.panel(
            x,
            top - metrics.height,
            width,
            metrics.height,
            Palette::SURFACE,
            Stroke::new(Palette::BORDER, 0.6),
        );
        page.text(
            x + CARD_PADDING,
            baseline_below(top - CARD_PADDING, &TITLE_STYLE),
            self.text.elide(&card.title, &TITLE_STYLE, width - 2.0 * CARD_PADDING),
            &TITLE_STYLE,
            Palette::INK,
        );

        let rows_top = top - CARD_PADDING - CARD_TITLE_HEIGHT;
        let columns: Vec<&[CardRow]> = match &card.body {
            CardBody::Single(rows) => vec![rows.as_slice()],
            CardBody::Double(left, right) => vec![left.as_slice(), right.as_slice()],
        };

        for (col, rows) in columns.into_iter().enumerate() {
            let col_x = x + CARD_PADDING + col as f64 * (metrics.column_width + COLUMN_GAP);
            let mut y = rows_top;
            for (row, height) in rows.iter().zip(&metrics.row_heights[col]) {
                page.text(
                    col_x,
                    baseline_below(y, &LABEL_STYLE),
                    self.text
                        .elide(&row.label.to_uppercase(), &LABEL_STYLE, metrics.column_width),
                    &LABEL_STYLE,
                    Palette::ACCENT,
                );
                let mut line_top = y - LABEL_STYLE.line_height;
                for line in self
                    .text
                    .wrap(row.display_value(), &VALUE_STYLE, metrics.column_width)
                {
                    page.text(
                        col_x,
                        baseline_below(line_top, &VALUE_STYLE),
                        line.text,
                        &VALUE_STYLE,
                        Palette::INK,
                    );
                    line_top -= VALUE_STYLE.line_height;
                }
                y -= height;
            }
        }

        flow.advance(metrics.height);
        LayoutBlock {
            x,
            top,
            width,
            height: metrics.height,
            page: page_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::flow::{Chrome, PageGeometry, BLOCK_GAP};

    fn flow() -> PageFlow {
        PageFlow::new(PageGeometry::a4(), Chrome::default())
    }

    fn row_h(tl: &TextLayout, value: &str, width: f64) -> f64 {
        let lines = tl.wrap(value, &VALUE_STYLE, width).len().max(1);
        LABEL_STYLE.line_height + lines as f64 * VALUE_STYLE.line_height + ROW_GAP
    }

    #[test]
    fn project_card_height_follows_taller_column() {
        let tl = TextLayout::new();
        let renderer = CardRenderer::new(&tl);
        let left = vec![
            CardRow::new("Auftragsnummer", "A-2024-0815"),
            CardRow::new("Projektnummer", "P-311"),
            CardRow::new("Prüfdatum", "12.03.2024"),
        ];
        let right = vec![
            CardRow::new("Kunde", "Familie Musterfrau"),
            CardRow::new("Verarbeiter", "Dämmtechnik Nord GmbH & Co. KG, Niederlassung Lüneburg"),
            CardRow::new("Adresse", "Am Lindenhof 12, 21335 Lüneburg"),
        ];
        let width = 515.28;
        let m = renderer.measure(&Card::double("Projekt", left.clone(), right.clone()), width);

        let col_w = (width - 2.0 * CARD_PADDING - COLUMN_GAP) / 2.0;
        let sum = |rows: &[CardRow]| rows.iter().map(|r| row_h(&tl, &r.value, col_w)).sum::<f64>();
        let expected = CARD_TITLE_HEIGHT + 2.0 * CARD_PADDING + sum(&left).max(sum(&right));
        assert!((m.height - expected).abs() < 1e-9);
        assert!(sum(&right) > sum(&left), "long installer name should wrap");
    }

    #[test]
    fn empty_value_keeps_one_line() {
        let tl = TextLayout::new();
        let renderer = CardRenderer::new(&tl);
        let row = CardRow::new("Bemerkung", "   ");
        assert_eq!(row.display_value(), "-");
        let expected = LABEL_STYLE.line_height + VALUE_STYLE.line_height + ROW_GAP;
        assert!((renderer.row_height(&row, 200.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn render_advances_cursor_by_measured_height() {
        let tl = TextLayout::new();
        let renderer = CardRenderer::new(&tl);
        let mut f = flow();
        let before = f.cursor().y();
        let card = Card::single("Material", vec![CardRow::new("Dämmstoff", "Zellulose")]);
        let block = renderer.render(&mut f, &card);
        assert_eq!(block.page, 0);
        assert!((block.top - before).abs() < 1e-9);
        assert!((f.cursor().y() - (before - block.height - BLOCK_GAP)).abs() < 1e-9);
    }

    #[test]
    fn labels_are_uppercase_and_dash_for_empty() {
        let tl = TextLayout::new();
        let renderer = CardRenderer::new(&tl);
        let mut f = flow();
        let card = Card::single("Projekt", vec![CardRow::new("Kunde", "")]);
        renderer.render(&mut f, &card);
        let pages = f.into_pages();
        let texts: Vec<&str> = pages[0].texts().collect();
        assert!(texts.contains(&"KUNDE"));
        assert!(texts.contains(&"-"));
    }

    #[test]
    fn card_that_does_not_fit_moves_whole() {
        let tl = TextLayout::new();
        let renderer = CardRenderer::new(&tl);
        let mut f = flow();
        f.advance(f.cursor().remaining() - 40.0);
        let card = Card::single(
            "Prüfpunkte",
            (0..4).map(|i| CardRow::new(format!("Punkt {}", i), "i. O.")).collect(),
        );
        let block = renderer.render(&mut f, &card);
        assert_eq!(block.page, 1);
        assert_eq!(f.page_count(), 2);
        assert!((block.top - f.geometry().content_top()).abs() < 1e-9);
    }
}
