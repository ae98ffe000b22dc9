//! # Tables
//!
//! A bordered block with a wrapped header and fixed-height single-line rows.
//! Column widths come from [`scale_columns`](super::columns::scale_columns)
//! over the inner width, so every boundary sits on a whole point.

use crate::font::Font;
use crate::style::Palette;
use crate::text::{TextLayout, TextStyle, WrappedLine};

use super::columns::{column_offsets, scale_columns};
use super::flow::{PageFlow, PageGeometry};
use super::{baseline_below, LayoutBlock, LayoutPage, Stroke};

pub const TABLE_PADDING: f64 = 12.0;
/// Distance from the block's top edge to the header row: padding plus title.
pub const TABLE_TOP_OFFSET: f64 = 34.0;
pub const HEADER_PADDING: f64 = 8.0;
pub const ROW_HEIGHT: f64 = 17.0;
pub const TABLE_BOTTOM_PADDING: f64 = 10.0;
pub const CELL_PADDING_X: f64 = 4.0;

pub const TITLE_STYLE: TextStyle = TextStyle::new(Font::Bold, 11.0, 14.0);
pub const HEADER_STYLE: TextStyle = TextStyle::new(Font::Bold, 7.0, 8.5);
pub const CELL_STYLE: TextStyle = TextStyle::new(Font::Regular, 8.0, 10.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub weight: f64,
    pub align: Align,
}

impl Column {
    pub fn left(header: impl Into<String>, weight: f64) -> Self {
        Self {
            header: header.into(),
            weight,
            align: Align::Left,
        }
    }

    pub fn right(header: impl Into<String>, weight: f64) -> Self {
        Self {
            header: header.into(),
            weight,
            align: Align::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableMetrics {
    pub column_widths: Vec<u32>,
    pub header_lines: Vec<Vec<WrappedLine>>,
    pub header_height: f64,
    pub height: f64,
}

pub struct TableRenderer<'a> {
    text: &'a TextLayout,
}

impl<'a> TableRenderer<'a> {
    pub fn new(text: &'a TextLayout) -> Self {
        Self { text }
    }

    pub fn measure(&self, table: &Table, width: f64) -> TableMetrics {
        let inner = (width - 2.0 * TABLE_PADDING).max(0.0).floor() as u32;
        let weights: Vec<f64> = table.columns.iter().map(|c| c.weight).collect();
        let column_widths = scale_columns(&weights, inner);

        let header_lines: Vec<Vec<WrappedLine>> = table
            .columns
            .iter()
            .zip(&column_widths)
            .map(|(col, w)| self.text.wrap(&col.header, &HEADER_STYLE, cell_width(*w)))
            .collect();
        let max_lines = header_lines.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let header_height = max_lines as f64 * HEADER_STYLE.line_height + HEADER_PADDING;

        let height = TABLE_TOP_OFFSET
            + header_height
            + ROW_HEIGHT * table.rows.len().max(1) as f64
            + TABLE_BOTTOM_PADDING;

        TableMetrics {
            column_widths,
            header_lines,
            header_height,
            height,
        }
    }

    /// How many rows of `table` fit on an empty page of `geometry`. At least 1.
    pub fn rows_per_page(&self, table: &Table, geometry: &PageGeometry) -> usize {
        let room = geometry.content_top() - geometry.bottom_safe;
        self.rows_fitting(table, geometry, room).max(1)
    }

    /// How many rows of `table` fit in `room` points, header included. May be 0.
    pub fn rows_fitting(&self, table: &Table, geometry: &PageGeometry, room: f64) -> usize {
        let header_only = Table {
            title: table.title.clone(),
            columns: table.columns.clone(),
            rows: Vec::new(),
        };
        let overhead = self.measure(&header_only, geometry.content_width()).height - ROW_HEIGHT;
        let rows = ((room - overhead) / ROW_HEIGHT - 1e-9).floor();
        if rows < 1.0 {
            0
        } else {
            rows as usize
        }
    }

    pub fn render(&self, flow: &mut PageFlow, table: &Table) -> LayoutBlock {
        let x = flow.geometry().content_left();
        let width = flow.geometry().content_width();
        let metrics = self.measure(table, width);

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
            x + TABLE_PADDING,
            baseline_below(top - TABLE_PADDING, &TITLE_STYLE),
            self.text.elide(&table.title, &TITLE_STYLE, width - 2.0 * TABLE_PADDING),
            &TITLE_STYLE,
            Palette::INK,
        );

        let grid_left = x + TABLE_PADDING;
        let grid_right = grid_left + metrics.column_widths.iter().sum::<u32>() as f64;
        let offsets = column_offsets(&metrics.column_widths, grid_left);
        let header_top = top - TABLE_TOP_OFFSET;
        let header_bottom = header_top - metrics.header_height;
        let row_count = table.rows.len().max(1);
        let grid_bottom = header_bottom - ROW_HEIGHT * row_count as f64;

        for (i, col) in table.columns.iter().enumerate() {
            let mut line_top = header_top - HEADER_PADDING / 2.0;
            for line in &metrics.header_lines[i] {
                let lx = aligned_x(col.align, offsets[i], metrics.column_widths[i], line.width);
                page.text(
                    lx,
                    baseline_below(line_top, &HEADER_STYLE),
                    line.text.clone(),
                    &HEADER_STYLE,
                    Palette::ACCENT,
                );
                line_top -= HEADER_STYLE.line_height;
            }
        }
        page.line(
            grid_left,
            header_bottom,
            grid_right,
            header_bottom,
            Stroke::new(Palette::ACCENT, 0.8),
        );

        if table.rows.is_empty() {
            self.draw_row(page, table, &metrics, &offsets, &[], header_bottom);
        }
        for (r, row) in table.rows.iter().enumerate() {
            let row_top = header_bottom - r as f64 * ROW_HEIGHT;
            self.draw_row(page, table, &metrics, &offsets, row, row_top);
            if r + 1 < table.rows.len() {
                let sep = row_top - ROW_HEIGHT;
                page.line(grid_left, sep, grid_right, sep, Stroke::new(Palette::RULE, 0.4));
            }
        }

        for left in offsets.iter().skip(1) {
            page.line(*left, header_top, *left, grid_bottom, Stroke::new(Palette::RULE, 0.4));
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

    fn draw_row(
        &self,
        page: &mut LayoutPage,
        table: &Table,
        metrics: &TableMetrics,
        offsets: &[f64],
        row: &[String],
        row_top: f64,
    ) {
        let baseline = row_top - ROW_HEIGHT / 2.0 - CELL_STYLE.size * 0.35;
        for (i, col) in table.columns.iter().enumerate() {
            let raw = row.get(i).map(|s| s.trim()).unwrap_or("");
            let value = if raw.is_empty() { "-" } else { raw };
            let text = self
                .text
                .elide(value, &CELL_STYLE, cell_width(metrics.column_widths[i]));
            let w = self.text.measure(&text, &CELL_STYLE);
            let lx = aligned_x(col.align, offsets[i], metrics.column_widths[i], w);
            page.text(lx, baseline, text, &CELL_STYLE, Palette::INK);
        }
    }
}

fn cell_width(column_width: u32) -> f64 {
    (column_width as f64 - 2.0 * CELL_PADDING_X).max(0.0)
}

fn aligned_x(align: Align, left: f64, column_width: u32, text_width: f64) -> f64 {
    match align {
        Align::Left => left + CELL_PADDING_X,
        Align::Right => left + column_width as f64 - CELL_PADDING_X - text_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::flow::{Chrome, PageGeometry, BLOCK_GAP};

    fn stage_table(rows: Vec<Vec<String>>) -> Table {
        Table {
            title: "Offene Bauteile".to_string(),
            columns: vec![
                Column::left("Bauteil", 28.0),
                Column::right("Fläche (m²)", 12.0),
                Column::right("Dicke (mm)", 12.0),
                Column::right("Rohdichte (kg/m³)", 14.0),
                Column::right("Säcke", 10.0),
                Column::right("Lambda (W/mK)", 12.0),
            ],
            rows,
        }
    }

    #[test]
    fn empty_rows_render_one_row() {
        let tl = TextLayout::new();
        let r = TableRenderer::new(&tl);
        let empty = r.measure(&stage_table(vec![]), 515.28);
        let one = r.measure(&stage_table(vec![vec!["Dach".into()]]), 515.28);
        assert!((empty.height - one.height).abs() < 1e-9);
        assert!(
            (empty.height
                - (TABLE_TOP_OFFSET + empty.header_height + ROW_HEIGHT + TABLE_BOTTOM_PADDING))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn empty_table_draws_a_row_of_dashes() {
        let tl = TextLayout::new();
        let r = TableRenderer::new(&tl);
        let mut flow = PageFlow::new(PageGeometry::a4(), Chrome::default());
        r.render(&mut flow, &stage_table(vec![]));
        let pages = flow.into_pages();
        let dashes = pages[0].texts().filter(|t| *t == "-").count();
        assert_eq!(dashes, 6);
    }

    #[test]
    fn rows_fitting_respects_remaining_room() {
        let tl = TextLayout::new();
        let r = TableRenderer::new(&tl);
        let g = PageGeometry::a4();
        let table = stage_table(vec![]);
        let overhead = r.measure(&table, g.content_width()).height - ROW_HEIGHT;
        assert_eq!(r.rows_fitting(&table, &g, overhead), 0);
        assert_eq!(r.rows_fitting(&table, &g, overhead + 3.5 * ROW_HEIGHT), 3);
        assert_eq!(r.rows_fitting(&table, &g, 10.0), 0);
    }

    #[test]
    fn rows_per_page_fills_an_empty_page() {
        let tl = TextLayout::new();
        let r = TableRenderer::new(&tl);
        let g = PageGeometry::a4();
        let table = stage_table(vec![]);
        let n = r.rows_per_page(&table, &g);
        let rows = |count: usize| vec![vec![String::new()]; count];
        let fits = r.measure(&stage_table(rows(n)), g.content_width()).height;
        let spills = r.measure(&stage_table(rows(n + 1)), g.content_width()).height;
        assert!(g.content_top() - fits >= g.bottom_safe);
        assert!(g.content_top() - spills < g.bottom_safe);
    }

    #[test]
    fn widths_fill_inner_width() {
        let tl = TextLayout::new();
        let m = TableRenderer::new(&tl).measure(&stage_table(vec![]), 515.28);
        let inner = (515.28 - 2.0 * TABLE_PADDING).floor() as u32;
        assert_eq!(m.column_widths.iter().sum::<u32>(), inner);
    }

    #[test]
    fn header_height_uses_tallest_header() {
        let tl = TextLayout::new();
        let m = TableRenderer::new(&tl).measure(&stage_table(vec![]), 300.0);
        let tallest = m.header_lines.iter().map(Vec::len).max().unwrap_or(0);
        assert!(tallest > 1, "narrow table should wrap a header");
        assert!(
            (m.header_height - (tallest as f64 * HEADER_STYLE.line_height + HEADER_PADDING)).abs()
                < 1e-9
        );
    }

    #[test]
    fn numeric_cells_are_right_aligned() {
        let tl = TextLayout::new();
        let r = TableRenderer::new(&tl);
        let mut flow = PageFlow::new(PageGeometry::a4(), Chrome::default());
        let table = stage_table(vec![vec![
            "Außenwand Nord".into(),
            "42,5".into(),
            "160".into(),
            "".into(),
            "18".into(),
            "0,039".into(),
        ]]);
        let m = r.measure(&table, flow.geometry().content_width());
        let before = flow.cursor().y();
        r.render(&mut flow, &table);
        assert!((flow.cursor().y() - (before - m.height - BLOCK_GAP)).abs() < 1e-9);

        let pages = flow.into_pages();
        let grid_left = PageGeometry::a4().content_left() + TABLE_PADDING;
        let offsets = column_offsets(&m.column_widths, grid_left);
        let mut found = false;
        for cmd in &pages[0].commands {
            if let crate::layout::DrawCommand::Text { x, text, .. } = cmd {
                if text == "42,5" {
                    let w = tl.measure("42,5", &CELL_STYLE);
                    let right = offsets[1] + m.column_widths[1] as f64 - CELL_PADDING_X;
                    assert!((x + w - right).abs() < 1e-9);
                    found = true;
                }
            }
        }
        assert!(found);
        let texts: Vec<&str> = pages[0].texts().collect();
        assert!(texts.contains(&"-"), "empty density shows a dash");
    }

    #[test]
    fn long_cells_are_elided() {
        let tl = TextLayout::new();
        let r = TableRenderer::new(&tl);
        let mut flow = PageFlow::new(PageGeometry::a4(), Chrome::default());
        let long = "Dachschräge über Gaube Südseite zwischen Sparren und Kehlbalken";
        r.render(&mut flow, &stage_table(vec![vec![long.into()]]));
        let pages = flow.into_pages();
        assert!(pages[0].texts().any(|t| t.ends_with('…') && t.starts_with("Dachschräge")));
    }
}
