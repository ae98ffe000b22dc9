//! Nominal positions on the printed protocol form.
//!
//! All coordinates are millimeters from the top-left corner of the template
//! page. Text positions are baselines; image boxes are top-left corners.

use std::collections::BTreeMap;

use crate::font::Font;
use crate::layout::table::Align;
use crate::model::CheckKey;
use crate::text::TextStyle;
use crate::units::MmPoint;

use super::FieldKey;

/// Baseline-to-baseline distance relative to font size for wrapped values.
const LINE_SPACING: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPosition {
    pub x_mm: f64,
    pub y_mm: f64,
    pub max_width_mm: f64,
    pub font_size: f64,
    pub bold: bool,
    /// Template page index.
    pub page: usize,
}

impl FieldPosition {
    pub const fn new(x_mm: f64, y_mm: f64, max_width_mm: f64) -> Self {
        Self {
            x_mm,
            y_mm,
            max_width_mm,
            font_size: 9.0,
            bold: false,
            page: 0,
        }
    }

    pub fn size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn at(&self) -> MmPoint {
        MmPoint::new(self.x_mm, self.y_mm)
    }

    pub fn style(&self) -> TextStyle {
        text_style(self.bold, self.font_size)
    }
}

pub(crate) fn text_style(bold: bool, font_size: f64) -> TextStyle {
    let font = if bold { Font::Bold } else { Font::Regular };
    TextStyle::new(font, font_size, font_size * LINE_SPACING)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayColumn {
    pub key: FieldKey,
    pub x_mm: f64,
    pub width_mm: f64,
    pub align: Align,
}

impl OverlayColumn {
    const fn left(key: FieldKey, x_mm: f64, width_mm: f64) -> Self {
        Self {
            key,
            x_mm,
            width_mm,
            align: Align::Left,
        }
    }

    const fn right(key: FieldKey, x_mm: f64, width_mm: f64) -> Self {
        Self {
            key,
            x_mm,
            width_mm,
            align: Align::Right,
        }
    }
}

/// A table printed on the form. Row `r` has its baseline at
/// `top_mm + (r + 1) × row_height_mm`.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayTable {
    pub top_mm: f64,
    pub row_height_mm: f64,
    pub max_rows: usize,
    pub font_size: f64,
    pub page: usize,
    pub columns: Vec<OverlayColumn>,
}

impl OverlayTable {
    pub fn row_baseline_mm(&self, row: usize) -> f64 {
        self.top_mm + (row + 1) as f64 * self.row_height_mm
    }
}

/// Checkbox grid for the inspection checks. Each check row marks either the
/// passed or the failed column and writes its comment alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckColumns {
    pub passed_x_mm: f64,
    pub failed_x_mm: f64,
    pub comment_x_mm: f64,
    pub comment_width_mm: f64,
    pub font_size: f64,
    pub page: usize,
    pub rows: Vec<(CheckKey, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBox {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub fields: BTreeMap<FieldKey, FieldPosition>,
    pub checks: CheckColumns,
    pub open_table: OverlayTable,
    pub closed_table: OverlayTable,
    pub images: BTreeMap<FieldKey, ImageBox>,
}

impl OverlayLayout {
    /// The two-page protocol form: data and signature on page one,
    /// photo documentation on page two.
    pub fn protocol() -> Self {
        use FieldKey::*;

        let fields = BTreeMap::from([
            (OrderId, FieldPosition::new(42.0, 40.0, 48.0).bold()),
            (ProjectNumber, FieldPosition::new(130.0, 40.0, 62.0)),
            (CustomerName, FieldPosition::new(42.0, 48.0, 78.0)),
            (InstallerName, FieldPosition::new(130.0, 48.0, 62.0)),
            (Street, FieldPosition::new(42.0, 56.0, 78.0)),
            (PostalCity, FieldPosition::new(130.0, 56.0, 62.0)),
            (InspectionDate, FieldPosition::new(42.0, 64.0, 40.0)),
            (Material, FieldPosition::new(42.0, 74.0, 150.0)),
            (Remarks, FieldPosition::new(18.0, 238.0, 174.0).size(8.5)),
            (SignedAt, FieldPosition::new(122.0, 279.0, 70.0).size(7.5)),
        ]);

        let checks = CheckColumns {
            passed_x_mm: 121.0,
            failed_x_mm: 135.5,
            comment_x_mm: 147.0,
            comment_width_mm: 46.0,
            font_size: 8.0,
            page: 0,
            rows: CheckKey::ALL
                .iter()
                .enumerate()
                .map(|(i, key)| (*key, 188.0 + i as f64 * 6.5))
                .collect(),
        };

        let open_table = OverlayTable {
            top_mm: 94.0,
            row_height_mm: 6.0,
            max_rows: 6,
            font_size: 8.0,
            page: 0,
            columns: vec![
                OverlayColumn::left(OpenComponent, 18.0, 58.0),
                OverlayColumn::right(OpenArea, 78.0, 20.0),
                OverlayColumn::right(OpenThickness, 100.0, 20.0),
                OverlayColumn::right(OpenDensity, 122.0, 22.0),
                OverlayColumn::right(OpenBags, 146.0, 18.0),
                OverlayColumn::right(OpenLambda, 166.0, 26.0),
            ],
        };

        let closed_table = OverlayTable {
            top_mm: 142.0,
            row_height_mm: 6.0,
            max_rows: 5,
            font_size: 8.0,
            page: 0,
            columns: vec![
                OverlayColumn::left(ClosedComponent, 18.0, 48.0),
                OverlayColumn::right(ClosedArea, 68.0, 18.0),
                OverlayColumn::right(ClosedThickness, 88.0, 18.0),
                OverlayColumn::right(ClosedVolume, 108.0, 18.0),
                OverlayColumn::right(ClosedDensity, 128.0, 20.0),
                OverlayColumn::right(ClosedBags, 150.0, 16.0),
                OverlayColumn::right(ClosedLambda, 168.0, 24.0),
            ],
        };

        let images = BTreeMap::from([
            (
                Signature,
                ImageBox {
                    x_mm: 122.0,
                    y_mm: 252.0,
                    width_mm: 70.0,
                    height_mm: 22.0,
                    page: 0,
                },
            ),
            (
                PhotoBefore,
                ImageBox {
                    x_mm: 18.0,
                    y_mm: 46.0,
                    width_mm: 84.0,
                    height_mm: 63.0,
                    page: 1,
                },
            ),
            (
                PhotoAfter,
                ImageBox {
                    x_mm: 108.0,
                    y_mm: 46.0,
                    width_mm: 84.0,
                    height_mm: 63.0,
                    page: 1,
                },
            ),
        ]);

        Self {
            fields,
            checks,
            open_table,
            closed_table,
            images,
        }
    }
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self::protocol()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_form_places_every_text_key_once() {
        let layout = OverlayLayout::protocol();
        let mut keys: Vec<FieldKey> = layout.fields.keys().copied().collect();
        keys.extend(layout.open_table.columns.iter().map(|c| c.key));
        keys.extend(layout.closed_table.columns.iter().map(|c| c.key));
        keys.extend(layout.checks.rows.iter().map(|(k, _)| FieldKey::for_check(*k)));
        keys.extend(layout.images.keys().copied());
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total, "a key is placed twice");
        assert_eq!(keys.len(), FieldKey::ALL.len());
    }

    #[test]
    fn table_rows_stay_above_next_section() {
        let layout = OverlayLayout::protocol();
        let open = &layout.open_table;
        assert!(open.row_baseline_mm(open.max_rows - 1) < layout.closed_table.top_mm);
        let closed = &layout.closed_table;
        let first_check = layout.checks.rows[0].1;
        assert!(closed.row_baseline_mm(closed.max_rows - 1) < first_check);
    }

    #[test]
    fn columns_do_not_overlap() {
        let layout = OverlayLayout::protocol();
        for table in [&layout.open_table, &layout.closed_table] {
            for pair in table.columns.windows(2) {
                assert!(pair[0].x_mm + pair[0].width_mm <= pair[1].x_mm);
            }
        }
    }

    #[test]
    fn row_baseline_steps_by_row_height() {
        let t = OverlayLayout::protocol().open_table;
        assert!((t.row_baseline_mm(0) - (t.top_mm + t.row_height_mm)).abs() < 1e-9);
        assert!((t.row_baseline_mm(3) - (t.top_mm + 4.0 * t.row_height_mm)).abs() < 1e-9);
    }
}
