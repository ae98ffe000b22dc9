//! Maps a report onto overlay pages.
//!
//! The mapper draws values only. Each draw position is nominal layout plus
//! calibration, converted from the template's millimeter frame to PDF points.
//! Every resolved position is also recorded as a [`Placement`], which is what
//! debug mode marks on the page.

use crate::font::Font;
use crate::format;
use crate::image_loader::ImageAsset;
use crate::layout::table::Align;
use crate::layout::{fit_image, LayoutPage, Stroke};
use crate::model::ReportInput;
use crate::style::{Color, Palette};
use crate::text::{TextLayout, TextStyle};
use crate::units::{mm_to_pt, pt_to_mm, MmPoint};

use super::layout::{text_style, ImageBox, OverlayTable};
use super::{Calibration, FieldKey, OverlayLayout};

const VALUE_COLOR: Color = Palette::INK;
const MARK: &str = "X";
const CROSSHAIR_MM: f64 = 1.5;
const DEBUG_LABEL: TextStyle = TextStyle::new(Font::Regular, 4.5, 5.5);

/// A resolved draw position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub key: FieldKey,
    pub page: usize,
    pub at: MmPoint,
}

pub struct OverlayMapper<'a> {
    layout: &'a OverlayLayout,
    calibration: &'a Calibration,
    text: TextLayout,
    pages: Vec<LayoutPage>,
    placements: Vec<Placement>,
    debug: bool,
}

impl<'a> OverlayMapper<'a> {
    /// One transparent page per template page, all of the template's size.
    pub fn new(
        layout: &'a OverlayLayout,
        calibration: &'a Calibration,
        page_width: f64,
        page_height: f64,
        page_count: usize,
    ) -> Self {
        Self {
            layout,
            calibration,
            text: TextLayout::new(),
            pages: (0..page_count)
                .map(|_| LayoutPage::new(page_width, page_height))
                .collect(),
            placements: Vec::new(),
            debug: calibration.debug,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn into_pages(self) -> Vec<LayoutPage> {
        self.pages
    }

    pub fn map_report(&mut self, input: &ReportInput) {
        use FieldKey::*;

        let city = input.address.city_line();
        let text_fields: [(FieldKey, &str); 8] = [
            (OrderId, input.order_id.as_str()),
            (ProjectNumber, input.project_number.as_str()),
            (InspectionDate, input.inspection_date.as_str()),
            (CustomerName, input.customer_name.as_str()),
            (InstallerName, input.installer_name.as_str()),
            (Street, input.address.street.as_str()),
            (PostalCity, city.as_str()),
            (Material, input.material.as_str()),
        ];
        for (key, value) in text_fields {
            self.draw_field(key, format::or_dash(value));
        }
        if let Some(remarks) = input.remarks.as_deref().filter(|r| !r.trim().is_empty()) {
            self.draw_field(Remarks, remarks);
        }

        let open: Vec<Vec<&str>> = input.open_stages().map(|s| s.cells().to_vec()).collect();
        let closed: Vec<Vec<&str>> = input.closed_stages().map(|s| s.cells().to_vec()).collect();
        let layout = self.layout;
        self.draw_table("open", &layout.open_table, &open);
        self.draw_table("closed", &layout.closed_table, &closed);

        self.draw_checks(input);

        self.draw_image(Signature, &input.signature, "signature");
        if let Some(label) = format::signed_at(input.signed_at.as_deref(), input.signed_timezone.as_deref()) {
            self.draw_field(SignedAt, &label);
        }
        self.draw_image(PhotoBefore, &input.photo_before, "before photo");
        self.draw_image(PhotoAfter, &input.photo_after, "after photo");
    }

    /// Resolve and record a position. `None` when the template has no such page.
    fn place(&mut self, key: FieldKey, nominal: MmPoint, page: usize) -> Option<MmPoint> {
        if page >= self.pages.len() {
            log::warn!(
                "overlay field {} is on template page {} but the template has {} page(s); skipping",
                key.as_str(),
                page + 1,
                self.pages.len()
            );
            return None;
        }
        let at = self.calibration.resolve(key, nominal);
        self.placements.push(Placement { key, page, at });
        if self.debug {
            self.mark(key, page, at);
        }
        Some(at)
    }

    fn draw_field(&mut self, key: FieldKey, value: &str) {
        let Some(pos) = self.layout.fields.get(&key).copied() else {
            log::debug!("overlay layout has no position for {}", key.as_str());
            return;
        };
        if let Some(at) = self.place(key, pos.at(), pos.page) {
            self.draw_wrapped(pos.page, at, value, &pos.style(), pos.max_width_mm);
        }
    }

    /// Wrap `value` and shift earlier lines upward so the last line sits on
    /// the nominal baseline.
    fn draw_wrapped(
        &mut self,
        page: usize,
        at: MmPoint,
        value: &str,
        style: &TextStyle,
        max_width_mm: f64,
    ) {
        let lines = self.text.wrap(value, style, mm_to_pt(max_width_mm));
        let step_mm = pt_to_mm(style.line_height);
        let page_height = self.pages[page].height;
        let n = lines.len();
        for (i, line) in lines.into_iter().enumerate() {
            let baseline = MmPoint::new(at.x_mm, at.y_mm - (n - 1 - i) as f64 * step_mm);
            let pdf = baseline.to_pdf(page_height);
            self.pages[page].text(pdf.x, pdf.y, line.text, style, VALUE_COLOR);
        }
    }

    fn draw_single_line(
        &mut self,
        page: usize,
        at: MmPoint,
        value: &str,
        style: &TextStyle,
        width_mm: f64,
        align: Align,
    ) {
        let text = self.text.elide(value, style, mm_to_pt(width_mm));
        let width = self.text.measure(&text, style);
        let pdf = at.to_pdf(self.pages[page].height);
        let x = match align {
            Align::Left => pdf.x,
            Align::Right => mm_to_pt(at.x_mm + width_mm) - width,
        };
        self.pages[page].text(x, pdf.y, text, style, VALUE_COLOR);
    }

    fn draw_table(&mut self, name: &str, table: &OverlayTable, rows: &[Vec<&str>]) {
        if rows.len() > table.max_rows {
            log::warn!(
                "{} cavity table has {} rows but the form holds {}; dropping {}",
                name,
                rows.len(),
                table.max_rows,
                rows.len() - table.max_rows
            );
        }
        let style = text_style(false, table.font_size);
        for (r, row) in rows.iter().take(table.max_rows).enumerate() {
            let baseline_mm = table.row_baseline_mm(r);
            for (col, cell) in table.columns.iter().zip(row.iter()) {
                let nominal = MmPoint::new(col.x_mm, baseline_mm);
                if let Some(at) = self.place(col.key, nominal, table.page) {
                    self.draw_single_line(table.page, at, format::or_dash(cell), &style, col.width_mm, col.align);
                }
            }
        }
    }

    fn draw_checks(&mut self, input: &ReportInput) {
        let layout = self.layout;
        let checks = &layout.checks;
        let mark_style = text_style(true, checks.font_size + 1.0);
        let comment_style = text_style(false, checks.font_size);
        for (check, y_mm) in &checks.rows {
            let Some(item) = input.checks.get(check) else {
                continue;
            };
            let key = FieldKey::for_check(*check);
            let x_mm = if item.passed {
                checks.passed_x_mm
            } else {
                checks.failed_x_mm
            };
            if let Some(at) = self.place(key, MmPoint::new(x_mm, *y_mm), checks.page) {
                self.draw_single_line(checks.page, at, MARK, &mark_style, 6.0, Align::Left);
            }
            if let Some(comment) = item.comment() {
                let nominal = MmPoint::new(checks.comment_x_mm, *y_mm);
                if let Some(at) = self.place(key, nominal, checks.page) {
                    self.draw_wrapped(checks.page, at, comment, &comment_style, checks.comment_width_mm);
                }
            }
        }
    }

    fn draw_image(&mut self, key: FieldKey, asset: &ImageAsset, what: &str) {
        let Some(frame) = self.layout.images.get(&key).copied() else {
            return;
        };
        let Some(image) = asset.load_or_skip(what) else {
            return;
        };
        let Some(at) = self.place(key, MmPoint::new(frame.x_mm, frame.y_mm), frame.page) else {
            return;
        };
        let ImageBox {
            width_mm,
            height_mm,
            page,
            ..
        } = frame;
        let box_w = mm_to_pt(width_mm);
        let box_h = mm_to_pt(height_mm);
        let (dx, dy, w, h) = fit_image(image.width_px, image.height_px, box_w, box_h);
        let bottom_left = MmPoint::new(at.x_mm, at.y_mm + height_mm).to_pdf(self.pages[page].height);
        self.pages[page].image(bottom_left.x + dx, bottom_left.y + dy, w, h, image);
    }

    /// Crosshair and key name at a draw position.
    fn mark(&mut self, key: FieldKey, page: usize, at: MmPoint) {
        let page_ref = &mut self.pages[page];
        let c = at.to_pdf(page_ref.height);
        let arm = mm_to_pt(CROSSHAIR_MM);
        let stroke = Stroke::new(Palette::DEBUG, 0.3);
        page_ref.line(c.x - arm, c.y, c.x + arm, c.y, stroke);
        page_ref.line(c.x, c.y - arm, c.x, c.y + arm, stroke);
        page_ref.text(c.x + arm + 0.5, c.y + 0.8, key.as_str(), &DEBUG_LABEL, Palette::DEBUG);
    }
}
