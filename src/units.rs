//! # Geometry & Unit Conversion
//!
//! PDF pages are measured in points (1/72 inch) with the origin at the
//! bottom-left corner. Templates are measured with a ruler: millimeters from
//! the top-left corner. Everything that crosses between the two frames goes
//! through this module.

use serde::{Deserialize, Serialize};

pub const MM_PER_INCH: f64 = 25.4;
pub const PT_PER_INCH: f64 = 72.0;

/// A4 portrait in points.
pub const A4_WIDTH_PT: f64 = 595.28;
pub const A4_HEIGHT_PT: f64 = 841.89;

/// Convert millimeters to points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_INCH / MM_PER_INCH
}

/// Convert points to millimeters.
pub fn pt_to_mm(pt: f64) -> f64 {
    pt * MM_PER_INCH / PT_PER_INCH
}

/// A position in the template frame: millimeters from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmPoint {
    pub x_mm: f64,
    pub y_mm: f64,
}

impl MmPoint {
    pub fn new(x_mm: f64, y_mm: f64) -> Self {
        Self { x_mm, y_mm }
    }

    /// Shift by a directional offset. Positive `dy_mm` moves down the page.
    pub fn offset(self, dx_mm: f64, dy_mm: f64) -> Self {
        Self {
            x_mm: self.x_mm + dx_mm,
            y_mm: self.y_mm + dy_mm,
        }
    }

    /// Convert to PDF user space on a page of the given height.
    pub fn to_pdf(self, page_height_pt: f64) -> PtPoint {
        PtPoint {
            x: mm_to_pt(self.x_mm),
            y: page_height_pt - mm_to_pt(self.y_mm),
        }
    }
}

/// A position in PDF user space: points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PtPoint {
    pub x: f64,
    pub y: f64,
}
