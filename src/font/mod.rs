//! # Font Management
//!
//! Reports are set in the two standard Helvetica faces. Standard PDF fonts
//! need no embedding, so the context only has to answer width questions for
//! layout and name the face for the serializer.

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// The font selection exposed to layout code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    pub fn standard(self) -> StandardFont {
        match self {
            Font::Regular => StandardFont::Helvetica,
            Font::Bold => StandardFont::HelveticaBold,
        }
    }
}

/// The standard PDF fonts the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
        }
    }
}

/// Shared font context used by layout and PDF serialization.
///
/// Every measurement in the engine goes through one `FontContext`, so the
/// measure pass and the draw pass of a block can never disagree.
#[derive(Debug, Default, Clone, Copy)]
pub struct FontContext;

impl FontContext {
    pub fn new() -> Self {
        Self
    }

    /// Measure the width of a string in points.
    pub fn measure(&self, text: &str, font: Font, font_size: f64) -> f64 {
        font.standard().metrics().measure_string(text, font_size)
    }
}
