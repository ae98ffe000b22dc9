//! # Document Assembler
//!
//! A document type has one or more renderers. The protocol tries the
//! template overlay first and falls back to the flowed layout when anything
//! on the overlay path fails; the quote is always flowed.

pub mod protocol;
pub mod quote;

use crate::error::RenderError;

pub use protocol::{FlowedProtocolRenderer, OverlayProtocolRenderer};
pub use quote::FlowedQuoteRenderer;

/// Turns an input into finished PDF bytes.
pub trait DocumentRenderer<I: ?Sized> {
    /// Short name for log lines.
    fn name(&self) -> &'static str;
    fn render(&self, input: &I) -> Result<Vec<u8>, RenderError>;
}

/// Which path produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Overlay,
    Flowed,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Overlay => "overlay",
            RenderMode::Flowed => "flowed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mode: RenderMode,
}

/// Run `primary` if there is one; on any error log it and run `fallback` on
/// the same input. Errors from the fallback are returned.
pub fn render_with_fallback<I: ?Sized>(
    input: &I,
    primary: Option<&dyn DocumentRenderer<I>>,
    fallback: &dyn DocumentRenderer<I>,
) -> Result<(Vec<u8>, RenderMode), RenderError> {
    if let Some(primary) = primary {
        match primary.render(input) {
            Ok(bytes) => {
                log::info!("rendered with {} ({} bytes)", primary.name(), bytes.len());
                return Ok((bytes, RenderMode::Overlay));
            }
            Err(e) => {
                log::warn!(
                    "{} failed, falling back to {}: {}",
                    primary.name(),
                    fallback.name(),
                    e
                );
            }
        }
    }
    let bytes = fallback.render(input)?;
    log::info!("rendered with {} ({} bytes)", fallback.name(), bytes.len());
    Ok((bytes, RenderMode::Flowed))
}

/// `Pruefprotokoll_Familie_Muster_A-17` style names. Runs of anything that
/// isn't an ASCII letter or digit become one `_`; leading and trailing `_`
/// are trimmed. `-` and `.` count as separators too.
pub fn sanitize_filename(parts: &[&str]) -> String {
    let joined = parts.join("_");
    let mut out = String::with_capacity(joined.len());
    let mut pending_sep = false;
    for ch in joined.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        out.push_str("dokument");
    }
    out
}

pub fn protocol_filename(customer: &str, order_id: &str) -> String {
    format!("{}.pdf", sanitize_filename(&["Pruefprotokoll", customer, order_id]))
}

pub fn quote_filename(customer: &str, quote_number: &str) -> String {
    format!("{}.pdf", sanitize_filename(&["Angebot", customer, quote_number]))
}
