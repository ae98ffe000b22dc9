//! # Bogen
//!
//! A print-exact report engine for site-inspection protocols and price
//! quotations.
//!
//! Documents are laid out onto fixed A4 pages with a single downward cursor:
//! every block is measured, the page flow decides whether it fits, and the
//! block is drawn whole. The inspection protocol can instead be stamped onto
//! a pre-printed PDF form, with values placed at calibrated millimeter
//! positions. When the form can't be used the flowed layout is produced, so
//! valid input always yields a document.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON)
//!       ↓
//!   [model]      report and quote payloads
//!       ↓
//!   [documents]  overlay first, flowed fallback
//!     ↙     ↘
//! [overlay]  [layout]   calibrated form values / cards, tables, page flow
//!     ↘     ↙
//!   [pdf]        serialize to PDF bytes
//! ```

pub mod config;
pub mod documents;
pub mod error;
pub mod font;
pub mod format;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod overlay;
pub mod pdf;
pub mod server;
pub mod style;
pub mod text;
pub mod units;

use documents::{
    protocol_filename, quote_filename, render_with_fallback, DocumentRenderer,
    FlowedProtocolRenderer, FlowedQuoteRenderer, OverlayProtocolRenderer, RenderMode,
    RenderedDocument,
};
use error::RenderError;
use model::{QuoteInput, ReportInput};
use overlay::{Calibration, TemplateSource};

/// How to render a protocol. Without a template the flowed layout is used
/// directly.
#[derive(Default)]
pub struct ProtocolOptions {
    pub template: Option<Box<dyn TemplateSource + Send>>,
    pub calibration: Calibration,
    /// Overrides `calibration.debug` when set.
    pub debug: Option<bool>,
}

impl ProtocolOptions {
    pub fn flowed() -> Self {
        Self::default()
    }

    pub fn with_template(template: Box<dyn TemplateSource + Send>, calibration: Calibration) -> Self {
        Self {
            template: Some(template),
            calibration,
            debug: None,
        }
    }
}

/// Render an inspection protocol, trying the template overlay first.
pub fn render_protocol(
    input: &ReportInput,
    options: ProtocolOptions,
) -> Result<RenderedDocument, RenderError> {
    log::info!("rendering protocol for order '{}'", input.order_id);
    let overlay = options.template.map(|source| {
        OverlayProtocolRenderer::new(source, options.calibration).with_debug(options.debug)
    });
    let primary = overlay
        .as_ref()
        .map(|r| r as &dyn DocumentRenderer<ReportInput>);
    let (bytes, mode) = render_with_fallback(input, primary, &FlowedProtocolRenderer::new())?;
    Ok(RenderedDocument {
        bytes,
        filename: protocol_filename(&input.customer_name, &input.order_id),
        mode,
    })
}

/// Render a price quotation.
pub fn render_quote(input: &QuoteInput) -> Result<RenderedDocument, RenderError> {
    log::info!("rendering quote '{}'", input.quote_number);
    let bytes = FlowedQuoteRenderer::new().render(input)?;
    Ok(RenderedDocument {
        bytes,
        filename: quote_filename(&input.customer_name, &input.quote_number),
        mode: RenderMode::Flowed,
    })
}

/// Parse a [`ReportInput`] JSON payload and render it.
pub fn render_protocol_json(
    json: &str,
    options: ProtocolOptions,
) -> Result<RenderedDocument, RenderError> {
    let input: ReportInput = serde_json::from_str(json)?;
    render_protocol(&input, options)
}

/// Parse a [`QuoteInput`] JSON payload and render it.
pub fn render_quote_json(json: &str) -> Result<RenderedDocument, RenderError> {
    let input: QuoteInput = serde_json::from_str(json)?;
    render_quote(&input)
}
