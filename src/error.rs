//! Structured error types for the rendering engine.
//!
//! Template and image variants are recoverable: the assembler and the image
//! block catch them and degrade. `Render` is what reaches the caller when the
//! final rendering path itself fails.

use thiserror::Error;

/// The unified error type returned by all public `bogen` API functions.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON input failed to parse as a valid report or quote payload.
    #[error("failed to parse document input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// Neither the local template path nor the HTTP fallback produced bytes.
    #[error("template unavailable: {0}")]
    TemplateUnavailable(String),
    /// Template bytes could not be parsed or composed with the overlay.
    #[error("template error: {0}")]
    Template(String),
    /// An embedded image could not be decoded.
    #[error("image error: {0}")]
    Image(String),
    /// Layout or PDF generation failed.
    #[error("render error: {0}")]
    Render(String),
    /// Calibration or server configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl RenderError {
    /// Whether the error was caused by the request payload rather than the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RenderError::Parse { .. })
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the payload schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        RenderError::Parse { source: e, hint }
    }
}

impl From<lopdf::Error> for RenderError {
    fn from(e: lopdf::Error) -> Self {
        RenderError::Template(format!("pdf compose error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: RenderError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("failed to parse document input"));
        assert!(msg.contains("Hint: Check for trailing commas"));
        assert!(err.is_client_error());
    }

    #[test]
    fn eof_hint() {
        let err: RenderError = serde_json::from_str::<serde_json::Value>("{\"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn io_errors_convert_and_stay_server_side() {
        fn read(path: &str) -> Result<String, RenderError> {
            Ok(std::fs::read_to_string(path)?)
        }
        let err = read("/nonexistent/bogen/input.json").unwrap_err();
        assert!(matches!(err, RenderError::Io(_)));
        assert!(err.to_string().starts_with("io error:"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn render_error_is_server_side() {
        let err = RenderError::Render("boom".to_string());
        assert_eq!(err.to_string(), "render error: boom");
        assert!(!err.is_client_error());
    }
}
