//! Server configuration from the environment.

use std::path::PathBuf;

use crate::error::RenderError;
use crate::overlay::Calibration;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_TEMPLATE_PATH: &str = "assets/protocol_template.pdf";
pub const DEFAULT_TEMPLATE_URL_PATH: &str = "/assets/protocol_template.pdf";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: String,
    pub template_path: PathBuf,
    /// Path appended to the request origin for the template fallback fetch.
    pub template_url_path: String,
    /// `scheme://host` used for the fallback fetch instead of the request's
    /// Host header.
    pub public_origin: Option<String>,
    pub calibration_path: Option<PathBuf>,
    pub overlay_debug: Option<bool>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            template_url_path: DEFAULT_TEMPLATE_URL_PATH.to_string(),
            public_origin: None,
            calibration_path: None,
            overlay_debug: None,
        }
    }
}

impl ServerConfig {
    /// Read `BOGEN_*` variables. Call `dotenvy::dotenv()` first to pick up a
    /// `.env` file.
    pub fn from_env() -> Result<Self, RenderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RenderError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let overlay_debug = match get("BOGEN_OVERLAY_DEBUG") {
            Some(raw) => Some(parse_bool(&raw).ok_or_else(|| {
                RenderError::Config(format!("BOGEN_OVERLAY_DEBUG must be a boolean, got '{}'", raw))
            })?),
            None => None,
        };

        let mut template_url_path = get("BOGEN_TEMPLATE_URL_PATH").unwrap_or(defaults.template_url_path);
        if !template_url_path.starts_with('/') {
            template_url_path.insert(0, '/');
        }

        let public_origin = match get("BOGEN_PUBLIC_ORIGIN") {
            Some(raw) if raw.starts_with("http://") || raw.starts_with("https://") => {
                Some(raw.trim_end_matches('/').to_string())
            }
            Some(raw) => {
                return Err(RenderError::Config(format!(
                    "BOGEN_PUBLIC_ORIGIN must start with http:// or https://, got '{}'",
                    raw
                )))
            }
            None => None,
        };

        Ok(Self {
            bind: get("BOGEN_BIND").unwrap_or(defaults.bind),
            template_path: get("BOGEN_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_path),
            template_url_path,
            public_origin,
            calibration_path: get("BOGEN_CALIBRATION_PATH").map(PathBuf::from),
            overlay_debug,
        })
    }

    /// URL of the template asset, on the configured public origin when set and
    /// on the requesting origin otherwise.
    pub fn template_url(&self, scheme: &str, host: &str) -> String {
        match &self.public_origin {
            Some(origin) => format!("{}{}", origin, self.template_url_path),
            None => format!("{}://{}{}", scheme, host, self.template_url_path),
        }
    }

    /// The configured calibration document, or an empty calibration.
    pub fn load_calibration(&self) -> Result<Calibration, RenderError> {
        match &self.calibration_path {
            Some(path) => {
                let calibration = Calibration::load(path)?;
                log::info!(
                    "loaded calibration from {} ({} offset(s))",
                    path.display(),
                    calibration.offsets.len()
                );
                Ok(calibration)
            }
            None => Ok(Calibration::default()),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
