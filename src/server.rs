//! HTTP endpoints for document generation.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::documents::RenderedDocument;
use crate::error::RenderError;
use crate::model::{QuoteInput, ReportInput};
use crate::overlay::{Calibration, LocalOrRemoteTemplate};
use crate::ProtocolOptions;

/// Photos and signatures arrive base64-encoded inside the JSON body.
pub const MAX_PAYLOAD_BYTES: usize = 32 * 1024 * 1024;
pub const RENDER_MODE_HEADER: &str = "X-Render-Mode";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

/// Immutable state shared by all workers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub calibration: Arc<Calibration>,
}

impl AppState {
    pub fn new(config: ServerConfig, calibration: Calibration) -> Self {
        Self {
            config: Arc::new(config),
            calibration: Arc::new(calibration),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProtocolQuery {
    /// `flowed` skips the template overlay.
    pub mode: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
        .service(
            web::scope("/api/documents")
                .service(web::resource("/protocol").route(web::post().to(render_protocol)))
                .service(web::resource("/quote").route(web::post().to(render_quote))),
        )
        .service(web::resource("/health").route(web::get().to(health)));
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub async fn render_protocol(
    state: web::Data<AppState>,
    query: web::Query<ProtocolQuery>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let input: ReportInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(e) => return error_response(&RenderError::from(e)),
    };

    let flowed_only = query.mode.as_deref() == Some("flowed");
    let options = if flowed_only {
        ProtocolOptions::flowed()
    } else {
        let fallback_url = {
            let info = req.connection_info();
            state.config.template_url(info.scheme(), info.host())
        };
        let source = LocalOrRemoteTemplate::new(state.config.template_path.clone())
            .with_fallback_url(fallback_url);
        ProtocolOptions {
            template: Some(Box::new(source)),
            calibration: (*state.calibration).clone(),
            debug: state.config.overlay_debug,
        }
    };

    let result = web::block(move || crate::render_protocol(&input, options)).await;
    respond(result)
}

pub async fn render_quote(body: web::Bytes) -> HttpResponse {
    let input: QuoteInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(e) => return error_response(&RenderError::from(e)),
    };
    let result = web::block(move || crate::render_quote(&input)).await;
    respond(result)
}

fn respond(
    result: Result<Result<RenderedDocument, RenderError>, actix_web::error::BlockingError>,
) -> HttpResponse {
    match result {
        Ok(Ok(doc)) => pdf_response(doc),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            log::error!("render worker failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

fn pdf_response(doc: RenderedDocument) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", doc.filename),
        ))
        .insert_header((RENDER_MODE_HEADER, doc.mode.as_str()))
        .body(doc.bytes)
}

fn error_response(e: &RenderError) -> HttpResponse {
    if e.is_client_error() {
        log::info!("rejected document payload: {}", e);
        HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string()))
    } else {
        log::error!("document rendering failed: {}", e);
        HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
    }
}

pub async fn run(config: ServerConfig, calibration: Calibration) -> std::io::Result<()> {
    let bind = config.bind.clone();
    log::info!(
        "starting server at http://{} (template {})",
        bind,
        config.template_path.display()
    );
    let state = web::Data::new(AppState::new(config, calibration));

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
