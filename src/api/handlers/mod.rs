pub mod analysis;
pub mod files;
pub mod packets;

use actix_web::HttpResponse;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::capture::CaptureCatalog;
use crate::utils::error::{AppError, AppResult};

/// Shared handler state
pub type CatalogState = actix_web::web::Data<Arc<RwLock<CaptureCatalog>>>;

/// Parse a capture id taken from the request path
pub fn parse_capture_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidCapture(format!("'{}' is not a capture id", raw)))
}

/// JSON error body in the API's `{"status": "error"}` shape
pub fn error_response(error: &AppError) -> HttpResponse {
    let body = serde_json::json!({
        "status": "error",
        "message": error.to_string()
    });

    match error {
        AppError::CaptureNotFound(_) => HttpResponse::NotFound().json(body),
        AppError::InvalidCapture(_) => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}
