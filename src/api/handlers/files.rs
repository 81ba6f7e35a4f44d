use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde::Serialize;

use super::{error_response, parse_capture_id, CatalogState};
use crate::capture::CaptureInfo;
use crate::utils::error::AppError;

/// Response for listing captures
#[derive(Serialize)]
struct FilesResponse {
    files: Vec<CaptureInfo>,
}

/// List loaded captures with their summaries
pub async fn list_files(catalog: CatalogState) -> impl Responder {
    let catalog = catalog.read().await;
    let files = catalog.list();
    info!("Listing {} captures", files.len());

    HttpResponse::Ok().json(FilesResponse { files })
}

/// Drop a capture from the catalog
pub async fn delete_file(catalog: CatalogState, path: web::Path<String>) -> impl Responder {
    let id = match parse_capture_id(&path) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let mut catalog = catalog.write().await;

    match catalog.remove(&id) {
        Some(capture) => {
            info!("Deleted capture {} on request", id);
            HttpResponse::Ok().json(serde_json::json!({
                "status": "success",
                "message": format!("Capture '{}' removed", capture.name)
            }))
        }
        None => error_response(&AppError::CaptureNotFound(id.to_string())),
    }
}
