use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};
use serde::Deserialize;

use super::{error_response, parse_capture_id, CatalogState};
use crate::utils::error::AppError;

/// Query parameters for listing packets
#[derive(Deserialize)]
pub struct PacketsQuery {
    /// Offset for pagination
    #[serde(default)]
    offset: usize,

    /// Limit for pagination; 0 or absent means the server default
    #[serde(default)]
    limit: usize,
}

/// Get one page of a capture's packet records
pub async fn get_packets(
    catalog: CatalogState,
    path: web::Path<String>,
    query: web::Query<PacketsQuery>,
) -> impl Responder {
    let id = match parse_capture_id(&path) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let catalog = catalog.read().await;

    let limit = catalog.config().clamp_limit(query.limit);
    if limit < query.limit {
        warn!("Requested limit {} clamped to {}", query.limit, limit);
    }

    match catalog.page(&id, query.offset, limit) {
        Some(page) => {
            info!(
                "Retrieved {} packets of capture {} (offset: {}, limit: {}, total: {})",
                page.records.len(),
                id,
                query.offset,
                limit,
                page.total_count
            );
            HttpResponse::Ok().json(page)
        }
        None => error_response(&AppError::CaptureNotFound(id.to_string())),
    }
}

/// Get the full detail of one packet
pub async fn get_packet_detail(
    catalog: CatalogState,
    path: web::Path<(String, u64)>,
) -> impl Responder {
    let (raw_id, sequence_number) = path.into_inner();
    let id = match parse_capture_id(&raw_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let catalog = catalog.read().await;

    if catalog.get(&id).is_none() {
        return error_response(&AppError::CaptureNotFound(id.to_string()));
    }

    match catalog.detail(&id, sequence_number) {
        Some(detail) => {
            info!("Retrieved packet {} of capture {}", sequence_number, id);
            HttpResponse::Ok().json(detail)
        }
        None => HttpResponse::NotFound().json(serde_json::json!({
            "status": "error",
            "message": format!("Packet {} not found in capture {}", sequence_number, id)
        })),
    }
}
