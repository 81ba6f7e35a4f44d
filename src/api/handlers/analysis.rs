use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use super::{error_response, parse_capture_id, CatalogState};
use crate::utils::error::AppError;
use crate::view::stream::Conversation;

/// Response for a capture's conversations
#[derive(Serialize)]
struct ConversationsResponse {
    capture_id: Uuid,
    conversations: Vec<Conversation>,
}

/// List the conversations of a capture, first seen first
pub async fn get_conversations(catalog: CatalogState, path: web::Path<String>) -> impl Responder {
    let id = match parse_capture_id(&path) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let catalog = catalog.read().await;

    match catalog.conversations(&id) {
        Some(conversations) => {
            info!(
                "Retrieved {} conversations of capture {}",
                conversations.len(),
                id
            );
            HttpResponse::Ok().json(ConversationsResponse {
                capture_id: id,
                conversations,
            })
        }
        None => error_response(&AppError::CaptureNotFound(id.to_string())),
    }
}

/// Protocol histogram, top talkers and traffic over time of a capture
pub async fn get_analysis(catalog: CatalogState, path: web::Path<String>) -> impl Responder {
    let id = match parse_capture_id(&path) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };
    let catalog = catalog.read().await;

    match catalog.analyze(&id) {
        Some(analysis) => {
            info!("Analyzed capture {}", id);
            HttpResponse::Ok().json(analysis)
        }
        None => error_response(&AppError::CaptureNotFound(id.to_string())),
    }
}
