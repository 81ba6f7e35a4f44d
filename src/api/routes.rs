use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::api::handlers::{
    analysis::{get_analysis, get_conversations},
    files::{delete_file, list_files},
    packets::{get_packet_detail, get_packets},
};

/// Root endpoint to provide information about the API
async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "sharkview API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Paginated packet listings over loaded capture files",
        "endpoints": [
            {
                "path": "/api/files",
                "method": "GET",
                "description": "List loaded captures with summaries"
            },
            {
                "path": "/api/files/{capture_id}",
                "method": "DELETE",
                "description": "Remove a capture"
            },
            {
                "path": "/api/packets/{capture_id}?limit=&offset=",
                "method": "GET",
                "description": "Get one page of packet records"
            },
            {
                "path": "/api/packet/{capture_id}/{sequence_number}",
                "method": "GET",
                "description": "Get the layered detail of one packet"
            },
            {
                "path": "/api/conversations/{capture_id}",
                "method": "GET",
                "description": "List a capture's conversations"
            },
            {
                "path": "/api/analyze/{capture_id}",
                "method": "GET",
                "description": "Protocol breakdown, top talkers and traffic over time"
            }
        ]
    }))
}

/// Configure API routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Root endpoint
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                // Capture files
                .service(
                    web::scope("/files")
                        .route("", web::get().to(list_files))
                        .route("/{capture_id}", web::delete().to(delete_file))
                )
                // Packet data
                .route("/packets/{capture_id}", web::get().to(get_packets))
                .route("/packet/{capture_id}/{sequence_number}", web::get().to(get_packet_detail))
                // Analysis
                .route("/conversations/{capture_id}", web::get().to(get_conversations))
                .route("/analyze/{capture_id}", web::get().to(get_analysis))
        );
}
