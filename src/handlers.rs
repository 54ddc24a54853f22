// src/handlers.rs

pub mod addresses;
pub mod auth;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod realtime;

use axum::Json;
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Servidor no ar"))
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": chrono::Utc::now() }))
}
