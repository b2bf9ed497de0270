use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use super::errors::TodoApiError;
use super::state::AppState;

/// Service info
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Todo List API Server is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "todos": "/api/todos",
            "health": "/api/health"
        }
    }))
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let connected = state
        .with_store(|store| Ok(store.is_connected()))
        .await
        .unwrap_or(false);

    let database = if connected { "connected" } else { "disconnected" };

    HttpResponse::Ok().json(json!({
        "success": true,
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "message": "Server is healthy",
        "timestamp": chrono::Utc::now().timestamp_millis(),
        "database": database,
    }))
}

/// Fallback for every unmatched route
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    TodoApiError::RouteNotFound(req.uri().to_string()).to_response()
}
