use api_types::{ApiResponse, health::Health};
use axum::Json;
use chrono::Utc;

pub async fn health() -> Json<ApiResponse<Health>> {
    Json(
        ApiResponse::ok(Health {
            timestamp: Utc::now(),
        })
        .with_message("Server is running!"),
    )
}
