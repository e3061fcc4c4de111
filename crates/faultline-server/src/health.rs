use axum::response::IntoResponse;
use http::StatusCode;

/// Liveness probe; always answers `200 ok`
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
