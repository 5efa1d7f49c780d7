use axum::http::StatusCode;

/// Liveness probe. Does not check the coordinator or the store.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    summary = "Liveness probe",
    responses((status = 200, description = "Service is running", body = String))
)]
pub async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
