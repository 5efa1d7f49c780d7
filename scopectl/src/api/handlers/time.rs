use axum::Json;
use chrono::Utc;

use crate::api::models::time::TimeResponse;

#[utoipa::path(
    get,
    path = "/api/v1/time",
    tag = "time",
    summary = "Current server time",
    description = "Returns the server's UTC clock. Clients time the round trip and use the midpoint to estimate their clock offset.",
    responses((status = 200, description = "Server time", body = TimeResponse))
)]
#[tracing::instrument]
pub async fn get_time() -> Json<TimeResponse> {
    Json(TimeResponse { time_utc: Utc::now() })
}
