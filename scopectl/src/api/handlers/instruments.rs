use axum::{Json, extract::State};

use crate::AppState;
use crate::api::models::instruments::InstrumentsResponse;

#[utoipa::path(
    get,
    path = "/api/v1/instruments",
    tag = "instruments",
    summary = "List instruments",
    responses((status = 200, description = "Configured instruments", body = InstrumentsResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn list_instruments(State(state): State<AppState>) -> Json<InstrumentsResponse> {
    Json(InstrumentsResponse {
        instruments: state.config.instruments.clone(),
    })
}
