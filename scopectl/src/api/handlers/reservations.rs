use crate::AppState;
use crate::api::models::reservations::{CancelResponse, ReservationCreate, ReservationResponse};
use crate::errors::{ErrorResponse, Result};
use crate::types::ReservationId;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    tag = "reservations",
    summary = "List reservations",
    responses(
        (status = 200, description = "All committed reservations, oldest first", body = Vec<ReservationResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_reservations(State(state): State<AppState>) -> Result<Json<Vec<ReservationResponse>>> {
    let reservations = state.booking.list().await?;
    Ok(Json(reservations.into_iter().map(ReservationResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    tag = "reservations",
    summary = "Get a reservation",
    params(("id" = String, Path, description = "Reservation ID (UUID)")),
    responses(
        (status = 200, description = "Reservation details", body = ReservationResponse),
        (status = 400, description = "Malformed reservation ID", body = ErrorResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_reservation(
    State(state): State<AppState>,
    id: std::result::Result<Path<ReservationId>, PathRejection>,
) -> Result<Json<ReservationResponse>> {
    let Path(id) = id?;
    let reservation = state.booking.get(id).await?;
    Ok(Json(reservation.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "reservations",
    summary = "Book a slot",
    description = "Takes the coordinator lock for the instrument and start time, checks that the slot is free, and commits the reservation.",
    request_body = ReservationCreate,
    responses(
        (status = 201, description = "Reservation committed", body = ReservationResponse),
        (status = 400, description = "Missing field or malformed body", body = ErrorResponse),
        (status = 409, description = "Slot locked by another request (`resource-locked`) or already booked (`conflict`)", body = ErrorResponse),
        (status = 503, description = "Lock coordinator unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_reservation(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ReservationCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationResponse>)> {
    let Json(create) = payload?;
    let reservation = state.booking.create(create.into()).await?;
    Ok((StatusCode::CREATED, Json(reservation.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reservations/{id}",
    tag = "reservations",
    summary = "Cancel a reservation",
    params(("id" = String, Path, description = "Reservation ID (UUID)")),
    responses(
        (status = 200, description = "Reservation cancelled", body = CancelResponse),
        (status = 400, description = "Malformed reservation ID", body = ErrorResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
        (status = 409, description = "Slot locked by another request", body = ErrorResponse),
        (status = 503, description = "Lock coordinator unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    id: std::result::Result<Path<ReservationId>, PathRejection>,
) -> Result<Json<CancelResponse>> {
    let Path(id) = id?;
    state.booking.cancel(id).await?;
    Ok(Json(CancelResponse::cancelled()))
}
