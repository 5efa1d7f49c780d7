//! OpenAPI documentation for the reservation API.
//!
//! Served as JSON at `/api/v1/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::errors::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "scopectl",
        description = "Telescope reservation API. Bookings for the same instrument and start time are serialized through a distributed lock coordinator, so at most one of any set of concurrent requests for a slot succeeds."
    ),
    paths(
        api::handlers::time::get_time,
        api::handlers::instruments::list_instruments,
        api::handlers::reservations::list_reservations,
        api::handlers::reservations::get_reservation,
        api::handlers::reservations::create_reservation,
        api::handlers::reservations::cancel_reservation,
        api::handlers::static_assets::interface,
        api::handlers::health::healthz,
    ),
    components(schemas(
        api::models::reservations::ReservationCreate,
        api::models::reservations::ReservationResponse,
        api::models::reservations::ReservationLinks,
        api::models::reservations::CancelResponse,
        api::models::instruments::InstrumentsResponse,
        api::models::time::TimeResponse,
        ErrorResponse,
    )),
    tags(
        (name = "reservations", description = "Book and cancel instrument time slots"),
        (name = "instruments", description = "Instrument registry"),
        (name = "time", description = "Server clock for client offset estimation"),
        (name = "interface", description = "Embedded web page"),
        (name = "health", description = "Probes"),
    )
)]
pub struct ApiDoc;
