use crate::types::ReservationId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Name of the `(instrument, start_time_utc)` unique constraint in the reservations table.
pub const SLOT_UNIQUE_CONSTRAINT: &str = "reservations_slot_unique";

/// Database request for committing a reservation.
///
/// The workflow assigns both the identifier and the commit timestamp, so every store
/// implementation records exactly the same values.
#[derive(Debug, Clone)]
pub struct ReservationCreateDBRequest {
    pub id: ReservationId,
    pub scientist_id: String,
    pub instrument: String,
    pub start_time_utc: String,
    pub created_at: DateTime<Utc>,
}

/// A committed reservation as stored.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ReservationDBResponse {
    pub id: ReservationId,
    pub scientist_id: String,
    pub instrument: String,
    pub start_time_utc: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReservationCreateDBRequest> for ReservationDBResponse {
    fn from(request: ReservationCreateDBRequest) -> Self {
        Self {
            id: request.id,
            scientist_id: request.scientist_id,
            instrument: request.instrument,
            start_time_utc: request.start_time_utc,
            created_at: request.created_at,
        }
    }
}
