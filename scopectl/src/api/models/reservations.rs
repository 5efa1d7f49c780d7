//! API request/response models for reservations.

use crate::booking::NewReservation;
use crate::db::models::reservations::ReservationDBResponse;
use crate::types::ReservationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Base path of the reservation resource.
pub const RESERVATIONS_PATH: &str = "/api/v1/reservations";

/// Request body for booking a slot.
///
/// Missing fields deserialize as empty and are rejected by the booking workflow, so the error
/// names the field instead of reporting a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReservationCreate {
    /// Requesting scientist; a JSON string or integer
    #[serde(default, deserialize_with = "string_or_integer")]
    #[schema(value_type = String, example = "42")]
    pub scientist_id: String,
    /// Instrument to book
    #[serde(default)]
    #[schema(example = "Hubble-Acad")]
    pub instrument: String,
    /// Slot start; compared as an exact string
    #[serde(default)]
    #[schema(example = "2026-01-01T00:00:00Z")]
    pub start_time_utc: String,
}

impl From<ReservationCreate> for NewReservation {
    fn from(create: ReservationCreate) -> Self {
        Self {
            scientist_id: create.scientist_id,
            instrument: create.instrument,
            start_time_utc: create.start_time_utc,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInteger {
    String(String),
    Signed(i64),
    Unsigned(u64),
}

fn string_or_integer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrInteger>::deserialize(deserializer)? {
        None => String::new(),
        Some(StringOrInteger::String(s)) => s,
        Some(StringOrInteger::Signed(n)) => n.to_string(),
        Some(StringOrInteger::Unsigned(n)) => n.to_string(),
    })
}

/// Hypermedia links for a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReservationLinks {
    /// Where to fetch this reservation
    #[serde(rename = "self")]
    pub self_link: String,
    /// Where to send `DELETE` to cancel it
    pub cancel: String,
}

impl ReservationLinks {
    pub fn for_id(id: ReservationId) -> Self {
        let href = format!("{RESERVATIONS_PATH}/{id}");
        Self {
            self_link: href.clone(),
            cancel: href,
        }
    }
}

/// A committed reservation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReservationId,
    pub scientist_id: String,
    pub instrument: String,
    pub start_time_utc: String,
    /// When the reservation was committed
    pub created_at: DateTime<Utc>,
    pub links: ReservationLinks,
}

impl From<ReservationDBResponse> for ReservationResponse {
    fn from(db: ReservationDBResponse) -> Self {
        Self {
            links: ReservationLinks::for_id(db.id),
            id: db.id,
            scientist_id: db.scientist_id,
            instrument: db.instrument,
            start_time_utc: db.start_time_utc,
            created_at: db.created_at,
        }
    }
}

/// Body returned by a successful cancel.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    #[schema(example = "cancelled")]
    pub status: String,
}

impl CancelResponse {
    pub fn cancelled() -> Self {
        Self {
            status: "cancelled".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_scientist_id_accepts_string_and_integer() {
        let from_int: ReservationCreate =
            serde_json::from_str(r#"{"scientist_id": 42, "instrument": "Hubble-Acad", "start_time_utc": "t"}"#).unwrap();
        assert_eq!(from_int.scientist_id, "42");

        let from_str: ReservationCreate =
            serde_json::from_str(r#"{"scientist_id": "sci-7", "instrument": "Hubble-Acad", "start_time_utc": "t"}"#).unwrap();
        assert_eq!(from_str.scientist_id, "sci-7");
    }

    #[test]
    fn test_missing_and_null_fields_become_empty() {
        let create: ReservationCreate = serde_json::from_str(r#"{"scientist_id": null}"#).unwrap();
        assert!(create.scientist_id.is_empty());
        assert!(create.instrument.is_empty());
        assert!(create.start_time_utc.is_empty());
    }

    #[test]
    fn test_scientist_id_rejects_other_types() {
        assert!(serde_json::from_str::<ReservationCreate>(r#"{"scientist_id": true}"#).is_err());
        assert!(serde_json::from_str::<ReservationCreate>(r#"{"scientist_id": 1.5}"#).is_err());
    }

    #[test]
    fn test_response_carries_links() {
        let id = Uuid::new_v4();
        let response = ReservationResponse::from(ReservationDBResponse {
            id,
            scientist_id: "42".to_string(),
            instrument: "Kepler-Acad".to_string(),
            start_time_utc: "2026-01-01T00:00:00Z".to_string(),
            created_at: Utc::now(),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["links"]["self"], format!("/api/v1/reservations/{id}"));
        assert_eq!(json["links"]["cancel"], format!("/api/v1/reservations/{id}"));
        assert_eq!(json["instrument"], "Kepler-Acad");
    }
}
