//! Business audit trail.
//!
//! Every committed create and cancel produces one [`AuditEvent`]. Events are flat JSON objects:
//!
//! ```json
//! {
//!   "timestamp_utc": "2026-01-01T00:00:00.123Z",
//!   "level": "AUDIT",
//!   "event_type": "RESERVATION_CREATED",
//!   "service": "scopectl",
//!   "details": {
//!     "reservation_id": "550e8400-e29b-41d4-a716-446655440000",
//!     "scientist_id": "42",
//!     "instrument": "Hubble-Acad",
//!     "start_time_utc": "2026-01-01T00:00:00Z"
//!   }
//! }
//! ```
//!
//! Emitting is fire-and-forget from the workflow's point of view: a sink failure is logged and
//! never turns a committed booking into an error.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::db::models::reservations::ReservationDBResponse;
use crate::types::ReservationId;

/// Value of the `level` field on every audit record.
pub const AUDIT_LEVEL: &str = "AUDIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    #[serde(rename = "RESERVATION_CREATED")]
    ReservationCreated,
    #[serde(rename = "RESERVATION_CANCELLED")]
    ReservationCancelled,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservationCreated => write!(f, "RESERVATION_CREATED"),
            Self::ReservationCancelled => write!(f, "RESERVATION_CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDetails {
    pub reservation_id: ReservationId,
    pub scientist_id: String,
    pub instrument: String,
    pub start_time_utc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp_utc: DateTime<Utc>,
    pub level: String,
    pub event_type: AuditEventType,
    pub service: String,
    pub details: AuditDetails,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, service: &str, reservation: &ReservationDBResponse) -> Self {
        Self {
            timestamp_utc: Utc::now(),
            level: AUDIT_LEVEL.to_string(),
            event_type,
            service: service.to_string(),
            details: AuditDetails {
                reservation_id: reservation.id,
                scientist_id: reservation.scientist_id.clone(),
                instrument: reservation.instrument.clone(),
                start_time_utc: reservation.start_time_utc.clone(),
            },
        }
    }

    pub fn created(service: &str, reservation: &ReservationDBResponse) -> Self {
        Self::new(AuditEventType::ReservationCreated, service, reservation)
    }

    pub fn cancelled(service: &str, reservation: &ReservationDBResponse) -> Self {
        Self::new(AuditEventType::ReservationCancelled, service, reservation)
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to serialize audit event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write audit event: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Writes each event as one JSON line on the `audit` tracing target, so the subscriber decides
/// where it ends up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let line = serde_json::to_string(event)?;
        tracing::info!(target: "audit", event_type = %event.event_type, "{line}");
        Ok(())
    }
}

/// Appends each event as one JSON line to a file.
pub struct JsonLinesAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesAuditSink {
    /// Open `path` for appending, creating it if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path).await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonLinesAuditSink {
    async fn emit(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        // One write per event under the lock keeps lines from interleaving.
        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
