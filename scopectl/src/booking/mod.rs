//! The reservation workflow.
//!
//! [`BookingService`] is the only code path that commits or removes reservations. It guarantees
//! that no two committed reservations share an `(instrument, start_time_utc)` slot, even when
//! several service instances write to the same store, by serializing on a coordinator lock
//! named after the slot:
//!
//! ```text
//! create:  validate -> acquire(slot) -> find_by_slot -> insert -> audit -> release
//!                         |                |
//!                    denied: 409      found: release, 409
//!                    unreachable: 503
//!
//! cancel:  get(id) -> acquire(slot) -> get(id) -> delete -> audit -> release
//!             |
//!       absent: 404 without touching the coordinator
//! ```
//!
//! The slot check always happens after the lock is granted. A check made before acquiring would
//! race with any request that commits between the check and the acquire.
//!
//! Every path that obtains a [`LockGuard`] releases it before returning; see
//! [`crate::coordinator::guard`] for how release failures are handled. Nothing in here retries.

use std::sync::Arc;

use chrono::Utc;
use ::metrics::counter;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditSink};
use crate::coordinator::{AcquireError, LockClient, LockError, LockGuard};
use crate::db::errors::DbError;
use crate::db::models::reservations::{ReservationCreateDBRequest, ReservationDBResponse};
use crate::db::store::ReservationStore;
use crate::metrics;
use crate::types::{abbrev_uuid, ReservationId, ResourceKey};


#[derive(Debug, Error)]
pub enum BookingError {
    #[error("missing required field: {field}")]
    InvalidInput { field: &'static str },

    #[error("slot {0} is being booked by another request")]
    ResourceLocked(ResourceKey),

    #[error("lock coordinator unavailable")]
    CoordinatorUnavailable(#[source] LockError),

    #[error("{instrument} is already reserved at {start_time_utc}")]
    Conflict { instrument: String, start_time_utc: String },

    #[error("reservation {0} not found")]
    NotFound(ReservationId),

    #[error(transparent)]
    Store(#[from] DbError),
}

impl BookingError {
    /// Stable machine-readable code, also used as the `reason` metric label.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid-input",
            Self::ResourceLocked(_) => "resource-locked",
            Self::CoordinatorUnavailable(_) => "coordinator-unavailable",
            Self::Conflict { .. } => "conflict",
            Self::NotFound(_) => "not-found",
            Self::Store(_) => "internal",
        }
    }
}

impl From<AcquireError> for BookingError {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::Denied(key) => Self::ResourceLocked(key),
            AcquireError::Unreachable { source, .. } => Self::CoordinatorUnavailable(source),
        }
    }
}

/// A reservation as requested by a caller, before any checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub scientist_id: String,
    pub instrument: String,
    pub start_time_utc: String,
}

impl NewReservation {
    fn validate(&self) -> Result<(), BookingError> {
        let fields = [
            ("scientist_id", &self.scientist_id),
            ("instrument", &self.instrument),
            ("start_time_utc", &self.start_time_utc),
        ];
        match fields.into_iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(BookingError::InvalidInput { field }),
            None => Ok(()),
        }
    }

    fn resource_key(&self) -> ResourceKey {
        ResourceKey::new(&self.instrument, &self.start_time_utc)
    }
}

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn ReservationStore>,
    locks: Arc<dyn LockClient>,
    audit: Arc<dyn AuditSink>,
    service_name: String,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        locks: Arc<dyn LockClient>,
        audit: Arc<dyn AuditSink>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            locks,
            audit,
            service_name: service_name.into(),
        }
    }

    /// Book a slot. Exactly one of any number of concurrent calls for the same slot succeeds.
    #[instrument(skip_all, fields(instrument = %request.instrument, start_time_utc = %request.start_time_utc))]
    pub async fn create(&self, request: NewReservation) -> Result<ReservationDBResponse, BookingError> {
        let result = self.create_inner(request).await;
        match &result {
            Ok(reservation) => {
                counter!(metrics::RESERVATIONS_CREATED).increment(1);
                info!(reservation_id = %abbrev_uuid(&reservation.id), "Reservation created");
            }
            Err(e) => record_rejection(e),
        }
        result
    }

    async fn create_inner(&self, request: NewReservation) -> Result<ReservationDBResponse, BookingError> {
        request.validate()?;

        let guard = LockGuard::acquire(Arc::clone(&self.locks), request.resource_key()).await?;
        let result = self.commit_locked(request).await;
        guard.release().await;
        result
    }

    /// Conflict check and insert. Must only run while holding the slot's lock.
    async fn commit_locked(&self, request: NewReservation) -> Result<ReservationDBResponse, BookingError> {
        if let Some(existing) = self
            .store
            .find_by_slot(&request.instrument, &request.start_time_utc)
            .await?
        {
            info!(existing = %abbrev_uuid(&existing.id), "Slot already reserved");
            return Err(BookingError::Conflict {
                instrument: request.instrument,
                start_time_utc: request.start_time_utc,
            });
        }

        let create = ReservationCreateDBRequest {
            id: Uuid::new_v4(),
            scientist_id: request.scientist_id,
            instrument: request.instrument,
            start_time_utc: request.start_time_utc,
            created_at: Utc::now(),
        };

        let reservation = match self.store.insert(&create).await {
            Ok(reservation) => reservation,
            // The Postgres schema backs the lock with a unique constraint on the slot.
            Err(e) if e.is_slot_violation() => {
                warn!("Slot constraint rejected insert made under the slot lock");
                return Err(BookingError::Conflict {
                    instrument: create.instrument,
                    start_time_utc: create.start_time_utc,
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.emit(AuditEvent::created(&self.service_name, &reservation)).await;
        Ok(reservation)
    }

    /// Cancel a reservation, returning the record that was removed.
    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id)))]
    pub async fn cancel(&self, id: ReservationId) -> Result<ReservationDBResponse, BookingError> {
        let result = self.cancel_inner(id).await;
        match &result {
            Ok(_) => {
                counter!(metrics::RESERVATIONS_CANCELLED).increment(1);
                info!("Reservation cancelled");
            }
            Err(e) => record_rejection(e),
        }
        result
    }

    async fn cancel_inner(&self, id: ReservationId) -> Result<ReservationDBResponse, BookingError> {
        let existing = self.store.get(id).await?.ok_or(BookingError::NotFound(id))?;
        let key = ResourceKey::new(&existing.instrument, &existing.start_time_utc);

        let guard = LockGuard::acquire(Arc::clone(&self.locks), key).await?;
        let result = self.remove_locked(id).await;
        guard.release().await;
        result
    }

    /// Re-read and delete. Must only run while holding the slot's lock.
    async fn remove_locked(&self, id: ReservationId) -> Result<ReservationDBResponse, BookingError> {
        // Another instance may have cancelled it between our first read and the acquire.
        let current = self.store.get(id).await?.ok_or(BookingError::NotFound(id))?;
        if !self.store.delete(id).await? {
            return Err(BookingError::NotFound(id));
        }

        self.emit(AuditEvent::cancelled(&self.service_name, &current)).await;
        Ok(current)
    }

    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id)))]
    pub async fn get(&self, id: ReservationId) -> Result<ReservationDBResponse, BookingError> {
        self.store.get(id).await?.ok_or(BookingError::NotFound(id))
    }

    #[instrument(skip(self), err)]
    pub async fn list(&self) -> Result<Vec<ReservationDBResponse>, BookingError> {
        Ok(self.store.list().await?)
    }

    async fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.emit(&event).await {
            warn!(error = %e, event_type = %event.event_type, "Failed to write audit event");
        }
    }
}

fn record_rejection(err: &BookingError) {
    counter!(metrics::RESERVATION_REJECTIONS, "reason" => err.code()).increment(1);
}
