//! In-memory reservation store.
//!
//! Stores all reservations in a process-local map. It's suitable for testing and single-process
//! development deployments; reservations are lost on restart.
//!
//! Unlike the PostgreSQL schema there is no uniqueness constraint on the slot: the map is keyed
//! by reservation ID only, so keeping slots unique is entirely the booking workflow's job.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::db::errors::{DbError, Result};
use crate::db::models::reservations::{ReservationCreateDBRequest, ReservationDBResponse};
use crate::db::store::ReservationStore;
use crate::types::ReservationId;

#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    reservations: Arc<RwLock<HashMap<ReservationId, ReservationDBResponse>>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reservations.
    pub fn len(&self) -> usize {
        self.reservations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.read().is_empty()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn find_by_slot(&self, instrument: &str, start_time_utc: &str) -> Result<Option<ReservationDBResponse>> {
        let reservations = self.reservations.read();
        Ok(reservations
            .values()
            .find(|r| r.instrument == instrument && r.start_time_utc == start_time_utc)
            .cloned())
    }

    async fn get(&self, id: ReservationId) -> Result<Option<ReservationDBResponse>> {
        Ok(self.reservations.read().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<ReservationDBResponse>> {
        let mut all: Vec<_> = self.reservations.read().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn insert(&self, request: &ReservationCreateDBRequest) -> Result<ReservationDBResponse> {
        let mut reservations = self.reservations.write();

        if reservations.contains_key(&request.id) {
            return Err(DbError::UniqueViolation {
                constraint: Some("reservations_pkey".to_string()),
                table: Some("reservations".to_string()),
                message: format!("reservation {} already exists", request.id),
            });
        }

        let reservation = ReservationDBResponse::from(request.clone());
        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn delete(&self, id: ReservationId) -> Result<bool> {
        Ok(self.reservations.write().remove(&id).is_some())
    }
}
