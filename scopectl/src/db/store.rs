//! The reservation store seam used by the booking workflow.
//!
//! The workflow only needs point lookups, insert and delete. It never holds a transaction open
//! across a coordinator call, so every method is a self-contained unit of work that is durable
//! once it returns.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::{Repository, Reservations};
use crate::db::models::reservations::{ReservationCreateDBRequest, ReservationDBResponse};
use crate::types::ReservationId;

/// Durable keyed storage for committed reservations.
///
/// Implementations must offer read-after-write consistency for a process's own writes: once
/// `insert` has returned, a later `find_by_slot` for the same slot observes the record.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Look up the reservation holding `(instrument, start_time_utc)`, if any.
    async fn find_by_slot(&self, instrument: &str, start_time_utc: &str) -> Result<Option<ReservationDBResponse>>;

    /// Look up a reservation by identifier.
    async fn get(&self, id: ReservationId) -> Result<Option<ReservationDBResponse>>;

    /// All committed reservations, oldest first.
    async fn list(&self) -> Result<Vec<ReservationDBResponse>>;

    /// Commit a new reservation.
    async fn insert(&self, request: &ReservationCreateDBRequest) -> Result<ReservationDBResponse>;

    /// Delete a reservation. Returns `false` if it did not exist.
    async fn delete(&self, id: ReservationId) -> Result<bool>;
}

/// PostgreSQL-backed store. Each call checks a connection out of the pool and runs one statement
/// through the [`Reservations`] repository.
#[derive(Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn find_by_slot(&self, instrument: &str, start_time_utc: &str) -> Result<Option<ReservationDBResponse>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Reservations::new(&mut conn).get_by_slot(instrument, start_time_utc).await
    }

    async fn get(&self, id: ReservationId) -> Result<Option<ReservationDBResponse>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Reservations::new(&mut conn).get_by_id(id).await
    }

    async fn list(&self) -> Result<Vec<ReservationDBResponse>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Reservations::new(&mut conn).list().await
    }

    async fn insert(&self, request: &ReservationCreateDBRequest) -> Result<ReservationDBResponse> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Reservations::new(&mut conn).create(request).await
    }

    async fn delete(&self, id: ReservationId) -> Result<bool> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Reservations::new(&mut conn).delete(id).await
    }
}
