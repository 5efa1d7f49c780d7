use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::handlers::repository::Repository;
use crate::db::models::reservations::{ReservationCreateDBRequest, ReservationDBResponse};
use crate::types::{abbrev_uuid, ReservationId};

pub struct Reservations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reservations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Point lookup on the booked slot.
    #[instrument(skip(self), err)]
    pub async fn get_by_slot(&mut self, instrument: &str, start_time_utc: &str) -> Result<Option<ReservationDBResponse>> {
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(
            r#"
            SELECT id, scientist_id, instrument, start_time_utc, created_at
            FROM reservations
            WHERE instrument = $1 AND start_time_utc = $2
            "#,
        )
        .bind(instrument)
        .bind(start_time_utc)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(reservation)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Reservations<'c> {
    type CreateRequest = ReservationCreateDBRequest;
    type Response = ReservationDBResponse;
    type Id = ReservationId;

    #[instrument(skip(self, request), fields(reservation_id = %abbrev_uuid(&request.id), instrument = %request.instrument), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(
            r#"
            INSERT INTO reservations (id, scientist_id, instrument, start_time_utc, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, scientist_id, instrument, start_time_utc, created_at
            "#,
        )
        .bind(request.id)
        .bind(&request.scientist_id)
        .bind(&request.instrument)
        .bind(&request.start_time_utc)
        .bind(request.created_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(reservation)
    }

    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(
            "SELECT id, scientist_id, instrument, start_time_utc, created_at FROM reservations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(reservation)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let reservations = sqlx::query_as::<_, ReservationDBResponse>(
            "SELECT id, scientist_id, instrument, start_time_utc, created_at FROM reservations ORDER BY created_at, id",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(reservations)
    }

    #[instrument(skip(self), fields(reservation_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use chrono::Utc;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn create_request(instrument: &str, start: &str) -> ReservationCreateDBRequest {
        ReservationCreateDBRequest {
            id: Uuid::new_v4(),
            scientist_id: "7".to_string(),
            instrument: instrument.to_string(),
            start_time_utc: start.to_string(),
            created_at: Utc::now(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_get_and_delete(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let created = repo.create(&create_request("Hubble-Acad", "2026-01-01T00:00:00Z")).await.unwrap();
        assert_eq!(repo.get_by_id(created.id).await.unwrap().as_ref(), Some(&created));
        assert_eq!(
            repo.get_by_slot("Hubble-Acad", "2026-01-01T00:00:00Z").await.unwrap().as_ref(),
            Some(&created)
        );

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_slot_hits_unique_constraint(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        repo.create(&create_request("Kepler-Acad", "2026-02-01T00:00:00Z")).await.unwrap();
        let err = repo
            .create(&create_request("Kepler-Acad", "2026-02-01T00:00:00Z"))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(err.is_slot_violation());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_is_ordered_by_creation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Reservations::new(&mut conn);

        let first = repo.create(&create_request("Hubble-Acad", "slot-1")).await.unwrap();
        let mut later = create_request("Hubble-Acad", "slot-2");
        later.created_at = first.created_at + chrono::Duration::seconds(1);
        let second = repo.create(&later).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }
}
