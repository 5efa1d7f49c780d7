//! Reservation storage.
//!
//! The booking workflow talks to storage through the [`ReservationStore`] trait. Two
//! implementations are provided:
//!
//! - [`PostgresReservationStore`]: SQLx over PostgreSQL, using the repository pattern
//! - [`InMemoryReservationStore`]: process-local map for development and tests
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Booking workflow │
//! └────────┬─────────┘
//!          │  ReservationStore
//!          ↓
//! ┌──────────────────┐      ┌──────────────────┐
//! │ Postgres store   │      │ In-memory store  │
//! └────────┬─────────┘      └──────────────────┘
//!          │
//!          ↓
//! ┌──────────────────┐
//! │ Repositories     │  (db::handlers)
//! └────────┬─────────┘
//!          ↓
//! ┌──────────────────┐
//! │   PostgreSQL     │
//! └──────────────────┘
//! ```
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/` directory.
//! The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! scopectl::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;
pub mod store;

pub use in_memory::InMemoryReservationStore;
pub use store::{PostgresReservationStore, ReservationStore};
