//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides strongly-typed operations
//! for one table, and returns records from [`crate::db::models`].
//!
//! - [`Reservations`]: committed telescope reservations

pub mod repository;
pub mod reservations;

pub use repository::Repository;
pub use reservations::Reservations;
