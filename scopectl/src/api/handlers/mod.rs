//! HTTP request handlers.
//!
//! Handlers only translate between HTTP and the [`crate::booking::BookingService`]; every
//! reservation rule lives in the workflow. Errors are returned as [`crate::errors::Error`],
//! which renders the status code and a JSON `{"error", "message"}` body.
//!
//! - [`reservations`]: create, list, fetch and cancel
//! - [`instruments`]: instrument registry
//! - [`time`]: server clock
//! - [`static_assets`]: the embedded clock-sync page
//! - [`health`]: liveness probe

pub mod health;
pub mod instruments;
pub mod reservations;
pub mod static_assets;
pub mod time;
