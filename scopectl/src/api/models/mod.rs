//! API request and response data models.
//!
//! API models are kept apart from the storage models in [`crate::db::models`] so the wire
//! format can evolve independently of the schema. All of them derive `utoipa::ToSchema`.
//!
//! - [`reservations`]: booking requests, reservation responses and hypermedia links
//! - [`instruments`]: instrument registry listing
//! - [`time`]: server clock reading

pub mod instruments;
pub mod reservations;
pub mod time;
