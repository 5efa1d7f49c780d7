//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Time** (`/api/v1/time`): server UTC clock, for client-side offset estimation
//! - **Instruments** (`/api/v1/instruments`): the configured instrument registry
//! - **Reservations** (`/api/v1/reservations/*`): create, list, fetch and cancel bookings
//! - **Interface** (`/interface`): embedded clock-sync page
//!
//! All endpoints are documented with `utoipa`; the document is served at
//! `/api/v1/openapi.json` and rendered at `/docs`.

pub mod handlers;
pub mod models;
