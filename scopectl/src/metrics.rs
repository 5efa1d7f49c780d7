//! Prometheus metrics.
//!
//! Counters are recorded through the `metrics` facade wherever the event happens. Until
//! [`install_recorder`] runs they are no-ops, so code paths never need to know whether metrics
//! are enabled.

use anyhow::Context;
use ::metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;

/// Reservations committed.
pub const RESERVATIONS_CREATED: &str = "scopectl_reservations_created_total";

/// Reservations cancelled.
pub const RESERVATIONS_CANCELLED: &str = "scopectl_reservations_cancelled_total";

/// Create or cancel calls that failed, labelled with `reason` (the error code).
pub const RESERVATION_REJECTIONS: &str = "scopectl_reservation_rejections_total";

/// Lock releases that failed and were left to the coordinator TTL.
pub const LOCK_RELEASE_FAILURES: &str = "scopectl_lock_release_failures_total";

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the global Prometheus recorder, or return the handle of the one already installed.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let mut slot = HANDLE.lock();
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install prometheus recorder")?;

    describe_counter!(RESERVATIONS_CREATED, "Reservations committed");
    describe_counter!(RESERVATIONS_CANCELLED, "Reservations cancelled");
    describe_counter!(RESERVATION_REJECTIONS, "Reservation operations rejected, by reason");
    describe_counter!(LOCK_RELEASE_FAILURES, "Lock releases lost and left to expire by TTL");

    tracing::info!("Prometheus metrics recorder initialized");
    *slot = Some(handle.clone());
    Ok(handle)
}
