//! # scopectl: Telescope Reservation Service
//!
//! `scopectl` books time slots on shared instruments for many independent clients and
//! guarantees that no two bookings for the same instrument and start time both succeed, even
//! when requests race across several service instances.
//!
//! ## Overview
//!
//! A reservation names a scientist, an instrument and a start time. The start time is an opaque
//! string: two requests conflict exactly when their instrument and start strings are equal.
//! Clients are expected to agree on a clock before choosing start times; the service exposes its
//! own UTC clock at `/api/v1/time` and an embedded page at `/interface` that estimates the
//! browser's offset from it.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum). Every mutating request goes
//! through the [`booking`] workflow, which serializes work per slot with a lock taken from an
//! external coordinator before it looks at the store:
//!
//! ```text
//! client -> api::handlers -> BookingService -> LockGuard::acquire(instrument_start)
//!                                   |                  |
//!                                   |          coordinator::LockClient (HTTP or embedded)
//!                                   v
//!                         db::ReservationStore (Postgres or in-memory)
//!                                   |
//!                               audit::AuditSink
//! ```
//!
//! ### Core Components
//!
//! The **booking workflow** ([`booking`]) implements create and cancel: acquire the slot lock,
//! re-check durable state, commit, audit, release. Lock denial, coordinator outages and
//! post-lock conflicts each map to their own error.
//!
//! The **coordinator client** ([`coordinator`]) consumes the coordinator's acquire/release
//! contract. [`coordinator::LockGuard`] makes sure every granted lock is released once.
//!
//! The **database layer** ([`db`]) stores reservations behind the
//! [`db::ReservationStore`] trait, with a PostgreSQL implementation using the repository pattern
//! and an in-memory one for development and tests.
//!
//! The **audit trail** ([`audit`]) records one structured event per committed create or cancel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use scopectl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = scopectl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     scopectl::telemetry::init_telemetry(config.enable_otel_export, &config.service_name)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! With `database.type: external` the application runs migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! scopectl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod audit;
pub mod booking;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod errors;
pub mod metrics;
mod openapi;
mod static_assets;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Json, Router, routing::get};
use bon::Builder;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api::handlers::{health, instruments, reservations, static_assets as static_handlers, time};
use crate::audit::{AuditSink, JsonLinesAuditSink, TracingAuditSink};
use crate::booking::BookingService;
use crate::config::{CoordinatorConfig, DatabaseConfig, PoolSettings};
use crate::coordinator::{EmbeddedLockClient, HttpLockClient, LockClient};
use crate::db::{InMemoryReservationStore, PostgresReservationStore, ReservationStore};
pub use config::Config;
use openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `config`: Application configuration loaded from environment/files
/// - `booking`: The reservation workflow, with its store, lock client and audit sink
/// - `metrics_handle`: Prometheus handle for `/internal/metrics` (when enabled)
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .booking(booking)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub booking: BookingService,
    pub metrics_handle: Option<PrometheusHandle>,
}

/// Get the scopectl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

async fn connect_pool(url: &str, pool: &PoolSettings) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
        .idle_timeout(non_zero_secs(pool.idle_timeout_secs))
        .max_lifetime(non_zero_secs(pool.max_lifetime_secs))
        .connect(url)
        .await
        .context("failed to connect to database")?;

    migrator().run(&pool).await.context("failed to run migrations")?;
    Ok(pool)
}

/// Build the reservation store. Returns the pool too, when there is one, so it can be closed on
/// shutdown.
#[instrument(skip_all)]
async fn build_store(config: &DatabaseConfig) -> anyhow::Result<(Arc<dyn ReservationStore>, Option<PgPool>)> {
    match config {
        DatabaseConfig::Memory => {
            info!("Using in-memory reservation store; reservations will not survive a restart");
            Ok((Arc::new(InMemoryReservationStore::new()), None))
        }
        DatabaseConfig::External { url, pool } => {
            let pool = connect_pool(url, pool).await?;
            Ok((Arc::new(PostgresReservationStore::new(pool.clone())), Some(pool)))
        }
    }
}

fn build_lock_client(config: &CoordinatorConfig) -> anyhow::Result<Arc<dyn LockClient>> {
    match config {
        CoordinatorConfig::Http { url, timeout, lock_ttl } => {
            info!(%url, ?timeout, ?lock_ttl, "Using HTTP lock coordinator");
            let client = HttpLockClient::new(url, *timeout, *lock_ttl).context("failed to build coordinator client")?;
            Ok(Arc::new(client))
        }
        CoordinatorConfig::Embedded { lock_ttl } => {
            info!(?lock_ttl, "Using embedded lock table; locks only cover this process");
            Ok(Arc::new(EmbeddedLockClient::new(*lock_ttl)))
        }
    }
}

async fn build_audit_sink(config: &Config) -> anyhow::Result<Arc<dyn AuditSink>> {
    match &config.audit.path {
        Some(path) => {
            let sink = JsonLinesAuditSink::open(path)
                .await
                .with_context(|| format!("failed to open audit log {}", path.display()))?;
            info!(path = %path.display(), "Writing audit events to file");
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(TracingAuditSink)),
    }
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/api/v1/time", get(time::get_time))
        .route("/api/v1/instruments", get(instruments::list_instruments))
        .route(
            "/api/v1/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route(
            "/api/v1/reservations/{id}",
            get(reservations::get_reservation).delete(reservations::cancel_reservation),
        )
        .route("/interface", get(static_handlers::interface))
        .route("/healthz", get(health::healthz))
        .route("/api/v1/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if let Some(handle) = state.metrics_handle.clone() {
        router = router.route("/internal/metrics", get(move || async move { handle.render() }));
    }

    router.with_state(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Wire the store, coordinator client, audit sink and router from configuration.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (store, pool) = build_store(&config.database).await?;
        let locks = build_lock_client(&config.coordinator)?;
        let audit = build_audit_sink(&config).await?;

        let metrics_handle = if config.enable_metrics {
            Some(metrics::install_recorder()?)
        } else {
            None
        };

        let booking = BookingService::new(store, locks, audit, config.service_name.clone());
        let state = AppState::builder()
            .config(config.clone())
            .booking(booking)
            .maybe_metrics_handle(metrics_handle)
            .build();

        Ok(Self {
            router: build_router(state),
            config,
            pool,
        })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Reservation service listening on http://{}, clock page at http://localhost:{}/interface",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
