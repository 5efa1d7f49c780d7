//! Test doubles and fixtures shared by unit and end-to-end tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use parking_lot::Mutex;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::audit::{AuditError, AuditEvent, AuditSink};
use crate::config::{Config, CoordinatorConfig, DatabaseConfig};
use crate::coordinator::{AcquireOutcome, EmbeddedLockClient, LockClient, LockError, LockToken};
use crate::types::ResourceKey;

/// One call made against a [`SpyLockClient`], by resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockCall {
    Acquire(String),
    Release(String),
}

/// Records every call, then forwards it to the wrapped client.
pub struct SpyLockClient {
    inner: Arc<dyn LockClient>,
    calls: Mutex<Vec<LockCall>>,
}

impl SpyLockClient {
    pub fn new(inner: Arc<dyn LockClient>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<LockCall> {
        self.calls.lock().clone()
    }

    pub fn acquires(&self) -> usize {
        self.calls.lock().iter().filter(|c| matches!(c, LockCall::Acquire(_))).count()
    }

    pub fn releases(&self) -> usize {
        self.calls.lock().iter().filter(|c| matches!(c, LockCall::Release(_))).count()
    }
}

#[async_trait]
impl LockClient for SpyLockClient {
    async fn acquire(&self, key: &ResourceKey) -> Result<AcquireOutcome, LockError> {
        self.calls.lock().push(LockCall::Acquire(key.resource_name()));
        self.inner.acquire(key).await
    }

    async fn release(&self, key: &ResourceKey, token: &LockToken) -> Result<(), LockError> {
        self.calls.lock().push(LockCall::Release(key.resource_name()));
        self.inner.release(key, token).await
    }
}

/// A coordinator that never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableLockClient;

#[async_trait]
impl LockClient for UnreachableLockClient {
    async fn acquire(&self, _key: &ResourceKey) -> Result<AcquireOutcome, LockError> {
        Err(LockError::Timeout(Duration::from_millis(1)))
    }

    async fn release(&self, _key: &ResourceKey, _token: &LockToken) -> Result<(), LockError> {
        Err(LockError::Timeout(Duration::from_millis(1)))
    }
}

/// Grants locks normally but every release fails, leaving the lock to expire by TTL.
pub struct FailingReleaseLockClient {
    inner: EmbeddedLockClient,
}

impl FailingReleaseLockClient {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: EmbeddedLockClient::new(ttl),
        }
    }

    pub fn is_held(&self, key: &ResourceKey) -> bool {
        self.inner.is_held(key)
    }
}

#[async_trait]
impl LockClient for FailingReleaseLockClient {
    async fn acquire(&self, key: &ResourceKey) -> Result<AcquireOutcome, LockError> {
        self.inner.acquire(key).await
    }

    async fn release(&self, _key: &ResourceKey, _token: &LockToken) -> Result<(), LockError> {
        Err(LockError::UnexpectedStatus { status: 503 })
    }
}

/// Keeps every emitted event in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn emit(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Fails every emit.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn emit(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::Io(std::io::Error::other("disk full")))
    }
}

/// Configuration for an in-process app: in-memory store, embedded coordinator, no file audit.
pub fn create_test_config() -> Config {
    Config {
        database: DatabaseConfig::Memory,
        coordinator: CoordinatorConfig::Embedded {
            lock_ttl: Duration::from_secs(5),
        },
        enable_metrics: false,
        ..Default::default()
    }
}

/// Same as [`create_test_config`] but pointing at an HTTP coordinator, typically a wiremock server.
pub fn create_test_config_with_coordinator(url: &str) -> Config {
    Config {
        coordinator: CoordinatorConfig::Http {
            url: url::Url::parse(url).expect("valid coordinator url"),
            timeout: Duration::from_millis(500),
            lock_ttl: Duration::from_secs(5),
        },
        ..create_test_config()
    }
}

pub async fn create_test_app(config: Config) -> TestServer {
    crate::Application::new(config)
        .await
        .expect("Failed to create application")
        .into_test_server()
}

/// Records the level and target of every tracing event emitted while installed.
#[derive(Clone, Default)]
pub struct EventLevelRecorder {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl EventLevelRecorder {
    /// Install as the default subscriber for the current thread until the guard drops.
    pub fn set_default(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    /// Targets of the events recorded at `level`.
    pub fn at_level(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, target)| target.clone())
            .collect()
    }

    pub fn saw(&self, level: Level, target: &str) -> bool {
        self.at_level(level).iter().any(|t| t == target)
    }
}

impl<S: Subscriber> Layer<S> for EventLevelRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        self.events.lock().push((*meta.level(), meta.target().to_string()));
    }
}
