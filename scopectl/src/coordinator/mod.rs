//! Client side of the distributed lock coordinator.
//!
//! The coordinator is an external service that grants exclusive, TTL-bounded locks by resource
//! name. This module only consumes its two-operation contract:
//!
//! - `acquire(resource)` -> granted, denied, or unreachable
//! - `release(resource)` -> acknowledged or unreachable
//!
//! # Implementations
//!
//! - [`HttpLockClient`]: talks to a coordinator over HTTP (`POST /lock/acquire`,
//!   `POST /lock/release`) with a bounded per-call timeout
//! - [`EmbeddedLockClient`]: an in-process lock table for single-process development and tests
//!
//! # Scoped acquisition
//!
//! Callers should not use [`LockClient::acquire`] directly. [`LockGuard::acquire`] returns a
//! guard on success, and the guard releases the lock exactly once, either through
//! [`LockGuard::release`] or, if the owning future is dropped first, from its `Drop` impl.
//!
//! Neither the clients nor the guard retry. Retry policy belongs to whoever called the
//! booking workflow.

pub mod embedded;
pub mod guard;
pub mod http;

use crate::types::ResourceKey;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use embedded::EmbeddedLockClient;
pub use guard::{AcquireError, LockGuard};
pub use http::HttpLockClient;

/// Identifies one grant of a lock.
///
/// Releases carry the token of the grant they end, so a holder whose lock already expired
/// cannot free the lock of whoever acquired the resource next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Answer from a coordinator that was reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The lock is now held by this caller until released or until the TTL expires.
    Granted(LockToken),
    /// Someone else holds an unexpired lock on the resource.
    Denied,
}

/// The coordinator could not be used. Every variant means "unreachable" to the workflow.
#[derive(Debug, Error)]
pub enum LockError {
    /// No answer within the configured timeout
    #[error("lock coordinator did not answer within {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, broken body and similar transport failures
    #[error("lock coordinator unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The coordinator answered, but not with anything the contract defines
    #[error("lock coordinator answered with unexpected status {status}")]
    UnexpectedStatus { status: u16 },
}

/// Consumer side of the lock coordinator contract.
#[async_trait]
pub trait LockClient: Send + Sync {
    /// Try to take the lock on `key`. Never waits for a held lock to free up.
    async fn acquire(&self, key: &ResourceKey) -> Result<AcquireOutcome, LockError>;

    /// Release the grant identified by `token` on `key`. Releasing a lock that is not held, or
    /// that is now held under another grant, is not an error and leaves it untouched.
    async fn release(&self, key: &ResourceKey, token: &LockToken) -> Result<(), LockError>;
}
