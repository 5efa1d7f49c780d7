//! Scoped lock ownership.
//!
//! A [`LockGuard`] exists only while the coordinator has granted the lock on its key. It is
//! released exactly once:
//!
//! - [`LockGuard::release`] on every normal exit path of the booking workflow
//! - `Drop`, if the guard goes away without `release` (the request future was cancelled, or a
//!   panic unwound through it), hands the release to the tokio runtime
//!
//! Release is best-effort. Correctness only depends on acquire being exclusive; a lost release
//! delays the next booking of that slot until the coordinator TTL expires.

use std::sync::Arc;

use ::metrics::counter;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::{AcquireOutcome, LockClient, LockError, LockToken};
use crate::metrics::LOCK_RELEASE_FAILURES;
use crate::types::ResourceKey;

/// Why a guard could not be obtained.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("resource {0} is locked by another request")]
    Denied(ResourceKey),

    #[error("lock coordinator unavailable while acquiring {key}")]
    Unreachable {
        key: ResourceKey,
        #[source]
        source: LockError,
    },
}

pub struct LockGuard {
    client: Arc<dyn LockClient>,
    key: ResourceKey,
    token: LockToken,
    released: bool,
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}

impl LockGuard {
    /// Ask the coordinator for `key`. Returns a guard only if the lock was granted.
    #[instrument(skip(client), fields(resource = %key))]
    pub async fn acquire(client: Arc<dyn LockClient>, key: ResourceKey) -> Result<Self, AcquireError> {
        match client.acquire(&key).await {
            Ok(AcquireOutcome::Granted(token)) => {
                debug!(token = token.as_str(), "Acquired slot lock");
                Ok(Self {
                    client,
                    key,
                    token,
                    released: false,
                })
            }
            Ok(AcquireOutcome::Denied) => Err(AcquireError::Denied(key)),
            Err(source) => Err(AcquireError::Unreachable { key, source }),
        }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Release the lock now and wait for the coordinator's answer.
    pub async fn release(mut self) {
        self.released = true;
        release_best_effort(self.client.as_ref(), &self.key, &self.token).await;
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let client = Arc::clone(&self.client);
        let key = self.key.clone();
        let token = self.token.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(resource = %key, "Lock guard dropped without release, releasing in background");
                handle.spawn(async move {
                    release_best_effort(client.as_ref(), &key, &token).await;
                });
            }
            Err(_) => {
                warn!(resource = %key, "Lock guard dropped outside a runtime, lock will expire by TTL");
                counter!(LOCK_RELEASE_FAILURES).increment(1);
            }
        }
    }
}

/// The one place a release error is discarded. The coordinator TTL frees a lock whose release
/// was lost, so the caller's outcome never depends on this call.
async fn release_best_effort(client: &dyn LockClient, key: &ResourceKey, token: &LockToken) {
    if let Err(e) = client.release(key, token).await {
        warn!(resource = %key, error = %e, "Failed to release slot lock, it will expire by TTL");
        counter!(LOCK_RELEASE_FAILURES).increment(1);
    }
}
