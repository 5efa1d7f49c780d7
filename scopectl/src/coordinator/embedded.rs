//! In-process lock table.
//!
//! Stands in for the coordinator when the service runs as a single process (local development,
//! demos, tests). Locks expire after the configured TTL exactly like the coordinator's do, so a
//! guard that never releases still frees its slot eventually.
//!
//! This only serializes requests inside one process. Multi-instance deployments must point at a
//! real coordinator through [`super::HttpLockClient`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use super::{AcquireOutcome, LockClient, LockError, LockToken};
use crate::types::ResourceKey;

#[derive(Debug)]
struct Grant {
    token: LockToken,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct LockTable {
    /// resource name -> current grant
    grants: HashMap<String, Grant>,
    next_generation: u64,
}

#[derive(Clone)]
pub struct EmbeddedLockClient {
    table: Arc<Mutex<LockTable>>,
    ttl: Duration,
}

impl EmbeddedLockClient {
    pub fn new(ttl: Duration) -> Self {
        Self {
            table: Arc::new(Mutex::new(LockTable::default())),
            ttl,
        }
    }

    /// Whether an unexpired lock is currently held on `key`.
    pub fn is_held(&self, key: &ResourceKey) -> bool {
        let now = Instant::now();
        self.table
            .lock()
            .grants
            .get(&key.resource_name())
            .is_some_and(|grant| grant.expires_at > now)
    }
}

#[async_trait]
impl LockClient for EmbeddedLockClient {
    async fn acquire(&self, key: &ResourceKey) -> Result<AcquireOutcome, LockError> {
        let name = key.resource_name();
        let now = Instant::now();
        let mut table = self.table.lock();

        // Drop expired entries so the table doesn't grow with every slot ever booked.
        table.grants.retain(|_, grant| grant.expires_at > now);

        if table.grants.contains_key(&name) {
            trace!(resource = %name, "Embedded lock denied");
            return Ok(AcquireOutcome::Denied);
        }

        table.next_generation += 1;
        let token = LockToken::new(table.next_generation.to_string());
        table.grants.insert(
            name,
            Grant {
                token: token.clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(AcquireOutcome::Granted(token))
    }

    async fn release(&self, key: &ResourceKey, token: &LockToken) -> Result<(), LockError> {
        let name = key.resource_name();
        let mut table = self.table.lock();
        match table.grants.get(&name) {
            Some(grant) if grant.token == *token => {
                table.grants.remove(&name);
            }
            Some(_) => trace!(resource = %name, "Lock now held under a newer grant, leaving it"),
            None => {}
        }
        Ok(())
    }
}
