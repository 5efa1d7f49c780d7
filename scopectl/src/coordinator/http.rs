//! HTTP client for the lock coordinator.
//!
//! Wire contract:
//!
//! ```text
//! POST {base}/lock/acquire  {"resource": "...", "ttl_ms": 5000}
//!   200 {"lockId": 17}   granted
//!   409                  denied (resource already locked)
//!
//! POST {base}/lock/release  {"resource": "..."}
//!   200 {"released": true}
//!   404 {"released": false}   nothing to release, treated as acknowledged
//! ```
//!
//! Any other acquire status (5xx included) is not read as a denial: the coordinator did not
//! answer the question, so it is reported as [`LockError::UnexpectedStatus`] and the booking
//! fails as coordinator-unavailable. Transport failures and timeouts are [`LockError`]s too.
//!
//! The coordinator releases by resource name, so the [`LockToken`] of a grant (its `lockId`)
//! is not sent on release.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{AcquireOutcome, LockClient, LockError, LockToken};
use crate::types::ResourceKey;

#[derive(Debug, Serialize)]
struct AcquireRequest<'a> {
    resource: &'a str,
    ttl_ms: u64,
}

#[derive(Debug, Serialize)]
struct ReleaseRequest<'a> {
    resource: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct AcquireResponse {
    #[serde(rename = "lockId")]
    lock_id: Option<serde_json::Value>,
}

impl AcquireResponse {
    fn token(&self) -> LockToken {
        match &self.lock_id {
            Some(serde_json::Value::String(id)) => LockToken::new(id.as_str()),
            Some(id) => LockToken::new(id.to_string()),
            None => LockToken::default(),
        }
    }
}

/// Production lock client using reqwest.
#[derive(Clone)]
pub struct HttpLockClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    lock_ttl: Duration,
}

impl HttpLockClient {
    /// Create a client for the coordinator at `base_url`.
    ///
    /// `timeout` bounds each acquire and release call end to end. `lock_ttl` is sent with every
    /// acquire and tells the coordinator when to expire a lock that is never released.
    pub fn new(base_url: &url::Url, timeout: Duration, lock_ttl: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            timeout,
            lock_ttl,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn classify(&self, err: reqwest::Error) -> LockError {
        if err.is_timeout() {
            LockError::Timeout(self.timeout)
        } else {
            LockError::Transport(err)
        }
    }
}

#[async_trait]
impl LockClient for HttpLockClient {
    #[instrument(skip(self), fields(resource = %key))]
    async fn acquire(&self, key: &ResourceKey) -> Result<AcquireOutcome, LockError> {
        let resource = key.resource_name();
        let body = AcquireRequest {
            resource: &resource,
            ttl_ms: u64::try_from(self.lock_ttl.as_millis()).unwrap_or(u64::MAX),
        };

        let response = self
            .client
            .post(self.endpoint("/lock/acquire"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        match response.status() {
            status if status.is_success() => {
                // A body we can't parse doesn't undo the grant; the token is then empty.
                let granted: AcquireResponse = response.json().await.unwrap_or_default();
                debug!(lock_id = ?granted.lock_id, "Lock granted");
                Ok(AcquireOutcome::Granted(granted.token()))
            }
            StatusCode::CONFLICT | StatusCode::LOCKED => {
                debug!("Lock denied, resource already held");
                Ok(AcquireOutcome::Denied)
            }
            status => {
                warn!(status = status.as_u16(), "Unexpected status from lock coordinator on acquire");
                Err(LockError::UnexpectedStatus { status: status.as_u16() })
            }
        }
    }

    #[instrument(skip(self), fields(resource = %key))]
    async fn release(&self, key: &ResourceKey, _token: &LockToken) -> Result<(), LockError> {
        let resource = key.resource_name();

        let response = self
            .client
            .post(self.endpoint("/lock/release"))
            .json(&ReleaseRequest { resource: &resource })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!("Coordinator had no lock to release (expired or never held)");
                Ok(())
            }
            status => Err(LockError::UnexpectedStatus { status: status.as_u16() }),
        }
    }
}
