use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Current server time. Clients sample this to estimate their clock offset (Cristian's
/// algorithm) before choosing a start time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeResponse {
    /// Server clock in UTC, RFC 3339
    pub time_utc: DateTime<Utc>,
}
