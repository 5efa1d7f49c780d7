use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Instruments that can be booked.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InstrumentsResponse {
    #[schema(example = json!(["Hubble-Acad", "Kepler-Acad"]))]
    pub instruments: Vec<String>,
}
