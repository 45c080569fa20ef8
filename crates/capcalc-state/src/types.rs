//! Records persisted by the state store.

use capcalc_core::{CalculationInput, CalculationResult, ScenarioKind};
use serde::{Deserialize, Serialize};

/// The last input saved for a scenario kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredScenario {
    pub input: CalculationInput,
    /// Unix timestamp (seconds) of the save.
    pub saved_at: u64,
}

impl StoredScenario {
    pub fn kind(&self) -> ScenarioKind {
        self.input.kind()
    }
}

/// The last result computed for a scenario kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredResult {
    pub kind: ScenarioKind,
    pub result: CalculationResult,
    /// Unix timestamp (seconds) of the calculation.
    pub calculated_at: u64,
}

/// A scenario written back by [`StateStore::import`](crate::StateStore::import).
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedScenario {
    pub input: CalculationInput,
    pub result: Option<CalculationResult>,
    /// Unix timestamp (seconds) stamped on `result`.
    pub calculated_at: u64,
}

/// Summary of what the store holds.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreInfo {
    pub has_data: bool,
    pub updated_at: Option<u64>,
    pub schema_version: String,
}
