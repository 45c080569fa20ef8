//! Portable JSON snapshots of the state store.
//!
//! A snapshot holds every saved scenario (input plus optional last result)
//! keyed by scenario kind, the active kind, and a small metadata block.
//! Importing merges a snapshot back into a store either by replacing
//! everything or by adding only the kinds the store does not have yet.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use capcalc_core::{CalculationInput, CalculationResult, ScenarioKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{SnapshotError, StateResult};
use crate::store::StateStore;
use crate::types::ImportedScenario;

pub const APP_NAME: &str = "capcalc";
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// One scenario kind's saved input and, if calculated, its last result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRecord {
    pub input: CalculationInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CalculationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_calculated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub total_scenarios: usize,
    pub scenarios_with_results: usize,
    pub export_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub app_name: String,
    pub scenarios: BTreeMap<ScenarioKind, ScenarioRecord>,
    #[serde(default)]
    pub active_scenario: Option<ScenarioKind>,
    pub metadata: SnapshotMetadata,
}

/// How an imported snapshot combines with what the store already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Discard the store's scenarios and take the imported ones.
    #[default]
    Replace,
    /// Keep the store's scenarios; add imported kinds the store lacks.
    Merge,
}

/// The records and active kind produced by combining two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub scenarios: BTreeMap<ScenarioKind, ScenarioRecord>,
    pub active_scenario: Option<ScenarioKind>,
}

impl Snapshot {
    pub fn new(
        scenarios: BTreeMap<ScenarioKind, ScenarioRecord>,
        active_scenario: Option<ScenarioKind>,
        now: DateTime<Utc>,
    ) -> Self {
        let metadata = SnapshotMetadata {
            total_scenarios: scenarios.len(),
            scenarios_with_results: scenarios.values().filter(|r| r.result.is_some()).count(),
            export_source: APP_NAME.to_string(),
        };
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: now,
            app_name: APP_NAME.to_string(),
            scenarios,
            active_scenario,
            metadata,
        }
    }

    /// Capture everything the store holds. Results without a saved input
    /// cannot be restored and are left out.
    pub fn from_store(store: &StateStore) -> StateResult<Self> {
        let mut scenarios = BTreeMap::new();
        for stored in store.list_scenarios()? {
            let kind = stored.kind();
            let (result, last_calculated) = match store.get_result(kind) {
                Ok(Some(r)) => (Some(r.result), from_epoch(r.calculated_at)),
                Ok(None) => (None, None),
                Err(e) => {
                    warn!(scenario = %kind, error = %e, "skipping unreadable result");
                    (None, None)
                }
            };
            scenarios.insert(
                kind,
                ScenarioRecord {
                    input: stored.input,
                    result,
                    last_calculated,
                },
            );
        }
        let snapshot = Self::new(scenarios, store.active_scenario()?, Utc::now());
        debug!(
            scenarios = snapshot.metadata.total_scenarios,
            with_results = snapshot.metadata.scenarios_with_results,
            "snapshot captured"
        );
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a snapshot document.
    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(s)?;
        if snapshot.app_name != APP_NAME {
            return Err(SnapshotError::Invalid(format!(
                "written by '{}', expected '{APP_NAME}'",
                snapshot.app_name
            )));
        }
        if snapshot.version.trim().is_empty() {
            return Err(SnapshotError::Invalid("missing version".to_string()));
        }
        for (kind, record) in &snapshot.scenarios {
            if record.input.kind() != *kind {
                return Err(SnapshotError::Invalid(format!(
                    "record under {kind} holds a {} scenario",
                    record.input.kind()
                )));
            }
        }
        Ok(snapshot)
    }

    /// Human-readable listing: `✓` marks kinds with a result, `○` kinds
    /// saved without one.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Snapshot v{} exported {}",
            self.version,
            self.exported_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(
            out,
            "Scenarios: {} ({} with results)",
            self.scenarios.len(),
            self.scenarios.values().filter(|r| r.result.is_some()).count()
        );
        for (kind, record) in &self.scenarios {
            let marker = if record.result.is_some() { "✓" } else { "○" };
            match record.result {
                Some(result) => {
                    let _ = writeln!(
                        out,
                        "  {marker} {:<22} {:.4} cores",
                        kind.label(),
                        result.total_cores
                    );
                }
                None => {
                    let _ = writeln!(out, "  {marker} {}", kind.label());
                }
            }
        }
        if let Some(active) = self.active_scenario {
            let _ = writeln!(out, "Active: {}", active.label());
        }
        out
    }

    /// Combine an imported snapshot with the current one.
    pub fn merge(imported: &Snapshot, current: &Snapshot, strategy: MergeStrategy) -> MergeOutcome {
        match strategy {
            MergeStrategy::Replace => MergeOutcome {
                scenarios: imported.scenarios.clone(),
                active_scenario: imported.active_scenario,
            },
            MergeStrategy::Merge => {
                let mut scenarios = current.scenarios.clone();
                for (kind, record) in &imported.scenarios {
                    scenarios.entry(*kind).or_insert_with(|| record.clone());
                }
                MergeOutcome {
                    scenarios,
                    active_scenario: current.active_scenario.or(imported.active_scenario),
                }
            }
        }
    }

    /// Merge this snapshot into `store` and write the outcome back.
    pub fn apply_to_store(
        &self,
        store: &StateStore,
        strategy: MergeStrategy,
    ) -> StateResult<MergeOutcome> {
        let current = Snapshot::from_store(store)?;
        let outcome = Snapshot::merge(self, &current, strategy);

        let entries: Vec<ImportedScenario> = outcome
            .scenarios
            .iter()
            .filter(|(kind, _)| {
                strategy == MergeStrategy::Replace || !current.scenarios.contains_key(*kind)
            })
            .map(|(_, record)| ImportedScenario {
                input: record.input.clone(),
                result: record.result,
                calculated_at: record
                    .last_calculated
                    .unwrap_or(self.exported_at)
                    .timestamp()
                    .max(0) as u64,
            })
            .collect();
        store.import(
            &entries,
            outcome.active_scenario,
            strategy == MergeStrategy::Replace,
        )?;

        info!(
            ?strategy,
            scenarios = outcome.scenarios.len(),
            "snapshot imported"
        );
        Ok(outcome)
    }
}

/// File name offered for an export made at `now`.
pub fn default_file_name(now: DateTime<Utc>) -> String {
    format!("{APP_NAME}-data-{}.json", now.format("%Y-%m-%d"))
}

fn from_epoch(secs: u64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(i64::try_from(secs).ok()?, 0)
}
