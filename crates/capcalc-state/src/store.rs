//! StateStore: redb-backed persistence for saved scenarios.
//!
//! Keeps one input and one result per scenario kind; saving again replaces
//! the previous record. The store supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use capcalc_core::{CalculationInput, CalculationResult, ScenarioKind};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Layout version of the stored records. A store written with a different
/// version is cleared on open.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        store.check_schema()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        store.check_schema()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SCENARIOS).map_err(map_err!(Table))?;
        txn.open_table(RESULTS).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Stamp a fresh store with the schema version; wipe a store written
    /// under another version.
    fn check_schema(&self) -> StateResult<()> {
        match self.meta(META_SCHEMA_VERSION)?.as_deref() {
            Some(SCHEMA_VERSION) => return Ok(()),
            Some(found) => {
                warn!(
                    found,
                    expected = SCHEMA_VERSION,
                    "state schema version mismatch, clearing stored scenarios"
                );
                self.clear()?;
            }
            None => {}
        }

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            meta.insert(META_SCHEMA_VERSION, SCHEMA_VERSION)
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn meta(&self, key: &str) -> StateResult<Option<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(META).map_err(map_err!(Table))?;
        let value = table
            .get(key)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    // ── Scenarios ──────────────────────────────────────────────────

    /// Save the last input for its scenario kind and make that kind active.
    pub fn put_scenario(&self, input: &CalculationInput) -> StateResult<()> {
        let kind = input.kind();
        let now = epoch_secs();
        let record = StoredScenario {
            input: input.clone(),
            saved_at: now,
        };
        let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SCENARIOS).map_err(map_err!(Table))?;
            table
                .insert(kind.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            meta.insert(META_ACTIVE_SCENARIO, kind.as_str())
                .map_err(map_err!(Write))?;
            meta.insert(META_UPDATED_AT, now.to_string().as_str())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(scenario = %kind, "scenario stored");
        Ok(())
    }

    /// Get the last input saved for `kind`.
    pub fn get_scenario(&self, kind: ScenarioKind) -> StateResult<Option<StoredScenario>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SCENARIOS).map_err(map_err!(Table))?;
        match table.get(kind.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: StoredScenario =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                if record.kind() != kind {
                    return Err(StateError::KindMismatch {
                        key: kind,
                        found: record.kind(),
                    });
                }
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List every saved scenario in tab order. Unreadable records are skipped.
    pub fn list_scenarios(&self) -> StateResult<Vec<StoredScenario>> {
        let mut results = Vec::new();
        for kind in ScenarioKind::ALL {
            match self.get_scenario(kind) {
                Ok(Some(record)) => results.push(record),
                Ok(None) => {}
                Err(e) => warn!(scenario = %kind, error = %e, "skipping unreadable scenario"),
            }
        }
        Ok(results)
    }

    /// Delete the saved input and result for `kind`. Returns true if either existed.
    pub fn delete_scenario(&self, kind: ScenarioKind) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut scenarios = txn.open_table(SCENARIOS).map_err(map_err!(Table))?;
            let had_input = scenarios
                .remove(kind.as_str())
                .map_err(map_err!(Write))?
                .is_some();
            let mut results = txn.open_table(RESULTS).map_err(map_err!(Table))?;
            let had_result = results
                .remove(kind.as_str())
                .map_err(map_err!(Write))?
                .is_some();
            existed = had_input || had_result;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(scenario = %kind, existed, "scenario deleted");
        Ok(existed)
    }

    // ── Results ────────────────────────────────────────────────────

    /// Save the last result for `kind`, stamped with the current time.
    pub fn put_result(&self, kind: ScenarioKind, result: &CalculationResult) -> StateResult<()> {
        self.put_result_at(kind, result, epoch_secs())
    }

    /// Save the last result for `kind` with an explicit calculation time.
    pub fn put_result_at(
        &self,
        kind: ScenarioKind,
        result: &CalculationResult,
        calculated_at: u64,
    ) -> StateResult<()> {
        let record = StoredResult {
            kind,
            result: *result,
            calculated_at,
        };
        let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RESULTS).map_err(map_err!(Table))?;
            table
                .insert(kind.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            meta.insert(META_UPDATED_AT, epoch_secs().to_string().as_str())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(scenario = %kind, total_cores = result.total_cores, "result stored");
        Ok(())
    }

    /// Get the last result saved for `kind`.
    pub fn get_result(&self, kind: ScenarioKind) -> StateResult<Option<StoredResult>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESULTS).map_err(map_err!(Table))?;
        match table.get(kind.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: StoredResult =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                if record.kind != kind {
                    return Err(StateError::KindMismatch {
                        key: kind,
                        found: record.kind,
                    });
                }
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    // ── Active scenario / store-wide ───────────────────────────────

    /// The scenario kind saved or selected most recently.
    pub fn active_scenario(&self) -> StateResult<Option<ScenarioKind>> {
        Ok(self
            .meta(META_ACTIVE_SCENARIO)?
            .and_then(|name| name.parse().ok()))
    }

    pub fn set_active_scenario(&self, kind: ScenarioKind) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            meta.insert(META_ACTIVE_SCENARIO, kind.as_str())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Remove every saved scenario and result. The schema version is kept.
    pub fn clear(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        drain(&txn, SCENARIOS)?;
        drain(&txn, RESULTS)?;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            meta.remove(META_ACTIVE_SCENARIO).map_err(map_err!(Write))?;
            meta.remove(META_UPDATED_AT).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!("state store cleared");
        Ok(())
    }

    /// Write a batch of imported scenarios in a single transaction.
    ///
    /// With `replace` every saved scenario and result is dropped first. The
    /// active kind ends up as `active`; `None` leaves no kind active.
    pub fn import(
        &self,
        entries: &[ImportedScenario],
        active: Option<ScenarioKind>,
        replace: bool,
    ) -> StateResult<()> {
        let now = epoch_secs();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        if replace {
            drain(&txn, SCENARIOS)?;
            drain(&txn, RESULTS)?;
        }
        {
            let mut scenarios = txn.open_table(SCENARIOS).map_err(map_err!(Table))?;
            let mut results = txn.open_table(RESULTS).map_err(map_err!(Table))?;
            for entry in entries {
                let kind = entry.input.kind();
                let record = StoredScenario {
                    input: entry.input.clone(),
                    saved_at: now,
                };
                let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
                scenarios
                    .insert(kind.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
                if let Some(result) = entry.result {
                    let record = StoredResult {
                        kind,
                        result,
                        calculated_at: entry.calculated_at,
                    };
                    let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
                    results
                        .insert(kind.as_str(), value.as_slice())
                        .map_err(map_err!(Write))?;
                }
            }

            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            match active {
                Some(kind) => {
                    meta.insert(META_ACTIVE_SCENARIO, kind.as_str())
                        .map_err(map_err!(Write))?;
                }
                None => {
                    meta.remove(META_ACTIVE_SCENARIO).map_err(map_err!(Write))?;
                }
            }
            meta.insert(META_UPDATED_AT, now.to_string().as_str())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(entries = entries.len(), replace, "scenarios imported");
        Ok(())
    }

    pub fn info(&self) -> StateResult<StoreInfo> {
        let has_data = {
            let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
            let scenarios = txn.open_table(SCENARIOS).map_err(map_err!(Table))?;
            let results = txn.open_table(RESULTS).map_err(map_err!(Table))?;
            scenarios.iter().map_err(map_err!(Read))?.next().is_some()
                || results.iter().map_err(map_err!(Read))?.next().is_some()
        };
        Ok(StoreInfo {
            has_data,
            updated_at: self.meta(META_UPDATED_AT)?.and_then(|v| v.parse().ok()),
            schema_version: self
                .meta(META_SCHEMA_VERSION)?
                .unwrap_or_else(|| SCHEMA_VERSION.to_string()),
        })
    }
}

/// Remove every row of a JSON-valued table inside an open write transaction.
fn drain(txn: &WriteTransaction, definition: TableDefinition<&str, &[u8]>) -> StateResult<()> {
    let mut table = txn.open_table(definition).map_err(map_err!(Table))?;
    let keys: Vec<String> = table
        .iter()
        .map_err(map_err!(Read))?
        .filter_map(|entry| {
            let (key, _) = entry.ok()?;
            Some(key.value().to_string())
        })
        .collect();
    for key in &keys {
        table.remove(key.as_str()).map_err(map_err!(Write))?;
    }
    Ok(())
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
