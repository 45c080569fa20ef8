//! redb table definitions for the capcalc state store.
//!
//! Scenario and result tables use the scenario kind's wire name as key and
//! JSON-serialized records as value.

use redb::TableDefinition;

/// Last input per scenario kind, keyed by `ScenarioKind::as_str()`.
pub const SCENARIOS: TableDefinition<&str, &[u8]> = TableDefinition::new("scenarios");

/// Last result per scenario kind, keyed by `ScenarioKind::as_str()`.
pub const RESULTS: TableDefinition<&str, &[u8]> = TableDefinition::new("results");

/// Store-wide values: schema version, active scenario, last update time.
pub const META: TableDefinition<&str, &str> = TableDefinition::new("meta");

pub const META_SCHEMA_VERSION: &str = "schema_version";
pub const META_ACTIVE_SCENARIO: &str = "active_scenario";
pub const META_UPDATED_AT: &str = "updated_at";
