//! capcalc-state: saved scenarios and calculation snapshots.
//!
//! Backed by [redb](https://docs.rs/redb), the store keeps the last input and
//! the last result for each scenario kind, plus which kind was used last.
//! Values are JSON-serialized into redb's `&[u8]` columns and keyed by the
//! scenario kind's wire name (`shadow_ab`, ...).
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).
//!
//! [`snapshot`] exports everything in the store as one portable JSON
//! document and merges such documents back in.

pub mod error;
pub mod snapshot;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{SnapshotError, StateError, StateResult};
pub use snapshot::{MergeOutcome, MergeStrategy, ScenarioRecord, Snapshot};
pub use store::{StateStore, SCHEMA_VERSION};
pub use types::*;
