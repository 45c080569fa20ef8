//! capcalc-engine: scenario-to-load-to-cores calculation.
//!
//! Turns a [`CalculationInput`](capcalc_core::CalculationInput) into a
//! [`CalculationResult`](capcalc_core::CalculationResult). Pure and
//! stateless; safe to call from any number of threads.
//!
//! # Pipeline
//!
//! ```text
//! qps         = scenario formula (or directQps override)
//! rps.xap     = qps
//! rps.lss     = rps.xap * fanout.xap_lss
//! rps.cso     = rps.lss * fanout.lss_cso
//! rps.store   = rps.cso * fanout.cso_store
//! cores.tier  = rps.tier * cpuPerRps.tier
//! totalCores  = Σ cores.tier
//! ```
//!
//! [`cost`] converts a core count into VM counts and spend.

pub mod calculator;
pub mod cost;
pub mod scenario;

pub use calculator::calculate;
pub use cost::{estimate_all, estimate_cost, CostEstimate, HOURS_PER_MONTH};
pub use scenario::effective_qps;
