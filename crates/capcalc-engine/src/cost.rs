//! VM count and spend for a given core requirement.
//!
//! ```text
//! provisioned = total_cores / target_utilization
//! vm_count    = ceil(provisioned / cores_per_vm)
//! hourly      = vm_count * cost_per_hour
//! monthly     = hourly * 730
//! ```

use std::collections::BTreeMap;

use capcalc_core::{CalcError, Constraint, VmCost};
use serde::{Deserialize, Serialize};

/// Average hours in a month (8760 / 12).
pub const HOURS_PER_MONTH: f64 = 730.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub vm_type: String,
    pub required_cores: f64,
    pub target_utilization: f64,
    /// Cores to provision so that `required_cores` runs at the target utilization.
    pub provisioned_cores: f64,
    pub vm_count: u64,
    pub hourly_cost: f64,
    pub monthly_cost: f64,
    pub currency: Option<String>,
}

pub fn estimate_cost(
    vm_type: &str,
    total_cores: f64,
    vm: &VmCost,
    target_utilization: f64,
) -> Result<CostEstimate, CalcError> {
    check("totalCores", total_cores, &[Constraint::NonNegative])?;
    check(
        "targetUtilization",
        target_utilization,
        &[Constraint::Positive, Constraint::AtMostOne],
    )?;
    check("coresPerVm", vm.cores_per_vm, &[Constraint::Positive])?;
    check("costPerHour", vm.cost_per_hour, &[Constraint::NonNegative])?;

    let provisioned_cores = total_cores / target_utilization;
    let vm_count = (provisioned_cores / vm.cores_per_vm).ceil() as u64;
    let hourly_cost = vm_count as f64 * vm.cost_per_hour;

    Ok(CostEstimate {
        vm_type: vm_type.to_string(),
        required_cores: total_cores,
        target_utilization,
        provisioned_cores,
        vm_count,
        hourly_cost,
        monthly_cost: hourly_cost * HOURS_PER_MONTH,
        currency: vm.currency.clone(),
    })
}

/// Estimate every VM type, cheapest monthly spend first (ties by name).
pub fn estimate_all(
    total_cores: f64,
    vm_costs: &BTreeMap<String, VmCost>,
    target_utilization: f64,
) -> Result<Vec<CostEstimate>, CalcError> {
    let mut estimates = vm_costs
        .iter()
        .map(|(name, vm)| estimate_cost(name, total_cores, vm, target_utilization))
        .collect::<Result<Vec<_>, _>>()?;
    estimates.sort_by(|a, b| {
        a.monthly_cost
            .total_cmp(&b.monthly_cost)
            .then_with(|| a.vm_type.cmp(&b.vm_type))
    });
    Ok(estimates)
}

fn check(field: &'static str, value: f64, constraints: &[Constraint]) -> Result<(), CalcError> {
    let violated = constraints
        .iter()
        .chain(std::iter::once(&Constraint::Finite))
        .find(|c| !c.holds(value));
    match violated {
        Some(&constraint) => Err(CalcError::InvalidParameter {
            field,
            constraint,
            value,
        }),
        None => Ok(()),
    }
}
