//! The capacity calculator: coefficients check, effective QPS, tier fan-out,
//! and per-tier CPU cores.

use capcalc_core::{
    CalcError, CalculationInput, CalculationResult, Coefficients, Constraint,
    CpuPerRequestCoefficients, FanoutCoefficients, TierValues,
};
use tracing::debug;

use crate::scenario::effective_qps;

/// Estimate per-tier and total CPU cores for one scenario.
///
/// Fails with `InvalidCoefficient` before looking at any parameter, then with
/// `MissingParameter`/`InvalidParameter` from the scenario formula. A
/// derived value that overflows to infinity fails with `InvalidParameter`
/// naming that value and `Constraint::Finite`. No rounding is applied.
pub fn calculate(input: &CalculationInput) -> Result<CalculationResult, CalcError> {
    input.coefficients.validate()?;

    let qps = effective_qps(&input.scenario)?;
    let result = propagate(qps, &input.coefficients);
    ensure_finite(&result)?;

    debug!(
        scenario = %input.kind(),
        effective_qps = result.effective_qps,
        total_cores = result.total_cores,
        "capacity calculated"
    );
    Ok(result)
}

fn propagate(qps: f64, coefficients: &Coefficients) -> CalculationResult {
    let rps = fan_out(qps, &coefficients.fanout);
    let cores = cores_for(&rps, &coefficients.cpu_per_rps);
    CalculationResult {
        effective_qps: qps,
        rps,
        cores,
        total_cores: cores.sum(),
    }
}

/// Every derived value must stay finite; reports the first overflow in
/// pipeline order.
fn ensure_finite(result: &CalculationResult) -> Result<(), CalcError> {
    let derived = [
        ("effectiveQps", result.effective_qps),
        ("rps.xap", result.rps.xap),
        ("rps.lss", result.rps.lss),
        ("rps.cso", result.rps.cso),
        ("rps.store", result.rps.store),
        ("cores.xap", result.cores.xap),
        ("cores.lss", result.cores.lss),
        ("cores.cso", result.cores.cso),
        ("cores.store", result.cores.store),
        ("totalCores", result.total_cores),
    ];
    match derived.into_iter().find(|(_, v)| !v.is_finite()) {
        Some((field, value)) => Err(CalcError::InvalidParameter {
            field,
            constraint: Constraint::Finite,
            value,
        }),
        None => Ok(()),
    }
}

/// Each tier receives the previous tier's rate times the link's fan-out.
fn fan_out(qps: f64, fanout: &FanoutCoefficients) -> TierValues {
    let xap = qps;
    let lss = xap * fanout.xap_lss;
    let cso = lss * fanout.lss_cso;
    let store = cso * fanout.cso_store;
    TierValues { xap, lss, cso, store }
}

fn cores_for(rps: &TierValues, cpu: &CpuPerRequestCoefficients) -> TierValues {
    TierValues {
        xap: rps.xap * cpu.xap,
        lss: rps.lss * cpu.lss,
        cso: rps.cso * cpu.cso,
        store: rps.store * cpu.store,
    }
}
