//! Effective-QPS formulas, one per scenario kind.
//!
//! Each formula first honours a `directQps` override; otherwise it reads its
//! own fields in a fixed order and fails on the first one that is absent or
//! out of range. Nothing is clamped or defaulted here.

use capcalc_core::{
    CalcError, Constraint, InorganicGrowthParams, OfflineAbParams, OnlineAbDeltaParams,
    ScenarioParameters, ShadowAbParams,
};

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Derive the effective QPS for a scenario.
pub fn effective_qps(scenario: &ScenarioParameters) -> Result<f64, CalcError> {
    if let Some(direct) = scenario.direct_qps() {
        return require("directQps", Some(direct), &[Constraint::Positive]);
    }

    match scenario {
        ScenarioParameters::OfflineAb(p) => offline_ab(p),
        ScenarioParameters::ShadowAb(p) => shadow_ab(p),
        ScenarioParameters::OnlineAbDelta(p) => online_ab_delta(p),
        ScenarioParameters::InorganicGrowth(p) => inorganic_growth(p),
    }
}

/// Monthly batch queries spread across working hours.
fn offline_ab(p: &OfflineAbParams) -> Result<f64, CalcError> {
    let qpm = positive("queriesPerMonth", p.queries_per_month)?;
    let workdays = positive("workdaysPerMonth", p.workdays_per_month)?;
    let hours = positive("activeHoursPerDay", p.active_hours_per_day)?;
    Ok(qpm / (workdays * hours * SECONDS_PER_HOUR))
}

/// A percentage of live traffic, duplicated `forkCount` times.
fn shadow_ab(p: &ShadowAbParams) -> Result<f64, CalcError> {
    let live = non_negative("liveBaselineQps", p.live_baseline_qps)?;
    let fork_percent = non_negative("forkPercent", p.fork_percent)?;
    let fork_count = positive("forkCount", p.fork_count)?;
    Ok(live * (fork_percent / 100.0) * fork_count)
}

fn online_ab_delta(p: &OnlineAbDeltaParams) -> Result<f64, CalcError> {
    let live = non_negative("liveBaselineQps", p.live_baseline_qps)?;
    let share = fraction("treatmentShare", p.treatment_share)?;
    let delta = fraction("deltaFactor", p.delta_factor)?;
    Ok(live * share * delta)
}

/// New DAU times per-user daily queries, averaged over a day and scaled to peak.
fn inorganic_growth(p: &InorganicGrowthParams) -> Result<f64, CalcError> {
    let delta_mau = non_negative("deltaMau", p.delta_mau)?;
    let ratio = fraction("dauMauRatio", p.dau_mau_ratio)?;
    let qpd = non_negative("qpd", p.qpd)?;
    let realization = fraction("realizationFactor", p.realization_factor)?;
    let pcf = positive("pcf", p.pcf)?;

    let delta_dau = delta_mau * ratio;
    Ok((delta_dau * qpd * realization / SECONDS_PER_DAY) * pcf)
}

fn positive(field: &'static str, value: Option<f64>) -> Result<f64, CalcError> {
    require(field, value, &[Constraint::Positive])
}

fn non_negative(field: &'static str, value: Option<f64>) -> Result<f64, CalcError> {
    require(field, value, &[Constraint::NonNegative])
}

fn fraction(field: &'static str, value: Option<f64>) -> Result<f64, CalcError> {
    require(field, value, &[Constraint::NonNegative, Constraint::AtMostOne])
}

/// Absent ⇒ `MissingParameter`; first violated constraint ⇒ `InvalidParameter`.
/// Infinite values that pass the range checks are still rejected.
fn require(
    field: &'static str,
    value: Option<f64>,
    constraints: &[Constraint],
) -> Result<f64, CalcError> {
    let value = value.ok_or(CalcError::MissingParameter { field })?;
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
        None => Ok(value),
    }
}
