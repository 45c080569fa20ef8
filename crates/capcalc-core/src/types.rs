//! Shared types used across capcalc crates.
//!
//! Everything here is plain data: the calculator reads these values and
//! returns fresh ones, and the state store persists them as JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Constraint};

// ── Scenario kinds ─────────────────────────────────────────────────

/// How load is generated. Selects the effective-QPS formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Batch evaluation queries spread over working hours.
    OfflineAb,
    /// A forked copy of live traffic.
    ShadowAb,
    /// Incremental load from a live treatment population.
    OnlineAbDelta,
    /// New users arriving from outside the product.
    InorganicGrowth,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::OfflineAb,
        ScenarioKind::ShadowAb,
        ScenarioKind::OnlineAbDelta,
        ScenarioKind::InorganicGrowth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::OfflineAb => "offline_ab",
            ScenarioKind::ShadowAb => "shadow_ab",
            ScenarioKind::OnlineAbDelta => "online_ab_delta",
            ScenarioKind::InorganicGrowth => "inorganic_growth",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::OfflineAb => "Offline A/B Testing",
            ScenarioKind::ShadowAb => "Shadow A/B Testing",
            ScenarioKind::OnlineAbDelta => "Online A/B Testing (Delta)",
            ScenarioKind::InorganicGrowth => "Inorganic Growth",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKind {
    type Err = CalcError;

    /// Accepts the wire names (`shadow_ab`) and their kebab-case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ScenarioKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| CalcError::UnknownScenarioKind(s.to_string()))
    }
}

// ── Scenario parameters ────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineAbParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries_per_month: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdays_per_month: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_hours_per_day: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_qps: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowAbParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_baseline_qps: Option<f64>,
    /// Percentage (0-100) of live traffic forked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_qps: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineAbDeltaParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_baseline_qps: Option<f64>,
    /// Fraction (0-1) of users in treatment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_share: Option<f64>,
    /// Per-user QPS uplift as a fraction (0-1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_qps: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InorganicGrowthParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_mau: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dau_mau_ratio: Option<f64>,
    /// Queries per DAU per day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qpd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realization_factor: Option<f64>,
    /// Peak concurrency factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_qps: Option<f64>,
}

/// Parameters for one scenario. Each variant carries only the fields its
/// formula reads; every field is optional so absence can be reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scenarioType", content = "parameters", rename_all = "snake_case")]
pub enum ScenarioParameters {
    OfflineAb(OfflineAbParams),
    ShadowAb(ShadowAbParams),
    OnlineAbDelta(OnlineAbDeltaParams),
    InorganicGrowth(InorganicGrowthParams),
}

impl ScenarioParameters {
    pub fn kind(&self) -> ScenarioKind {
        match self {
            ScenarioParameters::OfflineAb(_) => ScenarioKind::OfflineAb,
            ScenarioParameters::ShadowAb(_) => ScenarioKind::ShadowAb,
            ScenarioParameters::OnlineAbDelta(_) => ScenarioKind::OnlineAbDelta,
            ScenarioParameters::InorganicGrowth(_) => ScenarioKind::InorganicGrowth,
        }
    }

    pub fn direct_qps(&self) -> Option<f64> {
        match self {
            ScenarioParameters::OfflineAb(p) => p.direct_qps,
            ScenarioParameters::ShadowAb(p) => p.direct_qps,
            ScenarioParameters::OnlineAbDelta(p) => p.direct_qps,
            ScenarioParameters::InorganicGrowth(p) => p.direct_qps,
        }
    }

    /// A variant of `kind` with every field absent.
    pub fn empty(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::OfflineAb => ScenarioParameters::OfflineAb(Default::default()),
            ScenarioKind::ShadowAb => ScenarioParameters::ShadowAb(Default::default()),
            ScenarioKind::OnlineAbDelta => ScenarioParameters::OnlineAbDelta(Default::default()),
            ScenarioKind::InorganicGrowth => {
                ScenarioParameters::InorganicGrowth(Default::default())
            }
        }
    }

    /// Starting values shown for a fresh scenario form.
    pub fn defaults_for(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::OfflineAb => ScenarioParameters::OfflineAb(OfflineAbParams {
                queries_per_month: Some(1000.0),
                workdays_per_month: Some(18.0),
                active_hours_per_day: Some(5.0),
                direct_qps: None,
            }),
            ScenarioKind::ShadowAb => ScenarioParameters::ShadowAb(ShadowAbParams {
                live_baseline_qps: Some(2000.0),
                fork_percent: Some(20.0),
                fork_count: Some(2.0),
                direct_qps: None,
            }),
            ScenarioKind::OnlineAbDelta => ScenarioParameters::OnlineAbDelta(OnlineAbDeltaParams {
                live_baseline_qps: Some(3000.0),
                treatment_share: Some(0.5),
                delta_factor: Some(0.1),
                direct_qps: None,
            }),
            ScenarioKind::InorganicGrowth => {
                ScenarioParameters::InorganicGrowth(InorganicGrowthParams {
                    delta_mau: Some(10_000.0),
                    dau_mau_ratio: Some(0.35),
                    qpd: Some(2.4),
                    realization_factor: Some(0.85),
                    pcf: Some(6.0),
                    direct_qps: None,
                })
            }
        }
    }

    /// Fill absent fields from `other`. Present values, including
    /// out-of-range ones, are kept. A different kind leaves `self` unchanged.
    pub fn fill_missing_from(&self, other: &ScenarioParameters) -> Self {
        use ScenarioParameters as P;
        match (self, other) {
            (P::OfflineAb(a), P::OfflineAb(b)) => P::OfflineAb(OfflineAbParams {
                queries_per_month: a.queries_per_month.or(b.queries_per_month),
                workdays_per_month: a.workdays_per_month.or(b.workdays_per_month),
                active_hours_per_day: a.active_hours_per_day.or(b.active_hours_per_day),
                direct_qps: a.direct_qps.or(b.direct_qps),
            }),
            (P::ShadowAb(a), P::ShadowAb(b)) => P::ShadowAb(ShadowAbParams {
                live_baseline_qps: a.live_baseline_qps.or(b.live_baseline_qps),
                fork_percent: a.fork_percent.or(b.fork_percent),
                fork_count: a.fork_count.or(b.fork_count),
                direct_qps: a.direct_qps.or(b.direct_qps),
            }),
            (P::OnlineAbDelta(a), P::OnlineAbDelta(b)) => P::OnlineAbDelta(OnlineAbDeltaParams {
                live_baseline_qps: a.live_baseline_qps.or(b.live_baseline_qps),
                treatment_share: a.treatment_share.or(b.treatment_share),
                delta_factor: a.delta_factor.or(b.delta_factor),
                direct_qps: a.direct_qps.or(b.direct_qps),
            }),
            (P::InorganicGrowth(a), P::InorganicGrowth(b)) => {
                P::InorganicGrowth(InorganicGrowthParams {
                    delta_mau: a.delta_mau.or(b.delta_mau),
                    dau_mau_ratio: a.dau_mau_ratio.or(b.dau_mau_ratio),
                    qpd: a.qpd.or(b.qpd),
                    realization_factor: a.realization_factor.or(b.realization_factor),
                    pcf: a.pcf.or(b.pcf),
                    direct_qps: a.direct_qps.or(b.direct_qps),
                })
            }
            _ => self.clone(),
        }
    }
}

// ── Coefficients ───────────────────────────────────────────────────

/// Average downstream requests per upstream request between adjacent tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FanoutCoefficients {
    pub xap_lss: f64,
    pub lss_cso: f64,
    pub cso_store: f64,
}

/// CPU cores consumed per request at each tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuPerRequestCoefficients {
    pub xap: f64,
    pub lss: f64,
    pub cso: f64,
    pub store: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coefficients {
    pub fanout: FanoutCoefficients,
    pub cpu_per_rps: CpuPerRequestCoefficients,
}

impl Coefficients {
    /// Built-in set used whenever configured coefficients are unusable.
    pub const DEFAULT: Coefficients = Coefficients {
        fanout: FanoutCoefficients {
            xap_lss: 1.0,
            lss_cso: 1.0,
            cso_store: 1.0,
        },
        cpu_per_rps: CpuPerRequestCoefficients {
            xap: 0.01,
            lss: 0.02,
            cso: 0.015,
            store: 0.005,
        },
    };

    /// All seven values, labelled, in validation order.
    pub fn labelled(&self) -> [(&'static str, f64); 7] {
        [
            ("fanout.xap_lss", self.fanout.xap_lss),
            ("fanout.lss_cso", self.fanout.lss_cso),
            ("fanout.cso_store", self.fanout.cso_store),
            ("cpuPerRps.xap", self.cpu_per_rps.xap),
            ("cpuPerRps.lss", self.cpu_per_rps.lss),
            ("cpuPerRps.cso", self.cpu_per_rps.cso),
            ("cpuPerRps.store", self.cpu_per_rps.store),
        ]
    }

    /// Every value must be a finite number greater than zero. Reports the
    /// first offender.
    pub fn validate(&self) -> Result<(), CalcError> {
        for (field, value) in self.labelled() {
            let violated = [Constraint::Positive, Constraint::Finite]
                .into_iter()
                .find(|c| !c.holds(value));
            if let Some(constraint) = violated {
                return Err(CalcError::InvalidCoefficient {
                    field,
                    constraint,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Caller-supplied replacements for individual coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoefficientOverrides {
    pub xap_lss: Option<f64>,
    pub lss_cso: Option<f64>,
    pub cso_store: Option<f64>,
    pub cpu_xap: Option<f64>,
    pub cpu_lss: Option<f64>,
    pub cpu_cso: Option<f64>,
    pub cpu_store: Option<f64>,
}

impl CoefficientOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, base: Coefficients) -> Coefficients {
        Coefficients {
            fanout: FanoutCoefficients {
                xap_lss: self.xap_lss.unwrap_or(base.fanout.xap_lss),
                lss_cso: self.lss_cso.unwrap_or(base.fanout.lss_cso),
                cso_store: self.cso_store.unwrap_or(base.fanout.cso_store),
            },
            cpu_per_rps: CpuPerRequestCoefficients {
                xap: self.cpu_xap.unwrap_or(base.cpu_per_rps.xap),
                lss: self.cpu_lss.unwrap_or(base.cpu_per_rps.lss),
                cso: self.cpu_cso.unwrap_or(base.cpu_per_rps.cso),
                store: self.cpu_store.unwrap_or(base.cpu_per_rps.store),
            },
        }
    }
}

// ── Input / result ─────────────────────────────────────────────────

/// Everything one calculation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub scenario: ScenarioParameters,
    pub coefficients: Coefficients,
}

impl CalculationInput {
    pub fn new(scenario: ScenarioParameters, coefficients: Coefficients) -> Self {
        Self {
            scenario,
            coefficients,
        }
    }

    pub fn kind(&self) -> ScenarioKind {
        self.scenario.kind()
    }
}

/// The four service tiers, in fan-out order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Entry layer.
    Xap,
    /// Mid-tier logic layer.
    Lss,
    /// Coordination layer.
    Cso,
    /// Storage layer.
    Store,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Xap, Tier::Lss, Tier::Cso, Tier::Store];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Xap => "XAP",
            Tier::Lss => "LSS",
            Tier::Cso => "CSO",
            Tier::Store => "Store",
        }
    }
}

/// One number per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierValues {
    pub xap: f64,
    pub lss: f64,
    pub cso: f64,
    pub store: f64,
}

impl TierValues {
    pub fn get(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Xap => self.xap,
            Tier::Lss => self.lss,
            Tier::Cso => self.cso,
            Tier::Store => self.store,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, f64)> + '_ {
        Tier::ALL.into_iter().map(|tier| (tier, self.get(tier)))
    }

    pub fn sum(&self) -> f64 {
        self.xap + self.lss + self.cso + self.store
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub effective_qps: f64,
    /// Requests per second arriving at each tier.
    pub rps: TierValues,
    /// CPU cores required at each tier.
    pub cores: TierValues,
    pub total_cores: f64,
}

impl CalculationResult {
    /// Percentage of total cores consumed by `tier`; 0 when nothing is consumed.
    pub fn core_share(&self, tier: Tier) -> f64 {
        if self.total_cores > 0.0 {
            self.cores.get(tier) / self.total_cores * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_kind_parses_wire_and_kebab_names() {
        assert_eq!("shadow_ab".parse::<ScenarioKind>().unwrap(), ScenarioKind::ShadowAb);
        assert_eq!(
            "online-ab-delta".parse::<ScenarioKind>().unwrap(),
            ScenarioKind::OnlineAbDelta
        );
        assert_eq!(
            " Inorganic_Growth ".parse::<ScenarioKind>().unwrap(),
            ScenarioKind::InorganicGrowth
        );
    }

    #[test]
    fn unknown_scenario_kind_is_rejected() {
        let err = "canary".parse::<ScenarioKind>().unwrap_err();
        assert_eq!(err, CalcError::UnknownScenarioKind("canary".to_string()));
    }

    #[test]
    fn parameters_use_portal_wire_shape() {
        let params = ScenarioParameters::defaults_for(ScenarioKind::ShadowAb);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["scenarioType"], "shadow_ab");
        assert_eq!(json["parameters"]["liveBaselineQps"], 2000.0);
        assert_eq!(json["parameters"]["forkPercent"], 20.0);
        assert!(json["parameters"].get("directQps").is_none());
    }

    #[test]
    fn absent_fields_deserialize_as_none() {
        let json = r#"{"scenarioType":"offline_ab","parameters":{"workdaysPerMonth":18}}"#;
        let params: ScenarioParameters = serde_json::from_str(json).unwrap();
        match params {
            ScenarioParameters::OfflineAb(p) => {
                assert_eq!(p.queries_per_month, None);
                assert_eq!(p.workdays_per_month, Some(18.0));
            }
            other => panic!("expected OfflineAb, got {other:?}"),
        }
    }

    #[test]
    fn unknown_scenario_type_fails_to_deserialize() {
        let json = r#"{"scenarioType":"canary","parameters":{}}"#;
        assert!(serde_json::from_str::<ScenarioParameters>(json).is_err());
    }

    #[test]
    fn fill_missing_keeps_present_values() {
        let partial = ScenarioParameters::OnlineAbDelta(OnlineAbDeltaParams {
            treatment_share: Some(1.5),
            ..Default::default()
        });
        let filled =
            partial.fill_missing_from(&ScenarioParameters::defaults_for(ScenarioKind::OnlineAbDelta));
        match filled {
            ScenarioParameters::OnlineAbDelta(p) => {
                assert_eq!(p.treatment_share, Some(1.5));
                assert_eq!(p.live_baseline_qps, Some(3000.0));
                assert_eq!(p.delta_factor, Some(0.1));
            }
            other => panic!("expected OnlineAbDelta, got {other:?}"),
        }
    }

    #[test]
    fn fill_missing_ignores_other_kind() {
        let empty = ScenarioParameters::empty(ScenarioKind::OfflineAb);
        let filled = empty.fill_missing_from(&ScenarioParameters::defaults_for(ScenarioKind::ShadowAb));
        assert_eq!(filled, empty);
    }

    #[test]
    fn default_coefficients_are_valid() {
        assert!(Coefficients::DEFAULT.validate().is_ok());
        let json = serde_json::to_value(Coefficients::DEFAULT).unwrap();
        assert_eq!(json["cpuPerRps"]["lss"], 0.02);
        assert_eq!(json["fanout"]["cso_store"], 1.0);
    }

    #[test]
    fn validate_reports_first_bad_coefficient() {
        let mut c = Coefficients::DEFAULT;
        c.cpu_per_rps.cso = 0.0;
        c.cpu_per_rps.store = -1.0;
        assert_eq!(
            c.validate(),
            Err(CalcError::InvalidCoefficient {
                field: "cpuPerRps.cso",
                constraint: Constraint::Positive,
                value: 0.0
            })
        );
    }

    #[test]
    fn validate_names_finite_requirement_for_infinity() {
        let mut c = Coefficients::DEFAULT;
        c.fanout.lss_cso = f64::INFINITY;
        let err = c.validate().unwrap_err();
        assert_eq!(
            err,
            CalcError::InvalidCoefficient {
                field: "fanout.lss_cso",
                constraint: Constraint::Finite,
                value: f64::INFINITY
            }
        );
        assert!(err.to_string().contains("must be finite"));
    }

    #[test]
    fn overrides_replace_only_present_values() {
        let overrides = CoefficientOverrides {
            lss_cso: Some(4.5),
            cpu_store: Some(0.001),
            ..Default::default()
        };
        assert!(!overrides.is_empty());
        let c = overrides.apply_to(Coefficients::DEFAULT);
        assert_eq!(c.fanout.lss_cso, 4.5);
        assert_eq!(c.fanout.xap_lss, 1.0);
        assert_eq!(c.cpu_per_rps.store, 0.001);
        assert_eq!(c.cpu_per_rps.xap, 0.01);
    }

    #[test]
    fn core_share_handles_zero_total() {
        let result = CalculationResult {
            effective_qps: 0.0,
            rps: TierValues::default(),
            cores: TierValues::default(),
            total_cores: 0.0,
        };
        assert_eq!(result.core_share(Tier::Lss), 0.0);
    }

    #[test]
    fn result_uses_camel_case_names() {
        let result = CalculationResult {
            effective_qps: 1.0,
            rps: TierValues { xap: 1.0, lss: 1.0, cso: 1.0, store: 1.0 },
            cores: TierValues { xap: 0.01, lss: 0.02, cso: 0.015, store: 0.005 },
            total_cores: 0.05,
        };
        let json = serde_json::to_value(result).unwrap();
        assert!(json.get("effectiveQps").is_some());
        assert!(json.get("totalCores").is_some());
        assert_eq!(json["cores"]["cso"], 0.015);
    }
}
