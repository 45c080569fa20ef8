//! Performance configuration parser (`capcalc.toml` or a JSON export of it).
//!
//! Holds measured CPU-per-request and fan-out figures plus optional
//! utilization targets and VM pricing used for cost estimates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Coefficients, CpuPerRequestCoefficients, FanoutCoefficients};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Which fan-out figure to read from the config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FanoutProfile {
    #[default]
    Typical,
    Peak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceConfig {
    pub version: String,
    pub last_updated: Option<String>,
    /// Where the figures came from, e.g. "production telemetry".
    pub source: Option<String>,
    pub cpu_coefficients: CpuCoefficientsConfig,
    pub fanout_metrics: FanoutMetricsConfig,
    pub performance_baselines: Option<PerformanceBaselines>,
    pub cost_models: Option<CostModels>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuCoefficientsConfig {
    pub xap_cpu_per_request: MetricValue,
    pub lss_cpu_per_request: MetricValue,
    pub cso_cpu_per_request: MetricValue,
    pub store_cpu_per_request: MetricValue,
    /// Informational only; the calculator sums per-tier figures itself.
    pub total_cpu_per_request: Option<MetricValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutMetric {
    pub typical: f64,
    pub peak: Option<f64>,
    pub unit: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanoutMetricsConfig {
    pub xap_lss_fanout: FanoutMetric,
    pub lss_cso_fanout: FanoutMetric,
    pub cso_store_fanout: FanoutMetric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceBaselines {
    pub total_cpu_cores: Option<CoreBaseline>,
    pub cpu_utilization: Option<UtilizationTargets>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreBaseline {
    pub baseline: f64,
    pub peak: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
}

/// Utilization ratios (0-1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationTargets {
    pub target: f64,
    pub warning: Option<f64>,
    pub critical: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostModels {
    #[serde(default)]
    pub azure_vm_costs: BTreeMap<String, VmCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmCost {
    pub cores_per_vm: f64,
    pub cost_per_hour: f64,
    pub currency: Option<String>,
}

impl PerformanceConfig {
    /// Parse a config file. `.json` files are read as JSON, anything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn fanout(&self, profile: FanoutProfile) -> Result<FanoutCoefficients, ConfigError> {
        let m = &self.fanout_metrics;
        Ok(match profile {
            FanoutProfile::Typical => FanoutCoefficients {
                xap_lss: m.xap_lss_fanout.typical,
                lss_cso: m.lss_cso_fanout.typical,
                cso_store: m.cso_store_fanout.typical,
            },
            FanoutProfile::Peak => FanoutCoefficients {
                xap_lss: m
                    .xap_lss_fanout
                    .peak
                    .ok_or(ConfigError::MissingField("fanoutMetrics.xapLssFanout.peak"))?,
                lss_cso: m
                    .lss_cso_fanout
                    .peak
                    .ok_or(ConfigError::MissingField("fanoutMetrics.lssCsoFanout.peak"))?,
                cso_store: m
                    .cso_store_fanout
                    .peak
                    .ok_or(ConfigError::MissingField("fanoutMetrics.csoStoreFanout.peak"))?,
            },
        })
    }

    pub fn cpu_per_request(&self) -> CpuPerRequestCoefficients {
        let c = &self.cpu_coefficients;
        CpuPerRequestCoefficients {
            xap: c.xap_cpu_per_request.value,
            lss: c.lss_cpu_per_request.value,
            cso: c.cso_cpu_per_request.value,
            store: c.store_cpu_per_request.value,
        }
    }

    /// Raw coefficients, unvalidated. Use [`crate::resolve_coefficients`]
    /// to get a set that is safe to calculate with.
    pub fn coefficients(&self, profile: FanoutProfile) -> Result<Coefficients, ConfigError> {
        Ok(Coefficients {
            fanout: self.fanout(profile)?,
            cpu_per_rps: self.cpu_per_request(),
        })
    }

    pub fn utilization_target(&self) -> Option<f64> {
        self.performance_baselines
            .as_ref()?
            .cpu_utilization
            .as_ref()
            .map(|u| u.target)
    }

    pub fn vm_costs(&self) -> Option<&BTreeMap<String, VmCost>> {
        self.cost_models
            .as_ref()
            .map(|c| &c.azure_vm_costs)
            .filter(|costs| !costs.is_empty())
    }

    /// Scaffold a config carrying the built-in coefficients.
    pub fn scaffold() -> Self {
        let d = Coefficients::DEFAULT;
        let cpu = |value: f64, tier: &str| MetricValue {
            value,
            unit: Some("cores/request".to_string()),
            description: Some(format!("CPU cores consumed per request at {tier}")),
        };
        let fanout = |value: f64, from: &str, to: &str| FanoutMetric {
            typical: value,
            peak: Some(value),
            unit: Some("requests/request".to_string()),
            description: Some(format!("Requests issued to {to} per {from} request")),
        };

        let mut vm_costs = BTreeMap::new();
        vm_costs.insert(
            "D4s_v5".to_string(),
            VmCost {
                cores_per_vm: 4.0,
                cost_per_hour: 0.192,
                currency: Some("USD".to_string()),
            },
        );
        vm_costs.insert(
            "D8s_v5".to_string(),
            VmCost {
                cores_per_vm: 8.0,
                cost_per_hour: 0.384,
                currency: Some("USD".to_string()),
            },
        );

        PerformanceConfig {
            version: "1.0.0".to_string(),
            last_updated: None,
            source: Some("built-in defaults".to_string()),
            cpu_coefficients: CpuCoefficientsConfig {
                xap_cpu_per_request: cpu(d.cpu_per_rps.xap, "XAP"),
                lss_cpu_per_request: cpu(d.cpu_per_rps.lss, "LSS"),
                cso_cpu_per_request: cpu(d.cpu_per_rps.cso, "CSO"),
                store_cpu_per_request: cpu(d.cpu_per_rps.store, "Store"),
                total_cpu_per_request: None,
            },
            fanout_metrics: FanoutMetricsConfig {
                xap_lss_fanout: fanout(d.fanout.xap_lss, "XAP", "LSS"),
                lss_cso_fanout: fanout(d.fanout.lss_cso, "LSS", "CSO"),
                cso_store_fanout: fanout(d.fanout.cso_store, "CSO", "Store"),
            },
            performance_baselines: Some(PerformanceBaselines {
                total_cpu_cores: None,
                cpu_utilization: Some(UtilizationTargets {
                    target: 0.7,
                    warning: Some(0.8),
                    critical: Some(0.9),
                }),
            }),
            cost_models: Some(CostModels {
                azure_vm_costs: vm_costs,
            }),
        }
    }
}
