use capcalc_core::PerformanceConfig;
use capcalc_engine::CostEstimate;
use tracing::info;

use super::Context;
use crate::report;

/// Utilization target used when neither the flag nor the config sets one.
pub const DEFAULT_UTILIZATION: f64 = 0.7;

pub fn cost(
    ctx: &Context,
    cores: f64,
    vm_type: Option<&str>,
    utilization: Option<f64>,
    format: &str,
) -> anyhow::Result<()> {
    let estimates = estimate(ctx, cores, vm_type, utilization)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&estimates)?);
        }
        _ => {
            println!("{}", report::format_costs(&estimates));
        }
    }

    Ok(())
}

pub fn estimate(
    ctx: &Context,
    cores: f64,
    vm_type: Option<&str>,
    utilization: Option<f64>,
) -> anyhow::Result<Vec<CostEstimate>> {
    let config = match ctx.load_config()? {
        Some(config) if config.vm_costs().is_some() => config,
        Some(config) => {
            info!("config has no VM prices, using built-in cost models");
            PerformanceConfig {
                cost_models: PerformanceConfig::scaffold().cost_models,
                ..config
            }
        }
        None => PerformanceConfig::scaffold(),
    };
    let target = utilization
        .or_else(|| config.utilization_target())
        .unwrap_or(DEFAULT_UTILIZATION);

    let Some(vm_costs) = config.vm_costs() else {
        return Ok(Vec::new());
    };

    match vm_type {
        Some(name) => {
            let vm = vm_costs.get(name).ok_or_else(|| {
                let known: Vec<&str> = vm_costs.keys().map(String::as_str).collect();
                anyhow::anyhow!("unknown VM type '{name}' (known: {})", known.join(", "))
            })?;
            Ok(vec![capcalc_engine::estimate_cost(name, cores, vm, target)?])
        }
        None => Ok(capcalc_engine::estimate_all(cores, vm_costs, target)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;

    fn write_scaffold(dir: &std::path::Path) {
        let toml = PerformanceConfig::scaffold().to_toml_string().unwrap();
        std::fs::write(dir.join("capcalc.toml"), toml).unwrap();
    }

    #[test]
    fn estimates_every_vm_type_cheapest_first() {
        let dir = tempfile::tempdir().unwrap();
        write_scaffold(dir.path());
        let ctx = context(dir.path());

        let estimates = estimate(&ctx, 10.0, None, None).unwrap();

        assert_eq!(estimates.len(), 2);
        assert!(estimates[0].monthly_cost <= estimates[1].monthly_cost);
        assert_eq!(estimates[0].target_utilization, 0.7);
    }

    #[test]
    fn single_vm_type_with_explicit_utilization() {
        let dir = tempfile::tempdir().unwrap();
        write_scaffold(dir.path());
        let ctx = context(dir.path());

        let estimates = estimate(&ctx, 10.0, Some("D4s_v5"), Some(0.5)).unwrap();

        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].provisioned_cores, 20.0);
        assert_eq!(estimates[0].vm_count, 5);
    }

    #[test]
    fn unknown_vm_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_scaffold(dir.path());
        let ctx = context(dir.path());

        let err = estimate(&ctx, 10.0, Some("M128"), None).unwrap_err();
        assert!(err.to_string().contains("D4s_v5"));
    }

    #[test]
    fn invalid_utilization_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_scaffold(dir.path());
        let ctx = context(dir.path());

        assert!(estimate(&ctx, 10.0, None, Some(1.5)).is_err());
    }
}
