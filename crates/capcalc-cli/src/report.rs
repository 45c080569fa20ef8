//! Human-readable report formatting.

use capcalc_core::config::FanoutMetric;
use capcalc_core::{CalculationInput, CalculationResult, Coefficients, PerformanceConfig, Tier};
use capcalc_engine::CostEstimate;

const RULE: &str = "══════════════════════════════════════════";

fn boxed(out: &mut String, title: &str, rows: &[String]) {
    out.push_str(&format!("\n╔{RULE}╗\n"));
    out.push_str(&format!("║  {:<40}║\n", title));
    out.push_str(&format!("╠{RULE}╣\n"));
    for row in rows {
        out.push_str(&format!("║  {:<40}║\n", row));
    }
    out.push_str(&format!("╚{RULE}╝\n\n"));
}

pub fn format_result(input: &CalculationInput, result: &CalculationResult) -> String {
    let mut out = String::new();

    boxed(
        &mut out,
        &format!("capcalc: {}", input.kind().label()),
        &[
            format!("Effective QPS: {:<25.4}", result.effective_qps),
            format!("Total cores:   {:<25.4}", result.total_cores),
        ],
    );

    out.push_str("Per tier:\n");
    out.push_str(&format!(
        "  {:<6} {:>14} {:>12} {:>8}\n",
        "Tier", "RPS", "Cores", "Share"
    ));
    for tier in Tier::ALL {
        out.push_str(&format!(
            "  {:<6} {:>14.4} {:>12.4} {:>7.1}%\n",
            tier.label(),
            result.rps.get(tier),
            result.cores.get(tier),
            result.core_share(tier)
        ));
    }
    out.push_str(&format!(
        "  {:<6} {:>14} {:>12.4}\n\n",
        "Total", "", result.total_cores
    ));

    out.push_str(&format_coefficient_lines(&input.coefficients));
    out
}

pub fn format_coefficients(coefficients: &Coefficients, source: &str) -> String {
    let mut out = String::new();
    boxed(
        &mut out,
        "capcalc coefficients",
        &[format!("Source: {}", truncate(source, 32))],
    );
    out.push_str(&format_coefficient_lines(coefficients));
    out
}

fn format_coefficient_lines(coefficients: &Coefficients) -> String {
    let mut out = String::from("Coefficients:\n");
    for (name, value) in coefficients.labelled() {
        out.push_str(&format!("  {name:<18} {value:.4}\n"));
    }
    out
}

/// Metadata, fan-out ranges, baselines and VM prices from a loaded config.
pub fn format_config(config: &PerformanceConfig) -> String {
    let mut out = String::new();
    boxed(
        &mut out,
        "capcalc configuration",
        &[
            format!("Version:      {}", truncate(&config.version, 26)),
            format!(
                "Last updated: {}",
                truncate(config.last_updated.as_deref().unwrap_or("unknown"), 26)
            ),
            format!(
                "Source:       {}",
                truncate(config.source.as_deref().unwrap_or("unknown"), 26)
            ),
        ],
    );

    let fanout = &config.fanout_metrics;
    out.push_str("Fan-out (typical / peak):
");
    for (name, metric) in [
        ("XAP → LSS", &fanout.xap_lss_fanout),
        ("LSS → CSO", &fanout.lss_cso_fanout),
        ("CSO → Store", &fanout.cso_store_fanout),
    ] {
        out.push_str(&format!("  {name:<12} {}\n", fanout_range(metric)));
    }

    if let Some(baselines) = &config.performance_baselines {
        out.push_str("\nBaselines:\n");
        if let Some(cores) = &baselines.total_cpu_cores {
            out.push_str(&format!(
                "  {:<12} {:.1} baseline, {:.1} peak\n",
                "CPU cores", cores.baseline, cores.peak
            ));
        }
        if let Some(u) = &baselines.cpu_utilization {
            let pct = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{:.0}%", v * 100.0));
            out.push_str(&format!(
                "  {:<12} target {}, warning {}, critical {}\n",
                "Utilization",
                pct(Some(u.target)),
                pct(u.warning),
                pct(u.critical)
            ));
        }
    }

    if let Some(costs) = config.vm_costs() {
        out.push_str("\nVM prices:\n");
        for (name, vm) in costs {
            let currency = vm.currency.as_deref().unwrap_or("");
            out.push_str(&format!(
                "  {name:<12} {:>4} cores  {:.3}/h {currency}\n",
                vm.cores_per_vm, vm.cost_per_hour
            ));
        }
    }
    out
}

fn fanout_range(metric: &FanoutMetric) -> String {
    match metric.peak {
        Some(peak) => format!("{:.2} / {:.2}", metric.typical, peak),
        None => format!("{:.2} / -", metric.typical),
    }
}

pub fn format_costs(estimates: &[CostEstimate]) -> String {
    let mut out = String::new();

    let Some(first) = estimates.first() else {
        out.push_str("No VM types configured.\n");
        return out;
    };

    boxed(
        &mut out,
        "capcalc VM sizing",
        &[
            format!("Required cores:    {:<21.4}", first.required_cores),
            format!("Target utilization: {:<20}", format!("{:.0}%", first.target_utilization * 100.0)),
            format!("Provisioned cores: {:<21.4}", first.provisioned_cores),
        ],
    );

    out.push_str(&format!(
        "  {:<14} {:>6} {:>12} {:>14}\n",
        "VM type", "VMs", "Hourly", "Monthly"
    ));
    for e in estimates {
        let currency = e.currency.as_deref().unwrap_or("");
        out.push_str(&format!(
            "  {:<14} {:>6} {:>12.3} {:>14.2} {currency}\n",
            e.vm_type, e.vm_count, e.hourly_cost, e.monthly_cost
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capcalc_core::{ScenarioKind, ScenarioParameters, TierValues};
    use capcalc_core::config::CoreBaseline;
    use capcalc_core::VmCost;

    fn sample() -> (CalculationInput, CalculationResult) {
        let input = CalculationInput::new(
            ScenarioParameters::defaults_for(ScenarioKind::ShadowAb),
            Coefficients::DEFAULT,
        );
        let rps = TierValues { xap: 800.0, lss: 800.0, cso: 800.0, store: 800.0 };
        let cores = TierValues { xap: 8.0, lss: 16.0, cso: 12.0, store: 4.0 };
        let result = CalculationResult {
            effective_qps: 800.0,
            rps,
            cores,
            total_cores: 40.0,
        };
        (input, result)
    }

    #[test]
    fn result_report_lists_every_tier() {
        let (input, result) = sample();
        let text = format_result(&input, &result);

        assert!(text.contains("capcalc: Shadow A/B Testing"));
        assert!(text.contains("Effective QPS: 800.0000"));
        assert!(text.contains("Total cores:   40.0000"));
        for tier in Tier::ALL {
            assert!(text.contains(&format!("  {:<6}", tier.label())));
        }
        assert!(text.contains("40.0%"));
        assert!(text.contains("fanout.xap_lss"));
    }

    #[test]
    fn result_report_lines_are_aligned() {
        let (input, result) = sample();
        let text = format_result(&input, &result);
        let widths: Vec<usize> = text
            .lines()
            .filter(|l| l.starts_with('║'))
            .map(|l| l.chars().count())
            .collect();
        assert!(!widths.is_empty());
        assert!(widths.iter().all(|w| *w == 44));
    }

    #[test]
    fn coefficient_report_truncates_long_sources() {
        let source = "/a/very/long/path/to/some/deeply/nested/capcalc.toml";
        let text = format_coefficients(&Coefficients::DEFAULT, source);
        assert!(text.contains('…'));
        assert!(text.contains("cpuPerRps.store"));
    }

    #[test]
    fn config_report_shows_metadata_and_baselines() {
        let mut config = PerformanceConfig::scaffold();
        config.last_updated = Some("2024-05-01".to_string());
        config.fanout_metrics.lss_cso_fanout.peak = Some(3.5);
        config.fanout_metrics.cso_store_fanout.peak = None;
        if let Some(baselines) = config.performance_baselines.as_mut() {
            baselines.total_cpu_cores = Some(CoreBaseline {
                baseline: 120.0,
                peak: 180.0,
                unit: None,
                description: None,
            });
        }

        let text = format_config(&config);
        assert!(text.contains("Version:      1.0.0"));
        assert!(text.contains("Last updated: 2024-05-01"));
        assert!(text.contains("Source:       built-in defaults"));
        assert!(text.contains("LSS → CSO    1.00 / 3.50"));
        assert!(text.contains("CSO → Store  1.00 / -"));
        assert!(text.contains("120.0 baseline, 180.0 peak"));
        assert!(text.contains("target 70%, warning 80%, critical 90%"));
        assert!(text.contains("D8s_v5"));
        assert!(text.contains("0.384/h USD"));
    }

    #[test]
    fn config_report_without_optional_sections() {
        let mut config = PerformanceConfig::scaffold();
        config.source = None;
        config.performance_baselines = None;
        config.cost_models = None;

        let text = format_config(&config);
        assert!(text.contains("Source:       unknown"));
        assert!(!text.contains("Baselines:"));
        assert!(!text.contains("VM prices:"));
    }

    #[test]
    fn cost_report() {
        let vm = VmCost {
            cores_per_vm: 4.0,
            cost_per_hour: 0.2,
            currency: Some("USD".to_string()),
        };
        let estimate = capcalc_engine::estimate_cost("D4s_v5", 7.0, &vm, 0.7).unwrap();
        let text = format_costs(&[estimate]);

        assert!(text.contains("D4s_v5"));
        assert!(text.contains("70%"));
        assert!(text.contains("USD"));
        assert_eq!(format_costs(&[]), "No VM types configured.\n");
    }
}
