//! Behavioural properties of `calculate` across every scenario kind.

use std::sync::Arc;
use std::thread;

use capcalc_core::{
    CalcError, CalculationInput, CalculationResult, Coefficients, Constraint, ErrorKind,
    InorganicGrowthParams, OfflineAbParams, OnlineAbDeltaParams, ScenarioKind,
    ScenarioParameters, ShadowAbParams,
};
use capcalc_engine::calculate;

fn input(scenario: ScenarioParameters) -> CalculationInput {
    CalculationInput::new(scenario, Coefficients::DEFAULT)
}

fn all_default_inputs() -> Vec<CalculationInput> {
    ScenarioKind::ALL
        .into_iter()
        .map(|kind| input(ScenarioParameters::defaults_for(kind)))
        .collect()
}

#[test]
fn any_non_positive_coefficient_fails_for_every_kind() {
    for base in all_default_inputs() {
        for index in 0..7 {
            for bad in [0.0, -1.0] {
                let mut c = Coefficients::DEFAULT;
                match index {
                    0 => c.fanout.xap_lss = bad,
                    1 => c.fanout.lss_cso = bad,
                    2 => c.fanout.cso_store = bad,
                    3 => c.cpu_per_rps.xap = bad,
                    4 => c.cpu_per_rps.lss = bad,
                    5 => c.cpu_per_rps.cso = bad,
                    _ => c.cpu_per_rps.store = bad,
                }
                let mut bad_input = base.clone();
                bad_input.coefficients = c;
                let err = calculate(&bad_input).unwrap_err();
                assert_eq!(
                    err.kind(),
                    ErrorKind::InvalidCoefficient,
                    "{} coefficient #{index} = {bad}",
                    base.kind()
                );
            }
        }
    }
}

#[test]
fn offline_ab_reference_case() {
    let result = calculate(&input(ScenarioParameters::OfflineAb(OfflineAbParams {
        queries_per_month: Some(1000.0),
        workdays_per_month: Some(18.0),
        active_hours_per_day: Some(5.0),
        direct_qps: None,
    })))
    .unwrap();

    assert!((result.effective_qps - 0.0030864).abs() < 1e-7);
    let expected_total = result.effective_qps * 0.05;
    assert!((result.total_cores - expected_total).abs() < 1e-15);
}

#[test]
fn shadow_ab_reference_case() {
    let result = calculate(&input(ScenarioParameters::ShadowAb(ShadowAbParams {
        live_baseline_qps: Some(2000.0),
        fork_percent: Some(20.0),
        fork_count: Some(2.0),
        direct_qps: None,
    })))
    .unwrap();
    assert_eq!(result.effective_qps, 800.0);
}

#[test]
fn online_ab_delta_reference_case() {
    let ok = calculate(&input(ScenarioParameters::OnlineAbDelta(OnlineAbDeltaParams {
        live_baseline_qps: Some(3000.0),
        treatment_share: Some(0.5),
        delta_factor: Some(0.1),
        direct_qps: None,
    })))
    .unwrap();
    assert!((ok.effective_qps - 150.0).abs() < 1e-9);

    let err = calculate(&input(ScenarioParameters::OnlineAbDelta(OnlineAbDeltaParams {
        live_baseline_qps: Some(3000.0),
        treatment_share: Some(1.5),
        delta_factor: Some(0.1),
        direct_qps: None,
    })))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert_eq!(err.field(), Some("treatmentShare"));
}

#[test]
fn inorganic_growth_reference_case() {
    let result = calculate(&input(ScenarioParameters::InorganicGrowth(InorganicGrowthParams {
        delta_mau: Some(10_000.0),
        dau_mau_ratio: Some(0.35),
        qpd: Some(2.4),
        realization_factor: Some(0.85),
        pcf: Some(6.0),
        direct_qps: None,
    })))
    .unwrap();

    // deltaDau = 3500; 3500 * 2.4 * 0.85 / 86400 * 6
    let expected = (3500.0 * 2.4 * 0.85 / 86_400.0) * 6.0;
    assert!((result.effective_qps - expected).abs() < 1e-12);
}

#[test]
fn fanout_at_least_one_never_decreases_tier_rates() {
    let fanouts = [1.0, 1.25, 3.5, 10.0];
    for base in all_default_inputs() {
        for &a in &fanouts {
            for &b in &fanouts {
                for &c in &fanouts {
                    let mut i = base.clone();
                    i.coefficients.fanout.xap_lss = a;
                    i.coefficients.fanout.lss_cso = b;
                    i.coefficients.fanout.cso_store = c;
                    let r = calculate(&i).unwrap();
                    assert!(r.rps.xap <= r.rps.lss);
                    assert!(r.rps.lss <= r.rps.cso);
                    assert!(r.rps.cso <= r.rps.store);
                }
            }
        }
    }
}

#[test]
fn results_are_finite_and_non_negative() {
    for i in all_default_inputs() {
        let r = calculate(&i).unwrap();
        let values = [r.effective_qps, r.total_cores]
            .into_iter()
            .chain(r.rps.iter().map(|(_, v)| v))
            .chain(r.cores.iter().map(|(_, v)| v));
        for v in values {
            assert!(v.is_finite() && v >= 0.0, "{} produced {v}", i.kind());
        }
    }
}

/// Whatever the magnitudes, `calculate` either returns only finite,
/// non-negative values or names the value that overflowed.
#[test]
fn extreme_inputs_never_yield_non_finite_results() {
    let magnitudes = [1e-300, 1e-3, 1.0, 1e6, 1e150, 1e300];
    let mut inputs = Vec::new();
    for &m in &magnitudes {
        inputs.push(input(ScenarioParameters::OfflineAb(OfflineAbParams {
            queries_per_month: Some(m),
            workdays_per_month: Some(1.0 / m),
            active_hours_per_day: Some(1e-10),
            direct_qps: None,
        })));
        inputs.push(input(ScenarioParameters::ShadowAb(ShadowAbParams {
            live_baseline_qps: Some(m),
            fork_percent: Some(100.0),
            fork_count: Some(m),
            direct_qps: None,
        })));
        inputs.push(input(ScenarioParameters::OnlineAbDelta(OnlineAbDeltaParams {
            live_baseline_qps: Some(m),
            treatment_share: Some(1.0),
            delta_factor: Some(1.0),
            direct_qps: None,
        })));
        inputs.push(input(ScenarioParameters::InorganicGrowth(InorganicGrowthParams {
            delta_mau: Some(m),
            dau_mau_ratio: Some(1.0),
            qpd: Some(m),
            realization_factor: Some(1.0),
            pcf: Some(m),
            direct_qps: None,
        })));
        let mut fanned = input(ScenarioParameters::defaults_for(ScenarioKind::ShadowAb));
        fanned.coefficients.fanout.xap_lss = m;
        fanned.coefficients.fanout.lss_cso = m;
        fanned.coefficients.cpu_per_rps.store = m;
        inputs.push(fanned);
    }

    let mut rejected = 0;
    for i in &inputs {
        match calculate(i) {
            Ok(r) => {
                let values = [r.effective_qps, r.total_cores]
                    .into_iter()
                    .chain(r.rps.iter().map(|(_, v)| v))
                    .chain(r.cores.iter().map(|(_, v)| v));
                for v in values {
                    assert!(v.is_finite() && v >= 0.0, "{i:?} produced {v}");
                }
                let json = serde_json::to_string(&r).unwrap();
                let back: CalculationResult = serde_json::from_str(&json).unwrap();
                assert_eq!(back, r);
            }
            Err(CalcError::InvalidParameter {
                constraint: Constraint::Finite,
                value,
                ..
            }) => {
                assert!(!value.is_finite());
                rejected += 1;
            }
            Err(other) => panic!("{i:?} failed unexpectedly: {other}"),
        }
    }
    assert!(rejected > 0);
}

#[test]
fn repeated_calls_are_bit_identical() {
    for i in all_default_inputs() {
        let first = calculate(&i).unwrap();
        let second = calculate(&i.clone()).unwrap();
        assert_eq!(first.effective_qps.to_bits(), second.effective_qps.to_bits());
        assert_eq!(first.total_cores.to_bits(), second.total_cores.to_bits());
        assert_eq!(first, second);
    }
}

#[test]
fn missing_queries_per_month_is_reported_not_zeroed() {
    let err = calculate(&input(ScenarioParameters::OfflineAb(OfflineAbParams {
        queries_per_month: None,
        workdays_per_month: Some(18.0),
        active_hours_per_day: Some(5.0),
        direct_qps: None,
    })))
    .unwrap_err();
    assert_eq!(err, CalcError::MissingParameter { field: "queriesPerMonth" });
}

#[test]
fn direct_qps_is_used_verbatim_for_every_kind() {
    for kind in ScenarioKind::ALL {
        let scenario = match kind {
            ScenarioKind::OfflineAb => ScenarioParameters::OfflineAb(OfflineAbParams {
                direct_qps: Some(123.25),
                ..Default::default()
            }),
            ScenarioKind::ShadowAb => ScenarioParameters::ShadowAb(ShadowAbParams {
                fork_count: Some(0.0),
                direct_qps: Some(123.25),
                ..Default::default()
            }),
            ScenarioKind::OnlineAbDelta => ScenarioParameters::OnlineAbDelta(OnlineAbDeltaParams {
                treatment_share: Some(7.0),
                direct_qps: Some(123.25),
                ..Default::default()
            }),
            ScenarioKind::InorganicGrowth => {
                ScenarioParameters::InorganicGrowth(InorganicGrowthParams {
                    direct_qps: Some(123.25),
                    ..Default::default()
                })
            }
        };
        let result = calculate(&input(scenario)).unwrap();
        assert_eq!(result.effective_qps, 123.25, "{kind}");
        assert_eq!(result.rps.xap, 123.25);
    }
}

#[test]
fn calculate_is_safe_across_threads() {
    let inputs = Arc::new(all_default_inputs());
    let expected: Vec<CalculationResult> =
        inputs.iter().map(|i| calculate(i).unwrap()).collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let inputs = Arc::clone(&inputs);
            thread::spawn(move || {
                inputs
                    .iter()
                    .map(|i| calculate(i).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn input_and_result_roundtrip_through_json() {
    for i in all_default_inputs() {
        let result = calculate(&i).unwrap();

        let input_json = serde_json::to_string(&i).unwrap();
        let input_back: CalculationInput = serde_json::from_str(&input_json).unwrap();
        assert_eq!(input_back, i);

        let result_json = serde_json::to_string(&result).unwrap();
        let result_back: CalculationResult = serde_json::from_str(&result_json).unwrap();
        assert_eq!(result_back.effective_qps.to_bits(), result.effective_qps.to_bits());
        assert_eq!(result_back, result);
    }
}
