use anyhow::Context as _;
use capcalc_core::{CalculationInput, CalculationResult, CoefficientOverrides, ScenarioParameters};
use clap::Args;
use tracing::{debug, info};

use super::Context;
use crate::report;

/// Options shared by every `calc` scenario.
#[derive(Args, Debug, Clone, Default)]
pub struct CalcOptions {
    /// Use this QPS directly instead of the scenario formula
    #[arg(long)]
    pub direct_qps: Option<f64>,
    #[command(flatten)]
    pub overrides: OverrideArgs,
    /// Fill omitted parameters with the scenario's example values
    #[arg(long)]
    pub fill_defaults: bool,
    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    pub format: String,
    /// Save the input and result to the state database
    #[arg(long)]
    pub save: bool,
}

/// Per-run coefficient replacements.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OverrideArgs {
    #[arg(long)]
    pub xap_lss: Option<f64>,
    #[arg(long)]
    pub lss_cso: Option<f64>,
    #[arg(long)]
    pub cso_store: Option<f64>,
    #[arg(long)]
    pub cpu_xap: Option<f64>,
    #[arg(long)]
    pub cpu_lss: Option<f64>,
    #[arg(long)]
    pub cpu_cso: Option<f64>,
    #[arg(long)]
    pub cpu_store: Option<f64>,
}

impl From<OverrideArgs> for CoefficientOverrides {
    fn from(args: OverrideArgs) -> Self {
        CoefficientOverrides {
            xap_lss: args.xap_lss,
            lss_cso: args.lss_cso,
            cso_store: args.cso_store,
            cpu_xap: args.cpu_xap,
            cpu_lss: args.cpu_lss,
            cpu_cso: args.cpu_cso,
            cpu_store: args.cpu_store,
        }
    }
}

pub fn calc(ctx: &Context, params: ScenarioParameters, options: &CalcOptions) -> anyhow::Result<()> {
    let (input, result) = run(ctx, params, options)?;

    match options.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("{}", report::format_result(&input, &result));
        }
    }

    Ok(())
}

/// Build the input, calculate, and save when asked.
pub fn run(
    ctx: &Context,
    params: ScenarioParameters,
    options: &CalcOptions,
) -> anyhow::Result<(CalculationInput, CalculationResult)> {
    let kind = params.kind();
    let params = if options.fill_defaults {
        params.fill_missing_from(&ScenarioParameters::defaults_for(kind))
    } else {
        params
    };

    let overrides = CoefficientOverrides::from(options.overrides);
    if !overrides.is_empty() {
        debug!(?overrides, "applying coefficient overrides");
    }
    let coefficients = overrides.apply_to(ctx.coefficients());
    let input = CalculationInput::new(params, coefficients);

    let result = capcalc_engine::calculate(&input)
        .with_context(|| format!("{} calculation failed", kind.label()))?;

    if options.save {
        let store = ctx.open_state()?;
        store.put_scenario(&input)?;
        store.put_result(kind, &result)?;
        info!(scenario = %kind, "calculation saved");
    }

    Ok((input, result))
}
