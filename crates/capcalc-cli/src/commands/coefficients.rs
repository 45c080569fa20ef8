use tracing::warn;

use super::Context;
use crate::report;

pub fn show(ctx: &Context, format: &str) -> anyhow::Result<()> {
    let source = ctx.coefficient_source();
    let coefficients = ctx.coefficients();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&coefficients)?);
        }
        _ => {
            println!("{}", report::format_coefficients(&coefficients, &source.describe()));
            // The resolver has already warned and fallen back when the config is broken.
            match ctx.load_config() {
                Ok(Some(config)) => println!("{}", report::format_config(&config)),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "config details unavailable"),
            }
        }
    }

    Ok(())
}
