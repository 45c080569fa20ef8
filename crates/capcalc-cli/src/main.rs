use std::path::PathBuf;

use capcalc_core::{
    FanoutProfile, InorganicGrowthParams, OfflineAbParams, OnlineAbDeltaParams,
    ScenarioParameters, ShadowAbParams,
};
use clap::{Parser, Subcommand};

mod commands;
mod report;

use commands::calc::CalcOptions;
use commands::Context;

#[derive(Parser)]
#[command(
    name = "capcalc",
    about = "capcalc — scenario-driven CPU core capacity calculator",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Performance config (TOML, or JSON with a .json extension).
    /// Defaults to ./capcalc.toml when present, else built-in coefficients.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use the config's peak fan-out instead of typical
    #[arg(long, global = true)]
    peak: bool,
    /// State database for saved scenarios
    #[arg(long, global = true, default_value = "capcalc.redb")]
    state: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate per-tier load and CPU cores for a scenario
    Calc {
        #[command(subcommand)]
        scenario: ScenarioCommand,
    },
    /// Show the coefficients a calculation would use
    Coefficients {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Size VMs and monthly spend for a core requirement
    Cost {
        /// Required CPU cores
        #[arg(long)]
        cores: f64,
        /// Only estimate this VM type
        #[arg(long)]
        vm_type: Option<String>,
        /// Target CPU utilization in (0, 1]
        #[arg(long)]
        utilization: Option<f64>,
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Inspect or reset saved scenarios
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Export saved scenarios as a JSON snapshot
    Export {
        /// Output file (default: capcalc-data-<date>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a JSON snapshot into the state database
    Import {
        path: PathBuf,
        /// replace: discard saved scenarios first; merge: only add missing kinds
        #[arg(long, default_value = "replace")]
        mode: String,
    },
    /// Write a capcalc.toml with the built-in coefficients
    Init {
        #[arg(short, long, default_value = ".")]
        path: String,
    },
}

#[derive(Subcommand)]
enum ScenarioCommand {
    /// Offline A/B testing: monthly query volume replayed during work hours
    OfflineAb {
        #[arg(long)]
        queries_per_month: Option<f64>,
        #[arg(long)]
        workdays_per_month: Option<f64>,
        #[arg(long)]
        active_hours_per_day: Option<f64>,
        #[command(flatten)]
        options: CalcOptions,
    },
    /// Shadow A/B testing: live traffic forked to shadow stacks
    ShadowAb {
        #[arg(long)]
        live_baseline_qps: Option<f64>,
        /// Percentage of live traffic forked (0-100)
        #[arg(long)]
        fork_percent: Option<f64>,
        #[arg(long)]
        fork_count: Option<f64>,
        #[command(flatten)]
        options: CalcOptions,
    },
    /// Online A/B testing: per-user uplift in the treatment group
    OnlineAbDelta {
        #[arg(long)]
        live_baseline_qps: Option<f64>,
        /// Fraction of users in treatment (0-1)
        #[arg(long)]
        treatment_share: Option<f64>,
        /// Per-user QPS uplift as a fraction (0-1)
        #[arg(long)]
        delta_factor: Option<f64>,
        #[command(flatten)]
        options: CalcOptions,
    },
    /// Inorganic growth: new users from an acquisition or launch
    InorganicGrowth {
        #[arg(long)]
        delta_mau: Option<f64>,
        #[arg(long)]
        dau_mau_ratio: Option<f64>,
        /// Queries per DAU per day
        #[arg(long)]
        qpd: Option<f64>,
        #[arg(long)]
        realization_factor: Option<f64>,
        /// Peak concurrency factor
        #[arg(long)]
        pcf: Option<f64>,
        #[command(flatten)]
        options: CalcOptions,
    },
}

impl ScenarioCommand {
    fn into_parts(self) -> (ScenarioParameters, CalcOptions) {
        match self {
            ScenarioCommand::OfflineAb {
                queries_per_month,
                workdays_per_month,
                active_hours_per_day,
                options,
            } => (
                ScenarioParameters::OfflineAb(OfflineAbParams {
                    queries_per_month,
                    workdays_per_month,
                    active_hours_per_day,
                    direct_qps: options.direct_qps,
                }),
                options,
            ),
            ScenarioCommand::ShadowAb {
                live_baseline_qps,
                fork_percent,
                fork_count,
                options,
            } => (
                ScenarioParameters::ShadowAb(ShadowAbParams {
                    live_baseline_qps,
                    fork_percent,
                    fork_count,
                    direct_qps: options.direct_qps,
                }),
                options,
            ),
            ScenarioCommand::OnlineAbDelta {
                live_baseline_qps,
                treatment_share,
                delta_factor,
                options,
            } => (
                ScenarioParameters::OnlineAbDelta(OnlineAbDeltaParams {
                    live_baseline_qps,
                    treatment_share,
                    delta_factor,
                    direct_qps: options.direct_qps,
                }),
                options,
            ),
            ScenarioCommand::InorganicGrowth {
                delta_mau,
                dau_mau_ratio,
                qpd,
                realization_factor,
                pcf,
                options,
            } => (
                ScenarioParameters::InorganicGrowth(InorganicGrowthParams {
                    delta_mau,
                    dau_mau_ratio,
                    qpd,
                    realization_factor,
                    pcf,
                    direct_qps: options.direct_qps,
                }),
                options,
            ),
        }
    }
}

#[derive(Subcommand)]
enum StateAction {
    /// List saved scenarios and their last results
    Show,
    /// Delete every saved scenario and result
    Clear,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("capcalc=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let ctx = Context {
        config: cli.config,
        profile: if cli.peak {
            FanoutProfile::Peak
        } else {
            FanoutProfile::Typical
        },
        state: cli.state,
    };

    match cli.command {
        Commands::Calc { scenario } => {
            let (params, options) = scenario.into_parts();
            commands::calc::calc(&ctx, params, &options)
        }
        Commands::Coefficients { format } => {
            commands::coefficients::show(&ctx, &format)
        }
        Commands::Cost { cores, vm_type, utilization, format } => {
            commands::cost::cost(&ctx, cores, vm_type.as_deref(), utilization, &format)
        }
        Commands::State { action } => match action {
            StateAction::Show => commands::state::show(&ctx),
            StateAction::Clear => commands::state::clear(&ctx),
        },
        Commands::Export { output } => {
            commands::snapshot::export(&ctx, output.as_deref())
        }
        Commands::Import { path, mode } => {
            commands::snapshot::import(&ctx, &path, &mode)
        }
        Commands::Init { path } => {
            commands::init::init(&path)
        }
    }
}
