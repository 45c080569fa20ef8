use std::path::{Path, PathBuf};

use capcalc_state::snapshot::default_file_name;
use capcalc_state::{MergeOutcome, MergeStrategy, Snapshot};
use chrono::Utc;

use super::Context;

pub fn export(ctx: &Context, output: Option<&Path>) -> anyhow::Result<()> {
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_file_name(Utc::now())));
    let snapshot = export_to(ctx, &path)?;

    print!("{}", snapshot.summary());
    println!("✓ Exported {}", path.display());
    Ok(())
}

pub fn export_to(ctx: &Context, path: &Path) -> anyhow::Result<Snapshot> {
    let store = ctx.open_state()?;
    let snapshot = Snapshot::from_store(&store)?;
    std::fs::write(path, snapshot.to_json_pretty()?)?;
    Ok(snapshot)
}

pub fn import(ctx: &Context, path: &Path, mode: &str) -> anyhow::Result<()> {
    let outcome = import_from(ctx, path, parse_mode(mode)?)?;
    println!(
        "✓ Imported {} ({} scenarios saved)",
        path.display(),
        outcome.scenarios.len()
    );
    Ok(())
}

pub fn import_from(
    ctx: &Context,
    path: &Path,
    strategy: MergeStrategy,
) -> anyhow::Result<MergeOutcome> {
    let content = std::fs::read_to_string(path)?;
    let snapshot = Snapshot::from_json_str(&content)?;
    let store = ctx.open_state()?;
    Ok(snapshot.apply_to_store(&store, strategy)?)
}

fn parse_mode(mode: &str) -> anyhow::Result<MergeStrategy> {
    match mode {
        "replace" => Ok(MergeStrategy::Replace),
        "merge" => Ok(MergeStrategy::Merge),
        other => anyhow::bail!("unknown import mode '{other}' (expected replace or merge)"),
    }
}
