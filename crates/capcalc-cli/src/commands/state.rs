use capcalc_state::Snapshot;
use chrono::{DateTime, Utc};

use super::Context;

pub fn show(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_state()?;
    let info = store.info()?;

    println!("State: {} (schema {})", ctx.state.display(), info.schema_version);
    if !info.has_data {
        println!("No saved scenarios.");
        return Ok(());
    }
    if let Some(updated) = info.updated_at.and_then(|s| DateTime::<Utc>::from_timestamp(s as i64, 0)) {
        println!("Updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    print!("{}", Snapshot::from_store(&store)?.summary());

    Ok(())
}

pub fn clear(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_state()?;
    store.clear()?;
    println!("✓ Cleared saved scenarios in {}", ctx.state.display());
    Ok(())
}
