//! Adds a `shinyImage` link next to every generated `image` link in
//! `./data/pokemonsList.js`. Takes no arguments; rewrites the file in place.

use anyhow::Context;
use pokemon_service::migration::{migrate_file, DATA_FILE};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let migration = migrate_file(Path::new(DATA_FILE))
        .with_context(|| format!("shinyImage migration of {} failed", DATA_FILE))?;

    println!(
        "✅ All pokemon entries updated with shinyImage field! ({} updated, {} skipped)",
        migration.updated, migration.skipped
    );

    Ok(())
}
