use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use theme_sync::cache::CollectionCache;
use theme_sync::error::SyncError;
use theme_sync::host::{InMemoryStore, VariableStore};
use theme_sync::logging;
use theme_sync::summary::SyncSummary;
use theme_sync::sync::{run_sync, SubsetFilter, SyncOptions, DEFAULT_COLLECTION_NAME};

/// Sync a color-theme export into a variable collection.
///
/// Runs as a dry-run by default; pass --commit to apply changes.
#[derive(Parser, Debug)]
#[command(name = "theme-sync", version)]
struct Cli {
    /// Path to the theme export JSON (e.g. theme.full.mtb.json)
    theme: PathBuf,

    /// Variable store file; omit to simulate without a host
    #[arg(long)]
    store: Option<PathBuf>,

    /// Target collection name
    #[arg(long, default_value = DEFAULT_COLLECTION_NAME)]
    collection: String,

    /// Prefix prepended to every variable name
    #[arg(long, default_value = "")]
    prefix: String,

    /// Token subset to sync
    #[arg(long, value_enum, default_value_t = SubsetFilter::All)]
    subset: SubsetFilter,

    /// Apply changes instead of previewing them
    #[arg(long)]
    commit: bool,

    /// Emit the summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn print_summary(summary: &SyncSummary, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _guard = logging::init();
    let cli = Cli::parse();

    let options = SyncOptions {
        collection_name: cli.collection.clone(),
        prefix: cli.prefix.clone(),
        dry_run: !cli.commit,
        subset: cli.subset,
    };

    let text = std::fs::read_to_string(&cli.theme)
        .with_context(|| format!("Failed to read theme file: {}", cli.theme.display()))?;
    let json: Value = match serde_json::from_str(&text) {
        Ok(json) => json,
        Err(e) => {
            // Decode failures get the same treatment as parse failures:
            // reported through the summary, host never touched
            let mut summary = SyncSummary::new();
            summary.log(format!(
                "Error: {}",
                SyncError::InvalidInput(format!("failed to decode JSON: {e}"))
            ));
            print_summary(&summary, cli.json)?;
            std::process::exit(1);
        }
    };

    let store = match &cli.store {
        Some(path) => Some(InMemoryStore::load(path)?),
        None => None,
    };
    let mut cache = CollectionCache::load_default();

    let summary = run_sync(
        store.as_ref().map(|s| s as &dyn VariableStore),
        &mut cache,
        &json,
        &options,
    )
    .await;

    // Dry-run never persists the store file
    if cli.commit {
        if let (Some(store), Some(path)) = (&store, &cli.store) {
            store.save(path)?;
            info!(path = %path.display(), "store file updated");
        }
    }

    print_summary(&summary, cli.json)?;
    Ok(())
}
