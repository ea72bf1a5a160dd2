//! Mode ensurer, sync engine, and run orchestration.
//!
//! The engine diffs a [`CanonicalTheme`] against a variable collection and
//! applies the minimal create/update set. Runs are at-least-once, not
//! transactional: a failure partway leaves earlier writes in place and the
//! summary reflects exactly what was attempted.

use crate::cache::CollectionCache;
use crate::color::{normalize_hex, slugify};
use crate::error::{Result, SyncError};
use crate::host::{CollectionId, ModeHandle, VariableId, VariableStore};
use crate::resolver::{find_collection, get_or_create_collection};
use crate::summary::SyncSummary;
use crate::theme::{parse_theme, CanonicalTheme, ModeSlug};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Token subset selector exposed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SubsetFilter {
    /// Every token in the export
    #[default]
    All,
    /// Curated system tokens only
    Sys,
}

/// Substrings that qualify a token for the `sys` subset (besides the
/// `on-` prefix).
const SYS_SUBSTRINGS: [&str; 9] = [
    "surface",
    "primary",
    "secondary",
    "tertiary",
    "error",
    "outline",
    "inverse",
    "shadow",
    "scrim",
];

fn in_sys_subset(token: &str) -> bool {
    token.starts_with("on-") || SYS_SUBSTRINGS.iter().any(|s| token.contains(s))
}

/// Default collection name when the caller does not specify one.
pub const DEFAULT_COLLECTION_NAME: &str = "Colors";

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub collection_name: String,
    pub prefix: String,
    pub dry_run: bool,
    pub subset: SubsetFilter,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            prefix: String::new(),
            dry_run: true,
            subset: SubsetFilter::All,
        }
    }
}

pub type ModeMap = BTreeMap<ModeSlug, ModeHandle>;

/// Placeholder handle used in dry-run for a mode that would be created.
/// Reads against it report unset, which is exactly what a fresh mode holds.
fn pending_mode_handle(mode: ModeSlug) -> ModeHandle {
    ModeHandle {
        id: crate::host::ModeId(format!("pending-{mode}")),
        name: mode.as_str().to_string(),
        slug: Some(mode.as_str().to_string()),
    }
}

/// Guarantee every canonical mode slug exists in the collection, creating
/// the missing ones (in dry-run, missing modes get placeholder handles and
/// only the counter moves). Must run to completion before any per-mode
/// variable operation; a creation failure aborts the run with the partial
/// summary preserved for diagnostics.
pub async fn ensure_modes(
    store: &dyn VariableStore,
    collection: &CollectionId,
    dry_run: bool,
    summary: &mut SyncSummary,
) -> Result<ModeMap> {
    let mut map = ModeMap::new();

    for handle in store.list_modes(collection).await? {
        let slug = slugify(handle.slug.as_deref().unwrap_or(&handle.name));
        if let Some(mode) = ModeSlug::from_slug(&slug) {
            map.insert(mode, handle);
            summary.modes.existing += 1;
        }
    }

    for mode in ModeSlug::ALL {
        if !map.contains_key(&mode) {
            let handle = if dry_run {
                pending_mode_handle(mode)
            } else {
                store.create_mode(collection, mode.as_str()).await?
            };
            map.insert(mode, handle);
            summary.modes.created += 1;
        }
    }

    debug!(
        existing = summary.modes.existing,
        created = summary.modes.created,
        "ensured modes"
    );
    Ok(map)
}

/// Resolve a variable by exact name, creating it outside dry-run. Returns
/// `(variable, created)`; in dry-run a missing variable is never actually
/// created and `None` is returned alongside `created = true`.
async fn get_or_create_color_variable(
    store: &dyn VariableStore,
    collection: &CollectionId,
    name: &str,
    initial_value: &str,
    dry_run: bool,
) -> Result<(Option<VariableId>, bool)> {
    if let Some(existing) = store.variable_by_name(collection, name).await? {
        return Ok((Some(existing), false));
    }
    if dry_run {
        return Ok((None, true));
    }
    let created = store
        .create_color_variable(collection, name, &normalize_hex(initial_value))
        .await?;
    Ok((Some(created), true))
}

/// Diff the canonical theme against the collection and apply (or, in
/// dry-run, report) the create/update set.
#[instrument(name = "sync_colors", skip_all, fields(collection = %collection, dry_run = options.dry_run))]
pub async fn sync_colors(
    store: &dyn VariableStore,
    collection: &CollectionId,
    theme: &CanonicalTheme,
    options: &SyncOptions,
    summary: &mut SyncSummary,
) -> Result<()> {
    let mode_map = ensure_modes(store, collection, options.dry_run, summary).await?;

    // Union of token names across all modes, filtered by subset
    let mut names = theme.token_names();
    if options.subset == SubsetFilter::Sys {
        names.retain(|n| in_sys_subset(n));
    }

    for base_name in &names {
        let name = format!("{}{}", options.prefix, base_name);
        let seed_value = ModeSlug::ALL
            .iter()
            .find_map(|m| theme.get(*m, base_name).filter(|hex| !hex.is_empty()))
            .unwrap_or("#000000");

        let (variable, created) =
            get_or_create_color_variable(store, collection, &name, seed_value, options.dry_run)
                .await?;
        if created {
            if options.dry_run {
                summary.log(format!("+ create variable {name}"));
            } else {
                summary.log(format!("+ created variable {name}"));
            }
            summary.variables.created += 1;
        }

        let Some(variable) = variable else {
            // Dry-run pending create: report per-mode values without
            // touching the host
            for mode in ModeSlug::ALL {
                match theme.get(mode, base_name) {
                    None | Some("") => {
                        summary.warn(format!("Missing {base_name} in mode {mode}; skipped"));
                        summary.variables.skipped += 1;
                    }
                    Some(hex) => {
                        summary.log(format!(
                            "~ set {name} [{mode}] = {} (pending create)",
                            normalize_hex(hex)
                        ));
                    }
                }
            }
            continue;
        };

        // Update per mode
        for mode in ModeSlug::ALL {
            let hex = match theme.get(mode, base_name) {
                None | Some("") => {
                    summary.warn(format!("Missing {base_name} in mode {mode}; skipped"));
                    summary.variables.skipped += 1;
                    continue;
                }
                Some(hex) => hex,
            };
            let target = normalize_hex(hex);
            let mode_handle = &mode_map[&mode];
            let current = store.get_value(&variable, &mode_handle.id).await?;

            if current
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(&target))
            {
                summary.variables.unchanged += 1;
                continue;
            }

            if options.dry_run {
                summary.log(format!(
                    "~ update {name} [{mode}]: {} -> {target}",
                    current.as_deref().unwrap_or("(unset)")
                ));
                summary.variables.updated += 1;
            } else {
                store.set_value(&variable, &mode_handle.id, &target).await?;
                summary.log(format!("✓ set {name} [{mode}] = {target}"));
                summary.variables.updated += 1;
            }
        }
    }

    info!(
        variables = names.len(),
        created = summary.variables.created,
        updated = summary.variables.updated,
        unchanged = summary.variables.unchanged,
        skipped = summary.variables.skipped,
        "sync pass complete"
    );
    Ok(())
}

/// Full run: parse, resolve the collection, sync. Errors never escape; they
/// are appended to the summary log, which is always returned.
///
/// Without a store the run degrades to a read-only simulation that only
/// reports token/mode counts.
pub async fn run_sync(
    store: Option<&dyn VariableStore>,
    cache: &mut CollectionCache,
    json: &Value,
    options: &SyncOptions,
) -> SyncSummary {
    let mut summary = SyncSummary::new();

    let theme = match parse_theme(json) {
        Ok(theme) => theme,
        Err(e) => {
            summary.log(format!("Error: {e}"));
            return summary;
        }
    };

    let Some(store) = store else {
        summary.log(format!("{} Showing dry-run diff only.", SyncError::HostUnavailable));
        summary.log(format!(
            "Would process {} variables across {} modes.",
            theme.token_names().len(),
            ModeSlug::ALL.len()
        ));
        return summary;
    };

    let collection = if options.dry_run {
        match find_collection(store, cache, &options.collection_name).await {
            Ok(Some(collection)) => collection,
            Ok(None) => {
                // Nothing exists yet; a dry-run must not create the
                // collection, so preview everything as pending instead
                preview_fresh_collection(&theme, options, &mut summary);
                return summary;
            }
            Err(e) => {
                summary.log(format!("Error: {e}"));
                return summary;
            }
        }
    } else {
        match get_or_create_collection(store, cache, &options.collection_name).await {
            Ok(collection) => collection,
            Err(e) => {
                summary.log(format!("Error: {e}"));
                return summary;
            }
        }
    };

    if let Err(e) = sync_colors(store, &collection, &theme, options, &mut summary).await {
        summary.log(format!("Error: {e}"));
    }
    summary
}

/// Dry-run preview when the target collection does not exist at all: the
/// whole diff is creates, reported without a single host call.
fn preview_fresh_collection(
    theme: &CanonicalTheme,
    options: &SyncOptions,
    summary: &mut SyncSummary,
) {
    summary.log(format!(
        "+ create collection {}",
        options.collection_name
    ));
    summary.modes.created += ModeSlug::ALL.len() as u32;

    let mut names = theme.token_names();
    if options.subset == SubsetFilter::Sys {
        names.retain(|n| in_sys_subset(n));
    }

    for base_name in &names {
        let name = format!("{}{}", options.prefix, base_name);
        summary.log(format!("+ create variable {name}"));
        summary.variables.created += 1;

        for mode in ModeSlug::ALL {
            match theme.get(mode, base_name) {
                None | Some("") => {
                    summary.warn(format!("Missing {base_name} in mode {mode}; skipped"));
                    summary.variables.skipped += 1;
                }
                Some(hex) => {
                    summary.log(format!(
                        "~ set {name} [{mode}] = {} (pending create)",
                        normalize_hex(hex)
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
