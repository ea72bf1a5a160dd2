//! Collection resolution: locate the target variable collection by name,
//! creating it when nothing matches.
//!
//! Strategies in priority order, first success wins:
//! 1. exact-name lookup, when the host advertises it;
//! 2. cached id from a previous run, resolved by id lookup;
//! 3. enumerate everything and compare fetched display names;
//! 4. create a new collection.
//!
//! Failures in steps 2-3 are swallowed and resolution falls through to the
//! next strategy; cache writes are best-effort throughout.

use crate::cache::CollectionCache;
use crate::error::{Result, ResultExt};
use crate::host::{CollectionId, VariableStore};
use tracing::{debug, info, instrument};

/// Strategies 1-3 only: locate an existing collection without creating
/// anything. Used directly by dry-run, which must stay read-only.
#[instrument(name = "find_collection", skip(store, cache))]
pub async fn find_collection(
    store: &dyn VariableStore,
    cache: &mut CollectionCache,
    name: &str,
) -> Result<Option<CollectionId>> {
    let caps = store.capabilities();

    // 1) Official by-name lookup if available
    if caps.lookup_by_name {
        if let Some(id) = store.collection_by_name(name).await? {
            debug!(%id, "resolved collection by name");
            return Ok(Some(id));
        }
    }

    // 2) Cached id from previous runs
    if caps.lookup_by_id {
        if let Some(cached) = cache.get(name) {
            if let Some(id) = store
                .collection_by_id(&cached)
                .await
                .warn_on_err()
                .flatten()
            {
                debug!(%id, "resolved collection from cached id");
                return Ok(Some(id));
            }
        }
    }

    // 3) Scan all collections and compare names
    if let Some(all) = store.list_collections().await.warn_on_err() {
        for id in all {
            let Some(display_name) = store.collection_name(&id).await.warn_on_err() else {
                continue;
            };
            if display_name.trim() == name {
                cache.insert(name, &id);
                cache.save().warn_on_err();
                debug!(%id, "resolved collection by scan");
                return Ok(Some(id));
            }
        }
    }

    Ok(None)
}

#[instrument(name = "resolve_collection", skip(store, cache))]
pub async fn get_or_create_collection(
    store: &dyn VariableStore,
    cache: &mut CollectionCache,
    name: &str,
) -> Result<CollectionId> {
    if let Some(id) = find_collection(store, cache, name).await? {
        return Ok(id);
    }

    // 4) Create
    let created = store.create_collection(name).await?;
    cache.insert(name, &created);
    cache.save().warn_on_err();
    info!(id = %created, name, "created variable collection");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Capabilities, InMemoryStore};

    #[tokio::test]
    async fn test_resolves_existing_collection_by_name() {
        let store = InMemoryStore::new();
        let existing = store.create_collection("Colors").await.unwrap();

        let mut cache = CollectionCache::ephemeral();
        let resolved = get_or_create_collection(&store, &mut cache, "Colors")
            .await
            .unwrap();
        assert_eq!(resolved, existing);
    }

    #[tokio::test]
    async fn test_creates_when_absent_and_caches_id() {
        let store = InMemoryStore::new();
        let mut cache = CollectionCache::ephemeral();

        let created = get_or_create_collection(&store, &mut cache, "Colors")
            .await
            .unwrap();
        assert_eq!(cache.get("Colors"), Some(created.clone()));

        // A second resolution finds the same collection instead of
        // creating another one
        let resolved = get_or_create_collection(&store, &mut cache, "Colors")
            .await
            .unwrap();
        assert_eq!(resolved, created);
        assert_eq!(store.list_collections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_cached_id_without_name_lookup() {
        let store = InMemoryStore::with_capabilities(Capabilities {
            lookup_by_name: false,
            lookup_by_id: true,
        });
        let existing = store.create_collection("Colors").await.unwrap();

        let mut cache = CollectionCache::ephemeral();
        cache.insert("Colors", &existing);

        let resolved = get_or_create_collection(&store, &mut cache, "Colors")
            .await
            .unwrap();
        assert_eq!(resolved, existing);
    }

    #[tokio::test]
    async fn test_stale_cached_id_falls_through_to_scan() {
        let store = InMemoryStore::new();
        let existing = store.create_collection(" Colors ").await.unwrap();

        let mut cache = CollectionCache::ephemeral();
        cache.insert("Colors", &CollectionId("col-stale".into()));

        // Name lookup misses (stored name has padding), cached id is stale,
        // the scan compares trimmed names and still finds it
        let resolved = get_or_create_collection(&store, &mut cache, "Colors")
            .await
            .unwrap();
        assert_eq!(resolved, existing);
        assert_eq!(cache.get("Colors"), Some(existing));
    }

    #[tokio::test]
    async fn test_no_optional_capabilities_degrades_to_scan() {
        let store = InMemoryStore::with_capabilities(Capabilities {
            lookup_by_name: false,
            lookup_by_id: false,
        });
        let existing = store.create_collection("Colors").await.unwrap();

        let mut cache = CollectionCache::ephemeral();
        let resolved = get_or_create_collection(&store, &mut cache, "Colors")
            .await
            .unwrap();
        assert_eq!(resolved, existing);
    }
}
