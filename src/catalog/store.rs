//! Catalog store: loading, validation, caching and merging
//!
//! The store owns the in-memory [`Catalog`] and the derived merged extension
//! index. Reloads build a complete replacement first and swap it in only
//! after the new document has been read, parsed and validated, so a bad
//! reload never corrupts a good catalog.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use super::error::{CatalogError, CatalogResult};
use super::schema::{Catalog, CatalogFunction};

/// Preferred and fallback catalog locations
#[derive(Debug, Clone)]
struct CatalogPaths {
    preferred: PathBuf,
    fallback: Option<PathBuf>,
}

impl CatalogPaths {
    /// Attempt the preferred path; fall back when it is missing and the
    /// fallback exists.
    fn resolve(&self) -> CatalogResult<PathBuf> {
        if self.preferred.exists() {
            return Ok(self.preferred.clone());
        }
        match &self.fallback {
            Some(fallback) if fallback.exists() => {
                debug!(
                    "Catalog {} not found, using fallback {}",
                    self.preferred.display(),
                    fallback.display()
                );
                Ok(fallback.clone())
            }
            _ => Err(CatalogError::CatalogFileNotFound { path: self.preferred.clone() }),
        }
    }
}

/// A successfully loaded catalog together with its lazily merged view
#[derive(Debug)]
struct LoadedCatalog {
    source: PathBuf,
    catalog: Arc<Catalog>,
    /// Computed on first access, dropped together with the catalog on reload
    merged: OnceCell<Arc<[CatalogFunction]>>,
}

/// Loads, validates, caches and merges the function catalog.
#[derive(Debug, Default)]
pub struct CatalogStore {
    paths: Option<CatalogPaths>,
    loaded: Option<LoadedCatalog>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record both paths and perform the first load.
    ///
    /// An empty `preferred` path degrades to `fallback`. The paths are kept
    /// even when the load fails, so a later [`CatalogStore::reload`] can retry.
    pub fn initialize(&mut self, preferred: impl AsRef<Path>, fallback: impl AsRef<Path>) -> CatalogResult<()> {
        let fallback = non_empty(fallback.as_ref());
        let preferred = non_empty(preferred.as_ref())
            .or_else(|| fallback.clone())
            .unwrap_or_default();

        self.paths = Some(CatalogPaths { preferred, fallback });
        self.reload(None)
    }

    /// Reload the catalog, optionally switching the preferred path first.
    ///
    /// An empty `new_path` degrades to the fallback path. On any failure the
    /// previously loaded catalog and its merged cache are left untouched.
    pub fn reload(&mut self, new_path: Option<&Path>) -> CatalogResult<()> {
        let paths = self.paths.as_mut().ok_or(CatalogError::NotInitialized)?;

        if let Some(new_path) = new_path {
            paths.preferred = non_empty(new_path)
                .or_else(|| paths.fallback.clone())
                .unwrap_or_default();
        }

        let target = paths.resolve()?;
        let raw = fs::read_to_string(&target).map_err(|source| CatalogError::Read {
            path: target.clone(),
            source,
        })?;
        let catalog = Catalog::from_json_str(&raw).map_err(|reason| CatalogError::InvalidCatalogSchema {
            path: target.clone(),
            reason,
        })?;

        info!(
            "Loaded catalog from {} (generated {}, {} system functions, {} host types)",
            target.display(),
            catalog.generated_at,
            catalog.system.len(),
            catalog.extensions.len()
        );

        self.loaded = Some(LoadedCatalog {
            source: target,
            catalog: Arc::new(catalog),
            merged: OnceCell::new(),
        });
        Ok(())
    }

    /// True iff at least one load or reload has succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Path of the file the current catalog was read from
    pub fn source_path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|loaded| loaded.source.as_path())
    }

    fn loaded(&self) -> CatalogResult<&LoadedCatalog> {
        if self.paths.is_none() {
            return Err(CatalogError::NotInitialized);
        }
        self.loaded.as_ref().ok_or(CatalogError::NotLoaded)
    }

    /// Shared handle to the current catalog
    pub fn catalog(&self) -> CatalogResult<Arc<Catalog>> {
        Ok(Arc::clone(&self.loaded()?.catalog))
    }

    pub fn system_functions(&self) -> CatalogResult<&[CatalogFunction]> {
        Ok(&self.loaded()?.catalog.system)
    }

    pub fn extension_functions(&self) -> CatalogResult<&IndexMap<String, Vec<CatalogFunction>>> {
        Ok(&self.loaded()?.catalog.extensions)
    }

    /// Extension functions for one host type; empty for an unknown host.
    pub fn extensions_for_host(&self, host_type: &str) -> CatalogResult<&[CatalogFunction]> {
        Ok(self
            .extension_functions()?
            .get(host_type)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// One entry per `(namespace, name)` across all host types.
    ///
    /// `params` is the sorted union of every contributing declaration, and
    /// `is_async` / `primary_sync` are OR-ed. Computed once per loaded catalog.
    pub fn merged_extension_functions(&self) -> CatalogResult<Arc<[CatalogFunction]>> {
        let loaded = self.loaded()?;
        let merged = loaded.merged.get_or_init(|| {
            let merged = merge_extensions(&loaded.catalog.extensions);
            debug!("Merged extension index built with {} functions", merged.len());
            merged.into()
        });
        Ok(Arc::clone(merged))
    }

    /// Distinct non-null namespaces across system and extension functions, sorted
    pub fn namespaces(&self) -> CatalogResult<Vec<String>> {
        let catalog = &self.loaded()?.catalog;
        let namespaces: BTreeSet<&str> = catalog
            .system
            .iter()
            .chain(catalog.extensions.values().flatten())
            .filter_map(|function| function.namespace.as_deref())
            .collect();
        Ok(namespaces.into_iter().map(str::to_string).collect())
    }
}

fn non_empty(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path.to_path_buf())
    }
}

/// Merge the per-host lists, keeping first-seen order.
pub(crate) fn merge_extensions(extensions: &IndexMap<String, Vec<CatalogFunction>>) -> Vec<CatalogFunction> {
    let mut by_key: IndexMap<(Option<&str>, &str), CatalogFunction> = IndexMap::new();

    for function in extensions.values().flatten() {
        let key = (function.namespace.as_deref(), function.name.as_str());
        by_key
            .entry(key)
            .and_modify(|existing| {
                existing.params.extend_from_slice(&function.params);
                existing.params.sort_unstable();
                existing.params.dedup();
                existing.is_async |= function.is_async;
                existing.primary_sync |= function.primary_sync;
            })
            .or_insert_with(|| function.clone());
    }

    by_key.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, namespace: Option<&str>, params: &[u32], is_async: bool, primary_sync: bool) -> CatalogFunction {
        CatalogFunction {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            params: params.to_vec(),
            is_async,
            primary_sync,
        }
    }

    #[test]
    fn test_merge_unions_params_and_ors_flags() {
        let mut extensions = IndexMap::new();
        extensions.insert("Player".to_string(), vec![function("send", None, &[1, 3], false, true)]);
        extensions.insert("Console".to_string(), vec![function("send", None, &[2], true, false)]);

        let merged = merge_extensions(&extensions);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].params, vec![1, 2, 3]);
        assert!(merged[0].is_async);
        assert!(merged[0].primary_sync);
    }

    #[test]
    fn test_merge_keeps_namespaces_apart() {
        let mut extensions = IndexMap::new();
        extensions.insert(
            "Player".to_string(),
            vec![function("get", None, &[0], false, false), function("get", Some("http"), &[1], false, false)],
        );
        extensions.insert("World".to_string(), vec![function("get", Some("http"), &[2], false, false)]);

        let merged = merge_extensions(&extensions);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].namespace, None);
        assert_eq!(merged[0].params, vec![0]);
        assert_eq!(merged[1].namespace.as_deref(), Some("http"));
        assert_eq!(merged[1].params, vec![1, 2]);
    }

    #[test]
    fn test_accessors_before_initialize() {
        let store = CatalogStore::new();
        assert!(matches!(store.system_functions(), Err(CatalogError::NotInitialized)));
        assert!(matches!(store.merged_extension_functions(), Err(CatalogError::NotInitialized)));
        assert!(!store.is_loaded());

        let mut store = CatalogStore::new();
        assert!(matches!(store.reload(None), Err(CatalogError::NotInitialized)));
    }

    #[test]
    fn test_missing_files_leave_store_unloaded() {
        let mut store = CatalogStore::new();
        let result = store.initialize("/nonexistent/fluxon/a.json", "/nonexistent/fluxon/b.json");
        assert!(matches!(result, Err(CatalogError::CatalogFileNotFound { .. })));
        assert!(matches!(store.system_functions(), Err(CatalogError::NotLoaded)));
    }

    #[test]
    fn test_merge_is_union_per_key() {
        use quickcheck::QuickCheck;
        use std::collections::{BTreeMap, BTreeSet};

        fn prop(hosts: Vec<Vec<(u8, Vec<u8>)>>) -> bool {
            let mut extensions: IndexMap<String, Vec<CatalogFunction>> = IndexMap::new();
            for (i, entries) in hosts.iter().enumerate() {
                let functions = entries
                    .iter()
                    .map(|(name, params)| {
                        let mut params: Vec<u32> = params.iter().map(|p| u32::from(*p % 8)).collect();
                        params.sort_unstable();
                        params.dedup();
                        function(&format!("f{}", name % 4), None, &params, false, false)
                    })
                    .collect();
                extensions.insert(format!("Host{}", i), functions);
            }

            let mut expected: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
            for function in extensions.values().flatten() {
                expected.entry(function.name.clone()).or_default().extend(function.params.iter().copied());
            }

            let merged = merge_extensions(&extensions);
            merged.len() == expected.len()
                && merged.iter().all(|function| {
                    let union: Vec<u32> = expected[&function.name].iter().copied().collect();
                    function.params == union
                })
        }

        QuickCheck::new().tests(200).quickcheck(prop as fn(Vec<Vec<(u8, Vec<u8>)>>) -> bool);
    }
}
