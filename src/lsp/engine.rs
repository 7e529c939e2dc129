//! Completion engine
//!
//! Owns the catalog store, the user-function cache and the current client
//! settings, and answers completion requests from a line of text and a cursor.
//! The LSP backend holds one engine behind an `Arc`; nothing here is global.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tower_lsp::lsp_types::{CompletionItem, Url};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogResult, CatalogStore};
use crate::config::Settings;
use crate::lsp::features::completion::{
    ContextVerdict, DocumentKind, UserFunction, UserFunctionExtractor, classify, synthesize,
};

#[derive(Debug, Default)]
pub struct CompletionEngine {
    /// Replaced wholesale on reload; readers see either the old or the new catalog
    catalog: RwLock<CatalogStore>,
    user_functions: UserFunctionExtractor,
    settings: RwLock<Settings>,
}

impl CompletionEngine {
    pub fn new(settings: Settings) -> Self {
        Self {
            catalog: RwLock::new(CatalogStore::new()),
            user_functions: UserFunctionExtractor::new(),
            settings: RwLock::new(settings),
        }
    }

    /// First catalog load. The paths are remembered even if the load fails.
    pub fn initialize_catalog(&self, preferred: &Path, fallback: &Path) -> CatalogResult<()> {
        let result = self.catalog.write().initialize(preferred, fallback);
        if let Err(e) = &result {
            warn!("Initial catalog load failed: {}", e);
        }
        result
    }

    /// Reload the catalog; on failure the previous catalog keeps serving requests.
    pub fn reload_catalog(&self, path: Option<&Path>) -> CatalogResult<()> {
        match self.catalog.write().reload(path) {
            Ok(()) => {
                info!("Catalog reloaded");
                Ok(())
            }
            Err(e) => {
                warn!("Catalog reload rejected, keeping previous catalog: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_catalog_loaded(&self) -> bool {
        self.catalog.read().is_loaded()
    }

    /// Run `f` against the current catalog store under a read lock.
    pub fn with_catalog<R>(&self, f: impl FnOnce(&CatalogStore) -> R) -> R {
        f(&self.catalog.read())
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Replace the settings and return the previous ones.
    pub fn update_settings(&self, settings: Settings) -> Settings {
        std::mem::replace(&mut *self.settings.write(), settings)
    }

    /// Re-scan a document for user functions.
    pub fn update_document(&self, uri: &Url, text: &str) -> usize {
        self.user_functions.update_cache(uri, text)
    }

    pub fn cached_user_functions(&self, uri: &Url) -> Arc<[UserFunction]> {
        self.user_functions.get_cached(uri)
    }

    pub fn close_document(&self, uri: &Url) {
        self.user_functions.clear_cache(uri);
    }

    pub fn clear_documents(&self) {
        self.user_functions.clear_all();
    }

    /// Candidates for a cursor at char offset `cursor` on `line`.
    pub fn complete(&self, uri: &Url, line: &str, cursor: usize, kind: DocumentKind) -> Vec<CompletionItem> {
        let verdict = classify(line, cursor, kind);
        debug!("Completion context at {}:{} is {:?}", uri, cursor, verdict);
        if verdict == ContextVerdict::Ignored {
            return Vec::new();
        }

        let options = self.settings.read().synthesis_options();
        let user_functions = self.user_functions.get_cached(uri);
        let catalog = self.catalog.read();
        let items = synthesize(&verdict, &catalog, &user_functions, &options);
        debug!("Returning {} completion items", items.len());
        items
    }
}
