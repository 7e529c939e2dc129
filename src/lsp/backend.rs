use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::{MessageType, Url};
use tracing::{info, warn};

use crate::catalog::{CatalogError, CatalogResult};
use crate::config::Settings;
use crate::lsp::engine::CompletionEngine;

mod handlers;
mod reactive;
mod state;

pub use reactive::{RESCAN_QUIET_PERIOD, spawn_document_debouncer};
pub use state::{DocumentEvent, FluxonBackend};

/// Command that reloads the catalog from the currently resolved path
pub const REFRESH_CATALOG_COMMAND: &str = "fluxon.refreshCatalog";

impl FluxonBackend {
    /// Creates the backend and spawns its document debouncer.
    ///
    /// `fallback_catalog` is the built-in catalog used when the configured one
    /// is empty or missing.
    pub fn new(client: Client, fallback_catalog: PathBuf) -> Self {
        let engine = Arc::new(CompletionEngine::new(Settings::default()));
        let (doc_event_tx, doc_event_rx) = tokio::sync::mpsc::channel::<DocumentEvent>(100);
        let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

        spawn_document_debouncer(engine.clone(), doc_event_rx, shutdown_tx.subscribe(), RESCAN_QUIET_PERIOD);

        Self {
            client,
            engine,
            documents: Arc::new(RwLock::new(std::collections::HashMap::new())),
            doc_event_tx,
            workspace_root: Arc::new(RwLock::new(None)),
            fallback_catalog,
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    /// Catalog path implied by the current settings and workspace root
    pub(super) async fn resolved_catalog_path(&self) -> PathBuf {
        let root = self.workspace_root.read().await;
        self.engine.settings().resolved_catalog_path(root.as_deref())
    }

    /// Initial catalog load. A failure is reported but the server keeps running.
    pub(super) async fn load_catalog(&self) {
        let preferred = self.resolved_catalog_path().await;
        match self.engine.initialize_catalog(&preferred, &self.fallback_catalog) {
            Ok(()) => {
                let source = self.engine.with_catalog(|store| store.source_path().map(Path::to_path_buf));
                info!("Catalog loaded from {:?}", source);
            }
            Err(e) => {
                self.client
                    .show_message(MessageType::ERROR, format!("Fluxon: failed to load function catalog: {}", e))
                    .await;
            }
        }
    }

    /// Reload from `path` (or the current source), telling the client about a failure.
    pub(super) async fn reload_catalog(&self, path: Option<&Path>) -> CatalogResult<()> {
        let result = self.engine.reload_catalog(path);
        if let Err(e) = &result {
            self.client
                .show_message(MessageType::WARNING, format!("Fluxon: catalog reload failed: {}", e))
                .await;
        }
        result
    }

    /// Apply new client settings, reloading the catalog if its resolved path changed.
    pub(super) async fn apply_settings(&self, settings: Settings) {
        let root = self.workspace_root.read().await.clone();
        let new_path = settings.resolved_catalog_path(root.as_deref());
        let previous = self.engine.update_settings(settings);
        let old_path = previous.resolved_catalog_path(root.as_deref());

        if new_path == old_path {
            return;
        }
        info!("Catalog path changed from {:?} to {:?}", old_path, new_path);
        match self.engine.reload_catalog(Some(new_path.as_path())) {
            Ok(()) => {}
            Err(CatalogError::NotInitialized) => self.load_catalog().await,
            Err(e) => {
                self.client
                    .show_message(MessageType::WARNING, format!("Fluxon: catalog reload failed: {}", e))
                    .await;
            }
        }
    }

    /// Scans a freshly opened document through the debouncer and waits for the result.
    pub(super) async fn scan_opened(&self, uri: Url, text: &str) {
        let (scanned_tx, scanned_rx) = tokio::sync::oneshot::channel();
        let event = DocumentEvent::Opened { uri, text: Arc::new(text.to_string()), scanned: scanned_tx };
        if let Err(e) = self.doc_event_tx.send(event).await {
            warn!("Failed to queue scan of opened document: {}", e);
            return;
        }
        if scanned_rx.await.is_err() {
            warn!("Document debouncer stopped before scanning opened document");
        }
    }

    pub(super) async fn queue_rescan(&self, uri: Url, version: i32, text: String) {
        let event = DocumentEvent::Changed { uri, version, text: Arc::new(text) };
        if let Err(e) = self.doc_event_tx.send(event).await {
            warn!("Failed to queue document re-scan: {}", e);
        }
    }
}
