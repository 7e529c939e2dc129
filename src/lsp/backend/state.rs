//! Backend state
//!
//! Defines the FluxonBackend struct: the open documents, the completion engine
//! and the channels feeding the background re-scan task.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{RwLock, oneshot};
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::lsp::engine::CompletionEngine;
use crate::lsp::models::LspDocument;

/// Event consumed by the document debouncer
///
/// Every user-function cache write for a URI goes through the debouncer, so
/// open, change and close are applied in the order they were sent.
#[derive(Debug)]
pub enum DocumentEvent {
    /// A document was opened; it is scanned at once and the count reported back
    Opened {
        uri: Url,
        text: Arc<String>,
        scanned: oneshot::Sender<usize>,
    },
    /// New text for a document; only the latest per URI is scanned
    Changed {
        uri: Url,
        version: i32,
        text: Arc<String>,
    },
    /// The document was closed; any pending re-scan and its user functions are dropped
    Closed { uri: Url },
}

/// The Fluxon language server backend.
#[derive(Clone)]
pub struct FluxonBackend {
    pub(super) client: Client,
    pub(super) engine: Arc<CompletionEngine>,
    pub(super) documents: Arc<RwLock<HashMap<Url, Arc<LspDocument>>>>,
    pub(super) doc_event_tx: tokio::sync::mpsc::Sender<DocumentEvent>,
    pub(super) workspace_root: Arc<RwLock<Option<PathBuf>>>,
    /// Built-in catalog used when `catalogPath` is empty or missing
    pub(super) fallback_catalog: PathBuf,
    pub(super) shutdown_tx: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl std::fmt::Debug for FluxonBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluxonBackend")
            .field("engine", &self.engine)
            .field("fallback_catalog", &self.fallback_catalog)
            .finish()
    }
}
