//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` implementation for the
//! Fluxon backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Configuration changes and the catalog refresh command
//! - Completion

use std::sync::Arc;

use serde_json::{Value, json};
use tower_lsp::{LanguageServer, jsonrpc};
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    ExecuteCommandOptions, ExecuteCommandParams, InitializeParams, InitializeResult,
    InitializedParams, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind,
};
use tower_lsp::jsonrpc::Result as LspResult;
use tracing::{debug, info, warn};

use super::REFRESH_CATALOG_COMMAND;
use super::state::{DocumentEvent, FluxonBackend};
use crate::config::Settings;
use crate::lsp::features::completion::DocumentKind;
use crate::lsp::models::LspDocument;

#[tower_lsp::async_trait]
impl LanguageServer for FluxonBackend {
    /// Handles the LSP initialize request: reads settings, records the workspace root, advertises capabilities.
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize from {:?}", params.client_info.as_ref().map(|c| &c.name));

        #[allow(deprecated)]
        let root_uri = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or(params.root_uri);

        if let Some(root_uri) = root_uri {
            match root_uri.to_file_path() {
                Ok(root) => {
                    info!("Workspace root: {}", root.display());
                    *self.workspace_root.write().await = Some(root);
                }
                Err(()) => warn!("Workspace root {} is not a file path", root_uri),
            }
        }

        let settings = Settings::from_value(params.initialization_options.as_ref());
        debug!("Initial settings: {:?}", settings);
        self.engine.update_settings(settings);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![":".to_string(), "@".to_string()]),
                    all_commit_characters: None,
                    resolve_provider: Some(false),
                    completion_item: None,
                    work_done_progress_options: Default::default(),
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![REFRESH_CATALOG_COMMAND.to_string()],
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Handles the LSP initialized notification by loading the catalog.
    async fn initialized(&self, _params: InitializedParams) {
        info!("Initialized");
        self.load_catalog().await;
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");

        // Signal all background tasks to shut down gracefully
        let _ = self.shutdown_tx.send(());
        self.engine.clear_documents();
        self.documents.write().await.clear();

        Ok(())
    }

    /// Handles opening a text document; Fluxon sources are scanned right away.
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        info!("Opening document: URI={}, version={}", item.uri, item.version);

        let kind = DocumentKind::detect(Some(item.language_id.as_str()), item.uri.path());
        if kind == DocumentKind::Fluxon {
            self.scan_opened(item.uri.clone(), &item.text).await;
        }

        let document = Arc::new(LspDocument::new(item.uri.clone(), kind, &item.text, item.version));
        self.documents.write().await.insert(item.uri, document);
    }

    /// Handles incremental edits; the user-function re-scan is debounced.
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!("textDocument/didChange: URI={}, version={}", uri, version);

        let Some(document) = self.documents.read().await.get(&uri).cloned() else {
            warn!("Failed to find document with URI={}", uri);
            return;
        };

        match document.apply(params.content_changes, version).await {
            Some(text) if document.kind == DocumentKind::Fluxon => self.queue_rescan(uri, version, text).await,
            Some(_) => {}
            None => warn!("Failed to apply changes to document with URI={}", uri),
        }
    }

    /// Handles closing a text document, dropping it and its user functions.
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("Closing document: {}", uri);

        if self.documents.write().await.remove(&uri).is_none() {
            warn!("Failed to find document with URI={}", uri);
        }
        if let Err(e) = self.doc_event_tx.send(DocumentEvent::Closed { uri }).await {
            warn!("Failed to notify debouncer of close: {}", e);
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = Settings::from_value(Some(&params.settings));
        debug!("Configuration changed: {:?}", settings);
        self.apply_settings(settings).await;
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        if params.command != REFRESH_CATALOG_COMMAND {
            return Err(jsonrpc::Error::invalid_params(format!("Unknown command: {}", params.command)));
        }

        let path = self.resolved_catalog_path().await;
        info!("Refreshing catalog from {:?}", path);
        match self.reload_catalog(Some(path.as_path())).await {
            Ok(()) => Ok(Some(json!(true))),
            Err(e) => Err(jsonrpc::Error {
                code: jsonrpc::ErrorCode::InternalError,
                message: e.to_string().into(),
                data: None,
            }),
        }
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        debug!("Completion request at {}:{:?}", uri, position);

        let Some(document) = self.documents.read().await.get(&uri).cloned() else {
            debug!("Document not found: {}", uri);
            return Ok(None);
        };

        let (line, cursor) = document.line_at(&position).await;
        let items = self.engine.complete(&uri, &line, cursor, document.kind);
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(CompletionResponse::Array(items)))
    }
}
