use ropey::Rope;

use tower_lsp::lsp_types::Url;

use crate::lsp::features::completion::DocumentKind;

/// Mutable text state of an open document.
#[derive(Debug)]
pub struct LspDocumentState {
    pub text: Rope,
    pub version: i32,
}

/// An open text document managed by the server.
#[derive(Debug)]
pub struct LspDocument {
    pub uri: Url,
    pub kind: DocumentKind,
    pub state: tokio::sync::RwLock<LspDocumentState>,
}
