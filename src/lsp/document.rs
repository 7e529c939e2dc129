use ropey::{Rope, RopeSlice};

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

use crate::lsp::features::completion::DocumentKind;

pub use crate::lsp::models::{LspDocument, LspDocumentState};

/// Converts an LSP position (UTF-16 code units) to a char index in the Rope.
///
/// Positions past the end of a line clamp to the end of its content, before
/// the line break. Positions past the last line clamp to the last line.
fn position_to_char_index(position: &Position, text: &Rope) -> usize {
    let line = (position.line as usize).min(text.len_lines().saturating_sub(1));
    let line_start = text.line_to_char(line);
    let line_end = line_start + line_content_len(text.line(line));
    let start_cu = text.char_to_utf16_cu(line_start);
    let end_cu = text.char_to_utf16_cu(line_end);
    let target = (start_cu + position.character as usize).min(end_cu);
    text.utf16_cu_to_char(target)
}

/// Length in chars of a line slice without its trailing `\n`, `\r\n` or `\r`.
fn line_content_len(line: RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    let last = if len > 0 { Some(line.char(len - 1)) } else { None };
    match last {
        Some('\n') if len > 1 && line.char(len - 2) == '\r' => len - 2,
        Some('\n') | Some('\r') => len - 1,
        _ => len,
    }
}

impl LspDocumentState {
    /// Applies a list of content changes if `version` is newer than the current one.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32
    ) -> Result<String, String> {
        if version <= self.version {
            return Err(format!("Version {} not newer than {}", version, self.version));
        }
        for change in &changes {
            if let Some(range) = change.range {
                let start = position_to_char_index(&range.start, &self.text);
                let end = position_to_char_index(&range.end, &self.text).max(start);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                self.text = Rope::from_str(&change.text);
            }
        }
        self.version = version;
        Ok(self.text.to_string())
    }

    /// Text of the line at `position` (without its line break) and the cursor as a char offset into it.
    pub fn line_at(&self, position: &Position) -> (String, usize) {
        let line_index = (position.line as usize).min(self.text.len_lines().saturating_sub(1));
        let line_start = self.text.line_to_char(line_index);
        let cursor = position_to_char_index(position, &self.text) - line_start;
        let line = self.text.line(line_index).to_string();
        let line = line.trim_end_matches(['\n', '\r']).to_string();
        let cursor = cursor.min(line.chars().count());
        (line, cursor)
    }
}

impl LspDocument {
    pub fn new(uri: Url, kind: DocumentKind, text: &str, version: i32) -> Self {
        Self {
            uri,
            kind,
            state: tokio::sync::RwLock::new(LspDocumentState {
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Applies changes to the document, returning the new text.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32
    ) -> Option<String> {
        let mut state = self.state.write().await;
        state.apply(changes, version).ok()
    }

    pub async fn line_at(&self, position: &Position) -> (String, usize) {
        self.state.read().await.line_at(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Range;

    fn create_test_document(text: &str) -> LspDocument {
        LspDocument::new(Url::parse("file:///test.fx").unwrap(), DocumentKind::Fluxon, text, 0)
    }

    fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position { line: start.0, character: start.1 },
                end: Position { line: end.0, character: end.1 },
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_apply_full_change() {
        let doc = create_test_document("initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        let result = doc.apply(changes, 1).await;
        assert_eq!(result.as_deref(), Some("new text"));
        assert_eq!(doc.version().await, 1);
    }

    #[tokio::test]
    async fn test_apply_multiple_incremental() {
        let doc = create_test_document("hello world");
        let changes = vec![edit((0, 6), (0, 11), "rust"), edit((0, 0), (0, 5), "hi")];

        let result = doc.apply(changes, 1).await;
        assert_eq!(result.as_deref(), Some("hi rust"));
    }

    #[tokio::test]
    async fn test_apply_outdated_version() {
        let doc = create_test_document("initial text");
        assert!(doc.apply(vec![edit((0, 0), (0, 7), "new")], 2).await.is_some());
        assert!(doc.apply(vec![edit((0, 0), (0, 3), "old")], 1).await.is_none());
        assert_eq!(doc.text().await, "new text");
        assert_eq!(doc.version().await, 2);
    }

    #[tokio::test]
    async fn test_utf16_positions() {
        // "😀" is two UTF-16 code units but one char
        let doc = create_test_document("a😀b = 1\nnext");
        assert!(doc.apply(vec![edit((0, 3), (0, 4), "c")], 1).await.is_some());
        assert_eq!(doc.text().await, "a😀c = 1\nnext");

        let (line, cursor) = doc.line_at(&Position { line: 0, character: 3 }).await;
        assert_eq!(line, "a😀c = 1");
        assert_eq!(cursor, 2);
    }

    #[tokio::test]
    async fn test_line_at_clamps() {
        let doc = create_test_document("x = 1\r\nplayer::");
        let (line, cursor) = doc.line_at(&Position { line: 1, character: 99 }).await;
        assert_eq!(line, "player::");
        assert_eq!(cursor, 8);

        let (line, cursor) = doc.line_at(&Position { line: 0, character: 99 }).await;
        assert_eq!(line, "x = 1");
        assert_eq!(cursor, 5);
    }

    #[tokio::test]
    async fn test_edit_past_line_end_stays_on_line() {
        let doc = create_test_document("ab\ncd");
        assert!(doc.apply(vec![edit((0, 99), (0, 99), "X")], 1).await.is_some());
        assert_eq!(doc.text().await, "abX\ncd");

        let doc = create_test_document("ab\r\ncd\ref");
        assert!(doc.apply(vec![edit((0, 50), (1, 50), "Y")], 1).await.is_some());
        assert_eq!(doc.text().await, "abY\ref");
    }
}
