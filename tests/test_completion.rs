//! End-to-end completion through the CompletionEngine
//!
//! Tests verify:
//! - Context classification drives which sources are consulted
//! - Candidate order and sort tiers
//! - User functions follow their document and respect the settings
//! - An unloaded catalog yields no candidates at all

use std::io::Write;
use std::path::Path;

use indoc::indoc;
use tower_lsp::lsp_types::{CompletionItem, Url};
use fluxon_language_server::config::Settings;
use fluxon_language_server::lsp::engine::CompletionEngine;
use fluxon_language_server::lsp::features::completion::DocumentKind;

const CATALOG: &str = indoc! {r#"
    {
        "generatedAt": "2025-01-01T00:00:00Z",
        "system": [
            {"name": "sum", "namespace": null, "params": [1, 2], "async": false, "primarySync": false},
            {"name": "now", "namespace": "time", "params": [0], "async": false, "primarySync": false},
            {"name": "get", "namespace": "net.http", "params": [1], "async": true, "primarySync": false}
        ],
        "extensions": {
            "Player": [{"name": "sendMessage", "namespace": null, "params": [1], "async": false, "primarySync": false}],
            "Console": [{"name": "sendMessage", "namespace": null, "params": [1, 2], "async": false, "primarySync": false}],
            "World": [{"name": "spawn", "namespace": "world", "params": [2], "async": false, "primarySync": true}]
        }
    }
"#};

const SOURCE: &str = indoc! {r#"
    import "time"
    def greet(name) = print("hi " + name)
    async fun fetchAll urls limit = urls
    sync def tick = 0
"#};

fn catalog_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();
    file
}

fn loaded_engine(file: &tempfile::NamedTempFile) -> CompletionEngine {
    let engine = CompletionEngine::new(Settings::default());
    engine.initialize_catalog(file.path(), Path::new("")).unwrap();
    engine
}

fn uri() -> Url {
    Url::parse("file:///workspace/main.fx").unwrap()
}

fn labels(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|item| item.label.as_str()).collect()
}

fn complete_at_end(engine: &CompletionEngine, line: &str, kind: DocumentKind) -> Vec<CompletionItem> {
    engine.complete(&uri(), line, line.chars().count(), kind)
}

#[test]
fn test_top_level_offers_keywords_system_and_user_functions() {
    let file = catalog_file();
    let engine = loaded_engine(&file);
    engine.update_document(&uri(), SOURCE);

    let items = complete_at_end(&engine, "val x = ", DocumentKind::Fluxon);
    let names = labels(&items);
    assert_eq!(names[0], "if");
    assert!(names.contains(&"null"));

    let tail: Vec<&str> = names.iter().rev().take(6).rev().copied().collect();
    assert_eq!(tail, vec!["sum", "now", "get", "greet", "fetchAll", "tick"]);

    let sum = items.iter().find(|item| item.label == "sum").unwrap();
    assert_eq!(sum.insert_text.as_deref(), Some("sum(${1:arg1})"));
    assert_eq!(sum.sort_text.as_deref(), Some("1_sum"));

    let fetch_all = items.iter().find(|item| item.label == "fetchAll").unwrap();
    assert_eq!(fetch_all.detail.as_deref(), Some("user-defined | async | params: [2]"));
    assert_eq!(fetch_all.sort_text.as_deref(), Some("3_fetchAll"));
}

#[test]
fn test_extension_call_lists_merged_extensions_then_system() {
    let file = catalog_file();
    let engine = loaded_engine(&file);

    let items = complete_at_end(&engine, "player::", DocumentKind::Fluxon);
    assert_eq!(labels(&items), vec!["sendMessage", "spawn", "sum", "now", "get"]);
    assert_eq!(items[0].detail.as_deref(), Some("params: [1, 2]"));
    assert_eq!(items[0].sort_text.as_deref(), Some("1_sendMessage"));
    assert_eq!(items[2].sort_text.as_deref(), Some("2_sum"));

    let items = complete_at_end(&engine, "player ::sen", DocumentKind::Fluxon);
    assert_eq!(items.len(), 5);
}

#[test]
fn test_single_colon_hint() {
    let file = catalog_file();
    let engine = loaded_engine(&file);

    let items = complete_at_end(&engine, "player:", DocumentKind::Fluxon);
    assert_eq!(labels(&items), vec!["::"]);
    assert_eq!(items[0].insert_text.as_deref(), Some(":"));
    assert!(items[0].command.is_some());
}

#[test]
fn test_import_offers_namespaces() {
    let file = catalog_file();
    let engine = loaded_engine(&file);

    let items = complete_at_end(&engine, "import \"ne", DocumentKind::Fluxon);
    assert_eq!(labels(&items), vec!["net.http", "time", "world"]);
    assert_eq!(items[0].insert_text.as_deref(), Some("net.http\""));

    let items = complete_at_end(&engine, "import ", DocumentKind::Fluxon);
    assert_eq!(items[1].insert_text.as_deref(), Some("\"time\""));
}

#[test]
fn test_annotation() {
    let file = catalog_file();
    let engine = loaded_engine(&file);

    let items = complete_at_end(&engine, "@exc", DocumentKind::Fluxon);
    assert_eq!(labels(&items), vec!["except"]);
}

#[test]
fn test_comments_and_strings_are_silent() {
    let file = catalog_file();
    let engine = loaded_engine(&file);

    assert!(complete_at_end(&engine, "// player::", DocumentKind::Fluxon).is_empty());
    assert!(complete_at_end(&engine, "# note", DocumentKind::Fluxon).is_empty());
    assert!(complete_at_end(&engine, "print(\"a::", DocumentKind::Fluxon).is_empty());
}

#[test]
fn test_cursor_inside_line_uses_prefix_only() {
    let file = catalog_file();
    let engine = loaded_engine(&file);

    let line = "player::send // trailing";
    let items = engine.complete(&uri(), line, 8, DocumentKind::Fluxon);
    assert_eq!(items[0].label, "sendMessage");
}

#[test]
fn test_embedded_documents_need_code_marker() {
    let file = catalog_file();
    let engine = loaded_engine(&file);

    assert!(complete_at_end(&engine, "title: player::", DocumentKind::Embedded).is_empty());

    let items = complete_at_end(&engine, "script: ; player::", DocumentKind::Embedded);
    assert_eq!(items[0].label, "sendMessage");
}

#[test]
fn test_settings_shape_candidates() {
    let file = catalog_file();
    let engine = loaded_engine(&file);
    engine.update_document(&uri(), SOURCE);

    engine.update_settings(Settings {
        include_user_functions: false,
        show_namespaces: false,
        enable_extensions: false,
        ..Settings::default()
    });

    let items = complete_at_end(&engine, "x = ", DocumentKind::Fluxon);
    assert!(!labels(&items).contains(&"greet"));
    let now = items.iter().find(|item| item.label == "now").unwrap();
    assert_eq!(now.detail.as_deref(), Some("params: [0]"));

    let items = complete_at_end(&engine, "player::", DocumentKind::Fluxon);
    assert_eq!(labels(&items), vec!["sum", "now", "get"]);
}

#[test]
fn test_closed_document_forgets_user_functions() {
    let file = catalog_file();
    let engine = loaded_engine(&file);
    engine.update_document(&uri(), SOURCE);
    engine.close_document(&uri());

    let items = complete_at_end(&engine, "x = ", DocumentKind::Fluxon);
    assert!(!labels(&items).contains(&"greet"));
}

#[test]
fn test_unloaded_catalog_yields_nothing() {
    let engine = CompletionEngine::new(Settings::default());
    assert!(engine.initialize_catalog(Path::new("/nonexistent/fluxon.json"), Path::new("")).is_err());
    engine.update_document(&uri(), SOURCE);

    assert!(complete_at_end(&engine, "x = ", DocumentKind::Fluxon).is_empty());
    assert!(complete_at_end(&engine, "@", DocumentKind::Fluxon).is_empty());
}

#[test]
fn test_reload_failure_keeps_serving() {
    let file = catalog_file();
    let engine = loaded_engine(&file);

    let broken = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(broken.path(), "[]").unwrap();
    assert!(engine.reload_catalog(Some(broken.path())).is_err());

    let items = complete_at_end(&engine, "player::", DocumentKind::Fluxon);
    assert_eq!(items[0].label, "sendMessage");
}

#[test]
fn test_shipped_catalog_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/fluxon-functions.json");
    let engine = CompletionEngine::new(Settings::default());
    engine.initialize_catalog(&path, Path::new("")).unwrap();
    assert!(engine.is_catalog_loaded());
    assert!(!complete_at_end(&engine, "player::", DocumentKind::Fluxon).is_empty());
}
