//! User-defined function extraction
//!
//! Recovers an approximate signature table for functions declared in a Fluxon
//! document without parsing it. Three declaration styles coexist:
//!
//! ```text
//! def add(x, y) = x + y        // parenthesized
//! async fun wait x y = ...     // bare, comma or space separated
//! def noop = 1                 // nullary
//! ```
//!
//! Lines that do not look like a declaration are skipped silently.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::Url;
use tracing::debug;

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n|\r").expect("line break pattern is valid"));

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(async\s+|sync\s+)?(def|fun)\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*(.*)$")
        .expect("declaration pattern is valid")
});

static PARENTHESIZED_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(([^)]*)\)").expect("parameter list pattern is valid"));

static BARE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").expect("separator pattern is valid"));

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("identifier pattern is valid"));

/// Location of a declaration: the full line it appears on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub line: u32,
    pub start_column: u32,
    pub end_column: u32,
}

/// A function declared in the current document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFunction {
    pub name: String,
    /// Exact argument count; extraction always yields a fixed count
    pub arity: u32,
    pub is_async: bool,
    pub is_sync: bool,
    pub span: SourceSpan,
}

/// Scans documents for user declarations and caches the result per document.
#[derive(Debug, Default)]
pub struct UserFunctionExtractor {
    cache: DashMap<Url, Arc<[UserFunction]>>,
}

impl UserFunctionExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every recognizable declaration from `text`, line by line.
    ///
    /// Lines end at `\r\n`, `\n` or a lone `\r`, as in open documents.
    pub fn scan(text: &str) -> Vec<UserFunction> {
        LINE_BREAK
            .split(text)
            .enumerate()
            .filter_map(|(line_number, line)| parse_declaration(line, line_number as u32))
            .collect()
    }

    /// Re-scan a document and replace its cache entry wholesale.
    pub fn update_cache(&self, uri: &Url, text: &str) -> usize {
        let functions = Self::scan(text);
        let count = functions.len();
        debug!("Found {} user functions in {}", count, uri);
        self.cache.insert(uri.clone(), functions.into());
        count
    }

    /// Current snapshot for a document; empty if it was never scanned.
    pub fn get_cached(&self, uri: &Url) -> Arc<[UserFunction]> {
        self.cache
            .get(uri)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn clear_cache(&self, uri: &Url) {
        self.cache.remove(uri);
    }

    pub fn clear_all(&self) {
        self.cache.clear();
    }
}

fn parse_declaration(line: &str, line_number: u32) -> Option<UserFunction> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('#') {
        return None;
    }

    let captures = DECLARATION.captures(trimmed)?;
    let modifier = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
    let name = captures[3].to_string();
    let rest = captures[4].trim();

    Some(UserFunction {
        name,
        arity: arity_of(rest),
        is_async: modifier == "async",
        is_sync: modifier == "sync",
        span: SourceSpan {
            line: line_number,
            start_column: 0,
            end_column: line.chars().count() as u32,
        },
    })
}

/// Count parameters in the text following the function name.
fn arity_of(rest: &str) -> u32 {
    if let Some(captures) = PARENTHESIZED_PARAMS.captures(rest) {
        let inner = captures[1].trim();
        return if inner.is_empty() { 0 } else { inner.split(',').count() as u32 };
    }

    if rest.is_empty() || rest.starts_with('=') || rest.starts_with('{') {
        return 0;
    }

    let before_body = rest.split(['=', '{']).next().unwrap_or("").trim();
    BARE_SEPARATOR
        .split(before_body)
        .filter(|token| IDENTIFIER.is_match(token))
        .count() as u32
}
