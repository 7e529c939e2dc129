//! Context classification for code completion
//!
//! Decides what kind of syntactic position the cursor occupies using only the
//! text of the current line. There is no parser behind this: each guard is a
//! small lexical check over the prefix (line start to cursor), and the guards
//! run in a fixed order where the first match wins:
//!
//! 1. Embedded-host guard (YAML lines without a `: ;` code marker)
//! 2. Comment guard (`#` or `//`)
//! 3. Import guard (`import "ns`)
//! 4. String-literal guard (odd quote count)
//! 5. Single-colon guard (`foo:`)
//! 6. Extension-call guard (`foo::ba`)
//! 7. Annotation guard (`@na`)
//! 8. Top level
//!
//! The import guard must precede the string guard: `import "` has an
//! unterminated quote that is not a string literal.

use once_cell::sync::Lazy;
use regex::Regex;

/// `:` followed by optional whitespace and `;`, anywhere on the line
static EMBEDDED_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*;").expect("marker pattern is valid"));

static IMPORT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s+(['"])?([\w:._-]*)$"#).expect("import pattern is valid"));

static EXTENSION_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S+)\s*::(\w*)$").expect("extension call pattern is valid"));

static ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w*)$").expect("annotation pattern is valid"));

/// Kind of document the completion request comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// A plain Fluxon source file
    Fluxon,
    /// A YAML document hosting Fluxon snippets on `key: ; code` lines
    Embedded,
}

impl DocumentKind {
    /// Infer the kind from the client's language id, falling back to the file extension.
    pub fn detect(language_id: Option<&str>, path: &str) -> Self {
        match language_id {
            Some("yaml") => DocumentKind::Embedded,
            Some("fluxon") => DocumentKind::Fluxon,
            _ if path.ends_with(".yml") || path.ends_with(".yaml") => DocumentKind::Embedded,
            _ => DocumentKind::Fluxon,
        }
    }
}

/// Which host types an extension call should offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSelector {
    /// Every host type (merged index)
    All,
    /// A single host type
    Host(String),
}

/// Classification of the cursor position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextVerdict {
    /// General expression position: keywords, system and user functions
    TopLevel,
    /// After `receiver::`
    ExtensionCall { hosts: HostSelector },
    /// After a single `:`; the user may be about to type `::`
    SingleColon,
    /// Inside an `import` statement; `quote` is the opening quote already typed
    ImportNamespace { quote: Option<char> },
    /// After `@`
    Annotation,
    /// Comment, open string literal, or a non-code line of an embedded document
    Ignored,
}

/// Classify the cursor position on `line`.
///
/// `cursor` is a character offset into the line and is clamped to its length.
pub fn classify(line: &str, cursor: usize, kind: DocumentKind) -> ContextVerdict {
    if kind == DocumentKind::Embedded && !EMBEDDED_MARKER.is_match(line) {
        return ContextVerdict::Ignored;
    }

    let prefix = line_prefix(line, cursor);

    if is_comment(prefix) {
        return ContextVerdict::Ignored;
    }
    if let Some(quote) = import_quote(prefix) {
        return ContextVerdict::ImportNamespace { quote };
    }
    if inside_string(prefix) {
        return ContextVerdict::Ignored;
    }
    if ends_in_single_colon(prefix) {
        return ContextVerdict::SingleColon;
    }
    if is_extension_call(prefix) {
        return ContextVerdict::ExtensionCall { hosts: HostSelector::All };
    }
    if is_annotation(prefix) {
        return ContextVerdict::Annotation;
    }

    ContextVerdict::TopLevel
}

/// Text from the start of the line up to the cursor
pub fn line_prefix(line: &str, cursor: usize) -> &str {
    let end = line
        .char_indices()
        .nth(cursor)
        .map(|(index, _)| index)
        .unwrap_or(line.len());
    &line[..end]
}

fn is_comment(prefix: &str) -> bool {
    let trimmed = prefix.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with("//")
}

/// `Some(quote)` when the prefix is an in-progress import namespace
fn import_quote(prefix: &str) -> Option<Option<char>> {
    IMPORT_PREFIX
        .captures(prefix)
        .map(|captures| captures.get(1).and_then(|m| m.as_str().chars().next()))
}

fn inside_string(prefix: &str) -> bool {
    let singles = prefix.matches('\'').count();
    let doubles = prefix.matches('"').count();
    singles % 2 != 0 || doubles % 2 != 0
}

/// A non-whitespace run followed by exactly one trailing colon
fn ends_in_single_colon(prefix: &str) -> bool {
    if prefix.ends_with("::") {
        return false;
    }
    match prefix.strip_suffix(':') {
        Some(before) => before.chars().next_back().is_some_and(|c| !c.is_whitespace()),
        None => false,
    }
}

fn is_extension_call(prefix: &str) -> bool {
    EXTENSION_CALL.is_match(prefix)
}

fn is_annotation(prefix: &str) -> bool {
    ANNOTATION.is_match(prefix)
}
