//! Static completion tables: keywords, constants and annotations
//!
//! These never change at runtime and are offered with the highest sort priority.

use tower_lsp::lsp_types::CompletionItemKind;

/// Group a static word belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordGroup {
    Control,
    Declaration,
    Constant,
}

impl KeywordGroup {
    pub fn completion_kind(self) -> CompletionItemKind {
        match self {
            KeywordGroup::Control | KeywordGroup::Declaration => CompletionItemKind::KEYWORD,
            KeywordGroup::Constant => CompletionItemKind::CONSTANT,
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            KeywordGroup::Control | KeywordGroup::Declaration => "keyword",
            KeywordGroup::Constant => "constant",
        }
    }
}

/// Fluxon keywords and literal constants, in emission order
pub const FLUXON_KEYWORDS: &[(&str, KeywordGroup)] = &[
    // Control flow
    ("if", KeywordGroup::Control),
    ("then", KeywordGroup::Control),
    ("else", KeywordGroup::Control),
    ("when", KeywordGroup::Control),
    ("is", KeywordGroup::Control),
    ("for", KeywordGroup::Control),
    ("in", KeywordGroup::Control),
    ("while", KeywordGroup::Control),
    ("break", KeywordGroup::Control),
    ("continue", KeywordGroup::Control),
    ("return", KeywordGroup::Control),
    ("try", KeywordGroup::Control),
    ("catch", KeywordGroup::Control),
    ("finally", KeywordGroup::Control),
    // Declarations and modifiers
    ("import", KeywordGroup::Declaration),
    ("def", KeywordGroup::Declaration),
    ("fun", KeywordGroup::Declaration),
    ("val", KeywordGroup::Declaration),
    ("var", KeywordGroup::Declaration),
    ("async", KeywordGroup::Declaration),
    ("sync", KeywordGroup::Declaration),
    ("await", KeywordGroup::Declaration),
    // Constants
    ("true", KeywordGroup::Constant),
    ("false", KeywordGroup::Constant),
    ("null", KeywordGroup::Constant),
];

/// An annotation usable after `@`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub description: &'static str,
}

pub const FLUXON_ANNOTATIONS: &[Annotation] = &[Annotation {
    name: "except",
    params: &[],
    description: "Makes an async function print every exception it encounters",
}];
