//! Conversion of catalog, user and static entries into LSP completion items

use tower_lsp::lsp_types::{
    Command, CompletionItem, CompletionItemKind, Documentation, InsertTextFormat, MarkupContent, MarkupKind,
};

use super::keywords::{Annotation, KeywordGroup};
use super::ranking::SortTier;
use super::user_functions::UserFunction;
use crate::catalog::CatalogFunction;

/// Client command that reopens the suggestion widget
pub const TRIGGER_SUGGEST_COMMAND: &str = "editor.action.triggerSuggest";

/// Snippet inserting a call with one placeholder per required argument.
///
/// With no required arguments the cursor lands between the parentheses.
pub fn call_snippet(name: &str, min_arity: u32) -> String {
    let name = escape_snippet_text(name);
    if min_arity == 0 {
        return format!("{}($0)", name);
    }
    let placeholders = (1..=min_arity)
        .map(|i| format!("${{{}:arg{}}}", i, i))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", name, placeholders)
}

/// Escapes `\\`, `$` and `}` so `text` is inserted literally by a snippet.
fn escape_snippet_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '$' | '}') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Human readable arity set, e.g. `2 arguments` or `0, 1 or 3 arguments`.
///
/// Every element is a separately supported count, never a range bound.
pub fn describe_arity(params: &[u32]) -> String {
    match params {
        [] | [0] => "no arguments".to_string(),
        [1] => "1 argument".to_string(),
        [n] => format!("{} arguments", n),
        [init @ .., last] => {
            let init = init.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
            format!("{} or {} arguments", init, last)
        }
    }
}

fn markdown(value: String) -> Documentation {
    Documentation::MarkupContent(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    })
}

fn format_params(params: &[u32]) -> String {
    params.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
}

/// Completion item for a system or extension catalog function
pub fn catalog_item(function: &CatalogFunction, tier: SortTier, show_namespace: bool) -> CompletionItem {
    let mut detail = Vec::new();
    if let Some(namespace) = function.namespace.as_deref().filter(|_| show_namespace) {
        detail.push(format!("namespace: {}", namespace));
    }
    detail.push(format!("params: [{}]", format_params(&function.params)));
    if function.is_async {
        detail.push("async".to_string());
    }
    if function.primary_sync {
        detail.push("primarySync".to_string());
    }

    let mut docs = Vec::new();
    if let Some(namespace) = &function.namespace {
        docs.push(format!("**Namespace:** `{}`", namespace));
    }
    docs.push(format!("**Parameters:** {}", describe_arity(&function.params)));
    if function.is_async {
        docs.push("**Async:** Yes".to_string());
    }
    if function.primary_sync {
        docs.push("**Primary sync:** Yes".to_string());
    }

    CompletionItem {
        label: function.name.clone(),
        kind: Some(CompletionItemKind::FUNCTION),
        detail: Some(detail.join(" | ")),
        documentation: Some(markdown(docs.join("\n\n"))),
        sort_text: Some(tier.sort_text(&function.name)),
        insert_text: Some(call_snippet(&function.name, function.min_arity())),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        ..Default::default()
    }
}

/// Completion item for a function declared in the current document
pub fn user_item(function: &UserFunction) -> CompletionItem {
    let mut detail = vec!["user-defined".to_string()];
    if function.is_async {
        detail.push("async".to_string());
    }
    if function.is_sync {
        detail.push("sync".to_string());
    }
    detail.push(format!("params: [{}]", function.arity));

    let docs = format!(
        "**User-defined function**\n\n**Parameters:** {}\n\nDeclared on line {}",
        describe_arity(&[function.arity]),
        function.span.line + 1
    );

    CompletionItem {
        label: function.name.clone(),
        kind: Some(CompletionItemKind::FUNCTION),
        detail: Some(detail.join(" | ")),
        documentation: Some(markdown(docs)),
        sort_text: Some(SortTier::User.sort_text(&function.name)),
        insert_text: Some(call_snippet(&function.name, function.arity)),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        ..Default::default()
    }
}

pub fn keyword_item(word: &str, group: KeywordGroup) -> CompletionItem {
    CompletionItem {
        label: word.to_string(),
        kind: Some(group.completion_kind()),
        detail: Some(group.detail().to_string()),
        sort_text: Some(SortTier::Static.sort_text(word)),
        ..Default::default()
    }
}

pub fn annotation_item(annotation: &Annotation) -> CompletionItem {
    let insert_text = if annotation.params.is_empty() {
        annotation.name.to_string()
    } else {
        let placeholders = annotation
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| format!("${{{}:{}}}", i + 1, param))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", annotation.name, placeholders)
    };

    let parameters = if annotation.params.is_empty() {
        "none".to_string()
    } else {
        annotation.params.join(", ")
    };

    CompletionItem {
        label: annotation.name.to_string(),
        kind: Some(CompletionItemKind::PROPERTY),
        detail: Some("annotation".to_string()),
        documentation: Some(markdown(format!(
            "**@{}**\n\n{}\n\n**Parameters:** {}",
            annotation.name, annotation.description, parameters
        ))),
        sort_text: Some(SortTier::Static.sort_text(annotation.name)),
        insert_text: Some(insert_text),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        ..Default::default()
    }
}

/// The `:` that turns a single colon into `::`, re-triggering completion afterwards
pub fn colon_item() -> CompletionItem {
    CompletionItem {
        label: "::".to_string(),
        kind: Some(CompletionItemKind::OPERATOR),
        detail: Some("extension call".to_string()),
        documentation: Some(markdown("Type `::` to call an extension function on the receiver".to_string())),
        sort_text: Some(SortTier::Static.sort_text(":")),
        filter_text: Some(":".to_string()),
        insert_text: Some(":".to_string()),
        insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
        command: Some(Command {
            title: "Trigger extension completion".to_string(),
            command: TRIGGER_SUGGEST_COMMAND.to_string(),
            arguments: None,
        }),
        ..Default::default()
    }
}

/// Namespace for an `import` statement.
///
/// When the user already typed the opening quote only the namespace and the
/// matching closing quote are inserted; otherwise a double-quoted string is.
pub fn namespace_item(namespace: &str, quote: Option<char>) -> CompletionItem {
    let insert_text = match quote {
        Some(quote) => format!("{}{}", namespace, quote),
        None => format!("\"{}\"", namespace),
    };

    CompletionItem {
        label: namespace.to_string(),
        kind: Some(CompletionItemKind::MODULE),
        detail: Some("namespace".to_string()),
        sort_text: Some(SortTier::Static.sort_text(namespace)),
        insert_text: Some(insert_text),
        insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::features::completion::user_functions::SourceSpan;

    fn catalog_function(name: &str, namespace: Option<&str>, params: &[u32]) -> CatalogFunction {
        CatalogFunction {
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            params: params.to_vec(),
            is_async: true,
            primary_sync: false,
        }
    }

    #[test]
    fn test_call_snippet_uses_minimum_arity() {
        assert_eq!(call_snippet("now", 0), "now($0)");
        assert_eq!(call_snippet("sum", 1), "sum(${1:arg1})");
        assert_eq!(call_snippet("pair", 2), "pair(${1:arg1}, ${2:arg2})");
    }

    #[test]
    fn test_call_snippet_escapes_name() {
        assert_eq!(call_snippet("$cost", 0), r"\$cost($0)");
        assert_eq!(call_snippet(r"a}b\c", 1), r"a\}b\\c(${1:arg1})");
    }

    #[test]
    fn test_describe_arity_is_discrete() {
        assert_eq!(describe_arity(&[0]), "no arguments");
        assert_eq!(describe_arity(&[1]), "1 argument");
        assert_eq!(describe_arity(&[2]), "2 arguments");
        assert_eq!(describe_arity(&[1, 3]), "1 or 3 arguments");
        assert_eq!(describe_arity(&[0, 1, 3]), "0, 1 or 3 arguments");
    }

    #[test]
    fn test_catalog_item() {
        let item = catalog_item(&catalog_function("get", Some("http"), &[1, 2]), SortTier::Demoted, true);
        assert_eq!(item.label, "get");
        assert_eq!(item.detail.as_deref(), Some("namespace: http | params: [1, 2] | async"));
        assert_eq!(item.sort_text.as_deref(), Some("2_get"));
        assert_eq!(item.insert_text.as_deref(), Some("get(${1:arg1})"));
        match item.documentation {
            Some(Documentation::MarkupContent(content)) => {
                assert!(content.value.contains("**Namespace:** `http`"));
                assert!(content.value.contains("1 or 2 arguments"));
                assert!(content.value.contains("**Async:** Yes"));
            }
            other => panic!("unexpected documentation {:?}", other),
        }
    }

    #[test]
    fn test_catalog_item_hides_namespace_in_detail_only() {
        let item = catalog_function("get", Some("http"), &[0]);
        let item = catalog_item(&item, SortTier::Primary, false);
        assert_eq!(item.detail.as_deref(), Some("params: [0] | async"));
        assert_eq!(item.insert_text.as_deref(), Some("get($0)"));
    }

    #[test]
    fn test_user_item() {
        let function = UserFunction {
            name: "add".to_string(),
            arity: 2,
            is_async: false,
            is_sync: true,
            span: SourceSpan { line: 4, start_column: 0, end_column: 20 },
        };
        let item = user_item(&function);
        assert_eq!(item.detail.as_deref(), Some("user-defined | sync | params: [2]"));
        assert_eq!(item.sort_text.as_deref(), Some("3_add"));
        assert_eq!(item.insert_text.as_deref(), Some("add(${1:arg1}, ${2:arg2})"));
    }

    #[test]
    fn test_annotation_item_with_and_without_params() {
        let bare = Annotation { name: "except", params: &[], description: "" };
        assert_eq!(annotation_item(&bare).insert_text.as_deref(), Some("except"));

        let with_params = Annotation { name: "retry", params: &["times", "delay"], description: "" };
        assert_eq!(
            annotation_item(&with_params).insert_text.as_deref(),
            Some("retry(${1:times}, ${2:delay})")
        );
    }

    #[test]
    fn test_namespace_item_quotes() {
        assert_eq!(namespace_item("net.http", Some('\'')).insert_text.as_deref(), Some("net.http'"));
        assert_eq!(namespace_item("net.http", None).insert_text.as_deref(), Some("\"net.http\""));
    }

    #[test]
    fn test_colon_item_retriggers() {
        let item = colon_item();
        assert_eq!(item.insert_text.as_deref(), Some(":"));
        assert_eq!(item.command.map(|c| c.command).as_deref(), Some(TRIGGER_SUGGEST_COMMAND));
    }
}
