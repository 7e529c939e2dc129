//! Candidate synthesis
//!
//! Turns a [`ContextVerdict`] into the ordered candidate list. The verdict alone
//! decides which sources are consulted; the line text is never looked at here.
//! Completion is best effort: a missing catalog or any catalog error yields an
//! empty list instead of an error.

use tower_lsp::lsp_types::CompletionItem;
use tracing::debug;

use super::context::{ContextVerdict, HostSelector};
use super::keywords::{FLUXON_ANNOTATIONS, FLUXON_KEYWORDS};
use super::ranking::SortTier;
use super::rendering::{annotation_item, catalog_item, colon_item, keyword_item, namespace_item, user_item};
use super::user_functions::UserFunction;
use crate::catalog::{CatalogResult, CatalogStore};

/// Client preferences that shape the candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Offer functions declared in the current document at top level
    pub include_user_functions: bool,
    /// Show the namespace in the detail string
    pub show_namespaces: bool,
    /// Offer extension functions after `::`
    pub enable_extensions: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            include_user_functions: true,
            show_namespaces: true,
            enable_extensions: true,
        }
    }
}

/// Build the candidates for one completion request.
pub fn synthesize(
    verdict: &ContextVerdict,
    catalog: &CatalogStore,
    user_functions: &[UserFunction],
    options: &SynthesisOptions,
) -> Vec<CompletionItem> {
    if !catalog.is_loaded() {
        debug!("Catalog not loaded, no completions");
        return Vec::new();
    }

    match try_synthesize(verdict, catalog, user_functions, options) {
        Ok(items) => items,
        Err(e) => {
            debug!("Completion degraded to empty list: {}", e);
            Vec::new()
        }
    }
}

fn try_synthesize(
    verdict: &ContextVerdict,
    catalog: &CatalogStore,
    user_functions: &[UserFunction],
    options: &SynthesisOptions,
) -> CatalogResult<Vec<CompletionItem>> {
    let items = match verdict {
        ContextVerdict::Ignored => Vec::new(),
        ContextVerdict::TopLevel => top_level(catalog, user_functions, options)?,
        ContextVerdict::ExtensionCall { hosts } => extension_call(hosts, catalog, options)?,
        ContextVerdict::SingleColon => vec![colon_item()],
        ContextVerdict::Annotation => FLUXON_ANNOTATIONS.iter().map(annotation_item).collect(),
        ContextVerdict::ImportNamespace { quote } => catalog
            .namespaces()?
            .iter()
            .map(|namespace| namespace_item(namespace, *quote))
            .collect(),
    };
    Ok(items)
}

/// Keywords, then system functions, then (optionally) user functions
fn top_level(
    catalog: &CatalogStore,
    user_functions: &[UserFunction],
    options: &SynthesisOptions,
) -> CatalogResult<Vec<CompletionItem>> {
    let system = catalog.system_functions()?;
    let mut items = Vec::with_capacity(FLUXON_KEYWORDS.len() + system.len() + user_functions.len());

    items.extend(FLUXON_KEYWORDS.iter().map(|(word, group)| keyword_item(word, *group)));
    items.extend(
        system
            .iter()
            .map(|function| catalog_item(function, SortTier::Primary, options.show_namespaces)),
    );
    if options.include_user_functions {
        items.extend(user_functions.iter().map(user_item));
    }

    Ok(items)
}

/// Extension functions first, then every system function with a lower priority
fn extension_call(
    hosts: &HostSelector,
    catalog: &CatalogStore,
    options: &SynthesisOptions,
) -> CatalogResult<Vec<CompletionItem>> {
    let mut items = Vec::new();

    if options.enable_extensions {
        match hosts {
            HostSelector::All => {
                let merged = catalog.merged_extension_functions()?;
                items.extend(
                    merged
                        .iter()
                        .map(|function| catalog_item(function, SortTier::Primary, options.show_namespaces)),
                );
            }
            HostSelector::Host(host_type) => {
                items.extend(
                    catalog
                        .extensions_for_host(host_type)?
                        .iter()
                        .map(|function| catalog_item(function, SortTier::Primary, options.show_namespaces)),
                );
            }
        }
    }

    items.extend(
        catalog
            .system_functions()?
            .iter()
            .map(|function| catalog_item(function, SortTier::Demoted, options.show_namespaces)),
    );

    Ok(items)
}
