//! Client settings for the `fluxonCompletion` configuration section
//!
//! Settings arrive through `initializationOptions` and
//! `workspace/didChangeConfiguration`, either as the bare section object or
//! wrapped as `{ "fluxonCompletion": { ... } }`. Unknown or missing fields
//! fall back to their defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::lsp::features::completion::SynthesisOptions;

/// Configuration section name used by clients
pub const SETTINGS_SECTION: &str = "fluxonCompletion";

/// Environment variable overriding `catalogPath`
pub const CATALOG_PATH_ENV: &str = "FLUXON_CATALOG_PATH";

const WORKSPACE_FOLDER_VAR: &str = "${workspaceFolder}";

/// Verbosity requested by the client; informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    #[default]
    Off,
    Basic,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Catalog file, may contain `${workspaceFolder}`; empty selects the built-in catalog
    pub catalog_path: String,
    pub include_user_functions: bool,
    pub show_namespaces: bool,
    pub enable_extensions: bool,
    pub trace: TraceLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: String::new(),
            include_user_functions: true,
            show_namespaces: true,
            enable_extensions: true,
            trace: TraceLevel::Off,
        }
    }
}

impl Settings {
    /// Read settings from a client payload, accepting the bare section or a wrapper.
    ///
    /// A payload that does not deserialize is logged and replaced by defaults.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        let section = value.get(SETTINGS_SECTION).unwrap_or(value);
        if section.is_null() {
            return Self::default();
        }

        match serde_json::from_value(section.clone()) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed {} settings: {}", SETTINGS_SECTION, e);
                Self::default()
            }
        }
    }

    /// Catalog path to hand to the store: the environment override if set,
    /// otherwise `catalogPath` with `${workspaceFolder}` substituted.
    ///
    /// An empty result means "use the fallback catalog".
    pub fn resolved_catalog_path(&self, workspace_root: Option<&Path>) -> PathBuf {
        if let Ok(path) = std::env::var(CATALOG_PATH_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        resolve_path(&self.catalog_path, workspace_root)
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            include_user_functions: self.include_user_functions,
            show_namespaces: self.show_namespaces,
            enable_extensions: self.enable_extensions,
        }
    }
}

/// Substitute `${workspaceFolder}`; an unknown workspace substitutes the empty string.
pub fn resolve_path(template: &str, workspace_root: Option<&Path>) -> PathBuf {
    if template.is_empty() {
        return PathBuf::new();
    }
    let root = workspace_root
        .map(|root| root.to_string_lossy().into_owned())
        .unwrap_or_default();
    PathBuf::from(template.replace(WORKSPACE_FOLDER_VAR, &root))
}

/// Built-in catalog shipped next to the executable
pub fn default_fallback_catalog() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join("data")
        .join("fluxon-functions.json")
}
