//! Code completion for Fluxon
//!
//! This module provides:
//! - Lexical classification of the cursor position from the current line
//! - Extraction of user-defined function signatures from document text
//! - Static keyword and annotation tables
//! - Synthesis of ranked candidates from the catalog, user functions and static tables

pub mod context;
pub mod keywords;
pub mod ranking;
pub mod rendering;
pub mod synthesizer;
pub mod user_functions;

pub use context::{ContextVerdict, DocumentKind, HostSelector, classify};
pub use ranking::SortTier;
pub use synthesizer::{SynthesisOptions, synthesize};
pub use user_functions::{SourceSpan, UserFunction, UserFunctionExtractor};
