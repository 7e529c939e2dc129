//! LSP features
//!
//! Only completion is provided; everything it needs lives under `completion`.

pub mod completion;
