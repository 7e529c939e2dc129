//! Function catalog: schema, validation and the reloadable store

pub mod error;
pub mod schema;
pub mod store;

pub use error::{CatalogError, CatalogResult};
pub use schema::{Catalog, CatalogFunction};
pub use store::CatalogStore;
