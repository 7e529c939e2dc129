//! Sort priorities for completion candidates
//!
//! Clients order candidates by `sortText`. Every candidate gets
//! `"{tier}_{name}"`, so lower tiers sort first and ties inside a tier fall
//! back to the name:
//!
//! 0. keywords, constants, annotations, namespaces, the `::` hint
//! 1. catalog entries that are the primary suggestions for the context
//! 2. demoted catalog entries (system functions after `::`)
//! 3. user-defined functions

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortTier {
    Static = 0,
    Primary = 1,
    Demoted = 2,
    User = 3,
}

impl SortTier {
    pub fn sort_text(self, name: &str) -> String {
        format!("{}_{}", self, name)
    }
}

impl fmt::Display for SortTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}
