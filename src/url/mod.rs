//! URL handling module for Frontier Worker
//!
//! This module provides domain extraction (used for output partitioning),
//! wildcard domain matching (used by the link exclusion policy) and URL
//! fingerprints.

mod domain;
mod fingerprint;
mod matcher;

pub use domain::parse_domain;
pub use fingerprint::url_fingerprint;
pub use matcher::{matches_any, matches_wildcard};
