//! Typed ID wrappers for artwork identity.
//!
//! Indexers hand out identifiers in many shapes (numeric ids, slugs,
//! `contract:token` pairs). [`ArtworkId`] gives them one opaque type so log
//! fields and result maps never mix them up with contract addresses or
//! token ids.

use serde::{Deserialize, Serialize};

use crate::types::Chain;

/// Identifier of a single artwork (one token on one chain).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkId(String);

impl ArtworkId {
    /// Wrap an identifier supplied by the source record.
    #[must_use]
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Build the canonical `chain:contract:token` identifier.
    #[must_use]
    pub fn from_parts(chain: Chain, contract: &str, token_id: &str) -> Self {
        Self(format!("{chain}:{contract}:{token_id}"))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ArtworkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ArtworkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
