//! Trait definition for mint-date providers.

use std::fmt;

use artforged_common::Chain;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a mint-date candidate came from, in trust order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// On-chain transfer events (ground truth)
    EventsApi,
    /// Block-explorer transaction history
    ExplorerApi,
    /// Date-like field on the raw record (often an import timestamp)
    RawField,
}

impl CandidateSource {
    /// Lower is more trusted.
    pub fn trust_rank(self) -> u8 {
        match self {
            Self::EventsApi => 0,
            Self::ExplorerApi => 1,
            Self::RawField => 2,
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventsApi => write!(f, "events_api"),
            Self::ExplorerApi => write!(f, "explorer_api"),
            Self::RawField => write!(f, "raw_field"),
        }
    }
}

/// Async trait implemented by every remote mint-date source.
///
/// A provider answers one question: when was this token transferred out of
/// the zero address? `Ok(None)` means the source has no record of a mint;
/// errors are reserved for transport and decoding failures.
#[async_trait]
pub trait MintDateProvider: Send + Sync {
    /// Short, lowercase identifier (e.g. `"events"`).
    fn name(&self) -> &'static str;

    /// Whether the provider has the credentials it needs.
    fn is_available(&self) -> bool;

    /// Whether the provider can answer for this chain.
    fn supports(&self, chain: Chain) -> bool;

    /// Trust class of the dates this provider returns.
    fn source(&self) -> CandidateSource;

    /// Look up the mint timestamp for `contract`/`token_id`.
    async fn fetch_mint_date(
        &self,
        chain: Chain,
        contract: &str,
        token_id: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>>;
}
