//! Mint-date reconciliation across providers and raw record fields.

use artforged_common::Chain;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::parse_date;
use super::provider::CandidateSource;
use super::registry::MintDateRegistry;
use crate::config::MintDateConfig;
use crate::record::RawRecord;

/// A date offered by one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintDateCandidate {
    pub date: DateTime<Utc>,
    pub source: CandidateSource,
}

/// Outcome of validating a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Newer than the recent cutoff on a contract that predates it
    Suspicious,
    /// In the future
    Rejected,
}

/// Everything known about a token when looking for its mint date.
#[derive(Debug, Clone, Default)]
pub struct MintDateQuery<'a> {
    pub contract: Option<&'a str>,
    pub token_id: Option<&'a str>,
    pub raw_dates: Vec<String>,
    pub contract_created_at: Option<DateTime<Utc>>,
}

impl<'a> MintDateQuery<'a> {
    /// Query for the date fields a record carries. `contract` and `token_id`
    /// are borrowed from the caller.
    pub fn from_record(
        record: &RawRecord,
        contract: Option<&'a str>,
        token_id: Option<&'a str>,
    ) -> Self {
        Self {
            contract,
            token_id,
            raw_dates: record.raw_date_fields(),
            contract_created_at: record.contract_created_at(),
        }
    }
}

/// Picks the most trustworthy valid mint date.
pub struct Reconciler {
    registry: MintDateRegistry,
    config: MintDateConfig,
}

impl Reconciler {
    pub fn new(registry: MintDateRegistry, config: MintDateConfig) -> Self {
        Self { registry, config }
    }

    pub fn from_config(config: &MintDateConfig) -> anyhow::Result<Self> {
        Ok(Self::new(MintDateRegistry::from_config(config)?, config.clone()))
    }

    pub fn registry(&self) -> &MintDateRegistry {
        &self.registry
    }

    /// Validate one date against the clock and the recent-date cutoff.
    pub fn judge(
        date: DateTime<Utc>,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
        contract_created_at: Option<DateTime<Utc>>,
    ) -> Verdict {
        if date > now {
            Verdict::Rejected
        } else if date > cutoff && contract_created_at.is_some_and(|created| created < cutoff) {
            Verdict::Suspicious
        } else {
            Verdict::Accepted
        }
    }

    /// First accepted candidate in trust order, else the first suspicious one.
    pub fn select(
        candidates: &[MintDateCandidate],
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
        contract_created_at: Option<DateTime<Utc>>,
    ) -> Option<MintDateCandidate> {
        let mut ordered: Vec<&MintDateCandidate> = candidates.iter().collect();
        ordered.sort_by_key(|c| c.source.trust_rank());

        let mut suspicious = None;
        for candidate in ordered {
            match Self::judge(candidate.date, now, cutoff, contract_created_at) {
                Verdict::Accepted => return Some(*candidate),
                Verdict::Suspicious => {
                    debug!(source = %candidate.source, date = %candidate.date, "Suspiciously recent mint date");
                    suspicious.get_or_insert(*candidate);
                }
                Verdict::Rejected => {
                    debug!(source = %candidate.source, date = %candidate.date, "Rejecting future mint date");
                }
            }
        }
        suspicious
    }

    pub async fn reconcile(&self, chain: Chain, query: &MintDateQuery<'_>) -> Option<DateTime<Utc>> {
        self.reconcile_at(Utc::now(), chain, query).await
    }

    /// Consult providers in trust order, stopping at the first accepted date,
    /// then fall back to raw record fields.
    pub async fn reconcile_at(
        &self,
        now: DateTime<Utc>,
        chain: Chain,
        query: &MintDateQuery<'_>,
    ) -> Option<DateTime<Utc>> {
        let cutoff = self.config.recent_cutoff_at(now);
        let mut candidates = Vec::new();

        if let (Some(contract), Some(token_id)) = (query.contract, query.token_id) {
            for provider in self.registry.for_chain(chain) {
                match provider.fetch_mint_date(chain, contract, token_id).await {
                    Ok(Some(date)) => {
                        let candidate = MintDateCandidate {
                            date,
                            source: provider.source(),
                        };
                        if Self::judge(date, now, cutoff, query.contract_created_at)
                            == Verdict::Accepted
                        {
                            info!(provider = provider.name(), %date, "Mint date resolved");
                            return Some(date);
                        }
                        candidates.push(candidate);
                    }
                    Ok(None) => debug!(provider = provider.name(), contract, token_id, "No mint event found"),
                    Err(e) => warn!(
                        provider = provider.name(),
                        contract,
                        token_id,
                        error = %e,
                        "Mint date provider failed"
                    ),
                }
            }
        }

        candidates.extend(query.raw_dates.iter().filter_map(|raw| {
            parse_date(raw).map(|date| MintDateCandidate {
                date,
                source: CandidateSource::RawField,
            })
        }));

        let chosen = Self::select(&candidates, now, cutoff, query.contract_created_at);
        match &chosen {
            Some(c) => info!(source = %c.source, date = %c.date, "Mint date resolved"),
            None => {
                let token = format!(
                    "{}:{}",
                    query.contract.unwrap_or("?"),
                    query.token_id.unwrap_or("?")
                );
                debug!("{}", artforged_common::Error::MintDateUnavailable(token));
            }
        }
        chosen.map(|c| c.date)
    }
}
