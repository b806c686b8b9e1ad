use std::time::Duration;

use artforged_common::{Chain, Scheme};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gateways: GatewayConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub mint_date: MintDateConfig,

    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Ordered gateway base URLs per content-addressed scheme.
///
/// Each base must end in `/`; the content id and path are appended verbatim.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_ipfs_gateways")]
    pub ipfs: Vec<String>,

    #[serde(default = "default_arweave_gateways")]
    pub arweave: Vec<String>,

    #[serde(default = "default_onchfs_gateways")]
    pub onchfs: Vec<String>,

    /// Per-gateway request timeout in milliseconds
    #[serde(default = "default_gateway_timeout")]
    pub timeout_ms: u64,

    /// Keep sampled responses in a process-wide cache keyed by final URL
    #[serde(default = "default_true")]
    pub cache_responses: bool,

    /// Most responses kept in the cache; the oldest entry is evicted first
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Gateway list for a scheme; empty for schemes that are fetched directly.
    pub fn for_scheme(&self, scheme: Scheme) -> &[String] {
        match scheme {
            Scheme::Ipfs => &self.ipfs,
            Scheme::Arweave => &self.arweave,
            Scheme::OnchFs => &self.onchfs,
            Scheme::Http | Scheme::Data | Scheme::Raw => &[],
        }
    }
}

fn default_ipfs_gateways() -> Vec<String> {
    vec![
        "https://ipfs.io/ipfs/".to_string(),
        "https://cloudflare-ipfs.com/ipfs/".to_string(),
        "https://gateway.pinata.cloud/ipfs/".to_string(),
        "https://dweb.link/ipfs/".to_string(),
    ]
}

fn default_arweave_gateways() -> Vec<String> {
    vec![
        "https://arweave.net/".to_string(),
        "https://ar-io.net/".to_string(),
        "https://permagate.io/".to_string(),
    ]
}

fn default_onchfs_gateways() -> Vec<String> {
    vec!["https://onchfs.fxhash2.xyz/".to_string()]
}

fn default_gateway_timeout() -> u64 {
    2000
}

fn default_cache_capacity() -> usize {
    256
}

fn default_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ipfs: default_ipfs_gateways(),
            arweave: default_arweave_gateways(),
            onchfs: default_onchfs_gateways(),
            timeout_ms: default_gateway_timeout(),
            cache_responses: true,
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Artworks resolved concurrently per batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,

    /// Payloads at or above this size (when known) are not magic-sniffed
    #[serde(default = "default_sniff_size_limit")]
    pub sniff_size_limit: u64,

    /// Leading bytes inspected by the magic-byte sniffer
    #[serde(default = "default_sniff_sample_bytes")]
    pub sniff_sample_bytes: usize,

    /// Bytes buffered per fetch (covers image headers that sit past the sniff window)
    #[serde(default = "default_max_sample_bytes")]
    pub max_sample_bytes: usize,

    /// Upper bound on attributes kept per artwork
    #[serde(default = "default_max_attributes")]
    pub max_attributes: usize,
}

impl ResolverConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

fn default_concurrency() -> usize {
    3
}
fn default_batch_delay() -> u64 {
    500
}
fn default_sniff_size_limit() -> u64 {
    1024 * 1024
}
fn default_sniff_sample_bytes() -> usize {
    8 * 1024
}
fn default_max_sample_bytes() -> usize {
    64 * 1024
}
fn default_max_attributes() -> usize {
    32
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            batch_delay_ms: default_batch_delay(),
            sniff_size_limit: default_sniff_size_limit(),
            sniff_sample_bytes: default_sniff_sample_bytes(),
            max_sample_bytes: default_max_sample_bytes(),
            max_attributes: default_max_attributes(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MintDateConfig {
    /// Transfer-events API (OpenSea-style)
    #[serde(default)]
    pub events: Option<EventsApiConfig>,

    /// Block-explorer APIs, one entry per chain
    #[serde(default)]
    pub explorers: Vec<ExplorerConfig>,

    /// Dates after this day are suspicious for older contracts
    /// (default: 1 January of the current UTC year). Written as a quoted
    /// `"YYYY-MM-DD"` string.
    #[serde(default)]
    pub recent_cutoff: Option<NaiveDate>,
}

impl MintDateConfig {
    /// Resolve the recent-date cutoff as a UTC instant.
    pub fn recent_cutoff_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.recent_cutoff
            .or_else(|| NaiveDate::from_ymd_opt(now.year(), 1, 1))
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|midnight| Utc.from_utc_datetime(&midnight))
            .unwrap_or(now)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsApiConfig {
    #[serde(default = "default_events_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
}

fn default_events_base_url() -> String {
    "https://api.opensea.io/api/v2".to_string()
}

fn default_rate_limit() -> u32 {
    4
}

impl Default for EventsApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_events_base_url(),
            api_key: None,
            rate_limit: default_rate_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExplorerConfig {
    pub chain: Chain,

    /// Etherscan-compatible API endpoint; defaults per chain
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests per second
    #[serde(default = "default_explorer_rate_limit")]
    pub rate_limit: u32,
}

impl ExplorerConfig {
    /// Configured endpoint, or the public one for the chain.
    pub fn endpoint(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| default_explorer_url(self.chain).map(str::to_string))
    }

    /// Whether the entry is enabled and carries a non-empty key.
    pub fn has_credentials(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn default_explorer_rate_limit() -> u32 {
    5
}

/// Public Etherscan-family endpoint for a chain.
pub fn default_explorer_url(chain: Chain) -> Option<&'static str> {
    match chain {
        Chain::Ethereum => Some("https://api.etherscan.io/api"),
        Chain::Base => Some("https://api.basescan.org/api"),
        Chain::Polygon => Some("https://api.polygonscan.com/api"),
        Chain::Arbitrum => Some("https://api.arbiscan.io/api"),
        Chain::Optimism => Some("https://api-optimistic.etherscan.io/api"),
        Chain::Zora | Chain::Tezos => None,
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    /// Image optimizer URL with `{url}` and `{width}` placeholders
    #[serde(default)]
    pub optimizer_template: Option<String>,

    #[serde(default = "default_optimizer_width")]
    pub optimizer_width: u32,

    /// Static asset shown once every source has failed
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,

    /// Per-attempt hard timeout in milliseconds
    #[serde(default = "default_loader_timeout")]
    pub timeout_ms: u64,
}

impl LoaderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_optimizer_width() -> u32 {
    1024
}
fn default_placeholder_url() -> String {
    "/static/placeholder.png".to_string()
}
fn default_loader_timeout() -> u64 {
    10_000
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            optimizer_template: None,
            optimizer_width: default_optimizer_width(),
            placeholder_url: default_placeholder_url(),
            timeout_ms: default_loader_timeout(),
        }
    }
}
