//! Transfer-events API provider (OpenSea v2 style).
//!
//! Queries `GET {base}/events/chain/{chain}/contract/{contract}/nfts/{token}`
//! for transfer events and takes the earliest one sent from the zero address.
//! Events without a sender field are ignored.

use artforged_common::Chain;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::http::ApiClient;
use super::is_mint_sender;
use crate::config::EventsApiConfig;
use crate::media::urlencoded;
use crate::mintdate::parse_date;
use crate::mintdate::provider::{CandidateSource, MintDateProvider};

const FROM_KEYS: &[&str] = &["from_address", "from"];
const TIMESTAMP_KEYS: &[&str] = &["event_timestamp", "timestamp"];

/// Mint dates from on-chain transfer events.
pub struct EventsApiProvider {
    http: ApiClient,
    base_url: String,
    api_key: Option<String>,
}

impl EventsApiProvider {
    pub fn new(config: &EventsApiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: ApiClient::new("events", config.rate_limit)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    fn events_url(&self, slug: &str, contract: &str, token_id: &str) -> String {
        format!(
            "{}/events/chain/{slug}/contract/{}/nfts/{}?event_type=transfer",
            self.base_url,
            urlencoded(contract),
            urlencoded(token_id)
        )
    }
}

/// Chain name in the events API's URL scheme.
fn chain_slug(chain: Chain) -> Option<&'static str> {
    match chain {
        Chain::Ethereum => Some("ethereum"),
        Chain::Base => Some("base"),
        Chain::Polygon => Some("matic"),
        Chain::Arbitrum => Some("arbitrum"),
        Chain::Optimism => Some("optimism"),
        Chain::Zora => Some("zora"),
        Chain::Tezos => None,
    }
}

/// Earliest mint transfer in an events payload.
fn earliest_mint(body: &Value) -> Option<DateTime<Utc>> {
    let events = body
        .get("asset_events")
        .or_else(|| body.get("events"))
        .and_then(Value::as_array)?;

    events
        .iter()
        .filter(|event| {
            // No sender field means no evidence of a mint
            match FROM_KEYS.iter().find_map(|k| event.get(*k)) {
                Some(Value::Null) => is_mint_sender(None),
                Some(Value::String(from)) => is_mint_sender(Some(from.as_str())),
                _ => false,
            }
        })
        .filter_map(|event| {
            TIMESTAMP_KEYS
                .iter()
                .find_map(|k| event.get(*k))
                .and_then(|v| match v {
                    Value::Number(n) => parse_date(&n.to_string()),
                    Value::String(s) => parse_date(s),
                    _ => None,
                })
        })
        .min()
}

#[async_trait]
impl MintDateProvider for EventsApiProvider {
    fn name(&self) -> &'static str {
        "events"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn supports(&self, chain: Chain) -> bool {
        chain_slug(chain).is_some()
    }

    fn source(&self) -> CandidateSource {
        CandidateSource::EventsApi
    }

    async fn fetch_mint_date(
        &self,
        chain: Chain,
        contract: &str,
        token_id: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let Some(slug) = chain_slug(chain) else {
            return Ok(None);
        };
        let url = self.events_url(slug, contract, token_id);
        let key = self.api_key.as_deref().unwrap_or_default();

        let body = self.http.get_json(&url, &[("x-api-key", key)]).await?;
        let date = earliest_mint(&body);
        debug!(%chain, contract, token_id, ?date, "Events API lookup");
        Ok(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: String, api_key: Option<&str>) -> EventsApiProvider {
        EventsApiProvider::new(&EventsApiConfig {
            base_url,
            api_key: api_key.map(str::to_string),
            rate_limit: 50,
        })
        .unwrap()
    }

    #[test]
    fn availability_needs_key() {
        assert!(provider("http://x".into(), Some("k")).is_available());
        assert!(!provider("http://x".into(), Some("  ")).is_available());
        assert!(!provider("http://x".into(), None).is_available());
    }

    #[test]
    fn chain_support() {
        let p = provider("http://x".into(), Some("k"));
        assert!(p.supports(Chain::Ethereum));
        assert!(p.supports(Chain::Polygon));
        assert!(!p.supports(Chain::Tezos));
    }

    #[test]
    fn earliest_mint_from_mixed_payload() {
        let body = json!({"asset_events": [
            {"from_address": "0xabc", "to_address": "0xdef", "event_timestamp": 1600000000},
            {"from_address": "0x0000000000000000000000000000000000000000", "to_address": "0xabc", "event_timestamp": 1500000100},
            {"from": null, "to": "0xabc", "timestamp": "2017-07-14T02:40:00Z"},
        ]});
        assert_eq!(
            earliest_mint(&body),
            Some(Utc.with_ymd_and_hms(2017, 7, 14, 2, 40, 0).unwrap())
        );

        let transfers_only = json!({"events": [
            {"from": "0xabc", "to": "0xdef", "timestamp": 1600000000}
        ]});
        assert_eq!(earliest_mint(&transfers_only), None);
        assert_eq!(earliest_mint(&json!({})), None);
    }

    #[test]
    fn events_without_sender_are_not_mints() {
        let body = json!({"asset_events": [
            {"event_type": "sale", "event_timestamp": 1400000000},
            {"from_address": {"address": "0xabc"}, "event_timestamp": 1450000000},
            {"from_address": "", "event_timestamp": 1500000000},
            {"from_address": "0xabc", "event_timestamp": 1300000000},
        ]});
        assert_eq!(
            earliest_mint(&body),
            Some(Utc.timestamp_opt(1500000000, 0).unwrap())
        );

        let unsent = json!({"events": [{"timestamp": "2017-07-14T02:40:00Z"}]});
        assert_eq!(earliest_mint(&unsent), None);
    }

    #[tokio::test]
    async fn fetches_from_events_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events/chain/ethereum/contract/0xabc/nfts/42"))
            .and(query_param("event_type", "transfer"))
            .and(header("x-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "asset_events": [
                    {"from_address": "0x0000000000000000000000000000000000000000", "event_timestamp": 1622505600}
                ],
                "next": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let p = provider(server.uri(), Some("secret"));
        let date = p
            .fetch_mint_date(Chain::Ethereum, "0xabc", "42")
            .await
            .unwrap();
        assert_eq!(date, Some(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()));
    }

    #[tokio::test]
    async fn unsupported_chain_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let p = provider(server.uri(), Some("secret"));
        assert_eq!(p.fetch_mint_date(Chain::Tezos, "KT1", "1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn http_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let p = provider(server.uri(), Some("bad"));
        assert!(p.fetch_mint_date(Chain::Base, "0x1", "1").await.is_err());
    }
}
