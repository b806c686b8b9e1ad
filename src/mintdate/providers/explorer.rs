//! Block-explorer provider (Etherscan-compatible `tokennfttx`).

use anyhow::Context;
use artforged_common::Chain;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::http::ApiClient;
use super::is_mint_sender;
use crate::config::ExplorerConfig;
use crate::media::urlencoded;
use crate::mintdate::parse_date;
use crate::mintdate::provider::{CandidateSource, MintDateProvider};

/// Transfers requested per page.
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct ExplorerTransfer {
    #[serde(rename = "timeStamp")]
    time_stamp: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(rename = "tokenID")]
    token_id: String,
}

/// Mint dates from one chain's explorer transaction history.
pub struct ExplorerProvider {
    http: ApiClient,
    chain: Chain,
    endpoint: String,
    api_key: Option<String>,
}

impl ExplorerProvider {
    /// `Ok(None)` when no endpoint is configured or known for the chain.
    pub fn new(config: &ExplorerConfig) -> anyhow::Result<Option<Self>> {
        let Some(endpoint) = config.endpoint() else {
            return Ok(None);
        };
        Ok(Some(Self {
            http: ApiClient::new(explorer_name(config.chain), config.rate_limit)?,
            chain: config.chain,
            endpoint,
            api_key: config
                .has_credentials()
                .then(|| config.api_key.clone())
                .flatten(),
        }))
    }

    fn url(&self, contract: &str, api_key: &str) -> String {
        format!(
            "{}?module=account&action=tokennfttx&contractaddress={}&page=1&offset={PAGE_SIZE}&startblock=0&sort=asc&apikey={}",
            self.endpoint,
            urlencoded(contract),
            urlencoded(api_key)
        )
    }
}

fn explorer_name(chain: Chain) -> &'static str {
    match chain {
        Chain::Ethereum => "etherscan",
        Chain::Base => "basescan",
        Chain::Polygon => "polygonscan",
        Chain::Arbitrum => "arbiscan",
        Chain::Optimism => "optimistic-etherscan",
        Chain::Zora => "zora-explorer",
        Chain::Tezos => "tezos-explorer",
    }
}

/// Earliest mint of `token_id` in an explorer response.
fn earliest_mint(response: ExplorerResponse, token_id: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
    if response.status != "1" {
        if response.message.starts_with("No transactions") {
            return Ok(None);
        }
        anyhow::bail!(
            "explorer error: {} ({})",
            response.message,
            response.result.as_str().unwrap_or_default()
        );
    }

    let transfers: Vec<ExplorerTransfer> =
        serde_json::from_value(response.result).context("unexpected explorer result shape")?;

    Ok(transfers
        .iter()
        .filter(|t| t.token_id == token_id && is_mint_sender(t.from.as_deref()))
        .filter_map(|t| parse_date(&t.time_stamp))
        .min())
}

#[async_trait]
impl MintDateProvider for ExplorerProvider {
    fn name(&self) -> &'static str {
        explorer_name(self.chain)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn supports(&self, chain: Chain) -> bool {
        chain == self.chain
    }

    fn source(&self) -> CandidateSource {
        CandidateSource::ExplorerApi
    }

    async fn fetch_mint_date(
        &self,
        chain: Chain,
        contract: &str,
        token_id: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        if chain != self.chain {
            return Ok(None);
        }

        let body = self.http.get_json(&self.url(contract, api_key), &[]).await?;
        let response: ExplorerResponse =
            serde_json::from_value(body).context("unexpected explorer response")?;
        let date = earliest_mint(response, token_id)?;
        debug!(%chain, contract, token_id, ?date, "Explorer lookup");
        Ok(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: Option<String>, api_key: Option<&str>) -> ExplorerConfig {
        ExplorerConfig {
            chain: Chain::Ethereum,
            base_url,
            api_key: api_key.map(str::to_string),
            enabled: true,
            rate_limit: 50,
        }
    }

    #[test]
    fn construction() {
        let p = ExplorerProvider::new(&config(None, Some("k"))).unwrap().unwrap();
        assert_eq!(p.name(), "etherscan");
        assert!(p.is_available());
        assert!(p.supports(Chain::Ethereum));
        assert!(!p.supports(Chain::Base));

        let keyless = ExplorerProvider::new(&config(None, None)).unwrap().unwrap();
        assert!(!keyless.is_available());

        let mut zora = config(None, Some("k"));
        zora.chain = Chain::Zora;
        assert!(ExplorerProvider::new(&zora).unwrap().is_none());
    }

    #[test]
    fn no_transactions_is_none() {
        let response: ExplorerResponse = serde_json::from_value(json!({
            "status": "0", "message": "No transactions found", "result": []
        }))
        .unwrap();
        assert_eq!(earliest_mint(response, "1").unwrap(), None);

        let error: ExplorerResponse = serde_json::from_value(json!({
            "status": "0", "message": "NOTOK", "result": "Invalid API Key"
        }))
        .unwrap();
        let err = earliest_mint(error, "1").unwrap_err();
        assert!(err.to_string().contains("Invalid API Key"));
    }

    #[tokio::test]
    async fn filters_by_token_and_sender() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("action", "tokennfttx"))
            .and(query_param("contractaddress", "0xabc"))
            .and(query_param("apikey", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "message": "OK",
                "result": [
                    {"timeStamp": "1500000000", "from": "0x0000000000000000000000000000000000000000", "tokenID": "1"},
                    {"timeStamp": "1600000000", "from": "0x0000000000000000000000000000000000000000", "tokenID": "7"},
                    {"timeStamp": "1550000000", "from": "0x1111111111111111111111111111111111111111", "tokenID": "7"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let p = ExplorerProvider::new(&config(Some(format!("{}/api", server.uri())), Some("k")))
            .unwrap()
            .unwrap();
        let date = p.fetch_mint_date(Chain::Ethereum, "0xabc", "7").await.unwrap();
        assert_eq!(date, Some(Utc.timestamp_opt(1_600_000_000, 0).unwrap()));
    }

    #[tokio::test]
    async fn keyless_provider_never_calls_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let p = ExplorerProvider::new(&config(Some(server.uri()), None))
            .unwrap()
            .unwrap();
        assert_eq!(p.fetch_mint_date(Chain::Ethereum, "0xabc", "7").await.unwrap(), None);
    }
}
