//! Rate-limited JSON client shared by the remote providers.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RETRIES: u32 = 3;
/// Longest `Retry-After` honoured; anything above gives up on the request.
const MAX_RETRY_WAIT_SECS: u64 = 5;

/// `reqwest` client with a token bucket and 429 back-off.
pub(crate) struct ApiClient {
    client: reqwest::Client,
    label: &'static str,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl ApiClient {
    /// `requests_per_second` of zero is treated as one.
    pub(crate) fn new(label: &'static str, requests_per_second: u32) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .with_context(|| format!("failed to build HTTP client for {label}"))?;

        let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            label,
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    /// GET `url` and decode the body as JSON, retrying on HTTP 429.
    pub(crate) async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> anyhow::Result<serde_json::Value> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let mut request = self.client.get(url).header("accept", "application/json");
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            let resp = request
                .send()
                .await
                .with_context(|| format!("{} request failed", self.label))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(1);
                if wait > MAX_RETRY_WAIT_SECS {
                    warn!(
                        provider = self.label,
                        wait_secs = wait,
                        "Provider asked for a long back-off, giving up"
                    );
                    anyhow::bail!("{} rate limited for {}s", self.label, wait);
                }
                warn!(
                    provider = self.label,
                    retry = retries,
                    wait_secs = wait,
                    "Provider returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            let resp = resp
                .error_for_status()
                .with_context(|| format!("{} request returned error", self.label))?;

            debug!(provider = self.label, status = %resp.status(), "Provider responded");

            return resp
                .json()
                .await
                .with_context(|| format!("{} returned invalid JSON", self.label));
        }
    }
}
