//! Gateway rewriting and fetch-with-fallback.
//!
//! Content-addressed references are tried against an ordered gateway list,
//! one request per gateway with a short timeout, accepting the first 2xx.
//! HTTP references get a single direct fetch and `data:` URIs are decoded
//! in-process. Bodies are sampled, never downloaded in full.

use std::collections::VecDeque;
use std::sync::Arc;

use artforged_common::{Error, Result, Scheme};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use bytes::{Bytes, BytesMut};
use dashmap::DashMap;
use parking_lot::Mutex;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tracing::{debug, warn};

use super::reference::{classify, MediaReference};
use crate::config::GatewayConfig;

/// Outcome class of a single gateway request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Success,
    Timeout,
    NotFound,
    InvalidContent,
    /// Connection-level failure (refused, reset, DNS)
    Unreachable,
}

/// One gateway request, kept only for logging.
#[derive(Debug, Clone)]
pub struct ResolutionAttempt {
    pub gateway: String,
    pub status: AttemptStatus,
    pub mime: Option<String>,
    pub bytes_sampled: usize,
}

/// Sampled response for a resolved reference.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    /// URL that answered
    pub url: String,
    /// Gateway base used, `None` for direct and `data:` fetches
    pub gateway: Option<String>,
    /// Raw `Content-Type` header
    pub content_type: Option<String>,
    /// Full payload size, when the server reported it
    pub content_length: Option<u64>,
    /// Leading bytes of the body
    pub sample: Bytes,
    /// Whether `sample` holds the whole body
    pub complete: bool,
}

impl FetchedMedia {
    /// Whether this response can answer a request for `limit` bytes.
    pub fn covers(&self, limit: usize) -> bool {
        self.complete || self.sample.len() >= limit
    }
}

/// Bounded response cache keyed by final URL, evicting oldest first.
pub struct ResponseCache {
    entries: DashMap<String, Arc<FetchedMedia>>,
    order: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Cached response for `url` holding at least `limit` bytes (or the
    /// whole body).
    pub fn get(&self, url: &str, limit: usize) -> Option<Arc<FetchedMedia>> {
        let hit = self.entries.get(url)?;
        hit.covers(limit).then(|| Arc::clone(hit.value()))
    }

    pub fn insert(&self, url: String, fetched: Arc<FetchedMedia>) {
        if self.capacity == 0 {
            return;
        }
        let mut order = self.order.lock();
        if self.entries.insert(url.clone(), fetched).is_some() {
            return;
        }
        order.push_back(url);
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes held across all cached samples.
    pub fn retained_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.value().sample.len()).sum()
    }
}

/// Gateway cascade with an optional response cache.
pub struct GatewayResolver {
    client: reqwest::Client,
    gateways: GatewayConfig,
    max_sample_bytes: usize,
    cache: Option<ResponseCache>,
}

impl GatewayResolver {
    /// Build a resolver; the per-gateway timeout comes from `gateways`.
    pub fn new(gateways: GatewayConfig, max_sample_bytes: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("artforged/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, gateways, max_sample_bytes))
    }

    /// Build a resolver around an existing HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        gateways: GatewayConfig,
        max_sample_bytes: usize,
    ) -> Self {
        let cache = gateways
            .cache_responses
            .then(|| ResponseCache::new(gateways.cache_capacity));
        Self {
            client,
            gateways,
            max_sample_bytes,
            cache,
        }
    }

    pub fn gateways(&self) -> &GatewayConfig {
        &self.gateways
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Ordered candidate URLs for a reference.
    pub fn candidate_urls(&self, reference: &MediaReference) -> Vec<String> {
        candidate_urls(&self.gateways, reference)
    }

    /// Resolve a reference, sampling up to the configured byte budget.
    pub async fn resolve(&self, reference: &MediaReference) -> Result<Arc<FetchedMedia>> {
        self.resolve_with_limit(reference, self.max_sample_bytes).await
    }

    /// Resolve a reference, sampling at most `limit` bytes of the body.
    ///
    /// Returns [`Error::GatewayExhausted`] when every candidate failed; the
    /// caller treats that as "unresolved" and falls back to heuristics.
    pub async fn resolve_with_limit(
        &self,
        reference: &MediaReference,
        limit: usize,
    ) -> Result<Arc<FetchedMedia>> {
        if reference.scheme == Scheme::Data {
            return decode_data_uri(&reference.raw).map(Arc::new);
        }

        let bases = self.gateways.for_scheme(reference.scheme);
        let candidates = self.candidate_urls(reference);
        let mut attempts = Vec::with_capacity(candidates.len());

        if let Some(cache) = &self.cache {
            if let Some(hit) = candidates.iter().find_map(|url| cache.get(url, limit)) {
                debug!(url = %hit.url, "Response cache hit");
                return Ok(hit);
            }
        }

        for (idx, url) in candidates.iter().enumerate() {
            let gateway = bases.get(idx).cloned();
            let (attempt, fetched) = self.fetch(url, gateway.as_deref(), limit).await;
            debug!(
                reference = %reference,
                gateway = %attempt.gateway,
                status = ?attempt.status,
                mime = ?attempt.mime,
                bytes_sampled = attempt.bytes_sampled,
                "Gateway attempt"
            );
            attempts.push(attempt);

            if let Some(fetched) = fetched {
                let fetched = Arc::new(FetchedMedia { gateway, ..fetched });
                if let Some(cache) = &self.cache {
                    cache.insert(url.clone(), Arc::clone(&fetched));
                }
                return Ok(fetched);
            }
        }

        let last = attempts.last().map(|a| a.gateway.as_str()).unwrap_or("none");
        warn!(
            reference = %reference,
            attempts = attempts.len(),
            last_gateway = %last,
            "Gateway cascade exhausted"
        );
        Err(Error::gateway_exhausted(reference.raw.clone(), attempts.len()))
    }

    /// Issue one GET and sample the body.
    async fn fetch(
        &self,
        url: &str,
        gateway: Option<&str>,
        limit: usize,
    ) -> (ResolutionAttempt, Option<FetchedMedia>) {
        let mut attempt = ResolutionAttempt {
            gateway: gateway.unwrap_or(url).to_string(),
            status: AttemptStatus::Success,
            mime: None,
            bytes_sampled: 0,
        };

        let response = match self
            .client
            .get(url)
            .timeout(self.gateways.timeout())
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                attempt.status = if e.is_timeout() {
                    AttemptStatus::Timeout
                } else {
                    AttemptStatus::Unreachable
                };
                debug!(url = %url, error = %e, "Gateway request failed");
                return (attempt, None);
            }
        };

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Gateway returned non-2xx");
            attempt.status = AttemptStatus::NotFound;
            return (attempt, None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        attempt.mime = content_type.clone();

        let (sample, complete) = match read_sample(response, limit).await {
            Ok(read) => read,
            Err(e) => {
                attempt.status = if e.is_timeout() {
                    AttemptStatus::Timeout
                } else {
                    AttemptStatus::InvalidContent
                };
                debug!(url = %url, error = %e, "Failed reading response body");
                return (attempt, None);
            }
        };
        attempt.bytes_sampled = sample.len();

        let fetched = FetchedMedia {
            url: url.to_string(),
            gateway: None,
            content_type,
            content_length,
            sample,
            complete,
        };
        (attempt, Some(fetched))
    }
}

/// Read at most `limit` bytes chunk-wise, then drop the rest of the body.
/// The flag reports whether the body ended within the limit.
async fn read_sample(
    mut response: reqwest::Response,
    limit: usize,
) -> reqwest::Result<(Bytes, bool)> {
    let mut buf = BytesMut::new();
    let mut complete = false;
    while buf.len() < limit {
        match response.chunk().await? {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => {
                complete = true;
                break;
            }
        }
    }
    buf.truncate(limit);
    Ok((buf.freeze(), complete))
}

/// Ordered candidate URLs for a reference under a gateway configuration.
///
/// Content-addressed references expand to `base + cid + path` for each
/// gateway in order; everything else is its own single candidate.
pub fn candidate_urls(gateways: &GatewayConfig, reference: &MediaReference) -> Vec<String> {
    match reference.address() {
        Some(address) if reference.is_content_addressed() => gateways
            .for_scheme(reference.scheme)
            .iter()
            .map(|base| format!("{base}{address}"))
            .collect(),
        _ => vec![reference.raw.clone()],
    }
}

/// Recover the content address from an already-resolved gateway URL.
///
/// Recognises configured gateway prefixes, the `/ipfs/<cid>` path form on any
/// host, the `<cid>.ipfs.<host>` subdomain form, and `arweave.net/<id>`.
pub fn content_address_from_url(gateways: &GatewayConfig, url: &str) -> Option<MediaReference> {
    let url = url.trim();

    for (prefix, list) in [
        ("ipfs://", &gateways.ipfs),
        ("ar://", &gateways.arweave),
        ("onchfs://", &gateways.onchfs),
    ] {
        if let Some(rest) = list.iter().find_map(|base| url.strip_prefix(base.as_str())) {
            return addressed(&format!("{prefix}{rest}"));
        }
    }

    let (_, after_scheme) = url.split_once("://")?;
    let (host, path) = match after_scheme.find('/') {
        Some(idx) => after_scheme.split_at(idx),
        None => (after_scheme, ""),
    };

    if let Some(idx) = path.find("/ipfs/") {
        return addressed(&format!("ipfs://{}", &path[idx + 6..]));
    }
    if let Some((cid, _)) = host.split_once(".ipfs.") {
        return addressed(&format!("ipfs://{cid}{path}"));
    }
    if host.eq_ignore_ascii_case("arweave.net") || host.ends_with(".arweave.net") {
        let id = path.trim_start_matches('/');
        return addressed(&format!("ar://{id}"));
    }
    None
}

fn addressed(uri: &str) -> Option<MediaReference> {
    classify(uri).filter(MediaReference::is_content_addressed)
}

/// Standard alphabet, padding optional (inline SVG/PNG payloads often drop it).
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a `data:` URI in-process.
pub fn decode_data_uri(uri: &str) -> Result<FetchedMedia> {
    let body = uri
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .and_then(|_| uri.get(5..))
        .ok_or_else(|| Error::invalid_input("not a data: URI"))?;
    let (header, payload) = body
        .split_once(',')
        .ok_or_else(|| Error::invalid_input("data: URI without ','"))?;

    let (media_type, is_base64) = match header.strip_suffix(";base64") {
        Some(mt) => (mt, true),
        None => (header, false),
    };

    let bytes = if is_base64 {
        let cleaned: String = urlencoding::decode_binary(payload.as_bytes())
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|b| char::from(*b))
            .collect();
        LENIENT_BASE64
            .decode(cleaned)
            .map_err(|e| Error::invalid_input(format!("bad base64 in data: URI: {e}")))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    let content_type = if media_type.is_empty() {
        "text/plain;charset=US-ASCII".to_string()
    } else {
        media_type.to_string()
    };

    Ok(FetchedMedia {
        url: uri.to_string(),
        gateway: None,
        content_type: Some(content_type),
        content_length: Some(bytes.len() as u64),
        sample: Bytes::from(bytes),
        complete: true,
    })
}

/// Percent-encode a path or query component.
pub fn urlencoded(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

    #[test]
    fn test_urlencoded() {
        assert_eq!(urlencoded("0xAbC"), "0xAbC");
        assert_eq!(urlencoded("a b/c"), "a%20b%2Fc");
        assert_eq!(urlencoded("https://x/ipfs/Qm?a=1"), "https%3A%2F%2Fx%2Fipfs%2FQm%3Fa%3D1");
    }

    fn gateways() -> GatewayConfig {
        GatewayConfig {
            ipfs: vec![
                "https://g1.example/ipfs/".to_string(),
                "https://g2.example/ipfs/".to_string(),
            ],
            arweave: vec!["https://arweave.net/".to_string()],
            onchfs: vec!["https://onchfs.example/".to_string()],
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn test_candidate_urls_keep_path_verbatim() {
        let r = classify(&format!("ipfs://{CID}/dir/thumb.png?w=1#frag")).unwrap();
        assert_eq!(
            candidate_urls(&gateways(), &r),
            vec![
                format!("https://g1.example/ipfs/{CID}/dir/thumb.png?w=1#frag"),
                format!("https://g2.example/ipfs/{CID}/dir/thumb.png?w=1#frag"),
            ]
        );
    }

    #[test]
    fn test_candidate_urls_passthrough() {
        let r = classify("https://example.com/a.png").unwrap();
        assert_eq!(candidate_urls(&gateways(), &r), vec!["https://example.com/a.png"]);

        let r = classify("onchfs://abc123/index.html").unwrap();
        assert_eq!(
            candidate_urls(&gateways(), &r),
            vec!["https://onchfs.example/abc123/index.html"]
        );
    }

    #[test]
    fn test_content_address_from_configured_gateway() {
        let url = format!("https://g2.example/ipfs/{CID}/a.png");
        let r = content_address_from_url(&gateways(), &url).unwrap();
        assert_eq!(r.scheme, Scheme::Ipfs);
        assert_eq!(r.cid.as_deref(), Some(CID));
        assert_eq!(r.path.as_deref(), Some("/a.png"));
    }

    #[test]
    fn test_content_address_from_foreign_gateway_forms() {
        let r = content_address_from_url(&gateways(), &format!("https://nftstorage.link/ipfs/{CID}"))
            .unwrap();
        assert_eq!(r.cid.as_deref(), Some(CID));

        let r = content_address_from_url(&gateways(), &format!("https://{CID}.ipfs.w3s.link/x.gif"))
            .unwrap();
        assert_eq!(r.cid.as_deref(), Some(CID));
        assert_eq!(r.path.as_deref(), Some("/x.gif"));

        let r = content_address_from_url(
            &gateways(),
            "https://www.arweave.net/bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U",
        )
        .unwrap();
        assert_eq!(r.scheme, Scheme::Arweave);

        assert!(content_address_from_url(&gateways(), "https://example.com/a.png").is_none());
        assert!(content_address_from_url(&gateways(), "not a url").is_none());
    }

    #[test]
    fn test_decode_base64_data_uri() {
        let fetched = decode_data_uri("data:image/gif;base64,R0lGODlhAQABAAAAACw=").unwrap();
        assert_eq!(fetched.content_type.as_deref(), Some("image/gif"));
        assert!(fetched.sample.starts_with(b"GIF89a"));
        assert!(fetched.gateway.is_none());
    }

    #[test]
    fn test_decode_percent_data_uri() {
        let fetched = decode_data_uri("data:image/svg+xml,%3Csvg%20xmlns%3D%22x%22%2F%3E").unwrap();
        assert_eq!(fetched.content_type.as_deref(), Some("image/svg+xml"));
        assert_eq!(&fetched.sample[..], b"<svg xmlns=\"x\"/>");

        let fetched = decode_data_uri("data:,hello%2").unwrap();
        assert_eq!(fetched.content_type.as_deref(), Some("text/plain;charset=US-ASCII"));
        assert_eq!(&fetched.sample[..], b"hello%2");
    }

    #[test]
    fn test_decode_percent_data_uri_keeps_binary_bytes() {
        let fetched = decode_data_uri("data:application/octet-stream,%89PNG%0D%0A%1A%0A%FF").unwrap();
        assert_eq!(&fetched.sample[..], b"\x89PNG\r\n\x1a\n\xff");
        assert!(fetched.complete);
    }

    fn sample_of(url: &str, len: usize, complete: bool) -> Arc<FetchedMedia> {
        Arc::new(FetchedMedia {
            url: url.to_string(),
            gateway: None,
            content_type: Some("image/png".to_string()),
            content_length: None,
            sample: Bytes::from(vec![0u8; len]),
            complete,
        })
    }

    #[test]
    fn test_response_cache_evicts_oldest() {
        let cache = ResponseCache::new(2);
        cache.insert("a".to_string(), sample_of("a", 8, true));
        cache.insert("b".to_string(), sample_of("b", 8, true));
        cache.insert("a".to_string(), sample_of("a", 8, true));
        assert_eq!(cache.len(), 2);

        cache.insert("c".to_string(), sample_of("c", 8, true));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a", 8).is_none());
        assert!(cache.get("b", 8).is_some());
        assert!(cache.get("c", 8).is_some());

        let disabled = ResponseCache::new(0);
        disabled.insert("a".to_string(), sample_of("a", 8, true));
        assert!(disabled.is_empty());
    }

    #[test]
    fn test_response_cache_respects_limit() {
        let cache = ResponseCache::new(4);
        cache.insert("short".to_string(), sample_of("short", 16, false));
        cache.insert("whole".to_string(), sample_of("whole", 16, true));

        assert!(cache.get("short", 16).is_some());
        assert!(cache.get("short", 8).is_some());
        assert!(cache.get("short", 4096).is_none());
        assert!(cache.get("whole", 4096).is_some());
    }

    fn http_resolver(capacity: usize) -> GatewayResolver {
        let config = GatewayConfig {
            timeout_ms: 2_000,
            cache_capacity: capacity,
            ..GatewayConfig::default()
        };
        GatewayResolver::with_client(reqwest::Client::new(), config, 4096)
    }

    #[tokio::test]
    async fn cache_stays_within_capacity() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![7u8; 64]),
            )
            .mount(&server)
            .await;

        let resolver = http_resolver(3);
        for i in 0..10 {
            let r = classify(&format!("{}/item/{i}", server.uri())).unwrap();
            resolver.resolve(&r).await.unwrap();
        }
        let cache = resolver.cache().unwrap();
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.retained_bytes(), 3 * 64);
    }

    #[tokio::test]
    async fn short_cached_sample_is_refetched_for_larger_limit() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 1024]))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/small.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8; 10]))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = http_resolver(8);
        let big = classify(&format!("{}/big.bin", server.uri())).unwrap();
        let first = resolver.resolve_with_limit(&big, 16).await.unwrap();
        assert_eq!(first.sample.len(), 16);
        assert!(!first.complete);

        let again = resolver.resolve_with_limit(&big, 16).await.unwrap();
        assert_eq!(again.sample.len(), 16);

        let larger = resolver.resolve_with_limit(&big, 512).await.unwrap();
        assert_eq!(larger.sample.len(), 512);

        let small = classify(&format!("{}/small.bin", server.uri())).unwrap();
        let whole = resolver.resolve_with_limit(&small, 16).await.unwrap();
        assert!(whole.complete);
        let reused = resolver.resolve_with_limit(&small, 4096).await.unwrap();
        assert_eq!(reused.sample.len(), 10);

        server.verify().await;
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("https://x").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!!").is_err());
    }
}
