//! MIME type strategy chain.
//!
//! Strategies, strongest first:
//!
//! 1. declared MIME from the source metadata
//! 2. structural hint (role-keyed nested media object)
//! 3. platform heuristic (URL patterns, then the extension table)
//! 4. `Content-Type` of a fetched response
//! 5. magic bytes of the sampled body
//! 6. context guess from the media role
//!
//! Strategies 1-3 need no network and decide whether a fetch is required at
//! all. When a fetch happens anyway (for dimensions, say), observed evidence
//! from 4 and 5 replaces a platform guess but never a declared value.

use artforged_common::{mime, MediaRole, MimeSource};
use regex::Regex;
use tracing::{debug, warn};

use super::gateway::FetchedMedia;

/// URL patterns for known generative and interactive art platforms.
const PLATFORM_PATTERNS: &[(&str, &str)] = &[
    // fxhash and Art Blocks style generator endpoints
    (r"(?i)generator", "text/html"),
    // fxhash on-chain file system projects are HTML bundles
    (r"(?i)^onchfs://", "text/html"),
    (r"(?i)(^|[./])fxhash2?\.xyz/", "text/html"),
    // iteration parameters passed to a generative script
    (r"(?i)[?&](fxhash|fxiteration|fxminter|hash|seed)=", "text/html"),
    // Art Blocks hosted renders
    (r"(?i)media(-proxy)?\.artblocks\.io/\d+(\.png)?$", "image/png"),
    (r"(?i)/live/\d+$", "text/html"),
];

/// A MIME type together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sniffed {
    pub mime: String,
    pub source: MimeSource,
}

impl Sniffed {
    fn new(mime: impl Into<String>, source: MimeSource) -> Self {
        Self {
            mime: mime.into(),
            source,
        }
    }
}

/// Everything the chain may look at for one media URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct SniffInput<'a> {
    /// Original reference (`ipfs://…`) or URL
    pub url: &'a str,
    pub declared: Option<&'a str>,
    pub structural: Option<&'a str>,
    pub fetched: Option<&'a FetchedMedia>,
}

/// Compiled strategy chain.
pub struct MimeSniffer {
    platform: Vec<(Regex, &'static str)>,
    size_limit: u64,
    sample_bytes: usize,
}

impl MimeSniffer {
    /// Compile the platform table.
    pub fn new(size_limit: u64, sample_bytes: usize) -> Result<Self, regex::Error> {
        let platform = PLATFORM_PATTERNS
            .iter()
            .map(|(pattern, mime)| Regex::new(pattern).map(|re| (re, *mime)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            platform,
            size_limit,
            sample_bytes,
        })
    }

    /// Strategy 1 and 2: declared values, canonicalised against the whitelist.
    pub fn declared(&self, declared: Option<&str>, structural: Option<&str>) -> Option<Sniffed> {
        [declared, structural]
            .into_iter()
            .flatten()
            .find_map(|raw| whitelisted(raw, "declared"))
            .map(|mime| Sniffed::new(mime, MimeSource::Declared))
    }

    /// Strategy 3: URL patterns first, then the extension table.
    pub fn platform_heuristic(&self, url: &str) -> Option<Sniffed> {
        let mime = self
            .platform
            .iter()
            .find(|(re, _)| re.is_match(url))
            .map(|(_, mime)| *mime)
            .or_else(|| mime::from_path(url))?;
        Some(Sniffed::new(mime, MimeSource::PlatformHeuristic))
    }

    /// Strategies 1-3, no network.
    pub fn pre_fetch(&self, input: &SniffInput<'_>) -> Option<Sniffed> {
        self.declared(input.declared, input.structural)
            .or_else(|| self.platform_heuristic(input.url))
    }

    /// Strategy 4: a whitelisted, non-generic `Content-Type`.
    pub fn from_header(&self, fetched: &FetchedMedia) -> Option<Sniffed> {
        let raw = fetched.content_type.as_deref()?;
        whitelisted(raw, "header").map(|mime| Sniffed::new(mime, MimeSource::Header))
    }

    /// Strategy 5: magic bytes of the first `sample_bytes`, skipped for payloads
    /// known to be at or above the size limit.
    pub fn from_magic(&self, fetched: &FetchedMedia) -> Option<Sniffed> {
        if fetched.content_length.is_some_and(|len| len >= self.size_limit) {
            debug!(url = %fetched.url, "Payload too large for magic-byte sniffing");
            return None;
        }
        let window = &fetched.sample[..fetched.sample.len().min(self.sample_bytes)];
        artforged_probe::sniff(window).map(|mime| Sniffed::new(mime, MimeSource::BufferSniff))
    }

    /// Strategy 6: last-resort guess from the role.
    pub fn context_guess(role: MediaRole) -> Sniffed {
        let mime = match role {
            MediaRole::Animation => "video/mp4",
            MediaRole::Generator => "text/html",
            MediaRole::Image | MediaRole::Thumbnail => "image/png",
        };
        Sniffed::new(mime, MimeSource::FallbackDefault)
    }

    /// Run the whole chain. Always yields a whitelisted MIME type.
    pub fn sniff(&self, input: &SniffInput<'_>, role: MediaRole) -> Sniffed {
        if let Some(declared) = self.declared(input.declared, input.structural) {
            return declared;
        }
        let heuristic = self.platform_heuristic(input.url);
        if let Some(fetched) = input.fetched {
            if let Some(observed) = self.from_header(fetched).or_else(|| self.from_magic(fetched)) {
                return observed;
            }
        }
        heuristic.unwrap_or_else(|| {
            debug!(url = %input.url, role = %role, "MIME sniffing inconclusive, guessing from role");
            Self::context_guess(role)
        })
    }
}

/// Canonicalise a raw MIME value, logging values that fall outside the whitelist.
fn whitelisted(raw: &str, origin: &str) -> Option<String> {
    let canonical = mime::canonicalize(raw);
    if canonical.is_none() && !raw.trim().is_empty() {
        let essence = raw.split(';').next().unwrap_or(raw).trim();
        if !essence.eq_ignore_ascii_case(mime::OCTET_STREAM) {
            warn!(mime = %raw, origin, "Discarding MIME type outside whitelist");
        }
    }
    canonical
}
