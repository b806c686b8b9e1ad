//! Core type definitions for media references, roles, chains, and provenance.
//!
//! All enums serialize in lowercase (or kebab-case where the value is a
//! multi-word label) so the JSON handed to the persistence boundary stays
//! stable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Addressing scheme of a classified media URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// IPFS content (`ipfs://`, bare `Qm…`/`bafy…` CIDs).
    Ipfs,
    /// Arweave transaction (`ar://`, bare 43-char ids).
    Arweave,
    /// fxhash on-chain file system (`onchfs://`).
    OnchFs,
    /// Plain `http://` or `https://` URL.
    Http,
    /// Inline `data:` URI.
    Data,
    /// Unrecognised string, passed through untouched.
    Raw,
}

impl Scheme {
    /// Whether references of this scheme are rewritten through gateways.
    pub fn is_content_addressed(self) -> bool {
        matches!(self, Self::Ipfs | Self::Arweave | Self::OnchFs)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipfs => write!(f, "ipfs"),
            Self::Arweave => write!(f, "arweave"),
            Self::OnchFs => write!(f, "onchfs"),
            Self::Http => write!(f, "http"),
            Self::Data => write!(f, "data"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

/// Logical slot a media URL fills for an artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaRole {
    /// Still image / display asset.
    Image,
    /// Animation or video asset.
    Animation,
    /// Interactive generator (HTML/JS) asset.
    Generator,
    /// Small preview image.
    Thumbnail,
}

impl MediaRole {
    /// All roles in resolution order.
    pub const ALL: [MediaRole; 4] = [
        MediaRole::Image,
        MediaRole::Animation,
        MediaRole::Generator,
        MediaRole::Thumbnail,
    ];
}

impl fmt::Display for MediaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Animation => write!(f, "animation"),
            Self::Generator => write!(f, "generator"),
            Self::Thumbnail => write!(f, "thumbnail"),
        }
    }
}

/// Blockchain a record was indexed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Tezos,
    Base,
    Polygon,
    Arbitrum,
    Optimism,
    Zora,
}

impl Chain {
    /// Whether the chain uses EVM addresses (and therefore the zero address
    /// as the mint sender).
    pub fn is_evm(self) -> bool {
        !matches!(self, Self::Tezos)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ethereum => write!(f, "ethereum"),
            Self::Tezos => write!(f, "tezos"),
            Self::Base => write!(f, "base"),
            Self::Polygon => write!(f, "polygon"),
            Self::Arbitrum => write!(f, "arbitrum"),
            Self::Optimism => write!(f, "optimism"),
            Self::Zora => write!(f, "zora"),
        }
    }
}

impl std::str::FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" | "mainnet" => Ok(Self::Ethereum),
            "tezos" | "xtz" => Ok(Self::Tezos),
            "base" => Ok(Self::Base),
            "polygon" | "matic" => Ok(Self::Polygon),
            "arbitrum" => Ok(Self::Arbitrum),
            "optimism" => Ok(Self::Optimism),
            "zora" => Ok(Self::Zora),
            _ => Err(format!("Unknown chain: {}", s)),
        }
    }
}

/// Which strategy produced a resolved MIME type. Confidence is implied by the
/// variant: `Declared` is strongest, `FallbackDefault` weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MimeSource {
    /// Stated by the source metadata (directly or via a structural hint).
    Declared,
    /// Inferred from URL patterns or the extension table.
    PlatformHeuristic,
    /// Taken from the fetched response's `Content-Type`.
    Header,
    /// Detected from the leading bytes of the payload.
    BufferSniff,
    /// Guessed from the media role alone.
    FallbackDefault,
}

impl MimeSource {
    /// Whether the value was observed on the wire rather than inferred.
    pub fn is_observed(self) -> bool {
        matches!(self, Self::Header | Self::BufferSniff)
    }
}

impl fmt::Display for MimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "declared"),
            Self::PlatformHeuristic => write!(f, "platform-heuristic"),
            Self::Header => write!(f, "header"),
            Self::BufferSniff => write!(f, "buffer-sniff"),
            Self::FallbackDefault => write!(f, "fallback-default"),
        }
    }
}

/// Whether a resolved URL was confirmed reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    /// A fetch succeeded against this URL.
    Verified,
    /// No fetch was needed; the URL is the first candidate.
    Unverified,
    /// Every fetch attempt failed.
    Unreachable,
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Unverified => write!(f, "unverified"),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Pixel dimensions. Both sides are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Build dimensions, rejecting a zero width or height.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Parse `"1920x1080"`, `"1920 × 1080"` or `"1920X1080px"`.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('×', "x");
        let normalized = normalized.trim_end_matches("px");
        let (w, h) = normalized.split_once('x')?;
        let width = w.trim().parse::<f64>().ok()?;
        let height = h.trim().trim_end_matches("px").trim().parse::<f64>().ok()?;
        if !(width.is_finite() && height.is_finite()) || width < 1.0 || height < 1.0 {
            return None;
        }
        Self::new(width.round() as u32, height.round() as u32)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_source_serialization() {
        let json = serde_json::to_string(&MimeSource::PlatformHeuristic).unwrap();
        assert_eq!(json, r#""platform-heuristic""#);

        let json = serde_json::to_string(&MimeSource::BufferSniff).unwrap();
        assert_eq!(json, r#""buffer-sniff""#);

        let back: MimeSource = serde_json::from_str(r#""fallback-default""#).unwrap();
        assert_eq!(back, MimeSource::FallbackDefault);
    }

    #[test]
    fn test_mime_source_display_matches_serde() {
        for source in [
            MimeSource::Declared,
            MimeSource::PlatformHeuristic,
            MimeSource::Header,
            MimeSource::BufferSniff,
            MimeSource::FallbackDefault,
        ] {
            let json = serde_json::to_string(&source).unwrap();
            assert_eq!(json.trim_matches('"'), source.to_string());
        }
    }

    #[test]
    fn test_scheme_content_addressed() {
        assert!(Scheme::Ipfs.is_content_addressed());
        assert!(Scheme::Arweave.is_content_addressed());
        assert!(Scheme::OnchFs.is_content_addressed());
        assert!(!Scheme::Http.is_content_addressed());
        assert!(!Scheme::Data.is_content_addressed());
        assert!(!Scheme::Raw.is_content_addressed());
    }

    #[test]
    fn test_chain_from_str() {
        assert_eq!("ETH".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert_eq!("tezos".parse::<Chain>().unwrap(), Chain::Tezos);
        assert_eq!(" base ".parse::<Chain>().unwrap(), Chain::Base);
        assert!("solana".parse::<Chain>().is_err());
        assert!(Chain::Base.is_evm());
        assert!(!Chain::Tezos.is_evm());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(MediaRole::Image.to_string(), "image");
        assert_eq!(MediaRole::Generator.to_string(), "generator");
        assert_eq!(MediaRole::ALL.len(), 4);
    }

    #[test]
    fn test_dimensions_reject_zero() {
        assert!(Dimensions::new(0, 10).is_none());
        assert!(Dimensions::new(10, 0).is_none());
        assert_eq!(
            Dimensions::new(37, 53),
            Some(Dimensions {
                width: 37,
                height: 53
            })
        );
    }

    #[test]
    fn test_dimensions_parse() {
        assert_eq!(Dimensions::parse("1920x1080"), Dimensions::new(1920, 1080));
        assert_eq!(Dimensions::parse("800 × 600"), Dimensions::new(800, 600));
        assert_eq!(Dimensions::parse("1000X2000px"), Dimensions::new(1000, 2000));
        assert_eq!(Dimensions::parse("0x100"), None);
        assert_eq!(Dimensions::parse("wide"), None);
        assert_eq!(Dimensions::parse("12"), None);
    }
}
