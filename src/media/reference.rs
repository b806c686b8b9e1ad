//! URI classification.
//!
//! [`classify`] turns any raw string from a source record into a typed
//! [`MediaReference`]. It is pure and total: the worst case for an
//! unrecognised string is a passthrough with [`Scheme::Raw`].

use std::fmt;

use artforged_common::Scheme;
use serde::{Deserialize, Serialize};

/// Length of a CIDv0 (`Qm…`).
const CID_V0_LEN: usize = 46;

/// Shortest CIDv1 (`bafy…`) accepted without a scheme prefix.
const CID_V1_MIN_LEN: usize = 40;

/// Length of an Arweave transaction id.
const ARWEAVE_ID_LEN: usize = 43;

/// A classified media URI. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaReference {
    pub scheme: Scheme,
    /// Content id (IPFS CID, Arweave id, OnchFS address)
    pub cid: Option<String>,
    /// Remainder after the content id, kept verbatim (leading `/` or `?`)
    pub path: Option<String>,
    /// Trimmed input string
    pub raw: String,
}

impl MediaReference {
    fn passthrough(scheme: Scheme, raw: &str) -> Self {
        Self {
            scheme,
            cid: None,
            path: None,
            raw: raw.to_string(),
        }
    }

    fn addressed(scheme: Scheme, cid: &str, path: &str, raw: &str) -> Self {
        Self {
            scheme,
            cid: Some(cid.to_string()),
            path: (!path.is_empty()).then(|| path.to_string()),
            raw: raw.to_string(),
        }
    }

    /// Whether the reference is rewritten through a gateway list.
    pub fn is_content_addressed(&self) -> bool {
        self.scheme.is_content_addressed() && self.cid.is_some()
    }

    /// Content id followed by the verbatim path, as appended to a gateway base.
    pub fn address(&self) -> Option<String> {
        let cid = self.cid.as_deref()?;
        Some(format!("{cid}{}", self.path.as_deref().unwrap_or("")))
    }

    /// Canonical URI form (`ipfs://<cid><path>`, `ar://…`, `onchfs://…`).
    ///
    /// Passthrough references return their raw string.
    pub fn uri(&self) -> String {
        match (self.scheme, self.address()) {
            (Scheme::Ipfs, Some(addr)) => format!("ipfs://{addr}"),
            (Scheme::Arweave, Some(addr)) => format!("ar://{addr}"),
            (Scheme::OnchFs, Some(addr)) => format!("onchfs://{addr}"),
            _ => self.raw.clone(),
        }
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Classify a raw URI string.
///
/// Returns `None` only for blank input. Rules are applied in order:
/// HTTP(S) and `data:` pass through untouched, then `onchfs://`, `ar://` or a
/// bare Arweave id, then `ipfs://` (also `ipfs:/` and the malformed
/// `ipfs://ipfs/<cid>`), then bare `Qm…`/`bafy…` CIDs. Anything else becomes
/// [`Scheme::Raw`].
///
/// # Examples
///
/// ```
/// use artforged::media::classify;
/// use artforged_common::Scheme;
///
/// let r = classify("ipfs://ipfs/bafybeigdyrzt/thumb.png").unwrap();
/// assert_eq!(r.scheme, Scheme::Ipfs);
/// assert_eq!(r.cid.as_deref(), Some("bafybeigdyrzt"));
/// assert_eq!(r.path.as_deref(), Some("/thumb.png"));
///
/// assert_eq!(classify("https://x.y/a.png").unwrap().scheme, Scheme::Http);
/// assert!(classify("   ").is_none());
/// ```
pub fn classify(raw: &str) -> Option<MediaReference> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if has_prefix(raw, "http://") || has_prefix(raw, "https://") {
        return Some(MediaReference::passthrough(Scheme::Http, raw));
    }
    if has_prefix(raw, "data:") {
        return Some(MediaReference::passthrough(Scheme::Data, raw));
    }

    if let Some(rest) = strip_scheme(raw, "onchfs:") {
        return Some(whole(Scheme::OnchFs, rest, raw));
    }

    if let Some(rest) = strip_scheme(raw, "ar:") {
        return Some(whole(Scheme::Arweave, rest, raw));
    }
    let (head, _) = split_address(raw);
    if head.len() == ARWEAVE_ID_LEN && head.bytes().all(is_base64url) {
        return Some(MediaReference::addressed(Scheme::Arweave, raw, "", raw));
    }

    if let Some(rest) = strip_scheme(raw, "ipfs:") {
        let rest = rest.trim_start_matches('/');
        let rest = strip_ipfs_segment(rest);
        return Some(split(Scheme::Ipfs, rest, raw));
    }

    if is_bare_cid(head) {
        return Some(split(Scheme::Ipfs, raw, raw));
    }

    Some(MediaReference::passthrough(Scheme::Raw, raw))
}

/// Case-insensitive ASCII prefix test.
fn has_prefix(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Strip `scheme:` plus any number of slashes.
fn strip_scheme<'a>(s: &'a str, scheme: &str) -> Option<&'a str> {
    if !has_prefix(s, scheme) {
        return None;
    }
    Some(s[scheme.len()..].trim_start_matches('/'))
}

/// `ipfs://ipfs/<cid>` is a common indexer mistake for `ipfs://<cid>`.
fn strip_ipfs_segment(s: &str) -> &str {
    if has_prefix(s, "ipfs/") {
        s[5..].trim_start_matches('/')
    } else {
        s
    }
}

/// Split `cid/rest?query` at the first `/`, `?` or `#`.
fn split_address(s: &str) -> (&str, &str) {
    match s.find(['/', '?', '#']) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    }
}

fn split(scheme: Scheme, rest: &str, raw: &str) -> MediaReference {
    let (cid, path) = split_address(rest);
    if cid.is_empty() {
        return MediaReference::passthrough(Scheme::Raw, raw);
    }
    MediaReference::addressed(scheme, cid, path, raw)
}

/// Arweave and OnchFS addresses are kept whole.
fn whole(scheme: Scheme, rest: &str, raw: &str) -> MediaReference {
    if rest.is_empty() {
        return MediaReference::passthrough(Scheme::Raw, raw);
    }
    MediaReference::addressed(scheme, rest, "", raw)
}

fn is_base64url(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_base58(b: u8) -> bool {
    b.is_ascii_alphanumeric() && !matches!(b, b'0' | b'O' | b'I' | b'l')
}

fn is_base32_lower(b: u8) -> bool {
    b.is_ascii_lowercase() || (b'2'..=b'7').contains(&b)
}

/// Whether a string is a bare CIDv0 or base32 CIDv1.
pub fn is_bare_cid(s: &str) -> bool {
    if s.starts_with("Qm") {
        return s.len() == CID_V0_LEN && s.bytes().all(is_base58);
    }
    if s.starts_with("bafy") || s.starts_with("bafk") {
        return s.len() >= CID_V1_MIN_LEN && s.bytes().all(is_base32_lower);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID_V0: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
    const CID_V1: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
    const AR_ID: &str = "bNbA3TEQVL60xlgCcqdz4ZPHFZ711cZ3hmkpGttDt_U";

    #[test]
    fn test_http_and_data_pass_through() {
        let r = classify("https://example.com/ipfs/Qm/a.png").unwrap();
        assert_eq!(r.scheme, Scheme::Http);
        assert_eq!(r.cid, None);
        assert_eq!(r.uri(), "https://example.com/ipfs/Qm/a.png");

        let r = classify("HTTP://EXAMPLE.COM").unwrap();
        assert_eq!(r.scheme, Scheme::Http);

        let r = classify("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(r.scheme, Scheme::Data);
    }

    #[test]
    fn test_ipfs_forms() {
        let r = classify(&format!("ipfs://{CID_V1}/thumb.png")).unwrap();
        assert_eq!(r.scheme, Scheme::Ipfs);
        assert_eq!(r.cid.as_deref(), Some(CID_V1));
        assert_eq!(r.path.as_deref(), Some("/thumb.png"));

        let r = classify(&format!("ipfs:/{CID_V0}")).unwrap();
        assert_eq!(r.cid.as_deref(), Some(CID_V0));
        assert_eq!(r.path, None);

        let r = classify(&format!("ipfs://ipfs/{CID_V0}/a/b.html?x=1")).unwrap();
        assert_eq!(r.cid.as_deref(), Some(CID_V0));
        assert_eq!(r.path.as_deref(), Some("/a/b.html?x=1"));
        assert_eq!(r.uri(), format!("ipfs://{CID_V0}/a/b.html?x=1"));
    }

    #[test]
    fn test_query_directly_after_cid_is_kept() {
        let r = classify(&format!("ipfs://{CID_V0}?fxhash=oo123")).unwrap();
        assert_eq!(r.cid.as_deref(), Some(CID_V0));
        assert_eq!(r.path.as_deref(), Some("?fxhash=oo123"));
    }

    #[test]
    fn test_bare_cids() {
        let r = classify(CID_V0).unwrap();
        assert_eq!(r.scheme, Scheme::Ipfs);
        assert_eq!(r.cid.as_deref(), Some(CID_V0));

        let r = classify(&format!("{CID_V1}/index.html")).unwrap();
        assert_eq!(r.scheme, Scheme::Ipfs);
        assert_eq!(r.path.as_deref(), Some("/index.html"));

        // wrong length is not a CIDv0
        assert_eq!(classify("QmShort").unwrap().scheme, Scheme::Raw);
    }

    #[test]
    fn test_arweave_and_onchfs() {
        let r = classify(&format!("ar://{AR_ID}")).unwrap();
        assert_eq!(r.scheme, Scheme::Arweave);
        assert_eq!(r.cid.as_deref(), Some(AR_ID));

        let r = classify(AR_ID).unwrap();
        assert_eq!(r.scheme, Scheme::Arweave);

        let r = classify("onchfs://5a2d9c6f1b/index.html").unwrap();
        assert_eq!(r.scheme, Scheme::OnchFs);
        assert_eq!(r.cid.as_deref(), Some("5a2d9c6f1b/index.html"));
        assert_eq!(r.address().as_deref(), Some("5a2d9c6f1b/index.html"));
    }

    #[test]
    fn test_unknown_is_raw_passthrough() {
        for s in ["relative/path.png", "ipfs://", "ar://", "magnet:?xt=urn", "日本語"] {
            let r = classify(s).unwrap();
            assert_eq!(r.scheme, Scheme::Raw, "{s}");
            assert_eq!(r.raw, s);
        }
    }

    #[test]
    fn test_blank_is_none() {
        assert!(classify("").is_none());
        assert!(classify(" \n\t").is_none());
    }

    #[test]
    fn test_idempotent_on_raw() {
        let inputs = [
            format!("  ipfs://ipfs/{CID_V0}/x.png "),
            format!("ar://{AR_ID}"),
            CID_V1.to_string(),
            "https://a.b/c".to_string(),
            "data:,hello".to_string(),
            "onchfs://abc".to_string(),
            "nonsense".to_string(),
            "ipfs:".to_string(),
            "ipfs://?".to_string(),
        ];
        for input in inputs {
            let first = classify(&input).unwrap();
            let second = classify(&first.raw).unwrap();
            assert_eq!(first, second, "{input}");
        }
    }

    #[test]
    fn test_never_panics_on_odd_input() {
        for s in ["ä", "ipfs:/ä", "ar", "ipfs/ipfs/", "//", "?", "Qm", "bafy"] {
            let _ = classify(s);
        }
    }
}
