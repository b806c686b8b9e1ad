//! MIME whitelist and extension tables.
//!
//! Every MIME type the engine emits must come from [`WHITELIST`] (or be an
//! `audio/*` type). Values from metadata, headers or sniffing go through
//! [`canonicalize`] first, which strips parameters, folds case, maps common
//! aliases, and returns `None` for anything outside the whitelist.

use std::path::Path;

/// Exact MIME types the engine is allowed to emit. `audio/*` is accepted
/// separately by [`is_whitelisted`].
pub const WHITELIST: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "video/mp4",
    "video/webm",
    "video/quicktime",
    "video/ogg",
    "text/html",
    "application/javascript",
    "application/pdf",
    "application/json",
    "model/gltf+json",
    "model/gltf-binary",
];

/// Generic binary type that never counts as evidence of a format.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension → MIME table used by the platform heuristic.
const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jfif", "image/jpeg"),
    ("png", "image/png"),
    ("apng", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("ogv", "video/ogg"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("pdf", "application/pdf"),
    ("json", "application/json"),
    ("gltf", "model/gltf+json"),
    ("glb", "model/gltf-binary"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
];

/// Aliases seen in the wild, mapped to their whitelisted spelling.
const ALIASES: &[(&str, &str)] = &[
    ("image/jpg", "image/jpeg"),
    ("image/pjpeg", "image/jpeg"),
    ("image/svg", "image/svg+xml"),
    ("image/x-png", "image/png"),
    ("video/x-m4v", "video/mp4"),
    ("video/mov", "video/quicktime"),
    ("text/javascript", "application/javascript"),
    ("application/x-javascript", "application/javascript"),
    ("application/xhtml+xml", "text/html"),
    ("audio/mp3", "audio/mpeg"),
    ("audio/x-wav", "audio/wav"),
];

/// Check whether an already-normalized MIME type is on the whitelist.
///
/// # Examples
///
/// ```
/// use artforged_common::mime::is_whitelisted;
///
/// assert!(is_whitelisted("video/webm"));
/// assert!(is_whitelisted("audio/flac"));
/// assert!(!is_whitelisted("text/plain"));
/// assert!(!is_whitelisted("application/octet-stream"));
/// ```
pub fn is_whitelisted(mime: &str) -> bool {
    if WHITELIST.contains(&mime) {
        return true;
    }
    mime.strip_prefix("audio/")
        .map(|sub| !sub.is_empty() && sub.chars().all(is_token_char))
        .unwrap_or(false)
}

/// Normalize a raw MIME value and return its whitelisted form.
///
/// Parameters (`; charset=…`) are dropped, case is folded, and aliases are
/// mapped. Returns `None` for anything not on the whitelist, including
/// `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use artforged_common::mime::canonicalize;
///
/// assert_eq!(canonicalize("Image/JPG"), Some("image/jpeg".to_string()));
/// assert_eq!(canonicalize("text/html; charset=utf-8"), Some("text/html".to_string()));
/// assert_eq!(canonicalize("application/x-shockwave-flash"), None);
/// ```
pub fn canonicalize(raw: &str) -> Option<String> {
    let essence = raw.split(';').next()?.trim().to_ascii_lowercase();
    if essence.is_empty() {
        return None;
    }
    let essence = ALIASES
        .iter()
        .find(|(alias, _)| *alias == essence)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(essence);
    is_whitelisted(&essence).then_some(essence)
}

/// Look up the MIME type for a bare extension (case-insensitive).
pub fn from_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Look up the MIME type for the extension of a URL or path.
///
/// Query strings and fragments are ignored. Only the last path segment is
/// considered, so `…/foo.png/index.html` maps to `text/html`.
///
/// # Examples
///
/// ```
/// use artforged_common::mime::from_path;
///
/// assert_eq!(from_path("ipfs://Qm123/thumb.PNG?x=1"), Some("image/png"));
/// assert_eq!(from_path("https://example.com/art"), None);
/// ```
pub fn from_path(url: &str) -> Option<&'static str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = without_query.rsplit('/').next().unwrap_or(without_query);
    Path::new(last_segment)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(from_extension)
}

/// Whether the MIME type is a raster image the probe crate can measure.
pub fn is_raster_image(mime: &str) -> bool {
    matches!(mime, "image/png" | "image/jpeg" | "image/gif" | "image/webp")
}

/// Whether the MIME type is a video container.
pub fn is_video(mime: &str) -> bool {
    mime.starts_with("video/")
}

/// Whether the MIME type denotes interactive content.
pub fn is_interactive(mime: &str) -> bool {
    matches!(mime, "text/html" | "application/javascript")
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_')
}
