//! File format detection from magic bytes

use std::path::Path;

use artforged_common::mime;

/// Formats recognised from leading bytes. Every variant maps to a
/// whitelisted MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Svg,
    Mp4,
    QuickTime,
    WebM,
    OggVideo,
    OggAudio,
    Mp3,
    Wav,
    Flac,
    M4a,
    Pdf,
    Glb,
    Gltf,
    Json,
    Html,
}

const ALL: [FileFormat; 19] = [
    FileFormat::Png,
    FileFormat::Jpeg,
    FileFormat::Gif,
    FileFormat::WebP,
    FileFormat::Svg,
    FileFormat::Mp4,
    FileFormat::QuickTime,
    FileFormat::WebM,
    FileFormat::OggVideo,
    FileFormat::OggAudio,
    FileFormat::Mp3,
    FileFormat::Wav,
    FileFormat::Flac,
    FileFormat::M4a,
    FileFormat::Pdf,
    FileFormat::Glb,
    FileFormat::Gltf,
    FileFormat::Json,
    FileFormat::Html,
];

impl FileFormat {
    /// MIME type for this format.
    pub fn mime(&self) -> &'static str {
        match self {
            FileFormat::Png => "image/png",
            FileFormat::Jpeg => "image/jpeg",
            FileFormat::Gif => "image/gif",
            FileFormat::WebP => "image/webp",
            FileFormat::Svg => "image/svg+xml",
            FileFormat::Mp4 => "video/mp4",
            FileFormat::QuickTime => "video/quicktime",
            FileFormat::WebM => "video/webm",
            FileFormat::OggVideo => "video/ogg",
            FileFormat::OggAudio => "audio/ogg",
            FileFormat::Mp3 => "audio/mpeg",
            FileFormat::Wav => "audio/wav",
            FileFormat::Flac => "audio/flac",
            FileFormat::M4a => "audio/mp4",
            FileFormat::Pdf => "application/pdf",
            FileFormat::Glb => "model/gltf-binary",
            FileFormat::Gltf => "model/gltf+json",
            FileFormat::Json => "application/json",
            FileFormat::Html => "text/html",
        }
    }

    /// Format for a canonical MIME type, if it is one we detect.
    pub fn from_mime(mime: &str) -> Option<FileFormat> {
        ALL.iter().copied().find(|format| format.mime() == mime)
    }

    /// Map a MIME type back to a raster format whose header can be measured.
    pub fn raster_from_mime(mime: &str) -> Option<FileFormat> {
        FileFormat::from_mime(mime).filter(FileFormat::is_raster)
    }

    /// Whether header parsing can yield dimensions for this format.
    pub fn is_raster(&self) -> bool {
        matches!(
            self,
            FileFormat::Png | FileFormat::Jpeg | FileFormat::Gif | FileFormat::WebP
        )
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// How far into a text payload to look for markup markers.
const TEXT_SCAN_LIMIT: usize = 1024;

/// MP4 brands that denote still images rather than video.
const IMAGE_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis", b"heic", b"heix", b"mif1", b"msf1"];

/// Detect a format from the first bytes of a payload.
///
/// Binary signatures are checked before text heuristics so a PNG that
/// happens to contain `<svg` in a text chunk is still a PNG.
pub fn detect_format(data: &[u8]) -> Option<FileFormat> {
    if data.starts_with(&crate::image::png::SIGNATURE) {
        return Some(FileFormat::Png);
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(FileFormat::Jpeg);
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(FileFormat::Gif);
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" {
        return match &data[8..12] {
            b"WEBP" => Some(FileFormat::WebP),
            b"WAVE" => Some(FileFormat::Wav),
            _ => None,
        };
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        let brand = &data[8..12];
        if IMAGE_BRANDS.iter().any(|b| &b[..] == brand) {
            return None;
        }
        return Some(match brand {
            b"qt  " => FileFormat::QuickTime,
            b"M4A " | b"M4B " => FileFormat::M4a,
            _ => FileFormat::Mp4,
        });
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        // EBML: only the WebM doctype is whitelisted
        let head = &data[..data.len().min(64)];
        return contains(head, b"webm").then_some(FileFormat::WebM);
    }
    if data.starts_with(b"OggS") {
        let head = &data[..data.len().min(128)];
        return Some(if contains(head, b"theora") {
            FileFormat::OggVideo
        } else {
            FileFormat::OggAudio
        });
    }
    if data.starts_with(b"fLaC") {
        return Some(FileFormat::Flac);
    }
    if data.starts_with(b"ID3") || matches!(data, [0xFF, 0xFB | 0xF3 | 0xF2, ..]) {
        return Some(FileFormat::Mp3);
    }
    if data.starts_with(b"%PDF-") {
        return Some(FileFormat::Pdf);
    }
    if data.starts_with(b"glTF") {
        return Some(FileFormat::Glb);
    }

    detect_text_format(data)
}

fn detect_text_format(data: &[u8]) -> Option<FileFormat> {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    let head = &data[start..data.len().min(start + TEXT_SCAN_LIMIT)];
    let lower: Vec<u8> = head.iter().map(u8::to_ascii_lowercase).collect();

    if lower.starts_with(b"<svg") || (lower.starts_with(b"<?xml") && contains(&lower, b"<svg")) {
        return Some(FileFormat::Svg);
    }
    if lower.starts_with(b"<!doctype html")
        || lower.starts_with(b"<html")
        || lower.starts_with(b"<head")
        || lower.starts_with(b"<body")
        || lower.starts_with(b"<script")
    {
        return Some(FileFormat::Html);
    }
    if lower.starts_with(b"{") || lower.starts_with(b"[") {
        if contains(&lower, b"\"asset\"") && contains(&lower, b"\"version\"") {
            return Some(FileFormat::Gltf);
        }
        return Some(FileFormat::Json);
    }
    None
}

/// Get a format from a file extension (fallback for local files)
pub fn format_from_extension(path: &Path) -> Option<FileFormat> {
    let ext = path.extension()?.to_str()?;
    mime::from_extension(ext).and_then(FileFormat::from_mime)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
