//! # artforged-probe
//!
//! Pure Rust content sniffing and image header measurement.
//!
//! Everything here works on a byte prefix: no pixel data is decoded and
//! nothing is read beyond what the header needs, so an 8 KiB sample of a
//! 40 MB PNG is enough to learn its size.
//!
//! ## Features
//!
//! - Magic-byte format detection for images, video, audio, documents and
//!   3D models, mapped onto the MIME whitelist
//! - Header dimension parsing for PNG, JPEG, GIF and lossy WebP
//! - No external tool dependencies
//!
//! ## Example
//!
//! ```
//! let png = [
//!     0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
//!     0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R', // IHDR
//!     0x00, 0x00, 0x00, 0x25, 0x00, 0x00, 0x00, 0x35, // 37 x 53
//! ];
//!
//! assert_eq!(artforged_probe::sniff(&png), Some("image/png"));
//!
//! let dims = artforged_probe::extract_dimensions(&png, Some("image/png")).unwrap();
//! assert_eq!((dims.width, dims.height), (37, 53));
//! ```

pub mod error;
pub mod format;
pub mod image;
pub mod reader;
pub mod types;

pub use error::{ProbeError, Result};
pub use format::{detect_format, FileFormat};
pub use types::ProbeInfo;

use std::io::Read;
use std::path::Path;

use artforged_common::Dimensions;

/// Upper bound on how much of a file [`probe_file`] reads.
pub const MAX_PROBE_BYTES: u64 = 1024 * 1024;

/// Detect the MIME type of a payload from its leading bytes.
///
/// Returns `None` when no known signature matches; never returns
/// `application/octet-stream`.
pub fn sniff(data: &[u8]) -> Option<&'static str> {
    detect_format(data).map(|format| format.mime())
}

/// Read raster dimensions from a header, choosing the parser by MIME type.
///
/// When the declared MIME does not match the bytes (a `.png` that is really a
/// JPEG), the format is re-detected from the magic bytes before giving up.
pub fn try_extract_dimensions(data: &[u8], mime: Option<&str>) -> Result<Dimensions> {
    let hinted = mime.and_then(FileFormat::raster_from_mime);

    if let Some(format) = hinted {
        match image::dimensions_for(format, data) {
            Err(ProbeError::InvalidSignature(_)) => {}
            other => return other,
        }
    }

    match detect_format(data) {
        Some(format) if format.is_raster() && Some(format) != hinted => {
            image::dimensions_for(format, data)
        }
        Some(format) if !format.is_raster() => Err(ProbeError::unsupported(format!(
            "no header parser for {}",
            format.mime()
        ))),
        _ => Err(ProbeError::InvalidSignature("raster image")),
    }
}

/// Read raster dimensions, returning `None` on any failure.
///
/// Truncated input, unknown signatures, zero sizes and unsupported variants
/// all yield `None`; this never panics.
pub fn extract_dimensions(data: &[u8], mime: Option<&str>) -> Option<Dimensions> {
    try_extract_dimensions(data, mime).ok()
}

/// Inspect an in-memory payload.
pub fn probe_bytes(data: &[u8]) -> ProbeInfo {
    let format = detect_format(data);
    let dimensions = format
        .filter(FileFormat::is_raster)
        .and_then(|format| image::dimensions_for(format, data).ok());

    ProbeInfo {
        file_size: data.len() as u64,
        format,
        mime: format.map(|f| f.mime()),
        dimensions,
    }
}

/// Inspect a local file, reading at most [`MAX_PROBE_BYTES`].
///
/// Falls back to the file extension when the magic bytes are not recognised.
///
/// # Example
///
/// ```no_run
/// let info = artforged_probe::probe_file("cover.webp").unwrap();
/// println!("{info}");
/// ```
pub fn probe_file<P: AsRef<Path>>(path: P) -> Result<ProbeInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ProbeError::FileNotFound(path.to_path_buf()));
    }

    let file = std::fs::File::open(path)?;
    let file_size = file.metadata()?.len();
    let mut data = Vec::new();
    file.take(MAX_PROBE_BYTES).read_to_end(&mut data)?;

    let mut info = probe_bytes(&data);
    info.file_size = file_size;
    if info.format.is_none() {
        info.format = format::format_from_extension(path);
        info.mime = info.format.map(|f| f.mime());
    }
    Ok(info)
}
