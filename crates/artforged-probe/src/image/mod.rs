//! Image header parsers
//!
//! Each parser reads only the fixed header fields it needs; no pixel data is
//! decoded, so truncated samples of large files are fine as long as the
//! header is present.

pub mod gif;
pub mod jpeg;
pub mod png;
pub mod webp;

use artforged_common::Dimensions;

use crate::error::{ProbeError, Result};
use crate::format::FileFormat;

/// Parse dimensions for a known raster format.
pub fn dimensions_for(format: FileFormat, data: &[u8]) -> Result<Dimensions> {
    match format {
        FileFormat::Png => png::dimensions(data),
        FileFormat::Jpeg => jpeg::dimensions(data),
        FileFormat::Gif => gif::dimensions(data),
        FileFormat::WebP => webp::dimensions(data),
        other => Err(ProbeError::unsupported(format!(
            "no header parser for {}",
            other.mime()
        ))),
    }
}

/// Wrap raw header values, rejecting zero sides.
pub(crate) fn checked(width: u32, height: u32) -> Result<Dimensions> {
    Dimensions::new(width, height).ok_or(ProbeError::ZeroDimensions)
}
