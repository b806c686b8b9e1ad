//! Result types for payload inspection

use std::fmt;

use artforged_common::Dimensions;

use crate::format::FileFormat;

/// What could be learned from the leading bytes of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeInfo {
    /// Number of bytes inspected (or the file size for [`crate::probe_file`])
    pub file_size: u64,
    /// Format detected from magic bytes
    pub format: Option<FileFormat>,
    /// Whitelisted MIME type for `format`
    pub mime: Option<&'static str>,
    /// Header dimensions for raster images
    pub dimensions: Option<Dimensions>,
}

impl ProbeInfo {
    /// Whether nothing at all was recognised.
    pub fn is_unknown(&self) -> bool {
        self.format.is_none()
    }
}

impl fmt::Display for ProbeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mime, self.dimensions) {
            (Some(mime), Some(dims)) => write!(f, "{mime} {dims} ({} bytes)", self.file_size),
            (Some(mime), None) => write!(f, "{mime} ({} bytes)", self.file_size),
            (None, _) => write!(f, "unknown ({} bytes)", self.file_size),
        }
    }
}
