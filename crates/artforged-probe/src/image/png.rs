//! PNG header parsing
//!
//! The IHDR chunk always directly follows the 8-byte signature, so width and
//! height sit at fixed offsets 16 and 20 (big-endian).

use artforged_common::Dimensions;

use crate::error::{ProbeError, Result};
use crate::reader;

/// PNG file signature.
pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Read width/height from the IHDR chunk.
pub fn dimensions(data: &[u8]) -> Result<Dimensions> {
    if !data.starts_with(&SIGNATURE) {
        return Err(ProbeError::InvalidSignature("PNG"));
    }
    if reader::bytes(data, 12, 4)? != b"IHDR" {
        return Err(ProbeError::invalid_data("first PNG chunk is not IHDR"));
    }
    let width = reader::be_u32(data, 16)?;
    let height = reader::be_u32(data, 20)?;
    super::checked(width, height)
}

#[cfg(test)]
pub(crate) fn header(width: u32, height: u32) -> Vec<u8> {
    let mut data = SIGNATURE.to_vec();
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data.extend_from_slice(&[0, 0, 0, 0]); // CRC, not checked
    data
}
