//! WebP header parsing
//!
//! Only the simple lossy `VP8 ` bitstream is measured. Lossless (`VP8L`) and
//! extended (`VP8X`) files are reported as unsupported rather than guessed.

use artforged_common::Dimensions;

use crate::error::{ProbeError, Result};
use crate::reader;

const VP8_START_CODE: [u8; 3] = [0x9D, 0x01, 0x2A];

/// Read width/height from a `VP8 ` key frame header.
pub fn dimensions(data: &[u8]) -> Result<Dimensions> {
    if reader::bytes(data, 0, 4).ok() != Some(b"RIFF".as_slice())
        || reader::bytes(data, 8, 4).ok() != Some(b"WEBP".as_slice())
    {
        return Err(ProbeError::InvalidSignature("WebP"));
    }

    match reader::bytes(data, 12, 4)? {
        b"VP8 " => {
            if reader::bytes(data, 23, 3)? != VP8_START_CODE {
                return Err(ProbeError::invalid_data("missing VP8 key frame start code"));
            }
            let width = reader::le_u16(data, 26)? & 0x3FFF;
            let height = reader::le_u16(data, 28)? & 0x3FFF;
            super::checked(width.into(), height.into())
        }
        b"VP8L" => Err(ProbeError::unsupported("lossless WebP (VP8L)")),
        b"VP8X" => Err(ProbeError::unsupported("extended WebP (VP8X)")),
        other => Err(ProbeError::invalid_data(format!(
            "unknown WebP chunk {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

#[cfg(test)]
pub(crate) fn header(width: u16, height: u16) -> Vec<u8> {
    let mut data = b"RIFF".to_vec();
    data.extend_from_slice(&26u32.to_le_bytes());
    data.extend_from_slice(b"WEBPVP8 ");
    data.extend_from_slice(&14u32.to_le_bytes());
    data.extend_from_slice(&[0x30, 0x01, 0x00]); // frame tag
    data.extend_from_slice(&VP8_START_CODE);
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_header() {
        assert_eq!(dimensions(&header(37, 53)).unwrap(), Dimensions::new(37, 53).unwrap());
    }

    #[test]
    fn test_scale_bits_are_masked() {
        // top two bits carry the upscaling hint, not size
        let dims = dimensions(&header(0xC000 | 37, 0x4000 | 53)).unwrap();
        assert_eq!((dims.width, dims.height), (37, 53));
    }

    #[test]
    fn test_lossless_is_unsupported() {
        let mut data = header(37, 53);
        data[12..16].copy_from_slice(b"VP8L");
        assert!(matches!(dimensions(&data), Err(ProbeError::Unsupported(_))));
    }

    #[test]
    fn test_extended_is_unsupported() {
        let mut data = header(37, 53);
        data[12..16].copy_from_slice(b"VP8X");
        assert!(matches!(dimensions(&data), Err(ProbeError::Unsupported(_))));
    }

    #[test]
    fn test_missing_start_code() {
        let mut data = header(37, 53);
        data[23] = 0x00;
        assert!(matches!(dimensions(&data), Err(ProbeError::InvalidData(_))));
    }

    #[test]
    fn test_bad_signature() {
        assert!(matches!(
            dimensions(b"RIFF\0\0\0\0WAVEfmt "),
            Err(ProbeError::InvalidSignature("WebP"))
        ));
    }
}
