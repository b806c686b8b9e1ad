//! GIF logical screen descriptor parsing

use artforged_common::Dimensions;

use crate::error::{ProbeError, Result};
use crate::reader;

/// Read the logical screen width/height (little-endian u16 at 6 and 8).
pub fn dimensions(data: &[u8]) -> Result<Dimensions> {
    if !(data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")) {
        return Err(ProbeError::InvalidSignature("GIF"));
    }
    let width = reader::le_u16(data, 6)?;
    let height = reader::le_u16(data, 8)?;
    super::checked(width.into(), height.into())
}

#[cfg(test)]
pub(crate) fn header(width: u16, height: u16) -> Vec<u8> {
    let mut data = b"GIF89a".to_vec();
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(&[0xF7, 0x00, 0x00]);
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
    fn test_gif87a() {
        let mut data = header(640, 480);
        data[..6].copy_from_slice(b"GIF87a");
        let dims = dimensions(&data).unwrap();
        assert_eq!((dims.width, dims.height), (640, 480));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            dimensions(b"GIF89a\x25\x00\x35"),
            Err(ProbeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_bad_signature() {
        assert!(matches!(
            dimensions(b"GIF90a\x25\x00\x35\x00"),
            Err(ProbeError::InvalidSignature("GIF"))
        ));
    }
}
