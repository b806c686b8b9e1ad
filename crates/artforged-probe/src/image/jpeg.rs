//! JPEG marker scanning
//!
//! Segments are walked marker by marker until a start-of-frame marker is
//! found. The frame header stores height before width:
//!
//! ```text
//! FF Cn | Lh Ll | P | Hh Hl | Wh Wl | ...
//! ```

use artforged_common::Dimensions;

use crate::error::{ProbeError, Result};
use crate::reader;

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const TEM: u8 = 0x01;

/// Whether a marker is one of the SOF variants carrying frame dimensions.
///
/// C4 (DHT), C8 (JPG extension) and CC (DAC) share the range but are not
/// frame headers.
fn is_sof(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF)
}

/// Markers that stand alone without a length field.
fn is_standalone(marker: u8) -> bool {
    matches!(marker, SOI | TEM | 0xD0..=0xD7)
}

/// Scan segments for the first SOF marker and read its dimensions.
pub fn dimensions(data: &[u8]) -> Result<Dimensions> {
    if !data.starts_with(&[0xFF, SOI]) {
        return Err(ProbeError::InvalidSignature("JPEG"));
    }

    let mut pos = 2;
    loop {
        if *data.get(pos).ok_or(ProbeError::Truncated {
            need: pos + 1,
            have: data.len(),
        })? != 0xFF
        {
            return Err(ProbeError::invalid_data(format!(
                "expected JPEG marker at offset {pos}"
            )));
        }
        // Any number of 0xFF fill bytes may precede the marker code
        while data.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *data.get(pos + 1).ok_or(ProbeError::Truncated {
            need: pos + 2,
            have: data.len(),
        })?;

        if is_sof(marker) {
            let height = reader::be_u16(data, pos + 5)?;
            let width = reader::be_u16(data, pos + 7)?;
            return super::checked(width.into(), height.into());
        }
        match marker {
            EOI | SOS => {
                return Err(ProbeError::invalid_data(
                    "no JPEG frame header before image data",
                ))
            }
            m if is_standalone(m) => pos += 2,
            _ => {
                let length = usize::from(reader::be_u16(data, pos + 2)?);
                if length < 2 {
                    return Err(ProbeError::invalid_data(format!(
                        "JPEG segment length {length} at offset {pos}"
                    )));
                }
                pos += 2 + length;
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn header(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![0xFF, SOI];
    // APP0 / JFIF
    data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    data.extend_from_slice(b"JFIF\0");
    data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    // DQT (truncated table, length only matters)
    data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x04, 0x00, 0x01]);
    // SOF0
    data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&[0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
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
    fn test_progressive_sof2() {
        let mut data = header(1920, 1080);
        let sof = data.windows(2).position(|w| w == [0xFF, 0xC0]).unwrap();
        data[sof + 1] = 0xC2;
        let dims = dimensions(&data).unwrap();
        assert_eq!((dims.width, dims.height), (1920, 1080));
    }

    #[test]
    fn test_skips_dht_and_fill_bytes() {
        let mut data = vec![0xFF, SOI];
        // DHT uses C4, which must not be mistaken for a frame header
        data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x03, 0x00]);
        // fill bytes before the next marker
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x35, 0x00, 0x25]);
        data.extend_from_slice(&[0; 10]);
        let dims = dimensions(&data).unwrap();
        assert_eq!((dims.width, dims.height), (37, 53));
    }

    #[test]
    fn test_scan_before_frame() {
        let data = [0xFF, SOI, 0xFF, SOS, 0x00, 0x02];
        assert!(matches!(dimensions(&data), Err(ProbeError::InvalidData(_))));
    }

    #[test]
    fn test_truncated_segment_chain() {
        let data = header(37, 53);
        assert!(matches!(
            dimensions(&data[..24]),
            Err(ProbeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_garbage_after_soi() {
        let data = [0xFF, SOI, 0x12, 0x34];
        assert!(matches!(dimensions(&data), Err(ProbeError::InvalidData(_))));
    }

    #[test]
    fn test_bad_length() {
        let data = [0xFF, SOI, 0xFF, 0xE1, 0x00, 0x01, 0x00];
        assert!(matches!(dimensions(&data), Err(ProbeError::InvalidData(_))));
    }
}
