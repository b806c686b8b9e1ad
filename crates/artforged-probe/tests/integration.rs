//! Integration tests for artforged-probe

use artforged_probe::{extract_dimensions, probe_file, sniff, FileFormat, ProbeError};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

fn jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    data.extend_from_slice(b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00");
    data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&[0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    data
}

fn gif(width: u16, height: u16) -> Vec<u8> {
    let mut data = b"GIF89a".to_vec();
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(&[0xF7, 0x00, 0x00]);
    data
}

fn webp(width: u16, height: u16) -> Vec<u8> {
    let mut data = b"RIFF".to_vec();
    data.extend_from_slice(&26u32.to_le_bytes());
    data.extend_from_slice(b"WEBPVP8 ");
    data.extend_from_slice(&14u32.to_le_bytes());
    data.extend_from_slice(&[0x30, 0x01, 0x00, 0x9D, 0x01, 0x2A]);
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&height.to_le_bytes());
    data
}

#[test]
fn test_header_dimensions_for_every_raster_format() {
    let cases = [
        ("image/png", png(37, 53)),
        ("image/jpeg", jpeg(37, 53)),
        ("image/gif", gif(37, 53)),
        ("image/webp", webp(37, 53)),
    ];

    for (mime, header) in cases {
        let dims = extract_dimensions(&header, Some(mime))
            .unwrap_or_else(|| panic!("no dimensions for {mime}"));
        assert_eq!((dims.width, dims.height), (37, 53), "{mime}");
        assert_eq!(sniff(&header), Some(mime));
    }
}

#[test]
fn test_random_bytes_yield_nothing() {
    let noise = [0x13, 0x37, 0xC0, 0xDE];
    for mime in ["image/png", "image/jpeg", "image/gif", "image/webp"] {
        assert_eq!(extract_dimensions(&noise, Some(mime)), None);
    }
    assert_eq!(extract_dimensions(&noise, None), None);
    assert_eq!(sniff(&noise), None);
}

#[test]
fn test_every_prefix_is_safe() {
    for header in [png(800, 600), jpeg(800, 600), gif(800, 600), webp(800, 600)] {
        for len in 0..header.len() {
            // must not panic on any truncation
            let _ = extract_dimensions(&header[..len], None);
        }
    }
}

#[test]
fn test_zero_dimensions_are_rejected() {
    assert_eq!(extract_dimensions(&png(0, 10), Some("image/png")), None);
    assert_eq!(extract_dimensions(&gif(10, 0), Some("image/gif")), None);
}

#[test]
fn test_probe_file_reads_header() {
    let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
    std::io::Write::write_all(&mut file, &jpeg(1920, 1080)).unwrap();

    let info = probe_file(file.path()).unwrap();
    assert_eq!(info.format, Some(FileFormat::Jpeg));
    assert_eq!(info.mime, Some("image/jpeg"));
    let dims = info.dimensions.unwrap();
    assert_eq!((dims.width, dims.height), (1920, 1080));
}

#[test]
fn test_probe_file_extension_fallback() {
    let mut file = tempfile::Builder::new().suffix(".mov").tempfile().unwrap();
    std::io::Write::write_all(&mut file, b"\0\0\0\0").unwrap();

    let info = probe_file(file.path()).unwrap();
    assert_eq!(info.format, Some(FileFormat::QuickTime));
    assert!(info.dimensions.is_none());
}

#[test]
fn test_probe_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = probe_file(dir.path().join("missing.png"));
    assert!(matches!(result, Err(ProbeError::FileNotFound(_))));
}
