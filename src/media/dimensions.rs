//! Dimension priority chain.
//!
//! Metadata-declared dimensions win, then attribute fields, then header
//! parsing of fetched bytes. Network-based extraction only runs when neither
//! metadata source yields a positive size.

use artforged_common::{mime, Dimensions};

use super::gateway::FetchedMedia;

/// Which source produced a dimension pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSource {
    Declared,
    Attributes,
    Header,
}

/// Whether a fetch is needed purely to learn dimensions.
pub fn needs_header_parse(mime: Option<&str>, known: Option<Dimensions>) -> bool {
    known.is_none() && mime.is_some_and(mime::is_raster_image)
}

/// Pick dimensions from the first source that has them.
pub fn resolve_dimensions(
    declared: Option<Dimensions>,
    attributes: Option<Dimensions>,
    fetched: Option<&FetchedMedia>,
    mime: Option<&str>,
) -> Option<(Dimensions, DimensionSource)> {
    if let Some(dims) = declared {
        return Some((dims, DimensionSource::Declared));
    }
    if let Some(dims) = attributes {
        return Some((dims, DimensionSource::Attributes));
    }
    let fetched = fetched?;
    artforged_probe::extract_dimensions(&fetched.sample, mime)
        .map(|dims| (dims, DimensionSource::Header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn png(width: u32, height: u32) -> FetchedMedia {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        FetchedMedia {
            url: "https://g/ipfs/cid".to_string(),
            gateway: None,
            content_type: None,
            content_length: None,
            sample: Bytes::from(data),
            complete: true,
        }
    }

    #[test]
    fn test_priority_order() {
        let fetched = png(800, 600);
        let declared = Dimensions::new(10, 20);
        let attrs = Dimensions::new(30, 40);

        assert_eq!(
            resolve_dimensions(declared, attrs, Some(&fetched), Some("image/png")),
            Some((Dimensions::new(10, 20).unwrap(), DimensionSource::Declared))
        );
        assert_eq!(
            resolve_dimensions(None, attrs, Some(&fetched), Some("image/png")),
            Some((Dimensions::new(30, 40).unwrap(), DimensionSource::Attributes))
        );
        assert_eq!(
            resolve_dimensions(None, None, Some(&fetched), Some("image/png")),
            Some((Dimensions::new(800, 600).unwrap(), DimensionSource::Header))
        );
        assert_eq!(resolve_dimensions(None, None, None, Some("image/png")), None);
    }

    #[test]
    fn test_needs_header_parse() {
        assert!(needs_header_parse(Some("image/webp"), None));
        assert!(!needs_header_parse(Some("image/webp"), Dimensions::new(1, 1)));
        assert!(!needs_header_parse(Some("video/mp4"), None));
        assert!(!needs_header_parse(None, None));
    }
}
