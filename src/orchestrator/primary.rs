//! Choice of the role promoted to the artwork level.

use artforged_common::{mime, ArtworkMediaSet, MediaRole, ResolvedMedia};

/// Pick the primary role.
///
/// An explicit generator wins outright, then a video animation, then an
/// interactive (HTML) animation, then the image. Any other animation and
/// finally the thumbnail are last resorts.
pub fn select_primary(set: &ArtworkMediaSet) -> Option<MediaRole> {
    let animation_is = |pred: fn(&str) -> bool| {
        set.animation
            .as_ref()
            .and_then(|m| m.mime.as_deref())
            .is_some_and(pred)
    };

    if set.generator.is_some() {
        Some(MediaRole::Generator)
    } else if animation_is(mime::is_video) || animation_is(mime::is_interactive) {
        Some(MediaRole::Animation)
    } else if set.image.is_some() {
        Some(MediaRole::Image)
    } else if set.animation.is_some() {
        Some(MediaRole::Animation)
    } else if set.thumbnail.is_some() {
        Some(MediaRole::Thumbnail)
    } else {
        None
    }
}

/// Promote the primary role's MIME and dimensions onto the set. Dimensions
/// fall back to the image's when the primary has none.
pub fn apply_primary(set: &mut ArtworkMediaSet) {
    let primary = select_primary(set);
    let media: Option<&ResolvedMedia> = primary.and_then(|role| set.role(role));

    let mime = media.and_then(|m| m.mime.clone());
    let dimensions = media
        .and_then(|m| m.dimensions)
        .or_else(|| set.image.as_ref().and_then(|m| m.dimensions));

    set.primary = primary;
    set.mime = mime;
    set.dimensions = dimensions;
}

#[cfg(test)]
mod tests {
    use super::*;
    use artforged_common::{ArtworkId, Chain, Dimensions, MimeSource, ResolutionStatus};

    fn media(mime: &str, dims: Option<Dimensions>) -> Option<ResolvedMedia> {
        Some(ResolvedMedia {
            url: "https://example.com/x".to_string(),
            mime: Some(mime.to_string()),
            dimensions: dims,
            source: Some(MimeSource::Declared),
            status: ResolutionStatus::Unverified,
        })
    }

    fn set() -> ArtworkMediaSet {
        ArtworkMediaSet::new(ArtworkId::new("t"), Chain::Ethereum)
    }

    #[test]
    fn test_generator_wins() {
        let mut s = set();
        s.image = media("image/png", Dimensions::new(100, 100));
        s.animation = media("video/mp4", None);
        s.generator = media("text/html", None);
        apply_primary(&mut s);
        assert_eq!(s.primary, Some(MediaRole::Generator));
        assert_eq!(s.mime.as_deref(), Some("text/html"));
        // falls back to the image's dimensions
        assert_eq!(s.dimensions, Dimensions::new(100, 100));
    }

    #[test]
    fn test_video_and_html_animation_beat_image() {
        let mut s = set();
        s.image = media("image/png", None);
        s.animation = media("video/webm", Dimensions::new(1920, 1080));
        apply_primary(&mut s);
        assert_eq!(s.primary, Some(MediaRole::Animation));
        assert_eq!(s.dimensions, Dimensions::new(1920, 1080));

        s.animation = media("text/html", None);
        assert_eq!(select_primary(&s), Some(MediaRole::Animation));
    }

    #[test]
    fn test_audio_animation_loses_to_image() {
        let mut s = set();
        s.image = media("image/jpeg", None);
        s.animation = media("audio/mpeg", None);
        assert_eq!(select_primary(&s), Some(MediaRole::Image));

        s.image = None;
        assert_eq!(select_primary(&s), Some(MediaRole::Animation));
    }

    #[test]
    fn test_thumbnail_last_and_empty() {
        let mut s = set();
        assert_eq!(select_primary(&s), None);
        apply_primary(&mut s);
        assert_eq!(s.mime, None);

        s.thumbnail = media("image/gif", Dimensions::new(10, 10));
        apply_primary(&mut s);
        assert_eq!(s.primary, Some(MediaRole::Thumbnail));
        assert_eq!(s.dimensions, Dimensions::new(10, 10));
    }
}
