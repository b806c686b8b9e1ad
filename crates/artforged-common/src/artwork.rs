//! Resolved artwork records handed to the persistence boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::ArtworkId;
use crate::types::{Chain, Dimensions, MediaRole, MimeSource, ResolutionStatus};

/// Outcome of resolving one media URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    /// Displayable HTTP(S) or `data:` URL.
    pub url: String,
    /// Whitelisted MIME type, if any strategy produced one.
    pub mime: Option<String>,
    /// Pixel dimensions, if known.
    pub dimensions: Option<Dimensions>,
    /// Which strategy produced `mime`.
    pub source: Option<MimeSource>,
    /// Whether `url` was confirmed reachable.
    pub status: ResolutionStatus,
}

impl ResolvedMedia {
    /// Whether the URL can plausibly be shown to a user.
    pub fn is_reachable(&self) -> bool {
        self.status != ResolutionStatus::Unreachable
    }
}

/// A single descriptive trait of an artwork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
}

/// Canonical, displayable record for one artwork.
///
/// Each role is independently nullable: failure to resolve one never removes
/// another. The artwork-level `mime`/`dimensions` mirror whichever role was
/// chosen as `primary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkMediaSet {
    pub id: ArtworkId,
    pub chain: Chain,
    pub contract: Option<String>,
    pub token_id: Option<String>,
    pub name: Option<String>,
    pub image: Option<ResolvedMedia>,
    pub animation: Option<ResolvedMedia>,
    pub generator: Option<ResolvedMedia>,
    pub thumbnail: Option<ResolvedMedia>,
    /// Role whose values were promoted to the artwork level.
    pub primary: Option<MediaRole>,
    pub mime: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub mint_date: Option<DateTime<Utc>>,
    pub attributes: Vec<Attribute>,
    pub creators: Vec<String>,
}

impl ArtworkMediaSet {
    /// Create an empty set for the given artwork.
    pub fn new(id: ArtworkId, chain: Chain) -> Self {
        Self {
            id,
            chain,
            contract: None,
            token_id: None,
            name: None,
            image: None,
            animation: None,
            generator: None,
            thumbnail: None,
            primary: None,
            mime: None,
            dimensions: None,
            mint_date: None,
            attributes: Vec::new(),
            creators: Vec::new(),
        }
    }

    /// Borrow the media resolved for a role.
    pub fn role(&self, role: MediaRole) -> Option<&ResolvedMedia> {
        match role {
            MediaRole::Image => self.image.as_ref(),
            MediaRole::Animation => self.animation.as_ref(),
            MediaRole::Generator => self.generator.as_ref(),
            MediaRole::Thumbnail => self.thumbnail.as_ref(),
        }
    }

    /// Store the media resolved for a role.
    pub fn set_role(&mut self, role: MediaRole, media: Option<ResolvedMedia>) {
        match role {
            MediaRole::Image => self.image = media,
            MediaRole::Animation => self.animation = media,
            MediaRole::Generator => self.generator = media,
            MediaRole::Thumbnail => self.thumbnail = media,
        }
    }

    /// Whether at least one role has a URL that is not known to be broken.
    pub fn is_displayable(&self) -> bool {
        MediaRole::ALL
            .iter()
            .filter_map(|role| self.role(*role))
            .any(ResolvedMedia::is_reachable)
    }

    /// Return the set, or [`Error::NotDisplayable`] when every role failed.
    pub fn ensure_displayable(self) -> Result<Self> {
        if self.is_displayable() {
            Ok(self)
        } else {
            Err(Error::not_displayable(self.id.to_string()))
        }
    }
}
