//! Resolution orchestrator.
//!
//! Turns one raw indexer record into an [`ArtworkMediaSet`]: follows the
//! metadata URL when media fields are missing, resolves each media role
//! concurrently, reconciles the mint date alongside, and promotes a primary
//! role. Failure of any one field only nulls that field.
//!
//! Across artworks, [`Orchestrator::resolve_batch`] admits a fixed number of
//! resolutions at a time (see [`batch`]).
//! [`Orchestrator::resolve_displayable_batch`] additionally reports artworks
//! with no reachable media as not displayable.

pub mod batch;
pub mod primary;

use std::sync::Arc;

use artforged_common::{
    mime, ArtworkId, ArtworkMediaSet, Chain, Dimensions, Error, MediaRole, ResolutionStatus,
    ResolvedMedia, Result, Scheme,
};
use tracing::{debug, info, warn};

pub use batch::run_batches;
pub use primary::{apply_primary, select_primary};

use crate::config::Config;
use crate::media::dimensions::needs_header_parse;
use crate::media::{
    classify, resolve_dimensions, GatewayResolver, MediaReference, MimeSniffer, SniffInput,
};
use crate::mintdate::{MintDateQuery, Reconciler};
use crate::record::RawRecord;

/// Minimum bytes buffered when fetching a metadata document.
const METADATA_SAMPLE_BYTES: usize = 512 * 1024;

/// Everything the record says about one role's media before any fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaHints {
    pub declared_mime: Option<String>,
    pub structural_mime: Option<String>,
    pub declared_dimensions: Option<Dimensions>,
    pub attribute_dimensions: Option<Dimensions>,
}

impl MediaHints {
    /// Hints for `role`. Attribute dimensions describe the artwork itself, so
    /// they never apply to the thumbnail.
    pub fn from_record(record: &RawRecord, role: MediaRole) -> Self {
        let structural = record.structural_hint(role);
        Self {
            declared_mime: record.declared_mime(role),
            structural_mime: structural.mime,
            declared_dimensions: record.declared_dimensions(role),
            attribute_dimensions: (role != MediaRole::Thumbnail)
                .then(|| record.attribute_dimensions())
                .flatten(),
        }
    }

    fn known_dimensions(&self) -> Option<Dimensions> {
        self.declared_dimensions.or(self.attribute_dimensions)
    }
}

/// Resolves raw records into canonical media sets.
pub struct Orchestrator {
    config: Arc<Config>,
    resolver: GatewayResolver,
    sniffer: MimeSniffer,
    reconciler: Reconciler,
}

impl Orchestrator {
    /// Build every component from the configuration.
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let resolver = GatewayResolver::new(
            config.gateways.clone(),
            config.resolver.max_sample_bytes,
        )?;
        let reconciler = Reconciler::from_config(&config.mint_date)?;
        Self::with_parts(config, resolver, reconciler)
    }

    /// Build around an existing resolver and reconciler.
    pub fn with_parts(
        config: Arc<Config>,
        resolver: GatewayResolver,
        reconciler: Reconciler,
    ) -> anyhow::Result<Self> {
        let sniffer = MimeSniffer::new(
            config.resolver.sniff_size_limit,
            config.resolver.sniff_sample_bytes,
        )?;
        Ok(Self {
            config,
            resolver,
            sniffer,
            reconciler,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &GatewayResolver {
        &self.resolver
    }

    /// Resolve one artwork.
    ///
    /// Only a record with no usable identity is an error; every other failure
    /// degrades the affected field.
    pub async fn resolve_artwork(&self, record: &RawRecord, chain: Chain) -> Result<ArtworkMediaSet> {
        let id = record.artwork_id(chain).ok_or_else(|| {
            Error::invalid_input("record has no id, contract or token id")
        })?;

        let mut record = record.clone();
        self.follow_metadata(&mut record, &id).await;
        let record = &record;

        let contract = record.contract_address();
        let token_id = record.token_id();
        let query = MintDateQuery::from_record(record, contract.as_deref(), token_id.as_deref());

        let (image, animation, generator, thumbnail, mint_date) = futures::join!(
            self.resolve_role(record, MediaRole::Image, &id),
            self.resolve_role(record, MediaRole::Animation, &id),
            self.resolve_role(record, MediaRole::Generator, &id),
            self.resolve_role(record, MediaRole::Thumbnail, &id),
            self.reconciler.reconcile(chain, &query),
        );

        let mut set = ArtworkMediaSet::new(id, chain);
        set.contract = contract;
        set.token_id = token_id;
        set.name = record.name();
        set.image = image;
        set.animation = animation;
        set.generator = generator;
        set.thumbnail = thumbnail;
        set.mint_date = mint_date;
        set.attributes = record.attributes(self.config.resolver.max_attributes);
        set.creators = record.creators();
        apply_primary(&mut set);

        info!(
            artwork_id = %set.id,
            primary = ?set.primary,
            mime = ?set.mime,
            displayable = set.is_displayable(),
            "Artwork resolved"
        );
        Ok(set)
    }

    /// Resolve many artworks with bounded concurrency, in input order.
    pub async fn resolve_batch(
        &self,
        records: Vec<RawRecord>,
        chain: Chain,
    ) -> Vec<Result<ArtworkMediaSet>> {
        let total = records.len();
        let results = run_batches(
            records,
            self.config.resolver.concurrency,
            self.config.resolver.batch_delay(),
            move |record| async move { self.resolve_artwork(&record, chain).await },
        )
        .await;

        let displayable = results
            .iter()
            .filter(|r| r.as_ref().is_ok_and(ArtworkMediaSet::is_displayable))
            .count();
        info!(total, displayable, "Batch resolved");
        results
    }

    /// Like [`resolve_batch`](Self::resolve_batch), but an artwork with no
    /// reachable media comes back as [`Error::NotDisplayable`].
    pub async fn resolve_displayable_batch(
        &self,
        records: Vec<RawRecord>,
        chain: Chain,
    ) -> Vec<Result<ArtworkMediaSet>> {
        self.resolve_batch(records, chain)
            .await
            .into_iter()
            .map(|result| result.and_then(ArtworkMediaSet::ensure_displayable))
            .collect()
    }

    /// Merge inline metadata, or fetch the metadata document when the record
    /// has no media of its own.
    async fn follow_metadata(&self, record: &mut RawRecord, id: &ArtworkId) {
        if let Some(inline) = record.inline_metadata().cloned() {
            record.merge_metadata(&serde_json::Value::Object(inline));
        }
        if !record.lacks_media() {
            return;
        }
        let Some(url) = record.metadata_url() else {
            return;
        };
        let Some(reference) = classify(&url).filter(|r| r.scheme != Scheme::Raw) else {
            debug!(artwork_id = %id, url = %url, "Metadata URL not fetchable");
            return;
        };

        let limit = self.config.resolver.max_sample_bytes.max(METADATA_SAMPLE_BYTES);
        match self.resolver.resolve_with_limit(&reference, limit).await {
            Ok(fetched) => match serde_json::from_slice::<serde_json::Value>(&fetched.sample) {
                Ok(doc) => {
                    debug!(artwork_id = %id, url = %fetched.url, "Merged metadata document");
                    record.merge_metadata(&doc);
                }
                Err(e) => warn!(
                    artwork_id = %id,
                    field = "metadata",
                    url = %fetched.url,
                    error = %e,
                    "Metadata document is not valid JSON"
                ),
            },
            Err(e) => warn!(
                artwork_id = %id,
                field = "metadata",
                last_gateway = %self.last_gateway(&reference),
                error = %e,
                "Metadata fetch failed"
            ),
        }
    }

    async fn resolve_role(
        &self,
        record: &RawRecord,
        role: MediaRole,
        id: &ArtworkId,
    ) -> Option<ResolvedMedia> {
        let url = record.role_url(role)?;
        let hints = MediaHints::from_record(record, role);
        self.resolve_media(id, role, &url, &hints).await
    }

    /// Resolve a single media URL for a role.
    ///
    /// A fetch is issued only when strategies 1-3 leave the MIME type open,
    /// or when a raster image still lacks dimensions.
    pub async fn resolve_media(
        &self,
        id: &ArtworkId,
        role: MediaRole,
        url: &str,
        hints: &MediaHints,
    ) -> Option<ResolvedMedia> {
        let reference = classify(url)?;
        if reference.scheme == Scheme::Raw {
            debug!(
                artwork_id = %id,
                field = %role,
                "{}",
                Error::ClassificationAmbiguous(reference.raw.clone())
            );
        }

        let mut input = SniffInput {
            url: &reference.raw,
            declared: hints.declared_mime.as_deref(),
            structural: hints.structural_mime.as_deref(),
            fetched: None,
        };
        let known_dims = hints.known_dimensions();
        let pre = self.sniffer.pre_fetch(&input);
        let needs_fetch = reference.scheme != Scheme::Raw
            && (pre.is_none() || needs_header_parse(pre.as_ref().map(|s| s.mime.as_str()), known_dims));

        let (fetched, status) = if needs_fetch {
            match self.resolver.resolve(&reference).await {
                Ok(fetched) => (Some(fetched), ResolutionStatus::Verified),
                Err(e) => {
                    warn!(
                        artwork_id = %id,
                        field = %role,
                        last_gateway = %self.last_gateway(&reference),
                        error = %e,
                        "Media field degraded"
                    );
                    (None, ResolutionStatus::Unreachable)
                }
            }
        } else {
            (None, ResolutionStatus::Unverified)
        };

        input.fetched = fetched.as_deref();
        let sniffed = self.sniffer.sniff(&input, role);
        let dimensions = resolve_dimensions(
            hints.declared_dimensions,
            hints.attribute_dimensions,
            input.fetched,
            Some(&sniffed.mime),
        )
        .map(|(dims, source)| {
            debug!(artwork_id = %id, field = %role, ?source, "Dimensions resolved");
            dims
        });
        if dimensions.is_none() && mime::is_raster_image(&sniffed.mime) {
            debug!(
                artwork_id = %id,
                field = %role,
                "{}",
                Error::DimensionUnavailable(reference.raw.clone())
            );
        }

        let resolved_url = match &fetched {
            Some(f) => f.url.clone(),
            None => self
                .resolver
                .candidate_urls(&reference)
                .into_iter()
                .next()
                .unwrap_or_else(|| reference.raw.clone()),
        };

        Some(ResolvedMedia {
            url: resolved_url,
            mime: Some(sniffed.mime),
            dimensions,
            source: Some(sniffed.source),
            status,
        })
    }

    /// Last gateway the cascade tried for a reference, or the URL itself for
    /// direct fetches.
    fn last_gateway(&self, reference: &MediaReference) -> String {
        if reference.is_content_addressed() {
            if let Some(base) = self.resolver.gateways().for_scheme(reference.scheme).last() {
                return base.clone();
            }
        }
        reference.raw.clone()
    }
}
