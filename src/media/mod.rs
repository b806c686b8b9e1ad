//! Media reference handling: classification, gateway resolution, MIME
//! sniffing and dimension selection.
//!
//! # Module layout
//!
//! - [`reference`] -- URI classification into [`MediaReference`].
//! - [`gateway`] -- Candidate URLs and fetch-with-fallback.
//! - [`sniff`] -- MIME strategy chain.
//! - [`dimensions`] -- Dimension priority chain.

pub mod dimensions;
pub mod gateway;
pub mod reference;
pub mod sniff;

pub use dimensions::{resolve_dimensions, DimensionSource};
pub use gateway::{
    candidate_urls, content_address_from_url, decode_data_uri, urlencoded, AttemptStatus,
    FetchedMedia, GatewayResolver, ResolutionAttempt,
};
pub use reference::{classify, MediaReference};
pub use sniff::{MimeSniffer, SniffInput, Sniffed};
