//! Common error types used throughout artforged.
//!
//! Almost every variant here is non-fatal: the resolution engine logs it and
//! degrades the affected field to null or a best guess. Only
//! [`Error::NotDisplayable`] is meant to reach a caller as an actionable
//! condition, and even that means "not displayable yet" rather than a fault.

/// Common error type for artforged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A URI did not match any known scheme and was passed through as-is.
    #[error("Ambiguous media reference, passed through: {0}")]
    ClassificationAmbiguous(String),

    /// Every gateway in the cascade failed for a content-addressed reference.
    #[error("All {attempts} gateway(s) exhausted for {reference}")]
    GatewayExhausted {
        /// The raw reference that could not be resolved.
        reference: String,
        /// How many gateways were tried.
        attempts: usize,
    },

    /// No sniffing strategy produced a whitelisted MIME type.
    #[error("MIME sniffing inconclusive for {0}")]
    SniffInconclusive(String),

    /// No source yielded positive width and height.
    #[error("Dimensions unavailable for {0}")]
    DimensionUnavailable(String),

    /// No mint-date candidate survived validation.
    #[error("Mint date unavailable for {0}")]
    MintDateUnavailable(String),

    /// A declared or sniffed MIME type is outside the whitelist.
    #[error("MIME type not in whitelist: {0}")]
    InvalidMime(String),

    /// Every media role of an artwork failed to resolve.
    #[error("Artwork is not displayable yet: {0}")]
    NotDisplayable(String),

    /// An HTTP exchange failed (transport error or unexpected status).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new GatewayExhausted error.
    pub fn gateway_exhausted<S: Into<String>>(reference: S, attempts: usize) -> Self {
        Self::GatewayExhausted {
            reference: reference.into(),
            attempts,
        }
    }

    /// Create a new InvalidMime error.
    pub fn invalid_mime<S: Into<String>>(mime: S) -> Self {
        Self::InvalidMime(mime.into())
    }

    /// Create a new NotDisplayable error.
    pub fn not_displayable<S: Into<String>>(artwork: S) -> Self {
        Self::NotDisplayable(artwork.into())
    }

    /// Create a new Http error.
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Self::Http(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error aborts anything beyond the single field it concerns.
    ///
    /// Resolution never aborts a batch; callers use this to decide whether an
    /// error is worth surfacing instead of only logging it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::Io(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
