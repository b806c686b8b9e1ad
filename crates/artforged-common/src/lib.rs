//! Artforged-Common: Shared types, tables, and errors.
//!
//! This crate provides the vocabulary shared by the resolution engine, the
//! byte-level probe crate, and whatever persists the engine's output:
//!
//! - **Typed IDs**: [`ArtworkId`] naming one token across chains
//! - **Core Types**: schemes, media roles, chains, MIME provenance, dimensions
//! - **Artwork Records**: [`ResolvedMedia`] and the aggregate [`ArtworkMediaSet`]
//! - **MIME Tables**: the fixed whitelist and the extension table
//! - **Error Handling**: the non-fatal resolution error taxonomy
//!
//! # Examples
//!
//! ```
//! use artforged_common::{mime, ArtworkId, Chain, Dimensions, Error, Result};
//!
//! let id = ArtworkId::from_parts(Chain::Ethereum, "0xabc", "42");
//! assert_eq!(id.to_string(), "ethereum:0xabc:42");
//!
//! assert!(mime::is_whitelisted("image/png"));
//! assert_eq!(mime::from_extension("GIF"), Some("image/gif"));
//! assert!(Dimensions::new(800, 600).is_some());
//!
//! fn example() -> Result<()> {
//!     Err(Error::invalid_input("empty record"))
//! }
//! ```

pub mod artwork;
pub mod error;
pub mod ids;
pub mod mime;
pub mod types;

pub use artwork::{ArtworkMediaSet, Attribute, ResolvedMedia};
pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
