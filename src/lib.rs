//! Artforged - NFT media and metadata resolution engine
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod loader;
pub mod media;
pub mod mintdate;
pub mod orchestrator;
pub mod record;
pub mod sink;
