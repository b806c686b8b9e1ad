//! Shared test harness for integration tests.
//!
//! Builds configurations pointing at [`wiremock`] servers, payload fixtures,
//! and an in-memory [`ArtworkSink`].

#![allow(dead_code)]

use std::sync::Arc;

use artforged::config::Config;
use artforged::orchestrator::Orchestrator;
use artforged::sink::ArtworkSink;
use artforged_common::ArtworkMediaSet;
use async_trait::async_trait;
use parking_lot::Mutex;
use wiremock::MockServer;

/// CIDv1 used across scenarios.
pub const CID: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

/// IPFS gateway base served by a mock server.
pub fn ipfs_base(server: &MockServer) -> String {
    format!("{}/ipfs/", server.uri())
}

/// Config whose IPFS cascade is exactly `gateways`, with fast timeouts and
/// no batch delay.
pub fn config_with_gateways(gateways: Vec<String>) -> Config {
    let mut config = Config::default();
    config.gateways.arweave = gateways
        .iter()
        .map(|g| g.trim_end_matches("ipfs/").to_string())
        .collect();
    config.gateways.ipfs = gateways;
    config.gateways.timeout_ms = 300;
    config.gateways.cache_responses = false;
    config.resolver.batch_delay_ms = 0;
    config
}

pub fn orchestrator(config: Config) -> Orchestrator {
    Orchestrator::new(Arc::new(config)).expect("failed to build orchestrator")
}

/// PNG with a valid IHDR, padded to `len` bytes.
pub fn png(width: u32, height: u32, len: usize) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data.extend_from_slice(&[0, 0, 0, 0]);
    if data.len() < len {
        data.resize(len, 0);
    }
    data
}

/// Sink that keeps every stored artwork.
#[derive(Default)]
pub struct MemorySink {
    pub stored: Mutex<Vec<ArtworkMediaSet>>,
}

#[async_trait]
impl ArtworkSink for MemorySink {
    async fn store(&self, artwork: &ArtworkMediaSet) -> anyhow::Result<()> {
        self.stored.lock().push(artwork.clone());
        Ok(())
    }
}
