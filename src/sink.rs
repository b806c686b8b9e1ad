//! Persistence boundary.
//!
//! The engine hands one [`ArtworkMediaSet`] per artwork to an [`ArtworkSink`]
//! and knows nothing about where it ends up.

use std::io::Write;

use anyhow::Context;
use artforged_common::ArtworkMediaSet;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Receiver for resolved artworks.
#[async_trait]
pub trait ArtworkSink: Send + Sync {
    async fn store(&self, artwork: &ArtworkMediaSet) -> anyhow::Result<()>;
}

/// Writes one JSON document per artwork, newline-terminated.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
    pretty: bool,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            pretty: false,
        }
    }

    /// Indent each document (no longer one per line, but easier to read).
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> ArtworkSink for JsonLinesSink<W> {
    async fn store(&self, artwork: &ArtworkMediaSet) -> anyhow::Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(artwork)
        } else {
            serde_json::to_string(artwork)
        }
        .context("failed to serialize artwork")?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{json}").context("failed to write artwork")?;
        writer.flush().context("failed to flush sink")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artforged_common::{ArtworkId, Chain};

    #[tokio::test]
    async fn test_json_lines() {
        let sink = JsonLinesSink::new(Vec::new());
        let mut first = ArtworkMediaSet::new(ArtworkId::new("a"), Chain::Tezos);
        first.name = Some("First".to_string());
        sink.store(&first).await.unwrap();
        sink.store(&ArtworkMediaSet::new(ArtworkId::new("b"), Chain::Base))
            .await
            .unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: ArtworkMediaSet = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, first);
        assert!(lines[1].contains("\"chain\":\"base\""));
    }

    #[tokio::test]
    async fn test_pretty() {
        let sink = JsonLinesSink::new(Vec::new()).pretty(true);
        sink.store(&ArtworkMediaSet::new(ArtworkId::new("a"), Chain::Ethereum))
            .await
            .unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains("\n  \"id\": \"a\""));
    }
}
