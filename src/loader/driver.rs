//! Async driver running a [`ProgressiveLoader`] against a real element.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use super::machine::{LoaderEffect, LoaderEvent, LoaderOutcome, ProgressiveLoader};
use crate::media::decode_data_uri;

/// Something that can try to display a URL.
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Resolve when the URL has loaded, fail when it cannot be shown.
    async fn load(&self, url: &str) -> anyhow::Result<()>;
}

/// Run the machine for `src` until it notifies an outcome.
pub async fn drive<E>(loader: &mut ProgressiveLoader, element: &E, src: &str) -> LoaderOutcome
where
    E: MediaElement + ?Sized,
{
    let mut pending: Option<String> = None;
    let mut timer: Option<(u64, Instant)> = None;
    let mut effects = loader.handle(LoaderEvent::SourceChanged(src.to_string()));

    loop {
        for effect in effects {
            match effect {
                LoaderEffect::Render(url) => pending = Some(url),
                LoaderEffect::ArmTimer { generation, after } => {
                    timer = Some((generation, Instant::now() + after));
                }
                LoaderEffect::CancelTimer => timer = None,
                LoaderEffect::Notify(outcome) => return outcome,
            }
        }

        let Some(url) = pending.take() else {
            // nothing left to render
            return LoaderOutcome::Failed;
        };
        debug!(state = %loader.state(), url = %url, "Loading");

        let event = match timer {
            Some((generation, deadline)) => tokio::select! {
                result = element.load(&url) => load_event(result, &url),
                _ = tokio::time::sleep_until(deadline) => LoaderEvent::Timeout { generation },
            },
            None => load_event(element.load(&url).await, &url),
        };
        effects = loader.handle(event);
    }
}

fn load_event(result: anyhow::Result<()>, url: &str) -> LoaderEvent {
    match result {
        Ok(()) => LoaderEvent::LoadOk,
        Err(e) => {
            debug!(url = %url, error = %e, "Load failed");
            LoaderEvent::LoadError
        }
    }
}

/// Element that "loads" a URL by requesting it over HTTP.
///
/// `data:` URIs must decode; relative paths are app-local assets and always
/// load.
pub struct HttpElement {
    client: reqwest::Client,
}

impl HttpElement {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("artforged/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaElement for HttpElement {
    async fn load(&self, url: &str) -> anyhow::Result<()> {
        let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
        if lower.starts_with("data:") {
            decode_data_uri(url)?;
            return Ok(());
        }
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Ok(());
        }

        self.client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request failed: {url}"))?
            .error_for_status()
            .with_context(|| format!("bad status: {url}"))?;
        Ok(())
    }
}
