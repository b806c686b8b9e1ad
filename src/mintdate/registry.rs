//! Registry holding mint-date providers in trust order.

use std::sync::Arc;

use anyhow::Result;
use artforged_common::Chain;
use tracing::{debug, warn};

use super::provider::MintDateProvider;
use super::providers::{EventsApiProvider, ExplorerProvider};
use crate::config::MintDateConfig;

/// Ordered collection of [`MintDateProvider`]s.
///
/// Providers are kept in registration order, which is also the order the
/// reconciler consults them in. Register the most trusted source first.
pub struct MintDateRegistry {
    providers: Vec<Arc<dyn MintDateProvider>>,
}

impl MintDateRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Build the registry described by the configuration: the events API
    /// first, then one explorer per configured chain.
    ///
    /// Entries without credentials are still registered; they simply report
    /// themselves unavailable.
    pub fn from_config(config: &MintDateConfig) -> Result<Self> {
        let mut registry = Self::new();

        if let Some(events) = &config.events {
            registry.register(Arc::new(EventsApiProvider::new(events)?));
        }

        for explorer in &config.explorers {
            if !explorer.enabled {
                debug!(chain = %explorer.chain, "Explorer disabled in config");
                continue;
            }
            match ExplorerProvider::new(explorer)? {
                Some(provider) => registry.register(Arc::new(provider)),
                None => warn!(
                    chain = %explorer.chain,
                    "No explorer endpoint known for chain, skipping"
                ),
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, provider: Arc<dyn MintDateProvider>) {
        self.providers.push(provider);
    }

    /// Providers with credentials, in trust order.
    pub fn available(&self) -> Vec<&dyn MintDateProvider> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.as_ref())
            .collect()
    }

    /// Available providers that can answer for `chain`, in trust order.
    pub fn for_chain(&self, chain: Chain) -> Vec<&dyn MintDateProvider> {
        self.providers
            .iter()
            .filter(|p| p.is_available() && p.supports(chain))
            .map(|p| p.as_ref())
            .collect()
    }

    /// First available provider.
    pub fn primary(&self) -> Option<&dyn MintDateProvider> {
        self.providers
            .iter()
            .find(|p| p.is_available())
            .map(|p| p.as_ref())
    }

    /// Look up a provider by [`MintDateProvider::name`].
    pub fn get(&self, name: &str) -> Option<&dyn MintDateProvider> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for MintDateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
