mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./artforged.toml",
        "./config.toml",
        "~/.config/artforged/config.toml",
        "/etc/artforged/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Validate gateways
    for (name, list) in [
        ("ipfs", &config.gateways.ipfs),
        ("arweave", &config.gateways.arweave),
        ("onchfs", &config.gateways.onchfs),
    ] {
        if list.is_empty() {
            anyhow::bail!("Gateway list '{}' cannot be empty", name);
        }
        for base in list {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                anyhow::bail!("Gateway '{}' in '{}' must be an http(s) URL", base, name);
            }
            if !base.ends_with('/') {
                anyhow::bail!("Gateway '{}' in '{}' must end with '/'", base, name);
            }
        }
    }
    if config.gateways.timeout_ms == 0 {
        anyhow::bail!("Gateway timeout cannot be 0");
    }
    if config.gateways.timeout_ms > 2000 {
        tracing::warn!(
            timeout_ms = config.gateways.timeout_ms,
            "Gateway timeout above 2s makes the cascade slow"
        );
    }

    // Validate resolver
    if config.resolver.concurrency == 0 {
        anyhow::bail!("Resolver concurrency cannot be 0");
    }
    if config.resolver.sniff_sample_bytes == 0 {
        anyhow::bail!("Sniff sample size cannot be 0");
    }
    if config.resolver.sniff_sample_bytes > config.resolver.max_sample_bytes {
        anyhow::bail!(
            "sniff_sample_bytes ({}) cannot exceed max_sample_bytes ({})",
            config.resolver.sniff_sample_bytes,
            config.resolver.max_sample_bytes
        );
    }

    // Validate mint-date sources
    if let Some(events) = &config.mint_date.events {
        if events.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            tracing::warn!("Events API configured without an API key, it will be skipped");
        }
    }
    for explorer in &config.mint_date.explorers {
        if explorer.enabled && !explorer.has_credentials() {
            tracing::warn!(
                chain = %explorer.chain,
                "Explorer is enabled but has no API key, it will be skipped"
            );
        }
        if explorer.endpoint().is_none() {
            anyhow::bail!("Explorer for '{}' needs a base_url", explorer.chain);
        }
    }

    // Validate loader
    if config.loader.timeout_ms == 0 {
        anyhow::bail!("Loader timeout cannot be 0");
    }
    if let Some(template) = &config.loader.optimizer_template {
        if !template.contains("{url}") {
            anyhow::bail!("optimizer_template must contain a {{url}} placeholder");
        }
    }

    Ok(())
}
