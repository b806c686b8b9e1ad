mod cli;

use artforged::{
    config,
    loader::{drive, HttpElement, LoaderOutcome, ProgressiveLoader},
    media,
    orchestrator::Orchestrator,
    record::RawRecord,
    sink::{ArtworkSink, JsonLinesSink},
};
use artforged_common::{Chain, Error};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries command output
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "artforged=trace,artforged_common=debug,artforged_probe=debug".to_string()
        } else {
            "artforged=info,artforged_common=info,artforged_probe=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resolve {
            input,
            chain,
            pretty,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve(&input, chain, pretty, cli.config.as_deref()))
        }
        Commands::Classify { uri } => classify(&uri, cli.config.as_deref()),
        Commands::Probe { file, json } => probe_file(&file, json),
        Commands::CheckDisplay { src } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_display(&src, cli.config.as_deref()))
        }
        Commands::Validate { path } => {
            let path = path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("artforged {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Read records from a file (or stdin for `-`): a single object or an array.
fn read_records(input: &Path) -> Result<Vec<RawRecord>> {
    let content = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {:?}", input);
        }
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read input: {:?}", input))?
    };

    let value: serde_json::Value =
        serde_json::from_str(&content).context("Input is not valid JSON")?;
    match value {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(RawRecord::new).collect()),
        serde_json::Value::Object(_) => Ok(vec![RawRecord::new(value)]),
        _ => anyhow::bail!("Input must be a JSON object or an array of objects"),
    }
}

async fn resolve(
    input: &Path,
    chain: Chain,
    pretty: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let records = read_records(input)?;
    tracing::info!(count = records.len(), %chain, "Resolving records");

    let orchestrator = Orchestrator::new(Arc::new(config))?;
    let sink = JsonLinesSink::new(std::io::stdout()).pretty(pretty);

    let mut failed = 0usize;
    let mut undisplayable = 0usize;
    for (idx, result) in orchestrator
        .resolve_displayable_batch(records, chain)
        .await
        .into_iter()
        .enumerate()
    {
        match result {
            Ok(artwork) => sink.store(&artwork).await?,
            Err(Error::NotDisplayable(id)) => {
                undisplayable += 1;
                tracing::warn!(index = idx, artwork_id = %id, "Artwork not displayable yet");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(index = idx, error = %e, "Record skipped");
            }
        }
    }

    if undisplayable > 0 {
        tracing::warn!(undisplayable, "Some artworks have no reachable media");
    }
    if failed > 0 {
        tracing::warn!(failed, "Some records could not be resolved");
    }
    Ok(())
}

fn classify(uri: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let Some(reference) = media::classify(uri) else {
        anyhow::bail!("Nothing to classify: input is blank");
    };

    println!("Scheme: {}", reference.scheme);
    if let Some(ref cid) = reference.cid {
        println!("CID: {}", cid);
    }
    if let Some(ref path) = reference.path {
        println!("Path: {}", path);
    }
    println!("URI: {}", reference);

    let candidates = media::candidate_urls(&config.gateways, &reference);
    println!("\nCandidates: {}", candidates.len());
    for (i, url) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, url);
    }

    Ok(())
}

fn probe_file(file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let info = artforged_probe::probe_file(file)?;

    if json {
        let value = serde_json::json!({
            "file": file.display().to_string(),
            "size": info.file_size,
            "format": info.format.map(|f| format!("{:?}", f)),
            "mime": info.mime,
            "width": info.dimensions.map(|d| d.width),
            "height": info.dimensions.map(|d| d.height),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("File: {}", file.display());
        println!("Size: {} bytes", info.file_size);
        match info.mime {
            Some(mime) => println!("MIME: {}", mime),
            None => println!("MIME: unknown"),
        }
        if let Some(dims) = info.dimensions {
            println!("Dimensions: {}", dims);
        }
    }

    Ok(())
}

async fn check_display(src: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let mut loader = ProgressiveLoader::from_config(&config);
    let element = HttpElement::new()?;

    let outcome = drive(&mut loader, &element, src).await;

    match outcome {
        LoaderOutcome::Loaded { url, placeholder } => {
            if placeholder {
                println!("Loaded placeholder: {}", url);
            } else {
                println!("Loaded: {}", url);
            }
        }
        LoaderOutcome::GaveUp => println!("Gave up after {} ms", config.loader.timeout_ms),
        LoaderOutcome::Failed => println!("Failed: nothing could be displayed"),
    }
    println!("State: {}", loader.state());

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  IPFS gateways: {}", config.gateways.ipfs.len());
    println!("  Arweave gateways: {}", config.gateways.arweave.len());
    println!("  OnchFS gateways: {}", config.gateways.onchfs.len());
    println!("  Gateway timeout: {} ms", config.gateways.timeout_ms);
    println!("  Concurrency: {}", config.resolver.concurrency);
    println!(
        "  Events API: {}",
        if config.mint_date.events.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
    println!("  Explorers: {}", config.mint_date.explorers.len());
    println!(
        "    Enabled: {}",
        config
            .mint_date
            .explorers
            .iter()
            .filter(|e| e.enabled)
            .count()
    );

    Ok(())
}
