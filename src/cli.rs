use artforged_common::Chain;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "artforged")]
#[command(author, version, about = "NFT media and metadata resolution engine")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve indexer records (a JSON object or array) into artwork media sets
    Resolve {
        /// JSON file with one record or an array of records ("-" for stdin)
        #[arg(required = true)]
        input: PathBuf,

        /// Chain the records belong to
        #[arg(long, default_value = "ethereum")]
        chain: Chain,

        /// Pretty-print each resolved artwork
        #[arg(long)]
        pretty: bool,
    },

    /// Classify a media URI and list the URLs that would be tried
    Classify {
        /// URI as found in token metadata
        #[arg(required = true)]
        uri: String,
    },

    /// Sniff the format and dimensions of a local file
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the progressive loader against a source and report what displays
    CheckDisplay {
        /// Media source as it would be handed to a client
        #[arg(required = true)]
        src: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        path: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
