use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for sdmxscraper
#[derive(Debug, Parser)]
#[command(
    name = "sdmxscraper",
    version,
    about = "Fetch SDMX-JSON datasets and extract region tables"
)]
pub struct CliArgs {
    /// YAML config file; repeat to process several datasets
    #[arg(short = 'c', long = "config", global = true)]
    pub configs: Vec<PathBuf>,

    /// Dataset id, used when no config file is given
    #[arg(short = 'd', long = "dataset", global = true)]
    pub dataset: Option<String>,

    /// Override the SDMX endpoint base URL
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Override the dimension holding region codes
    #[arg(long = "region-dimension", global = true)]
    pub region_dimension: Option<String>,

    /// Comma-separated key segments (e.g. ERP,3,,STE)
    #[arg(short = 'f', long = "filter", global = true)]
    pub filter: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch each dataset and write `<dataset>.parquet`
    Fetch {
        /// Output directory
        #[arg(short = 'o', long = "out", default_value = "parquet")]
        out: PathBuf,
    },

    /// Print the share-link JSON for each config
    Share,

    /// Print the rows of a region table written by `fetch`
    Inspect {
        /// Parquet file to read
        path: PathBuf,
    },
}
