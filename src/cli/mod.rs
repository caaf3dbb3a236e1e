//! Command-line interface for prophage-scan.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **scan**: Call prophage regions from gene calls, evidence hits and sequence
//! - **config**: Print the effective scan configuration
//!
//! ## Usage
//!
//! ```text
//! # Scan a draft assembly
//! prophage-scan scan --fasta genome.fna --genes genes.gff3 --hits hits.tsv
//!
//! # Treat a complete chromosome as circular and extract the calls
//! prophage-scan scan --fasta genome.fna --genes genes.gff3 --hits hits.tsv \
//!     --circular chr --extract prophages.fna
//!
//! # JSON output for scripting
//! prophage-scan --format json scan --fasta genome.fna --genes genes.tsv --hits hits.tsv
//!
//! # Show what the strict preset resolves to
//! prophage-scan config --preset strict
//! ```

use clap::{Parser, Subcommand};

pub mod config;
pub mod scan;

#[derive(Parser)]
#[command(name = "prophage-scan")]
#[command(version)]
#[command(about = "Call integrated prophage regions in bacterial genomes")]
#[command(
    long_about = "prophage-scan locates prophages in bacterial genomes from per-gene homology evidence.\n\nIt scores sliding windows of consecutive genes, merges high-scoring windows into candidate regions and provides:\n- Boundaries refined to attachment-site repeats where the sequence supports them\n- Filtering by size, gene count, score and optional gene density\n- Prophage sequences extracted to FASTA"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Call prophage regions in one or more contigs
    Scan(scan::ScanArgs),

    /// Print the effective configuration as JSON
    Config(config::ConfigArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
