//! Readers for the scan inputs.
//!
//! This module provides parsers for:
//!
//! - **FASTA** (`.fa`, `.fasta`, `.fna`, optionally gzip/bgzip compressed):
//!   contig sequences, read with noodles
//! - **GFF3**: CDS features as gene calls, converted from 1-based closed to
//!   0-based half-open coordinates
//! - **TSV**: gene calls (`contig start end strand`, 0-based half-open) and
//!   evidence hits (`contig gene_index category score`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use prophage_scan::parsing::{fasta, read_gene_calls, tsv};
//! use std::path::Path;
//!
//! let sequences = fasta::read_sequences(Path::new("genome.fna")).unwrap();
//! let genes = read_gene_calls(Path::new("genome.gff3")).unwrap();
//! let hits = tsv::parse_hits_file(Path::new("hits.tsv")).unwrap();
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

use crate::core::gene::Gene;
use crate::evidence::adapter::RawHit;
use crate::utils::validation::{MAX_CONTIGS, MAX_GENES, MAX_HITS};

pub mod fasta;
pub mod gff;
pub mod tsv;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Too many contigs: {0} exceeds maximum allowed ({MAX_CONTIGS})")]
    TooManyContigs(usize),

    #[error("Too many genes on {contig}: {count} exceeds maximum allowed ({MAX_GENES})")]
    TooManyGenes { contig: String, count: usize },

    #[error("Too many hits: {0} exceeds maximum allowed ({MAX_HITS})")]
    TooManyHits(usize),
}

/// Gene calls grouped by contig name, in file order within each contig
pub type GenesByContig = HashMap<String, Vec<Gene>>;

/// Evidence hits grouped by contig name
pub type HitsByContig = HashMap<String, Vec<RawHit>>;

/// Check if the path has a GFF extension
pub fn is_gff_file(path: &Path) -> bool {
    let name = path.to_string_lossy().to_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    name.ends_with(".gff") || name.ends_with(".gff3")
}

/// Read a whole text file, decompressing `.gz`/`.bgz` input
pub(crate) fn read_text(path: &Path) -> Result<String, ParseError> {
    let file = std::fs::File::open(path)?;
    let mut text = String::new();
    if fasta::is_gzipped(path) {
        MultiGzDecoder::new(file).read_to_string(&mut text)?;
    } else {
        std::io::BufReader::new(file).read_to_string(&mut text)?;
    }
    Ok(text)
}

/// Read gene calls, choosing GFF3 or TSV by file extension
///
/// # Errors
///
/// Returns `ParseError` if the file cannot be read or is malformed.
pub fn read_gene_calls(path: &Path) -> Result<GenesByContig, ParseError> {
    if is_gff_file(path) {
        gff::parse_gff_file(path)
    } else {
        tsv::parse_genes_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_gff_file() {
        assert!(is_gff_file(Path::new("calls.gff3")));
        assert!(is_gff_file(Path::new("calls.GFF")));
        assert!(is_gff_file(Path::new("calls.gff.gz")));
        assert!(!is_gff_file(Path::new("calls.tsv")));
    }
}
