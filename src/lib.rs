//! # prophage-scan
//!
//! A library for calling integrated prophages in bacterial genomes.
//!
//! Bacteriophages that integrate into a host chromosome leave long runs of
//! phage-like genes behind, usually flanked by a short direct repeat (the
//! attachment site). Given per-gene homology evidence from upstream search
//! tools, `prophage-scan` finds those runs and reports where they start and
//! stop.
//!
//! ## Features
//!
//! - **Window scoring**: Sliding windows of consecutive genes scored by phage-versus-host differential
//! - **Region calling**: High-scoring windows merged into disjoint candidate regions
//! - **Boundary refinement**: Edges snapped to attachment-site repeats when the sequence allows
//! - **Filtering**: Minimum size, gene count and score, overlap removal, optional gene-density prefilter
//! - **Extraction**: Called prophage sequences written to FASTA with MD5 checksums
//!
//! ## Example
//!
//! ```rust,no_run
//! use prophage_scan::{Gene, Genome, ProphageScanner, RawHit, ReferenceCategory, ScanConfig, Strand};
//!
//! let genes: Vec<Gene> = (0..40)
//!     .map(|i| Gene::new(i, 1000 * i as u64, 1000 * i as u64 + 900, Strand::Forward))
//!     .collect();
//! let genome = Genome::new("contig_1", 50_000, false, genes).unwrap();
//! let hits: Vec<RawHit> = (10..25)
//!     .map(|i| RawHit::new(i, ReferenceCategory::Phage, 90.0))
//!     .collect();
//!
//! let scanner = ProphageScanner::new(ScanConfig::default()).unwrap();
//! let report = scanner.scan_genome(&genome, &hits).unwrap();
//!
//! for call in &report.calls {
//!     println!("{} {}..{} ({})", call.id, call.start, call.end, call.confidence);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Genes, genomes, regions and call records
//! - [`evidence`]: Normalization of raw search hits into per-gene scores
//! - [`calling`]: Window scoring, region calling, boundary refinement and filtering
//! - [`parsing`]: Readers for FASTA, GFF3 and TSV inputs
//! - [`extract`]: FASTA output of called prophage sequences

pub mod calling;
pub mod core;
pub mod evidence;
pub mod extract;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use calling::{GenomeReport, ProphageScanner, ScanConfig, ScanError};
pub use core::gene::Gene;
pub use core::genome::Genome;
pub use core::region::ProphageCall;
pub use core::types::*;
pub use evidence::{EvidenceError, RawHit};
