use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::calling::boundary::BoundaryRefiner;
use crate::calling::caller::RegionCaller;
use crate::calling::config::{ConfigError, ScanConfig};
use crate::calling::density::GeneDensityMap;
use crate::calling::filter::{Rejection, RegionFilter};
use crate::calling::repeats::{KmerRepeatSearch, RepeatSearch};
use crate::calling::window::{WindowScorer, WindowScoring};
use crate::core::genome::Genome;
use crate::core::region::{ProphageCall, RefinedRegion};
use crate::core::types::GenomeId;
use crate::evidence::adapter::{EvidenceAdapter, EvidenceError, RawHit};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
}

/// Non-fatal conditions worth reporting alongside a genome's calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "note", rename_all = "snake_case")]
pub enum ScanNote {
    /// Contig skipped as too short to hold a prophage
    ContigTooShort { length: u64, minimum: u64 },

    /// Fewer genes than one window; nothing to score
    InsufficientGenes { genes: usize, window_size: usize },

    /// No gene carried any evidence
    NoEvidence,

    /// No sequence attached, so every edge is truncated
    NoSequence,
}

impl std::fmt::Display for ScanNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContigTooShort { length, minimum } => {
                write!(f, "contig too short ({length} bp, minimum {minimum})")
            }
            Self::InsufficientGenes { genes, window_size } => {
                write!(f, "insufficient genes ({genes}, window size {window_size})")
            }
            Self::NoEvidence => write!(f, "no gene evidence"),
            Self::NoSequence => write!(f, "no sequence, boundaries not refined"),
        }
    }
}

/// Everything learned about one genome
#[derive(Debug, Clone, Serialize)]
pub struct GenomeReport {
    pub genome_id: GenomeId,
    pub length: u64,
    pub circular: bool,
    pub gene_count: usize,
    pub evidenced_genes: usize,
    pub windows: usize,
    pub candidates: usize,
    pub calls: Vec<ProphageCall>,
    pub rejected: Vec<Rejection>,
    pub notes: Vec<ScanNote>,
}

impl GenomeReport {
    fn empty(genome: &Genome) -> Self {
        Self {
            genome_id: genome.id.clone(),
            length: genome.length,
            circular: genome.circular,
            gene_count: genome.gene_count(),
            evidenced_genes: 0,
            windows: 0,
            candidates: 0,
            calls: Vec::new(),
            rejected: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// One genome of a batch, borrowed for the duration of the scan
#[derive(Debug, Clone, Copy)]
pub struct GenomeInput<'a> {
    pub genome: &'a Genome,
    pub hits: &'a [RawHit],
}

/// Per-genome result of a batch; a failure does not affect other genomes
#[derive(Debug)]
pub struct GenomeOutcome {
    pub genome_id: GenomeId,
    pub result: Result<GenomeReport, ScanError>,
}

/// Runs the full calling pipeline: evidence normalization, window scoring,
/// region calling, boundary refinement and filtering
pub struct ProphageScanner {
    config: ScanConfig,
    scoring: Box<dyn WindowScoring>,
    repeats: Box<dyn RepeatSearch>,
}

impl ProphageScanner {
    /// Create a scanner using the built-in scoring method and repeat search
    /// named by `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the configuration fails validation.
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let repeats = KmerRepeatSearch::new(
            config.min_att_length,
            config.max_att_mismatches,
            config.search_inverted,
        );
        Ok(Self {
            scoring: Box::new(config.scoring),
            repeats: Box::new(repeats),
            config,
        })
    }

    /// Replace the window scoring function
    #[must_use]
    pub fn with_scoring(mut self, scoring: impl WindowScoring + 'static) -> Self {
        self.scoring = Box::new(scoring);
        self
    }

    /// Replace the attachment-site repeat search
    #[must_use]
    pub fn with_repeat_search(mut self, repeats: impl RepeatSearch + 'static) -> Self {
        self.repeats = Box::new(repeats);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan one genome.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Evidence` if the hits do not fit the genome.
    pub fn scan_genome(&self, genome: &Genome, hits: &[RawHit]) -> Result<GenomeReport, ScanError> {
        let config = &self.config;
        let evidence = EvidenceAdapter::new(&config.normalization).adapt(genome, hits)?;

        let mut report = GenomeReport::empty(genome);
        report.evidenced_genes = evidence.evidenced_genes();

        if genome.length < config.min_contig_length {
            debug!(genome = %genome.id, length = genome.length, "skipping short contig");
            report.notes.push(ScanNote::ContigTooShort {
                length: genome.length,
                minimum: config.min_contig_length,
            });
            return Ok(report);
        }
        if genome.gene_count() < config.window_size {
            report.notes.push(ScanNote::InsufficientGenes {
                genes: genome.gene_count(),
                window_size: config.window_size,
            });
            return Ok(report);
        }
        if report.evidenced_genes == 0 {
            report.notes.push(ScanNote::NoEvidence);
        }
        if !genome.has_sequence() {
            report.notes.push(ScanNote::NoSequence);
        }

        let scorer = WindowScorer::new(&evidence, config.window_size, &*self.scoring);
        let windows = scorer.windows();
        report.windows = windows.len();

        let candidates = RegionCaller::from_config(config).call(windows, genome.genes());
        report.candidates = candidates.len();
        debug!(
            genome = %genome.id,
            windows = report.windows,
            candidates = report.candidates,
            "called candidate regions"
        );

        let refiner = BoundaryRefiner::new(config.search_radius, &*self.repeats);
        let refined: Vec<RefinedRegion> = candidates
            .into_iter()
            .map(|c| refiner.refine(genome, c))
            .collect();

        let dense = config
            .density
            .as_ref()
            .map(|d| GeneDensityMap::new(genome, d).dense_intervals(d));
        let mut filter = RegionFilter::new(config);
        if let Some(dense) = dense.as_deref() {
            filter = filter.with_dense_intervals(dense);
        }
        let filtered = filter.apply(refined);

        report.calls = filtered
            .accepted
            .iter()
            .enumerate()
            .map(|(i, region)| ProphageCall::from_refined(genome, i + 1, region))
            .collect();
        report.rejected = filtered.rejected;

        info!(
            genome = %genome.id,
            calls = report.calls.len(),
            rejected = report.rejected.len(),
            "scanned genome"
        );
        Ok(report)
    }

    /// Scan genomes in parallel. Outcomes are returned in input order.
    pub fn scan_batch(&self, inputs: &[GenomeInput<'_>]) -> Vec<GenomeOutcome> {
        inputs
            .par_iter()
            .map(|input| GenomeOutcome {
                genome_id: input.genome.id.clone(),
                result: self.scan_genome(input.genome, input.hits),
            })
            .collect()
    }
}
