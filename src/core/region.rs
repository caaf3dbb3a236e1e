use serde::{Deserialize, Serialize};

use crate::core::gene::Gene;
use crate::core::genome::Genome;
use crate::core::types::{BoundaryEvidence, Confidence, GenomeId, Strand};
use crate::utils::validation::sequence_md5;

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
pub(crate) fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// A run of consecutive genes scored as one unit
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Index of the first member gene
    pub start_gene: usize,

    /// Index of the last member gene (inclusive)
    pub end_gene: usize,

    /// Aggregate phage-likeness; `None` when no member gene carries evidence
    pub score: Option<f64>,
}

impl Window {
    pub fn gene_count(&self) -> usize {
        self.end_gene - self.start_gene + 1
    }

    /// True if the window reaches `cutoff`. Unscored windows never qualify.
    pub fn qualifies(&self, cutoff: f64) -> bool {
        self.score.is_some_and(|s| s >= cutoff)
    }
}

/// Merged span of qualifying windows, before boundary refinement
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRegion {
    pub start_gene: usize,

    /// Index of the last gene (inclusive)
    pub end_gene: usize,

    /// Start coordinate of the first gene
    pub start: u64,

    /// End coordinate (exclusive) of the furthest-reaching gene
    pub end: u64,

    pub max_score: f64,

    pub mean_score: f64,

    /// Windows that were merged into this region, in order
    pub windows: Vec<Window>,
}

impl CandidateRegion {
    /// Build a region covering `windows`, taking nucleotide coordinates from
    /// `genes`. Returns `None` for an empty window list or windows that
    /// reference genes outside `genes`.
    pub fn from_windows(windows: Vec<Window>, genes: &[Gene]) -> Option<Self> {
        let start_gene = windows.iter().map(|w| w.start_gene).min()?;
        let end_gene = windows.iter().map(|w| w.end_gene).max()?;
        let span = genes.get(start_gene..=end_gene)?;

        let start = span.iter().map(|g| g.start).min()?;
        let end = span.iter().map(|g| g.end).max()?;

        let scores: Vec<f64> = windows.iter().filter_map(|w| w.score).collect();
        let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_score = if scores.is_empty() {
            f64::NEG_INFINITY
        } else {
            scores.iter().sum::<f64>() / count_to_f64(scores.len())
        };

        Some(Self {
            start_gene,
            end_gene,
            start,
            end,
            max_score,
            mean_score,
            windows,
        })
    }

    /// Number of genes in the gene-index span
    pub fn gene_span(&self) -> usize {
        self.end_gene - self.start_gene + 1
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A repeat pair the boundaries were snapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSite {
    /// Start of the copy at the left boundary (attL)
    pub left_start: u64,

    /// Start of the copy at the right boundary (attR)
    pub right_start: u64,

    pub length: u64,

    /// `Forward` for a direct repeat, `Reverse` for an inverted one
    pub strand: Strand,

    pub mismatches: u32,
}

impl AttachmentSite {
    pub fn left_end(&self) -> u64 {
        self.left_start + self.length
    }

    pub fn right_end(&self) -> u64 {
        self.right_start + self.length
    }

    pub fn is_exact(&self) -> bool {
        self.mismatches == 0
    }
}

/// A candidate region after boundary refinement
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedRegion {
    pub candidate: CandidateRegion,

    pub start: u64,

    /// Exclusive end coordinate
    pub end: u64,

    pub left: BoundaryEvidence,

    pub right: BoundaryEvidence,

    pub attachment: Option<AttachmentSite>,

    /// Genes lying wholly within `[start, end)`
    pub gene_count: usize,
}

impl RefinedRegion {
    /// Aggregate score used for acceptance and deduplication
    pub fn score(&self) -> f64 {
        self.candidate.mean_score
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// An accepted prophage, ready for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProphageCall {
    /// `{genome_id}_prophage_{n}`, numbered from 1 in coordinate order
    pub id: String,

    pub genome_id: GenomeId,

    pub start: u64,

    /// Exclusive end coordinate
    pub end: u64,

    /// Mean score of the contributing windows
    pub score: f64,

    pub max_score: f64,

    pub gene_count: usize,

    pub left: BoundaryEvidence,

    pub right: BoundaryEvidence,

    pub confidence: Confidence,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentSite>,

    /// MD5 of the uppercase prophage sequence, when the sequence is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_md5: Option<String>,
}

impl ProphageCall {
    /// Freeze a refined region into a call; `ordinal` is 1-based
    pub fn from_refined(genome: &Genome, ordinal: usize, region: &RefinedRegion) -> Self {
        Self {
            id: format!("{}_prophage_{ordinal}", genome.id),
            genome_id: genome.id.clone(),
            start: region.start,
            end: region.end,
            score: region.score(),
            max_score: region.candidate.max_score,
            gene_count: region.gene_count,
            left: region.left,
            right: region.right,
            confidence: Confidence::from_edges(region.left, region.right),
            attachment: region.attachment,
            sequence_md5: genome
                .subsequence(region.start, region.end)
                .map(sequence_md5),
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
