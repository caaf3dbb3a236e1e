use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::genome::Genome;
use crate::core::types::ReferenceCategory;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Malformed evidence for {genome}, gene {gene_index}: {reason}")]
    MalformedEvidence {
        genome: String,
        gene_index: usize,
        reason: String,
    },
}

/// One hit reported by an external homology or profile search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    /// Index of the gene in its genome's ordered gene list
    pub gene_index: usize,

    pub category: ReferenceCategory,

    /// Tool-native score (e.g. bitscore), not normalized
    pub score: f64,
}

impl RawHit {
    pub fn new(gene_index: usize, category: ReferenceCategory, score: f64) -> Self {
        Self {
            gene_index,
            category,
            score,
        }
    }
}

/// Per-category score ceilings used to map raw scores onto `[0, 1]`
///
/// A raw score at or above the ceiling normalizes to 1.0; negative scores
/// normalize to 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub phage_ceiling: f64,
    pub bacterial_ceiling: f64,
    pub profile_ceiling: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            phage_ceiling: 100.0,
            bacterial_ceiling: 100.0,
            profile_ceiling: 50.0,
        }
    }
}

impl NormalizationConfig {
    pub fn ceiling(&self, category: ReferenceCategory) -> f64 {
        match category {
            ReferenceCategory::Phage => self.phage_ceiling,
            ReferenceCategory::Bacterial => self.bacterial_ceiling,
            ReferenceCategory::Profile => self.profile_ceiling,
        }
    }

    #[must_use]
    pub fn normalize(&self, category: ReferenceCategory, raw: f64) -> f64 {
        (raw.max(0.0) / self.ceiling(category)).min(1.0)
    }
}

/// Normalized evidence for one gene
///
/// `None` means the gene had no hit in that category. It is never folded
/// into zero: absence of homology is not evidence against a phage origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bacterial: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<f64>,
}

impl EvidenceScores {
    pub fn get(&self, category: ReferenceCategory) -> Option<f64> {
        match category {
            ReferenceCategory::Phage => self.phage,
            ReferenceCategory::Bacterial => self.bacterial,
            ReferenceCategory::Profile => self.profile,
        }
    }

    fn slot(&mut self, category: ReferenceCategory) -> &mut Option<f64> {
        match category {
            ReferenceCategory::Phage => &mut self.phage,
            ReferenceCategory::Bacterial => &mut self.bacterial,
            ReferenceCategory::Profile => &mut self.profile,
        }
    }

    /// True if the gene had no hit in any category
    pub fn is_empty(&self) -> bool {
        self.phage.is_none() && self.bacterial.is_none() && self.profile.is_none()
    }

    /// Strongest phage-like evidence: the better of the phage homology and
    /// profile-match scores
    pub fn phage_side(&self) -> Option<f64> {
        match (self.phage, self.profile) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    /// Phage-side minus bacterial evidence, with a missing side counted as 0.
    /// `None` when the gene has no evidence at all.
    pub fn differential(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.phage_side().unwrap_or(0.0) - self.bacterial.unwrap_or(0.0))
    }
}

/// Normalized evidence for every gene of one genome, indexed by gene index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceTable {
    scores: Vec<EvidenceScores>,
}

impl EvidenceTable {
    pub fn new(scores: Vec<EvidenceScores>) -> Self {
        Self { scores }
    }

    /// A table where each gene carries a single phage score, or no evidence
    /// for `None`. Convenient for callers with pre-computed per-gene scores.
    pub fn from_phage_scores(scores: &[Option<f64>]) -> Self {
        Self::new(
            scores
                .iter()
                .map(|&phage| EvidenceScores {
                    phage,
                    ..EvidenceScores::default()
                })
                .collect(),
        )
    }

    pub fn get(&self, gene_index: usize) -> Option<&EvidenceScores> {
        self.scores.get(gene_index)
    }

    pub fn as_slice(&self) -> &[EvidenceScores] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Number of genes with evidence in at least one category
    pub fn evidenced_genes(&self) -> usize {
        self.scores.iter().filter(|s| !s.is_empty()).count()
    }
}

/// Turns raw search hits into an [`EvidenceTable`]
pub struct EvidenceAdapter<'a> {
    normalization: &'a NormalizationConfig,
}

impl<'a> EvidenceAdapter<'a> {
    pub fn new(normalization: &'a NormalizationConfig) -> Self {
        Self { normalization }
    }

    /// Collapse hits to one normalized score per gene and category.
    ///
    /// Several hits for the same gene and category keep the highest raw
    /// score.
    ///
    /// # Errors
    ///
    /// Returns `EvidenceError::MalformedEvidence` if a hit references a gene
    /// index outside the genome or carries a non-finite score.
    pub fn adapt(&self, genome: &Genome, hits: &[RawHit]) -> Result<EvidenceTable, EvidenceError> {
        let gene_count = genome.gene_count();
        let mut raw = vec![EvidenceScores::default(); gene_count];

        for hit in hits {
            let Some(scores) = raw.get_mut(hit.gene_index) else {
                return Err(EvidenceError::MalformedEvidence {
                    genome: genome.id.to_string(),
                    gene_index: hit.gene_index,
                    reason: format!("gene index out of range (genome has {gene_count} genes)"),
                });
            };
            if !hit.score.is_finite() {
                return Err(EvidenceError::MalformedEvidence {
                    genome: genome.id.to_string(),
                    gene_index: hit.gene_index,
                    reason: format!("non-finite {} score", hit.category),
                });
            }

            let slot = scores.slot(hit.category);
            *slot = Some(slot.map_or(hit.score, |best| best.max(hit.score)));
        }

        let scores: Vec<EvidenceScores> = raw
            .into_iter()
            .map(|s| EvidenceScores {
                phage: s
                    .phage
                    .map(|v| self.normalization.normalize(ReferenceCategory::Phage, v)),
                bacterial: s
                    .bacterial
                    .map(|v| self.normalization.normalize(ReferenceCategory::Bacterial, v)),
                profile: s
                    .profile
                    .map(|v| self.normalization.normalize(ReferenceCategory::Profile, v)),
            })
            .collect();

        let table = EvidenceTable::new(scores);
        debug!(
            genome = %genome.id,
            hits = hits.len(),
            evidenced = table.evidenced_genes(),
            genes = gene_count,
            "normalized gene evidence"
        );
        Ok(table)
    }
}
