use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::region::count_to_f64;
pub use crate::core::region::Window;
use crate::evidence::adapter::{EvidenceScores, EvidenceTable};

/// Aggregates the evidence of the genes in one window into a single score
///
/// Implementations must return `None` when no gene in the window carries
/// evidence, and must be monotone: raising a gene's phage-side score never
/// lowers the window score.
pub trait WindowScoring: Send + Sync {
    fn score(&self, genes: &[EvidenceScores]) -> Option<f64>;
}

/// Built-in window scoring functions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Mean phage-side score minus mean bacterial score, each averaged over
    /// the genes that have evidence on that side
    MeanDifferential,

    /// Weakest per-gene differential in the window. A single bacterial-like
    /// gene keeps the window from qualifying.
    #[default]
    MinimumDifferential,
}

impl ScoringMethod {
    pub const ALL: [Self; 2] = [Self::MeanDifferential, Self::MinimumDifferential];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MeanDifferential => "mean_differential",
            Self::MinimumDifferential => "minimum_differential",
        }
    }
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "mean_differential" | "mean" => Ok(Self::MeanDifferential),
            "minimum_differential" | "min" | "minimum" => Ok(Self::MinimumDifferential),
            _ => Err(format!(
                "unknown scoring method '{s}' (expected mean_differential or minimum_differential)"
            )),
        }
    }
}

impl WindowScoring for ScoringMethod {
    fn score(&self, genes: &[EvidenceScores]) -> Option<f64> {
        match self {
            Self::MeanDifferential => {
                if genes.iter().all(EvidenceScores::is_empty) {
                    return None;
                }
                Some(mean(genes.iter().filter_map(EvidenceScores::phage_side))
                    - mean(genes.iter().filter_map(|g| g.bacterial)))
            }
            Self::MinimumDifferential => genes
                .iter()
                .filter_map(EvidenceScores::differential)
                .reduce(f64::min),
        }
    }
}

/// Mean of the values, 0.0 for none
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count_to_f64(count)
    }
}

/// Produces the scored windows of one genome
pub struct WindowScorer<'a> {
    evidence: &'a EvidenceTable,
    window_size: usize,
    scoring: &'a dyn WindowScoring,
}

impl<'a> WindowScorer<'a> {
    pub fn new(
        evidence: &'a EvidenceTable,
        window_size: usize,
        scoring: &'a dyn WindowScoring,
    ) -> Self {
        Self {
            evidence,
            window_size,
            scoring,
        }
    }

    /// Windows starting at each gene index `0..=n-W`, in order. Empty when
    /// the genome has fewer genes than the window size.
    pub fn windows(&self) -> Windows<'a> {
        Windows {
            evidence: self.evidence.as_slice(),
            window_size: self.window_size,
            next_start: 0,
            scoring: self.scoring,
        }
    }
}

/// Lazy window iterator; clone it to restart from the current position
#[derive(Clone)]
pub struct Windows<'a> {
    evidence: &'a [EvidenceScores],
    window_size: usize,
    next_start: usize,
    scoring: &'a dyn WindowScoring,
}

impl Iterator for Windows<'_> {
    type Item = Window;

    fn next(&mut self) -> Option<Self::Item> {
        if self.window_size == 0 {
            return None;
        }
        let start = self.next_start;
        let genes = self.evidence.get(start..start + self.window_size)?;
        self.next_start += 1;

        Some(Window {
            start_gene: start,
            end_gene: start + self.window_size - 1,
            score: self.scoring.score(genes),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.window_size == 0 {
            0
        } else {
            (self.evidence.len() + 1).saturating_sub(self.next_start + self.window_size)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}
