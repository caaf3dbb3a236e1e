use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use tracing::debug;

use crate::calling::config::ScanConfig;
use crate::core::region::RefinedRegion;

/// Why a refined region was not reported
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    TooFewGenes { genes: usize, required: usize },
    TooShort { length: u64, required: u64 },
    LowScore { score: f64, required: f64 },
    /// Overlaps no gene-dense interval
    NotGeneDense,
    /// Lost deduplication to an overlapping, better region
    Overlapped { by_start: u64, by_end: u64 },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewGenes { genes, required } => {
                write!(f, "{genes} genes (minimum {required})")
            }
            Self::TooShort { length, required } => {
                write!(f, "{length} bp (minimum {required})")
            }
            Self::LowScore { score, required } => {
                write!(f, "score {score:.3} (minimum {required:.3})")
            }
            Self::NotGeneDense => write!(f, "outside gene-dense regions"),
            Self::Overlapped { by_start, by_end } => {
                write!(f, "overlaps better region {by_start}-{by_end}")
            }
        }
    }
}

/// A region dropped by the filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub start: u64,
    pub end: u64,
    pub score: f64,
    #[serde(flatten)]
    pub reason: RejectionReason,
}

/// Filter outcome: survivors ordered by start, plus every rejection
#[derive(Debug, Clone, Default)]
pub struct FilterReport {
    pub accepted: Vec<RefinedRegion>,
    pub rejected: Vec<Rejection>,
}

/// Acceptance rules and overlap deduplication for refined regions
///
/// Coordinates are never changed; only whole regions are dropped.
pub struct RegionFilter<'a> {
    min_genes: usize,
    min_length: u64,
    min_score: f64,
    dense: Option<&'a [Range<u64>]>,
}

impl<'a> RegionFilter<'a> {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            min_genes: config.min_region_genes,
            min_length: config.min_region_length,
            min_score: config.min_score,
            dense: None,
        }
    }

    /// Also require overlap with one of these gene-dense intervals
    #[must_use]
    pub fn with_dense_intervals(mut self, dense: &'a [Range<u64>]) -> Self {
        self.dense = Some(dense);
        self
    }

    fn check(&self, region: &RefinedRegion) -> Option<RejectionReason> {
        if region.gene_count < self.min_genes {
            return Some(RejectionReason::TooFewGenes {
                genes: region.gene_count,
                required: self.min_genes,
            });
        }
        if region.len() < self.min_length {
            return Some(RejectionReason::TooShort {
                length: region.len(),
                required: self.min_length,
            });
        }
        if region.score() < self.min_score {
            return Some(RejectionReason::LowScore {
                score: region.score(),
                required: self.min_score,
            });
        }
        if let Some(dense) = self.dense {
            if !dense
                .iter()
                .any(|d| d.start < region.end && region.start < d.end)
            {
                return Some(RejectionReason::NotGeneDense);
            }
        }
        None
    }

    pub fn apply(&self, regions: Vec<RefinedRegion>) -> FilterReport {
        let mut report = FilterReport::default();

        let mut survivors = Vec::with_capacity(regions.len());
        for region in regions {
            match self.check(&region) {
                Some(reason) => report.rejected.push(rejection(&region, reason)),
                None => survivors.push(region),
            }
        }

        survivors.sort_by(priority);
        for region in survivors {
            let winner = report.accepted.iter().find(|kept| kept.overlaps(&region));
            match winner {
                Some(kept) => {
                    let reason = RejectionReason::Overlapped {
                        by_start: kept.start,
                        by_end: kept.end,
                    };
                    report.rejected.push(rejection(&region, reason));
                }
                None => report.accepted.push(region),
            }
        }
        report.accepted.sort_by_key(|r| (r.start, r.end));

        for r in &report.rejected {
            debug!(start = r.start, end = r.end, reason = %r.reason, "rejected region");
        }
        report
    }
}

/// Higher score first, then longer, then earlier start
fn priority(a: &RefinedRegion, b: &RefinedRegion) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then(b.len().cmp(&a.len()))
        .then(a.start.cmp(&b.start))
}

fn rejection(region: &RefinedRegion, reason: RejectionReason) -> Rejection {
    Rejection {
        start: region.start,
        end: region.end,
        score: region.score(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::region::CandidateRegion;
    use crate::core::types::BoundaryEvidence;

    fn region(start: u64, end: u64, score: f64, genes: usize) -> RefinedRegion {
        RefinedRegion {
            candidate: CandidateRegion {
                start_gene: 0,
                end_gene: 0,
                start,
                end,
                max_score: score,
                mean_score: score,
                windows: Vec::new(),
            },
            start,
            end,
            left: BoundaryEvidence::GeneBoundary,
            right: BoundaryEvidence::GeneBoundary,
            attachment: None,
            gene_count: genes,
        }
    }

    fn config() -> ScanConfig {
        ScanConfig {
            min_region_genes: 4,
            min_region_length: 1000,
            min_score: 0.5,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn test_too_few_genes_dropped() {
        let config = config();
        let report = RegionFilter::new(&config).apply(vec![region(0, 5000, 0.9, 3)]);
        assert!(report.accepted.is_empty());
        assert_eq!(
            report.rejected[0].reason,
            RejectionReason::TooFewGenes {
                genes: 3,
                required: 4
            }
        );
    }

    #[test]
    fn test_short_and_low_score_dropped() {
        let config = config();
        let report = RegionFilter::new(&config).apply(vec![
            region(0, 999, 0.9, 10),
            region(5000, 9000, 0.49, 10),
            region(10_000, 11_000, 0.5, 4),
        ]);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].start, 10_000);
        assert!(matches!(
            report.rejected[0].reason,
            RejectionReason::TooShort { length: 999, .. }
        ));
        assert!(matches!(
            report.rejected[1].reason,
            RejectionReason::LowScore { .. }
        ));
    }

    #[test]
    fn test_overlap_higher_score_wins() {
        let config = config();
        let report = RegionFilter::new(&config).apply(vec![
            region(0, 10_000, 0.6, 10),
            region(8_000, 15_000, 0.9, 10),
            region(20_000, 25_000, 0.7, 10),
        ]);
        let kept: Vec<(u64, u64)> = report.accepted.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(kept, vec![(8_000, 15_000), (20_000, 25_000)]);
        assert_eq!(
            report.rejected[0].reason,
            RejectionReason::Overlapped {
                by_start: 8_000,
                by_end: 15_000
            }
        );
    }

    #[test]
    fn test_overlap_tie_prefers_longer_then_earlier() {
        let config = config();
        let report = RegionFilter::new(&config).apply(vec![
            region(2_000, 7_000, 0.8, 10),
            region(0, 6_000, 0.8, 10),
        ]);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].start, 0);

        let report = RegionFilter::new(&config).apply(vec![
            region(2_000, 7_000, 0.8, 10),
            region(0, 5_000, 0.8, 10),
        ]);
        assert_eq!(report.accepted[0].start, 0);
    }

    #[test]
    fn test_density_requirement() {
        let config = config();
        let dense = [10_000..20_000];
        let report = RegionFilter::new(&config)
            .with_dense_intervals(&dense)
            .apply(vec![region(0, 5_000, 0.9, 10), region(18_000, 30_000, 0.9, 10)]);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].start, 18_000);
        assert_eq!(report.rejected[0].reason, RejectionReason::NotGeneDense);
    }

    #[test]
    fn test_never_grows_or_moves() {
        let config = config();
        let input = vec![
            region(0, 10_000, 0.6, 10),
            region(5_000, 12_000, 0.7, 2),
            region(11_000, 19_000, 0.8, 10),
            region(30_000, 31_000, 0.2, 10),
        ];
        let report = RegionFilter::new(&config).apply(input.clone());
        assert!(report.accepted.len() <= input.len());
        assert_eq!(report.accepted.len() + report.rejected.len(), input.len());
        for kept in &report.accepted {
            assert!(input.contains(kept));
        }
        for pair in report.accepted.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
