use std::fmt;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

use crate::calling::repeats::{RepeatCandidate, RepeatSearch};
use crate::core::genome::Genome;
use crate::core::region::{AttachmentSite, CandidateRegion, RefinedRegion};
use crate::core::types::BoundaryEvidence;

/// Moving an edge off one gene can land it inside an overlapping one
const MAX_GENE_ADJUSTMENTS: usize = 8;

/// A repeat pair is only trusted as an attachment site when random sequence
/// would produce one at least as good this rarely
pub const MAX_CHANCE_EXPECTATION: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RefineError {
    #[error("Boundary search unavailable for {genome} {edge} edge at {anchor}: {reason}")]
    BoundarySearchUnavailable {
        genome: String,
        edge: Edge,
        anchor: u64,
        reason: &'static str,
    },
}

/// Sequence searched around one edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flank {
    pub range: Range<u64>,

    /// Cut short by the origin of a circular contig, so less than the full
    /// radius was searched on the outer side
    pub clipped: bool,
}

/// Moves candidate edges onto attachment-site repeats or gene boundaries
pub struct BoundaryRefiner<'a> {
    radius: u64,
    search: &'a dyn RepeatSearch,
}

impl<'a> BoundaryRefiner<'a> {
    pub fn new(radius: u64, search: &'a dyn RepeatSearch) -> Self {
        Self { radius, search }
    }

    /// Sequence window searched around one edge.
    ///
    /// On a circular contig the window is clipped at the origin rather than
    /// wrapped, and marked as clipped.
    ///
    /// # Errors
    ///
    /// Returns `RefineError::BoundarySearchUnavailable` when the genome has
    /// no sequence, or when a linear contig ends within `radius` of the
    /// anchor on the outer side.
    pub fn flank(&self, genome: &Genome, edge: Edge, anchor: u64) -> Result<Flank, RefineError> {
        let unavailable = |reason| RefineError::BoundarySearchUnavailable {
            genome: genome.id.to_string(),
            edge,
            anchor,
            reason,
        };

        if !genome.has_sequence() {
            return Err(unavailable("no sequence"));
        }
        let fits = match edge {
            Edge::Left => anchor >= self.radius,
            Edge::Right => anchor.saturating_add(self.radius) <= genome.length,
        };
        if !fits && !genome.circular {
            return Err(unavailable("contig ends within the search radius"));
        }

        let start = anchor.saturating_sub(self.radius);
        let end = anchor.saturating_add(self.radius).min(genome.length);
        Ok(Flank {
            range: start..end,
            clipped: !fits,
        })
    }

    /// Refine both edges of a candidate region
    pub fn refine(&self, genome: &Genome, candidate: CandidateRegion) -> RefinedRegion {
        let (mut start, mut end) = (candidate.start, candidate.end);
        let lo = start.saturating_sub(self.radius);
        let hi = end.saturating_add(self.radius).min(genome.length);

        let left_flank = self.flank(genome, Edge::Left, start);
        let right_flank = self.flank(genome, Edge::Right, end);
        for err in [&left_flank, &right_flank].into_iter().filter_map(|f| f.as_ref().err()) {
            debug!(error = %err, "edge left truncated");
        }

        let mut left = BoundaryEvidence::GeneBoundary;
        let mut right = BoundaryEvidence::GeneBoundary;
        let mut attachment = None;

        match (left_flank, right_flank, genome.sequence()) {
            (Ok(lf), Ok(rf), Some(sequence)) => {
                let repeats = self
                    .search
                    .find_repeats(sequence, lf.range.clone(), rf.range.clone());
                let orientations = self.search.orientations();
                match best_pair(&repeats, &lf.range, &rf.range, start, end, orientations) {
                    Some(best) => {
                        let evidence = if best.mismatches == 0 {
                            BoundaryEvidence::ExactAttachmentSite
                        } else {
                            BoundaryEvidence::ApproximateAttachmentSite
                        };
                        start = best.left_start;
                        end = best.right_end();
                        left = evidence;
                        right = evidence;
                        attachment = Some(AttachmentSite::from(*best));
                    }
                    None => {
                        // Nothing found, but the search did not cover the full radius
                        if lf.clipped {
                            left = BoundaryEvidence::Truncated;
                        }
                        if rf.clipped {
                            right = BoundaryEvidence::Truncated;
                        }
                    }
                }
            }
            (l, r, _) => {
                if l.is_err() {
                    left = BoundaryEvidence::Truncated;
                }
                if r.is_err() {
                    right = BoundaryEvidence::Truncated;
                }
            }
        }

        if left == BoundaryEvidence::ApproximateAttachmentSite
            || left == BoundaryEvidence::GeneBoundary
        {
            if let Some(moved) = off_gene(genome, Edge::Left, start, lo, hi) {
                start = moved;
                left = BoundaryEvidence::GeneBoundary;
            }
        }
        if right == BoundaryEvidence::ApproximateAttachmentSite
            || right == BoundaryEvidence::GeneBoundary
        {
            if let Some(moved) = off_gene(genome, Edge::Right, end, lo, hi) {
                end = moved;
                right = BoundaryEvidence::GeneBoundary;
            }
        }

        if start >= end {
            // Degenerate snap; fall back to the gene-derived span
            start = candidate.start;
            end = candidate.end;
            left = left.min(BoundaryEvidence::GeneBoundary);
            right = right.min(BoundaryEvidence::GeneBoundary);
            attachment = None;
        }

        debug!(
            genome = %genome.id,
            from = %format!("{}-{}", candidate.start, candidate.end),
            to = %format!("{start}-{end}"),
            left = %left,
            right = %right,
            "refined candidate boundaries"
        );

        let gene_count = genome.genes_within(start, end);
        RefinedRegion {
            candidate,
            start,
            end,
            left,
            right,
            attachment,
            gene_count,
        }
    }
}

/// Expected number of repeat pairs in random sequence that are at least as
/// long, have no more mismatches, and sit at least as close to the anchors
/// as `c`.
///
/// A pair displaced by `dl` and `dr` from the two anchors competes with
/// `(2dl + 1)(2dr + 1)` placements per orientation searched.
pub fn chance_expectation(
    c: &RepeatCandidate,
    left_anchor: u64,
    right_anchor: u64,
    orientations: u32,
) -> f64 {
    #[allow(clippy::cast_precision_loss)] // Displacements are bounded by the contig length
    let placements = {
        let dl = c.left_start.abs_diff(left_anchor) as f64;
        let dr = c.right_end().abs_diff(right_anchor) as f64;
        (2.0 * dl + 1.0) * (2.0 * dr + 1.0)
    };
    placements * f64::from(orientations) * match_probability(c.length, c.mismatches)
}

/// Probability that two random sequences of `length` bases differ at no
/// more than `mismatches` positions
fn match_probability(length: u64, mismatches: u32) -> f64 {
    let Ok(n) = i32::try_from(length) else {
        return 0.0;
    };
    let mut choose = 1.0;
    let mut total = 0.0;
    for k in 0..=mismatches.min(n.unsigned_abs()) {
        let k = f64::from(k);
        if k > 0.0 {
            choose *= (f64::from(n) - k + 1.0) / k;
        }
        total += choose * 3f64.powf(k);
    }
    total * 0.25f64.powi(n)
}

/// Most significant repeat pair inside both flanks: lowest chance
/// expectation, then longest, then fewest mismatches, then leftmost. Pairs
/// random sequence would produce more often than `MAX_CHANCE_EXPECTATION`
/// are discarded.
fn best_pair<'r>(
    repeats: &'r [RepeatCandidate],
    left_flank: &Range<u64>,
    right_flank: &Range<u64>,
    left_anchor: u64,
    right_anchor: u64,
    orientations: u32,
) -> Option<&'r RepeatCandidate> {
    repeats
        .iter()
        .filter(|c| {
            c.left_start >= left_flank.start
                && c.left_end() <= left_flank.end
                && c.right_start >= right_flank.start
                && c.right_end() <= right_flank.end
                && c.left_end() <= c.right_start
        })
        .map(|c| (chance_expectation(c, left_anchor, right_anchor, orientations), c))
        .filter(|(expected, _)| *expected <= MAX_CHANCE_EXPECTATION)
        .min_by(|(ea, a), (eb, b)| {
            ea.total_cmp(eb)
                .then(b.length.cmp(&a.length))
                .then(a.mismatches.cmp(&b.mismatches))
                .then(a.left_start.cmp(&b.left_start))
        })
        .map(|(_, c)| c)
}

/// New position for an edge that falls strictly inside a gene: outward to
/// the gene's edge, or inward when outward leaves `[lo, hi]`
fn off_gene(genome: &Genome, edge: Edge, mut position: u64, lo: u64, hi: u64) -> Option<u64> {
    let original = position;
    for _ in 0..MAX_GENE_ADJUSTMENTS {
        let Some(gene) = genome.gene_split_at(position) else {
            break;
        };
        position = match edge {
            Edge::Left if gene.start >= lo => gene.start,
            Edge::Left => gene.end,
            Edge::Right if gene.end <= hi => gene.end,
            Edge::Right => gene.start,
        };
    }
    (position != original).then_some(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calling::repeats::tests::{plant_repeat, random_sequence};
    use crate::calling::repeats::KmerRepeatSearch;
    use crate::core::gene::Gene;
    use crate::core::types::Strand;

    struct FixedRepeats(Vec<RepeatCandidate>);

    impl RepeatSearch for FixedRepeats {
        fn find_repeats(&self, _: &[u8], _: Range<u64>, _: Range<u64>) -> Vec<RepeatCandidate> {
            self.0.clone()
        }
    }

    fn candidate(start: u64, end: u64) -> CandidateRegion {
        CandidateRegion {
            start_gene: 0,
            end_gene: 0,
            start,
            end,
            max_score: 0.9,
            mean_score: 0.8,
            windows: Vec::new(),
        }
    }

    fn genome(length: u64, circular: bool, genes: &[(u64, u64)]) -> Genome {
        let genes = genes
            .iter()
            .map(|&(s, e)| Gene::new(0, s, e, Strand::Forward))
            .collect();
        let sequence = random_sequence(length as usize, 42);
        Genome::new("contig", length, circular, genes)
            .unwrap()
            .with_sequence(sequence)
            .unwrap()
    }

    fn repeat(left_start: u64, right_start: u64, length: u64, mismatches: u32) -> RepeatCandidate {
        RepeatCandidate {
            left_start,
            right_start,
            length,
            strand: Strand::Forward,
            mismatches,
        }
    }

    #[test]
    fn test_exact_site_at_gene_coordinates() {
        let mut seq = random_sequence(3000, 9);
        let genes = [(1000, 1300), (1400, 1700), (1800, 2000)];
        // attL starts at the candidate start, attR ends at the candidate end
        plant_repeat(&mut seq, b"ACCGTTAGCATGCAGTCCAT", 1000, 1980);
        let genome = Genome::new(
            "contig",
            3000,
            false,
            genes.iter().map(|&(s, e)| Gene::new(0, s, e, Strand::Forward)).collect(),
        )
        .unwrap()
        .with_sequence(seq)
        .unwrap();

        let search = KmerRepeatSearch::new(12, 0, false);
        let refiner = BoundaryRefiner::new(200, &search);
        let refined = refiner.refine(&genome, candidate(1000, 2000));

        assert_eq!(refined.left, BoundaryEvidence::ExactAttachmentSite);
        assert_eq!(refined.right, BoundaryEvidence::ExactAttachmentSite);
        assert_eq!((refined.start, refined.end), (1000, 2000));
        assert_eq!(refined.gene_count, 3);
        let site = refined.attachment.unwrap();
        assert_eq!((site.left_start, site.right_start, site.length), (1000, 1980, 20));
    }

    #[test]
    fn test_no_sequence_truncates_both_edges() {
        let genome = Genome::new("contig", 5000, false, Vec::new()).unwrap();
        let search = FixedRepeats(Vec::new());
        let refiner = BoundaryRefiner::new(100, &search);

        let refined = refiner.refine(&genome, candidate(1000, 2000));
        assert_eq!(refined.left, BoundaryEvidence::Truncated);
        assert_eq!(refined.right, BoundaryEvidence::Truncated);
        assert_eq!((refined.start, refined.end), (1000, 2000));
    }

    #[test]
    fn test_linear_contig_edge_truncates_one_side() {
        let genome = genome(3000, false, &[]);
        let search = FixedRepeats(vec![repeat(40, 2600, 20, 0)]);
        let refiner = BoundaryRefiner::new(500, &search);

        let refined = refiner.refine(&genome, candidate(100, 2400));
        assert_eq!(refined.left, BoundaryEvidence::Truncated);
        assert_eq!(refined.right, BoundaryEvidence::GeneBoundary);
        assert_eq!((refined.start, refined.end), (100, 2400));
        assert!(refined.attachment.is_none());
    }

    #[test]
    fn test_circular_flank_clipped_at_origin() {
        let genome = genome(3000, true, &[]);
        let search = FixedRepeats(Vec::new());
        let refiner = BoundaryRefiner::new(500, &search);

        let left = refiner.flank(&genome, Edge::Left, 100).unwrap();
        assert_eq!(left.range, 0..600);
        assert!(left.clipped);
        let right = refiner.flank(&genome, Edge::Right, 2900).unwrap();
        assert_eq!(right.range, 2400..3000);
        assert!(right.clipped);
        let inner = refiner.flank(&genome, Edge::Left, 1000).unwrap();
        assert_eq!(inner.range, 500..1500);
        assert!(!inner.clipped);

        // Less than the full radius was searched, so neither edge is a gene boundary
        let refined = refiner.refine(&genome, candidate(100, 2900));
        assert_eq!(refined.left, BoundaryEvidence::Truncated);
        assert_eq!(refined.right, BoundaryEvidence::Truncated);
        assert_eq!((refined.start, refined.end), (100, 2900));
    }

    #[test]
    fn test_circular_clipped_edge_truncated_alone() {
        let genome = genome(3000, true, &[]);
        let search = FixedRepeats(Vec::new());
        let refiner = BoundaryRefiner::new(500, &search);

        let refined = refiner.refine(&genome, candidate(100, 2000));
        assert_eq!(refined.left, BoundaryEvidence::Truncated);
        assert_eq!(refined.right, BoundaryEvidence::GeneBoundary);
    }

    #[test]
    fn test_site_inside_clipped_flank_is_used() {
        let genome = genome(3000, true, &[]);
        let search = FixedRepeats(vec![repeat(50, 2880, 20, 0)]);
        let refiner = BoundaryRefiner::new(500, &search);

        let refined = refiner.refine(&genome, candidate(100, 2900));
        assert_eq!(refined.left, BoundaryEvidence::ExactAttachmentSite);
        assert_eq!(refined.right, BoundaryEvidence::ExactAttachmentSite);
        assert_eq!((refined.start, refined.end), (50, 2900));
    }

    #[test]
    fn test_best_pair_ranking() {
        let genome = genome(10_000, false, &[]);
        let search = FixedRepeats(vec![
            repeat(4_950, 7_980, 15, 0),
            repeat(4_990, 8_000, 18, 1),
            repeat(4_900, 7_900, 18, 1),
            repeat(4_800, 8_100, 18, 2),
        ]);
        let refiner = BoundaryRefiner::new(1000, &search);

        let refined = refiner.refine(&genome, candidate(5000, 8000));
        // The only pair unlikely to arise by chance this close to the anchors
        assert_eq!(refined.start, 4_990);
        assert_eq!(refined.end, 8_018);
        assert_eq!(refined.left, BoundaryEvidence::ApproximateAttachmentSite);
        assert_eq!(refined.right, BoundaryEvidence::ApproximateAttachmentSite);
    }

    #[test]
    fn test_repeat_outside_flank_ignored() {
        let genome = genome(10_000, false, &[]);
        let search = FixedRepeats(vec![repeat(3_000, 8_000, 30, 0)]);
        let refiner = BoundaryRefiner::new(1000, &search);

        let refined = refiner.refine(&genome, candidate(5000, 8000));
        assert!(refined.attachment.is_none());
        assert_eq!((refined.start, refined.end), (5000, 8000));
    }

    #[test]
    fn test_approximate_edge_moved_off_gene() {
        let genome = genome(10_000, false, &[(4_900, 5_100), (7_950, 8_300)]);
        let search = FixedRepeats(vec![repeat(4_990, 8_000, 20, 1)]);
        let refiner = BoundaryRefiner::new(1000, &search);

        let refined = refiner.refine(&genome, candidate(5000, 8000));
        // Both snapped edges fall inside genes; move outward
        assert_eq!(refined.start, 4_900);
        assert_eq!(refined.end, 8_300);
        assert_eq!(refined.left, BoundaryEvidence::GeneBoundary);
        assert_eq!(refined.right, BoundaryEvidence::GeneBoundary);
    }

    #[test]
    fn test_edge_moves_inward_when_outward_leaves_envelope() {
        // Right edge 8_050 sits in a gene ending past candidate.end + radius
        let genome = genome(20_000, false, &[(7_000, 12_000)]);
        let search = FixedRepeats(vec![repeat(4_990, 8_030, 20, 1)]);
        let refiner = BoundaryRefiner::new(1000, &search);

        let refined = refiner.refine(&genome, candidate(5000, 8000));
        assert_eq!(refined.end, 7_000);
        assert_eq!(refined.right, BoundaryEvidence::GeneBoundary);
    }

    #[test]
    fn test_exact_site_inside_gene_is_kept() {
        let genome = genome(10_000, false, &[(4_900, 5_100)]);
        let search = FixedRepeats(vec![repeat(4_990, 8_000, 20, 0)]);
        let refiner = BoundaryRefiner::new(1000, &search);

        let refined = refiner.refine(&genome, candidate(5000, 8000));
        assert_eq!(refined.start, 4_990);
        assert_eq!(refined.left, BoundaryEvidence::ExactAttachmentSite);
    }

    #[test]
    fn test_refined_within_radius_envelope() {
        let genome = genome(10_000, false, &[(3_900, 4_100), (8_800, 9_200)]);
        let radius = 1000;
        for r in [
            repeat(4_000, 8_900, 25, 1),
            repeat(4_990, 8_000, 12, 0),
            repeat(4_001, 8_970, 30, 2),
        ] {
            let search = FixedRepeats(vec![r]);
            let refiner = BoundaryRefiner::new(radius, &search);
            let refined = refiner.refine(&genome, candidate(5000, 8000));
            assert!(refined.start >= 5000 - radius, "{r:?}");
            assert!(refined.end <= 8000 + radius, "{r:?}");
            assert!(refined.start < refined.end);
        }
    }

    #[test]
    fn test_chance_expectation_grows_with_displacement() {
        let near = repeat(5_000, 7_980, 20, 0);
        let far = repeat(4_000, 8_980, 20, 0);
        let loose = repeat(5_000, 7_980, 20, 2);

        let e_near = chance_expectation(&near, 5_000, 8_000, 1);
        assert!((e_near - 0.25f64.powi(20)).abs() < 1e-20);
        assert!(chance_expectation(&far, 5_000, 8_000, 1) > e_near * 1e6);
        assert!(chance_expectation(&loose, 5_000, 8_000, 1) > e_near);
        assert!(
            (chance_expectation(&near, 5_000, 8_000, 2) - 2.0 * e_near).abs() < 1e-20
        );
    }

    #[test]
    fn test_significant_near_site_beats_longer_distant_one() {
        let genome = genome(40_000, false, &[]);
        let search = FixedRepeats(vec![
            repeat(10_000, 29_986, 14, 0),
            repeat(1_500, 38_000, 22, 1),
        ]);
        let refiner = BoundaryRefiner::new(10_000, &search);

        let refined = refiner.refine(&genome, candidate(10_000, 30_000));
        assert_eq!((refined.start, refined.end), (10_000, 30_000));
        assert_eq!(refined.left, BoundaryEvidence::ExactAttachmentSite);
    }

    #[test]
    fn test_random_sequence_yields_no_attachment_site() {
        let search = KmerRepeatSearch::new(12, 1, false);
        let refiner = BoundaryRefiner::new(10_000, &search);

        for seed in 1..=10 {
            let sequence = random_sequence(200_000, seed);
            let genome = Genome::new("noise", 200_000, false, Vec::new())
                .unwrap()
                .with_sequence(sequence)
                .unwrap();

            let refined = refiner.refine(&genome, candidate(60_000, 120_000));
            assert!(refined.attachment.is_none(), "seed {seed}: {:?}", refined.attachment);
            assert_eq!((refined.start, refined.end), (60_000, 120_000), "seed {seed}");
            assert_eq!(refined.left, BoundaryEvidence::GeneBoundary, "seed {seed}");
            assert_eq!(refined.right, BoundaryEvidence::GeneBoundary, "seed {seed}");
        }
    }

    #[test]
    fn test_short_planted_site_found_in_random_sequence() {
        let search = KmerRepeatSearch::new(12, 1, false);
        let refiner = BoundaryRefiner::new(10_000, &search);

        for seed in 1..=3 {
            let mut sequence = random_sequence(200_000, seed);
            plant_repeat(&mut sequence, b"GATCCTAGGACTTA", 60_000, 119_986);
            // A second disagreeing base stops extension through one mismatch
            sequence[60_015..60_019].copy_from_slice(b"AAAA");
            sequence[120_001..120_005].copy_from_slice(b"CCCC");
            let genome = Genome::new("planted", 200_000, false, Vec::new())
                .unwrap()
                .with_sequence(sequence)
                .unwrap();

            let refined = refiner.refine(&genome, candidate(60_000, 120_000));
            assert_eq!((refined.start, refined.end), (60_000, 120_000), "seed {seed}");
            assert_eq!(refined.left, BoundaryEvidence::ExactAttachmentSite, "seed {seed}");
            assert_eq!(refined.right, BoundaryEvidence::ExactAttachmentSite, "seed {seed}");
            let site = refined.attachment.unwrap();
            assert_eq!((site.left_start, site.right_start, site.length), (60_000, 119_986, 14));
        }
    }
}
