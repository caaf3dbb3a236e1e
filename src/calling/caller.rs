use tracing::{trace, warn};

use crate::calling::config::ScanConfig;
use crate::core::gene::Gene;
use crate::core::region::{count_to_f64, CandidateRegion, Window};

/// State of the window-merging reducer
///
/// A run leaves `Accumulating` (is closed) when the next accepted window
/// lies beyond the merge gap, or when input ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CallerState {
    /// No open run
    #[default]
    Scanning,

    /// An open run of accepted windows
    Accumulating {
        windows: Vec<Window>,
        /// Furthest gene reached by the run (inclusive)
        end_gene: usize,
    },
}

/// Thresholds scored windows and merges the accepted ones into disjoint
/// candidate regions
#[derive(Debug, Clone, Copy)]
pub struct RegionCaller {
    score_cutoff: f64,
    merge_gap: usize,
}

impl RegionCaller {
    pub fn new(score_cutoff: f64, merge_gap: usize) -> Self {
        Self {
            score_cutoff,
            merge_gap,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.score_cutoff, config.merge_gap)
    }

    /// Advance the reducer by one window.
    ///
    /// Returns the next state and, when this window closed the open run,
    /// the windows of that run. Rejected windows never close a run.
    pub fn step(&self, state: CallerState, window: Window) -> (CallerState, Option<Vec<Window>>) {
        if !window.qualifies(self.score_cutoff) {
            return (state, None);
        }

        match state {
            CallerState::Scanning => {
                let end_gene = window.end_gene;
                (
                    CallerState::Accumulating {
                        windows: vec![window],
                        end_gene,
                    },
                    None,
                )
            }
            CallerState::Accumulating {
                mut windows,
                end_gene,
            } => {
                if within_gap(window.start_gene, end_gene, self.merge_gap) {
                    let end_gene = end_gene.max(window.end_gene);
                    windows.push(window);
                    (CallerState::Accumulating { windows, end_gene }, None)
                } else {
                    let end_gene = window.end_gene;
                    (
                        CallerState::Accumulating {
                            windows: vec![window],
                            end_gene,
                        },
                        Some(windows),
                    )
                }
            }
        }
    }

    /// Close whatever run is still open at end of input
    pub fn finish(&self, state: CallerState) -> Option<Vec<Window>> {
        match state {
            CallerState::Scanning => None,
            CallerState::Accumulating { windows, .. } => Some(windows),
        }
    }

    /// Run the reducer over all windows of a genome, in order
    pub fn call<I>(&self, windows: I, genes: &[Gene]) -> Vec<CandidateRegion>
    where
        I: IntoIterator<Item = Window>,
    {
        let mut regions = Vec::new();
        let mut state = CallerState::Scanning;

        for window in windows {
            let (next, closed) = self.step(state, window);
            state = next;
            if let Some(run) = closed {
                regions.extend(close_run(run, genes));
            }
        }
        if let Some(run) = self.finish(state) {
            regions.extend(close_run(run, genes));
        }

        trace!(
            candidates = regions.len(),
            cutoff = self.score_cutoff,
            merge_gap = self.merge_gap,
            "merged windows"
        );
        regions
    }
}

/// Merge candidate regions whose gene spans lie within `merge_gap` genes of
/// each other. Output is ordered by start gene and pairwise disjoint.
///
/// This is a no-op on [`RegionCaller::call`] output with the same gap, and
/// applying it twice gives the same result as applying it once.
pub fn merge_regions(mut regions: Vec<CandidateRegion>, merge_gap: usize) -> Vec<CandidateRegion> {
    regions.sort_by_key(|r| (r.start_gene, r.end_gene));

    let mut merged: Vec<CandidateRegion> = Vec::with_capacity(regions.len());
    for region in regions {
        match merged.last_mut() {
            Some(current) if within_gap(region.start_gene, current.end_gene, merge_gap) => {
                absorb(current, region);
            }
            _ => merged.push(region),
        }
    }
    merged
}

/// True when a run ending at `end_gene` reaches `start_gene`
fn within_gap(start_gene: usize, end_gene: usize, merge_gap: usize) -> bool {
    start_gene <= end_gene.saturating_add(1).saturating_add(merge_gap)
}

fn close_run(run: Vec<Window>, genes: &[Gene]) -> Option<CandidateRegion> {
    let first = run.first().map(|w| w.start_gene);
    let last = run.iter().map(|w| w.end_gene).max();
    let region = CandidateRegion::from_windows(run, genes);
    if region.is_none() {
        warn!(
            start_gene = ?first,
            end_gene = ?last,
            genes = genes.len(),
            "dropping window run outside the gene list"
        );
    }
    region
}

fn absorb(current: &mut CandidateRegion, other: CandidateRegion) {
    current.end_gene = current.end_gene.max(other.end_gene);
    current.start = current.start.min(other.start);
    current.end = current.end.max(other.end);
    current.max_score = current.max_score.max(other.max_score);
    current.windows.extend(other.windows);
    current.windows.sort_by_key(|w| w.start_gene);

    let scores: Vec<f64> = current.windows.iter().filter_map(|w| w.score).collect();
    if !scores.is_empty() {
        current.mean_score = scores.iter().sum::<f64>() / count_to_f64(scores.len());
    }
}
