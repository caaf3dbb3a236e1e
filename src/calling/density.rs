//! Gene-density prefilter.
//!
//! Prophages are typically packed with short genes, so a region of
//! unusually high gene density is a cheap independent signal. Genes are
//! counted per fixed-width bin (by midpoint), smoothed over a sliding run of
//! bins, and contiguous stretches above `mean - std * floor_factor` are kept
//! when their peak reaches `mean + std * ceiling_factor`.

use std::ops::Range;

use crate::calling::config::DensityConfig;
use crate::core::genome::Genome;
use crate::core::region::count_to_f64;

#[derive(Debug, Clone)]
pub struct GeneDensityMap {
    bin_width: u64,
    length: u64,
    half_window: usize,

    /// Smoothed genes-per-bin, one value per bin
    densities: Vec<f64>,
}

impl GeneDensityMap {
    pub fn new(genome: &Genome, config: &DensityConfig) -> Self {
        let bin_width = config.bin_width.max(1);
        let bins = usize::try_from(genome.length.div_ceil(bin_width)).unwrap_or(0);

        let mut counts = vec![0usize; bins];
        for gene in genome.genes() {
            let midpoint = gene.start + (gene.end - gene.start) / 2;
            if let Some(count) = usize::try_from(midpoint / bin_width)
                .ok()
                .and_then(|bin| counts.get_mut(bin))
            {
                *count += 1;
            }
        }

        let half_window = config.window_bins / 2;
        let densities = (0..bins)
            .map(|i| {
                let lo = i.saturating_sub(half_window);
                let hi = (i + half_window + 1).min(bins);
                let total: usize = counts[lo..hi].iter().sum();
                count_to_f64(total) / count_to_f64(hi - lo)
            })
            .collect();

        Self {
            bin_width,
            length: genome.length,
            half_window,
            densities,
        }
    }

    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    /// Mean and population standard deviation of the density values
    fn stats(&self) -> Option<(f64, f64)> {
        if self.densities.is_empty() {
            return None;
        }
        let n = count_to_f64(self.densities.len());
        let mean = self.densities.iter().sum::<f64>() / n;
        let variance = self
            .densities
            .iter()
            .map(|d| (d - mean).powi(2))
            .sum::<f64>()
            / n;
        Some((mean, variance.sqrt()))
    }

    /// Nucleotide intervals of the gene-dense stretches, ordered and
    /// disjoint
    pub fn dense_intervals(&self, config: &DensityConfig) -> Vec<Range<u64>> {
        let Some((mean, std)) = self.stats() else {
            return Vec::new();
        };
        let eps = mean - std * config.floor_factor;
        let ceiling = mean + std * config.ceiling_factor;

        let mut runs: Vec<Range<usize>> = Vec::new();
        let mut open: Option<usize> = None;
        for (i, &density) in self.densities.iter().enumerate() {
            match (density >= eps, open) {
                (true, None) => open = Some(i),
                (false, Some(start)) => {
                    runs.push(start..i);
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(start) = open {
            runs.push(start..self.densities.len());
        }

        let pad = self.half_window as u64 * self.bin_width;
        let mut intervals: Vec<Range<u64>> = Vec::new();
        for run in runs {
            let peak = self.densities[run.clone()]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            if peak < ceiling {
                continue;
            }
            let start = (run.start as u64 * self.bin_width).saturating_sub(pad);
            let end = (run.end as u64 * self.bin_width + pad).min(self.length);
            match intervals.last_mut() {
                Some(last) if start <= last.end => last.end = last.end.max(end),
                _ => intervals.push(start..end),
            }
        }
        intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gene::Gene;
    use crate::core::types::Strand;

    fn config() -> DensityConfig {
        DensityConfig {
            bin_width: 1000,
            window_bins: 3,
            floor_factor: -0.5,
            ceiling_factor: 1.0,
        }
    }

    /// One gene per 2 kb, with a 10-gene-per-kb cluster in 20-25 kb
    fn clustered_genome() -> Genome {
        let mut genes = Vec::new();
        for kb in (0..50u64).step_by(2) {
            if !(20..25).contains(&kb) {
                genes.push(Gene::new(0, kb * 1000, kb * 1000 + 800, Strand::Forward));
            }
        }
        for i in 0..50u64 {
            let start = 20_000 + i * 100;
            genes.push(Gene::new(0, start, start + 90, Strand::Forward));
        }
        Genome::new("dense", 50_000, false, genes).unwrap()
    }

    #[test]
    fn test_density_map_bins() {
        let genome = clustered_genome();
        let map = GeneDensityMap::new(&genome, &config());
        assert_eq!(map.densities().len(), 50);
        // Bin 22 and both neighbours hold 10 genes each
        assert!((map.densities()[22] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dense_cluster_found() {
        let genome = clustered_genome();
        let config = config();
        let intervals = GeneDensityMap::new(&genome, &config).dense_intervals(&config);

        assert_eq!(intervals.len(), 1);
        let dense = &intervals[0];
        assert!(dense.start <= 20_000 && dense.end >= 25_000, "{dense:?}");
        assert!(dense.start >= 17_000 && dense.end <= 28_000, "{dense:?}");
    }

    #[test]
    fn test_empty_genome() {
        let genome = Genome::new("empty", 0, false, Vec::new()).unwrap();
        let config = config();
        assert!(GeneDensityMap::new(&genome, &config)
            .dense_intervals(&config)
            .is_empty());
    }
}
