use thiserror::Error;

use crate::core::gene::Gene;
use crate::core::types::GenomeId;
use crate::utils::validation::{check_gene_limit, normalize_sequence, MAX_GENES};

#[derive(Error, Debug)]
pub enum GenomeError {
    #[error("Gene {start}..{end} on {genome} lies outside the contig (length {length})")]
    GeneOutOfBounds {
        genome: String,
        start: u64,
        end: u64,
        length: u64,
    },

    #[error("Gene {start}..{end} on {genome} is empty or inverted")]
    InvalidGene { genome: String, start: u64, end: u64 },

    #[error("Sequence length {actual} does not match declared length {expected} for {genome}")]
    SequenceLengthMismatch {
        genome: String,
        expected: u64,
        actual: u64,
    },

    #[error("Too many genes: {0} exceeds maximum allowed ({MAX_GENES})")]
    TooManyGenes(usize),
}

/// One contig or complete genome and its ordered gene list
///
/// Genes are sorted by start coordinate and re-indexed `0..n` on
/// construction, so a gene's `index` is its position in [`Genome::genes`].
#[derive(Debug, Clone)]
pub struct Genome {
    pub id: GenomeId,

    /// Total length in nucleotides
    pub length: u64,

    pub circular: bool,

    genes: Vec<Gene>,

    /// Uppercase nucleotide sequence, when available
    sequence: Option<Vec<u8>>,
}

impl Genome {
    /// Build a genome from gene calls, validating coordinates.
    ///
    /// # Errors
    ///
    /// Returns `GenomeError::InvalidGene` for empty or inverted genes,
    /// `GenomeError::GeneOutOfBounds` for genes past the contig end, or
    /// `GenomeError::TooManyGenes` if the gene limit is exceeded.
    pub fn new(
        id: impl Into<String>,
        length: u64,
        circular: bool,
        mut genes: Vec<Gene>,
    ) -> Result<Self, GenomeError> {
        let id = GenomeId::new(id);

        if check_gene_limit(genes.len()).is_some() {
            return Err(GenomeError::TooManyGenes(genes.len()));
        }

        for gene in &genes {
            if gene.end <= gene.start {
                return Err(GenomeError::InvalidGene {
                    genome: id.to_string(),
                    start: gene.start,
                    end: gene.end,
                });
            }
            if gene.end > length {
                return Err(GenomeError::GeneOutOfBounds {
                    genome: id.to_string(),
                    start: gene.start,
                    end: gene.end,
                    length,
                });
            }
        }

        genes.sort_by_key(|g| (g.start, g.end));
        for (i, gene) in genes.iter_mut().enumerate() {
            gene.index = i;
        }

        Ok(Self {
            id,
            length,
            circular,
            genes,
            sequence: None,
        })
    }

    /// Attach the nucleotide sequence. Bases are uppercased.
    ///
    /// # Errors
    ///
    /// Returns `GenomeError::SequenceLengthMismatch` if the sequence length
    /// differs from the genome length.
    pub fn with_sequence(mut self, sequence: Vec<u8>) -> Result<Self, GenomeError> {
        let actual = sequence.len() as u64;
        if actual != self.length {
            return Err(GenomeError::SequenceLengthMismatch {
                genome: self.id.to_string(),
                expected: self.length,
                actual,
            });
        }
        self.sequence = Some(normalize_sequence(sequence));
        Ok(self)
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    pub fn sequence(&self) -> Option<&[u8]> {
        self.sequence.as_deref()
    }

    pub fn has_sequence(&self) -> bool {
        self.sequence.is_some()
    }

    /// Bases in `[start, end)`, or `None` when no sequence is attached or
    /// the range falls outside the genome
    pub fn subsequence(&self, start: u64, end: u64) -> Option<&[u8]> {
        let sequence = self.sequence.as_deref()?;
        if start > end || end > self.length {
            return None;
        }
        let start = usize::try_from(start).ok()?;
        let end = usize::try_from(end).ok()?;
        sequence.get(start..end)
    }

    /// Number of genes lying wholly within `[start, end)`
    pub fn genes_within(&self, start: u64, end: u64) -> usize {
        let first = self.genes.partition_point(|g| g.start < start);
        self.genes[first..]
            .iter()
            .take_while(|g| g.start < end)
            .filter(|g| g.end <= end)
            .count()
    }

    /// The gene a boundary at `position` would cut through, if any
    pub fn gene_split_at(&self, position: u64) -> Option<&Gene> {
        let upto = self.genes.partition_point(|g| g.start < position);
        self.genes[..upto]
            .iter()
            .rev()
            .find(|g| g.splits_at(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Strand;

    fn genes(coords: &[(u64, u64)]) -> Vec<Gene> {
        coords
            .iter()
            .map(|&(s, e)| Gene::new(0, s, e, Strand::Forward))
            .collect()
    }

    #[test]
    fn test_genes_sorted_and_reindexed() {
        let genome = Genome::new("c1", 1000, false, genes(&[(500, 600), (10, 90), (200, 300)]))
            .unwrap();
        let starts: Vec<u64> = genome.genes().iter().map(|g| g.start).collect();
        assert_eq!(starts, vec![10, 200, 500]);
        for (i, gene) in genome.genes().iter().enumerate() {
            assert_eq!(gene.index, i);
        }
    }

    #[test]
    fn test_gene_out_of_bounds() {
        let result = Genome::new("c1", 100, false, genes(&[(10, 101)]));
        assert!(matches!(result, Err(GenomeError::GeneOutOfBounds { .. })));
    }

    #[test]
    fn test_inverted_gene() {
        let result = Genome::new("c1", 100, false, genes(&[(50, 50)]));
        assert!(matches!(result, Err(GenomeError::InvalidGene { .. })));
    }

    #[test]
    fn test_sequence_length_mismatch() {
        let genome = Genome::new("c1", 10, false, Vec::new()).unwrap();
        assert!(genome.with_sequence(b"ACGT".to_vec()).is_err());
    }

    #[test]
    fn test_sequence_uppercased() {
        let genome = Genome::new("c1", 4, false, Vec::new())
            .unwrap()
            .with_sequence(b"acgt".to_vec())
            .unwrap();
        assert_eq!(genome.sequence(), Some(&b"ACGT"[..]));
        assert_eq!(genome.subsequence(1, 3), Some(&b"CG"[..]));
        assert_eq!(genome.subsequence(2, 5), None);
    }

    #[test]
    fn test_genes_within() {
        let genome =
            Genome::new("c1", 1000, false, genes(&[(0, 100), (150, 250), (300, 400)])).unwrap();
        assert_eq!(genome.genes_within(0, 1000), 3);
        assert_eq!(genome.genes_within(100, 400), 2);
        assert_eq!(genome.genes_within(160, 400), 1);
        assert_eq!(genome.genes_within(0, 399), 2);
    }

    #[test]
    fn test_gene_split_at() {
        let genome = Genome::new("c1", 1000, false, genes(&[(0, 100), (150, 250)])).unwrap();
        assert_eq!(genome.gene_split_at(200).map(|g| g.index), Some(1));
        assert!(genome.gene_split_at(150).is_none());
        assert!(genome.gene_split_at(120).is_none());
    }
}
