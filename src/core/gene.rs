use serde::{Deserialize, Serialize};

use crate::core::types::Strand;

/// A predicted gene, as reported by the upstream gene caller
///
/// Coordinates are 0-based and half-open: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    /// Position of this gene in the genome's ordered gene list
    pub index: usize,

    /// First base of the gene
    pub start: u64,

    /// One past the last base of the gene
    pub end: u64,

    pub strand: Strand,

    /// Locus tag or feature ID, when the annotation carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locus_tag: Option<String>,
}

impl Gene {
    pub fn new(index: usize, start: u64, end: u64, strand: Strand) -> Self {
        Self {
            index,
            start,
            end,
            strand,
            locus_tag: None,
        }
    }

    #[must_use]
    pub fn with_locus_tag(mut self, tag: impl Into<String>) -> Self {
        self.locus_tag = Some(tag.into());
        self
    }

    /// Length in nucleotides
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `position` lies strictly inside the gene, so that a boundary
    /// placed there would split it
    pub fn splits_at(&self, position: u64) -> bool {
        self.start < position && position < self.end
    }

    /// True if the gene lies wholly within `[start, end)`
    pub fn is_within(&self, start: u64, end: u64) -> bool {
        self.start >= start && self.end <= end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_at() {
        let gene = Gene::new(0, 100, 200, Strand::Forward);
        assert!(gene.splits_at(150));
        assert!(!gene.splits_at(100));
        assert!(!gene.splits_at(200));
        assert!(!gene.splits_at(50));
    }

    #[test]
    fn test_is_within() {
        let gene = Gene::new(0, 100, 200, Strand::Reverse);
        assert!(gene.is_within(100, 200));
        assert!(gene.is_within(0, 1000));
        assert!(!gene.is_within(101, 1000));
        assert!(!gene.is_within(0, 199));
    }
}
