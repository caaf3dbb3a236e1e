//! Local repeat search used to find attachment sites.
//!
//! An integrated prophage is usually flanked by two copies of a short
//! sequence (attL and attR). [`KmerRepeatSearch`] seeds on shared k-mers
//! between the two edge flanks and extends each seed to the right, allowing
//! a bounded number of mismatches.

use std::collections::HashMap;
use std::ops::Range;

use crate::core::region::AttachmentSite;
use crate::core::types::Strand;
use crate::utils::validation::is_acgt;

/// k-mers seen more often than this in the left flank are low-complexity and
/// skipped as seeds
const MAX_SEED_OCCURRENCES: usize = 16;

/// Upper bound on candidates returned for one pair of flanks
const MAX_CANDIDATES: usize = 64;

const MATCH_SCORE: i64 = 1;
const MISMATCH_PENALTY: i64 = 3;
const X_DROP: i64 = 8;

/// One repeat pair found between a left and a right flank
///
/// Coordinates are absolute positions in the genome sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepeatCandidate {
    pub left_start: u64,
    pub right_start: u64,
    pub length: u64,
    pub strand: Strand,
    pub mismatches: u32,
}

impl RepeatCandidate {
    pub fn left_end(&self) -> u64 {
        self.left_start + self.length
    }

    pub fn right_end(&self) -> u64 {
        self.right_start + self.length
    }
}

impl From<RepeatCandidate> for AttachmentSite {
    fn from(c: RepeatCandidate) -> Self {
        Self {
            left_start: c.left_start,
            right_start: c.right_start,
            length: c.length,
            strand: c.strand,
            mismatches: c.mismatches,
        }
    }
}

/// Finds repeat pairs between two flanks of one sequence
///
/// Shared across worker threads by reference.
pub trait RepeatSearch: Send + Sync {
    /// Repeat pairs with one copy inside `left_flank` and the other inside
    /// `right_flank`. The left copy always ends at or before the right copy
    /// starts.
    fn find_repeats(
        &self,
        sequence: &[u8],
        left_flank: Range<u64>,
        right_flank: Range<u64>,
    ) -> Vec<RepeatCandidate>;

    /// Relative orientations of the two copies searched
    fn orientations(&self) -> u32 {
        1
    }
}

/// Seed-and-extend repeat search over exact k-mer seeds
#[derive(Debug, Clone)]
pub struct KmerRepeatSearch {
    /// Seed length, also the shortest repeat reported
    pub min_length: usize,

    pub max_mismatches: u32,

    /// Also report inverted repeats (right copy on the reverse strand)
    pub inverted: bool,
}

impl KmerRepeatSearch {
    pub fn new(min_length: usize, max_mismatches: u32, inverted: bool) -> Self {
        Self {
            min_length,
            max_mismatches,
            inverted,
        }
    }

    /// Direct repeats between `left` and `right`, in flank-relative
    /// coordinates `(i, j, length, mismatches)`. `fits` decides whether a
    /// pair at `(i, j, length)` respects the copy-order constraint.
    fn search(
        &self,
        left: &[u8],
        right: &[u8],
        fits: impl Fn(usize, usize, usize) -> bool,
    ) -> Vec<(usize, usize, usize, u32)> {
        let k = self.min_length;
        if k == 0 || left.len() < k || right.len() < k {
            return Vec::new();
        }

        let mut index: HashMap<&[u8], Vec<usize>> = HashMap::new();
        for (i, kmer) in left.windows(k).enumerate() {
            if kmer.iter().all(|&b| is_acgt(b)) {
                index.entry(kmer).or_default().push(i);
            }
        }

        let mut hits = Vec::new();
        for (j, kmer) in right.windows(k).enumerate() {
            let Some(positions) = index.get(kmer) else {
                continue;
            };
            if positions.len() > MAX_SEED_OCCURRENCES {
                continue;
            }
            for &i in positions {
                // Seed lies inside a longer match that starts one base earlier
                if i > 0 && j > 0 && left[i - 1] == right[j - 1] && is_acgt(left[i - 1]) {
                    continue;
                }
                if !fits(i, j, k) {
                    continue;
                }
                let (length, mismatches) = self.extend(left, i, right, j, &fits);
                hits.push((i, j, length, mismatches));
            }
        }
        hits
    }

    /// Extend an exact seed of length k to the right with X-drop scoring.
    /// The extension never ends on a mismatch.
    fn extend(
        &self,
        left: &[u8],
        i: usize,
        right: &[u8],
        j: usize,
        fits: &impl Fn(usize, usize, usize) -> bool,
    ) -> (usize, u32) {
        let k = self.min_length;
        let mut score = MATCH_SCORE * k as i64;
        let mut best = (score, k, 0u32);
        let mut mismatches = 0u32;

        let mut p = k;
        while i + p < left.len() && j + p < right.len() && fits(i, j, p + 1) {
            let (a, b) = (left[i + p], right[j + p]);
            if a == b && is_acgt(a) {
                score += MATCH_SCORE;
                if score > best.0 {
                    best = (score, p + 1, mismatches);
                }
            } else {
                mismatches += 1;
                score -= MISMATCH_PENALTY;
                if mismatches > self.max_mismatches || best.0 - score > X_DROP {
                    break;
                }
            }
            p += 1;
        }
        (best.1, best.2)
    }
}

impl RepeatSearch for KmerRepeatSearch {
    fn find_repeats(
        &self,
        sequence: &[u8],
        left_flank: Range<u64>,
        right_flank: Range<u64>,
    ) -> Vec<RepeatCandidate> {
        let (Some(left), Some(right)) = (slice(sequence, &left_flank), slice(sequence, &right_flank))
        else {
            return Vec::new();
        };
        let (ls, rs) = (left_flank.start, right_flank.start);

        let mut found: Vec<RepeatCandidate> = self
            .search(left, right, |i, j, len| ls + (i + len) as u64 <= rs + j as u64)
            .into_iter()
            .map(|(i, j, length, mismatches)| RepeatCandidate {
                left_start: ls + i as u64,
                right_start: rs + j as u64,
                length: length as u64,
                strand: Strand::Forward,
                mismatches,
            })
            .collect();

        if self.inverted {
            let rc = reverse_complement(right);
            let rlen = rc.len();
            // Position j in the reverse complement maps back to
            // [rlen - j - len, rlen - j) on the forward strand
            let fits = |i: usize, j: usize, len: usize| {
                rlen >= j + len && ls + (i + len) as u64 <= rs + (rlen - j - len) as u64
            };
            found.extend(self.search(left, &rc, fits).into_iter().map(
                |(i, j, length, mismatches)| RepeatCandidate {
                    left_start: ls + i as u64,
                    right_start: rs + (rlen - j - length) as u64,
                    length: length as u64,
                    strand: Strand::Reverse,
                    mismatches,
                },
            ));
        }

        found.sort_by(|a, b| {
            b.length
                .cmp(&a.length)
                .then(a.mismatches.cmp(&b.mismatches))
                .then(a.left_start.cmp(&b.left_start))
                .then(a.right_start.cmp(&b.right_start))
        });
        found.dedup();
        found.truncate(MAX_CANDIDATES);
        found
    }

    fn orientations(&self) -> u32 {
        if self.inverted {
            2
        } else {
            1
        }
    }
}

fn slice<'a>(sequence: &'a [u8], range: &Range<u64>) -> Option<&'a [u8]> {
    let start = usize::try_from(range.start).ok()?;
    let end = usize::try_from(range.end).ok()?;
    sequence.get(start..end)
}

fn complement(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => other,
    }
}

/// Reverse complement of an uppercase DNA sequence
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}
