//! Centralized validation and helper functions.

/// Maximum number of contigs allowed in a single input file (DOS protection)
pub const MAX_CONTIGS: usize = 100_000;

/// Maximum number of genes on one contig
pub const MAX_GENES: usize = 1_000_000;

/// Maximum number of evidence hits read from one file
pub const MAX_HITS: usize = 50_000_000;

/// Check if adding another contig would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new contig.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if check_contig_limit(contigs.len()).is_some() {
///     return Err(...);
/// }
/// contigs.push(new_contig); // Safe to add
/// ```
#[must_use]
pub fn check_contig_limit(count: usize) -> Option<String> {
    check_limit(count, MAX_CONTIGS, "contigs")
}

/// Same as [`check_contig_limit`], for genes on one contig.
#[must_use]
pub fn check_gene_limit(count: usize) -> Option<String> {
    check_limit(count, MAX_GENES, "genes")
}

/// Same as [`check_contig_limit`], for evidence hits.
#[must_use]
pub fn check_hit_limit(count: usize) -> Option<String> {
    check_limit(count, MAX_HITS, "hits")
}

fn check_limit(count: usize, max: usize, what: &str) -> Option<String> {
    if count >= max {
        Some(format!(
            "Too many {what}: adding another would exceed maximum of {max}"
        ))
    } else {
        None
    }
}

/// Uppercase a nucleotide sequence in place and return it.
#[must_use]
pub fn normalize_sequence(mut sequence: Vec<u8>) -> Vec<u8> {
    sequence.make_ascii_uppercase();
    sequence
}

/// MD5 of a sequence, computed on uppercase bases (standard convention).
///
/// # Examples
///
/// ```
/// use prophage_scan::utils::validation::sequence_md5;
///
/// assert_eq!(sequence_md5(b"acgt"), "f1f8f4bf413b16ad135722aa4591043e");
/// ```
#[must_use]
pub fn sequence_md5(sequence: &[u8]) -> String {
    let uppercase: Vec<u8> = sequence.iter().map(u8::to_ascii_uppercase).collect();
    format!("{:x}", md5::compute(&uppercase))
}

/// True for the four unambiguous nucleotides (uppercase).
#[inline]
#[must_use]
pub fn is_acgt(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}
