//! Reader for genome FASTA files using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed files.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)
//! - `.fa.bgz`, `.fasta.bgz`, `.fna.bgz` (bgzip compressed)

use std::ffi::OsStr;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fasta;

use crate::parsing::ParseError;
use crate::utils::validation::{check_contig_limit, normalize_sequence};

/// One contig sequence, uppercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// Record name up to the first whitespace
    pub name: String,
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    pub fn len(&self) -> u64 {
        self.sequence.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();

    // Check for gzipped FASTA
    if path_str.ends_with(".fa.gz")
        || path_str.ends_with(".fasta.gz")
        || path_str.ends_with(".fna.gz")
        || path_str.ends_with(".fa.bgz")
        || path_str.ends_with(".fasta.bgz")
        || path_str.ends_with(".fna.bgz")
    {
        return true;
    }

    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .as_deref(),
        Some("fa" | "fasta" | "fna")
    )
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub(crate) fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read every sequence in a FASTA file.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::InvalidFormat` if no sequences are found, or
/// `ParseError::TooManyContigs` if the limit is exceeded.
pub fn read_sequences(path: &Path) -> Result<Vec<SequenceRecord>, ParseError> {
    let file = std::fs::File::open(path)?;
    if is_gzipped(path) {
        let mut reader = fasta::io::Reader::new(BufReader::new(MultiGzDecoder::new(file)));
        read_records(&mut reader)
    } else {
        let mut reader = fasta::io::Reader::new(BufReader::new(file));
        read_records(&mut reader)
    }
}

/// Read every sequence from an open noodles FASTA reader
///
/// # Errors
///
/// Same as [`read_sequences`], minus file access.
pub fn read_records<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Vec<SequenceRecord>, ParseError> {
    let mut records = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        // Check contig limit for DOS protection
        if check_contig_limit(records.len()).is_some() {
            return Err(ParseError::TooManyContigs(records.len()));
        }

        let name = String::from_utf8_lossy(record.name()).to_string();
        let sequence = normalize_sequence(record.sequence().as_ref().to_vec());
        records.push(SequenceRecord { name, sequence });
    }

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_is_fasta_file() {
        assert!(is_fasta_file(Path::new("test.fa")));
        assert!(is_fasta_file(Path::new("test.fasta")));
        assert!(is_fasta_file(Path::new("test.fna")));
        assert!(is_fasta_file(Path::new("test.fa.gz")));
        assert!(is_fasta_file(Path::new("test.fna.bgz")));
        assert!(is_fasta_file(Path::new("/path/to/Genome.FNA")));

        assert!(!is_fasta_file(Path::new("test.gff3")));
        assert!(!is_fasta_file(Path::new("test.tsv")));
    }

    #[test]
    fn test_read_sequences() {
        let fasta_content = b">contig_1 Escherichia coli\nACGTacgt\nACGT\n>contig_2\nGGGG\n";

        let mut temp = NamedTempFile::with_suffix(".fna").unwrap();
        temp.write_all(fasta_content).unwrap();
        temp.flush().unwrap();

        let records = read_sequences(temp.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "contig_1");
        assert_eq!(records[0].sequence, b"ACGTACGTACGT".to_vec());
        assert_eq!(records[1].name, "contig_2");
        assert_eq!(records[1].len(), 4);
    }

    #[test]
    fn test_read_gzipped_sequences() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">chr\nACGTTGCA\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut temp = NamedTempFile::with_suffix(".fa.gz").unwrap();
        temp.write_all(&compressed).unwrap();
        temp.flush().unwrap();

        let records = read_sequences(temp.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, b"ACGTTGCA".to_vec());
    }

    #[test]
    fn test_read_empty_fasta() {
        let mut temp = NamedTempFile::with_suffix(".fa").unwrap();
        temp.write_all(b"").unwrap();
        temp.flush().unwrap();

        assert!(read_sequences(temp.path()).is_err());
    }
}
