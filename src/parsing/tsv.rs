use std::path::Path;

use crate::core::gene::Gene;
use crate::core::types::{ReferenceCategory, Strand};
use crate::evidence::adapter::RawHit;
use crate::parsing::{read_text, GenesByContig, HitsByContig, ParseError};
use crate::utils::validation::{check_contig_limit, check_gene_limit, check_hit_limit};

/// Split non-empty, non-comment lines into fields, skipping a header line
/// whose first field is one of `header_names`. Yields `(line_num, fields)`
/// with 1-based line numbers.
fn data_lines<'a>(
    text: &'a str,
    header_names: &'a [&'a str],
) -> impl Iterator<Item = (usize, Vec<&'a str>)> + 'a {
    let mut first_data_line = true;
    text.lines().enumerate().filter_map(move |(i, line)| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();

        // Check if first non-empty/non-comment line is a header
        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if header_names.contains(&first.as_str()) {
                return None;
            }
        }
        Some((i + 1, fields))
    })
}

/// Parse a gene-call TSV file with columns: contig, start, end, strand
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_genes_file(path: &Path) -> Result<GenesByContig, ParseError> {
    let content = read_text(path)?;
    parse_genes_text(&content)
}

/// Parse gene calls (0-based, half-open) with columns: contig, start, end,
/// strand, [locus_tag]
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if lines have fewer than 4 fields or
/// contain invalid values, or `ParseError::TooManyGenes`/`TooManyContigs`
/// if a limit is exceeded.
pub fn parse_genes_text(text: &str) -> Result<GenesByContig, ParseError> {
    let mut genes = GenesByContig::new();

    for (line_num, fields) in data_lines(text, &["contig", "seqid", "chrom"]) {
        if fields.len() < 4 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 4 fields"
            )));
        }

        let coordinate = |s: &str| {
            s.parse::<u64>().map_err(|_| {
                ParseError::InvalidFormat(format!("Invalid coordinate on line {line_num}: '{s}'"))
            })
        };
        let start = coordinate(fields[1])?;
        let end = coordinate(fields[2])?;
        let strand = Strand::parse(fields[3]).ok_or_else(|| {
            ParseError::InvalidFormat(format!(
                "Invalid strand on line {line_num}: '{}'",
                fields[3]
            ))
        })?;

        let contig = fields[0].to_string();
        if !genes.contains_key(&contig) && check_contig_limit(genes.len()).is_some() {
            return Err(ParseError::TooManyContigs(genes.len()));
        }
        let contig_genes = genes.entry(contig.clone()).or_default();
        if check_gene_limit(contig_genes.len()).is_some() {
            return Err(ParseError::TooManyGenes {
                contig,
                count: contig_genes.len(),
            });
        }

        let mut gene = Gene::new(contig_genes.len(), start, end, strand);
        if let Some(tag) = fields.get(4).filter(|t| !t.is_empty()) {
            gene = gene.with_locus_tag(*tag);
        }
        contig_genes.push(gene);
    }

    Ok(genes)
}

/// Parse an evidence TSV file with columns: contig, gene_index, category, score
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_hits_file(path: &Path) -> Result<HitsByContig, ParseError> {
    let content = read_text(path)?;
    parse_hits_text(&content)
}

/// Parse evidence hits with columns: contig, gene_index, category, score.
///
/// Gene indices refer to the contig's genes ordered by start coordinate.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for short lines, unknown categories or
/// unparseable numbers, or `ParseError::TooManyHits` if the limit is
/// exceeded.
pub fn parse_hits_text(text: &str) -> Result<HitsByContig, ParseError> {
    let mut hits = HitsByContig::new();
    let mut total = 0usize;

    for (line_num, fields) in data_lines(text, &["contig", "seqid", "chrom"]) {
        if fields.len() < 4 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 4 fields"
            )));
        }

        let gene_index: usize = fields[1].parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid gene index on line {line_num}: '{}'",
                fields[1]
            ))
        })?;
        let category = ReferenceCategory::parse(fields[2]).ok_or_else(|| {
            ParseError::InvalidFormat(format!(
                "Unknown category on line {line_num}: '{}'",
                fields[2]
            ))
        })?;
        let score: f64 = fields[3].parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid score on line {line_num}: '{}'",
                fields[3]
            ))
        })?;

        if check_hit_limit(total).is_some() {
            return Err(ParseError::TooManyHits(total));
        }
        total += 1;

        hits.entry(fields[0].to_string())
            .or_default()
            .push(RawHit::new(gene_index, category, score));
    }

    Ok(hits)
}
