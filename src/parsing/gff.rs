use std::path::Path;

use crate::core::gene::Gene;
use crate::core::types::Strand;
use crate::parsing::{read_text, GenesByContig, ParseError};
use crate::utils::validation::{check_contig_limit, check_gene_limit};

/// Parse CDS features from a GFF3 file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_gff_file(path: &Path) -> Result<GenesByContig, ParseError> {
    let content = read_text(path)?;
    parse_gff_text(&content)
}

/// Parse CDS features from GFF3 text.
///
/// Coordinates are converted from GFF's 1-based closed intervals to 0-based
/// half-open. Features of other types are ignored, and parsing stops at an
/// embedded `##FASTA` section.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for lines with fewer than 9 columns or
/// bad coordinates, or `ParseError::TooManyGenes`/`TooManyContigs` if a
/// limit is exceeded.
pub fn parse_gff_text(text: &str) -> Result<GenesByContig, ParseError> {
    let mut genes = GenesByContig::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.starts_with("##FASTA") {
            break;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_num = i + 1;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 {
            return Err(ParseError::InvalidFormat(format!(
                "GFF line {line_num} has {} columns, expected 9",
                fields.len()
            )));
        }
        if fields[2] != "CDS" {
            continue;
        }

        let coordinate = |s: &str| {
            s.parse::<u64>().map_err(|_| {
                ParseError::InvalidFormat(format!("Invalid coordinate on GFF line {line_num}: '{s}'"))
            })
        };
        let start = coordinate(fields[3])?;
        let end = coordinate(fields[4])?;
        if start == 0 || end < start {
            return Err(ParseError::InvalidFormat(format!(
                "Invalid interval on GFF line {line_num}: {start}..{end}"
            )));
        }
        // Unstranded features are treated as forward
        let strand = Strand::parse(fields[6]).unwrap_or(Strand::Forward);

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

        let mut gene = Gene::new(contig_genes.len(), start - 1, end, strand);
        if let Some(tag) = attribute(fields[8], "locus_tag").or_else(|| attribute(fields[8], "ID")) {
            gene = gene.with_locus_tag(tag);
        }
        contig_genes.push(gene);
    }

    Ok(genes)
}

/// Value of one `key=value` pair in a GFF3 attribute column
fn attribute<'a>(column: &'a str, key: &str) -> Option<&'a str> {
    column
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GFF: &str = "##gff-version 3
##sequence-region contig_1 1 50000
contig_1\tProdigal\tCDS\t1\t300\t.\t+\t0\tID=cds1;locus_tag=ABC_0001
contig_1\tProdigal\tgene\t1\t300\t.\t+\t.\tID=gene1
contig_1\tProdigal\tCDS\t401\t900\t.\t-\t0\tID=cds2
contig_2\tProdigal\tCDS\t10\t99\t.\t.\t0\tproduct=hypothetical protein
##FASTA
>contig_1
ACGT
";

    #[test]
    fn test_parse_gff_cds() {
        let genes = parse_gff_text(GFF).unwrap();
        assert_eq!(genes.len(), 2);

        let c1 = &genes["contig_1"];
        assert_eq!(c1.len(), 2);
        assert_eq!((c1[0].start, c1[0].end), (0, 300));
        assert_eq!(c1[0].strand, Strand::Forward);
        assert_eq!(c1[0].locus_tag.as_deref(), Some("ABC_0001"));
        assert_eq!((c1[1].start, c1[1].end), (400, 900));
        assert_eq!(c1[1].strand, Strand::Reverse);
        assert_eq!(c1[1].locus_tag.as_deref(), Some("cds2"));

        let c2 = &genes["contig_2"];
        assert_eq!((c2[0].start, c2[0].end), (9, 99));
        assert!(c2[0].locus_tag.is_none());
    }

    #[test]
    fn test_short_line_rejected() {
        let result = parse_gff_text("contig_1\tProdigal\tCDS\t1\t300\n");
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_zero_start_rejected() {
        let result = parse_gff_text("contig_1\tx\tCDS\t0\t300\t.\t+\t0\tID=a\n");
        assert!(result.is_err());
    }
}
