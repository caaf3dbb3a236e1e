#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Attachment-site repeat planted around the phage block
pub const ATT: &[u8] = b"TCGATGGCAATCCGTACGAT";

/// Deterministic pseudo-random nucleotides
pub fn random_sequence(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            b"ACGT"[((state >> 33) % 4) as usize]
        })
        .collect()
}

/// Copy `repeat` to `left` and `right` and pin the neighbouring bases so the
/// two copies cannot extend past `repeat`
pub fn plant_repeat(seq: &mut [u8], repeat: &[u8], left: usize, right: usize) {
    seq[left..left + repeat.len()].copy_from_slice(repeat);
    seq[right..right + repeat.len()].copy_from_slice(repeat);
    seq[left - 1] = b'A';
    seq[right - 1] = b'C';
    seq[left + repeat.len()] = b'G';
    seq[right + repeat.len()] = b'T';
}

/// Gene `i` spans `[1000 + 500i, 1450 + 500i)`
pub fn gene_coordinates(n: u64) -> Vec<(u64, u64)> {
    (0..n).map(|i| (1000 + 500 * i, 1450 + 500 * i)).collect()
}

/// Phage scores for a 10-gene contig with a phage block at genes 3-6
pub const BLOCK_SCORES: [f64; 10] = [10.0, 10.0, 10.0, 80.0, 80.0, 80.0, 80.0, 10.0, 10.0, 10.0];

/// Input files for one 8 kb contig whose genes 3-6 form a prophage
/// flanked by an exact attachment site at 2500 and 4430
pub struct Fixture {
    pub fasta: PathBuf,
    pub genes: PathBuf,
    pub gff: PathBuf,
    pub hits: PathBuf,
}

impl Fixture {
    pub fn write(dir: &Path, contig: &str) -> Self {
        let mut sequence = random_sequence(8000, 17);
        plant_repeat(&mut sequence, ATT, 2500, 4430);

        let mut fasta = format!(">{contig} test contig\n");
        for line in sequence.chunks(80) {
            fasta.push_str(std::str::from_utf8(line).unwrap());
            fasta.push('\n');
        }

        let mut genes = String::from("contig\tstart\tend\tstrand\n");
        let mut gff = String::from("##gff-version 3\n");
        for (i, (start, end)) in gene_coordinates(10).into_iter().enumerate() {
            writeln!(genes, "{contig}\t{start}\t{end}\t+").unwrap();
            writeln!(
                gff,
                "{contig}\ttest\tCDS\t{}\t{end}\t.\t+\t0\tID=cds{i};locus_tag=TST_{i:04}",
                start + 1
            )
            .unwrap();
        }

        let mut hits = String::from("contig\tgene_index\tcategory\tscore\n");
        for (i, score) in BLOCK_SCORES.iter().enumerate() {
            writeln!(hits, "{contig}\t{i}\tphage\t{score}").unwrap();
        }

        let fixture = Self {
            fasta: dir.join("genome.fna"),
            genes: dir.join("genes.tsv"),
            gff: dir.join("genes.gff3"),
            hits: dir.join("hits.tsv"),
        };
        std::fs::write(&fixture.fasta, fasta).unwrap();
        std::fs::write(&fixture.genes, genes).unwrap();
        std::fs::write(&fixture.gff, gff).unwrap();
        std::fs::write(&fixture.hits, hits).unwrap();
        fixture
    }
}

/// Settings sized for the 8 kb test contig
const SCAN_DEFAULTS: &[(&str, &str)] = &[
    ("--window-size", "3"),
    ("--merge-gap", "1"),
    ("--search-radius", "200"),
    ("--min-region-genes", "4"),
    ("--min-region-length", "1000"),
    ("--max-att-mismatches", "0"),
    ("--min-contig-length", "0"),
];

/// `scan` over a fixture; `overrides` replace the matching defaults
pub fn scan_command(fixture: &Fixture, overrides: &[(&str, &str)]) -> Command {
    let mut cmd = Command::cargo_bin("prophage-scan").unwrap();
    cmd.arg("scan")
        .arg("--fasta")
        .arg(&fixture.fasta)
        .arg("--genes")
        .arg(&fixture.genes)
        .arg("--hits")
        .arg(&fixture.hits);
    for (flag, default) in SCAN_DEFAULTS {
        let value = overrides
            .iter()
            .find(|(f, _)| f == flag)
            .map_or(*default, |(_, v)| *v);
        cmd.args([*flag, value]);
    }
    for (flag, value) in overrides {
        if !SCAN_DEFAULTS.iter().any(|(f, _)| f == flag) {
            cmd.args([*flag, *value]);
        }
    }
    cmd
}
