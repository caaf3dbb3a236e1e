use std::collections::HashSet;
use std::path::PathBuf;

use clap::Args;

use crate::calling::config::ScanConfig;
use crate::calling::engine::{GenomeInput, GenomeOutcome, GenomeReport, ProphageScanner};
use crate::calling::window::ScoringMethod;
use crate::cli::OutputFormat;
use crate::core::genome::Genome;
use crate::core::region::ProphageCall;
use crate::extract;
use crate::parsing::{self, fasta, tsv};

#[derive(Args)]
pub struct ScanArgs {
    /// Genome FASTA (.fa, .fna, .fasta; optionally .gz/.bgz)
    #[arg(long)]
    pub fasta: PathBuf,

    /// Gene calls (GFF3 CDS features or TSV: contig, start, end, strand)
    #[arg(long)]
    pub genes: PathBuf,

    /// Evidence hits (TSV: contig, gene_index, category, score)
    #[arg(long)]
    pub hits: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Named configuration preset (sensitive, strict)
    #[arg(long)]
    pub preset: Option<String>,

    /// Contig to treat as circular (repeatable)
    #[arg(long, value_name = "CONTIG")]
    pub circular: Vec<String>,

    /// Write called prophage sequences to this FASTA file
    #[arg(long, value_name = "FILE")]
    pub extract: Option<PathBuf>,

    /// Worker threads (defaults to one per core)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    // === Configuration overrides ===
    /// Genes per scoring window
    #[arg(long)]
    pub window_size: Option<usize>,

    /// Minimum window score to seed a region
    #[arg(long)]
    pub score_cutoff: Option<f64>,

    /// Non-qualifying genes tolerated inside a region
    #[arg(long)]
    pub merge_gap: Option<usize>,

    /// Boundary search radius in bp
    #[arg(long)]
    pub search_radius: Option<u64>,

    /// Minimum genes in a reported prophage
    #[arg(long)]
    pub min_region_genes: Option<usize>,

    /// Minimum prophage length in bp
    #[arg(long)]
    pub min_region_length: Option<u64>,

    /// Minimum region score
    #[arg(long)]
    pub min_score: Option<f64>,

    /// Mismatches allowed in an attachment-site repeat
    #[arg(long)]
    pub max_att_mismatches: Option<u32>,

    /// Also search inverted attachment-site repeats (true or false; bare flag means true)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub search_inverted: Option<bool>,

    /// Window scoring method (mean_differential, minimum_differential)
    #[arg(long)]
    pub scoring: Option<ScoringMethod>,

    /// Skip contigs shorter than this many bp
    #[arg(long)]
    pub min_contig_length: Option<u64>,
}

impl ScanArgs {
    /// Defaults, then preset, then config file, then flags
    fn effective_config(&self) -> anyhow::Result<ScanConfig> {
        let mut config = ScanConfig::layered(self.preset.as_deref(), self.config.as_deref())?;

        if let Some(v) = self.window_size {
            config.window_size = v;
        }
        if let Some(v) = self.score_cutoff {
            config.score_cutoff = v;
        }
        if let Some(v) = self.merge_gap {
            config.merge_gap = v;
        }
        if let Some(v) = self.search_radius {
            config.search_radius = v;
        }
        if let Some(v) = self.min_region_genes {
            config.min_region_genes = v;
        }
        if let Some(v) = self.min_region_length {
            config.min_region_length = v;
        }
        if let Some(v) = self.min_score {
            config.min_score = v;
        }
        if let Some(v) = self.max_att_mismatches {
            config.max_att_mismatches = v;
        }
        if let Some(v) = self.search_inverted {
            config.search_inverted = v;
        }
        if let Some(v) = self.scoring {
            config.scoring = v;
        }
        if let Some(v) = self.min_contig_length {
            config.min_contig_length = v;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Execute scan subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be parsed, the configuration is
/// invalid, or any genome fails to scan.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ScanArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.effective_config()?;

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| anyhow::anyhow!("Failed to configure thread pool: {e}"))?;
    }

    let genomes = load_genomes(&args)?;
    let hits = tsv::parse_hits_file(&args.hits)?;

    for contig in hits.keys() {
        if !genomes.iter().any(|g| g.id.as_str() == contig) {
            tracing::warn!(contig = %contig, "evidence for a contig not in the FASTA, ignored");
        }
    }

    if verbose {
        let gene_total: usize = genomes.iter().map(Genome::gene_count).sum();
        eprintln!(
            "Loaded {} contigs with {gene_total} genes and evidence for {} contigs",
            genomes.len(),
            hits.len()
        );
    }

    let scanner = ProphageScanner::new(config)?;
    let inputs: Vec<GenomeInput<'_>> = genomes
        .iter()
        .map(|genome| GenomeInput {
            genome,
            hits: hits.get(genome.id.as_str()).map_or(&[][..], Vec::as_slice),
        })
        .collect();
    let outcomes = scanner.scan_batch(&inputs);

    match format {
        OutputFormat::Text => print_text_results(&outcomes, verbose),
        OutputFormat::Json => print_json_results(&outcomes, scanner.config())?,
        OutputFormat::Tsv => print_tsv_results(&outcomes),
    }

    if let Some(path) = &args.extract {
        // Outcomes are in input order, so they pair with `genomes`
        let calls: Vec<(&Genome, &ProphageCall)> = genomes
            .iter()
            .zip(&outcomes)
            .filter_map(|(genome, outcome)| outcome.result.as_ref().ok().map(|r| (genome, r)))
            .flat_map(|(genome, report)| report.calls.iter().map(move |call| (genome, call)))
            .collect();
        let written = extract::write_prophage_file(path, calls)?;
        if verbose {
            eprintln!("Wrote {written} prophage sequences to {}", path.display());
        }
    }

    let failed: Vec<&GenomeOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    if !failed.is_empty() {
        for outcome in &failed {
            if let Err(e) = &outcome.result {
                eprintln!("Error: {}: {e}", outcome.genome_id);
            }
        }
        anyhow::bail!("{} of {} contigs failed to scan", failed.len(), outcomes.len());
    }

    Ok(())
}

/// Pair every FASTA record with its gene calls, in FASTA order
fn load_genomes(args: &ScanArgs) -> anyhow::Result<Vec<Genome>> {
    if !fasta::is_fasta_file(&args.fasta) {
        tracing::warn!(path = %args.fasta.display(), "unrecognized FASTA extension, reading anyway");
    }
    let sequences = fasta::read_sequences(&args.fasta)?;
    let mut genes = parsing::read_gene_calls(&args.genes)?;
    let circular: HashSet<&str> = args.circular.iter().map(String::as_str).collect();

    let mut genomes = Vec::with_capacity(sequences.len());
    for record in sequences {
        let contig_genes = genes.remove(&record.name).unwrap_or_default();
        if contig_genes.is_empty() {
            tracing::warn!(contig = %record.name, "no gene calls for contig");
        }
        let is_circular = circular.contains(record.name.as_str());
        let genome = Genome::new(record.name.as_str(), record.len(), is_circular, contig_genes)?
            .with_sequence(record.sequence)?;
        genomes.push(genome);
    }

    for contig in genes.keys() {
        tracing::warn!(contig = %contig, "gene calls for a contig not in the FASTA, ignored");
    }
    for name in &circular {
        if !genomes.iter().any(|g| g.id.as_str() == *name) {
            tracing::warn!(contig = %name, "--circular names a contig not in the FASTA");
        }
    }

    Ok(genomes)
}

fn print_text_results(outcomes: &[GenomeOutcome], verbose: bool) {
    let total: usize = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .map(|r| r.calls.len())
        .sum();

    for (i, outcome) in outcomes.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(60));
        }
        match &outcome.result {
            Ok(report) => print_text_report(report, verbose),
            Err(e) => println!("{}: failed: {e}", outcome.genome_id),
        }
    }

    println!(
        "\n{total} prophage{} called across {} contig{}",
        if total == 1 { "" } else { "s" },
        outcomes.len(),
        if outcomes.len() == 1 { "" } else { "s" }
    );
}

fn print_text_report(report: &GenomeReport, verbose: bool) {
    println!(
        "{} ({} bp, {}, {} genes, {} with evidence)",
        report.genome_id,
        report.length,
        if report.circular { "circular" } else { "linear" },
        report.gene_count,
        report.evidenced_genes
    );
    for note in &report.notes {
        println!("   Note: {note}");
    }
    if verbose {
        println!(
            "   Windows: {}  Candidates: {}",
            report.windows, report.candidates
        );
    }

    if report.calls.is_empty() {
        println!("   No prophages called");
    }
    for call in &report.calls {
        println!(
            "\n   {}  {}..{} ({} bp)",
            call.id,
            call.start,
            call.end,
            call.len()
        );
        println!(
            "      Score: {:.3} (max {:.3})  Genes: {}  Confidence: {}",
            call.score, call.max_score, call.gene_count, call.confidence
        );
        println!("      Left: {}  Right: {}", call.left, call.right);
        if let Some(att) = &call.attachment {
            println!(
                "      attL {}..{}  attR {}..{}  ({} bp, {} strand, {} mismatches)",
                att.left_start,
                att.left_end(),
                att.right_start,
                att.right_end(),
                att.length,
                att.strand,
                att.mismatches
            );
        }
    }

    if verbose && !report.rejected.is_empty() {
        println!("\n   Rejected:");
        for rejection in &report.rejected {
            println!(
                "   - {}..{} (score {:.3}): {}",
                rejection.start, rejection.end, rejection.score, rejection.reason
            );
        }
    }
}

fn print_json_results(outcomes: &[GenomeOutcome], config: &ScanConfig) -> anyhow::Result<()> {
    let genomes: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(report) => serde_json::to_value(report),
            Err(e) => Ok(serde_json::json!({
                "genome_id": outcome.genome_id,
                "error": e.to_string(),
            })),
        })
        .collect::<Result<_, _>>()?;

    let output = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "config": config,
        "genomes": genomes,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(outcomes: &[GenomeOutcome]) {
    println!(
        "id\tgenome\tstart\tend\tlength\tscore\tmax_score\tgenes\tleft\tright\tconfidence\tatt_left\tatt_right\tatt_length\tatt_mismatches"
    );
    for report in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
        for call in &report.calls {
            let (att_left, att_right, att_length, att_mismatches) = match &call.attachment {
                Some(att) => (
                    att.left_start.to_string(),
                    att.right_start.to_string(),
                    att.length.to_string(),
                    att.mismatches.to_string(),
                ),
                None => ("-".into(), "-".into(), "-".into(), "-".into()),
            };
            println!(
                "{}\t{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                call.id,
                call.genome_id,
                call.start,
                call.end,
                call.len(),
                call.score,
                call.max_score,
                call.gene_count,
                call.left,
                call.right,
                call.confidence,
                att_left,
                att_right,
                att_length,
                att_mismatches
            );
        }
    }
}
