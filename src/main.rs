use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use vcfconsensus::genomics::StreamMode;
use vcfconsensus::logging::init_logging;
use vcfconsensus::{pipeline, RunConfig};

#[derive(Parser, Debug)]
#[command(
    name = "vcfconsensus",
    version,
    about = "VCF -> sample-specific consensus sequence generator"
)]
struct Cli {
    /// JSON config file (default: ./config.json when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Input VCF file.
    #[arg(long)]
    vcf: Option<PathBuf>,
    /// Reference genome FASTA file.
    #[arg(long)]
    fasta: Option<PathBuf>,
    /// Output FASTA prefix (`.fa` is appended).
    #[arg(long)]
    output: Option<PathBuf>,
    /// Consensus window length in bases.
    #[arg(long)]
    consensus_length: Option<usize>,
    /// Windows per sample and chromosome.
    #[arg(long)]
    consensus_count: Option<usize>,
    /// Minimum allele frequency (records without AF are always kept).
    #[arg(long)]
    min_af: Option<f64>,
    /// Stride between tiled window starts.
    #[arg(long)]
    start_step: Option<usize>,
    /// Place windows at seeded random offsets.
    #[arg(long, conflicts_with = "no_random_start")]
    random_start: bool,
    /// Tile windows from offset 0 (overrides the config file).
    #[arg(long)]
    no_random_start: bool,
    /// Maximum overlap in bases between random windows of one sample/chromosome.
    #[arg(long)]
    max_overlap: Option<usize>,
    /// File with one allowed sample name per line.
    #[arg(long)]
    sample_list: Option<PathBuf>,
    /// Run seed for random placement.
    #[arg(long)]
    seed: Option<u64>,
    /// Output FASTA line width (0 = unwrapped).
    #[arg(long)]
    line_width: Option<usize>,
    /// Random stream mode: `shared` or `per-pair`.
    #[arg(long)]
    stream: Option<StreamMode>,
    /// Worker threads for `per-pair` generation.
    #[arg(long)]
    threads: Option<usize>,
    /// Rejected random draws tolerated per sample/chromosome.
    #[arg(long)]
    max_rejections: Option<usize>,
    /// Directory for timestamped run logs (default: ./logs).
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> RunConfig {
        let random_start = match (self.random_start, self.no_random_start) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        RunConfig {
            vcf: self.vcf.clone(),
            fasta: self.fasta.clone(),
            output: self.output.clone(),
            consensus_length: self.consensus_length,
            consensus_count: self.consensus_count,
            min_af: self.min_af,
            start_step: self.start_step,
            random_start,
            max_overlap: self.max_overlap,
            sample_list: self.sample_list.clone(),
            seed: self.seed,
            line_width: self.line_width,
            stream: self.stream,
            threads: self.threads,
            max_rejections: self.max_rejections,
            log_dir: self.log_dir.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = RunConfig::discover(cli.config.as_deref())
        .context("failed to load configuration")?
        .merge(cli.overrides())
        .resolve()
        .context("invalid configuration")?;

    let log_path = init_logging(Some(&settings.log_dir))?;
    info!("Starting consensus generator");
    if let Some(path) = log_path {
        info!(path = %path.display(), "run log");
    }

    if let Some(threads) = settings.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure worker threads")?;
    }

    let summary = pipeline::run(&settings)?;
    info!(
        samples = summary.samples,
        chromosomes = summary.chromosomes,
        records = summary.records,
        output = %summary.output.display(),
        "Done"
    );

    Ok(())
}
