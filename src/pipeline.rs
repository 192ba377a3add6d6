//! End-to-end run: read inputs, build the variant store, generate windows,
//! write FASTA.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Settings;
use crate::genomics::{
    read_reference, read_sample_list, write_fasta, ConsensusGenerator, StreamMode, VariantStoreStats,
    VcfReader,
};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Chromosomes in the reference.
    pub chromosomes: usize,
    /// Samples processed.
    pub samples: usize,
    /// Variant store construction counters.
    pub variant_stats: VariantStoreStats,
    /// Consensus records written.
    pub records: usize,
    /// FASTA file written.
    pub output: PathBuf,
}

/// Execute a full run with resolved settings.
///
/// Nothing is written unless every stage succeeds.
pub fn run(settings: &Settings) -> Result<RunSummary> {
    let params = &settings.params;

    info!(path = %settings.fasta.display(), "loading reference genome");
    let fasta = File::open(&settings.fasta)
        .with_context(|| format!("failed to open reference {}", settings.fasta.display()))?;
    let reference = read_reference(BufReader::new(fasta))
        .with_context(|| format!("failed to read reference {}", settings.fasta.display()))?;
    info!(
        chromosomes = reference.len(),
        bases = reference.total_bases(),
        "reference loaded"
    );

    let allow_list = match &settings.sample_list {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open sample list {}", path.display()))?;
            let allowed = read_sample_list(BufReader::new(file))
                .with_context(|| format!("failed to read sample list {}", path.display()))?;
            info!(allowed = allowed.len(), "sample allow-list loaded");
            Some(allowed)
        }
        None => None,
    };

    info!(path = %settings.vcf.display(), min_af = params.min_af, "loading VCF");
    let vcf = File::open(&settings.vcf)
        .with_context(|| format!("failed to open VCF {}", settings.vcf.display()))?;
    let reader = VcfReader::new(BufReader::new(vcf), allow_list.as_ref())
        .with_context(|| format!("failed to read VCF header {}", settings.vcf.display()))?;
    let samples: Vec<Arc<str>> = reader.samples().to_vec();
    let (store, variant_stats) = reader
        .into_variant_store(params.min_af)
        .with_context(|| format!("failed to load variants from {}", settings.vcf.display()))?;

    info!(
        window = params.consensus_length,
        count = params.consensus_count,
        random = params.random_start,
        stream = %params.stream,
        seed = params.seed,
        "generating consensus windows"
    );
    let generator = ConsensusGenerator::new(&reference, &store, params.sampler());
    let records = match params.stream {
        StreamMode::Shared => generator.generate(&samples, params.seed, StreamMode::Shared),
        StreamMode::PerPair => generator.generate_parallel(&samples, params.seed),
    }
    .context("consensus generation failed")?;

    let output = settings.output_path();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    let file = File::create(&output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_fasta(&mut BufWriter::new(file), &records, settings.line_width)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), records = records.len(), "FASTA written");

    Ok(RunSummary {
        chromosomes: reference.len(),
        samples: samples.len(),
        variant_stats,
        records: records.len(),
        output,
    })
}
