//! Sample × chromosome × window composition.
//!
//! Iteration order is samples in input order, then chromosomes in reference
//! order. In [`StreamMode::Shared`] one random stream advances across that
//! whole order, so reordering either list changes random-mode output.
//! [`StreamMode::PerPair`] gives every (sample, chromosome) pair its own
//! stream derived from the run seed, which makes pairs independent and lets
//! them run in parallel without changing the result.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::genomics::{
    Chromosome, ConsensusRecord, ConsensusSampler, ReferenceGenome, SampleId, SamplerError,
    SequenceBuilder, VariantStore,
};
use crate::ConsensusError;

/// How random window placement draws its randomness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamMode {
    /// One stream seeded once per run, shared across all pairs in order.
    #[default]
    Shared,
    /// An independent stream per (sample, chromosome) pair.
    PerPair,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMode::Shared => f.write_str("shared"),
            StreamMode::PerPair => f.write_str("per-pair"),
        }
    }
}

impl FromStr for StreamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(StreamMode::Shared),
            "per-pair" => Ok(StreamMode::PerPair),
            other => Err(format!(
                "unknown stream mode '{other}' (expected 'shared' or 'per-pair')"
            )),
        }
    }
}

/// Random stream for one (sample, chromosome) pair.
///
/// The 32-byte seed is the blake3 digest of the run seed and both names, each
/// name length-prefixed so distinct pairs never hash the same input.
pub fn pair_stream(seed: u64, sample: &str, chrom: &str) -> StdRng {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    for part in [sample, chrom] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    StdRng::from_seed(*hasher.finalize().as_bytes())
}

/// Generates consensus windows for every sample and chromosome.
#[derive(Debug, Clone)]
pub struct ConsensusGenerator<'a> {
    reference: &'a ReferenceGenome,
    variants: &'a VariantStore,
    sampler: ConsensusSampler,
}

impl<'a> ConsensusGenerator<'a> {
    /// Compose a generator from its inputs.
    pub fn new(
        reference: &'a ReferenceGenome,
        variants: &'a VariantStore,
        sampler: ConsensusSampler,
    ) -> Self {
        Self {
            reference,
            variants,
            sampler,
        }
    }

    /// Window sampler in use.
    pub fn sampler(&self) -> &ConsensusSampler {
        &self.sampler
    }

    /// Generate all records for `samples` with the given seed and stream mode.
    pub fn generate(
        &self,
        samples: &[Arc<str>],
        seed: u64,
        mode: StreamMode,
    ) -> Result<Vec<ConsensusRecord>, ConsensusError> {
        match mode {
            StreamMode::Shared => {
                let mut rng = StdRng::seed_from_u64(seed);
                self.generate_with_rng(samples, &mut rng)
            }
            StreamMode::PerPair => self.generate_per_pair(samples, seed),
        }
    }

    /// Generate all records drawing from one caller-supplied stream.
    pub fn generate_with_rng<R: Rng>(
        &self,
        samples: &[Arc<str>],
        rng: &mut R,
    ) -> Result<Vec<ConsensusRecord>, ConsensusError> {
        let resolved = self.resolve_samples(samples)?;
        let mut records = Vec::new();
        for (name, id) in &resolved {
            for chromosome in self.reference.iter() {
                records.extend(self.window_batch(name, *id, chromosome, rng)?);
            }
        }
        self.log_summary(samples.len(), records.len());
        Ok(records)
    }

    /// Generate with per-pair streams, one pair after another.
    pub fn generate_per_pair(
        &self,
        samples: &[Arc<str>],
        seed: u64,
    ) -> Result<Vec<ConsensusRecord>, ConsensusError> {
        let resolved = self.resolve_samples(samples)?;
        let mut records = Vec::new();
        for (name, id) in &resolved {
            for chromosome in self.reference.iter() {
                let mut rng = pair_stream(seed, name, &chromosome.name);
                records.extend(self.window_batch(name, *id, chromosome, &mut rng)?);
            }
        }
        self.log_summary(samples.len(), records.len());
        Ok(records)
    }

    /// Generate with per-pair streams across the rayon thread pool.
    ///
    /// Output order and content equal [`generate_per_pair`](Self::generate_per_pair).
    /// Once a pair fails, pairs later in sample × chromosome order are not
    /// started; earlier pairs still run, so the returned error is always the
    /// one from the earliest failing pair.
    pub fn generate_parallel(
        &self,
        samples: &[Arc<str>],
        seed: u64,
    ) -> Result<Vec<ConsensusRecord>, ConsensusError> {
        let resolved = self.resolve_samples(samples)?;
        let pairs: Vec<(&Arc<str>, SampleId, &Chromosome)> = resolved
            .iter()
            .flat_map(|(name, id)| self.reference.iter().map(move |chrom| (name, *id, chrom)))
            .collect();

        let first_failure = AtomicUsize::new(usize::MAX);
        let batches: Vec<Option<Result<Vec<ConsensusRecord>, ConsensusError>>> = pairs
            .par_iter()
            .enumerate()
            .map(|(index, &(name, id, chromosome))| {
                if index > first_failure.load(Ordering::Relaxed) {
                    return None;
                }
                let mut rng = pair_stream(seed, name, &chromosome.name);
                let batch = self.window_batch(name, id, chromosome, &mut rng);
                if batch.is_err() {
                    first_failure.fetch_min(index, Ordering::Relaxed);
                }
                Some(batch)
            })
            .collect();

        let mut records = Vec::new();
        for batch in batches.into_iter().flatten() {
            records.extend(batch?);
        }
        self.log_summary(samples.len(), records.len());
        Ok(records)
    }

    fn resolve_samples(
        &self,
        samples: &[Arc<str>],
    ) -> Result<Vec<(Arc<str>, SampleId)>, ConsensusError> {
        samples
            .iter()
            .map(|name| -> Result<_, ConsensusError> {
                Ok((Arc::clone(name), self.variants.sample_id(name)?))
            })
            .collect()
    }

    fn window_batch<R: Rng>(
        &self,
        sample_name: &Arc<str>,
        sample: SampleId,
        chromosome: &Chromosome,
        rng: &mut R,
    ) -> Result<Vec<ConsensusRecord>, ConsensusError> {
        let sampling_error = |source: SamplerError| ConsensusError::Sampling {
            sample: sample_name.to_string(),
            chrom: chromosome.name.to_string(),
            source,
        };

        let starts = self
            .sampler
            .starts(chromosome.len(), rng)
            .map_err(sampling_error)?;
        if starts.is_empty() {
            debug!(
                sample = %sample_name,
                chrom = %chromosome.name,
                length = chromosome.len(),
                window = self.sampler.window(),
                "no window fits on chromosome"
            );
        }

        let builder = SequenceBuilder::new(self.variants);
        let window = self.sampler.window();
        starts
            .into_iter()
            .map(|start| {
                builder
                    .record(chromosome, start, start + window, sample_name, sample)
                    .map_err(sampling_error)
            })
            .collect()
    }

    fn log_summary(&self, samples: usize, records: usize) {
        info!(
            samples,
            chromosomes = self.reference.len(),
            records,
            "consensus windows generated"
        );
    }
}
