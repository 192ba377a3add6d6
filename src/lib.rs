//! # Variant-aware consensus windows
//!
//! This library derives sample-specific consensus sequences from a reference
//! genome and a VCF of called variants.
//!
//! ## Pipeline
//!
//! 1. **Variant store**: bi-allelic SNVs passing the allele-frequency filter,
//!    keyed chromosome → position → sample → allele
//! 2. **Window placement**: deterministic tiling or seeded random starts
//!    under a pairwise overlap bound
//! 3. **Substitution**: each window is the reference slice with the sample's
//!    alleles written over it
//! 4. **Composition**: samples in input order × chromosomes in reference order
//!
//! ## Usage Example
//!
//! ```ignore
//! use vcfconsensus::genomics::{ConsensusGenerator, ConsensusSampler, StreamMode};
//!
//! let generator = ConsensusGenerator::new(&reference, &store, ConsensusSampler::tiled(500, 10, 250));
//! let records = generator.generate(store.samples(), 37, StreamMode::Shared)?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;    // JSON + CLI settings
pub mod genomics;  // Reference, variants, sampling, substitution
pub mod logging;   // Tracing subscriber setup
pub mod pipeline;  // End-to-end run

pub use config::{ConfigError, ConsensusParams, RunConfig, Settings};
pub use genomics::{
    ConsensusGenerator, ConsensusRecord, ConsensusSampler, ReferenceGenome, StreamMode,
    VariantStore,
};

use genomics::{SamplerError, VariantStoreError};
use thiserror::Error;

/// Errors that abort a consensus run.
///
/// Every failure is terminal: the run stops and no partial output is
/// returned.
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// Malformed record, bad allele frequency, or unknown sample.
    #[error(transparent)]
    Variants(#[from] VariantStoreError),

    /// Window placement or construction failed for one pair.
    #[error("sample '{sample}', chromosome '{chrom}': {source}")]
    Sampling {
        /// Sample being processed.
        sample: String,
        /// Chromosome being processed.
        chrom: String,
        /// Underlying sampler error.
        #[source]
        source: SamplerError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_error_names_the_pair() {
        let err = ConsensusError::Sampling {
            sample: "S1".into(),
            chrom: "chrM".into(),
            source: SamplerError::InvalidWindow {
                start: 0,
                end: 20000,
                length: 16569,
            },
        };
        assert_eq!(
            err.to_string(),
            "sample 'S1', chromosome 'chrM': window 0-20000 exceeds chromosome length 16569"
        );
    }

    #[test]
    fn store_errors_convert_transparently() {
        let err: ConsensusError = VariantStoreError::UnknownSample("S9".into()).into();
        assert_eq!(err.to_string(), "sample 'S9' is not in the sample list");
    }
}
