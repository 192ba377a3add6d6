//! Genomics data structures and the consensus generation pipeline.
//!
//! Leaf-first: the reference genome and variant store hold the inputs, the
//! sampler places windows, the sequence builder fills them, and the consensus
//! generator composes everything per sample and chromosome. FASTA and VCF
//! text handling live alongside as thin readers/writers.

mod consensus;
mod fasta;
mod reference;
mod sampler;
mod sequence;
mod types;
mod variant_store;
mod vcf;

pub use consensus::{pair_stream, ConsensusGenerator, StreamMode};
pub use fasta::{read_reference, render_fasta, write_fasta, DEFAULT_LINE_WIDTH};
pub use reference::{Chromosome, ReferenceError, ReferenceGenome};
pub use sampler::{ConsensusSampler, Placement, SamplerError, DEFAULT_MAX_REJECTIONS};
pub use sequence::SequenceBuilder;
pub use types::{ConsensusRecord, Genotype, GenotypeRecord, MISSING_CALL};
pub use variant_store::{
    ChromosomeVariants, SampleId, SiteAlleles, VariantStore, VariantStoreBuilder,
    VariantStoreError, VariantStoreStats,
};
pub use vcf::{read_sample_list, VcfError, VcfReader};
