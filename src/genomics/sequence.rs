use std::sync::Arc;

use crate::genomics::{Chromosome, ConsensusRecord, SampleId, SamplerError, VariantStore};

/// Cuts reference windows and substitutes a sample's alleles into them.
///
/// Substitution is strictly positional and single-base: the output always has
/// exactly `end - start` bases.
#[derive(Debug, Clone, Copy)]
pub struct SequenceBuilder<'a> {
    variants: &'a VariantStore,
}

impl<'a> SequenceBuilder<'a> {
    /// Builder reading alleles from `variants`.
    pub fn new(variants: &'a VariantStore) -> Self {
        Self { variants }
    }

    /// Window `[start, end)` of `chromosome` with `sample`'s alleles applied.
    pub fn sequence(
        &self,
        chromosome: &Chromosome,
        start: usize,
        end: usize,
        sample: SampleId,
    ) -> Result<Vec<u8>, SamplerError> {
        if start > end || end > chromosome.len() {
            return Err(SamplerError::InvalidWindow {
                start,
                end,
                length: chromosome.len(),
            });
        }

        let mut sequence = chromosome.sequence[start..end].to_vec();
        if let Some(sites) = self.variants.chromosome(&chromosome.name) {
            for (pos, site) in sites.range(start as u64..end as u64) {
                if let Some(allele) = site.get(sample) {
                    sequence[pos as usize - start] = allele;
                }
            }
        }
        Ok(sequence)
    }

    /// Same as [`sequence`](Self::sequence), wrapped into a record.
    pub fn record(
        &self,
        chromosome: &Chromosome,
        start: usize,
        end: usize,
        sample_name: &Arc<str>,
        sample: SampleId,
    ) -> Result<ConsensusRecord, SamplerError> {
        let sequence = self.sequence(chromosome, start, end, sample)?;
        Ok(ConsensusRecord {
            sample: Arc::clone(sample_name),
            chrom: Arc::clone(&chromosome.name),
            start,
            end,
            sequence,
        })
    }
}
