//! Per-sample alternate alleles keyed by chromosome and position.
//!
//! The store is a three-level structure: chromosome → zero-based position →
//! sample → allele. Only bi-allelic single-base substitutions that pass the
//! allele-frequency filter and are carried by a sample's genotype are kept.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::genomics::{Genotype, GenotypeRecord};

/// Errors raised while building or querying a [`VariantStore`].
#[derive(Debug, Error)]
pub enum VariantStoreError {
    /// Structurally invalid genotype record.
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord {
        /// Source line number.
        line: usize,
        /// What was wrong with the record.
        reason: String,
    },
    /// The `AF` INFO tag is not a number.
    #[error("invalid allele frequency '{value}' on line {line}")]
    InvalidAlleleFrequency {
        /// Source line number.
        line: usize,
        /// Raw tag value.
        value: String,
    },
    /// A sample that is not part of the store's sample list was queried.
    #[error("sample '{0}' is not in the sample list")]
    UnknownSample(String),
}

impl VariantStoreError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

/// Index of a sample within the store's ordered sample list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleId(usize);

impl SampleId {
    /// Position in the sample list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Alleles recorded at a single site, sorted by sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteAlleles {
    alleles: Vec<(SampleId, u8)>,
}

impl SiteAlleles {
    /// Returns `true` when `sample` had no allele here before.
    fn insert(&mut self, sample: SampleId, allele: u8) -> bool {
        match self.alleles.binary_search_by_key(&sample, |&(id, _)| id) {
            Ok(slot) => {
                self.alleles[slot].1 = allele;
                false
            }
            Err(slot) => {
                self.alleles.insert(slot, (sample, allele));
                true
            }
        }
    }

    /// Allele carried by `sample` at this site.
    pub fn get(&self, sample: SampleId) -> Option<u8> {
        self.alleles
            .binary_search_by_key(&sample, |&(id, _)| id)
            .ok()
            .map(|slot| self.alleles[slot].1)
    }

    /// Number of samples carrying an allele here.
    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    /// Whether no sample carries an allele here.
    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }
}

/// Variant sites of one chromosome, ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromosomeVariants {
    sites: BTreeMap<u64, SiteAlleles>,
}

impl ChromosomeVariants {
    /// Sites whose zero-based position falls in `window`.
    pub fn range(&self, window: Range<u64>) -> impl Iterator<Item = (u64, &SiteAlleles)> {
        self.sites.range(window).map(|(&pos, site)| (pos, site))
    }

    /// Site at a zero-based position.
    pub fn site(&self, position: u64) -> Option<&SiteAlleles> {
        self.sites.get(&position)
    }

    /// Number of distinct sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the chromosome has no sites.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Counters describing how records were folded into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantStoreStats {
    /// Records examined.
    pub records: usize,
    /// Records dropped for listing several alternate alleles.
    pub multiallelic: usize,
    /// Records dropped by the allele-frequency filter.
    pub below_min_af: usize,
    /// Records dropped for not being single-base substitutions.
    pub not_snv: usize,
    /// Sample calls skipped for a missing-call marker.
    pub missing_calls: usize,
    /// Distinct (position, sample) entries stored; overwrites are not counted.
    pub entries: usize,
}

/// Three-level variant map: chromosome → position → sample → allele.
#[derive(Debug, Clone, Default)]
pub struct VariantStore {
    samples: Vec<Arc<str>>,
    sample_index: HashMap<Arc<str>, SampleId>,
    chromosomes: HashMap<Arc<str>, ChromosomeVariants>,
}

impl VariantStore {
    /// Create an empty store over an ordered sample list.
    pub fn new<I, S>(samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let samples: Vec<Arc<str>> = samples.into_iter().map(Into::into).collect();
        let sample_index = samples
            .iter()
            .enumerate()
            .map(|(idx, name)| (Arc::clone(name), SampleId(idx)))
            .collect();
        Self {
            samples,
            sample_index,
            chromosomes: HashMap::new(),
        }
    }

    /// Build a store from tokenized records.
    ///
    /// Fails on the first malformed record or unparsable allele frequency;
    /// a partially built store is never returned.
    pub fn build<I, S, R>(
        samples: I,
        records: R,
        min_af: f64,
    ) -> Result<(Self, VariantStoreStats), VariantStoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
        R: IntoIterator<Item = GenotypeRecord>,
    {
        let mut builder = VariantStoreBuilder::new(Self::new(samples), min_af);
        for record in records {
            builder.add(&record)?;
        }
        Ok(builder.finish())
    }

    /// Ordered sample list.
    pub fn samples(&self) -> &[Arc<str>] {
        &self.samples
    }

    /// Resolve a sample name to its id.
    pub fn sample_id(&self, name: &str) -> Result<SampleId, VariantStoreError> {
        self.sample_index
            .get(name)
            .copied()
            .ok_or_else(|| VariantStoreError::UnknownSample(name.to_string()))
    }

    /// Variant sites of a chromosome, if any were recorded.
    pub fn chromosome(&self, chrom: &str) -> Option<&ChromosomeVariants> {
        self.chromosomes.get(chrom)
    }

    /// Allele recorded for `sample` at a zero-based position.
    pub fn get(&self, chrom: &str, position: u64, sample: SampleId) -> Option<u8> {
        self.chromosome(chrom)?.site(position)?.get(sample)
    }

    /// Total number of (chromosome, position, sample) entries.
    pub fn len(&self) -> usize {
        self.chromosomes
            .values()
            .flat_map(|chrom| chrom.sites.values())
            .map(SiteAlleles::len)
            .sum()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, chrom: &Arc<str>, position: u64, sample: SampleId, allele: u8) -> bool {
        self.chromosomes
            .entry(Arc::clone(chrom))
            .or_default()
            .sites
            .entry(position)
            .or_default()
            .insert(sample, allele)
    }
}

/// Incremental construction of a [`VariantStore`].
#[derive(Debug)]
pub struct VariantStoreBuilder {
    store: VariantStore,
    min_af: f64,
    stats: VariantStoreStats,
}

impl VariantStoreBuilder {
    /// Start from an empty store with a minimum allele frequency.
    pub fn new(store: VariantStore, min_af: f64) -> Self {
        Self {
            store,
            min_af,
            stats: VariantStoreStats::default(),
        }
    }

    /// Fold one record into the store.
    pub fn add(&mut self, record: &GenotypeRecord) -> Result<(), VariantStoreError> {
        self.stats.records += 1;

        if record.position == 0 {
            return Err(VariantStoreError::malformed(
                record.line,
                "position must be 1-based",
            ));
        }
        if record.samples.len() != self.store.samples.len() {
            return Err(VariantStoreError::malformed(
                record.line,
                format!(
                    "expected {} sample columns, found {}",
                    self.store.samples.len(),
                    record.samples.len()
                ),
            ));
        }

        if record.is_multiallelic() {
            trace!(line = record.line, alt = %record.alternate, "skipping multi-allelic record");
            self.stats.multiallelic += 1;
            return Ok(());
        }

        if let Some(raw) = record.allele_frequency_tag() {
            let af: f64 = raw
                .parse()
                .map_err(|_| VariantStoreError::InvalidAlleleFrequency {
                    line: record.line,
                    value: raw.to_string(),
                })?;
            if af.is_nan() {
                return Err(VariantStoreError::InvalidAlleleFrequency {
                    line: record.line,
                    value: raw.to_string(),
                });
            }
            if af < self.min_af {
                self.stats.below_min_af += 1;
                return Ok(());
            }
        }

        let (Some(_), Some(allele)) = (single_base(&record.reference), single_base(&record.alternate))
        else {
            debug!(
                line = record.line,
                reference = %record.reference,
                alt = %record.alternate,
                "skipping record that is not a single-base substitution"
            );
            self.stats.not_snv += 1;
            return Ok(());
        };

        let position = record.zero_based();
        for idx in 0..self.store.samples.len() {
            let Some(token) = record.genotype_token(idx) else {
                continue;
            };
            match Genotype::from_token(token) {
                Genotype::CarriesAlternate => {
                    if self.store.insert(&record.chrom, position, SampleId(idx), allele) {
                        self.stats.entries += 1;
                    }
                }
                Genotype::Missing => self.stats.missing_calls += 1,
                Genotype::NoAlternate => {}
            }
        }
        Ok(())
    }

    /// Finish construction.
    pub fn finish(self) -> (VariantStore, VariantStoreStats) {
        let stats = self.stats;
        info!(
            records = stats.records,
            entries = stats.entries,
            multiallelic = stats.multiallelic,
            below_min_af = stats.below_min_af,
            not_snv = stats.not_snv,
            missing_calls = stats.missing_calls,
            "variant store built"
        );
        (self.store, stats)
    }
}

fn single_base(allele: &str) -> Option<u8> {
    match allele.as_bytes() {
        [base] if base.is_ascii_alphabetic() => Some(base.to_ascii_uppercase()),
        _ => None,
    }
}
