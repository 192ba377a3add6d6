use std::sync::Arc;

/// Missing-call placeholder used in VCF genotype fields.
pub const MISSING_CALL: char = '.';

/// Index of the (single) alternate allele in a genotype token.
const ALT_INDEX: &str = "1";

/// Genotype record tokenized from a single VCF data line.
///
/// Fields are kept as the raw column text; interpretation (allele-frequency
/// filtering, genotype decoding) happens when the record is folded into a
/// [`VariantStore`](crate::genomics::VariantStore).
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeRecord {
    /// Source line number (1-based) for error reporting.
    pub line: usize,
    /// Chromosome/contig name.
    pub chrom: Arc<str>,
    /// 1-based position as written in the input.
    pub position: u64,
    /// Reference allele column.
    pub reference: String,
    /// Alternate allele column (may list several alleles separated by `,`).
    pub alternate: String,
    /// INFO column.
    pub info: String,
    /// FORMAT keys in declared order.
    pub format: Vec<String>,
    /// Per-sample columns, aligned with the sample list.
    pub samples: Vec<String>,
}

impl GenotypeRecord {
    /// Zero-based position of the record.
    pub fn zero_based(&self) -> u64 {
        self.position - 1
    }

    /// Whether the ALT column lists more than one allele.
    pub fn is_multiallelic(&self) -> bool {
        self.alternate.contains(',')
    }

    /// Raw value of the `AF` tag, if present in the INFO column.
    pub fn allele_frequency_tag(&self) -> Option<&str> {
        self.info
            .split(';')
            .find_map(|entry| entry.strip_prefix("AF="))
    }

    /// Genotype token for the sample column at `index`, using the declared
    /// FORMAT order. Returns `None` when the FORMAT has no `GT` key or the
    /// sample column is truncated before it.
    pub fn genotype_token(&self, index: usize) -> Option<&str> {
        let gt_slot = self.format.iter().position(|key| key == "GT")?;
        self.samples.get(index)?.split(':').nth(gt_slot)
    }
}

/// Interpretation of a genotype token.
///
/// Phase is not modelled: `0|1` and `0/1` decode identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genotype {
    /// At least one copy of the alternate allele.
    CarriesAlternate,
    /// Only reference (or other non-alternate) indices.
    NoAlternate,
    /// Token contains a missing-call marker.
    Missing,
}

impl Genotype {
    /// Decode a `GT` token such as `0/1`, `1|1`, `./.` or haploid `1`.
    pub fn from_token(token: &str) -> Self {
        if token.contains(MISSING_CALL) {
            return Genotype::Missing;
        }
        if token
            .split(['/', '|'])
            .any(|index| index == ALT_INDEX)
        {
            Genotype::CarriesAlternate
        } else {
            Genotype::NoAlternate
        }
    }
}

/// Consensus window emitted for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusRecord {
    /// Sample identifier.
    pub sample: Arc<str>,
    /// Chromosome the window was cut from.
    pub chrom: Arc<str>,
    /// 0-based inclusive start.
    pub start: usize,
    /// 0-based exclusive end.
    pub end: usize,
    /// Window sequence with the sample's alleles substituted.
    pub sequence: Vec<u8>,
}

impl ConsensusRecord {
    /// Window length in bases.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// FASTA header text without the leading `>`.
    pub fn header(&self) -> String {
        format!("{}_{}:{}-{}", self.sample, self.chrom, self.start, self.end)
    }
}
