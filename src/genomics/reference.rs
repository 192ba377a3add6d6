use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while assembling a reference genome.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The same chromosome name appeared twice.
    #[error("duplicate chromosome '{0}' in reference")]
    DuplicateChromosome(String),
    /// Sequence data found before any `>` header.
    #[error("sequence data before the first header on line {0}")]
    MissingHeader(usize),
    /// A `>` header without a name.
    #[error("empty chromosome name on line {0}")]
    EmptyName(usize),
    /// Underlying read failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named reference sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    /// Chromosome identifier (first token of the FASTA header).
    pub name: Arc<str>,
    /// Upper-case nucleotide sequence.
    pub sequence: Arc<[u8]>,
}

impl Chromosome {
    /// Sequence length in bases.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Immutable, insertion-ordered map from chromosome name to sequence.
///
/// Iteration order is the order chromosomes were added (FASTA order), which
/// fixes the order consensus windows are generated in.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGenome {
    chromosomes: Vec<Chromosome>,
    index: HashMap<Arc<str>, usize>,
}

impl ReferenceGenome {
    /// Build a genome from `(name, sequence)` pairs. Sequences are upper-cased.
    pub fn from_sequences<I, N, S>(entries: I) -> Result<Self, ReferenceError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<Arc<str>>,
        S: AsRef<[u8]>,
    {
        let mut genome = Self::default();
        for (name, sequence) in entries {
            genome.push(name.into(), sequence.as_ref())?;
        }
        Ok(genome)
    }

    pub(crate) fn push(&mut self, name: Arc<str>, sequence: &[u8]) -> Result<(), ReferenceError> {
        if self.index.contains_key(&name) {
            return Err(ReferenceError::DuplicateChromosome(name.to_string()));
        }
        let sequence: Arc<[u8]> = Arc::from(sequence.to_ascii_uppercase().into_boxed_slice());
        self.index.insert(Arc::clone(&name), self.chromosomes.len());
        self.chromosomes.push(Chromosome { name, sequence });
        Ok(())
    }

    /// Look up a chromosome by name.
    pub fn get(&self, name: &str) -> Option<&Chromosome> {
        self.index.get(name).map(|&idx| &self.chromosomes[idx])
    }

    /// Chromosomes in reference order.
    pub fn iter(&self) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes.iter()
    }

    /// Number of chromosomes.
    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    /// Whether the genome holds no chromosomes.
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Total number of bases across all chromosomes.
    pub fn total_bases(&self) -> usize {
        self.chromosomes.iter().map(Chromosome::len).sum()
    }
}
