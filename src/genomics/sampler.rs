//! Window placement along a chromosome.
//!
//! Tiled placement walks from offset 0 with a fixed stride. Random placement
//! draws offsets from a caller-supplied stream and rejects candidates that
//! overlap an accepted window by more than `max_overlap` bases.

use rand::Rng;
use thiserror::Error;
use tracing::trace;

/// Rejected draws tolerated per (sample, chromosome) batch by default.
pub const DEFAULT_MAX_REJECTIONS: usize = 100_000;

/// Errors raised while placing windows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SamplerError {
    /// The window does not fit on the chromosome.
    #[error("window {start}-{end} exceeds chromosome length {length}")]
    InvalidWindow {
        /// Window start (inclusive).
        start: usize,
        /// Window end (exclusive).
        end: usize,
        /// Chromosome length.
        length: usize,
    },
    /// The requested count cannot be placed under the overlap bound.
    #[error(
        "cannot place {requested} windows of length {window} with max overlap {max_overlap:?} \
         on {length} bases ({accepted} accepted, {rejections} draws rejected)"
    )]
    UnsatisfiableSampling {
        /// Windows requested.
        requested: usize,
        /// Windows accepted before giving up.
        accepted: usize,
        /// Window length.
        window: usize,
        /// Chromosome length.
        length: usize,
        /// Overlap bound in force.
        max_overlap: Option<usize>,
        /// Draws rejected before giving up.
        rejections: usize,
    },
}

/// How window starts are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Deterministic starts `0, step, 2 * step, ...`.
    Tiled {
        /// Stride between consecutive starts.
        step: usize,
    },
    /// Uniform random starts with an optional pairwise overlap bound.
    Random {
        /// Maximum overlap in bases between two accepted windows.
        max_overlap: Option<usize>,
    },
}

/// Produces window start offsets for one (sample, chromosome) batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusSampler {
    window: usize,
    count: usize,
    placement: Placement,
    max_rejections: usize,
}

impl ConsensusSampler {
    /// Sampler with an explicit placement.
    pub fn new(window: usize, count: usize, placement: Placement) -> Self {
        Self {
            window,
            count,
            placement,
            max_rejections: DEFAULT_MAX_REJECTIONS,
        }
    }

    /// Tiled placement with the given stride.
    pub fn tiled(window: usize, count: usize, step: usize) -> Self {
        Self::new(window, count, Placement::Tiled { step })
    }

    /// Random placement with an optional overlap bound.
    pub fn random(window: usize, count: usize, max_overlap: Option<usize>) -> Self {
        Self::new(window, count, Placement::Random { max_overlap })
    }

    /// Override the rejected-draw budget.
    pub fn with_max_rejections(mut self, max_rejections: usize) -> Self {
        self.max_rejections = max_rejections;
        self
    }

    /// Window length.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Windows requested per batch.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Placement mode.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Whether starts are drawn from the random stream.
    pub fn is_random(&self) -> bool {
        matches!(self.placement, Placement::Random { .. })
    }

    /// Start offsets for a chromosome of `length` bases.
    ///
    /// Tiled placement never touches `rng`. Random placement advances it once
    /// per candidate drawn, accepted or not.
    pub fn starts<R: Rng>(
        &self,
        length: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, SamplerError> {
        match self.placement {
            Placement::Tiled { step } => Ok(self.tiled_starts(length, step)),
            Placement::Random { max_overlap } => self.random_starts(length, max_overlap, rng),
        }
    }

    fn tiled_starts(&self, length: usize, step: usize) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.count.min(length / step.max(1) + 1));
        let mut pos = 0usize;
        while starts.len() < self.count && pos + self.window <= length {
            starts.push(pos);
            pos = match pos.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }
        starts
    }

    fn random_starts<R: Rng>(
        &self,
        length: usize,
        max_overlap: Option<usize>,
        rng: &mut R,
    ) -> Result<Vec<usize>, SamplerError> {
        if self.window > length {
            return Err(SamplerError::InvalidWindow {
                start: 0,
                end: self.window,
                length,
            });
        }
        let last_start = length - self.window;
        let spacing = max_overlap
            .map(|overlap| self.window.saturating_sub(overlap))
            .unwrap_or(0);

        let unsatisfiable = |accepted: usize, rejections: usize| SamplerError::UnsatisfiableSampling {
            requested: self.count,
            accepted,
            window: self.window,
            length,
            max_overlap,
            rejections,
        };

        // At most last_start / spacing + 1 starts can be pairwise `spacing` apart.
        if spacing > 0 && self.count > last_start / spacing + 1 {
            return Err(unsatisfiable(0, 0));
        }

        let mut starts: Vec<usize> = Vec::with_capacity(self.count);
        let mut rejections = 0usize;
        while starts.len() < self.count {
            let candidate = rng.random_range(0..=last_start);
            if starts.iter().all(|&s| candidate.abs_diff(s) >= spacing) {
                starts.push(candidate);
                continue;
            }
            rejections += 1;
            trace!(candidate, rejections, "rejected overlapping window start");
            if rejections >= self.max_rejections {
                return Err(unsatisfiable(starts.len(), rejections));
            }
        }
        Ok(starts)
    }
}
