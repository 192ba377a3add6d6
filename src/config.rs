//! # Run configuration
//!
//! Settings come from two layers: an optional JSON file (`config.json` by
//! default) and command-line overrides. Overrides win key by key, defaults
//! fill whatever neither layer sets, and the merged result is validated into
//! [`Settings`] before anything is read from disk.
//!
//! ```json
//! {
//!   "vcf": "calls.vcf",
//!   "fasta": "ref.fa",
//!   "output": "out/consensus",
//!   "consensus_length": 500,
//!   "consensus_count": 10,
//!   "random_start": true,
//!   "max_overlap": 100,
//!   "seed": 37
//! }
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genomics::{ConsensusSampler, StreamMode, DEFAULT_LINE_WIDTH, DEFAULT_MAX_REJECTIONS};

/// Config file looked up when none is given explicitly.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Minimum allele frequency unless configured.
pub const DEFAULT_MIN_AF: f64 = 0.05;
/// Seed unless configured.
pub const DEFAULT_SEED: u64 = 37;
/// Run log directory unless configured.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`RunConfig`].
    #[error("invalid JSON config {path}: {source}")]
    Parse {
        /// File path (or `<inline>`).
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// A required key is set in neither layer.
    #[error("missing required setting '{0}'")]
    Missing(&'static str),
    /// A key holds an unusable value.
    #[error("invalid setting '{key}': {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// One configuration layer; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Input VCF.
    pub vcf: Option<PathBuf>,
    /// Reference FASTA.
    pub fasta: Option<PathBuf>,
    /// Output prefix; `.fa` is appended.
    pub output: Option<PathBuf>,
    /// Window length in bases.
    pub consensus_length: Option<usize>,
    /// Windows per (sample, chromosome).
    pub consensus_count: Option<usize>,
    /// Minimum allele frequency.
    pub min_af: Option<f64>,
    /// Tiling stride.
    pub start_step: Option<usize>,
    /// Random placement instead of tiling.
    pub random_start: Option<bool>,
    /// Maximum pairwise overlap of random windows.
    pub max_overlap: Option<usize>,
    /// Sample allow-list file.
    pub sample_list: Option<PathBuf>,
    /// Run seed.
    pub seed: Option<u64>,
    /// FASTA line width (0 disables wrapping).
    pub line_width: Option<usize>,
    /// Random stream mode.
    pub stream: Option<StreamMode>,
    /// Worker threads for per-pair generation.
    pub threads: Option<usize>,
    /// Rejected-draw budget per (sample, chromosome) batch.
    pub max_rejections: Option<usize>,
    /// Directory for timestamped run logs.
    pub log_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, else the default file if it exists, else an
    /// empty layer. A missing explicit file is an error.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Overlay `overrides` on top of `self`.
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            vcf: overrides.vcf.or(self.vcf),
            fasta: overrides.fasta.or(self.fasta),
            output: overrides.output.or(self.output),
            consensus_length: overrides.consensus_length.or(self.consensus_length),
            consensus_count: overrides.consensus_count.or(self.consensus_count),
            min_af: overrides.min_af.or(self.min_af),
            start_step: overrides.start_step.or(self.start_step),
            random_start: overrides.random_start.or(self.random_start),
            max_overlap: overrides.max_overlap.or(self.max_overlap),
            sample_list: overrides.sample_list.or(self.sample_list),
            seed: overrides.seed.or(self.seed),
            line_width: overrides.line_width.or(self.line_width),
            stream: overrides.stream.or(self.stream),
            threads: overrides.threads.or(self.threads),
            max_rejections: overrides.max_rejections.or(self.max_rejections),
            log_dir: overrides.log_dir.or(self.log_dir),
        }
    }

    /// Apply defaults and validate.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let params = ConsensusParams {
            consensus_length: self
                .consensus_length
                .ok_or(ConfigError::Missing("consensus_length"))?,
            consensus_count: self
                .consensus_count
                .ok_or(ConfigError::Missing("consensus_count"))?,
            start_step: self.start_step.unwrap_or(1),
            random_start: self.random_start.unwrap_or(false),
            max_overlap: self.max_overlap,
            min_af: self.min_af.unwrap_or(DEFAULT_MIN_AF),
            seed: self.seed.unwrap_or(DEFAULT_SEED),
            stream: self.stream.unwrap_or_default(),
            max_rejections: self.max_rejections.unwrap_or(DEFAULT_MAX_REJECTIONS),
        };
        params.validate()?;

        if self.threads == Some(0) {
            return Err(invalid("threads", "must be at least 1"));
        }

        Ok(Settings {
            vcf: self.vcf.ok_or(ConfigError::Missing("vcf"))?,
            fasta: self.fasta.ok_or(ConfigError::Missing("fasta"))?,
            output: self.output.ok_or(ConfigError::Missing("output"))?,
            sample_list: self.sample_list,
            line_width: self.line_width.unwrap_or(DEFAULT_LINE_WIDTH),
            threads: self.threads,
            log_dir: self
                .log_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            params,
        })
    }
}

/// Parameters of the consensus engine itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusParams {
    /// Window length.
    pub consensus_length: usize,
    /// Windows per (sample, chromosome).
    pub consensus_count: usize,
    /// Tiling stride.
    pub start_step: usize,
    /// Random placement instead of tiling.
    pub random_start: bool,
    /// Maximum pairwise overlap of random windows.
    pub max_overlap: Option<usize>,
    /// Minimum allele frequency.
    pub min_af: f64,
    /// Run seed.
    pub seed: u64,
    /// Random stream mode.
    pub stream: StreamMode,
    /// Rejected-draw budget per batch.
    pub max_rejections: usize,
}

impl ConsensusParams {
    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.consensus_length == 0 {
            return Err(invalid("consensus_length", "must be positive"));
        }
        if self.consensus_count == 0 {
            return Err(invalid("consensus_count", "must be positive"));
        }
        if self.start_step == 0 {
            return Err(invalid("start_step", "must be positive"));
        }
        if let Some(overlap) = self.max_overlap {
            if overlap > self.consensus_length {
                return Err(invalid(
                    "max_overlap",
                    format!(
                        "{overlap} exceeds consensus_length {}",
                        self.consensus_length
                    ),
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.min_af) {
            return Err(invalid(
                "min_af",
                format!("{} is not a frequency in [0, 1]", self.min_af),
            ));
        }
        Ok(())
    }

    /// Window sampler for these parameters.
    pub fn sampler(&self) -> ConsensusSampler {
        let sampler = if self.random_start {
            ConsensusSampler::random(self.consensus_length, self.consensus_count, self.max_overlap)
        } else {
            ConsensusSampler::tiled(self.consensus_length, self.consensus_count, self.start_step)
        };
        sampler.with_max_rejections(self.max_rejections)
    }
}

/// Fully resolved run settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Input VCF.
    pub vcf: PathBuf,
    /// Reference FASTA.
    pub fasta: PathBuf,
    /// Output prefix.
    pub output: PathBuf,
    /// Sample allow-list file.
    pub sample_list: Option<PathBuf>,
    /// FASTA line width.
    pub line_width: usize,
    /// Worker threads.
    pub threads: Option<usize>,
    /// Directory receiving the timestamped run log.
    pub log_dir: PathBuf,
    /// Engine parameters.
    pub params: ConsensusParams,
}

impl Settings {
    /// Output FASTA path: the prefix with `.fa` appended.
    pub fn output_path(&self) -> PathBuf {
        let mut path = OsString::from(self.output.as_os_str());
        path.push(".fa");
        PathBuf::from(path)
    }
}
