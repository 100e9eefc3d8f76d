//! Solve options for KHE time assignment.
//!
//! Options control which repair moves are used, whether node regularity is
//! sought, whether runarounds are built, and how many solutions are tried in
//! parallel. They load from TOML or YAML so that runs can be tuned without
//! code changes.
//!
//! # Examples
//!
//! ```
//! use khe_config::{SolveOptions, ThreadCount};
//!
//! let options = SolveOptions::from_toml_str(r#"
//!     kempe_moves = false
//!     ejecting_not_basic = true
//!     attempts = 8
//!     thread_count = { specific = 4 }
//! "#).unwrap();
//!
//! assert!(!options.kempe_moves);
//! assert_eq!(options.attempts, 8);
//! assert_eq!(options.thread_count, ThreadCount::Specific(4));
//! // unspecified fields keep their defaults
//! assert!(options.time_node_regularity);
//! ```
//!
//! Use default options when the file is missing:
//!
//! ```
//! use khe_config::SolveOptions;
//!
//! let options = SolveOptions::load("khe.toml").unwrap_or_default();
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which meet move the layer repair uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairMove {
    Kempe,
    Ejecting,
    Basic,
}

/// Options for time assignment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolveOptions {
    /// Seek node regularity: assign the first layer in parallel with
    /// already-assigned nodes and reject moves that increase irregularity.
    pub time_node_regularity: bool,

    /// Repair each layer after assigning it.
    pub time_layer_repair: bool,

    /// Repair under a vizier node.
    pub ejector_vizier_node: bool,

    /// When Kempe moves are off, eject competitors rather than making
    /// plain moves.
    pub ejecting_not_basic: bool,

    /// Use Kempe meet moves during repair.
    pub kempe_moves: bool,

    /// Let the diversifier break ties when ordering layers.
    pub diversify: bool,

    /// Build runarounds before layered assignment.
    pub time_runarounds: bool,

    /// Maximum number of improving passes per repair.
    pub repair_max_passes: usize,

    /// Worker threads for parallel solve.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub thread_count: ThreadCount,

    /// Number of solutions to build.
    pub attempts: usize,

    /// Number of best solutions to keep.
    pub keep_best: usize,

    /// Diversifier of the first attempt; attempt `i` uses `diversifier + i`.
    pub diversifier: u32,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_node_regularity: true,
            time_layer_repair: true,
            ejector_vizier_node: false,
            ejecting_not_basic: false,
            kempe_moves: true,
            diversify: true,
            time_runarounds: true,
            repair_max_passes: 3,
            thread_count: ThreadCount::Auto,
            attempts: 1,
            keep_best: 1,
            diversifier: 0,
        }
    }
}

impl SolveOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, contains invalid TOML, or
    /// fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads options from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses options from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(s)?;
        options.validate()
    }

    /// Loads options from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses options from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_yaml::from_str(s)?;
        options.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.attempts == 0 {
            return Err(ConfigError::Invalid("attempts must be at least 1".into()));
        }
        if self.keep_best == 0 || self.keep_best > self.attempts {
            return Err(ConfigError::Invalid(format!(
                "keep_best must lie in 1..={}, got {}",
                self.attempts, self.keep_best
            )));
        }
        if self.thread_count == ThreadCount::Specific(0) {
            return Err(ConfigError::Invalid("thread_count must be positive".into()));
        }
        Ok(self)
    }

    /// The move used by layer repair.
    pub fn repair_move(&self) -> RepairMove {
        if self.kempe_moves {
            RepairMove::Kempe
        } else if self.ejecting_not_basic {
            RepairMove::Ejecting
        } else {
            RepairMove::Basic
        }
    }

    pub fn with_node_regularity(mut self, on: bool) -> Self {
        self.time_node_regularity = on;
        self
    }

    pub fn with_layer_repair(mut self, on: bool) -> Self {
        self.time_layer_repair = on;
        self
    }

    pub fn with_vizier_node(mut self, on: bool) -> Self {
        self.ejector_vizier_node = on;
        self
    }

    pub fn with_ejecting_not_basic(mut self, on: bool) -> Self {
        self.ejecting_not_basic = on;
        self
    }

    pub fn with_kempe_moves(mut self, on: bool) -> Self {
        self.kempe_moves = on;
        self
    }

    pub fn with_diversify(mut self, on: bool) -> Self {
        self.diversify = on;
        self
    }

    pub fn with_runarounds(mut self, on: bool) -> Self {
        self.time_runarounds = on;
        self
    }

    pub fn with_repair_max_passes(mut self, passes: usize) -> Self {
        self.repair_max_passes = passes;
        self
    }

    pub fn with_thread_count(mut self, thread_count: ThreadCount) -> Self {
        self.thread_count = thread_count;
        self
    }

    /// Sets the number of attempts, keeping `keep_best` within range.
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self.keep_best = self.keep_best.min(self.attempts);
        self
    }

    pub fn with_keep_best(mut self, keep_best: usize) -> Self {
        self.keep_best = keep_best.clamp(1, self.attempts);
        self
    }

    pub fn with_diversifier(mut self, diversifier: u32) -> Self {
        self.diversifier = diversifier;
        self
    }
}

/// Thread count for parallel solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadCount {
    /// Available cores, but no more threads than attempts.
    #[default]
    Auto,
    /// All available cores.
    Unlimited,
    /// A specific number of threads, capped at the attempt count.
    Specific(usize),
}

impl ThreadCount {
    /// Resolves the thread count for `attempts` attempts.
    pub fn resolve(&self, attempts: usize) -> usize {
        let cpus = || {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        };
        match self {
            ThreadCount::Auto => cpus().min(attempts).max(1),
            ThreadCount::Unlimited => cpus(),
            ThreadCount::Specific(n) => (*n).min(attempts).max(1),
        }
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadCount::Auto => write!(f, "Auto"),
            ThreadCount::Unlimited => write!(f, "Unlimited"),
            ThreadCount::Specific(n) => write!(f, "{}", n),
        }
    }
}
