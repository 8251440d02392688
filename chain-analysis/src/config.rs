//! Analysis configuration types
//!
//! This module defines the small set of knobs the analysis needs. Everything
//! about where inputs come from or how results are printed belongs to the
//! application layer.

use serde::{Deserialize, Serialize};

/// Default bound on a single log line, in bytes
pub const DEFAULT_MAX_LINE_LEN: usize = 4096;

/// How response times are derived from the event log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseTimeMode {
    /// Rebuild cycles by matching per-callback events against the chain path
    #[default]
    PathMatching,
    /// Every event is already one end-to-end measurement (duration is the response time)
    PerEvent,
}

/// Configuration for an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Longest accepted log line in bytes (excluding the newline)
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,

    /// Response-time strategy, keyed to the log producer's event schema
    #[serde(default)]
    pub mode: ResponseTimeMode,

    /// Analyze chains on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,

    /// Optional: only analyze these chain IDs
    #[serde(default)]
    pub chain_filter: Option<Vec<u32>>,
}

fn default_max_line_len() -> usize {
    DEFAULT_MAX_LINE_LEN
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            mode: ResponseTimeMode::default(),
            parallel: false,
            chain_filter: None,
        }
    }
}

impl AnalysisConfig {
    /// Create a new analysis configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the per-line length bound
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Builder method: set the response-time mode
    pub fn with_mode(mut self, mode: ResponseTimeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method: enable or disable per-chain parallelism
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Builder method: set chain filter
    pub fn with_chain_filter(mut self, chains: Vec<u32>) -> Self {
        self.chain_filter = Some(chains);
        self
    }

    /// Check if a chain should be analyzed
    pub fn should_analyze(&self, chain_id: u32) -> bool {
        match &self.chain_filter {
            Some(chains) => chains.contains(&chain_id),
            None => true,
        }
    }
}
