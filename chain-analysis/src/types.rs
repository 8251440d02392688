//! Core types for the chain analysis library
//!
//! This module defines the catalog model (chains and their provenance), the
//! events parsed from a trace log, and the per-chain timing results. The
//! library only reads catalogs and logs - it never mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// A call chain: a recurring, ordered cycle of callback invocations
///
/// Field names on the wire follow the catalog file contract (`ID`, `Prio`,
/// `Path`, ...). The generation provenance is carried as an opaque block and
/// flattened into the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    /// Unique chain identifier
    #[serde(rename = "ID")]
    pub id: u32,
    /// Scheduling priority (not used by the analysis)
    #[serde(rename = "Prio")]
    pub prio: i32,
    /// Callback IDs making up one cycle of the chain
    #[serde(rename = "Path")]
    pub path: Vec<u32>,
    /// Period of the chain timer (microseconds)
    #[serde(rename = "Period_us")]
    pub period_us: u64,
    /// Chain specific utilisation
    #[serde(rename = "Utilisation")]
    pub utilisation: f64,
    /// How this chain was generated
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl Chain {
    /// Number of callbacks in one cycle
    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Check that the chain can be analyzed
    ///
    /// A chain with an empty path has no cycle and is a configuration error.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(AnalysisError::Config(format!(
                "chain {} has an empty path",
                self.id
            )));
        }
        Ok(())
    }
}

/// Generation settings recorded alongside each chain
///
/// Passed through unmodified; nothing in the analysis reads these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Seed used when generating the chain
    #[serde(rename = "Random_seed")]
    pub random_seed: i64,
    /// Whether the chain runs on the PPE
    #[serde(rename = "PPE")]
    pub ppe: bool,
    /// Average chain length used by the generator
    #[serde(rename = "Avg_len")]
    pub avg_len: u32,
    /// Merge probability used by the generator
    #[serde(rename = "Merge_p")]
    pub merge_p: f64,
    /// Sync probability used by the generator
    #[serde(rename = "Sync_p")]
    pub sync_p: f64,
    /// Variance in chain length used by the generator
    #[serde(rename = "Variance")]
    pub variance: f64,
    /// Executor count (capacity-testing catalogs only)
    #[serde(
        rename = "Executors",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub executors: Option<u32>,
}

/// A single callback execution parsed from one log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Executor the callback ran on
    pub executor: u32,
    /// Chain the event belongs to (may not exist in the catalog)
    pub chain: u32,
    /// Callback that ran; absent in per-event measurement logs
    pub callback: Option<u32>,
    /// Start timestamp (microseconds)
    pub start_us: i64,
    /// Execution time (microseconds, never negative)
    pub duration_us: i64,
}

impl Event {
    /// Completion timestamp (microseconds)
    pub fn end_us(&self) -> i64 {
        self.start_us.saturating_add(self.duration_us)
    }
}

/// Timing statistics for one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainResult {
    /// The chain identifier
    #[serde(rename = "ID")]
    pub id: u32,
    /// Best case response time (microseconds)
    #[serde(rename = "BCRT_us")]
    pub bcrt_us: i64,
    /// Average case response time (microseconds)
    #[serde(rename = "ACRT_us")]
    pub acrt_us: i64,
    /// Worst case response time (microseconds)
    #[serde(rename = "WCRT_us")]
    pub wcrt_us: i64,
}

/// Errors that can occur while loading inputs or analyzing chains
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Unable to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse chain catalog: {0}")]
    Catalog(String),

    #[error("Line {source_name}:{line} could not be parsed: {reason}")]
    LogFormat {
        source_name: String,
        /// 1-based line number
        line: usize,
        reason: LineError,
    },

    #[error("Invalid chain configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Missing, unreadable or unwritable file
    pub fn is_io_error(&self) -> bool {
        matches!(self, AnalysisError::Io { .. })
    }

    /// Catalog schema mismatch or log grammar violation
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::Catalog(_) | AnalysisError::LogFormat { .. }
        )
    }

    /// Degenerate chain definition
    pub fn is_config_error(&self) -> bool {
        matches!(self, AnalysisError::Config(_))
    }

    /// Line number for log format errors
    pub fn line(&self) -> Option<usize> {
        match self {
            AnalysisError::LogFormat { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Reasons a single log line is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("line longer than {limit} bytes, too long for parser")]
    TooLong { limit: usize },

    #[error("opening delimiter '{{' not found")]
    DelimiterNotFound,

    #[error("expected {expected} but found {found}")]
    Expected { expected: String, found: String },

    #[error("field '{field}' is not a valid integer: {text:?}")]
    InvalidInteger { field: &'static str, text: String },

    #[error("field 'duration' must not be negative (got {0})")]
    NegativeDuration(i64),

    #[error("unexpected input after closing '}}': {0}")]
    TrailingInput(String),

    #[error("event payload is not valid UTF-8")]
    Encoding,
}

/// Render a callback path as `{1,2,3}`
pub fn format_path(path: &[u32]) -> String {
    let inner: Vec<String> = path.iter().map(|cb| cb.to_string()).collect();
    format!("{{{}}}", inner.join(","))
}

impl fmt::Display for ChainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chain {}: BCRT={}us ACRT={}us WCRT={}us",
            self.id, self.bcrt_us, self.acrt_us, self.wcrt_us
        )
    }
}
