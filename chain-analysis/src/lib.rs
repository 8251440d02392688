//! Chain Analysis Library
//!
//! A stateless library computing best-, average- and worst-case end-to-end
//! response times of call chains from an offline event log.
//!
//! # Architecture
//!
//! The library covers the analysis core only:
//! - Loads and saves chain catalogs (JSON record arrays)
//! - Parses event logs into an ordered sequence of events
//! - Rebuilds chain cycles from per-callback events and measures them
//! - Reduces each chain's response times to BCRT/ACRT/WCRT
//!
//! The library does NOT:
//! - Generate chains
//! - Print or persist results
//! - Watch live logs
//!
//! Anomalies found during analysis (path mismatches, chains without a single
//! completed cycle) are reported through an injected [`DiagnosticSink`] and
//! never change the results. Presentation lives in the application layer
//! (chain-analysis-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use chain_analysis::{AnalysisConfig, Analyzer};
//! use std::path::Path;
//!
//! let config = AnalysisConfig::new().with_parallel(true);
//! let results = Analyzer::new(config)
//!     .analyze_files(Path::new("chains.json"), Path::new("trace.log"))
//!     .unwrap();
//!
//! for result in results {
//!     println!(
//!         "chain {}: {} / {} / {} us",
//!         result.id, result.bcrt_us, result.acrt_us, result.wcrt_us
//!     );
//! }
//! ```

// Public modules
pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod extractor;
pub mod log_parser;
pub mod stats;
pub mod types;

// Re-export main types for convenience
pub use analyzer::Analyzer;
pub use catalog::ChainColumns;
pub use config::{AnalysisConfig, ResponseTimeMode};
pub use diagnostics::{Diagnostic, DiagnosticSink, LogDiagnostics, RecordingDiagnostics};
pub use extractor::Extraction;
pub use log_parser::LogSchema;
pub use types::{
    format_path, AnalysisError, Chain, ChainResult, Event, LineError, Provenance, Result,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
