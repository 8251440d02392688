//! Analysis diagnostics
//!
//! Path mismatches, event counts and chains without completed cycles are not
//! errors. They are reported through a [`DiagnosticSink`] handed to the
//! analyzer and never affect the computed results.

use std::fmt;
use std::sync::Mutex;

/// A non-fatal observation made while analyzing chains
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Number of log events that belong to a catalog chain
    ChainEvents { chain: u32, events: usize },
    /// Events whose callback differed from the one the path expected
    PathMismatch {
        chain: u32,
        mismatches: usize,
        events: usize,
    },
    /// The chain completed no cycle, so no result was produced
    NoResponseTimes { chain: u32 },
    /// Log events referencing a chain ID the catalog does not contain
    UnknownChainEvents { chain: u32, events: usize },
}

impl Diagnostic {
    /// Chain this diagnostic refers to
    pub fn chain(&self) -> u32 {
        match self {
            Diagnostic::ChainEvents { chain, .. }
            | Diagnostic::PathMismatch { chain, .. }
            | Diagnostic::NoResponseTimes { chain }
            | Diagnostic::UnknownChainEvents { chain, .. } => *chain,
        }
    }

    /// Whether an operator should look at this
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::PathMismatch { .. } | Diagnostic::NoResponseTimes { .. }
        )
    }

    /// Fraction of events that did not match the path (mismatch diagnostics only)
    pub fn mismatch_ratio(&self) -> Option<f64> {
        match self {
            Diagnostic::PathMismatch { events: 0, .. } => Some(0.0),
            Diagnostic::PathMismatch {
                mismatches, events, ..
            } => Some(*mismatches as f64 / *events as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ChainEvents { chain, events } => {
                write!(f, "Analyzing chain {} ({} events)", chain, events)
            }
            Diagnostic::PathMismatch {
                chain,
                mismatches,
                events,
            } => write!(
                f,
                "Chain {}: {}/{} events did not occur as expected ({:.1}%)",
                chain,
                mismatches,
                events,
                self.mismatch_ratio().unwrap_or(0.0) * 100.0
            ),
            Diagnostic::NoResponseTimes { chain } => {
                write!(f, "No response times computed for chain {}", chain)
            }
            Diagnostic::UnknownChainEvents { chain, events } => write!(
                f,
                "{} events reference chain {} which is not in the catalog",
                events, chain
            ),
        }
    }
}

/// Destination for analysis diagnostics
///
/// Implementations must be thread-safe: chains may be analyzed in parallel.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.is_warning() {
            log::warn!("{}", diagnostic);
        } else {
            log::info!("{}", diagnostic);
        }
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far, in report order
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Diagnostics reported for one chain
    pub fn for_chain(&self, chain: u32) -> Vec<Diagnostic> {
        self.snapshot()
            .into_iter()
            .filter(|d| d.chain() == chain)
            .collect()
    }

    pub fn warnings(&self) -> usize {
        self.snapshot().iter().filter(|d| d.is_warning()).count()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_ratio() {
        let d = Diagnostic::PathMismatch {
            chain: 2,
            mismatches: 1,
            events: 4,
        };
        assert_eq!(d.mismatch_ratio(), Some(0.25));
        assert!(d.is_warning());
        assert_eq!(d.to_string(), "Chain 2: 1/4 events did not occur as expected (25.0%)");

        let d = Diagnostic::ChainEvents { chain: 2, events: 4 };
        assert_eq!(d.mismatch_ratio(), None);
        assert!(!d.is_warning());
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingDiagnostics::new();
        sink.report(Diagnostic::ChainEvents { chain: 0, events: 3 });
        sink.report(Diagnostic::NoResponseTimes { chain: 1 });

        assert_eq!(sink.snapshot().len(), 2);
        assert_eq!(sink.for_chain(1), vec![Diagnostic::NoResponseTimes { chain: 1 }]);
        assert_eq!(sink.warnings(), 1);
    }
}
