//! Main analysis API
//!
//! The [`Analyzer`] is the entry point combining extraction and aggregation.
//! It walks the catalog in order, hands each chain its own events and collects
//! one [`ChainResult`] per chain that completed at least one cycle.

use crate::catalog;
use crate::config::{AnalysisConfig, ResponseTimeMode};
use crate::diagnostics::{Diagnostic, DiagnosticSink, LogDiagnostics};
use crate::extractor::{self, Extraction};
use crate::log_parser;
use crate::stats;
use crate::types::{Chain, ChainResult, Event, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Computes response-time statistics for every chain in a catalog
pub struct Analyzer {
    config: AnalysisConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Analyzer {
    /// Create an analyzer that reports diagnostics through `log`
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            diagnostics: Arc::new(LogDiagnostics),
        }
    }

    /// Send diagnostics to `sink` instead of the logger
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Configuration this analyzer was built with
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `events` against every chain of the catalog
    ///
    /// Results come back in catalog order. Chains that completed no cycle are
    /// skipped, so there may be fewer results than chains. Fails only if the
    /// catalog itself is unusable (empty path, duplicate IDs); this is
    /// checked before any chain is analyzed.
    ///
    /// # Example
    /// ```no_run
    /// use chain_analysis::{catalog, log_parser, AnalysisConfig, Analyzer};
    /// use std::path::Path;
    ///
    /// let config = AnalysisConfig::new();
    /// let chains = catalog::load(Path::new("chains.json")).unwrap();
    /// let events = log_parser::parse_file(Path::new("trace.log"), &config).unwrap();
    ///
    /// for result in Analyzer::new(config).analyze(&chains, &events).unwrap() {
    ///     println!("{}", result);
    /// }
    /// ```
    pub fn analyze(&self, chains: &[Chain], events: &[Event]) -> Result<Vec<ChainResult>> {
        catalog::validate(chains)?;

        let grouped = group_by_chain(events);
        self.report_unknown_chains(chains, &grouped);

        let selected: Vec<&Chain> = chains
            .iter()
            .filter(|chain| self.config.should_analyze(chain.id))
            .collect();
        log::debug!(
            "Analyzing {} of {} chains ({} events, mode {:?})",
            selected.len(),
            chains.len(),
            events.len(),
            self.config.mode
        );

        // Indexed collection keeps catalog order regardless of completion order
        let slots: Vec<Option<ChainResult>> = if self.config.parallel {
            selected
                .par_iter()
                .map(|chain| self.analyze_chain(chain, chain_events(&grouped, chain.id)))
                .collect::<Result<_>>()?
        } else {
            selected
                .iter()
                .map(|chain| self.analyze_chain(chain, chain_events(&grouped, chain.id)))
                .collect::<Result<_>>()?
        };

        Ok(slots.into_iter().flatten().collect())
    }

    /// Load a catalog and an event log from disk and analyze them
    pub fn analyze_files(&self, catalog_path: &Path, log_path: &Path) -> Result<Vec<ChainResult>> {
        let chains = catalog::load(catalog_path)?;
        let events = log_parser::parse_file(log_path, &self.config)?;
        self.analyze(&chains, &events)
    }

    fn analyze_chain(&self, chain: &Chain, events: &[&Event]) -> Result<Option<ChainResult>> {
        let sink = self.diagnostics.as_ref();
        sink.report(Diagnostic::ChainEvents {
            chain: chain.id,
            events: events.len(),
        });

        let extraction: Extraction = match self.config.mode {
            ResponseTimeMode::PathMatching => {
                extractor::extract(chain, events.iter().copied(), sink)?
            }
            ResponseTimeMode::PerEvent => extractor::extract_per_event(chain, events.iter().copied())?,
        };

        let result = stats::summarize(chain.id, &extraction.response_times, sink);
        if let Some(result) = &result {
            log::debug!("{} over {} cycles", result, extraction.cycles());
        }
        Ok(result)
    }

    fn report_unknown_chains(&self, chains: &[Chain], grouped: &BTreeMap<u32, Vec<&Event>>) {
        for (&chain_id, chain_events) in grouped {
            if !chains.iter().any(|chain| chain.id == chain_id) {
                self.diagnostics.report(Diagnostic::UnknownChainEvents {
                    chain: chain_id,
                    events: chain_events.len(),
                });
            }
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

/// Split events per chain ID, keeping log order within each chain
fn group_by_chain(events: &[Event]) -> BTreeMap<u32, Vec<&Event>> {
    let mut grouped: BTreeMap<u32, Vec<&Event>> = BTreeMap::new();
    for event in events {
        grouped.entry(event.chain).or_default().push(event);
    }
    grouped
}

fn chain_events<'a, 'e>(grouped: &'a BTreeMap<u32, Vec<&'e Event>>, chain_id: u32) -> &'a [&'e Event] {
    grouped.get(&chain_id).map(Vec::as_slice).unwrap_or(&[])
}
