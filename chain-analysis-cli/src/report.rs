//! Report generation
//!
//! Renders analysis results as a fixed-width text table or a JSON array.

use crate::config::OutputFormat;
use anyhow::Result;
use chain_analysis::{format_path, AnalysisConfig, Chain, ChainResult};
use std::fmt::Write as _;

/// Render results in the requested format
pub fn render(
    format: OutputFormat,
    analysis: &AnalysisConfig,
    chains: &[Chain],
    results: &[ChainResult],
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(analysis, chains, results)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(results)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// One row per result, in result order
///
/// Chains excluded by the analysis filter are not counted as skipped.
pub fn render_table(analysis: &AnalysisConfig, chains: &[Chain], results: &[ChainResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6}  {:<20}  {:>12}  {:>12}  {:>12}",
        "ID", "Path", "BCRT (us)", "ACRT (us)", "WCRT (us)"
    );
    let _ = writeln!(out, "{}", "-".repeat(70));

    for result in results {
        let path = chains
            .iter()
            .find(|c| c.id == result.id)
            .map(|c| format_path(&c.path))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>6}  {:<20}  {:>12}  {:>12}  {:>12}",
            result.id, path, result.bcrt_us, result.acrt_us, result.wcrt_us
        );
    }

    let analyzed = chains.iter().filter(|c| analysis.should_analyze(c.id)).count();
    let skipped = analyzed.saturating_sub(results.len());
    if skipped > 0 {
        let _ = writeln!(out, "\n{} chain(s) completed no cycle and were skipped", skipped);
    }
    out
}
