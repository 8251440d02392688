//! Chain catalog loading and saving
//!
//! A catalog is a JSON array of chain records. Array order carries no meaning
//! for the analysis (chains are identified by ID) but is preserved on every
//! round trip.

use crate::types::{AnalysisError, Chain, Provenance, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Per-field columns used to assemble a catalog
///
/// Entry `i` of every column describes the same chain.
#[derive(Debug, Clone, Default)]
pub struct ChainColumns {
    pub ids: Vec<u32>,
    pub periods_us: Vec<u64>,
    pub priorities: Vec<i32>,
    pub paths: Vec<Vec<u32>>,
    pub utilisations: Vec<f64>,
}

/// Load chains from a catalog file
pub fn load(path: &Path) -> Result<Vec<Chain>> {
    log::info!("Loading chain catalog: {:?}", path);

    let data = fs::read_to_string(path).map_err(|e| AnalysisError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let chains = from_json(&data)?;
    log::info!("Loaded {} chains from {:?}", chains.len(), path);
    Ok(chains)
}

/// Save chains to a catalog file
pub fn save(chains: &[Chain], path: &Path) -> Result<()> {
    let data = to_json(chains)?;

    fs::write(path, data).map_err(|e| AnalysisError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    log::debug!("Wrote {} chains to {:?}", chains.len(), path);
    Ok(())
}

/// Parse a catalog from JSON text
pub fn from_json(data: &str) -> Result<Vec<Chain>> {
    serde_json::from_str(data)
        .map_err(|e| AnalysisError::Catalog(format!("JSON does not match chain schema: {}", e)))
}

/// Serialize a catalog to pretty-printed JSON
pub fn to_json(chains: &[Chain]) -> Result<String> {
    serde_json::to_string_pretty(chains)
        .map_err(|e| AnalysisError::Catalog(format!("Unable to serialize chains: {}", e)))
}

/// Assemble chains from parallel columns and a shared provenance block
///
/// Fails before building anything if the columns differ in length.
pub fn build(columns: ChainColumns, provenance: &Provenance) -> Result<Vec<Chain>> {
    let n = columns.ids.len();
    let lengths = [
        columns.periods_us.len(),
        columns.priorities.len(),
        columns.paths.len(),
        columns.utilisations.len(),
    ];
    if lengths.iter().any(|&len| len != n) {
        return Err(AnalysisError::Config(format!(
            "column lengths differ: ids={}, periods={}, priorities={}, paths={}, utilisations={}",
            n, lengths[0], lengths[1], lengths[2], lengths[3]
        )));
    }

    let ChainColumns {
        ids,
        periods_us,
        priorities,
        paths,
        utilisations,
    } = columns;

    let chains: Vec<Chain> = ids
        .into_iter()
        .zip(periods_us)
        .zip(priorities)
        .zip(paths)
        .zip(utilisations)
        .map(|((((id, period_us), prio), path), utilisation)| Chain {
            id,
            prio,
            path,
            period_us,
            utilisation,
            provenance: provenance.clone(),
        })
        .collect();

    validate(&chains)?;
    Ok(chains)
}

/// Build a catalog from columns and write it to `path`
pub fn build_and_save(columns: ChainColumns, provenance: &Provenance, path: &Path) -> Result<()> {
    let chains = build(columns, provenance)?;
    save(&chains, path)
}

/// Check every chain is analyzable and that chain IDs are unique
pub fn validate(chains: &[Chain]) -> Result<()> {
    let mut seen = HashSet::with_capacity(chains.len());
    for chain in chains {
        chain.validate()?;
        if !seen.insert(chain.id) {
            return Err(AnalysisError::Config(format!(
                "chain ID {} appears more than once",
                chain.id
            )));
        }
    }
    Ok(())
}
