//! Response-time statistics
//!
//! Reduces a chain's response times to best, average and worst case values.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::types::ChainResult;

/// Compute BCRT/ACRT/WCRT for one chain
///
/// Returns `None` for an empty list. The average is the floor of the mean,
/// summed in 128 bits so long logs cannot overflow.
pub fn aggregate(chain_id: u32, response_times: &[i64]) -> Option<ChainResult> {
    let (&first, rest) = response_times.split_first()?;

    let mut best = first;
    let mut worst = first;
    let mut sum = i128::from(first);
    for &rt in rest {
        best = best.min(rt);
        worst = worst.max(rt);
        sum += i128::from(rt);
    }

    // Lies between best and worst, so it fits back into i64
    let average = sum.div_euclid(response_times.len() as i128) as i64;

    Some(ChainResult {
        id: chain_id,
        bcrt_us: best,
        acrt_us: average,
        wcrt_us: worst,
    })
}

/// Like [`aggregate`], reporting chains that produced no response times
pub fn summarize(
    chain_id: u32,
    response_times: &[i64],
    sink: &dyn DiagnosticSink,
) -> Option<ChainResult> {
    let result = aggregate(chain_id, response_times);
    if result.is_none() {
        sink.report(Diagnostic::NoResponseTimes { chain: chain_id });
    }
    result
}
