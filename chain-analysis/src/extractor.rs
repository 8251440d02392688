//! Response-time extraction for a single chain
//!
//! Events of one chain are walked in log order against the chain path, taken
//! cyclically. Every `L` events (for a path of length `L`) close one cycle,
//! whose response time runs from the start of its first event to the end of
//! its last. Callback mismatches are counted but never alter the cycles.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::types::{Chain, Event, Result};

/// Outcome of walking one chain's events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// One response time per completed cycle, in log order (microseconds)
    pub response_times: Vec<i64>,
    /// Events whose callback differed from the expected path position
    pub mismatches: usize,
    /// Events considered for this chain
    pub events: usize,
}

impl Extraction {
    /// Number of completed cycles
    pub fn cycles(&self) -> usize {
        self.response_times.len()
    }

    /// Fraction of events that did not match the path
    pub fn mismatch_ratio(&self) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            self.mismatches as f64 / self.events as f64
        }
    }

    /// Events left over in a trailing partial cycle
    pub fn discarded(&self, path_len: usize) -> usize {
        self.events.saturating_sub(self.cycles() * path_len)
    }
}

/// Rebuild cycles by matching events against the chain path
///
/// `events` must already be restricted to this chain and kept in log order.
/// A trailing partial cycle is dropped. Fails only for a chain with an empty
/// path, before any event is looked at.
pub fn extract<'a, I>(chain: &Chain, events: I, sink: &dyn DiagnosticSink) -> Result<Extraction>
where
    I: IntoIterator<Item = &'a Event>,
{
    chain.validate()?;
    let path = &chain.path;
    let len = path.len();

    let mut extraction = Extraction::default();
    let mut cycle_start_us = 0i64;

    for (i, event) in events.into_iter().enumerate() {
        let position = i % len;
        if position == 0 {
            cycle_start_us = event.start_us;
        }

        let expected = path[position];
        if event.callback != Some(expected) {
            log::trace!(
                "chain {}: event {} expected callback {} but saw {:?}",
                chain.id,
                i,
                expected,
                event.callback
            );
            extraction.mismatches += 1;
        }

        if position == len - 1 {
            extraction
                .response_times
                .push(event.end_us().saturating_sub(cycle_start_us));
        }
        extraction.events += 1;
    }

    if extraction.mismatches > 0 {
        sink.report(Diagnostic::PathMismatch {
            chain: chain.id,
            mismatches: extraction.mismatches,
            events: extraction.events,
        });
    }

    let discarded = extraction.discarded(len);
    if discarded > 0 {
        log::debug!(
            "chain {}: dropped {} events of an incomplete trailing cycle",
            chain.id,
            discarded
        );
    }

    Ok(extraction)
}

/// Treat each event as one complete end-to-end measurement
///
/// The event duration is the response time; the path is not consulted.
pub fn extract_per_event<'a, I>(chain: &Chain, events: I) -> Result<Extraction>
where
    I: IntoIterator<Item = &'a Event>,
{
    chain.validate()?;
    let response_times: Vec<i64> = events.into_iter().map(|e| e.duration_us).collect();
    Ok(Extraction {
        events: response_times.len(),
        response_times,
        mismatches: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::types::Provenance;

    fn chain(path: Vec<u32>) -> Chain {
        Chain {
            id: 0,
            prio: 1,
            path,
            period_us: 100,
            utilisation: 0.2,
            provenance: Provenance::default(),
        }
    }

    fn event(callback: u32, start_us: i64, duration_us: i64) -> Event {
        Event {
            executor: 0,
            chain: 0,
            callback: Some(callback),
            start_us,
            duration_us,
        }
    }

    fn worked_example() -> Vec<Event> {
        vec![
            event(1, 0, 10),
            event(2, 10, 5),
            event(3, 15, 20),
            event(1, 40, 5),
            event(2, 50, 5),
            event(3, 60, 10),
        ]
    }

    #[test]
    fn test_worked_example() {
        let sink = RecordingDiagnostics::new();
        let x = extract(&chain(vec![1, 2, 3]), &worked_example(), &sink).unwrap();
        assert_eq!(x.response_times, vec![35, 30]);
        assert_eq!(x.mismatches, 0);
        assert_eq!(x.events, 6);
        assert!(sink.snapshot().is_empty());
    }

    #[test]
    fn test_k_cycles_yield_k_response_times() {
        let path = vec![4, 5];
        let events: Vec<Event> = (0..5)
            .flat_map(|k| {
                let base = k * 1000;
                vec![event(4, base, 10), event(5, base + 20, 30 + k)]
            })
            .collect();
        let x = extract(&chain(path), &events, &RecordingDiagnostics::new()).unwrap();
        assert_eq!(x.cycles(), 5);
        for (k, rt) in x.response_times.iter().enumerate() {
            assert_eq!(*rt, 20 + 30 + k as i64);
        }
    }

    #[test]
    fn test_single_flipped_callback() {
        let mut events = worked_example();
        events[4].callback = Some(9);
        let sink = RecordingDiagnostics::new();
        let x = extract(&chain(vec![1, 2, 3]), &events, &sink).unwrap();
        assert_eq!(x.mismatches, 1);
        assert_eq!(x.response_times, vec![35, 30]);
        assert_eq!(
            sink.snapshot(),
            vec![Diagnostic::PathMismatch {
                chain: 0,
                mismatches: 1,
                events: 6
            }]
        );
    }

    #[test]
    fn test_partial_trailing_cycle_is_dropped() {
        let mut events = worked_example();
        events.truncate(5);
        let x = extract(&chain(vec![1, 2, 3]), &events, &RecordingDiagnostics::new()).unwrap();
        assert_eq!(x.response_times, vec![35]);
        assert_eq!(x.discarded(3), 2);
    }

    #[test]
    fn test_fewer_events_than_path() {
        let events = worked_example();
        let x = extract(&chain(vec![1, 2, 3]), &events[..2], &RecordingDiagnostics::new()).unwrap();
        assert!(x.response_times.is_empty());

        let none: Vec<Event> = Vec::new();
        let x = extract(&chain(vec![1, 2, 3]), &none, &RecordingDiagnostics::new()).unwrap();
        assert!(x.response_times.is_empty());
        assert_eq!(x.mismatch_ratio(), 0.0);
    }

    #[test]
    fn test_single_callback_path() {
        // Every event closes a cycle, including the first one
        let events = vec![event(7, 0, 3), event(7, 10, 4)];
        let x = extract(&chain(vec![7]), &events, &RecordingDiagnostics::new()).unwrap();
        assert_eq!(x.response_times, vec![3, 4]);
    }

    #[test]
    fn test_mismatch_reported_without_cycles() {
        let events = vec![event(2, 0, 1)];
        let sink = RecordingDiagnostics::new();
        let x = extract(&chain(vec![1, 2, 3]), &events, &sink).unwrap();
        assert!(x.response_times.is_empty());
        assert_eq!(sink.warnings(), 1);
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let err = extract(&chain(vec![]), &worked_example(), &RecordingDiagnostics::new())
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_repeated_extraction_is_identical() {
        let c = chain(vec![1, 2, 3]);
        let events = worked_example();
        let a = extract(&c, &events, &RecordingDiagnostics::new()).unwrap();
        let b = extract(&c, &events, &RecordingDiagnostics::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_per_event_uses_durations() {
        let events = vec![event(1, 0, 12), event(1, 50, 8)];
        let x = extract_per_event(&chain(vec![1, 2]), &events).unwrap();
        assert_eq!(x.response_times, vec![12, 8]);
        assert_eq!(x.mismatches, 0);
    }
}
