//! The metrics sink is process-global, so every test that reads it goes
//! through [`test_sink`] and only asserts lower bounds: other tests record
//! lookups concurrently.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use serial_test::serial;

use super::*;
use crate::metrics::{LookupOutcome, LookupStats, MetricsSink, SweepStats, set_sink};

#[derive(Default)]
struct CountingSink {
    hits: AtomicUsize,
    matched: AtomicUsize,
    unmatched: AtomicUsize,
    sweeps: AtomicUsize,
    swept_entries: AtomicUsize,
}

impl CountingSink {
    fn snapshot(&self) -> [usize; 5] {
        [
            self.hits.load(Ordering::SeqCst),
            self.matched.load(Ordering::SeqCst),
            self.unmatched.load(Ordering::SeqCst),
            self.sweeps.load(Ordering::SeqCst),
            self.swept_entries.load(Ordering::SeqCst),
        ]
    }
}

impl MetricsSink for CountingSink {
    fn on_lookup(&self, stats: &LookupStats) {
        let counter = match stats.outcome {
            LookupOutcome::Hit => &self.hits,
            LookupOutcome::Matched => &self.matched,
            LookupOutcome::Unmatched => &self.unmatched,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn on_sweep(&self, stats: &SweepStats) {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        self.swept_entries.fetch_add(stats.removed, Ordering::SeqCst);
    }
}

fn test_sink() -> Arc<CountingSink> {
    static SINK: OnceLock<Arc<CountingSink>> = OnceLock::new();
    SINK.get_or_init(|| {
        let sink = Arc::new(CountingSink::default());
        set_sink(sink.clone());
        sink
    })
    .clone()
}

#[test]
#[serial]
fn test_lookup_outcomes_are_recorded() {
    let sink = test_sink();
    let [hits, matched, unmatched, _, _] = sink.snapshot();

    let resolver = resolver_from(CONFIG);
    resolver.fetch_label("string2-metrics");
    resolver.fetch_label("string2-metrics");
    resolver.fetch_label("string2-metrics");
    resolver.fetch_label("no-owner-metrics");

    let [hits_after, matched_after, unmatched_after, _, _] = sink.snapshot();
    assert!(hits_after >= hits + 2);
    assert!(matched_after > matched);
    assert!(unmatched_after > unmatched);
}

#[test]
#[serial]
fn test_sweeps_are_recorded() {
    let sink = test_sink();
    let [_, _, _, sweeps, swept] = sink.snapshot();

    let resolver =
        LabelResolver::new(CONFIG, Duration::from_millis(20), Duration::from_millis(10)).unwrap();
    resolver.fetch_label("string4-swept");

    let deadline = Instant::now() + Duration::from_secs(2);
    while !resolver.cache().is_empty() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    let [_, _, _, sweeps_after, swept_after] = sink.snapshot();
    assert!(resolver.cache().is_empty());
    assert!(sweeps_after > sweeps);
    assert!(swept_after > swept);
}
