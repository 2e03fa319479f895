//! Observability: engine counters behind a sink boundary.
//!
//! Accessor and decorator logic must not touch the counter state directly;
//! all instrumentation flows through `MetricsEvent` and `MetricsSink`.
//! Recording never affects access semantics.

use serde::Serialize;
use std::cell::RefCell;

thread_local! {
    static METRICS: RefCell<Metrics> = RefCell::new(Metrics::default());
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    AccessorRead,
    AccessorWrite,
    CacheHit,
    CacheMiss,
    FallbackHit,
    LocaleRejected,
    BackendInstantiated,
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// Metrics
///
/// Point-in-time counter snapshot, also the global sink's state.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Metrics {
    pub accessor_reads: u64,
    pub accessor_writes: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub fallback_hits: u64,
    pub locale_rejections: u64,
    pub backends_instantiated: u64,
}

///
/// GlobalMetricsSink
/// Default thread-local sink backing `metrics_report`.
///

struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        METRICS.with_borrow_mut(|m| {
            let counter = match event {
                MetricsEvent::AccessorRead => &mut m.accessor_reads,
                MetricsEvent::AccessorWrite => &mut m.accessor_writes,
                MetricsEvent::CacheHit => &mut m.cache_hits,
                MetricsEvent::CacheMiss => &mut m.cache_misses,
                MetricsEvent::FallbackHit => &mut m.fallback_hits,
                MetricsEvent::LocaleRejected => &mut m.locale_rejections,
                MetricsEvent::BackendInstantiated => &mut m.backends_instantiated,
            };
            *counter = counter.saturating_add(1);
        });
    }
}

const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    GLOBAL_METRICS_SINK.record(event);
}

/// Snapshot the current counters.
#[must_use]
pub fn metrics_report() -> Metrics {
    METRICS.with_borrow(|m| *m)
}

/// Reset all counters.
pub fn metrics_reset() {
    METRICS.with_borrow_mut(|m| *m = Metrics::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_accumulate_into_their_counters() {
        metrics_reset();

        record(MetricsEvent::AccessorRead);
        record(MetricsEvent::AccessorRead);
        record(MetricsEvent::CacheHit);
        record(MetricsEvent::LocaleRejected);

        let report = metrics_report();
        assert_eq!(report.accessor_reads, 2);
        assert_eq!(report.cache_hits, 1);
        assert_eq!(report.locale_rejections, 1);
        assert_eq!(report.accessor_writes, 0);
    }

    #[test]
    fn reset_clears_all_counters() {
        record(MetricsEvent::FallbackHit);
        metrics_reset();

        assert_eq!(metrics_report(), Metrics::default());
    }
}
