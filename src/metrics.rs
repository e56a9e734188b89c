use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

use crate::event::*;
use crate::observer::*;

/// Prometheus handles fed from processed events.
///
/// The handles share their storage with the registry they were registered
/// in, so a clone can be moved into an engine as a sink while the caller
/// keeps the registry for encoding.
#[derive(Clone)]
pub struct SimulationMetrics {
    events_dispatched: Family<Vec<(String, String)>, Counter>,
    wait_time: Histogram,
    line_length: Gauge,
}

impl SimulationMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = SimulationMetrics {
            events_dispatched: Default::default(),
            wait_time: Histogram::new(exponential_buckets(1.0, 2.0, 12)),
            line_length: Default::default(),
        };
        registry.register(
            "events_dispatched",
            "Number of events dispatched in simulation",
            metrics.events_dispatched.clone(),
        );
        registry.register(
            "wait_time",
            "Simulated ticks each queued customer waited before service",
            metrics.wait_time.clone(),
        );
        registry.register(
            "line_length",
            "Customers in the waiting line after the last event",
            metrics.line_length.clone(),
        );
        metrics
    }

    pub fn events_dispatched(&self, kind: EventKind) -> u64 {
        self.events_dispatched.get_or_create(&kind_labels(kind)).get()
    }

    pub fn line_length(&self) -> i64 {
        self.line_length.get()
    }
}

fn kind_labels(kind: EventKind) -> Vec<(String, String)> {
    vec![("kind".to_owned(), kind.as_str().to_owned())]
}

impl EventSink for SimulationMetrics {
    fn observe(&mut self, observation: &Observation) {
        let event = &observation.event;
        self.events_dispatched
            .get_or_create(&kind_labels(event.kind))
            .inc();
        if event.kind == EventKind::Departure && event.wait_accumulated > 0 {
            self.wait_time.observe(event.wait_accumulated as f64);
        }
        self.line_length
            .set(i64::try_from(observation.line_len).unwrap_or(i64::MAX));
    }
}
