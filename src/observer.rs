use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::event::*;
use crate::status::*;

/// Snapshot handed to a sink after an event has been fully applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    pub event: Event,
    pub server: ServerStatus,
    pub line_len: usize,
}

/// Receives one observation per processed event.
///
/// Sinks only watch; they cannot reach back into the engine.
pub trait EventSink {
    fn observe(&mut self, observation: &Observation);
}

/// Logs every processed event at `debug` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn observe(&mut self, observation: &Observation) {
        debug!(
            kind = %observation.event.kind,
            time = observation.event.time,
            wait = observation.event.wait_accumulated,
            line_len = observation.line_len,
            busy = observation.server.is_busy(),
            "Processed event"
        );
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn observe(&mut self, _observation: &Observation) {}
}

/// Keeps every observation in a shared buffer that stays readable after the
/// sink has been moved into an engine.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    observations: Rc<RefCell<Vec<Observation>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.observations.borrow().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.observations.borrow().iter().map(|o| o.event).collect()
    }
}

impl EventSink for RecordingSink {
    fn observe(&mut self, observation: &Observation) {
        self.observations.borrow_mut().push(*observation);
    }
}

// fan out to every sink in order
impl EventSink for Vec<Box<dyn EventSink>> {
    fn observe(&mut self, observation: &Observation) {
        for sink in self.iter_mut() {
            sink.observe(observation);
        }
    }
}
