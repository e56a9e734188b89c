use serde::Serialize;
use tracing::trace;

use crate::error::*;
use crate::event::*;
use crate::observer::*;
use crate::scheduler::*;
use crate::status::*;
use crate::waiting_line::*;

/// Optional limits that end a run before the scheduler drains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StopCondition {
    /// Events scheduled after this time are left unprocessed.
    pub max_time: Option<u64>,
    /// Upper bound on the number of events processed.
    pub max_events: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub arrivals: u64,
    pub departures: u64,
}

impl EventCounts {
    pub fn total(&self) -> u64 {
        self.arrivals + self.departures
    }

    fn record(&mut self, kind: EventKind) {
        match kind {
            EventKind::Arrival => self.arrivals += 1,
            EventKind::Departure => self.departures += 1,
        }
    }
}

/// Aggregates for a run, valid at any point including mid-run.
///
/// Only customers who waited in line are counted in `customers_served`;
/// a customer who walks straight up to an idle server accrues no measured
/// wait and is not counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_wait_time: u64,
    pub customers_served: u64,
    pub events_processed: EventCounts,
    pub current_time: u64,
    pub busy_time: u64,
    pub max_line_length: usize,
}

impl Statistics {
    pub fn average_wait(&self) -> Option<f64> {
        if self.customers_served == 0 {
            None
        } else {
            Some(self.total_wait_time as f64 / self.customers_served as f64)
        }
    }

    /// Fraction of elapsed simulated time the server spent busy.
    pub fn utilization(&self) -> Option<f64> {
        if self.current_time == 0 {
            None
        } else {
            Some(self.busy_time as f64 / self.current_time as f64)
        }
    }
}

/// Single-server queue driven by a time-ordered event scheduler.
///
/// The engine owns the scheduler, the waiting line and the server status and
/// only ever mutates them together inside [`step`](Self::step), so no caller
/// can observe them half-updated.
pub struct SimulationEngine {
    scheduler: EventScheduler,
    line: WaitingLine,
    server: ServerStatus,
    stop: StopCondition,
    total_wait_time: u64,
    customers_served: u64,
    events_processed: EventCounts,
    current_time: u64,
    busy_time: u64,
    sink: Box<dyn EventSink>,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationEngine {
    pub fn new() -> Self {
        Self::with_sink(Box::new(TracingSink))
    }

    pub fn with_sink(sink: Box<dyn EventSink>) -> Self {
        SimulationEngine {
            scheduler: EventScheduler::new(),
            line: WaitingLine::new(),
            server: ServerStatus::Idle,
            stop: StopCondition::default(),
            total_wait_time: 0,
            customers_served: 0,
            events_processed: EventCounts::default(),
            current_time: 0,
            busy_time: 0,
            sink,
        }
    }

    pub fn with_stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    /// Adds arrivals to the scheduler. Arrivals may be added mid-run, but
    /// never in the simulated past. The batch is checked as a whole before
    /// anything is scheduled, so a rejected batch leaves the engine as it was.
    pub fn seed(&mut self, events: impl IntoIterator<Item = Event>) -> Result<(), SimulationError> {
        let events: Vec<Event> = events.into_iter().collect();
        for event in &events {
            // departures are only ever scheduled by the handlers
            if event.kind != EventKind::Arrival {
                return Err(SimulationError::PreconditionViolation(format!(
                    "cannot seed a {} event at time {}",
                    event.kind, event.time
                )));
            }
            if event.time < self.current_time {
                return Err(SimulationError::PreconditionViolation(format!(
                    "cannot seed {} at time {} before current time {}",
                    event.kind, event.time, self.current_time
                )));
            }
        }
        self.scheduler.extend(events);
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        if let Some(max_events) = self.stop.max_events {
            if self.events_processed.total() >= max_events {
                return true;
            }
        }
        match (self.stop.max_time, self.scheduler.next_time()) {
            (Some(max_time), Some(next_time)) => next_time > max_time,
            _ => false,
        }
    }

    /// True once the scheduler is empty or a stop limit has been reached.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_empty() || self.limit_reached()
    }

    /// Processes exactly one event. Returns whether another step is possible.
    ///
    /// The transition is worked out against the head event before anything
    /// is popped, so a step that fails leaves the engine untouched.
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        if self.limit_reached() {
            return Err(SimulationError::PreconditionViolation(
                "step called after the stop condition was reached".to_owned(),
            ));
        }
        let event = *self.scheduler.peek().ok_or_else(|| {
            SimulationError::PreconditionViolation("step called on an empty scheduler".to_owned())
        })?;

        if event.time < self.current_time {
            return Err(SimulationError::InvariantViolation(format!(
                "clock moved backwards from {} to {}",
                self.current_time, event.time
            )));
        }
        let transition = match event.kind {
            EventKind::Arrival => self.handle_arrival(&event)?,
            EventKind::Departure => self.handle_departure(&event)?,
        };

        self.scheduler.pop();
        if self.server.is_busy() {
            self.busy_time += event.time - self.current_time;
        }
        self.current_time = event.time;
        if event.kind == EventKind::Departure && event.wait_accumulated > 0 {
            self.total_wait_time += event.wait_accumulated;
            self.customers_served += 1;
        }
        self.apply(transition);
        self.events_processed.record(event.kind);

        self.sink.observe(&Observation {
            event,
            server: self.server,
            line_len: self.line.len(),
        });
        self.check_invariant()?;

        Ok(!self.is_finished())
    }

    pub fn run_to_completion(&mut self) -> Result<Statistics, SimulationError> {
        while !self.is_finished() {
            self.step()?;
        }
        Ok(self.statistics())
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            total_wait_time: self.total_wait_time,
            customers_served: self.customers_served,
            events_processed: self.events_processed,
            current_time: self.current_time,
            busy_time: self.busy_time,
            max_line_length: self.line.max_len(),
        }
    }

    pub fn server_status(&self) -> ServerStatus {
        self.server
    }

    pub fn line_len(&self) -> usize {
        self.line.len()
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    /// The server is busy exactly when one departure is pending, and an idle
    /// server never has customers in line.
    pub fn check_invariant(&self) -> Result<(), SimulationError> {
        if !self.server.is_busy() && !self.line.is_empty() {
            return Err(SimulationError::InvariantViolation(format!(
                "server idle with {} customers waiting",
                self.line.len()
            )));
        }
        let departures = self.scheduler.pending_departures();
        let expected = if self.server.is_busy() { 1 } else { 0 };
        if departures != expected {
            return Err(SimulationError::InvariantViolation(format!(
                "server {:?} with {} departures pending",
                self.server, departures
            )));
        }
        Ok(())
    }

    /// Either starts service right away or sends the customer to the back
    /// of the line.
    fn handle_arrival(&self, event: &Event) -> Result<Transition, SimulationError> {
        if event.kind != EventKind::Arrival {
            return Err(SimulationError::PreconditionViolation(format!(
                "arrival handler received a {} event",
                event.kind
            )));
        }
        trace!(time = event.time, "Processing an arrival event");

        if !self.server.is_busy() && self.line.is_empty() {
            let departure_time = checked_end(event.time, event.service_duration)?;
            Ok(Transition::StartService(Event::departure(departure_time)))
        } else {
            Ok(Transition::Enqueue(Customer::from(event)))
        }
    }

    /// Hands the server to the front of the line, or idles it.
    fn handle_departure(&self, event: &Event) -> Result<Transition, SimulationError> {
        if event.kind != EventKind::Departure {
            return Err(SimulationError::PreconditionViolation(format!(
                "departure handler received a {} event",
                event.kind
            )));
        }
        trace!(time = event.time, "Processing a departure event");

        let Some(customer) = self.line.front() else {
            return Ok(Transition::Idle);
        };

        let time_waited = event.time.checked_sub(customer.arrival_time).ok_or_else(|| {
            SimulationError::InvariantViolation(format!(
                "departure at {} precedes arrival at {}",
                event.time, customer.arrival_time
            ))
        })?;
        let departure_time = checked_end(event.time, customer.service_duration)?;
        Ok(Transition::ServeNext(
            Event::departure(departure_time).with_wait(time_waited),
        ))
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::StartService(departure) => {
                self.scheduler.push(departure);
                self.server = ServerStatus::Busy;
            }
            Transition::Enqueue(customer) => self.line.push_back(customer),
            Transition::ServeNext(departure) => {
                self.line.pop_front();
                self.scheduler.push(departure);
            }
            Transition::Idle => self.server = ServerStatus::Idle,
        }
    }
}

/// State change a handler decided on, applied once the event is popped.
#[derive(Debug, PartialEq, Eq)]
enum Transition {
    StartService(Event),
    Enqueue(Customer),
    ServeNext(Event),
    Idle,
}

fn checked_end(start: u64, duration: u64) -> Result<u64, SimulationError> {
    start.checked_add(duration).ok_or_else(|| {
        SimulationError::InvariantViolation(format!(
            "service of {duration} starting at {start} overflows the clock"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_recorder() -> (SimulationEngine, RecordingSink) {
        let recorder = RecordingSink::new();
        (SimulationEngine::with_sink(Box::new(recorder.clone())), recorder)
    }

    #[test]
    fn single_customer_served_immediately() {
        let (mut engine, recorder) = engine_with_recorder();
        engine.seed([Event::arrival(0, 5)]).unwrap();

        assert!(engine.step().unwrap());
        assert_eq!(engine.server_status(), ServerStatus::Busy);
        assert_eq!(engine.pending_events(), 1);

        assert!(!engine.step().unwrap());
        assert_eq!(engine.server_status(), ServerStatus::Idle);

        let stats = engine.statistics();
        assert_eq!(stats.customers_served, 0);
        assert_eq!(stats.total_wait_time, 0);
        assert_eq!(stats.events_processed, EventCounts { arrivals: 1, departures: 1 });
        assert_eq!(stats.current_time, 5);
        assert_eq!(stats.busy_time, 5);
        assert_eq!(recorder.events()[1], Event::departure(5));
    }

    #[test]
    fn queued_customer_accrues_wait() {
        let (mut engine, recorder) = engine_with_recorder();
        engine
            .seed([Event::arrival(0, 5), Event::arrival(1, 3)])
            .unwrap();

        engine.step().unwrap();
        engine.step().unwrap();
        assert_eq!(engine.line_len(), 1);
        assert_eq!(engine.server_status(), ServerStatus::Busy);

        // departure at 5 hands the server to the customer who arrived at 1
        engine.step().unwrap();
        assert_eq!(engine.line_len(), 0);
        assert_eq!(engine.server_status(), ServerStatus::Busy);
        assert_eq!(engine.statistics().customers_served, 0);

        let stats = engine.run_to_completion().unwrap();
        assert_eq!(stats.total_wait_time, 4);
        assert_eq!(stats.customers_served, 1);
        assert_eq!(stats.current_time, 8);
        assert_eq!(stats.max_line_length, 1);
        assert_eq!(engine.server_status(), ServerStatus::Idle);

        let departures: Vec<Event> = recorder
            .events()
            .into_iter()
            .filter(|e| e.kind == EventKind::Departure)
            .collect();
        assert_eq!(
            departures,
            vec![Event::departure(5), Event::departure(8).with_wait(4)]
        );
    }

    #[test]
    fn empty_seed_finishes_immediately() {
        let mut engine = SimulationEngine::new();
        assert!(engine.is_finished());
        assert_eq!(engine.run_to_completion().unwrap(), Statistics::default());
    }

    #[test]
    fn step_on_empty_scheduler_is_rejected() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        assert!(matches!(
            engine.step(),
            Err(SimulationError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn handlers_reject_wrong_kind() {
        let engine = SimulationEngine::with_sink(Box::new(NullSink));
        assert!(matches!(
            engine.handle_arrival(&Event::departure(1)),
            Err(SimulationError::PreconditionViolation(_))
        ));
        assert!(matches!(
            engine.handle_departure(&Event::arrival(1, 1)),
            Err(SimulationError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn departure_before_queued_arrival_leaves_state_untouched() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine.server = ServerStatus::Busy;
        engine.line.push_back(Customer { arrival_time: 6, service_duration: 2 });
        engine.scheduler.push(Event::departure(4));
        let before = engine.statistics();

        assert!(matches!(
            engine.step(),
            Err(SimulationError::InvariantViolation(_))
        ));
        assert_eq!(engine.line_len(), 1);
        assert_eq!(engine.pending_events(), 1);
        assert_eq!(engine.statistics(), before);
    }

    #[test]
    fn service_overflowing_the_clock_leaves_state_untouched() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine.seed([Event::arrival(u64::MAX, 1)]).unwrap();

        assert!(matches!(
            engine.step(),
            Err(SimulationError::InvariantViolation(_))
        ));
        assert_eq!(engine.pending_events(), 1);
        assert_eq!(engine.server_status(), ServerStatus::Idle);
        assert_eq!(engine.statistics(), Statistics::default());
    }

    #[test]
    fn queued_service_overflowing_the_clock_keeps_customer_in_line() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine
            .seed([Event::arrival(0, 5), Event::arrival(1, u64::MAX)])
            .unwrap();
        engine.step().unwrap();
        engine.step().unwrap();
        let before = engine.statistics();

        assert!(matches!(
            engine.step(),
            Err(SimulationError::InvariantViolation(_))
        ));
        assert_eq!(engine.line_len(), 1);
        assert_eq!(engine.pending_events(), 1);
        assert_eq!(engine.statistics(), before);
    }

    #[test]
    fn stray_departure_fails_checkpoint() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine.check_invariant().unwrap();

        engine.scheduler.push(Event::departure(3));
        assert!(matches!(
            engine.check_invariant(),
            Err(SimulationError::InvariantViolation(_))
        ));

        engine.server = ServerStatus::Busy;
        engine.check_invariant().unwrap();

        engine.scheduler.push(Event::departure(7));
        assert!(matches!(
            engine.check_invariant(),
            Err(SimulationError::InvariantViolation(_))
        ));
    }

    #[test]
    fn seeding_a_departure_is_rejected() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        assert!(matches!(
            engine.seed([Event::arrival(0, 5), Event::departure(0)]),
            Err(SimulationError::PreconditionViolation(_))
        ));
        assert_eq!(engine.pending_events(), 0);
        engine.check_invariant().unwrap();
    }

    #[test]
    fn rejected_batch_schedules_nothing() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine.seed([Event::arrival(0, 5), Event::arrival(8, 1)]).unwrap();
        engine.step().unwrap();
        engine.step().unwrap();
        assert_eq!(engine.statistics().current_time, 5);
        assert_eq!(engine.pending_events(), 1);

        assert!(matches!(
            engine.seed([Event::arrival(10, 1), Event::arrival(3, 1)]),
            Err(SimulationError::PreconditionViolation(_))
        ));
        assert_eq!(engine.pending_events(), 1);
    }

    #[test]
    fn seeding_the_past_is_rejected() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine.seed([Event::arrival(10, 1)]).unwrap();
        engine.step().unwrap();

        assert!(matches!(
            engine.seed([Event::arrival(3, 1)]),
            Err(SimulationError::PreconditionViolation(_))
        ));
        engine.seed([Event::arrival(10, 1)]).unwrap();
    }

    #[test]
    fn arrival_at_departure_instant_takes_freed_server() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine
            .seed([Event::arrival(0, 5), Event::arrival(5, 2)])
            .unwrap();

        let stats = engine.run_to_completion().unwrap();
        assert_eq!(stats.current_time, 7);
        assert_eq!(stats.total_wait_time, 0);
        assert_eq!(stats.max_line_length, 0);
        assert_eq!(stats.busy_time, 7);
    }

    #[test]
    fn statistics_is_idempotent() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine
            .seed([Event::arrival(0, 4), Event::arrival(2, 4), Event::arrival(3, 1)])
            .unwrap();
        engine.step().unwrap();
        engine.step().unwrap();

        assert_eq!(engine.statistics(), engine.statistics());
    }

    #[test]
    fn max_events_stops_run() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink)).with_stop_condition(
            StopCondition {
                max_events: Some(3),
                ..Default::default()
            },
        );
        engine
            .seed([Event::arrival(0, 5), Event::arrival(1, 3), Event::arrival(2, 1)])
            .unwrap();

        let stats = engine.run_to_completion().unwrap();
        assert_eq!(stats.events_processed.total(), 3);
        assert!(engine.is_finished());
        assert!(engine.pending_events() > 0);
        assert!(matches!(
            engine.step(),
            Err(SimulationError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn max_time_leaves_later_events_pending() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink)).with_stop_condition(
            StopCondition {
                max_time: Some(6),
                ..Default::default()
            },
        );
        engine
            .seed([Event::arrival(0, 5), Event::arrival(1, 3)])
            .unwrap();

        let stats = engine.run_to_completion().unwrap();
        assert_eq!(stats.current_time, 5);
        assert_eq!(stats.events_processed, EventCounts { arrivals: 2, departures: 1 });
        assert_eq!(engine.pending_events(), 1);
        assert_eq!(engine.server_status(), ServerStatus::Busy);
    }

    #[test]
    fn utilization_counts_idle_gaps() {
        let mut engine = SimulationEngine::with_sink(Box::new(NullSink));
        engine
            .seed([Event::arrival(0, 2), Event::arrival(6, 2)])
            .unwrap();

        let stats = engine.run_to_completion().unwrap();
        assert_eq!(stats.current_time, 8);
        assert_eq!(stats.busy_time, 4);
        assert_eq!(stats.utilization(), Some(0.5));
        assert_eq!(stats.average_wait(), None);
    }
}
