//! Discrete-event simulation of a single-server queue.
//!
//! Customers arrive, wait in a FIFO line while the server is busy, and leave
//! once served. [`SimulationEngine`] pops events from a time-ordered
//! [`EventScheduler`] one at a time and applies the arrival or departure
//! transition to the line and server state, accumulating wait-time and
//! utilization statistics along the way.
//!
//! The driver pieces ([`config`], [`workload`], [`input`]) only produce
//! seed events and are not needed to use the engine.

pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod metrics;
pub mod observer;
pub mod scheduler;
pub mod simulation;
pub mod status;
pub mod waiting_line;
pub mod workload;

pub use error::SimulationError;
pub use event::{Customer, Event, EventKind};
pub use observer::{EventSink, NullSink, Observation, RecordingSink, TracingSink};
pub use scheduler::EventScheduler;
pub use simulation::{EventCounts, SimulationEngine, Statistics, StopCondition};
pub use status::ServerStatus;
pub use waiting_line::WaitingLine;
