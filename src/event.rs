use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Arrival,
    Departure,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Arrival => "arrival",
            EventKind::Departure => "departure",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state change scheduled to happen at a simulated time.
///
/// `service_duration` only matters for arrivals, and `wait_accumulated` is
/// only ever non-zero on a departure that was scheduled when the server was
/// handed to a customer from the waiting line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub time: u64,
    pub service_duration: u64,
    pub wait_accumulated: u64,
}

impl Event {
    pub fn arrival(time: u64, service_duration: u64) -> Self {
        Event {
            kind: EventKind::Arrival,
            time,
            service_duration,
            wait_accumulated: 0,
        }
    }

    pub fn departure(time: u64) -> Self {
        Event {
            kind: EventKind::Departure,
            time,
            service_duration: 0,
            wait_accumulated: 0,
        }
    }

    pub fn with_wait(mut self, wait_accumulated: u64) -> Self {
        self.wait_accumulated = wait_accumulated;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Customer {
    pub arrival_time: u64,
    pub service_duration: u64,
}

impl From<&Event> for Customer {
    fn from(event: &Event) -> Self {
        Customer {
            arrival_time: event.time,
            service_duration: event.service_duration,
        }
    }
}
