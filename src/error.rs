use thiserror::Error;

/// Contract failures raised by the simulation core.
///
/// Neither variant is recoverable: continuing past one would produce
/// statistics that no longer describe a valid single-server queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    /// An operation was invoked in a state its caller must rule out, such as
    /// stepping an empty scheduler or handing a handler the wrong event kind.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// The joint scheduler/line/server state became inconsistent.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
