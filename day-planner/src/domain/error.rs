//! Domain error types.
//!
//! These errors represent calls that would break a stop's time invariants.
//! They indicate a caller bug, not bad user input, and are distinct from
//! lookup/IO errors.

/// Domain-level errors for stop time updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A non-anchor stop was scheduled without its predecessor
    #[error("stop {0} has no predecessor to derive its start time from")]
    MissingPredecessor(usize),

    /// Anchor input given to a visit stop, or the other way round
    #[error("schedule input does not match stop {0}")]
    InputMismatch(usize),

    /// The anchor's stay is fixed at zero
    #[error("the starting point has no stay duration")]
    AnchorDuration,
}
