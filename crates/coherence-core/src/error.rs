//! Error types for the coherence-core crate.
//!
//! Core transforms are pure in-memory arithmetic and do not fail
//! transiently. The only caller-visible failure of a field operation is an
//! unknown participant; everything else is configuration or an emitter
//! faulting inside its own task.

use coherence_types::ParticipantId;

use crate::config::ConfigError;

/// Errors returned by [`FieldContext`](crate::context::FieldContext) operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No participant with the given ID is registered.
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// The configuration handed to the core is invalid.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },
}

/// Errors raised by an emitter tick.
///
/// Any of these stops the emitter that raised it and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitterError {
    /// The transform could not be applied.
    #[error("emitter {emitter} failed: {reason}")]
    Transform {
        /// Name of the emitter that failed.
        emitter: String,
        /// Description of the failure.
        reason: String,
    },

    /// The participant this emitter drives has been released.
    #[error("participant {0} is no longer registered")]
    ParticipantGone(ParticipantId),

    /// The requested schedule cannot be run.
    #[error("invalid schedule: {reason}")]
    InvalidSchedule {
        /// Explanation of what is wrong with the schedule.
        reason: String,
    },
}
