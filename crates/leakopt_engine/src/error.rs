//! Error types for the optimization engine.

use leakopt_common::{InternalError, Step};
use leakopt_design::DesignError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures that abort an engine operation.
///
/// Timing violations, infeasible candidates, budget exhaustion, and lockstep
/// are normal control flow and never appear here. Everything in this enum
/// is a broken precondition or a host failure and is fatal to the calling
/// operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The transition table has no rule for this library and direction.
    #[error("no {step} transition declared for library '{library}'")]
    NoTransition {
        /// The source library.
        library: String,
        /// The requested direction.
        step: Step,
    },

    /// The reference name does not start with the rule's prefix pattern.
    #[error("reference name '{ref_name}' does not start with '{pattern}' ({library}, {step})")]
    PrefixMismatch {
        /// The source library.
        library: String,
        /// The reference name that failed to match.
        ref_name: String,
        /// The prefix the rule expects.
        pattern: String,
        /// The requested direction.
        step: Step,
    },

    /// The host design rejected a query or mutation.
    #[error(transparent)]
    Design(#[from] DesignError),

    /// An engine invariant was broken.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
