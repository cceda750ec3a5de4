//! Errors reported by a host design.

use leakopt_common::{CellId, VariantRef};

/// Result type for design queries and mutations.
pub type DesignResult<T> = Result<T, DesignError>;

/// Failures reported by the host design while serving the optimizer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DesignError {
    /// The cell ID does not name a cell of this design.
    #[error("unknown cell {0}")]
    UnknownCell(CellId),

    /// The requested library cell does not exist.
    #[error("unknown library cell '{0}'")]
    UnknownVariant(VariantRef),

    /// The requested library cell has a different footprint than the cell's current one.
    #[error("footprint mismatch on {cell}: '{current}' is not pin-compatible with '{target}'")]
    FootprintMismatch {
        /// The cell being re-targeted.
        cell: CellId,
        /// Footprint of the current variant.
        current: String,
        /// Footprint of the requested variant.
        target: String,
    },
}
