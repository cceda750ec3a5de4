//! Shared foundational types used across the leakopt workspace.
//!
//! This crate provides cell identifiers, qualified variant references, ladder
//! step and filter enums, and the common internal-error result type.

#![warn(missing_docs)]

pub mod ids;
pub mod result;
pub mod variant;

pub use ids::CellId;
pub use result::{InternalError, LeakoptResult};
pub use variant::{LadderFilter, Step, VariantRef};
