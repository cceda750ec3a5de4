//! Qualified cell variants and ladder navigation primitives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully qualified library cell: the library it lives in plus its
/// reference name inside that library.
///
/// Displayed as `library/ref_name`, the form hosts use to address a
/// library cell when re-sizing an instance.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct VariantRef {
    /// Library name (e.g., `"lib_lvt"`).
    pub library: String,
    /// Cell reference name inside the library (e.g., `"LVT_NAND2X1"`).
    pub ref_name: String,
}

impl VariantRef {
    /// Creates a new variant reference.
    pub fn new(library: impl Into<String>, ref_name: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            ref_name: ref_name.into(),
        }
    }
}

impl fmt::Display for VariantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.library, self.ref_name)
    }
}

/// A single move along the threshold-voltage ladder.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Step {
    /// One level toward lower leakage (higher threshold voltage).
    Up,
    /// One level toward lower delay (lower threshold voltage).
    Down,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Up => write!(f, "+1"),
            Step::Down => write!(f, "-1"),
        }
    }
}

/// Selects cells by their current position on the ladder.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum LadderFilter {
    /// Cells already at the highest threshold group.
    AtHighest,
    /// Cells at the lowest threshold group.
    AtLowest,
    /// Cells that can still move up at least one level.
    BelowHighest,
}
