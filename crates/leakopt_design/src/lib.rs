//! Interfaces the optimizer consumes from the host design-analysis environment.
//!
//! The optimization engine never owns the netlist, the timing engine, or the
//! power engine. It talks to them through four capability traits:
//!
//! - [`CellQuery`]: enumerate cells by ladder position and read their attributes
//! - [`TimingOracle`]: cheap per-cell slack, authoritative worst slack, forced full update
//! - [`PowerOracle`]: batched leakage reads
//! - [`CellMutator`]: footprint-preserving variant changes
//!
//! [`Design`] bundles all four and is implemented automatically for any type
//! that provides them. The whole design is one mutable service object passed
//! by `&mut` to every engine component; every read observes the cumulative
//! effect of all prior swaps.

#![warn(missing_docs)]

pub mod error;

pub use error::{DesignError, DesignResult};

use leakopt_common::{CellId, LadderFilter, VariantRef};

/// Read access to cell instances and their current variants.
pub trait CellQuery {
    /// Returns the cells whose current ladder position matches `filter`, in a
    /// stable order.
    fn cells(&self, filter: LadderFilter) -> Vec<CellId>;

    /// Returns the total number of cell instances in the design.
    fn cell_count(&self) -> usize;

    /// Returns the class key (design-level base name) used to index leakage data.
    fn class_key(&self, cell: CellId) -> DesignResult<&str>;

    /// Returns the cell's current library and reference name.
    fn variant(&self, cell: CellId) -> DesignResult<VariantRef>;

    /// Returns the cell's current ladder level, `0` being the lowest.
    fn ladder_level(&self, cell: CellId) -> DesignResult<usize>;
}

/// Timing queries and recomputation control.
///
/// `cell_slack` and `worst_slack` may trigger an implicit incremental update
/// after swaps. Such updates are not trusted for accept/reject decisions;
/// callers gate every decision on [`update_timing`](Self::update_timing).
pub trait TimingOracle {
    /// Returns the minimum slack across the cell's pins. Cheap and locally accurate.
    fn cell_slack(&mut self, cell: CellId) -> DesignResult<f64>;

    /// Returns the worst slack across all timing paths of the design.
    fn worst_slack(&mut self) -> f64;

    /// Forces a full, non-incremental timing recomputation.
    fn update_timing(&mut self);
}

/// Leakage power queries.
pub trait PowerOracle {
    /// Returns the leakage power of each cell, in the order given.
    ///
    /// The first read after any swap triggers one full power recomputation,
    /// so callers batch swaps before reading.
    fn leakage_power(&mut self, cells: &[CellId]) -> DesignResult<Vec<f64>>;
}

/// Variant changes on cell instances.
pub trait CellMutator {
    /// Re-targets the cell to `target`, preserving its footprint.
    ///
    /// Reapplying the cell's previous variant restores the prior state exactly.
    fn size_cell(&mut self, cell: CellId, target: &VariantRef) -> DesignResult<()>;
}

/// A design providing every capability the optimizer needs.
pub trait Design: CellQuery + TimingOracle + PowerOracle + CellMutator {}

impl<T: CellQuery + TimingOracle + PowerOracle + CellMutator> Design for T {}
