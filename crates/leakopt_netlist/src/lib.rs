//! Reference in-memory design for the leakage optimizer.
//!
//! Loads a JSON netlist with its cell libraries, runs a simple static timing
//! analysis over the instance graph, and exposes the result through the
//! [`leakopt_design`] traits so the engine can optimize it end to end.
//!
//! # Architecture
//!
//! - [`model`]: serializable netlist, library, instance, and arc types
//! - [`graph`]: instance-level timing graph with a fixed topological order
//! - [`sta`]: forward arrival / backward required propagation and slack
//! - [`design`]: [`NetlistDesign`], the cached, mutable design service

#![warn(missing_docs)]

pub mod design;
pub mod error;
pub mod graph;
pub mod model;
pub mod sta;

pub use design::{NetlistDesign, RecomputeStats};
pub use error::{NetlistError, NetlistResult};
pub use graph::{TimingEdge, TimingGraph};
pub use model::{Arc, Instance, LibCell, Library, Netlist};
pub use sta::{analyze, TimingState};
