//! Threshold-voltage swap engine for post-route leakage recovery.
//!
//! Every standard cell in a design comes in functionally identical variants
//! that differ only in threshold voltage. Higher threshold means less
//! leakage and more delay. This crate moves cells up that ladder as far as
//! the timing budget allows, using only the host operations exposed by
//! [`leakopt_design::Design`].
//!
//! # Usage
//!
//! ```ignore
//! use leakopt_engine::{Recipe, RecipeParams, VariantModel};
//!
//! let model = VariantModel::from_config(&config);
//! let recipe = Recipe::new(model, RecipeParams::from(&config.recipe));
//! let report = recipe.run(&mut design, &sink)?;
//! println!("{} cells changed", report.cells_changed);
//! ```
//!
//! # Architecture
//!
//! - [`variant`]: ladder levels and `(library, step)` name-substitution rules
//! - [`swap`]: batched swaps with undo lists
//! - [`saving`]: measured leakage saving per class key and reference name
//! - [`rank`]: local (slack-based) and global (trial-swap) candidate ranking
//! - [`local`]: wholesale-swap-and-derate loop
//! - [`global`]: time-budgeted, batch-adaptive loop with lockstep detection
//! - [`recipe`]: fast/accurate strategy selection and sequencing

#![warn(missing_docs)]

pub mod error;
pub mod global;
pub mod local;
pub mod rank;
pub mod recipe;
pub mod saving;
pub mod swap;
pub mod variant;

#[cfg(test)]
mod testing;

pub use error::{EngineError, EngineResult};
pub use global::{
    run_global_loop, Budget, DurationEma, GlobalLoopParams, GlobalOutcome, GlobalStopReason,
};
pub use local::{run_local_loop, LocalLoopParams, LocalOutcome};
pub use rank::{GlobalRanker, LocalRanker, LocalStrategy, Ranker, RankingEntry};
pub use recipe::{Recipe, RecipeParams, RecipeReport, Strategy};
pub use saving::{build_saving_table, LeakageSavingTable, SavingMode};
pub use swap::{apply_batch, revert_batch, swap_up, UndoList};
pub use variant::{TransitionRule, VariantModel};
