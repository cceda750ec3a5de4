//! Strategy selection and sequencing of the two optimization loops.
//!
//! A [`Recipe`] measures the design once, picks [`Strategy::Fast`] for large
//! designs with little slack and [`Strategy::Accurate`] otherwise, builds the
//! leakage-saving table, harvests easy wins with the local loop, and spends
//! the rest of the time budget in the global loop.

use crate::error::EngineResult;
use crate::global::{run_global_loop, GlobalLoopParams, GlobalOutcome, GlobalStopReason};
use crate::local::{run_local_loop, LocalLoopParams, LocalOutcome};
use crate::rank::{GlobalRanker, LocalRanker, LocalStrategy};
use crate::saving::{build_saving_table, SavingMode};
use crate::variant::VariantModel;
use leakopt_common::{LadderFilter, VariantRef};
use leakopt_config::RecipeConfig;
use leakopt_design::Design;
use leakopt_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use serde::Serialize;
use std::time::{Duration, Instant};

const STRATEGY_SELECTED: DiagnosticCode = DiagnosticCode::new(Category::Search, 1);
const RECIPE_DONE: DiagnosticCode = DiagnosticCode::new(Category::Search, 2);
const RESIDUAL_VIOLATION: DiagnosticCode = DiagnosticCode::new(Category::Timing, 1);

/// Which end-to-end strategy a run used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Strategy {
    /// Single-pass estimation, slack-only local ranking, no lockstep check.
    Fast,
    /// Full estimation, leakage-aware local ranking, lockstep check.
    Accurate,
}

/// Recipe knobs, usually taken from the `[recipe]` table of `leakopt.toml`.
#[derive(Clone, Debug, PartialEq)]
pub struct RecipeParams {
    /// Wall-clock ceiling for the whole run.
    pub max_duration: Duration,
    /// Cell count above which a design counts as large.
    pub large_design_cells: usize,
    /// Worst slack below this margin counts as tight.
    pub tight_slack_margin: f64,
    /// Cells swapped per fast local pass.
    pub fast_local_swap_count: usize,
    /// Initial global batch size.
    pub global_batch_size: usize,
    /// Accurate local selection fraction.
    pub accurate_select_fraction: f64,
    /// Accurate local derate fraction.
    pub accurate_derate: f64,
}

impl Default for RecipeParams {
    fn default() -> Self {
        Self::from(&RecipeConfig::default())
    }
}

impl From<&RecipeConfig> for RecipeParams {
    fn from(config: &RecipeConfig) -> Self {
        Self {
            max_duration: config.max_duration,
            large_design_cells: config.large_design_cells,
            tight_slack_margin: config.tight_slack_margin,
            fast_local_swap_count: config.fast_local_swap_count,
            global_batch_size: config.global_batch_size,
            accurate_select_fraction: config.accurate_select_fraction,
            accurate_derate: config.accurate_derate,
        }
    }
}

/// Summary of one recipe run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecipeReport {
    /// Strategy chosen at the start of the run.
    pub strategy: Strategy,
    /// Cells in the design.
    pub cell_count: usize,
    /// Worst slack before any swap.
    pub initial_worst_slack: f64,
    /// Worst slack after the final forced timing update.
    pub final_worst_slack: f64,
    /// Entries in the leakage-saving table.
    pub saving_entries: usize,
    /// What the local loop did.
    pub local: LocalOutcome,
    /// What the global loop did.
    pub global: GlobalOutcome,
    /// Cells whose variant differs from the starting assignment.
    pub cells_changed: usize,
    /// Wall-clock time of the run, in seconds.
    pub elapsed_secs: f64,
}

impl RecipeReport {
    /// Why the global loop stopped.
    pub fn stop_reason(&self) -> GlobalStopReason {
        self.global.stop
    }
}

/// The leakage-recovery recipe for one variant model.
#[derive(Clone, Debug)]
pub struct Recipe {
    model: VariantModel,
    params: RecipeParams,
}

impl Recipe {
    /// Creates a recipe.
    pub fn new(model: VariantModel, params: RecipeParams) -> Self {
        Self { model, params }
    }

    /// Returns the variant model.
    pub fn model(&self) -> &VariantModel {
        &self.model
    }

    /// Returns the recipe knobs.
    pub fn params(&self) -> &RecipeParams {
        &self.params
    }

    /// Picks a strategy for a design of `cell_count` cells at `worst_slack`.
    pub fn select_strategy(&self, cell_count: usize, worst_slack: f64) -> Strategy {
        if cell_count > self.params.large_design_cells
            && worst_slack < self.params.tight_slack_margin
        {
            Strategy::Fast
        } else {
            Strategy::Accurate
        }
    }

    /// Runs the recipe on `design` and reports what happened.
    pub fn run<D: Design + ?Sized>(
        &self,
        design: &mut D,
        sink: &DiagnosticSink,
    ) -> EngineResult<RecipeReport> {
        let start = Instant::now();
        let before = assignment(design)?;
        let cell_count = design.cell_count();
        let initial_worst_slack = design.worst_slack();
        let strategy = self.select_strategy(cell_count, initial_worst_slack);

        sink.emit(
            Diagnostic::note(
                STRATEGY_SELECTED,
                format!("{strategy:?} strategy selected for {cell_count} cells"),
            )
            .with_note(format!("initial worst slack {initial_worst_slack:.4}")),
        );

        let (saving_mode, local_strategy, local_params) = match strategy {
            Strategy::Fast => {
                let candidates = design.cells(LadderFilter::AtLowest).len();
                let fraction = if candidates == 0 {
                    1.0
                } else {
                    (self.params.fast_local_swap_count as f64 / candidates as f64).min(1.0)
                };
                (
                    SavingMode::Fast,
                    LocalStrategy::SlackOnly,
                    LocalLoopParams {
                        select_fraction: fraction,
                        derate_fraction: 0.0,
                    },
                )
            }
            Strategy::Accurate => (
                SavingMode::Full,
                LocalStrategy::SlackAndLeakage,
                LocalLoopParams {
                    select_fraction: self.params.accurate_select_fraction,
                    derate_fraction: self.params.accurate_derate,
                },
            ),
        };

        let table = build_saving_table(design, &self.model, saving_mode, sink)?;

        let local_ranker = LocalRanker::new(local_strategy, &self.model, &table);
        let local = run_local_loop(design, &local_ranker, local_params, sink)?;

        let global_ranker = GlobalRanker::new(saving_mode, &self.model, &table);
        let global = run_global_loop(
            design,
            &global_ranker,
            GlobalLoopParams {
                initial_batch_size: self.params.global_batch_size.max(1),
                start,
                max_duration: self.params.max_duration,
                fast_mode: strategy == Strategy::Fast,
            },
            sink,
        )?;

        design.update_timing();
        let final_worst_slack = design.worst_slack();
        if final_worst_slack < 0.0 {
            sink.emit(Diagnostic::warning(
                RESIDUAL_VIOLATION,
                format!("design still violates timing after optimization ({final_worst_slack:.4})"),
            ));
        }

        let after = assignment(design)?;
        let cells_changed = before.iter().zip(&after).filter(|(b, a)| b != a).count();

        let report = RecipeReport {
            strategy,
            cell_count,
            initial_worst_slack,
            final_worst_slack,
            saving_entries: table.len(),
            local,
            global,
            cells_changed,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        sink.emit(Diagnostic::note(
            RECIPE_DONE,
            format!(
                "{cells_changed} cells changed, worst slack {initial_worst_slack:.4} -> {final_worst_slack:.4}"
            ),
        ));
        Ok(report)
    }
}

fn assignment<D: Design + ?Sized>(design: &D) -> EngineResult<Vec<VariantRef>> {
    let mut cells = design.cells(LadderFilter::AtHighest);
    cells.extend(design.cells(LadderFilter::BelowHighest));
    cells.sort();
    cells
        .into_iter()
        .map(|c| Ok(design.variant(c)?))
        .collect()
}
