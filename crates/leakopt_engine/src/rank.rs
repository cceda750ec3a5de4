//! Cost ranking of swap candidates.
//!
//! Two families of rankers produce the same [`RankingEntry`] list, sorted by
//! ascending cost:
//!
//! - [`LocalRanker`] reads the cheap per-cell slack and never touches the
//!   design. [`LocalStrategy::SlackAndLeakage`] weighs slack against the
//!   measured saving; [`LocalStrategy::SlackOnly`] ignores leakage and is
//!   used when the saving table is too expensive to rely on.
//! - [`GlobalRanker`] trial-swaps every candidate and measures the change in
//!   worst slack. Accurate, and one timing read per candidate.

use crate::error::EngineResult;
use crate::saving::{LeakageSavingTable, SavingMode};
use crate::variant::VariantModel;
use leakopt_common::{CellId, LadderFilter, VariantRef};
use leakopt_design::Design;
use serde::Serialize;

/// One proposed swap.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankingEntry {
    /// Lower is better.
    pub cost: f64,
    /// The variant the cell would move to.
    pub target: VariantRef,
    /// The cell's class key.
    pub class_key: String,
    /// The cell to swap.
    pub cell: CellId,
}

/// Produces a ranked candidate list from the current design state.
pub trait Ranker {
    /// Ranks the current candidates, cheapest first.
    fn rank<D: Design + ?Sized>(&self, design: &mut D) -> EngineResult<Vec<RankingEntry>>;
}

/// Which local cost function to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LocalStrategy {
    /// `1 / (slack × saving)` over every cell below the top of the ladder.
    SlackAndLeakage,
    /// `−slack` over cells at the bottom of the ladder.
    SlackOnly,
}

/// Ranks by per-cell slack, optionally weighted by leakage saving.
pub struct LocalRanker<'a> {
    strategy: LocalStrategy,
    model: &'a VariantModel,
    table: &'a LeakageSavingTable,
}

impl<'a> LocalRanker<'a> {
    /// Creates a local ranker.
    pub fn new(
        strategy: LocalStrategy,
        model: &'a VariantModel,
        table: &'a LeakageSavingTable,
    ) -> Self {
        Self {
            strategy,
            model,
            table,
        }
    }
}

impl Ranker for LocalRanker<'_> {
    fn rank<D: Design + ?Sized>(&self, design: &mut D) -> EngineResult<Vec<RankingEntry>> {
        match self.strategy {
            LocalStrategy::SlackAndLeakage => {
                rank_by_slack_and_leakage(design, self.model, self.table)
            }
            LocalStrategy::SlackOnly => rank_by_slack_only(design, self.model),
        }
    }
}

/// Ranks every swappable cell by `1 / (min pin slack × saving)`.
///
/// Cells with no table entry, a non-positive saving, or non-positive slack
/// have no feasible swap and are left out.
pub fn rank_by_slack_and_leakage<D: Design + ?Sized>(
    design: &mut D,
    model: &VariantModel,
    table: &LeakageSavingTable,
) -> EngineResult<Vec<RankingEntry>> {
    let mut ranking = Vec::new();
    for cell in design.cells(LadderFilter::BelowHighest) {
        let variant = design.variant(cell)?;
        let class_key = design.class_key(cell)?.to_string();
        let Some(saving) = table.get(&class_key, &variant.ref_name) else {
            continue;
        };
        let slack = design.cell_slack(cell)?;
        if slack <= 0.0 || saving <= 0.0 {
            continue;
        }
        ranking.push(RankingEntry {
            cost: 1.0 / (slack * saving),
            target: model.step_up(&variant)?,
            class_key,
            cell,
        });
    }
    sort_by_cost(&mut ranking);
    Ok(ranking)
}

/// Ranks lowest-level cells by descending slack.
pub fn rank_by_slack_only<D: Design + ?Sized>(
    design: &mut D,
    model: &VariantModel,
) -> EngineResult<Vec<RankingEntry>> {
    let mut ranking = Vec::new();
    for cell in design.cells(LadderFilter::AtLowest) {
        let variant = design.variant(cell)?;
        let class_key = design.class_key(cell)?.to_string();
        let slack = design.cell_slack(cell)?;
        ranking.push(RankingEntry {
            cost: -slack,
            target: model.step_up(&variant)?,
            class_key,
            cell,
        });
    }
    sort_by_cost(&mut ranking);
    Ok(ranking)
}

/// Ranks by worst-slack reduction per unit of leakage saved, via trial swaps.
pub struct GlobalRanker<'a> {
    mode: SavingMode,
    model: &'a VariantModel,
    table: &'a LeakageSavingTable,
}

impl<'a> GlobalRanker<'a> {
    /// Creates a global ranker.
    pub fn new(mode: SavingMode, model: &'a VariantModel, table: &'a LeakageSavingTable) -> Self {
        Self { mode, model, table }
    }

    /// Returns the candidate mode.
    pub fn mode(&self) -> SavingMode {
        self.mode
    }
}

impl Ranker for GlobalRanker<'_> {
    fn rank<D: Design + ?Sized>(&self, design: &mut D) -> EngineResult<Vec<RankingEntry>> {
        rank_by_global_slack_reduction(design, self.model, self.table, self.mode)
    }
}

/// Trial-swaps every candidate and ranks by `(slack before − slack after) / saving`.
///
/// Candidates whose trial swap drives the worst slack negative are dropped,
/// as are candidates without a positive saving. Every trial swap is reverted
/// before the next one, so the design is unchanged on return.
pub fn rank_by_global_slack_reduction<D: Design + ?Sized>(
    design: &mut D,
    model: &VariantModel,
    table: &LeakageSavingTable,
    mode: SavingMode,
) -> EngineResult<Vec<RankingEntry>> {
    let slack_before = design.worst_slack();
    let mut ranking = Vec::new();
    for cell in design.cells(mode.candidate_filter()) {
        let variant = design.variant(cell)?;
        let class_key = design.class_key(cell)?.to_string();
        let Some(saving) = table.get(&class_key, &variant.ref_name) else {
            continue;
        };
        if saving <= 0.0 {
            continue;
        }
        let target = model.step_up(&variant)?;

        design.size_cell(cell, &target)?;
        let slack_after = design.worst_slack();
        design.size_cell(cell, &variant)?;

        if slack_after < 0.0 {
            continue;
        }
        ranking.push(RankingEntry {
            cost: (slack_before - slack_after) / saving,
            target,
            class_key,
            cell,
        });
    }
    sort_by_cost(&mut ranking);
    Ok(ranking)
}

/// Stable ascending sort; ties keep enumeration order.
fn sort_by_cost(ranking: &mut [RankingEntry]) {
    ranking.sort_by(|a, b| a.cost.total_cmp(&b.cost));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{three_level_model, MockDesign};

    fn uniform_table(keys: &[&str], ref_name: &str, saving: f64) -> LeakageSavingTable {
        let mut table = LeakageSavingTable::new();
        for key in keys {
            table.insert(key, ref_name, saving);
        }
        table
    }

    #[test]
    fn slack_and_leakage_orders_by_headroom() {
        // Five cells, three swappable, uniform saving 2.0.
        let model = three_level_model();
        let mut design = MockDesign::uniform(5, 1.0)
            .with_levels(vec![0, 2, 0, 2, 0])
            .with_pin_slacks(vec![0.5, 0.3, 0.1, 0.3, 0.9]);
        let table = uniform_table(&["u0", "u2", "u4"], "L_INV", 2.0);

        let ranking = rank_by_slack_and_leakage(&mut design, &model, &table).unwrap();
        let order: Vec<u32> = ranking.iter().map(|e| e.cell.as_raw()).collect();
        assert_eq!(order, vec![4, 0, 2]);
        assert!((ranking[0].cost - 1.0 / (0.9 * 2.0)).abs() < 1e-12);
        assert!((ranking[2].cost - 1.0 / (0.1 * 2.0)).abs() < 1e-12);
        assert_eq!(ranking[0].target, VariantRef::new("lib_s", "S_INV"));
    }

    #[test]
    fn slack_and_leakage_skips_unmeasured_and_negative_slack() {
        let model = three_level_model();
        let mut design =
            MockDesign::uniform(3, 1.0).with_pin_slacks(vec![0.4, -0.1, 0.2]);
        let table = uniform_table(&["u0", "u1"], "L_INV", 1.0);
        let ranking = rank_by_slack_and_leakage(&mut design, &model, &table).unwrap();
        let cells: Vec<u32> = ranking.iter().map(|e| e.cell.as_raw()).collect();
        assert_eq!(cells, vec![0]);
    }

    #[test]
    fn slack_only_restricts_to_lowest_level() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(4, 1.0)
            .with_levels(vec![0, 1, 0, 0])
            .with_pin_slacks(vec![0.2, 0.9, 0.7, -0.3]);
        let ranking = rank_by_slack_only(&mut design, &model).unwrap();
        let order: Vec<u32> = ranking.iter().map(|e| e.cell.as_raw()).collect();
        assert_eq!(order, vec![2, 0, 3]);
        assert_eq!(ranking[0].cost, -0.7);
    }

    #[test]
    fn local_ranking_does_not_force_updates() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(3, 1.0);
        let table = uniform_table(&["u0", "u1", "u2"], "L_INV", 1.0);
        let ranker = LocalRanker::new(LocalStrategy::SlackAndLeakage, &model, &table);
        ranker.rank(&mut design).unwrap();
        assert_eq!(design.full_timing_updates, 0);
        assert_eq!(design.raised_count(), 0);
    }

    #[test]
    fn global_ranking_excludes_infeasible() {
        // Worst slack 1.0; X costs 0.4, Y costs 1.2 and would go to -0.2.
        let model = three_level_model();
        let mut design = MockDesign::uniform(2, 1.0)
            .with_class_keys(&["X", "Y"])
            .with_penalties(vec![0.4, 1.2]);
        let table = uniform_table(&["X", "Y"], "L_INV", 4.0);

        let ranking =
            rank_by_global_slack_reduction(&mut design, &model, &table, SavingMode::Full).unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].class_key, "X");
        assert!((ranking[0].cost - 0.4 / 4.0).abs() < 1e-12);
        assert!(ranking.iter().all(|e| e.cost.is_finite()));
    }

    #[test]
    fn global_ranking_leaves_design_unchanged() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(3, 1.0).with_penalties(vec![0.1, 0.2, 0.3]);
        let before = design.snapshot();
        let table = uniform_table(&["u0", "u1", "u2"], "L_INV", 1.0);
        let ranking = GlobalRanker::new(SavingMode::Full, &model, &table)
            .rank(&mut design)
            .unwrap();
        assert_eq!(design.snapshot(), before);
        let order: Vec<u32> = ranking.iter().map(|e| e.cell.as_raw()).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn global_fast_mode_uses_lowest_level_only() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(3, 1.0).with_levels(vec![0, 1, 0]);
        let mut table = uniform_table(&["u0", "u2"], "L_INV", 1.0);
        table.insert("u1", "S_INV", 1.0);
        let ranking =
            rank_by_global_slack_reduction(&mut design, &model, &table, SavingMode::Fast).unwrap();
        assert_eq!(ranking.len(), 2);
        assert!(ranking.iter().all(|e| e.cell.as_raw() != 1));
    }

    #[test]
    fn empty_candidate_set() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(2, 1.0).with_levels(vec![2, 2]);
        let table = LeakageSavingTable::new();
        assert!(rank_by_slack_and_leakage(&mut design, &model, &table)
            .unwrap()
            .is_empty());
        assert!(rank_by_slack_only(&mut design, &model).unwrap().is_empty());
    }
}
