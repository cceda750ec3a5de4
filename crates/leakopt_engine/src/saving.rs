//! Leakage-saving estimation.
//!
//! The saving of moving a cell one step up the ladder is measured, not
//! modeled: every candidate is swapped up, leakage is read before and after,
//! and the difference is recorded. Swaps are batched so that each pass costs
//! exactly one power recomputation regardless of how many cells it covers.
//! Full mode repeats the pass until every candidate reaches the top of the
//! ladder; fast mode stops after one. The design is restored afterwards.

use crate::error::EngineResult;
use crate::swap::{revert_batch, swap_up, UndoList};
use crate::variant::VariantModel;
use leakopt_common::{CellId, LadderFilter};
use leakopt_design::Design;
use leakopt_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SAVING_PASS: DiagnosticCode = DiagnosticCode::new(Category::Power, 1);
const SAVING_TABLE_BUILT: DiagnosticCode = DiagnosticCode::new(Category::Power, 2);

/// Which cells the estimator and the global ranker consider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SavingMode {
    /// Every cell below the highest ladder level; one pass per level.
    Full,
    /// Only cells at the lowest ladder level; a single pass.
    Fast,
}

impl SavingMode {
    /// The ladder filter selecting this mode's candidates.
    pub fn candidate_filter(self) -> LadderFilter {
        match self {
            SavingMode::Full => LadderFilter::BelowHighest,
            SavingMode::Fast => LadderFilter::AtLowest,
        }
    }
}

/// Leakage reduction per `(class key, reference name)` for one step up.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LeakageSavingTable {
    entries: HashMap<String, HashMap<String, f64>>,
    passes: usize,
}

impl LeakageSavingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the saving of moving `ref_name` in class `class_key` one step up.
    pub fn insert(&mut self, class_key: &str, ref_name: &str, saving: f64) {
        self.entries
            .entry(class_key.to_string())
            .or_default()
            .insert(ref_name.to_string(), saving);
    }

    /// Looks up the saving for `(class_key, ref_name)`.
    pub fn get(&self, class_key: &str, ref_name: &str) -> Option<f64> {
        self.entries.get(class_key)?.get(ref_name).copied()
    }

    /// Returns the total number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns how many estimation passes produced this table.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

/// Builds the leakage-saving table for the design's current assignment.
///
/// Each pass snapshots the candidates, reads their leakage, swaps them all
/// one step up, and reads their leakage again. The design is left exactly as
/// it was found.
pub fn build_saving_table<D: Design + ?Sized>(
    design: &mut D,
    model: &VariantModel,
    mode: SavingMode,
    sink: &DiagnosticSink,
) -> EngineResult<LeakageSavingTable> {
    let mut table = LeakageSavingTable::new();
    let mut undo_passes: Vec<UndoList> = Vec::new();
    let mut candidates = design.cells(mode.candidate_filter());

    while !candidates.is_empty() {
        let keys = class_keys_and_refs(design, &candidates)?;
        let before = design.leakage_power(&candidates)?;
        let undo = swap_up(design, model, &candidates)?;
        undo_passes.push(undo);
        let after = design.leakage_power(&candidates)?;

        for ((class_key, ref_name), (b, a)) in keys.iter().zip(before.iter().zip(&after)) {
            table.insert(class_key, ref_name, b - a);
        }
        table.passes += 1;

        if sink.enabled(Severity::Debug) {
            sink.emit(Diagnostic::debug(
                SAVING_PASS,
                format!(
                    "saving pass {} measured {} cells",
                    table.passes,
                    candidates.len()
                ),
            ));
        }

        if mode == SavingMode::Fast {
            break;
        }
        candidates = design.cells(LadderFilter::BelowHighest);
    }

    for undo in undo_passes.iter().rev() {
        revert_batch(design, undo)?;
    }

    sink.emit(Diagnostic::note(
        SAVING_TABLE_BUILT,
        format!(
            "leakage saving table: {} entries from {} pass(es), {mode:?} mode",
            table.len(),
            table.passes
        ),
    ));
    Ok(table)
}

fn class_keys_and_refs<D: Design + ?Sized>(
    design: &D,
    cells: &[CellId],
) -> EngineResult<Vec<(String, String)>> {
    cells
        .iter()
        .map(|&c| {
            let key = design.class_key(c)?.to_string();
            Ok((key, design.variant(c)?.ref_name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{three_level_model, MockDesign};

    #[test]
    fn full_mode_restores_every_cell() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(4, 1.0).with_levels(vec![0, 1, 2, 0]);
        let before = design.snapshot();
        build_saving_table(&mut design, &model, SavingMode::Full, &DiagnosticSink::disabled())
            .unwrap();
        assert_eq!(design.snapshot(), before);
    }

    #[test]
    fn fast_mode_restores_every_cell() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(3, 1.0).with_levels(vec![0, 1, 0]);
        let before = design.snapshot();
        build_saving_table(&mut design, &model, SavingMode::Fast, &DiagnosticSink::disabled())
            .unwrap();
        assert_eq!(design.snapshot(), before);
    }

    #[test]
    fn full_mode_recomputes_once_per_level() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(5, 1.0).with_levels(vec![0, 0, 1, 2, 0]);
        let table =
            build_saving_table(&mut design, &model, SavingMode::Full, &DiagnosticSink::disabled())
                .unwrap();
        // Two levels (lvt, svt) lie below the top among the candidates.
        assert_eq!(design.power_recomputes, 2);
        assert_eq!(table.passes(), 2);
    }

    #[test]
    fn full_mode_single_level_below_top() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(3, 1.0).with_levels(vec![1, 1, 2]);
        build_saving_table(&mut design, &model, SavingMode::Full, &DiagnosticSink::disabled())
            .unwrap();
        assert_eq!(design.power_recomputes, 1);
    }

    #[test]
    fn fast_mode_recomputes_exactly_once() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(6, 1.0);
        let table =
            build_saving_table(&mut design, &model, SavingMode::Fast, &DiagnosticSink::disabled())
                .unwrap();
        assert_eq!(design.power_recomputes, 1);
        assert_eq!(table.passes(), 1);
        assert_eq!(table.len(), 6);
        // Fast mode never measures the svt -> hvt step
        assert_eq!(table.get("u0", "S_INV"), None);
    }

    #[test]
    fn savings_are_keyed_by_original_reference() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(2, 1.0);
        let table =
            build_saving_table(&mut design, &model, SavingMode::Full, &DiagnosticSink::disabled())
                .unwrap();
        // leakage_by_level = [10, 6, 3]
        assert_eq!(table.get("u0", "L_INV"), Some(4.0));
        assert_eq!(table.get("u1", "S_INV"), Some(3.0));
        assert_eq!(table.get("u1", "H_INV"), None);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn nothing_to_measure() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(2, 1.0).with_levels(vec![2, 2]);
        let table =
            build_saving_table(&mut design, &model, SavingMode::Full, &DiagnosticSink::disabled())
                .unwrap();
        assert!(table.is_empty());
        assert_eq!(design.power_recomputes, 0);
    }

    #[test]
    fn emits_summary_note() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(2, 1.0);
        let sink = DiagnosticSink::new();
        build_saving_table(&mut design, &model, SavingMode::Fast, &sink).unwrap();
        let diags = sink.diagnostics();
        assert!(diags.iter().any(|d| d.code == SAVING_TABLE_BUILT));
        assert!(diags.iter().any(|d| d.code == SAVING_PASS));
    }
}
