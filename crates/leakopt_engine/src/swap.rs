//! Applying and undoing batches of variant changes.
//!
//! None of these functions trigger a timing or power update. Callers decide
//! when to read or force recomputation.

use crate::error::EngineResult;
use crate::rank::RankingEntry;
use crate::variant::VariantModel;
use leakopt_common::{CellId, VariantRef};
use leakopt_design::Design;

/// Pre-swap variants of every cell touched by a batch, in application order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UndoList {
    records: Vec<(CellId, VariantRef)>,
}

impl UndoList {
    /// Creates an empty undo list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `cell` held `original` before the swap.
    pub fn push(&mut self, cell: CellId, original: VariantRef) {
        self.records.push((cell, original));
    }

    /// Returns the number of recorded swaps.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the recorded `(cell, original variant)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = &(CellId, VariantRef)> {
        self.records.iter()
    }
}

/// Applies every entry's target variant, in ranked order.
pub fn apply_batch<D: Design + ?Sized>(
    design: &mut D,
    entries: &[RankingEntry],
) -> EngineResult<UndoList> {
    let mut undo = UndoList::new();
    for entry in entries {
        let original = design.variant(entry.cell)?;
        design.size_cell(entry.cell, &entry.target)?;
        undo.push(entry.cell, original);
    }
    Ok(undo)
}

/// Moves every cell one step up the ladder, resolving targets through `model`.
pub fn swap_up<D: Design + ?Sized>(
    design: &mut D,
    model: &VariantModel,
    cells: &[CellId],
) -> EngineResult<UndoList> {
    let mut undo = UndoList::new();
    for &cell in cells {
        let original = design.variant(cell)?;
        let target = model.step_up(&original)?;
        design.size_cell(cell, &target)?;
        undo.push(cell, original);
    }
    Ok(undo)
}

/// Restores every recorded cell to its pre-swap variant.
///
/// Records are replayed newest first, so a cell swapped twice within one
/// list ends up at its oldest recorded variant.
pub fn revert_batch<D: Design + ?Sized>(design: &mut D, undo: &UndoList) -> EngineResult<()> {
    for (cell, original) in undo.records.iter().rev() {
        design.size_cell(*cell, original)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{three_level_model, MockDesign};

    fn entry(design: &MockDesign, model: &VariantModel, raw: u32) -> RankingEntry {
        let cell = CellId::from_raw(raw);
        let variant = leakopt_design::CellQuery::variant(design, cell).unwrap();
        RankingEntry {
            cost: 0.0,
            target: model.step_up(&variant).unwrap(),
            class_key: format!("u{raw}"),
            cell,
        }
    }

    #[test]
    fn apply_then_revert_restores_state() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(4, 1.0);
        let before = design.snapshot();
        let entries = vec![entry(&design, &model, 2), entry(&design, &model, 0)];

        let undo = apply_batch(&mut design, &entries).unwrap();
        assert_eq!(undo.len(), 2);
        assert_eq!(design.level(CellId::from_raw(2)), 1);
        assert_eq!(design.level(CellId::from_raw(1)), 0);

        revert_batch(&mut design, &undo).unwrap();
        assert_eq!(design.snapshot(), before);
    }

    #[test]
    fn apply_does_not_touch_timing_or_power() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(3, 1.0);
        let entries = vec![entry(&design, &model, 1)];
        apply_batch(&mut design, &entries).unwrap();
        assert_eq!(design.full_timing_updates, 0);
        assert_eq!(design.power_recomputes, 0);
    }

    #[test]
    fn double_swap_reverts_to_oldest() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(1, 1.0);
        let before = design.snapshot();
        let cells = [CellId::from_raw(0)];
        let mut undo = swap_up(&mut design, &model, &cells).unwrap();
        let second = swap_up(&mut design, &model, &cells).unwrap();
        for (cell, v) in second.iter() {
            undo.push(*cell, v.clone());
        }
        assert_eq!(design.level(cells[0]), 2);
        revert_batch(&mut design, &undo).unwrap();
        assert_eq!(design.snapshot(), before);
    }

    #[test]
    fn swap_up_at_top_fails() {
        let model = three_level_model();
        let mut design = MockDesign::uniform(1, 1.0);
        let cells = [CellId::from_raw(0)];
        swap_up(&mut design, &model, &cells).unwrap();
        swap_up(&mut design, &model, &cells).unwrap();
        assert!(swap_up(&mut design, &model, &cells).is_err());
    }

    #[test]
    fn empty_batch() {
        let mut design = MockDesign::uniform(2, 1.0);
        let undo = apply_batch(&mut design, &[]).unwrap();
        assert!(undo.is_empty());
        revert_batch(&mut design, &undo).unwrap();
    }
}
