//! Scripted in-memory design used by the engine's unit tests.
//!
//! Timing is a linear model: the authoritative worst slack is `base_worst`
//! minus each cell's `penalty` times the number of levels it has been raised
//! since construction. Reads taken after a swap but before a forced update
//! are skewed by `incremental_bias`, which stands in for an untrusted
//! incremental timing update. Every worst-slack read can be slowed down by
//! `read_delay`. Leakage depends only on the ladder level.

use crate::variant::VariantModel;
use leakopt_common::{CellId, LadderFilter, Step, VariantRef};
use leakopt_design::{
    CellMutator, CellQuery, DesignError, DesignResult, PowerOracle, TimingOracle,
};
use std::time::Duration;

const LIBRARIES: [&str; 3] = ["lib_l", "lib_s", "lib_h"];
const PREFIXES: [&str; 3] = ["L_", "S_", "H_"];

pub(crate) fn three_level_model() -> VariantModel {
    let mut m = VariantModel::new(vec!["lvt".into(), "svt".into(), "hvt".into()]);
    m.add_library("lib_l", 0)
        .add_library("lib_s", 1)
        .add_library("lib_h", 2)
        .add_rule("lib_l", Step::Up, "lib_s", "L_", "S_")
        .add_rule("lib_s", Step::Up, "lib_h", "S_", "H_")
        .add_rule("lib_s", Step::Down, "lib_l", "S_", "L_")
        .add_rule("lib_h", Step::Down, "lib_s", "H_", "S_");
    m
}

struct MockCell {
    class_key: String,
    variant: VariantRef,
    level: usize,
    start_level: usize,
}

pub(crate) struct MockDesign {
    cells: Vec<MockCell>,
    pub base_worst: f64,
    pub penalty: Vec<f64>,
    pub pin_slack: Vec<f64>,
    pub leakage_by_level: [f64; 3],
    pub incremental_bias: f64,
    pub read_delay: Duration,
    timing_dirty: bool,
    timing_trusted: bool,
    power_dirty: bool,
    pub full_timing_updates: usize,
    pub incremental_updates: usize,
    pub power_recomputes: usize,
    /// Number of raised cells observed at each forced timing update.
    pub raised_at_update: Vec<usize>,
}

impl MockDesign {
    /// `n` cells `u0..u{n-1}` at the lowest level, no timing penalty.
    pub fn uniform(n: usize, base_worst: f64) -> Self {
        let cells = (0..n)
            .map(|i| MockCell {
                class_key: format!("u{i}"),
                variant: VariantRef::new(LIBRARIES[0], format!("{}INV", PREFIXES[0])),
                level: 0,
                start_level: 0,
            })
            .collect();
        Self {
            cells,
            base_worst,
            penalty: vec![0.0; n],
            pin_slack: vec![1.0; n],
            leakage_by_level: [10.0, 6.0, 3.0],
            incremental_bias: 0.0,
            read_delay: Duration::ZERO,
            timing_dirty: false,
            timing_trusted: true,
            power_dirty: false,
            full_timing_updates: 0,
            incremental_updates: 0,
            power_recomputes: 0,
            raised_at_update: Vec::new(),
        }
    }

    pub fn with_penalties(mut self, penalty: Vec<f64>) -> Self {
        assert_eq!(penalty.len(), self.cells.len());
        self.penalty = penalty;
        self
    }

    pub fn with_pin_slacks(mut self, slack: Vec<f64>) -> Self {
        assert_eq!(slack.len(), self.cells.len());
        self.pin_slack = slack;
        self
    }

    /// Places each cell at the given starting level.
    pub fn with_levels(mut self, levels: Vec<usize>) -> Self {
        assert_eq!(levels.len(), self.cells.len());
        for (cell, level) in self.cells.iter_mut().zip(levels) {
            cell.variant = VariantRef::new(LIBRARIES[level], format!("{}INV", PREFIXES[level]));
            cell.level = level;
            cell.start_level = level;
        }
        self
    }

    pub fn with_class_keys(mut self, keys: &[&str]) -> Self {
        for (cell, key) in self.cells.iter_mut().zip(keys) {
            cell.class_key = key.to_string();
        }
        self
    }

    pub fn level(&self, cell: CellId) -> usize {
        self.cells[cell.as_raw() as usize].level
    }

    pub fn snapshot(&self) -> Vec<VariantRef> {
        self.cells.iter().map(|c| c.variant.clone()).collect()
    }

    pub fn raised_count(&self) -> usize {
        self.cells.iter().filter(|c| c.level > c.start_level).count()
    }

    pub fn true_worst(&self) -> f64 {
        let cost: f64 = self
            .cells
            .iter()
            .zip(&self.penalty)
            .map(|(c, p)| p * (c.level as f64 - c.start_level as f64))
            .sum();
        self.base_worst - cost
    }

    fn get(&self, cell: CellId) -> DesignResult<&MockCell> {
        self.cells
            .get(cell.as_raw() as usize)
            .ok_or(DesignError::UnknownCell(cell))
    }
}

impl CellQuery for MockDesign {
    fn cells(&self, filter: LadderFilter) -> Vec<CellId> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| match filter {
                LadderFilter::AtHighest => c.level == 2,
                LadderFilter::AtLowest => c.level == 0,
                LadderFilter::BelowHighest => c.level < 2,
            })
            .map(|(i, _)| CellId::from_raw(i as u32))
            .collect()
    }

    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn class_key(&self, cell: CellId) -> DesignResult<&str> {
        Ok(&self.get(cell)?.class_key)
    }

    fn variant(&self, cell: CellId) -> DesignResult<VariantRef> {
        Ok(self.get(cell)?.variant.clone())
    }

    fn ladder_level(&self, cell: CellId) -> DesignResult<usize> {
        Ok(self.get(cell)?.level)
    }
}

impl TimingOracle for MockDesign {
    fn cell_slack(&mut self, cell: CellId) -> DesignResult<f64> {
        self.get(cell)?;
        Ok(self.pin_slack[cell.as_raw() as usize])
    }

    fn worst_slack(&mut self) -> f64 {
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        if self.timing_dirty {
            self.incremental_updates += 1;
            self.timing_dirty = false;
        }
        let bias = if self.timing_trusted {
            0.0
        } else {
            self.incremental_bias
        };
        self.true_worst() + bias
    }

    fn update_timing(&mut self) {
        self.full_timing_updates += 1;
        self.timing_dirty = false;
        self.timing_trusted = true;
        self.raised_at_update.push(self.raised_count());
    }
}

impl PowerOracle for MockDesign {
    fn leakage_power(&mut self, cells: &[CellId]) -> DesignResult<Vec<f64>> {
        if self.power_dirty {
            self.power_recomputes += 1;
            self.power_dirty = false;
        }
        cells
            .iter()
            .map(|&c| Ok(self.leakage_by_level[self.get(c)?.level]))
            .collect()
    }
}

impl CellMutator for MockDesign {
    fn size_cell(&mut self, cell: CellId, target: &VariantRef) -> DesignResult<()> {
        let level = LIBRARIES
            .iter()
            .position(|l| *l == target.library)
            .ok_or_else(|| DesignError::UnknownVariant(target.clone()))?;
        let current = self.get(cell)?;
        let footprint = |v: &VariantRef| v.ref_name.get(2..).unwrap_or_default().to_string();
        if footprint(&current.variant) != footprint(target) {
            return Err(DesignError::FootprintMismatch {
                cell,
                current: footprint(&current.variant),
                target: footprint(target),
            });
        }
        let c = &mut self.cells[cell.as_raw() as usize];
        c.variant = target.clone();
        c.level = level;
        self.timing_dirty = true;
        self.timing_trusted = false;
        self.power_dirty = true;
        Ok(())
    }
}
