//! The netlist as a mutable design service.
//!
//! [`NetlistDesign`] owns a [`Netlist`], tracks each instance's current
//! variant, and answers timing and power queries from caches guarded by
//! dirty flags. Every swap marks both caches dirty. Cheap reads
//! (`cell_slack`, `worst_slack`, `leakage_power`) recompute only when dirty;
//! `update_timing` always recomputes. [`RecomputeStats`] counts each kind of
//! recomputation so callers can verify how much work a run did.

use crate::error::{NetlistError, NetlistResult};
use crate::graph::TimingGraph;
use crate::model::{Instance, Netlist};
use crate::sta::{analyze, TimingState};
use leakopt_common::{CellId, LadderFilter, VariantRef};
use leakopt_design::{
    CellMutator, CellQuery, DesignError, DesignResult, PowerOracle, TimingOracle,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// How many times each cache was rebuilt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeStats {
    /// Forced full timing updates.
    pub full_timing_updates: usize,
    /// Lazy timing recomputations triggered by a read after a swap.
    pub incremental_timing_updates: usize,
    /// Leakage recomputations.
    pub power_recomputes: usize,
}

#[derive(Debug, Clone)]
struct LibCellInfo {
    footprint: String,
    leakage: f64,
    delay: f64,
    level: usize,
}

#[derive(Debug, Clone)]
struct CellState {
    name: String,
    class_key: String,
    variant: VariantRef,
}

/// A netlist wrapped as an optimizable design.
#[derive(Debug, Clone)]
pub struct NetlistDesign {
    netlist: Netlist,
    highest_level: usize,
    lib_cells: HashMap<(String, String), LibCellInfo>,
    cells: Vec<CellState>,
    graph: TimingGraph,
    timing: TimingState,
    timing_dirty: bool,
    leakage: Vec<f64>,
    power_dirty: bool,
    stats: RecomputeStats,
}

impl NetlistDesign {
    /// Checks `netlist` against the ladder and builds its timing graph.
    ///
    /// `groups` lists the threshold-group aliases from lowest to highest.
    /// Every library's group must appear in it, and every instance must
    /// name a declared library cell.
    pub fn new(netlist: Netlist, groups: &[String]) -> NetlistResult<Self> {
        if !(netlist.clock_period.is_finite() && netlist.clock_period > 0.0) {
            return Err(NetlistError::InvalidClockPeriod(netlist.clock_period));
        }

        let mut lib_cells = HashMap::new();
        for lib in &netlist.libraries {
            let level = groups.iter().position(|g| *g == lib.group).ok_or_else(|| {
                NetlistError::UnknownGroup {
                    library: lib.name.clone(),
                    group: lib.group.clone(),
                }
            })?;
            for cell in &lib.cells {
                lib_cells.insert(
                    (lib.name.clone(), cell.name.clone()),
                    LibCellInfo {
                        footprint: cell.footprint.clone(),
                        leakage: cell.leakage,
                        delay: cell.delay,
                        level,
                    },
                );
            }
        }

        let mut seen = HashSet::new();
        let mut cells = Vec::with_capacity(netlist.instances.len());
        for inst in &netlist.instances {
            if !seen.insert(inst.name.clone()) {
                return Err(NetlistError::DuplicateInstance(inst.name.clone()));
            }
            if netlist.library(&inst.library).is_none() {
                return Err(NetlistError::UnknownLibrary {
                    instance: inst.name.clone(),
                    library: inst.library.clone(),
                });
            }
            if !lib_cells.contains_key(&(inst.library.clone(), inst.cell.clone())) {
                return Err(NetlistError::UnknownCell {
                    instance: inst.name.clone(),
                    library: inst.library.clone(),
                    cell: inst.cell.clone(),
                });
            }
            cells.push(CellState {
                name: inst.name.clone(),
                class_key: inst.class_key.clone().unwrap_or_else(|| inst.name.clone()),
                variant: VariantRef::new(inst.library.clone(), inst.cell.clone()),
            });
        }

        let names: Vec<String> = cells.iter().map(|c| c.name.clone()).collect();
        let graph = TimingGraph::build(&names, &netlist.arcs)?;

        let mut design = Self {
            netlist,
            highest_level: groups.len().saturating_sub(1),
            lib_cells,
            cells,
            graph,
            timing: TimingState::default(),
            timing_dirty: true,
            leakage: Vec::new(),
            power_dirty: true,
            stats: RecomputeStats::default(),
        };
        design.recompute_timing();
        design.recompute_leakage();
        design.stats = RecomputeStats::default();
        Ok(design)
    }

    /// Loads a netlist file and wraps it.
    pub fn load(path: &std::path::Path, groups: &[String]) -> NetlistResult<Self> {
        Self::new(Netlist::load(path)?, groups)
    }

    /// Returns the recomputation counters.
    pub fn stats(&self) -> RecomputeStats {
        self.stats
    }

    /// Sum of leakage over all instances.
    pub fn total_leakage(&mut self) -> f64 {
        self.refresh_leakage();
        self.leakage.iter().sum()
    }

    /// Instance name of `cell`.
    pub fn instance_name(&self, cell: CellId) -> DesignResult<&str> {
        Ok(&self.state(cell)?.name)
    }

    /// Looks up a cell by instance name.
    pub fn find(&self, name: &str) -> Option<CellId> {
        self.cells
            .iter()
            .position(|c| c.name == name)
            .map(|i| CellId::from_raw(i as u32))
    }

    /// Current variant of every instance, by instance name.
    pub fn assignment(&self) -> Vec<(String, VariantRef)> {
        self.cells
            .iter()
            .map(|c| (c.name.clone(), c.variant.clone()))
            .collect()
    }

    /// The original netlist with every instance set to its current variant.
    pub fn to_netlist(&self) -> Netlist {
        let mut netlist = self.netlist.clone();
        netlist.instances = self
            .netlist
            .instances
            .iter()
            .zip(&self.cells)
            .map(|(inst, cell)| Instance {
                library: cell.variant.library.clone(),
                cell: cell.variant.ref_name.clone(),
                ..inst.clone()
            })
            .collect();
        netlist
    }

    fn state(&self, cell: CellId) -> DesignResult<&CellState> {
        self.cells
            .get(cell.as_raw() as usize)
            .ok_or(DesignError::UnknownCell(cell))
    }

    fn info(&self, variant: &VariantRef) -> DesignResult<&LibCellInfo> {
        self.lib_cells
            .get(&(variant.library.clone(), variant.ref_name.clone()))
            .ok_or_else(|| DesignError::UnknownVariant(variant.clone()))
    }

    fn level(&self, cell: &CellState) -> usize {
        self.info(&cell.variant).map_or(0, |i| i.level)
    }

    fn recompute_timing(&mut self) {
        let delays: Vec<f64> = self
            .cells
            .iter()
            .map(|c| self.info(&c.variant).map_or(0.0, |i| i.delay))
            .collect();
        self.timing = analyze(&self.graph, &delays, self.netlist.clock_period);
        self.timing_dirty = false;
    }

    fn refresh_timing(&mut self) {
        if self.timing_dirty {
            self.recompute_timing();
            self.stats.incremental_timing_updates += 1;
        }
    }

    fn recompute_leakage(&mut self) {
        self.leakage = self
            .cells
            .iter()
            .map(|c| self.info(&c.variant).map_or(0.0, |i| i.leakage))
            .collect();
        self.power_dirty = false;
    }

    fn refresh_leakage(&mut self) {
        if self.power_dirty {
            self.recompute_leakage();
            self.stats.power_recomputes += 1;
        }
    }
}

impl CellQuery for NetlistDesign {
    fn cells(&self, filter: LadderFilter) -> Vec<CellId> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                let level = self.level(c);
                match filter {
                    LadderFilter::AtHighest => level == self.highest_level,
                    LadderFilter::AtLowest => level == 0,
                    LadderFilter::BelowHighest => level < self.highest_level,
                }
            })
            .map(|(i, _)| CellId::from_raw(i as u32))
            .collect()
    }

    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn class_key(&self, cell: CellId) -> DesignResult<&str> {
        Ok(&self.state(cell)?.class_key)
    }

    fn variant(&self, cell: CellId) -> DesignResult<VariantRef> {
        Ok(self.state(cell)?.variant.clone())
    }

    fn ladder_level(&self, cell: CellId) -> DesignResult<usize> {
        let state = self.state(cell)?;
        Ok(self.info(&state.variant)?.level)
    }
}

impl TimingOracle for NetlistDesign {
    fn cell_slack(&mut self, cell: CellId) -> DesignResult<f64> {
        self.state(cell)?;
        self.refresh_timing();
        Ok(self.timing.slack[cell.as_raw() as usize])
    }

    fn worst_slack(&mut self) -> f64 {
        self.refresh_timing();
        self.timing.worst_slack
    }

    fn update_timing(&mut self) {
        self.recompute_timing();
        self.stats.full_timing_updates += 1;
    }
}

impl PowerOracle for NetlistDesign {
    fn leakage_power(&mut self, cells: &[CellId]) -> DesignResult<Vec<f64>> {
        for &c in cells {
            self.state(c)?;
        }
        self.refresh_leakage();
        Ok(cells
            .iter()
            .map(|c| self.leakage[c.as_raw() as usize])
            .collect())
    }
}

impl CellMutator for NetlistDesign {
    fn size_cell(&mut self, cell: CellId, target: &VariantRef) -> DesignResult<()> {
        let current = &self.state(cell)?.variant;
        let current_fp = self.info(current)?.footprint.clone();
        let target_fp = &self.info(target)?.footprint;
        if current_fp != *target_fp {
            return Err(DesignError::FootprintMismatch {
                cell,
                current: current_fp,
                target: target_fp.clone(),
            });
        }
        self.cells[cell.as_raw() as usize].variant = target.clone();
        self.timing_dirty = true;
        self.power_dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three inverters in a chain; each level adds 0.1 ns and removes leakage.
    fn chain_json(period: f64) -> String {
        format!(
            r#"{{
            "clock_period": {period},
            "libraries": [
                {{ "name": "lib_lvt", "group": "lvt", "cells": [
                    {{ "name": "LVT_INV", "footprint": "INV", "leakage": 10.0, "delay": 0.1 }},
                    {{ "name": "LVT_NAND2", "footprint": "NAND2", "leakage": 12.0, "delay": 0.15 }} ] }},
                {{ "name": "lib_svt", "group": "svt", "cells": [
                    {{ "name": "SVT_INV", "footprint": "INV", "leakage": 6.0, "delay": 0.2 }} ] }},
                {{ "name": "lib_hvt", "group": "hvt", "cells": [
                    {{ "name": "HVT_INV", "footprint": "INV", "leakage": 3.0, "delay": 0.3 }} ] }}
            ],
            "instances": [
                {{ "name": "u0", "library": "lib_lvt", "cell": "LVT_INV" }},
                {{ "name": "u1", "library": "lib_lvt", "cell": "LVT_INV" }},
                {{ "name": "u2", "library": "lib_svt", "cell": "SVT_INV", "class_key": "inv" }}
            ],
            "arcs": [ {{ "from": "u0", "to": "u1" }}, {{ "from": "u1", "to": "u2" }} ]
        }}"#
        )
    }

    fn groups() -> Vec<String> {
        vec!["lvt".into(), "svt".into(), "hvt".into()]
    }

    fn design(period: f64) -> NetlistDesign {
        NetlistDesign::new(Netlist::from_json(&chain_json(period)).unwrap(), &groups()).unwrap()
    }

    fn id(i: u32) -> CellId {
        CellId::from_raw(i)
    }

    #[test]
    fn ladder_filters() {
        let d = design(1.0);
        assert_eq!(d.cells(LadderFilter::AtLowest), vec![id(0), id(1)]);
        assert_eq!(d.cells(LadderFilter::BelowHighest), vec![id(0), id(1), id(2)]);
        assert!(d.cells(LadderFilter::AtHighest).is_empty());
        assert_eq!(d.ladder_level(id(2)).unwrap(), 1);
        assert_eq!(d.class_key(id(0)).unwrap(), "u0");
        assert_eq!(d.class_key(id(2)).unwrap(), "inv");
    }

    #[test]
    fn initial_timing() {
        let mut d = design(1.0);
        // 0.1 + 0.1 + 0.2 = 0.4
        assert!((d.worst_slack() - 0.6).abs() < 1e-12);
        assert!((d.cell_slack(id(0)).unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(d.stats(), RecomputeStats::default());
    }

    #[test]
    fn swap_marks_caches_dirty() {
        let mut d = design(1.0);
        d.size_cell(id(0), &VariantRef::new("lib_svt", "SVT_INV")).unwrap();
        assert!((d.worst_slack() - 0.5).abs() < 1e-12);
        d.worst_slack();
        assert_eq!(d.stats().incremental_timing_updates, 1);

        let leak = d.leakage_power(&[id(0), id(1)]).unwrap();
        assert_eq!(leak, vec![6.0, 10.0]);
        d.leakage_power(&[id(2)]).unwrap();
        assert_eq!(d.stats().power_recomputes, 1);
    }

    #[test]
    fn update_timing_always_counts() {
        let mut d = design(1.0);
        d.update_timing();
        d.update_timing();
        assert_eq!(d.stats().full_timing_updates, 2);
        assert_eq!(d.stats().incremental_timing_updates, 0);
    }

    #[test]
    fn footprint_change_is_rejected() {
        let mut d = design(1.0);
        let err = d
            .size_cell(id(0), &VariantRef::new("lib_lvt", "LVT_NAND2"))
            .unwrap_err();
        assert_eq!(
            err,
            DesignError::FootprintMismatch {
                cell: id(0),
                current: "INV".into(),
                target: "NAND2".into(),
            }
        );
        assert_eq!(d.variant(id(0)).unwrap(), VariantRef::new("lib_lvt", "LVT_INV"));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let mut d = design(1.0);
        let target = VariantRef::new("lib_hvt", "HVT_NAND2");
        assert_eq!(
            d.size_cell(id(0), &target).unwrap_err(),
            DesignError::UnknownVariant(target)
        );
        assert!(matches!(
            d.cell_slack(id(9)),
            Err(DesignError::UnknownCell(_))
        ));
    }

    #[test]
    fn total_leakage_and_write_back() {
        let mut d = design(1.0);
        assert_eq!(d.total_leakage(), 26.0);
        d.size_cell(id(2), &VariantRef::new("lib_hvt", "HVT_INV")).unwrap();
        assert_eq!(d.total_leakage(), 23.0);

        let n = d.to_netlist();
        assert_eq!(n.instances[2].library, "lib_hvt");
        assert_eq!(n.instances[2].cell, "HVT_INV");
        assert_eq!(n.instances[2].class_key.as_deref(), Some("inv"));
        assert_eq!(d.assignment()[2].1, VariantRef::new("lib_hvt", "HVT_INV"));
        assert_eq!(d.find("u2"), Some(id(2)));
        assert_eq!(d.instance_name(id(1)).unwrap(), "u1");
    }

    #[test]
    fn library_off_the_ladder() {
        let netlist = Netlist::from_json(&chain_json(1.0)).unwrap();
        let err = NetlistDesign::new(netlist, &["lvt".to_string(), "svt".to_string()]).unwrap_err();
        assert!(matches!(err, NetlistError::UnknownGroup { ref group, .. } if group == "hvt"));
    }

    #[test]
    fn bad_instances_are_rejected() {
        let mut netlist = Netlist::from_json(&chain_json(1.0)).unwrap();
        netlist.instances[1].cell = "LVT_XOR2".into();
        assert!(matches!(
            NetlistDesign::new(netlist.clone(), &groups()),
            Err(NetlistError::UnknownCell { .. })
        ));
        netlist.instances[1].cell = "LVT_INV".into();
        netlist.instances[1].name = "u0".into();
        assert!(matches!(
            NetlistDesign::new(netlist, &groups()),
            Err(NetlistError::DuplicateInstance(_))
        ));
    }

    #[test]
    fn non_positive_period() {
        let netlist = Netlist::from_json(&chain_json(0.0)).unwrap();
        assert!(matches!(
            NetlistDesign::new(netlist, &groups()),
            Err(NetlistError::InvalidClockPeriod(_))
        ));
    }
}
