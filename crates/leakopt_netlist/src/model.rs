//! Serializable netlist and cell-library description.
//!
//! The on-disk format is JSON:
//!
//! ```json
//! {
//!   "clock_period": 1.0,
//!   "libraries": [
//!     { "name": "lib_lvt", "group": "lvt",
//!       "cells": [{ "name": "LVT_INV", "footprint": "INV", "leakage": 10.0, "delay": 0.10 }] }
//!   ],
//!   "instances": [{ "name": "u1", "library": "lib_lvt", "cell": "LVT_INV" }],
//!   "arcs": [{ "from": "u1", "to": "u2", "delay": 0.02 }]
//! }
//! ```

use crate::error::{NetlistError, NetlistResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A placed netlist plus the libraries its cells come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Netlist {
    /// Required arrival time at every endpoint, in ns.
    pub clock_period: f64,
    /// Cell libraries, one per threshold group and process corner.
    pub libraries: Vec<Library>,
    /// Cell instances.
    pub instances: Vec<Instance>,
    /// Directed timing arcs between instances.
    #[serde(default)]
    pub arcs: Vec<Arc>,
}

/// One standard-cell library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    /// Library name.
    pub name: String,
    /// Threshold-group alias every cell of this library belongs to.
    pub group: String,
    /// Library cells.
    pub cells: Vec<LibCell>,
}

/// Characterization data for one library cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibCell {
    /// Reference name.
    pub name: String,
    /// Footprint shared by all threshold variants of this function.
    pub footprint: String,
    /// Leakage power.
    pub leakage: f64,
    /// Intrinsic input-to-output delay, in ns.
    pub delay: f64,
}

/// A cell instance in the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance name.
    pub name: String,
    /// Library of the current variant.
    pub library: String,
    /// Reference name of the current variant.
    pub cell: String,
    /// Design-level key under which leakage savings are recorded; defaults
    /// to the instance name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_key: Option<String>,
}

/// A timing arc from the output of one instance to the input of another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Driving instance.
    pub from: String,
    /// Driven instance.
    pub to: String,
    /// Wire delay along the arc, in ns.
    #[serde(default)]
    pub delay: f64,
}

impl Netlist {
    /// Parses a netlist from a JSON string.
    pub fn from_json(source: &str) -> NetlistResult<Self> {
        serde_json::from_str(source).map_err(NetlistError::Parse)
    }

    /// Reads and parses a netlist file.
    pub fn load(path: &Path) -> NetlistResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Serializes the netlist as pretty-printed JSON.
    pub fn to_json(&self) -> NetlistResult<String> {
        serde_json::to_string_pretty(self).map_err(NetlistError::Parse)
    }

    /// Writes the netlist to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> NetlistResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Looks up a library by name.
    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.name == name)
    }
}

impl Library {
    /// Looks up a cell by reference name.
    pub fn cell(&self, name: &str) -> Option<&LibCell> {
        self.cells.iter().find(|c| c.name == name)
    }
}
