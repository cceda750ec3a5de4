//! `leakopt report`: summarize a netlist without optimizing it.

use std::path::Path;

use leakopt_common::LadderFilter;
use leakopt_design::{CellQuery, TimingOracle};
use leakopt_netlist::NetlistDesign;

use crate::pipeline::load_inputs;
use crate::{GlobalArgs, ReportArgs, ReportFormat};

/// Cell count, leakage, slack, and per-group population of a design.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DesignSummary {
    /// Number of cell instances.
    pub cell_count: usize,
    /// Sum of leakage over all instances.
    pub total_leakage: f64,
    /// Worst endpoint slack.
    pub worst_slack: f64,
    /// Instances per threshold group, lowest group first.
    pub groups: Vec<(String, usize)>,
}

/// Runs the `leakopt report` command.
pub fn run(args: &ReportArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, mut design) = load_inputs(global, Path::new(&args.netlist))?;
    let summary = summarize(&mut design, &config.ladder.groups)?;

    match args.format {
        ReportFormat::Text => {
            println!("cells        {}", summary.cell_count);
            println!("leakage      {:.4}", summary.total_leakage);
            println!("worst slack  {:.4}", summary.worst_slack);
            for (group, count) in &summary.groups {
                println!("  {group:<10} {count}");
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(0)
}

/// Collects the summary for `design` on the given ladder.
pub fn summarize(
    design: &mut NetlistDesign,
    groups: &[String],
) -> Result<DesignSummary, Box<dyn std::error::Error>> {
    let mut counts = vec![0usize; groups.len()];
    let mut all = design.cells(LadderFilter::AtHighest);
    all.extend(design.cells(LadderFilter::BelowHighest));
    for cell in all {
        let level = design.ladder_level(cell)?;
        if let Some(count) = counts.get_mut(level) {
            *count += 1;
        }
    }
    Ok(DesignSummary {
        cell_count: design.cell_count(),
        total_leakage: design.total_leakage(),
        worst_slack: design.worst_slack(),
        groups: groups.iter().cloned().zip(counts).collect(),
    })
}
