//! `leakopt run`: optimize a netlist for leakage.
//!
//! Loads the config and netlist, runs the recipe, prints the report, and
//! optionally writes the optimized netlist back out.

use std::path::Path;

use leakopt_engine::{Recipe, RecipeParams, RecipeReport, VariantModel};

use crate::pipeline::{load_inputs, make_sink, render_diagnostics};
use crate::{GlobalArgs, ReportFormat, RunArgs};

/// Runs the `leakopt run` command.
///
/// Returns exit code 0 on success, 1 if any error diagnostic was emitted.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let netlist_path = Path::new(&args.netlist);
    let (config, mut design) = load_inputs(global, netlist_path)?;

    let mut params = RecipeParams::from(&config.recipe);
    if let Some(max) = args.max_duration {
        params.max_duration = max;
    }

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Optimizing {} ({} cells, budget {:.1}s)",
            netlist_path.display(),
            leakopt_design::CellQuery::cell_count(&design),
            params.max_duration.as_secs_f64()
        );
    }

    let leakage_before = design.total_leakage();
    let sink = make_sink(global);
    let recipe = Recipe::new(VariantModel::from_config(&config), params);
    let result = recipe.run(&mut design, &sink);
    render_diagnostics(&sink, args.format, global);
    let report = result?;
    let leakage_after = design.total_leakage();

    if let Some(ref output) = args.output {
        design.to_netlist().save(Path::new(output))?;
        if !global.quiet && args.format == ReportFormat::Text {
            eprintln!("      Wrote {output}");
        }
    }

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                print!("{}", format_report(&report, leakage_before, leakage_after));
            }
        }
        ReportFormat::Json => {
            let value = serde_json::json!({
                "report": report,
                "leakage_before": leakage_before,
                "leakage_after": leakage_after,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Renders the run summary for the terminal.
pub fn format_report(report: &RecipeReport, leakage_before: f64, leakage_after: f64) -> String {
    let saved = if leakage_before > 0.0 {
        100.0 * (leakage_before - leakage_after) / leakage_before
    } else {
        0.0
    };
    let mut out = String::new();
    out.push_str(&format!(
        "strategy     {:?} ({} cells)\n",
        report.strategy, report.cell_count
    ));
    out.push_str(&format!(
        "worst slack  {:.4} -> {:.4}\n",
        report.initial_worst_slack, report.final_worst_slack
    ));
    out.push_str(&format!(
        "leakage      {leakage_before:.4} -> {leakage_after:.4} ({saved:.1}% saved)\n"
    ));
    out.push_str(&format!("changed      {} cells\n", report.cells_changed));
    out.push_str(&format!(
        "local loop   {} accepted, {} rejected batches\n",
        report.local.accepted_batches, report.local.rejected_batches
    ));
    out.push_str(&format!(
        "global loop  {} iteration(s), stopped: {:?}\n",
        report.global.iterations,
        report.stop_reason()
    ));
    out.push_str(&format!("elapsed      {:.3}s\n", report.elapsed_secs));
    out
}
