//! Shared helpers for CLI commands.
//!
//! Config discovery, netlist loading, sink construction, and diagnostic
//! rendering, used by both `run` and `report`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use leakopt_config::LeakoptConfig;
use leakopt_diagnostics::{
    DiagnosticRenderer, DiagnosticSink, JsonRenderer, Severity, TerminalRenderer,
};
use leakopt_netlist::NetlistDesign;

use crate::{GlobalArgs, ReportFormat};

/// Name of the configuration file looked up when `--config` is not given.
pub const CONFIG_FILE: &str = "leakopt.toml";

/// Finds the configuration file for `netlist`.
///
/// An explicit `--config` wins. Otherwise `leakopt.toml` is looked up next
/// to the netlist, then in the current directory.
pub fn resolve_config_path(
    global: &GlobalArgs,
    netlist: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref path) = global.config {
        return Ok(PathBuf::from(path));
    }
    let beside = netlist
        .parent()
        .map(|dir| dir.join(CONFIG_FILE))
        .filter(|p| p.is_file());
    if let Some(path) = beside {
        return Ok(path);
    }
    let cwd = std::env::current_dir()?.join(CONFIG_FILE);
    if cwd.is_file() {
        Ok(cwd)
    } else {
        Err(format!(
            "could not find {CONFIG_FILE} next to {} or in the current directory",
            netlist.display()
        )
        .into())
    }
}

/// Loads the configuration and the netlist it applies to.
pub fn load_inputs(
    global: &GlobalArgs,
    netlist: &Path,
) -> Result<(LeakoptConfig, NetlistDesign), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(global, netlist)?;
    let config = leakopt_config::load_config(&config_path)?;
    let design = NetlistDesign::load(netlist, &config.ladder.groups)?;
    Ok((config, design))
}

/// Builds the sink for the requested verbosity.
pub fn make_sink(global: &GlobalArgs) -> DiagnosticSink {
    let threshold = if global.verbose {
        Severity::Debug
    } else if global.quiet {
        Severity::Warning
    } else {
        Severity::Note
    };
    DiagnosticSink::with_threshold(threshold)
}

/// Writes every collected diagnostic to stderr.
pub fn render_diagnostics(sink: &DiagnosticSink, format: ReportFormat, global: &GlobalArgs) {
    let renderer: Box<dyn DiagnosticRenderer> = match format {
        ReportFormat::Text => Box::new(TerminalRenderer::new(global.color)),
        ReportFormat::Json => Box::new(JsonRenderer),
    };
    for diag in sink.take_all() {
        eprint!("{}", renderer.render(&diag));
    }
}

/// Parses a duration given as plain seconds (`"90"`, `"2.5"`) or with a unit
/// suffix (`"90s"`, `"5m"`, `"1h"`).
pub fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    if let Ok(secs) = s.trim().parse::<f64>() {
        return Duration::try_from_secs_f64(secs).map_err(|e| e.to_string());
    }
    leakopt_config::parse_duration(s).ok_or_else(|| format!("invalid duration '{s}'"))
}
