//! Cheap wholesale-swap-and-derate optimization loop.
//!
//! Each pass swaps the top of a ranking in one batch and forces a full timing
//! update. A clean batch is kept and the design is re-ranked; a violating
//! batch is reverted and retried at `floor(size × derate)` against the same
//! ranking. The loop stops when the ranking is empty or the batch size
//! reaches zero.

use crate::error::EngineResult;
use crate::rank::Ranker;
use crate::swap::{apply_batch, revert_batch};
use leakopt_design::Design;
use leakopt_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use serde::Serialize;

const LOCAL_ACCEPTED: DiagnosticCode = DiagnosticCode::new(Category::Search, 10);
const LOCAL_REJECTED: DiagnosticCode = DiagnosticCode::new(Category::Search, 11);
const LOCAL_DONE: DiagnosticCode = DiagnosticCode::new(Category::Search, 12);

/// Batch sizing for the local loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LocalLoopParams {
    /// Share of the ranking to swap per pass, in `(0, 1]`.
    pub select_fraction: f64,
    /// Shrink factor after a violating batch, in `[0, 1)`.
    pub derate_fraction: f64,
}

/// What the local loop did.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LocalOutcome {
    /// Batches kept.
    pub accepted_batches: usize,
    /// Batches reverted.
    pub rejected_batches: usize,
    /// Cells swapped by accepted batches.
    pub swaps_committed: usize,
}

/// Runs the local loop to completion.
pub fn run_local_loop<D: Design + ?Sized, R: Ranker>(
    design: &mut D,
    ranker: &R,
    params: LocalLoopParams,
    sink: &DiagnosticSink,
) -> EngineResult<LocalOutcome> {
    let mut outcome = LocalOutcome::default();
    let mut ranking = ranker.rank(design)?;
    let mut target = select_count(ranking.len(), params.select_fraction);

    while !ranking.is_empty() && target > 0 {
        let batch = &ranking[..target.min(ranking.len())];
        let undo = apply_batch(design, batch)?;
        design.update_timing();
        let worst = design.worst_slack();

        if worst >= 0.0 {
            outcome.accepted_batches += 1;
            outcome.swaps_committed += undo.len();
            sink.emit(Diagnostic::note(
                LOCAL_ACCEPTED,
                format!("local pass accepted {} swaps, worst slack {worst:.4}", undo.len()),
            ));
            ranking = ranker.rank(design)?;
            target = select_count(ranking.len(), params.select_fraction);
        } else {
            revert_batch(design, &undo)?;
            outcome.rejected_batches += 1;
            let shrunk = derate(target, params.derate_fraction);
            if sink.enabled(Severity::Debug) {
                sink.emit(Diagnostic::debug(
                    LOCAL_REJECTED,
                    format!(
                        "local batch of {} violates timing ({worst:.4}), retrying with {shrunk}",
                        undo.len()
                    ),
                ));
            }
            target = shrunk;
        }
    }

    sink.emit(
        Diagnostic::note(
            LOCAL_DONE,
            format!("local optimization committed {} swaps", outcome.swaps_committed),
        )
        .with_note(format!(
            "{} accepted, {} rejected batches",
            outcome.accepted_batches, outcome.rejected_batches
        )),
    );
    Ok(outcome)
}

/// `ceil(n × fraction)`, clamped to `n`.
pub fn select_count(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).ceil() as usize).min(n)
}

/// `floor(size × fraction)`.
pub fn derate(size: usize, fraction: f64) -> usize {
    (size as f64 * fraction).floor() as usize
}
