//! Time-budgeted, batch-adaptive global optimization loop.
//!
//! Each outer iteration ranks candidates with the [`GlobalRanker`] and walks
//! the ranking in batches, forcing a full timing update after every batch.
//! A violating batch is reverted and the walk restarts from the top of the
//! ranking with a batch one smaller; a batch size of zero ends the walk with
//! whatever was accepted so far. Iteration time covers the ranking as well
//! as the walk.
//!
//! The loop exits when the ranking is empty, when the predicted end of the
//! next iteration would overrun the budget, or (outside fast mode) when two
//! successive rankings propose the same multiset of class keys.

use crate::error::EngineResult;
use crate::rank::{GlobalRanker, Ranker, RankingEntry};
use crate::swap::{apply_batch, revert_batch};
use leakopt_design::Design;
use leakopt_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Smoothing factor of the iteration-duration moving average.
pub const EMA_ALPHA: f64 = 0.3;

const GLOBAL_ITERATION: DiagnosticCode = DiagnosticCode::new(Category::Search, 20);
const GLOBAL_BATCH_REJECTED: DiagnosticCode = DiagnosticCode::new(Category::Search, 21);
const GLOBAL_DONE: DiagnosticCode = DiagnosticCode::new(Category::Search, 22);

/// Exponential moving average of iteration durations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DurationEma {
    value: Option<Duration>,
}

impl DurationEma {
    /// Creates an unset average.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one observation in: the first sample seeds the average.
    pub fn update(&mut self, sample: Duration) -> Duration {
        let next = match self.value {
            None => sample,
            Some(dt) => sample.mul_f64(EMA_ALPHA) + dt.mul_f64(1.0 - EMA_ALPHA),
        };
        self.value = Some(next);
        next
    }

    /// Returns the current average, if any sample has been seen.
    pub fn get(&self) -> Option<Duration> {
        self.value
    }
}

/// Start time, ceiling, and iteration-duration estimate of a run.
#[derive(Clone, Copy, Debug)]
pub struct Budget {
    start: Instant,
    max_duration: Duration,
    ema: DurationEma,
}

impl Budget {
    /// Creates a budget ending `max_duration` after `start`.
    pub fn new(start: Instant, max_duration: Duration) -> Self {
        Self {
            start,
            max_duration,
            ema: DurationEma::new(),
        }
    }

    /// Records the duration of a finished iteration.
    pub fn record_iteration(&mut self, duration: Duration) -> Duration {
        self.ema.update(duration)
    }

    /// Returns `true` if another iteration started at `now` is predicted to
    /// end at or after the deadline.
    pub fn exhausted_at(&self, now: Instant) -> bool {
        let dt = self.ema.get().unwrap_or_default();
        now + dt >= self.start + self.max_duration
    }

    /// Time left before the deadline at `now`.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        (self.start + self.max_duration).saturating_duration_since(now)
    }

    /// Current iteration-duration estimate.
    pub fn estimate(&self) -> Option<Duration> {
        self.ema.get()
    }
}

/// Knobs of the global loop.
#[derive(Clone, Copy, Debug)]
pub struct GlobalLoopParams {
    /// First batch size of every inner walk; at least 1.
    pub initial_batch_size: usize,
    /// When the run started.
    pub start: Instant,
    /// Wall-clock ceiling measured from `start`.
    pub max_duration: Duration,
    /// Skips lockstep detection.
    pub fast_mode: bool,
}

/// Why the global loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GlobalStopReason {
    /// The ranking came back empty.
    Converged,
    /// The next iteration was predicted to overrun the budget.
    TimeBudget,
    /// Two successive rankings proposed the same candidates.
    Lockstep,
}

/// What the global loop did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlobalOutcome {
    /// Outer iterations completed.
    pub iterations: usize,
    /// Batches kept.
    pub accepted_batches: usize,
    /// Batches reverted.
    pub rejected_batches: usize,
    /// Cells swapped by accepted batches.
    pub swaps_committed: usize,
    /// Final iteration-duration estimate, in milliseconds.
    pub iteration_estimate_ms: Option<f64>,
    /// Why the loop stopped.
    pub stop: GlobalStopReason,
}

/// Runs the global loop until convergence, budget exhaustion, or lockstep.
pub fn run_global_loop<D: Design + ?Sized>(
    design: &mut D,
    ranker: &GlobalRanker<'_>,
    params: GlobalLoopParams,
    sink: &DiagnosticSink,
) -> EngineResult<GlobalOutcome> {
    let mut budget = Budget::new(params.start, params.max_duration);
    let mut outcome = GlobalOutcome {
        iterations: 0,
        accepted_batches: 0,
        rejected_batches: 0,
        swaps_committed: 0,
        iteration_estimate_ms: None,
        stop: GlobalStopReason::Converged,
    };

    let mut previous: Option<Vec<RankingEntry>> = None;
    let stop = loop {
        let iteration_start = Instant::now();
        let ranking = ranker.rank(design)?;
        if ranking.is_empty() {
            break GlobalStopReason::Converged;
        }
        if !params.fast_mode
            && previous
                .as_deref()
                .is_some_and(|prev| same_candidates(prev, &ranking))
        {
            break GlobalStopReason::Lockstep;
        }

        let committed = adaptive_walk(
            design,
            &ranking,
            params.initial_batch_size.max(1),
            &mut outcome,
            sink,
        )?;
        outcome.iterations += 1;

        let dt = budget.record_iteration(iteration_start.elapsed());
        let now = Instant::now();
        sink.emit(Diagnostic::note(
            GLOBAL_ITERATION,
            format!(
                "global iteration {}: {committed} of {} candidates committed, est. {:.1} ms/iteration, {:.1} ms left",
                outcome.iterations,
                ranking.len(),
                dt.as_secs_f64() * 1e3,
                budget.remaining_at(now).as_secs_f64() * 1e3
            ),
        ));

        if budget.exhausted_at(now) {
            break GlobalStopReason::TimeBudget;
        }
        previous = Some(ranking);
    };

    outcome.stop = stop;
    outcome.iteration_estimate_ms = budget.estimate().map(|d| d.as_secs_f64() * 1e3);
    sink.emit(Diagnostic::note(
        GLOBAL_DONE,
        format!(
            "global optimization ({:?} candidates) stopped ({stop:?}) after {} iteration(s), {} swaps committed",
            ranker.mode(),
            outcome.iterations,
            outcome.swaps_committed
        ),
    ));
    Ok(outcome)
}

/// Walks `ranking` in batches, shrinking the batch by one on every violation.
///
/// After a violation the walk restarts from the first entry. Entries already
/// accepted are re-applied as no-ops and do not count again. Returns the
/// number of cells whose variant changed. Every batch left in place has been
/// validated by a forced full timing update.
fn adaptive_walk<D: Design + ?Sized>(
    design: &mut D,
    ranking: &[RankingEntry],
    initial_batch_size: usize,
    outcome: &mut GlobalOutcome,
    sink: &DiagnosticSink,
) -> EngineResult<usize> {
    let mut batch_size = initial_batch_size;
    let mut offset = 0;
    let mut committed = 0;

    while offset < ranking.len() {
        let end = (offset + batch_size).min(ranking.len());
        let undo = apply_batch(design, &ranking[offset..end])?;
        design.update_timing();
        let worst = design.worst_slack();

        if worst >= 0.0 {
            let changed = ranking[offset..end]
                .iter()
                .zip(undo.iter())
                .filter(|(entry, (_, original))| *original != entry.target)
                .count();
            outcome.accepted_batches += 1;
            outcome.swaps_committed += changed;
            committed += changed;
            offset = end;
            continue;
        }

        revert_batch(design, &undo)?;
        outcome.rejected_batches += 1;
        batch_size -= 1;
        if sink.enabled(Severity::Debug) {
            sink.emit(Diagnostic::debug(
                GLOBAL_BATCH_REJECTED,
                format!(
                    "batch at offset {offset} violates timing ({worst:.4}), restarting with batch size {batch_size}"
                ),
            ));
        }
        if batch_size == 0 {
            break;
        }
        offset = 0;
    }
    Ok(committed)
}

/// `true` if both rankings have the same length and class-key multiset.
fn same_candidates(a: &[RankingEntry], b: &[RankingEntry]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut ka: Vec<&str> = a.iter().map(|e| e.class_key.as_str()).collect();
    let mut kb: Vec<&str> = b.iter().map(|e| e.class_key.as_str()).collect();
    ka.sort_unstable();
    kb.sort_unstable();
    ka == kb
}
