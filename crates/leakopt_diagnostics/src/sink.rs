//! Thread-safe, severity-filtered diagnostic accumulator.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for diagnostics emitted during optimization.
///
/// Diagnostics below the sink's threshold are dropped on
/// [`emit`](Self::emit). A [`disabled`](Self::disabled) sink has no threshold
/// and drops everything, which makes it the no-op default for callers that
/// are not interested in progress output. The error count is tracked
/// atomically, and counts errors even when they are filtered out.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    threshold: Option<Severity>,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a sink that keeps every diagnostic.
    pub fn new() -> Self {
        Self::with_threshold(Severity::Debug)
    }

    /// Creates a sink that keeps diagnostics at or above `threshold`.
    pub fn with_threshold(threshold: Severity) -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            threshold: Some(threshold),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Creates a sink that discards every diagnostic.
    pub fn disabled() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            threshold: None,
            error_count: AtomicUsize::new(0),
        }
    }

    /// Returns `true` if a diagnostic of `severity` would be kept.
    ///
    /// Callers use this to skip building expensive messages.
    pub fn enabled(&self, severity: Severity) -> bool {
        self.threshold.is_some_and(|t| severity >= t)
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity == Severity::Error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        if !self.enabled(diag.severity) {
            return;
        }
        let mut diagnostics = self
            .diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        diagnostics.push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self
            .diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *diagnostics)
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = self
            .diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        diagnostics.clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};

    fn make_error() -> Diagnostic {
        Diagnostic::error(DiagnosticCode::new(Category::Internal, 1), "test error")
    }

    fn make_debug() -> Diagnostic {
        Diagnostic::debug(DiagnosticCode::new(Category::Search, 201), "test debug")
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn threshold_filters_low_severity() {
        let sink = DiagnosticSink::with_threshold(Severity::Note);
        sink.emit(make_debug());
        sink.emit(make_error());
        let all = sink.diagnostics();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].severity, Severity::Error);
    }

    #[test]
    fn disabled_sink_drops_everything() {
        let sink = DiagnosticSink::disabled();
        assert!(!sink.enabled(Severity::Error));
        sink.emit(make_debug());
        sink.emit(make_error());
        assert!(sink.diagnostics().is_empty());
        // Errors are still counted even when not retained
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn default_is_disabled() {
        let sink = DiagnosticSink::default();
        assert!(!sink.enabled(Severity::Debug));
    }

    #[test]
    fn take_all_drains() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error());
        sink.emit(make_debug());
        assert_eq!(sink.take_all().len(), 2);
        assert!(sink.take_all().is_empty());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let sink = Arc::clone(&sink);
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    sink.emit(make_error());
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sink.error_count(), 400);
        assert_eq!(sink.diagnostics().len(), 400);
    }
}
