//! Leveled, structured diagnostics for the optimization engine.
//!
//! Engine components report progress and anomalies as [`Diagnostic`] values
//! with a [`Severity`] and a [`DiagnosticCode`]. The thread-safe
//! [`DiagnosticSink`] filters by a minimum severity and accumulates them; a
//! disabled sink discards everything and is the default for library callers.
//! [`TerminalRenderer`] formats diagnostics for the CLI.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
