//! Diagnostic handler with severity counting.

use std::cell::{Cell, RefCell};

use tracing::{debug, error, warn};

use crate::ErrorGuaranteed;

/// Diagnostic severity.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

/// A single diagnostic.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Collects diagnostics for one compilation.
///
/// Single-threaded by design (the parser drives compilation
/// call-and-return), so counters are plain `Cell`s. The error count is
/// monotone: nothing ever resets it within a compilation, which makes
/// [`Self::has_errors`] a one-way gate.
#[derive(Default)]
pub struct DiagnosticHandler {
    errors: Cell<usize>,
    warnings: Cell<usize>,
    emitted: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic, updating severity counts.
    pub fn report(&self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                self.errors.set(self.errors.get() + 1);
                error!(target: "vela_diagnostic", "{}", diag.message);
            }
            Severity::Warning => {
                self.warnings.set(self.warnings.get() + 1);
                warn!(target: "vela_diagnostic", "{}", diag.message);
            }
            Severity::Note => {
                debug!(target: "vela_diagnostic", "{}", diag.message);
            }
        }
        self.emitted.borrow_mut().push(diag);
    }

    /// Report an error, returning proof that one was emitted.
    pub fn error(&self, message: impl Into<String>) -> ErrorGuaranteed {
        self.report(Diagnostic::error(message));
        ErrorGuaranteed::mint()
    }

    /// Whether any error has been reported. Monotone within a compilation:
    /// once true, stays true.
    pub fn has_errors(&self) -> bool {
        self.errors.get() > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.get()
    }

    /// Proof of error if any was reported.
    pub fn error_guaranteed(&self) -> Option<ErrorGuaranteed> {
        ErrorGuaranteed::from_error_count(self.errors.get())
    }

    /// All diagnostics reported so far, in emission order.
    pub fn emitted(&self) -> Vec<Diagnostic> {
        self.emitted.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_trips_gate() {
        let handler = DiagnosticHandler::new();
        assert!(!handler.has_errors());

        let _guarantee = handler.error("type mismatch");
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_warnings_do_not_trip_gate() {
        let handler = DiagnosticHandler::new();
        handler.report(Diagnostic::warning("unused variable"));
        assert!(!handler.has_errors());
        assert_eq!(handler.warning_count(), 1);
    }

    #[test]
    fn test_emission_order_preserved() {
        let handler = DiagnosticHandler::new();
        handler.report(Diagnostic::warning("first"));
        handler.error("second");

        let emitted = handler.emitted();
        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[0].message, "first");
        assert_eq!(emitted[1].severity, Severity::Error);
    }

    #[test]
    fn test_error_guaranteed_only_with_errors() {
        let handler = DiagnosticHandler::new();
        assert!(handler.error_guaranteed().is_none());
        handler.error("boom");
        assert!(handler.error_guaranteed().is_some());
    }
}
