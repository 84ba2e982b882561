//! Type-level proof that an error was emitted.

use std::fmt;

/// Zero-sized proof that at least one error diagnostic was reported.
///
/// Only [`DiagnosticHandler`](crate::DiagnosticHandler) can mint one, by
/// emitting an error. Code that bails out early can return this to prove
/// the failure was reported rather than swallowed.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    /// Construct from a nonzero error count.
    ///
    /// Returns `None` when `count` is zero: no error means no proof.
    #[must_use]
    pub fn from_error_count(count: usize) -> Option<Self> {
        (count > 0).then_some(ErrorGuaranteed(()))
    }

    pub(crate) fn mint() -> Self {
        ErrorGuaranteed(())
    }
}

impl fmt::Display for ErrorGuaranteed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error(s) emitted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_error_count_returns_some_for_nonzero() {
        assert!(ErrorGuaranteed::from_error_count(1).is_some());
        assert!(ErrorGuaranteed::from_error_count(100).is_some());
    }

    #[test]
    fn from_error_count_returns_none_for_zero() {
        assert!(ErrorGuaranteed::from_error_count(0).is_none());
    }

    #[test]
    fn display_shows_error_message() {
        let g = ErrorGuaranteed::mint();
        assert_eq!(g.to_string(), "error(s) emitted");
    }
}
