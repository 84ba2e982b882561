//! Diagnostic reporting and error tracking.
//!
//! [`DiagnosticHandler`] collects diagnostics for one compilation and
//! tracks severity counts. The error count only grows within a
//! compilation, so `has_errors()` is a monotone flag: once it returns
//! true, it returns true for the remainder of the unit. Codegen relies on
//! exactly that property to gate all further emission work.
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] provides type-level proof that at least one error
//! was reported. A function can only obtain one by actually emitting an
//! error, which prevents silently swallowed failure paths.

mod guarantee;
mod handler;

pub use guarantee::ErrorGuaranteed;
pub use handler::{Diagnostic, DiagnosticHandler, Severity};
