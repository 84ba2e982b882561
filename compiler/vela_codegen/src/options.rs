//! Codegen configuration.

/// Options controlling code generation for one unit.
///
/// Populated by the driver from compiler flags; codegen only reads it.
#[derive(Clone, Debug, Default)]
pub struct CodegenOptions {
    /// Generate debug metadata (enables required-type completion).
    pub debug_info: bool,
    /// Libraries the unit depends on regardless of pragmas, e.g. from
    /// `--dependent-lib` flags. Recorded at unit initialization.
    pub dependent_libraries: Vec<String>,
}
