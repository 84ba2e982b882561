//! Immutable per-compilation context.

use crate::{StringInterner, TargetInfo, TypeTable};

/// The immutable bundle codegen borrows for the duration of one
/// compilation: interner, type table, and target description.
///
/// Owned by the driver; everything downstream takes `&'tcx
/// CompilationContext` and never outlives it. Borrowed references, not
/// `Arc`: there is one owner and a well-defined lifetime.
pub struct CompilationContext {
    pub interner: StringInterner,
    pub types: TypeTable,
    pub target: TargetInfo,
}

impl CompilationContext {
    /// Create a context for the given target.
    #[must_use]
    pub fn new(target: TargetInfo) -> Self {
        Self {
            interner: StringInterner::new(),
            types: TypeTable::new(),
            target,
        }
    }
}
