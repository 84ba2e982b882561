//! Debug-info subcomponent.
//!
//! Tracks which referenced types have had their full definitions become
//! available, so previously incomplete type descriptions can be finished.
//! Only the completion bookkeeping lives here; rendering the actual debug
//! metadata is a later concern of module serialization.

use rustc_hash::FxHashSet;
use tracing::debug;

use vela_ir::{Decl, Name};

/// Collects completed required-type descriptions for one unit.
#[derive(Default)]
pub struct DebugInfoBuilder {
    completed: FxHashSet<Name>,
    order: Vec<Name>,
}

impl DebugInfoBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete the description of a type whose full definition just
    /// became available. Idempotent per type.
    pub fn complete_required_type(&mut self, decl: &Decl) {
        if self.completed.insert(decl.name) {
            self.order.push(decl.name);
            debug!(target: "vela_codegen", decl = decl.id.index(), "completed required type");
        }
    }

    /// Whether a type's description has been completed.
    pub fn is_completed(&self, name: Name) -> bool {
        self.completed.contains(&name)
    }

    /// Completed types in completion order.
    pub fn completed_types(&self) -> &[Name] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_ir::{DeclArena, DeclAttrs, DeclKind, StringInterner, TypeId};

    #[test]
    fn test_completion_is_idempotent() {
        let interner = StringInterner::new();
        let mut arena = DeclArena::new();
        let decl = arena
            .alloc(
                interner.intern("Widget"),
                DeclKind::Record {
                    ty: TypeId::PTR,
                    has_key_function: false,
                },
                DeclAttrs::empty(),
            )
            .id;

        let mut di = DebugInfoBuilder::new();
        di.complete_required_type(arena.get(decl));
        di.complete_required_type(arena.get(decl));

        assert_eq!(di.completed_types().len(), 1);
        assert!(di.is_completed(arena.get(decl).name));
    }
}
