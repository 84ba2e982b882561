//! Deferred emission policy.
//!
//! Central decision tables for "emit now, defer, or skip". Decisions are
//! pure functions of declaration attributes and call context so they can
//! be tested in isolation; the gate check (no work after an error) lives
//! in the module builder, not here.

use vela_ir::DeclAttrs;

/// Outcome of an emission policy decision.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EmitDecision {
    /// Emit immediately.
    Emit,
    /// Postpone; eligibility is re-checked at the end of the unit.
    Defer,
    /// Do not emit; the declaration stays available for on-demand
    /// emission if something references it later.
    Skip,
}

/// Attributes that force an inline method definition to be emitted at the
/// point of definition.
const INLINE_EMIT_ATTRS: DeclAttrs = DeclAttrs::USED
    .union(DeclAttrs::CONSTRUCTOR)
    .union(DeclAttrs::EXPORTED);

/// Decide whether an inline method definition is emitted where it is
/// defined.
///
/// A method inside a context that still depends on an uninstantiated
/// template parameter can never be emitted here. Otherwise it is emitted
/// only when marked used, as a must-run constructor, or for forced
/// external visibility.
#[must_use]
pub fn inline_method_decision(attrs: DeclAttrs) -> EmitDecision {
    if attrs.contains(DeclAttrs::DEPENDENT_CONTEXT) {
        EmitDecision::Skip
    } else if attrs.intersects(INLINE_EMIT_ATTRS) {
        EmitDecision::Emit
    } else {
        EmitDecision::Skip
    }
}

/// Decide whether a record's virtual table is emitted when requested.
///
/// The caller asserts `definition_required` when the record's key method
/// is defined in this unit; only then does the table go out at the request
/// site. Every other request is deferred and re-checked at the end of the
/// unit: a record with no out-of-line key method has no designated home
/// unit, so the deferred entry is emitted after all, while a keyed record
/// owned by another unit is dropped.
#[must_use]
pub fn vtable_decision(definition_required: bool) -> EmitDecision {
    if definition_required {
        EmitDecision::Emit
    } else {
        EmitDecision::Defer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_method_requires_emit_attr() {
        assert_eq!(
            inline_method_decision(DeclAttrs::empty()),
            EmitDecision::Skip
        );
        assert_eq!(inline_method_decision(DeclAttrs::USED), EmitDecision::Emit);
        assert_eq!(
            inline_method_decision(DeclAttrs::CONSTRUCTOR),
            EmitDecision::Emit
        );
        assert_eq!(
            inline_method_decision(DeclAttrs::EXPORTED),
            EmitDecision::Emit
        );
    }

    #[test]
    fn test_dependent_context_always_skips() {
        let attrs = DeclAttrs::DEPENDENT_CONTEXT | DeclAttrs::USED;
        assert_eq!(inline_method_decision(attrs), EmitDecision::Skip);
    }

    #[test]
    fn test_vtable_required_emits() {
        assert_eq!(vtable_decision(true), EmitDecision::Emit);
    }

    #[test]
    fn test_vtable_defers_without_requirement() {
        assert_eq!(vtable_decision(false), EmitDecision::Defer);
    }
}
