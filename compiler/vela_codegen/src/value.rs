//! Generated-value handles and global definitions.
//!
//! Codegen hands out opaque [`ValueRef`] handles for everything it
//! generates. The coordinator compares and stores handles; only the
//! generation engine knows what is behind them.

use vela_ir::Name;

/// Opaque reference to a generated value in the output module.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ValueRef(u32);

impl ValueRef {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        ValueRef(raw)
    }

    /// Raw handle value, for diagnostics only.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Linkage of a global definition.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Linkage {
    /// Visible outside the unit.
    External,
    /// Private to the unit (string literals, internal helpers).
    Internal,
    /// Merged across units; tentative definitions promote to this.
    Common,
}

/// What kind of global a definition is.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GlobalKind {
    Function,
    Var,
}

/// Initializer recorded for a global definition.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum GlobalInit {
    /// No initializer (declarations, functions).
    None,
    /// Zero-initialized storage.
    Zeroed,
    /// Constant integer.
    Const(i64),
    /// Reference to a deduplicated string literal.
    Str(ValueRef),
    /// Initialized at runtime by a module-scope constructor.
    Dynamic,
}

/// A global (function or variable) in the output module.
///
/// `defined` distinguishes a real definition from a placeholder
/// declaration awaiting promotion or replacement.
#[derive(Clone, PartialEq, Debug)]
pub struct GlobalDef {
    pub name: Name,
    pub symbol: String,
    pub value: ValueRef,
    pub kind: GlobalKind,
    pub linkage: Linkage,
    pub init: GlobalInit,
    /// Size in bytes; zero for functions.
    pub size: u64,
    pub defined: bool,
}

/// A module-scope constructor or destructor entry.
///
/// Lower priorities run earlier; entries with equal priority run in
/// discovery order.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CtorEntry {
    pub value: ValueRef,
    pub priority: u16,
}
