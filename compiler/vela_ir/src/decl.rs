//! Top-level declarations.
//!
//! Declarations are the unit of work the parser hands to codegen. The
//! kind is a closed tagged variant so emission policy can match
//! exhaustively, and attributes are a bitset evaluated against static
//! decision tables rather than open-ended node inspection.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::{Name, TypeId};

/// Default priority for module-scope initializers and teardown entries.
///
/// Lower priorities run earlier; this is the "no preference" bucket.
pub const DEFAULT_INIT_PRIORITY: u16 = 65_535;

/// Identity of a declaration within its [`DeclArena`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct DeclId(u32);

impl DeclId {
    /// Index into the owning arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Declaration attributes relevant to emission decisions.
    ///
    /// Evaluated against static decision tables in the emission policy;
    /// see `vela_codegen::policy`.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct DeclAttrs: u16 {
        /// Explicitly marked as used; must survive dead-code stripping.
        const USED = 1 << 0;
        /// Marked as a constructor/initializer that must run.
        const CONSTRUCTOR = 1 << 1;
        /// Forced external visibility (exported from the unit).
        const EXPORTED = 1 << 2;
        /// Enclosing context depends on an uninstantiated template
        /// parameter; the declaration cannot be emitted yet.
        const DEPENDENT_CONTEXT = 1 << 3;
    }
}

/// Initializer of a variable definition.
#[derive(Clone, PartialEq, Debug)]
pub enum Initializer {
    /// Zero-initialized storage.
    Zeroed,
    /// Constant integer initializer.
    Const(i64),
    /// Constant string-literal initializer; deduplicated at emission.
    Str(String),
    /// Runtime initializer; registers a module-scope constructor with the
    /// given priority.
    Dynamic { priority: u16 },
}

/// The closed set of declaration kinds codegen dispatches on.
#[derive(Clone, PartialEq, Debug)]
pub enum DeclKind {
    /// A function; `has_body` distinguishes a definition from a forward
    /// declaration.
    Function { has_body: bool },
    /// A variable. `init: None` is a tentative definition: merge-eligible
    /// with other tentative declarations of the same name, and promoted to
    /// a zero-initialized definition only if no true definition appears.
    Var {
        ty: TypeId,
        init: Option<Initializer>,
        /// Needs a module-scope teardown entry (runs at unit shutdown).
        needs_teardown: bool,
    },
    /// A record (struct/class) type. `has_key_function` is true when the
    /// type's key method is defined out of line in some other unit, which
    /// makes that unit responsible for the virtual dispatch table.
    Record { ty: TypeId, has_key_function: bool },
    /// An enum type.
    Enum { ty: TypeId },
    /// An alias for another global.
    Alias { target: Name },
    /// An instantiated static data member of a template.
    StaticMember { ty: TypeId },
}

/// A top-level declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct Decl {
    pub id: DeclId,
    pub name: Name,
    pub kind: DeclKind,
    pub attrs: DeclAttrs,
}

impl Decl {
    /// Whether this is a tentative variable definition.
    #[must_use]
    pub fn is_tentative(&self) -> bool {
        matches!(self.kind, DeclKind::Var { init: None, .. })
    }
}

/// Arena owning every declaration of one translation unit.
///
/// The parser allocates here as declarations are discovered; codegen
/// stores [`DeclId`] identities, never nodes.
#[derive(Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a declaration, returning a reference to the stored node.
    ///
    /// # Panics
    /// Panics if the arena exceeds `u32::MAX` declarations.
    pub fn alloc(&mut self, name: Name, kind: DeclKind, attrs: DeclAttrs) -> &Decl {
        let raw = u32::try_from(self.decls.len())
            .unwrap_or_else(|_| panic!("declaration arena exceeded capacity"));
        let id = DeclId(raw);
        self.decls.push(Decl {
            id,
            name,
            kind,
            attrs,
        });
        &self.decls[id.index()]
    }

    /// Get a declaration by identity.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this arena.
    #[inline]
    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// A group of declarations sharing one source construct (for example a
/// multi-declarator statement). Order is the arrival order and must be
/// preserved by dispatch.
///
/// Groups borrow their declarations; codegen never retains them past the
/// dispatch call.
#[derive(Default)]
pub struct DeclGroup<'a> {
    decls: SmallVec<[&'a Decl; 2]>,
}

impl<'a> DeclGroup<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group containing a single declaration.
    #[must_use]
    pub fn single(decl: &'a Decl) -> Self {
        let mut group = Self::new();
        group.push(decl);
        group
    }

    pub fn push(&mut self, decl: &'a Decl) {
        self.decls.push(decl);
    }

    /// Iterate in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Decl> + '_ {
        self.decls.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl<'a> FromIterator<&'a Decl> for DeclGroup<'a> {
    fn from_iter<T: IntoIterator<Item = &'a Decl>>(iter: T) -> Self {
        Self {
            decls: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringInterner;

    #[test]
    fn test_arena_alloc_and_get() {
        let interner = StringInterner::new();
        let mut arena = DeclArena::new();

        let name = interner.intern("f");
        let id = arena
            .alloc(name, DeclKind::Function { has_body: true }, DeclAttrs::empty())
            .id;

        let decl = arena.get(id);
        assert_eq!(decl.name, name);
        assert_eq!(decl.id, id);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_tentative_detection() {
        let interner = StringInterner::new();
        let mut arena = DeclArena::new();

        let tentative = arena.alloc(
            interner.intern("x"),
            DeclKind::Var {
                ty: TypeId::INT,
                init: None,
                needs_teardown: false,
            },
            DeclAttrs::empty(),
        );
        assert!(tentative.is_tentative());

        let defined = arena.alloc(
            interner.intern("y"),
            DeclKind::Var {
                ty: TypeId::INT,
                init: Some(Initializer::Const(3)),
                needs_teardown: false,
            },
            DeclAttrs::empty(),
        );
        assert!(!defined.is_tentative());
    }

    #[test]
    fn test_group_preserves_order() {
        let interner = StringInterner::new();
        let mut arena = DeclArena::new();

        let a = arena
            .alloc(
                interner.intern("a"),
                DeclKind::Function { has_body: true },
                DeclAttrs::empty(),
            )
            .id;
        let b = arena
            .alloc(
                interner.intern("b"),
                DeclKind::Function { has_body: true },
                DeclAttrs::empty(),
            )
            .id;

        let mut group = DeclGroup::new();
        group.push(arena.get(a));
        group.push(arena.get(b));

        let order: Vec<DeclId> = group.iter().map(|d| d.id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_attrs_bitset() {
        let attrs = DeclAttrs::USED | DeclAttrs::EXPORTED;
        assert!(attrs.contains(DeclAttrs::USED));
        assert!(!attrs.contains(DeclAttrs::CONSTRUCTOR));
    }
}
