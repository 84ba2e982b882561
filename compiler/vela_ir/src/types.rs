//! Type identities with target layout.
//!
//! Codegen needs only a type's identity and its layout (size and
//! alignment): enough to size a zero-initialized global or finalize a
//! completed aggregate. Full type structure stays in the front end.

/// Compact type identity.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// 64-bit integer.
    pub const INT: TypeId = TypeId(0);
    /// 64-bit float.
    pub const FLOAT: TypeId = TypeId(1);
    /// Boolean.
    pub const BOOL: TypeId = TypeId(2);
    /// Pointer-sized value.
    pub const PTR: TypeId = TypeId(3);

    /// First index available for registered (non-primitive) types.
    const FIRST_REGISTERED: u32 = 4;

    /// Index into the owning [`TypeTable`].
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Size and alignment of a type on the current target, in bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct TypeLayout {
    pub size: u64,
    pub align: u64,
}

impl TypeLayout {
    /// Layout of a type with the given size, naturally aligned up to 8.
    #[must_use]
    pub fn sized(size: u64) -> Self {
        Self {
            size,
            align: size.next_power_of_two().clamp(1, 8),
        }
    }
}

/// Table of type layouts, indexed by [`TypeId`].
///
/// Primitives are pre-registered; aggregate types are registered by the
/// front end as their definitions complete.
pub struct TypeTable {
    layouts: Vec<TypeLayout>,
}

impl TypeTable {
    /// Create a table with primitive layouts for a 64-bit target.
    pub fn new() -> Self {
        Self {
            layouts: vec![
                TypeLayout { size: 8, align: 8 }, // INT
                TypeLayout { size: 8, align: 8 }, // FLOAT
                TypeLayout { size: 1, align: 1 }, // BOOL
                TypeLayout { size: 8, align: 8 }, // PTR
            ],
        }
    }

    /// Register a new type, returning its identity.
    ///
    /// # Panics
    /// Panics if the table exceeds `u32::MAX` entries.
    pub fn register(&mut self, layout: TypeLayout) -> TypeId {
        let idx = u32::try_from(self.layouts.len())
            .unwrap_or_else(|_| panic!("type table exceeded capacity"));
        debug_assert!(idx >= TypeId::FIRST_REGISTERED);
        self.layouts.push(layout);
        TypeId(idx)
    }

    /// Layout of a type.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this table.
    #[inline]
    pub fn layout_of(&self, id: TypeId) -> TypeLayout {
        self.layouts[id.index()]
    }

    /// Number of registered types, primitives included.
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Always false; primitives are pre-registered.
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
