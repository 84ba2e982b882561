//! Declaration model and core types for the Vela compiler.
//!
//! This crate defines the data the front end hands to code generation:
//!
//! - [`Name`] / [`StringInterner`]: compact interned identifiers
//! - [`TypeId`] / [`TypeTable`]: type identities with target layout
//! - [`Decl`] / [`DeclKind`] / [`DeclAttrs`]: top-level declarations as a
//!   closed tagged variant plus an attribute bitset
//! - [`CompilationContext`]: the immutable per-compilation bundle
//!   (interner, type table, target description) that codegen borrows
//!
//! Declaration kinds are deliberately a closed enum so every emission
//! decision downstream can match exhaustively instead of probing an open
//! type hierarchy.

mod context;
mod decl;
mod interner;
mod name;
mod target;
mod types;

pub use context::CompilationContext;
pub use decl::{
    Decl, DeclArena, DeclAttrs, DeclGroup, DeclId, DeclKind, Initializer, DEFAULT_INIT_PRIORITY,
};
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use target::TargetInfo;
pub use types::{TypeId, TypeLayout, TypeTable};
