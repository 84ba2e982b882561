//! The output module artifact.
//!
//! [`ModuleArtifact`] is the aggregate output of one translation unit:
//! emitted globals and virtual tables plus every bookkeeping table the
//! coordinator and generation engine share — deferred declarations, the
//! ordered still-to-emit queue, aliases, pending value replacements,
//! deferred virtual tables, prioritized module ctors/dtors, retained
//! values, the deduplicated string-literal table, and the unit-level
//! metadata tables fed by pragmas.
//!
//! The artifact is exclusively owned by the module builder until released.
//! Tables iterate in insertion order; that is the order `dump` emits.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use vela_ir::{DeclId, Name, StringInterner, TargetInfo};

use crate::value::{CtorEntry, GlobalDef, GlobalInit, GlobalKind, Linkage, ValueRef};

/// A deferred declaration promoted for emission: the declaration's
/// identity paired with its placeholder value.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DeferredGlobal {
    pub decl: DeclId,
    pub placeholder: ValueRef,
}

/// An alias declaration recorded for the unit.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct AliasDef {
    pub name: Name,
    pub target: Name,
}

/// An emitted virtual dispatch table.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct VTableDef {
    pub record: Name,
    pub value: ValueRef,
}

/// A record whose virtual table emission is deferred until the end of the
/// unit, when eligibility is re-checked.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DeferredVTable {
    pub record: Name,
    /// The record's key method is defined out of line in another unit.
    pub has_key_function: bool,
}

/// The mutable output artifact of one translation unit.
pub struct ModuleArtifact {
    name: String,
    triple: String,
    data_layout: String,
    next_value: u32,

    globals: Vec<GlobalDef>,
    global_index: FxHashMap<String, usize>,
    vtables: Vec<VTableDef>,
    vtable_index: FxHashSet<Name>,

    deferred_decls: FxHashMap<String, DeclId>,
    deferred_decl_order: Vec<String>,
    deferred_to_emit: Vec<DeferredGlobal>,
    aliases: Vec<AliasDef>,
    replacements: FxHashMap<String, ValueRef>,
    replacement_order: Vec<String>,
    deferred_vtables: Vec<DeferredVTable>,
    global_ctors: Vec<CtorEntry>,
    global_dtors: Vec<CtorEntry>,
    retained: Vec<ValueRef>,
    const_strings: Vec<(String, ValueRef)>,

    linker_options: Vec<String>,
    dependent_libraries: Vec<String>,
    mismatch_tokens: Vec<(String, String)>,
}

impl ModuleArtifact {
    /// Create an empty artifact for the named module. Target properties
    /// are bound later, when the unit is initialized.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            triple: String::new(),
            data_layout: String::new(),
            next_value: 0,
            globals: Vec::new(),
            global_index: FxHashMap::default(),
            vtables: Vec::new(),
            vtable_index: FxHashSet::default(),
            deferred_decls: FxHashMap::default(),
            deferred_decl_order: Vec::new(),
            deferred_to_emit: Vec::new(),
            aliases: Vec::new(),
            replacements: FxHashMap::default(),
            replacement_order: Vec::new(),
            deferred_vtables: Vec::new(),
            global_ctors: Vec::new(),
            global_dtors: Vec::new(),
            retained: Vec::new(),
            const_strings: Vec::new(),
            linker_options: Vec::new(),
            dependent_libraries: Vec::new(),
            mismatch_tokens: Vec::new(),
        }
    }

    /// Bind target triple and data layout.
    pub fn set_target(&mut self, target: &TargetInfo) {
        self.triple = target.triple.clone();
        self.data_layout = target.data_layout.clone();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triple(&self) -> &str {
        &self.triple
    }

    pub fn data_layout(&self) -> &str {
        &self.data_layout
    }

    pub(crate) fn alloc_value(&mut self) -> ValueRef {
        let v = ValueRef::from_raw(self.next_value);
        self.next_value += 1;
        v
    }

    // -- Globals --

    /// Declare a global without defining it, returning its placeholder
    /// value. Re-declaring an existing symbol returns the existing value.
    pub fn declare_global(
        &mut self,
        name: Name,
        symbol: &str,
        kind: GlobalKind,
        size: u64,
    ) -> ValueRef {
        if let Some(&idx) = self.global_index.get(symbol) {
            return self.globals[idx].value;
        }
        let value = self.alloc_value();
        self.global_index.insert(symbol.to_owned(), self.globals.len());
        self.globals.push(GlobalDef {
            name,
            symbol: symbol.to_owned(),
            value,
            kind,
            linkage: Linkage::External,
            init: GlobalInit::None,
            size,
            defined: false,
        });
        trace!(target: "vela_codegen", symbol, "declared global");
        value
    }

    /// Define a global. A duplicate definition is ignored (first wins). A
    /// definition over an existing placeholder records a pending value
    /// replacement, applied at finalize.
    pub fn define_global(
        &mut self,
        name: Name,
        symbol: &str,
        kind: GlobalKind,
        linkage: Linkage,
        init: GlobalInit,
        size: u64,
    ) -> ValueRef {
        if let Some(&idx) = self.global_index.get(symbol) {
            if self.globals[idx].defined {
                return self.globals[idx].value;
            }
            let final_value = self.alloc_value();
            let global = &mut self.globals[idx];
            global.kind = kind;
            global.linkage = linkage;
            global.init = init;
            global.size = size;
            global.defined = true;
            let placeholder = global.value;
            self.add_replacement(symbol, final_value);
            trace!(target: "vela_codegen", symbol, "defined global over placeholder");
            return placeholder;
        }
        let value = self.alloc_value();
        self.global_index.insert(symbol.to_owned(), self.globals.len());
        self.globals.push(GlobalDef {
            name,
            symbol: symbol.to_owned(),
            value,
            kind,
            linkage,
            init,
            size,
            defined: true,
        });
        trace!(target: "vela_codegen", symbol, "defined global");
        value
    }

    /// Promote a placeholder (by value) to a definition. Returns false if
    /// no undefined global carries this value.
    pub fn promote_placeholder(
        &mut self,
        value: ValueRef,
        linkage: Linkage,
        init: GlobalInit,
    ) -> bool {
        for global in &mut self.globals {
            if global.value == value && !global.defined {
                global.linkage = linkage;
                global.init = init;
                global.defined = true;
                return true;
            }
        }
        false
    }

    /// Look up a global by symbol.
    pub fn global(&self, symbol: &str) -> Option<&GlobalDef> {
        self.global_index.get(symbol).map(|&idx| &self.globals[idx])
    }

    /// All globals in emission order, placeholders included.
    pub fn globals(&self) -> &[GlobalDef] {
        &self.globals
    }

    /// Globals that are actual definitions.
    pub fn defined_globals(&self) -> impl Iterator<Item = &GlobalDef> {
        self.globals.iter().filter(|g| g.defined)
    }

    // -- Deferred declarations --

    /// Park a declaration as deferred under its symbol.
    pub fn defer_decl(&mut self, symbol: &str, decl: DeclId) {
        if !self.deferred_decls.contains_key(symbol) {
            self.deferred_decls.insert(symbol.to_owned(), decl);
            self.deferred_decl_order.push(symbol.to_owned());
        }
    }

    /// Remove and return a parked declaration.
    pub fn take_deferred_decl(&mut self, symbol: &str) -> Option<DeclId> {
        let decl = self.deferred_decls.remove(symbol)?;
        self.deferred_decl_order.retain(|s| s != symbol);
        Some(decl)
    }

    pub fn deferred_decl_count(&self) -> usize {
        self.deferred_decls.len()
    }

    // -- Deferred-to-emit queue --

    /// Queue a promoted deferred declaration for emission at finalize.
    pub fn queue_deferred_emit(&mut self, record: DeferredGlobal) {
        self.deferred_to_emit.push(record);
    }

    /// Whether a placeholder value is already queued for emission.
    pub fn is_queued(&self, placeholder: ValueRef) -> bool {
        self.deferred_to_emit
            .iter()
            .any(|d| d.placeholder == placeholder)
    }

    /// Drain the still-to-emit queue in discovery order.
    pub fn take_deferred_to_emit(&mut self) -> Vec<DeferredGlobal> {
        std::mem::take(&mut self.deferred_to_emit)
    }

    pub fn deferred_to_emit(&self) -> &[DeferredGlobal] {
        &self.deferred_to_emit
    }

    // -- Aliases --

    pub fn add_alias(&mut self, alias: AliasDef) {
        self.aliases.push(alias);
    }

    pub fn aliases(&self) -> &[AliasDef] {
        &self.aliases
    }

    // -- Replacements --

    /// Record that `symbol`'s provisional value must be replaced by
    /// `value` at finalize. Last write wins per symbol.
    pub fn add_replacement(&mut self, symbol: &str, value: ValueRef) {
        if self.replacements.insert(symbol.to_owned(), value).is_none() {
            self.replacement_order.push(symbol.to_owned());
        }
    }

    pub fn replacement(&self, symbol: &str) -> Option<ValueRef> {
        self.replacements.get(symbol).copied()
    }

    pub fn replacement_count(&self) -> usize {
        self.replacements.len()
    }

    /// Swap every pending replacement into its global, clearing the table.
    pub fn apply_replacements(&mut self) {
        for symbol in std::mem::take(&mut self.replacement_order) {
            let Some(value) = self.replacements.remove(&symbol) else {
                continue;
            };
            if let Some(&idx) = self.global_index.get(&symbol) {
                self.globals[idx].value = value;
            }
        }
        self.replacements.clear();
    }

    // -- Virtual tables --

    /// Defer a record's virtual table. Idempotent per record; a record
    /// whose table was already emitted is not re-deferred.
    pub fn defer_vtable(&mut self, record: Name, has_key_function: bool) {
        if self.vtable_index.contains(&record)
            || self.deferred_vtables.iter().any(|d| d.record == record)
        {
            return;
        }
        self.deferred_vtables.push(DeferredVTable {
            record,
            has_key_function,
        });
    }

    /// Emit a record's virtual table, at most once per record. Returns
    /// `None` when the table already exists.
    pub fn define_vtable(&mut self, record: Name) -> Option<ValueRef> {
        if !self.vtable_index.insert(record) {
            return None;
        }
        self.deferred_vtables.retain(|d| d.record != record);
        let value = self.alloc_value();
        self.vtables.push(VTableDef { record, value });
        Some(value)
    }

    pub fn has_vtable(&self, record: Name) -> bool {
        self.vtable_index.contains(&record)
    }

    pub fn vtables(&self) -> &[VTableDef] {
        &self.vtables
    }

    pub fn deferred_vtables(&self) -> &[DeferredVTable] {
        &self.deferred_vtables
    }

    /// Drain the deferred virtual-table set for finalize.
    pub fn take_deferred_vtables(&mut self) -> Vec<DeferredVTable> {
        std::mem::take(&mut self.deferred_vtables)
    }

    // -- Module ctors/dtors --

    pub fn add_global_ctor(&mut self, value: ValueRef, priority: u16) {
        self.global_ctors.push(CtorEntry { value, priority });
    }

    pub fn add_global_dtor(&mut self, value: ValueRef, priority: u16) {
        self.global_dtors.push(CtorEntry { value, priority });
    }

    /// Order initializers by priority, then discovery order.
    pub fn sort_init_order(&mut self) {
        self.global_ctors.sort_by_key(|c| c.priority);
        self.global_dtors.sort_by_key(|c| c.priority);
    }

    pub fn global_ctors(&self) -> &[CtorEntry] {
        &self.global_ctors
    }

    pub fn global_dtors(&self) -> &[CtorEntry] {
        &self.global_dtors
    }

    // -- Retained values --

    /// Mark a value as retained: it must survive dead-code stripping.
    pub fn retain(&mut self, value: ValueRef) {
        self.retained.push(value);
    }

    pub fn retained(&self) -> &[ValueRef] {
        &self.retained
    }

    // -- Deduplicated string literals --

    /// Intern a string literal, returning the existing value when the
    /// same content was emitted before.
    pub fn intern_literal(&mut self, content: &str) -> ValueRef {
        if let Some((_, value)) = self.const_strings.iter().find(|(s, _)| s == content) {
            return *value;
        }
        let value = self.alloc_value();
        self.const_strings.push((content.to_owned(), value));
        value
    }

    /// Remove the first literal entry holding `value`. Linear scan:
    /// invalidation is rare. Returns whether an entry was removed.
    pub fn forget_value(&mut self, value: ValueRef) -> bool {
        if let Some(pos) = self.const_strings.iter().position(|(_, v)| *v == value) {
            self.const_strings.remove(pos);
            return true;
        }
        false
    }

    /// Literal table in insertion order.
    pub fn literals(&self) -> &[(String, ValueRef)] {
        &self.const_strings
    }

    // -- Unit-level metadata --

    /// Append a linker option. Duplicates are permitted.
    pub fn append_linker_option(&mut self, option: impl Into<String>) {
        self.linker_options.push(option.into());
    }

    /// Append a dependent-library request. Duplicates are permitted.
    pub fn add_dependent_library(&mut self, name: impl Into<String>) {
        self.dependent_libraries.push(name.into());
    }

    /// Record an ABI mismatch-detection token. Deduplicated by name,
    /// last write wins.
    pub fn add_mismatch_token(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.mismatch_tokens.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.mismatch_tokens.push((name, value));
        }
    }

    pub fn linker_options(&self) -> &[String] {
        &self.linker_options
    }

    pub fn dependent_libraries(&self) -> &[String] {
        &self.dependent_libraries
    }

    pub fn mismatch_tokens(&self) -> &[(String, String)] {
        &self.mismatch_tokens
    }

    // -- Diagnostics --

    /// Serialize every internal table to `out`, in insertion order.
    /// Read-only; intended for debugging dumps.
    pub fn dump(&self, interner: &StringInterner, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "CodeGen state for module '{}':", self.name)?;

        writeln!(out, " DeferredDecls:")?;
        for symbol in &self.deferred_decl_order {
            if let Some(decl) = self.deferred_decls.get(symbol) {
                writeln!(out, "  {} -> decl #{}", symbol, decl.index())?;
            }
        }

        writeln!(out, " DeferredDeclsToEmit:")?;
        for d in &self.deferred_to_emit {
            writeln!(out, "  decl #{} placeholder %{}", d.decl.index(), d.placeholder.raw())?;
        }

        writeln!(out, " Aliases:")?;
        for a in &self.aliases {
            writeln!(
                out,
                "  {} -> {}",
                interner.lookup(a.name),
                interner.lookup(a.target)
            )?;
        }

        writeln!(out, " Replacements:")?;
        for symbol in &self.replacement_order {
            if let Some(value) = self.replacements.get(symbol) {
                writeln!(out, "  {} -> %{}", symbol, value.raw())?;
            }
        }

        writeln!(out, " DeferredVTables:")?;
        for d in &self.deferred_vtables {
            writeln!(out, "  {}", interner.lookup(d.record))?;
        }

        writeln!(out, " Retained:")?;
        for v in &self.retained {
            writeln!(out, "  %{}", v.raw())?;
        }

        writeln!(out, " GlobalCtors:")?;
        for c in &self.global_ctors {
            writeln!(out, "  %{} : {}", c.value.raw(), c.priority)?;
        }

        writeln!(out, " GlobalDtors:")?;
        for c in &self.global_dtors {
            writeln!(out, "  %{} : {}", c.value.raw(), c.priority)?;
        }

        writeln!(out, " ConstantStrings:")?;
        for (content, value) in &self.const_strings {
            writeln!(out, "  {content:?} -> %{}", value.raw())?;
        }

        writeln!(out, " LinkerOptions:")?;
        for opt in &self.linker_options {
            writeln!(out, "  {opt}")?;
        }

        writeln!(out, " DependentLibraries:")?;
        for lib in &self.dependent_libraries {
            writeln!(out, "  {lib}")?;
        }

        writeln!(out, " MismatchTokens:")?;
        for (name, value) in &self.mismatch_tokens {
            writeln!(out, "  {name} = {value}")?;
        }

        Ok(())
    }
}
