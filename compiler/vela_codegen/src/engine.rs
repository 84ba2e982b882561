//! Generation engine boundary.
//!
//! [`GenerationEngine`] is the seam between the translation-unit
//! coordinator and declaration-to-IR translation. The coordinator owns
//! the artifact and sequences calls; the engine decides what a given
//! declaration becomes inside it. Methods receive the compilation
//! context and artifact explicitly rather than capturing them, keeping
//! the trait free of lifetime parameters and the data flow visible at
//! every call site.
//!
//! [`IrGenEngine`] is the in-tree engine: it records symbolic global
//! definitions. Instruction selection and optimization live behind a
//! separate backend and are out of scope here.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use vela_ir::{
    CompilationContext, Decl, DeclAttrs, DeclKind, Initializer, Name, TypeLayout,
    DEFAULT_INIT_PRIORITY,
};

use crate::artifact::{AliasDef, DeferredGlobal, ModuleArtifact};
use crate::debug::DebugInfoBuilder;
use crate::options::CodegenOptions;
use crate::policy::{self, EmitDecision};
use crate::value::{GlobalInit, GlobalKind, Linkage};

/// Contract the coordinator requires from a generation engine.
pub trait GenerationEngine {
    /// Bind the artifact to the compilation context: target triple and
    /// data layout. Called exactly once, at unit initialization.
    fn configure(&mut self, ctx: &CompilationContext, artifact: &mut ModuleArtifact);

    /// Translate one top-level declaration into the artifact.
    fn emit_top_level(&mut self, ctx: &CompilationContext, decl: &Decl, artifact: &mut ModuleArtifact);

    /// A tentative variable definition reached the end of the unit with
    /// no true definition; schedule its zero-initialized emission.
    fn emit_tentative_definition(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        artifact: &mut ModuleArtifact,
    );

    /// A virtual dispatch table was requested for a record.
    fn emit_vtable(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        definition_required: bool,
        artifact: &mut ModuleArtifact,
    );

    /// A previously forward-declared tag type completed; finalize any
    /// placeholder layout. No code is emitted.
    fn update_completed_type(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        artifact: &mut ModuleArtifact,
    );

    /// A template's static data member was instantiated.
    fn emit_static_member(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        artifact: &mut ModuleArtifact,
    );

    /// Append a raw linker option to the unit's metadata.
    fn append_linker_option(&mut self, option: &str, artifact: &mut ModuleArtifact);

    /// Record a dependent-library request.
    fn add_dependent_library(&mut self, name: &str, artifact: &mut ModuleArtifact);

    /// Record an ABI mismatch-detection token.
    fn add_detect_mismatch(&mut self, name: &str, value: &str, artifact: &mut ModuleArtifact);

    /// End-of-unit flush: emit the deferred queue, still-eligible virtual
    /// tables, apply value replacements, and order module initializers.
    fn flush_and_finalize(&mut self, ctx: &CompilationContext, artifact: &mut ModuleArtifact);

    /// Drop engine-internal state; the unit's artifact is being discarded.
    fn discard(&mut self);

    /// The debug-info subcomponent, when metadata generation is enabled.
    fn debug_info(&mut self) -> Option<&mut DebugInfoBuilder>;
}

/// The in-tree generation engine: symbolic IR-level bookkeeping.
pub struct IrGenEngine {
    debug: Option<DebugInfoBuilder>,
    /// Layouts finalized by tag-type completion, by type name.
    finalized: FxHashMap<Name, TypeLayout>,
}

impl IrGenEngine {
    #[must_use]
    pub fn new(options: &CodegenOptions) -> Self {
        Self {
            debug: options.debug_info.then(DebugInfoBuilder::new),
            finalized: FxHashMap::default(),
        }
    }

    /// Layout recorded for a completed tag type, if any.
    pub fn finalized_layout(&self, name: Name) -> Option<TypeLayout> {
        self.finalized.get(&name).copied()
    }

    fn emit_var(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        init: &Initializer,
        needs_teardown: bool,
        artifact: &mut ModuleArtifact,
    ) {
        let DeclKind::Var { ty, .. } = &decl.kind else {
            return;
        };
        let symbol = ctx.interner.lookup(decl.name);
        let size = ctx.types.layout_of(*ty).size;
        // A true definition supersedes any parked tentative one.
        artifact.take_deferred_decl(symbol);

        let (global_init, ctor_priority) = match init {
            Initializer::Zeroed => (GlobalInit::Zeroed, None),
            Initializer::Const(v) => (GlobalInit::Const(*v), None),
            Initializer::Str(s) => {
                let literal = artifact.intern_literal(s);
                // Back the literal with a private constant; repeat
                // literals reuse it through the symbol dedup.
                let backing_symbol = format!(".str.{}", literal.raw());
                let backing_name = ctx.interner.intern(&backing_symbol);
                artifact.define_global(
                    backing_name,
                    &backing_symbol,
                    GlobalKind::Var,
                    Linkage::Internal,
                    GlobalInit::None,
                    s.len() as u64 + 1,
                );
                (GlobalInit::Str(literal), None)
            }
            Initializer::Dynamic { priority } => (GlobalInit::Dynamic, Some(*priority)),
        };

        let value = artifact.define_global(
            decl.name,
            symbol,
            GlobalKind::Var,
            Linkage::External,
            global_init,
            size,
        );
        if let Some(priority) = ctor_priority {
            artifact.add_global_ctor(value, priority);
        }
        if needs_teardown {
            artifact.add_global_dtor(value, ctor_priority.unwrap_or(DEFAULT_INIT_PRIORITY));
        }
        if decl.attrs.contains(DeclAttrs::USED) {
            artifact.retain(value);
        }
    }
}

impl GenerationEngine for IrGenEngine {
    fn configure(&mut self, ctx: &CompilationContext, artifact: &mut ModuleArtifact) {
        artifact.set_target(&ctx.target);
        debug!(
            target: "vela_codegen",
            module = artifact.name(),
            triple = %ctx.target.triple,
            "configured generation engine"
        );
    }

    fn emit_top_level(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        artifact: &mut ModuleArtifact,
    ) {
        let symbol = ctx.interner.lookup(decl.name);
        trace!(target: "vela_codegen", symbol, "emit top-level decl");

        match &decl.kind {
            DeclKind::Function { has_body: true } => {
                // A definition supersedes any parked forward declaration.
                artifact.take_deferred_decl(symbol);
                let value = artifact.define_global(
                    decl.name,
                    symbol,
                    GlobalKind::Function,
                    Linkage::External,
                    GlobalInit::None,
                    0,
                );
                if decl.attrs.contains(DeclAttrs::USED) {
                    artifact.retain(value);
                }
            }
            DeclKind::Function { has_body: false } => {
                artifact.declare_global(decl.name, symbol, GlobalKind::Function, 0);
                artifact.defer_decl(symbol, decl.id);
            }
            DeclKind::Var { ty, init: None, .. } => {
                // Tentative definition: park until the unit decides.
                let size = ctx.types.layout_of(*ty).size;
                artifact.declare_global(decl.name, symbol, GlobalKind::Var, size);
                artifact.defer_decl(symbol, decl.id);
            }
            DeclKind::Var {
                init: Some(init),
                needs_teardown,
                ..
            } => {
                self.emit_var(ctx, decl, init, *needs_teardown, artifact);
            }
            // Tag types emit nothing at the top level; their layout is
            // finalized through completion notifications.
            DeclKind::Record { .. } | DeclKind::Enum { .. } => {}
            DeclKind::Alias { target } => {
                artifact.add_alias(AliasDef {
                    name: decl.name,
                    target: *target,
                });
            }
            DeclKind::StaticMember { .. } => {
                self.emit_static_member(ctx, decl, artifact);
            }
        }
    }

    fn emit_tentative_definition(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        artifact: &mut ModuleArtifact,
    ) {
        debug_assert!(decl.is_tentative(), "decl has a true definition");
        let DeclKind::Var { ty, .. } = &decl.kind else {
            return;
        };
        let symbol = ctx.interner.lookup(decl.name);

        if let Some(global) = artifact.global(symbol) {
            if global.defined {
                // A true definition appeared; the tentative one merges
                // into it and emits nothing.
                return;
            }
            let placeholder = global.value;
            if artifact.is_queued(placeholder) {
                return;
            }
            artifact.take_deferred_decl(symbol);
            artifact.queue_deferred_emit(DeferredGlobal {
                decl: decl.id,
                placeholder,
            });
        } else {
            let size = ctx.types.layout_of(*ty).size;
            let placeholder = artifact.declare_global(decl.name, symbol, GlobalKind::Var, size);
            artifact.queue_deferred_emit(DeferredGlobal {
                decl: decl.id,
                placeholder,
            });
        }
        trace!(target: "vela_codegen", symbol, "queued tentative definition");
    }

    fn emit_vtable(
        &mut self,
        _ctx: &CompilationContext,
        decl: &Decl,
        definition_required: bool,
        artifact: &mut ModuleArtifact,
    ) {
        let DeclKind::Record {
            has_key_function, ..
        } = &decl.kind
        else {
            return;
        };
        match policy::vtable_decision(definition_required) {
            EmitDecision::Emit => {
                artifact.define_vtable(decl.name);
            }
            EmitDecision::Defer => {
                artifact.defer_vtable(decl.name, *has_key_function);
            }
            EmitDecision::Skip => {}
        }
    }

    fn update_completed_type(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        _artifact: &mut ModuleArtifact,
    ) {
        match &decl.kind {
            DeclKind::Record { ty, .. } | DeclKind::Enum { ty } => {
                let layout = ctx.types.layout_of(*ty);
                self.finalized.insert(decl.name, layout);
                trace!(
                    target: "vela_codegen",
                    decl = decl.id.index(),
                    size = layout.size,
                    "finalized completed type layout"
                );
            }
            _ => {}
        }
    }

    fn emit_static_member(
        &mut self,
        ctx: &CompilationContext,
        decl: &Decl,
        artifact: &mut ModuleArtifact,
    ) {
        let DeclKind::StaticMember { ty } = &decl.kind else {
            return;
        };
        let symbol = ctx.interner.lookup(decl.name);
        let size = ctx.types.layout_of(*ty).size;
        artifact.define_global(
            decl.name,
            symbol,
            GlobalKind::Var,
            Linkage::External,
            GlobalInit::Zeroed,
            size,
        );
    }

    fn append_linker_option(&mut self, option: &str, artifact: &mut ModuleArtifact) {
        artifact.append_linker_option(option);
    }

    fn add_dependent_library(&mut self, name: &str, artifact: &mut ModuleArtifact) {
        artifact.add_dependent_library(name);
        // Dependent libraries reach the linker as options too.
        artifact.append_linker_option(format!("-l{name}"));
    }

    fn add_detect_mismatch(&mut self, name: &str, value: &str, artifact: &mut ModuleArtifact) {
        artifact.add_mismatch_token(name, value);
    }

    fn flush_and_finalize(&mut self, _ctx: &CompilationContext, artifact: &mut ModuleArtifact) {
        // Pending tentative definitions become zero-initialized commons.
        let pending = artifact.take_deferred_to_emit();
        for record in &pending {
            artifact.promote_placeholder(record.placeholder, Linkage::Common, GlobalInit::Zeroed);
        }

        // Deferred virtual tables that turned out to have no home unit.
        for deferred in artifact.take_deferred_vtables() {
            if !deferred.has_key_function {
                artifact.define_vtable(deferred.record);
            }
        }

        artifact.apply_replacements();
        artifact.sort_init_order();

        debug!(
            target: "vela_codegen",
            module = artifact.name(),
            promoted = pending.len(),
            globals = artifact.globals().len(),
            "flushed module"
        );
    }

    fn discard(&mut self) {
        self.finalized.clear();
        if self.debug.is_some() {
            self.debug = Some(DebugInfoBuilder::new());
        }
        debug!(target: "vela_codegen", "discarded engine state");
    }

    fn debug_info(&mut self) -> Option<&mut DebugInfoBuilder> {
        self.debug.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vela_ir::{DeclArena, TargetInfo, TypeId};

    fn setup() -> (CompilationContext, ModuleArtifact, IrGenEngine) {
        let ctx = CompilationContext::new(TargetInfo::x86_64_linux());
        let artifact = ModuleArtifact::new("unit");
        let engine = IrGenEngine::new(&CodegenOptions::default());
        (ctx, artifact, engine)
    }

    #[test]
    fn test_configure_binds_target() {
        let (ctx, mut artifact, mut engine) = setup();
        engine.configure(&ctx, &mut artifact);
        assert_eq!(artifact.triple(), "x86_64-unknown-linux-gnu");
        assert!(!artifact.data_layout().is_empty());
    }

    #[test]
    fn test_forward_declaration_parks_then_definition_supersedes() {
        let (ctx, mut artifact, mut engine) = setup();
        let mut arena = DeclArena::new();
        let name = ctx.interner.intern("callback");

        let fwd = arena
            .alloc(name, DeclKind::Function { has_body: false }, DeclAttrs::empty())
            .id;
        engine.emit_top_level(&ctx, arena.get(fwd), &mut artifact);
        assert_eq!(artifact.deferred_decl_count(), 1);
        assert!(!artifact.global("callback").is_some_and(|g| g.defined));

        let def = arena
            .alloc(name, DeclKind::Function { has_body: true }, DeclAttrs::empty())
            .id;
        engine.emit_top_level(&ctx, arena.get(def), &mut artifact);
        assert_eq!(artifact.deferred_decl_count(), 0);
        assert!(artifact.global("callback").is_some_and(|g| g.defined));
        // Definition over a placeholder leaves a replacement to apply.
        assert_eq!(artifact.replacement_count(), 1);
    }

    #[test]
    fn test_string_literal_gets_private_backing_global() {
        let (ctx, mut artifact, mut engine) = setup();
        let mut arena = DeclArena::new();

        let decl = arena
            .alloc(
                ctx.interner.intern("greeting"),
                DeclKind::Var {
                    ty: TypeId::PTR,
                    init: Some(Initializer::Str("hi".to_owned())),
                    needs_teardown: false,
                },
                DeclAttrs::empty(),
            )
            .id;
        engine.emit_top_level(&ctx, arena.get(decl), &mut artifact);

        assert_eq!(artifact.literals().len(), 1);
        let backing = artifact
            .globals()
            .iter()
            .find(|g| g.symbol.starts_with(".str."))
            .unwrap_or_else(|| panic!("missing literal backing global"));
        assert_eq!(backing.linkage, Linkage::Internal);
    }

    #[test]
    fn test_dynamic_init_registers_ctor_and_dtor() {
        let (ctx, mut artifact, mut engine) = setup();
        let mut arena = DeclArena::new();

        let decl = arena
            .alloc(
                ctx.interner.intern("logger"),
                DeclKind::Var {
                    ty: TypeId::PTR,
                    init: Some(Initializer::Dynamic { priority: 101 }),
                    needs_teardown: true,
                },
                DeclAttrs::empty(),
            )
            .id;
        engine.emit_top_level(&ctx, arena.get(decl), &mut artifact);

        assert_eq!(artifact.global_ctors().len(), 1);
        assert_eq!(artifact.global_ctors()[0].priority, 101);
        assert_eq!(artifact.global_dtors().len(), 1);
    }

    #[test]
    fn test_completed_type_layout_recorded() {
        let (mut ctx, mut artifact, mut engine) = setup();
        let record_ty = ctx.types.register(TypeLayout { size: 24, align: 8 });
        let mut arena = DeclArena::new();

        let decl = arena
            .alloc(
                ctx.interner.intern("Widget"),
                DeclKind::Record {
                    ty: record_ty,
                    has_key_function: false,
                },
                DeclAttrs::empty(),
            )
            .id;
        engine.update_completed_type(&ctx, arena.get(decl), &mut artifact);

        let name = ctx.interner.intern("Widget");
        assert_eq!(engine.finalized_layout(name).map(|l| l.size), Some(24));
    }
}
