//! Translation-unit module builder.
//!
//! [`ModuleBuilder`] is the single serialization point between the
//! parser and the generation engine. It owns the output artifact for the
//! lifetime of one unit, forwards declarations in arrival order, applies
//! the deferred emission policy, records unit-level pragmas, and decides
//! at unit end whether the artifact is kept or discarded.
//!
//! Every dispatch operation checks the error gate first: once any error
//! diagnostic has been reported, all further work is a cheap no-op so
//! parsing can continue for diagnostic purposes without producing
//! invalid output. The artifact leaves this type exactly once, through
//! [`ModuleBuilder::release_artifact`].

use std::fmt;

use tracing::debug;

use vela_diagnostic::DiagnosticHandler;
use vela_ir::{CompilationContext, Decl, DeclGroup, DeclKind};

use crate::artifact::ModuleArtifact;
use crate::engine::{GenerationEngine, IrGenEngine};
use crate::options::CodegenOptions;
use crate::policy::{self, EmitDecision};
use crate::value::ValueRef;

/// Coordinates code generation for one translation unit.
///
/// Generic over the generation engine so the emission contract stays a
/// seam; [`IrGenEngine`] is the default.
pub struct ModuleBuilder<'tcx, E = IrGenEngine> {
    diags: &'tcx DiagnosticHandler,
    options: CodegenOptions,
    ctx: Option<&'tcx CompilationContext>,
    artifact: Option<ModuleArtifact>,
    engine: E,
}

impl<'tcx> ModuleBuilder<'tcx, IrGenEngine> {
    /// Create a builder driving the in-tree engine.
    pub fn with_default_engine(
        diags: &'tcx DiagnosticHandler,
        module_name: &str,
        options: CodegenOptions,
    ) -> Self {
        let engine = IrGenEngine::new(&options);
        Self::new(diags, module_name, options, engine)
    }
}

impl<'tcx, E: GenerationEngine> ModuleBuilder<'tcx, E> {
    /// Create a builder with an empty artifact for the named module.
    pub fn new(
        diags: &'tcx DiagnosticHandler,
        module_name: &str,
        options: CodegenOptions,
        engine: E,
    ) -> Self {
        Self {
            diags,
            options,
            ctx: None,
            artifact: Some(ModuleArtifact::new(module_name)),
            engine,
        }
    }

    /// Bind the compilation context and configure the engine. Must be
    /// called exactly once, before any dispatch.
    ///
    /// # Panics
    /// Panics if called twice or after the artifact was released.
    pub fn initialize(&mut self, ctx: &'tcx CompilationContext) {
        assert!(self.ctx.is_none(), "module builder initialized twice");
        self.ctx = Some(ctx);

        let Some(artifact) = self.artifact.as_mut() else {
            panic!("module artifact already released");
        };
        self.engine.configure(ctx, artifact);

        // Ambient library dependencies from compiler options go through
        // the same path as pragmas encountered mid-parse.
        let libraries = self.options.dependent_libraries.clone();
        for library in &libraries {
            self.handle_dependent_library_pragma(library);
        }
    }

    /// The generation engine, for inspection.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn ctx(&self) -> &'tcx CompilationContext {
        match self.ctx {
            Some(ctx) => ctx,
            None => panic!("module builder used before initialize"),
        }
    }

    /// Run one gated engine operation against the artifact.
    ///
    /// # Panics
    /// Panics when called before `initialize` or after release; both are
    /// driver bugs, not source-program errors.
    fn dispatch(&mut self, f: impl FnOnce(&mut E, &'tcx CompilationContext, &mut ModuleArtifact)) {
        let ctx = self.ctx();
        let Some(artifact) = self.artifact.as_mut() else {
            panic!("module artifact already released");
        };
        f(&mut self.engine, ctx, artifact);
    }

    // -- Declaration dispatch --

    /// Forward a group of declarations sharing one source construct, in
    /// arrival order. Returns `true` ("keep parsing") unconditionally;
    /// abort-on-error is the gate's job, not this return value's.
    pub fn handle_top_level(&mut self, group: &DeclGroup<'_>) -> bool {
        if self.diags.has_errors() {
            return true;
        }
        self.dispatch(|engine, ctx, artifact| {
            for decl in group.iter() {
                engine.emit_top_level(ctx, decl, artifact);
            }
        });
        true
    }

    /// An inline method definition was parsed. Emitted here only when the
    /// emission policy demands it; otherwise it stays available for
    /// on-demand emission.
    ///
    /// # Panics
    /// Panics if the declaration has no body.
    pub fn handle_inline_method_definition(&mut self, decl: &Decl) {
        if self.diags.has_errors() {
            return;
        }
        assert!(
            matches!(decl.kind, DeclKind::Function { has_body: true }),
            "inline method definition must have a body"
        );
        if policy::inline_method_decision(decl.attrs) == EmitDecision::Emit {
            self.dispatch(|engine, ctx, artifact| engine.emit_top_level(ctx, decl, artifact));
        }
    }

    /// A tag type's definition completed; finalize its placeholder
    /// layout. Fires before any debug-info completion for the same type.
    pub fn handle_tag_decl_completion(&mut self, decl: &Decl) {
        if self.diags.has_errors() {
            return;
        }
        self.dispatch(|engine, ctx, artifact| engine.update_completed_type(ctx, decl, artifact));
    }

    /// A referenced type's full definition became available; let the
    /// debug-info subcomponent finish its description. No-op unless
    /// debug metadata generation is enabled.
    pub fn handle_tag_decl_required_definition(&mut self, decl: &Decl) {
        if self.diags.has_errors() {
            return;
        }
        self.dispatch(|engine, _, _| {
            if let DeclKind::Record { .. } = decl.kind {
                if let Some(di) = engine.debug_info() {
                    di.complete_required_type(decl);
                }
            }
        });
    }

    /// The unit ended without a true definition for this tentatively
    /// defined variable; emit it as a zero-initialized definition.
    pub fn complete_tentative_definition(&mut self, decl: &Decl) {
        if self.diags.has_errors() {
            return;
        }
        self.dispatch(|engine, ctx, artifact| {
            engine.emit_tentative_definition(ctx, decl, artifact);
        });
    }

    /// A record's virtual dispatch table was referenced.
    /// `definition_required` asserts that this unit must own the table
    /// (its key method is defined here).
    pub fn handle_vtable(&mut self, decl: &Decl, definition_required: bool) {
        if self.diags.has_errors() {
            return;
        }
        self.dispatch(|engine, ctx, artifact| {
            engine.emit_vtable(ctx, decl, definition_required, artifact);
        });
    }

    /// A template's static data member was instantiated.
    pub fn handle_static_member_instantiation(&mut self, decl: &Decl) {
        if self.diags.has_errors() {
            return;
        }
        self.dispatch(|engine, ctx, artifact| engine.emit_static_member(ctx, decl, artifact));
    }

    // -- Pragmas --

    /// `#pragma comment(linker, ...)` or equivalent.
    pub fn handle_linker_option_pragma(&mut self, option: &str) {
        if self.diags.has_errors() {
            return;
        }
        self.dispatch(|engine, _, artifact| engine.append_linker_option(option, artifact));
    }

    /// `#pragma detect_mismatch(name, value)` or equivalent.
    pub fn handle_detect_mismatch_pragma(&mut self, name: &str, value: &str) {
        if self.diags.has_errors() {
            return;
        }
        self.dispatch(|engine, _, artifact| engine.add_detect_mismatch(name, value, artifact));
    }

    /// `#pragma comment(lib, ...)` or an ambient `--dependent-lib`.
    pub fn handle_dependent_library_pragma(&mut self, name: &str) {
        if self.diags.has_errors() {
            return;
        }
        self.dispatch(|engine, _, artifact| engine.add_dependent_library(name, artifact));
    }

    // -- Unit lifecycle --

    /// The whole unit has been parsed. Discards the artifact when the
    /// error gate tripped; otherwise flushes all remaining deferred work
    /// into it.
    pub fn handle_translation_unit_complete(&mut self) {
        if self.diags.has_errors() {
            self.engine.discard();
            if self.artifact.take().is_some() {
                debug!(
                    target: "vela_codegen",
                    errors = self.diags.error_count(),
                    "discarding module artifact"
                );
            }
            return;
        }
        let ctx = self.ctx();
        if let Some(artifact) = self.artifact.as_mut() {
            self.engine.flush_and_finalize(ctx, artifact);
        }
    }

    /// Non-owning view of the artifact; `None` once released or
    /// discarded.
    pub fn artifact(&self) -> Option<&ModuleArtifact> {
        self.artifact.as_ref()
    }

    /// Transfer ownership of the artifact to the caller, leaving the
    /// builder empty. A second call, or a call after discard, returns
    /// `None`.
    pub fn release_artifact(&mut self) -> Option<ModuleArtifact> {
        self.artifact.take()
    }

    // -- Introspection --

    /// Drop the first deduplicated-literal entry holding `value`, so an
    /// identical literal inserted later generates fresh storage. Returns
    /// whether an entry was removed.
    pub fn forget_generated_value(&mut self, value: ValueRef) -> bool {
        match self.artifact.as_mut() {
            Some(artifact) => artifact.forget_value(value),
            None => false,
        }
    }

    /// Serialize every internal table to `out` for debugging.
    ///
    /// # Panics
    /// Panics if called before `initialize`.
    pub fn dump_state(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let ctx = self.ctx();
        match self.artifact.as_ref() {
            Some(artifact) => artifact.dump(&ctx.interner, out),
            None => writeln!(out, "CodeGen state: artifact released or discarded"),
        }
    }
}
