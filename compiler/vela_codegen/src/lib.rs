//! Code generation coordination for Vela translation units.
//!
//! This crate turns one parsed translation unit into one [`ModuleArtifact`].
//! The parser drives [`ModuleBuilder`] in call-and-return style: the builder
//! forwards declarations to a [`GenerationEngine`], applies the deferred
//! emission policy, records unit-level pragmas, and hands the finished
//! artifact over exactly once.
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=vela_codegen=debug`: Enable debug-level tracing output.
//!   Example: `RUST_LOG=vela_codegen=debug cargo test`
//!
//! - `RUST_LOG=vela_codegen=trace`: Trace-level tracing (very verbose);
//!   logs every declaration dispatched through the builder.
//!
//! # Architecture
//!
//! - **Builder** (`builder.rs`): [`ModuleBuilder`], the per-unit coordinator
//!   with the error gate and artifact lifecycle
//! - **Engine** (`engine.rs`): [`GenerationEngine`] seam plus the in-tree
//!   [`IrGenEngine`]
//! - **Artifact** (`artifact.rs`): [`ModuleArtifact`], the unit's output
//!   module and shared bookkeeping tables
//! - **Policy** (`policy.rs`): pure emit/defer/skip decision tables
//! - **Debug info** (`debug.rs`): required-type completion bookkeeping
//!
//! # Example
//!
//! ```
//! use vela_codegen::{CodegenOptions, ModuleBuilder};
//! use vela_diagnostic::DiagnosticHandler;
//! use vela_ir::{CompilationContext, TargetInfo};
//!
//! let ctx = CompilationContext::new(TargetInfo::x86_64_linux());
//! let diags = DiagnosticHandler::new();
//! let mut builder =
//!     ModuleBuilder::with_default_engine(&diags, "main", CodegenOptions::default());
//! builder.initialize(&ctx);
//!
//! // ... dispatch declarations as the parser produces them ...
//!
//! builder.handle_translation_unit_complete();
//! let artifact = builder.release_artifact();
//! assert!(artifact.is_some());
//! ```

pub mod artifact;
pub mod builder;
pub mod debug;
pub mod engine;
pub mod options;
pub mod policy;
pub mod value;

pub use artifact::{AliasDef, DeferredGlobal, DeferredVTable, ModuleArtifact, VTableDef};
pub use builder::ModuleBuilder;
pub use debug::DebugInfoBuilder;
pub use engine::{GenerationEngine, IrGenEngine};
pub use options::CodegenOptions;
pub use policy::EmitDecision;
pub use value::{CtorEntry, GlobalDef, GlobalInit, GlobalKind, Linkage, ValueRef};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=vela_codegen=debug` or `RUST_LOG=vela_codegen=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
