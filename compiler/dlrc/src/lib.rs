//! Driver for the dlr node language.
//!
//! Ties the parser and the evaluator together: a [`ModuleRegistry`] stores
//! named script sources and compiles them on demand, resolving `import`
//! lines against itself. The `dlr` binary is a thin wrapper over this crate.

pub mod params;
pub mod registry;

use std::sync::Once;

pub use dlr_diagnostic::{Diagnostic, DiagnosticKind};
pub use dlr_eval::{Engine, EngineBuilder, ModuleResolver, NoImports, Params, Value};
pub use registry::ModuleRegistry;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and only the first call has any
/// effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Parse and compile `source` as module `name`.
pub fn compile(
    name: &str,
    source: &str,
    resolver: &dyn ModuleResolver,
) -> Result<Engine, Diagnostic> {
    compile_with(Engine::builder(name), name, source, resolver)
}

/// Like [`compile`] with a preconfigured builder.
pub fn compile_with(
    builder: EngineBuilder,
    name: &str,
    source: &str,
    resolver: &dyn ModuleResolver,
) -> Result<Engine, Diagnostic> {
    let file = dlr_parse::parse(source, name)?;
    builder.compile(&file, resolver)
}
