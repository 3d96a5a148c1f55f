//! Module resolution for `import` lines.

use dlr_diagnostic::Diagnostic;

use crate::engine::Engine;

/// Supplies compiled engines for imported modules.
pub trait ModuleResolver {
    fn resolve(&self, name: &str) -> Result<Engine, Diagnostic>;
}

/// Resolver for scripts that import nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoImports;

impl ModuleResolver for NoImports {
    fn resolve(&self, name: &str) -> Result<Engine, Diagnostic> {
        Err(Diagnostic::module_not_found(name))
    }
}
