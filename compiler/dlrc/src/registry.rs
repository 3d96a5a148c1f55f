//! Named script sources compiled on demand.
//!
//! A [`ModuleRegistry`] maps module names to script text. Sources can be
//! registered up front or looked up lazily as `<Name>.dlr` files under a
//! root directory. Compiled engines are cached, so every importer of a
//! module shares one compiled copy.

use std::path::{Path, PathBuf};
use std::thread::{self, ThreadId};

use dlr_diagnostic::Diagnostic;
use dlr_eval::{ClassRegistry, Engine, ModuleResolver, Whitelist};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// File extension of script sources on disk.
pub const SOURCE_EXTENSION: &str = "dlr";

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    sources: FxHashMap<String, String>,
    root: Option<PathBuf>,
    classes: ClassRegistry,
    whitelist: Option<Whitelist>,
    compiled: Mutex<FxHashMap<String, Engine>>,
    /// Modules each thread is currently compiling, outermost first.
    loading: Mutex<FxHashMap<ThreadId, Vec<String>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that also reads `<root>/<Name>.dlr` for unknown modules.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Register the source of module `name`, dropping any compiled copy.
    pub fn add_source(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.compiled.get_mut().remove(&name);
        self.sources.insert(name, source.into());
        self
    }

    #[must_use]
    pub fn source(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.add_source(name, source);
        self
    }

    /// Host classes made visible to every module compiled here.
    #[must_use]
    pub fn classes(mut self, classes: ClassRegistry) -> Self {
        self.classes = classes;
        self
    }

    /// Matcher registry for every module compiled here, instead of the
    /// global one.
    #[must_use]
    pub fn whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = Some(whitelist);
        self
    }

    /// Names of every module with a registered source.
    pub fn module_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Compiled engine for module `name`.
    pub fn engine(&self, name: &str) -> Result<Engine, Diagnostic> {
        if let Some(engine) = self.compiled.lock().get(name) {
            return Ok(engine.clone());
        }

        let source = self.load_source(name)?;
        self.enter(name)?;
        let result = self.compile(name, &source);
        self.leave();

        let engine = result?;
        self.compiled
            .lock()
            .insert(name.to_string(), engine.clone());
        tracing::debug!(module = name, "compiled");
        Ok(engine)
    }

    fn compile(&self, name: &str, source: &str) -> Result<Engine, Diagnostic> {
        let mut builder = Engine::builder(name).classes(self.classes.clone());
        if let Some(whitelist) = &self.whitelist {
            builder = builder.whitelist(whitelist.clone());
        }
        crate::compile_with(builder, name, source, self)
    }

    fn load_source(&self, name: &str) -> Result<String, Diagnostic> {
        if let Some(source) = self.sources.get(name) {
            return Ok(source.clone());
        }
        let Some(path) = self.path_of(name) else {
            return Err(Diagnostic::module_not_found(name));
        };
        std::fs::read_to_string(&path).map_err(|err| {
            tracing::debug!(module = name, path = %path.display(), %err, "source unavailable");
            Diagnostic::module_not_found(name)
        })
    }

    /// On-disk location of module `name`, if this registry has a root and
    /// the name is a plain identifier.
    pub fn path_of(&self, name: &str) -> Option<PathBuf> {
        let root = self.root.as_deref()?;
        is_module_name(name).then(|| module_path(root, name))
    }

    fn enter(&self, name: &str) -> Result<(), Diagnostic> {
        let mut all = self.loading.lock();
        let loading = all.entry(thread::current().id()).or_default();
        if loading.iter().any(|m| m == name) {
            let cycle: Vec<&str> = loading
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(name))
                .collect();
            return Err(Diagnostic::recursion(format!(
                "circular import: {}",
                cycle.join(" -> ")
            )));
        }
        loading.push(name.to_string());
        Ok(())
    }

    fn leave(&self) {
        let mut all = self.loading.lock();
        let id = thread::current().id();
        if let Some(loading) = all.get_mut(&id) {
            loading.pop();
            if loading.is_empty() {
                all.remove(&id);
            }
        }
    }
}

impl ModuleResolver for ModuleRegistry {
    fn resolve(&self, name: &str) -> Result<Engine, Diagnostic> {
        self.engine(name)
    }
}

fn is_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn module_path(root: &Path, name: &str) -> PathBuf {
    root.join(name).with_extension(SOURCE_EXTENSION)
}

/// Module name for a script file: its stem.
pub fn module_name_of(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

#[cfg(test)]
mod tests;
