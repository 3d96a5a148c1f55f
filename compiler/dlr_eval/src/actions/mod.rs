//! Compile-time passes over a parsed script.
//!
//! Each declaration goes through two passes in file order:
//! - `check` validates names against the scope built so far and records the
//!   dependency set of every definition.
//! - `rewrite` lowers an accepted expression into [`Code`](crate::code::Code).
//!
//! Once every line is accepted the drafts are assembled into a
//! [`Module`].

mod check;
mod rewrite;

use std::sync::Arc;

use dlr_diagnostic::Diagnostic;
use dlr_ir::{Decl, SourceFile};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::engine::Engine;
use crate::host::ClassRegistry;
use crate::module::{MemberDraft, MemberKind, Module, NodeDraft, ParentRef};
use crate::resolver::ModuleResolver;
use crate::whitelist::Whitelist;

/// Dependency set of one definition.
type Deps = Arc<[Arc<str>]>;

/// Compile `file` as module `name`.
#[tracing::instrument(level = "debug", skip_all, fields(module = name))]
pub(crate) fn compile_module(
    name: &str,
    file: &SourceFile,
    resolver: &dyn ModuleResolver,
    classes: &ClassRegistry,
    whitelist: Option<Arc<Whitelist>>,
) -> Result<Arc<Module>, Diagnostic> {
    let mut scope = Scope::new(resolver, classes);
    for line in &file.lines {
        scope
            .declare(&line.decl, line.line)
            .map_err(|diag| locate(diag, name, line.line))?;
    }
    tracing::debug!(nodes = scope.nodes.len(), "module accepted");
    let imports = scope
        .imports
        .values()
        .map(|engine| Arc::clone(&engine.module))
        .collect();
    Ok(Module::build(name, scope.into_drafts(), imports, whitelist))
}

/// Attribute `diag` to `module:line` unless an imported module already
/// located it.
fn locate(diag: Diagnostic, module: &str, line: u32) -> Diagnostic {
    if diag.module.is_empty() {
        diag.at(module, line)
    } else {
        diag
    }
}

/// Names known while compiling one module.
pub(crate) struct Scope<'a> {
    resolver: &'a dyn ModuleResolver,
    classes: &'a ClassRegistry,
    imports: FxHashMap<String, Engine>,
    nodes: Vec<ScopeNode>,
    by_name: FxHashMap<String, u32>,
    /// Comprehension variables in scope, innermost last.
    locals: Vec<String>,
}

struct ScopeNode {
    name: Arc<str>,
    parent: Option<ParentRef>,
    /// Every member visible on the node (inherited or local) and its deps.
    visible: FxHashMap<Arc<str>, Deps>,
    local: FxHashSet<Arc<str>>,
    members: Vec<MemberDraft>,
}

impl<'a> Scope<'a> {
    fn new(resolver: &'a dyn ModuleResolver, classes: &'a ClassRegistry) -> Self {
        Self {
            resolver,
            classes,
            imports: FxHashMap::default(),
            nodes: Vec::new(),
            by_name: FxHashMap::default(),
            locals: Vec::new(),
        }
    }

    fn declare(&mut self, decl: &Decl, line: u32) -> Result<(), Diagnostic> {
        match decl {
            Decl::Import { module } => self.import(module),
            Decl::Node { name, parent } => self.open_node(name, parent.as_ref()),
            Decl::Formula { name, expr } => {
                let deps = self.check_expr(expr)?;
                self.define(name, deps.clone())?;
                let code = self.lower(expr)?;
                self.push_member(name, line, MemberKind::Formula(code), deps);
                Ok(())
            }
            Decl::Param { name, default } => {
                let deps = match default {
                    Some(expr) => self.check_expr(expr)?,
                    None => Arc::from([]),
                };
                self.define(name, deps.clone())?;
                let code = default.as_ref().map(|expr| self.lower(expr)).transpose()?;
                self.push_member(name, line, MemberKind::Param(code), deps);
                Ok(())
            }
        }
    }

    fn push_member(&mut self, name: &str, line: u32, kind: MemberKind, deps: Deps) {
        if let Some(node) = self.nodes.last_mut() {
            node.members.push(MemberDraft {
                name: Arc::from(name),
                line,
                kind,
                deps,
            });
        }
    }

    fn into_drafts(self) -> Vec<NodeDraft> {
        self.nodes
            .into_iter()
            .map(|node| NodeDraft {
                name: node.name,
                parent: node.parent,
                members: node.members,
            })
            .collect()
    }
}
