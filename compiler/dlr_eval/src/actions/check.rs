//! Name resolution and validation.

use std::sync::Arc;

use dlr_diagnostic::Diagnostic;
use dlr_ir::{ComprehensionKind, Expr, ExprKind, KwArg, MapEntry, NodePath};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Deps, Scope, ScopeNode};
use crate::host::HostClass;
use crate::module::ParentRef;

/// What a capitalized name refers to.
pub(super) enum Target {
    Node(ParentRef),
    Class(Arc<dyn HostClass>),
}

/// Dependency accumulator preserving first-seen order.
#[derive(Default)]
struct DepSet {
    names: Vec<Arc<str>>,
    seen: FxHashSet<Arc<str>>,
}

impl DepSet {
    fn add(&mut self, name: &str) {
        if !self.seen.contains(name) {
            let name: Arc<str> = Arc::from(name);
            self.seen.insert(Arc::clone(&name));
            self.names.push(name);
        }
    }

    fn extend(&mut self, other: DepSet) {
        for name in other.names {
            self.add(&name);
        }
    }

    fn remove(&mut self, name: &str) {
        if self.seen.remove(name) {
            self.names.retain(|n| &**n != name);
        }
    }

    fn finish(self) -> Deps {
        Arc::from(self.names)
    }
}

impl Scope<'_> {
    pub(super) fn import(&mut self, module: &str) -> Result<(), Diagnostic> {
        if self.imports.contains_key(module) {
            return Ok(());
        }
        let engine = self.resolver.resolve(module)?;
        tracing::debug!(module, "imported");
        self.imports.insert(module.to_string(), engine);
        Ok(())
    }

    pub(super) fn open_node(
        &mut self,
        name: &str,
        parent: Option<&NodePath>,
    ) -> Result<(), Diagnostic> {
        if self.by_name.contains_key(name) {
            return Err(Diagnostic::redefined(format!("can't redefine node {name}")));
        }

        let parent = parent.map(|path| self.resolve_node(path)).transpose()?;
        let visible = match &parent {
            None => FxHashMap::default(),
            Some(ParentRef::Local(index)) => self
                .nodes
                .get(*index as usize)
                .map(|node| node.visible.clone())
                .unwrap_or_default(),
            Some(ParentRef::Imported(node)) => node
                .node()
                .table
                .iter()
                .map(|(name, slot)| (Arc::clone(name), Arc::clone(&slot.member.deps)))
                .collect(),
        };

        let index = u32::try_from(self.nodes.len())
            .map_err(|_| Diagnostic::parse("too many nodes in one module"))?;
        self.by_name.insert(name.to_string(), index);
        self.nodes.push(ScopeNode {
            name: Arc::from(name),
            parent,
            visible,
            local: FxHashSet::default(),
            members: Vec::new(),
        });
        Ok(())
    }

    /// Record `name` on the current node and reject redefinitions and
    /// dependency cycles.
    pub(super) fn define(&mut self, name: &str, deps: Deps) -> Result<(), Diagnostic> {
        let Some(node) = self.nodes.last_mut() else {
            return Err(Diagnostic::parse(format!(
                "'{name}' must be defined inside a node"
            )));
        };
        if node.local.contains(name) {
            return Err(Diagnostic::redefined(format!(
                "can't redefine '{name}' in node {}",
                node.name
            )));
        }
        let name: Arc<str> = Arc::from(name);
        node.local.insert(Arc::clone(&name));
        node.visible.insert(Arc::clone(&name), deps);

        if node.reaches_itself(&name) {
            return Err(Diagnostic::recursion(format!(
                "'{name}' depends on itself in node {}",
                node.name
            )));
        }
        Ok(())
    }

    /// Resolve a node path to a node defined so far.
    pub(super) fn resolve_node(&self, path: &NodePath) -> Result<ParentRef, Diagnostic> {
        match &path.module {
            None => self
                .by_name
                .get(&path.name)
                .map(|index| ParentRef::Local(*index))
                .ok_or_else(|| Diagnostic::undefined_node(format!("unknown node {path}"))),
            Some(module) => {
                let engine = self.imports.get(module).ok_or_else(|| {
                    Diagnostic::undefined(format!("module {module} not imported"))
                })?;
                engine
                    .node(&path.name)
                    .map(ParentRef::Imported)
                    .map_err(|_| Diagnostic::undefined_node(format!("unknown node {path}")))
            }
        }
    }

    /// Resolve a capitalized name: nodes first, then host classes.
    pub(super) fn resolve_target(&self, path: &NodePath) -> Result<Target, Diagnostic> {
        match self.resolve_node(path) {
            Ok(node) => Ok(Target::Node(node)),
            Err(err) => match (&path.module, self.classes.get(&path.name)) {
                (None, Some(class)) => Ok(Target::Class(Arc::clone(class))),
                _ => Err(err),
            },
        }
    }

    fn is_visible(&self, name: &str) -> bool {
        self.locals.iter().any(|local| local == name)
            || self
                .nodes
                .last()
                .is_some_and(|node| node.visible.contains_key(name))
    }

    pub(super) fn check_expr(&mut self, expr: &Expr) -> Result<Deps, Diagnostic> {
        Ok(self.deps_of(expr)?.finish())
    }

    fn deps_of(&mut self, expr: &Expr) -> Result<DepSet, Diagnostic> {
        let mut deps = DepSet::default();
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::SelfRef => {}
            ExprKind::Ident(name) => {
                if !self.is_visible(name) {
                    return Err(Diagnostic::undefined(format!("unknown identifier {name}")));
                }
                deps.add(name);
            }
            ExprKind::NodeRef(path) => {
                self.resolve_target(path)?;
            }
            ExprKind::Unary { operand, .. } => deps.extend(self.deps_of(operand)?),
            ExprKind::Binary { left, right, .. } => {
                deps.extend(self.deps_of(left)?);
                deps.extend(self.deps_of(right)?);
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                deps.extend(self.deps_of(cond)?);
                deps.extend(self.deps_of(then_branch)?);
                deps.extend(self.deps_of(else_branch)?);
            }
            ExprKind::GetAttr { receiver, .. } => deps.extend(self.deps_of(receiver)?),
            ExprKind::Index { receiver, args } => {
                deps.extend(self.deps_of(receiver)?);
                deps.extend(self.deps_of_all(args)?);
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                if let ExprKind::NodeRef(path) = &receiver.kind {
                    check_class_call(&self.resolve_target(path)?, path, method, args.len())?;
                } else {
                    deps.extend(self.deps_of(receiver)?);
                }
                deps.extend(self.deps_of_all(args)?);
            }
            ExprKind::NodeCall { target, args } => {
                deps.extend(self.deps_of(target)?);
                for arg in args {
                    match arg {
                        KwArg::Named { value, .. } | KwArg::Spread(value) => {
                            deps.extend(self.deps_of(value)?);
                        }
                    }
                }
            }
            ExprKind::Raise(items) | ExprKind::List(items) | ExprKind::Set(items) => {
                deps.extend(self.deps_of_all(items)?);
            }
            ExprKind::Map(entries) => {
                for entry in entries {
                    match entry {
                        MapEntry::Pair { key, value } => {
                            deps.extend(self.deps_of(key)?);
                            deps.extend(self.deps_of(value)?);
                        }
                        MapEntry::Spread(value) => deps.extend(self.deps_of(value)?),
                    }
                }
            }
            ExprKind::Comprehension(comp) => {
                deps.extend(self.deps_of(&comp.source)?);

                let names = comp.binding.names();
                let depth = self.locals.len();
                self.locals.extend(names.iter().map(|n| (*n).to_string()));
                let inner = self.comprehension_body_deps(comp);
                self.locals.truncate(depth);

                let mut inner = inner?;
                for name in names {
                    inner.remove(name);
                }
                deps.extend(inner);
            }
        }
        Ok(deps)
    }

    fn comprehension_body_deps(
        &mut self,
        comp: &dlr_ir::Comprehension,
    ) -> Result<DepSet, Diagnostic> {
        let mut deps = DepSet::default();
        match &comp.kind {
            ComprehensionKind::List(body) | ComprehensionKind::Set(body) => {
                deps.extend(self.deps_of(body)?);
            }
            ComprehensionKind::Map { key, value } => {
                deps.extend(self.deps_of(key)?);
                deps.extend(self.deps_of(value)?);
            }
        }
        if let Some(filter) = &comp.filter {
            deps.extend(self.deps_of(filter)?);
        }
        Ok(deps)
    }

    fn deps_of_all(&mut self, exprs: &[Expr]) -> Result<DepSet, Diagnostic> {
        let mut deps = DepSet::default();
        for expr in exprs {
            deps.extend(self.deps_of(expr)?);
        }
        Ok(deps)
    }
}

fn check_class_call(
    target: &Target,
    path: &NodePath,
    function: &str,
    argc: usize,
) -> Result<(), Diagnostic> {
    match target {
        Target::Node(_) => Err(Diagnostic::undefined_function(format!(
            "node {path} has no function {function}"
        ))),
        Target::Class(class) => {
            let arity = class.signature(function).ok_or_else(|| {
                Diagnostic::undefined_function(format!("unknown function {path}.{function}"))
            })?;
            if arity.accepts(argc) {
                Ok(())
            } else {
                Err(Diagnostic::bad_call(format!(
                    "{path}.{function} takes {arity} args, got {argc}"
                )))
            }
        }
    }
}

impl ScopeNode {
    /// Whether following dependencies from `name` leads back to it.
    fn reaches_itself(&self, name: &Arc<str>) -> bool {
        let mut stack: Vec<&Arc<str>> = match self.visible.get(name) {
            Some(deps) => deps.iter().collect(),
            None => return false,
        };
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        while let Some(dep) = stack.pop() {
            if dep == name {
                return true;
            }
            if !seen.insert(&**dep) {
                continue;
            }
            if let Some(next) = self.visible.get(dep) {
                stack.extend(next.iter());
            }
        }
        false
    }
}
