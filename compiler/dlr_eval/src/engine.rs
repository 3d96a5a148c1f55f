//! Compiled engines and their query API.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dlr_diagnostic::Diagnostic;
use dlr_ir::SourceFile;
use indexmap::IndexMap;

use crate::actions::compile_module;
use crate::env::{Env, Params};
use crate::errors::{undefined_node, EvalError, EvalResult};
use crate::host::{ClassRegistry, HostClass};
use crate::interpreter::eval_attr;
use crate::module::{Module, NodeRef};
use crate::resolver::ModuleResolver;
use crate::value::Value;
use crate::whitelist::Whitelist;

/// A compiled module ready for evaluation.
///
/// Cloning is cheap; clones share the compiled module.
#[derive(Clone, Debug)]
pub struct Engine {
    pub(crate) module: Arc<Module>,
}

impl Engine {
    pub fn builder(module_name: impl Into<String>) -> EngineBuilder {
        EngineBuilder::new(module_name)
    }

    pub fn module_name(&self) -> &str {
        self.module.name()
    }

    /// Matcher registry used by code in this module.
    pub fn whitelist(&self) -> Arc<Whitelist> {
        self.module.whitelist()
    }

    /// Look up a node type by name.
    pub fn node(&self, name: &str) -> Result<NodeRef, EvalError> {
        self.module
            .node_index(name)
            .map(|index| NodeRef::new(Arc::clone(&self.module), index))
            .ok_or_else(|| undefined_node(name))
    }

    /// Evaluate one attribute of `node` with `params`.
    pub fn evaluate(&self, node: &str, attr: &str, params: Params) -> EvalResult {
        let node = self.node(node)?;
        let mut env = Env::new(params);
        eval_attr(&mut env, &node, attr)
    }

    /// Evaluate several attributes of `node` in one environment, so shared
    /// dependencies are computed once.
    #[tracing::instrument(level = "debug", skip(self, params), fields(module = %self.module.name()))]
    pub fn evaluate_many(
        &self,
        node: &str,
        attrs: &[&str],
        params: Params,
    ) -> Result<Vec<Value>, EvalError> {
        let node = self.node(node)?;
        self.evaluate_node(&node, attrs, params)
    }

    /// Like [`evaluate_many`](Self::evaluate_many) for a node already looked
    /// up, possibly from another engine.
    pub fn evaluate_node(
        &self,
        node: &NodeRef,
        attrs: &[&str],
        params: Params,
    ) -> Result<Vec<Value>, EvalError> {
        let mut env = Env::new(params);
        attrs
            .iter()
            .map(|attr| eval_attr(&mut env, node, attr))
            .collect()
    }

    /// Evaluate `attrs` of `node` into a name-to-value mapping.
    pub fn eval_to_hash(
        &self,
        node: &str,
        attrs: &[&str],
        params: Params,
    ) -> Result<IndexMap<String, Value>, EvalError> {
        let values = self.evaluate_many(node, attrs, params)?;
        Ok(attrs
            .iter()
            .map(|attr| (*attr).to_string())
            .zip(values)
            .collect())
    }

    /// Names of every node type in the module.
    pub fn enumerate_nodes(&self) -> BTreeSet<String> {
        self.module
            .nodes()
            .iter()
            .map(|node| node.name.to_string())
            .collect()
    }

    /// Every node's visible members.
    pub fn enumerate_attrs(&self) -> BTreeMap<String, Vec<String>> {
        (0..self.module.nodes().len())
            .filter_map(|index| u32::try_from(index).ok())
            .map(|index| {
                let node = NodeRef::new(Arc::clone(&self.module), index);
                let members = node.members().into_iter().map(str::to_string).collect();
                (node.name().to_string(), members)
            })
            .collect()
    }

    /// Visible members of one node, sorted.
    pub fn enumerate_attrs_by_node(&self, node: &str) -> Result<Vec<String>, EvalError> {
        Ok(self
            .node(node)?
            .members()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Every parameter declared in the module.
    pub fn enumerate_params(&self) -> BTreeSet<String> {
        self.module.params().iter().map(|p| p.to_string()).collect()
    }

    /// Parameters declared on `node` or any of its ancestors.
    pub fn enumerate_params_by_node(&self, node: &str) -> Result<BTreeSet<String>, EvalError> {
        Ok(self.node(node)?.params())
    }
}

/// Builder for [`Engine`]s.
#[derive(Debug)]
pub struct EngineBuilder {
    module_name: String,
    classes: ClassRegistry,
    whitelist: Option<Arc<Whitelist>>,
}

impl EngineBuilder {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            classes: ClassRegistry::default(),
            whitelist: None,
        }
    }

    /// Make a host class visible to the module by its name.
    #[must_use]
    pub fn class(mut self, class: impl HostClass + 'static) -> Self {
        self.classes.register(Arc::new(class));
        self
    }

    /// Replace the whole class registry.
    #[must_use]
    pub fn classes(mut self, classes: ClassRegistry) -> Self {
        self.classes = classes;
        self
    }

    /// Use `whitelist` instead of the global registry.
    #[must_use]
    pub fn whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = Some(Arc::new(whitelist));
        self
    }

    /// Compile a parsed script.
    pub fn compile(
        self,
        file: &SourceFile,
        resolver: &dyn ModuleResolver,
    ) -> Result<Engine, Diagnostic> {
        let module = compile_module(
            &self.module_name,
            file,
            resolver,
            &self.classes,
            self.whitelist,
        )?;
        Ok(Engine { module })
    }
}
