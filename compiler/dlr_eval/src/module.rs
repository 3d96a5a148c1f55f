//! Compiled modules and node types.
//!
//! A [`Module`] owns its node types. Each node type carries a flattened
//! member table: inherited members first, then its own definitions, which
//! override by name. Members point back at the module they were written in
//! through a weak reference so cross-module inheritance evaluates inherited
//! code against the module that defined it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use rustc_hash::FxHashMap;

use crate::code::Code;
use crate::errors::Frame;
use crate::whitelist::{self, Whitelist};

static NEXT_MODULE_ID: AtomicU32 = AtomicU32::new(0);

pub struct Module {
    id: u32,
    name: Arc<str>,
    nodes: Vec<NodeType>,
    by_name: FxHashMap<Arc<str>, u32>,
    params: BTreeSet<Arc<str>>,
    whitelist: Option<Arc<Whitelist>>,
    /// Imported modules; inherited members only hold them weakly.
    imports: Vec<Arc<Module>>,
}

impl Module {
    /// Assemble a module from lowered node definitions.
    pub(crate) fn build(
        name: &str,
        drafts: Vec<NodeDraft>,
        imports: Vec<Arc<Module>>,
        whitelist: Option<Arc<Whitelist>>,
    ) -> Arc<Self> {
        let name: Arc<str> = Arc::from(name);
        let id = NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed);

        Arc::new_cyclic(|weak| {
            let mut nodes: Vec<NodeType> = Vec::with_capacity(drafts.len());
            let mut by_name = FxHashMap::default();
            let mut params = BTreeSet::new();

            for draft in drafts {
                let inherited = match &draft.parent {
                    Some(ParentRef::Local(index)) => nodes.get(*index as usize),
                    Some(ParentRef::Imported(node)) => Some(node.node()),
                    None => None,
                };
                let (mut table, mut next_slot, mut declared) = inherited.map_or_else(
                    || (FxHashMap::default(), 0, BTreeSet::new()),
                    |parent| {
                        (
                            parent.table.clone(),
                            parent.next_slot,
                            parent.declared_params.clone(),
                        )
                    },
                );

                for member in draft.members {
                    let member = Arc::new(Member {
                        name: member.name,
                        line: member.line,
                        module: Weak::clone(weak),
                        module_name: Arc::clone(&name),
                        kind: member.kind,
                        deps: member.deps,
                    });
                    if member.is_param() {
                        declared.insert(Arc::clone(&member.name));
                        params.insert(Arc::clone(&member.name));
                    }
                    let id = table.get(&member.name).map_or_else(
                        || {
                            next_slot += 1;
                            next_slot - 1
                        },
                        |slot: &Slot| slot.id,
                    );
                    table.insert(Arc::clone(&member.name), Slot { id, member });
                }

                let index = u32::try_from(nodes.len()).unwrap_or(u32::MAX);
                by_name.insert(Arc::clone(&draft.name), index);
                nodes.push(NodeType {
                    name: draft.name,
                    table,
                    next_slot,
                    declared_params: declared,
                });
            }

            Module {
                id,
                name: Arc::clone(&name),
                nodes,
                by_name,
                params,
                whitelist,
                imports,
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Matcher registry for code written in this module.
    pub fn whitelist(&self) -> Arc<Whitelist> {
        self.whitelist.clone().unwrap_or_else(whitelist::global)
    }

    pub(crate) fn node_index(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn nodes(&self) -> &[NodeType] {
        &self.nodes
    }

    /// Every parameter declared in this module.
    pub(crate) fn params(&self) -> &BTreeSet<Arc<str>> {
        &self.params
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("imports", &self.imports.len())
            .finish_non_exhaustive()
    }
}

/// A compiled node type.
#[derive(Debug)]
pub(crate) struct NodeType {
    pub(crate) name: Arc<str>,
    pub(crate) table: FxHashMap<Arc<str>, Slot>,
    next_slot: u32,
    /// Parameters declared on this node or any ancestor.
    pub(crate) declared_params: BTreeSet<Arc<str>>,
}

/// Entry in a node's member table. The id is unique within the table and
/// keys the memo cache.
#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub(crate) id: u32,
    pub(crate) member: Arc<Member>,
}

#[derive(Debug)]
pub(crate) struct Member {
    pub(crate) name: Arc<str>,
    pub(crate) line: u32,
    /// Module the member was written in.
    pub(crate) module: Weak<Module>,
    pub(crate) module_name: Arc<str>,
    pub(crate) kind: MemberKind,
    /// Names the definition refers to on its own node.
    pub(crate) deps: Arc<[Arc<str>]>,
}

impl Member {
    pub(crate) fn is_param(&self) -> bool {
        matches!(self.kind, MemberKind::Param(_))
    }

    pub(crate) fn frame(&self) -> Frame {
        Frame {
            module: Arc::clone(&self.module_name),
            line: self.line,
            attr: Arc::clone(&self.name),
        }
    }
}

#[derive(Debug)]
pub(crate) enum MemberKind {
    Formula(Code),
    /// Parameter with an optional default.
    Param(Option<Code>),
}

/// Node definition after lowering, before assembly.
#[derive(Debug)]
pub(crate) struct NodeDraft {
    pub(crate) name: Arc<str>,
    pub(crate) parent: Option<ParentRef>,
    pub(crate) members: Vec<MemberDraft>,
}

#[derive(Debug)]
pub(crate) struct MemberDraft {
    pub(crate) name: Arc<str>,
    pub(crate) line: u32,
    pub(crate) kind: MemberKind,
    pub(crate) deps: Arc<[Arc<str>]>,
}

#[derive(Clone, Debug)]
pub(crate) enum ParentRef {
    Local(u32),
    Imported(NodeRef),
}

/// Handle to a node type inside a compiled module.
#[derive(Clone)]
pub struct NodeRef {
    module: Arc<Module>,
    index: u32,
}

impl NodeRef {
    pub(crate) fn new(module: Arc<Module>, index: u32) -> Self {
        Self { module, index }
    }

    pub(crate) fn node(&self) -> &NodeType {
        &self.module.nodes[self.index as usize]
    }

    pub fn name(&self) -> &str {
        &self.node().name
    }

    pub fn module_name(&self) -> &str {
        self.module.name()
    }

    pub(crate) fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Process-unique identity of this node type.
    pub(crate) fn key(&self) -> (u32, u32) {
        (self.module.id, self.index)
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Slot> {
        self.node().table.get(name)
    }

    /// Every attribute and parameter visible on this node, sorted.
    pub fn members(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.node().table.keys().map(|k| &**k).collect();
        names.sort_unstable();
        names
    }

    /// Parameters declared on this node or any ancestor.
    pub fn params(&self) -> BTreeSet<String> {
        self.node()
            .declared_params
            .iter()
            .map(|p| p.to_string())
            .collect()
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.module, &other.module) && self.index == other.index
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({}::{})", self.module.name, self.name())
    }
}
