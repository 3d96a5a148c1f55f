//! Lowered form of formula bodies.
//!
//! Produced by the rewrite pass once the check pass has accepted a module.
//! Every name is already resolved: attributes stay symbolic (they are looked
//! up on the dynamic node at run time), comprehension variables become
//! positional locals, and node and class references point at their targets.

use std::sync::Arc;

use dlr_ir::{BinaryOp, UnaryOp};

use crate::host::HostClass;
use crate::module::NodeRef;
use crate::value::Value;

#[derive(Debug)]
pub(crate) enum Code {
    Const(Value),
    /// Attribute or parameter of the node being evaluated.
    Attr(Arc<str>),
    /// Comprehension variable, by position on the local stack.
    Local(usize),
    /// `_`: the visible parameters of the current environment.
    Params,
    Node(NodeTarget),
    Class(Arc<dyn HostClass>),
    Unary(UnaryOp, Box<Code>),
    Binary(BinaryOp, Box<Code>, Box<Code>),
    If(Box<Code>, Box<Code>, Box<Code>),
    GetAttr(Box<Code>, Arc<str>),
    Index(Box<Code>, Vec<Code>),
    MethodCall {
        receiver: Box<Code>,
        method: Arc<str>,
        args: Vec<Code>,
    },
    ClassCall {
        class: Arc<dyn HostClass>,
        function: Arc<str>,
        args: Vec<Code>,
    },
    NodeCall {
        target: Box<Code>,
        args: Vec<Entry>,
    },
    Raise(Vec<Code>),
    List(Vec<Code>),
    Set(Vec<Code>),
    Map(Vec<Entry>),
    Comprehension(Box<Comprehension>),
}

/// Node referenced from code.
#[derive(Debug)]
pub(crate) enum NodeTarget {
    /// Node in the module the code belongs to.
    Local(u32),
    Imported(NodeRef),
}

/// Map literal entry or node-call keyword argument.
#[derive(Debug)]
pub(crate) enum Entry {
    Pair(Code, Code),
    Spread(Code),
}

#[derive(Debug)]
pub(crate) struct Comprehension {
    pub(crate) kind: ComprehensionKind,
    pub(crate) binding: Binding,
    pub(crate) source: Code,
    pub(crate) filter: Option<Code>,
}

#[derive(Debug)]
pub(crate) enum ComprehensionKind {
    List(Code),
    Set(Code),
    Map(Code, Code),
}

/// Number of locals a comprehension pushes per iteration.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Binding {
    Single,
    Pair,
}
