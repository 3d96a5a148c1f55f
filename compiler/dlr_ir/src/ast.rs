//! Parsed syntax tree.
//!
//! A script is a flat list of lines. Node declarations open a new node;
//! formulas and parameters that follow attach to the most recently opened
//! node. The compiler walks the lines in file order, so the tree keeps that
//! order verbatim.

use crate::{BinaryOp, Span, UnaryOp};

/// A whole parsed script.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SourceFile {
    pub lines: Vec<Line>,
}

/// One declaration and the source line it was written on.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// 1-based line number.
    pub line: u32,
    pub span: Span,
    pub decl: Decl,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    /// `import Module`
    Import { module: String },
    /// `Name:` or `Name: Parent` or `Name: Module::Parent`
    Node {
        name: String,
        parent: Option<NodePath>,
    },
    /// `name = expr`
    Formula { name: String, expr: Expr },
    /// `name =? expr` or `name =?`
    Param {
        name: String,
        default: Option<Expr>,
    },
}

impl Decl {
    /// The name this declaration introduces.
    pub fn name(&self) -> &str {
        match self {
            Decl::Import { module } => module,
            Decl::Node { name, .. } | Decl::Formula { name, .. } | Decl::Param { name, .. } => {
                name
            }
        }
    }
}

/// A possibly module-qualified node name (`Node` or `Module::Node`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodePath {
    pub module: Option<String>,
    pub name: String,
}

impl NodePath {
    pub fn local(name: impl Into<String>) -> Self {
        NodePath {
            module: None,
            name: name.into(),
        }
    }

    pub fn qualified(module: impl Into<String>, name: impl Into<String>) -> Self {
        NodePath {
            module: Some(module.into()),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{module}::{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// Attribute, parameter or comprehension variable reference.
    Ident(String),
    /// `_`
    SelfRef,
    /// Capitalized name: a node, or a host class when no node matches.
    NodeRef(NodePath),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `receiver.attr`
    GetAttr {
        receiver: Box<Expr>,
        attr: String,
    },
    /// `receiver[args]`
    Index {
        receiver: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `receiver.method(args)`
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// `target(k = v, **m)`
    NodeCall {
        target: Box<Expr>,
        args: Vec<KwArg>,
    },
    /// `ERR(args)`
    Raise(Vec<Expr>),
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Map(Vec<MapEntry>),
    Comprehension(Box<Comprehension>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapEntry {
    Pair { key: Expr, value: Expr },
    /// `**expr`
    Spread(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub enum KwArg {
    Named { name: String, value: Expr },
    /// `**expr`
    Spread(Expr),
}

/// `[body for binding in source if filter]` and its set/map variants.
#[derive(Clone, Debug, PartialEq)]
pub struct Comprehension {
    pub kind: ComprehensionKind,
    pub binding: Binding,
    pub source: Expr,
    pub filter: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ComprehensionKind {
    List(Expr),
    Set(Expr),
    Map { key: Expr, value: Expr },
}

/// Comprehension loop variable(s).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Single(String),
    /// `for k, v in pairs`
    Pair(String, String),
}

impl Binding {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Binding::Single(name) => vec![name.as_str()],
            Binding::Pair(a, b) => vec![a.as_str(), b.as_str()],
        }
    }
}
