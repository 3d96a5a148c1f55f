//! dlr IR - syntax tree types shared by the parser and the compiler.
//!
//! The parser produces a [`SourceFile`]: an ordered list of [`Line`]s, each
//! carrying one declaration (import, node, formula or parameter) and the
//! 1-based source line it came from. Diagnostics and runtime backtraces are
//! reported in terms of those line numbers.

pub mod ast;
mod ops;
mod span;
mod token;

pub use ast::{
    Binding, Comprehension, ComprehensionKind, Decl, Expr, ExprKind, KwArg, Line, Literal,
    MapEntry, NodePath, SourceFile,
};
pub use ops::{BinaryOp, UnaryOp};
pub use span::{LineIndex, Span};
pub use token::{Token, TokenKind};
