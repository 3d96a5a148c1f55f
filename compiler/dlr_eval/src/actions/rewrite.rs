//! Lowering of checked expressions into [`Code`].

use std::sync::Arc;

use dlr_diagnostic::Diagnostic;
use dlr_ir::{ComprehensionKind as AstKind, Expr, ExprKind, KwArg, Literal, MapEntry};

use super::check::Target;
use super::Scope;
use crate::code::{Binding, Code, Comprehension, ComprehensionKind, Entry, NodeTarget};
use crate::module::ParentRef;
use crate::value::Value;

fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Nil => Value::Nil,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(v) => Value::Int(*v),
        Literal::Float(v) => Value::Float(*v),
        Literal::Str(s) => Value::str(s),
    }
}

fn boxed(code: Code) -> Box<Code> {
    Box::new(code)
}

impl Scope<'_> {
    pub(super) fn lower(&mut self, expr: &Expr) -> Result<Code, Diagnostic> {
        let code = match &expr.kind {
            ExprKind::Literal(lit) => Code::Const(literal(lit)),
            ExprKind::Ident(name) => match self.locals.iter().rposition(|local| local == name) {
                Some(slot) => Code::Local(slot),
                None => Code::Attr(Arc::from(name.as_str())),
            },
            ExprKind::SelfRef => Code::Params,
            ExprKind::NodeRef(path) => match self.resolve_target(path)? {
                Target::Node(ParentRef::Local(index)) => Code::Node(NodeTarget::Local(index)),
                Target::Node(ParentRef::Imported(node)) => Code::Node(NodeTarget::Imported(node)),
                Target::Class(class) => Code::Class(class),
            },
            ExprKind::Unary { op, operand } => Code::Unary(*op, boxed(self.lower(operand)?)),
            ExprKind::Binary { op, left, right } => Code::Binary(
                *op,
                boxed(self.lower(left)?),
                boxed(self.lower(right)?),
            ),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => Code::If(
                boxed(self.lower(cond)?),
                boxed(self.lower(then_branch)?),
                boxed(self.lower(else_branch)?),
            ),
            ExprKind::GetAttr { receiver, attr } => {
                Code::GetAttr(boxed(self.lower(receiver)?), Arc::from(attr.as_str()))
            }
            ExprKind::Index { receiver, args } => {
                Code::Index(boxed(self.lower(receiver)?), self.lower_all(args)?)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let class = match &receiver.kind {
                    ExprKind::NodeRef(path) => match self.resolve_target(path)? {
                        Target::Class(class) => Some(class),
                        Target::Node(_) => None,
                    },
                    _ => None,
                };
                match class {
                    Some(class) => Code::ClassCall {
                        class,
                        function: Arc::from(method.as_str()),
                        args: self.lower_all(args)?,
                    },
                    None => Code::MethodCall {
                        receiver: boxed(self.lower(receiver)?),
                        method: Arc::from(method.as_str()),
                        args: self.lower_all(args)?,
                    },
                }
            }
            ExprKind::NodeCall { target, args } => {
                let target = boxed(self.lower(target)?);
                let mut entries = Vec::with_capacity(args.len());
                for arg in args {
                    entries.push(match arg {
                        KwArg::Named { name, value } => {
                            Entry::Pair(Code::Const(Value::str(name)), self.lower(value)?)
                        }
                        KwArg::Spread(value) => Entry::Spread(self.lower(value)?),
                    });
                }
                Code::NodeCall {
                    target,
                    args: entries,
                }
            }
            ExprKind::Raise(args) => Code::Raise(self.lower_all(args)?),
            ExprKind::List(items) => Code::List(self.lower_all(items)?),
            ExprKind::Set(items) => Code::Set(self.lower_all(items)?),
            ExprKind::Map(entries) => {
                let mut lowered = Vec::with_capacity(entries.len());
                for entry in entries {
                    lowered.push(match entry {
                        MapEntry::Pair { key, value } => {
                            Entry::Pair(self.lower(key)?, self.lower(value)?)
                        }
                        MapEntry::Spread(value) => Entry::Spread(self.lower(value)?),
                    });
                }
                Code::Map(lowered)
            }
            ExprKind::Comprehension(comp) => {
                let source = self.lower(&comp.source)?;
                let names = comp.binding.names();
                let binding = if names.len() == 2 {
                    Binding::Pair
                } else {
                    Binding::Single
                };

                let depth = self.locals.len();
                self.locals.extend(names.iter().map(|n| (*n).to_string()));
                let body = self.lower_comprehension_body(comp);
                self.locals.truncate(depth);
                let (kind, filter) = body?;

                Code::Comprehension(Box::new(Comprehension {
                    kind,
                    binding,
                    source,
                    filter,
                }))
            }
        };
        Ok(code)
    }

    fn lower_comprehension_body(
        &mut self,
        comp: &dlr_ir::Comprehension,
    ) -> Result<(ComprehensionKind, Option<Code>), Diagnostic> {
        let kind = match &comp.kind {
            AstKind::List(body) => ComprehensionKind::List(self.lower(body)?),
            AstKind::Set(body) => ComprehensionKind::Set(self.lower(body)?),
            AstKind::Map { key, value } => {
                ComprehensionKind::Map(self.lower(key)?, self.lower(value)?)
            }
        };
        let filter = comp
            .filter
            .as_ref()
            .map(|filter| self.lower(filter))
            .transpose()?;
        Ok((kind, filter))
    }

    fn lower_all(&mut self, exprs: &[Expr]) -> Result<Vec<Code>, Diagnostic> {
        exprs.iter().map(|expr| self.lower(expr)).collect()
    }
}
