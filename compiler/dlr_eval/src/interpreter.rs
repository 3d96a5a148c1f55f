//! Evaluation of lowered code.
//!
//! [`eval_attr`] is the single entry point for attribute evaluation: it
//! consults the memo cache of the environment, evaluates on a miss, records
//! a backtrace frame on failure, and stores the result on success. Failed
//! evaluations are never cached.

use std::sync::Arc;

use dlr_ir::BinaryOp;

use crate::code::{Binding, Code, Comprehension, ComprehensionKind, Entry, NodeTarget};
use crate::dispatch;
use crate::env::{CacheKey, Env, Params};
use crate::errors::{
    invalid_get_attribute, raised, type_mismatch, undefined_param, EvalError, EvalResult,
};
use crate::module::{Member, MemberKind, Module, NodeRef};
use crate::node_call;
use crate::operators::{evaluate_binary, evaluate_unary};
use crate::sandbox;
use crate::stack::ensure_sufficient_stack;
use crate::value::{Map, Value};

/// Evaluate attribute `name` of `node` under `env`.
pub(crate) fn eval_attr(env: &mut Env, node: &NodeRef, name: &str) -> EvalResult {
    let Some(slot) = node.lookup(name) else {
        return Err(invalid_get_attribute(
            name,
            &format!("node {}", node.name()),
            "no such attribute",
        ));
    };
    let key = CacheKey::new(node, slot.id);
    if let Some(value) = env.cached(&key) {
        return Ok(value.clone());
    }

    let member = Arc::clone(&slot.member);
    tracing::trace!(node = node.name(), attr = name, "evaluating");
    let value = ensure_sufficient_stack(|| eval_member(env, node, &member))
        .map_err(|err| err.with_frame(member.frame()))?;
    env.store(key, value.clone());
    Ok(value)
}

fn eval_member(env: &mut Env, node: &NodeRef, member: &Member) -> EvalResult {
    let home = member.module.upgrade().ok_or_else(|| {
        EvalError::new(format!("module {} is no longer loaded", member.module_name))
    })?;
    match &member.kind {
        MemberKind::Formula(code) => Interpreter::new(env, node, &home).eval(code),
        MemberKind::Param(default) => {
            if let Some(value) = env.param(&member.name) {
                return Ok(value.clone());
            }
            match default {
                Some(code) => Interpreter::new(env, node, &home).eval(code),
                None => Err(undefined_param(&member.name)),
            }
        }
    }
}

/// Tree-walking evaluator for one member body.
struct Interpreter<'a> {
    env: &'a mut Env,
    /// Node whose attribute is being computed; attributes resolve here.
    node: &'a NodeRef,
    /// Module the code was written in; local node references resolve here.
    home: &'a Arc<Module>,
    locals: Vec<Value>,
}

impl<'a> Interpreter<'a> {
    fn new(env: &'a mut Env, node: &'a NodeRef, home: &'a Arc<Module>) -> Self {
        Self {
            env,
            node,
            home,
            locals: Vec::new(),
        }
    }

    fn eval(&mut self, code: &Code) -> EvalResult {
        match code {
            Code::Const(value) => Ok(value.clone()),
            Code::Attr(name) => eval_attr(self.env, self.node, name),
            Code::Local(slot) => self
                .locals
                .get(*slot)
                .cloned()
                .ok_or_else(|| EvalError::new("comprehension variable out of scope")),
            Code::Params => Ok(Value::map(self.env.visible_params())),
            Code::Node(target) => Ok(Value::Node(self.node_ref(target))),
            Code::Class(class) => Ok(Value::Class(Arc::clone(class))),
            Code::Unary(op, operand) => {
                let value = self.eval(operand)?;
                evaluate_unary(&value, *op)
            }
            Code::Binary(op, left, right) => self.eval_binary(*op, left, right),
            Code::If(cond, then_branch, else_branch) => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then_branch)
                } else {
                    self.eval(else_branch)
                }
            }
            Code::GetAttr(receiver, attr) => {
                let receiver = self.eval(receiver)?;
                dispatch::get_attr(self.env, self.home, &receiver, attr)
            }
            Code::Index(receiver, args) => {
                let receiver = self.eval(receiver)?;
                let args = self.eval_all(args)?;
                dispatch::index(self.env, self.home, &receiver, &args)
            }
            Code::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let args = self.eval_all(args)?;
                sandbox::instance_call(&self.home.whitelist(), &receiver, method, &args)
            }
            Code::ClassCall {
                class,
                function,
                args,
            } => {
                let args = self.eval_all(args)?;
                sandbox::class_call(&**class, function, &args)
            }
            Code::NodeCall { target, args } => {
                let target = self.eval(target)?;
                let params = self.eval_entries(args)?;
                node_call::make_call(target, params, self.node)
            }
            Code::Raise(args) => {
                let parts: Vec<String> = self
                    .eval_all(args)?
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                Err(raised(parts.join(", ")))
            }
            Code::List(items) => Ok(Value::list(self.eval_all(items)?)),
            Code::Set(items) => Ok(Value::set(self.eval_all(items)?)),
            Code::Map(entries) => Ok(Value::map(self.eval_entries(entries)?)),
            Code::Comprehension(comp) => self.eval_comprehension(comp),
        }
    }

    fn node_ref(&self, target: &NodeTarget) -> NodeRef {
        match target {
            NodeTarget::Local(index) => NodeRef::new(Arc::clone(self.home), *index),
            NodeTarget::Imported(node) => node.clone(),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Code, right: &Code) -> EvalResult {
        let left = self.eval(left)?;
        match op {
            BinaryOp::And if !left.is_truthy() => return Ok(left),
            BinaryOp::Or if left.is_truthy() => return Ok(left),
            BinaryOp::And | BinaryOp::Or => return self.eval(right),
            _ => {}
        }
        let right = self.eval(right)?;

        if let Value::NodeCall(call) = &left {
            match (op, &right) {
                (BinaryOp::Div, _) => return Ok(call.bulk_safe(&right)),
                (BinaryOp::Mod, _) => return call.bulk_strict(&right),
                (BinaryOp::Add, Value::Map(params)) => {
                    return Ok(Value::NodeCall(Arc::new(call.amend(params))));
                }
                _ => {}
            }
        }
        evaluate_binary(&left, &right, op)
    }

    fn eval_all(&mut self, codes: &[Code]) -> Result<Vec<Value>, EvalError> {
        codes.iter().map(|code| self.eval(code)).collect()
    }

    fn eval_entries(&mut self, entries: &[Entry]) -> Result<Params, EvalError> {
        let mut out = Map::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Entry::Pair(key, value) => {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    out.insert(key, value);
                }
                Entry::Spread(code) => match self.eval(code)? {
                    Value::Map(spread) => {
                        out.extend(spread.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                    Value::Nil => {}
                    other => return Err(type_mismatch("**", &other, None)),
                },
            }
        }
        Ok(out)
    }

    fn eval_comprehension(&mut self, comp: &Comprehension) -> EvalResult {
        let source = self.eval(&comp.source)?;
        let items: Vec<Value> = match &source {
            Value::List(items) => items.to_vec(),
            Value::Set(items) => items.iter().cloned().collect(),
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| Value::list(vec![k.clone(), v.clone()]))
                .collect(),
            other => return Err(type_mismatch("for", other, None)),
        };

        let depth = self.locals.len();
        let mut values = Vec::with_capacity(items.len());
        let mut pairs = Map::new();
        for item in items {
            let step = self.comprehension_step(comp, item);
            self.locals.truncate(depth);
            match step? {
                Some(Produced::One(value)) => values.push(value),
                Some(Produced::Pair(key, value)) => {
                    pairs.insert(key, value);
                }
                None => {}
            }
        }

        Ok(match comp.kind {
            ComprehensionKind::List(_) => Value::list(values),
            ComprehensionKind::Set(_) => Value::set(values),
            ComprehensionKind::Map(..) => Value::map(pairs),
        })
    }

    /// Bind one item and evaluate the filter and body. The caller pops the
    /// bound locals.
    fn comprehension_step(
        &mut self,
        comp: &Comprehension,
        item: Value,
    ) -> Result<Option<Produced>, EvalError> {
        match comp.binding {
            Binding::Single => self.locals.push(item),
            Binding::Pair => match &item {
                Value::List(parts) if parts.len() == 2 => {
                    self.locals.extend(parts.iter().cloned());
                }
                other => return Err(type_mismatch("for k, v in", other, None)),
            },
        }

        if let Some(filter) = &comp.filter {
            if !self.eval(filter)?.is_truthy() {
                return Ok(None);
            }
        }

        Ok(Some(match &comp.kind {
            ComprehensionKind::List(body) | ComprehensionKind::Set(body) => {
                Produced::One(self.eval(body)?)
            }
            ComprehensionKind::Map(key, value) => {
                let key = self.eval(key)?;
                Produced::Pair(key, self.eval(value)?)
            }
        }))
    }
}

enum Produced {
    One(Value),
    Pair(Value, Value),
}
