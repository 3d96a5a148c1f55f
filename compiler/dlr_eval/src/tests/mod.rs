//! Script-level tests: compile whole scripts and evaluate them.

mod eval_tests;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{
    Arity, Diagnostic, Engine, EngineBuilder, EvalError, HostClass, HostError, NoImports,
    ModuleResolver, Params, Value,
};

/// Join lines into a script.
pub(crate) fn script(lines: &[&str]) -> String {
    lines.join("\n")
}

pub(crate) fn compile(source: &str) -> Engine {
    compile_with(Engine::builder("test"), source)
}

pub(crate) fn compile_with(builder: EngineBuilder, source: &str) -> Engine {
    compile_resolved(builder, source, &NoImports)
}

pub(crate) fn compile_resolved(
    builder: EngineBuilder,
    source: &str,
    resolver: &dyn ModuleResolver,
) -> Engine {
    let file = dlr_parse::parse(source, "test").unwrap_or_else(|d| panic!("parse failed: {d}"));
    builder
        .compile(&file, resolver)
        .unwrap_or_else(|d| panic!("compile failed: {d}"))
}

pub(crate) fn compile_err(source: &str) -> Diagnostic {
    compile_err_with(Engine::builder("test"), source)
}

pub(crate) fn compile_err_with(builder: EngineBuilder, source: &str) -> Diagnostic {
    let file = dlr_parse::parse(source, "test").unwrap_or_else(|d| panic!("parse failed: {d}"));
    match builder.compile(&file, &NoImports) {
        Ok(_) => panic!("expected a compile error"),
        Err(diag) => diag,
    }
}

pub(crate) fn eval(engine: &Engine, node: &str, attr: &str) -> Result<Value, EvalError> {
    engine.evaluate(node, attr, Params::new())
}

/// Host class counting how often its functions run.
#[derive(Debug, Default, Clone)]
pub(crate) struct Counter {
    calls: Arc<AtomicUsize>,
}

impl Counter {
    pub(crate) fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HostClass for Counter {
    fn name(&self) -> &str {
        "Counter"
    }

    fn signature(&self, function: &str) -> Option<Arity> {
        match function {
            "bump" => Some(Arity::exact(0)),
            "add" => Some(Arity::range(1, 2)),
            _ => None,
        }
    }

    fn call(&self, function: &str, args: &[Value]) -> Result<Value, HostError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match (function, args) {
            ("bump", []) => Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX))),
            ("add", [Value::Int(a)]) => Ok(Value::Int(*a)),
            ("add", [Value::Int(a), Value::Int(b)]) => Ok(Value::Int(a + b)),
            _ => Err(HostError::new(format!("bad call to Counter.{function}"))),
        }
    }
}
