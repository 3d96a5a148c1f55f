//! Shared helpers for phase tests.

use dlrc::{Diagnostic, Engine, ModuleRegistry, Params, Value};
use dlr_eval::EvalError;

/// Join lines into a script.
pub fn script(lines: &[&str]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Compile module `name` out of `registry`, panicking with the diagnostic.
pub fn engine(registry: &ModuleRegistry, name: &str) -> Engine {
    registry
        .engine(name)
        .unwrap_or_else(|diag| panic!("{name} failed to compile: {diag}"))
}

/// Compile a single standalone module.
pub fn compile_ok(source: &str) -> Engine {
    engine(&ModuleRegistry::new().source("Main", source), "Main")
}

/// Compile a single standalone module that must be rejected.
pub fn compile_fail(source: &str) -> Diagnostic {
    match ModuleRegistry::new().source("Main", source).engine("Main") {
        Ok(_) => panic!("expected a compile error"),
        Err(diag) => diag,
    }
}

pub fn eval(engine: &Engine, node: &str, attr: &str) -> Result<Value, EvalError> {
    engine.evaluate(node, attr, Params::new())
}

pub fn eval_with(
    engine: &Engine,
    node: &str,
    attr: &str,
    params: &[(&str, Value)],
) -> Result<Value, EvalError> {
    engine.evaluate(node, attr, dlr_eval::params(params.iter().cloned()))
}
