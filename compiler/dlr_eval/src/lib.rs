//! Compiler and sandboxed runtime for dlr scripts.
//!
//! A parsed script is compiled into an [`Engine`]: the check pass validates
//! every name and rejects dependency cycles, the rewrite pass lowers formulas
//! into an internal code form, and the result is a module of node types with
//! flattened inheritance tables.
//!
//! Evaluation is lazy and memoized per invocation: attributes are computed
//! on demand under a parameter bag and cached in that invocation's
//! environment. Method calls on host and built-in values are policed by a
//! [`Whitelist`]; class-level host functions by their declared [`Arity`].

mod actions;
mod builtins;
mod code;
mod dispatch;
mod engine;
mod env;
pub mod errors;
mod grok;
mod host;
mod interpreter;
mod module;
mod node_call;
mod operators;
mod resolver;
mod sandbox;
mod stack;
mod value;
pub mod whitelist;

pub use engine::{Engine, EngineBuilder};
pub use env::{params, Env, Params};
pub use errors::{EvalError, EvalErrorKind, EvalResult, Frame};
pub use grok::{grok_runtime_exception, GrokedError};
pub use host::{Arity, ClassRegistry, FnClass, HostClass, HostError, HostObject, Record};
pub use module::NodeRef;
pub use node_call::NodeCall;
pub use operators::{evaluate_binary, evaluate_unary, values_equal};
pub use resolver::{ModuleResolver, NoImports};
pub use value::{Map, Set, Value};
pub use whitelist::{ArgSpec, MethodMatcher, Whitelist};

pub use dlr_diagnostic::{Diagnostic, DiagnosticKind};

#[cfg(test)]
mod tests;
