//! Compile-time diagnostics.
//!
//! Every fault found while parsing or checking a module is reported as a
//! single [`Diagnostic`] carrying the module name and 1-based line number of
//! the offending declaration. Compilation stops at the first diagnostic; no
//! partially checked module is ever produced.

mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticKind};
