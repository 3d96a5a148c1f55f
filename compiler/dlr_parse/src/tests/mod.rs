//! Parser tests, one file per grammar level.


use dlr_ir::{Decl, Expr, SourceFile};

use crate::parse;

pub(crate) fn parse_ok(source: &str) -> SourceFile {
    match parse(source, "Test") {
        Ok(file) => file,
        Err(diag) => panic!("parse failed: {diag}"),
    }
}

/// Parse `A:\n  x = <expr>` and return the formula's expression.
pub(crate) fn parse_formula(expr: &str) -> Expr {
    let file = parse_ok(&format!("A:\n  x = {expr}\n"));
    match file.lines.into_iter().nth(1).map(|l| l.decl) {
        Some(Decl::Formula { expr, .. }) => expr,
        other => panic!("expected formula, got {other:?}"),
    }
}
