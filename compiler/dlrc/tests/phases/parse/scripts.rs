use dlrc::DiagnosticKind;
use dlr_ir::Decl;
use pretty_assertions::assert_eq;

use crate::common::{compile_fail, script};

const PRICING: &[&str] = &[
    "# Tiered pricing rules",
    "import Rates",
    "",
    "Order:",
    "    qty =?",
    "    unit =? 2.5",
    "    items = [unit for _ignored in [1]]",
    "    total = qty * unit",
    "",
    "Bulk: Order",
    "    unit =? 2.0",
    "    discount = if total > 100 then total * 0.1 else 0",
    "    summary = {\"total\": total, \"discount\": discount, **{}}",
];

#[test]
fn test_script_structure() {
    let file = dlr_parse::parse(&script(PRICING), "Pricing").unwrap();
    let shape: Vec<(u32, &str, &str)> = file
        .lines
        .iter()
        .map(|line| {
            let kind = match &line.decl {
                Decl::Import { .. } => "import",
                Decl::Node { .. } => "node",
                Decl::Formula { .. } => "formula",
                Decl::Param { .. } => "param",
            };
            (line.line, kind, line.decl.name())
        })
        .collect();
    assert_eq!(
        shape,
        vec![
            (2, "import", "Rates"),
            (4, "node", "Order"),
            (5, "param", "qty"),
            (6, "param", "unit"),
            (7, "formula", "items"),
            (8, "formula", "total"),
            (10, "node", "Bulk"),
            (11, "param", "unit"),
            (12, "formula", "discount"),
            (13, "formula", "summary"),
        ]
    );
}

#[test]
fn test_syntax_errors_carry_location() {
    let diag = compile_fail(&script(&["A:", "    a = 1 +", "    b = 2"]));
    assert_eq!(diag.kind, DiagnosticKind::Parse);
    assert_eq!((diag.module.as_str(), diag.line), ("Main", 2));

    let diag = compile_fail(&script(&["A:", "b = 1"]));
    assert_eq!(diag.kind, DiagnosticKind::Parse);
    assert_eq!(diag.line, 2);

    let diag = compile_fail(&script(&["A:", "    c = B(1)"]));
    assert_eq!(diag.kind, DiagnosticKind::Parse);
}

#[test]
fn test_unterminated_literals() {
    for source in ["A:\n    a = [1, 2\n", "A:\n    a = {\"k\": 1\n", "A:\n    a = \"open\n"] {
        let diag = compile_fail(source);
        assert_eq!(diag.kind, DiagnosticKind::Parse, "{source:?}");
    }
}
