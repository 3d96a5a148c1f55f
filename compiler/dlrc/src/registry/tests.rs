#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::path::Path;

use pretty_assertions::assert_eq;

use super::{module_name_of, ModuleRegistry};
use dlr_diagnostic::DiagnosticKind;
use dlr_eval::{Params, Value};

const LIB: &str = "Base:\n    x =? 2\n    y = x * 3\n";
const MAIN: &str = "import Lib\nTop: Lib::Base\n    x =? 5\n";

#[test]
fn test_resolves_registered_imports() {
    let registry = ModuleRegistry::new().source("Lib", LIB).source("Main", MAIN);
    let engine = registry.engine("Main").unwrap();
    assert_eq!(engine.module_name(), "Main");
    assert_eq!(
        engine.evaluate("Top", "y", Params::new()),
        Ok(Value::Int(15))
    );
    assert_eq!(registry.module_names(), ["Lib", "Main"]);
}

#[test]
fn test_missing_module() {
    let registry = ModuleRegistry::new().source("Main", MAIN);
    let diag = registry.engine("Main").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::ModuleNotFound);
    assert_eq!((diag.module.as_str(), diag.line), ("Main", 1));

    let diag = registry.engine("Nope").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::ModuleNotFound);
}

#[test]
fn test_circular_import() {
    let registry = ModuleRegistry::new()
        .source("A", "import B\nX:\n    a = 1\n")
        .source("B", "import A\nY:\n    b = 1\n");
    let diag = registry.engine("A").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::Recursion);
    assert_eq!(diag.message, "circular import: A -> B -> A");
    assert_eq!((diag.module.as_str(), diag.line), ("B", 1));

    // The failed attempt leaves nothing behind.
    let registry = ModuleRegistry::new().source("A", "X:\n    a = 1\n");
    assert!(registry.engine("A").is_ok());
}

#[test]
fn test_errors_are_located_in_imported_module() {
    let registry = ModuleRegistry::new()
        .source("Lib", "Base:\n    y = q\n")
        .source("Main", MAIN);
    let diag = registry.engine("Main").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::Undefined);
    assert_eq!((diag.module.as_str(), diag.line), ("Lib", 2));
}

#[test]
fn test_replacing_source_recompiles() {
    let mut registry = ModuleRegistry::new().source("Lib", LIB);
    assert_eq!(
        registry.engine("Lib").unwrap().enumerate_attrs_by_node("Base"),
        Ok(vec!["x".to_string(), "y".to_string()])
    );
    registry.add_source("Lib", "Base:\n    z = 1\n");
    assert_eq!(
        registry.engine("Lib").unwrap().enumerate_attrs_by_node("Base"),
        Ok(vec!["z".to_string()])
    );
}

#[test]
fn test_reads_sources_from_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Lib.dlr"), LIB).unwrap();

    let registry = ModuleRegistry::with_root(dir.path()).source("Main", MAIN);
    assert_eq!(
        registry.path_of("Lib"),
        Some(dir.path().join("Lib.dlr"))
    );
    assert_eq!(registry.path_of("../etc"), None);

    let engine = registry.engine("Main").unwrap();
    assert_eq!(
        engine.evaluate("Top", "y", Params::new()),
        Ok(Value::Int(15))
    );
}

#[test]
fn test_module_name_of() {
    assert_eq!(module_name_of(Path::new("rules/Pricing.dlr")), Some("Pricing"));
}
