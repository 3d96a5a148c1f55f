use dlr_eval::EvalErrorKind;
use dlrc::{DiagnosticKind, ModuleRegistry, Value};
use pretty_assertions::assert_eq;

use crate::common::{engine, eval, eval_with, script};

fn registry() -> ModuleRegistry {
    ModuleRegistry::new()
        .source(
            "Rates",
            script(&[
                "Tax:",
                "    rate =? 20",
                "    amount =?",
                "    tax = amount * rate / 100",
                "    ratio = amount / 0",
            ]),
        )
        .source(
            "Shop",
            script(&[
                "import Rates",
                "Item:",
                "    price =?",
                "    tax = Rates::Tax(amount = price).tax",
                "Reduced: Rates::Tax",
                "    rate =? 5",
            ]),
        )
        .source(
            "Main",
            script(&[
                "import Shop",
                "import Rates",
                "Basket:",
                "    prices = [10, 200]",
                "    taxes = [Shop::Item(price = p).tax for p in prices]",
                "    reduced = Shop::Reduced(amount = 200).tax",
                "    broken = Rates::Tax(amount = 1).ratio",
            ]),
        )
}

#[test]
fn test_import_chain() {
    let registry = registry();
    let main = engine(&registry, "Main");
    assert_eq!(
        eval(&main, "Basket", "taxes"),
        Ok(Value::list(vec![Value::Int(2), Value::Int(40)]))
    );
    assert_eq!(eval(&main, "Basket", "reduced"), Ok(Value::Int(10)));

    let shop = engine(&registry, "Shop");
    assert_eq!(
        eval_with(&shop, "Reduced", "tax", &[("amount", Value::Int(40))]),
        Ok(Value::Int(2))
    );
    assert_eq!(
        shop.enumerate_attrs_by_node("Reduced").unwrap(),
        ["amount", "rate", "ratio", "tax"]
    );
}

#[test]
fn test_runtime_errors_cross_modules() {
    let registry = registry();
    let main = engine(&registry, "Main");
    let err = eval(&main, "Basket", "broken").unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    let frames: Vec<(&str, u32, &str)> = err
        .backtrace()
        .map(|f| (&*f.module, f.line, &*f.attr))
        .collect();
    assert_eq!(frames, [("Main", 7, "broken"), ("Rates", 5, "ratio")]);
}

#[test]
fn test_diamond_imports_share_one_module() {
    let registry = registry();
    engine(&registry, "Main");
    assert_eq!(registry.module_names(), ["Main", "Rates", "Shop"]);
    let first = engine(&registry, "Rates");
    let second = engine(&registry, "Rates");
    assert_eq!(first.node("Tax").unwrap(), second.node("Tax").unwrap());
}

#[test]
fn test_import_failures() {
    let registry = ModuleRegistry::new()
        .source("Main", script(&["import Shop", "A:", "    a = 1"]))
        .source("Shop", script(&["import Missing", "Item:", "    price =?"]));
    let diag = registry.engine("Main").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::ModuleNotFound);
    assert_eq!((diag.module.as_str(), diag.line), ("Shop", 1));

    let registry = ModuleRegistry::new()
        .source("A", script(&["import B", "X:", "    x = 1"]))
        .source("B", script(&["import C", "Y:", "    y = 1"]))
        .source("C", script(&["import A", "Z:", "    z = 1"]));
    let diag = registry.engine("A").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::Recursion);
    assert_eq!(diag.message, "circular import: A -> B -> C -> A");

    let registry = ModuleRegistry::new()
        .source("Main", script(&["import Lib", "A:", "    a = Lib::Nope.x"]))
        .source("Lib", script(&["B:", "    x = 1"]));
    let diag = registry.engine("Main").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::UndefinedNode);
    assert_eq!(diag.line, 3);
}
