use dlr_eval::{EvalErrorKind, Frame};
use dlrc::{ModuleRegistry, Value};
use pretty_assertions::assert_eq;

use crate::common::{compile_ok, engine, eval, eval_with, script};

const PRICING: &[&str] = &[
    "Order:",
    "    qty =?",
    "    unit =? 3",
    "    total = qty * unit",
    "Bulk: Order",
    "    unit =? 2",
    "    discount = if total > 100 then total / 10 else 0",
    "    net = total - discount",
    "Quote:",
    "    qty =? 60",
    "    lines = [Order(qty = q).total for q in [1, 2, qty]]",
    "    bulk = Bulk(qty = qty) / [\"total\", \"net\"]",
];

fn frame(line: u32, attr: &str) -> Frame {
    Frame {
        module: "Main".into(),
        line,
        attr: attr.into(),
    }
}

#[test]
fn test_inherited_pricing() {
    let engine = compile_ok(&script(PRICING));
    let qty = [("qty", Value::Int(60))];
    assert_eq!(eval_with(&engine, "Order", "total", &qty), Ok(Value::Int(180)));
    assert_eq!(eval_with(&engine, "Bulk", "total", &qty), Ok(Value::Int(120)));
    assert_eq!(eval_with(&engine, "Bulk", "net", &qty), Ok(Value::Int(108)));
    assert_eq!(
        eval_with(&engine, "Bulk", "net", &[("qty", Value::Int(10))]),
        Ok(Value::Int(20))
    );
    assert_eq!(
        eval_with(&engine, "Bulk", "net", &[("qty", Value::Int(60)), ("unit", Value::Int(1))]),
        Ok(Value::Int(60))
    );
}

#[test]
fn test_node_calls_and_bulk_access() {
    let engine = compile_ok(&script(PRICING));
    assert_eq!(
        eval(&engine, "Quote", "lines"),
        Ok(Value::list(vec![Value::Int(3), Value::Int(6), Value::Int(180)]))
    );
    assert_eq!(
        eval(&engine, "Quote", "bulk"),
        Ok(Value::map_from([("total", Value::Int(120)), ("net", Value::Int(108))]))
    );
}

#[test]
fn test_evaluate_many_shares_one_environment() {
    let engine = compile_ok(&script(PRICING));
    let values = engine
        .evaluate_many("Bulk", &["total", "discount", "net"], dlr_eval::params([("qty", Value::Int(100))]))
        .unwrap();
    assert_eq!(values, [Value::Int(200), Value::Int(20), Value::Int(180)]);

    let hash = engine
        .eval_to_hash("Order", &["qty", "total"], dlr_eval::params([("qty", Value::Int(2))]))
        .unwrap();
    assert_eq!(hash.get("total"), Some(&Value::Int(6)));
    assert_eq!(hash.keys().collect::<Vec<_>>(), ["qty", "total"]);
}

#[test]
fn test_missing_param_reports_backtrace() {
    let engine = compile_ok(&script(PRICING));
    let err = eval(&engine, "Bulk", "net").unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UndefinedParam {
            name: "qty".to_string()
        }
    );
    let backtrace: Vec<_> = err.backtrace().cloned().collect();
    assert_eq!(
        backtrace,
        [frame(8, "net"), frame(4, "total"), frame(2, "qty")]
    );
}

#[test]
fn test_enumeration() {
    let engine = compile_ok(&script(PRICING));
    assert_eq!(
        engine.enumerate_nodes().into_iter().collect::<Vec<_>>(),
        ["Bulk", "Order", "Quote"]
    );
    assert_eq!(
        engine.enumerate_attrs_by_node("Bulk").unwrap(),
        ["discount", "net", "qty", "total", "unit"]
    );
    assert_eq!(
        engine.enumerate_params().into_iter().collect::<Vec<_>>(),
        ["qty", "unit"]
    );
}

#[test]
fn test_engine_is_shared_across_threads() {
    let registry = ModuleRegistry::new().source("Main", script(PRICING));
    let engine = engine(&registry, "Main");
    let totals: Vec<Value> = std::thread::scope(|scope| {
        let handles: Vec<_> = (1..=4)
            .map(|qty| {
                let engine = &engine;
                scope.spawn(move || {
                    eval_with(engine, "Order", "total", &[("qty", Value::Int(qty))]).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(
        totals,
        [Value::Int(3), Value::Int(6), Value::Int(9), Value::Int(12)]
    );
}
