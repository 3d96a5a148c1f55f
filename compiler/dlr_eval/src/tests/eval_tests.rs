#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::{compile, compile_with, eval, script, Counter};
use crate::{params, Engine, EvalErrorKind, Frame, Map, Value};

fn frame(line: u32, attr: &str) -> Frame {
    Frame {
        module: "test".into(),
        line,
        attr: attr.into(),
    }
}

#[test]
fn test_arithmetic_formula() {
    let engine = compile(&script(&["A:", "    a = 123", "    b = -(a * 2)"]));
    assert_eq!(eval(&engine, "A", "b"), Ok(Value::Int(-246)));
}

#[test]
fn test_param_default_and_override() {
    let engine = compile(&script(&["A:", "    a =? 123", "    c = a / 123.0"]));
    assert_eq!(eval(&engine, "A", "c"), Ok(Value::Float(1.0)));
    assert_eq!(
        engine.evaluate("A", "c", params([("a", Value::Int(246))])),
        Ok(Value::Float(2.0))
    );
}

#[test]
fn test_explicit_nil_param_beats_default() {
    let engine = compile(&script(&["A:", "    a =? 1"]));
    assert_eq!(
        engine.evaluate("A", "a", params([("a", Value::Nil)])),
        Ok(Value::Nil)
    );
}

#[test]
fn test_recursive_node_call() {
    let engine = compile(&script(&[
        "A:",
        "    n =?",
        "    fact = if n < 2 then 1 else n * A(n = n - 1).fact",
    ]));
    assert_eq!(
        engine.evaluate("A", "fact", params([("n", Value::Int(10))])),
        Ok(Value::Int(3_628_800))
    );
}

#[test]
fn test_deep_recursion_does_not_overflow() {
    let engine = compile(&script(&[
        "A:",
        "    n =?",
        "    total = if n == 0 then 0 else n + A(n = n - 1).total",
    ]));
    assert_eq!(
        engine.evaluate("A", "total", params([("n", Value::Int(5000))])),
        Ok(Value::Int(12_502_500))
    );
}

#[test]
fn test_undefined_param_backtrace() {
    let engine = compile(&script(&[
        "A:",
        "    n =?",
        "    fact = if n < 2 then 1 else n * A(n = n - 1).fact",
    ]));
    let err = eval(&engine, "A", "fact").unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UndefinedParam {
            name: "n".to_string()
        }
    );
    let backtrace: Vec<_> = err.backtrace().cloned().collect();
    assert_eq!(backtrace, [frame(3, "fact"), frame(2, "n")]);
}

#[test]
fn test_child_overrides_parent() {
    let engine = compile(&script(&[
        "A:",
        "    a = 1",
        "    b = a + 1",
        "B: A",
        "    a = 10",
    ]));
    assert_eq!(eval(&engine, "A", "b"), Ok(Value::Int(2)));
    assert_eq!(eval(&engine, "B", "b"), Ok(Value::Int(11)));
}

#[test]
fn test_param_resolution_order() {
    let engine = compile(&script(&[
        "A:",
        "    x =? 1",
        "    y = x * 2",
        "B: A",
        "    x =? 5",
    ]));
    assert_eq!(eval(&engine, "A", "y"), Ok(Value::Int(2)));
    assert_eq!(eval(&engine, "B", "y"), Ok(Value::Int(10)));
    assert_eq!(
        engine.evaluate("B", "y", params([("x", Value::Int(3))])),
        Ok(Value::Int(6))
    );
}

#[test]
fn test_formula_overridden_as_param() {
    let engine = compile(&script(&[
        "A:",
        "    a = 1",
        "    b = a + 1",
        "B: A",
        "    a =?",
    ]));
    assert_eq!(
        engine.evaluate("B", "b", params([("a", Value::Int(5))])),
        Ok(Value::Int(6))
    );
    assert_eq!(
        engine.evaluate("A", "b", params([("a", Value::Int(5))])),
        Ok(Value::Int(2))
    );

    let err = eval(&engine, "B", "b").unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UndefinedParam {
            name: "a".to_string()
        }
    );
    let backtrace: Vec<_> = err.backtrace().cloned().collect();
    assert_eq!(backtrace, [frame(3, "b"), frame(5, "a")]);
}

#[test]
fn test_static_attribute_shares_params() {
    let engine = compile(&script(&[
        "A:",
        "    a =? 1",
        "    c = a * 2",
        "B:",
        "    c = A.c + 1",
    ]));
    assert_eq!(
        engine.evaluate("B", "c", params([("a", Value::Int(5))])),
        Ok(Value::Int(11))
    );
}

#[test]
fn test_memoized_within_one_evaluation() {
    let counter = Counter::default();
    let engine = compile_with(
        Engine::builder("test").class(counter.clone()),
        &script(&["A:", "    x = Counter.bump()", "    y = x + x", "    z = [x, y]"]),
    );
    assert_eq!(
        eval(&engine, "A", "z"),
        Ok(Value::list(vec![Value::Int(1), Value::Int(2)]))
    );
    assert_eq!(counter.count(), 1);

    // A fresh evaluation has a fresh cache.
    assert_eq!(eval(&engine, "A", "x"), Ok(Value::Int(2)));
    assert_eq!(counter.count(), 2);
}

#[test]
fn test_evaluate_many_shares_cache() {
    let counter = Counter::default();
    let engine = compile_with(
        Engine::builder("test").class(counter.clone()),
        &script(&["A:", "    x = Counter.bump()", "    y = x * 10"]),
    );
    let values = engine
        .evaluate_many("A", &["x", "y"], crate::Params::new())
        .unwrap();
    assert_eq!(values, [Value::Int(1), Value::Int(10)]);
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_node_call_memoizes_per_instance() {
    let counter = Counter::default();
    let engine = compile_with(
        Engine::builder("test").class(counter.clone()),
        &script(&[
            "A:",
            "    x = Counter.bump()",
            "B:",
            "    a = A()",
            "    r = a.x + a.x",
            "    s = A().x + A().x",
        ]),
    );
    assert_eq!(eval(&engine, "B", "r"), Ok(Value::Int(2)));
    assert_eq!(counter.count(), 1);

    assert_eq!(eval(&engine, "B", "s"), Ok(Value::Int(5)));
    assert_eq!(counter.count(), 3);
}

#[test]
fn test_short_circuit() {
    let counter = Counter::default();
    let engine = compile_with(
        Engine::builder("test").class(counter.clone()),
        &script(&[
            "A:",
            "    a = false && Counter.bump()",
            "    b = 1 || Counter.bump()",
            "    c = nil || 7",
            "    d = 1 && 2",
        ]),
    );
    assert_eq!(eval(&engine, "A", "a"), Ok(Value::Bool(false)));
    assert_eq!(eval(&engine, "A", "b"), Ok(Value::Int(1)));
    assert_eq!(eval(&engine, "A", "c"), Ok(Value::Int(7)));
    assert_eq!(eval(&engine, "A", "d"), Ok(Value::Int(2)));
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_class_call_with_args() {
    let engine = compile_with(
        Engine::builder("test").class(Counter::default()),
        &script(&["A:", "    a = Counter.add(2, 3)", "    b = Counter.add(4)"]),
    );
    assert_eq!(eval(&engine, "A", "a"), Ok(Value::Int(5)));
    assert_eq!(eval(&engine, "A", "b"), Ok(Value::Int(4)));
}

const BULK: &[&str] = &[
    "A:",
    "    n =?",
    "    ok = n + 1",
    "    bad = n / 0",
    "B:",
    "    r = A(n = 1) / [\"ok\", \"bad\"]",
    "    s = A(n = 1) % [\"ok\"]",
    "    t = A(n = 1) % [\"ok\", \"bad\"]",
    "    u = A(n = 1) / \"ok\"",
];

#[test]
fn test_bulk_safe_isolates_failures() {
    let engine = compile(&script(BULK));
    let expected = Value::map_from([
        ("ok", Value::Int(2)),
        (
            "bad",
            Value::map_from([
                ("error", Value::str("divided by 0")),
                (
                    "backtrace",
                    Value::list(vec![Value::list(vec![
                        Value::str("test"),
                        Value::Int(4),
                        Value::str("bad"),
                    ])]),
                ),
            ]),
        ),
    ]);
    assert_eq!(eval(&engine, "B", "r"), Ok(expected));
    assert_eq!(eval(&engine, "B", "u"), Ok(Value::Int(2)));
}

#[test]
fn test_bulk_strict_propagates() {
    let engine = compile(&script(BULK));
    assert_eq!(
        eval(&engine, "B", "s"),
        Ok(Value::map_from([("ok", Value::Int(2))]))
    );

    let err = eval(&engine, "B", "t").unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    let backtrace: Vec<_> = err.backtrace().cloned().collect();
    assert_eq!(backtrace, [frame(8, "t"), frame(4, "bad")]);
}

#[test]
fn test_amend_merges_params() {
    let engine = compile(&script(&[
        "A:",
        "    a =?",
        "    b =?",
        "    s = a + b",
        "B:",
        "    p = A(a = 1)",
        "    q = (p + {\"b\": 2}).s",
        "    r = (A() + {\"a\": 1} + {\"b\": 2}).s",
        "    t = p(b = 5).s",
        "    u = (p + {\"a\": 10, \"b\": 1}).s",
    ]));
    assert_eq!(eval(&engine, "B", "q"), Ok(Value::Int(3)));
    assert_eq!(eval(&engine, "B", "r"), Ok(Value::Int(3)));
    assert_eq!(eval(&engine, "B", "t"), Ok(Value::Int(6)));
    assert_eq!(eval(&engine, "B", "u"), Ok(Value::Int(11)));
}

#[test]
fn test_node_call_spreads_params() {
    let engine = compile(&script(&[
        "A:",
        "    a =?",
        "    b =? 0",
        "    s = a * 10 + b",
        "B:",
        "    m = {\"a\": 4}",
        "    r = A(**m, b = 2).s",
        "    t = A(**_).s",
    ]));
    assert_eq!(eval(&engine, "B", "r"), Ok(Value::Int(42)));
    assert_eq!(
        engine.evaluate("B", "t", params([("a", Value::Int(7))])),
        Ok(Value::Int(70))
    );
}

#[test]
fn test_nil_target_calls_current_node() {
    let engine = compile(&script(&[
        "A:",
        "    n =? 3",
        "    down = if n == 0 then 0 else 1 + nil(n = n - 1).down",
        "B: A",
        "    n =? 2",
    ]));
    assert_eq!(eval(&engine, "A", "down"), Ok(Value::Int(3)));
    assert_eq!(eval(&engine, "B", "down"), Ok(Value::Int(2)));
}

#[test]
fn test_raise() {
    let engine = compile(&script(&[
        "A:",
        "    a = ERR(\"bad\", 1)",
        "    b = if 1 > 2 then 1 else ERR(\"no\")",
    ]));
    let err = eval(&engine, "A", "a").unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::Raised {
            message: "bad, 1".to_string()
        }
    );
    assert_eq!(eval(&engine, "A", "b").unwrap_err().message, "no");
}

#[test]
fn test_permissive_attribute_access() {
    let engine = compile(&script(&[
        "A:",
        "    m = {\"a\": 1}",
        "    x = m.a",
        "    y = m.zz",
        "    z = nil.foo",
        "    w = nil[1, 2]",
    ]));
    assert_eq!(eval(&engine, "A", "x"), Ok(Value::Int(1)));
    assert_eq!(eval(&engine, "A", "y"), Ok(Value::Nil));
    assert_eq!(eval(&engine, "A", "z"), Ok(Value::Nil));
    assert_eq!(eval(&engine, "A", "w"), Ok(Value::Nil));
}

#[test]
fn test_indexing() {
    let engine = compile(&script(&[
        "A:",
        "    l = [1, 2, 3, 4]",
        "    a = l[0]",
        "    b = l[-1]",
        "    c = l[1, 2]",
        "    d = l[10]",
        "    e = \"hello\"[1, 3]",
        "    f = {\"k\": 5}[\"k\"]",
        "    g = A[\"a\"]",
        "    h = l[\"x\"]",
        "    i = 5[0]",
    ]));
    assert_eq!(eval(&engine, "A", "a"), Ok(Value::Int(1)));
    assert_eq!(eval(&engine, "A", "b"), Ok(Value::Int(4)));
    assert_eq!(
        eval(&engine, "A", "c"),
        Ok(Value::list(vec![Value::Int(2), Value::Int(3)]))
    );
    assert_eq!(eval(&engine, "A", "d"), Ok(Value::Nil));
    assert_eq!(eval(&engine, "A", "e"), Ok(Value::str("ell")));
    assert_eq!(eval(&engine, "A", "f"), Ok(Value::Int(5)));
    assert_eq!(eval(&engine, "A", "g"), Ok(Value::Int(1)));
    assert!(matches!(
        eval(&engine, "A", "h").unwrap_err().kind,
        EvalErrorKind::InvalidIndex { .. }
    ));
    assert!(matches!(
        eval(&engine, "A", "i").unwrap_err().kind,
        EvalErrorKind::InvalidIndex { .. }
    ));
}

#[test]
fn test_comprehensions() {
    let engine = compile(&script(&[
        "A:",
        "    l = [1, 2, 3, 4]",
        "    evens = [x * 10 for x in l if x % 2 == 0]",
        "    parity = {x % 2 for x in l}",
        "    doubled = {k: v * 2 for k, v in {\"a\": 1, \"b\": 2}}",
    ]));
    assert_eq!(
        eval(&engine, "A", "evens"),
        Ok(Value::list(vec![Value::Int(20), Value::Int(40)]))
    );
    assert_eq!(
        eval(&engine, "A", "parity"),
        Ok(Value::set([Value::Int(1), Value::Int(0)]))
    );
    assert_eq!(
        eval(&engine, "A", "doubled"),
        Ok(Value::map_from([("a", Value::Int(2)), ("b", Value::Int(4))]))
    );
}

#[test]
fn test_params_reference() {
    let engine = compile(&script(&["A:", "    p = _", "    q = _.a"]));
    let mut bag = params([("a", Value::Int(1)), ("Hidden", Value::Int(2))]);
    bag.insert(Value::Int(3), Value::str("three"));

    let mut expected = Map::new();
    expected.insert(Value::str("a"), Value::Int(1));
    expected.insert(Value::Int(3), Value::str("three"));
    assert_eq!(engine.evaluate("A", "p", bag.clone()), Ok(Value::map(expected)));
    assert_eq!(engine.evaluate("A", "q", bag), Ok(Value::Int(1)));
}

#[test]
fn test_unknown_attribute_and_node() {
    let engine = compile(&script(&["A:", "    a = 1"]));
    assert!(matches!(
        eval(&engine, "A", "zz").unwrap_err().kind,
        EvalErrorKind::InvalidGetAttribute { .. }
    ));
    assert!(matches!(
        eval(&engine, "Q", "a").unwrap_err().kind,
        EvalErrorKind::UndefinedNode { .. }
    ));
}

#[test]
fn test_eval_to_hash() {
    let engine = compile(&script(&["A:", "    a = 1", "    b = a + 1"]));
    let hash = engine
        .eval_to_hash("A", &["b", "a"], crate::Params::new())
        .unwrap();
    let pairs: Vec<_> = hash.into_iter().collect();
    assert_eq!(
        pairs,
        [("b".to_string(), Value::Int(2)), ("a".to_string(), Value::Int(1))]
    );
}
