#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::{get_attr, index, map_get};
use crate::env::{Env, Params};
use crate::errors::EvalErrorKind;
use crate::host::Record;
use crate::tests::{compile, script};
use crate::value::{Map, Value};
use crate::Engine;

fn engine() -> Engine {
    compile(&script(&["A:", "    a = 1", "    b = a + 1"]))
}

fn attr(receiver: &Value, name: &str) -> Result<Value, crate::EvalError> {
    let engine = engine();
    get_attr(&mut Env::new(Params::new()), &engine.module, receiver, name)
}

fn idx(receiver: &Value, args: &[Value]) -> Result<Value, crate::EvalError> {
    let engine = engine();
    index(&mut Env::new(Params::new()), &engine.module, receiver, args)
}

#[test]
fn test_map_get_falls_back_to_symbol() {
    let mut map = Map::new();
    map.insert(Value::symbol("k"), Value::Int(1));
    map.insert(Value::str("s"), Value::Int(2));
    assert_eq!(map_get(&map, &Value::str("k")), Some(&Value::Int(1)));
    assert_eq!(map_get(&map, &Value::str("s")), Some(&Value::Int(2)));
    assert_eq!(map_get(&map, &Value::symbol("s")), None);
}

#[test]
fn test_nil_and_map_are_permissive() {
    assert_eq!(attr(&Value::Nil, "anything"), Ok(Value::Nil));
    let map = Value::map_from([("x", Value::Int(3))]);
    assert_eq!(attr(&map, "x"), Ok(Value::Int(3)));
    assert_eq!(attr(&map, "y"), Ok(Value::Nil));
}

#[test]
fn test_node_attribute() {
    let engine = engine();
    let node = Value::Node(engine.node("A").unwrap());
    let mut env = Env::new(Params::new());
    assert_eq!(
        get_attr(&mut env, &engine.module, &node, "b"),
        Ok(Value::Int(2))
    );
    // Evaluated in the caller's environment.
    assert_eq!(env.cached_len(), 2);
}

#[test]
fn test_record_fields() {
    let record = Value::record(Record::new("Point").with("x", 4_i64));
    assert_eq!(attr(&record, "x"), Ok(Value::Int(4)));
    assert_eq!(attr(&record, "z"), Ok(Value::Nil));
}

#[test]
fn test_builtin_method_as_attribute() {
    assert_eq!(attr(&Value::str("abc"), "length"), Ok(Value::Int(3)));
    let err = attr(&Value::Int(1), "length").unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::InvalidGetAttribute {
            attr: "length".to_string(),
            receiver: "Integer".to_string(),
            cause: "no such method length for Integer".to_string(),
        }
    );
}

#[test]
fn test_sequence_indexing() {
    let list = Value::list((0..5).map(Value::Int).collect());
    assert_eq!(idx(&list, &[Value::Int(-2)]), Ok(Value::Int(3)));
    assert_eq!(idx(&list, &[Value::Int(5)]), Ok(Value::Nil));
    assert_eq!(
        idx(&list, &[Value::Int(3), Value::Int(10)]),
        Ok(Value::list(vec![Value::Int(3), Value::Int(4)]))
    );
    assert_eq!(
        idx(&list, &[Value::Int(5), Value::Int(1)]),
        Ok(Value::list(vec![]))
    );
    assert_eq!(idx(&list, &[Value::Int(6), Value::Int(1)]), Ok(Value::Nil));
    assert_eq!(idx(&Value::str("héllo"), &[Value::Int(1)]), Ok(Value::str("é")));
}

#[test]
fn test_index_errors() {
    let map = Value::map_from([("k", Value::Int(1))]);
    assert_eq!(idx(&map, &[Value::str("k")]), Ok(Value::Int(1)));
    assert!(matches!(
        idx(&map, &[Value::str("k"), Value::Int(1)]).map_err(|e| e.kind),
        Err(EvalErrorKind::InvalidIndex { .. })
    ));
    assert!(matches!(
        idx(&Value::Bool(true), &[Value::Int(0)]).map_err(|e| e.kind),
        Err(EvalErrorKind::InvalidIndex { .. })
    ));

    let engine = engine();
    let node = Value::Node(engine.node("A").unwrap());
    assert!(matches!(
        idx(&node, &[Value::Int(0)]).map_err(|e| e.kind),
        Err(EvalErrorKind::InvalidIndex { .. })
    ));
}

#[test]
fn test_node_index_by_name() {
    let engine = engine();
    let node = Value::Node(engine.node("A").unwrap());
    let mut env = Env::new(Params::new());
    assert_eq!(
        index(&mut env, &engine.module, &node, &[Value::str("a")]),
        Ok(Value::Int(1))
    );
}
