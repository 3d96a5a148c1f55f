use std::sync::Arc;

use dlr_eval::{
    ArgSpec, Arity, ClassRegistry, EvalErrorKind, FnClass, HostError, HostObject, Record,
    Whitelist,
};
use dlrc::{DiagnosticKind, ModuleRegistry, Value};
use pretty_assertions::assert_eq;

use crate::common::{engine, eval_with, script};

/// Calendar month exposed to scripts as an opaque value.
#[derive(Debug)]
struct Month {
    year: i64,
    month: i64,
}

impl HostObject for Month {
    fn type_chain(&self) -> &[&'static str] {
        &["Month"]
    }

    fn call_method(&self, method: &str, args: &[Value]) -> Result<Value, HostError> {
        match (method, args) {
            ("year", []) => Ok(Value::Int(self.year)),
            ("shift", [Value::Int(n)]) => {
                let total = self.year * 12 + (self.month - 1) + n;
                Ok(Value::foreign(Month {
                    year: total.div_euclid(12),
                    month: total.rem_euclid(12) + 1,
                }))
            }
            _ => Err(HostError::new(format!("Month#{method} is unavailable"))),
        }
    }
}

fn stats() -> FnClass {
    FnClass::new("Stats").function("max", Arity::at_least(1), |args| {
        args.iter()
            .map(|arg| match arg {
                Value::Int(n) => Ok(*n),
                other => Err(HostError::new(format!("not a number: {}", other.inspect()))),
            })
            .try_fold(i64::MIN, |best, n| n.map(|n| best.max(n)))
            .map(Value::Int)
    })
}

fn rules() -> Whitelist {
    let mut whitelist = Whitelist::default();
    whitelist.add_method("year", |m| {
        m.called_on("Month", vec![]);
    });
    whitelist.add_method("shift", |m| {
        m.called_on("Month", vec![ArgSpec::of(&["Integer"])]);
    });
    whitelist
}

const REPORT: &[&str] = &[
    "Report:",
    "    start =?",
    "    months =? 3",
    "    customer =?",
    "    year = start.year",
    "    later = start.shift(months).year",
    "    name = customer.name.upcase",
    "    email = customer.email",
    "    top = Stats.max(1, months, 2)",
    "    odd = Stats.max(1, name)",
];

fn registry(whitelist: Whitelist) -> ModuleRegistry {
    let mut classes = ClassRegistry::new();
    classes.register(Arc::new(stats()));
    ModuleRegistry::new()
        .classes(classes)
        .whitelist(whitelist)
        .source("Main", script(REPORT))
}

fn report_params() -> Vec<(&'static str, Value)> {
    vec![
        (
            "start",
            Value::foreign(Month {
                year: 2023,
                month: 11,
            }),
        ),
        (
            "customer",
            Value::record(Record::new("Customer").with("name", "ada")),
        ),
    ]
}

#[test]
fn test_host_values_in_scripts() {
    let engine = engine(&registry(rules()), "Main");
    let params = report_params();
    assert_eq!(eval_with(&engine, "Report", "year", &params), Ok(Value::Int(2023)));
    assert_eq!(eval_with(&engine, "Report", "later", &params), Ok(Value::Int(2024)));
    assert_eq!(eval_with(&engine, "Report", "name", &params), Ok(Value::str("ADA")));
    assert_eq!(eval_with(&engine, "Report", "email", &params), Ok(Value::Nil));
    assert_eq!(eval_with(&engine, "Report", "top", &params), Ok(Value::Int(3)));
}

#[test]
fn test_host_failures() {
    let engine = engine(&registry(rules()), "Main");
    let err = eval_with(&engine, "Report", "odd", &report_params()).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::Host {
            message: "not a number: \"ADA\"".to_string()
        }
    );

    let mut params = report_params();
    params.push(("months", Value::str("3")));
    let err = eval_with(&engine, "Report", "later", &params).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::BadArgument { .. }), "{err}");
}

#[test]
fn test_registry_whitelist_controls_access() {
    let engine = engine(&registry(Whitelist::default()), "Main");
    let params = report_params();
    let err = eval_with(&engine, "Report", "year", &params).unwrap_err();
    assert!(
        matches!(err.kind, EvalErrorKind::InvalidGetAttribute { .. }),
        "{err}"
    );
    let err = eval_with(&engine, "Report", "later", &params).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NoSuchMethod { .. }), "{err}");

    // Record fields and class functions do not go through the matcher.
    assert_eq!(eval_with(&engine, "Report", "top", &params), Ok(Value::Int(3)));
    assert_eq!(eval_with(&engine, "Report", "email", &params), Ok(Value::Nil));
}

#[test]
fn test_class_calls_are_checked_at_compile_time() {
    let mut classes = ClassRegistry::new();
    classes.register(Arc::new(stats()));
    let compile = |line: &str| {
        ModuleRegistry::new()
            .classes(classes.clone())
            .source("Main", script(&["A:", line]))
            .engine("Main")
    };

    assert!(compile("    a = Stats.max(1)").is_ok());
    let diag = compile("    a = Stats.max()").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::BadCall);
    assert_eq!(diag.line, 2);
    let diag = compile("    a = Stats.min(1)").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::UndefinedFunction);
    let diag = compile("    a = Clock.now()").unwrap_err();
    assert_eq!(diag.kind, DiagnosticKind::UndefinedNode);
}
