//! Builtin matcher rules for methods on built-in values.

use super::{ArgSpec, Whitelist};

const COLLECTIONS: [&str; 4] = ["String", "List", "Set", "Map"];

pub(super) fn register_builtins(w: &mut Whitelist) {
    let text = || ArgSpec::of(&["String"]);
    let int = || ArgSpec::of(&["Integer"]);

    for name in ["length", "is_empty"] {
        w.add_method(name, |m| {
            for ty in COLLECTIONS {
                m.called_on(ty, vec![]);
            }
        });
    }
    w.add_method_alias("size", "length");

    w.add_method("to_s", |m| {
        m.called_on("Object", vec![]);
    });
    for name in ["to_i", "to_f"] {
        w.add_method(name, |m| {
            m.called_on("Numeric", vec![])
                .called_on("String", vec![])
                .called_on("Nil", vec![]);
        });
    }
    w.add_method("round", |m| {
        m.called_on("Numeric", vec![int().or_nil()]);
    });
    for name in ["floor", "ceil", "abs"] {
        w.add_method(name, |m| {
            m.called_on("Numeric", vec![]);
        });
    }

    for name in ["upcase", "downcase", "strip"] {
        w.add_method(name, |m| {
            m.called_on("String", vec![]);
        });
    }
    w.add_method("split", |m| {
        m.called_on("String", vec![text().or_nil()]);
    });
    for name in ["starts_with", "ends_with"] {
        w.add_method(name, |m| {
            m.called_on("String", vec![text()]);
        });
    }
    w.add_method("reverse", |m| {
        m.called_on("String", vec![]).called_on("List", vec![]);
    });

    w.add_method("contains", |m| {
        m.called_on("String", vec![text()])
            .called_on("List", vec![ArgSpec::any().or_nil()])
            .called_on("Set", vec![ArgSpec::any().or_nil()])
            .called_on("Map", vec![ArgSpec::any().or_nil()]);
    });
    w.add_method_alias("include", "contains");

    for name in ["keys", "values"] {
        w.add_method(name, |m| {
            m.called_on("Map", vec![]);
        });
    }
    w.add_method("merge", |m| {
        m.called_on("Map", vec![ArgSpec::of(&["Map"])]);
    });
    w.add_method("fetch", |m| {
        m.called_on("Map", vec![ArgSpec::any(), ArgSpec::any().or_nil()])
            .called_on("List", vec![int(), ArgSpec::any().or_nil()]);
    });
    w.add_method("compact", |m| {
        m.called_on("List", vec![]).called_on("Map", vec![]);
    });

    for name in ["first", "last", "sort", "uniq", "flatten"] {
        w.add_method(name, |m| {
            m.called_on("List", vec![]);
        });
    }
    w.add_method("join", |m| {
        m.called_on("List", vec![text().or_nil()]);
    });
    for name in ["sum", "min", "max"] {
        w.add_method(name, |m| {
            m.called_on("List", vec![]).called_on("Set", vec![]);
        });
    }
    w.add_method("to_a", |m| {
        m.called_on("List", vec![])
            .called_on("Set", vec![])
            .called_on("Map", vec![]);
    });
}
