use std::{cell::Cell, rc::Rc};

use pretty_assertions::assert_eq;

use runtime::{
    config::{Configuration, RECURSION_LIMIT},
    interp::{EvalError, Interpreter},
    list::{ListError, ListProtocol},
    value::Value,
};

fn interpreter() -> Rc<Interpreter> {
    let interp = Interpreter::new(Configuration::new()).unwrap();
    interp.eval("proc sq {i} {* $i $i}").unwrap();
    interp
}

fn eval(interp: &Interpreter, source: &str) -> String {
    interp.eval(source).unwrap().text().to_string()
}

/// Registers `count`, which returns its argument and counts its calls
fn counter(interp: &Interpreter) -> Rc<Cell<usize>> {
    let calls = Rc::new(Cell::new(0));
    let counted = Rc::clone(&calls);
    interp.register_command("count", move |_, args| {
        counted.set(counted.get() + 1);
        Ok(args[0].clone())
    });
    calls
}

#[test]
fn elements_are_generated() {
    let interp = interpreter();

    assert_eq!(
        eval(&interp, "set g [lgen 4 sq]; list [llength $g] [lindex $g 3] [typeof $g]"),
        "4 9 lgenseries"
    );
    assert_eq!(eval(&interp, "lgen 4 sq"), "0 1 4 9");
    assert_eq!(eval(&interp, "lgen 0 sq"), "");
    assert_eq!(eval(&interp, "lindex [lgen 4 sq] 4"), "");
}

#[test]
fn template_arguments() {
    let interp = interpreter();
    interp.eval("proc mul {k i} {* $k $i}").unwrap();

    assert_eq!(eval(&interp, "lgen 3 mul 10"), "0 10 20");
}

#[test]
fn nothing_is_cached() {
    let interp = interpreter();
    let calls = counter(&interp);

    interp.eval("set g [lgen 3 count]; llength $g").unwrap();
    assert_eq!(calls.get(), 0);

    assert_eq!(eval(&interp, "lindex $g 1"), "1");
    assert_eq!(calls.get(), 1);
    assert_eq!(eval(&interp, "lindex $g 1"), "1");
    assert_eq!(calls.get(), 2);

    assert_eq!(eval(&interp, "set g"), "0 1 2");
    assert_eq!(calls.get(), 5);

    // the text is cached once generated
    assert_eq!(eval(&interp, "set g"), "0 1 2");
    assert_eq!(calls.get(), 5);
}

#[test]
fn range_falls_back() {
    let interp = interpreter();

    assert_eq!(eval(&interp, "lrange [lgen 5 sq] 1 2"), "1 4");
    assert_eq!(eval(&interp, "typeof [lrange [lgen 5 sq] 1 2]"), "list");
    assert_eq!(eval(&interp, "lreverse [lgen 3 sq]"), "4 1 0");
    assert_eq!(eval(&interp, "lcontains [lgen 3 sq] 4"), "1");
}

#[test]
fn evaluation_errors() {
    let interp = interpreter();
    interp.eval("proc bad {i} {error boom}").unwrap();

    let err = interp.eval("lindex [lgen 2 bad] 0").unwrap_err();
    assert_eq!(err.to_string(), "Error: boom\nwhile executing bad 0");
}

#[test]
fn failed_elements_are_skipped_in_text() {
    let interp = interpreter();
    interp.register_command("flaky", |_, args| match &*args[0].text() {
        "1" => Err(EvalError::Raised("flaky".to_string())),
        _ => Ok(args[0].clone()),
    });

    assert_eq!(eval(&interp, "lgen 3 flaky"), "0 2");
}

#[test]
fn interpreter_is_gone() {
    let interp = interpreter();
    let generated: Value = interp.eval("lgen 2 sq").unwrap();
    drop(interp);

    let result = ListProtocol::default().index(&generated, 0);
    assert!(matches!(result, Err(ListError::NoContext)));
    assert_eq!(ListProtocol::default().length(&generated).unwrap(), 2);
}

#[test]
fn reentrant_generators_hit_the_limit() {
    let mut config = Configuration::new();
    config.set_string(RECURSION_LIMIT, "64".to_string());
    let interp = Interpreter::new(config).unwrap();
    interp
        .eval("proc nested {i} {lindex [lgen 2 nested] 0}")
        .unwrap();

    let err = interp.eval("nested 0").unwrap_err();
    assert!(err
        .to_string()
        .contains("too many nested evaluations (infinite loop?)"));
}

#[test]
fn all_generates_every_time() {
    let interp = interpreter();
    let calls = counter(&interp);
    let protocol = ListProtocol::default();
    let generated = interp.eval("lgen 3 count").unwrap();

    let texts = |values: Vec<Value>| -> Vec<String> {
        values.iter().map(|value| value.text().to_string()).collect()
    };
    assert_eq!(texts(protocol.all(&generated).unwrap()), ["0", "1", "2"]);
    assert_eq!(calls.get(), 3);
    assert_eq!(texts(protocol.all(&generated).unwrap()), ["0", "1", "2"]);
    assert_eq!(calls.get(), 6);
}

#[test]
fn length_matches_index() {
    let interp = interpreter();
    let protocol = ListProtocol::default();

    for length in [0, 1, 4] {
        let generated = interp.eval(&format!("lgen {} sq", length)).unwrap();
        assert_eq!(protocol.length(&generated).unwrap(), length);

        for idx in 0..length {
            assert!(protocol.index(&generated, idx).unwrap().is_some());
        }
        assert!(protocol.index(&generated, length).unwrap().is_none());
    }
}
