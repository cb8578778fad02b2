use pretty_assertions::assert_eq;

use runtime::{
    config::{Configuration, WarningLevel},
    interp::{EvalError, Interpreter},
    list::{ListError, ListProtocol, W_LIST_FALLBACK},
    lstring::{lstring_type, new_lstring, Omit, LSTRING_TYPE},
};

fn driver(config: Configuration, source: &str) -> Result<String, EvalError> {
    let interp = Interpreter::new(config)?;
    let result = interp.eval(source)?;
    let text = result.text().to_string();
    Ok(text)
}

fn eval(source: &str) -> String {
    driver(Configuration::new(), source).unwrap()
}

#[test]
fn replace_grows_in_place() {
    assert_eq!(eval("lreplace [lstring hello] 1 1 X Y Z"), "h X Y Z l l o");
    assert_eq!(eval("typeof [lreplace [lstring hello] 1 1 X Y Z]"), "lstring");
    assert_eq!(eval("lreplace [lstring hello] 0 2"), "l o");
    assert_eq!(eval("lreplace [lstring hello] end+5 end+5 !"), "h e l l o !");
}

#[test]
fn range_keeps_representation() {
    assert_eq!(eval("lrange [lstring hello] 1 3"), "e l l");
    assert_eq!(eval("typeof [lrange [lstring hello] 1 3]"), "lstring");
    assert_eq!(eval("lrange [lstring hello] 3 1"), "");
    assert_eq!(eval("lrange [lstring hello] 2 end+10"), "l l o");
}

#[test]
fn missing_capabilities_fall_back() {
    assert_eq!(eval("lrange [lstring -not SLICE hello] 1 3"), "e l l");
    assert_eq!(eval("typeof [lrange [lstring -not SLICE hello] 1 3]"), "list");
    assert_eq!(eval("typeof [lreverse [lstring -not rev abc]]"), "list");
    assert_eq!(eval("lreverse [lstring -not rev abc]"), "c b a");
    assert_eq!(eval("llength [lstring -not LENGTH abc]"), "3");
    assert_eq!(eval("lindex [lstring -not index abc] 1"), "b");
    assert_eq!(eval("lreplace [lstring -not REPLACE abc] 1 1 X"), "a X c");
    assert_eq!(eval("lindex [lstring -not GETELEMENTS abc] end"), "c");
}

#[test]
fn reverse() {
    assert_eq!(eval("lreverse [lstring hello]"), "o l l e h");
    assert_eq!(eval("lreverse [lstring {}]"), "");
}

#[test]
fn copy_on_write() {
    assert_eq!(
        eval("set a [lstring abc]; set b [lreplace $a 0 0 X]; list $a $b"),
        "{a b c} {X b c}"
    );
    assert_eq!(
        eval("set a [lstring abc]; set b $a; lset b 1 Z; list $a $b"),
        "{a b c} {a Z c}"
    );
}

#[test]
fn set_element() {
    assert_eq!(eval("set s [lstring abc]; lset s 1 Z; set s"), "a Z c");
    assert_eq!(eval("set s [lstring abc]; lset s end Z"), "a b Z");
    assert_eq!(eval("set s [lstring abc]; lset s 3 d; set s"), "a b c d");
    assert_eq!(eval("set s [lstring abc]; ldelete s 0; set s"), "b c");
    assert_eq!(eval("set s [lstring abc]; lset s 1 Z; typeof $s"), "lstring");
}

#[test]
fn set_element_out_of_range() {
    let interp = Interpreter::new(Configuration::new()).unwrap();
    let err = interp
        .eval("set s [lstring abc]; lset s end+2 d")
        .unwrap_err();

    assert_eq!(err.to_string(), "index \"end+2\" out of range");
    assert_eq!(&*interp.eval("set s").unwrap().text(), "a b c");
}

#[test]
fn multiple_indices() {
    let interp = Interpreter::new(Configuration::new()).unwrap();
    let err = interp.eval("set s [lstring abc]; lset s 0 0 x").unwrap_err();

    assert_eq!(err.to_string(), "Multiple indices not supported by lstring.");
    assert_eq!(&*interp.eval("set s").unwrap().text(), "a b c");
}

#[test]
fn set_element_fallback() {
    assert_eq!(
        eval("set s [lstring -not SETELEMENT abc]; lset s 1 Z; list [typeof $s] $s"),
        "list {a Z c}"
    );
}

#[test]
fn append_and_contains() {
    assert_eq!(eval("set s [lstring ab]; lappend s c d; set s"), "a b c d");
    assert_eq!(eval("set s [lstring ab]; lappend s c; typeof $s"), "lstring");
    assert_eq!(eval("lcontains [lstring hello] e"), "1");
    assert_eq!(eval("lcontains [lstring hello] el"), "0");
    assert_eq!(eval("lindex [lstring hello] end"), "o");
    assert_eq!(eval("lindex [lstring hello] 9"), "");
}

#[test]
fn bad_variant_name() {
    let err = driver(Configuration::new(), "lstring -not bogus abc").unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad proctype \"bogus\": must be FREEREP, DUPREP, UPDATESTRING, SETFROMANY, \
         LENGTH, INDEX, SLICE, REVERSE, GETELEMENTS, SETELEMENT, or REPLACE"
    );

    assert_eq!(eval("lstring -- -not"), "- n o t");
}

#[test]
fn deny_fallback() {
    let mut config = Configuration::new();
    config.set_warning_level(W_LIST_FALLBACK, WarningLevel::Deny);

    let err = driver(config.clone(), "llength [lstring -not LENGTH abc]").unwrap_err();
    assert!(matches!(
        err,
        EvalError::List(ListError::Unsupported { .. })
    ));

    // text is never subject to the fallback policy
    assert_eq!(driver(config.clone(), "llength {a b c}").unwrap(), "3");
    assert_eq!(driver(config.clone(), "llength [lstring abc]").unwrap(), "3");

    // replace is native, so its length lookup is not a fallback
    assert_eq!(
        driver(config, "lreplace [lstring -not LENGTH abc] 0 0 x").unwrap(),
        "x b c"
    );
}

#[test]
fn nested_set_element_keeps_policy() {
    let source = "set l [list a [lstring -not SETELEMENT bc]]; lset l 1 0 X; set l";
    assert_eq!(eval(source), "a {X c}");

    let mut config = Configuration::new();
    config.set_warning_level(W_LIST_FALLBACK, WarningLevel::Deny);
    let err = driver(config, source).unwrap_err();
    assert!(matches!(
        err,
        EvalError::List(ListError::Unsupported { .. })
    ));
}

#[test]
#[should_panic(expected = "reverse called with shared value")]
fn shared_reverse_panics() {
    let mut value = new_lstring(&LSTRING_TYPE, "abc");
    let _other = value.clone();
    let _ = ListProtocol::default().reverse(&mut value);
}

#[test]
#[should_panic(expected = "the type has no duplication callback")]
fn copy_without_duplication_panics() {
    let _ = eval("lreplace [lstring -not DUPREP abc] 0 0 x");
}

#[test]
#[should_panic(expected = "the type has no string callback")]
fn text_without_string_callback_panics() {
    let value = new_lstring(lstring_type(Some(Omit::UpdateString)), "abc");
    value.text();
}
