use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;

use runtime::{
    objtype::ObjType,
    value::{NativeRep, Value, ValueError},
};

#[derive(Debug)]
struct Counter(usize);

fn counter(value: &Value) -> usize {
    value.native::<Counter>().map(|counter| counter.0).unwrap()
}

fn counter_dup(rep: &dyn NativeRep) -> Box<dyn NativeRep> {
    let counter = rep.as_any().downcast_ref::<Counter>().unwrap();
    Box::new(Counter(counter.0))
}

fn counter_update_string(value: &Value) -> String {
    counter(value).to_string()
}

fn counter_set_from_any(value: &Value) -> Result<Box<dyn NativeRep>, ValueError> {
    let text = value.text();
    match text.parse::<usize>() {
        Ok(num) => Ok(Box::new(Counter(num))),
        Err(err) => Err(ValueError::Conversion {
            target: "counter".to_string(),
            text: text.to_string(),
            message: err.to_string(),
        }),
    }
}

static COUNTER_TYPE: ObjType = ObjType::new("counter")
    .with_dup(counter_dup)
    .with_update_string(counter_update_string)
    .with_set_from_any(counter_set_from_any);

static FREED: AtomicUsize = AtomicUsize::new(0);

fn counted_free(_: &mut dyn NativeRep) {
    FREED.fetch_add(1, Ordering::SeqCst);
}

static FREED_TYPE: ObjType = ObjType::new("freed")
    .with_free(counted_free)
    .with_dup(counter_dup);

static UPDATES: AtomicUsize = AtomicUsize::new(0);

fn counted_update_string(value: &Value) -> String {
    UPDATES.fetch_add(1, Ordering::SeqCst);
    counter(value).to_string()
}

static UPDATED_TYPE: ObjType = ObjType::new("updated").with_update_string(counted_update_string);

static OPAQUE_TYPE: ObjType = ObjType::new("opaque");

#[test]
fn free_runs_once_when_last_owner_drops() {
    let value = Value::from_native(&FREED_TYPE, Counter(1));
    let shared = value.clone();
    assert_eq!(value.ref_count(), 2);

    drop(value);
    assert_eq!(FREED.load(Ordering::SeqCst), 0);
    assert_eq!(shared.ref_count(), 1);

    let copy = shared.duplicate();
    drop(shared);
    assert_eq!(FREED.load(Ordering::SeqCst), 1);
    assert_eq!(counter(&copy), 1);

    drop(copy);
    assert_eq!(FREED.load(Ordering::SeqCst), 2);
}

#[test]
fn text_is_generated_once() {
    let mut value = Value::from_native(&UPDATED_TYPE, Counter(7));
    assert!(!value.has_text());

    value.ensure_text();
    assert!(value.has_text());
    assert_eq!(&*value.text(), "7");
    assert_eq!(&*value.text(), "7");
    assert_eq!(UPDATES.load(Ordering::SeqCst), 1);

    value
        .unique_mut("increment")
        .native_mut::<Counter>()
        .unwrap()
        .0 += 1;
    assert!(!value.has_text());
    assert_eq!(&*value.text(), "8");
    assert_eq!(UPDATES.load(Ordering::SeqCst), 2);
}

#[test]
fn conversion_keeps_text() {
    let value = Value::from("42");
    assert_eq!(value.obj_type().map(ObjType::name), None);

    value.convert_to(&COUNTER_TYPE).unwrap();
    assert!(value.has_type(&COUNTER_TYPE));
    assert!(value.has_text());
    assert_eq!(counter(&value), 42);

    let bad = Value::from("forty two");
    let err = bad.convert_to(&COUNTER_TYPE).unwrap_err();
    assert!(matches!(err, ValueError::Conversion { .. }));
    assert!(bad.obj_type().is_none());

    let err = value.convert_to(&OPAQUE_TYPE).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unable to convert value to opaque, the type has no conversion from text"
    );
    assert!(value.has_type(&COUNTER_TYPE));
}

#[test]
fn copy_on_write() {
    let mut value = Value::from_native(&COUNTER_TYPE, Counter(1));
    let original = value.clone();

    value.make_mut().native_mut::<Counter>().unwrap().0 = 5;
    assert_eq!(counter(&value), 5);
    assert_eq!(counter(&original), 1);
    assert!(!value.is_shared());
    assert!(!original.is_shared());
}

#[test]
#[should_panic(expected = "replace called with shared value")]
fn shared_mutation_panics() {
    let mut value = Value::from_native(&COUNTER_TYPE, Counter(1));
    let _other = value.clone();
    value.unique_mut("replace");
}
