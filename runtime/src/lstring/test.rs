#![cfg(test)]

use crate::list::{split_list, ListProtocol};

use super::*;

fn hello() -> Value {
    new_lstring(&LSTRING_TYPE, "hello")
}

fn rep(value: &Value) -> Ref<'_, LString> {
    value.native::<LString>().unwrap()
}

#[test]
fn terminated_buffer() {
    let value = hello();
    let lstring = rep(&value);

    assert_eq!(lstring.len(), 5);
    assert_eq!(lstring.allocated(), 6);
    assert_eq!(lstring.buffer[5], '\0');
}

#[test]
fn growth_is_exact() {
    let mut value = hello();
    ListProtocol::default()
        .replace(
            &mut value,
            1,
            1,
            &[Value::from("X"), Value::from("Y"), Value::from("Z")],
        )
        .unwrap();

    let lstring = rep(&value);
    assert_eq!(lstring.as_string(), "hXYZllo");
    assert_eq!(lstring.allocated(), 8);
    assert_eq!(lstring.buffer[7], '\0');
}

#[test]
fn shrinking_keeps_allocation() {
    let mut value = hello();
    ListProtocol::default()
        .replace(&mut value, 0, 3, &[])
        .unwrap();

    let lstring = rep(&value);
    assert_eq!(lstring.as_string(), "lo");
    assert_eq!(lstring.allocated(), 6);
    assert_eq!(lstring.buffer[2], '\0');
}

#[test]
fn text_is_quoted_characters() {
    let value = new_lstring(&LSTRING_TYPE, "a b#");
    assert!(!value.has_text());
    assert_eq!(&*value.text(), "a { } b #");
    assert!(value.has_text());
}

#[test]
fn mutation_clears_element_cache() {
    let mut value = hello();
    let protocol = ListProtocol::default();

    assert_eq!(protocol.all(&value).unwrap().len(), 5);
    assert!(rep(&value).elements.get().is_some());

    protocol.reverse(&mut value).unwrap();
    assert!(rep(&value).elements.get().is_none());
    assert_eq!(rep(&value).as_string(), "olleh");
}

#[test]
fn duplicate_keeps_allocation() {
    let mut value = hello();
    ListProtocol::default().replace(&mut value, 0, 4, &[]).unwrap();

    let copy = value.duplicate();
    assert_eq!(rep(&copy).as_string(), "o");
    assert_eq!(rep(&copy).allocated(), 6);
}

#[test]
fn omit_names() {
    assert_eq!(Omit::from_name("FREEREP"), Some(Omit::FreeRep));
    assert_eq!(Omit::from_name("length"), Some(Omit::Length));
    assert_eq!(Omit::from_name("up"), Some(Omit::UpdateString));
    assert_eq!(Omit::from_name("re"), None);
    assert_eq!(Omit::from_name("rep"), Some(Omit::Replace));
    assert_eq!(Omit::from_name(""), None);
    assert_eq!(Omit::from_name("nothing"), None);
    assert_eq!(Omit::iter().count(), 11);
}

#[test]
fn variant_descriptors() {
    assert!(!lstring_type(Some(Omit::FreeRep)).has(Lifecycle::Free));
    assert!(!lstring_type(Some(Omit::DupRep)).has(Lifecycle::Dup));
    assert!(!lstring_type(Some(Omit::Length))
        .capabilities()
        .contains(Capability::ListLength));
    assert!(lstring_type(Some(Omit::Length))
        .capabilities()
        .contains(Capability::ListIndex));
    assert!(!lstring_type(Some(Omit::GetElements))
        .capabilities()
        .contains(Capability::ListAll));
    assert_eq!(lstring_type(None).capabilities().len(), 10);
}

#[test]
fn registered_keys() {
    let mut registry = TypeRegistry::new();
    register_types(&mut registry).unwrap();

    assert_eq!(registry.len(), 12);
    assert!(registry.get("lstring-not-setelement").is_some());
    assert_eq!(
        registry.get("lstring").map(|ty| ty.capabilities()),
        Some(LSTRING_TYPE.capabilities())
    );
}

#[test]
fn replace_middle() {
    let mut value = hello();
    ListProtocol::default()
        .replace(
            &mut value,
            1,
            2,
            &[Value::from("X"), Value::from("Y"), Value::from("Z")],
        )
        .unwrap();

    assert_eq!(rep(&value).as_string(), "hXYZlo");
    assert_eq!(&*value.text(), "h X Y Z l o");
}

#[test]
fn reverse_twice_restores() {
    let protocol = ListProtocol::default();
    let mut value = new_lstring(&LSTRING_TYPE, "a b{c");

    protocol.reverse(&mut value).unwrap();
    assert_eq!(rep(&value).as_string(), "c{b a");
    protocol.reverse(&mut value).unwrap();
    assert_eq!(rep(&value).as_string(), "a b{c");
    assert_eq!(&*value.text(), "a { } b \\{ c");
}

#[test]
fn text_splits_into_elements() {
    let protocol = ListProtocol::default();
    for chars in ["{a\\ #\"}", "hello", "", " ;$[", "\t\n"] {
        let value = new_lstring(&LSTRING_TYPE, chars);
        let elements: Vec<String> = protocol
            .all(&value)
            .unwrap()
            .iter()
            .map(|element| element.text().to_string())
            .collect();

        assert_eq!(split_list(&value.text()).unwrap(), elements);
        assert_eq!(elements.len(), chars.chars().count());
    }
}

#[test]
fn length_matches_index() {
    let protocol = ListProtocol::default();
    for chars in ["", "x", "hello"] {
        let value = new_lstring(&LSTRING_TYPE, chars);
        let length = protocol.length(&value).unwrap();

        for idx in 0..length {
            assert!(protocol.index(&value, idx).unwrap().is_some());
        }
        assert!(protocol.index(&value, length).unwrap().is_none());
    }
}

#[test]
fn delete_past_end_leaves_value_alone() {
    let mut value = new_lstring(&LSTRING_TYPE, "abc");
    value.ensure_text();
    let other = value.clone();

    ListProtocol::default()
        .set_element(&mut value, &[Value::from("3")], None)
        .unwrap();

    assert_eq!(value.ref_count(), 2);
    assert!(value.has_text());
    assert_eq!(&*other.text(), "a b c");
}
