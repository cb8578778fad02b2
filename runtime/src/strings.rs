//! String operations, forwarded to a native implementation when the value's
//! type provides one and computed from the text otherwise.

use crate::{interface::StringInterface, value::Value};

fn native(value: &Value) -> Option<StringInterface> {
    value
        .obj_type()
        .and_then(|ty| ty.interface())
        .map(|interface| interface.string)
}

/// Number of characters in the text of `value`
pub fn length(value: &Value) -> usize {
    match native(value).and_then(|string| string.length) {
        Some(length) => length(value),
        None => value.text().chars().count(),
    }
}

pub fn index(value: &Value, index: usize) -> Option<char> {
    match native(value).and_then(|string| string.index) {
        Some(get) => get(value, index),
        None => value.text().chars().nth(index),
    }
}

/// The characters `from..=to`, empty when the range selects nothing
pub fn range(value: &Value, from: usize, to: usize) -> Value {
    if let Some(range) = native(value).and_then(|string| string.range) {
        return range(value, from, to);
    }

    if from > to {
        return Value::empty();
    }
    let text = value.text();
    Value::from(text.chars().skip(from).take(to - from + 1).collect::<String>())
}

pub fn is_empty(value: &Value) -> bool {
    match native(value).and_then(|string| string.is_empty) {
        Some(is_empty) => is_empty(value),
        None => value.text().is_empty(),
    }
}

#[cfg(test)]
mod test {
    use num_bigint::BigInt;

    use super::*;

    #[test]
    fn text_strings() {
        let value = Value::from("héllo");
        assert_eq!(length(&value), 5);
        assert_eq!(index(&value, 1), Some('é'));
        assert_eq!(index(&value, 5), None);
        assert_eq!(&*range(&value, 1, 3).text(), "éll");
        assert_eq!(&*range(&value, 3, 99).text(), "lo");
        assert_eq!(&*range(&value, 3, 1).text(), "");
        assert!(!is_empty(&value));
        assert!(is_empty(&Value::empty()));
    }

    #[test]
    fn native_integer_length() {
        let value = Value::from(BigInt::from(100));
        assert_eq!(length(&value), 3);
        assert!(!value.has_text());
        assert_eq!(index(&value, 0), Some('1'));
    }
}
