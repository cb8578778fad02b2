//! The general purpose list representation, a vector of values

use std::{cell::Ref, mem};

use crate::{
    interface::ObjInterface,
    objtype::ObjType,
    value::{NativeRep, UniqueValue, Value, ValueError},
};

use super::{check_range, join_elements, resolve_index, split_list, ListError, ListProtocol};

#[derive(Debug, Clone, Default)]
pub struct PlainList {
    elements: Vec<Value>,
}

impl PlainList {
    pub fn new(elements: Vec<Value>) -> Self {
        Self { elements }
    }

    /// Wrap elements in a value, an empty list also gets its empty text
    pub fn new_value(elements: Vec<Value>) -> Value {
        if elements.is_empty() {
            Value::from_native_and_text(&LIST_TYPE, Self::new(elements), "")
        } else {
            Value::from_native(&LIST_TYPE, Self::new(elements))
        }
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }
}

pub static LIST_INTERFACE: ObjInterface = ObjInterface::new()
    .with_version(1)
    .with_list_all(plain_all)
    .with_list_append(plain_append)
    .with_list_append_list(plain_append_list)
    .with_list_contains(plain_contains)
    .with_list_index(plain_index)
    .with_list_length(plain_length)
    .with_list_range(plain_range)
    .with_list_replace(plain_replace)
    .with_list_reverse(plain_reverse)
    .with_list_set_element(set_plain_element);

pub static LIST_TYPE: ObjType = ObjType::new("list")
    .with_version(1)
    .with_dup(plain_dup)
    .with_update_string(plain_update_string)
    .with_set_from_any(plain_set_from_any)
    .with_interface(&LIST_INTERFACE);

fn plain(list: &Value) -> Ref<'_, PlainList> {
    list.native::<PlainList>()
        .unwrap_or_else(|| panic!("list operation called on a {:?}", list))
}

fn plain_mut<'a>(list: &'a mut UniqueValue<'_>) -> &'a mut PlainList {
    match list.native_mut::<PlainList>() {
        Some(plain) => plain,
        None => panic!("list operation called on a value of another type"),
    }
}

fn plain_dup(rep: &dyn NativeRep) -> Box<dyn NativeRep> {
    match rep.as_any().downcast_ref::<PlainList>() {
        Some(plain) => Box::new(plain.clone()),
        None => panic!("list duplication called on {:?}", rep),
    }
}

fn plain_update_string(list: &Value) -> String {
    let elements = plain(list).elements.clone();
    join_elements(elements.iter().map(Value::text))
}

fn plain_set_from_any(value: &Value) -> Result<Box<dyn NativeRep>, ValueError> {
    let text = value.text();
    let elements = split_list(&text).map_err(|err| ValueError::Conversion {
        target: LIST_TYPE.name().to_string(),
        text: text.to_string(),
        message: err.to_string(),
    })?;

    Ok(Box::new(PlainList::new(
        elements.into_iter().map(Value::from).collect(),
    )))
}

fn plain_all(list: &Value) -> Result<Vec<Value>, ListError> {
    Ok(plain(list).elements.clone())
}

fn plain_append(list: &mut UniqueValue<'_>, element: &Value) -> Result<(), ListError> {
    plain_mut(list).elements.push(element.clone());
    Ok(())
}

fn plain_append_list(list: &mut UniqueValue<'_>, elements: &[Value]) -> Result<(), ListError> {
    plain_mut(list).elements.extend_from_slice(elements);
    Ok(())
}

fn plain_contains(list: &Value, element: &Value) -> Result<bool, ListError> {
    let needle = element.text();
    let elements = plain(list).elements.clone();
    Ok(elements.iter().any(|element| element.text() == needle))
}

fn plain_index(list: &Value, index: usize) -> Result<Option<Value>, ListError> {
    Ok(plain(list).elements.get(index).cloned())
}

fn plain_length(list: &Value) -> Result<usize, ListError> {
    Ok(plain(list).elements.len())
}

fn plain_range(list: &Value, from: usize, to: usize) -> Result<Value, ListError> {
    let plain = plain(list);
    Ok(match check_range(plain.elements.len(), from, to)? {
        Some((from, to)) => PlainList::new_value(plain.elements[from..=to].to_vec()),
        None => Value::empty(),
    })
}

fn plain_replace(
    list: &mut UniqueValue<'_>,
    first: usize,
    count: usize,
    elements: &[Value],
) -> Result<(), ListError> {
    plain_mut(list)
        .elements
        .splice(first..first + count, elements.iter().cloned());
    Ok(())
}

fn plain_reverse(list: &mut UniqueValue<'_>) -> Result<(), ListError> {
    plain_mut(list).elements.reverse();
    Ok(())
}

/// Set or delete a possibly nested element of a plain list.  The last index
/// may be one past the end to append.
pub(super) fn set_plain_element(
    protocol: &ListProtocol,
    list: &mut Value,
    indices: &[Value],
    element: Option<&Value>,
) -> Result<(), ListError> {
    let (first, rest) = match indices.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };

    let length = plain(list).elements.len();
    let index = resolve_index(first, length as isize - 1)?;
    let out_of_range = || ListError::IndexOutOfRange {
        index: first.text().to_string(),
    };

    if index < 0 {
        return Err(out_of_range());
    }
    let index = index as usize;

    if !rest.is_empty() {
        if index >= length {
            return Err(out_of_range());
        }

        let mut unique = list.make_mut();
        let elements = &mut plain_mut(&mut unique).elements;

        // take the element out so it is not shared with this list
        let mut child = mem::replace(&mut elements[index], Value::empty());
        let result = protocol.set_element(&mut child, rest, element);
        elements[index] = child;
        return result;
    }

    match element {
        Some(element) if index < length => {
            plain_mut(&mut list.make_mut()).elements[index] = element.clone()
        }
        Some(element) if index == length => {
            plain_mut(&mut list.make_mut()).elements.push(element.clone())
        }
        None if index < length => {
            plain_mut(&mut list.make_mut()).elements.remove(index);
        }
        None if index == length => (),
        _ => return Err(out_of_range()),
    }

    Ok(())
}
