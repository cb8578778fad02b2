//! A list whose elements are the characters of a mutable string buffer.
//!
//! The text of an lstring is its characters quoted as list elements, so
//! `hello` reads back as `h e l l o`.  A family of descriptors each leave out
//! one callback, so that every generic fallback can be exercised.

mod test;

use std::cell::{OnceCell, Ref};

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use tracing::trace;

use crate::{
    interface::{Capability, ObjInterface},
    list::{check_range, join_elements, resolve_index, ListError, ListProtocol},
    objtype::{Lifecycle, ObjType},
    registry::{RegistryError, TypeRegistry},
    value::{NativeRep, UniqueValue, Value, ValueError},
};

/// Character buffer with room for a trailing nul
#[derive(Debug)]
pub struct LString {
    /// Allocated storage, `buffer[length]` is always `'\0'`
    buffer: Box<[char]>,
    length: usize,
    /// Element values built on the first request for all elements
    elements: OnceCell<Vec<Value>>,
}

impl LString {
    pub fn new(text: &str) -> Self {
        let chars = text.chars().collect::<Vec<_>>();
        Self::from_chars(&chars, chars.len() + 1)
    }

    fn from_chars(chars: &[char], allocated: usize) -> Self {
        let mut buffer = vec!['\0'; allocated.max(chars.len() + 1)].into_boxed_slice();
        buffer[..chars.len()].copy_from_slice(chars);

        Self {
            buffer,
            length: chars.len(),
            elements: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of characters the buffer can hold, including the terminator
    pub fn allocated(&self) -> usize {
        self.buffer.len()
    }

    pub fn chars(&self) -> &[char] {
        &self.buffer[..self.length]
    }

    pub fn as_string(&self) -> String {
        self.chars().iter().collect()
    }

    /// Replace `count` characters at `first` with `insert`.  The buffer only
    /// grows when needed, to exactly the new length plus the terminator.
    fn replace(&mut self, first: usize, count: usize, insert: &[char]) {
        let new_length = self.length - count + insert.len();
        let tail = self.buffer[first + count..self.length].to_vec();

        if new_length >= self.allocated() {
            let mut buffer = vec!['\0'; new_length + 1].into_boxed_slice();
            buffer[..first].copy_from_slice(&self.buffer[..first]);
            self.buffer = buffer;
        }

        self.buffer[first..first + insert.len()].copy_from_slice(insert);
        self.buffer[first + insert.len()..new_length].copy_from_slice(&tail);
        self.length = new_length;
        self.buffer[new_length] = '\0';
        self.elements.take();
    }
}

fn lstring(list: &Value) -> Ref<'_, LString> {
    list.native::<LString>()
        .unwrap_or_else(|| panic!("lstring operation called on {:?}", list))
}

fn lstring_mut<'a>(list: &'a mut UniqueValue<'_>) -> &'a mut LString {
    match list.native_mut::<LString>() {
        Some(lstring) => lstring,
        None => panic!("lstring operation called on a value of another type"),
    }
}

/// An element stored in an lstring must be a single character, longer
/// strings keep only their first character.
fn element_char(element: &Value) -> Result<char, ListError> {
    element
        .text()
        .chars()
        .next()
        .ok_or_else(|| ListError::InvalidElement {
            element: String::new(),
            type_name: "lstring".to_string(),
        })
}

fn element_chars(elements: &[Value]) -> Result<Vec<char>, ListError> {
    elements.iter().map(element_char).collect()
}

fn lstring_free(rep: &mut dyn NativeRep) {
    if let Some(lstring) = rep.as_any_mut().downcast_mut::<LString>() {
        trace!(length = lstring.length, "freeing lstring");
        lstring.elements.take();
    }
}

fn lstring_dup(rep: &dyn NativeRep) -> Box<dyn NativeRep> {
    match rep.as_any().downcast_ref::<LString>() {
        Some(lstring) => Box::new(LString::from_chars(lstring.chars(), lstring.allocated())),
        None => panic!("lstring duplication called on {:?}", rep),
    }
}

fn lstring_update_string(list: &Value) -> String {
    let length = lstring(list).len();
    join_elements((0..length).filter_map(|idx| {
        lstring_index(list, idx)
            .ok()
            .flatten()
            .map(|element| element.text())
    }))
}

fn lstring_set_from_any(value: &Value) -> Result<Box<dyn NativeRep>, ValueError> {
    Ok(Box::new(LString::new(&value.text())))
}

fn lstring_length(list: &Value) -> Result<usize, ListError> {
    Ok(lstring(list).len())
}

fn lstring_index(list: &Value, index: usize) -> Result<Option<Value>, ListError> {
    Ok(lstring(list).chars().get(index).map(|&ch| Value::from(ch)))
}

fn lstring_range(list: &Value, from: usize, to: usize) -> Result<Value, ListError> {
    let rep = lstring(list);
    match check_range(rep.len(), from, to)? {
        Some((from, to)) => {
            let slice = LString::from_chars(&rep.chars()[from..=to], to - from + 2);
            Ok(match list.obj_type() {
                Some(ty) => Value::from_native(ty, slice),
                None => Value::from_text(slice.as_string()),
            })
        }
        None => Ok(Value::empty()),
    }
}

fn lstring_reverse(list: &mut UniqueValue<'_>) -> Result<(), ListError> {
    let rep = lstring_mut(list);
    let length = rep.length;
    rep.buffer[..length].reverse();
    rep.elements.take();
    Ok(())
}

fn lstring_all(list: &Value) -> Result<Vec<Value>, ListError> {
    let rep = lstring(list);
    let elements = rep
        .elements
        .get_or_init(|| rep.chars().iter().map(|&ch| Value::from(ch)).collect());
    Ok(elements.clone())
}

fn lstring_replace(
    list: &mut UniqueValue<'_>,
    first: usize,
    count: usize,
    elements: &[Value],
) -> Result<(), ListError> {
    let insert = element_chars(elements)?;
    lstring_mut(list).replace(first, count, &insert);
    Ok(())
}

fn lstring_append(list: &mut UniqueValue<'_>, element: &Value) -> Result<(), ListError> {
    let ch = element_char(element)?;
    let rep = lstring_mut(list);
    rep.replace(rep.len(), 0, &[ch]);
    Ok(())
}

fn lstring_append_list(list: &mut UniqueValue<'_>, elements: &[Value]) -> Result<(), ListError> {
    let insert = element_chars(elements)?;
    let rep = lstring_mut(list);
    rep.replace(rep.len(), 0, &insert);
    Ok(())
}

fn lstring_contains(list: &Value, element: &Value) -> Result<bool, ListError> {
    let needle = element.text();
    let mut chars = needle.chars();
    Ok(match (chars.next(), chars.next()) {
        (Some(ch), None) => lstring(list).chars().contains(&ch),
        _ => false,
    })
}

fn lstring_set_element(
    _: &ListProtocol,
    list: &mut Value,
    indices: &[Value],
    element: Option<&Value>,
) -> Result<(), ListError> {
    if indices.len() > 1 {
        return Err(ListError::MultipleIndices {
            type_name: "lstring".to_string(),
        });
    }
    let index = match indices.first() {
        Some(index) => index,
        None => return Ok(()),
    };

    let length = lstring(list).len();
    let position = resolve_index(index, length as isize - 1)?;
    if position < 0 || position as usize > length {
        return Err(ListError::IndexOutOfRange {
            index: index.text().to_string(),
        });
    }
    let position = position as usize;
    let replacement = element.map(element_char).transpose()?;
    if replacement.is_none() && position == length {
        return Ok(());
    }

    let mut unique = list.make_mut();
    let rep = lstring_mut(&mut unique);
    match replacement {
        Some(ch) if position == length => rep.replace(position, 0, &[ch]),
        Some(ch) => {
            rep.buffer[position] = ch;
            rep.elements.take();
        }
        None => rep.replace(position, 1, &[]),
    }

    Ok(())
}

const LSTRING_FULL: ObjInterface = ObjInterface::new()
    .with_version(1)
    .with_list_all(lstring_all)
    .with_list_append(lstring_append)
    .with_list_append_list(lstring_append_list)
    .with_list_contains(lstring_contains)
    .with_list_index(lstring_index)
    .with_list_length(lstring_length)
    .with_list_range(lstring_range)
    .with_list_replace(lstring_replace)
    .with_list_reverse(lstring_reverse)
    .with_list_set_element(lstring_set_element);

const LSTRING: ObjType = ObjType::new("lstring")
    .with_version(1)
    .with_free(lstring_free)
    .with_dup(lstring_dup)
    .with_update_string(lstring_update_string)
    .with_set_from_any(lstring_set_from_any);

pub static LSTRING_INTERFACE: ObjInterface = LSTRING_FULL;
pub static LSTRING_TYPE: ObjType = LSTRING.with_interface(&LSTRING_INTERFACE);

static NO_LENGTH: ObjInterface = LSTRING_FULL.without(Capability::ListLength);
static NO_INDEX: ObjInterface = LSTRING_FULL.without(Capability::ListIndex);
static NO_SLICE: ObjInterface = LSTRING_FULL.without(Capability::ListRange);
static NO_REVERSE: ObjInterface = LSTRING_FULL.without(Capability::ListReverse);
static NO_GET_ELEMENTS: ObjInterface = LSTRING_FULL.without(Capability::ListAll);
static NO_SET_ELEMENT: ObjInterface = LSTRING_FULL.without(Capability::ListSetElement);
static NO_REPLACE: ObjInterface = LSTRING_FULL.without(Capability::ListReplace);

static NO_FREE_REP_TYPE: ObjType = LSTRING
    .without(Lifecycle::Free)
    .with_interface(&LSTRING_INTERFACE);
static NO_DUP_REP_TYPE: ObjType = LSTRING
    .without(Lifecycle::Dup)
    .with_interface(&LSTRING_INTERFACE);
static NO_UPDATE_STRING_TYPE: ObjType = LSTRING
    .without(Lifecycle::UpdateString)
    .with_interface(&LSTRING_INTERFACE);
static NO_SET_FROM_ANY_TYPE: ObjType = LSTRING
    .without(Lifecycle::SetFromAny)
    .with_interface(&LSTRING_INTERFACE);
static NO_LENGTH_TYPE: ObjType = LSTRING.with_interface(&NO_LENGTH);
static NO_INDEX_TYPE: ObjType = LSTRING.with_interface(&NO_INDEX);
static NO_SLICE_TYPE: ObjType = LSTRING.with_interface(&NO_SLICE);
static NO_REVERSE_TYPE: ObjType = LSTRING.with_interface(&NO_REVERSE);
static NO_GET_ELEMENTS_TYPE: ObjType = LSTRING.with_interface(&NO_GET_ELEMENTS);
static NO_SET_ELEMENT_TYPE: ObjType = LSTRING.with_interface(&NO_SET_ELEMENT);
static NO_REPLACE_TYPE: ObjType = LSTRING.with_interface(&NO_REPLACE);

/// A callback left out of an lstring descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum Omit {
    FreeRep = 0,
    DupRep,
    UpdateString,
    SetFromAny,
    Length,
    Index,
    Slice,
    Reverse,
    GetElements,
    SetElement,
    Replace,
}

impl Omit {
    /// The names accepted by `-not`, in declaration order
    pub const NAMES: [&'static str; 11] = [
        "FREEREP",
        "DUPREP",
        "UPDATESTRING",
        "SETFROMANY",
        "LENGTH",
        "INDEX",
        "SLICE",
        "REVERSE",
        "GETELEMENTS",
        "SETELEMENT",
        "REPLACE",
    ];

    pub fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Look up a name, ignoring case and accepting any unique prefix
    pub fn from_name(name: &str) -> Option<Omit> {
        let name = name.to_ascii_uppercase();
        if let Some(idx) = Self::NAMES.iter().position(|&known| known == name) {
            return Omit::from_usize(idx);
        }

        let mut matches = Self::NAMES
            .iter()
            .enumerate()
            .filter(|(_, known)| !name.is_empty() && known.starts_with(&name));
        match (matches.next(), matches.next()) {
            (Some((idx, _)), None) => Omit::from_usize(idx),
            _ => None,
        }
    }

    pub fn iter() -> impl Iterator<Item = Omit> {
        (0..Self::NAMES.len()).filter_map(Omit::from_usize)
    }

    pub fn descriptor(self) -> &'static ObjType {
        match self {
            Omit::FreeRep => &NO_FREE_REP_TYPE,
            Omit::DupRep => &NO_DUP_REP_TYPE,
            Omit::UpdateString => &NO_UPDATE_STRING_TYPE,
            Omit::SetFromAny => &NO_SET_FROM_ANY_TYPE,
            Omit::Length => &NO_LENGTH_TYPE,
            Omit::Index => &NO_INDEX_TYPE,
            Omit::Slice => &NO_SLICE_TYPE,
            Omit::Reverse => &NO_REVERSE_TYPE,
            Omit::GetElements => &NO_GET_ELEMENTS_TYPE,
            Omit::SetElement => &NO_SET_ELEMENT_TYPE,
            Omit::Replace => &NO_REPLACE_TYPE,
        }
    }
}

/// The descriptor for an lstring, optionally missing one callback
pub fn lstring_type(omit: Option<Omit>) -> &'static ObjType {
    omit.map(Omit::descriptor).unwrap_or(&LSTRING_TYPE)
}

/// Create an lstring value holding the characters of `text`
pub fn new_lstring(ty: &'static ObjType, text: &str) -> Value {
    if text.is_empty() {
        Value::from_native_and_text(ty, LString::new(text), "")
    } else {
        Value::from_native(ty, LString::new(text))
    }
}

/// Register the lstring descriptor and each of its variants, the variants
/// are keyed `lstring-not-<callback>`
pub fn register_types(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    registry.register("lstring", &LSTRING_TYPE)?;
    for omit in Omit::iter() {
        let key = format!("lstring-not-{}", omit.name().to_ascii_lowercase());
        registry.register(&key, omit.descriptor())?;
    }
    Ok(())
}
