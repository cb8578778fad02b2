//! Abstract list operations.  Each operation is forwarded to the native
//! implementation registered in the value's type interface, and otherwise
//! computed from the textual form of the value as a generic list.

mod generic;
mod index;
mod parse;
mod quote;

use std::slice;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    config::{Configuration, ConfigurationCategory, Flag, WarningLevel},
    interface::{Capability, ObjInterface},
    value::{Value, ValueError},
};

pub use self::{
    generic::{PlainList, LIST_INTERFACE, LIST_TYPE},
    index::resolve_index,
    parse::{is_list_space, split_list, ListParseError},
    quote::{join_elements, quote_element},
};

/// How to report list operations that a native representation does not
/// implement itself
pub static W_LIST_FALLBACK: Flag = Flag::new(ConfigurationCategory::Warning, "list_fallback")
    .warning(WarningLevel::Allow)
    .help("Report list operations that fall back to the generic list implementation");

#[derive(Debug, Error)]
pub enum ListError {
    #[error("{0}")]
    Parse(#[from] ListParseError),

    #[error("{0}")]
    Value(#[from] ValueError),

    #[error("bad index \"{index}\": must be integer?[+-]integer? or end?[+-]integer?")]
    BadIndex { index: String },

    #[error("index \"{index}\" out of range")]
    IndexOutOfRange { index: String },

    #[error("range {from} to {to} is out of bounds for a list of length {length}")]
    RangeOutOfBounds {
        from: usize,
        to: usize,
        length: usize,
    },

    #[error("Multiple indices not supported by {type_name}.")]
    MultipleIndices { type_name: String },

    #[error("invalid element \"{element}\" for {type_name}")]
    InvalidElement { element: String, type_name: String },

    #[error("no replacement given for the whole list")]
    MissingElement,

    #[error("type \"{type_name}\" does not implement {capability}")]
    Unsupported {
        capability: Capability,
        type_name: String,
    },

    #[error("Error: {message}\nwhile executing {command}")]
    Evaluation { message: String, command: String },

    #[error("the interpreter that created this list no longer exists")]
    NoContext,
}

/// Check inclusive range endpoints against the length of a list.  A start
/// past the end of the range gives `None`, an empty slice.  An end equal to
/// the length is clamped to the last element.
pub fn check_range(
    length: usize,
    from: usize,
    to: usize,
) -> Result<Option<(usize, usize)>, ListError> {
    if from > length || to > length {
        return Err(ListError::RangeOutOfBounds { from, to, length });
    }

    if length == 0 {
        return Ok(None);
    }

    let to = to.min(length - 1);
    if from > to {
        Ok(None)
    } else {
        Ok(Some((from, to)))
    }
}

fn interface(list: &Value) -> Option<&'static ObjInterface> {
    list.obj_type().and_then(|ty| ty.interface())
}

fn require_unshared(list: &Value, operation: &str) {
    if list.is_shared() {
        panic!("{} called with shared value", operation);
    }
}

/// Dispatches abstract list operations to native implementations
#[derive(Debug, Clone, Copy)]
pub struct ListProtocol {
    fallback: WarningLevel,
}

impl Default for ListProtocol {
    fn default() -> Self {
        Self {
            fallback: WarningLevel::Allow,
        }
    }
}

impl ListProtocol {
    pub fn new(config: &Configuration) -> Self {
        Self {
            fallback: config
                .warning_level(W_LIST_FALLBACK)
                .unwrap_or(WarningLevel::Allow),
        }
    }

    pub fn with_fallback(fallback: WarningLevel) -> Self {
        Self { fallback }
    }

    /// Called when `capability` is about to be computed generically.  Only
    /// representations that implement some list operations are reported,
    /// text and non-list values are always handled generically.
    fn fallback(&self, list: &Value, capability: Capability) -> Result<(), ListError> {
        let ty = match list.obj_type() {
            Some(ty) if ty.capabilities().has_list() => ty,
            _ => {
                trace!(%capability, "generic list operation");
                return Ok(());
            }
        };

        match self.fallback {
            WarningLevel::Allow => {
                debug!(type_name = ty.name(), %capability, "list fallback");
                Ok(())
            }
            WarningLevel::Warn => {
                warn!(type_name = ty.name(), %capability, "list fallback");
                Ok(())
            }
            WarningLevel::Deny => Err(ListError::Unsupported {
                capability,
                type_name: ty.name().to_string(),
            }),
        }
    }

    /// Get every element without applying the fallback policy.  Prefers the
    /// native `all`, then repeated native `index` calls until one reports the
    /// end of the list, then parsing the text.
    fn elements(&self, list: &Value) -> Result<Vec<Value>, ListError> {
        if let Some(interface) = interface(list) {
            if let Some(all) = interface.list.all {
                return all(list);
            }

            if let Some(index) = interface.list.index {
                let mut elements = vec![];
                while let Some(element) = index(list, elements.len())? {
                    elements.push(element);
                }
                return Ok(elements);
            }
        }

        let text = list.text();
        Ok(split_list(&text)?.into_iter().map(Value::from).collect())
    }

    /// The length needed to clamp arguments of another operation, which is
    /// itself subject to the fallback policy
    pub(crate) fn length_unchecked(&self, list: &Value) -> Result<usize, ListError> {
        match interface(list).and_then(|i| i.list.length) {
            Some(length) => length(list),
            None => Ok(self.elements(list)?.len()),
        }
    }

    pub fn length(&self, list: &Value) -> Result<usize, ListError> {
        if let Some(length) = interface(list).and_then(|i| i.list.length) {
            return length(list);
        }

        self.fallback(list, Capability::ListLength)?;
        Ok(self.elements(list)?.len())
    }

    /// Get the element at `index`, `None` when the index is past the end
    pub fn index(&self, list: &Value, index: usize) -> Result<Option<Value>, ListError> {
        if let Some(get) = interface(list).and_then(|i| i.list.index) {
            return get(list, index);
        }

        self.fallback(list, Capability::ListIndex)?;
        Ok(self.elements(list)?.into_iter().nth(index))
    }

    /// Get the element `offset` places before the last one
    pub fn index_end(&self, list: &Value, offset: usize) -> Result<Option<Value>, ListError> {
        if let Some(get) = interface(list).and_then(|i| i.list.index_end) {
            return get(list, offset);
        }

        let length = self.length(list)?;
        if offset >= length {
            return Ok(None);
        }
        self.index(list, length - 1 - offset)
    }

    /// Get the elements `from..=to` as a new list
    pub fn range(&self, list: &Value, from: usize, to: usize) -> Result<Value, ListError> {
        if let Some(range) = interface(list).and_then(|i| i.list.range) {
            return range(list, from, to);
        }

        self.fallback(list, Capability::ListRange)?;
        let elements = self.elements(list)?;
        Ok(match check_range(elements.len(), from, to)? {
            Some((from, to)) => PlainList::new_value(elements[from..=to].to_vec()),
            None => Value::empty(),
        })
    }

    /// Get a range with both endpoints counted back from the last element
    pub fn range_end(&self, list: &Value, from_end: usize, to_end: usize) -> Result<Value, ListError> {
        if let Some(range) = interface(list).and_then(|i| i.list.range_end) {
            return range(list, from_end, to_end);
        }

        let length = self.length(list)?;
        if to_end >= length || from_end < to_end {
            return Ok(Value::empty());
        }

        let last = length - 1;
        let from = last.saturating_sub(from_end);
        self.range(list, from, last - to_end)
    }

    pub fn all(&self, list: &Value) -> Result<Vec<Value>, ListError> {
        if let Some(all) = interface(list).and_then(|i| i.list.all) {
            return all(list);
        }

        self.fallback(list, Capability::ListAll)?;
        self.elements(list)
    }

    /// Does any element have the same text as `element`
    pub fn contains(&self, list: &Value, element: &Value) -> Result<bool, ListError> {
        if let Some(contains) = interface(list).and_then(|i| i.list.contains) {
            return contains(list, element);
        }

        self.fallback(list, Capability::ListContains)?;
        let needle = element.text();
        Ok(self
            .elements(list)?
            .iter()
            .any(|element| element.text() == needle))
    }

    /// Remove `count` elements starting at `first` and insert `elements` in
    /// their place.  A negative `first` is treated as zero, a `first` past the
    /// end appends and `count` is clamped to the elements available.
    ///
    /// # Panics
    /// If `list` is shared
    pub fn replace(
        &self,
        list: &mut Value,
        first: isize,
        count: isize,
        elements: &[Value],
    ) -> Result<(), ListError> {
        require_unshared(list, "replace");

        let length = self.length_unchecked(list)?;
        let first = first.clamp(0, length as isize) as usize;
        let count = if count <= 0 {
            0
        } else {
            (count as usize).min(length - first)
        };

        if let Some(replace) = interface(list).and_then(|i| i.list.replace) {
            return replace(&mut list.unique_mut("replace"), first, count, elements);
        }

        self.fallback(list, Capability::ListReplace)?;
        let mut all = self.elements(list)?;
        all.splice(first..first + count, elements.iter().cloned());
        *list = PlainList::new_value(all);

        Ok(())
    }

    /// # Panics
    /// If `list` is shared
    pub fn reverse(&self, list: &mut Value) -> Result<(), ListError> {
        require_unshared(list, "reverse");

        if let Some(reverse) = interface(list).and_then(|i| i.list.reverse) {
            return reverse(&mut list.unique_mut("reverse"));
        }

        self.fallback(list, Capability::ListReverse)?;
        let mut all = self.elements(list)?;
        all.reverse();
        *list = PlainList::new_value(all);

        Ok(())
    }

    /// # Panics
    /// If `list` is shared
    pub fn append(&self, list: &mut Value, element: &Value) -> Result<(), ListError> {
        require_unshared(list, "append");

        let native = interface(list);
        if let Some(append) = native.and_then(|i| i.list.append) {
            return append(&mut list.unique_mut("append"), element);
        }
        if let Some(append_list) = native.and_then(|i| i.list.append_list) {
            return append_list(&mut list.unique_mut("append"), slice::from_ref(element));
        }

        let length = self.length_unchecked(list)?;
        self.replace(list, length as isize, 0, slice::from_ref(element))
    }

    /// # Panics
    /// If `list` is shared
    pub fn append_list(&self, list: &mut Value, elements: &[Value]) -> Result<(), ListError> {
        require_unshared(list, "append_list");

        let native = interface(list);
        if let Some(append_list) = native.and_then(|i| i.list.append_list) {
            return append_list(&mut list.unique_mut("append_list"), elements);
        }
        if native.and_then(|i| i.list.append).is_some() {
            for element in elements {
                self.append(list, element)?;
            }
            return Ok(());
        }

        let length = self.length_unchecked(list)?;
        self.replace(list, length as isize, 0, elements)
    }

    /// Replace the element reached by following `indices` through nested
    /// lists, or delete it when `element` is `None`.  With no indices the
    /// whole value is replaced.  A shared list is copied first, other owners
    /// keep the old value.
    pub fn set_element(
        &self,
        list: &mut Value,
        indices: &[Value],
        element: Option<&Value>,
    ) -> Result<(), ListError> {
        if indices.is_empty() {
            *list = element.ok_or(ListError::MissingElement)?.clone();
            return Ok(());
        }

        if let Some(set_element) = interface(list).and_then(|i| i.list.set_element) {
            return set_element(self, list, indices, element);
        }

        self.fallback(list, Capability::ListSetElement)?;
        let mut plain = PlainList::new_value(self.elements(list)?);
        generic::set_plain_element(self, &mut plain, indices, element)?;
        *list = plain;

        Ok(())
    }
}
