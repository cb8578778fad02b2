//! The optional table of natively implemented list and string operations
//! attached to a type descriptor.

use std::fmt;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::{
    list::{ListError, ListProtocol},
    value::{UniqueValue, Value},
};

pub type ListAllProc = fn(&Value) -> Result<Vec<Value>, ListError>;
pub type ListAppendProc = fn(&mut UniqueValue<'_>, &Value) -> Result<(), ListError>;
pub type ListAppendListProc = fn(&mut UniqueValue<'_>, &[Value]) -> Result<(), ListError>;
pub type ListContainsProc = fn(&Value, &Value) -> Result<bool, ListError>;
pub type ListIndexProc = fn(&Value, usize) -> Result<Option<Value>, ListError>;
pub type ListIndexEndProc = fn(&Value, usize) -> Result<Option<Value>, ListError>;
pub type ListLengthProc = fn(&Value) -> Result<usize, ListError>;
pub type ListRangeProc = fn(&Value, usize, usize) -> Result<Value, ListError>;
pub type ListRangeEndProc = fn(&Value, usize, usize) -> Result<Value, ListError>;
pub type ListReplaceProc =
    fn(&mut UniqueValue<'_>, usize, usize, &[Value]) -> Result<(), ListError>;
pub type ListReverseProc = fn(&mut UniqueValue<'_>) -> Result<(), ListError>;
/// Set or delete a possibly nested element.  Nested lists are modified
/// through the protocol the caller dispatched with.
pub type ListSetElementProc =
    fn(&ListProtocol, &mut Value, &[Value], Option<&Value>) -> Result<(), ListError>;

pub type StringIndexProc = fn(&Value, usize) -> Option<char>;
pub type StringIsEmptyProc = fn(&Value) -> bool;
pub type StringLengthProc = fn(&Value) -> usize;
pub type StringRangeProc = fn(&Value, usize, usize) -> Value;

/// An operation that a native representation may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
pub enum Capability {
    ListAll = 0,
    ListAppend,
    ListAppendList,
    ListContains,
    ListIndex,
    ListIndexEnd,
    ListLength,
    ListRange,
    ListRangeEnd,
    ListReplace,
    ListReverse,
    ListSetElement,
    StringIndex,
    StringIsEmpty,
    StringLength,
    StringRange,
}

impl Capability {
    pub const COUNT: u32 = 16;

    pub fn name(self) -> &'static str {
        match self {
            Capability::ListAll => "list all",
            Capability::ListAppend => "list append",
            Capability::ListAppendList => "list append-list",
            Capability::ListContains => "list contains",
            Capability::ListIndex => "list index",
            Capability::ListIndexEnd => "list index-end",
            Capability::ListLength => "list length",
            Capability::ListRange => "list range",
            Capability::ListRangeEnd => "list range-end",
            Capability::ListReplace => "list replace",
            Capability::ListReverse => "list reverse",
            Capability::ListSetElement => "list set-element",
            Capability::StringIndex => "string index",
            Capability::StringIsEmpty => "string is-empty",
            Capability::StringLength => "string length",
            Capability::StringRange => "string range",
        }
    }

    pub fn is_list(self) -> bool {
        self < Capability::StringIndex
    }

    /// Every capability, in declaration order
    pub fn iter() -> impl Iterator<Item = Capability> {
        (0..Self::COUNT).filter_map(Capability::from_u32)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A set of capabilities stored as a bit mask
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= 1 << capability as u32;
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0 & (1 << capability as u32) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Does the set contain any list operation
    pub fn has_list(&self) -> bool {
        self.iter().any(Capability::is_list)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::iter().filter(move |capability| self.contains(*capability))
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.iter().map(Capability::name).collect::<Vec<_>>();
        write!(f, "{}", names.join(", "))
    }
}

/// Natively implemented list operations, any of which may be absent
#[derive(Clone, Copy, Default)]
pub(crate) struct ListInterface {
    pub(crate) all: Option<ListAllProc>,
    pub(crate) append: Option<ListAppendProc>,
    pub(crate) append_list: Option<ListAppendListProc>,
    pub(crate) contains: Option<ListContainsProc>,
    pub(crate) index: Option<ListIndexProc>,
    pub(crate) index_end: Option<ListIndexEndProc>,
    pub(crate) length: Option<ListLengthProc>,
    pub(crate) range: Option<ListRangeProc>,
    pub(crate) range_end: Option<ListRangeEndProc>,
    pub(crate) replace: Option<ListReplaceProc>,
    pub(crate) reverse: Option<ListReverseProc>,
    pub(crate) set_element: Option<ListSetElementProc>,
}

/// Natively implemented string operations
#[derive(Clone, Copy, Default)]
pub(crate) struct StringInterface {
    pub(crate) index: Option<StringIndexProc>,
    pub(crate) is_empty: Option<StringIsEmptyProc>,
    pub(crate) length: Option<StringLengthProc>,
    pub(crate) range: Option<StringRangeProc>,
}

/// The operations a native representation implements without going through
/// its textual form.  Every operation left out falls back to the generic
/// list or string implementation.
#[derive(Clone, Copy, Default)]
pub struct ObjInterface {
    version: u32,
    pub(crate) list: ListInterface,
    pub(crate) string: StringInterface,
}

impl ObjInterface {
    pub const fn new() -> Self {
        Self {
            version: 0,
            list: ListInterface {
                all: None,
                append: None,
                append_list: None,
                contains: None,
                index: None,
                index_end: None,
                length: None,
                range: None,
                range_end: None,
                replace: None,
                reverse: None,
                set_element: None,
            },
            string: StringInterface {
                index: None,
                is_empty: None,
                length: None,
                range: None,
            },
        }
    }

    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub const fn with_list_all(mut self, op: ListAllProc) -> Self {
        self.list.all = Some(op);
        self
    }

    pub const fn with_list_append(mut self, op: ListAppendProc) -> Self {
        self.list.append = Some(op);
        self
    }

    pub const fn with_list_append_list(mut self, op: ListAppendListProc) -> Self {
        self.list.append_list = Some(op);
        self
    }

    pub const fn with_list_contains(mut self, op: ListContainsProc) -> Self {
        self.list.contains = Some(op);
        self
    }

    pub const fn with_list_index(mut self, op: ListIndexProc) -> Self {
        self.list.index = Some(op);
        self
    }

    pub const fn with_list_index_end(mut self, op: ListIndexEndProc) -> Self {
        self.list.index_end = Some(op);
        self
    }

    pub const fn with_list_length(mut self, op: ListLengthProc) -> Self {
        self.list.length = Some(op);
        self
    }

    pub const fn with_list_range(mut self, op: ListRangeProc) -> Self {
        self.list.range = Some(op);
        self
    }

    pub const fn with_list_range_end(mut self, op: ListRangeEndProc) -> Self {
        self.list.range_end = Some(op);
        self
    }

    pub const fn with_list_replace(mut self, op: ListReplaceProc) -> Self {
        self.list.replace = Some(op);
        self
    }

    pub const fn with_list_reverse(mut self, op: ListReverseProc) -> Self {
        self.list.reverse = Some(op);
        self
    }

    pub const fn with_list_set_element(mut self, op: ListSetElementProc) -> Self {
        self.list.set_element = Some(op);
        self
    }

    pub const fn with_string_index(mut self, op: StringIndexProc) -> Self {
        self.string.index = Some(op);
        self
    }

    pub const fn with_string_is_empty(mut self, op: StringIsEmptyProc) -> Self {
        self.string.is_empty = Some(op);
        self
    }

    pub const fn with_string_length(mut self, op: StringLengthProc) -> Self {
        self.string.length = Some(op);
        self
    }

    pub const fn with_string_range(mut self, op: StringRangeProc) -> Self {
        self.string.range = Some(op);
        self
    }

    /// Remove a single operation, it will use the generic fallback instead
    pub const fn without(mut self, capability: Capability) -> Self {
        match capability {
            Capability::ListAll => self.list.all = None,
            Capability::ListAppend => self.list.append = None,
            Capability::ListAppendList => self.list.append_list = None,
            Capability::ListContains => self.list.contains = None,
            Capability::ListIndex => self.list.index = None,
            Capability::ListIndexEnd => self.list.index_end = None,
            Capability::ListLength => self.list.length = None,
            Capability::ListRange => self.list.range = None,
            Capability::ListRangeEnd => self.list.range_end = None,
            Capability::ListReplace => self.list.replace = None,
            Capability::ListReverse => self.list.reverse = None,
            Capability::ListSetElement => self.list.set_element = None,
            Capability::StringIndex => self.string.index = None,
            Capability::StringIsEmpty => self.string.is_empty = None,
            Capability::StringLength => self.string.length = None,
            Capability::StringRange => self.string.range = None,
        }
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::ListAll => self.list.all.is_some(),
            Capability::ListAppend => self.list.append.is_some(),
            Capability::ListAppendList => self.list.append_list.is_some(),
            Capability::ListContains => self.list.contains.is_some(),
            Capability::ListIndex => self.list.index.is_some(),
            Capability::ListIndexEnd => self.list.index_end.is_some(),
            Capability::ListLength => self.list.length.is_some(),
            Capability::ListRange => self.list.range.is_some(),
            Capability::ListRangeEnd => self.list.range_end.is_some(),
            Capability::ListReplace => self.list.replace.is_some(),
            Capability::ListReverse => self.list.reverse.is_some(),
            Capability::ListSetElement => self.list.set_element.is_some(),
            Capability::StringIndex => self.string.index.is_some(),
            Capability::StringIsEmpty => self.string.is_empty.is_some(),
            Capability::StringLength => self.string.length.is_some(),
            Capability::StringRange => self.string.range.is_some(),
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        let mut set = CapabilitySet::new();
        for capability in Capability::iter().filter(|capability| self.has(*capability)) {
            set.insert(capability);
        }
        set
    }
}

impl fmt::Debug for ObjInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjInterface")
            .field("version", &self.version)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn length_one(_: &Value) -> Result<usize, ListError> {
        Ok(1)
    }

    fn length_two(_: &Value) -> Result<usize, ListError> {
        Ok(2)
    }

    #[test]
    fn last_registration_wins() {
        let interface = ObjInterface::new()
            .with_list_length(length_one)
            .with_list_length(length_two);

        let length = interface.list.length.unwrap();
        assert_eq!(length(&Value::empty()).unwrap(), 2);
    }

    #[test]
    fn capability_set() {
        let interface = ObjInterface::new()
            .with_version(1)
            .with_list_length(length_one)
            .with_string_length(|_| 0);

        let caps = interface.capabilities();
        assert_eq!(caps.len(), 2);
        assert!(caps.contains(Capability::ListLength));
        assert!(caps.contains(Capability::StringLength));
        assert!(!caps.contains(Capability::ListIndex));
        assert!(caps.has_list());
        assert_eq!(caps.to_string(), "list length, string length");

        let caps = interface.without(Capability::ListLength).capabilities();
        assert!(!caps.has_list());
    }

    #[test]
    fn all_capabilities_listed() {
        assert_eq!(Capability::iter().count(), Capability::COUNT as usize);
        assert!(Capability::ListSetElement.is_list());
        assert!(!Capability::StringRange.is_list());
    }
}
