//! Type descriptors, the callbacks that manage a native representation
//! through its lifecycle.

use std::{borrow::Cow, fmt};

use crate::{
    interface::{CapabilitySet, ObjInterface},
    value::{NativeRep, Value, ValueError},
};

/// Release resources owned by a native representation before it is dropped
pub type FreeInternalRepProc = fn(&mut dyn NativeRep);

/// Create an independent copy of a native representation
pub type DupInternalRepProc = fn(&dyn NativeRep) -> Box<dyn NativeRep>;

/// Generate the textual form of a value from its native representation
pub type UpdateStringProc = fn(&Value) -> String;

/// Build a native representation from the textual form of a value
pub type SetFromAnyProc = fn(&Value) -> Result<Box<dyn NativeRep>, ValueError>;

/// One of the lifecycle callbacks of a type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Free,
    Dup,
    UpdateString,
    SetFromAny,
}

/// Describes how values of a native representation are freed, copied,
/// converted to and from text, and which abstract list operations they
/// implement natively.
///
/// Descriptors are built with `const` methods so they can be declared as
/// statics, values refer to them as `&'static ObjType`.
pub struct ObjType {
    name: Cow<'static, str>,
    version: u32,
    free: Option<FreeInternalRepProc>,
    dup: Option<DupInternalRepProc>,
    update_string: Option<UpdateStringProc>,
    set_from_any: Option<SetFromAnyProc>,
    interface: Option<&'static ObjInterface>,
}

impl ObjType {
    /// Create a descriptor with no callbacks and no list interface
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            version: 0,
            free: None,
            dup: None,
            update_string: None,
            set_from_any: None,
            interface: None,
        }
    }

    /// Create a descriptor whose name is only known at runtime
    pub fn named(name: String) -> Self {
        Self {
            name: Cow::Owned(name),
            ..Self::new("")
        }
    }

    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub const fn with_free(mut self, free: FreeInternalRepProc) -> Self {
        self.free = Some(free);
        self
    }

    pub const fn with_dup(mut self, dup: DupInternalRepProc) -> Self {
        self.dup = Some(dup);
        self
    }

    pub const fn with_update_string(mut self, update_string: UpdateStringProc) -> Self {
        self.update_string = Some(update_string);
        self
    }

    pub const fn with_set_from_any(mut self, set_from_any: SetFromAnyProc) -> Self {
        self.set_from_any = Some(set_from_any);
        self
    }

    pub const fn with_interface(mut self, interface: &'static ObjInterface) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Remove a single lifecycle callback
    pub const fn without(mut self, callback: Lifecycle) -> Self {
        match callback {
            Lifecycle::Free => self.free = None,
            Lifecycle::Dup => self.dup = None,
            Lifecycle::UpdateString => self.update_string = None,
            Lifecycle::SetFromAny => self.set_from_any = None,
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn free_proc(&self) -> Option<FreeInternalRepProc> {
        self.free
    }

    pub fn dup_proc(&self) -> Option<DupInternalRepProc> {
        self.dup
    }

    pub fn update_string_proc(&self) -> Option<UpdateStringProc> {
        self.update_string
    }

    pub fn set_from_any_proc(&self) -> Option<SetFromAnyProc> {
        self.set_from_any
    }

    pub fn interface(&self) -> Option<&'static ObjInterface> {
        self.interface
    }

    pub fn has(&self, callback: Lifecycle) -> bool {
        match callback {
            Lifecycle::Free => self.free.is_some(),
            Lifecycle::Dup => self.dup.is_some(),
            Lifecycle::UpdateString => self.update_string.is_some(),
            Lifecycle::SetFromAny => self.set_from_any.is_some(),
        }
    }

    /// The operations this type implements natively, empty without an interface
    pub fn capabilities(&self) -> CapabilitySet {
        self.interface
            .map(ObjInterface::capabilities)
            .unwrap_or_default()
    }
}

impl fmt::Debug for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjType")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("free", &self.free.is_some())
            .field("dup", &self.dup.is_some())
            .field("update_string", &self.update_string.is_some())
            .field("set_from_any", &self.set_from_any.is_some())
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn no_dup(_: &dyn NativeRep) -> Box<dyn NativeRep> {
        Box::new(())
    }

    static PLAIN: ObjType = ObjType::new("plain").with_version(3).with_dup(no_dup);
    static STRIPPED: ObjType = ObjType::new("plain").with_dup(no_dup).without(Lifecycle::Dup);

    #[test]
    fn builder() {
        assert_eq!(PLAIN.name(), "plain");
        assert_eq!(PLAIN.version(), 3);
        assert!(PLAIN.has(Lifecycle::Dup));
        assert!(!PLAIN.has(Lifecycle::Free));
        assert!(PLAIN.capabilities().is_empty());
        assert!(!STRIPPED.has(Lifecycle::Dup));
    }

    #[test]
    fn runtime_name() {
        let ty = ObjType::named(format!("gen{}", 2));
        assert_eq!(ty.name(), "gen2");
        assert_eq!(ty.version(), 0);
    }
}
