//! Reference counted values holding a textual form, a native form or both.
//!
//! A value always has at least one of the two forms.  The textual form is
//! derived from the native form on demand and cached, mutating the native
//! form through a [`UniqueValue`] discards the cached text.

use std::{
    any::Any,
    cell::{Ref, RefCell},
    fmt, mem,
    rc::Rc,
};

use thiserror::Error;
use tracing::trace;

use crate::objtype::ObjType;

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("Unable to convert value to {target}, the type has no conversion from text")]
    NoConversion { target: String },

    #[error("Expected {target} but got \"{text}\": {message}")]
    Conversion {
        target: String,
        text: String,
        message: String,
    },

    #[error("Value is being read and cannot change representation")]
    Busy,
}

/// The internal data of a native representation.  Implemented for every
/// debuggable type, the owning type descriptor's callbacks downcast it back to
/// the concrete type.
pub trait NativeRep: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + fmt::Debug> NativeRep for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A native representation and the descriptor that manages it
struct NativeSlot {
    ty: &'static ObjType,
    data: Box<dyn NativeRep>,
}

impl NativeSlot {
    fn new(ty: &'static ObjType, data: Box<dyn NativeRep>) -> Self {
        Self { ty, data }
    }

    /// The stored data, without going through the box's own `NativeRep` impl
    fn data(&self) -> &dyn NativeRep {
        &*self.data
    }

    fn data_mut(&mut self) -> &mut dyn NativeRep {
        &mut *self.data
    }

    fn duplicate(&self) -> Self {
        let dup = self.ty.dup_proc().unwrap_or_else(|| {
            panic!(
                "Unable to duplicate value of type \"{}\", the type has no duplication callback",
                self.ty.name()
            )
        });

        Self::new(self.ty, dup(self.data()))
    }
}

impl Drop for NativeSlot {
    fn drop(&mut self) {
        if let Some(free) = self.ty.free_proc() {
            free(&mut *self.data);
        }
    }
}

enum Repr {
    Text(Rc<str>),
    Native(NativeSlot),
    Both(Rc<str>, NativeSlot),
}

impl Repr {
    fn text(&self) -> Option<&Rc<str>> {
        match self {
            Repr::Text(text) | Repr::Both(text, _) => Some(text),
            Repr::Native(_) => None,
        }
    }

    fn native(&self) -> Option<&NativeSlot> {
        match self {
            Repr::Native(slot) | Repr::Both(_, slot) => Some(slot),
            Repr::Text(_) => None,
        }
    }

    /// Drop the cached text of a native representation, text only values are
    /// left alone as they would otherwise have no form at all.
    fn invalidate_text(&mut self) {
        if let Repr::Both(..) = self {
            if let Repr::Both(_, slot) = mem::replace(self, Repr::Text(Rc::from(""))) {
                *self = Repr::Native(slot);
            }
        }
    }

    fn cache_text(&mut self, text: Rc<str>) {
        match mem::replace(self, Repr::Text(Rc::from(""))) {
            Repr::Native(slot) | Repr::Both(_, slot) => *self = Repr::Both(text, slot),
            Repr::Text(_) => *self = Repr::Text(text),
        }
    }
}

struct ValueCell {
    repr: RefCell<Repr>,
}

/// A reference counted value.  Cloning a value shares it, use
/// [`Value::duplicate`] for an independent copy.
#[derive(Clone)]
pub struct Value(Rc<ValueCell>);

impl Value {
    fn from_repr(repr: Repr) -> Self {
        Value(Rc::new(ValueCell {
            repr: RefCell::new(repr),
        }))
    }

    /// The empty string
    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: impl Into<Rc<str>>) -> Self {
        Self::from_repr(Repr::Text(text.into()))
    }

    /// Create a value that only has a native form, its text is computed by the
    /// descriptor's string callback when first needed.
    pub fn from_native(ty: &'static ObjType, data: impl NativeRep) -> Self {
        Self::from_repr(Repr::Native(NativeSlot::new(ty, Box::new(data))))
    }

    /// Create a value with both forms already known
    pub fn from_native_and_text(
        ty: &'static ObjType,
        data: impl NativeRep,
        text: impl Into<Rc<str>>,
    ) -> Self {
        Self::from_repr(Repr::Both(
            text.into(),
            NativeSlot::new(ty, Box::new(data)),
        ))
    }

    /// The descriptor of the native form, if there is one
    pub fn obj_type(&self) -> Option<&'static ObjType> {
        self.0.repr.borrow().native().map(|slot| slot.ty)
    }

    /// Does the value currently have a native form managed by `ty`
    pub fn has_type(&self, ty: &'static ObjType) -> bool {
        self.obj_type()
            .map(|own| std::ptr::eq(own, ty))
            .unwrap_or(false)
    }

    /// Is the textual form currently cached
    pub fn has_text(&self) -> bool {
        self.0.repr.borrow().text().is_some()
    }

    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Is the value held by more than one owner
    pub fn is_shared(&self) -> bool {
        self.ref_count() > 1
    }

    /// Get the textual form, generating and caching it from the native form if
    /// it is not already present.
    pub fn text(&self) -> Rc<str> {
        let update = match &*self.0.repr.borrow() {
            Repr::Text(text) | Repr::Both(text, _) => return Rc::clone(text),
            Repr::Native(slot) => slot.ty.update_string_proc().unwrap_or_else(|| {
                panic!(
                    "Unable to get text of value with type \"{}\", the type has no string callback",
                    slot.ty.name()
                )
            }),
        };

        let text: Rc<str> = update(self).into();

        // the string callback may have left the representation borrowed by an
        // outer caller, the text is still correct but cannot be cached
        match self.0.repr.try_borrow_mut() {
            Ok(mut repr) => repr.cache_text(Rc::clone(&text)),
            Err(_) => trace!("text not cached, value is borrowed"),
        }

        text
    }

    /// Make sure the textual form is cached
    pub fn ensure_text(&self) {
        self.text();
    }

    /// Borrow the native form as `T`, if the value has a native form of that
    /// concrete type.
    pub fn native<T: NativeRep>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.repr.borrow(), |repr| {
            repr.native()
                .and_then(|slot| slot.data().as_any().downcast_ref::<T>())
        })
        .ok()
    }

    /// Create an unshared copy.  The native form is copied using the
    /// descriptor's duplication callback, the text is only copied if it is
    /// already present.
    pub fn duplicate(&self) -> Self {
        let repr = match &*self.0.repr.borrow() {
            Repr::Text(text) => Repr::Text(Rc::clone(text)),
            Repr::Native(slot) => Repr::Native(slot.duplicate()),
            Repr::Both(text, slot) => Repr::Both(Rc::clone(text), slot.duplicate()),
        };

        Self::from_repr(repr)
    }

    /// Give the value a native form managed by `ty`, parsing its text with the
    /// descriptor's conversion callback.  The previous native form is freed,
    /// the text is kept.
    pub fn convert_to(&self, ty: &'static ObjType) -> Result<(), ValueError> {
        if self.has_type(ty) {
            return Ok(());
        }

        let set_from_any = ty
            .set_from_any_proc()
            .ok_or_else(|| ValueError::NoConversion {
                target: ty.name().to_string(),
            })?;

        let text = self.text();
        let data = set_from_any(self)?;

        let mut repr = self.0.repr.try_borrow_mut().map_err(|_| ValueError::Busy)?;
        trace!(
            from = repr.native().map(|slot| slot.ty.name()).unwrap_or("text"),
            to = ty.name(),
            "converting value"
        );
        *repr = Repr::Both(text, NativeSlot::new(ty, data));

        Ok(())
    }

    /// Get exclusive access for an in place modification.
    ///
    /// # Panics
    /// If the value is shared, `operation` names the caller in the message.
    pub fn unique_mut(&mut self, operation: &str) -> UniqueValue<'_> {
        match Rc::get_mut(&mut self.0) {
            Some(cell) => UniqueValue { cell },
            None => panic!("{} called with shared value", operation),
        }
    }

    /// Get exclusive access, replacing this handle with a duplicate first if
    /// the value is shared.  Other owners keep seeing the old value.
    pub fn make_mut(&mut self) -> UniqueValue<'_> {
        if self.is_shared() {
            *self = self.duplicate();
        }

        self.unique_mut("make_mut")
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = self.0.repr.borrow();
        f.debug_struct("Value")
            .field("type", &repr.native().map(|slot| slot.ty.name()))
            .field("text", &repr.text())
            .field("native", &repr.native().map(|slot| slot.data()))
            .finish()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl From<Rc<str>> for Value {
    fn from(text: Rc<str>) -> Self {
        Self::from_text(text)
    }
}

impl From<char> for Value {
    fn from(ch: char) -> Self {
        Self::from_text(ch.to_string())
    }
}

impl From<usize> for Value {
    fn from(num: usize) -> Self {
        Self::from_text(num.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::from_text(if value { "1" } else { "0" })
    }
}

/// Exclusive access to a value that has exactly one owner
pub struct UniqueValue<'a> {
    cell: &'a mut ValueCell,
}

impl UniqueValue<'_> {
    pub fn obj_type(&self) -> Option<&'static ObjType> {
        self.cell.repr.borrow().native().map(|slot| slot.ty)
    }

    /// Mutably borrow the native form as `T`.  The cached text is discarded
    /// first, as it is about to become stale.
    pub fn native_mut<T: NativeRep>(&mut self) -> Option<&mut T> {
        let repr = self.cell.repr.get_mut();
        repr.invalidate_text();

        match repr {
            Repr::Native(slot) => slot.data_mut().as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }

    /// Replace the whole native form, freeing the old one and dropping the text
    pub fn set_native(&mut self, ty: &'static ObjType, data: impl NativeRep) {
        *self.cell.repr.get_mut() = Repr::Native(NativeSlot::new(ty, Box::new(data)));
    }

    pub fn invalidate_text(&mut self) {
        self.cell.repr.get_mut().invalidate_text();
    }
}

impl fmt::Debug for UniqueValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueValue")
            .field("type", &self.obj_type().map(ObjType::name))
            .finish()
    }
}
