//! Arbitrary precision integers as a native representation

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use thiserror::Error;

use crate::{
    interface::ObjInterface,
    objtype::ObjType,
    value::{NativeRep, Value, ValueError},
};

#[derive(Debug, Error)]
pub enum NumericError {
    #[error("expected integer but got \"{text}\"")]
    NotAnInteger { text: String },

    #[error("integer {value} is out of range for {purpose}")]
    OutOfRange { value: BigInt, purpose: &'static str },
}

/// The native form of an integer value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integer(pub BigInt);

pub static INT_INTERFACE: ObjInterface = ObjInterface::new()
    .with_version(1)
    .with_string_length(int_string_length)
    .with_string_is_empty(int_string_is_empty);

pub static INT_TYPE: ObjType = ObjType::new("bigint")
    .with_version(1)
    .with_dup(int_dup)
    .with_update_string(int_update_string)
    .with_set_from_any(int_set_from_any)
    .with_interface(&INT_INTERFACE);

fn int_dup(rep: &dyn NativeRep) -> Box<dyn NativeRep> {
    match rep.as_any().downcast_ref::<Integer>() {
        Some(int) => Box::new(int.clone()),
        None => panic!("integer duplication called on {:?}", rep),
    }
}

fn int_update_string(value: &Value) -> String {
    value
        .native::<Integer>()
        .map(|int| int.0.to_string())
        .unwrap_or_default()
}

fn int_set_from_any(value: &Value) -> Result<Box<dyn NativeRep>, ValueError> {
    let text = value.text();
    text.trim()
        .parse::<BigInt>()
        .map(|int| Box::new(Integer(int)) as Box<dyn NativeRep>)
        .map_err(|err| ValueError::Conversion {
            target: INT_TYPE.name().to_string(),
            text: text.to_string(),
            message: err.to_string(),
        })
}

/// The number of characters in the decimal form, without generating it
fn int_string_length(value: &Value) -> usize {
    value
        .native::<Integer>()
        .map(|int| {
            let sign = usize::from(int.0.sign() == num_bigint::Sign::Minus);
            int.0.magnitude().to_str_radix(10).len() + sign
        })
        .unwrap_or_else(|| value.text().chars().count())
}

fn int_string_is_empty(_: &Value) -> bool {
    false
}

impl From<BigInt> for Value {
    fn from(int: BigInt) -> Self {
        Value::from_native(&INT_TYPE, Integer(int))
    }
}

/// Get the integer held by a value, converting it if needed
pub fn get_integer(value: &Value) -> Result<BigInt, NumericError> {
    let not_integer = || NumericError::NotAnInteger {
        text: value.text().to_string(),
    };

    value.convert_to(&INT_TYPE).map_err(|_| not_integer())?;
    let int = value.native::<Integer>().map(|int| int.0.clone());
    int.ok_or_else(not_integer)
}

/// Get a non-negative integer that fits in a `usize`
pub fn get_usize(value: &Value, purpose: &'static str) -> Result<usize, NumericError> {
    let int = get_integer(value)?;
    int.to_usize()
        .ok_or(NumericError::OutOfRange { value: int, purpose })
}
