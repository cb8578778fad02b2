//! A list whose elements are computed on demand by evaluating a command with
//! the element's index appended.  Nothing is cached, every access runs the
//! command again.

use std::{
    cell::{Ref, RefCell},
    rc::Weak,
};

use tracing::{trace, warn};

use crate::{
    interface::ObjInterface,
    interp::Interpreter,
    list::{join_elements, ListError},
    objtype::ObjType,
    value::{NativeRep, Value},
};

#[derive(Debug)]
pub struct LGen {
    interp: Weak<Interpreter>,
    length: usize,
    /// The generator command, its last word is replaced by each index
    template: RefCell<Vec<Value>>,
}

impl LGen {
    pub fn new(interp: &Interpreter, length: usize, command: &[Value]) -> Self {
        let mut template = command.to_vec();
        template.push(Value::from(0usize));

        Self {
            interp: interp.weak(),
            length,
            template: RefCell::new(template),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The command words with the index filled in
    fn bind(&self, index: usize) -> Vec<Value> {
        let mut template = self.template.borrow_mut();
        if let Some(slot) = template.last_mut() {
            *slot = Value::from(index);
        }
        template.clone()
    }
}

pub static LGEN_INTERFACE: ObjInterface = ObjInterface::new()
    .with_version(1)
    .with_list_index(lgen_index)
    .with_list_length(lgen_length);

pub static LGEN_TYPE: ObjType = ObjType::new("lgenseries")
    .with_version(1)
    .with_free(lgen_free)
    .with_dup(lgen_dup)
    .with_update_string(lgen_update_string)
    .with_interface(&LGEN_INTERFACE);

/// Create a generated list of `length` elements
pub fn new_lgen(interp: &Interpreter, length: usize, command: &[Value]) -> Value {
    let lgen = LGen::new(interp, length, command);
    if length == 0 {
        Value::from_native_and_text(&LGEN_TYPE, lgen, "")
    } else {
        Value::from_native(&LGEN_TYPE, lgen)
    }
}

fn lgen(list: &Value) -> Ref<'_, LGen> {
    list.native::<LGen>()
        .unwrap_or_else(|| panic!("lgen operation called on {:?}", list))
}

fn lgen_free(rep: &mut dyn NativeRep) {
    if let Some(lgen) = rep.as_any_mut().downcast_mut::<LGen>() {
        trace!(length = lgen.length, "freeing generator");
        lgen.template.get_mut().clear();
    }
}

fn lgen_dup(rep: &dyn NativeRep) -> Box<dyn NativeRep> {
    match rep.as_any().downcast_ref::<LGen>() {
        Some(lgen) => {
            let template = lgen.template.borrow().iter().map(Value::duplicate).collect();
            Box::new(LGen {
                interp: lgen.interp.clone(),
                length: lgen.length,
                template: RefCell::new(template),
            })
        }
        None => panic!("lgen duplication called on {:?}", rep),
    }
}

/// Evaluate every element, elements that fail to evaluate are left out
fn lgen_update_string(list: &Value) -> String {
    let length = lgen(list).length;

    join_elements((0..length).filter_map(|idx| match lgen_index(list, idx) {
        Ok(element) => element.map(|element| element.text()),
        Err(error) => {
            warn!(index = idx, %error, "generator element skipped");
            None
        }
    }))
}

fn lgen_length(list: &Value) -> Result<usize, ListError> {
    Ok(lgen(list).length)
}

fn lgen_index(list: &Value, index: usize) -> Result<Option<Value>, ListError> {
    let (interp, command) = {
        let rep = lgen(list);
        if index >= rep.length {
            return Ok(None);
        }
        (rep.interp.clone(), rep.bind(index))
    };

    let interp = interp.upgrade().ok_or(ListError::NoContext)?;
    trace!(index, "generating element");

    interp
        .invoke(&command)
        .map(Some)
        .map_err(|error| ListError::Evaluation {
            message: error.to_string(),
            command: join_elements(command.iter().map(Value::text)),
        })
}
