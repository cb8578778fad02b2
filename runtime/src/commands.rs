//! The builtin commands and types of an interpreter

use num_bigint::BigInt;

use crate::{
    interp::{EvalError, Interpreter},
    lgen::{new_lgen, LGEN_TYPE},
    list::{resolve_index, PlainList, LIST_TYPE},
    lstring::{self, lstring_type, new_lstring, Omit},
    numerics::{get_integer, get_usize, INT_TYPE},
    registry::{RegistryError, TypeRegistry},
    strings,
    value::Value,
};

pub(crate) fn register_types(types: &mut TypeRegistry) -> Result<(), RegistryError> {
    types.register("list", &LIST_TYPE)?;
    types.register("bigint", &INT_TYPE)?;
    lstring::register_types(types)?;
    types.register("lgen", &LGEN_TYPE)?;
    Ok(())
}

pub(crate) fn register(interp: &Interpreter) {
    interp.register_command("set", set);
    interp.register_command("proc", define_proc);
    interp.register_command("puts", puts);
    interp.register_command("error", error);
    interp.register_command("typeof", type_of);

    interp.register_command("list", list);
    interp.register_command("llength", llength);
    interp.register_command("lindex", lindex);
    interp.register_command("lrange", lrange);
    interp.register_command("lreplace", lreplace);
    interp.register_command("lreverse", lreverse);
    interp.register_command("lcontains", lcontains);
    interp.register_command("lset", lset);
    interp.register_command("ldelete", ldelete);
    interp.register_command("lappend", lappend);
    interp.register_command("string", string);

    interp.register_command("+", |_, args| arithmetic(args, 0, |a, b| a + b));
    interp.register_command("*", |_, args| arithmetic(args, 1, |a, b| a * b));
    interp.register_command("-", subtract);

    interp.register_command("lstring", lstring);
    interp.register_command("lgen", lgen);
}

fn check_arity(
    args: &[Value],
    min: usize,
    max: Option<usize>,
    usage: &str,
) -> Result<(), EvalError> {
    if args.len() < min || max.map(|max| args.len() > max).unwrap_or(false) {
        Err(EvalError::WrongArgs {
            usage: usage.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Indices are either given as separate arguments, or as a single argument
/// holding a list of indices
fn index_list(interp: &Interpreter, indices: &[Value]) -> Result<Vec<Value>, EvalError> {
    match indices {
        [single] => Ok(interp.list().all(single)?),
        indices => Ok(indices.to_vec()),
    }
}

fn set(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, Some(2), "set varName ?newValue?")?;
    let name = args[0].text();

    match args.get(1) {
        Some(value) => {
            interp.set_var(&name, value.clone());
            Ok(value.clone())
        }
        None => interp.var(&name),
    }
}

fn define_proc(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 3, Some(3), "proc name args body")?;

    let name = args[0].text().to_string();
    let params = interp
        .list()
        .all(&args[1])?
        .iter()
        .map(|param| param.text().to_string())
        .collect::<Vec<_>>();
    let body = args[2].text().to_string();

    let variadic = params.last().map(|last| last == "args").unwrap_or(false);
    let fixed = if variadic { params.len() - 1 } else { params.len() };
    let usage = std::iter::once(name.as_str())
        .chain(params.iter().map(|param| match param.as_str() {
            "args" if variadic => "?arg ...?",
            param => param,
        }))
        .collect::<Vec<_>>()
        .join(" ");

    interp.register_command(&name, move |interp, args| {
        if args.len() < fixed || (!variadic && args.len() > fixed) {
            return Err(EvalError::WrongArgs {
                usage: usage.clone(),
            });
        }

        let mut vars = params[..fixed]
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect::<Vec<_>>();
        if variadic {
            vars.push((
                "args".to_string(),
                PlainList::new_value(args[fixed..].to_vec()),
            ));
        }

        interp.with_frame(vars, |interp| interp.eval(&body))
    });

    Ok(Value::empty())
}

fn puts(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, Some(1), "puts string")?;
    interp.write_line(&args[0].text());
    Ok(Value::empty())
}

fn error(_: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, Some(1), "error message")?;
    Err(EvalError::Raised(args[0].text().to_string()))
}

/// The name of the value's native representation, without converting it
fn type_of(_: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, Some(1), "typeof value")?;
    let name = args[0].obj_type().map(|ty| ty.name().to_string());
    Ok(Value::from(name.unwrap_or_else(|| "string".to_string())))
}

fn list(_: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    Ok(PlainList::new_value(args.to_vec()))
}

fn llength(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, Some(1), "llength list")?;
    Ok(Value::from(interp.list().length(&args[0])?))
}

fn lindex(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, None, "lindex list ?index ...?")?;
    let protocol = interp.list();
    let indices = if args.len() == 1 {
        vec![]
    } else {
        index_list(interp, &args[1..])?
    };

    let mut current = args[0].clone();
    for index in &indices {
        let length = protocol.length(&current)?;
        let position = resolve_index(index, length as isize - 1)?;
        if position < 0 {
            return Ok(Value::empty());
        }

        current = match protocol.index(&current, position as usize)? {
            Some(element) => element,
            None => return Ok(Value::empty()),
        };
    }

    Ok(current)
}

fn lrange(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 3, Some(3), "lrange list first last")?;
    let protocol = interp.list();

    let end = protocol.length(&args[0])? as isize - 1;
    let first = resolve_index(&args[1], end)?.max(0);
    let last = resolve_index(&args[2], end)?.min(end);
    if last < first {
        return Ok(Value::empty());
    }

    Ok(protocol.range(&args[0], first as usize, last as usize)?)
}

fn lreplace(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 3, None, "lreplace list first last ?element ...?")?;
    let protocol = interp.list();

    let end = protocol.length_unchecked(&args[0])? as isize - 1;
    let first = resolve_index(&args[1], end)?.max(0);
    let last = resolve_index(&args[2], end)?.min(end);
    let count = last.saturating_sub(first).saturating_add(1);

    let mut list = args[0].duplicate();
    protocol.replace(&mut list, first, count, &args[3..])?;
    Ok(list)
}

fn lreverse(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, Some(1), "lreverse list")?;
    let mut list = args[0].duplicate();
    interp.list().reverse(&mut list)?;
    Ok(list)
}

fn lcontains(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 2, Some(2), "lcontains list element")?;
    Ok(Value::from(interp.list().contains(&args[0], &args[1])?))
}

/// Modify the list held in a variable.  The variable is emptied while the
/// list is modified, so an unshared list is changed in place.  The variable
/// keeps its old value if the modification fails.
fn modify_var(
    interp: &Interpreter,
    name: &str,
    default: Option<Value>,
    modify: impl FnOnce(&mut Value) -> Result<(), EvalError>,
) -> Result<Value, EvalError> {
    let mut list = match interp.take_var(name).or(default) {
        Some(list) => list,
        None => {
            return Err(EvalError::NoVariable {
                name: name.to_string(),
            })
        }
    };

    let result = modify(&mut list);
    interp.set_var(name, list.clone());
    result.map(|_| list)
}

fn lset(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 2, None, "lset listVar ?index ...? value")?;
    let name = args[0].text();
    let (value, indices) = match args[1..].split_last() {
        Some(split) => split,
        None => unreachable!("arity checked"),
    };
    let indices = if indices.is_empty() {
        vec![]
    } else {
        index_list(interp, indices)?
    };

    modify_var(interp, &name, None, |list| {
        Ok(interp.list().set_element(list, &indices, Some(value))?)
    })
}

fn ldelete(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 2, None, "ldelete listVar index ?index ...?")?;
    let name = args[0].text();
    let indices = index_list(interp, &args[1..])?;

    modify_var(interp, &name, None, |list| {
        Ok(interp.list().set_element(list, &indices, None)?)
    })
}

fn lappend(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, None, "lappend listVar ?value ...?")?;
    let name = args[0].text();

    modify_var(interp, &name, Some(Value::empty()), |list| {
        if list.is_shared() {
            *list = list.duplicate();
        }
        Ok(interp.list().append_list(list, &args[1..])?)
    })
}

fn string(_: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 2, None, "string subcommand string ?arg ...?")?;
    let subcommand = args[0].text();
    let value = &args[1];

    match &*subcommand {
        "length" => {
            check_arity(args, 2, Some(2), "string length string")?;
            Ok(Value::from(strings::length(value)))
        }
        "isempty" => {
            check_arity(args, 2, Some(2), "string isempty string")?;
            Ok(Value::from(strings::is_empty(value)))
        }
        "index" => {
            check_arity(args, 3, Some(3), "string index string charIndex")?;
            let end = strings::length(value) as isize - 1;
            let index = resolve_index(&args[2], end)?;
            if index < 0 {
                return Ok(Value::empty());
            }
            Ok(strings::index(value, index as usize)
                .map(Value::from)
                .unwrap_or_default())
        }
        "range" => {
            check_arity(args, 4, Some(4), "string range string first last")?;
            let end = strings::length(value) as isize - 1;
            let first = resolve_index(&args[2], end)?.max(0);
            let last = resolve_index(&args[3], end)?.min(end);
            if last < first {
                return Ok(Value::empty());
            }
            Ok(strings::range(value, first as usize, last as usize))
        }
        _ => Err(EvalError::BadOption {
            kind: "option",
            value: subcommand.to_string(),
            expected: "index, isempty, length or range".to_string(),
        }),
    }
}

fn arithmetic(
    args: &[Value],
    identity: i32,
    op: impl Fn(BigInt, BigInt) -> BigInt,
) -> Result<Value, EvalError> {
    let mut result = BigInt::from(identity);
    for arg in args {
        result = op(result, get_integer(arg)?);
    }
    Ok(Value::from(result))
}

fn subtract(_: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 1, None, "- value ?value ...?")?;
    let first = get_integer(&args[0])?;

    if args.len() == 1 {
        return Ok(Value::from(-first));
    }

    let mut result = first;
    for arg in &args[1..] {
        result -= get_integer(arg)?;
    }
    Ok(Value::from(result))
}

fn lstring(_: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    const USAGE: &str = "lstring ?-not proctype? ?--? string";
    let mut omit = None;
    let mut rest = args;

    loop {
        let option = match rest.first() {
            Some(option) if rest.len() > 1 => option.text(),
            _ => break,
        };

        match &*option {
            "-not" => {
                let name = rest[1].text();
                let found = Omit::from_name(&name).ok_or_else(|| EvalError::BadOption {
                    kind: "proctype",
                    value: name.to_string(),
                    expected: omit_choices(),
                })?;
                omit = Some(found);
                rest = &rest[2..];
            }
            "--" => {
                rest = &rest[1..];
                break;
            }
            _ => break,
        }
    }

    check_arity(rest, 1, Some(1), USAGE)?;
    Ok(new_lstring(lstring_type(omit), &rest[0].text()))
}

fn omit_choices() -> String {
    let (last, rest) = match Omit::NAMES.split_last() {
        Some(split) => split,
        None => return String::new(),
    };
    format!("{}, or {}", rest.join(", "), last)
}

fn lgen(interp: &Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    check_arity(args, 2, None, "lgen length command ?arg ...?")?;
    let length = get_usize(&args[0], "a list length")?;
    Ok(new_lgen(interp, length, &args[1..]))
}
