use anyhow::Result;

use runtime::{
    config::Configuration,
    interp::Interpreter,
    objtype::{Lifecycle, ObjType},
};

const LIFECYCLE: [(Lifecycle, &str); 4] = [
    (Lifecycle::Free, "free"),
    (Lifecycle::Dup, "dup"),
    (Lifecycle::UpdateString, "update string"),
    (Lifecycle::SetFromAny, "set from any"),
];

/// Print the registered value types, or the type whose key best matches
/// `input`
pub fn info(config: Configuration, input: Option<&str>) -> Result<()> {
    let interp = Interpreter::new(config)?;
    let types = interp.types().iter().collect::<Vec<_>>();

    let input = if let Some(input) = input {
        input
    } else {
        print_all_info(&types);
        return Ok(());
    };

    let input = input.to_lowercase();

    // search for exact key or descriptor name match
    for &(key, ty) in &types {
        if key == input || ty.name().to_lowercase() == input {
            print_info(key, ty);
            return Ok(());
        }
    }

    // try fuzzy string matching
    let matches = types
        .iter()
        .enumerate()
        .map(|(idx, (key, _))| (idx, strsim::normalized_damerau_levenshtein(key, &input)))
        .fold(
            // find the largest similarity
            (0, f64::NAN),
            |acc, (idx, sim)| {
                if sim > acc.1 || acc.1.is_nan() {
                    (idx, sim)
                } else {
                    acc
                }
            },
        );

    let (idx, sim) = matches;

    if sim < 0.25 || types.is_empty() {
        println!("Unable to find a matching type");
    } else {
        println!("Found type with {}% similarity", (sim * 100.0) as i32);
        let (key, ty) = types[idx];
        print_info(key, ty);
    }

    Ok(())
}

/// Print the callbacks and native operations of a single type
fn print_info(key: &str, ty: &ObjType) {
    println!("{} (type \"{}\", version {}):", key, ty.name(), ty.version());

    let callbacks = LIFECYCLE
        .iter()
        .filter(|(callback, _)| ty.has(*callback))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>();
    println!("    callbacks: {}", or_none(callbacks.join(", ")));
    println!("    native operations: {}", or_none(ty.capabilities().to_string()));
}

fn or_none(text: String) -> String {
    if text.is_empty() {
        String::from("none")
    } else {
        text
    }
}

/// Print the key of every registered type
fn print_all_info(types: &[(&str, &'static ObjType)]) {
    println!("Registered types:");

    for (key, ty) in types {
        println!("{} ({} native operations)", key, ty.capabilities().len());
    }
}
