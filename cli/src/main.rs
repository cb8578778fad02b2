use std::{
    fmt::{self, Display},
    fs,
    io::{self, Read},
};

use anyhow::Result;
use clap::{clap_app, crate_authors, crate_description, crate_version, ArgMatches};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use runtime::{
    config::{Configuration, ConfigurationCategory, ConfigurationError, WarningLevel, RECURSION_LIMIT},
    run,
    run::SourceFile,
};

mod info;

/// Errors encountered while interpreting the input arguments
#[derive(Debug, Error)]
enum InputError {
    #[error("Encountered errors while reading files:\n{files}")]
    FileError { files: IoErrorVec },

    #[error("Unknown warning \"{name}\"{hint}")]
    UnknownWarning { name: String, hint: Hint },

    #[error("Recursion limit must be a positive integer, got \"{0}\"")]
    BadLimit(String),
}

/// New type wrapper to provide display impl
#[derive(Debug)]
struct IoErrorVec(Vec<io::Error>);

impl Display for IoErrorVec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for err in &self.0 {
            writeln!(f, "{}", err)?;
        }

        Ok(())
    }
}

/// An optional "did you mean" suggestion
#[derive(Debug)]
struct Hint(Option<&'static str>);

impl Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(name) => write!(f, ", did you mean \"{}\"?", name),
            None => Ok(()),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        println!("Error:\n{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = clap_app!(abslist =>
        (version: crate_version!())
        (author: crate_authors!())
        (about: crate_description!())
        (@arg input: +multiple "Input files to run.  If not present uses stdin.")
        (@arg eval: -e --eval "Interpret the input as source code instead of file names")
        (@arg allow: -A --allow +takes_value +multiple "Allow a warning")
        (@arg warn: -W --warn +takes_value +multiple "Report a warning")
        (@arg deny: -D --deny +takes_value +multiple "Turn a warning into an error")
        (@arg limit: -L --("recursion-limit") +takes_value "Maximum depth of nested command invocations")
        (@subcommand info =>
            (about: "Print the registered value types and their capabilities")
            (@arg value: +takes_value +multiple "The type to describe"))
    )
    .get_matches();

    let config = configure(&matches)?;

    // print type information if requested
    if let Some(matches) = matches.subcommand_matches("info") {
        match matches.values_of("value") {
            Some(values) => {
                info::info(config, Some(&values.collect::<Vec<_>>().join(" ")))?;
            }
            None => info::info(config, None)?,
        }
        return Ok(());
    }

    let mut sources = vec![];

    // try to work out the meaning of the inputs
    if let Some(file_names) = matches.values_of("input") {
        // the input is source code
        if matches.is_present("eval") {
            sources.push(SourceFile {
                path: None,
                content: file_names.collect::<Vec<_>>().join(" "),
            });
        } else {
            // the input is file names

            // any file read errors
            let mut errors = vec![];

            for file in file_names {
                // file name "-" == read from stdin
                if file == "-" {
                    match get_stdin() {
                        Ok(input) => sources.push(input),
                        Err(err) => errors.push(err),
                    }
                } else {
                    match fs::read_to_string(file) {
                        Ok(input) => sources.push(SourceFile {
                            path: Some(file.to_string()),
                            content: input,
                        }),
                        Err(err) => errors.push(err),
                    }
                };
            }

            if !errors.is_empty() {
                return Err(InputError::FileError {
                    files: IoErrorVec(errors),
                }
                .into());
            }
        }
    } else {
        sources.push(get_stdin()?);
    }

    run::run(sources, config)?;

    Ok(())
}

/// Build the configuration from the command line.  Warning levels are
/// applied allow first and deny last, so the strictest level wins.
fn configure(matches: &ArgMatches) -> Result<Configuration, InputError> {
    let mut config = Configuration::new();

    let levels = [
        ("allow", WarningLevel::Allow),
        ("warn", WarningLevel::Warn),
        ("deny", WarningLevel::Deny),
    ];

    for (arg, level) in levels {
        for name in matches.values_of(arg).into_iter().flatten() {
            let flag = match config.lookup(ConfigurationCategory::Warning, name) {
                Ok(flag) => flag,
                Err(ConfigurationError::UnknownFlag { name, .. }) => {
                    let hint = Hint(suggest(&config, &name));
                    return Err(InputError::UnknownWarning { name, hint });
                }
                Err(_) => unreachable!("lookup only reports unknown flags"),
            };
            config.set_warning_level(flag, level);
        }
    }

    if let Some(limit) = matches.value_of("limit") {
        match limit.parse::<usize>() {
            Ok(value) if value > 0 => config.set_string(RECURSION_LIMIT, value.to_string()),
            _ => return Err(InputError::BadLimit(limit.to_string())),
        }
    }

    Ok(config)
}

/// The known warning closest to `name`, if any is close enough
fn suggest(config: &Configuration, name: &str) -> Option<&'static str> {
    config
        .iter()
        .filter(|flag| flag.category() == ConfigurationCategory::Warning)
        .map(|flag| (flag.name(), strsim::jaro_winkler(flag.name(), name)))
        .filter(|(_, similarity)| *similarity > 0.8)
        .fold(None, |best: Option<(&'static str, f64)>, candidate| match best {
            Some(best) if best.1 >= candidate.1 => Some(best),
            _ => Some(candidate),
        })
        .map(|(name, _)| name)
}

/// read source code from stdin
fn get_stdin() -> Result<SourceFile, io::Error> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(SourceFile {
        path: Some("stdin".to_string()),
        content: input,
    })
}
