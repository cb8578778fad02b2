use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info_span};

use crate::{config::Configuration, interp::Interpreter};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{path}: {message}")]
    Script { path: String, message: String },
}

/// A single source file unit description
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct SourceFile {
    pub path: Option<String>,
    pub content: String,
}

/// Evaluate each source in order in one interpreter, printing anything the
/// scripts output and the result of the last command of each source.
/// Evaluation stops at the first source that fails.
pub fn run(sources: Vec<SourceFile>, config: Configuration) -> Result<()> {
    let interp = Interpreter::new(config)?;

    for source in sources {
        let path = source.path.unwrap_or_else(|| String::from("unknown_file"));
        let _span = info_span!("source", path = %path).entered();

        let result = interp.eval(&source.content);
        print!("{}", interp.take_output());

        match result {
            Ok(value) => {
                let text = value.text();
                if !text.is_empty() {
                    println!("{}", text);
                }
                debug!("source finished");
            }
            Err(err) => {
                return Err(RunError::Script {
                    path,
                    message: err.to_string(),
                }
                .into())
            }
        }
    }

    Ok(())
}
