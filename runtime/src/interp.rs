use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt, mem,
    rc::{Rc, Weak},
};

use lasso::{Rodeo, Spur};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    commands,
    config::{Configuration, ConfigurationError, RECURSION_LIMIT},
    list::{ListError, ListProtocol},
    numerics::NumericError,
    registry::{RegistryError, TypeRegistry},
    script::{parse_script, Command, ScriptError, Word, WordPart},
    value::{Value, ValueError},
};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{0}")]
    Script(#[from] ScriptError),

    #[error("{0}")]
    List(#[from] ListError),

    #[error("{0}")]
    Numeric(#[from] NumericError),

    #[error("{0}")]
    Value(#[from] ValueError),

    #[error("{0}")]
    Config(#[from] ConfigurationError),

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("invalid command name \"{name}\"")]
    UnknownCommand { name: String },

    #[error("wrong # args: should be \"{usage}\"")]
    WrongArgs { usage: String },

    #[error("can't read \"{name}\": no such variable")]
    NoVariable { name: String },

    #[error("bad {kind} \"{value}\": must be {expected}")]
    BadOption {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error("too many nested evaluations (infinite loop?)")]
    RecursionLimit,

    /// An error raised by a script
    #[error("{0}")]
    Raised(String),
}

/// The signature of a command implemented in Rust
pub type CommandFn = dyn Fn(&Interpreter, &[Value]) -> Result<Value, EvalError>;

pub struct NativeCommand {
    name: String,
    func: Box<CommandFn>,
}

impl fmt::Debug for NativeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<command {}>", self.name)
    }
}

/// Decrements the evaluation depth when a command returns
struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// Evaluates scripts.  Owns the command table, the variable frames and the
/// type registry.  Interpreters are always reference counted so that lazily
/// evaluated values can hold a weak reference back to the interpreter that
/// created them.
pub struct Interpreter {
    this: Weak<Interpreter>,
    config: Configuration,
    protocol: ListProtocol,
    types: TypeRegistry,
    recursion_limit: usize,
    depth: Cell<usize>,

    symbols: RefCell<Rodeo>,
    commands: RefCell<HashMap<Spur, Rc<NativeCommand>>>,
    frames: RefCell<Vec<HashMap<Spur, Value>>>,
    output: RefCell<String>,
}

impl Interpreter {
    /// Create an interpreter with the builtin commands and types
    pub fn new(config: Configuration) -> Result<Rc<Self>, EvalError> {
        let recursion_limit = config.usize(RECURSION_LIMIT)?;
        let protocol = ListProtocol::new(&config);

        let mut types = TypeRegistry::new();
        commands::register_types(&mut types)?;
        types.freeze();

        let interp = Rc::new_cyclic(|this| Interpreter {
            this: this.clone(),
            config,
            protocol,
            types,
            recursion_limit,
            depth: Cell::new(0),
            symbols: RefCell::new(Rodeo::new()),
            commands: RefCell::new(HashMap::new()),
            frames: RefCell::new(vec![HashMap::new()]),
            output: RefCell::new(String::new()),
        });

        commands::register(&interp);
        debug!(
            commands = interp.commands.borrow().len(),
            types = interp.types.len(),
            "interpreter created"
        );

        Ok(interp)
    }

    pub fn weak(&self) -> Weak<Interpreter> {
        self.this.clone()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn list(&self) -> &ListProtocol {
        &self.protocol
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    fn intern(&self, name: &str) -> Spur {
        self.symbols.borrow_mut().get_or_intern(name)
    }

    /// Add or replace a command
    pub fn register_command<F>(&self, name: &str, func: F)
    where
        F: Fn(&Interpreter, &[Value]) -> Result<Value, EvalError> + 'static,
    {
        let key = self.intern(name);
        let command = NativeCommand {
            name: name.to_string(),
            func: Box::new(func),
        };
        self.commands.borrow_mut().insert(key, Rc::new(command));
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    fn lookup(&self, name: &str) -> Option<Rc<NativeCommand>> {
        let key = self.symbols.borrow().get(name)?;
        self.commands.borrow().get(&key).cloned()
    }

    fn enter(&self) -> Result<DepthGuard<'_>, EvalError> {
        let depth = self.depth.get();
        if depth >= self.recursion_limit {
            return Err(EvalError::RecursionLimit);
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard(&self.depth))
    }

    /// Run the command named by the first word with the remaining words as
    /// its arguments
    pub fn invoke(&self, words: &[Value]) -> Result<Value, EvalError> {
        let (name, args) = match words.split_first() {
            Some(split) => split,
            None => return Ok(Value::empty()),
        };

        let name = name.text();
        let command = self
            .lookup(&name)
            .ok_or_else(|| EvalError::UnknownCommand {
                name: name.to_string(),
            })?;

        let _depth = self.enter()?;
        trace!(command = %name, args = args.len(), "invoke");
        (command.func)(self, args)
    }

    /// Parse and evaluate a script, giving the result of its last command
    pub fn eval(&self, script: &str) -> Result<Value, EvalError> {
        let commands = parse_script(script)?;
        self.eval_commands(&commands)
    }

    fn eval_commands(&self, commands: &[Command]) -> Result<Value, EvalError> {
        let mut result = Value::empty();

        for command in commands {
            let words = command
                .words
                .iter()
                .map(|word| self.substitute(word))
                .collect::<Result<Vec<_>, _>>()?;

            if !words.is_empty() {
                // release the previous result so variables it refers to can
                // be modified in place
                drop(mem::take(&mut result));
                result = self.invoke(&words)?;
            }
        }

        Ok(result)
    }

    /// A word made of a single variable or command keeps the resulting value
    /// as is, anything else is concatenated as text
    fn substitute(&self, word: &Word) -> Result<Value, EvalError> {
        match &word.parts[..] {
            [part] => self.substitute_part(part),
            parts => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&self.substitute_part(part)?.text());
                }
                Ok(Value::from(text))
            }
        }
    }

    fn substitute_part(&self, part: &WordPart) -> Result<Value, EvalError> {
        match part {
            WordPart::Literal(text) => Ok(Value::from(text.as_str())),
            WordPart::Variable(name) => self.var(name),
            WordPart::Command(commands) => self.eval_commands(commands),
        }
    }

    /// Read a variable from the innermost frame
    pub fn var(&self, name: &str) -> Result<Value, EvalError> {
        let key = self.intern(name);
        self.frames
            .borrow()
            .last()
            .and_then(|frame| frame.get(&key))
            .cloned()
            .ok_or_else(|| EvalError::NoVariable {
                name: name.to_string(),
            })
    }

    pub fn set_var(&self, name: &str, value: Value) {
        let key = self.intern(name);
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.insert(key, value);
        }
    }

    /// Remove a variable, giving its value to the caller so that it can be
    /// modified in place when nothing else refers to it
    pub fn take_var(&self, name: &str) -> Option<Value> {
        let key = self.intern(name);
        self.frames
            .borrow_mut()
            .last_mut()
            .and_then(|frame| frame.remove(&key))
    }

    /// Run `f` with a new innermost variable frame
    pub fn with_frame<T>(&self, vars: Vec<(String, Value)>, f: impl FnOnce(&Self) -> T) -> T {
        let frame = vars
            .into_iter()
            .map(|(name, value)| (self.intern(&name), value))
            .collect();
        self.frames.borrow_mut().push(frame);

        let result = f(self);

        self.frames.borrow_mut().pop();
        result
    }

    /// Append a line to the interpreter's output
    pub fn write_line(&self, line: &str) {
        let mut output = self.output.borrow_mut();
        output.push_str(line);
        output.push('\n');
    }

    /// Take everything written so far
    pub fn take_output(&self) -> String {
        mem::take(&mut *self.output.borrow_mut())
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .field("protocol", &self.protocol)
            .field("types", &self.types)
            .field("depth", &self.depth.get())
            .field("commands", &self.commands.borrow().len())
            .finish()
    }
}
