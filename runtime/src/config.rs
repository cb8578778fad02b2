use std::{collections::HashMap, fmt, str::FromStr};

use thiserror::Error;

use crate::{list::W_LIST_FALLBACK, W_ALL};

/// Maximum nesting depth of command invocations, including generator element
/// evaluation
pub static RECURSION_LIMIT: Flag = Flag::new(ConfigurationCategory::Runtime, "recursion_limit")
    .string("1000")
    .help("Maximum depth of nested command invocations before evaluation fails");

/// Every flag known to the runtime
pub static FLAGS: &[&Flag] = &[&W_ALL, &W_LIST_FALLBACK, &RECURSION_LIMIT];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Unknown {category} option \"{name}\"")]
    UnknownFlag {
        category: ConfigurationCategory,
        name: String,
    },

    #[error("Option \"{name}\" expected {expected} but got \"{value}\"")]
    BadValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Unknown warning level \"{0}\", expected one of allow, warn or deny")]
    BadWarningLevel(String),
}

/// Global configuration options
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Configuration {
    options: HashMap<Flag, FlagKind>,
}

impl Configuration {
    /// Create the default configuration settings
    pub fn new() -> Self {
        Self {
            options: HashMap::new(),
        }
    }

    /// Get a boolean configuration option
    pub fn bool(&self, value: Flag) -> Option<bool> {
        self.options
            .get(&value)
            .and_then(|kind| match kind {
                FlagKind::Boolean(val) => Some(*val),
                _ => None,
            })
            .or(match value.default {
                StaticFlagKind::Boolean(default) => Some(default),
                _ => None,
            })
    }

    /// Get a string configuration option
    pub fn string(&self, value: Flag) -> Option<&str> {
        self.options
            .get(&value)
            .and_then(|kind| match kind {
                FlagKind::String(val) => Some(val.as_str()),
                _ => None,
            })
            .or(match value.default {
                StaticFlagKind::String(default) => Some(default),
                _ => None,
            })
    }

    /// Get a string option interpreted as a non-negative integer
    pub fn usize(&self, value: Flag) -> Result<usize, ConfigurationError> {
        let string = self.string(value).unwrap_or_default();
        string
            .trim()
            .parse()
            .map_err(|_| ConfigurationError::BadValue {
                name: value.name,
                expected: "a non-negative integer",
                value: string.to_string(),
            })
    }

    /// Gets a warning level flag value
    pub fn warning_level(&self, value: Flag) -> Option<WarningLevel> {
        self.options
            .get(&value)
            .and_then(|kind| match kind {
                FlagKind::WarningLevel(val) => Some(*val),
                _ => None,
            })
            .or(match value.default {
                StaticFlagKind::WarningLevel(default) => Some(default),
                _ => None,
            })
    }

    /// Sets a flag's boolean value.  String options become "true" or "false",
    /// warning levels become warn or allow.  Aliases set every flag they
    /// reference.
    pub fn set_bool(&mut self, flag: Flag, value: bool) {
        let string = if value { "true" } else { "false" };
        let warn = if value {
            WarningLevel::Warn
        } else {
            WarningLevel::Allow
        };

        self.generic_setter(flag, string.to_string(), value, warn);
    }

    /// Sets a flag's string value, boolean options are set to true and
    /// warning levels to warn.  Aliases set every flag they reference.
    pub fn set_string(&mut self, flag: Flag, value: String) {
        self.generic_setter(flag, value, true, WarningLevel::Warn);
    }

    /// Sets a flag's warning level value.  Boolean options are true unless the
    /// level is deny, string options get the level's name.
    pub fn set_warning_level(&mut self, flag: Flag, value: WarningLevel) {
        let bool = value != WarningLevel::Deny;
        self.generic_setter(flag, value.to_string(), bool, value)
    }

    /// Sets the value of a flag to the string, boolean or warning value
    /// depending on the flag's type.  Alias flags are expanded into their
    /// components, an alias that refers back to itself is only visited once.
    fn generic_setter(&mut self, flag: Flag, string: String, bool: bool, warning: WarningLevel) {
        let mut checked = vec![];
        let mut todo = vec![flag];

        while let Some(flag) = todo.pop() {
            if checked.contains(&flag) {
                continue;
            }
            checked.push(flag);

            let kind = match flag.default {
                StaticFlagKind::Alias(flags) => {
                    todo.extend(flags.iter().map(|flag| **flag));
                    continue;
                }
                StaticFlagKind::String(_) => FlagKind::String(string.clone()),
                StaticFlagKind::Boolean(_) => FlagKind::Boolean(bool),
                StaticFlagKind::WarningLevel(_) => FlagKind::WarningLevel(warning),
            };

            self.options.insert(flag, kind);
        }
    }

    /// Get all of the known flags, followed by any flags that were set on this
    /// configuration but are not in [`FLAGS`].
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        FLAGS
            .iter()
            .copied()
            .chain(self.options.keys().filter(|flag| !FLAGS.contains(flag)))
    }

    /// Find a flag from its category and name, so that a command line option
    /// can be passed to a setter or getter.  Dashes and underscores are
    /// treated as the same character.
    pub fn lookup(&self, category: ConfigurationCategory, name: &str) -> Result<Flag, ConfigurationError> {
        let name = name.replace('-', "_");
        self.iter()
            .find(|flag| flag.category == category && flag.name == name)
            .copied()
            .ok_or(ConfigurationError::UnknownFlag { category, name })
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

/// The type of a configuration option, options with different categories
/// can have the same name, so this is needed to differentiate between them
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum ConfigurationCategory {
    Warning,
    Runtime,
}

impl fmt::Display for ConfigurationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationCategory::Warning => write!(f, "warning"),
            ConfigurationCategory::Runtime => write!(f, "runtime"),
        }
    }
}

/// An optional configuration option that can be passed to the runtime
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Flag {
    category: ConfigurationCategory,
    name: &'static str,
    default: StaticFlagKind,
    help: &'static str,
}

impl Flag {
    /// Create a new configuration option
    pub const fn new(category: ConfigurationCategory, name: &'static str) -> Self {
        Self {
            category,
            name,
            default: StaticFlagKind::Boolean(false),
            help: "",
        }
    }

    /// Make an option set every option in `flags` when it is set.  It is not
    /// possible to get the value of an alias.
    pub const fn alias(self, flags: &'static [&'static Flag]) -> Self {
        Self {
            default: StaticFlagKind::Alias(flags),
            ..self
        }
    }

    /// Set an option to take a boolean value that has a default value
    pub const fn bool(self, value: bool) -> Self {
        Self {
            default: StaticFlagKind::Boolean(value),
            ..self
        }
    }

    /// Set an option to take a single string value
    pub const fn string(self, value: &'static str) -> Self {
        Self {
            default: StaticFlagKind::String(value),
            ..self
        }
    }

    /// Set an option to take a warning level
    pub const fn warning(self, value: WarningLevel) -> Self {
        Self {
            default: StaticFlagKind::WarningLevel(value),
            ..self
        }
    }

    /// Set the help text for a configuration option
    pub const fn help(self, help: &'static str) -> Self {
        Self { help, ..self }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn category(&self) -> ConfigurationCategory {
        self.category
    }

    pub fn help_text(&self) -> &'static str {
        self.help
    }
}

/// The type of data that can be received in an option
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
enum StaticFlagKind {
    Alias(&'static [&'static Flag]),
    String(&'static str),
    Boolean(bool),
    WarningLevel(WarningLevel),
}

/// The data stored inside a flag value
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
enum FlagKind {
    String(String),
    Boolean(bool),
    WarningLevel(WarningLevel),
}

/// The severity of an individual warning message
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub enum WarningLevel {
    Allow,
    Warn,
    Deny,
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningLevel::Allow => write!(f, "allow"),
            WarningLevel::Warn => write!(f, "warn"),
            WarningLevel::Deny => write!(f, "deny"),
        }
    }
}

impl FromStr for WarningLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_ascii_lowercase()[..] {
            "allow" => Ok(WarningLevel::Allow),
            "warn" => Ok(WarningLevel::Warn),
            "deny" => Ok(WarningLevel::Deny),
            _ => Err(ConfigurationError::BadWarningLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::new();
        assert_eq!(config.warning_level(W_LIST_FALLBACK), Some(WarningLevel::Allow));
        assert_eq!(config.usize(RECURSION_LIMIT), Ok(1000));
    }

    #[test]
    fn alias_sets_components() {
        let mut config = Configuration::new();
        config.set_warning_level(W_ALL, WarningLevel::Deny);
        assert_eq!(config.warning_level(W_LIST_FALLBACK), Some(WarningLevel::Deny));
        assert_eq!(config.warning_level(W_ALL), None);
    }

    #[test]
    fn lookup_accepts_dashes() {
        let config = Configuration::new();
        let flag = config
            .lookup(ConfigurationCategory::Warning, "list-fallback")
            .unwrap();
        assert_eq!(flag, W_LIST_FALLBACK);

        assert!(config
            .lookup(ConfigurationCategory::Runtime, "list_fallback")
            .is_err());
    }

    #[test]
    fn bad_recursion_limit() {
        let mut config = Configuration::new();
        config.set_string(RECURSION_LIMIT, "lots".to_string());
        assert!(matches!(
            config.usize(RECURSION_LIMIT),
            Err(ConfigurationError::BadValue { .. })
        ));
    }
}
