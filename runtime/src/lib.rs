pub mod commands;
pub mod config;
pub mod interface;
pub mod interp;
pub mod lgen;
pub mod list;
pub mod lstring;
pub mod numerics;
pub mod objtype;
pub mod registry;
pub mod run;
pub mod script;
pub mod strings;
pub mod value;

use config::{ConfigurationCategory, Flag};

static WARNINGS: [&Flag; 1] = [&list::W_LIST_FALLBACK];

/// Sets the level of every warning at once
pub static W_ALL: Flag = Flag::new(ConfigurationCategory::Warning, "all")
    .alias(&WARNINGS)
    .help("Set the level of every warning");
