//! Error types, one enum per concern.
//!
//! - [`ConfigurationError`]: a command tree was declared wrongly (construction time)
//! - [`DispatchError`]: argument vector did not resolve to a handler (parse time)
//! - [`SettingsError`]: help layout settings could not be loaded

use std::path::PathBuf;

use thiserror::Error;

/// Declaration errors. These are never caught by the library: the constructor
/// returns them and program startup is expected to abort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{owner} is missing required attribute '{attribute}'")]
    MissingAttribute {
        attribute: &'static str,
        owner: String,
    },

    #[error("attribute '{attribute}' of {owner} must be {expected}")]
    MismatchedAttribute {
        attribute: &'static str,
        owner: String,
        expected: &'static str,
    },

    #[error("argument of '{command}' declares no names")]
    EmptyArgumentNames { command: String },

    #[error("argument {names:?} of '{command}' mixes positional and flag names")]
    MixedArgumentNames {
        command: String,
        names: Vec<String>,
    },

    #[error("invalid flag '{flag}' in '{command}'")]
    InvalidFlag { command: String, flag: String },

    #[error("positional argument '{name}' of '{command}' cannot use a flag-only action")]
    PositionalAction { command: String, name: String },

    #[error("duplicate argument '{dest}' in '{command}'")]
    DuplicateArgument { command: String, dest: String },

    #[error("conflicting option string '{flag}' in '{command}'")]
    DuplicateFlag { command: String, flag: String },

    #[error("positional argument '{name}' of '{command}' cannot follow '{before}'")]
    PositionalOrder {
        command: String,
        name: String,
        before: String,
    },

    #[error("duplicate sub-command '{name}' under '{parent}'")]
    DuplicateCommand { parent: String, name: String },
}

/// Result type for command tree construction.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Failure to turn an argument vector into a resolved namespace.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{0}")]
    Parse(#[from] clap::Error),

    #[error("cannot read parsed value: {0}")]
    Matches(#[from] clap::parser::MatchesError),
}

/// Settings loading errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
