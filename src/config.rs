//! Help layout settings with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/flagparse/flagparse.toml`
//! 3. Explicit config file passed by the program
//! 4. Environment variables: `FLAGPARSE_*` prefix (`FLAGPARSE_HELP__WIDTH=100`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SettingsError;

/// Help output layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HelpSettings {
    /// Display width in columns
    pub width: usize,
    /// Column cap for help text
    pub max_help_position: usize,
    pub indent_increment: usize,
    /// Append `[default: ...]` to argument help
    pub show_defaults: bool,
}

impl Default for HelpSettings {
    fn default() -> Self {
        Self {
            width: 140,
            max_help_position: 48,
            indent_increment: 2,
            show_defaults: true,
        }
    }
}

/// Raw help settings for layering (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawHelpSettings {
    pub width: Option<usize>,
    pub max_help_position: Option<usize>,
    pub indent_increment: Option<usize>,
    pub show_defaults: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub help: RawHelpSettings,
}

impl HelpSettings {
    /// Overlay wins where it specifies a value.
    pub fn merge(&self, overlay: &RawHelpSettings) -> Self {
        Self {
            width: overlay.width.unwrap_or(self.width),
            max_help_position: overlay.max_help_position.unwrap_or(self.max_help_position),
            indent_increment: overlay.indent_increment.unwrap_or(self.indent_increment),
            show_defaults: overlay.show_defaults.unwrap_or(self.show_defaults),
        }
    }
}

/// Unified configuration for flagparse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub help: HelpSettings,
}

/// Get the XDG config directory for flagparse.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flagparse").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("flagparse.toml"))
}

/// Unset keys are `None`; set but malformed keys are errors.
fn env_value<T>(value: Result<T, ConfigError>) -> Result<Option<T>, SettingsError> {
    match value {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Settings {
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            help: self.help.merge(&overlay.help),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `file` - Optional program-specific config file; must exist if given
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files, or malformed `FLAGPARSE_*` values.
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global settings");
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Explicit file
        if let Some(path) = file {
            debug!(path = %path.display(), "loading settings");
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 4. Environment variables
        Self::apply_env_overrides(current)
    }

    /// Apply FLAGPARSE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("FLAGPARSE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        if let Some(val) = env_value(config.get::<usize>("help.width"))? {
            settings.help.width = val;
        }
        if let Some(val) = env_value(config.get::<usize>("help.max_help_position"))? {
            settings.help.max_help_position = val;
        }
        if let Some(val) = env_value(config.get::<usize>("help.indent_increment"))? {
            settings.help.indent_increment = val;
        }
        if let Some(val) = env_value(config.get_bool("help.show_defaults"))? {
            settings.help.show_defaults = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Serialization failure.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# flagparse configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/flagparse/flagparse.toml
#   File:   passed explicitly by the program
#   Env:    FLAGPARSE_* environment variables (FLAGPARSE_HELP__WIDTH=100)

[help]
# Display width of help output
# width = 140

# Help text never starts right of this column
# max_help_position = 48

# Indentation step of nested help sections
# indent_increment = 2

# Show default values next to argument help
# show_defaults = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_overlay_when_merging_then_keeps_base() {
        let base = HelpSettings::default();

        let merged = base.merge(&RawHelpSettings::default());

        assert_eq!(merged, base);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_overlay_wins_where_set() {
        let base = HelpSettings::default();
        let overlay = RawHelpSettings {
            width: Some(80),
            show_defaults: Some(false),
            ..RawHelpSettings::default()
        };

        let merged = base.merge(&overlay);

        assert_eq!(merged.width, 80);
        assert!(!merged.show_defaults);
        assert_eq!(merged.max_help_position, 48);
        assert_eq!(merged.indent_increment, 2);
    }

    #[test]
    fn given_env_lookup_when_key_unset_then_none_else_error_propagates() {
        assert_eq!(env_value(Ok(72usize)).unwrap(), Some(72));
        assert_eq!(
            env_value::<usize>(Err(ConfigError::NotFound("help.width".into()))).unwrap(),
            None
        );
        assert!(matches!(
            env_value::<usize>(Err(ConfigError::Message("invalid digit".into()))),
            Err(SettingsError::Config(_))
        ));
    }

    #[test]
    fn given_template_when_parsed_then_yields_defaults() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();

        let settings = Settings::default().merge_with(&raw);

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn given_settings_when_rendered_then_round_trips_through_toml() {
        let rendered = Settings::default().to_toml().unwrap();

        assert!(rendered.contains("[help]"));
        assert!(rendered.contains("width = 140"));
    }
}
