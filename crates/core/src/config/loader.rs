//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed settings, defaults filled in
    pub schema: ConfigSchema,
    /// File the settings came from, if any
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an explicit path, or search `root` for one.
    ///
    /// An explicit path that does not exist is an error; finding nothing
    /// during the search falls back to defaults.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        let config_path = match explicit {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(root),
        };

        let schema = match &config_path {
            Some(p) => {
                debug!(path = %p.display(), "Loading configuration");
                load_config_file(p)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                ConfigSchema::default()
            }
        };

        let config = Self {
            schema,
            path: config_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        let sdk = &self.schema.sdk;
        if sdk.min_sdk > sdk.target_sdk {
            return Err(Error::invalid_config_value(
                "sdk.min_sdk",
                format!("{} is above target_sdk {}", sdk.min_sdk, sdk.target_sdk),
            ));
        }
        if sdk.target_sdk > sdk.compile_sdk {
            return Err(Error::invalid_config_value(
                "sdk.target_sdk",
                format!("{} is above compile_sdk {}", sdk.target_sdk, sdk.compile_sdk),
            ));
        }

        let keys = &self.schema.signing.keys;
        let names = [
            ("signing.keys.key_alias", &keys.key_alias),
            ("signing.keys.key_password", &keys.key_password),
            ("signing.keys.store_file", &keys.store_file),
            ("signing.keys.store_password", &keys.store_password),
        ];
        for (i, (field, name)) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::invalid_config_value(field, "property name is empty"));
            }
            if names[..i].iter().any(|(_, other)| other == name) {
                return Err(Error::invalid_config_value(
                    field,
                    format!("property name '{}' is used twice", name),
                ));
            }
        }

        if self.schema.android.application_id.trim().is_empty() {
            return Err(Error::invalid_config_value("android.application_id", "must not be empty"));
        }

        if self.schema.variants.debug.application_id_suffix.trim().is_empty() {
            return Err(Error::invalid_config_value(
                "variants.debug.application_id_suffix",
                "debug builds need a suffix to install beside release",
            ));
        }

        Ok(())
    }
}

/// Find configuration file in standard locations
fn find_config_file(root: &Path) -> Option<PathBuf> {
    let candidates = [".napfinder.toml", "napfinder.toml", ".config/napfinder.toml"];

    candidates
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|path| path.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}: {}", path.display(), e))
            .with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}: {}", path.display(), e),
        )
        .with_source(e)
    })
}
