//! Release keystore credentials
//!
//! `key.properties` carries four values: the key alias, the key password,
//! the keystore file and the keystore password. This module reads them
//! into a [`KeystoreCredentials`] record where every field may be absent;
//! the signing policy decides what absence means.

use crate::signing::SigningError;
use napfinder_core::config::SigningKeysConfig;
use napfinder_core::properties::Properties;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// One of the four credential fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    /// `keyAlias`
    KeyAlias,
    /// `keyPassword`
    KeyPassword,
    /// `storeFile`
    StoreFile,
    /// `storePassword`
    StorePassword,
}

impl CredentialField {
    /// Fixed order in which fields are checked
    pub const ALL: [CredentialField; 4] = [
        CredentialField::KeyAlias,
        CredentialField::KeyPassword,
        CredentialField::StoreFile,
        CredentialField::StorePassword,
    ];

    /// Human-readable description used in error messages
    pub fn description(&self) -> &'static str {
        match self {
            CredentialField::KeyAlias => "key alias",
            CredentialField::KeyPassword => "key password",
            CredentialField::StoreFile => "keystore file path",
            CredentialField::StorePassword => "keystore password",
        }
    }

    /// Whether the value must never be printed
    pub fn is_secret(&self) -> bool {
        matches!(self, CredentialField::KeyPassword | CredentialField::StorePassword)
    }
}

/// Property names under which each field is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKeys {
    /// Name of the key alias property
    pub key_alias: String,
    /// Name of the key password property
    pub key_password: String,
    /// Name of the store file property
    pub store_file: String,
    /// Name of the store password property
    pub store_password: String,
}

impl PropertyKeys {
    /// Property name for a field
    pub fn key_for(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::KeyAlias => &self.key_alias,
            CredentialField::KeyPassword => &self.key_password,
            CredentialField::StoreFile => &self.store_file,
            CredentialField::StorePassword => &self.store_password,
        }
    }
}

impl Default for PropertyKeys {
    fn default() -> Self {
        Self::from(&SigningKeysConfig::default())
    }
}

impl From<&SigningKeysConfig> for PropertyKeys {
    fn from(config: &SigningKeysConfig) -> Self {
        Self {
            key_alias: config.key_alias.clone(),
            key_password: config.key_password.clone(),
            store_file: config.store_file.clone(),
            store_password: config.store_password.clone(),
        }
    }
}

/// Credential values as found in the properties source
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeystoreCredentials {
    /// Key alias, if present
    pub key_alias: Option<String>,
    /// Key password, if present
    pub key_password: Option<String>,
    /// Keystore path as written, if present
    pub store_file: Option<String>,
    /// Keystore password, if present
    pub store_password: Option<String>,
}

impl fmt::Debug for KeystoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("KeystoreCredentials")
            .field("key_alias", &self.key_alias)
            .field("key_password", &redacted(&self.key_password))
            .field("store_file", &self.store_file)
            .field("store_password", &redacted(&self.store_password))
            .finish()
    }
}

impl KeystoreCredentials {
    /// Pick the four fields out of parsed properties
    pub fn from_properties(props: &Properties, keys: &PropertyKeys) -> Self {
        let take = |field| props.get(keys.key_for(field)).map(str::to_string);
        Self {
            key_alias: take(CredentialField::KeyAlias),
            key_password: take(CredentialField::KeyPassword),
            store_file: take(CredentialField::StoreFile),
            store_password: take(CredentialField::StorePassword),
        }
    }

    /// Read credentials from `path`. Returns `None` when the file does not exist.
    pub fn load(path: &Path, keys: &PropertyKeys) -> Result<Option<Self>, SigningError> {
        let props = Properties::load_optional(path)?;
        Ok(props.map(|p| Self::from_properties(&p, keys)))
    }

    /// Value of a field, if present
    pub fn get(&self, field: CredentialField) -> Option<&str> {
        match field {
            CredentialField::KeyAlias => self.key_alias.as_deref(),
            CredentialField::KeyPassword => self.key_password.as_deref(),
            CredentialField::StoreFile => self.store_file.as_deref(),
            CredentialField::StorePassword => self.store_password.as_deref(),
        }
    }

    /// First absent field in check order
    pub fn first_missing(&self) -> Option<CredentialField> {
        CredentialField::ALL
            .into_iter()
            .find(|field| self.get(*field).is_none())
    }

    /// Whether all four fields are present
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_properties_default_keys() {
        let props = Properties::parse("keyAlias=upload\nkeyPassword=k\nstoreFile=up.jks\nstorePassword=s").unwrap();
        let creds = KeystoreCredentials::from_properties(&props, &PropertyKeys::default());

        assert_eq!(creds.get(CredentialField::KeyAlias), Some("upload"));
        assert_eq!(creds.get(CredentialField::StoreFile), Some("up.jks"));
        assert!(creds.is_complete());
    }

    #[test]
    fn test_from_properties_custom_keys() {
        let keys = PropertyKeys {
            key_alias: "alias".to_string(),
            ..PropertyKeys::default()
        };
        let props = Properties::parse("alias=upload\nkeyAlias=ignored").unwrap();
        let creds = KeystoreCredentials::from_properties(&props, &keys);
        assert_eq!(creds.key_alias.as_deref(), Some("upload"));
    }

    #[test]
    fn test_first_missing_follows_check_order() {
        let creds = KeystoreCredentials {
            key_alias: Some("upload".to_string()),
            store_file: Some("up.jks".to_string()),
            ..KeystoreCredentials::default()
        };
        assert_eq!(creds.first_missing(), Some(CredentialField::KeyPassword));

        let empty = KeystoreCredentials::default();
        assert_eq!(empty.first_missing(), Some(CredentialField::KeyAlias));
    }

    #[test]
    fn test_load_absent_file() {
        let dir = TempDir::new().unwrap();
        let loaded = KeystoreCredentials::load(&dir.path().join("key.properties"), &PropertyKeys::default()).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let creds = KeystoreCredentials {
            key_alias: Some("upload".to_string()),
            key_password: Some("hunter2".to_string()),
            store_file: None,
            store_password: Some("hunter3".to_string()),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("upload"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("hunter3"));
    }

    #[test]
    fn test_secret_fields() {
        assert!(CredentialField::KeyPassword.is_secret());
        assert!(CredentialField::StorePassword.is_secret());
        assert!(!CredentialField::StoreFile.is_secret());
    }
}
