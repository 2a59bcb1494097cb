//! Release signing resolution
//!
//! Decides, once per evaluation pass, whether a release signing identity is
//! available. Two policies exist:
//!
//! - [`SigningPolicy::Lenient`]: a missing `key.properties`, or one without a
//!   key alias, leaves the release build unsigned. When an alias is present
//!   the identity is built as is; other missing fields only fail when a
//!   consumer reads them.
//! - [`SigningPolicy::Strict`]: the file and all four fields must be present.
//!   The first missing item (in [`CredentialField::ALL`] order) aborts
//!   resolution with an error naming it. Both v1 and v2 signature schemes
//!   are switched on.
//!
//! Resolution is a pure function of the file contents, the key names and the
//! policy; running it twice over an unchanged file gives equal results.

use crate::keystore::{CredentialField, KeystoreCredentials, PropertyKeys};
use napfinder_core::error::{Error, ErrorCode};
use napfinder_core::properties::PropertiesError;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use napfinder_core::config::SigningPolicy;

/// Name of the Gradle signing config this identity stands for
pub const RELEASE_SIGNING_CONFIG: &str = "release";

/// Signing resolution errors
#[derive(Debug, Error)]
pub enum SigningError {
    /// Strict policy: the credentials file does not exist
    #[error("Keystore properties file not found: {}", .path.display())]
    PropertiesNotFound {
        /// Expected location of the file
        path: PathBuf,
    },

    /// A credential field was required but is absent
    #[error("Missing '{key}' ({}) in {}", .field.description(), .path.display())]
    MissingField {
        /// The absent field
        field: CredentialField,
        /// Property name that was looked up
        key: String,
        /// File that was searched
        path: PathBuf,
    },

    /// A consumer needed an identity but the release build is unsigned
    #[error("No release signing identity: {0}")]
    Unsigned(UnsignedReason),

    /// The credentials file exists but could not be read
    #[error(transparent)]
    Properties(#[from] PropertiesError),
}

impl From<SigningError> for Error {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::PropertiesNotFound { ref path } => {
                let suggestion = format!(
                    "Create {} with keyAlias, keyPassword, storeFile and storePassword entries",
                    path.display()
                );
                Error::signing(ErrorCode::KeystorePropertiesNotFound, err.to_string())
                    .with_suggestion(suggestion)
            }
            SigningError::MissingField { ref key, ref path, .. } => {
                let suggestion = format!("Add a '{}=' line to {}", key, path.display());
                Error::signing(ErrorCode::SigningFieldMissing, err.to_string())
                    .with_suggestion(suggestion)
            }
            SigningError::Unsigned(_) => Error::signing(ErrorCode::ReleaseUnsigned, err.to_string())
                .with_suggestion("Provide key.properties with at least a keyAlias entry"),
            SigningError::Properties(inner) => Error::from(inner),
        }
    }
}

/// Why a lenient resolution produced no identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsignedReason {
    /// The credentials file does not exist
    PropertiesAbsent,
    /// The file exists but has no key alias
    AliasAbsent,
}

impl fmt::Display for UnsignedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsignedReason::PropertiesAbsent => f.write_str("keystore properties file is absent"),
            UnsignedReason::AliasAbsent => f.write_str("keystore properties file has no key alias"),
        }
    }
}

/// A release signing identity
///
/// The alias is always present. Under the lenient policy the other fields
/// may be absent; their accessors then return [`SigningError::MissingField`].
#[derive(Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    source: PathBuf,
    keys: PropertyKeys,
    key_alias: String,
    key_password: Option<String>,
    store_file: Option<String>,
    store_password: Option<String>,
    v1_signing_enabled: bool,
    v2_signing_enabled: bool,
}

impl SigningIdentity {
    /// File the identity was read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Key alias; always present
    pub fn key_alias(&self) -> &str {
        &self.key_alias
    }

    /// Key password, or `MissingField` when absent
    pub fn key_password(&self) -> Result<&str, SigningError> {
        self.require(CredentialField::KeyPassword, self.key_password.as_deref())
    }

    /// Keystore path as written in the properties file
    pub fn store_file(&self) -> Result<&str, SigningError> {
        self.require(CredentialField::StoreFile, self.store_file.as_deref())
    }

    /// Keystore password, or `MissingField` when absent
    pub fn store_password(&self) -> Result<&str, SigningError> {
        self.require(CredentialField::StorePassword, self.store_password.as_deref())
    }

    /// Keystore location, resolved against the app module like Gradle's `file()`
    pub fn store_file_path(&self, app_dir: &Path) -> Result<PathBuf, SigningError> {
        Ok(app_dir.join(self.store_file()?))
    }

    /// JAR signing (v1) explicitly enabled
    pub fn v1_signing_enabled(&self) -> bool {
        self.v1_signing_enabled
    }

    /// APK Signature Scheme v2 explicitly enabled
    pub fn v2_signing_enabled(&self) -> bool {
        self.v2_signing_enabled
    }

    /// Fields that a consumer would fail on
    pub fn missing_fields(&self) -> Vec<CredentialField> {
        [
            (CredentialField::KeyPassword, self.key_password.is_none()),
            (CredentialField::StoreFile, self.store_file.is_none()),
            (CredentialField::StorePassword, self.store_password.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
    }

    fn require<'a>(&self, field: CredentialField, value: Option<&'a str>) -> Result<&'a str, SigningError> {
        value.ok_or_else(|| SigningError::MissingField {
            field,
            key: self.keys.key_for(field).to_string(),
            path: self.source.clone(),
        })
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("source", &self.source)
            .field("key_alias", &self.key_alias)
            .field("key_password", &self.key_password.as_ref().map(|_| "<redacted>"))
            .field("store_file", &self.store_file)
            .field("store_password", &self.store_password.as_ref().map(|_| "<redacted>"))
            .field("v1_signing_enabled", &self.v1_signing_enabled)
            .field("v2_signing_enabled", &self.v2_signing_enabled)
            .finish()
    }
}

impl Serialize for SigningIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SigningIdentity", 7)?;
        state.serialize_field("name", RELEASE_SIGNING_CONFIG)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("key_alias", &self.key_alias)?;
        state.serialize_field("store_file", &self.store_file)?;
        state.serialize_field("v1_signing_enabled", &self.v1_signing_enabled)?;
        state.serialize_field("v2_signing_enabled", &self.v2_signing_enabled)?;
        state.serialize_field("missing_fields", &self.missing_fields())?;
        state.end()
    }
}

/// Outcome of signing resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Release builds are signed with this identity
    Signed(SigningIdentity),
    /// Release builds are left unsigned (lenient policy only)
    Unsigned(UnsignedReason),
}

impl Resolution {
    /// Whether an identity was produced
    pub fn is_signed(&self) -> bool {
        matches!(self, Resolution::Signed(_))
    }

    /// Borrow the identity, if any
    pub fn identity(&self) -> Option<&SigningIdentity> {
        match self {
            Resolution::Signed(identity) => Some(identity),
            Resolution::Unsigned(_) => None,
        }
    }

    /// Take the identity, if any
    pub fn into_identity(self) -> Option<SigningIdentity> {
        match self {
            Resolution::Signed(identity) => Some(identity),
            Resolution::Unsigned(_) => None,
        }
    }

    /// The identity, or [`SigningError::Unsigned`] for consumers that need one
    pub fn require_identity(&self) -> Result<&SigningIdentity, SigningError> {
        match self {
            Resolution::Signed(identity) => Ok(identity),
            Resolution::Unsigned(reason) => Err(SigningError::Unsigned(*reason)),
        }
    }
}

/// Resolves the release signing identity from a properties file
#[derive(Debug, Clone)]
pub struct SigningConfigResolver {
    path: PathBuf,
    keys: PropertyKeys,
    policy: SigningPolicy,
}

impl SigningConfigResolver {
    /// Resolver for the file at `path`
    pub fn new(path: impl Into<PathBuf>, keys: PropertyKeys, policy: SigningPolicy) -> Self {
        Self {
            path: path.into(),
            keys,
            policy,
        }
    }

    /// Credentials file being read
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Policy applied by [`resolve`](Self::resolve)
    pub fn policy(&self) -> SigningPolicy {
        self.policy
    }

    /// Run one resolution pass
    pub fn resolve(&self) -> Result<Resolution, SigningError> {
        resolve(&self.path, &self.keys, self.policy)
    }
}

/// Resolve the release signing identity under `policy`
pub fn resolve(path: &Path, keys: &PropertyKeys, policy: SigningPolicy) -> Result<Resolution, SigningError> {
    debug!(path = %path.display(), %policy, "Resolving release signing");

    let credentials = KeystoreCredentials::load(path, keys)?;
    let resolution = match policy {
        SigningPolicy::Lenient => resolve_lenient(path, keys, credentials),
        SigningPolicy::Strict => resolve_strict(path, keys, credentials)?,
    };

    match &resolution {
        Resolution::Signed(identity) => {
            info!(alias = identity.key_alias(), %policy, "Release signing identity resolved");
        }
        Resolution::Unsigned(reason) => {
            warn!(%reason, "Release build will be unsigned");
        }
    }

    Ok(resolution)
}

fn resolve_lenient(path: &Path, keys: &PropertyKeys, credentials: Option<KeystoreCredentials>) -> Resolution {
    let Some(credentials) = credentials else {
        return Resolution::Unsigned(UnsignedReason::PropertiesAbsent);
    };
    let Some(key_alias) = credentials.key_alias else {
        return Resolution::Unsigned(UnsignedReason::AliasAbsent);
    };

    Resolution::Signed(SigningIdentity {
        source: path.to_path_buf(),
        keys: keys.clone(),
        key_alias,
        key_password: credentials.key_password,
        store_file: credentials.store_file,
        store_password: credentials.store_password,
        v1_signing_enabled: false,
        v2_signing_enabled: false,
    })
}

fn resolve_strict(
    path: &Path,
    keys: &PropertyKeys,
    credentials: Option<KeystoreCredentials>,
) -> Result<Resolution, SigningError> {
    let credentials = credentials.ok_or_else(|| SigningError::PropertiesNotFound {
        path: path.to_path_buf(),
    })?;

    if let Some(field) = credentials.first_missing() {
        return Err(SigningError::MissingField {
            field,
            key: keys.key_for(field).to_string(),
            path: path.to_path_buf(),
        });
    }

    let KeystoreCredentials {
        key_alias,
        key_password,
        store_file,
        store_password,
    } = credentials;

    Ok(Resolution::Signed(SigningIdentity {
        source: path.to_path_buf(),
        keys: keys.clone(),
        key_alias: key_alias.unwrap_or_default(),
        key_password,
        store_file,
        store_password,
        v1_signing_enabled: true,
        v2_signing_enabled: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = "storePassword=store-secret\nkeyPassword=key-secret\nkeyAlias=upload\nstoreFile=/keys/upload-keystore.jks\n";

    fn write_properties(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("key.properties");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn run(path: &Path, policy: SigningPolicy) -> Result<Resolution, SigningError> {
        SigningConfigResolver::new(path, PropertyKeys::default(), policy).resolve()
    }

    #[test]
    fn test_lenient_absent_file_is_unsigned() {
        let dir = TempDir::new().unwrap();
        let resolution = run(&dir.path().join("key.properties"), SigningPolicy::Lenient).unwrap();
        assert_eq!(resolution, Resolution::Unsigned(UnsignedReason::PropertiesAbsent));
        assert!(resolution.identity().is_none());
    }

    #[test]
    fn test_lenient_full_credentials() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, FULL);

        let resolution = run(&path, SigningPolicy::Lenient).unwrap();
        let identity = resolution.identity().unwrap();
        assert_eq!(identity.key_alias(), "upload");
        assert_eq!(identity.key_password().unwrap(), "key-secret");
        assert_eq!(identity.store_file().unwrap(), "/keys/upload-keystore.jks");
        assert_eq!(identity.store_password().unwrap(), "store-secret");
        assert!(identity.missing_fields().is_empty());
        assert!(!identity.v1_signing_enabled());
        assert!(!identity.v2_signing_enabled());
    }

    #[test]
    fn test_non_ascii_passwords_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.properties");
        std::fs::write(
            &path,
            b"keyAlias=upload\nkeyPassword=pw\\uD83D\\uDE00\nstorePassword=caf\xe9\nstoreFile=up.jks\n",
        )
        .unwrap();

        for policy in [SigningPolicy::Lenient, SigningPolicy::Strict] {
            let resolution = run(&path, policy).unwrap();
            let identity = resolution.identity().unwrap();
            assert_eq!(identity.key_password().unwrap(), "pw\u{1F600}");
            assert_eq!(identity.store_password().unwrap(), "caf\u{e9}");
        }
    }

    #[test]
    fn test_lenient_alias_absent_is_unsigned() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, "keyPassword=k\nstoreFile=up.jks\nstorePassword=s\n");

        let resolution = run(&path, SigningPolicy::Lenient).unwrap();
        assert_eq!(resolution, Resolution::Unsigned(UnsignedReason::AliasAbsent));
    }

    #[test]
    fn test_lenient_defers_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, "keyAlias=upload\nstoreFile=up.jks\n");

        let resolution = run(&path, SigningPolicy::Lenient).unwrap();
        let identity = resolution.identity().unwrap();
        assert_eq!(identity.store_file().unwrap(), "up.jks");
        assert_eq!(
            identity.missing_fields(),
            vec![CredentialField::KeyPassword, CredentialField::StorePassword]
        );

        let err = identity.store_password().unwrap_err();
        match err {
            SigningError::MissingField { field, key, .. } => {
                assert_eq!(field, CredentialField::StorePassword);
                assert_eq!(key, "storePassword");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_absent_file() {
        let dir = TempDir::new().unwrap();
        let err = run(&dir.path().join("key.properties"), SigningPolicy::Strict).unwrap_err();
        assert!(matches!(err, SigningError::PropertiesNotFound { .. }));
        assert!(err.to_string().contains("key.properties"));
    }

    #[test]
    fn test_strict_missing_store_password() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, "keyAlias=upload\nkeyPassword=k\nstoreFile=up.jks\n");

        let err = run(&path, SigningPolicy::Strict).unwrap_err();
        match &err {
            SigningError::MissingField { field, key, .. } => {
                assert_eq!(*field, CredentialField::StorePassword);
                assert_eq!(key, "storePassword");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("storePassword"));
    }

    #[test]
    fn test_strict_reports_each_field() {
        let dir = TempDir::new().unwrap();
        let lines = [
            ("keyAlias", "keyAlias=upload"),
            ("keyPassword", "keyPassword=k"),
            ("storeFile", "storeFile=up.jks"),
            ("storePassword", "storePassword=s"),
        ];

        for (skip, _) in &lines {
            let contents: Vec<&str> = lines
                .iter()
                .filter(|(key, _)| key != skip)
                .map(|(_, line)| *line)
                .collect();
            let path = write_properties(&dir, &contents.join("\n"));

            let err = run(&path, SigningPolicy::Strict).unwrap_err();
            match err {
                SigningError::MissingField { key, .. } => assert_eq!(key, *skip),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_strict_full_credentials_enable_schemes() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, FULL);

        let resolution = run(&path, SigningPolicy::Strict).unwrap();
        let identity = resolution.identity().unwrap();
        assert_eq!(identity.key_alias(), "upload");
        assert_eq!(identity.key_password().unwrap(), "key-secret");
        assert_eq!(identity.store_file().unwrap(), "/keys/upload-keystore.jks");
        assert_eq!(identity.store_password().unwrap(), "store-secret");
        assert!(identity.v1_signing_enabled());
        assert!(identity.v2_signing_enabled());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, FULL);

        for policy in [SigningPolicy::Lenient, SigningPolicy::Strict] {
            let first = run(&path, policy).unwrap();
            let second = run(&path, policy).unwrap();
            assert_eq!(first, second);
        }

        let missing = dir.path().join("absent.properties");
        assert_eq!(
            run(&missing, SigningPolicy::Lenient).unwrap(),
            run(&missing, SigningPolicy::Lenient).unwrap()
        );
        assert_eq!(
            run(&missing, SigningPolicy::Strict).unwrap_err().to_string(),
            run(&missing, SigningPolicy::Strict).unwrap_err().to_string()
        );
    }

    #[test]
    fn test_malformed_file_fails_both_policies() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, "keyAlias=\\uZZZZ\n");

        for policy in [SigningPolicy::Lenient, SigningPolicy::Strict] {
            let err = run(&path, policy).unwrap_err();
            assert!(matches!(err, SigningError::Properties(_)));
        }
    }

    #[test]
    fn test_store_file_path_relative_to_app_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, "keyAlias=a\nstoreFile=../keys/up.jks\n");
        let resolution = run(&path, SigningPolicy::Lenient).unwrap();

        let store = resolution
            .identity()
            .unwrap()
            .store_file_path(Path::new("/project/android/app"))
            .unwrap();
        assert_eq!(store, PathBuf::from("/project/android/app/../keys/up.jks"));
    }

    #[test]
    fn test_require_identity_on_unsigned() {
        let resolution = Resolution::Unsigned(UnsignedReason::AliasAbsent);
        let err = resolution.require_identity().unwrap_err();
        assert!(matches!(err, SigningError::Unsigned(UnsignedReason::AliasAbsent)));
    }

    #[test]
    fn test_serialized_identity_omits_passwords() {
        let dir = TempDir::new().unwrap();
        let path = write_properties(&dir, FULL);
        let resolution = run(&path, SigningPolicy::Strict).unwrap();

        let json = serde_json::to_string(resolution.identity().unwrap()).unwrap();
        assert!(json.contains("upload"));
        assert!(!json.contains("key-secret"));
        assert!(!json.contains("store-secret"));

        let debug = format!("{:?}", resolution);
        assert!(!debug.contains("key-secret"));
    }

    #[test]
    fn test_core_error_conversion() {
        let err: Error = SigningError::MissingField {
            field: CredentialField::StorePassword,
            key: "storePassword".to_string(),
            path: PathBuf::from("android/key.properties"),
        }
        .into();
        assert_eq!(err.code, ErrorCode::SigningFieldMissing);
        assert_eq!(err.exit_code(), napfinder_core::error::exit_codes::SIGNING_ERROR);
        assert!(err.suggestion.unwrap().contains("storePassword"));
    }
}
