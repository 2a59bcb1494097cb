//! Flutter pass-through values
//!
//! The Flutter Gradle plugin writes the app version into
//! `android/local.properties` and supplies SDK levels; the build script
//! copies them straight into `defaultConfig`.

use napfinder_core::config::ConfigSchema;
use napfinder_core::error::{Error, Result};
use napfinder_core::properties::Properties;
use serde::Serialize;
use std::path::{Path, PathBuf};

const VERSION_CODE_KEY: &str = "flutter.versionCode";
const VERSION_NAME_KEY: &str = "flutter.versionName";
const SDK_KEY: &str = "flutter.sdk";

const DEFAULT_VERSION_CODE: u32 = 1;
const DEFAULT_VERSION_NAME: &str = "1.0";

/// Version information and SDK location from `local.properties`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlutterVersions {
    /// `flutter.versionCode`
    pub version_code: u32,
    /// `flutter.versionName`
    pub version_name: String,
    /// `flutter.sdk`, when the plugin has written it
    pub sdk_path: Option<PathBuf>,
}

impl Default for FlutterVersions {
    fn default() -> Self {
        Self {
            version_code: DEFAULT_VERSION_CODE,
            version_name: DEFAULT_VERSION_NAME.to_string(),
            sdk_path: None,
        }
    }
}

impl FlutterVersions {
    /// Read from `local.properties`; an absent file yields the plugin defaults
    pub fn load(path: &Path) -> Result<Self> {
        match Properties::load_optional(path)? {
            Some(props) => Self::from_properties(&props),
            None => Ok(Self::default()),
        }
    }

    /// Read the version keys, falling back to the plugin defaults
    pub fn from_properties(props: &Properties) -> Result<Self> {
        let version_code = match props.get(VERSION_CODE_KEY) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::invalid_config_value(VERSION_CODE_KEY, format!("'{}' is not a positive integer", raw))
                    .with_suggestion("Fix the build number in pubspec.yaml and run `flutter pub get`")
            })?,
            None => DEFAULT_VERSION_CODE,
        };

        let version_name = props
            .get(VERSION_NAME_KEY)
            .map_or_else(|| DEFAULT_VERSION_NAME.to_string(), str::to_string);

        Ok(Self {
            version_code,
            version_name,
            sdk_path: props.get(SDK_KEY).map(PathBuf::from),
        })
    }
}

/// Values shared by every build variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultConfig {
    /// Kotlin/Java namespace
    pub namespace: String,
    /// Base application id
    pub application_id: String,
    /// `compileSdk`
    pub compile_sdk: u32,
    /// `minSdk`
    pub min_sdk: u32,
    /// `targetSdk`
    pub target_sdk: u32,
    /// `ndkVersion`
    pub ndk_version: String,
    /// Java compatibility level and Kotlin JVM target
    pub java_version: u32,
    /// `versionCode` from Flutter
    pub version_code: u32,
    /// `versionName` from Flutter
    pub version_name: String,
}

impl DefaultConfig {
    /// Combine configured identifiers with the Flutter version values
    pub fn new(schema: &ConfigSchema, versions: &FlutterVersions) -> Self {
        Self {
            namespace: schema.android.namespace.clone(),
            application_id: schema.android.application_id.clone(),
            compile_sdk: schema.sdk.compile_sdk,
            min_sdk: schema.sdk.min_sdk,
            target_sdk: schema.sdk.target_sdk,
            ndk_version: schema.sdk.ndk_version.clone(),
            java_version: schema.sdk.java_version,
            version_code: versions.version_code,
            version_name: versions.version_name.clone(),
        }
    }
}
