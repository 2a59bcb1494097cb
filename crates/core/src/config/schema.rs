//! Configuration schema definitions
//!
//! Defaults mirror the NAP Finder Android build script, so a project
//! without a `.napfinder.toml` behaves exactly like the shipped Gradle file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigSchema {
    /// `[general]`
    #[serde(default)]
    pub general: GeneralConfig,

    /// `[android]`
    #[serde(default)]
    pub android: AndroidConfig,

    /// `[sdk]`
    #[serde(default)]
    pub sdk: SdkConfig,

    /// `[signing]`
    #[serde(default)]
    pub signing: SigningConfig,

    /// `[variants.*]`
    #[serde(default)]
    pub variants: VariantsConfig,
}

/// General project configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Project name shown in report headers
    #[serde(default = "default_project_name")]
    pub project_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
        }
    }
}

fn default_project_name() -> String {
    "NAP Finder".to_string()
}

/// Android project layout and identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AndroidConfig {
    /// Gradle root project, relative to the Flutter project
    #[serde(default = "default_project_dir")]
    pub project_dir: String,

    /// Application module inside the Gradle root project
    #[serde(default = "default_app_module")]
    pub app_module: String,

    /// Kotlin/Java namespace
    #[serde(default = "default_application_id")]
    pub namespace: String,

    /// Base application id
    #[serde(default = "default_application_id")]
    pub application_id: String,

    /// Flutter-generated properties file, relative to the Gradle root
    #[serde(default = "default_local_properties")]
    pub local_properties: String,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            app_module: default_app_module(),
            namespace: default_application_id(),
            application_id: default_application_id(),
            local_properties: default_local_properties(),
        }
    }
}

fn default_project_dir() -> String {
    "android".to_string()
}

fn default_app_module() -> String {
    "app".to_string()
}

fn default_application_id() -> String {
    "com.example.training".to_string()
}

fn default_local_properties() -> String {
    "local.properties".to_string()
}

/// SDK levels passed through from the Flutter Gradle plugin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SdkConfig {
    /// `compileSdk`
    #[serde(default = "default_compile_sdk")]
    pub compile_sdk: u32,

    /// `minSdk`
    #[serde(default = "default_min_sdk")]
    pub min_sdk: u32,

    /// `targetSdk`
    #[serde(default = "default_target_sdk")]
    pub target_sdk: u32,

    /// `ndkVersion`
    #[serde(default = "default_ndk_version")]
    pub ndk_version: String,

    /// Java source/target compatibility and Kotlin JVM target
    #[serde(default = "default_java_version")]
    pub java_version: u32,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            compile_sdk: default_compile_sdk(),
            min_sdk: default_min_sdk(),
            target_sdk: default_target_sdk(),
            ndk_version: default_ndk_version(),
            java_version: default_java_version(),
        }
    }
}

fn default_compile_sdk() -> u32 {
    35
}

fn default_min_sdk() -> u32 {
    21
}

fn default_target_sdk() -> u32 {
    35
}

fn default_ndk_version() -> String {
    "26.3.11579264".to_string()
}

fn default_java_version() -> u32 {
    17
}

/// How missing release credentials are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningPolicy {
    /// Missing credentials leave the release build unsigned
    #[default]
    Lenient,
    /// Any missing credential halts build configuration
    Strict,
}

impl SigningPolicy {
    /// Lowercase name as used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningPolicy::Lenient => "lenient",
            SigningPolicy::Strict => "strict",
        }
    }
}

impl fmt::Display for SigningPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(SigningPolicy::Lenient),
            "strict" => Ok(SigningPolicy::Strict),
            other => Err(format!("unknown signing policy '{}' (expected lenient or strict)", other)),
        }
    }
}

/// Release signing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SigningConfig {
    /// Policy used when `--policy` is not given
    #[serde(default)]
    pub policy: SigningPolicy,

    /// Credentials file, relative to the Gradle root project
    #[serde(default = "default_properties_file")]
    pub properties_file: String,

    /// `[signing.keys]`
    #[serde(default)]
    pub keys: SigningKeysConfig,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            policy: SigningPolicy::default(),
            properties_file: default_properties_file(),
            keys: SigningKeysConfig::default(),
        }
    }
}

fn default_properties_file() -> String {
    "key.properties".to_string()
}

/// Property names looked up in the credentials file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SigningKeysConfig {
    /// Property holding the key alias
    #[serde(default = "default_key_alias")]
    pub key_alias: String,

    /// Property holding the key password
    #[serde(default = "default_key_password")]
    pub key_password: String,

    /// Property holding the keystore path
    #[serde(default = "default_store_file")]
    pub store_file: String,

    /// Property holding the keystore password
    #[serde(default = "default_store_password")]
    pub store_password: String,
}

impl Default for SigningKeysConfig {
    fn default() -> Self {
        Self {
            key_alias: default_key_alias(),
            key_password: default_key_password(),
            store_file: default_store_file(),
            store_password: default_store_password(),
        }
    }
}

fn default_key_alias() -> String {
    "keyAlias".to_string()
}

fn default_key_password() -> String {
    "keyPassword".to_string()
}

fn default_store_file() -> String {
    "storeFile".to_string()
}

fn default_store_password() -> String {
    "storePassword".to_string()
}

/// Per build type overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VariantsConfig {
    /// `[variants.debug]`
    #[serde(default)]
    pub debug: DebugVariantConfig,

    /// `[variants.release]`
    #[serde(default)]
    pub release: ReleaseVariantConfig,
}

/// Overrides for the `debug` build type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugVariantConfig {
    /// Appended to the base application id; must not be empty
    #[serde(default = "default_debug_suffix")]
    pub application_id_suffix: String,

    /// Value of the `app_name` string resource
    #[serde(default = "default_debug_app_name")]
    pub app_name: String,
}

impl Default for DebugVariantConfig {
    fn default() -> Self {
        Self {
            application_id_suffix: default_debug_suffix(),
            app_name: default_debug_app_name(),
        }
    }
}

fn default_debug_suffix() -> String {
    ".debug".to_string()
}

fn default_debug_app_name() -> String {
    "NAP Finder (Dev)".to_string()
}

/// Overrides for the `release` build type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseVariantConfig {
    /// Appended to the base application id
    #[serde(default)]
    pub application_id_suffix: Option<String>,

    /// Value of the `app_name` string resource
    #[serde(default = "default_release_app_name")]
    pub app_name: String,
}

impl Default for ReleaseVariantConfig {
    fn default() -> Self {
        Self {
            application_id_suffix: None,
            app_name: default_release_app_name(),
        }
    }
}

fn default_release_app_name() -> String {
    "NAP Finder".to_string()
}
