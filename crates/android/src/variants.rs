//! Build variant assembly
//!
//! Two build types exist. `debug` always gets an application id suffix and
//! its own display name. `release` gets the production name and whatever
//! signing identity the resolver produced. Neither shrinks code or
//! resources.

use crate::flutter::DefaultConfig;
use crate::signing::{Resolution, SigningIdentity};
use napfinder_core::config::VariantsConfig;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Gradle build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    /// Development build with its own application id
    Debug,
    /// Store build
    Release,
}

impl BuildType {
    /// Both build types, debug first
    pub const ALL: [BuildType; 2] = [BuildType::Debug, BuildType::Release];

    /// Lowercase name as used by Gradle and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "debug",
            BuildType::Release => "release",
        }
    }

    /// Capitalized form used in Gradle task names
    pub fn task_suffix(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            other => Err(format!("unknown build type '{}' (expected debug or release)", other)),
        }
    }
}

/// A fully configured build variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildVariant {
    /// Which build type this is
    pub build_type: BuildType,
    /// Application id, including any suffix
    pub application_id: String,
    /// `app_name` string resource
    pub app_name: String,
    /// Signing identity; `None` leaves the artifact unsigned
    pub signing: Option<SigningIdentity>,
    /// `isMinifyEnabled`
    pub minify_enabled: bool,
    /// `isShrinkResources`
    pub shrink_resources: bool,
}

impl BuildVariant {
    fn new(build_type: BuildType, defaults: &DefaultConfig, suffix: Option<&str>, app_name: &str) -> Self {
        let application_id = match suffix {
            Some(suffix) => format!("{}{}", defaults.application_id, suffix),
            None => defaults.application_id.clone(),
        };

        Self {
            build_type,
            application_id,
            app_name: app_name.to_string(),
            signing: None,
            minify_enabled: false,
            shrink_resources: false,
        }
    }

    /// Whether the variant carries a signing identity
    pub fn is_signed(&self) -> bool {
        self.signing.is_some()
    }
}

/// The `debug` and `release` variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildVariants {
    /// The `debug` variant
    pub debug: BuildVariant,
    /// The `release` variant
    pub release: BuildVariant,
}

impl BuildVariants {
    /// Variant for a build type
    pub fn get(&self, build_type: BuildType) -> &BuildVariant {
        match build_type {
            BuildType::Debug => &self.debug,
            BuildType::Release => &self.release,
        }
    }

    /// Both variants, debug first
    pub fn iter(&self) -> impl Iterator<Item = &BuildVariant> {
        [&self.debug, &self.release].into_iter()
    }
}

/// Assemble both variants, consuming the signing resolution.
///
/// A signed resolution is attached to `release`; an unsigned one (lenient
/// policy only) leaves it without a signing config.
pub fn assemble(defaults: &DefaultConfig, overrides: &VariantsConfig, resolution: Resolution) -> BuildVariants {
    let debug = BuildVariant::new(
        BuildType::Debug,
        defaults,
        Some(overrides.debug.application_id_suffix.as_str()),
        &overrides.debug.app_name,
    );

    let mut release = BuildVariant::new(
        BuildType::Release,
        defaults,
        overrides.release.application_id_suffix.as_deref(),
        &overrides.release.app_name,
    );
    release.signing = resolution.into_identity();

    BuildVariants { debug, release }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flutter::FlutterVersions;
    use crate::keystore::PropertyKeys;
    use crate::signing::{resolve, SigningPolicy, UnsignedReason};
    use napfinder_core::config::{ConfigSchema, DebugVariantConfig, ReleaseVariantConfig};
    use tempfile::TempDir;

    fn defaults() -> DefaultConfig {
        DefaultConfig::new(&ConfigSchema::default(), &FlutterVersions::default())
    }

    fn signed(policy: SigningPolicy) -> (TempDir, Resolution) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.properties");
        std::fs::write(
            &path,
            "keyAlias=upload\nkeyPassword=k\nstoreFile=up.jks\nstorePassword=s\n",
        )
        .unwrap();
        let resolution = resolve(&path, &PropertyKeys::default(), policy).unwrap();
        (dir, resolution)
    }

    #[test]
    fn test_unsigned_release() {
        let variants = assemble(
            &defaults(),
            &VariantsConfig::default(),
            Resolution::Unsigned(UnsignedReason::PropertiesAbsent),
        );

        assert!(!variants.release.is_signed());
        assert_eq!(variants.release.application_id, "com.example.training");
        assert_eq!(variants.release.app_name, "NAP Finder");
    }

    #[test]
    fn test_debug_variant_suffix_and_name() {
        let variants = assemble(
            &defaults(),
            &VariantsConfig::default(),
            Resolution::Unsigned(UnsignedReason::AliasAbsent),
        );

        assert_eq!(variants.debug.application_id, "com.example.training.debug");
        assert_eq!(variants.debug.app_name, "NAP Finder (Dev)");
        assert!(!variants.debug.is_signed());
    }

    #[test]
    fn test_signed_release_debug_untouched() {
        let unsigned = assemble(
            &defaults(),
            &VariantsConfig::default(),
            Resolution::Unsigned(UnsignedReason::PropertiesAbsent),
        );

        for policy in [SigningPolicy::Lenient, SigningPolicy::Strict] {
            let (_dir, resolution) = signed(policy);
            let variants = assemble(&defaults(), &VariantsConfig::default(), resolution);

            let identity = variants.release.signing.as_ref().unwrap();
            assert_eq!(identity.key_alias(), "upload");
            assert_eq!(identity.v1_signing_enabled(), policy == SigningPolicy::Strict);
            assert_eq!(variants.debug, unsigned.debug);
        }
    }

    #[test]
    fn test_shrinking_always_disabled() {
        let (_dir, resolution) = signed(SigningPolicy::Strict);
        let variants = assemble(&defaults(), &VariantsConfig::default(), resolution);

        for variant in variants.iter() {
            assert!(!variant.minify_enabled, "{} minifies", variant.build_type);
            assert!(!variant.shrink_resources, "{} shrinks resources", variant.build_type);
        }
    }

    #[test]
    fn test_custom_overrides() {
        let overrides = VariantsConfig {
            debug: DebugVariantConfig {
                application_id_suffix: ".dev".to_string(),
                app_name: "NAP Dev".to_string(),
            },
            release: ReleaseVariantConfig {
                application_id_suffix: None,
                app_name: "NAP".to_string(),
            },
        };

        let variants = assemble(&defaults(), &overrides, Resolution::Unsigned(UnsignedReason::PropertiesAbsent));
        assert_eq!(variants.get(BuildType::Debug).application_id, "com.example.training.dev");
        assert_eq!(variants.get(BuildType::Release).app_name, "NAP");
    }

    #[test]
    fn test_renaming_debug_keeps_suffix() {
        let mut overrides = VariantsConfig::default();
        overrides.debug.app_name = "NAP Finder (QA)".to_string();
        overrides.release.application_id_suffix = Some(".beta".to_string());

        let variants = assemble(&defaults(), &overrides, Resolution::Unsigned(UnsignedReason::PropertiesAbsent));
        assert_eq!(variants.debug.application_id, "com.example.training.debug");
        assert_eq!(variants.debug.app_name, "NAP Finder (QA)");
        assert_eq!(variants.release.application_id, "com.example.training.beta");
        assert_eq!(variants.release.app_name, "NAP Finder");
    }

    #[test]
    fn test_build_type_parse() {
        assert_eq!("Release".parse::<BuildType>(), Ok(BuildType::Release));
        assert_eq!("debug".parse::<BuildType>(), Ok(BuildType::Debug));
        assert!("profile".parse::<BuildType>().is_err());
        assert_eq!(BuildType::Release.task_suffix(), "Release");
    }
}
