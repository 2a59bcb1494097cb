//! Android project layout and the build-configuration evaluation pass

use crate::flutter::{DefaultConfig, FlutterVersions};
use crate::keystore::PropertyKeys;
use crate::signing::{Resolution, SigningConfigResolver, SigningError, SigningPolicy};
use crate::variants::{self, BuildVariants};
use napfinder_core::config::ConfigSchema;
use napfinder_core::error::{Error, Result, ResultExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A Flutter project's Android side, located from the Flutter project root
#[derive(Debug, Clone)]
pub struct AndroidProject {
    root: PathBuf,
    schema: ConfigSchema,
}

/// Result of one evaluation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfiguration {
    /// Policy the pass ran under
    pub policy: SigningPolicy,
    /// Values shared by both variants
    pub default_config: DefaultConfig,
    /// Assembled `debug` and `release` variants
    pub variants: BuildVariants,
    /// Flutter SDK location from `local.properties`
    pub flutter_sdk: Option<PathBuf>,
}

impl AndroidProject {
    /// Project rooted at the Flutter project directory
    pub fn new(root: impl Into<PathBuf>, schema: ConfigSchema) -> Self {
        Self {
            root: root.into(),
            schema,
        }
    }

    /// Flutter project directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded tool configuration
    pub fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    /// Gradle root project (`android/`)
    pub fn android_dir(&self) -> PathBuf {
        self.root.join(&self.schema.android.project_dir)
    }

    /// Application module (`android/app/`); relative `storeFile` values resolve here
    pub fn app_dir(&self) -> PathBuf {
        self.android_dir().join(&self.schema.android.app_module)
    }

    /// `key.properties` inside the Gradle root project
    pub fn key_properties_path(&self) -> PathBuf {
        self.android_dir().join(&self.schema.signing.properties_file)
    }

    /// Flutter-generated `local.properties`
    pub fn local_properties_path(&self) -> PathBuf {
        self.android_dir().join(&self.schema.android.local_properties)
    }

    /// Property names used for credential lookup
    pub fn property_keys(&self) -> PropertyKeys {
        PropertyKeys::from(&self.schema.signing.keys)
    }

    /// Policy to use when the caller does not override it
    pub fn default_policy(&self) -> SigningPolicy {
        self.schema.signing.policy
    }

    /// Resolver for the configured credentials file
    pub fn resolver(&self, policy: SigningPolicy) -> SigningConfigResolver {
        SigningConfigResolver::new(self.key_properties_path(), self.property_keys(), policy)
    }

    /// Resolve the release signing identity under `policy`
    pub fn resolve_signing(&self, policy: SigningPolicy) -> std::result::Result<Resolution, SigningError> {
        self.resolver(policy).resolve()
    }

    /// Run one evaluation pass: resolve signing, then assemble the variants.
    ///
    /// Strict signing failures are returned before any variant is built.
    pub fn evaluate(&self, policy: SigningPolicy) -> Result<BuildConfiguration> {
        debug!(root = %self.root.display(), %policy, "Evaluating build configuration");

        let resolution = self
            .resolve_signing(policy)
            .map_err(Error::from)
            .context("While resolving release signing")?;

        let versions = FlutterVersions::load(&self.local_properties_path())
            .context(format!("While reading {}", self.local_properties_path().display()))?;
        let default_config = DefaultConfig::new(&self.schema, &versions);
        let variants = variants::assemble(&default_config, &self.schema.variants, resolution);

        info!(
            application_id = %default_config.application_id,
            version = %default_config.version_name,
            release_signed = variants.release.is_signed(),
            "Build configuration evaluated"
        );

        Ok(BuildConfiguration {
            policy,
            default_config,
            variants,
            flutter_sdk: versions.sdk_path,
        })
    }
}
