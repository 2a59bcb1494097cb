//! Android build configuration for NAP Finder
//!
//! This crate evaluates what the Gradle script of the Flutter app decides
//! at configuration time:
//! - Release signing resolution from `key.properties` (lenient or strict)
//! - SDK and version pass-through from Flutter
//! - `debug`/`release` variant assembly
//! - Gated Gradle builds and `apksigner` signing
//!
//! ```rust,no_run
//! use napfinder_android::project::AndroidProject;
//! use napfinder_android::signing::SigningPolicy;
//! use napfinder_core::config::ConfigSchema;
//!
//! let project = AndroidProject::new(".", ConfigSchema::default());
//! let config = project.evaluate(SigningPolicy::Strict)?;
//! assert!(config.variants.release.is_signed());
//! # Ok::<(), napfinder_core::Error>(())
//! ```

#![warn(missing_docs)]

pub mod apksigner;
pub mod flutter;
pub mod gradle;
pub mod keystore;
pub mod project;
pub mod signing;
pub mod variants;

pub use keystore::{CredentialField, KeystoreCredentials, PropertyKeys};
pub use project::{AndroidProject, BuildConfiguration};
pub use signing::{Resolution, SigningConfigResolver, SigningError, SigningIdentity, SigningPolicy};
pub use variants::{BuildType, BuildVariant, BuildVariants};
