//! Core utilities for the NAP Finder Android tooling
//!
//! This crate provides shared functionality used by the Android crate and CLI:
//!
//! - **Error handling**: Coded errors with context, recovery suggestions and exit codes
//! - **Properties**: Reader for Gradle/Flutter `.properties` files
//! - **Configuration**: TOML-based configuration with validation
//! - **Process execution**: Running `gradlew` and `apksigner`
//!
//! # Example
//!
//! ```rust,no_run
//! use napfinder_core::properties::Properties;
//! use std::path::Path;
//!
//! let local = Properties::load_optional(Path::new("android/local.properties"))
//!     .expect("unreadable local.properties");
//! if let Some(props) = local {
//!     println!("Flutter SDK: {:?}", props.get("flutter.sdk"));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;
pub mod properties;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, SigningPolicy};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::properties::{Properties, PropertiesError};
}
