//! Tool configuration
//!
//! `.napfinder.toml` describes the Android project layout, SDK levels,
//! the signing policy and per-variant overrides.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
