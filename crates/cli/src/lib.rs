//! CLI utilities for the NAP Finder Android tooling
//!
//! Provides shared CLI functionality:
//! - Status messages
//! - Aligned field output

#![warn(missing_docs)]

pub mod output;
