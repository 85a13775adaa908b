//! Configuration management
//!
//! This module provides the build configuration schema, TOML-based
//! loading, and validation. See [`BuildConfig`] for the recognized
//! keys.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{BuildConfig, UsageIndicator};
