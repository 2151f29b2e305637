//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment: programmatic defaults,
//! YAML file loading, `GANTRY_*` environment overrides, and validation
//! into type-safe config structs.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
