//! Domain layer for the Gantry deployment system
//!
//! This module contains core business logic and domain models.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DeployError, DeployResult};
