//! Infrastructure layer module
//!
//! This module contains all infrastructure adapters and external integrations:
//! - Host adapters (command execution, filesystem, privileges, HTTP probes)
//! - Configuration management
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod host;
