//! CLI command implementations.

pub mod check;
pub mod deploy;
pub mod render;
