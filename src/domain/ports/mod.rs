//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters must implement:
//! - `CommandRunner`: host command execution with captured output
//! - `HostContext`: host filesystem, identity, privilege, and probe access
//!
//! These traits keep the deployment services independent of the live host,
//! so the whole pipeline can run against in-memory fakes in tests.

pub mod command;
pub mod host;

pub use command::{CommandError, CommandOutcome, CommandRunner};
pub use host::{HostContext, HostError, HostIdentity};
