//! Host adapters implementing the command and host-context ports.
//!
//! - `LiveRunner` / `LiveHost`: the real machine, through tokio processes,
//!   sudo, and reqwest.
//! - `ScriptedRunner` / `FakeHost`: in-memory doubles for tests.

pub mod fake;
pub mod live;
pub mod runner;

pub use fake::{FakeHost, ScriptedRunner};
pub use live::LiveHost;
pub use runner::LiveRunner;
