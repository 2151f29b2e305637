//! In-memory host fakes for tests.
//!
//! `ScriptedRunner` answers commands from a script instead of spawning
//! processes; `FakeHost` keeps "installed" files in memory and journals
//! privilege transitions so tests can assert acquire/release pairing.
//! Both are compiled into the crate (not test-gated) so integration
//! tests can drive the full pipeline against them.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::models::artifact::RenderedArtifact;
use crate::domain::ports::command::{CommandError, CommandOutcome, CommandRunner};
use crate::domain::ports::host::{HostContext, HostError, HostIdentity};

/// One command observed by the scripted runner.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The full argument vector
    pub argv: Vec<String>,
    /// Whether it was requested with elevated privileges
    pub privileged: bool,
}

impl RecordedCall {
    /// The argv joined with spaces, for prefix matching in assertions.
    pub fn line(&self) -> String {
        self.argv.join(" ")
    }
}

/// `CommandRunner` that replays scripted outcomes and records calls.
///
/// Matching is by command-line prefix on the space-joined argv. One-shot
/// failures are consumed in order before persistent responses; anything
/// unmatched succeeds with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    one_shot: Mutex<Vec<(String, CommandOutcome)>>,
    persistent: Mutex<HashMap<String, CommandOutcome>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persistently answer commands starting with `prefix`.
    pub fn respond(&self, prefix: &str, status: i32, stdout: &str) {
        self.persistent.lock().unwrap().insert(
            prefix.to_string(),
            CommandOutcome {
                status,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
    }

    /// Fail the next command starting with `prefix`; later matches fall
    /// through to persistent responses or the default success.
    pub fn fail_once(&self, prefix: &str, status: i32, stderr: &str) {
        self.one_shot
            .lock()
            .unwrap()
            .push((prefix.to_string(), CommandOutcome::failed(status, stderr)));
    }

    /// Persistently fail commands starting with `prefix`.
    pub fn fail_always(&self, prefix: &str, status: i32, stderr: &str) {
        self.persistent
            .lock()
            .unwrap()
            .insert(prefix.to_string(), CommandOutcome::failed(status, stderr));
    }

    /// Every command seen so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// How many observed command lines start with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.line().starts_with(prefix))
            .count()
    }

    fn outcome_for(&self, line: &str) -> CommandOutcome {
        let mut one_shot = self.one_shot.lock().unwrap();
        if let Some(pos) = one_shot.iter().position(|(prefix, _)| line.starts_with(prefix)) {
            return one_shot.remove(pos).1;
        }
        drop(one_shot);

        let persistent = self.persistent.lock().unwrap();
        // Longest prefix wins so specific scripts shadow broad ones.
        persistent
            .iter()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or_else(|| CommandOutcome::ok(""), |(_, outcome)| outcome.clone())
    }

    fn record_and_answer(&self, argv: &[&str], privileged: bool) -> CommandOutcome {
        let call = RecordedCall {
            argv: argv.iter().map(ToString::to_string).collect(),
            privileged,
        };
        let line = call.line();
        self.calls.lock().unwrap().push(call);
        self.outcome_for(&line)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, argv: &[&str]) -> Result<CommandOutcome, CommandError> {
        if argv.is_empty() {
            return Err(CommandError::EmptyCommand);
        }
        Ok(self.record_and_answer(argv, false))
    }

    async fn run_privileged(&self, argv: &[&str]) -> Result<CommandOutcome, CommandError> {
        if argv.is_empty() {
            return Err(CommandError::EmptyCommand);
        }
        Ok(self.record_and_answer(argv, true))
    }
}

/// Privilege session transition recorded by `FakeHost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeEvent {
    Begin,
    End,
}

/// In-memory `HostContext`.
///
/// Mutations require an open privileged session, exactly like the live
/// host; a write without one fails with `PrivilegeUnavailable`, which
/// keeps the services honest about session scoping.
pub struct FakeHost {
    dirs: Mutex<Vec<PathBuf>>,
    files: Mutex<Vec<PathBuf>>,
    installs: Mutex<Vec<RenderedArtifact>>,
    symlinks: Mutex<Vec<(PathBuf, PathBuf)>>,
    privilege_events: Mutex<Vec<PrivilegeEvent>>,
    session_open: AtomicBool,
    deny_privilege: AtomicBool,
    identity: Mutex<HostIdentity>,
    address: Mutex<String>,
    fail_install_on: Mutex<Option<PathBuf>>,
    probe_queue: Mutex<VecDeque<u16>>,
    probe_default: AtomicU16,
    probed_urls: Mutex<Vec<String>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            dirs: Mutex::new(Vec::new()),
            files: Mutex::new(Vec::new()),
            installs: Mutex::new(Vec::new()),
            symlinks: Mutex::new(Vec::new()),
            privilege_events: Mutex::new(Vec::new()),
            session_open: AtomicBool::new(false),
            deny_privilege: AtomicBool::new(false),
            identity: Mutex::new(HostIdentity::new("deploy", "deploy")),
            address: Mutex::new("10.0.0.5".to_string()),
            fail_install_on: Mutex::new(None),
            probe_queue: Mutex::new(VecDeque::new()),
            probe_default: AtomicU16::new(200),
            probed_urls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing directory.
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.dirs.lock().unwrap().push(path.into());
    }

    /// Register an existing file.
    pub fn add_file(&self, path: impl Into<PathBuf>) {
        self.files.lock().unwrap().push(path.into());
    }

    /// Make `begin_privileged` fail, as when sudo is unavailable.
    pub fn deny_privilege(&self) {
        self.deny_privilege.store(true, Ordering::SeqCst);
    }

    /// Make installing to the given destination fail.
    pub fn fail_install_on(&self, path: impl Into<PathBuf>) {
        *self.fail_install_on.lock().unwrap() = Some(path.into());
    }

    /// Override the identity returned by `resolve_identity`.
    pub fn set_identity(&self, user: &str, group: &str) {
        *self.identity.lock().unwrap() = HostIdentity::new(user, group);
    }

    /// Override the address returned by `resolve_address`.
    pub fn set_address(&self, address: &str) {
        *self.address.lock().unwrap() = address.to_string();
    }

    /// Queue a one-shot probe status; the queue drains in order.
    pub fn queue_probe(&self, status: u16) {
        self.probe_queue.lock().unwrap().push_back(status);
    }

    /// Status returned once the probe queue is empty (default 200).
    pub fn set_probe_default(&self, status: u16) {
        self.probe_default.store(status, Ordering::SeqCst);
    }

    /// Every artifact installed, in order (re-installs appear twice).
    pub fn installs(&self) -> Vec<RenderedArtifact> {
        self.installs.lock().unwrap().clone()
    }

    /// Final content at a destination, if anything was installed there.
    pub fn installed_content(&self, path: &Path) -> Option<String> {
        self.installs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|a| a.destination == path)
            .map(|a| a.content.clone())
    }

    /// Symlinks created, as (target, link) pairs.
    pub fn symlinks(&self) -> Vec<(PathBuf, PathBuf)> {
        self.symlinks.lock().unwrap().clone()
    }

    /// All privilege transitions, in order.
    pub fn privilege_events(&self) -> Vec<PrivilegeEvent> {
        self.privilege_events.lock().unwrap().clone()
    }

    /// True when every opened session was closed and none was closed
    /// before being opened.
    pub fn privilege_balanced(&self) -> bool {
        let mut depth: i32 = 0;
        for event in self.privilege_events.lock().unwrap().iter() {
            match event {
                PrivilegeEvent::Begin => depth += 1,
                PrivilegeEvent::End => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
            }
        }
        depth == 0
    }

    /// URLs probed so far.
    pub fn probed_urls(&self) -> Vec<String> {
        self.probed_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostContext for FakeHost {
    async fn path_exists(&self, path: &Path) -> bool {
        self.dir_exists(path).await
            || self.files.lock().unwrap().iter().any(|p| p == path)
            || self.installs.lock().unwrap().iter().any(|a| a.destination == path)
            || self.symlinks.lock().unwrap().iter().any(|(_, link)| link == path)
    }

    async fn dir_exists(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().iter().any(|p| p == path)
    }

    async fn resolve_identity(&self) -> Result<HostIdentity, HostError> {
        Ok(self.identity.lock().unwrap().clone())
    }

    async fn resolve_address(&self) -> String {
        self.address.lock().unwrap().clone()
    }

    async fn begin_privileged(&self) -> Result<(), HostError> {
        if self.deny_privilege.load(Ordering::SeqCst) {
            return Err(HostError::PrivilegeUnavailable(
                "sudo: a password is required".to_string(),
            ));
        }
        self.privilege_events.lock().unwrap().push(PrivilegeEvent::Begin);
        self.session_open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn end_privileged(&self) {
        self.privilege_events.lock().unwrap().push(PrivilegeEvent::End);
        self.session_open.store(false, Ordering::SeqCst);
    }

    async fn install_file(&self, artifact: &RenderedArtifact) -> Result<(), HostError> {
        if !self.session_open.load(Ordering::SeqCst) {
            return Err(HostError::PrivilegeUnavailable(
                "no privileged session open".to_string(),
            ));
        }

        if self.fail_install_on.lock().unwrap().as_deref() == Some(artifact.destination.as_path()) {
            return Err(HostError::FileInstall {
                path: artifact.destination.display().to_string(),
                reason: "injected write failure".to_string(),
            });
        }

        self.installs.lock().unwrap().push(artifact.clone());
        Ok(())
    }

    async fn ensure_symlink(&self, target: &Path, link: &Path) -> Result<(), HostError> {
        if self.path_exists(link).await {
            return Ok(());
        }
        if !self.session_open.load(Ordering::SeqCst) {
            return Err(HostError::PrivilegeUnavailable(
                "no privileged session open".to_string(),
            ));
        }
        self.symlinks
            .lock()
            .unwrap()
            .push((target.to_path_buf(), link.to_path_buf()));
        Ok(())
    }

    async fn http_probe(&self, url: &str) -> Result<u16, HostError> {
        self.probed_urls.lock().unwrap().push(url.to_string());
        let queued = self.probe_queue.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| self.probe_default.load(Ordering::SeqCst)))
    }
}
