//! Author identity resolution for new records.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};

use crate::logger::record::UNKNOWN_EMAIL;

/// Resolves the email recorded as the author of a change.
///
/// Implementations must not fail: anything that goes wrong yields
/// [`UNKNOWN_EMAIL`].
pub trait IdentityResolver {
    /// Best-effort author email.
    fn resolve(&self) -> String;
}

/// Reads `user.email` from git config, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct GitIdentity {
    program: String,
    timeout: Duration,
}

impl GitIdentity {
    /// Resolver running `<program> config user.email`.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn lookup(&self) -> Result<String, String> {
        let mut child = Command::new(&self.program)
            .args(["config", "user.email"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("failed to spawn {}: {e}", self.program))?;

        let pid = child.id();
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| "child stdout was not captured".to_string())?;

        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let mut out = String::new();
            let read = stdout.read_to_string(&mut out);
            let status = child.wait();
            let _ = tx.send((read.map(|_| out), status));
        });

        match rx.recv_timeout(self.timeout) {
            Ok((Ok(out), Ok(status))) if status.success() => Ok(out.trim().to_string()),
            Ok((Err(e), _) | (_, Err(e))) => Err(format!("failed to read identity: {e}")),
            Ok((Ok(_), Ok(status))) => Err(format!("{} exited with {status}", self.program)),
            Err(RecvTimeoutError::Timeout) => {
                kill_child(pid);
                Err(format!(
                    "{} did not answer within {}ms",
                    self.program,
                    self.timeout.as_millis()
                ))
            }
            Err(RecvTimeoutError::Disconnected) => Err("identity waiter vanished".to_string()),
        }
    }
}

impl IdentityResolver for GitIdentity {
    fn resolve(&self) -> String {
        match self.lookup() {
            Ok(email) if !email.is_empty() => {
                tracing::debug!(%email, "resolved author identity");
                email
            }
            Ok(_) => {
                tracing::warn!("git user.email is not configured, recording as unknown");
                UNKNOWN_EMAIL.to_string()
            }
            Err(details) => {
                tracing::warn!(%details, "identity lookup failed, recording as unknown");
                UNKNOWN_EMAIL.to_string()
            }
        }
    }
}

#[cfg(unix)]
fn kill_child(pid: u32) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    if let Ok(raw) = i32::try_from(pid) {
        let _ = kill(Pid::from_raw(raw), Signal::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_child(_pid: u32) {
    // The waiter thread is detached; the child exits with this process.
}

/// Resolver that always answers with the same email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentity(pub String);

impl FixedIdentity {
    /// Resolver answering `email`.
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }
}

impl IdentityResolver for FixedIdentity {
    fn resolve(&self) -> String {
        self.0.clone()
    }
}
