#![expect(clippy::print_stdout, reason = "Child stdout is forwarded verbatim")]
#![expect(clippy::print_stderr, reason = "Child stderr is forwarded verbatim")]

//! Child process supervision.
//!
//! Each child runs in its own process group so that termination reaches
//! anything it forks (`npm` wrappers, shells). Output lines are re-emitted
//! with a `[name]` prefix and are never inspected.

use std::process::ExitStatus;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::infra::config::CommandLine;

pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const FORWARDER_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Failed to spawn {name} ({program}): {source}")]
    Spawn {
        name: String,
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid command for {name}: {message}")]
    InvalidCommand { name: String, message: String },
    #[error("Failed to poll {name}: {source}")]
    Wait {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Signal handler setup failed: {0}")]
    SignalSetup(String),
}

/// What to run and how it is named in forwarded output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSpec {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    /// Applied over the inherited environment; later entries win.
    pub env: Vec<(String, String)>,
}

impl ChildSpec {
    pub fn new(name: impl Into<String>, command: &CommandLine) -> Self {
        Self {
            name: name.into(),
            program: command.program.clone(),
            args: command.args.clone(),
            env: Vec::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// A child that has exited while the supervisor still owned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildExit {
    pub name: String,
    pub status: ExitStatus,
}

struct ManagedChild {
    name: String,
    pid: Option<u32>,
    child: Child,
    forwarders: Vec<JoinHandle<()>>,
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Owns the spawned children. [`ProcessSupervisor::shutdown`] must run on
/// every exit path; `kill_on_drop` covers a supervisor dropped without it.
pub struct ProcessSupervisor {
    children: Vec<ManagedChild>,
}

impl ProcessSupervisor {
    /// Spawns `specs` in order. If one fails, the ones already running are
    /// shut down before the error is returned.
    pub async fn start(
        specs: impl IntoIterator<Item = ChildSpec>,
    ) -> Result<Self, SupervisorError> {
        let mut supervisor = Self {
            children: Vec::new(),
        };
        for spec in specs {
            match spawn_child(&spec) {
                Ok(child) => supervisor.children.push(child),
                Err(err) => {
                    supervisor.shutdown().await;
                    return Err(err);
                }
            }
        }
        Ok(supervisor)
    }

    pub fn names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name.as_str()).collect()
    }

    /// Resolves when any owned child exits. Never resolves once the
    /// supervisor has been shut down.
    pub async fn wait_any_exit(&mut self) -> Result<ChildExit, SupervisorError> {
        if self.children.is_empty() {
            return std::future::pending().await;
        }
        loop {
            for managed in &mut self.children {
                let status = managed
                    .child
                    .try_wait()
                    .map_err(|e| SupervisorError::Wait {
                        name: managed.name.clone(),
                        source: e,
                    })?;
                if let Some(status) = status {
                    return Ok(ChildExit {
                        name: managed.name.clone(),
                        status,
                    });
                }
            }
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        }
    }

    /// Sends SIGTERM to every child and waits at most [`SHUTDOWN_GRACE`].
    /// Returns as soon as all of them are reaped; any still running at the
    /// deadline get SIGKILL. Later calls return immediately.
    pub async fn shutdown(&mut self) {
        let children = std::mem::take(&mut self.children);
        if children.is_empty() {
            return;
        }

        for managed in &children {
            managed.terminate();
        }

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        for managed in children {
            managed.reap(deadline).await;
        }
    }
}

impl ManagedChild {
    fn terminate(&self) {
        #[cfg(unix)]
        if let Some(pid) = self.pid {
            signal_group(&self.name, pid, libc::SIGTERM);
        }
        #[cfg(not(unix))]
        debug!(child = %self.name, "Graceful termination unsupported; will force-kill");
    }

    async fn reap(mut self, deadline: Instant) {
        match tokio::time::timeout_at(deadline, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(child = %self.name, status = %status, "Child exited");
            }
            Ok(Err(err)) => {
                warn!(child = %self.name, error = %err, "Failed to wait for child");
            }
            Err(_) => {
                info!(
                    child = %self.name,
                    grace_ms = SHUTDOWN_GRACE.as_millis(),
                    "Child ignored SIGTERM; killing"
                );
                #[cfg(unix)]
                if let Some(pid) = self.pid {
                    signal_group(&self.name, pid, libc::SIGKILL);
                }
                if let Err(err) = self.child.kill().await {
                    debug!(child = %self.name, error = %err, "Kill after grace period failed");
                }
            }
        }

        for mut forwarder in self.forwarders {
            if tokio::time::timeout(FORWARDER_DRAIN_TIMEOUT, &mut forwarder)
                .await
                .is_err()
            {
                forwarder.abort();
            }
        }
    }
}

fn spawn_child(spec: &ChildSpec) -> Result<ManagedChild, SupervisorError> {
    if spec.program.trim().is_empty() {
        return Err(SupervisorError::InvalidCommand {
            name: spec.name.clone(),
            message: "program is empty".to_string(),
        });
    }

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|e| SupervisorError::Spawn {
        name: spec.name.clone(),
        program: spec.program.clone(),
        source: e,
    })?;
    let pid = child.id();
    info!(child = %spec.name, pid = ?pid, program = %spec.program, "Spawned child");

    let mut forwarders = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        forwarders.push(forward_lines(spec.name.clone(), stdout, Stream::Stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        forwarders.push(forward_lines(spec.name.clone(), stderr, Stream::Stderr));
    }

    Ok(ManagedChild {
        name: spec.name.clone(),
        pid,
        child,
        forwarders,
    })
}

fn forward_lines<R>(name: String, reader: R, stream: Stream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    match stream {
                        Stream::Stdout => println!("[{name}] {line}"),
                        Stream::Stderr => eprintln!("[{name}] {line}"),
                    }
                }
                Err(err) => {
                    debug!(child = %name, error = %err, "Output stream closed");
                    break;
                }
            }
        }
    })
}

#[cfg(unix)]
fn signal_group(name: &str, pid: u32, signal: libc::c_int) {
    let pid_t: libc::pid_t = match pid.try_into() {
        Ok(pid_t) => pid_t,
        Err(_) => return,
    };
    // SAFETY: negative pid targets the process group created at spawn.
    let rc = unsafe { libc::kill(-pid_t, signal) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            debug!(
                child = %name,
                pid,
                signal,
                error = %err,
                "Failed to signal process group"
            );
        }
    }
}
