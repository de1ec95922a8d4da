//! Container runtime capability trait.
//!
//! This trait is the narrow seam between the core lifecycle/chaos logic
//! and the container runtime daemon: pull/build an image, create/start/
//! stop/remove a container, inspect its state, stream its output. The
//! core never sees the daemon's wire protocol, so it is testable against
//! a fake runtime without a live daemon.
//!
//! # Implementations
//!
//! - [`DockerRuntime`]: Docker daemon via `bollard`
//!
//! [`DockerRuntime`]: crate::docker::DockerRuntime

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

// =============================================================================
// Container Configuration
// =============================================================================

/// Bind-mount access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Read-only mount.
    ReadOnly,
    /// Read-write mount.
    ReadWrite,
}

impl std::fmt::Display for BindMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "ro"),
            Self::ReadWrite => write!(f, "rw"),
        }
    }
}

/// A host path mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind {
    /// Path on the host.
    pub host_path: String,
    /// Path inside the container.
    pub container_path: String,
    /// Access mode.
    pub mode: BindMode,
}

impl Bind {
    /// Renders the bind in `host:container:mode` form.
    pub fn render(&self) -> String {
        format!("{}:{}:{}", self.host_path, self.container_path, self.mode)
    }
}

/// Desired configuration for a container, as handed to the runtime.
///
/// Accumulated by [`ContainerSpec`] and applied in one `create` call;
/// the runtime never sees a partially configured container.
///
/// [`ContainerSpec`]: crate::container::ContainerSpec
#[derive(Debug, Clone, Default)]
pub struct ContainerConfig {
    /// Local image reference to run.
    pub image: String,
    /// Command (entrypoint arguments).
    pub command: Vec<String>,
    /// Environment variables.
    pub env: Vec<(String, String)>,
    /// Bind mounts.
    pub binds: Vec<Bind>,
    /// Run with elevated privileges.
    pub privileged: bool,
    /// Remove the container automatically once it exits.
    pub auto_remove: bool,
    /// Explicit container name (daemon-assigned if absent).
    pub name: Option<String>,
}

// =============================================================================
// Runtime State
// =============================================================================

/// Last known runtime state of a container, from daemon inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeState {
    /// Container ID.
    pub id: String,
    /// True if the main process is still running.
    pub running: bool,
    /// Exit code, once the main process has exited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    /// Daemon status string (e.g. "running", "exited").
    pub status: String,
    /// Container IP address on the default network, if attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl RuntimeState {
    /// Returns true if the container has exited with a non-zero code.
    pub fn exited_with_error(&self) -> bool {
        !self.running && matches!(self.exit_code, Some(code) if code != 0)
    }
}

// =============================================================================
// Log Frames
// =============================================================================

/// Origin stream of a log frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Stdout,
    Stderr,
}

/// One frame of streamed container output.
#[derive(Debug, Clone)]
pub struct LogFrame {
    /// Which stream the frame came from.
    pub source: LogSource,
    /// Raw frame bytes.
    pub bytes: Vec<u8>,
}

impl LogFrame {
    /// Returns the frame contents as lossy UTF-8.
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Stream of container output frames.
pub type LogStream = Pin<Box<dyn Stream<Item = Result<LogFrame>> + Send>>;

// =============================================================================
// Signals
// =============================================================================

/// Signal delivered to a container's main process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGTERM (graceful shutdown).
    Term,
    /// SIGKILL (force kill).
    Kill,
    /// SIGHUP (hangup).
    Hup,
    /// SIGINT (interrupt).
    Int,
    /// SIGUSR1.
    Usr1,
    /// SIGUSR2.
    Usr2,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Term => write!(f, "SIGTERM"),
            Self::Kill => write!(f, "SIGKILL"),
            Self::Hup => write!(f, "SIGHUP"),
            Self::Int => write!(f, "SIGINT"),
            Self::Usr1 => write!(f, "SIGUSR1"),
            Self::Usr2 => write!(f, "SIGUSR2"),
        }
    }
}

// =============================================================================
// Container Runtime Trait
// =============================================================================

/// Capability interface over the container runtime daemon.
///
/// Everything the lifecycle controller and the chaos client need, and
/// nothing more. All methods are side-effecting calls against the daemon
/// except [`container_logs`], which returns a stream the caller drives.
///
/// [`container_logs`]: ContainerRuntime::container_logs
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Pulls a remote image so it is available locally.
    async fn pull_image(&self, reference: &str) -> Result<()>;

    /// Builds an image from a rendered Dockerfile, tagged `reference`.
    async fn build_image(&self, reference: &str, dockerfile: &str) -> Result<()>;

    /// Returns true if `reference` resolves to a local image.
    async fn image_exists(&self, reference: &str) -> Result<bool>;

    /// Creates a container from `config` and returns its runtime ID.
    ///
    /// The container is created but not started.
    async fn create_container(&self, config: &ContainerConfig) -> Result<String>;

    /// Starts a created container.
    async fn start_container(&self, id: &str) -> Result<()>;

    /// Stops a running container, waiting up to `grace` before the
    /// daemon kills the main process.
    async fn stop_container(&self, id: &str, grace: Duration) -> Result<()>;

    /// Removes a container. With `force`, a running container is killed
    /// and removed.
    async fn remove_container(&self, id: &str, force: bool) -> Result<()>;

    /// Inspects a container's current runtime state.
    async fn inspect_container(&self, id: &str) -> Result<RuntimeState>;

    /// Streams a container's stdout/stderr.
    ///
    /// With `follow`, the stream stays open and yields frames as they are
    /// produced; otherwise it ends after the output captured so far.
    fn container_logs(&self, id: &str, follow: bool) -> LogStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_renders_mode_suffix() {
        let bind = Bind {
            host_path: "/var/run/docker.sock".to_string(),
            container_path: "/docker.sock".to_string(),
            mode: BindMode::ReadWrite,
        };
        assert_eq!(bind.render(), "/var/run/docker.sock:/docker.sock:rw");

        let ro = Bind {
            mode: BindMode::ReadOnly,
            ..bind
        };
        assert_eq!(ro.render(), "/var/run/docker.sock:/docker.sock:ro");
    }

    #[test]
    fn signal_display() {
        assert_eq!(Signal::Kill.to_string(), "SIGKILL");
        assert_eq!(Signal::Term.to_string(), "SIGTERM");
    }

    #[test]
    fn exited_with_error_requires_nonzero_exit() {
        let mut state = RuntimeState {
            id: "c1".to_string(),
            running: false,
            exit_code: Some(0),
            status: "exited".to_string(),
            ip_address: None,
        };
        assert!(!state.exited_with_error());

        state.exit_code = Some(137);
        assert!(state.exited_with_error());

        state.running = true;
        assert!(!state.exited_with_error());
    }

    #[test]
    fn runtime_state_serializes_camel_case() {
        let state = RuntimeState {
            id: "c1".to_string(),
            running: false,
            exit_code: Some(1),
            status: "exited".to_string(),
            ip_address: None,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"exitCode\":1"));
        assert!(!json.contains("ipAddress"), "absent fields are skipped");
    }
}
