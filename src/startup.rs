//! Startup check strategies.
//!
//! Not every container is a long-running service: the chaos tool
//! container may have exited successfully before the first poll, while a
//! database container is only "up" once it logs readiness. A
//! [`StartupCheck`] classifies the runtime state of a just-launched
//! container as successful, failed, or still starting, and the
//! controller re-polls until a terminal outcome or its deadline.
//!
//! Strategies receive the runtime handle and container id, so new ones
//! plug in without touching the lifecycle controller.

use crate::constants::PORT_CONNECT_TIMEOUT;
use crate::error::{Error, Result};
use crate::runtime::ContainerRuntime;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

// =============================================================================
// Startup Outcome
// =============================================================================

/// Classification of a just-launched container.
///
/// `Successful` and `Failed` are terminal; `StillStarting` re-polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupOutcome {
    /// Container counts as up.
    Successful,
    /// Container startup failed.
    Failed,
    /// No terminal classification yet.
    StillStarting,
}

impl StartupOutcome {
    /// Returns true for `Successful` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::StillStarting)
    }
}

// =============================================================================
// Startup Check Trait
// =============================================================================

/// Policy deciding whether a just-started container counts as up.
#[async_trait]
pub trait StartupCheck: Send + Sync {
    /// Returns the strategy name, for diagnostics.
    fn name(&self) -> &str;

    /// Classifies the container's current runtime state.
    async fn classify(
        &self,
        runtime: &dyn ContainerRuntime,
        id: &str,
    ) -> Result<StartupOutcome>;
}

// =============================================================================
// ExitCodeOnly
// =============================================================================

/// Fails only on a non-zero exit code.
///
/// Everything else counts as successful, including "still running" and
/// "exited zero". This is the strategy for short-lived utility
/// containers where no persistent service is expected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCodeOnly;

#[async_trait]
impl StartupCheck for ExitCodeOnly {
    fn name(&self) -> &str {
        "exit-code-only"
    }

    async fn classify(
        &self,
        runtime: &dyn ContainerRuntime,
        id: &str,
    ) -> Result<StartupOutcome> {
        let state = runtime.inspect_container(id).await?;
        if state.exited_with_error() {
            Ok(StartupOutcome::Failed)
        } else {
            Ok(StartupOutcome::Successful)
        }
    }
}

// =============================================================================
// LogMessage
// =============================================================================

/// Waits for a marker line in the container output.
///
/// Classifies as failed once the container exits with a non-zero code,
/// successful once `needle` appears in the collected output, and still
/// starting otherwise. Suits service containers that log readiness, such
/// as database images.
#[derive(Debug, Clone)]
pub struct LogMessage {
    needle: String,
}

impl LogMessage {
    /// Waits until `needle` appears anywhere in the container output.
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
        }
    }
}

#[async_trait]
impl StartupCheck for LogMessage {
    fn name(&self) -> &str {
        "log-message"
    }

    async fn classify(
        &self,
        runtime: &dyn ContainerRuntime,
        id: &str,
    ) -> Result<StartupOutcome> {
        let state = runtime.inspect_container(id).await?;
        if state.exited_with_error() {
            return Ok(StartupOutcome::Failed);
        }

        let output = collect_output(runtime, id).await;
        if output.contains(&self.needle) {
            Ok(StartupOutcome::Successful)
        } else {
            Ok(StartupOutcome::StillStarting)
        }
    }
}

// =============================================================================
// PortOpen
// =============================================================================

/// Waits for a TCP port on the container to accept connections.
#[derive(Debug, Clone, Copy)]
pub struct PortOpen {
    port: u16,
}

impl PortOpen {
    /// Waits until `port` on the container address accepts a connection.
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl StartupCheck for PortOpen {
    fn name(&self) -> &str {
        "port-open"
    }

    async fn classify(
        &self,
        runtime: &dyn ContainerRuntime,
        id: &str,
    ) -> Result<StartupOutcome> {
        let state = runtime.inspect_container(id).await?;
        if !state.running {
            // A service that should listen has no business exiting.
            return Ok(StartupOutcome::Failed);
        }

        let Some(ip) = state.ip_address else {
            return Ok(StartupOutcome::StillStarting);
        };

        let connect = tokio::net::TcpStream::connect((ip.as_str(), self.port));
        match tokio::time::timeout(PORT_CONNECT_TIMEOUT, connect).await {
            Ok(Ok(_)) => Ok(StartupOutcome::Successful),
            _ => Ok(StartupOutcome::StillStarting),
        }
    }
}

// =============================================================================
// Poll Loop
// =============================================================================

/// Drives `strategy` to a terminal outcome.
///
/// Polls every `interval` until the strategy returns a terminal outcome
/// or `deadline` elapses. A deadline with no terminal classification is
/// reported as [`Error::StartupTimeout`], distinguishable from an
/// explicit failing exit code. The loop never stops the container;
/// cleanup stays with the caller.
pub async fn await_startup(
    runtime: &dyn ContainerRuntime,
    id: &str,
    strategy: &dyn StartupCheck,
    interval: Duration,
    deadline: Duration,
) -> Result<StartupOutcome> {
    let started = tokio::time::Instant::now();
    loop {
        let outcome = strategy.classify(runtime, id).await?;
        if outcome.is_terminal() {
            debug!(
                "startup check '{}' classified {} as {:?}",
                strategy.name(),
                id,
                outcome
            );
            return Ok(outcome);
        }
        if started.elapsed() >= deadline {
            return Err(Error::StartupTimeout {
                id: id.to_string(),
                waited: deadline,
            });
        }
        tokio::time::sleep(interval).await;
    }
}

/// Drains the output captured so far into one lossy UTF-8 string.
///
/// Best-effort: stream errors end collection early rather than failing
/// the classification.
pub(crate) async fn collect_output(runtime: &dyn ContainerRuntime, id: &str) -> String {
    let mut stream = runtime.container_logs(id, false);
    let mut output = String::new();
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(frame) => output.push_str(&frame.as_text()),
            Err(e) => {
                debug!("log collection for {} ended early: {}", id, e);
                break;
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_outcomes() {
        assert!(StartupOutcome::Successful.is_terminal());
        assert!(StartupOutcome::Failed.is_terminal());
        assert!(!StartupOutcome::StillStarting.is_terminal());
    }

    #[test]
    fn outcome_serializes_lowercase() {
        let json = serde_json::to_string(&StartupOutcome::StillStarting).unwrap();
        assert_eq!(json, "\"stillstarting\"");
    }
}
