//! Error types for container provisioning and chaos execution.

use std::time::Duration;

/// Result type alias for chaosrun operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning containers or running chaos.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Image Errors
    // =========================================================================
    /// Failed to parse or validate an image reference.
    #[error("invalid image reference '{reference}': {reason}")]
    InvalidImageReference { reference: String, reason: String },

    /// Pulling a remote image failed (unreachable registry, unknown tag).
    #[error("failed to pull image '{reference}': {reason}")]
    ImagePull { reference: String, reason: String },

    /// Building a derived image failed.
    #[error("failed to build image '{reference}': {reason}")]
    ImageBuild { reference: String, reason: String },

    // =========================================================================
    // Startup Errors
    // =========================================================================
    /// Container reached a terminal FAILED startup outcome.
    ///
    /// Carries the last known runtime state and a log tail so the failure
    /// can be diagnosed without re-running.
    #[error(
        "container '{id}' failed to start (exit code {exit_code:?}, state '{last_state}'): {log_tail}"
    )]
    StartupFailed {
        id: String,
        exit_code: Option<i64>,
        last_state: String,
        log_tail: String,
    },

    /// Startup check did not reach a terminal outcome before the deadline.
    #[error("container '{id}' did not reach a terminal startup state within {waited:?}")]
    StartupTimeout { id: String, waited: Duration },

    // =========================================================================
    // Chaos Errors
    // =========================================================================
    /// A chaos command was rendered before all required parts were set.
    #[error("malformed chaos command: missing {missing}")]
    MalformedCommand { missing: &'static str },

    /// The transient chaos container failed.
    #[error("chaos command '{command}' failed")]
    ChaosExecution {
        command: String,
        #[source]
        source: Box<Error>,
    },

    // =========================================================================
    // Runtime Boundary Errors
    // =========================================================================
    /// The container runtime daemon rejected or failed an operation.
    #[error("runtime operation '{op}' failed: {reason}")]
    Runtime { op: &'static str, reason: String },

    /// A container specification was invalid before any side effect ran.
    #[error("invalid container spec: {0}")]
    InvalidSpec(String),

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps this error as a chaos execution failure for `command`.
    pub fn into_chaos_failure(self, command: impl Into<String>) -> Self {
        Self::ChaosExecution {
            command: command.into(),
            source: Box::new(self),
        }
    }

    /// Returns true if this is a startup timeout, as opposed to an
    /// explicit failing exit code.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::StartupTimeout { .. })
    }
}
