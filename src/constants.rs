//! # Chaos Runtime Constants
//!
//! Defines the image references, host resources, timeouts, and validation
//! bounds used throughout the crate. These constants are the **single
//! source of truth** for the external contracts of the chaos tool:
//! changing an image reference or a socket path here changes what every
//! chaos container mounts and runs.
//!
//! ## Cross-References
//!
//! - [`crate::chaos::client`]: Uses the chaos/tc images and socket paths
//! - [`crate::container`]: Uses startup poll interval and deadline defaults
//! - [`crate::startup`]: Uses the port-connect timeout

use std::time::Duration;

// =============================================================================
// Chaos Tool Images
// =============================================================================
//
// The chaos tool (Pumba) runs in its own transient container and talks to
// the host daemon through the mounted control socket. Network faults are
// applied by a helper traffic-control container that Pumba launches against
// the victim's network namespace, so the helper image must already be
// present on the host.
// =============================================================================

/// Base image for the chaos tool container.
pub const PUMBA_IMAGE: &str = "gaiaadm/pumba:0.4.7";

/// Traffic-control helper image used by `netem` sub-commands.
///
/// Pumba starts this image against the victim's network namespace; it is
/// pre-fetched before each chaos run so the fault is not delayed by a pull.
pub const TC_HELPER_IMAGE: &str = "gaiadocker/iproute2:3.3";

/// Repository for the derived chaos image (base image plus generated
/// entrypoint script). The tag is content-addressed from the build steps.
pub const CHAOS_IMAGE_REPOSITORY: &str = "chaosrun/pumba";

// =============================================================================
// Host Resources
// =============================================================================

/// Host path of the container runtime control socket.
///
/// On Windows hosts the daemon expects the path with a leading slash
/// prepended; see [`crate::platform::Platform::docker_socket_host_path`].
pub const DOCKER_SOCKET_PATH: &str = "/var/run/docker.sock";

/// Path the control socket is mounted at inside the chaos container.
pub const DOCKER_SOCKET_CONTAINER_PATH: &str = "/docker.sock";

/// Environment variable the chaos tool reads to locate the daemon.
pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";

// =============================================================================
// Timeouts
// =============================================================================
//
// All startup polling is bounded. Exceeding a deadline reports a timeout
// but never stops the container itself; cleanup stays with the lifecycle
// controller.
// =============================================================================

/// Interval between startup check polls.
pub const DEFAULT_STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Overall deadline for a container to reach a terminal startup outcome.
pub const DEFAULT_STARTUP_DEADLINE: Duration = Duration::from_secs(60);

/// Grace period between stop and force-remove when tearing a container down.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect timeout for the port-open startup check.
pub const PORT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Interval between exit polls while reaping a detached chaos container.
pub const CHAOS_REAP_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on how long a detached chaos container is watched before
/// it is force-removed regardless of state.
pub const CHAOS_REAP_DEADLINE: Duration = Duration::from_secs(600);

// =============================================================================
// Diagnostics
// =============================================================================

/// Number of trailing log lines captured into a startup failure.
pub const LOG_TAIL_LINES: usize = 20;

// =============================================================================
// Validation
// =============================================================================

/// Maximum image reference length in bytes.
pub const MAX_IMAGE_REF_LEN: usize = 512;

/// Valid characters for image references.
///
/// The `@` is for digest references, the `:` for tags.
pub const IMAGE_REF_VALID_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_./:@";

/// Valid characters for container names.
///
/// Excludes `/` and `.` so names can never be mistaken for paths.
pub const CONTAINER_NAME_VALID_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_";

/// Maximum container name length.
pub const MAX_CONTAINER_NAME_LEN: usize = 128;

/// Validates a container name.
///
/// # Returns
///
/// `Ok(())` if valid, `Err(reason)` with a description of the failure.
#[inline]
#[must_use = "validation result must be checked before the name is used"]
pub fn validate_container_name(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("container name cannot be empty");
    }
    if name.len() > MAX_CONTAINER_NAME_LEN {
        return Err("container name exceeds maximum length");
    }
    if !name.chars().all(|c| CONTAINER_NAME_VALID_CHARS.contains(c)) {
        return Err("container name contains invalid characters");
    }
    Ok(())
}
