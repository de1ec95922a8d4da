//! Chaos execution client.
//!
//! Binds a chaos command to a container lifecycle controller configured
//! for the chaos-tool image and runs it. The fluent flow is staged:
//!
//! ```text
//! client.perform_network_chaos(action) → .affect(targets) → .execute(mode)
//! ```
//!
//! Each stage is an immutable value exposing only the next legal step,
//! so a command can never be dispatched with a part missing.
//!
//! The transient chaos container gets the host's runtime control socket
//! mounted read-write and `DOCKER_HOST` pointed at the mount, runs the
//! evaluated command under the exit-code-only startup check, and is
//! reaped in the background once its process exits. Two chaos containers
//! aimed at the same victim can race on the shared socket; callers
//! needing mutual exclusion serialize themselves.

use crate::chaos::command::ChaosCommand;
use crate::chaos::containers::ContainerAction;
use crate::chaos::mode::ExecutionMode;
use crate::chaos::network::NetworkAction;
use crate::chaos::targets::ChaosTargets;
use crate::chaos::ChaosAction;
use crate::constants::{
    CHAOS_IMAGE_REPOSITORY, CHAOS_REAP_DEADLINE, CHAOS_REAP_INTERVAL,
    DOCKER_SOCKET_CONTAINER_PATH, DOCKER_HOST_ENV, PUMBA_IMAGE, TC_HELPER_IMAGE,
};
use crate::container::ContainerSpec;
use crate::error::Result;
use crate::image::ImageSource;
use crate::platform::Platform;
use crate::runtime::{BindMode, ContainerRuntime};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Client dispatching chaos commands into transient tool containers.
#[derive(Clone)]
pub struct ChaosClient {
    runtime: Arc<dyn ContainerRuntime>,
    platform: Platform,
}

impl ChaosClient {
    /// Creates a client over `runtime` for the detected host platform.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            platform: Platform::detect(),
        }
    }

    /// Overrides platform detection. Host-resource paths (the control
    /// socket) are resolved against this platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Fixes a network fault description. Next step: [`PendingChaos::affect`].
    pub fn perform_network_chaos(&self, action: NetworkAction) -> PendingChaos {
        self.pending(ChaosAction::Network(action))
    }

    /// Fixes a process fault description. Next step: [`PendingChaos::affect`].
    pub fn perform_container_chaos(&self, action: impl Into<ContainerAction>) -> PendingChaos {
        self.pending(ChaosAction::Containers(action.into()))
    }

    fn pending(&self, action: ChaosAction) -> PendingChaos {
        PendingChaos {
            runtime: self.runtime.clone(),
            platform: self.platform,
            action,
        }
    }
}

/// A chaos run with its fault fixed; choose the victims next.
pub struct PendingChaos {
    runtime: Arc<dyn ContainerRuntime>,
    platform: Platform,
    action: ChaosAction,
}

impl PendingChaos {
    /// Fixes the victim set. Next step: [`TargetedChaos::execute`].
    pub fn affect(self, targets: ChaosTargets) -> TargetedChaos {
        TargetedChaos {
            runtime: self.runtime,
            platform: self.platform,
            action: self.action,
            targets,
        }
    }
}

/// A chaos run with fault and victims fixed; execute to dispatch it.
pub struct TargetedChaos {
    runtime: Arc<dyn ContainerRuntime>,
    platform: Platform,
    action: ChaosAction,
    targets: ChaosTargets,
}

impl TargetedChaos {
    /// Runs the command and waits for the chaos container to reach a
    /// terminal startup outcome.
    ///
    /// # Errors
    ///
    /// [`crate::Error::ChaosExecution`] wrapping the underlying image or
    /// startup failure.
    pub async fn execute(self, mode: ExecutionMode) -> Result<()> {
        let command = ChaosCommand::new()
            .with_mode(mode)
            .with_action(self.action)
            .with_targets(self.targets)
            .evaluate()?;

        // The netem helper must already be present when the tool asks
        // for it, so fetch it before the run.
        ImageSource::remote(TC_HELPER_IMAGE)
            .resolve(self.runtime.as_ref())
            .await
            .map_err(|e| e.into_chaos_failure(&command))?;

        let spec = ContainerSpec::new(chaos_tool_image())
            .with_command(command.split_whitespace().map(String::from).collect())
            .with_bind(
                self.platform.docker_socket_host_path(),
                DOCKER_SOCKET_CONTAINER_PATH,
                BindMode::ReadWrite,
            )
            .with_env(
                DOCKER_HOST_ENV,
                format!("unix://{}", DOCKER_SOCKET_CONTAINER_PATH),
            )
            .with_log_consumer(|frame| {
                debug!("chaos container: \"{}\"", frame.as_text().trim_end());
            });

        info!("executing chaos container with command \"{}\"", command);
        let container = spec
            .start(self.runtime.clone())
            .await
            .map_err(|e| e.into_chaos_failure(&command))?;

        // The tool keeps running for the fault duration; hand the
        // container to the background reaper rather than cutting the
        // fault short here.
        let id = container.id().to_string();
        container.detach();
        spawn_reaper(self.runtime, id);
        Ok(())
    }

    /// Fire-and-forget variant of [`execute`].
    ///
    /// [`execute`]: TargetedChaos::execute
    pub fn dispatch(self, mode: ExecutionMode) -> JoinHandle<Result<()>> {
        tokio::spawn(self.execute(mode))
    }
}

/// The derived chaos-tool image: the stock tool image plus a generated
/// entrypoint script that re-execs its arguments as root.
fn chaos_tool_image() -> ImageSource {
    ImageSource::derived(CHAOS_IMAGE_REPOSITORY, PUMBA_IMAGE, entrypoint_script_steps())
}

/// Instructions writing the entrypoint script.
///
/// The script must stay POSIX-sh valid, executable, and `exec` the
/// original arguments as a fixed user; the tool needs root to reach
/// another container's network namespace through the mounted socket.
fn entrypoint_script_steps() -> Vec<String> {
    [
        "echo -n > /docker_entrypoint.sh",
        "echo '#!/bin/sh' >> /docker_entrypoint.sh",
        "echo 'set -e' >> /docker_entrypoint.sh",
        "echo 'exec gosu root:root \"$@\"' >> /docker_entrypoint.sh",
        "chmod +x /docker_entrypoint.sh",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Watches a detached chaos container and removes it once its process
/// exits, or unconditionally after the reap deadline.
fn spawn_reaper(runtime: Arc<dyn ContainerRuntime>, id: String) {
    tokio::spawn(async move {
        let deadline = tokio::time::Instant::now() + CHAOS_REAP_DEADLINE;
        loop {
            match runtime.inspect_container(&id).await {
                Ok(state) if state.running => {}
                _ => break,
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(CHAOS_REAP_INTERVAL).await;
        }
        debug!("reaping chaos container {}", id);
        let _ = runtime.remove_container(&id, true).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entrypoint_script_execs_as_root() {
        let steps = entrypoint_script_steps();
        assert!(steps.iter().any(|s| s.contains("#!/bin/sh")));
        assert!(steps.iter().any(|s| s.contains("exec gosu root:root")));
        assert!(steps.last().unwrap().starts_with("chmod +x"));
    }

    #[test]
    fn chaos_image_is_derived_from_tool_image() {
        let image = chaos_tool_image();
        let reference = image.reference();
        assert!(reference.starts_with("chaosrun/pumba:"));
        // Identical instructions, identical tag.
        assert_eq!(reference, chaos_tool_image().reference());
    }
}
