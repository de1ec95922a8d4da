//! Container lifecycle controller.
//!
//! [`ContainerSpec`] is a pure builder: image, command, environment,
//! bind mounts, log consumers, and a startup check strategy accumulate
//! with no side effects until `start`. Starting resolves the image,
//! creates and launches the runtime container, streams its output to the
//! registered consumers on a detached task, and drives the startup
//! strategy to a terminal outcome.
//!
//! Cleanup discipline: on any failure after the runtime container was
//! created, the controller removes it before propagating the error, so a
//! failed startup never leaks a running container across test or
//! chaos-run boundaries. A [`Container`] handle that is dropped without
//! `stop` fires a best-effort background removal.

use crate::constants::{
    validate_container_name, DEFAULT_STARTUP_DEADLINE, DEFAULT_STARTUP_POLL_INTERVAL,
    DEFAULT_STOP_TIMEOUT, LOG_TAIL_LINES,
};
use crate::error::{Error, Result};
use crate::image::ImageSource;
use crate::runtime::{Bind, BindMode, ContainerConfig, ContainerRuntime, LogFrame, RuntimeState};
use crate::startup::{await_startup, collect_output, ExitCodeOnly, StartupCheck};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sink callback receiving streamed container output.
pub type LogConsumer = Box<dyn Fn(&LogFrame) + Send + Sync>;

// =============================================================================
// Container Spec
// =============================================================================

/// Desired configuration for a disposable container.
///
/// Pure builder; nothing touches the daemon until [`start`].
///
/// [`start`]: ContainerSpec::start
pub struct ContainerSpec {
    image: ImageSource,
    command: Vec<String>,
    env: Vec<(String, String)>,
    binds: Vec<Bind>,
    log_consumers: Vec<LogConsumer>,
    privileged: bool,
    auto_remove: bool,
    name: Option<String>,
    startup: Arc<dyn StartupCheck>,
    poll_interval: Duration,
    startup_deadline: Duration,
}

impl ContainerSpec {
    /// Starts a spec for `image` with the exit-code-only startup check.
    pub fn new(image: ImageSource) -> Self {
        Self {
            image,
            command: Vec::new(),
            env: Vec::new(),
            binds: Vec::new(),
            log_consumers: Vec::new(),
            privileged: false,
            auto_remove: false,
            name: None,
            startup: Arc::new(ExitCodeOnly),
            poll_interval: DEFAULT_STARTUP_POLL_INTERVAL,
            startup_deadline: DEFAULT_STARTUP_DEADLINE,
        }
    }

    /// Sets the command (entrypoint arguments).
    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = command;
        self
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    /// Adds a bind mount.
    pub fn with_bind(
        mut self,
        host_path: impl Into<String>,
        container_path: impl Into<String>,
        mode: BindMode,
    ) -> Self {
        self.binds.push(Bind {
            host_path: host_path.into(),
            container_path: container_path.into(),
            mode,
        });
        self
    }

    /// Registers a log consumer. Consumers are invoked in registration
    /// order for every streamed frame.
    pub fn with_log_consumer(
        mut self,
        consumer: impl Fn(&LogFrame) + Send + Sync + 'static,
    ) -> Self {
        self.log_consumers.push(Box::new(consumer));
        self
    }

    /// Runs the container with elevated privileges.
    pub fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Removes the container automatically once its main process exits.
    pub fn with_auto_remove(mut self, auto_remove: bool) -> Self {
        self.auto_remove = auto_remove;
        self
    }

    /// Names the container explicitly.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the startup check strategy.
    pub fn with_startup_check(mut self, strategy: impl StartupCheck + 'static) -> Self {
        self.startup = Arc::new(strategy);
        self
    }

    /// Overrides the startup poll interval and overall deadline.
    pub fn with_startup_timeouts(mut self, interval: Duration, deadline: Duration) -> Self {
        self.poll_interval = interval;
        self.startup_deadline = deadline;
        self
    }

    /// Resolves the image, creates and starts the container, and drives
    /// the startup check to a terminal outcome.
    ///
    /// # Errors
    ///
    /// - Image acquisition errors propagate unchanged.
    /// - [`Error::StartupFailed`] carries the exit code, last known
    ///   state, and a log tail when the strategy classifies the
    ///   container as failed.
    /// - [`Error::StartupTimeout`] when no terminal outcome is reached
    ///   within the deadline.
    ///
    /// On every error path after creation, the runtime container is
    /// removed before the error is returned.
    pub async fn start(self, runtime: Arc<dyn ContainerRuntime>) -> Result<Container> {
        if let Some(name) = &self.name {
            validate_container_name(name).map_err(|reason| {
                Error::InvalidSpec(format!("container name '{}': {}", name, reason))
            })?;
        }

        let image = self.image.resolve(runtime.as_ref()).await?;
        let config = ContainerConfig {
            image,
            command: self.command,
            env: self.env,
            binds: self.binds,
            privileged: self.privileged,
            auto_remove: self.auto_remove,
            name: self.name.clone(),
        };

        let id = runtime.create_container(&config).await?;
        debug!("created container {}", id);

        // Everything from here on must tear the container down on failure.
        match Self::launch(
            &runtime,
            &id,
            self.log_consumers,
            self.startup.as_ref(),
            self.poll_interval,
            self.startup_deadline,
        )
        .await
        {
            Ok(()) => Ok(Container {
                runtime,
                id,
                name: self.name,
                cleaned_up: false,
            }),
            Err(e) => {
                if let Err(cleanup) = runtime.remove_container(&id, true).await {
                    warn!("cleanup of failed container {} failed: {}", id, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn launch(
        runtime: &Arc<dyn ContainerRuntime>,
        id: &str,
        log_consumers: Vec<LogConsumer>,
        startup: &dyn StartupCheck,
        poll_interval: Duration,
        startup_deadline: Duration,
    ) -> Result<()> {
        runtime.start_container(id).await?;

        if !log_consumers.is_empty() {
            spawn_log_pump(runtime.clone(), id.to_string(), log_consumers);
        }

        let outcome = await_startup(
            runtime.as_ref(),
            id,
            startup,
            poll_interval,
            startup_deadline,
        )
        .await?;

        match outcome {
            crate::startup::StartupOutcome::Successful => {
                info!("container {} started", id);
                Ok(())
            }
            _ => Err(startup_failure(runtime.as_ref(), id).await),
        }
    }
}

/// Builds a diagnosable startup failure from the container's last known
/// state and a log tail.
async fn startup_failure(runtime: &dyn ContainerRuntime, id: &str) -> Error {
    let (exit_code, last_state) = match runtime.inspect_container(id).await {
        Ok(state) => (state.exit_code, state.status),
        Err(_) => (None, "unknown".to_string()),
    };
    let output = collect_output(runtime, id).await;
    let lines: Vec<&str> = output.lines().collect();
    let tail_start = lines.len().saturating_sub(LOG_TAIL_LINES);
    Error::StartupFailed {
        id: id.to_string(),
        exit_code,
        last_state,
        log_tail: lines[tail_start..].join("\n"),
    }
}

/// Streams container output to the registered consumers on a detached
/// task. Best-effort: stream errors are logged at debug and never reach
/// the primary start/stop path.
fn spawn_log_pump(runtime: Arc<dyn ContainerRuntime>, id: String, consumers: Vec<LogConsumer>) {
    tokio::spawn(async move {
        let mut stream = runtime.container_logs(&id, true);
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(frame) => {
                    for consumer in &consumers {
                        consumer(&frame);
                    }
                }
                Err(e) => {
                    debug!("log stream for {} ended: {}", id, e);
                    break;
                }
            }
        }
    });
}

// =============================================================================
// Container Handle
// =============================================================================

/// Handle to a started container.
///
/// Owned by the code that called [`ContainerSpec::start`]; dropping it
/// without calling [`stop`] fires a best-effort background removal so a
/// forgotten handle cannot leak a running container.
///
/// [`stop`]: Container::stop
pub struct Container {
    runtime: Arc<dyn ContainerRuntime>,
    id: String,
    name: Option<String>,
    cleaned_up: bool,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cleaned_up", &self.cleaned_up)
            .finish_non_exhaustive()
    }
}

impl Container {
    /// Runtime identity of the container.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Explicit name, when one was configured. Chaos targets address
    /// victims by this name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Inspects the container's current runtime state.
    pub async fn state(&self) -> Result<RuntimeState> {
        self.runtime.inspect_container(&self.id).await
    }

    /// Stops and removes the container. Idempotent.
    pub async fn stop(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        if let Err(e) = self
            .runtime
            .stop_container(&self.id, DEFAULT_STOP_TIMEOUT)
            .await
        {
            // Already-exited containers fail to stop; removal still runs.
            debug!("stop of {} reported: {}", self.id, e);
        }
        self.runtime.remove_container(&self.id, true).await?;
        self.cleaned_up = true;
        Ok(())
    }

    /// Releases the handle without removing the container.
    ///
    /// For transient containers created with auto-remove, where the
    /// daemon reaps the container once its process exits.
    pub fn detach(mut self) {
        self.cleaned_up = true;
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if self.cleaned_up {
            return;
        }
        warn!("container {} dropped without stop, removing", self.id);
        let runtime = self.runtime.clone();
        let id = self.id.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = runtime.remove_container(&id, true).await;
            });
        }
    }
}
