//! Docker daemon binding for the [`ContainerRuntime`] trait.
//!
//! Adapts `bollard` to the narrow capability interface the core depends
//! on. All daemon errors are mapped to [`Error`] variants at this
//! boundary; bollard types never cross into the lifecycle or chaos
//! logic.

use crate::error::{Error, Result};
use crate::runtime::{
    Bind, ContainerConfig, ContainerRuntime, LogFrame, LogSource, LogStream, RuntimeState,
};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::{BuildImageOptions, CreateImageOptions};
use bollard::models::HostConfig;
use bollard::Docker;
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, info};

/// Docker-daemon-backed container runtime.
///
/// Cheap to clone; the underlying client multiplexes over one
/// connection. Connects to the platform's default daemon socket.
#[derive(Clone)]
pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connects to the local Docker daemon using platform defaults
    /// (Unix socket, or named pipe on Windows).
    pub fn connect() -> Result<Self> {
        let client = Docker::connect_with_local_defaults().map_err(|e| Error::Runtime {
            op: "connect",
            reason: e.to_string(),
        })?;
        Ok(Self { client })
    }

    /// Wraps an already configured bollard client.
    pub fn with_client(client: Docker) -> Self {
        Self { client }
    }

    /// Packs a rendered Dockerfile into the single-file tar context the
    /// daemon's build endpoint expects.
    fn build_context(dockerfile: &str) -> Result<Vec<u8>> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(dockerfile.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, "Dockerfile", dockerfile.as_bytes())?;
        Ok(builder.into_inner()?)
    }
}

fn render_env(env: &[(String, String)]) -> Vec<String> {
    env.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
}

fn render_binds(binds: &[Bind]) -> Vec<String> {
    binds.iter().map(Bind::render).collect()
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn pull_image(&self, reference: &str) -> Result<()> {
        debug!("pulling image {}", reference);
        let options = CreateImageOptions {
            from_image: reference.to_string(),
            ..Default::default()
        };
        let mut pull = self.client.create_image(Some(options), None, None);
        while let Some(progress) = pull.next().await {
            progress.map_err(|e| Error::ImagePull {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;
        }
        info!("pulled image {}", reference);
        Ok(())
    }

    async fn build_image(&self, reference: &str, dockerfile: &str) -> Result<()> {
        debug!("building image {}", reference);
        let context = Self::build_context(dockerfile)?;
        let options = BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: reference.to_string(),
            rm: true,
            ..Default::default()
        };
        let mut build = self
            .client
            .build_image(options, None, Some(bytes::Bytes::from(context)));
        while let Some(progress) = build.next().await {
            let info = progress.map_err(|e| Error::ImageBuild {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;
            // The daemon reports step failures inside the stream body.
            if let Some(message) = info.error {
                return Err(Error::ImageBuild {
                    reference: reference.to_string(),
                    reason: message,
                });
            }
        }
        info!("built image {}", reference);
        Ok(())
    }

    async fn image_exists(&self, reference: &str) -> Result<bool> {
        match self.client.inspect_image(reference).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(Error::Runtime {
                op: "inspect_image",
                reason: e.to_string(),
            }),
        }
    }

    async fn create_container(&self, config: &ContainerConfig) -> Result<String> {
        let options = config.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            ..Default::default()
        });
        let host_config = HostConfig {
            binds: Some(render_binds(&config.binds)),
            privileged: Some(config.privileged),
            auto_remove: Some(config.auto_remove),
            ..Default::default()
        };
        let body = Config {
            image: Some(config.image.clone()),
            cmd: Some(config.command.clone()),
            env: Some(render_env(&config.env)),
            host_config: Some(host_config),
            ..Default::default()
        };
        let response = self
            .client
            .create_container(options, body)
            .await
            .map_err(|e| Error::Runtime {
                op: "create_container",
                reason: e.to_string(),
            })?;
        debug!("created container {} from {}", response.id, config.image);
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.client
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::Runtime {
                op: "start_container",
                reason: e.to_string(),
            })?;
        info!("started container {}", id);
        Ok(())
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<()> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };
        self.client
            .stop_container(id, Some(options))
            .await
            .map_err(|e| Error::Runtime {
                op: "stop_container",
                reason: e.to_string(),
            })?;
        info!("stopped container {}", id);
        Ok(())
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.client
            .remove_container(id, Some(options))
            .await
            .map_err(|e| Error::Runtime {
                op: "remove_container",
                reason: e.to_string(),
            })?;
        debug!("removed container {} (force={})", id, force);
        Ok(())
    }

    async fn inspect_container(&self, id: &str) -> Result<RuntimeState> {
        let response = self
            .client
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| Error::Runtime {
                op: "inspect_container",
                reason: e.to_string(),
            })?;

        let state = response.state.unwrap_or_default();
        let ip_address = response
            .network_settings
            .and_then(|net| net.ip_address)
            .filter(|ip| !ip.is_empty());

        Ok(RuntimeState {
            id: response.id.unwrap_or_else(|| id.to_string()),
            running: state.running.unwrap_or(false),
            exit_code: state.exit_code,
            status: state
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            ip_address,
        })
    }

    fn container_logs(&self, id: &str, follow: bool) -> LogStream {
        let options = LogsOptions::<String> {
            follow,
            stdout: true,
            stderr: true,
            tail: "all".to_string(),
            ..Default::default()
        };
        let logs = self.client.logs(id, Some(options));
        Box::pin(logs.map(|item| {
            item.map(|output| match output {
                LogOutput::StdErr { message } => LogFrame {
                    source: LogSource::Stderr,
                    bytes: message.to_vec(),
                },
                LogOutput::StdOut { message }
                | LogOutput::StdIn { message }
                | LogOutput::Console { message } => LogFrame {
                    source: LogSource::Stdout,
                    bytes: message.to_vec(),
                },
            })
            .map_err(|e| Error::Runtime {
                op: "container_logs",
                reason: e.to_string(),
            })
        }))
    }
}
