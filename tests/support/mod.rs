//! Test support: an in-memory fake container runtime.
//!
//! Implements [`ContainerRuntime`] without a daemon. Side effects are
//! recorded for assertions; inspect states and log output are scripted
//! per test.

// Each test binary compiles its own copy and uses a subset of the API.
#![allow(dead_code)]

use async_trait::async_trait;
use chaosrun::{
    ContainerConfig, ContainerRuntime, Error, LogFrame, LogSource, LogStream, Result,
    RuntimeState,
};
use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct Inner {
    present_images: HashSet<String>,
    pulled: Vec<String>,
    built: Vec<(String, String)>,
    created: Vec<ContainerConfig>,
    started: Vec<String>,
    stopped: Vec<String>,
    removed: Vec<(String, bool)>,
    states: VecDeque<RuntimeState>,
    default_state: Option<RuntimeState>,
    log_frames: Vec<LogFrame>,
    fail_pull: Option<String>,
    next_id: u32,
}

/// In-memory [`ContainerRuntime`] double.
#[derive(Default)]
pub struct FakeRuntime {
    inner: Mutex<Inner>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an image as already present on the daemon.
    pub fn add_image(&self, reference: &str) {
        self.inner
            .lock()
            .unwrap()
            .present_images
            .insert(reference.to_string());
    }

    /// Queues a state returned by the next inspect call; once the queue
    /// drains, inspects fall back to the default state.
    pub fn script_state(&self, state: RuntimeState) {
        self.inner.lock().unwrap().states.push_back(state);
    }

    /// State returned whenever the script queue is empty.
    pub fn set_default_state(&self, state: RuntimeState) {
        self.inner.lock().unwrap().default_state = Some(state);
    }

    /// Output frames served by `container_logs`.
    pub fn set_log_frames(&self, frames: Vec<LogFrame>) {
        self.inner.lock().unwrap().log_frames = frames;
    }

    /// Makes every pull fail with `reason`.
    pub fn fail_pulls_with(&self, reason: &str) {
        self.inner.lock().unwrap().fail_pull = Some(reason.to_string());
    }

    pub fn pulled(&self) -> Vec<String> {
        self.inner.lock().unwrap().pulled.clone()
    }

    pub fn built(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().built.clone()
    }

    pub fn created(&self) -> Vec<ContainerConfig> {
        self.inner.lock().unwrap().created.clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.inner.lock().unwrap().started.clone()
    }

    pub fn removed(&self) -> Vec<(String, bool)> {
        self.inner.lock().unwrap().removed.clone()
    }
}

/// A state for a container whose main process is still running.
pub fn running_state(id: &str) -> RuntimeState {
    RuntimeState {
        id: id.to_string(),
        running: true,
        exit_code: None,
        status: "running".to_string(),
        ip_address: Some("172.17.0.2".to_string()),
    }
}

/// A state for a container that exited with `code`.
pub fn exited_state(id: &str, code: i64) -> RuntimeState {
    RuntimeState {
        id: id.to_string(),
        running: false,
        exit_code: Some(code),
        status: "exited".to_string(),
        ip_address: None,
    }
}

/// A stdout frame with the given text.
pub fn stdout_frame(text: &str) -> LogFrame {
    LogFrame {
        source: LogSource::Stdout,
        bytes: text.as_bytes().to_vec(),
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn pull_image(&self, reference: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = &inner.fail_pull {
            return Err(Error::ImagePull {
                reference: reference.to_string(),
                reason: reason.clone(),
            });
        }
        inner.pulled.push(reference.to_string());
        inner.present_images.insert(reference.to_string());
        Ok(())
    }

    async fn build_image(&self, reference: &str, dockerfile: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .built
            .push((reference.to_string(), dockerfile.to_string()));
        inner.present_images.insert(reference.to_string());
        Ok(())
    }

    async fn image_exists(&self, reference: &str) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .present_images
            .contains(reference))
    }

    async fn create_container(&self, config: &ContainerConfig) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        let id = match &config.name {
            Some(name) => name.clone(),
            None => format!("fake-{}", inner.next_id),
        };
        inner.next_id += 1;
        inner.created.push(config.clone());
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.inner.lock().unwrap().started.push(id.to_string());
        Ok(())
    }

    async fn stop_container(&self, id: &str, _grace: Duration) -> Result<()> {
        self.inner.lock().unwrap().stopped.push(id.to_string());
        Ok(())
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .removed
            .push((id.to_string(), force));
        Ok(())
    }

    async fn inspect_container(&self, id: &str) -> Result<RuntimeState> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(state) = inner.states.pop_front() {
            return Ok(state);
        }
        Ok(inner
            .default_state
            .clone()
            .unwrap_or_else(|| running_state(id)))
    }

    fn container_logs(&self, _id: &str, _follow: bool) -> LogStream {
        let frames = self.inner.lock().unwrap().log_frames.clone();
        stream::iter(frames.into_iter().map(Ok)).boxed()
    }
}
