//! # chaosrun
//!
//! **Disposable containers and chaos injection for integration tests**
//!
//! This crate provisions ephemeral containers against a local container
//! runtime daemon and injects controlled network/process faults into
//! running containers by dispatching a transient chaos-tool container.
//! It is a single-daemon, single-host, synchronous-per-call client
//! library: no scheduler, no persistence, no multi-host orchestration.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          chaosrun                                │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ChaosClient                                                     │
//! │    perform_network_chaos(action) → affect(targets) → execute()   │
//! │                              │                                   │
//! │                              ▼ evaluate() → command line         │
//! │  ContainerSpec ──────► Container                                 │
//! │    image │ env │ binds │ log consumers │ startup check           │
//! │                              │                                   │
//! │  ImageSource                 │         StartupCheck              │
//! │    Remote (pull)             │           ExitCodeOnly            │
//! │    Derived (build, cached)   │           LogMessage │ PortOpen   │
//! ├──────────────────────────────┼───────────────────────────────────┤
//! │                    ContainerRuntime trait                        │
//! │   pull/build image │ create/start/stop/remove │ inspect │ logs   │
//! │                              │                                   │
//! │                       DockerRuntime (bollard)                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Chaos Data Flow
//!
//! A chaos run compiles a fluent fault description into one command
//! line, then runs it in a throwaway tool container:
//!
//! 1. Build the command: action + targets + execution mode.
//! 2. `evaluate()` renders the command line (missing parts fail fast).
//! 3. The lifecycle controller builds the derived tool image (cached by
//!    content), mounts the daemon control socket, and starts the
//!    container with the rendered command.
//! 4. The exit-code-only startup check classifies the launch; failure
//!    surfaces with exit code and log tail, success returns while the
//!    fault keeps running for its duration.
//!
//! # Example
//!
//! ```rust,ignore
//! use chaosrun::chaos::{
//!     containers, delay_outgoing_packets, network_action, only_once, TimeUnit,
//! };
//! use chaosrun::{ChaosClient, DockerRuntime};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> chaosrun::Result<()> {
//!     let runtime = Arc::new(DockerRuntime::connect()?);
//!     let chaos = ChaosClient::new(runtime);
//!
//!     chaos
//!         .perform_network_chaos(
//!             network_action()
//!                 .lasting_for(30, TimeUnit::Seconds)
//!                 .execute_sub_command(
//!                     delay_outgoing_packets().delay_for(500, TimeUnit::Millis),
//!                 ),
//!         )
//!         .affect(containers(["target-1"]))
//!         .execute(only_once().on_all_chosen_containers())
//!         .await
//! }
//! ```
//!
//! # Cleanup Discipline
//!
//! A failed startup removes the runtime container before the error
//! propagates; a dropped [`Container`] handle fires a best-effort
//! background removal; a detached chaos container is reaped once its
//! process exits. No code path leaks a running container across test
//! boundaries.

pub mod chaos;
pub mod constants;
pub mod container;
pub mod docker;
pub mod error;
pub mod image;
pub mod platform;
pub mod runtime;
pub mod startup;

// Re-exports
pub use chaos::ChaosClient;
pub use container::{Container, ContainerSpec, LogConsumer};
pub use docker::DockerRuntime;
pub use error::{Error, Result};
pub use image::{DockerfileBuilder, ImageSource};
pub use platform::{Os, Platform};
pub use runtime::{
    Bind, BindMode, ContainerConfig, ContainerRuntime, LogFrame, LogSource, LogStream,
    RuntimeState, Signal,
};
pub use startup::{ExitCodeOnly, LogMessage, PortOpen, StartupCheck, StartupOutcome};
