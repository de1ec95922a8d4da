//! Chaos command model and execution client.
//!
//! A chaos run is described by three parts accumulated in any order:
//! an action (network fault or container fault), a set of target
//! containers, and an execution mode. [`ChaosCommand::evaluate`]
//! compiles the description into the single command line the chaos tool
//! parses; [`ChaosClient`] dispatches that line into a transient
//! container whose whole lifecycle is "run once, inspect exit code,
//! reap".

pub mod client;
pub mod command;
pub mod containers;
pub mod mode;
pub mod network;
pub mod targets;

pub use self::client::ChaosClient;
pub use self::command::{ChaosAction, ChaosCommand, TimeSpan, TimeUnit};
pub use self::containers::{
    kill_containers, pause_containers, remove_containers, stop_containers, ContainerAction,
};
pub use self::mode::{only_once, recurrently, ExecutionMode};
pub use self::network::{
    corrupt_packets, delay_outgoing_packets, duplicate_packets, limit_bandwidth, lose_packets,
    network_action, NetworkAction, NetworkSubCommand, RateUnit,
};
pub use self::targets::{containers, matching, ChaosTargets};
