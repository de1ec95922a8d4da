//! Process-level fault actions on target containers.
//!
//! These map to the chaos tool's container commands: kill with a
//! signal, pause for a duration, stop, remove.

use crate::chaos::command::{ChaosAction, TimeSpan, TimeUnit};
use crate::runtime::Signal;

/// A process-level fault on the target containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    /// Deliver a signal to the main process.
    Kill { signal: Signal },
    /// Freeze all processes for a duration.
    Pause { duration: TimeSpan },
    /// Stop the container.
    Stop,
    /// Remove the container.
    Remove,
}

impl ContainerAction {
    pub(crate) fn render_tokens(&self) -> Vec<String> {
        match self {
            Self::Kill { signal } => vec![
                "kill".to_string(),
                "--signal".to_string(),
                signal.to_string(),
            ],
            Self::Pause { duration } => vec![
                "pause".to_string(),
                "--duration".to_string(),
                duration.to_string(),
            ],
            Self::Stop => vec!["stop".to_string()],
            Self::Remove => vec!["rm".to_string()],
        }
    }
}

/// Kill builder, SIGKILL by default.
#[derive(Debug, Clone, Copy)]
pub struct KillContainers {
    signal: Signal,
}

/// Starts a kill action.
pub fn kill_containers() -> KillContainers {
    KillContainers {
        signal: Signal::Kill,
    }
}

impl KillContainers {
    /// Signal to deliver instead of SIGKILL.
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = signal;
        self
    }
}

impl From<KillContainers> for ContainerAction {
    fn from(value: KillContainers) -> Self {
        Self::Kill {
            signal: value.signal,
        }
    }
}

impl From<KillContainers> for ChaosAction {
    fn from(value: KillContainers) -> Self {
        ChaosAction::from(ContainerAction::from(value))
    }
}

/// Pause builder, 30 seconds by default.
#[derive(Debug, Clone, Copy)]
pub struct PauseContainers {
    duration: TimeSpan,
}

/// Starts a pause action.
pub fn pause_containers() -> PauseContainers {
    PauseContainers {
        duration: TimeSpan::of(30, TimeUnit::Seconds),
    }
}

impl PauseContainers {
    /// How long the processes stay frozen.
    pub fn pause_for(mut self, value: u64, unit: TimeUnit) -> Self {
        self.duration = TimeSpan::of(value, unit);
        self
    }
}

impl From<PauseContainers> for ContainerAction {
    fn from(value: PauseContainers) -> Self {
        Self::Pause {
            duration: value.duration,
        }
    }
}

impl From<PauseContainers> for ChaosAction {
    fn from(value: PauseContainers) -> Self {
        ChaosAction::from(ContainerAction::from(value))
    }
}

/// Stops the target containers.
pub fn stop_containers() -> ContainerAction {
    ContainerAction::Stop
}

/// Removes the target containers.
pub fn remove_containers() -> ContainerAction {
    ContainerAction::Remove
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_renders_signal_name() {
        let action: ContainerAction = kill_containers().with_signal(Signal::Term).into();
        assert_eq!(action.render_tokens(), ["kill", "--signal", "SIGTERM"]);
    }

    #[test]
    fn pause_renders_duration() {
        let action: ContainerAction = pause_containers().pause_for(5, TimeUnit::Seconds).into();
        assert_eq!(action.render_tokens(), ["pause", "--duration", "5s"]);
    }

    #[test]
    fn bare_actions_render_single_token() {
        assert_eq!(stop_containers().render_tokens(), ["stop"]);
        assert_eq!(remove_containers().render_tokens(), ["rm"]);
    }
}
