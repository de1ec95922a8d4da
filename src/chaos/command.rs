//! Chaos command model.
//!
//! A [`ChaosCommand`] is an immutable description of a fault: action,
//! targets, execution mode. Parts accumulate in any order; `evaluate`
//! renders them deterministically into the single command line the
//! chaos tool parses, and fails fast when a required part is missing
//! rather than producing a malformed command.

use crate::chaos::containers::ContainerAction;
use crate::chaos::mode::ExecutionMode;
use crate::chaos::network::NetworkAction;
use crate::chaos::targets::ChaosTargets;
use crate::error::{Error, Result};

// =============================================================================
// Time Values
// =============================================================================

/// Time unit carried explicitly by every duration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Seconds,
    Minutes,
}

impl TimeUnit {
    /// Suffix the chaos tool's parser expects.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Millis => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
        }
    }
}

/// An integer time value with its unit.
///
/// Rendering keeps the value in its own unit, so `500ms` stays `500ms`
/// and never becomes `0.5s`; no conversion, no drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    value: u64,
    unit: TimeUnit,
}

impl TimeSpan {
    /// A span of `value` in `unit`.
    pub fn of(value: u64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }
}

impl std::fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

// =============================================================================
// Chaos Action
// =============================================================================

/// The fault a chaos command injects.
#[derive(Debug, Clone, PartialEq)]
pub enum ChaosAction {
    /// Network fault applied through the traffic-control helper.
    Network(NetworkAction),
    /// Process-level fault on the target containers.
    Containers(ContainerAction),
}

impl ChaosAction {
    pub(crate) fn render_tokens(&self) -> Vec<String> {
        match self {
            Self::Network(action) => action.render_tokens(),
            Self::Containers(action) => action.render_tokens(),
        }
    }
}

impl From<NetworkAction> for ChaosAction {
    fn from(action: NetworkAction) -> Self {
        Self::Network(action)
    }
}

impl From<ContainerAction> for ChaosAction {
    fn from(action: ContainerAction) -> Self {
        Self::Containers(action)
    }
}

// =============================================================================
// Chaos Command
// =============================================================================

/// Accumulated description of one chaos run.
///
/// Flag rendering order is fixed: execution-mode flags, then action
/// tokens, then targets. This order is the external contract with the
/// chaos tool's argument parser and must stay stable.
#[derive(Debug, Clone, Default)]
pub struct ChaosCommand {
    mode: Option<ExecutionMode>,
    action: Option<ChaosAction>,
    targets: Option<ChaosTargets>,
}

impl ChaosCommand {
    /// An empty command; parts accumulate in any order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fault action.
    pub fn with_action(mut self, action: impl Into<ChaosAction>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the victim selection.
    pub fn with_targets(mut self, targets: ChaosTargets) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Sets the execution mode.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Renders the final command line.
    ///
    /// Pure and deterministic: identical commands always render to
    /// identical strings.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedCommand`] when a required part is unset.
    pub fn evaluate(&self) -> Result<String> {
        let mode = self
            .mode
            .as_ref()
            .ok_or(Error::MalformedCommand {
                missing: "execution mode",
            })?;
        let action = self
            .action
            .as_ref()
            .ok_or(Error::MalformedCommand { missing: "action" })?;
        let targets = self
            .targets
            .as_ref()
            .ok_or(Error::MalformedCommand { missing: "targets" })?;

        let mut tokens = mode.render_tokens();
        tokens.extend(action.render_tokens());
        tokens.extend(targets.render_tokens());
        Ok(tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_render_exactly() {
        assert_eq!(TimeSpan::of(500, TimeUnit::Millis).to_string(), "500ms");
        assert_eq!(TimeSpan::of(1500, TimeUnit::Millis).to_string(), "1500ms");
    }

    #[test]
    fn seconds_and_minutes_render_exactly() {
        assert_eq!(TimeSpan::of(30, TimeUnit::Seconds).to_string(), "30s");
        assert_eq!(TimeSpan::of(2, TimeUnit::Minutes).to_string(), "2m");
    }

    #[test]
    fn evaluate_without_mode_fails_fast() {
        let command = ChaosCommand::new();
        let err = command.evaluate().unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedCommand {
                missing: "execution mode"
            }
        ));
    }
}
