//! Execution modes for chaos commands.
//!
//! A mode combines how often the command runs (once, or recurrently at
//! an interval) with how victims are chosen from the target set (all of
//! them, or one at random per run). Modes render as the chaos tool's
//! global flags, which precede the action on the command line:
//! `--random` first, then `--interval <span>`.

use crate::chaos::command::{TimeSpan, TimeUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occurrence {
    Once,
    Every(TimeSpan),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VictimSelection {
    AllChosen,
    RandomlyChosen,
}

/// How often and against which of the chosen containers a chaos command
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionMode {
    occurrence: Occurrence,
    selection: VictimSelection,
}

impl ExecutionMode {
    pub(crate) fn render_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        if self.selection == VictimSelection::RandomlyChosen {
            tokens.push("--random".to_string());
        }
        if let Occurrence::Every(interval) = self.occurrence {
            tokens.push("--interval".to_string());
            tokens.push(interval.to_string());
        }
        tokens
    }
}

/// Builder fixing the occurrence; choose the victim selection to finish.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionModeBuilder {
    occurrence: Occurrence,
}

/// Runs the command a single time.
pub fn only_once() -> ExecutionModeBuilder {
    ExecutionModeBuilder {
        occurrence: Occurrence::Once,
    }
}

/// Repeats the command every `value` `unit`.
pub fn recurrently(value: u64, unit: TimeUnit) -> ExecutionModeBuilder {
    ExecutionModeBuilder {
        occurrence: Occurrence::Every(TimeSpan::of(value, unit)),
    }
}

impl ExecutionModeBuilder {
    /// Applies the fault to every chosen container.
    pub fn on_all_chosen_containers(self) -> ExecutionMode {
        ExecutionMode {
            occurrence: self.occurrence,
            selection: VictimSelection::AllChosen,
        }
    }

    /// Applies the fault to one randomly chosen container per run.
    pub fn on_randomly_chosen_container(self) -> ExecutionMode {
        ExecutionMode {
            occurrence: self.occurrence,
            selection: VictimSelection::RandomlyChosen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_on_all_renders_no_flags() {
        let mode = only_once().on_all_chosen_containers();
        assert!(mode.render_tokens().is_empty());
    }

    #[test]
    fn random_selection_renders_flag() {
        let mode = only_once().on_randomly_chosen_container();
        assert_eq!(mode.render_tokens(), ["--random"]);
    }

    #[test]
    fn recurrent_renders_interval_after_random() {
        let mode = recurrently(30, TimeUnit::Seconds).on_randomly_chosen_container();
        assert_eq!(mode.render_tokens(), ["--random", "--interval", "30s"]);
    }
}
