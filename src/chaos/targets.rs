//! Victim selection for chaos commands.
//!
//! Targets are either explicit container names, rendered in insertion
//! order at the end of the command line, or a single regular-expression
//! selector the chaos tool matches against running container names.

/// Which containers a chaos command affects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChaosTargets {
    /// Explicit container names.
    Containers(Vec<String>),
    /// Regular-expression selector over container names.
    Matching(String),
}

impl ChaosTargets {
    pub(crate) fn render_tokens(&self) -> Vec<String> {
        match self {
            Self::Containers(names) => names.clone(),
            Self::Matching(pattern) => vec![format!("re2:{}", pattern)],
        }
    }
}

/// Targets the named containers.
pub fn containers<I, S>(names: I) -> ChaosTargets
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ChaosTargets::Containers(names.into_iter().map(Into::into).collect())
}

/// Targets every container whose name matches `pattern`.
pub fn matching(pattern: impl Into<String>) -> ChaosTargets {
    ChaosTargets::Matching(pattern.into())
}
