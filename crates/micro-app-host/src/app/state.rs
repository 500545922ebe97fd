//! Per-app lifecycle state tracked by the registry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a registered micro-app.
///
/// ```text
/// Registered ─┬─> Skipped                  (disabled at initialize_all)
///             └─> Initializing ─┬─> Ready ─> ShuttingDown ─> Shutdown
///                               └─> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    /// Registered, not yet visited by `initialize_all`.
    Registered,
    /// Disabled when `initialize_all` ran; never saw `initialize`.
    Skipped,
    /// `initialize` is in flight.
    Initializing,
    /// `initialize` succeeded.
    Ready,
    /// `initialize` failed. Terminal.
    Failed,
    /// `shutdown` is in flight.
    ShuttingDown,
    /// `shutdown` was attempted.
    Shutdown,
}

impl AppState {
    /// Whether `initialize_all` may still initialize an app in this state.
    #[must_use]
    pub fn awaits_initialization(&self) -> bool {
        matches!(self, Self::Registered | Self::Skipped)
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Registered => "registered",
            Self::Skipped => "skipped",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::ShuttingDown => "shutting_down",
            Self::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}
