//! Collection-to-Analysis Pipeline
//!
//! ```text
//! Idle -> Collecting -> Estimating -> Validating -> Dispatching -> Succeeded
//!   |          |                          |               |------> TimedOut
//!   +----------+--------------------------+---------------+------> Failed
//! ```
//!
//! Model selection happens while `Idle`, so an unknown model fails before
//! anything touches the filesystem.

pub mod executor;
pub mod progress;

pub use executor::{CollectReport, PipelineExecutor, PipelineReport, PipelineRequest};
pub use progress::{
    ProgressReceiver, ProgressSender, ProgressSnapshot, ProgressTracker, estimate_seconds,
    progress_channel,
};

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Collecting,
    Estimating,
    Validating,
    Dispatching,
    Succeeded,
    TimedOut,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::TimedOut | Self::Failed)
    }

    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Collecting)
                | (Idle, Failed)
                | (Collecting, Estimating)
                | (Collecting, Failed)
                | (Estimating, Validating)
                | (Validating, Dispatching)
                | (Validating, Failed)
                | (Dispatching, Succeeded)
                | (Dispatching, TimedOut)
                | (Dispatching, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Collecting => "collecting",
            Self::Estimating => "estimating",
            Self::Validating => "validating",
            Self::Dispatching => "dispatching",
            Self::Succeeded => "succeeded",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
