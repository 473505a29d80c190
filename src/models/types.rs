//! Core enumerations of the job model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// States of a scheduler job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Job was just created, and is not evaluated yet.
    Idle,
    /// Job is being evaluated.
    Evaluation,
    /// Job was evaluated, and has a schedule.
    Scheduled,
    /// Job is being processed by the executor.
    Busy,
    /// Job encountered a fatal issue while processing, and must be reset manually.
    Error,
    /// Job encountered a transitory issue while processing, and will be rescheduled.
    Aborted,
    /// Job has an incorrect configuration, and cannot proceed.
    Invalid,
    /// Job finished all required captures.
    Complete,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Idle => "Idle",
            JobState::Evaluation => "Evaluation",
            JobState::Scheduled => "Scheduled",
            JobState::Busy => "Busy",
            JobState::Error => "Error",
            JobState::Aborted => "Aborted",
            JobState::Invalid => "Invalid",
            JobState::Complete => "Complete",
        };
        f.write_str(s)
    }
}

/// Executor sub-state of a running job. Opaque to the planner; carried so
/// the executor's progress survives a planning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    #[default]
    Idle,
    Slewing,
    Focusing,
    Aligning,
    Guiding,
    Capturing,
    Complete,
}

/// Conditions under which a job may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupCondition {
    /// Start whenever constraints allow.
    #[default]
    Asap,
    /// Start at the user-pinned instant held in `start_at_time`.
    At,
}

/// Conditions under which a job completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionCondition {
    /// Run the capture sequence once.
    #[default]
    Sequence,
    /// Run the capture sequence `repeats_required` times.
    Repeat,
    /// Run indefinitely until stopped.
    Loop,
    /// Run until the instant held in `finish_at_time`.
    At,
}

impl fmt::Display for CompletionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompletionCondition::Sequence => "finish sequence",
            CompletionCondition::Repeat => "finish repeats",
            CompletionCondition::Loop => "loop",
            CompletionCondition::At => "finish at",
        };
        f.write_str(s)
    }
}

/// Which executor phases a job demands. Consumed by the duration heuristic
/// and forwarded to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepPipeline {
    pub track: bool,
    pub focus: bool,
    pub align: bool,
    pub guide: bool,
}

impl StepPipeline {
    pub fn all() -> Self {
        Self { track: true, focus: true, align: true, guide: true }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// A job's estimated total duration.
///
/// Replaces the raw -1/-2/0/positive sentinel convention with a tagged
/// variant; the helpers keep arithmetic call sites terse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatedDuration {
    /// Not estimated yet.
    #[default]
    NotEstimated,
    /// Estimated, but unbounded: the job loops, or saves frames remotely.
    Unbounded,
    /// Nothing left to do.
    Complete,
    /// Known duration in seconds.
    Seconds(i64),
}

impl EstimatedDuration {
    /// Whether an estimate has been produced at all.
    pub fn is_estimated(&self) -> bool {
        !matches!(self, EstimatedDuration::NotEstimated)
    }

    /// The duration when it is known and finite.
    pub fn known_seconds(&self) -> Option<i64> {
        match self {
            EstimatedDuration::Seconds(s) => Some(*s),
            EstimatedDuration::Complete => Some(0),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, EstimatedDuration::Complete)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, EstimatedDuration::Unbounded)
    }
}

impl fmt::Display for EstimatedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatedDuration::NotEstimated => f.write_str("not estimated"),
            EstimatedDuration::Unbounded => f.write_str("unbounded"),
            EstimatedDuration::Complete => f.write_str("complete"),
            EstimatedDuration::Seconds(s) => write!(f, "{s}s"),
        }
    }
}
