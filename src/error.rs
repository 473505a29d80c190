//! Planner error types.

use thiserror::Error;

/// Faults surfaced across the planner's public API.
///
/// The planner's internal loops communicate through booleans, sentinels and
/// reason strings; this enum covers the boundary where a typed error is the
/// right shape: configuration and sequence-file faults, and feasibility
/// queries that come up empty.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// The capture sequence file could not be read or parsed. Jobs with an
    /// invalid sequence move to the INVALID state and are never retried.
    #[error("invalid sequence file '{path}': {reason}")]
    InvalidSequence { path: String, reason: String },

    /// A configuration value is out of range or contradictory.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// No instant inside the bounded search horizon satisfies the job's
    /// constraints.
    #[error("no feasible window for job '{job}' within {horizon_days} days: {reason}")]
    NoFeasibleWindow {
        job: String,
        horizon_days: i64,
        reason: String,
    },
}
