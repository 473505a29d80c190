//! The planning engine: constraint evaluation, duration estimation,
//! greedy selection and timeline simulation.

pub mod constraints;
pub mod estimator;
pub mod greedy;
pub mod log;
pub mod simulator;

pub use constraints::{ConstraintEvaluator, FeasibilityWindow, SEARCH_HORIZON_DAYS};
pub use estimator::{estimate_job_time, time_heuristics};
pub use greedy::{
    job_schedule_string, GreedyScheduler, Selection, SimulationType, MAX_INTERRUPT_SECS,
    MIN_RUN_SECS, SIM_HOURS,
};
pub use log::{EvaluationLog, LogEntry, LogLevel};
