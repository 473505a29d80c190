//! Scheduler configuration surface.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

/// All options recognized by the planner, with their runtime defaults.
/// Loadable from a TOML file; unknown keys are rejected so typos surface
/// instead of silently reverting to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerOptions {
    /// Count already-captured frames toward completion; otherwise each
    /// iteration starts from zero.
    pub remember_job_progress: bool,
    /// After one full pass completes, restart the whole list. Only honored
    /// when `remember_job_progress` is off.
    pub repeat_everything: bool,
    /// Enable lower-priority preemption and the group-fairness swap.
    pub greedy_scheduling: bool,

    /// Dither and guiding knobs feeding the duration heuristic.
    pub dither_enabled: bool,
    pub dither_frames: u32,
    pub dither_settle_secs: i64,
    pub guiding_settle_secs: i64,
    pub reset_guide_calibration: bool,

    /// Search step of the constraint walk, minutes.
    pub schedule_resolution_minutes: i64,
    /// Shift of the astronomical-twilight window, minutes.
    pub dawn_offset_minutes: i64,
    pub dusk_offset_minutes: i64,
    /// Correct computed altitudes for atmospheric refraction.
    pub apply_refraction: bool,

    /// Re-run aborted jobs as soon as constraints allow.
    pub reschedule_aborts_immediate: bool,
    /// Re-run aborted jobs after `abort_delay_secs`.
    pub reschedule_aborts_queue: bool,
    /// Re-run jobs that failed fatally, after `error_delay_secs`.
    pub reschedule_errors: bool,
    pub abort_delay_secs: i64,
    pub error_delay_secs: i64,

    /// When true, a FINISH_AT job's estimate is the interval to the
    /// deadline even if the sequence would finish sooner; when false the
    /// earlier of the two wins.
    pub finish_at_caps_estimate: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            remember_job_progress: false,
            repeat_everything: false,
            greedy_scheduling: true,
            dither_enabled: false,
            dither_frames: 1,
            dither_settle_secs: 0,
            guiding_settle_secs: 0,
            reset_guide_calibration: false,
            schedule_resolution_minutes: 2,
            dawn_offset_minutes: 0,
            dusk_offset_minutes: 0,
            apply_refraction: false,
            reschedule_aborts_immediate: false,
            reschedule_aborts_queue: true,
            reschedule_errors: false,
            abort_delay_secs: 600,
            error_delay_secs: 3600,
            finish_at_caps_estimate: true,
        }
    }
}

impl SchedulerOptions {
    /// Parse options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: SchedulerOptions =
            toml::from_str(text).context("failed to parse scheduler options")?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options file '{}'", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Reject contradictory or out-of-range values.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.schedule_resolution_minutes < 1 {
            return Err(PlanningError::Configuration(
                "schedule_resolution_minutes must be at least 1".into(),
            ));
        }
        if self.dither_frames == 0 {
            return Err(PlanningError::Configuration("dither_frames must be at least 1".into()));
        }
        if self.abort_delay_secs < 0 || self.error_delay_secs < 0 {
            return Err(PlanningError::Configuration("reschedule delays must not be negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = SchedulerOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.schedule_resolution_minutes, 2);
        assert!(options.greedy_scheduling);
        assert!(!options.remember_job_progress);
    }

    #[test]
    fn toml_overrides_defaults() {
        let options = SchedulerOptions::from_toml_str(
            r#"
            remember_job_progress = true
            dither_enabled = true
            dither_frames = 3
            abort_delay_secs = 120
            "#,
        )
        .unwrap();
        assert!(options.remember_job_progress);
        assert_eq!(options.dither_frames, 3);
        assert_eq!(options.abort_delay_secs, 120);
        // Untouched keys keep their defaults.
        assert_eq!(options.error_delay_secs, 3600);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(SchedulerOptions::from_toml_str("shcedule_resolution_minutes = 5").is_err());
    }

    #[test]
    fn zero_dither_frames_is_a_configuration_fault() {
        assert!(SchedulerOptions::from_toml_str("dither_frames = 0").is_err());
    }
}
