//! The scheduler job model.
//!
//! A [`Job`] is one observation unit: target, constraints, startup and
//! completion conditions, duration estimates, progress counters and the
//! transient state the planner writes on every pass. Jobs live in a
//! [`JobList`] arena; the lead/follower relation is expressed through
//! arena indices, so cloning the list gives the simulator a free deep copy.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::astro::EquatorialCoords;
use crate::models::sequence::CapturedFramesMap;
use crate::models::types::{
    CompletionCondition, EstimatedDuration, JobStage, JobState, StartupCondition, StepPipeline,
};

/// All planner instants carry an explicit offset from UTC.
pub type Timestamp = DateTime<FixedOffset>;

/// Index of a job within its owning [`JobList`].
pub type JobId = usize;

/// Sentinel meaning "no altitude floor".
pub const UNDEFINED_ALTITUDE: f64 = -90.0;

/// One rendered slot of the planned timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSchedule {
    /// The scheduled job, or `None` for per-job entries that already live
    /// on the job they describe.
    pub job: Option<JobId>,
    pub start_time: Timestamp,
    pub stop_time: Option<Timestamp>,
    pub stop_reason: String,
}

/// Cache of `next_possible_start_time` results, keyed on the searched
/// window. Cleared at the start of every planning pass, which keeps it
/// consistent without tracking geography or constraint edits.
#[derive(Debug, Clone, Default)]
pub struct StartTimeCache {
    computations: Vec<StartTimeComputation>,
}

#[derive(Debug, Clone)]
struct StartTimeComputation {
    from: Timestamp,
    until: Option<Timestamp>,
    result: Option<Timestamp>,
}

impl StartTimeCache {
    /// Look up a previous computation covering the requested window.
    /// Returns `Some(result)` on a hit, where the result itself may be
    /// `None` (no feasible time was found in the covered window).
    pub fn check(&self, from: Timestamp, until: Option<Timestamp>) -> Option<Option<Timestamp>> {
        for entry in &self.computations {
            match entry.result {
                // Constraints were unmet on [entry.from, result), so any
                // query starting inside that span has the same answer.
                Some(result) if from >= entry.from && from <= result => {
                    return match until {
                        Some(u) if result > u => Some(None),
                        _ => Some(Some(result)),
                    };
                }
                None if entry.from == from && entry.until == until => {
                    return Some(None);
                }
                _ => {}
            }
        }
        None
    }

    pub fn add(&mut self, from: Timestamp, until: Option<Timestamp>, result: Option<Timestamp>) {
        self.computations.push(StartTimeComputation { from, until, result });
    }

    pub fn clear(&mut self) {
        self.computations.clear();
    }
}

/// One observation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub is_lead: bool,
    /// Empty means "ungrouped".
    pub group: String,
    /// Opaque to the planner; forwarded to the executor.
    pub optical_train: String,

    /// J2000 catalog coordinates of the target.
    pub target: EquatorialCoords,
    pub position_angle: f64,
    /// URL/path of the capture sequence file.
    pub sequence_file: PathBuf,

    pub state: JobState,
    pub stage: JobStage,

    /// Lead/follower relation, by arena index.
    pub lead: Option<JobId>,
    pub followers: Vec<JobId>,

    /// Instant of the last state change; the greedy pass uses it to decide
    /// when aborted jobs may run again.
    pub state_time: Option<Timestamp>,
    pub last_abort_time: Option<Timestamp>,
    pub last_error_time: Option<Timestamp>,

    /// Original startup condition as entered by the user.
    pub file_startup_condition: StartupCondition,
    pub startup_condition: StartupCondition,
    pub completion_condition: CompletionCondition,

    /// Total captures required across all repeats.
    pub sequence_count: u32,
    pub completed_count: u32,
    pub completed_iterations: u32,

    /// User-pinned start instant for the AT startup condition.
    pub start_at_time: Option<Timestamp>,
    /// Startup instant calculated by the planner.
    pub startup_time: Option<Timestamp>,
    /// Completion deadline for the AT completion condition.
    pub finish_at_time: Option<Timestamp>,
    /// Next instant the planner will stop the job, and why.
    pub stop_time: Option<Timestamp>,
    pub stop_reason: String,

    /// Rendering hints computed when startup/stop are written.
    pub altitude_at_startup: f64,
    pub altitude_at_stop: f64,
    pub setting_at_startup: bool,
    pub setting_at_stop: bool,

    /// Degrees; `UNDEFINED_ALTITUDE` means no floor.
    pub min_altitude: f64,
    /// Degrees; negative disables.
    pub min_moon_separation: f64,
    /// Degrees; 90 disables.
    pub max_moon_altitude: f64,
    pub enforce_weather: bool,
    pub enforce_twilight: bool,
    pub enforce_artificial_horizon: bool,

    /// Twilight events bracketing the evaluated instant, kept for display.
    pub next_dawn: Option<Timestamp>,
    pub next_dusk: Option<Timestamp>,

    pub step_pipeline: StepPipeline,

    pub estimated_time: EstimatedDuration,
    pub estimated_time_per_repeat: i64,
    pub estimated_startup_time: i64,
    pub estimated_time_left_this_repeat: i64,

    pub repeats_required: u16,
    pub repeats_remaining: u16,

    pub in_sequence_focus: bool,
    /// Filter of the first LIGHT capture set, passed to the focus phase.
    pub initial_filter: String,
    pub light_frames_required: bool,
    pub calibration_mount_park: bool,

    /// Per-pass capture request map handed to the executor: signature to
    /// completed-count, telling it what remains to shoot this iteration.
    pub captured_frames_map: CapturedFramesMap,

    /// Simulated timeline slots for rendering.
    pub simulated_schedule: Vec<JobSchedule>,

    #[serde(skip)]
    pub start_time_cache: StartTimeCache,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_lead: true,
            group: String::new(),
            optical_train: String::new(),
            target: EquatorialCoords::default(),
            position_angle: -1.0,
            sequence_file: PathBuf::new(),
            state: JobState::Idle,
            stage: JobStage::Idle,
            lead: None,
            followers: Vec::new(),
            state_time: None,
            last_abort_time: None,
            last_error_time: None,
            file_startup_condition: StartupCondition::Asap,
            startup_condition: StartupCondition::Asap,
            completion_condition: CompletionCondition::Sequence,
            sequence_count: 0,
            completed_count: 0,
            completed_iterations: 0,
            start_at_time: None,
            startup_time: None,
            finish_at_time: None,
            stop_time: None,
            stop_reason: String::new(),
            altitude_at_startup: 0.0,
            altitude_at_stop: 0.0,
            setting_at_startup: false,
            setting_at_stop: false,
            min_altitude: UNDEFINED_ALTITUDE,
            min_moon_separation: -1.0,
            max_moon_altitude: 90.0,
            enforce_weather: false,
            enforce_twilight: false,
            enforce_artificial_horizon: false,
            next_dawn: None,
            next_dusk: None,
            step_pipeline: StepPipeline::none(),
            estimated_time: EstimatedDuration::NotEstimated,
            estimated_time_per_repeat: 0,
            estimated_startup_time: 0,
            estimated_time_left_this_repeat: 0,
            repeats_required: 1,
            repeats_remaining: 1,
            in_sequence_focus: false,
            initial_filter: String::new(),
            light_frames_required: false,
            calibration_mount_park: false,
            captured_frames_map: CapturedFramesMap::new(),
            simulated_schedule: Vec::new(),
            start_time_cache: StartTimeCache::default(),
        }
    }
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Whether a numeric altitude floor is set.
    pub fn has_min_altitude(&self) -> bool {
        self.min_altitude > UNDEFINED_ALTITUDE
    }

    /// Whether any altitude-shaped constraint applies.
    pub fn has_altitude_constraint(&self) -> bool {
        self.has_min_altitude() || self.enforce_artificial_horizon
    }

    /// Idle or aborted: not running and not excluded.
    pub fn is_stopped(&self) -> bool {
        matches!(self.state, JobState::Idle | JobState::Aborted)
    }

    /// Weak duplicate test: different entries with identical name and
    /// sequence file target the same storage, which is what completion
    /// accounting keys on.
    pub fn is_duplicate_of(&self, other: &Job) -> bool {
        !std::ptr::eq(self, other)
            && self.name == other.name
            && self.sequence_file == other.sequence_file
    }

    /// Change state, recording the instant and the per-state side effects.
    ///
    /// ABORTED records the abort instant, ERROR the error instant, INVALID
    /// additionally drops the estimates, and IDLE/ABORTED return the
    /// startup characteristics to the user's original setting. Follower
    /// propagation happens in [`JobList::set_state`].
    pub fn set_state(&mut self, value: JobState, now: Timestamp) {
        if self.state == value {
            return;
        }
        self.state = value;
        self.state_time = Some(now);
        match value {
            JobState::Aborted => {
                self.last_abort_time = Some(now);
                self.restore_file_startup();
            }
            JobState::Error => {
                self.last_error_time = Some(now);
            }
            JobState::Invalid => {
                self.restore_file_startup();
                self.clear_estimates();
            }
            JobState::Idle => {
                self.restore_file_startup();
                self.stage = JobStage::Idle;
                self.stop_time = None;
                self.stop_reason.clear();
            }
            _ => {}
        }
    }

    fn restore_file_startup(&mut self) {
        self.startup_condition = self.file_startup_condition;
        self.startup_time = match self.file_startup_condition {
            StartupCondition::At => self.start_at_time,
            StartupCondition::Asap => None,
        };
    }

    fn clear_estimates(&mut self) {
        self.estimated_time = EstimatedDuration::NotEstimated;
        self.estimated_time_per_repeat = 0;
        self.estimated_time_left_this_repeat = 0;
        self.estimated_startup_time = 0;
    }

    /// Return the job to its as-loaded shape: idle, original startup,
    /// duration not estimated, full repeat count, captured frames cleared.
    /// Never fails.
    pub fn reset(&mut self) {
        self.state = JobState::Idle;
        self.stage = JobStage::Idle;
        self.state_time = None;
        self.restore_file_startup();
        self.clear_estimates();
        self.repeats_remaining = self.repeats_required;
        self.captured_frames_map.clear();
        self.stop_time = None;
        self.stop_reason.clear();
        self.simulated_schedule.clear();
    }

    /// Human-readable "completed m/n captures" line for the log channel.
    pub fn progress_summary(&self) -> String {
        format!(
            "'{}' completed {}/{} captures",
            self.name, self.completed_count, self.sequence_count
        )
    }

    /// Whether `(azimuth, altitude)` clears both the numeric floor and, if
    /// enforced, the artificial-horizon profile at that azimuth. On failure
    /// the error carries a human-readable reason.
    pub fn satisfies_altitude_constraint(
        &self,
        azimuth_deg: f64,
        altitude_deg: f64,
        horizon: Option<&crate::models::ArtificialHorizon>,
    ) -> Result<(), String> {
        if self.has_min_altitude() && altitude_deg < self.min_altitude {
            return Err(format!(
                "target altitude {:.1} deg is below the minimum of {:.1} deg",
                altitude_deg, self.min_altitude
            ));
        }
        if self.enforce_artificial_horizon {
            if let Some(horizon) = horizon {
                if !horizon.is_above(azimuth_deg, altitude_deg) {
                    return Err(format!(
                        "target is behind the artificial horizon at azimuth {:.0} deg",
                        azimuth_deg
                    ));
                }
            }
        }
        Ok(())
    }

    /// Whether the Moon is far enough from the target and low enough in
    /// the sky at `when`. Disabled constraints (negative separation,
    /// 90-degree altitude ceiling) always pass.
    pub fn moon_constraints_ok(
        &self,
        when: Timestamp,
        geo: &crate::astro::GeoLocation,
    ) -> Result<(), String> {
        if self.min_moon_separation >= 0.0 {
            let separation = crate::astro::moon_separation(self.target, when);
            if separation < self.min_moon_separation {
                return Err(format!(
                    "Moon separation {:.1} deg is below the minimum of {:.1} deg",
                    separation, self.min_moon_separation
                ));
            }
        }
        if self.max_moon_altitude < 90.0 {
            let moon_altitude = crate::astro::moon_altitude(when, geo);
            if moon_altitude > self.max_moon_altitude {
                return Err(format!(
                    "Moon altitude {:.1} deg is above the maximum of {:.1} deg",
                    moon_altitude, self.max_moon_altitude
                ));
            }
        }
        Ok(())
    }

    pub fn clear_cache(&mut self) {
        self.start_time_cache.clear();
    }

    pub fn clear_simulated_schedule(&mut self) {
        self.simulated_schedule.clear();
    }
}

/// Arena of jobs. Priority order is list order: index 0 is highest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobList {
    jobs: Vec<Job>,
}

impl JobList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: Job) -> JobId {
        self.jobs.push(job);
        self.jobs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Job> {
        self.jobs.iter_mut()
    }

    pub fn ids(&self) -> std::ops::Range<JobId> {
        0..self.jobs.len()
    }

    /// Lead jobs only, in priority order. Followers are filtered out before
    /// evaluation; scheduling decisions propagate back to them.
    pub fn lead_ids(&self) -> Vec<JobId> {
        self.ids().filter(|&id| self.jobs[id].is_lead).collect()
    }

    /// The job whose shared attributes govern `id`: the lead when `id` is a
    /// follower, otherwise the job itself.
    pub fn effective(&self, id: JobId) -> &Job {
        match self.jobs[id].lead {
            Some(lead) => &self.jobs[lead],
            None => &self.jobs[id],
        }
    }

    /// Register `follower` under `lead` and synchronize the shared
    /// attributes immediately.
    pub fn attach_follower(&mut self, lead: JobId, follower: JobId) {
        assert!(lead != follower, "a job cannot follow itself");
        self.jobs[follower].is_lead = false;
        self.jobs[follower].lead = Some(lead);
        if !self.jobs[lead].followers.contains(&follower) {
            self.jobs[lead].followers.push(follower);
        }
        self.update_shared_follower_attributes(lead);
    }

    /// Copy every lead-owned attribute onto the followers, so plain reads
    /// on a follower observe the lead's values.
    pub fn update_shared_follower_attributes(&mut self, lead: JobId) {
        let followers = self.jobs[lead].followers.clone();
        for follower in followers {
            let source = self.jobs[lead].clone();
            let job = &mut self.jobs[follower];
            job.name = source.name;
            job.group = source.group;
            job.target = source.target;
            job.min_altitude = source.min_altitude;
            job.min_moon_separation = source.min_moon_separation;
            job.max_moon_altitude = source.max_moon_altitude;
            job.enforce_weather = source.enforce_weather;
            job.enforce_twilight = source.enforce_twilight;
            job.enforce_artificial_horizon = source.enforce_artificial_horizon;
            job.step_pipeline = source.step_pipeline;
            job.startup_condition = source.startup_condition;
            job.file_startup_condition = source.file_startup_condition;
            job.start_at_time = source.start_at_time;
            job.estimated_startup_time = source.estimated_startup_time;
            job.next_dawn = source.next_dawn;
            job.next_dusk = source.next_dusk;
            job.altitude_at_startup = source.altitude_at_startup;
            job.setting_at_startup = source.setting_at_startup;
            job.initial_filter = source.initial_filter;
        }
    }

    /// Set a job's state. A lead moving to COMPLETE (or any forced change)
    /// carries its followers along.
    pub fn set_state(&mut self, id: JobId, value: JobState, now: Timestamp, force: bool) {
        self.jobs[id].set_state(value, now);
        if self.jobs[id].is_lead && (force || value == JobState::Complete) {
            let followers = self.jobs[id].followers.clone();
            for follower in followers {
                self.jobs[follower].set_state(value, now);
            }
        }
    }

    pub fn clear_caches(&mut self) {
        for job in &mut self.jobs {
            job.clear_cache();
        }
    }

    /// Deep-copy a subset of jobs for simulation. Follower links are
    /// cleared in the copies so the scratch list never aliases real jobs.
    pub fn subset(&self, ids: &[JobId]) -> JobList {
        let mut copy = JobList::new();
        for &id in ids {
            let mut job = self.jobs[id].clone();
            job.followers.clear();
            job.lead = None;
            job.clear_simulated_schedule();
            copy.push(job);
        }
        copy
    }
}

impl std::ops::Index<JobId> for JobList {
    type Output = Job;
    fn index(&self, id: JobId) -> &Job {
        &self.jobs[id]
    }
}

impl std::ops::IndexMut<JobId> for JobList {
    fn index_mut(&mut self, id: JobId) -> &mut Job {
        &mut self.jobs[id]
    }
}

/// User-facing parameters consolidated into a job by [`setup_job`].
#[derive(Debug, Clone, Default)]
pub struct JobSetup {
    pub name: String,
    pub is_lead: bool,
    pub group: String,
    pub optical_train: String,
    pub target: EquatorialCoords,
    pub position_angle: f64,
    pub sequence_file: PathBuf,
    pub startup: StartupCondition,
    pub start_at: Option<Timestamp>,
    pub completion: CompletionCondition,
    pub finish_at: Option<Timestamp>,
    pub repeats: u16,
    pub min_altitude: f64,
    pub min_moon_separation: f64,
    pub max_moon_altitude: f64,
    pub enforce_weather: bool,
    pub enforce_twilight: bool,
    pub enforce_artificial_horizon: bool,
    pub steps: StepPipeline,
}

impl JobSetup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_lead: true,
            position_angle: -1.0,
            min_altitude: UNDEFINED_ALTITUDE,
            min_moon_separation: -1.0,
            max_moon_altitude: 90.0,
            ..Self::default()
        }
    }
}

/// Configure or reconfigure an observation job from user parameters, then
/// reset it so the next evaluation sees the changes.
pub fn setup_job(job: &mut Job, params: JobSetup) {
    job.is_lead = params.is_lead;
    job.optical_train = params.optical_train;
    job.position_angle = params.position_angle;

    if params.is_lead {
        job.name = params.name;
        job.group = params.group;
        job.lead = None;
        job.target = params.target;

        job.startup_condition = params.startup;
        job.file_startup_condition = params.startup;
        job.start_at_time = match params.startup {
            StartupCondition::At => params.start_at,
            StartupCondition::Asap => None,
        };
        job.startup_time = job.start_at_time;

        job.min_altitude = params.min_altitude;
        job.min_moon_separation = params.min_moon_separation;
        job.max_moon_altitude = params.max_moon_altitude;
        job.enforce_weather = params.enforce_weather;
        job.enforce_twilight = params.enforce_twilight;
        job.enforce_artificial_horizon = params.enforce_artificial_horizon;
        job.step_pipeline = params.steps;
    }

    // The sequence file is considered new: forget any capture bookkeeping.
    job.captured_frames_map.clear();
    job.sequence_file = params.sequence_file;
    job.completion_condition = params.completion;
    match params.completion {
        CompletionCondition::At => {
            job.finish_at_time = params.finish_at;
            job.repeats_required = 0;
        }
        CompletionCondition::Repeat => {
            job.finish_at_time = None;
            job.repeats_required = params.repeats;
        }
        CompletionCondition::Sequence => {
            job.finish_at_time = None;
            job.repeats_required = 1;
        }
        CompletionCondition::Loop => {
            job.finish_at_time = None;
            job.repeats_required = 0;
        }
    }
    job.reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32, minute: u32) -> Timestamp {
        FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 4, 17, hour, minute, 0)
            .unwrap()
    }

    fn basic_setup(name: &str) -> JobSetup {
        JobSetup {
            target: EquatorialCoords::new(188.2, 37.56),
            sequence_file: PathBuf::from("seq.json"),
            min_altitude: 30.0,
            steps: StepPipeline::all(),
            ..JobSetup::new(name)
        }
    }

    #[test]
    fn setup_enforces_condition_invariants() {
        let mut job = Job::default();

        setup_job(&mut job, basic_setup("seq"));
        assert_eq!(job.repeats_required, 1);
        assert_eq!(job.repeats_remaining, 1);
        assert!(job.finish_at_time.is_none());

        setup_job(
            &mut job,
            JobSetup {
                completion: CompletionCondition::Repeat,
                repeats: 4,
                ..basic_setup("rep")
            },
        );
        assert_eq!(job.repeats_required, 4);
        assert_eq!(job.repeats_remaining, 4);

        setup_job(
            &mut job,
            JobSetup { completion: CompletionCondition::Loop, ..basic_setup("loop") },
        );
        assert_eq!(job.repeats_required, 0);

        setup_job(
            &mut job,
            JobSetup {
                completion: CompletionCondition::At,
                finish_at: Some(ts(2, 0)),
                ..basic_setup("at")
            },
        );
        assert_eq!(job.repeats_required, 0);
        assert_eq!(job.finish_at_time, Some(ts(2, 0)));
    }

    #[test]
    fn reset_restores_user_original_startup() {
        let mut job = Job::default();
        setup_job(
            &mut job,
            JobSetup {
                startup: StartupCondition::At,
                start_at: Some(ts(23, 0)),
                ..basic_setup("pinned")
            },
        );
        job.startup_time = Some(ts(22, 0));
        job.estimated_time = EstimatedDuration::Seconds(100);
        job.reset();
        assert_eq!(job.state, JobState::Idle);
        assert_eq!(job.startup_time, Some(ts(23, 0)));
        assert_eq!(job.estimated_time, EstimatedDuration::NotEstimated);
        assert_eq!(job.repeats_remaining, job.repeats_required);
    }

    #[test]
    fn state_changes_record_instants() {
        let mut job = Job::new("j");
        job.set_state(JobState::Aborted, ts(1, 0));
        assert_eq!(job.last_abort_time, Some(ts(1, 0)));
        job.set_state(JobState::Error, ts(2, 0));
        assert_eq!(job.last_error_time, Some(ts(2, 0)));
        assert_eq!(job.state_time, Some(ts(2, 0)));
    }

    #[test]
    fn invalid_state_clears_estimates() {
        let mut job = Job::new("j");
        job.estimated_time = EstimatedDuration::Seconds(500);
        job.set_state(JobState::Invalid, ts(3, 0));
        assert_eq!(job.estimated_time, EstimatedDuration::NotEstimated);
    }

    #[test]
    fn duplicate_detection_is_name_and_sequence() {
        let mut a = Job::new("M81");
        a.sequence_file = PathBuf::from("m81.json");
        let mut b = Job::new("M81");
        b.sequence_file = PathBuf::from("m81.json");
        let mut c = Job::new("M81");
        c.sequence_file = PathBuf::from("other.json");
        assert!(a.is_duplicate_of(&b));
        assert!(!a.is_duplicate_of(&c));
        assert!(!a.is_duplicate_of(&a));
    }

    #[test]
    fn follower_reads_lead_values_and_completion_propagates() {
        let mut jobs = JobList::new();
        let mut lead = Job::new("lead");
        lead.min_altitude = 40.0;
        lead.group = "G".into();
        let lead_id = jobs.push(lead);
        let follower_id = jobs.push(Job::new("follower"));
        jobs.attach_follower(lead_id, follower_id);

        // Shared attributes are synchronized onto the follower.
        assert_eq!(jobs[follower_id].min_altitude, 40.0);
        assert_eq!(jobs[follower_id].name, "lead");
        assert_eq!(jobs.effective(follower_id).group, "G");

        // Lead completion marks the follower complete too.
        jobs.set_state(lead_id, JobState::Complete, ts(4, 0), false);
        assert_eq!(jobs[follower_id].state, JobState::Complete);
    }

    #[test]
    fn lead_filter_keeps_priority_order() {
        let mut jobs = JobList::new();
        let a = jobs.push(Job::new("a"));
        let b = jobs.push(Job::new("b"));
        let c = jobs.push(Job::new("c"));
        jobs.attach_follower(a, b);
        assert_eq!(jobs.lead_ids(), vec![a, c]);
    }

    #[test]
    fn start_time_cache_covers_queries_inside_window() {
        let mut cache = StartTimeCache::default();
        cache.add(ts(20, 0), None, Some(ts(23, 10)));
        // Query from inside the unmet span hits.
        assert_eq!(cache.check(ts(21, 0), None), Some(Some(ts(23, 10))));
        // Query bounded before the found instant reports infeasible.
        assert_eq!(cache.check(ts(21, 0), Some(ts(22, 0))), Some(None));
        // Query past the found instant misses.
        assert_eq!(cache.check(ts(23, 30), None), None);
        cache.clear();
        assert_eq!(cache.check(ts(21, 0), None), None);
    }
}
