//! Greedy job selection.
//!
//! Priority first: jobs are considered in list order, and the earliest
//! feasible start wins unless a lower-priority job can run a meaningful
//! chunk before the higher-priority one becomes feasible. Two overlays
//! temper strict priority: user-pinned START_AT jobs preempt anything that
//! would push them off their pinned time, and repeating group members that
//! have fallen behind on iterations are swapped in for their siblings.

use chrono::Duration;

use crate::astro;
use crate::config::SchedulerOptions;
use crate::models::{
    CapturedFramesMap, CompletionCondition, EstimatedDuration, Job, JobId, JobList, JobSchedule,
    JobState, StartupCondition, Timestamp,
};
use crate::scheduler::constraints::ConstraintEvaluator;
use crate::scheduler::estimator;
use crate::scheduler::log::EvaluationLog;
use crate::state::ModuleState;

/// Minimum runtime a job must get before being preempted by a
/// higher-priority one.
pub const MIN_RUN_SECS: i64 = 600;
/// Maximum wait to preempt the currently running job for another one.
pub const MAX_INTERRUPT_SECS: i64 = 30;
/// A START_AT job is promoted when its feasible start lands within this
/// window of the user-pinned time.
const START_AT_WINDOW_SECS: i64 = 20 * 60;
/// Forward-simulation horizon.
pub const SIM_HOURS: i64 = 48;

/// How much of the future a selection call explores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationType {
    /// Simulate the full horizon and render every slot.
    Simulate,
    /// Stop as soon as every allowed job has one slot.
    SimulateEachJobOnce,
    /// Just pick the next job.
    DontSimulate,
}

/// Outcome of one selection: the chosen job, its start, and the next
/// instant (and reason) a higher-priority job would take over.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub job: Option<JobId>,
    pub when: Option<Timestamp>,
    pub next_interruption: Option<Timestamp>,
    pub interrupt_reason: String,
}

/// The greedy planning engine.
pub struct GreedyScheduler {
    options: SchedulerOptions,
    schedule: Vec<JobSchedule>,
    scheduled_job: Option<JobId>,
    pub(crate) sim_seconds: f64,
    last_check_job_sim: Option<Timestamp>,
}

impl GreedyScheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self {
            options,
            schedule: Vec::new(),
            scheduled_job: None,
            sim_seconds: 0.0,
            last_check_job_sim: None,
        }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Adjust the error-handling parameters between passes.
    pub fn set_error_handling(
        &mut self,
        reschedule_aborts_immediate: bool,
        reschedule_aborts_queue: bool,
        reschedule_errors: bool,
        abort_delay_secs: i64,
        error_delay_secs: i64,
    ) {
        self.options.reschedule_aborts_immediate = reschedule_aborts_immediate;
        self.options.reschedule_aborts_queue = reschedule_aborts_queue;
        self.options.reschedule_errors = reschedule_errors;
        self.options.abort_delay_secs = abort_delay_secs;
        self.options.error_delay_secs = error_delay_secs;
    }

    /// The timeline emitted by the last full pass, start-ascending.
    pub fn schedule(&self) -> &[JobSchedule] {
        &self.schedule
    }

    pub(crate) fn push_schedule_entry(&mut self, entry: JobSchedule) {
        self.schedule.push(entry);
    }

    pub fn scheduled_job(&self) -> Option<JobId> {
        self.scheduled_job
    }

    /// Full planning pass: clear caches, prepare and estimate every job,
    /// select the next one among the leads, and simulate the horizon.
    /// Returns the selected job, already moved to SCHEDULED with its
    /// startup time set.
    pub fn schedule_jobs(
        &mut self,
        jobs: &mut JobList,
        state: &ModuleState,
        now: Timestamp,
        captured: &CapturedFramesMap,
        mut log: Option<&mut EvaluationLog>,
    ) -> Option<JobId> {
        jobs.clear_caches();
        self.scheduled_job = None;
        self.schedule.clear();

        let all_ids: Vec<JobId> = jobs.ids().collect();
        self.prepare_jobs_for_evaluation(jobs, &all_ids, now, captured, log.as_deref_mut(), true);

        // Only lead jobs are scheduled; decisions propagate to followers.
        let lead_ids = jobs.lead_ids();
        let selection = self.select_next_job(
            jobs,
            &lead_ids,
            state,
            now,
            None,
            SimulationType::Simulate,
            Some(captured),
        );
        self.scheduled_job = selection.job;

        if let Some(log) = log.as_deref_mut() {
            if !self.schedule.is_empty() {
                // Most recent line on top in the caller's log window.
                for entry in self.schedule.iter().rev() {
                    log.info(job_schedule_string(jobs, entry));
                }
                log.info(format!(
                    "Scheduler plan for the next {SIM_HOURS} hours starting {}",
                    now.format("%Y-%m-%d %H:%M")
                ));
            } else if !jobs.is_empty() {
                self.explain_unrunnable_jobs(jobs, &all_ids, state, now, log);
            }
        }

        if let Some(job_id) = selection.job {
            log::debug!(
                "greedy scheduler selected job '{}' at {:?}",
                jobs[job_id].name,
                selection.when
            );
            jobs.set_state(job_id, JobState::Scheduled, now, false);
            jobs[job_id].startup_time = selection.when;
            refresh_edge_hints(&mut jobs[job_id], state, &self.options);
        }

        jobs.clear_caches();
        selection.job
    }

    /// Per-job diagnostics when nothing is runnable: the blocking reason
    /// now and twelve hours from now, so users can tell "tonight is full"
    /// from "this job can never run".
    fn explain_unrunnable_jobs(
        &self,
        jobs: &mut JobList,
        ids: &[JobId],
        state: &ModuleState,
        now: Timestamp,
        log: &mut EvaluationLog,
    ) {
        let options = self.options.clone();
        let evaluator = ConstraintEvaluator::new(state, &options);
        for (label, probe) in [("in 12 hours", now + Duration::hours(12)), ("now", now)] {
            for (position, &id) in ids.iter().enumerate().rev() {
                let (_, reason) =
                    evaluator.next_end_time(&mut jobs[id], probe, Some(probe + Duration::hours(1)));
                let reason = if reason.is_empty() {
                    "no blocking constraint near this time".to_string()
                } else {
                    reason
                };
                log.info(format!(
                    "({}) '{}' {}: cannot run because: {}",
                    position + 1,
                    jobs[id].name,
                    label,
                    reason
                ));
            }
        }
        log.info("No jobs are runnable for the next 3 days.");
    }

    /// Periodic re-evaluation of the running job. True means keep running;
    /// false means a different job should take over within a second.
    pub fn check_job(
        &mut self,
        jobs: &mut JobList,
        ids: &[JobId],
        state: &ModuleState,
        now: Timestamp,
        current_job: JobId,
    ) -> bool {
        // Don't interrupt a job that just started.
        if let Some(state_time) = jobs[current_job].state_time {
            if (now - state_time).num_seconds() < 5 {
                return true;
            }
        }

        // Simulating here only refreshes the rendered schedule; skip it
        // when the last simulation was slow or recent.
        let mut sim_type = SimulationType::SimulateEachJobOnce;
        if self.sim_seconds > 0.5
            || self.last_check_job_sim.is_some_and(|t| (now - t).num_seconds() < 60)
        {
            sim_type = SimulationType::DontSimulate;
        }

        let selection =
            self.select_next_job(jobs, ids, state, now, Some(current_job), sim_type, None);
        let continues = selection.job == Some(current_job)
            && selection.when.is_some_and(|when| (when - now).num_seconds() <= 1);
        if continues {
            if sim_type != SimulationType::DontSimulate {
                self.last_check_job_sim = Some(now);
            }
            true
        } else {
            log::debug!(
                "greedy scheduler bumping job '{}' for '{}'",
                jobs[current_job].name,
                selection.job.map_or("---", |id| jobs[id].name.as_str())
            );
            false
        }
    }

    /// Transition every job into the state evaluation expects and
    /// (re-)estimate durations.
    ///
    /// FINISH_AT jobs whose deadline passed and repeat jobs with no
    /// batches left complete immediately; everything else that is not
    /// INVALID or COMPLETE moves to EVALUATION (ERROR and ABORTED keep
    /// their state so their delay timestamps survive). Estimation failures
    /// invalidate the job; zero estimates complete it, followers included.
    pub fn prepare_jobs_for_evaluation(
        &self,
        jobs: &mut JobList,
        ids: &[JobId],
        now: Timestamp,
        captured: &CapturedFramesMap,
        mut log: Option<&mut EvaluationLog>,
        reestimate: bool,
    ) {
        // Retire finished jobs before state mapping.
        for &id in ids {
            jobs[id].clear_simulated_schedule();
            match jobs[id].completion_condition {
                CompletionCondition::At => {
                    if jobs[id].finish_at_time.is_some_and(|t| t < now) {
                        jobs.set_state(id, JobState::Complete, now, false);
                    }
                }
                CompletionCondition::Repeat => {
                    if jobs[id].repeats_remaining == 0 {
                        if let Some(log) = log.as_deref_mut() {
                            log.info(format!(
                                "Job '{}' has no more batches remaining.",
                                jobs[id].name
                            ));
                        }
                        jobs.set_state(id, JobState::Complete, now, false);
                        jobs[id].estimated_time = EstimatedDuration::Complete;
                    }
                }
                _ => {}
            }
        }

        for &id in ids {
            match jobs[id].state {
                JobState::Invalid | JobState::Complete => {}
                JobState::Error | JobState::Aborted => {}
                _ => jobs.set_state(id, JobState::Evaluation, now, false),
            }
        }

        for &id in ids {
            if matches!(jobs[id].state, JobState::Invalid | JobState::Complete) {
                continue;
            }
            if reestimate {
                jobs[id].estimated_time = EstimatedDuration::NotEstimated;
                if !estimator::estimate_job_time(
                    &mut jobs[id],
                    captured,
                    &self.options,
                    now,
                    log.as_deref_mut(),
                ) {
                    jobs.set_state(id, JobState::Invalid, now, false);
                    continue;
                }
            }
            if jobs[id].estimated_time.is_complete() {
                jobs[id].repeats_remaining = 0;
                jobs.set_state(id, JobState::Complete, now, true);
            }
        }
    }

    /// Pick the best job to run at `now` among `ids` (highest priority
    /// first). With a `current_job`, evaluates whether that job should
    /// keep running instead. Simulation types other than `DontSimulate`
    /// additionally fill the rendered schedule.
    #[allow(clippy::too_many_arguments)]
    pub fn select_next_job(
        &mut self,
        jobs: &mut JobList,
        ids: &[JobId],
        state: &ModuleState,
        now: Timestamp,
        current_job: Option<JobId>,
        sim_type: SimulationType,
        captured: Option<&CapturedFramesMap>,
    ) -> Selection {
        let options = self.options.clone();
        let evaluator = ConstraintEvaluator::new(state, &options);

        // Never preempt a user-pinned start, except for another one.
        let current_is_start_at = current_job.is_some_and(|id| {
            jobs[id].file_startup_condition == StartupCondition::At
                && jobs[id].start_at_time.is_some()
        });

        let mut next_job: Option<JobId> = None;
        let mut next_start: Option<Timestamp> = None;
        let mut next_interruption: Option<Timestamp> = None;
        let mut interrupt_reason = String::new();

        for &id in ids {
            let evaluating_current = current_job == Some(id);

            if !allow_job(&jobs[id], &options) {
                continue;
            }

            let start_searching_at = first_possible_start(&jobs[id], now, &options);
            let start_time = evaluator.next_possible_start_time(
                &mut jobs[id],
                start_searching_at,
                evaluating_current,
                None,
            );

            match start_time {
                Some(start_time) => {
                    if next_job.is_none() {
                        // First solution; best so far.
                        next_job = Some(id);
                        next_start = Some(start_time);
                        next_interruption = None;
                        interrupt_reason.clear();
                    } else if options.greedy_scheduling {
                        let run_secs =
                            if evaluating_current { MAX_INTERRUPT_SECS } else { MIN_RUN_SECS };
                        if evaluating_current && current_is_start_at {
                            next_job = Some(id);
                            next_start = Some(start_time);
                            next_interruption = None;
                            interrupt_reason.clear();
                        } else if (next_start.unwrap() - start_time).num_seconds() > run_secs {
                            // The lower-priority job runs a meaningful
                            // chunk before the earlier pick becomes
                            // feasible and bumps it.
                            next_interruption = next_start;
                            interrupt_reason =
                                format!("interrupted by '{}'", jobs[next_job.unwrap()].name);
                            next_job = Some(id);
                            next_start = Some(start_time);
                        }
                    }
                    // A pick close to now cannot be displaced by anything
                    // below it in priority.
                    if current_job.is_none()
                        && next_start.is_some_and(|ns| (ns - now).num_seconds() < MIN_RUN_SECS)
                    {
                        break;
                    }
                }
                None if evaluating_current => {
                    // The running job has no feasible start; stop it.
                    return Selection::default();
                }
                None => {}
            }

            if evaluating_current {
                break;
            }
        }

        if next_job.is_some() {
            self.apply_start_at_overlay(
                jobs,
                ids,
                &evaluator,
                now,
                current_job,
                &mut next_job,
                &mut next_start,
                &mut next_interruption,
                &mut interrupt_reason,
            );
            self.apply_group_fairness(
                jobs,
                ids,
                &evaluator,
                now,
                current_job,
                current_is_start_at,
                &mut next_job,
                &mut next_start,
                &mut next_interruption,
                &mut interrupt_reason,
            );
        }

        // Jobs left in EVALUATION read as busy in the UI; idle them when
        // nothing was chosen (simulation does the same for chosen passes).
        if next_job.is_none() {
            self.unset_evaluation(jobs, ids, now);
        }

        if sim_type != SimulationType::DontSimulate && next_job.is_some() {
            let timer = std::time::Instant::now();
            let limit = now + Duration::hours(SIM_HOURS);
            self.schedule.clear();
            let mut sim_end = self.simulate(jobs, ids, state, now, limit, captured, sim_type);

            // "Repeat after completion" restarts the whole list, bounded,
            // and only applies without remembered progress.
            if !self.options.remember_job_progress && self.options.repeat_everything {
                let mut rounds = 0;
                while let Some(end) = sim_end {
                    if end >= limit {
                        break;
                    }
                    rounds += 1;
                    if rounds >= 5 {
                        break;
                    }
                    sim_end = self.simulate(
                        jobs,
                        ids,
                        state,
                        end + Duration::seconds(60),
                        limit,
                        None,
                        sim_type,
                    );
                }
            }
            self.sim_seconds = timer.elapsed().as_secs_f64();
        }

        Selection { job: next_job, when: next_start, next_interruption, interrupt_reason }
    }

    /// START_AT jobs get highest priority irrespective of list order, as
    /// long as they can start near their pinned time. An on-time START_AT
    /// job either takes the slot or is recorded as the interruption.
    #[allow(clippy::too_many_arguments)]
    fn apply_start_at_overlay(
        &self,
        jobs: &mut JobList,
        ids: &[JobId],
        evaluator: &ConstraintEvaluator<'_>,
        now: Timestamp,
        current_job: Option<JobId>,
        next_job: &mut Option<JobId>,
        next_start: &mut Option<Timestamp>,
        next_interruption: &mut Option<Timestamp>,
        interrupt_reason: &mut String,
    ) {
        for &id in ids {
            if Some(id) == *next_job {
                continue;
            }
            if jobs[id].file_startup_condition != StartupCondition::At {
                continue;
            }
            let Some(at_time) = jobs[id].start_at_time else { continue };
            if !allow_job(&jobs[id], &self.options) {
                continue;
            }

            let start_searching_at = first_possible_start(&jobs[id], now, &self.options);
            let evaluating_current = current_job == Some(id);
            let Some(at_job_start) = evaluator.next_possible_start_time(
                &mut jobs[id],
                start_searching_at,
                evaluating_current,
                None,
            ) else {
                continue;
            };

            // Gap between the pinned time and when it can actually start,
            // given altitude, twilight and the rest.
            let start_delta = (at_time - at_job_start).num_seconds();
            if start_delta.abs() >= START_AT_WINDOW_SECS {
                continue;
            }

            // Interrupting a running job requires the START_AT job to be
            // ready essentially now.
            let gap = if current_job.is_none() { MIN_RUN_SECS } else { 30 };
            if (at_job_start - next_start.unwrap()).num_seconds() <= gap {
                *next_job = Some(id);
                *next_start = Some(at_job_start);
                *next_interruption = None;
                interrupt_reason.clear();
            } else if next_interruption.is_none()
                || next_interruption.is_some_and(|ni| ni < at_job_start)
            {
                *next_interruption = Some(at_job_start);
                *interrupt_reason = format!("interrupted by '{}'", jobs[id].name);
            }
        }
    }

    /// Swap in a lower-priority member of the chosen job's group when it
    /// has completed fewer iterations and can start at essentially the
    /// same time. Trades strict priority for round-robin inside a group.
    #[allow(clippy::too_many_arguments)]
    fn apply_group_fairness(
        &self,
        jobs: &mut JobList,
        ids: &[JobId],
        evaluator: &ConstraintEvaluator<'_>,
        now: Timestamp,
        current_job: Option<JobId>,
        current_is_start_at: bool,
        next_job: &mut Option<JobId>,
        next_start: &mut Option<Timestamp>,
        next_interruption: &mut Option<Timestamp>,
        interrupt_reason: &mut String,
    ) {
        let Some(chosen) = *next_job else { return };
        if jobs[chosen].group.is_empty()
            || !self.options.greedy_scheduling
            || jobs[chosen].completed_iterations == 0
        {
            return;
        }

        let mut found_selected = false;
        for &id in ids {
            let selected = next_job.unwrap();
            if id == selected {
                found_selected = true;
                continue;
            }
            // Higher-priority members were already considered and lost.
            if !found_selected
                || jobs[id].group != jobs[selected].group
                || jobs[id].completed_iterations >= jobs[selected].completed_iterations
                || !allow_job(&jobs[id], &self.options)
            {
                continue;
            }

            let evaluating_current = current_job == Some(id);
            let start_searching_at = first_possible_start(&jobs[id], now, &self.options);
            let Some(start_time) = evaluator.next_possible_start_time(
                &mut jobs[id],
                start_searching_at,
                evaluating_current,
                None,
            ) else {
                continue;
            };

            // Only members that can start when the chosen job would.
            if (next_start.unwrap() - start_time).num_seconds() > MAX_INTERRUPT_SECS {
                continue;
            }

            if evaluating_current && current_is_start_at {
                *next_job = Some(id);
                *next_start = Some(start_time);
                *next_interruption = None;
                interrupt_reason.clear();
            } else if (next_start.unwrap() - start_time).num_seconds() >= -MAX_INTERRUPT_SECS {
                // Use this group member, keeping the interruption already
                // computed for the slot.
                *next_job = Some(id);
                *next_start = Some(start_time);
            }
        }
    }

    /// Jobs still in EVALUATION go back to IDLE.
    pub(crate) fn unset_evaluation(&self, jobs: &mut JobList, ids: &[JobId], now: Timestamp) {
        for &id in ids {
            if jobs[id].state == JobState::Evaluation {
                jobs.set_state(id, JobState::Idle, now, false);
            }
        }
    }
}

/// Whether a job may be scheduled at all: INVALID and COMPLETE never,
/// ABORTED only when a reschedule-aborts option is on, ERROR only when
/// errors are rescheduled.
pub(crate) fn allow_job(job: &Job, options: &SchedulerOptions) -> bool {
    match job.state {
        JobState::Invalid | JobState::Complete => false,
        JobState::Aborted => {
            options.reschedule_aborts_immediate || options.reschedule_aborts_queue
        }
        JobState::Error => options.reschedule_errors,
        _ => true,
    }
}

/// First instant the job may be scheduled, before constraints: now, or the
/// abort/error instant plus the configured delay.
pub(crate) fn first_possible_start(
    job: &Job,
    now: Timestamp,
    options: &SchedulerOptions,
) -> Timestamp {
    let mut possible_start = now;
    if options.reschedule_aborts_queue {
        if let Some(abort_time) = job.last_abort_time {
            let delayed = abort_time + Duration::seconds(options.abort_delay_secs);
            if delayed > possible_start {
                possible_start = delayed;
            }
        }
    }
    if options.reschedule_errors {
        if let Some(error_time) = job.last_error_time {
            let delayed = error_time + Duration::seconds(options.error_delay_secs);
            if delayed > possible_start {
                possible_start = delayed;
            }
        }
    }
    possible_start
}

/// One schedule row for the log window.
pub fn job_schedule_string(jobs: &JobList, entry: &JobSchedule) -> String {
    let name = entry.job.map_or("---", |id| jobs[id].name.as_str());
    let stop = entry
        .stop_time
        .map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string());
    format!(
        "{:<10}\t{} --> {} \t{}",
        name,
        entry.start_time.format("%m/%d %H:%M"),
        stop,
        entry.stop_reason
    )
}

/// Altitude and direction-of-motion hints recorded whenever startup/stop
/// times are written, so the UI can annotate the schedule.
pub(crate) fn refresh_edge_hints(job: &mut Job, state: &ModuleState, options: &SchedulerOptions) {
    if let Some(startup) = job.startup_time {
        let position =
            astro::find_altitude(job.target, startup, state.geo(), options.apply_refraction);
        job.altitude_at_startup = position.altitude_deg;
        job.setting_at_startup = position.is_setting;
    }
    if let Some(stop) = job.stop_time {
        let position =
            astro::find_altitude(job.target, stop, state.geo(), options.apply_refraction);
        job.altitude_at_stop = position.altitude_deg;
        job.setting_at_stop = position.is_setting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn ts(hour: u32, minute: u32) -> Timestamp {
        FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 4, 17, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn allow_job_respects_error_handling_options() {
        let mut options = SchedulerOptions::default();
        options.reschedule_aborts_immediate = false;
        options.reschedule_aborts_queue = false;
        options.reschedule_errors = false;

        let mut job = Job::new("j");
        job.state = JobState::Aborted;
        assert!(!allow_job(&job, &options));
        options.reschedule_aborts_queue = true;
        assert!(allow_job(&job, &options));

        job.state = JobState::Error;
        assert!(!allow_job(&job, &options));
        options.reschedule_errors = true;
        assert!(allow_job(&job, &options));

        job.state = JobState::Invalid;
        assert!(!allow_job(&job, &options));
        job.state = JobState::Complete;
        assert!(!allow_job(&job, &options));
    }

    #[test]
    fn aborted_jobs_wait_out_the_configured_delay() {
        let options = SchedulerOptions {
            reschedule_aborts_queue: true,
            abort_delay_secs: 600,
            ..SchedulerOptions::default()
        };
        let now = ts(1, 0);
        let mut job = Job::new("j");
        assert_eq!(first_possible_start(&job, now, &options), now);

        job.last_abort_time = Some(ts(0, 55));
        assert_eq!(first_possible_start(&job, now, &options), ts(1, 5));

        // An abort further back than the delay does not push the start.
        job.last_abort_time = Some(ts(0, 30));
        assert_eq!(first_possible_start(&job, now, &options), now);
    }

    #[test]
    fn error_delay_applies_only_when_errors_are_rescheduled() {
        let mut options = SchedulerOptions::default();
        options.error_delay_secs = 3600;
        let now = ts(1, 0);
        let mut job = Job::new("j");
        job.last_error_time = Some(ts(0, 50));

        options.reschedule_errors = false;
        assert_eq!(first_possible_start(&job, now, &options), now);
        options.reschedule_errors = true;
        assert_eq!(first_possible_start(&job, now, &options), ts(1, 50));
    }

    #[test]
    fn set_error_handling_overrides_the_initial_options() {
        let mut scheduler = GreedyScheduler::new(SchedulerOptions::default());
        scheduler.set_error_handling(true, true, true, 120, 240);
        assert!(scheduler.options().reschedule_aborts_immediate);
        assert!(scheduler.options().reschedule_errors);
        assert_eq!(scheduler.options().abort_delay_secs, 120);
        assert_eq!(scheduler.options().error_delay_secs, 240);
    }

    #[test]
    fn schedule_rows_render_name_and_times() {
        let mut jobs = JobList::new();
        let id = jobs.push(Job::new("M101"));
        let entry = JobSchedule {
            job: Some(id),
            start_time: ts(21, 30),
            stop_time: Some(ts(23, 45)),
            stop_reason: "job completion".into(),
        };
        let row = job_schedule_string(&jobs, &entry);
        assert!(row.contains("M101"));
        assert!(row.contains("04/17 21:30"));
        assert!(row.contains("23:45"));
        assert!(row.contains("job completion"));
    }
}
