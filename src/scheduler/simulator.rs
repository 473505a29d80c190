//! Forward timeline simulation.
//!
//! Starting from a selection instant, repeatedly pick the next job, decide
//! when and why its slot ends (preemption, constraint failure, estimated
//! completion, or a pinned START_AT job taking over), and advance the
//! simulated clock until the horizon. The simulation runs on a deep copy
//! of the jobs so it can mutate state freely; only the output fields
//! (state, startup, stop, reason, rendered slots) are reflected onto the
//! real jobs afterwards.

use std::collections::{HashMap, HashSet};

use chrono::Duration;

use crate::models::{
    CapturedFramesMap, CompletionCondition, JobId, JobList, JobSchedule, JobState,
    StartupCondition, Timestamp,
};
use crate::scheduler::constraints::ConstraintEvaluator;
use crate::scheduler::greedy::{
    allow_job, refresh_edge_hints, GreedyScheduler, SimulationType,
};
use crate::state::ModuleState;

/// Gap between consecutive simulated slots.
const SLOT_ADVANCE_SECS: i64 = 60;
/// Hard floor of the slot-iteration budget.
const MIN_ITERATIONS: usize = 20;
/// Budget of the group-repeat sub-loop.
const MAX_REPEAT_PROBES: usize = 20;

impl GreedyScheduler {
    /// Simulate selection forward from `time` until `end_time`, appending
    /// rendered slots to the schedule and reflecting the outcome onto the
    /// original jobs.
    ///
    /// Returns the stop instant of the last simulated slot, or `None` when
    /// the iteration budget stopped progress (the first chosen job is
    /// still committed by the caller).
    #[allow(clippy::too_many_arguments)]
    pub fn simulate(
        &mut self,
        jobs: &mut JobList,
        ids: &[JobId],
        state: &ModuleState,
        time: Timestamp,
        end_time: Timestamp,
        captured: Option<&CapturedFramesMap>,
        sim_type: SimulationType,
    ) -> Option<Timestamp> {
        let options = self.options().clone();
        let resolution_secs = options.schedule_resolution_minutes * 60;

        // Scratch copies; follower links are cleared so nothing aliases.
        let mut sim = jobs.subset(ids);
        let sim_ids: Vec<JobId> = sim.ids().collect();
        for &id in ids {
            jobs[id].stop_time = None;
        }

        // Reset simulated start times to the user's original setting and
        // count how many jobs could be given a first slot.
        let mut startup_candidates = 0;
        for job in sim.iter_mut() {
            job.startup_time = match job.file_startup_condition {
                StartupCondition::At => job.start_at_time,
                StartupCondition::Asap => None,
            };
            if matches!(
                job.state,
                JobState::Scheduled | JobState::Evaluation | JobState::Busy | JobState::Idle
            ) {
                startup_candidates += 1;
            }
        }

        let captured_copy = captured.cloned().unwrap_or_default();
        // Re-prepare without re-estimating, keeping the simulation
        // deterministic with respect to the real pass.
        self.prepare_jobs_for_evaluation(&mut sim, &sim_ids, time, &captured_copy, None, false);

        let mut work_done: HashMap<JobId, i64> = sim_ids.iter().map(|&id| (id, 0)).collect();
        let mut original_iteration: HashMap<JobId, u32> = HashMap::new();
        let mut original_secs_left: HashMap<JobId, i64> = HashMap::new();
        let mut scheduled_scratch: HashSet<JobId> = HashSet::new();

        let mut sim_time = time;
        let mut sim_end_time: Option<Timestamp> = None;
        let mut iterations = 0usize;
        let mut exceeded_iterations = false;

        loop {
            let selection = self.select_next_job(
                &mut sim,
                &sim_ids,
                state,
                sim_time,
                None,
                SimulationType::DontSimulate,
                None,
            );
            let Some(selected) = selection.job else { break };
            let Some(job_start) = selection.when else { break };
            if job_start > end_time {
                break;
            }

            // A pinned START_AT job can preempt this slot regardless of
            // priority; find the soonest one ahead of the slot start.
            let mut next_start_at: Option<Timestamp> = None;
            for &id in &sim_ids {
                if id != selected
                    && sim[id].startup_condition == StartupCondition::At
                    && matches!(sim[id].state, JobState::Evaluation | JobState::Scheduled)
                {
                    if let Some(pinned) = sim[id].startup_time {
                        if pinned > job_start && next_start_at.map_or(true, |cur| pinned < cur) {
                            next_start_at = Some(pinned);
                        }
                    }
                }
            }

            let mut constraint_stop_time = selection.next_interruption;
            if let Some(pinned) = next_start_at {
                if constraint_stop_time.map_or(true, |cur| pinned < cur) {
                    constraint_stop_time = Some(pinned);
                }
            }

            // When this slot would fail its constraints, and why.
            let evaluator = ConstraintEvaluator::new(state, &options);
            let (job_constraint_time, mut constraint_reason) =
                evaluator.next_end_time(&mut sim[selected], job_start, constraint_stop_time);
            if let (Some(pinned), Some(constraint_time)) = (next_start_at, job_constraint_time) {
                if (constraint_time - pinned).num_seconds().abs() < 2 * resolution_secs {
                    constraint_reason = "interrupted by start-at job".into();
                }
            }

            // When the job would complete, were it never interrupted.
            let job_completion_time = sim[selected]
                .estimated_time
                .known_seconds()
                .filter(|&est| est > 0)
                .map(|est| job_start + Duration::seconds(est - work_done[&selected]));

            // The soonest of preemption, constraint failure and completion
            // decides the slot's stop time and reason.
            let mut stop_time = selection.next_interruption;
            let mut stop_reason =
                if stop_time.is_some() { selection.interrupt_reason.clone() } else { String::new() };
            if let Some(constraint_time) = job_constraint_time {
                if stop_time.map_or(true, |cur| constraint_time < cur) {
                    stop_time = Some(constraint_time);
                    stop_reason = constraint_reason;
                }
            }
            if let Some(completion_time) = job_completion_time {
                if stop_time.map_or(true, |cur| completion_time < cur) {
                    stop_time = Some(completion_time);
                    stop_reason = "job completion".into();
                }
            }

            // Repeating group members hand the slot over at iteration
            // boundaries: advance one repeat at a time and re-query the
            // selector until it switches to a sibling.
            if !sim[selected].group.is_empty()
                && matches!(
                    sim[selected].completion_condition,
                    CompletionCondition::Loop
                        | CompletionCondition::Repeat
                        | CompletionCondition::At
                )
            {
                original_iteration
                    .entry(selected)
                    .or_insert_with(|| sim[selected].completed_iterations);
                original_secs_left
                    .entry(selected)
                    .or_insert_with(|| sim[selected].estimated_time_left_this_repeat);

                let left_this_repeat = sim[selected].estimated_time_left_this_repeat;
                let secs_per_repeat = sim[selected].estimated_time_per_repeat;
                let done = work_done[&selected];
                let mut secs_left_this_repeat =
                    if done < left_this_repeat { left_this_repeat - done } else { secs_per_repeat };
                if done == 0 {
                    secs_left_this_repeat += sim[selected].estimated_startup_time;
                }

                if secs_left_this_repeat > 0
                    && stop_time
                        .map_or(true, |st| secs_left_this_repeat < (st - job_start).num_seconds())
                {
                    let keep = sim[selected].clone();
                    let mut t = job_start + Duration::seconds(secs_left_this_repeat);
                    let mut iteration = sim[selected].completed_iterations;
                    let mut probes = 0;
                    while stop_time.map_or(true, |st| t < st) && probes < MAX_REPEAT_PROBES {
                        probes += 1;
                        iteration += 1;
                        sim[selected].completed_iterations = iteration;
                        let next = self.select_next_job(
                            &mut sim,
                            &sim_ids,
                            state,
                            t,
                            None,
                            SimulationType::DontSimulate,
                            None,
                        );
                        if next.job != Some(selected) {
                            stop_reason = "interrupted for group member".into();
                            stop_time = Some(t);
                            break;
                        }
                        t += Duration::seconds(secs_per_repeat.max(1));
                    }
                    sim[selected] = keep;
                }
            }

            // Credit the work done so the next slot of this job in the
            // simulation starts from the right place.
            if let Some(stop) = stop_time {
                let secs_run = (stop - job_start).num_seconds();
                *work_done.get_mut(&selected).unwrap() += secs_run;

                if let (Some(&orig_iter), Some(&orig_left)) =
                    (original_iteration.get(&selected), original_secs_left.get(&selected))
                {
                    let done = work_done[&selected];
                    let per_repeat = sim[selected].estimated_time_per_repeat;
                    let mut completed = orig_iter;
                    if done >= orig_left && per_repeat > 0 {
                        completed = orig_iter + 1 + ((done - orig_left) / per_repeat) as u32;
                    }
                    sim[selected].completed_iterations = completed;
                }
            }

            // First slot of a job defines its displayed startup.
            if sim[selected].startup_time.is_none() {
                sim[selected].startup_time = Some(job_start);
                sim[selected].stop_time = stop_time;
                sim[selected].stop_reason = stop_reason.clone();
                sim[selected].set_state(JobState::Scheduled, job_start);
                scheduled_scratch.insert(selected);
            }

            // Enough work done to finish the job within the simulation.
            if let Some(est) = sim[selected].estimated_time.known_seconds() {
                if work_done[&selected] >= est {
                    sim[selected].set_state(JobState::Complete, job_start);
                }
            }

            sim[selected].simulated_schedule.push(JobSchedule {
                job: None,
                start_time: job_start,
                stop_time,
                stop_reason: stop_reason.clone(),
            });
            self.push_schedule_entry(JobSchedule {
                job: Some(ids[selected]),
                start_time: job_start,
                stop_time,
                stop_reason,
            });

            sim_end_time = stop_time;
            let Some(stop) = stop_time else { break };
            sim_time = stop + Duration::seconds(SLOT_ADVANCE_SECS);
            if sim_time > end_time {
                break;
            }

            iterations += 1;
            if iterations > MIN_ITERATIONS.max(startup_candidates) {
                exceeded_iterations = true;
                log::warn!("ending simulation after {iterations} slots");
                break;
            }

            if sim_type == SimulationType::SimulateEachJobOnce
                && sim_ids.iter().all(|&id| {
                    !allow_job(&sim[id], &options) || sim[id].startup_time.is_some()
                })
            {
                break;
            }
        }

        // Reflect the simulated outcome onto the real jobs. A job that is
        // already running keeps its state and startup time.
        for (scratch, &original) in ids.iter().enumerate() {
            if !scheduled_scratch.contains(&scratch) {
                continue;
            }
            if jobs[original].state != JobState::Busy {
                jobs.set_state(original, JobState::Scheduled, time, false);
                jobs[original].startup_time = sim[scratch].startup_time;
            }
            jobs[original].stop_time = sim[scratch].stop_time;
            jobs[original].stop_reason = sim[scratch].stop_reason.clone();
            if sim_type == SimulationType::Simulate {
                jobs[original].simulated_schedule = sim[scratch].simulated_schedule.clone();
            }
            refresh_edge_hints(&mut jobs[original], state, &options);
        }
        self.unset_evaluation(jobs, ids, time);

        if exceeded_iterations {
            None
        } else {
            sim_end_time
        }
    }
}
