//! Duration estimation.
//!
//! Fills every duration field of a job from its capture sequence and the
//! captured-frames ledger: the total estimate, the per-repeat and
//! left-this-repeat components the simulator consumes, the startup
//! overhead heuristic, and the per-pass capture request map handed to the
//! executor.

use crate::config::SchedulerOptions;
use crate::io::load_sequence_queue;
use crate::models::{
    CaptureSubjob, CapturedFramesMap, CompletionCondition, EstimatedDuration, FrameType, Job,
    SequenceQueue, StartupCondition, Timestamp, UploadMode,
};
use crate::scheduler::log::EvaluationLog;

/// Autofocus cost per capture when in-sequence focus is enabled. A rough
/// completion estimate, not a measurement.
const AUTOFOCUS_SECS_PER_CAPTURE: i64 = 10;
/// Cost of one dither cycle.
const DITHER_SECS: i64 = 15;

/// One-shot startup overhead for the executor phases this job demands.
pub fn time_heuristics(job: &Job, options: &SchedulerOptions) -> i64 {
    let mut secs = 0;
    // Slewing and starting to track.
    if job.step_pipeline.track {
        secs += 30;
    }
    // Initial focus run.
    if job.step_pipeline.focus {
        secs += 120;
    }
    // Plate solve and re-slew.
    if job.step_pipeline.align {
        secs += 60;
    }
    if job.step_pipeline.guide {
        // Finding a guide star and settling.
        secs += 15;
        secs += options.dither_settle_secs;
        secs += options.guiding_settle_secs;
        if options.reset_guide_calibration {
            secs += 120;
        }
    }
    secs
}

/// Expected captures per signature for one pass of the sequence, plus the
/// total capture count of one pass.
pub fn calculate_expected_captures_map(subjobs: &[CaptureSubjob]) -> (CapturedFramesMap, u32) {
    let mut expected = CapturedFramesMap::new();
    let mut captures_per_repeat = 0;
    for subjob in subjobs {
        captures_per_repeat += subjob.count;
        *expected.entry(subjob.signature.clone()).or_insert(0) += subjob.count;
    }
    (expected, captures_per_repeat)
}

/// Derive the completed-iterations count and the per-pass capture request
/// map from on-disk progress.
///
/// Under `remember_job_progress` the signature with the least progress
/// bounds the overall iteration; the request map then tells the executor,
/// per signature, how many captures of the current iteration already exist
/// (0 = shoot the full set, expected = nothing left this round). With the
/// option off the map is zero-valued and the executor honors the sequence
/// file verbatim.
///
/// Returns (request map, completed iterations, total completed captures).
pub fn fill_captured_frames_map(
    expected: &CapturedFramesMap,
    captured: &CapturedFramesMap,
    job: &Job,
    options: &SchedulerOptions,
) -> (CapturedFramesMap, u32, u32) {
    let mut capture_map = CapturedFramesMap::new();
    let mut total_completed: u32 = 0;

    let (completed_iterations, current_iteration) = if options.remember_job_progress {
        let min_iterations_completed = expected
            .iter()
            .map(|(key, &exp)| captured.get(key).copied().unwrap_or(0) / exp.max(1))
            .min()
            .unwrap_or(0);
        let current = if job.completion_condition == CompletionCondition::Repeat
            && min_iterations_completed >= u32::from(job.repeats_required)
        {
            // Enough iterations already exist; no need to look higher.
            u32::from(job.repeats_required) + 1
        } else {
            min_iterations_completed + 1
        };
        (current.saturating_sub(1), current)
    } else {
        // Without remembered progress, only this session's counter is known.
        (job.completed_iterations, 0)
    };

    for (key, &exp) in expected {
        let done = captured.get(key).copied().unwrap_or(0);
        let request = if options.remember_job_progress {
            let missing = i64::from(exp) * i64::from(current_iteration) - i64::from(done);
            if missing <= 0 {
                // Already captured more than this round requires.
                exp
            } else if missing >= i64::from(exp) {
                0
            } else {
                exp - missing as u32
            }
        } else {
            0
        };
        capture_map.insert(key.clone(), request);

        total_completed += if job.completion_condition == CompletionCondition::Loop {
            done
        } else {
            done.min(exp * u32::from(job.repeats_required))
        };
    }

    (capture_map, completed_iterations, total_completed)
}

/// Whether the job still needs light frames. Calibration-only work skips
/// the observatory startup phases entirely.
fn update_light_frames_required(
    job: &mut Job,
    queue: &SequenceQueue,
    expected: &CapturedFramesMap,
    captured: &CapturedFramesMap,
) {
    job.light_frames_required = match job.completion_condition {
        CompletionCondition::Sequence | CompletionCondition::Repeat => {
            queue.jobs.iter().any(|subjob| {
                subjob.frame_type == FrameType::Light
                    && expected.get(&subjob.signature).copied().unwrap_or(0)
                        * u32::from(job.repeats_required)
                        > captured.get(&subjob.signature).copied().unwrap_or(0)
            })
        }
        // Looping and deadline-bound jobs keep capturing regardless.
        _ => true,
    };
}

/// Estimate a job's duration from its sequence file and prior progress.
///
/// Returns false when the sequence file is unreadable or contradictory;
/// the caller marks the job INVALID and never retries it.
pub fn estimate_job_time(
    job: &mut Job,
    captured: &CapturedFramesMap,
    options: &SchedulerOptions,
    now: Timestamp,
    mut log: Option<&mut EvaluationLog>,
) -> bool {
    let queue = match load_sequence_queue(&job.sequence_file) {
        Ok(queue) => queue,
        Err(e) => {
            log::warn!("failed estimating duration of job '{}': {e}", job.name);
            if let Some(log) = log.as_deref_mut() {
                log.warning(format!("Unable to use sequence file of job '{}': {e}", job.name));
            }
            return false;
        }
    };

    job.in_sequence_focus = queue.autofocus;
    if queue.autofocus && !job.step_pipeline.focus {
        log::warn!(
            "job '{}' has its focus step disabled; in-sequence focus procedures will not occur",
            job.name
        );
    }
    job.initial_filter = queue.initial_filter().unwrap_or_default().to_string();
    job.calibration_mount_park = queue.jobs.iter().any(|s| s.park_mount);

    let (expected, all_captures_per_repeat) = calculate_expected_captures_map(&queue.jobs);
    let (capture_map, completed_iterations, total_completed) =
        fill_captured_frames_map(&expected, captured, job, options);
    job.completed_iterations = completed_iterations;

    // Remotely stored captures cannot be counted: duration is unknowable.
    if queue.jobs.iter().any(|s| s.upload_mode == UploadMode::Remote) {
        log::info!(
            "job '{}' saves its files remotely, its duration cannot be estimated",
            job.name
        );
        job.estimated_time = EstimatedDuration::Unbounded;
        return true;
    }

    let mut total_imaging_time = 0.0_f64;
    let mut imaging_time_per_repeat = 0.0_f64;
    let mut imaging_time_left_this_repeat = 0.0_f64;

    for (index, subjob) in queue.jobs.iter().enumerate() {
        let signature = &subjob.signature;
        let disk_completed = captured.get(signature).copied().unwrap_or(0);
        let captures_required_per_repeat = subjob.count.max(1);

        let mut captures_left_this_repeat =
            captures_required_per_repeat - (disk_completed % captures_required_per_repeat);
        if disk_completed >= (1 + completed_iterations) * captures_required_per_repeat {
            // Another signature is holding this iteration back; nothing
            // left to do for this capture set.
            captures_left_this_repeat = 0;
        }

        let mut captures_required = subjob.count * u32::from(job.repeats_required);
        let mut captures_completed = disk_completed;

        if options.remember_job_progress && job.completion_condition != CompletionCondition::Loop {
            captures_required =
                expected.get(signature).copied().unwrap_or(0) * u32::from(job.repeats_required);
            // Capture sets sharing a storage signature are counted once,
            // on their first occurrence.
            if queue.jobs[..index].iter().any(|prev| prev.signature == *signature) {
                captures_required = 0;
            }
        } else if all_captures_per_repeat > 0 {
            captures_completed = job.completed_count / all_captures_per_repeat * subjob.count;
        } else {
            captures_completed = 0;
        }

        let captures_complete = captures_required == 0 || captures_completed >= captures_required;
        if !captures_complete || job.completion_condition == CompletionCondition::Loop {
            let captures_to_go = captures_required.saturating_sub(captures_completed);
            let secs_per_capture = subjob.secs_per_capture();
            total_imaging_time += secs_per_capture * f64::from(captures_to_go);
            imaging_time_per_repeat += secs_per_capture * f64::from(subjob.count);
            imaging_time_left_this_repeat +=
                secs_per_capture * f64::from(captures_left_this_repeat);

            if subjob.frame_type == FrameType::Light {
                if queue.autofocus {
                    let af = AUTOFOCUS_SECS_PER_CAPTURE as f64;
                    total_imaging_time += f64::from(captures_to_go) * af;
                    imaging_time_per_repeat += f64::from(captures_required_per_repeat) * af;
                    imaging_time_left_this_repeat += f64::from(captures_left_this_repeat) * af;
                }
                if job.step_pipeline.guide && options.dither_enabled {
                    let per_capture = DITHER_SECS as f64 / f64::from(options.dither_frames.max(1));
                    total_imaging_time += f64::from(captures_to_go) * per_capture;
                    imaging_time_per_repeat +=
                        f64::from(captures_required_per_repeat) * per_capture;
                    imaging_time_left_this_repeat +=
                        f64::from(captures_left_this_repeat) * per_capture;
                }
            }
        }
    }

    job.captured_frames_map = capture_map;
    job.sequence_count = all_captures_per_repeat * u32::from(job.repeats_required);
    if options.remember_job_progress {
        job.completed_count = total_completed;
    }
    job.estimated_time_per_repeat = imaging_time_per_repeat as i64;
    job.estimated_time_left_this_repeat = imaging_time_left_this_repeat as i64;

    update_light_frames_required(job, &queue, &expected, captured);
    if job.light_frames_required {
        job.estimated_startup_time = time_heuristics(job, options);
    }

    match job.completion_condition {
        CompletionCondition::Loop => {
            // Unbounded by definition; the simulator stops it at the next
            // constraint failure instead.
            job.estimated_time = EstimatedDuration::Unbounded;
            log::debug!("job '{}' loops until stopped manually, imaging time undefined", job.name);
        }
        CompletionCondition::At => {
            let Some(finish_at) = job.finish_at_time else {
                log::warn!("job '{}' has a finish-at condition without a deadline", job.name);
                return false;
            };
            let reference = match job.startup_condition {
                StartupCondition::At => job.startup_time.or(job.start_at_time).unwrap_or(now),
                StartupCondition::Asap => now,
            };
            let mut interval = (finish_at - reference).num_seconds();
            if !options.finish_at_caps_estimate && total_imaging_time > 0.0 {
                let mut sequence_total = total_imaging_time.ceil() as i64;
                if job.light_frames_required {
                    sequence_total += time_heuristics(job, options);
                }
                interval = interval.min(sequence_total);
            }
            job.estimated_time = if interval <= 0 {
                EstimatedDuration::Complete
            } else {
                EstimatedDuration::Seconds(interval)
            };
        }
        CompletionCondition::Sequence | CompletionCondition::Repeat => {
            if total_imaging_time <= 0.0 {
                // Nothing left to capture.
                job.estimated_time = EstimatedDuration::Complete;
                job.estimated_time_per_repeat = 1;
                job.estimated_time_left_this_repeat = 0;
                log::debug!("job will not run, {}", job.progress_summary());
            } else {
                if job.light_frames_required {
                    total_imaging_time += time_heuristics(job, options) as f64;
                    job.estimated_startup_time = time_heuristics(job, options);
                }
                let estimate = total_imaging_time.ceil() as i64;
                job.estimated_time = EstimatedDuration::Seconds(estimate);
                if let Some(log) = log.as_deref_mut() {
                    log.info(format!(
                        "Job '{}' estimated to take {:02}:{:02}:{:02} to complete.",
                        job.name,
                        estimate / 3600,
                        (estimate % 3600) / 60,
                        estimate % 60
                    ));
                }
            }
        }
    }

    true
}
