//! Shared fixtures for the scheduler integration tests.
//!
//! The scenarios run against a fixed site and instant: Silicon Valley
//! (37.4417 N, 122.1667 W, UTC-7) around midnight starting 2021-04-17,
//! with a target that transits the zenith at that midnight. The
//! nine-filter capture sequence is the fixture every duration expectation
//! derives from.

use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Duration, FixedOffset, TimeZone};

use nightsched::astro::{EquatorialCoords, GeoLocation};
use nightsched::models::{
    setup_job, CompletionCondition, Job, JobSetup, StartupCondition, StepPipeline,
};
use nightsched::state::{Clock, ModuleState};

pub type Timestamp = DateTime<FixedOffset>;

/// (filter, count, exposure seconds) of the nine-filter sequence.
pub const NINE_FILTERS: [(&str, u32, f64); 9] = [
    ("Luminance", 6, 60.0),
    ("SII", 20, 30.0),
    ("OIII", 7, 20.0),
    ("H_Alpha", 5, 30.0),
    ("Red", 7, 90.0),
    ("Green", 7, 45.0),
    ("Blue", 2, 120.0),
    ("SII", 6, 30.0),
    ("OIII", 6, 10.0),
];

pub fn silicon_valley() -> GeoLocation {
    GeoLocation::new(37.441_7, -122.166_7, 20.0).unwrap()
}

/// Midnight starting 2021-04-17, local UTC-7.
pub fn midnight() -> Timestamp {
    FixedOffset::west_opt(7 * 3600)
        .unwrap()
        .with_ymd_and_hms(2021, 4, 17, 0, 0, 1)
        .unwrap()
}

/// A star at the zenith at that midnight.
pub fn zenith_star() -> EquatorialCoords {
    EquatorialCoords::new(188.2, 37.56)
}

pub fn fixed_state(at: Timestamp) -> ModuleState {
    let mut state = ModuleState::new(silicon_valley());
    state.set_clock(Clock::Fixed(at));
    state
}

/// Sum of count x exposure over the sequence, seconds.
pub fn exposure_sum() -> f64 {
    NINE_FILTERS.iter().map(|(_, count, exposure)| f64::from(*count) * exposure).sum()
}

/// Write the nine-filter sequence file; the handle keeps it alive.
pub fn nine_filter_sequence() -> tempfile::NamedTempFile {
    let jobs: Vec<String> = NINE_FILTERS
        .iter()
        .map(|(filter, count, exposure)| {
            format!(r#"{{ "filter": "{filter}", "exposure_secs": {exposure}, "count": {count} }}"#)
        })
        .collect();
    let text = format!(r#"{{ "autofocus": false, "jobs": [{}] }}"#, jobs.join(","));
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

/// A lead job on the zenith star with all executor steps enabled and no
/// twilight enforcement, so altitude windows drive the scenarios.
pub fn zenith_job(name: &str, sequence: &tempfile::NamedTempFile, min_altitude: f64) -> Job {
    let mut job = Job::default();
    setup_job(
        &mut job,
        JobSetup {
            target: zenith_star(),
            sequence_file: PathBuf::from(sequence.path()),
            min_altitude,
            steps: StepPipeline::all(),
            ..JobSetup::new(name)
        },
    );
    job
}

/// Same, with a repeat-count completion condition.
pub fn repeat_job(
    name: &str,
    sequence: &tempfile::NamedTempFile,
    min_altitude: f64,
    repeats: u16,
) -> Job {
    let mut job = Job::default();
    setup_job(
        &mut job,
        JobSetup {
            target: zenith_star(),
            sequence_file: PathBuf::from(sequence.path()),
            min_altitude,
            steps: StepPipeline::all(),
            completion: CompletionCondition::Repeat,
            repeats,
            ..JobSetup::new(name)
        },
    );
    job
}

/// A job pinned to start at `start_at`.
pub fn start_at_job(
    name: &str,
    sequence: &tempfile::NamedTempFile,
    min_altitude: f64,
    start_at: Timestamp,
) -> Job {
    let mut job = Job::default();
    setup_job(
        &mut job,
        JobSetup {
            target: zenith_star(),
            sequence_file: PathBuf::from(sequence.path()),
            min_altitude,
            steps: StepPipeline::all(),
            startup: StartupCondition::At,
            start_at: Some(start_at),
            ..JobSetup::new(name)
        },
    );
    job
}

/// Assert two instants agree within a tolerance in seconds.
pub fn assert_close(actual: Option<Timestamp>, expected: Timestamp, tolerance_secs: i64) {
    let actual = actual.unwrap_or_else(|| panic!("expected an instant near {expected}, got none"));
    let delta = (actual - expected).num_seconds().abs();
    assert!(
        delta <= tolerance_secs,
        "instant {actual} is {delta}s away from expected {expected} (tolerance {tolerance_secs}s)"
    );
}

/// Shorthand for midnight plus a signed number of minutes.
pub fn minutes_from_midnight(minutes: i64) -> Timestamp {
    midnight() + Duration::minutes(minutes)
}
