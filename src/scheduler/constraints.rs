//! Time-domain feasibility arithmetic.
//!
//! [`ConstraintEvaluator`] answers the two questions the greedy pass asks
//! about every job: when next does it satisfy all of its enabled
//! constraints, and once running, when does it stop satisfying them. Both
//! are built on one step-walk primitive that ascends in fixed increments
//! (2 minutes by default, the planner's unit of time-domain truth) and
//! returns the first boundary crossing within a bounded horizon.
//!
//! Predicates are evaluated in cost order and short-circuit on the first
//! failure: weather, twilight, altitude and artificial horizon, Moon
//! separation and altitude.

use chrono::Duration;

use crate::astro;
use crate::config::SchedulerOptions;
use crate::error::PlanningError;
use crate::models::{Job, Timestamp};
use crate::state::ModuleState;

/// Bounded search horizon for feasibility walks.
pub const SEARCH_HORIZON_DAYS: i64 = 3;

/// A job's next feasible run: when it can start and when (and why) it must
/// stop. A `None` end means no constraint fires inside the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityWindow {
    pub start: Timestamp,
    pub end: Option<Timestamp>,
    pub end_reason: String,
}

/// Which predicate rejected an instant, with a human-readable reason.
#[derive(Debug, Clone)]
enum Violation {
    StartAt,
    Weather,
    Twilight,
    Altitude(String),
    Moon(String),
}

impl Violation {
    fn message(&self) -> String {
        match self {
            Violation::StartAt => "start-at time not reached".into(),
            Violation::Weather => "weather conditions are not acceptable".into(),
            Violation::Twilight => "outside astronomical night".into(),
            Violation::Altitude(reason) | Violation::Moon(reason) => reason.clone(),
        }
    }
}

pub struct ConstraintEvaluator<'a> {
    state: &'a ModuleState,
    options: &'a SchedulerOptions,
}

impl<'a> ConstraintEvaluator<'a> {
    pub fn new(state: &'a ModuleState, options: &'a SchedulerOptions) -> Self {
        Self { state, options }
    }

    /// Evaluate every enabled predicate at one instant. `None` means the
    /// job may run at `when`. Updates the job's displayed twilight events
    /// as a side effect of the twilight check.
    fn violation_at(&self, job: &mut Job, when: Timestamp, running_job: bool) -> Option<Violation> {
        // A user-pinned start is a constraint like any other: instants
        // before it are infeasible, so the earliest feasible start of an
        // on-time START_AT job is its pinned time. A job that is already
        // running is past its pin; re-evaluations skip the check.
        if !running_job && job.startup_condition == crate::models::StartupCondition::At {
            if let Some(start_at) = job.start_at_time {
                if when < start_at {
                    return Some(Violation::StartAt);
                }
            }
        }

        if job.enforce_weather && !self.state.weather_ok() {
            return Some(Violation::Weather);
        }

        if job.enforce_twilight {
            match self.state.night_window(
                when,
                self.options.dawn_offset_minutes,
                self.options.dusk_offset_minutes,
            ) {
                Some(window) => {
                    job.next_dusk = Some(window.dusk);
                    job.next_dawn = Some(window.dawn);
                    if !window.contains(when) {
                        return Some(Violation::Twilight);
                    }
                }
                // Polar day: no astronomical night ahead at all.
                None => return Some(Violation::Twilight),
            }
        }

        if job.has_altitude_constraint() {
            let position = astro::find_altitude(
                job.target,
                when,
                self.state.geo(),
                self.options.apply_refraction,
            );
            if let Err(reason) = job.satisfies_altitude_constraint(
                position.azimuth_deg,
                position.altitude_deg,
                self.state.horizon(),
            ) {
                return Some(Violation::Altitude(reason));
            }
        }

        if let Err(reason) = job.moon_constraints_ok(when, self.state.geo()) {
            return Some(Violation::Moon(reason));
        }

        None
    }

    /// The shared step-walk primitive.
    ///
    /// When `check_if_met` is true, ascends until every predicate passes
    /// and returns that instant; otherwise ascends until any predicate
    /// fails and returns the instant plus the failure reason. `until`
    /// terminates the walk early (or extends it past the default horizon).
    pub fn calculate_next_time(
        &self,
        job: &mut Job,
        from: Timestamp,
        check_if_met: bool,
        running_job: bool,
        until: Option<Timestamp>,
    ) -> (Option<Timestamp>, String) {
        let step = Duration::minutes(self.options.schedule_resolution_minutes.max(1));
        let end = until.unwrap_or(from + Duration::days(SEARCH_HORIZON_DAYS));
        let mut last_reason = String::new();

        let mut t = from;
        while t <= end {
            match (check_if_met, self.violation_at(job, t, running_job)) {
                (true, None) => return (Some(t), String::new()),
                (true, Some(violation)) => last_reason = violation.message(),
                (false, Some(violation)) => {
                    // After a feasible run, the first twilight failure going
                    // forward is by construction the dawn.
                    let reason = match violation {
                        Violation::Twilight if t > from => "dawn reached".into(),
                        other => other.message(),
                    };
                    return (Some(t), reason);
                }
                (false, None) => {}
            }
            t += step;
        }

        if check_if_met {
            let reason = if last_reason.is_empty() {
                "constraints not met within the search horizon".into()
            } else {
                format!("constraints not met within the search horizon; last: {last_reason}")
            };
            (None, reason)
        } else {
            // Constraints hold through the whole window.
            (None, String::new())
        }
    }

    /// Earliest instant at or after `from` where the job satisfies all of
    /// its constraints, or `None` inside the bounded horizon. Memoized in
    /// the per-job start-time cache, which the greedy pass clears at the
    /// start of every `schedule_jobs` invocation.
    pub fn next_possible_start_time(
        &self,
        job: &mut Job,
        from: Timestamp,
        running_job: bool,
        until: Option<Timestamp>,
    ) -> Option<Timestamp> {
        if !running_job {
            if let Some(cached) = job.start_time_cache.check(from, until) {
                return cached;
            }
        }
        let (result, _) = self.calculate_next_time(job, from, true, running_job, until);
        if !running_job {
            job.start_time_cache.add(from, until, result);
        }
        result
    }

    /// Given the job is feasible at `from`, the earliest instant it stops
    /// satisfying some constraint, with a human-readable reason. `None`
    /// when nothing fires before `until` (or the horizon).
    pub fn next_end_time(
        &self,
        job: &mut Job,
        from: Timestamp,
        until: Option<Timestamp>,
    ) -> (Option<Timestamp>, String) {
        self.calculate_next_time(job, from, false, false, until)
    }

    /// Convenience: the job's next feasible window from `from`, as a typed
    /// result for callers that want an error instead of a sentinel.
    pub fn feasibility_window(
        &self,
        job: &mut Job,
        from: Timestamp,
    ) -> Result<FeasibilityWindow, PlanningError> {
        let (start, reason) = self.calculate_next_time(job, from, true, false, None);
        match start {
            None => Err(PlanningError::NoFeasibleWindow {
                job: job.name.clone(),
                horizon_days: SEARCH_HORIZON_DAYS,
                reason,
            }),
            Some(start) => {
                let (end, end_reason) = self.next_end_time(job, start, None);
                Ok(FeasibilityWindow { start, end, end_reason })
            }
        }
    }

    /// Whether `when` (default: the job's startup time, else now) falls
    /// inside the astronomical-night interval. The second value is the
    /// next instant the check could succeed, for callers that wait.
    pub fn runs_during_astronomical_night_time(
        &self,
        job: &mut Job,
        when: Option<Timestamp>,
    ) -> (bool, Option<Timestamp>) {
        let when = when.or(job.startup_time).unwrap_or_else(|| self.state.local_time());
        match self.state.night_window(
            when,
            self.options.dawn_offset_minutes,
            self.options.dusk_offset_minutes,
        ) {
            Some(window) => {
                job.next_dusk = Some(window.dusk);
                job.next_dawn = Some(window.dawn);
                if window.contains(when) {
                    (true, None)
                } else {
                    (false, Some(window.dusk))
                }
            }
            None => (false, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::{EquatorialCoords, GeoLocation};
    use crate::models::{setup_job, JobSetup, StepPipeline};
    use crate::state::Clock;
    use chrono::{FixedOffset, TimeZone};
    use proptest::prelude::*;

    fn silicon_valley() -> GeoLocation {
        GeoLocation::new(37.441_7, -122.166_7, 20.0).unwrap()
    }

    fn local(day: u32, hour: u32, minute: u32) -> Timestamp {
        FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 4, day, hour, minute, 0)
            .unwrap()
    }

    fn fixed_state(at: Timestamp) -> ModuleState {
        let mut state = ModuleState::new(silicon_valley());
        state.set_clock(Clock::Fixed(at));
        state
    }

    fn zenith_job(min_altitude: f64, enforce_twilight: bool) -> Job {
        let mut job = Job::default();
        setup_job(
            &mut job,
            JobSetup {
                target: EquatorialCoords::new(188.2, 37.56),
                sequence_file: "seq.json".into(),
                min_altitude,
                enforce_twilight,
                steps: StepPipeline::all(),
                ..JobSetup::new("zenith")
            },
        );
        job
    }

    #[test]
    fn already_feasible_job_starts_immediately() {
        let now = local(17, 0, 0);
        let state = fixed_state(now);
        let options = SchedulerOptions::default();
        let evaluator = ConstraintEvaluator::new(&state, &options);
        let mut job = zenith_job(30.0, false);

        let start = evaluator.next_possible_start_time(&mut job, now, false, None);
        assert_eq!(start, Some(now));
    }

    #[test]
    fn high_altitude_floor_waits_for_transit() {
        // At 20:00 the target sits near 43 deg; it only crosses 80 deg
        // around 23:10 and drops back below it around 00:51.
        let evening = local(16, 20, 0);
        let state = fixed_state(evening);
        let options = SchedulerOptions::default();
        let evaluator = ConstraintEvaluator::new(&state, &options);
        let mut job = zenith_job(80.0, false);

        let start = evaluator.next_possible_start_time(&mut job, evening, false, None).unwrap();
        let expected = local(16, 23, 10);
        let delta = (start - expected).num_seconds().abs();
        assert!(delta <= 300, "start {start}, expected about {expected}");

        let (end, reason) = evaluator.next_end_time(&mut job, start, None);
        let end = end.unwrap();
        let expected_end = local(17, 0, 51);
        let delta = (end - expected_end).num_seconds().abs();
        assert!(delta <= 300, "end {end}, expected about {expected_end}");
        assert!(reason.contains("below the minimum"), "reason: {reason}");
    }

    #[test]
    fn twilight_constraint_defers_to_dusk() {
        let noon = local(17, 12, 0);
        let state = fixed_state(noon);
        let options = SchedulerOptions::default();
        let evaluator = ConstraintEvaluator::new(&state, &options);
        let mut job = zenith_job(crate::models::UNDEFINED_ALTITUDE, true);

        let start = evaluator.next_possible_start_time(&mut job, noon, false, None).unwrap();
        // Astronomical dusk that evening is about 21:20 local.
        let expected = local(17, 21, 20);
        assert!((start - expected).num_seconds().abs() <= 300, "dusk start {start}");
        assert!(job.next_dusk.is_some());

        let (night, next_chance) =
            evaluator.runs_during_astronomical_night_time(&mut job, Some(noon));
        assert!(!night);
        assert!(next_chance.unwrap() > noon);
    }

    #[test]
    fn running_job_ends_at_dawn() {
        let midnight = local(17, 0, 0);
        let state = fixed_state(midnight);
        let options = SchedulerOptions::default();
        let evaluator = ConstraintEvaluator::new(&state, &options);
        let mut job = zenith_job(crate::models::UNDEFINED_ALTITUDE, true);

        let (end, reason) = evaluator.next_end_time(&mut job, midnight, None);
        let end = end.unwrap();
        // Dawn is about 04:58 local.
        let expected = local(17, 4, 58);
        assert!((end - expected).num_seconds().abs() <= 300, "dawn end {end}");
        assert_eq!(reason, "dawn reached");
    }

    #[test]
    fn pinned_start_defers_feasibility() {
        let now = local(17, 0, 0);
        let state = fixed_state(now);
        let options = SchedulerOptions::default();
        let evaluator = ConstraintEvaluator::new(&state, &options);
        let mut job = zenith_job(30.0, false);
        job.startup_condition = crate::models::StartupCondition::At;
        job.file_startup_condition = crate::models::StartupCondition::At;
        job.start_at_time = Some(now + Duration::hours(2));

        let start = evaluator.next_possible_start_time(&mut job, now, false, None);
        assert_eq!(start, Some(now + Duration::hours(2)));
    }

    #[test]
    fn impossible_moon_separation_never_becomes_feasible() {
        let now = local(17, 0, 0);
        let state = fixed_state(now);
        let options = SchedulerOptions::default();
        let evaluator = ConstraintEvaluator::new(&state, &options);
        let mut job = zenith_job(crate::models::UNDEFINED_ALTITUDE, false);
        job.min_moon_separation = 179.0;

        let err = evaluator.feasibility_window(&mut job, now).unwrap_err();
        match err {
            PlanningError::NoFeasibleWindow { reason, .. } => {
                assert!(reason.contains("Moon separation"), "reason: {reason}");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn bad_weather_blocks_only_enforcing_jobs() {
        let now = local(17, 0, 0);
        let mut state = fixed_state(now);
        state.set_weather_ok(false);
        let options = SchedulerOptions::default();
        let evaluator = ConstraintEvaluator::new(&state, &options);

        let mut indifferent = zenith_job(30.0, false);
        assert_eq!(
            evaluator.next_possible_start_time(&mut indifferent, now, false, None),
            Some(now)
        );

        let mut strict = zenith_job(30.0, false);
        strict.enforce_weather = true;
        assert_eq!(evaluator.next_possible_start_time(&mut strict, now, false, None), None);
    }

    #[test]
    fn repeated_queries_hit_the_cache() {
        let evening = local(16, 20, 0);
        let state = fixed_state(evening);
        let options = SchedulerOptions::default();
        let evaluator = ConstraintEvaluator::new(&state, &options);
        let mut job = zenith_job(80.0, false);

        let first = evaluator.next_possible_start_time(&mut job, evening, false, None);
        // A later `from` inside the infeasible span is answered from cache.
        let later = evening + Duration::hours(1);
        let second = evaluator.next_possible_start_time(&mut job, later, false, None);
        assert_eq!(first, second);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        // nextPossibleStartTime(J, T) is invalid or >= T.
        #[test]
        fn start_time_never_precedes_query(offset_minutes in 0i64..2880) {
            let base = local(16, 20, 0);
            let state = fixed_state(base);
            let options = SchedulerOptions::default();
            let evaluator = ConstraintEvaluator::new(&state, &options);
            let mut job = zenith_job(30.0, true);

            let from = base + Duration::minutes(offset_minutes);
            if let Some(start) = evaluator.next_possible_start_time(&mut job, from, false, None) {
                prop_assert!(start >= from);
            }
        }
    }
}
