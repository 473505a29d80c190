//! Shared runtime state of the planner.
//!
//! [`ModuleState`] is the single injection seam the whole scheduler core
//! reads its environment through: the clock (replaceable by a fixed instant
//! in tests), the observer's geolocation, the artificial horizon, the
//! current weather verdict and the cached twilight events. Passing the
//! state object through the planner keeps the core free of global mutable
//! data; interior mutability is limited to the twilight cache, which is
//! safe because the core is pinned to a single planner task.

use std::cell::RefCell;

use chrono::{Duration, Local};

use crate::astro::{self, GeoLocation, NightInterval};
use crate::models::{ArtificialHorizon, JobId, Timestamp};

/// Clock source. Production uses the system clock; tests pin an instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    System,
    Fixed(Timestamp),
}

/// The astronomical night containing or following an instant, with the
/// configured dawn/dusk offsets already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NightWindow {
    pub dusk: Timestamp,
    pub dawn: Timestamp,
}

impl NightWindow {
    pub fn contains(&self, when: Timestamp) -> bool {
        self.dusk <= when && when < self.dawn
    }
}

/// Process-scoped planner state.
#[derive(Debug)]
pub struct ModuleState {
    clock: Clock,
    geo: GeoLocation,
    horizon: Option<ArtificialHorizon>,
    weather_ok: bool,
    profile: String,
    active_job: Option<JobId>,
    twilight_cache: RefCell<TwilightCache>,
}

#[derive(Debug, Default)]
struct TwilightCache {
    intervals: Vec<NightInterval>,
    covered: Option<(Timestamp, Timestamp)>,
}

impl ModuleState {
    pub fn new(geo: GeoLocation) -> Self {
        Self {
            clock: Clock::System,
            geo,
            horizon: None,
            weather_ok: true,
            profile: "Default".into(),
            active_job: None,
            twilight_cache: RefCell::new(TwilightCache::default()),
        }
    }

    /// Current local time from the injected clock.
    pub fn local_time(&self) -> Timestamp {
        match self.clock {
            Clock::System => Local::now().fixed_offset(),
            Clock::Fixed(t) => t,
        }
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    pub fn geo(&self) -> &GeoLocation {
        &self.geo
    }

    /// Changing the site invalidates every cached twilight event.
    pub fn set_geo(&mut self, geo: GeoLocation) {
        self.geo = geo;
        self.twilight_cache.borrow_mut().invalidate();
    }

    pub fn horizon(&self) -> Option<&ArtificialHorizon> {
        self.horizon.as_ref()
    }

    pub fn set_horizon(&mut self, horizon: Option<ArtificialHorizon>) {
        self.horizon = horizon;
    }

    /// Whether current weather permits imaging. Supplied by the caller;
    /// the planner only consumes the verdict.
    pub fn weather_ok(&self) -> bool {
        self.weather_ok
    }

    pub fn set_weather_ok(&mut self, ok: bool) {
        self.weather_ok = ok;
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn set_profile(&mut self, name: impl Into<String>) {
        self.profile = name.into();
    }

    pub fn active_job(&self) -> Option<JobId> {
        self.active_job
    }

    pub fn set_active_job(&mut self, job: Option<JobId>) {
        self.active_job = job;
    }

    /// The astronomical night containing `when`, or the next one after it,
    /// shifted by the dawn/dusk offsets (minutes).
    ///
    /// Night intervals are computed from a Sun-altitude scan and cached;
    /// a planning pass marching across three days recomputes the scan only
    /// when it walks off the covered range.
    pub fn night_window(
        &self,
        when: Timestamp,
        dawn_offset_minutes: i64,
        dusk_offset_minutes: i64,
    ) -> Option<NightWindow> {
        let mut cache = self.twilight_cache.borrow_mut();
        cache.ensure_coverage(when, &self.geo);
        cache
            .intervals
            .iter()
            .map(|night| NightWindow {
                dusk: night.dusk + Duration::minutes(dusk_offset_minutes),
                dawn: night.dawn + Duration::minutes(dawn_offset_minutes),
            })
            .find(|window| when < window.dawn)
    }

    /// First astronomical dawn after now (no offsets).
    pub fn dawn(&self) -> Option<Timestamp> {
        self.night_window(self.local_time(), 0, 0).map(|w| w.dawn)
    }

    /// Dusk of the night containing or following now (no offsets).
    pub fn dusk(&self) -> Option<Timestamp> {
        self.night_window(self.local_time(), 0, 0).map(|w| w.dusk)
    }
}

impl TwilightCache {
    /// How far beyond a query the scan extends; one scan serves a whole
    /// multi-day planning pass.
    const AHEAD_HOURS: i64 = 96;
    const BEHIND_HOURS: i64 = 30;

    fn ensure_coverage(&mut self, when: Timestamp, geo: &GeoLocation) {
        // Margin keeps clipped boundary intervals out of query range.
        let needs_scan = match self.covered {
            Some((start, end)) => {
                when - Duration::hours(2) < start || when + Duration::hours(50) > end
            }
            None => true,
        };
        if needs_scan {
            let start = when - Duration::hours(Self::BEHIND_HOURS);
            let end = when + Duration::hours(Self::AHEAD_HOURS);
            self.intervals = astro::night_intervals(start, end, geo);
            self.covered = Some((start, end));
        }
    }

    fn invalidate(&mut self) {
        self.intervals.clear();
        self.covered = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn silicon_valley() -> GeoLocation {
        GeoLocation::new(37.441_7, -122.166_7, 20.0).unwrap()
    }

    fn midnight() -> Timestamp {
        FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2021, 4, 17, 0, 0, 1)
            .unwrap()
    }

    fn fixed_state() -> ModuleState {
        let mut state = ModuleState::new(silicon_valley());
        state.set_clock(Clock::Fixed(midnight()));
        state
    }

    #[test]
    fn fixed_clock_pins_local_time() {
        let state = fixed_state();
        assert_eq!(state.local_time(), midnight());
    }

    #[test]
    fn midnight_is_inside_the_night_window() {
        let state = fixed_state();
        let window = state.night_window(midnight(), 0, 0).unwrap();
        assert!(window.contains(midnight()));
        assert!(window.dawn > midnight());
        // Dawn before 06:00 local in mid-April.
        assert!(window.dawn < midnight() + Duration::hours(6));
    }

    #[test]
    fn noon_sees_the_coming_night() {
        let state = fixed_state();
        let noon = midnight() + Duration::hours(12);
        let window = state.night_window(noon, 0, 0).unwrap();
        assert!(!window.contains(noon));
        assert!(window.dusk > noon);
        assert!(window.dusk < window.dawn);
    }

    #[test]
    fn offsets_shift_the_window_edges() {
        let state = fixed_state();
        let base = state.night_window(midnight(), 0, 0).unwrap();
        let shifted = state.night_window(midnight(), 30, -15).unwrap();
        assert_eq!(shifted.dawn - base.dawn, Duration::minutes(30));
        assert_eq!(base.dusk - shifted.dusk, Duration::minutes(15));
    }

    #[test]
    fn dawn_and_dusk_accessors_agree_with_the_window() {
        let state = fixed_state();
        let window = state.night_window(midnight(), 0, 0).unwrap();
        assert_eq!(state.dawn(), Some(window.dawn));
        assert_eq!(state.dusk(), Some(window.dusk));
    }

    #[test]
    fn changing_geo_invalidates_twilight_cache() {
        let mut state = fixed_state();
        let before = state.dawn().unwrap();
        // Move far east: dawn shifts by hours of local solar time.
        state.set_geo(GeoLocation::new(37.441_7, 20.0, 0.0).unwrap());
        let after = state.dawn().unwrap();
        assert_ne!(before, after);
    }
}
