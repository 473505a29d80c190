//! Ephemeris primitives for the planner.
//!
//! This module provides exactly the astronomy the scheduler consumes:
//! sidereal time, precession of J2000 catalog coordinates to the date,
//! equatorial-to-horizontal conversion, optional atmospheric refraction,
//! low-precision solar and lunar positions, angular separation, and the
//! astronomical dawn/dusk search.
//!
//! Conventions: angles are `f64` degrees; azimuth is normalized to
//! [0, 360) measured from north through east; altitude lies in [-90, 90];
//! instants are `chrono::DateTime<FixedOffset>` and all internal time
//! arithmetic goes through the Julian date.
//!
//! Accuracy: the solar series is good to ~0.01 deg and the truncated lunar
//! series to ~0.3 deg, both far inside the planner's 2-minute search step.

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::PlanningError;

/// Sun altitude defining astronomical twilight, degrees.
pub const ASTRONOMICAL_TWILIGHT_DEG: f64 = -18.0;

const J2000_JD: f64 = 2451545.0;

/// Observer's geographic location.
///
/// Longitude is east-positive, elevation above sea level in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
}

impl GeoLocation {
    /// Create a validated location.
    pub fn new(latitude: f64, longitude: f64, elevation_m: f64) -> Result<Self, PlanningError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(PlanningError::Configuration(format!(
                "latitude {latitude} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(PlanningError::Configuration(format!(
                "longitude {longitude} out of range [-180, 180]"
            )));
        }
        Ok(Self { latitude, longitude, elevation_m })
    }
}

/// Equatorial coordinates, degrees. Catalog values are J2000; the planner
/// precesses them to the date before any horizontal conversion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EquatorialCoords {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl EquatorialCoords {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self { ra_deg: normalize_degrees(ra_deg), dec_deg }
    }

    /// Right ascension in hours, normalized to [0, 24).
    pub fn ra_hours(&self) -> f64 {
        normalize_degrees(self.ra_deg) / 15.0
    }
}

/// A target's horizontal position at some instant, plus whether it has
/// passed the meridian (is setting).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPosition {
    pub azimuth_deg: f64,
    pub altitude_deg: f64,
    pub is_setting: bool,
}

/// Julian date of an instant.
pub fn julian_day(when: DateTime<FixedOffset>) -> f64 {
    let secs = when.timestamp() as f64 + f64::from(when.timestamp_subsec_millis()) / 1000.0;
    secs / 86400.0 + 2440587.5
}

fn julian_centuries(jd: f64) -> f64 {
    (jd - J2000_JD) / 36525.0
}

/// Greenwich mean sidereal time in degrees.
pub fn gmst_degrees(jd: f64) -> f64 {
    let t = julian_centuries(jd);
    let gmst = 280.460_618_37
        + 360.985_647_366_29 * (jd - J2000_JD)
        + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    normalize_degrees(gmst)
}

/// Local mean sidereal time in degrees for an east-positive longitude.
pub fn lst_degrees(jd: f64, longitude_deg: f64) -> f64 {
    normalize_degrees(gmst_degrees(jd) + longitude_deg)
}

/// Normalize an angle to [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 { d + 360.0 } else { d }
}

/// Precess J2000 catalog coordinates to the equinox of the date
/// (IAU 1976 precession angles, rigorous rotation).
pub fn precess_to_date(catalog: EquatorialCoords, jd: f64) -> EquatorialCoords {
    let t = julian_centuries(jd);
    // Accumulated precession angles in arcseconds.
    let zeta = (2306.2181 + (0.301_88 + 0.017_998 * t) * t) * t / 3600.0;
    let z = (2306.2181 + (1.094_68 + 0.018_203 * t) * t) * t / 3600.0;
    let theta = (2004.3109 - (0.426_65 + 0.041_833 * t) * t) * t / 3600.0;

    let (ra0, dec0) = (catalog.ra_deg.to_radians(), catalog.dec_deg.to_radians());
    let (zeta, z, theta) = (zeta.to_radians(), z.to_radians(), theta.to_radians());

    let a = dec0.cos() * (ra0 + zeta).sin();
    let b = theta.cos() * dec0.cos() * (ra0 + zeta).cos() - theta.sin() * dec0.sin();
    let c = theta.sin() * dec0.cos() * (ra0 + zeta).cos() + theta.cos() * dec0.sin();

    EquatorialCoords::new(
        (a.atan2(b) + z).to_degrees(),
        c.clamp(-1.0, 1.0).asin().to_degrees(),
    )
}

/// Convert of-date equatorial coordinates to horizontal coordinates.
///
/// Returns azimuth from north through east and true (unrefracted) altitude.
/// `is_setting` is true once the target has crossed the local meridian.
pub fn equatorial_to_horizontal(
    of_date: EquatorialCoords,
    geo: &GeoLocation,
    jd: f64,
) -> TargetPosition {
    let lst = lst_degrees(jd, geo.longitude);
    let hour_angle_deg = normalize_degrees(lst - of_date.ra_deg);
    let h = hour_angle_deg.to_radians();
    let dec = of_date.dec_deg.to_radians();
    let lat = geo.latitude.to_radians();

    let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * h.cos();
    let altitude_deg = sin_alt.clamp(-1.0, 1.0).asin().to_degrees();

    // Azimuth from south, westward; shift to from-north convention.
    let az_south = h.sin().atan2(h.cos() * lat.sin() - dec.tan() * lat.cos());
    let azimuth_deg = normalize_degrees(az_south.to_degrees() + 180.0);

    // Hour angle in [0, 24) hours; meridian passed while it is below 12h.
    let is_setting = hour_angle_deg < 180.0;

    TargetPosition { azimuth_deg, altitude_deg, is_setting }
}

/// Saemundsson's refraction for a true altitude, in degrees of lift.
/// Only meaningful near and above the horizon; callers gate on altitude.
pub fn refraction_degrees(true_altitude_deg: f64) -> f64 {
    let h = true_altitude_deg;
    if h < -2.0 {
        return 0.0;
    }
    let arg = (h + 10.3 / (h + 5.11)).to_radians();
    1.02 / arg.tan() / 60.0
}

/// Compute a J2000 target's horizontal position at an instant, with
/// precession applied and refraction added when requested.
pub fn find_altitude(
    target: EquatorialCoords,
    when: DateTime<FixedOffset>,
    geo: &GeoLocation,
    apply_refraction: bool,
) -> TargetPosition {
    let jd = julian_day(when);
    let of_date = precess_to_date(target, jd);
    let mut position = equatorial_to_horizontal(of_date, geo, jd);
    if apply_refraction {
        position.altitude_deg += refraction_degrees(position.altitude_deg);
    }
    position
}

/// Mean obliquity of the ecliptic, degrees.
fn obliquity_degrees(t: f64) -> f64 {
    23.439_291_1 - 0.013_004_2 * t - 1.64e-7 * t * t
}

fn ecliptic_to_equatorial(lambda_deg: f64, beta_deg: f64, t: f64) -> EquatorialCoords {
    let eps = obliquity_degrees(t).to_radians();
    let (lambda, beta) = (lambda_deg.to_radians(), beta_deg.to_radians());
    let ra = (lambda.sin() * eps.cos() - beta.tan() * eps.sin()).atan2(lambda.cos());
    let dec = (beta.sin() * eps.cos() + beta.cos() * eps.sin() * lambda.sin())
        .clamp(-1.0, 1.0)
        .asin();
    EquatorialCoords::new(ra.to_degrees(), dec.to_degrees())
}

/// Apparent geocentric solar position (low-precision series).
pub fn sun_position(jd: f64) -> EquatorialCoords {
    let t = julian_centuries(jd);
    let l0 = 280.466_46 + 36_000.769_83 * t + 0.000_303_2 * t * t;
    let m = (357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t * t).to_radians();
    let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();
    let omega = (125.04 - 1934.136 * t).to_radians();
    let apparent_longitude = l0 + c - 0.005_69 - 0.004_78 * omega.sin();
    ecliptic_to_equatorial(normalize_degrees(apparent_longitude), 0.0, t)
}

/// True (unrefracted) solar altitude at an instant, degrees.
pub fn sun_altitude(when: DateTime<FixedOffset>, geo: &GeoLocation) -> f64 {
    let jd = julian_day(when);
    equatorial_to_horizontal(sun_position(jd), geo, jd).altitude_deg
}

/// Geocentric lunar position (principal terms of the lunar theory).
///
/// Topocentric parallax (up to ~1 deg) is not applied; the planner's Moon
/// constraints carry far more slack than that.
pub fn moon_position(jd: f64) -> EquatorialCoords {
    let t = julian_centuries(jd);
    // Mean elements, degrees.
    let lp = 218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t * t;
    let d = (297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t * t).to_radians();
    let m = (357.529_109_2 + 35_999.050_290_9 * t).to_radians();
    let mp = (134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t * t).to_radians();
    let f = (93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t * t).to_radians();

    let longitude = lp
        + 6.288_774 * mp.sin()
        + 1.274_027 * (2.0 * d - mp).sin()
        + 0.658_314 * (2.0 * d).sin()
        + 0.213_618 * (2.0 * mp).sin()
        - 0.185_116 * m.sin()
        - 0.114_332 * (2.0 * f).sin()
        + 0.058_793 * (2.0 * d - 2.0 * mp).sin()
        + 0.057_066 * (2.0 * d - m - mp).sin()
        + 0.053_322 * (2.0 * d + mp).sin()
        + 0.045_758 * (2.0 * d - m).sin();

    let latitude = 5.128_122 * f.sin()
        + 0.280_602 * (mp + f).sin()
        + 0.277_693 * (mp - f).sin()
        + 0.173_237 * (2.0 * d - f).sin()
        + 0.055_413 * (2.0 * d - mp + f).sin()
        + 0.046_271 * (2.0 * d - mp - f).sin();

    ecliptic_to_equatorial(normalize_degrees(longitude), latitude, t)
}

/// Moon's true altitude at an instant, degrees.
pub fn moon_altitude(when: DateTime<FixedOffset>, geo: &GeoLocation) -> f64 {
    let jd = julian_day(when);
    equatorial_to_horizontal(moon_position(jd), geo, jd).altitude_deg
}

/// Angular separation between a J2000 target and the Moon at an instant.
pub fn moon_separation(target: EquatorialCoords, when: DateTime<FixedOffset>) -> f64 {
    let jd = julian_day(when);
    angular_separation(precess_to_date(target, jd), moon_position(jd))
}

/// Great-circle separation between two equatorial positions, degrees.
pub fn angular_separation(a: EquatorialCoords, b: EquatorialCoords) -> f64 {
    let (ra1, dec1) = (a.ra_deg.to_radians(), a.dec_deg.to_radians());
    let (ra2, dec2) = (b.ra_deg.to_radians(), b.dec_deg.to_radians());
    let cos_sep =
        dec1.sin() * dec2.sin() + dec1.cos() * dec2.cos() * (ra1 - ra2).cos();
    cos_sep.clamp(-1.0, 1.0).acos().to_degrees()
}

/// One astronomical night: the span where the Sun stays below -18 deg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NightInterval {
    pub dusk: DateTime<FixedOffset>,
    pub dawn: DateTime<FixedOffset>,
}

/// Astronomical nights intersecting `[from, to]`, in order.
///
/// Crossings of -18 deg are bracketed by a 10-minute scan and refined by
/// bisection to sub-second precision. A night already underway at `from`
/// is clipped to start there; one still underway at `to` is clipped to end
/// there. Polar day yields no intervals, polar night a single clipped one.
pub fn night_intervals(
    from: DateTime<FixedOffset>,
    to: DateTime<FixedOffset>,
    geo: &GeoLocation,
) -> Vec<NightInterval> {
    const SCAN_STEP_MINUTES: i64 = 10;

    let mut intervals = Vec::new();
    let mut t = from;
    let mut previous = sun_altitude(t, geo);
    let mut open_dusk = (previous < ASTRONOMICAL_TWILIGHT_DEG).then_some(from);

    while t < to {
        let t_next = (t + Duration::minutes(SCAN_STEP_MINUTES)).min(to);
        let current = sun_altitude(t_next, geo);
        if previous >= ASTRONOMICAL_TWILIGHT_DEG && current < ASTRONOMICAL_TWILIGHT_DEG {
            open_dusk = Some(refine_crossing(t, t_next, geo, false));
        } else if previous < ASTRONOMICAL_TWILIGHT_DEG && current >= ASTRONOMICAL_TWILIGHT_DEG {
            if let Some(dusk) = open_dusk.take() {
                intervals.push(NightInterval { dusk, dawn: refine_crossing(t, t_next, geo, true) });
            }
        }
        previous = current;
        t = t_next;
    }
    if let Some(dusk) = open_dusk {
        intervals.push(NightInterval { dusk, dawn: to });
    }
    intervals
}

fn refine_crossing(
    mut lo: DateTime<FixedOffset>,
    mut hi: DateTime<FixedOffset>,
    geo: &GeoLocation,
    rising: bool,
) -> DateTime<FixedOffset> {
    for _ in 0..24 {
        let span = hi.signed_duration_since(lo);
        if span.num_milliseconds() <= 500 {
            break;
        }
        let mid = lo + span / 2;
        let above = sun_altitude(mid, geo) >= ASTRONOMICAL_TWILIGHT_DEG;
        if above == rising {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}
