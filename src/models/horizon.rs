//! Artificial horizon: a piecewise-linear azimuth-to-minimum-altitude
//! profile describing local obstructions (trees, buildings, terrain).

use serde::{Deserialize, Serialize};

/// One vertex of the horizon polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonPoint {
    pub azimuth_deg: f64,
    pub altitude_deg: f64,
}

/// The obstruction profile. Vertices are kept sorted by azimuth; lookups
/// interpolate linearly and wrap around through north.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtificialHorizon {
    points: Vec<HorizonPoint>,
}

impl ArtificialHorizon {
    pub fn new(mut points: Vec<HorizonPoint>) -> Self {
        points.sort_by(|a, b| a.azimuth_deg.total_cmp(&b.azimuth_deg));
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Minimum unobstructed altitude at an azimuth, degrees. An empty
    /// profile obstructs nothing.
    pub fn altitude_at(&self, azimuth_deg: f64) -> f64 {
        if self.points.is_empty() {
            return -90.0;
        }
        if self.points.len() == 1 {
            return self.points[0].altitude_deg;
        }
        let az = crate::astro::normalize_degrees(azimuth_deg);
        let after = self.points.iter().position(|p| p.azimuth_deg >= az);
        let (lo, hi) = match after {
            Some(0) | None => (*self.points.last().unwrap(), self.points[0]),
            Some(i) => (self.points[i - 1], self.points[i]),
        };
        let mut span = hi.azimuth_deg - lo.azimuth_deg;
        let mut offset = az - lo.azimuth_deg;
        if span <= 0.0 {
            span += 360.0;
        }
        if offset < 0.0 {
            offset += 360.0;
        }
        if span == 0.0 {
            return lo.altitude_deg.max(hi.altitude_deg);
        }
        lo.altitude_deg + (hi.altitude_deg - lo.altitude_deg) * (offset / span)
    }

    /// Whether a target at the given horizontal position clears the profile.
    pub fn is_above(&self, azimuth_deg: f64, altitude_deg: f64) -> bool {
        altitude_deg >= self.altitude_at(azimuth_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ridge() -> ArtificialHorizon {
        ArtificialHorizon::new(vec![
            HorizonPoint { azimuth_deg: 0.0, altitude_deg: 10.0 },
            HorizonPoint { azimuth_deg: 90.0, altitude_deg: 30.0 },
            HorizonPoint { azimuth_deg: 180.0, altitude_deg: 10.0 },
            HorizonPoint { azimuth_deg: 270.0, altitude_deg: 20.0 },
        ])
    }

    #[test]
    fn empty_profile_obstructs_nothing() {
        let horizon = ArtificialHorizon::default();
        assert!(horizon.is_above(123.0, -89.0));
    }

    #[test]
    fn interpolates_between_vertices() {
        let horizon = ridge();
        assert_eq!(horizon.altitude_at(45.0), 20.0);
        assert_eq!(horizon.altitude_at(90.0), 30.0);
        assert!(horizon.is_above(45.0, 25.0));
        assert!(!horizon.is_above(90.0, 25.0));
    }

    #[test]
    fn wraps_through_north() {
        let horizon = ridge();
        // Between 270 (20 deg) and 360/0 (10 deg).
        let alt = horizon.altitude_at(315.0);
        assert!((alt - 15.0).abs() < 1e-9);
    }
}
