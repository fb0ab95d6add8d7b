use crate::boundary::EARTH_RADIUS_M;
use crate::error::AnonError;
use crate::filter::BoundaryIndex;
use crate::types::GeoPoint;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::f64::consts::PI;

// Splitmix-style multiplier, decorrelates the per-record RNG streams.
const STREAM_MIX: u64 = 0x9E37_79B9_7F4A_7C15;
// Fallback streams must not replay the batch draw that already failed.
const FALLBACK_SALT: u64 = 0xB5AD_4ECE_DA1C_E2A9;

/// Applies a disk-uniform random offset of at most `radius_meters`.
///
/// Randomness is derived from the seed and each point's original index, so a
/// run is reproducible and independent of batch order or thread scheduling.
pub struct Jitterer {
    radius_meters: f64,
    seed: u64,
}

/// One offset draw, in meters: (north-south, east-west).
///
/// The square root makes the displacement uniform over the disk's area
/// rather than clustered at the center.
fn sample_offset_m(rng: &mut impl Rng, radius_meters: f64) -> (f64, f64) {
    let r = rng.gen::<f64>().sqrt() * radius_meters;
    let theta = rng.gen::<f64>() * 2.0 * PI;
    (r * theta.sin(), r * theta.cos())
}

/// Converts a meter offset at `lat` to degrees and applies it. The cos(lat)
/// term corrects for meridian convergence; callers must keep |lat| < 90.
fn displace(lat: f64, lon: f64, dy_m: f64, dx_m: f64) -> (f64, f64) {
    let dlat = dy_m / EARTH_RADIUS_M * (180.0 / PI);
    let dlon = dx_m / (EARTH_RADIUS_M * lat.to_radians().cos()) * (180.0 / PI);
    (lat + dlat, lon + dlon)
}

impl Jitterer {
    pub fn new(radius_meters: f64, seed: u64) -> Self {
        Jitterer { radius_meters, seed }
    }

    fn rng_for(&self, index: usize, salt: u64) -> SmallRng {
        SmallRng::seed_from_u64(self.seed ^ salt ^ (index as u64).wrapping_mul(STREAM_MIX))
    }

    fn check_latitude(point: &GeoPoint, pos: usize) -> Result<(), AnonError> {
        if point.lat.abs() >= 90.0 {
            return Err(AnonError::InvalidCoordinate {
                index: point.original_index.unwrap_or(pos),
                lat: point.lat,
            });
        }
        Ok(())
    }

    /// Jitters every point in one data-parallel pass. Containment is NOT
    /// guaranteed; points near the boundary may land outside it.
    pub fn jitter_batch(&self, points: &[GeoPoint]) -> Result<Vec<GeoPoint>, AnonError> {
        for (pos, point) in points.iter().enumerate() {
            Self::check_latitude(point, pos)?;
        }

        Ok(points
            .par_iter()
            .enumerate()
            .map(|(pos, point)| {
                let mut rng = self.rng_for(point.original_index.unwrap_or(pos), 0);
                let (dy_m, dx_m) = sample_offset_m(&mut rng, self.radius_meters);
                let (lat, lon) = displace(point.lat, point.lon, dy_m, dx_m);
                GeoPoint { lat, lon, original_index: point.original_index }
            })
            .collect())
    }

    /// Redraws a single point's offset until the boundary contains it,
    /// capped at `max_attempts`. Each attempt uses fresh randomness.
    pub fn jitter_within(
        &self,
        point: &GeoPoint,
        boundary: &BoundaryIndex,
        max_attempts: u32,
    ) -> Result<GeoPoint, AnonError> {
        Self::check_latitude(point, 0)?;

        let index = point.original_index.unwrap_or(0);
        let mut rng = self.rng_for(index, FALLBACK_SALT);

        for _ in 0..max_attempts {
            let (dy_m, dx_m) = sample_offset_m(&mut rng, self.radius_meters);
            let (lat, lon) = displace(point.lat, point.lon, dy_m, dx_m);
            if boundary.contains(lat, lon) {
                return Ok(GeoPoint { lat, lon, original_index: point.original_index });
            }
        }

        Err(AnonError::FallbackExhausted { index, attempts: max_attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn offsets_in_meters(origin: &GeoPoint, jittered: &GeoPoint) -> (f64, f64) {
        let dy = (jittered.lat - origin.lat) * EARTH_RADIUS_M * PI / 180.0;
        let dx = (jittered.lon - origin.lon)
            * EARTH_RADIUS_M
            * origin.lat.to_radians().cos()
            * PI
            / 180.0;
        (dy, dx)
    }

    #[test]
    fn offsets_are_disk_uniform() {
        let radius = 1000.0;
        let jitterer = Jitterer::new(radius, 42);
        let origin = GeoPoint::new(0.0, 0.0);
        let points: Vec<GeoPoint> = (0..20_000).map(|i| origin.with_index(i)).collect();

        let jittered = jitterer.jitter_batch(&points).unwrap();
        let distances: Vec<f64> = jittered
            .iter()
            .map(|p| {
                let (dy, dx) = offsets_in_meters(&origin, p);
                dy.hypot(dx)
            })
            .collect();

        let max = distances.iter().cloned().fold(0.0, f64::max);
        assert!(max <= radius * 1.0001);

        // P(r <= x) = (x / radius)^2 under area-uniform sampling.
        for (fraction_of_radius, expected) in [(0.5, 0.25), (0.7, 0.49), (0.9, 0.81)] {
            let cutoff = radius * fraction_of_radius;
            let observed = distances.iter().filter(|&&d| d <= cutoff).count() as f64
                / distances.len() as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "CDF at {cutoff}m: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn batches_are_reproducible_for_a_seed() {
        let jitterer = Jitterer::new(250.0, 7);
        let points: Vec<GeoPoint> = (0..64)
            .map(|i| GeoPoint::new(40.0 + i as f64 * 0.01, -100.0).with_index(i))
            .collect();

        let a = jitterer.jitter_batch(&points).unwrap();
        let b = jitterer.jitter_batch(&points).unwrap();
        assert_eq!(a, b);

        let other = Jitterer::new(250.0, 8).jitter_batch(&points).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn polar_latitudes_are_rejected() {
        let jitterer = Jitterer::new(100.0, 1);
        let points = vec![GeoPoint::new(90.0, 0.0).with_index(3)];

        match jitterer.jitter_batch(&points) {
            Err(AnonError::InvalidCoordinate { index, lat }) => {
                assert_eq!(index, 3);
                assert_eq!(lat, 90.0);
            }
            other => panic!("expected InvalidCoordinate, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn fallback_from_an_edge_point_terminates_contained() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        let boundary = BoundaryIndex::new(&MultiPolygon::new(vec![square]));
        let jitterer = Jitterer::new(100.0, 11);
        // On the bottom edge: roughly half of all draws land outside.
        let edge = GeoPoint::new(0.0, 0.5).with_index(0);

        let recovered = jitterer.jitter_within(&edge, &boundary, 500).unwrap();
        assert!(boundary.contains(recovered.lat, recovered.lon));
    }

    #[test]
    fn fallback_reports_exhaustion_when_no_offset_can_work() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        let boundary = BoundaryIndex::new(&MultiPolygon::new(vec![square]));
        let jitterer = Jitterer::new(100.0, 11);
        // 100 m (< 0.001 deg) of jitter can never reach the square.
        let far_away = GeoPoint::new(10.0, 10.0).with_index(5);

        match jitterer.jitter_within(&far_away, &boundary, 25) {
            Err(AnonError::FallbackExhausted { index, attempts }) => {
                assert_eq!(index, 5);
                assert_eq!(attempts, 25);
            }
            other => panic!("expected FallbackExhausted, got {:?}", other),
        }
    }
}
