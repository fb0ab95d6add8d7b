use crate::error::AnonError;
use geo::algorithm::area::Area;
use geo::BooleanOps;
use geo::MultiPolygon;
use std::cmp::Ordering;
use std::f64::consts::PI;

/// WGS84 equatorial radius, matching the web-mercator sphere.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Small-angle conversion of a ground distance to degrees of latitude.
/// Valid for buffer distances of a few kilometers; not valid near the poles.
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters / EARTH_RADIUS_M * (180.0 / PI)
}

/// Derives the working boundary from a multi-part national dataset.
///
/// With no margin the filtering boundary is wanted: the single largest part
/// by area (the continental landmass), dropping Alaska, Hawaii and the
/// territories. With a margin the accepting boundary is wanted: every part is
/// kept (keys and near-shore islands included), dissolved into one shape, and
/// expanded outward so jittered points just off the coastline still pass.
pub fn build(dataset: &MultiPolygon<f64>, margin_meters: f64) -> Result<MultiPolygon<f64>, AnonError> {
    let mut parts = dataset.iter();
    let first = parts
        .next()
        .ok_or_else(|| AnonError::BoundaryData("dataset contains no polygons".to_string()))?;

    if margin_meters <= 0.0 {
        let largest = dataset
            .iter()
            .max_by(|a, b| {
                a.unsigned_area()
                    .partial_cmp(&b.unsigned_area())
                    .unwrap_or(Ordering::Equal)
            })
            .expect("non-empty dataset");

        if largest.unsigned_area() == 0.0 {
            return Err(AnonError::BoundaryData("largest part has zero area".to_string()));
        }
        return Ok(MultiPolygon::new(vec![largest.clone()]));
    }

    // Union also normalizes shared-edge artifacts between adjacent parts,
    // the same repair the reference data needs before buffering.
    let mut unioned = MultiPolygon::new(vec![first.clone()]);
    for part in parts {
        unioned = unioned.union(&MultiPolygon::new(vec![part.clone()]));
    }

    if unioned.unsigned_area() == 0.0 {
        return Err(AnonError::BoundaryData("unioned boundary has zero area".to_string()));
    }

    Ok(geo_buffer::buffer_multi_polygon(
        &unioned,
        meters_to_degrees(margin_meters),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::algorithm::contains::Contains;
    use geo::{polygon, Point, Polygon};

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]
    }

    #[test]
    fn zero_margin_selects_largest_part() {
        let dataset = MultiPolygon::new(vec![square(0.0, 0.0, 10.0), square(20.0, 20.0, 1.0)]);
        let boundary = build(&dataset, 0.0).unwrap();

        assert_eq!(boundary.0.len(), 1);
        assert!(boundary.contains(&Point::new(5.0, 5.0)));
        assert!(!boundary.contains(&Point::new(20.5, 20.5)));
    }

    #[test]
    fn margin_keeps_all_parts_and_expands_them() {
        let dataset = MultiPolygon::new(vec![square(0.0, 0.0, 10.0), square(20.0, 20.0, 1.0)]);
        // ~0.18 degrees of slack.
        let boundary = build(&dataset, 20_000.0).unwrap();

        // The small island survives and both shapes grew past their edges.
        assert!(boundary.contains(&Point::new(20.5, 20.5)));
        assert!(boundary.contains(&Point::new(-0.1, 5.0)));
        assert!(boundary.contains(&Point::new(20.5, 21.1)));
        // Well outside the margin band stays outside.
        assert!(!boundary.contains(&Point::new(15.0, 15.0)));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset: MultiPolygon<f64> = MultiPolygon::new(vec![]);
        assert!(matches!(build(&dataset, 0.0), Err(AnonError::BoundaryData(_))));
    }

    #[test]
    fn meter_conversion_matches_earth_circumference() {
        // A quarter circumference is 90 degrees.
        let quarter = EARTH_RADIUS_M * PI / 2.0;
        assert!((meters_to_degrees(quarter) - 90.0).abs() < 1e-9);
    }
}
