use crate::boundary;
use crate::error::AnonError;
use crate::filter::BoundaryIndex;
use crate::jitter::Jitterer;
use crate::types::{AnonymizationResult, GeoPoint};
use geo::MultiPolygon;
use rand::Rng;
use rayon::prelude::*;
use std::collections::HashSet;

/// Knobs for one anonymization run, constructed by the CLI layer.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub radius_meters: f64,
    pub margin_meters: f64,
    pub max_attempts: u32,
    pub seed: Option<u64>,
}

/// Anonymizes `points` against the national boundary `dataset`.
///
/// Points outside the raw continental boundary are discarded up front and
/// never jittered. Survivors get one vectorized jitter pass; the few that
/// land outside the (margin-buffered) accepting boundary are re-drawn one by
/// one until contained. The margin is an explicit tolerance band: jittered
/// output may sit up to `margin_meters` outside the coastline, and with a
/// zero margin the accepting boundary is the strict continental polygon.
pub fn anonymize(
    points: &[GeoPoint],
    dataset: &MultiPolygon<f64>,
    config: &PipelineConfig,
) -> Result<AnonymizationResult, AnonError> {
    let filter_boundary = boundary::build(dataset, 0.0)?;
    let accept_boundary = if config.margin_meters > 0.0 {
        boundary::build(dataset, config.margin_meters)?
    } else {
        filter_boundary.clone()
    };

    let indexed: Vec<GeoPoint> = points
        .iter()
        .enumerate()
        .map(|(i, p)| p.with_index(i))
        .collect();

    println!("Pre-filtering {} records against the continental boundary...", indexed.len());
    let filter_index = BoundaryIndex::new(&filter_boundary);
    let (kept, discarded) = filter_index.partition(&indexed);
    let kept_count = kept.len();
    let discarded_count = discarded.len();

    println!("Kept {} records within the boundary.", kept_count);
    if discarded_count > 0 {
        println!("Discarded {} records located outside the boundary.", discarded_count);
    }

    if kept.is_empty() {
        return Ok(combine(Vec::new(), Vec::new(), kept_count, discarded_count, 0));
    }

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    println!("Jittering {} records (radius {} m, seed {})...", kept_count, config.radius_meters, seed);

    let jitterer = Jitterer::new(config.radius_meters, seed);
    let accept_index = BoundaryIndex::new(&accept_boundary);

    let jittered = jitterer.jitter_batch(&kept)?;
    let (accepted, outside) = accept_index.partition(&jittered);

    let mut exhausted_count = 0;
    let recovered = if outside.is_empty() {
        println!("All points landed within the boundary on the first pass.");
        Vec::new()
    } else {
        println!("Found {} points outside the boundary. Re-drawing them...", outside.len());
        let retry_set: HashSet<usize> = outside.into_iter().collect();
        let retries: Vec<GeoPoint> = kept
            .iter()
            .enumerate()
            .filter(|(pos, p)| retry_set.contains(&p.original_index.unwrap_or(*pos)))
            .map(|(_, p)| *p)
            .collect();

        let attempts: Vec<Result<GeoPoint, AnonError>> = retries
            .par_iter()
            .map(|p| jitterer.jitter_within(p, &accept_index, config.max_attempts))
            .collect();

        let mut recovered = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            match attempt {
                Ok(point) => recovered.push(point),
                Err(AnonError::FallbackExhausted { index, attempts }) => {
                    println!("Record {} exhausted {} attempts; dropping it.", index, attempts);
                    exhausted_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
        recovered
    };

    Ok(combine(accepted, recovered, kept_count, discarded_count, exhausted_count))
}

/// Merges the vectorized-success and fallback-recovered sets. Order is not
/// significant; the counts carry the accounting.
fn combine(
    vectorized: Vec<GeoPoint>,
    fallback: Vec<GeoPoint>,
    kept_count: usize,
    discarded_count: usize,
    exhausted_count: usize,
) -> AnonymizationResult {
    let mut points = vectorized;
    points.extend(fallback);
    AnonymizationResult { points, kept_count, discarded_count, exhausted_count }
}
