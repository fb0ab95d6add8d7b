use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair in decimal degrees.
///
/// Instances are never mutated; every pipeline stage (filter, jitter,
/// fallback) produces fresh points. `original_index` tracks the position in
/// the raw input so fallback results can be correlated back to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub original_index: Option<usize>,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon, original_index: None }
    }

    pub fn with_index(&self, index: usize) -> Self {
        GeoPoint { lat: self.lat, lon: self.lon, original_index: Some(index) }
    }
}

/// Output of the anonymization pipeline.
#[derive(Debug, Clone)]
pub struct AnonymizationResult {
    /// Jittered points, all contained in the accepting boundary.
    pub points: Vec<GeoPoint>,
    /// Input points that survived the initial boundary filter.
    pub kept_count: usize,
    /// Input points rejected before jitter (outside the raw boundary).
    pub discarded_count: usize,
    /// Kept points whose fallback retry loop hit the attempt cap.
    pub exhausted_count: usize,
}

/// Run summary persisted next to the heatmap, served by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub total_count: usize,
    pub kept_count: usize,
    pub discarded_count: usize,
    pub exhausted_count: usize,
    pub radius_meters: f64,
    pub margin_meters: f64,
}
