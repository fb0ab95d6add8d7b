use thiserror::Error;

/// Failures the anonymization core can surface.
#[derive(Debug, Error)]
pub enum AnonError {
    /// Boundary dataset missing, empty, or degenerate. Fatal to the run.
    #[error("unusable boundary dataset: {0}")]
    BoundaryData(String),

    /// A pole-adjacent latitude reached the jitter stage. The meridian
    /// convergence term divides by cos(lat), which is zero at the poles.
    #[error("record {index} has invalid latitude {lat}: |lat| must be < 90")]
    InvalidCoordinate { index: usize, lat: f64 },

    /// A point's fallback retry loop hit the attempt cap without landing
    /// inside the boundary. Per-point, not fatal to the run.
    #[error("record {index} found no contained offset after {attempts} attempts")]
    FallbackExhausted { index: usize, attempts: u32 },
}
