use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    pub anonymize: AnonymizeConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// CSV with one record per coordinate pair.
    pub points_csv: PathBuf,
    /// National boundary geometry (.shp or .geojson).
    pub boundary_file: PathBuf,
    pub lat_column: String,
    pub lon_column: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnonymizeConfig {
    /// Maximum displacement, uniform over a disk of this radius.
    pub radius_meters: f64,
    /// Tolerance band added to the boundary used to accept jittered points.
    #[serde(default = "default_margin_meters")]
    pub margin_meters: f64,
    /// Cap on the per-point fallback retry loop.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed RNG seed for reproducible runs. Drawn at random when absent.
    pub seed: Option<u64>,
}

fn default_margin_meters() -> f64 {
    5000.0
}

fn default_max_attempts() -> u32 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub html_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let raw = r#"
            [input]
            points_csv = "data/points.csv"
            boundary_file = "data/us_nation.shp"
            lat_column = "lat"
            lon_column = "long"

            [anonymize]
            radius_meters = 500.0

            [output]
            dir = "public"
            html_file = "anonymous_heatmap.html"

            [server]
            port = 8080
        "#;

        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.anonymize.radius_meters, 500.0);
        assert_eq!(config.anonymize.margin_meters, 5000.0);
        assert_eq!(config.anonymize.max_attempts, 1000);
        assert!(config.anonymize.seed.is_none());
        assert_eq!(config.input.lon_column, "long");
    }
}
