use crate::config::AppConfig;
use crate::types::{GeoPoint, RunStats};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

// Approximate framing for the continental US.
const MAP_CENTER: [f64; 2] = [39.82, -98.57];
const MAP_BOUNDS: [[f64; 2]; 2] = [[24.0, -125.0], [50.0, -66.0]];

pub const STATS_FILE: &str = "stats.json";

/// Writes a self-contained Leaflet heatmap page for the anonymized points.
pub fn write_heatmap(config: &AppConfig, points: &[GeoPoint]) -> Result<PathBuf> {
    fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("Failed to create output dir: {:?}", config.output.dir))?;

    let heat_data: Vec<[f64; 2]> = points.iter().map(|p| [p.lat, p.lon]).collect();
    let heat_json = serde_json::to_string(&heat_data).context("Failed to encode heat data")?;

    let html = heatmap_page(&heat_json);
    let path = config.output.dir.join(&config.output.html_file);
    fs::write(&path, html).with_context(|| format!("Failed to write heatmap: {:?}", path))?;

    Ok(path)
}

/// Persists the run summary next to the heatmap so serve mode can expose it.
pub fn write_stats(config: &AppConfig, stats: &RunStats) -> Result<PathBuf> {
    fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("Failed to create output dir: {:?}", config.output.dir))?;

    let path = config.output.dir.join(STATS_FILE);
    let json = serde_json::to_string_pretty(stats).context("Failed to encode run stats")?;
    fs::write(&path, json).with_context(|| format!("Failed to write stats: {:?}", path))?;

    Ok(path)
}

fn heatmap_page(heat_json: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Anonymized Density Heatmap</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<div style="position: fixed;
    bottom: 50px; left: 50px; width: 150px; height: 90px;
    border: 2px solid grey; z-index: 9999; font-size: 14px;
    background-color: white;">
    &nbsp; <b>Density</b> <br>
    &nbsp; High &nbsp; <span style="color:red">&#9632;</span><br>
    &nbsp; Medium &nbsp; <span style="color:yellowgreen">&#9632;</span><br>
    &nbsp; Low &nbsp; <span style="color:blue">&#9632;</span>
</div>
<script>
var map = L.map('map', {{
    center: [{lat}, {lon}],
    zoom: 5,
    minZoom: 4,
    zoomDelta: 0.25,
    zoomSnap: 0.25,
    maxBounds: {bounds}
}});
L.tileLayer('https://{{s}}.basemaps.cartocdn.com/light_all/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; OpenStreetMap contributors &copy; CARTO'
}}).addTo(map);
map.fitBounds({bounds});
L.heatLayer({heat_json}, {{radius: 8, blur: 5}}).addTo(map);
</script>
</body>
</html>
"#,
        lat = MAP_CENTER[0],
        lon = MAP_CENTER[1],
        bounds = format!(
            "[[{}, {}], [{}, {}]]",
            MAP_BOUNDS[0][0], MAP_BOUNDS[0][1], MAP_BOUNDS[1][0], MAP_BOUNDS[1][1]
        ),
        heat_json = heat_json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_embeds_every_point() {
        let points = vec![GeoPoint::new(39.0, -98.0), GeoPoint::new(40.5, -100.25)];
        let data: Vec<[f64; 2]> = points.iter().map(|p| [p.lat, p.lon]).collect();
        let page = heatmap_page(&serde_json::to_string(&data).unwrap());

        assert!(page.contains("[39.0,-98.0]"));
        assert!(page.contains("[40.5,-100.25]"));
        assert!(page.contains("heatLayer"));
    }
}
