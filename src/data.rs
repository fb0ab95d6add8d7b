use crate::config::InputConfig;
use crate::types::GeoPoint;
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Loads the source coordinates from CSV.
///
/// Rows missing either coordinate, or with unparsable values, are skipped
/// (the upstream export is allowed to have gaps) and reported once at the
/// end rather than failing the run.
pub fn load_points(config: &InputConfig) -> Result<Vec<GeoPoint>> {
    let file = File::open(&config.points_csv)
        .with_context(|| format!("Failed to open points CSV: {:?}", config.points_csv))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);
    let headers = rdr.headers()?.clone();

    let lat_idx = headers
        .iter()
        .position(|h| h == config.lat_column)
        .ok_or_else(|| anyhow!("Latitude column '{}' not found in CSV", config.lat_column))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == config.lon_column)
        .ok_or_else(|| anyhow!("Longitude column '{}' not found in CSV", config.lon_column))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = result?;
        let lat = record.get(lat_idx).and_then(|v| v.trim().parse::<f64>().ok());
        let lon = record.get(lon_idx).and_then(|v| v.trim().parse::<f64>().ok());

        match (lat, lon) {
            (Some(lat), Some(lon)) => points.push(GeoPoint::new(lat, lon)),
            _ => skipped += 1,
        }
    }

    println!("Loaded {} records with coordinates.", points.len());
    if skipped > 0 {
        println!("Skipped {} records with missing or malformed coordinates.", skipped);
    }

    Ok(points)
}

/// Loads the national boundary dataset, collecting every polygon part of
/// every feature into a single MultiPolygon.
pub fn load_boundary(path: &Path) -> Result<MultiPolygon<f64>> {
    println!("Loading boundary from {:?}...", path);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Boundary file has no extension"))?;

    let boundary = match extension.as_str() {
        "shp" => load_boundary_shapefile(path)?,
        "json" | "geojson" => load_boundary_geojson(path)?,
        _ => return Err(anyhow!("Unsupported boundary format: {}", extension)),
    };

    println!("Loaded boundary with {} polygon part(s).", boundary.0.len());
    Ok(boundary)
}

fn load_boundary_shapefile(path: &Path) -> Result<MultiPolygon<f64>> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut parts = Vec::new();
    for result in reader.iter_shapes_and_records() {
        let (shape, _record) = result?;
        let multi: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(p) => p
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(p) => p
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(p) => p
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => continue, // Skip non-polygon shapes
        };
        parts.extend(multi.0);
    }

    Ok(MultiPolygon::new(parts))
}

fn load_boundary_geojson(path: &Path) -> Result<MultiPolygon<f64>> {
    use geojson::GeoJson;

    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let reader = BufReader::new(file);

    // warning: this loads the whole file into memory.
    let geojson = GeoJson::from_reader(reader).context("Failed to parse boundary GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Boundary GeoJSON must be a FeatureCollection")),
    };

    let mut parts = Vec::new();
    for feature in collection.features {
        let geometry = match feature.geometry {
            Some(geometry) => geometry,
            None => continue,
        };
        let geo_geom: geo::Geometry<f64> = geometry
            .value
            .try_into()
            .map_err(|e| anyhow!("Failed to convert geometry: {:?}", e))?;

        match geo_geom {
            geo::Geometry::Polygon(p) => parts.push(p),
            geo::Geometry::MultiPolygon(mp) => parts.extend(mp.0),
            _ => continue, // Skip points/lines
        }
    }

    Ok(MultiPolygon::new(parts))
}
