//! Loading points and the land/ocean layer

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::info;
use coastview_algorithms::exposure::OceanLayer;
use coastview_core::io::read_geotiff;
use coastview_core::{PropertyPoint, Raster};
use crate::error::{BatchError, Result};

/// Read property points from a CSV file with header `id,x,y,lat,lon`.
///
/// `lat` and `lon` may be left empty. Identifiers must be unique.
pub fn read_points(path: impl AsRef<Path>) -> Result<Vec<PropertyPoint>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let points = read_points_from(file)?;
    info!(count = points.len(), path = %path.display(), "loaded points");
    Ok(points)
}

/// Read property points from any CSV source
pub fn read_points_from<R: Read>(reader: R) -> Result<Vec<PropertyPoint>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut points = Vec::new();
    for record in csv.deserialize() {
        let point: PropertyPoint = record?;
        if !seen.insert(point.id) {
            return Err(BatchError::InvalidInput(format!(
                "duplicate point identifier {}",
                point.id
            )));
        }
        points.push(point);
    }
    Ok(points)
}

/// Read a single-band GeoTIFF of land/ocean codes
pub fn read_ocean(path: impl AsRef<Path>) -> Result<OceanLayer> {
    let path = path.as_ref();
    let codes: Raster<f64> = read_geotiff(path)?;
    let (rows, cols) = codes.shape();
    info!(rows, cols, path = %path.display(), "loaded land/ocean layer");
    Ok(OceanLayer::Raster(codes))
}
