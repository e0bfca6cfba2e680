//! GeoTIFF dumps of per-point intermediate grids

use std::path::Path;
use coastview_algorithms::exposure::ExposureLayers;
use coastview_core::io::write_geotiff;
use crate::error::Result;

/// Write the obstruction surface, ocean mask, viewshed and sector map of
/// point `id` into `dir` as `{layer}_{id}.tif`.
pub fn dump_layers(dir: &Path, id: u64, layers: &ExposureLayers) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    write_geotiff(&layers.obstruction, dir.join(format!("obstruction_{}.tif", id)), None)?;
    write_geotiff(&layers.ocean, dir.join(format!("ocean_{}.tif", id)), None)?;
    write_geotiff(&layers.visibility, dir.join(format!("visibility_{}.tif", id)), None)?;
    write_geotiff(&layers.sectors, dir.join(format!("sectors_{}.tif", id)), None)?;
    Ok(())
}
