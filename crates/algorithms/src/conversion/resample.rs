//! Nearest-cell resampling of a raster layer onto an analysis grid

use crate::maybe_rayon::*;
use coastview_core::raster::{Extent, Raster};
use coastview_core::{Error, Result};
use ndarray::Array2;

/// Sample `source` at every cell center of a grid covering `extent`.
///
/// Each output cell takes the value of the source cell containing its
/// center. Centers outside the source raster and source no-data cells
/// become NaN.
pub fn resample_to_extent(source: &Raster<f64>, extent: &Extent, cell_size: f64) -> Result<Raster<f64>> {
    let mut output: Raster<f64> = Raster::for_extent(extent, cell_size, f64::NAN)?;
    let (rows, cols) = output.shape();
    let transform = *output.transform();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = transform.pixel_to_geo(col, row);
                if let Some((sr, sc)) = source.cell_of(x, y) {
                    let v = unsafe { source.get_unchecked(sr, sc) };
                    if !source.is_nodata(v) {
                        *out = v;
                    }
                }
            }
            row_data
        })
        .collect();

    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}
