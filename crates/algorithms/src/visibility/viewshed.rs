//! Viewshed analysis
//!
//! Determines which cells of an obstruction surface can be seen from an
//! observer point. For every target cell a ray is traced from the observer
//! to the target's center and the surface is sampled at regular intervals
//! along it. The target is visible if and only if no intermediate sample
//! rises strictly above the sight line at that sample.
//!
//! The sight line runs from the observer elevation (surface at the observer
//! cell plus observer height) to the target elevation (surface at the target
//! plus target height) on a flat earth, with no curvature or refraction
//! correction. No-data cells and samples that fall outside the surface count
//! as ground level (0).
//!
//! Rays are independent, so rows are traced in parallel. Cost is
//! O(cells × ray length).

use ndarray::Array2;
use crate::maybe_rayon::*;
use coastview_core::raster::Raster;
use coastview_core::{Algorithm, Error, Result};

/// Parameters for viewshed analysis
#[derive(Debug, Clone)]
pub struct ViewshedParams {
    /// Observer X coordinate (map units)
    pub observer_x: f64,
    /// Observer Y coordinate (map units)
    pub observer_y: f64,
    /// Eye height above the surface at the observer (default 0)
    pub observer_height: f64,
    /// Height added to the surface at each target (default 0)
    pub target_height: f64,
    /// Distance between samples along a ray, in cells (default 0.5)
    pub sample_spacing: f64,
    /// Targets farther than this (map units) are not visible (0 = unlimited)
    pub max_distance: f64,
}

impl Default for ViewshedParams {
    fn default() -> Self {
        Self {
            observer_x: 0.0,
            observer_y: 0.0,
            observer_height: 0.0,
            target_height: 0.0,
            sample_spacing: 0.5,
            max_distance: 0.0,
        }
    }
}

impl ViewshedParams {
    pub fn at(observer_x: f64, observer_y: f64) -> Self {
        Self {
            observer_x,
            observer_y,
            ..Default::default()
        }
    }
}

/// Viewshed algorithm
#[derive(Debug, Clone, Default)]
pub struct Viewshed;

impl Algorithm for Viewshed {
    type Input = Raster<f64>;
    type Output = Raster<u8>;
    type Params = ViewshedParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Viewshed"
    }

    fn description(&self) -> &'static str {
        "Mark the cells of an obstruction surface visible from an observer point"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        viewshed(&input, params)
    }
}

/// Surface height used for line-of-sight: outside the grid and no-data are ground.
#[inline]
fn height_at(surface: &Raster<f64>, row: isize, col: isize) -> f64 {
    match surface.get_signed(row, col) {
        Some(z) if !surface.is_nodata(z) => z,
        _ => 0.0,
    }
}

/// Observer geometry shared by all rays, in fractional cell coordinates
struct Observer {
    row: f64,
    col: f64,
    cell: (isize, isize),
    z: f64,
}

/// Compute the visibility mask of `surface` from the observer in `params`.
///
/// # Returns
/// Raster<u8> where 1 = visible, 0 = not visible. The observer's own cell is
/// always visible.
///
/// # Errors
/// - [`Error::DegenerateObserver`] if the observer lies outside the grid
/// - [`Error::NumericFault`] if the observer position or elevation is not finite
/// - [`Error::InvalidParameter`] for a non-positive sample spacing or negative max distance
pub fn viewshed(surface: &Raster<f64>, params: ViewshedParams) -> Result<Raster<u8>> {
    let (rows, cols) = surface.shape();
    let (ox, oy) = (params.observer_x, params.observer_y);

    if !ox.is_finite() || !oy.is_finite() {
        return Err(Error::NumericFault(format!(
            "observer coordinate ({}, {}) is not finite",
            ox, oy
        )));
    }
    if !(params.sample_spacing > 0.0 && params.sample_spacing.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "sample_spacing",
            value: params.sample_spacing.to_string(),
            reason: "must be a positive number of cells".into(),
        });
    }
    if !(params.max_distance >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "max_distance",
            value: params.max_distance.to_string(),
            reason: "must be >= 0".into(),
        });
    }

    let (obs_row, obs_col) = surface
        .cell_of(ox, oy)
        .ok_or(Error::DegenerateObserver { x: ox, y: oy })?;
    let (frac_col, frac_row) = surface.geo_to_pixel(ox, oy);

    let observer = Observer {
        row: frac_row,
        col: frac_col,
        cell: (obs_row as isize, obs_col as isize),
        z: height_at(surface, obs_row as isize, obs_col as isize) + params.observer_height,
    };
    if !observer.z.is_finite() {
        return Err(Error::NumericFault(format!(
            "observer elevation {} is not finite",
            observer.z
        )));
    }

    let cell_size = surface.cell_size();
    let max_cells = if params.max_distance > 0.0 {
        params.max_distance / cell_size
    } else {
        f64::INFINITY
    };

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0_u8; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let target = (row as isize, col as isize);
                if target == observer.cell {
                    *out = 1;
                    continue;
                }
                let tr = row as f64 + 0.5;
                let tc = col as f64 + 0.5;
                if (tr - observer.row).hypot(tc - observer.col) > max_cells {
                    continue;
                }
                let target_z = height_at(surface, target.0, target.1) + params.target_height;
                if ray_is_clear(surface, &observer, target, (tr, tc), target_z, params.sample_spacing) {
                    *out = 1;
                }
            }
            row_data
        })
        .collect();

    let mut output = surface.with_same_meta::<u8>(rows, cols);
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

/// Walk the sight line from the observer to a target center.
///
/// Samples inside the observer's and the target's own cells are skipped;
/// only intermediate cells can obstruct.
fn ray_is_clear(
    surface: &Raster<f64>,
    observer: &Observer,
    target_cell: (isize, isize),
    target_center: (f64, f64),
    target_z: f64,
    spacing: f64,
) -> bool {
    let dr = target_center.0 - observer.row;
    let dc = target_center.1 - observer.col;
    let steps = (dr.hypot(dc) / spacing).ceil() as usize;

    for s in 1..steps {
        let t = s as f64 / steps as f64;
        let cell = (
            (observer.row + dr * t).floor() as isize,
            (observer.col + dc * t).floor() as isize,
        );
        if cell == observer.cell || cell == target_cell {
            continue;
        }
        let sight = observer.z + (target_z - observer.z) * t;
        if height_at(surface, cell.0, cell.1) > sight {
            return false;
        }
    }
    true
}
