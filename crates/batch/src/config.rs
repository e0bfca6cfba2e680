//! Batch configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use coastview_algorithms::exposure::EvaluatorParams;
use crate::error::{BatchError, Result};

/// Settings for one batch session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Grid cell size in map units
    pub cell_size: f64,
    /// Neighborhood and ocean clip radius around each point
    pub analysis_radius: f64,
    /// Stop after this many newly processed points (None = no limit)
    pub max_rows: Option<usize>,
    /// Lowest identifier to process (inclusive)
    pub start_id: Option<u64>,
    /// Highest identifier to process (inclusive)
    pub end_id: Option<u64>,
    /// Height burned for every neighboring point
    pub obstruction_height: f64,
    /// Land/ocean code marking ocean
    pub ocean_code: f64,
    /// Eye height above the surface at each point
    pub observer_height: f64,
    /// Viewshed sample spacing in cells
    pub sample_spacing: f64,
    /// Worker threads (0 = all cores, 1 = sequential)
    pub threads: usize,
    /// Largest analysis grid accepted, in cells
    pub max_cells_per_grid: usize,
    /// Write intermediate grids of every point here as GeoTIFF
    pub dump_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            analysis_radius: 1000.0,
            max_rows: None,
            start_id: None,
            end_id: None,
            obstruction_height: 10.0,
            ocean_code: 200.0,
            observer_height: 0.0,
            sample_spacing: 0.5,
            threads: 0,
            max_cells_per_grid: 4_000_000,
            dump_dir: None,
        }
    }
}

impl BatchConfig {
    /// Check startup invariants. Any violation is fatal.
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(BatchError::InvalidConfig(format!(
                "cell size must be positive, got {}",
                self.cell_size
            )));
        }
        if !(self.analysis_radius > 0.0 && self.analysis_radius.is_finite()) {
            return Err(BatchError::InvalidConfig(format!(
                "analysis radius must be positive, got {}",
                self.analysis_radius
            )));
        }
        if !(self.sample_spacing > 0.0 && self.sample_spacing.is_finite()) {
            return Err(BatchError::InvalidConfig(format!(
                "sample spacing must be positive, got {}",
                self.sample_spacing
            )));
        }
        if !self.obstruction_height.is_finite() || !self.observer_height.is_finite() {
            return Err(BatchError::InvalidConfig("heights must be finite".into()));
        }

        let cells = self.grid_cells();
        if cells > self.max_cells_per_grid as f64 {
            return Err(BatchError::InvalidConfig(format!(
                "analysis window of {} cells exceeds the limit of {}",
                cells, self.max_cells_per_grid
            )));
        }

        if let (Some(start), Some(end)) = (self.start_id, self.end_id) {
            if start > end {
                return Err(BatchError::InvalidConfig(format!(
                    "identifier range {}..={} is inverted",
                    start, end
                )));
            }
        }
        Ok(())
    }

    /// Cells in one analysis window
    pub fn grid_cells(&self) -> f64 {
        let side = (2.0 * self.analysis_radius / self.cell_size).ceil();
        side * side
    }

    /// Whether `id` lies in the configured identifier range
    pub fn in_range(&self, id: u64) -> bool {
        self.start_id.map_or(true, |s| id >= s) && self.end_id.map_or(true, |e| id <= e)
    }

    pub fn evaluator_params(&self) -> EvaluatorParams {
        EvaluatorParams {
            cell_size: self.cell_size,
            analysis_radius: self.analysis_radius,
            obstruction_height: self.obstruction_height,
            ocean_code: self.ocean_code,
            observer_height: self.observer_height,
            sample_spacing: self.sample_spacing,
            ..Default::default()
        }
    }
}
