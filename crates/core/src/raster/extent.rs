//! Axis-aligned analysis windows

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Axis-aligned bounding box in planar coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Square window of half-width `radius` centered on (x, y).
    pub fn around(x: f64, y: f64, radius: f64) -> Self {
        Self::new(x - radius, y - radius, x + radius, y + radius)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grid shape `(rows, cols)` covering this extent at `cell_size`.
    ///
    /// Partial cells along the east and south edges are rounded up.
    pub fn grid_shape(&self, cell_size: f64) -> Result<(usize, usize)> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y, cell_size]
            .iter()
            .all(|v| v.is_finite());
        if !finite || cell_size <= 0.0 || self.width() <= 0.0 || self.height() <= 0.0 {
            return Err(Error::EmptyExtent {
                min_x: self.min_x,
                min_y: self.min_y,
                max_x: self.max_x,
                max_y: self.max_y,
                cell_size,
            });
        }
        // Tolerate float noise so that 2000 / 10 stays 200 cells
        let cols = (self.width() / cell_size - 1e-9).ceil().max(1.0) as usize;
        let rows = (self.height() / cell_size - 1e-9).ceil().max(1.0) as usize;
        Ok((rows, cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_around_shape() {
        let extent = Extent::around(500.0, 500.0, 1000.0);
        assert_eq!(extent.grid_shape(10.0).unwrap(), (200, 200));
    }

    #[test]
    fn test_partial_cells_round_up() {
        let extent = Extent::new(0.0, 0.0, 25.0, 12.0);
        assert_eq!(extent.grid_shape(10.0).unwrap(), (2, 3));
    }

    #[test]
    fn test_zero_area_rejected() {
        let extent = Extent::new(0.0, 0.0, 0.0, 10.0);
        assert!(matches!(
            extent.grid_shape(10.0),
            Err(Error::EmptyExtent { .. })
        ));
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert!(extent.grid_shape(0.0).is_err());
        assert!(extent.grid_shape(f64::NAN).is_err());
    }
}
