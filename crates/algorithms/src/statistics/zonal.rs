//! Zonal statistics by compass sector
//!
//! The sector map acts as the zone raster: for each of the 8 sectors this
//! counts the cells that are both visible from the observer and ocean, and
//! derives the exposure indicators from that count and the sector's size.

use serde::{Deserialize, Serialize};
use crate::classification::Sector;
use crate::maybe_rayon::*;
use coastview_core::raster::Raster;
use coastview_core::Result;

/// Exposure of one compass sector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectorStatistics {
    /// Cells in the sector that are visible and ocean
    pub visible_ocean: usize,
    /// All cells in the sector
    pub total: usize,
    /// At least one visible ocean cell
    pub exposed_at_all: bool,
    /// Strictly more than half of the sector is visible ocean
    pub highly_exposed: bool,
    /// `visible_ocean / total`, 0 for an empty sector
    pub exposure_rate: f64,
}

impl SectorStatistics {
    pub fn from_counts(visible_ocean: usize, total: usize) -> Self {
        let exposure_rate = if total == 0 {
            0.0
        } else {
            visible_ocean as f64 / total as f64
        };
        Self {
            visible_ocean,
            total,
            exposed_at_all: visible_ocean > 0,
            highly_exposed: 2 * visible_ocean > total,
            exposure_rate,
        }
    }
}

/// Statistics for all sectors, indexed by [`Sector::index`]
pub type SectorTable = [SectorStatistics; 8];

/// Per-row (visible ocean, total) counts
#[derive(Clone, Copy, Default)]
struct Counts {
    visible_ocean: [usize; 8],
    total: [usize; 8],
}

impl Counts {
    fn merge(mut self, other: Counts) -> Counts {
        for i in 0..8 {
            self.visible_ocean[i] += other.visible_ocean[i];
            self.total[i] += other.total[i];
        }
        self
    }
}

/// Aggregate visibility and ocean cells per sector.
///
/// # Arguments
/// * `sectors` - Sector map with codes 1..=8; other values are ignored
/// * `visibility` - Viewshed mask, nonzero = visible
/// * `ocean` - Binary land/ocean mask, 1 = ocean
///
/// # Errors
/// [`Error::SizeMismatch`](coastview_core::Error::SizeMismatch) if the three
/// rasters do not share a shape.
pub fn aggregate(
    sectors: &Raster<u8>,
    visibility: &Raster<u8>,
    ocean: &Raster<u8>,
) -> Result<SectorTable> {
    sectors.ensure_same_shape(visibility)?;
    sectors.ensure_same_shape(ocean)?;

    let (rows, cols) = sectors.shape();

    let row_counts: Vec<Counts> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut counts = Counts::default();
            for col in 0..cols {
                let code = unsafe { sectors.get_unchecked(row, col) };
                let Some(sector) = Sector::from_code(code) else {
                    continue;
                };
                let i = sector.index();
                counts.total[i] += 1;

                let seen = unsafe { visibility.get_unchecked(row, col) } != 0;
                let wet = unsafe { ocean.get_unchecked(row, col) } == 1;
                if seen && wet {
                    counts.visible_ocean[i] += 1;
                }
            }
            counts
        })
        .collect();

    let counts = row_counts
        .into_iter()
        .fold(Counts::default(), Counts::merge);

    Ok(std::array::from_fn(|i| {
        SectorStatistics::from_counts(counts.visible_ocean[i], counts.total[i])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use coastview_core::Error;

    fn raster(rows: usize, cols: usize, values: &[u8]) -> Raster<u8> {
        Raster::from_vec(values.to_vec(), rows, cols).unwrap()
    }

    #[test]
    fn test_counts_by_sector() {
        let sectors = raster(2, 4, &[1, 1, 1, 1, 5, 5, 5, 5]);
        let visible = raster(2, 4, &[1, 1, 1, 0, 1, 1, 0, 0]);
        let ocean = raster(2, 4, &[1, 1, 1, 1, 1, 0, 1, 1]);

        let table = aggregate(&sectors, &visible, &ocean).unwrap();
        let south = table[Sector::South.index()];
        assert_eq!(south.visible_ocean, 3);
        assert_eq!(south.total, 4);
        assert!(south.exposed_at_all);
        assert!(south.highly_exposed);
        assert_relative_eq!(south.exposure_rate, 0.75);

        let north = table[Sector::North.index()];
        assert_eq!(north.visible_ocean, 1);
        assert!(north.exposed_at_all);
        assert!(!north.highly_exposed);
        assert_relative_eq!(north.exposure_rate, 0.25);
    }

    #[test]
    fn test_exactly_half_is_not_highly_exposed() {
        let s = SectorStatistics::from_counts(2, 4);
        assert!(s.exposed_at_all);
        assert!(!s.highly_exposed);
        assert_relative_eq!(s.exposure_rate, 0.5);
    }

    #[test]
    fn test_empty_sector() {
        let s = SectorStatistics::from_counts(0, 0);
        assert_eq!(s.exposure_rate, 0.0);
        assert!(!s.exposed_at_all);
        assert!(!s.highly_exposed);
    }

    #[test]
    fn test_totals_cover_grid() {
        let codes: Vec<u8> = (0..64).map(|i| (i % 8) as u8 + 1).collect();
        let sectors = raster(8, 8, &codes);
        let zeros = raster(8, 8, &[0; 64]);
        let table = aggregate(&sectors, &zeros, &zeros).unwrap();
        assert_eq!(table.iter().map(|s| s.total).sum::<usize>(), 64);
        assert!(table.iter().all(|s| s.total == 8 && !s.exposed_at_all));
    }

    #[test]
    fn test_unknown_codes_ignored() {
        let sectors = raster(1, 3, &[0, 9, 3]);
        let ones = raster(1, 3, &[1, 1, 1]);
        let table = aggregate(&sectors, &ones, &ones).unwrap();
        assert_eq!(table.iter().map(|s| s.total).sum::<usize>(), 1);
        assert_eq!(table[Sector::West.index()].visible_ocean, 1);
    }

    #[test]
    fn test_shape_mismatch() {
        let sectors = raster(2, 2, &[1; 4]);
        let other = raster(1, 4, &[1; 4]);
        assert!(matches!(
            aggregate(&sectors, &other, &sectors),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
