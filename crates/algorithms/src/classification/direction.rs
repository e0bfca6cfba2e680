//! Compass sector classification around an observer
//!
//! Every cell of an analysis grid is assigned one of 8 sectors according to
//! where it lies relative to the observer: a cell due south of the observer
//! is in the South sector. Sector codes follow a fixed order that the output
//! columns depend on:
//!
//! ```text
//! 1 South  2 Southwest  3 West  4 Northwest  5 North  6 Northeast  7 East  8 Southeast
//! ```
//!
//! The classification works on the back-bearing, the direction from the cell
//! to the observer measured clockwise from grid north. For a cell lying
//! south of the observer that bearing points north (0°), so the South sector
//! is the 45° arc centered on 0° and the sectors then proceed clockwise.
//! The back-bearing surface is reclassified with a range table whose first
//! sector wraps around 0°/360° through two explicit rules.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use crate::classification::reclassify::{reclassify, ReclassRule, ReclassifyParams, Unmatched};
use crate::maybe_rayon::*;
use coastview_core::raster::{Extent, Raster};
use coastview_core::{Error, Result};

/// One of the 8 fixed 45° compass sectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Sector {
    South = 1,
    Southwest = 2,
    West = 3,
    Northwest = 4,
    North = 5,
    Northeast = 6,
    East = 7,
    Southeast = 8,
}

impl Sector {
    /// All sectors in output order
    pub const ALL: [Sector; 8] = [
        Sector::South,
        Sector::Southwest,
        Sector::West,
        Sector::Northwest,
        Sector::North,
        Sector::Northeast,
        Sector::East,
        Sector::Southeast,
    ];

    /// Sector code stored in sector maps (1..=8)
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Sector> {
        Sector::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }

    /// Zero-based position in output order
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Sector::South => "South",
            Sector::Southwest => "Southwest",
            Sector::West => "West",
            Sector::Northwest => "Northwest",
            Sector::North => "North",
            Sector::Northeast => "Northeast",
            Sector::East => "East",
            Sector::Southeast => "Southeast",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Range table mapping back-bearings (degrees) to sector codes.
///
/// Ranges are half-open, so a bearing on a sector boundary belongs to the
/// sector clockwise of it.
pub fn direction_rules() -> ReclassifyParams {
    let mut rules = vec![ReclassRule::range(0.0, 22.5, Sector::South.code() as f64)];
    for (i, sector) in Sector::ALL.iter().enumerate().skip(1) {
        let center = 45.0 * i as f64;
        rules.push(ReclassRule::range(center - 22.5, center + 22.5, sector.code() as f64));
    }
    rules.push(ReclassRule::range(337.5, 360.0, Sector::South.code() as f64));
    ReclassifyParams::new(rules, Unmatched::NoData)
}

/// Direction from (x, y) to the observer, degrees clockwise from north in [0, 360).
///
/// A point coinciding with the observer has back-bearing 0.
#[inline]
pub fn back_bearing(observer: (f64, f64), x: f64, y: f64) -> f64 {
    let dx = observer.0 - x;
    let dy = observer.1 - y;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    let mut deg = dx.atan2(dy).to_degrees();
    if deg < 0.0 {
        deg += 360.0;
    }
    if deg >= 360.0 {
        deg -= 360.0;
    }
    deg
}

fn check_observer(observer: (f64, f64)) -> Result<()> {
    if !observer.0.is_finite() || !observer.1.is_finite() {
        return Err(Error::NumericFault(format!(
            "observer coordinate ({}, {}) is not finite",
            observer.0, observer.1
        )));
    }
    Ok(())
}

/// Back-bearing from every cell center to the observer.
pub fn back_bearing_surface(observer: (f64, f64), extent: &Extent, cell_size: f64) -> Result<Raster<f64>> {
    check_observer(observer)?;
    let mut output: Raster<f64> = Raster::for_extent(extent, cell_size, 0.0)?;
    let (rows, cols) = output.shape();
    let transform = *output.transform();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let (x, y) = transform.pixel_to_geo(col, row);
                    back_bearing(observer, x, y)
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

/// Classify every cell of the grid covering `extent` into a compass sector.
///
/// Depends only on the observer location and the grid geometry, so it can
/// be computed independently of the obstruction surface.
///
/// # Returns
/// Raster<u8> of sector codes 1..=8 (see [`Sector`])
pub fn classify_directions(observer: (f64, f64), extent: &Extent, cell_size: f64) -> Result<Raster<u8>> {
    let bearings = back_bearing_surface(observer, extent, cell_size)?;
    let zones = reclassify(&bearings, &direction_rules())?;

    let (rows, cols) = zones.shape();
    let mut sectors = zones.with_same_meta::<u8>(rows, cols);
    for ((row, col), &code) in zones.data().indexed_iter() {
        if !(1.0..=8.0).contains(&code) {
            return Err(Error::NumericFault(format!(
                "bearing {} at ({}, {}) fell outside every sector",
                bearings.data()[(row, col)],
                row,
                col
            )));
        }
        sectors.data_mut()[(row, col)] = code as u8;
    }
    Ok(sectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sector_codes_and_names() {
        assert_eq!(Sector::South.code(), 1);
        assert_eq!(Sector::Southeast.code(), 8);
        assert_eq!(Sector::from_code(5), Some(Sector::North));
        assert_eq!(Sector::from_code(0), None);
        assert_eq!(Sector::from_code(9), None);
        let names: Vec<&str> = Sector::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["South", "Southwest", "West", "Northwest", "North", "Northeast", "East", "Southeast"]
        );
    }

    #[test]
    fn test_back_bearing_cardinals() {
        let o = (0.0, 0.0);
        assert_relative_eq!(back_bearing(o, 0.0, -10.0), 0.0); // cell south
        assert_relative_eq!(back_bearing(o, -10.0, 0.0), 90.0); // cell west
        assert_relative_eq!(back_bearing(o, 0.0, 10.0), 180.0); // cell north
        assert_relative_eq!(back_bearing(o, 10.0, 0.0), 270.0); // cell east
        assert_eq!(back_bearing(o, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_cell_on_sector_boundary_resolves_clockwise() {
        let extent = Extent::new(-100.0, -100.0, 100.0, 100.0);
        let offset = 22.5_f64.to_radians().tan() * 50.0;
        let (cx, cy) = (-5.0, -55.0);
        let code_at = |sectors: &Raster<u8>, x: f64, y: f64| {
            let (row, col) = sectors.cell_of(x, y).unwrap();
            sectors.get(row, col).unwrap()
        };

        // Cell center on the South/Southwest boundary
        let observer = (cx + offset, cy + 50.0);
        let bearing = back_bearing(observer, cx, cy);
        assert_relative_eq!(bearing, 22.5, epsilon = 1e-9);
        let sectors = classify_directions(observer, &extent, 10.0).unwrap();
        let expected = if bearing >= 22.5 { 2 } else { 1 };
        assert_eq!(code_at(&sectors, cx, cy), expected);
        assert_eq!(code_at(&sectors, cx - 10.0, cy), 2);
        assert_eq!(code_at(&sectors, cx + 10.0, cy), 1);

        // Cell center on the Southeast/South boundary
        let observer = (cx - offset, cy + 50.0);
        let bearing = back_bearing(observer, cx, cy);
        assert_relative_eq!(bearing, 337.5, epsilon = 1e-9);
        let sectors = classify_directions(observer, &extent, 10.0).unwrap();
        let expected = if bearing >= 337.5 { 1 } else { 8 };
        assert_eq!(code_at(&sectors, cx, cy), expected);
        assert_eq!(code_at(&sectors, cx - 10.0, cy), 1);
        assert_eq!(code_at(&sectors, cx + 10.0, cy), 8);
    }

    #[test]
    fn test_rule_table_wraps_south() {
        let rules = direction_rules();
        assert_eq!(rules.classify(0.0, false), 1.0);
        assert_eq!(rules.classify(350.0, false), 1.0);
        assert_eq!(rules.classify(337.5, false), 1.0);
        assert_eq!(rules.classify(337.4999, false), 8.0);
        assert_eq!(rules.classify(22.5, false), 2.0);
        assert_eq!(rules.classify(180.0, false), 5.0);
        assert_eq!(rules.classify(359.9999, false), 1.0);
    }

    #[test]
    fn test_named_directions_around_observer() {
        // 5x5 grid, observer at the center of cell (2, 2)
        let extent = Extent::new(0.0, 0.0, 50.0, 50.0);
        let sectors = classify_directions((25.0, 25.0), &extent, 10.0).unwrap();

        let at = |row: usize, col: usize| Sector::from_code(sectors.get(row, col).unwrap()).unwrap();
        assert_eq!(at(4, 2), Sector::South);
        assert_eq!(at(4, 0), Sector::Southwest);
        assert_eq!(at(2, 0), Sector::West);
        assert_eq!(at(0, 0), Sector::Northwest);
        assert_eq!(at(0, 2), Sector::North);
        assert_eq!(at(0, 4), Sector::Northeast);
        assert_eq!(at(2, 4), Sector::East);
        assert_eq!(at(4, 4), Sector::Southeast);
        // The observer's own cell
        assert_eq!(at(2, 2), Sector::South);
    }

    #[test]
    fn test_every_cell_gets_exactly_one_sector() {
        let extent = Extent::around(1234.5, -987.25, 200.0);
        let sectors = classify_directions((1234.5, -987.25), &extent, 10.0).unwrap();
        let total: usize = Sector::ALL.iter().map(|s| sectors.count_eq(s.code())).sum();
        assert_eq!(total, sectors.len());
        // Symmetric window: every sector is populated
        for s in Sector::ALL {
            assert!(sectors.count_eq(s.code()) > 0, "{} is empty", s);
        }
    }

    #[test]
    fn test_observer_off_grid_still_classifies() {
        let extent = Extent::new(0.0, 0.0, 100.0, 100.0);
        let sectors = classify_directions((-500.0, 50.0), &extent, 10.0).unwrap();
        // Everything lies east of an observer far to the west
        assert!(sectors.data().iter().all(|&c| c == Sector::East.code()));
    }

    #[test]
    fn test_non_finite_observer() {
        let extent = Extent::new(0.0, 0.0, 100.0, 100.0);
        assert!(matches!(
            classify_directions((f64::NAN, 0.0), &extent, 10.0),
            Err(Error::NumericFault(_))
        ));
    }
}
