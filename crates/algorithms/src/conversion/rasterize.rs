//! Feature rasterization
//!
//! Burns point and polygon features into a regular grid. A point burns the
//! cell that contains it; a polygon burns every cell whose center intersects
//! it (cells whose center lies on the boundary are covered). Cells that no
//! feature covers are no-data (NaN).
//!
//! Where features overlap, the maximum attribute value wins. The result is
//! therefore independent of feature order.

use geo::{BoundingRect, Coord, Geometry, Intersects, MultiPoint, MultiPolygon, Point, Polygon};
use coastview_core::raster::{Extent, GeoTransform, Raster};
use coastview_core::vector::{Feature, FeatureCollection};
use coastview_core::{Algorithm, Error, Result};

/// Parameters for rasterization
#[derive(Debug, Clone)]
pub struct RasterizeParams {
    /// Attribute whose numeric value becomes the cell value
    pub attribute: String,
    /// Extent of the output grid
    pub extent: Extent,
    /// Cell size in map units (default 10)
    pub cell_size: f64,
}

impl Default for RasterizeParams {
    fn default() -> Self {
        Self {
            attribute: "value".to_string(),
            extent: Extent::new(0.0, 0.0, 0.0, 0.0),
            cell_size: 10.0,
        }
    }
}

/// Rasterization algorithm
#[derive(Debug, Clone, Default)]
pub struct Rasterize;

impl Algorithm for Rasterize {
    type Input = FeatureCollection;
    type Output = Raster<f64>;
    type Params = RasterizeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Rasterize"
    }

    fn description(&self) -> &'static str {
        "Burn point and polygon feature attributes into a regular grid"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        rasterize(&input, &params.attribute, &params.extent, params.cell_size)
    }
}

/// Burn `features` into a grid covering `extent` at `cell_size`.
///
/// An empty feature collection yields an all-no-data grid.
///
/// # Errors
/// - [`Error::EmptyExtent`] if the extent has no area or the cell size is not positive
/// - [`Error::InputGeometry`] for a feature without geometry, with an unsupported
///   geometry type, with non-finite coordinates, or without a numeric `attribute`
pub fn rasterize(
    features: &FeatureCollection,
    attribute: &str,
    extent: &Extent,
    cell_size: f64,
) -> Result<Raster<f64>> {
    let mut raster = Raster::for_extent(extent, cell_size, f64::NAN)?;
    raster.set_nodata(Some(f64::NAN));

    for (index, feature) in features.iter().enumerate() {
        let value = burn_value(feature, index, attribute)?;
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| malformed(feature, index, "has no geometry"))?;

        match geometry {
            Geometry::Point(p) => burn_point(&mut raster, feature, index, *p, value)?,
            Geometry::MultiPoint(MultiPoint(points)) => {
                for p in points {
                    burn_point(&mut raster, feature, index, *p, value)?;
                }
            }
            Geometry::Polygon(poly) => burn_polygon(&mut raster, feature, index, poly, value)?,
            Geometry::MultiPolygon(MultiPolygon(polys)) => {
                for poly in polys {
                    burn_polygon(&mut raster, feature, index, poly, value)?;
                }
            }
            _ => return Err(malformed(feature, index, "is neither a point nor a polygon")),
        }
    }

    Ok(raster)
}

fn malformed(feature: &Feature, index: usize, what: &str) -> Error {
    let label = feature
        .id
        .clone()
        .unwrap_or_else(|| format!("#{}", index));
    Error::InputGeometry(format!("feature {} {}", label, what))
}

fn burn_value(feature: &Feature, index: usize, attribute: &str) -> Result<f64> {
    match feature.get_property(attribute).and_then(|v| v.as_f64()) {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(malformed(feature, index, &format!("has non-finite '{}'", attribute))),
        None => Err(malformed(feature, index, &format!("has no numeric '{}'", attribute))),
    }
}

#[inline]
fn burn_cell(raster: &mut Raster<f64>, row: usize, col: usize, value: f64) {
    let cell = &mut raster.data_mut()[(row, col)];
    if cell.is_nan() || value > *cell {
        *cell = value;
    }
}

fn burn_point(
    raster: &mut Raster<f64>,
    feature: &Feature,
    index: usize,
    point: Point<f64>,
    value: f64,
) -> Result<()> {
    if !point.x().is_finite() || !point.y().is_finite() {
        return Err(malformed(feature, index, "has non-finite coordinates"));
    }
    if let Some((row, col)) = raster.cell_of(point.x(), point.y()) {
        burn_cell(raster, row, col, value);
    }
    Ok(())
}

fn burn_polygon(
    raster: &mut Raster<f64>,
    feature: &Feature,
    index: usize,
    polygon: &Polygon<f64>,
    value: f64,
) -> Result<()> {
    let rect = polygon
        .bounding_rect()
        .ok_or_else(|| malformed(feature, index, "has an empty polygon"))?;
    let (min, max) = (rect.min(), rect.max());
    if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
        return Err(malformed(feature, index, "has non-finite coordinates"));
    }

    let (rows, cols) = raster.shape();
    let transform: GeoTransform = *raster.transform();
    let Some((c0, c1)) = cell_span(&transform, min.x, max.x, cols, true) else {
        return Ok(());
    };
    let Some((r0, r1)) = cell_span(&transform, max.y, min.y, rows, false) else {
        return Ok(());
    };

    for row in r0..=r1 {
        for col in c0..=c1 {
            let (x, y) = transform.pixel_to_geo(col, row);
            if polygon.intersects(&Coord { x, y }) {
                burn_cell(raster, row, col, value);
            }
        }
    }
    Ok(())
}

/// Inclusive range of cell indices whose centers may fall in `[lo, hi]`
/// along one axis, clamped to the grid.
fn cell_span(gt: &GeoTransform, lo: f64, hi: f64, n: usize, along_x: bool) -> Option<(usize, usize)> {
    let (a, b) = if along_x {
        (gt.geo_to_pixel(lo, 0.0).0, gt.geo_to_pixel(hi, 0.0).0)
    } else {
        (gt.geo_to_pixel(0.0, lo).1, gt.geo_to_pixel(0.0, hi).1)
    };
    // Cell i has its center at i + 0.5
    let first = (a.min(b) - 0.5).ceil().max(0.0);
    let last = (a.max(b) - 0.5).floor();
    if last < 0.0 || first >= n as f64 || first > last {
        return None;
    }
    Some((first as usize, (last as usize).min(n - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coastview_core::vector::Feature;
    use geo::{polygon, LineString};

    fn window() -> Extent {
        Extent::new(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn test_points_burn_their_cell() {
        let features: FeatureCollection = vec![
            Feature::new(Point::new(15.0, 95.0)).with_property("h", 10.0),
            Feature::new(Point::new(55.0, 5.0)).with_property("h", 11.0),
        ]
        .into_iter()
        .collect();

        let grid = rasterize(&features, "h", &window(), 10.0).unwrap();
        assert_eq!(grid.shape(), (10, 10));
        assert_eq!(grid.get(0, 1).unwrap(), 10.0);
        assert_eq!(grid.get(9, 5).unwrap(), 11.0);
        assert!(grid.get(5, 5).unwrap().is_nan());
    }

    #[test]
    fn test_overlap_keeps_maximum_regardless_of_order() {
        let low = Feature::new(Point::new(42.0, 42.0)).with_property("h", 3.0);
        let high = Feature::new(Point::new(48.0, 48.0)).with_property("h", 7.0);

        let a: FeatureCollection = vec![low.clone(), high.clone()].into_iter().collect();
        let b: FeatureCollection = vec![high, low].into_iter().collect();

        let ga = rasterize(&a, "h", &window(), 10.0).unwrap();
        let gb = rasterize(&b, "h", &window(), 10.0).unwrap();
        assert_eq!(ga.get(5, 4).unwrap(), 7.0);
        assert_eq!(gb.get(5, 4).unwrap(), 7.0);
    }

    #[test]
    fn test_polygon_burns_cells_by_center() {
        // Covers x in [0, 30], y in [0, 20]: centers 5,15,25 x 5,15
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 30.0, y: 0.0),
            (x: 30.0, y: 20.0),
            (x: 0.0, y: 20.0),
        ];
        let features: FeatureCollection = vec![Feature::new(poly).with_property("code", 200_i64)]
            .into_iter()
            .collect();

        let grid = rasterize(&features, "code", &window(), 10.0).unwrap();
        let burned = grid.data().iter().filter(|v| **v == 200.0).count();
        assert_eq!(burned, 6);
        assert_eq!(grid.get(9, 0).unwrap(), 200.0);
        assert_eq!(grid.get(8, 2).unwrap(), 200.0);
        assert!(grid.get(7, 0).unwrap().is_nan());
        assert!(grid.get(9, 3).unwrap().is_nan());
    }

    #[test]
    fn test_polygon_partly_outside_is_clipped() {
        let poly = polygon![
            (x: -500.0, y: -500.0),
            (x: 14.0, y: -500.0),
            (x: 14.0, y: 500.0),
            (x: -500.0, y: 500.0),
        ];
        let features: FeatureCollection = vec![Feature::new(poly).with_property("code", 1.0)]
            .into_iter()
            .collect();

        let grid = rasterize(&features, "code", &window(), 10.0).unwrap();
        for row in 0..10 {
            assert_eq!(grid.get(row, 0).unwrap(), 1.0);
            assert!(grid.get(row, 1).unwrap().is_nan());
        }
    }

    #[test]
    fn test_empty_collection_is_all_nodata() {
        let grid = rasterize(&FeatureCollection::new(), "h", &window(), 10.0).unwrap();
        assert!(grid.data().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_empty_extent() {
        let extent = Extent::new(0.0, 0.0, 0.0, 0.0);
        let result = rasterize(&FeatureCollection::new(), "h", &extent, 10.0);
        assert!(matches!(result, Err(Error::EmptyExtent { .. })));
    }

    #[test]
    fn test_malformed_features() {
        let missing_geometry: FeatureCollection =
            vec![Feature::empty().with_property("h", 1.0)].into_iter().collect();
        assert!(matches!(
            rasterize(&missing_geometry, "h", &window(), 10.0),
            Err(Error::InputGeometry(_))
        ));

        let missing_attribute: FeatureCollection =
            vec![Feature::new(Point::new(5.0, 5.0))].into_iter().collect();
        assert!(matches!(
            rasterize(&missing_attribute, "h", &window(), 10.0),
            Err(Error::InputGeometry(_))
        ));

        let line: FeatureCollection = vec![Feature::new(LineString::from(vec![(0.0, 0.0), (9.0, 9.0)]))
            .with_property("h", 1.0)]
        .into_iter()
        .collect();
        assert!(matches!(
            rasterize(&line, "h", &window(), 10.0),
            Err(Error::InputGeometry(_))
        ));

        let nan_point: FeatureCollection = vec![Feature::new(Point::new(f64::NAN, 5.0))
            .with_property("h", 1.0)]
        .into_iter()
        .collect();
        assert!(matches!(
            rasterize(&nan_point, "h", &window(), 10.0),
            Err(Error::InputGeometry(_))
        ));
    }
}
