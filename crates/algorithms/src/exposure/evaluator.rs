//! Per-point directional exposure evaluation
//!
//! Runs the full analysis for one property point:
//!
//! 1. Build the analysis window around the target
//! 2. Burn nearby points into an obstruction surface and the land/ocean
//!    layer into a binary ocean mask, while classifying the window into
//!    compass sectors on another thread
//! 3. Compute the viewshed of the obstruction surface from the target
//! 4. Count visible ocean cells per sector
//!
//! Every grid shares the window's extent and cell size. Errors never escape
//! [`ExposureEvaluator::evaluate`]: they are logged and turned into an
//! unavailable result tagged with the stage that was reached.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, warn};
use crate::classification::{classify_directions, reclassify, ReclassRule, ReclassifyParams, Unmatched};
use crate::conversion::{rasterize, resample_to_extent};
use crate::exposure::result::{DirectionalExposure, ExposureResult, Stage, StageError};
use crate::maybe_rayon::join;
use crate::statistics::{aggregate, SectorTable};
use crate::visibility::{viewshed, ViewshedParams};
use coastview_core::raster::{Extent, Raster};
use coastview_core::{Error, FeatureCollection, PropertyPoint, Result};

/// Attribute carrying obstruction heights on burned point features
pub const HEIGHT_ATTRIBUTE: &str = "height";

/// Parameters for exposure evaluation
#[derive(Debug, Clone)]
pub struct EvaluatorParams {
    /// Grid cell size in map units (default 10)
    pub cell_size: f64,
    /// Half-width of the analysis window and radius of the ocean clip (default 1000)
    pub analysis_radius: f64,
    /// Height burned for every nearby point (default 10)
    pub obstruction_height: f64,
    /// Land/ocean value that marks ocean (default 200)
    pub ocean_code: f64,
    /// Feature attribute holding the land/ocean code
    pub ocean_attribute: String,
    /// Eye height above the surface at the target (default 0)
    pub observer_height: f64,
    /// Height added at every viewshed target (default 0)
    pub target_height: f64,
    /// Viewshed sample spacing in cells (default 0.5)
    pub sample_spacing: f64,
}

impl Default for EvaluatorParams {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            analysis_radius: 1000.0,
            obstruction_height: 10.0,
            ocean_code: 200.0,
            ocean_attribute: "code".into(),
            observer_height: 0.0,
            target_height: 0.0,
            sample_spacing: 0.5,
        }
    }
}

/// Land/ocean classification covering the analysis window
#[derive(Debug, Clone)]
pub enum OceanLayer {
    /// Polygons or points carrying the code under `ocean_attribute`
    Features(FeatureCollection),
    /// Grid of codes, resampled onto the window
    Raster(Raster<f64>),
}

/// Everything needed to evaluate one point
#[derive(Debug, Clone)]
pub struct PointContext<'a> {
    pub target: PropertyPoint,
    /// Points within the analysis radius, excluding the target
    pub nearby: Vec<PropertyPoint>,
    pub ocean: &'a OceanLayer,
}

/// Intermediate grids of one evaluation
#[derive(Debug, Clone)]
pub struct ExposureLayers {
    pub obstruction: Raster<f64>,
    pub ocean: Raster<u8>,
    pub visibility: Raster<u8>,
    pub sectors: Raster<u8>,
    pub table: SectorTable,
}

enum Halt {
    Cancelled(Stage),
    Failed(StageError),
}

/// Evaluates the directional coastal exposure of property points
#[derive(Debug, Clone, Default)]
pub struct ExposureEvaluator {
    params: EvaluatorParams,
}

impl ExposureEvaluator {
    pub fn new(params: EvaluatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EvaluatorParams {
        &self.params
    }

    /// Evaluate a point. Failures become [`ExposureOutcome::Unavailable`](super::ExposureOutcome::Unavailable).
    pub fn evaluate(&self, ctx: &PointContext<'_>) -> ExposureResult {
        match self.run_pipeline(ctx) {
            Ok(layers) => ExposureResult::computed(ctx.target.id, DirectionalExposure::from_table(layers.table)),
            Err(e) => self.unavailable(ctx.target.id, e),
        }
    }

    /// Like [`evaluate`](Self::evaluate), but gives up between stages once
    /// `cancel` is set. Returns `None` if the point was abandoned.
    pub fn evaluate_cancellable(&self, ctx: &PointContext<'_>, cancel: &AtomicBool) -> Option<ExposureResult> {
        self.evaluate_with_layers(ctx, cancel).map(|(result, _)| result)
    }

    /// Cancellable evaluation that also hands back the intermediate grids
    /// when the pipeline completed.
    pub fn evaluate_with_layers(
        &self,
        ctx: &PointContext<'_>,
        cancel: &AtomicBool,
    ) -> Option<(ExposureResult, Option<ExposureLayers>)> {
        let id = ctx.target.id;
        match self.pipeline(ctx, cancel) {
            Ok(layers) => {
                let exposure = DirectionalExposure::from_table(layers.table);
                Some((ExposureResult::computed(id, exposure), Some(layers)))
            }
            Err(Halt::Failed(e)) => Some((self.unavailable(id, e), None)),
            Err(Halt::Cancelled(stage)) => {
                debug!(id, %stage, "evaluation cancelled");
                None
            }
        }
    }

    /// Run every stage and return the intermediate grids
    pub fn run_pipeline(&self, ctx: &PointContext<'_>) -> std::result::Result<ExposureLayers, StageError> {
        let never = AtomicBool::new(false);
        match self.pipeline(ctx, &never) {
            Ok(layers) => Ok(layers),
            Err(Halt::Failed(e)) => Err(e),
            Err(Halt::Cancelled(stage)) => Err(StageError {
                stage,
                source: Error::Algorithm("evaluation cancelled".into()),
            }),
        }
    }

    fn unavailable(&self, id: u64, e: StageError) -> ExposureResult {
        if e.source.is_recoverable() {
            warn!(id, stage = %e.stage, error = %e.source, "exposure unavailable");
        } else {
            error!(id, stage = %e.stage, error = %e.source, "exposure unavailable");
        }
        ExposureResult::unavailable(id, e.stage, e.source.to_string())
    }

    fn pipeline(&self, ctx: &PointContext<'_>, cancel: &AtomicBool) -> std::result::Result<ExposureLayers, Halt> {
        let id = ctx.target.id;
        let mut stage = Stage::Idle;

        let fail = |stage: Stage| move |source: Error| Halt::Failed(StageError { stage, source });
        let advance = |stage: &mut Stage, next: Stage| -> std::result::Result<(), Halt> {
            *stage = next;
            debug!(id, stage = %next, "stage complete");
            if cancel.load(Ordering::Relaxed) {
                return Err(Halt::Cancelled(next));
            }
            Ok(())
        };

        if cancel.load(Ordering::Relaxed) {
            return Err(Halt::Cancelled(stage));
        }

        let extent = self.window(&ctx.target).map_err(fail(stage))?;
        advance(&mut stage, Stage::ContextExtracted)?;

        let observer = (ctx.target.x, ctx.target.y);
        let cell_size = self.params.cell_size;
        let (sectors, surfaces) = join(
            || classify_directions(observer, &extent, cell_size),
            || self.build_surfaces(ctx, &extent),
        );
        let (obstruction, ocean) = surfaces.map_err(fail(stage))?;
        advance(&mut stage, Stage::SurfacesBuilt)?;

        let visibility = viewshed(
            &obstruction,
            ViewshedParams {
                observer_x: ctx.target.x,
                observer_y: ctx.target.y,
                observer_height: self.params.observer_height,
                target_height: self.params.target_height,
                sample_spacing: self.params.sample_spacing,
                max_distance: 0.0,
            },
        )
        .map_err(fail(stage))?;
        advance(&mut stage, Stage::ViewshedComputed)?;

        let sectors = sectors.map_err(fail(stage))?;
        advance(&mut stage, Stage::SectorsClassified)?;

        let table = aggregate(&sectors, &visibility, &ocean).map_err(fail(stage))?;
        advance(&mut stage, Stage::Aggregated)?;

        stage = Stage::Done;
        debug!(id, %stage, "evaluation finished");

        Ok(ExposureLayers {
            obstruction,
            ocean,
            visibility,
            sectors,
            table,
        })
    }

    /// Square analysis window centered on the target
    fn window(&self, target: &PropertyPoint) -> Result<Extent> {
        if !target.x.is_finite() || !target.y.is_finite() {
            return Err(Error::NumericFault(format!(
                "point {} has non-finite coordinate ({}, {})",
                target.id, target.x, target.y
            )));
        }
        let extent = Extent::around(target.x, target.y, self.params.analysis_radius);
        extent.grid_shape(self.params.cell_size)?;
        Ok(extent)
    }

    fn build_surfaces(&self, ctx: &PointContext<'_>, extent: &Extent) -> Result<(Raster<f64>, Raster<u8>)> {
        let obstruction = self.obstruction_surface(&ctx.nearby, extent)?;
        let ocean = self.ocean_mask(ctx, extent)?;
        obstruction.ensure_same_shape(&ocean)?;
        Ok((obstruction, ocean))
    }

    /// Nearby points burned at the obstruction height over open ground
    fn obstruction_surface(&self, nearby: &[PropertyPoint], extent: &Extent) -> Result<Raster<f64>> {
        let features: FeatureCollection = nearby
            .iter()
            .map(|p| p.to_feature(HEIGHT_ATTRIBUTE, self.params.obstruction_height))
            .collect();
        let burned = rasterize(&features, HEIGHT_ATTRIBUTE, extent, self.params.cell_size)?;
        let ground = ReclassifyParams::new(vec![ReclassRule::nodata(0.0)], Unmatched::Keep);
        reclassify(&burned, &ground)
    }

    /// Binary ocean mask (1 = ocean) clipped to the analysis radius
    fn ocean_mask(&self, ctx: &PointContext<'_>, extent: &Extent) -> Result<Raster<u8>> {
        let cell_size = self.params.cell_size;
        let mut codes = match ctx.ocean {
            OceanLayer::Features(features) => {
                rasterize(features, &self.params.ocean_attribute, extent, cell_size)?
            }
            OceanLayer::Raster(raster) => resample_to_extent(raster, extent, cell_size)?,
        };
        clip_to_radius(&mut codes, &ctx.target, self.params.analysis_radius);

        let binary = ReclassifyParams::new(
            vec![
                ReclassRule::nodata(0.0),
                ReclassRule::value(self.params.ocean_code, 1.0),
            ],
            Unmatched::Value(0.0),
        );
        let mask = reclassify(&codes, &binary)?;

        let (rows, cols) = mask.shape();
        let mut ocean = mask.with_same_meta::<u8>(rows, cols);
        for (out, &v) in ocean.data_mut().iter_mut().zip(mask.data().iter()) {
            *out = u8::from(v == 1.0);
        }
        Ok(ocean)
    }
}

/// Mark cells whose center lies beyond `radius` of the target as no-data
fn clip_to_radius(codes: &mut Raster<f64>, target: &PropertyPoint, radius: f64) {
    let transform = *codes.transform();
    let r2 = radius * radius;
    for ((row, col), value) in codes.data_mut().indexed_iter_mut() {
        let (x, y) = transform.pixel_to_geo(col, row);
        if target.dist_sq(x, y) > r2 {
            *value = f64::NAN;
        }
    }
    codes.set_nodata(Some(f64::NAN));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::Sector;
    use crate::exposure::ExposureOutcome;
    use coastview_core::Feature;
    use geo::{LineString, Polygon};

    fn params() -> EvaluatorParams {
        EvaluatorParams {
            cell_size: 10.0,
            analysis_radius: 200.0,
            ..Default::default()
        }
    }

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64, code: f64) -> Feature {
        let ring = LineString::from(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]);
        Feature::new(Polygon::new(ring, vec![])).with_property("code", code)
    }

    #[test]
    fn test_ocean_to_the_south_only() {
        // Target on the shared corner of the four middle cells; ocean covers everything 100+ units south
        let target = PropertyPoint::new(1, 5.0, 5.0);
        let ocean = OceanLayer::Features(
            [square(-300.0, -300.0, 300.0, -100.0, 200.0)].into_iter().collect(),
        );
        let ctx = PointContext { target, nearby: vec![], ocean: &ocean };

        let result = ExposureEvaluator::new(params()).evaluate(&ctx);
        let exposure = result.exposure().unwrap();
        assert!(exposure.exposed_at_all_overall);
        assert!(exposure.sector(Sector::South).exposed_at_all);
        assert!(!exposure.sector(Sector::North).exposed_at_all);
        assert!(!exposure.sector(Sector::East).exposed_at_all);
        assert!(!exposure.sector(Sector::West).exposed_at_all);
    }

    #[test]
    fn test_land_codes_are_not_ocean() {
        let target = PropertyPoint::new(1, 5.0, 5.0);
        let ocean = OceanLayer::Features(
            [square(-300.0, -300.0, 300.0, 300.0, 100.0)].into_iter().collect(),
        );
        let ctx = PointContext { target, nearby: vec![], ocean: &ocean };
        let result = ExposureEvaluator::new(params()).evaluate(&ctx);
        assert!(!result.exposure().unwrap().exposed_at_all_overall);
    }

    #[test]
    fn test_ocean_beyond_radius_is_clipped() {
        let target = PropertyPoint::new(1, 5.0, 5.0);
        // Only the window corners, > 200 from the target, are ocean
        let ocean = OceanLayer::Features(
            [square(160.0, 160.0, 300.0, 300.0, 200.0)].into_iter().collect(),
        );
        let ctx = PointContext { target, nearby: vec![], ocean: &ocean };
        let result = ExposureEvaluator::new(params()).evaluate(&ctx);
        assert!(!result.exposure().unwrap().exposed_at_all_overall);
    }

    #[test]
    fn test_layers_share_grid() {
        let target = PropertyPoint::new(1, 5.0, 5.0);
        let ocean = OceanLayer::Raster(Raster::filled(3, 3, 200.0));
        let ctx = PointContext {
            target,
            nearby: vec![PropertyPoint::new(2, 55.0, 5.0)],
            ocean: &ocean,
        };
        let layers = ExposureEvaluator::new(params()).run_pipeline(&ctx).unwrap();
        assert_eq!(layers.obstruction.shape(), (40, 40));
        assert_eq!(layers.sectors.shape(), layers.visibility.shape());
        assert_eq!(layers.obstruction.transform(), layers.ocean.transform());
        assert_eq!(layers.obstruction.count_eq(10.0), 1);
    }

    #[test]
    fn test_failure_is_unavailable() {
        let target = PropertyPoint::new(9, f64::NAN, 5.0);
        let ocean = OceanLayer::Features(FeatureCollection::new());
        let ctx = PointContext { target, nearby: vec![], ocean: &ocean };
        let result = ExposureEvaluator::new(params()).evaluate(&ctx);
        assert_eq!(result.id, 9);
        assert!(matches!(
            result.outcome,
            ExposureOutcome::Unavailable { stage: Stage::Idle, .. }
        ));
    }

    #[test]
    fn test_bad_geometry_fails_while_building_surfaces() {
        let target = PropertyPoint::new(4, 5.0, 5.0);
        let ocean = OceanLayer::Features([Feature::empty()].into_iter().collect());
        let ctx = PointContext { target, nearby: vec![], ocean: &ocean };
        let result = ExposureEvaluator::new(params()).evaluate(&ctx);
        assert!(matches!(
            result.outcome,
            ExposureOutcome::Unavailable { stage: Stage::ContextExtracted, .. }
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let target = PropertyPoint::new(1, 5.0, 5.0);
        let ocean = OceanLayer::Features(FeatureCollection::new());
        let ctx = PointContext { target, nearby: vec![], ocean: &ocean };
        let cancel = AtomicBool::new(true);
        assert!(ExposureEvaluator::new(params())
            .evaluate_cancellable(&ctx, &cancel)
            .is_none());
    }
}
