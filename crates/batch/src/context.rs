//! Per-point context extraction

use coastview_algorithms::exposure::{OceanLayer, PointContext};
use coastview_core::PropertyPoint;
use crate::index::PointIndex;

/// Gather what the evaluator needs for `target`.
///
/// Neighbors are the points within `radius` of the target, excluding the
/// target itself and any point at exactly the same location, sorted by
/// identifier.
pub fn extract<'a>(
    index: &PointIndex,
    target: &PropertyPoint,
    radius: f64,
    ocean: &'a OceanLayer,
) -> PointContext<'a> {
    let mut nearby: Vec<PropertyPoint> = index
        .within_radius(target.x, target.y, radius)
        .into_iter()
        .filter(|p| p.id != target.id && (p.x, p.y) != (target.x, target.y))
        .copied()
        .collect();
    nearby.sort_unstable_by_key(|p| p.id);

    PointContext {
        target: *target,
        nearby,
        ocean,
    }
}
