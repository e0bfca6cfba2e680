//! Directional coastal exposure of property points

mod evaluator;
mod result;

pub use evaluator::{
    EvaluatorParams, ExposureEvaluator, ExposureLayers, OceanLayer, PointContext, HEIGHT_ATTRIBUTE,
};
pub use result::{DirectionalExposure, ExposureOutcome, ExposureResult, Stage, StageError};
