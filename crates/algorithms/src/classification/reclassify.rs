//! Raster reclassification
//!
//! Maps raw cell values onto a small discrete domain with an ordered rule
//! table. Exact-value rules handle code remaps (land/ocean codes, obstruction
//! heights); range rules handle continuous values such as bearings.

use ndarray::Array2;
use crate::maybe_rayon::*;
use coastview_core::raster::Raster;
use coastview_core::{Algorithm, Error, Result};

/// One entry of a reclassification table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReclassRule {
    /// Cells exactly equal to `from` become `to`
    Value { from: f64, to: f64 },
    /// Cells with `min <= value < max` become `to`
    Range { min: f64, max: f64, to: f64 },
    /// No-data cells become `to`
    NoData { to: f64 },
}

impl ReclassRule {
    pub fn value(from: f64, to: f64) -> Self {
        ReclassRule::Value { from, to }
    }

    pub fn range(min: f64, max: f64, to: f64) -> Self {
        ReclassRule::Range { min, max, to }
    }

    pub fn nodata(to: f64) -> Self {
        ReclassRule::NoData { to }
    }

    #[inline]
    fn apply(&self, value: f64, is_nodata: bool) -> Option<f64> {
        match *self {
            ReclassRule::NoData { to } if is_nodata => Some(to),
            ReclassRule::Value { from, to } if !is_nodata && value == from => Some(to),
            ReclassRule::Range { min, max, to } if !is_nodata && value >= min && value < max => {
                Some(to)
            }
            _ => None,
        }
    }
}

/// What happens to cells no rule matches
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Unmatched {
    /// Output no-data (NaN)
    #[default]
    NoData,
    /// Keep the source value
    Keep,
    /// Output a fixed value
    Value(f64),
}

/// Parameters for reclassification
#[derive(Debug, Clone, Default)]
pub struct ReclassifyParams {
    /// Ordered rule table; the first matching rule wins
    pub rules: Vec<ReclassRule>,
    /// Treatment of cells that match no rule
    pub unmatched: Unmatched,
}

impl ReclassifyParams {
    pub fn new(rules: Vec<ReclassRule>, unmatched: Unmatched) -> Self {
        Self { rules, unmatched }
    }

    fn validate(&self) -> Result<()> {
        for rule in &self.rules {
            if let ReclassRule::Range { min, max, .. } = *rule {
                if min.is_nan() || max.is_nan() || min >= max {
                    return Err(Error::InvalidParameter {
                        name: "rules",
                        value: format!("[{}, {})", min, max),
                        reason: "range must satisfy min < max".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Reclassify a single value
    pub fn classify(&self, value: f64, is_nodata: bool) -> f64 {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(value, is_nodata))
            .unwrap_or(match self.unmatched {
                Unmatched::NoData => f64::NAN,
                Unmatched::Keep if is_nodata => f64::NAN,
                Unmatched::Keep => value,
                Unmatched::Value(v) => v,
            })
    }
}

/// Reclassification algorithm
#[derive(Debug, Clone, Default)]
pub struct Reclassify;

impl Algorithm for Reclassify {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ReclassifyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Reclassify"
    }

    fn description(&self) -> &'static str {
        "Map cell values to new classes using exact-value and range rules"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        reclassify(&input, &params)
    }
}

/// Reclassify raster values with an ordered rule table.
///
/// # Example
/// ```ignore
/// // Collapse land/ocean codes into a binary ocean mask
/// let params = ReclassifyParams::new(
///     vec![ReclassRule::nodata(0.0), ReclassRule::value(200.0, 1.0)],
///     Unmatched::Value(0.0),
/// );
/// let ocean = reclassify(&codes, &params)?;
/// ```
pub fn reclassify(raster: &Raster<f64>, params: &ReclassifyParams) -> Result<Raster<f64>> {
    params.validate()?;
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let val = unsafe { raster.get_unchecked(row, col) };
                *out = params.classify(val, raster.is_nodata(val));
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}
