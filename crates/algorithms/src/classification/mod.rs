//! Cell classification
//!
//! - **reclassify**: ordered exact-value and range remapping
//! - **direction**: compass sector of every cell relative to an observer

pub mod direction;
pub mod reclassify;

pub use direction::{back_bearing, back_bearing_surface, classify_directions, direction_rules, Sector};
pub use reclassify::{reclassify, ReclassRule, Reclassify, ReclassifyParams, Unmatched};
