//! Statistics over analysis grids
//!
//! - **zonal**: Visible-ocean counts and exposure per compass sector

pub mod zonal;

pub use zonal::{aggregate, SectorStatistics, SectorTable};
