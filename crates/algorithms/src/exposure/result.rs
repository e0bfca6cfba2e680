//! Per-point exposure results

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::classification::Sector;
use crate::statistics::{SectorStatistics, SectorTable};
use coastview_core::Error;

/// Progress of one point evaluation.
///
/// A failed evaluation keeps the last stage it reached, reported through
/// [`ExposureOutcome::Unavailable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Idle,
    ContextExtracted,
    SurfacesBuilt,
    ViewshedComputed,
    SectorsClassified,
    Aggregated,
    Done,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::ContextExtracted => "context-extracted",
            Stage::SurfacesBuilt => "surfaces-built",
            Stage::ViewshedComputed => "viewshed-computed",
            Stage::SectorsClassified => "sectors-classified",
            Stage::Aggregated => "aggregated",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An analysis error tagged with the stage the evaluation had reached
#[derive(Debug, thiserror::Error)]
#[error("failed after stage {stage}: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

/// Exposure of a point in all 8 compass sectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalExposure {
    /// Indexed by [`Sector::index`]
    pub sectors: SectorTable,
    /// Exposed in at least one sector
    pub exposed_at_all_overall: bool,
}

impl DirectionalExposure {
    pub fn from_table(sectors: SectorTable) -> Self {
        Self {
            exposed_at_all_overall: sectors.iter().any(|s| s.exposed_at_all),
            sectors,
        }
    }

    pub fn sector(&self, sector: Sector) -> &SectorStatistics {
        &self.sectors[sector.index()]
    }

    /// Sectors in output order paired with their statistics
    pub fn iter(&self) -> impl Iterator<Item = (Sector, &SectorStatistics)> {
        Sector::ALL.iter().copied().zip(self.sectors.iter())
    }
}

/// Either the computed exposure or the reason it is unavailable.
///
/// An unavailable result is never reported as zero exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExposureOutcome {
    Computed(DirectionalExposure),
    Unavailable { stage: Stage, reason: String },
}

/// Result of evaluating one property point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureResult {
    pub id: u64,
    pub outcome: ExposureOutcome,
}

impl ExposureResult {
    pub fn computed(id: u64, exposure: DirectionalExposure) -> Self {
        Self {
            id,
            outcome: ExposureOutcome::Computed(exposure),
        }
    }

    pub fn unavailable(id: u64, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            id,
            outcome: ExposureOutcome::Unavailable {
                stage,
                reason: reason.into(),
            },
        }
    }

    pub fn exposure(&self) -> Option<&DirectionalExposure> {
        match &self.outcome {
            ExposureOutcome::Computed(e) => Some(e),
            ExposureOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.exposure().is_some()
    }
}
