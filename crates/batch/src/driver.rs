//! Batch driver
//!
//! Evaluates every pending point of a session. Points are processed in
//! identifier order, in chunks: the evaluations of a chunk run in parallel,
//! then their rows are written and checkpointed one at a time in order, so
//! the output file and the checkpoint log always agree.

use std::io::Write;
use std::time::Instant;
use tracing::{debug, info, warn};
use coastview_algorithms::exposure::{ExposureEvaluator, ExposureResult, OceanLayer};
use coastview_core::PropertyPoint;
use crate::checkpoint::Checkpoint;
use crate::config::BatchConfig;
use crate::context;
use crate::dump::dump_layers;
use crate::error::Result;
use crate::index::PointIndex;
use crate::session::{Session, SessionSummary};
use crate::sink::ResultSink;
use crate::strategy::{Executor, ProcessingMode};

/// Points evaluated per thread between serial write phases
const CHUNK_PER_THREAD: usize = 4;

/// Runs exposure evaluation over a point dataset
pub struct BatchDriver {
    config: BatchConfig,
    evaluator: ExposureEvaluator,
    index: PointIndex,
    executor: Executor,
}

impl BatchDriver {
    /// Validate `config` and index `points`.
    pub fn new(config: BatchConfig, points: Vec<PropertyPoint>) -> Result<Self> {
        config.validate()?;
        let executor = Executor::new(ProcessingMode::from_threads(config.threads))?;
        let evaluator = ExposureEvaluator::new(config.evaluator_params());
        let index = PointIndex::build(points);
        Ok(Self {
            config,
            evaluator,
            index,
            executor,
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn index(&self) -> &PointIndex {
        &self.index
    }

    /// Points in range that are not checkpointed, ordered by identifier and
    /// capped at `max_rows`, plus the number skipped as already done.
    pub fn pending(&self, checkpoint: &Checkpoint) -> (Vec<PropertyPoint>, usize) {
        let mut skipped = 0;
        let mut targets: Vec<PropertyPoint> = self
            .index
            .points()
            .iter()
            .filter(|p| self.config.in_range(p.id))
            .filter(|p| {
                let done = checkpoint.contains(p.id);
                if done {
                    skipped += 1;
                }
                !done
            })
            .copied()
            .collect();
        targets.sort_unstable_by_key(|p| p.id);
        if let Some(max_rows) = self.config.max_rows {
            targets.truncate(max_rows);
        }
        (targets, skipped)
    }

    /// Evaluate all pending points, appending one row per point to `sink`.
    ///
    /// `on_point` is called after each row is durably written. The session
    /// stops early, between points, once its cancel flag is set.
    pub fn run<W: Write>(
        &self,
        ocean: &OceanLayer,
        session: &mut Session,
        sink: &mut ResultSink<W>,
        mut on_point: impl FnMut(&ExposureResult),
    ) -> Result<SessionSummary> {
        let (targets, skipped) = self.pending(session.checkpoint());
        session.record_skipped(skipped);
        info!(
            pending = targets.len(),
            skipped,
            threads = self.executor.mode().threads(),
            "starting session"
        );

        let cancel = session.cancel_handle();
        let radius = self.config.analysis_radius;
        let dumping = self.config.dump_dir.is_some();
        let chunk_size = self.executor.mode().threads().max(1) * CHUNK_PER_THREAD;

        for chunk in targets.chunks(chunk_size) {
            if session.is_cancelled() {
                break;
            }

            let outcomes = self.executor.map(chunk, |point| {
                let started = Instant::now();
                let ctx = context::extract(&self.index, point, radius, ocean);
                let evaluated = self
                    .evaluator
                    .evaluate_with_layers(&ctx, &cancel)
                    .map(|(result, layers)| (result, layers.filter(|_| dumping)));
                (evaluated, started.elapsed())
            });

            for (point, (evaluated, elapsed)) in chunk.iter().zip(outcomes) {
                let Some((result, layers)) = evaluated else {
                    continue;
                };

                if let (Some(dir), Some(layers)) = (&self.config.dump_dir, &layers) {
                    if let Err(e) = dump_layers(dir, point.id, layers) {
                        warn!(id = point.id, error = %e, "failed to dump intermediate grids");
                    }
                }

                sink.write(point, &result)?;
                session.checkpoint_mut().record(point.id)?;
                session.record(&result, elapsed);
                debug!(id = point.id, ?elapsed, available = result.is_available(), "point done");
                on_point(&result);
            }
        }

        let summary = session.summary();
        if summary.cancelled {
            info!(processed = summary.processed, "session cancelled");
        } else if summary.is_finished() {
            info!("no unprocessed points left in range");
        } else {
            info!(
                processed = summary.processed,
                exposed = summary.exposed,
                unavailable = summary.unavailable,
                "session complete"
            );
        }
        Ok(summary)
    }
}
