//! Parallel processing strategies

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::error::Result;

/// How per-point evaluations are spread over threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using all available cores
    #[default]
    Parallel,
    /// Parallel with specified number of threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Mode for a thread count setting: 0 = all cores, 1 = sequential
    pub fn from_threads(threads: usize) -> Self {
        match threads {
            0 => ProcessingMode::Parallel,
            1 => ProcessingMode::Sequential,
            n => ProcessingMode::ParallelWith(n),
        }
    }

    /// Number of threads this mode runs on
    pub fn threads(&self) -> usize {
        match self {
            ProcessingMode::Sequential => 1,
            ProcessingMode::Parallel => rayon::current_num_threads(),
            ProcessingMode::ParallelWith(n) => *n,
        }
    }
}

/// Runs work according to a [`ProcessingMode`], owning its bounded pool
pub struct Executor {
    mode: ProcessingMode,
    pool: Option<ThreadPool>,
}

impl Executor {
    pub fn new(mode: ProcessingMode) -> Result<Self> {
        let pool = match mode {
            ProcessingMode::ParallelWith(threads) => {
                Some(ThreadPoolBuilder::new().num_threads(threads).build()?)
            }
            _ => None,
        };
        Ok(Self { mode, pool })
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Map `f` over `items`, keeping input order in the output
    pub fn map<I, T, F>(&self, items: &[I], f: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        match (&self.mode, &self.pool) {
            (ProcessingMode::Sequential, _) => items.iter().map(f).collect(),
            (_, Some(pool)) => pool.install(|| items.par_iter().map(f).collect()),
            (_, None) => items.par_iter().map(f).collect(),
        }
    }
}
