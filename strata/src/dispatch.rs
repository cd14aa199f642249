//! Fork/join task dispatch for the folding passes.
//!
//! Folding a frame produces up to three independent jobs per thread row.
//! A [`TaskDispatch`] runs a batch of such jobs and returns only once every
//! one of them has finished, which is the only ordering the rows rely on.
//! Jobs borrow the trace and their row's buffers, so they are scoped rather
//! than `'static`.

use log::{debug, info};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// A unit of folding work.
pub type Job<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Runs batches of jobs to completion.
pub trait TaskDispatch {
    /// Run every job in `jobs`; returns after all of them have completed.
    fn run(&self, jobs: Vec<Job<'_>>);

    /// Worker threads available to a batch.
    fn workers(&self) -> usize;
}

/// Runs jobs one after another on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatch;

impl TaskDispatch for InlineDispatch {
    fn run(&self, jobs: Vec<Job<'_>>) {
        for job in jobs {
            job();
        }
    }

    fn workers(&self) -> usize {
        1
    }
}

/// Runs jobs on a dedicated rayon pool.
pub struct PoolDispatch {
    pool: ThreadPool,
}

impl PoolDispatch {
    /// Build a pool with `threads` workers; `0` picks one per logical CPU.
    ///
    /// # Errors
    /// Returns an error if the worker threads cannot be spawned.
    pub fn new(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("strata-fold-{i}"))
            .build()?;
        info!("Fold pool started with {} workers", pool.current_num_threads());
        Ok(Self { pool })
    }
}

impl std::fmt::Debug for PoolDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolDispatch").field("workers", &self.workers()).finish()
    }
}

impl TaskDispatch for PoolDispatch {
    fn run(&self, jobs: Vec<Job<'_>>) {
        debug!("Dispatching {} fold jobs", jobs.len());
        self.pool.scope(|scope| {
            for job in jobs {
                scope.spawn(move |_| job());
            }
        });
    }

    fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}
