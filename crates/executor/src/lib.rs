//! Batch execution for report assembly.
//!
//! Each report request in a batch is assembled on its own: it reads the
//! shared configuration store but never writes to it. A batch can therefore
//! run one request after another on the calling thread ([`SyncExecutor`]) or
//! fan out over a rayon pool ([`RayonExecutor`], behind the `rayon` feature).
//! Either way the results come back in request order.
//!
//! ```ignore
//! use valuer_core::ReportAssembler;
//! use valuer_executor::ExecutorImpl;
//!
//! let assembler = ReportAssembler::builder()
//!     .with_store(store)
//!     .with_executor(ExecutorImpl::with_workers(4))
//!     .build();
//! let reports = assembler.assemble_all(requests);
//! ```

#[cfg(feature = "rayon")]
mod rayon_executor;

#[cfg(feature = "rayon")]
pub use rayon_executor::RayonExecutor;

pub use valuer_traits::{Executor, SyncExecutor};

/// The batch strategy a `ReportAssembler` is built with.
#[derive(Clone, Debug)]
pub enum ExecutorImpl {
    Sync(SyncExecutor),
    #[cfg(feature = "rayon")]
    Rayon(RayonExecutor),
}

// Forwards a call to whichever executor the variant holds.
macro_rules! dispatch {
    ($self:ident, $exec:ident => $call:expr) => {
        match $self {
            ExecutorImpl::Sync($exec) => $call,
            #[cfg(feature = "rayon")]
            ExecutorImpl::Rayon($exec) => $call,
        }
    };
}

impl ExecutorImpl {
    /// Picks a strategy for `workers` concurrent requests.
    ///
    /// Zero or one worker assembles on the calling thread; so does any count
    /// when the `rayon` feature is off.
    pub fn with_workers(workers: usize) -> Self {
        #[cfg(feature = "rayon")]
        {
            if workers > 1 {
                return ExecutorImpl::Rayon(RayonExecutor::with_threads(workers));
            }
        }
        log::trace!("Assembling batches sequentially ({workers} worker(s) requested)");
        ExecutorImpl::Sync(SyncExecutor::new())
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, ExecutorImpl::Sync(_))
    }
}

impl Executor for ExecutorImpl {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static,
    {
        dispatch!(self, exec => exec.execute_all(items, f))
    }

    fn parallelism(&self) -> usize {
        dispatch!(self, exec => exec.parallelism())
    }

    fn name(&self) -> &'static str {
        dispatch!(self, exec => exec.name())
    }
}

/// Rayon's global pool when the feature is on, otherwise sequential.
impl Default for ExecutorImpl {
    #[cfg(feature = "rayon")]
    fn default() -> Self {
        ExecutorImpl::Rayon(RayonExecutor::new())
    }

    #[cfg(not(feature = "rayon"))]
    fn default() -> Self {
        ExecutorImpl::Sync(SyncExecutor::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_worker_assembles_in_place() {
        for workers in [0, 1] {
            let exec = ExecutorImpl::with_workers(workers);
            assert!(exec.is_sequential());
            assert_eq!(exec.parallelism(), 1);
        }
    }

    #[test]
    fn sequential_batches_keep_request_order() {
        let exec = ExecutorImpl::Sync(SyncExecutor::new());
        let names = vec!["ann", "bob", "cy"];
        let out = exec.execute_all(names, |name| format!("report for {name}"));
        assert_eq!(out, ["report for ann", "report for bob", "report for cy"]);
        assert_eq!(exec.name(), "SyncExecutor");
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn several_workers_get_a_dedicated_pool() {
        let exec = ExecutorImpl::with_workers(3);
        assert!(!exec.is_sequential());
        assert_eq!(exec.parallelism(), 3);
        assert_eq!(ExecutorImpl::default().name(), "RayonExecutor");
    }
}
