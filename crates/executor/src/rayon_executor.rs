use rayon::prelude::*;
use std::sync::Arc;
use valuer_traits::Executor;

/// Spreads a batch over a rayon thread pool.
///
/// Uses the global pool unless a dedicated one is configured with
/// [`RayonExecutor::with_threads`].
#[derive(Clone, Debug, Default)]
pub struct RayonExecutor {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl RayonExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor with its own pool of `threads` workers. Falls back
    /// to the global pool if the dedicated pool cannot be built.
    pub fn with_threads(threads: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("valuer-worker-{i}"))
            .build()
            .ok()
            .map(Arc::new);
        Self { pool }
    }
}

impl Executor for RayonExecutor {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static,
    {
        match &self.pool {
            Some(pool) => pool.install(|| items.into_par_iter().map(f).collect()),
            None => items.into_par_iter().map(f).collect(),
        }
    }

    fn parallelism(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn name(&self) -> &'static str {
        "RayonExecutor"
    }
}
