//! Executor trait for running independent units of work.
//!
//! Report requests share no mutable state, so a batch can be spread over any
//! execution strategy. The trait keeps that choice out of the engine.

/// Runs a closure over every item of a batch, preserving input order in the
/// returned results.
pub trait Executor: Send + Sync {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static;

    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static,
    {
        self.execute_all(items, f)
    }

    /// The number of items that may run at the same time.
    fn parallelism(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Runs every item on the calling thread, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncExecutor;

impl SyncExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for SyncExecutor {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static,
    {
        items.into_iter().map(f).collect()
    }

    fn parallelism(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str {
        "SyncExecutor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_executor_preserves_order() {
        let exec = SyncExecutor::new();
        assert_eq!(exec.execute_all(vec![1, 2, 3], |x| x * 10), vec![10, 20, 30]);
        assert_eq!(exec.parallelism(), 1);
    }

    #[test]
    fn fallible_results_are_kept_per_item() {
        let exec = SyncExecutor::new();
        let results = exec.execute_all_fallible(vec![1, 0, 2], |x: i32| {
            if x == 0 { Err("zero") } else { Ok(10 / x) }
        });
        assert_eq!(results, vec![Ok(10), Err("zero"), Ok(5)]);
    }
}
