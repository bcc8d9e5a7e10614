//! Single-flight coalescing of concurrent cache misses
//!
//! Concurrent callers asking for the same key share one computation: the
//! first caller runs it, the rest await the same cell and get a clone of the
//! value. A failed computation leaves the cell empty, so each waiter then
//! runs the computation itself and sees its own error.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

type Cells<T> = HashMap<String, Arc<OnceCell<T>>>;

pub struct FlightGroup<T> {
    inflight: Mutex<Cells<T>>,
}

impl<T> Default for FlightGroup<T> {
    fn default() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> FlightGroup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn cells(&self) -> MutexGuard<'_, Cells<T>> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `compute` for `key` unless a run for the same key is in flight,
    /// in which case wait for that one.
    pub async fn run<F, Fut, E>(&self, key: &str, compute: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self
            .cells()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let result = cell.get_or_try_init(compute).await.cloned();

        let mut cells = self.cells();
        if let Some(current) = cells.get(key)
            && Arc::ptr_eq(current, &cell)
        {
            cells.remove(key);
        }

        result
    }

    /// Number of keys with a computation in flight
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.cells().len()
    }
}
