use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Shared cancellation flag handed to every asynchronous operation of a
/// gallery generation. Checked at suspension points; flipping it never
/// interrupts a request mid-flight, it only stops results from being applied
/// and stops queued work from starting.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),
    #[error("task cancelled")]
    Cancelled,
    #[error("task panicked")]
    Panicked,
}

/// Run `tasks` with at most `limit` in flight at once.
///
/// Results come back in submission order regardless of completion order, one
/// slot per task. A failing task only marks its own slot; siblings keep
/// running, and the call returns once every task has settled.
///
/// Workers claim the next unclaimed index from a shared counter until the
/// list is drained, so exactly `min(limit, tasks.len())` of them exist.
pub async fn run_limited<F, Fut, T>(tasks: Vec<F>, limit: usize) -> Vec<Result<T, TaskError>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    T: Send + 'static,
{
    let total = tasks.len();
    if total == 0 {
        return Vec::new();
    }

    let queue: Arc<Mutex<Vec<Option<F>>>> =
        Arc::new(Mutex::new(tasks.into_iter().map(Some).collect()));
    let slots: Arc<Mutex<Vec<Option<Result<T, TaskError>>>>> =
        Arc::new(Mutex::new((0..total).map(|_| None).collect()));
    let next = Arc::new(AtomicUsize::new(0));

    let workers = limit.max(1).min(total);
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let queue = Arc::clone(&queue);
        let slots = Arc::clone(&slots);
        let next = Arc::clone(&next);
        handles.push(tokio::spawn(async move {
            loop {
                let idx = next.fetch_add(1, Ordering::SeqCst);
                if idx >= total {
                    break;
                }
                let task = queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)[idx]
                    .take();
                let Some(task) = task else { break };
                // Tasks run in their own spawn so a panic costs one slot,
                // not the whole worker.
                let result = match tokio::spawn(task()).await {
                    Ok(r) => r,
                    Err(_) => Err(TaskError::Panicked),
                };
                slots.lock().unwrap_or_else(PoisonError::into_inner)[idx] = Some(result);
            }
        }));
    }
    futures::future::join_all(handles).await;

    let mut locked = slots.lock().unwrap_or_else(PoisonError::into_inner);
    locked
        .drain(..)
        .map(|slot| slot.unwrap_or(Err(TaskError::Panicked)))
        .collect()
}
