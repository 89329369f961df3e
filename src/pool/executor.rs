//! Bounded worker pool that propagates context to every job.
//!
//! Standard bounded-pool dispatch: below the core size a new worker is
//! started for each submission; after that jobs queue; when the queue is
//! full the pool grows up to the maximum, and beyond that submissions are
//! rejected. Excess workers retire after an idle keep-alive. The only
//! behavior added on top of that policy is the propagation wrapping: every
//! job is wrapped via [`wrapper::wrap`] with a context snapshot captured on
//! the caller's task at submission time.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::pool::wrapper;
use crate::trace::context;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type PanicPayload = Box<dyn Any + Send + 'static>;

/// Worker pool sizing, the classic four knobs.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Workers kept alive indefinitely.
    pub core_workers: usize,
    /// Upper bound on workers under load.
    pub max_workers: usize,
    /// Idle lifetime of workers above the core size.
    pub keep_alive: Duration,
    /// Bounded queue capacity; submissions beyond it are rejected.
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            core_workers: 4,
            max_workers: 8,
            keep_alive: Duration::from_secs(30),
            queue_capacity: 64,
        }
    }
}

/// Submission rejected by the pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool saturated: queue full and all workers busy")]
    Saturated,
    #[error("worker pool is shut down")]
    ShutDown,
}

/// Why a submitted job produced no value.
pub enum TaskError {
    /// The job body panicked; the original payload is preserved.
    Panicked(PanicPayload),
    /// The pool shut down before the job ran.
    Cancelled,
}

impl TaskError {
    /// Best-effort rendering of a panic payload.
    pub fn panic_message(payload: &PanicPayload) -> &str {
        if let Some(s) = payload.downcast_ref::<&'static str>() {
            s
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s
        } else {
            "non-string panic payload"
        }
    }
}

impl fmt::Debug for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Panicked(payload) => f
                .debug_tuple("Panicked")
                .field(&Self::panic_message(payload))
                .finish(),
            TaskError::Cancelled => f.write_str("Cancelled"),
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Panicked(payload) => {
                write!(f, "task panicked: {}", Self::panic_message(payload))
            }
            TaskError::Cancelled => f.write_str("task cancelled before completion"),
        }
    }
}

impl std::error::Error for TaskError {}

/// Handle to a submitted job's eventual result.
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, PanicPayload>>,
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskHandle { .. }")
    }
}

impl<T> TaskHandle<T> {
    /// Wait for the job to finish.
    ///
    /// A panic inside the job surfaces here with its original payload;
    /// cleanup on the worker has already run by the time this returns.
    pub async fn join(self) -> Result<T, TaskError> {
        match self.rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(TaskError::Panicked(payload)),
            Err(_) => Err(TaskError::Cancelled),
        }
    }
}

struct PoolState {
    queue: VecDeque<Job>,
    workers: usize,
    shutdown: bool,
    handles: Vec<JoinHandle<()>>,
}

struct PoolInner {
    config: PoolConfig,
    state: Mutex<PoolState>,
    work_available: Notify,
}

impl PoolInner {
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        // A poisoned lock only means a worker panicked outside a job guard;
        // the state itself is still coherent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Bounded worker pool whose every job inherits the submitter's context.
pub struct TaskPool {
    inner: Arc<PoolInner>,
}

impl TaskPool {
    /// Create a pool; no workers start until work arrives.
    pub fn new(config: PoolConfig) -> Self {
        let mut config = config;
        config.core_workers = config.core_workers.max(1);
        config.max_workers = config.max_workers.max(config.core_workers);
        Self {
            inner: Arc::new(PoolInner {
                config,
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    workers: 0,
                    shutdown: false,
                    handles: Vec::new(),
                }),
                work_available: Notify::new(),
            }),
        }
    }

    /// Submit a job and get a handle to its result.
    ///
    /// The submitter's context is snapshotted here, on the calling task;
    /// mutations made after this returns are invisible to the job. Never
    /// blocks: a saturated pool rejects instead.
    pub fn submit<F>(&self, task: F) -> Result<TaskHandle<F::Output>, PoolError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let snapshot = context::snapshot();
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let result = AssertUnwindSafe(wrapper::wrap(snapshot, task))
                .catch_unwind()
                .await;
            let _ = tx.send(result);
        });
        self.dispatch(job)?;
        Ok(TaskHandle { rx })
    }

    /// Fire-and-forget submission; a panicking body is logged, not rethrown.
    pub fn spawn<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let snapshot = context::snapshot();
        let job: Job = Box::pin(async move {
            if let Err(payload) = AssertUnwindSafe(wrapper::wrap(snapshot, task))
                .catch_unwind()
                .await
            {
                tracing::error!(
                    panic = %TaskError::panic_message(&payload),
                    "pooled task panicked"
                );
            }
        });
        self.dispatch(job)
    }

    /// Stop intake, let workers drain the queue, and wait for them to exit.
    /// In-flight jobs are never aborted.
    pub async fn shutdown(&self) {
        let handles = {
            let mut state = self.inner.lock_state();
            state.shutdown = true;
            std::mem::take(&mut state.handles)
        };
        self.inner.work_available.notify_waiters();
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Current number of live workers.
    pub fn active_workers(&self) -> usize {
        self.inner.lock_state().workers
    }

    /// Current queue depth.
    pub fn queued_jobs(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    fn dispatch(&self, job: Job) -> Result<(), PoolError> {
        let mut state = self.inner.lock_state();
        if state.shutdown {
            return Err(PoolError::ShutDown);
        }
        // Reap handles left behind by retired excess workers, otherwise the
        // vec grows without bound across saturation bursts.
        state.handles.retain(|handle| !handle.is_finished());
        if state.workers < self.inner.config.core_workers {
            Self::start_worker(&self.inner, &mut state, job, false);
        } else if state.queue.len() < self.inner.config.queue_capacity {
            state.queue.push_back(job);
            drop(state);
            self.inner.work_available.notify_one();
        } else if state.workers < self.inner.config.max_workers {
            Self::start_worker(&self.inner, &mut state, job, true);
        } else {
            metrics::record_pool_rejection();
            return Err(PoolError::Saturated);
        }
        metrics::record_pool_submission();
        Ok(())
    }

    fn start_worker(inner: &Arc<PoolInner>, state: &mut PoolState, seed: Job, excess: bool) {
        state.workers += 1;
        let handle = tokio::spawn(worker_loop(inner.clone(), seed, excess));
        state.handles.push(handle);
    }
}

async fn worker_loop(inner: Arc<PoolInner>, seed: Job, excess: bool) {
    seed.await;
    loop {
        let job = inner.lock_state().queue.pop_front();
        if let Some(job) = job {
            job.await;
            continue;
        }

        let notified = inner.work_available.notified();
        tokio::pin!(notified);
        // Register before re-checking state so a notify between the check
        // and the await is not lost.
        notified.as_mut().enable();

        {
            let state = inner.lock_state();
            if !state.queue.is_empty() {
                continue;
            }
            if state.shutdown {
                break;
            }
        }

        if excess {
            if tokio::time::timeout(inner.config.keep_alive, notified)
                .await
                .is_err()
                && inner.lock_state().queue.is_empty()
            {
                // Idle past keep-alive: retire.
                break;
            }
        } else {
            notified.await;
        }
    }
    inner.lock_state().workers -= 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::context::{ContextSnapshot, TRACE_ID_KEY};
    use crate::trace::id::TraceId;

    fn small_pool(core: usize, max: usize, queue: usize) -> TaskPool {
        TaskPool::new(PoolConfig {
            core_workers: core,
            max_workers: max,
            keep_alive: Duration::from_millis(50),
            queue_capacity: queue,
        })
    }

    #[tokio::test]
    async fn test_job_inherits_submitter_trace_id() {
        let pool = small_pool(2, 2, 8);
        let seen = context::scope(
            ContextSnapshot::with_trace_id(&TraceId::from("abc")),
            async {
                let handle = pool.submit(async { context::trace_id() }).unwrap();
                handle.join().await.unwrap()
            },
        )
        .await;
        assert_eq!(seen.as_deref(), Some("abc"));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_job_without_ambient_context_gets_fresh_id() {
        let pool = small_pool(1, 1, 8);
        let handle = pool.submit(async { context::trace_id() }).unwrap();
        let id = handle.join().await.unwrap().expect("fresh id installed");
        assert_eq!(id.len(), 32);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_no_leakage_across_reused_worker() {
        let pool = small_pool(1, 1, 8);
        context::scope(
            ContextSnapshot::with_trace_id(&TraceId::from("abc")),
            async {
                pool.submit(async {}).unwrap().join().await.unwrap();
            },
        )
        .await;
        // Same single worker, no ambient context this time.
        let seen = pool
            .submit(async { context::trace_id() })
            .unwrap()
            .join()
            .await
            .unwrap();
        let id = seen.expect("fresh id, not empty");
        assert_ne!(id, "abc");
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_snapshot_taken_at_submission_time() {
        let pool = small_pool(1, 1, 8);
        let seen = context::scope(ContextSnapshot::default(), async {
            context::set(TRACE_ID_KEY, "abc");
            context::set("phase", "before");
            let handle = pool.submit(async { context::get("phase") }).unwrap();
            context::set("phase", "after");
            handle.join().await.unwrap()
        })
        .await;
        assert_eq!(seen.as_deref(), Some("before"));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_panic_surfaces_and_worker_recovers() {
        let pool = small_pool(1, 1, 8);
        let handle = pool
            .submit(async {
                panic!("boom");
            })
            .unwrap();
        match handle.join().await {
            Err(TaskError::Panicked(payload)) => {
                assert_eq!(TaskError::panic_message(&payload), "boom");
            }
            Err(TaskError::Cancelled) => panic!("job was cancelled, not panicked"),
            Ok(()) => panic!("job should have panicked"),
        }
        // The worker survived and the failed job's context did not leak.
        let seen = pool
            .submit(async { context::trace_id() })
            .unwrap()
            .join()
            .await
            .unwrap();
        assert!(seen.is_some());
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_saturated_pool_rejects() {
        let pool = small_pool(1, 1, 1);
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let blocker = pool
            .submit(async move {
                let _ = gate_rx.await;
            })
            .unwrap();
        // Wait until the seeded worker is actually running the blocker.
        while pool.active_workers() < 1 {
            tokio::task::yield_now().await;
        }
        let queued = pool.submit(async {}).unwrap();
        assert_eq!(pool.submit(async {}).unwrap_err(), PoolError::Saturated);
        let _ = gate_tx.send(());
        blocker.join().await.unwrap();
        queued.join().await.unwrap();
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_pool_grows_past_core_under_load() {
        let pool = small_pool(1, 2, 1);
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let blocker = pool
            .submit(async move {
                let _ = gate_rx.await;
            })
            .unwrap();
        let queued = pool.submit(async {}).unwrap();
        // Queue full, below max: an excess worker runs this while the core
        // worker is still blocked.
        let overflow = pool.submit(async { 7 }).unwrap();
        assert_eq!(overflow.join().await.unwrap(), 7);
        queued.join().await.unwrap();
        let _ = gate_tx.send(());
        blocker.join().await.unwrap();
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_excess_workers_retire_after_keep_alive() {
        let pool = small_pool(1, 2, 1);
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let blocker = pool
            .submit(async move {
                let _ = gate_rx.await;
            })
            .unwrap();
        let queued = pool.submit(async {}).unwrap();
        let overflow = pool.submit(async {}).unwrap();
        overflow.join().await.unwrap();
        queued.join().await.unwrap();
        let _ = gate_tx.send(());
        blocker.join().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(pool.active_workers(), 1);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_finished_worker_handles_are_reaped() {
        let pool = small_pool(1, 2, 1);
        // Repeated saturation bursts, each growing an excess worker that
        // then retires past its keep-alive.
        for _ in 0..5 {
            let (gate_tx, gate_rx) = oneshot::channel::<()>();
            let blocker = pool
                .submit(async move {
                    let _ = gate_rx.await;
                })
                .unwrap();
            // Wait until a worker has picked up the blocker before piling on
            // the next submissions.
            while pool.queued_jobs() > 0 {
                tokio::task::yield_now().await;
            }
            let queued = pool.submit(async {}).unwrap();
            let overflow = pool.submit(async {}).unwrap();
            overflow.join().await.unwrap();
            queued.join().await.unwrap();
            let _ = gate_tx.send(());
            blocker.join().await.unwrap();
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        // The next submission sweeps handles of workers that already exited.
        pool.submit(async {}).unwrap().join().await.unwrap();
        assert_eq!(pool.active_workers(), 1);
        let retained = pool.inner.lock_state().handles.len();
        assert!(
            retained <= 2,
            "handle bookkeeping must track live workers, found {retained}"
        );
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue_and_rejects_new_work() {
        let pool = small_pool(1, 1, 16);
        let handles: Vec<_> = (0..8)
            .map(|i| pool.submit(async move { i }).unwrap())
            .collect();
        pool.shutdown().await;
        assert_eq!(pool.submit(async {}).unwrap_err(), PoolError::ShutDown);
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().await.unwrap(), i);
        }
        assert_eq!(pool.active_workers(), 0);
    }
}
