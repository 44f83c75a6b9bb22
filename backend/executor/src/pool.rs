//! Dispatch pool: runs blocking calls on a fixed number of slots and lets
//! the submitter wait for them with a deadline.
//!
//! A timed-out wait does not stop the call. The call keeps its slot until it
//! returns, and its result is dropped.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

/// Why a dispatched call produced no value.
#[derive(Debug, Error)]
pub enum DispatchError<E> {
    #[error("call did not settle within {0:?}")]
    TimedOut(Duration),

    #[error("call failed: {0}")]
    Failed(E),

    #[error("call panicked: {0}")]
    Panicked(String),

    #[error("dispatch pool is closed")]
    Closed,
}

const PENDING: u8 = 0;
const ABANDONED: u8 = 1;
const FINISHED: u8 = 2;

#[derive(Default)]
struct PoolStats {
    busy: AtomicUsize,
    abandoned: AtomicUsize,
}

/// A submitted call. Pass it to [`DispatchPool::wait`]; dropping it, or
/// dropping the `wait` future, detaches the call, which then counts as
/// abandoned until it returns.
pub struct DispatchHandle<T, E> {
    task: JoinHandle<Result<T, DispatchError<E>>>,
    waiter: Waiter,
    submitted_at: Instant,
}

impl<T, E> DispatchHandle<T, E> {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }
}

/// Fixed-size pool of execution slots for blocking calls.
///
/// Calls run on tokio's blocking thread pool; the slot semaphore caps how
/// many run at once. Submissions beyond the slot count wait for a slot
/// without blocking the submitter.
pub struct DispatchPool {
    slots: Arc<Semaphore>,
    size: usize,
    stats: Arc<PoolStats>,
}

impl DispatchPool {
    /// Create a pool with `slots` execution slots (at least one).
    pub fn new(slots: usize) -> Self {
        if slots == 0 {
            warn!("Dispatch pool requested with 0 slots; using 1");
        }
        let size = slots.max(1);
        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn slots(&self) -> usize {
        self.size
    }

    /// Calls currently executing.
    pub fn busy(&self) -> usize {
        self.stats.busy.load(Ordering::SeqCst)
    }

    /// Calls whose waiter timed out and that have not finished yet.
    pub fn abandoned(&self) -> usize {
        self.stats.abandoned.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }

    /// Stop handing out slots. Calls already running finish normally; calls
    /// still waiting for a slot settle as [`DispatchError::Closed`].
    pub fn close(&self) {
        self.slots.close();
    }

    /// Schedule `call` and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<T, E, F>(&self, call: F) -> DispatchHandle<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let status = Arc::new(AtomicU8::new(PENDING));
        let tracker = Tracker {
            status: Arc::clone(&status),
            stats: Arc::clone(&self.stats),
            submitted_at: Instant::now(),
        };

        let task = tokio::spawn(async move {
            let slot = slots
                .acquire_owned()
                .await
                .map_err(|_| DispatchError::Closed)?;

            let joined = tokio::task::spawn_blocking(move || {
                let _slot = slot;
                let tracker = tracker;
                let _busy = BusyGuard::enter(&tracker.stats);
                call()
            })
            .await;

            match joined {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(DispatchError::Failed(e)),
                Err(join_err) => Err(DispatchError::Panicked(panic_message(join_err))),
            }
        });

        DispatchHandle {
            task,
            waiter: Waiter {
                status,
                stats: Arc::clone(&self.stats),
                attached: true,
            },
            submitted_at: Instant::now(),
        }
    }

    /// Wait for a submitted call for at most `deadline`.
    ///
    /// On timeout the call is left running and its eventual result is
    /// discarded.
    pub async fn wait<T, E>(
        &self,
        handle: DispatchHandle<T, E>,
        deadline: Duration,
    ) -> Result<T, DispatchError<E>> {
        let DispatchHandle {
            task,
            waiter,
            submitted_at,
        } = handle;

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(result)) => {
                waiter.settle();
                result
            }
            Ok(Err(join_err)) => {
                waiter.settle();
                Err(DispatchError::Panicked(panic_message(join_err)))
            }
            Err(_) => {
                drop(waiter);
                warn!(
                    deadline_ms = deadline.as_millis() as u64,
                    waited_ms = submitted_at.elapsed().as_millis() as u64,
                    "Dispatch wait timed out; call left running"
                );
                Err(DispatchError::TimedOut(deadline))
            }
        }
    }
}

/// The waiting side of a call. Dropped while still attached, it marks the
/// call abandoned.
struct Waiter {
    status: Arc<AtomicU8>,
    stats: Arc<PoolStats>,
    attached: bool,
}

impl Waiter {
    fn settle(mut self) {
        self.attached = false;
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if !self.attached {
            return;
        }
        // Count first so the tracker never decrements below zero.
        self.stats.abandoned.fetch_add(1, Ordering::SeqCst);
        if self
            .status
            .compare_exchange(PENDING, ABANDONED, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Already finished; nothing left running.
            self.stats.abandoned.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Settles a call's status when it finishes, is dropped unrun, or unwinds.
struct Tracker {
    status: Arc<AtomicU8>,
    stats: Arc<PoolStats>,
    submitted_at: Instant,
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if self.status.swap(FINISHED, Ordering::SeqCst) == ABANDONED {
            self.stats.abandoned.fetch_sub(1, Ordering::SeqCst);
            debug!(
                total_ms = self.submitted_at.elapsed().as_millis() as u64,
                "Abandoned call finished; result discarded"
            );
        }
    }
}

struct BusyGuard<'a> {
    stats: &'a PoolStats,
}

impl<'a> BusyGuard<'a> {
    fn enter(stats: &'a PoolStats) -> Self {
        stats.busy.fetch_add(1, Ordering::SeqCst);
        Self { stats }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.stats.busy.fetch_sub(1, Ordering::SeqCst);
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
