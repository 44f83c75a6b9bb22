//! Admission control: a fixed number of permits for in-flight recognition
//! calls, handed out without waiting.
//!
//! There is no queue. A caller that finds no free permit is rejected on the
//! spot and must retry on its own schedule.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, warn};

pub struct AdmissionController {
    permits: Arc<Semaphore>,
    capacity: usize,
    admitted: AtomicU64,
    rejected: AtomicU64,
}

/// The right to run one recognition call.
///
/// Returned to the controller by [`Permit::release`] or when dropped, so a
/// permit is released exactly once on every exit path, including a
/// cancelled request future.
#[must_use = "dropping a permit releases it immediately"]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

impl Permit {
    pub fn release(self) {}
}

impl AdmissionController {
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            warn!("Admission capacity of 0 rejects every request");
        }
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            admitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Take a permit if one is free. Never waits.
    pub fn try_acquire(&self) -> Option<Permit> {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => {
                self.admitted.fetch_add(1, Ordering::Relaxed);
                debug!(available = self.available(), capacity = self.capacity, "Permit acquired");
                Some(Permit { _permit: permit })
            }
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(capacity = self.capacity, "Admission rejected: all permits in use");
                None
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn outstanding(&self) -> usize {
        self.capacity - self.available()
    }

    /// Permits handed out since startup.
    pub fn admitted_total(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    /// Acquisition attempts refused since startup.
    pub fn rejected_total(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}
