//! Enqueue override hooks.
//!
//! A hook replaces the backend for one enqueue operation. Hooks are meant
//! to be installed once during startup by an embedder that wants jobs to
//! land in its own event loop; installing `None` restores the backend.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::trace;

use jobgrid_core::JobRef;

/// Replacement for immediate (and main-context) enqueue.
pub trait EnqueueHook: Send + Sync {
    fn enqueue(&self, job: JobRef);
}

impl<F> EnqueueHook for F
where
    F: Fn(JobRef) + Send + Sync,
{
    fn enqueue(&self, job: JobRef) {
        self(job)
    }
}

/// Replacement for delayed enqueue.
pub trait DelayedEnqueueHook: Send + Sync {
    fn enqueue_with_delay(&self, delay: Duration, job: JobRef);
}

impl<F> DelayedEnqueueHook for F
where
    F: Fn(Duration, JobRef) + Send + Sync,
{
    fn enqueue_with_delay(&self, delay: Duration, job: JobRef) {
        self(delay, job)
    }
}

type Slot<T> = RwLock<Option<Arc<T>>>;

/// The set of installed hooks. One per operation; they never interact.
#[derive(Default)]
pub struct Hooks {
    enqueue: Slot<dyn EnqueueHook>,
    delayed: Slot<dyn DelayedEnqueueHook>,
    main: Slot<dyn EnqueueHook>,
}

fn load<T: ?Sized>(slot: &Slot<T>) -> Option<Arc<T>> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn store<T: ?Sized>(slot: &Slot<T>, value: Option<Arc<T>>) -> Option<Arc<T>> {
    let mut guard = slot.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, value)
}

impl Hooks {
    pub const fn new() -> Self {
        Self {
            enqueue: RwLock::new(None),
            delayed: RwLock::new(None),
            main: RwLock::new(None),
        }
    }

    /// Install (or with `None`, remove) the immediate enqueue hook.
    /// Returns the previously installed hook.
    pub fn set_enqueue(&self, hook: Option<Arc<dyn EnqueueHook>>) -> Option<Arc<dyn EnqueueHook>> {
        store(&self.enqueue, hook)
    }

    pub fn set_delayed_enqueue(
        &self,
        hook: Option<Arc<dyn DelayedEnqueueHook>>,
    ) -> Option<Arc<dyn DelayedEnqueueHook>> {
        store(&self.delayed, hook)
    }

    pub fn set_main_enqueue(
        &self,
        hook: Option<Arc<dyn EnqueueHook>>,
    ) -> Option<Arc<dyn EnqueueHook>> {
        store(&self.main, hook)
    }

    /// Remove every hook.
    pub fn clear(&self) {
        self.set_enqueue(None);
        self.set_delayed_enqueue(None);
        self.set_main_enqueue(None);
    }

    pub fn enqueue_hook(&self) -> Option<Arc<dyn EnqueueHook>> {
        load(&self.enqueue)
    }

    pub fn delayed_enqueue_hook(&self) -> Option<Arc<dyn DelayedEnqueueHook>> {
        load(&self.delayed)
    }

    pub fn main_enqueue_hook(&self) -> Option<Arc<dyn EnqueueHook>> {
        load(&self.main)
    }

    /// Hand `job` to the enqueue hook, or give it back if none is installed.
    ///
    /// The lock is released before the hook runs, so a hook may enqueue.
    pub fn forward_enqueue(&self, job: JobRef) -> Result<(), JobRef> {
        match self.enqueue_hook() {
            Some(hook) => {
                trace!(priority = %job.priority(), "forwarding to enqueue hook");
                hook.enqueue(job);
                Ok(())
            }
            None => Err(job),
        }
    }

    pub fn forward_delayed_enqueue(&self, delay: Duration, job: JobRef) -> Result<(), JobRef> {
        match self.delayed_enqueue_hook() {
            Some(hook) => {
                trace!(priority = %job.priority(), "forwarding to delayed enqueue hook");
                hook.enqueue_with_delay(delay, job);
                Ok(())
            }
            None => Err(job),
        }
    }

    pub fn forward_main_enqueue(&self, job: JobRef) -> Result<(), JobRef> {
        match self.main_enqueue_hook() {
            Some(hook) => {
                trace!(priority = %job.priority(), "forwarding to main enqueue hook");
                hook.enqueue(job);
                Ok(())
            }
            None => Err(job),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("enqueue", &self.enqueue_hook().is_some())
            .field("delayed", &self.delayed_enqueue_hook().is_some())
            .field("main", &self.main_enqueue_hook().is_some())
            .finish()
    }
}
