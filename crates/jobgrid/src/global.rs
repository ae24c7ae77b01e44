//! The process-wide scheduler.
//!
//! Hooks are process-wide. The backend behind them depends on the build:
//!
//! - default: one [`ConcurrentExecutor`] over a [`TokioService`], started
//!   by [`init`] or lazily on first use with default settings.
//! - `cooperative` feature: one [`CooperativeExecutor`] *per thread*. Jobs
//!   enqueued on a thread only run when that same thread calls
//!   [`donate_thread_until`].
//!
//! [`ConcurrentExecutor`]: jobgrid_dispatch::ConcurrentExecutor
//! [`TokioService`]: jobgrid_dispatch::TokioService
//! [`CooperativeExecutor`]: jobgrid_cooperative::CooperativeExecutor

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use tracing::warn;

use jobgrid_core::{
    BackendKind, GlobalExecutor, JobRef, JobgridConfig, SchedulerResult,
};

use crate::hooks::{DelayedEnqueueHook, EnqueueHook, Hooks};

static HOOKS: LazyLock<Arc<Hooks>> = LazyLock::new(|| Arc::new(Hooks::new()));

/// The process-wide hook set.
pub fn hooks() -> &'static Arc<Hooks> {
    &HOOKS
}

/// Override [`enqueue_global`] process-wide; `None` restores the backend.
pub fn install_enqueue_hook(hook: Option<Arc<dyn EnqueueHook>>) -> Option<Arc<dyn EnqueueHook>> {
    HOOKS.set_enqueue(hook)
}

/// Override [`enqueue_global_with_delay`] process-wide.
pub fn install_delayed_enqueue_hook(
    hook: Option<Arc<dyn DelayedEnqueueHook>>,
) -> Option<Arc<dyn DelayedEnqueueHook>> {
    HOOKS.set_delayed_enqueue(hook)
}

/// Override [`enqueue_main_executor`] process-wide.
pub fn install_main_enqueue_hook(
    hook: Option<Arc<dyn EnqueueHook>>,
) -> Option<Arc<dyn EnqueueHook>> {
    HOOKS.set_main_enqueue(hook)
}

pub fn reset_hooks() {
    HOOKS.clear();
}

/// Enqueue `job` on the global scheduler.
pub fn enqueue_global(job: JobRef) -> SchedulerResult<()> {
    match HOOKS.forward_enqueue(job) {
        Ok(()) => Ok(()),
        Err(job) => backend::with_executor(|executor| executor.enqueue(job)),
    }
}

/// Enqueue `job` on the global scheduler, eligible after `delay`.
pub fn enqueue_global_with_delay(delay: Duration, job: JobRef) -> SchedulerResult<()> {
    match HOOKS.forward_delayed_enqueue(delay, job) {
        Ok(()) => Ok(()),
        Err(job) => backend::with_executor(|executor| executor.enqueue_with_delay(delay, job)),
    }
}

/// Enqueue `job` on the designated serial context.
pub fn enqueue_main_executor(job: JobRef) -> SchedulerResult<()> {
    match HOOKS.forward_main_enqueue(job) {
        Ok(()) => Ok(()),
        Err(job) => backend::with_executor(|executor| executor.enqueue_main(job)),
    }
}

/// Backend compiled into the process-wide scheduler.
pub fn backend_kind() -> BackendKind {
    backend::KIND
}

/// Apply `config` to the process-wide backend.
///
/// A configured backend that differs from the compiled-in one is logged and
/// ignored; the global backend is fixed at build time.
pub fn init(config: &JobgridConfig) -> SchedulerResult<()> {
    if config.scheduler.backend != backend::KIND {
        warn!(
            configured = config.scheduler.backend.as_str(),
            compiled = backend::KIND.as_str(),
            "configured backend differs from the global backend; using the compiled-in one"
        );
    }
    backend::init(config)
}

#[cfg(feature = "cooperative")]
pub use backend::donate_thread_until;

#[cfg(feature = "cooperative")]
mod backend {
    use jobgrid_cooperative::{CooperativeExecutor, DonationSummary};
    use jobgrid_core::{BackendKind, JobgridConfig, SchedulerResult};

    pub(super) const KIND: BackendKind = BackendKind::Cooperative;

    thread_local! {
        static EXECUTOR: CooperativeExecutor = CooperativeExecutor::new();
    }

    pub(super) fn init(_config: &JobgridConfig) -> SchedulerResult<()> {
        Ok(())
    }

    pub(super) fn with_executor<R>(
        f: impl FnOnce(&CooperativeExecutor) -> SchedulerResult<R>,
    ) -> SchedulerResult<R> {
        EXECUTOR.with(f)
    }

    /// Run this thread's queued jobs until `condition` holds or nothing is
    /// left to run.
    pub fn donate_thread_until<F>(condition: F) -> DonationSummary
    where
        F: FnMut() -> bool,
    {
        EXECUTOR.with(|executor| executor.donate_until(condition))
    }
}

#[cfg(not(feature = "cooperative"))]
mod backend {
    use std::sync::{Mutex, OnceLock, PoisonError};

    use tracing::info;

    use jobgrid_core::{
        BackendKind, ConcurrentConfig, JobgridConfig, SchedulerError, SchedulerResult,
    };
    use jobgrid_dispatch::{ConcurrentExecutor, TokioService};

    pub(super) const KIND: BackendKind = BackendKind::Concurrent;

    type Executor = ConcurrentExecutor<TokioService>;

    static EXECUTOR: OnceLock<Executor> = OnceLock::new();
    static INIT: Mutex<()> = Mutex::new(());

    fn start(config: &ConcurrentConfig) -> SchedulerResult<Executor> {
        let service = TokioService::from_config(config)?;
        info!("global concurrent scheduler started");
        Ok(ConcurrentExecutor::new(service))
    }

    pub(super) fn init(config: &JobgridConfig) -> SchedulerResult<()> {
        let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
        if EXECUTOR.get().is_some() {
            return Err(SchedulerError::AlreadyInitialized);
        }
        let executor = start(&config.concurrent)?;
        EXECUTOR.get_or_init(|| executor);
        Ok(())
    }

    fn executor() -> SchedulerResult<&'static Executor> {
        if let Some(executor) = EXECUTOR.get() {
            return Ok(executor);
        }
        let _guard = INIT.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(executor) = EXECUTOR.get() {
            return Ok(executor);
        }
        let executor = start(&ConcurrentConfig::default())?;
        Ok(EXECUTOR.get_or_init(|| executor))
    }

    pub(super) fn with_executor<R>(
        f: impl FnOnce(&Executor) -> SchedulerResult<R>,
    ) -> SchedulerResult<R> {
        f(executor()?)
    }
}
