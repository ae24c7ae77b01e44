//! Scheduler — the enqueue façade over one backend.
//!
//! Every enqueue checks the matching hook first and only falls through to
//! the backend when none is installed.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use jobgrid_cooperative::{Clock, CooperativeExecutor, DonationSummary};
use jobgrid_core::{ConcurrentConfig, GlobalExecutor, JobRef, SchedulerResult};
use jobgrid_dispatch::{ConcurrentExecutor, TokioService};

use crate::hooks::Hooks;

/// Enqueue entry points bound to a backend `E`.
///
/// `Scheduler<CooperativeExecutor>` inherits the executor's `!Send`, so the
/// cooperative façade stays on the thread that built it.
pub struct Scheduler<E> {
    executor: E,
    hooks: Arc<Hooks>,
}

impl<E: GlobalExecutor> Scheduler<E> {
    /// A scheduler with its own, initially empty, hook set.
    pub fn new(executor: E) -> Self {
        Self::with_hooks(executor, Arc::new(Hooks::new()))
    }

    /// A scheduler sharing `hooks` with other schedulers.
    pub fn with_hooks(executor: E, hooks: Arc<Hooks>) -> Self {
        Self { executor, hooks }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn hooks(&self) -> &Arc<Hooks> {
        &self.hooks
    }

    /// Make `job` eligible to run as soon as scheduling permits.
    pub fn enqueue(&self, job: JobRef) -> SchedulerResult<()> {
        match self.hooks.forward_enqueue(job) {
            Ok(()) => Ok(()),
            Err(job) => self.executor.enqueue(job),
        }
    }

    /// Make `job` eligible to run no earlier than `delay` from now.
    pub fn enqueue_with_delay(&self, delay: Duration, job: JobRef) -> SchedulerResult<()> {
        match self.hooks.forward_delayed_enqueue(delay, job) {
            Ok(()) => Ok(()),
            Err(job) => self.executor.enqueue_with_delay(delay, job),
        }
    }

    /// Run `job` on the designated serial context.
    pub fn enqueue_main(&self, job: JobRef) -> SchedulerResult<()> {
        match self.hooks.forward_main_enqueue(job) {
            Ok(()) => Ok(()),
            Err(job) => self.executor.enqueue_main(job),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.executor.name()
    }
}

impl<C: Clock> Scheduler<CooperativeExecutor<C>> {
    /// Lend the calling thread to the cooperative queues until `condition`
    /// holds or nothing is left to run.
    pub fn donate_until<F>(&self, condition: F) -> DonationSummary
    where
        F: FnMut() -> bool,
    {
        self.executor.donate_until(condition)
    }
}

impl Scheduler<CooperativeExecutor> {
    pub fn cooperative() -> Self {
        Self::new(CooperativeExecutor::new())
    }
}

impl Scheduler<ConcurrentExecutor<TokioService>> {
    /// A concurrent scheduler on a dedicated tokio runtime built from `config`.
    pub fn concurrent(config: &ConcurrentConfig) -> SchedulerResult<Self> {
        Self::concurrent_with_hooks(config, Arc::new(Hooks::new()))
    }

    pub fn concurrent_with_hooks(
        config: &ConcurrentConfig,
        hooks: Arc<Hooks>,
    ) -> SchedulerResult<Self> {
        let service = TokioService::from_config(config)?;
        info!(thread_name = %config.thread_name, "concurrent scheduler ready");
        Ok(Self::with_hooks(ConcurrentExecutor::new(service), hooks))
    }

    /// Stop the underlying service; later enqueues fail.
    pub fn shutdown(&self) {
        self.executor.service().shutdown();
    }
}
