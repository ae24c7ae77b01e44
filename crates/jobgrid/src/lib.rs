//! jobgrid — a pluggable global job scheduler.
//!
//! Producers hand [`JobRef`]s to a [`Scheduler`], which forwards each one to
//! an installed override hook or to its backend:
//!
//! ```text
//! Scheduler<E: GlobalExecutor>
//!   ├── Hooks (enqueue / delayed / main overrides)
//!   └── E = CooperativeExecutor   priority queues + thread donation
//!     | E = ConcurrentExecutor    external thread pool (TokioService)
//! ```
//!
//! The [`global`] module exposes one process-wide scheduler. Its backend is
//! chosen at build time: the `cooperative` feature selects the cooperative
//! queues (one per thread, driven by [`global::donate_thread_until`]),
//! otherwise jobs go to a lazily started [`TokioService`].

pub mod global;
pub mod hooks;
pub mod scheduler;

pub use hooks::{DelayedEnqueueHook, EnqueueHook, Hooks};
pub use scheduler::Scheduler;

pub use jobgrid_core::{
    BackendKind, ExecutorRef, GlobalExecutor, JobPriority, JobRef, JobgridConfig, Runnable,
    SchedulerError, SchedulerResult, SubmitError,
};
pub use jobgrid_cooperative::{
    Clock, CooperativeExecutor, DonationOutcome, DonationSummary, ManualClock, MonotonicClock,
};
pub use jobgrid_dispatch::{ConcurrentExecutor, ConcurrentService, QosClass, Thunk, TokioService};
