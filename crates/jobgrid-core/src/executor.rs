//! Execution-context tokens and the backend interface.

use std::fmt;
use std::time::Duration;

use crate::error::SchedulerResult;
use crate::job::JobRef;

/// The execution context a job is run under.
///
/// The scheduler only chooses between the two; what a context *means* to
/// the job (actor isolation, main-thread checks) is the job's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutorRef {
    /// Any thread of the global pool, or a thread donated to it.
    #[default]
    Generic,
    /// The single designated serial context (the main-thread analog).
    Main,
}

impl ExecutorRef {
    pub fn is_main(self) -> bool {
        matches!(self, ExecutorRef::Main)
    }
}

impl fmt::Display for ExecutorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorRef::Generic => f.write_str("generic"),
            ExecutorRef::Main => f.write_str("main"),
        }
    }
}

/// A global scheduling backend.
///
/// Implemented by the cooperative queue scheduler and by the adapter over an
/// external concurrent service. Every method takes ownership of the job;
/// the backend hands it to [`JobRef::run`] when it is picked.
pub trait GlobalExecutor {
    /// Make `job` eligible to run as soon as scheduling permits.
    fn enqueue(&self, job: JobRef) -> SchedulerResult<()>;

    /// Make `job` eligible to run no earlier than `delay` from now.
    fn enqueue_with_delay(&self, delay: Duration, job: JobRef) -> SchedulerResult<()>;

    /// Run `job` on the designated serial context.
    fn enqueue_main(&self, job: JobRef) -> SchedulerResult<()>;

    /// Short backend name for logs and diagnostics.
    fn name(&self) -> &'static str;
}
