//! The external concurrent service interface.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jobgrid_core::{JobPriority, SubmitError};

/// Work handed to the service: runs one job to completion.
pub type Thunk = Box<dyn FnOnce() + Send + 'static>;

/// Scheduling classes understood by the external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QosClass {
    Unspecified,
    Background,
    Utility,
    Default,
    UserInitiated,
    UserInteractive,
}

impl QosClass {
    pub fn as_str(self) -> &'static str {
        match self {
            QosClass::Unspecified => "unspecified",
            QosClass::Background => "background",
            QosClass::Utility => "utility",
            QosClass::Default => "default",
            QosClass::UserInitiated => "user-initiated",
            QosClass::UserInteractive => "user-interactive",
        }
    }
}

impl From<JobPriority> for QosClass {
    fn from(priority: JobPriority) -> Self {
        match priority {
            JobPriority::Unspecified => QosClass::Unspecified,
            JobPriority::Background => QosClass::Background,
            JobPriority::Utility => QosClass::Utility,
            JobPriority::Default => QosClass::Default,
            JobPriority::UserInitiated => QosClass::UserInitiated,
            JobPriority::UserInteractive => QosClass::UserInteractive,
        }
    }
}

impl fmt::Display for QosClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A thread pool with a timer and one serial queue.
///
/// Ordering within and across classes is entirely up to the service.
pub trait ConcurrentService: Send + Sync {
    /// Run `work` as soon as the pool allows, at scheduling class `class`.
    fn submit(&self, class: QosClass, work: Thunk) -> Result<(), SubmitError>;

    /// Run `work` no earlier than `delay` from now, at scheduling class `class`.
    fn submit_after(&self, delay: Duration, class: QosClass, work: Thunk)
    -> Result<(), SubmitError>;

    /// Run `work` on the service's single serial context.
    fn submit_main(&self, work: Thunk) -> Result<(), SubmitError>;
}

impl<S: ConcurrentService + ?Sized> ConcurrentService for Arc<S> {
    fn submit(&self, class: QosClass, work: Thunk) -> Result<(), SubmitError> {
        (**self).submit(class, work)
    }

    fn submit_after(
        &self,
        delay: Duration,
        class: QosClass,
        work: Thunk,
    ) -> Result<(), SubmitError> {
        (**self).submit_after(delay, class, work)
    }

    fn submit_main(&self, work: Thunk) -> Result<(), SubmitError> {
        (**self).submit_main(work)
    }
}
