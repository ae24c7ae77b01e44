//! Jobs — the unit of schedulable work.
//!
//! A [`JobRef`] is the only handle to a job and it is not `Clone`. Enqueueing
//! moves the handle into the backend and claiming moves it back out, so a
//! job can sit in at most one queue at a time without any runtime check.
//!
//! Each job carries one slot of scheduler-private storage, the queue link.
//! Only [`ImmediateQueue`](crate::queue::ImmediateQueue) can reach it, and
//! it threads its list through the slot without allocating. A job's owner
//! cannot read or write the link.

use std::fmt;

use crate::executor::ExecutorRef;
use crate::priority::JobPriority;

/// The work a job performs when it is run.
///
/// `run` transfers control synchronously until the work completes or
/// voluntarily suspends. Failures inside `run` belong to the job owner.
pub trait Runnable: Send + 'static {
    fn run(self: Box<Self>, executor: ExecutorRef);
}

impl<F> Runnable for F
where
    F: FnOnce(ExecutorRef) + Send + 'static,
{
    fn run(self: Box<Self>, executor: ExecutorRef) {
        (*self)(executor)
    }
}

/// A schedulable job: a priority, its work, and the queue link.
struct Job {
    /// Fixed at creation.
    priority: JobPriority,
    /// Static name for log output.
    label: Option<&'static str>,
    /// Consumed by [`JobRef::run`].
    work: Box<dyn Runnable>,
    /// Scheduler-private link to the next job in whichever queue holds this one.
    next: Option<JobRef>,
}

/// Owning handle to a job: its priority, label, work and queue link.
pub struct JobRef(Box<Job>);

impl JobRef {
    /// Create a job from a closure.
    pub fn new<F>(priority: JobPriority, work: F) -> Self
    where
        F: FnOnce(ExecutorRef) + Send + 'static,
    {
        Self::from_runnable(priority, Box::new(work))
    }

    /// Create a job from boxed [`Runnable`] work.
    pub fn from_runnable(priority: JobPriority, work: Box<dyn Runnable>) -> Self {
        JobRef(Box::new(Job {
            priority,
            label: None,
            work,
            next: None,
        }))
    }

    /// Attach a static label, used only in log output.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.0.label = Some(label);
        self
    }

    pub fn priority(&self) -> JobPriority {
        self.0.priority
    }

    pub fn label(&self) -> Option<&'static str> {
        self.0.label
    }

    /// Run the job under `executor`, handing ownership to its work.
    pub fn run(self, executor: ExecutorRef) {
        let Job { work, next, .. } = *self.0;
        assert!(next.is_none(), "job run while still linked into a queue");
        work.run(executor);
    }

    /// The scheduler-private queue link.
    ///
    /// Only the queue currently holding this job may use it. A queue must
    /// clear the link before handing the job back out.
    pub(crate) fn queue_link(&mut self) -> &mut Option<JobRef> {
        &mut self.0.next
    }

    /// Detach and return the next job in the queue, leaving the link empty.
    pub(crate) fn take_queue_link(&mut self) -> Option<JobRef> {
        self.0.next.take()
    }

    /// Shared view of the next job in the queue, for read-only traversal.
    pub(crate) fn next_in_queue(&self) -> Option<&JobRef> {
        self.0.next.as_ref()
    }

    pub(crate) fn is_linked(&self) -> bool {
        self.0.next.is_some()
    }
}

impl fmt::Debug for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRef")
            .field("priority", &self.0.priority)
            .field("label", &self.0.label)
            .field("linked", &self.0.next.is_some())
            .finish()
    }
}
