//! Delayed job queue.
//!
//! Each delayed job is wrapped in a small heap entry carrying its absolute
//! deadline. Entries are kept in ascending deadline order; jobs with equal
//! deadlines keep their arrival order.

use std::time::Duration;

use jobgrid_core::JobRef;

use crate::clock::duration_nanos;

struct DelayedEntry {
    job: JobRef,
    /// Absolute deadline in the owning clock's nanoseconds.
    deadline: u64,
    next: Option<Box<DelayedEntry>>,
}

/// Time-deferred jobs, earliest deadline first.
#[derive(Default)]
pub struct DelayedQueue {
    head: Option<Box<DelayedEntry>>,
    len: usize,
}

impl DelayedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `job` to become due `delay` after `now`.
    ///
    /// Returns the absolute deadline assigned to the job.
    pub fn insert(&mut self, now: u64, delay: Duration, job: JobRef) -> u64 {
        let deadline = now.saturating_add(duration_nanos(delay));
        self.insert_at(deadline, job);
        deadline
    }

    /// Queue `job` with an absolute deadline.
    ///
    /// The entry goes before the first entry with a strictly later deadline,
    /// or at the tail.
    pub fn insert_at(&mut self, deadline: u64, job: JobRef) {
        let mut cursor = &mut self.head;
        while cursor.as_ref().is_some_and(|cur| cur.deadline <= deadline) {
            if let Some(cur) = cursor {
                cursor = &mut cur.next;
            }
        }

        let entry = Box::new(DelayedEntry {
            job,
            deadline,
            next: cursor.take(),
        });
        *cursor = Some(entry);
        self.len += 1;
    }

    /// Deadline of the earliest queued job.
    pub fn peek_earliest(&self) -> Option<u64> {
        self.head.as_ref().map(|entry| entry.deadline)
    }

    /// Remove and return the earliest job if its deadline is at or before `now`.
    pub fn pop_if_due(&mut self, now: u64) -> Option<JobRef> {
        if self.peek_earliest()? > now {
            return None;
        }
        let entry = self.head.take()?;
        let DelayedEntry { job, next, .. } = *entry;
        self.head = next;
        self.len -= 1;
        Some(job)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Deadlines front to back.
    pub fn deadlines(&self) -> impl Iterator<Item = u64> + '_ {
        let mut next = self.head.as_deref();
        std::iter::from_fn(move || {
            let entry = next?;
            next = entry.next.as_deref();
            Some(entry.deadline)
        })
    }
}

impl Drop for DelayedQueue {
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(mut entry) = next {
            next = entry.next.take();
        }
    }
}

impl std::fmt::Debug for DelayedQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedQueue")
            .field("len", &self.len)
            .field("earliest", &self.peek_earliest())
            .finish()
    }
}
