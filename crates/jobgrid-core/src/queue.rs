//! Immediate priority queue.
//!
//! An intrusive singly-linked list threaded through each job's queue link.
//! Jobs are kept in descending priority order with arrival order preserved
//! among equal priorities, so popping is just unlinking the head.
//!
//! The link slot is private to this crate: only this queue ever writes it,
//! so a job handed in by its owner is always unlinked. The queue is not
//! internally synchronized.

use crate::job::JobRef;
use crate::priority::JobPriority;

/// Ready jobs, highest priority first.
#[derive(Default)]
pub struct ImmediateQueue {
    head: Option<JobRef>,
    len: usize,
}

impl ImmediateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `job` before the first queued job of strictly lower priority,
    /// or at the tail if there is none.
    pub fn insert(&mut self, mut job: JobRef) {
        assert!(!job.is_linked(), "job is already linked into a queue");
        let priority = job.priority();

        let mut cursor = &mut self.head;
        while cursor.as_ref().is_some_and(|cur| cur.priority() >= priority) {
            if let Some(cur) = cursor {
                cursor = cur.queue_link();
            }
        }

        *job.queue_link() = cursor.take();
        *cursor = Some(job);
        self.len += 1;
    }

    /// Remove and return the highest-priority job.
    pub fn pop_highest(&mut self) -> Option<JobRef> {
        let mut job = self.head.take()?;
        self.head = job.take_queue_link();
        self.len -= 1;
        Some(job)
    }

    /// Priority of the job `pop_highest` would return.
    pub fn peek_priority(&self) -> Option<JobPriority> {
        self.head.as_ref().map(JobRef::priority)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Queued jobs, front to back.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_ref(),
        }
    }
}

impl Drop for ImmediateQueue {
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(mut job) = next {
            next = job.take_queue_link();
        }
    }
}

impl std::fmt::Debug for ImmediateQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct Iter<'a> {
    next: Option<&'a JobRef>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a JobRef;

    fn next(&mut self) -> Option<Self::Item> {
        let job = self.next?;
        self.next = job.next_in_queue();
        Some(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(priority: JobPriority, label: &'static str) -> JobRef {
        JobRef::new(priority, |_| {}).with_label(label)
    }

    fn drain_labels(queue: &mut ImmediateQueue) -> Vec<&'static str> {
        std::iter::from_fn(|| queue.pop_highest())
            .map(|j| j.label().unwrap())
            .collect()
    }

    #[test]
    fn empty_queue_pops_none() {
        let mut queue = ImmediateQueue::new();
        assert!(queue.is_empty());
        assert!(queue.pop_highest().is_none());
        assert!(queue.pop_highest().is_none());
        assert_eq!(queue.peek_priority(), None);
    }

    #[test]
    fn equal_priorities_are_fifo() {
        let mut queue = ImmediateQueue::new();
        queue.insert(job(JobPriority::Default, "j1"));
        queue.insert(job(JobPriority::Default, "j2"));
        queue.insert(job(JobPriority::Default, "j3"));

        assert_eq!(drain_labels(&mut queue), vec!["j1", "j2", "j3"]);
    }

    #[test]
    fn higher_priority_jumps_ahead() {
        let mut queue = ImmediateQueue::new();
        queue.insert(job(JobPriority::Background, "low"));
        queue.insert(job(JobPriority::UserInteractive, "high"));

        assert_eq!(queue.peek_priority(), Some(JobPriority::UserInteractive));
        assert_eq!(drain_labels(&mut queue), vec!["high", "low"]);
    }

    #[test]
    fn inserts_before_first_strictly_lower() {
        let mut queue = ImmediateQueue::new();
        queue.insert(job(JobPriority::UserInitiated, "a"));
        queue.insert(job(JobPriority::Utility, "b"));
        queue.insert(job(JobPriority::UserInitiated, "c"));
        queue.insert(job(JobPriority::Default, "d"));
        queue.insert(job(JobPriority::Utility, "e"));

        let labels: Vec<_> = queue.iter().map(|j| j.label().unwrap()).collect();
        assert_eq!(labels, vec!["a", "c", "d", "b", "e"]);
    }

    #[test]
    fn pops_in_non_increasing_priority_order() {
        let mut queue = ImmediateQueue::new();
        // A fixed scramble of every level, several times over.
        let raw = [0x15, 0x09, 0x21, 0x00, 0x19, 0x11, 0x09, 0x21, 0x15, 0x00, 0x11, 0x19];
        for r in raw {
            queue.insert(JobRef::new(JobPriority::from_raw(r), |_| {}));
        }
        assert_eq!(queue.len(), raw.len());

        let popped: Vec<_> = std::iter::from_fn(|| queue.pop_highest())
            .map(|j| j.priority())
            .collect();
        assert_eq!(popped.len(), raw.len());
        assert!(popped.windows(2).all(|w| w[0] >= w[1]));
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    #[should_panic(expected = "already linked")]
    fn linked_job_is_rejected() {
        let mut queue = ImmediateQueue::new();
        let mut a = job(JobPriority::Default, "a");
        *a.queue_link() = Some(job(JobPriority::Default, "b"));
        queue.insert(a);
    }

    #[test]
    fn dropping_a_deep_queue_does_not_overflow() {
        // Chain the links directly; inserting equal priorities is quadratic.
        let mut head = None;
        for _ in 0..200_000 {
            let mut next = JobRef::new(JobPriority::Default, |_| {});
            *next.queue_link() = head;
            head = Some(next);
        }
        let queue = ImmediateQueue { head, len: 200_000 };
        assert_eq!(queue.len(), 200_000);
        drop(queue);
    }

    #[test]
    fn popped_jobs_are_unlinked() {
        let mut queue = ImmediateQueue::new();
        queue.insert(job(JobPriority::Default, "a"));
        queue.insert(job(JobPriority::Default, "b"));

        let a = queue.pop_highest().unwrap();
        assert!(!a.is_linked());
        // The same job can go straight back in.
        queue.insert(a);
        assert_eq!(drain_labels(&mut queue), vec!["b", "a"]);
    }
}
