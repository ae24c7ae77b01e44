//! Cooperative executor — the claim loop and thread donation.
//!
//! The executor is not a standing service. It makes progress only while
//! some thread calls [`CooperativeExecutor::donate_until`] (or drives
//! [`CooperativeExecutor::claim_next`] itself).

use std::cell::RefCell;
use std::marker::PhantomData;
use std::time::Duration;

use tracing::{debug, trace};

use jobgrid_core::{ExecutorRef, GlobalExecutor, ImmediateQueue, JobRef, SchedulerResult};

use crate::clock::{Clock, MonotonicClock};
use crate::delayed::DelayedQueue;

/// A job picked by the claim loop, with the context it must run under.
#[derive(Debug)]
pub struct Claimed {
    /// The job, already unlinked from its queue.
    pub job: JobRef,
    /// `Main` for jobs from the main queue, `Generic` otherwise.
    pub executor: ExecutorRef,
}

impl Claimed {
    pub fn run(self) {
        self.job.run(self.executor);
    }
}

/// Why a donation returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationOutcome {
    /// The caller's condition became true.
    ConditionMet,
    /// Every queue was empty.
    Drained,
}

/// What a single call to `donate_until` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationSummary {
    /// Jobs claimed and run during the donation.
    pub jobs_run: usize,
    /// Why the donation returned.
    pub outcome: DonationOutcome,
}

#[derive(Default)]
struct Queues {
    /// Ready jobs for any context.
    immediate: ImmediateQueue,
    /// Ready jobs for the designated serial context.
    main: ImmediateQueue,
    /// Jobs waiting on a deadline.
    delayed: DelayedQueue,
}

impl Queues {
    /// Pop the best ready job across the general and main queues.
    ///
    /// Higher priority wins; on a tie the main queue goes first.
    fn pop_ready(&mut self) -> Option<Claimed> {
        let take_main = match (self.main.peek_priority(), self.immediate.peek_priority()) {
            (Some(main), Some(general)) => main >= general,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if take_main {
            self.main.pop_highest().map(|job| Claimed {
                job,
                executor: ExecutorRef::Main,
            })
        } else {
            self.immediate.pop_highest().map(|job| Claimed {
                job,
                executor: ExecutorRef::Generic,
            })
        }
    }
}

/// Single-driver scheduler over an immediate, a main, and a delayed queue.
///
/// The type is `!Send` and `!Sync`: the queues are unsynchronized and may
/// only be touched from the thread that owns the executor. Jobs may enqueue
/// more work on the same executor while they run.
pub struct CooperativeExecutor<C: Clock = MonotonicClock> {
    /// Source of `now` for deadlines and of the claim loop's sleep.
    clock: C,
    /// Never borrowed while a job runs.
    queues: RefCell<Queues>,
    /// Opts out of `Send` and `Sync`.
    _single_thread: PhantomData<*const ()>,
}

impl CooperativeExecutor<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for CooperativeExecutor<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> CooperativeExecutor<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            queues: RefCell::new(Queues::default()),
            _single_thread: PhantomData,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Claim the next job to run.
    ///
    /// 1. A due delayed job, regardless of priority.
    /// 2. Otherwise the best ready immediate or main-queue job.
    /// 3. Otherwise, if delayed jobs remain, sleep until the earliest is due
    ///    and start over.
    /// 4. Otherwise `None`.
    pub fn claim_next(&self) -> Option<Claimed> {
        loop {
            let now = self.clock.now();
            let wait = {
                let mut queues = self.queues.borrow_mut();

                if let Some(job) = queues.delayed.pop_if_due(now) {
                    trace!(priority = %job.priority(), "claimed due delayed job");
                    return Some(Claimed {
                        job,
                        executor: ExecutorRef::Generic,
                    });
                }

                if let Some(claimed) = queues.pop_ready() {
                    trace!(
                        priority = %claimed.job.priority(),
                        executor = %claimed.executor,
                        "claimed ready job"
                    );
                    return Some(claimed);
                }

                let deadline = queues.delayed.peek_earliest()?;
                Duration::from_nanos(deadline.saturating_sub(now))
            };

            trace!(wait_ns = wait.as_nanos() as u64, "waiting for next delayed job");
            self.clock.sleep(wait);
        }
    }

    /// Run jobs on the calling thread until `condition` holds or there is
    /// nothing left to run.
    ///
    /// `condition` is checked before every claim. When the queues are empty
    /// the call returns at once, even if `condition` is still false.
    pub fn donate_until<F>(&self, mut condition: F) -> DonationSummary
    where
        F: FnMut() -> bool,
    {
        let mut jobs_run = 0;
        let outcome = loop {
            if condition() {
                break DonationOutcome::ConditionMet;
            }
            let Some(claimed) = self.claim_next() else {
                break DonationOutcome::Drained;
            };
            claimed.run();
            jobs_run += 1;
        };

        debug!(jobs_run, ?outcome, "thread donation finished");
        DonationSummary { jobs_run, outcome }
    }

    /// Run every queued job, including delayed ones, to completion.
    pub fn run_until_idle(&self) -> usize {
        self.donate_until(|| false).jobs_run
    }

    /// Jobs waiting in any queue.
    pub fn pending(&self) -> usize {
        let queues = self.queues.borrow();
        queues.immediate.len() + queues.main.len() + queues.delayed.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    pub fn pending_delayed(&self) -> usize {
        self.queues.borrow().delayed.len()
    }
}

impl<C: Clock> GlobalExecutor for CooperativeExecutor<C> {
    fn enqueue(&self, job: JobRef) -> SchedulerResult<()> {
        trace!(priority = %job.priority(), label = ?job.label(), "enqueue");
        self.queues.borrow_mut().immediate.insert(job);
        Ok(())
    }

    fn enqueue_with_delay(&self, delay: Duration, job: JobRef) -> SchedulerResult<()> {
        let now = self.clock.now();
        trace!(
            priority = %job.priority(),
            delay_ms = delay.as_millis() as u64,
            "enqueue with delay"
        );
        self.queues.borrow_mut().delayed.insert(now, delay, job);
        Ok(())
    }

    fn enqueue_main(&self, job: JobRef) -> SchedulerResult<()> {
        trace!(priority = %job.priority(), "enqueue on main");
        self.queues.borrow_mut().main.insert(job);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cooperative"
    }
}

impl<C: Clock> std::fmt::Debug for CooperativeExecutor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queues = self.queues.borrow();
        f.debug_struct("CooperativeExecutor")
            .field("immediate", &queues.immediate.len())
            .field("main", &queues.main.len())
            .field("delayed", &queues.delayed)
            .finish()
    }
}
