//! Scheduling-order behavior of the cooperative backend, driven through the
//! `Scheduler` façade.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobgrid::{
    Clock, CooperativeExecutor, DonationOutcome, EnqueueHook, ExecutorRef, JobPriority, JobRef,
    ManualClock, Scheduler,
};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn scheduler() -> (Scheduler<CooperativeExecutor<ManualClock>>, ManualClock) {
    let clock = ManualClock::new();
    (
        Scheduler::new(CooperativeExecutor::with_clock(clock.clone())),
        clock,
    )
}

fn job(log: &Log, priority: JobPriority, label: &'static str) -> JobRef {
    let log = log.clone();
    JobRef::new(priority, move |_| log.lock().unwrap().push(label)).with_label(label)
}

fn claim_labels(scheduler: &Scheduler<CooperativeExecutor<ManualClock>>) -> Vec<&'static str> {
    std::iter::from_fn(|| scheduler.executor().claim_next())
        .map(|claimed| claimed.job.label().unwrap())
        .collect()
}

// ── Immediate ordering ──────────────────────────────────────────────

#[test]
fn claims_come_out_in_non_increasing_priority() {
    let (scheduler, _) = scheduler();
    let log = Log::default();
    let raws: [u8; 10] = [0x11, 0x21, 0x00, 0x15, 0x09, 0x19, 0x21, 0x11, 0x15, 0x00];
    for raw in raws {
        scheduler
            .enqueue(job(&log, JobPriority::from_raw(raw), "j"))
            .unwrap();
    }

    let priorities: Vec<_> = std::iter::from_fn(|| scheduler.executor().claim_next())
        .map(|claimed| claimed.job.priority())
        .collect();
    assert_eq!(priorities.len(), raws.len());
    assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn equal_priority_is_fifo() {
    let (scheduler, _) = scheduler();
    let log = Log::default();
    for label in ["j1", "j2", "j3"] {
        scheduler.enqueue(job(&log, JobPriority::Utility, label)).unwrap();
    }
    assert_eq!(claim_labels(&scheduler), vec!["j1", "j2", "j3"]);
}

#[test]
fn higher_priority_jumps_ahead() {
    let (scheduler, _) = scheduler();
    let log = Log::default();
    scheduler.enqueue(job(&log, JobPriority::Background, "j1")).unwrap();
    scheduler.enqueue(job(&log, JobPriority::UserInteractive, "j2")).unwrap();
    assert_eq!(claim_labels(&scheduler), vec!["j2", "j1"]);
}

// ── Delayed ordering ────────────────────────────────────────────────

#[test]
fn shorter_delay_is_claimed_first() {
    let (scheduler, clock) = scheduler();
    let log = Log::default();
    scheduler
        .enqueue_with_delay(Duration::from_millis(100), job(&log, JobPriority::Default, "d1"))
        .unwrap();
    scheduler
        .enqueue_with_delay(Duration::from_millis(10), job(&log, JobPriority::Default, "d2"))
        .unwrap();

    clock.advance(Duration::from_millis(10));
    let first = scheduler.executor().claim_next().unwrap();
    assert_eq!(first.job.label(), Some("d2"));
    // d2 was already due; claiming it did not wait.
    assert_eq!(clock.now(), 10_000_000);

    let second = scheduler.executor().claim_next().unwrap();
    assert_eq!(second.job.label(), Some("d1"));
    assert_eq!(clock.now(), 100_000_000);
}

#[test]
fn due_delayed_job_preempts_higher_priority_immediate() {
    let (scheduler, clock) = scheduler();
    let log = Log::default();
    scheduler
        .enqueue(job(&log, JobPriority::UserInteractive, "immediate"))
        .unwrap();
    scheduler
        .enqueue_with_delay(Duration::ZERO, job(&log, JobPriority::Background, "delayed"))
        .unwrap();
    clock.advance(Duration::from_nanos(1));

    assert_eq!(claim_labels(&scheduler), vec!["delayed", "immediate"]);
}

#[test]
fn pending_delayed_does_not_block_ready_work() {
    let (scheduler, clock) = scheduler();
    let log = Log::default();
    scheduler
        .enqueue_with_delay(Duration::from_secs(30), job(&log, JobPriority::UserInteractive, "later"))
        .unwrap();
    scheduler.enqueue(job(&log, JobPriority::Background, "ready")).unwrap();

    let claimed = scheduler.executor().claim_next().unwrap();
    assert_eq!(claimed.job.label(), Some("ready"));
    assert_eq!(clock.now(), 0);
}

// ── Donation ────────────────────────────────────────────────────────

#[test]
fn donation_drains_everything_exactly_once() {
    let (scheduler, _) = scheduler();
    let log = Log::default();
    scheduler.enqueue(job(&log, JobPriority::Default, "a")).unwrap();
    scheduler.enqueue(job(&log, JobPriority::UserInitiated, "b")).unwrap();
    scheduler.enqueue_main(job(&log, JobPriority::Utility, "c")).unwrap();
    scheduler
        .enqueue_with_delay(Duration::from_millis(5), job(&log, JobPriority::Background, "d"))
        .unwrap();

    let summary = scheduler.donate_until(|| false);
    assert_eq!(summary.jobs_run, 4);
    assert_eq!(summary.outcome, DonationOutcome::Drained);

    let mut ran = log.lock().unwrap().clone();
    ran.sort();
    assert_eq!(ran, vec!["a", "b", "c", "d"]);
    assert!(scheduler.executor().is_idle());
}

#[test]
fn donation_stops_early_when_condition_holds() {
    let (scheduler, _) = scheduler();
    let log = Log::default();
    for label in ["a", "b", "c", "d"] {
        scheduler.enqueue(job(&log, JobPriority::Default, label)).unwrap();
    }

    let watched = log.clone();
    let summary = scheduler.donate_until(|| watched.lock().unwrap().contains(&"b"));
    assert_eq!(summary.jobs_run, 2);
    assert_eq!(summary.outcome, DonationOutcome::ConditionMet);
    assert_eq!(scheduler.executor().pending(), 2);
}

#[test]
fn main_queue_jobs_get_the_main_token() {
    let (scheduler, _) = scheduler();
    let tokens = Arc::new(Mutex::new(Vec::new()));
    for main in [false, true] {
        let tokens = tokens.clone();
        let job = JobRef::new(JobPriority::Default, move |executor| {
            tokens.lock().unwrap().push((main, executor));
        });
        if main {
            scheduler.enqueue_main(job).unwrap();
        } else {
            scheduler.enqueue(job).unwrap();
        }
    }

    scheduler.donate_until(|| false);
    let tokens = tokens.lock().unwrap().clone();
    assert_eq!(
        tokens,
        vec![(true, ExecutorRef::Main), (false, ExecutorRef::Generic)]
    );
}

// ── Emptiness and hooks ─────────────────────────────────────────────

#[test]
fn claiming_from_empty_queues_has_no_side_effects() {
    let (scheduler, clock) = scheduler();
    for _ in 0..5 {
        assert!(scheduler.executor().claim_next().is_none());
    }
    assert_eq!(clock.now(), 0);
    assert_eq!(scheduler.executor().pending(), 0);
}

/// Test double that records every job it is handed.
#[derive(Default)]
struct RecordingHook {
    seen: Mutex<Vec<&'static str>>,
}

impl EnqueueHook for RecordingHook {
    fn enqueue(&self, job: JobRef) {
        self.seen.lock().unwrap().push(job.label().unwrap_or("?"));
    }
}

#[test]
fn installed_hook_sees_every_enqueue_and_queue_sees_none() {
    let (scheduler, _) = scheduler();
    let log = Log::default();
    let hook = Arc::new(RecordingHook::default());
    scheduler.hooks().set_enqueue(Some(hook.clone()));

    scheduler.enqueue(job(&log, JobPriority::Default, "x")).unwrap();
    scheduler.enqueue(job(&log, JobPriority::UserInteractive, "y")).unwrap();

    assert_eq!(*hook.seen.lock().unwrap(), vec!["x", "y"]);
    assert!(scheduler.executor().claim_next().is_none());
    assert!(log.lock().unwrap().is_empty());

    // Delayed enqueue has its own hook slot and still reaches the queue.
    scheduler
        .enqueue_with_delay(Duration::ZERO, job(&log, JobPriority::Default, "z"))
        .unwrap();
    assert_eq!(scheduler.executor().pending_delayed(), 1);

    scheduler.hooks().set_enqueue(None);
    scheduler.enqueue(job(&log, JobPriority::Default, "w")).unwrap();
    assert_eq!(scheduler.donate_until(|| false).jobs_run, 2);
    assert_eq!(*hook.seen.lock().unwrap(), vec!["x", "y"]);
}

#[test]
fn delayed_hook_receives_the_delay() {
    let (scheduler, _) = scheduler();
    let delays = Arc::new(Mutex::new(Vec::new()));
    let recorded = delays.clone();
    scheduler
        .hooks()
        .set_delayed_enqueue(Some(Arc::new(move |delay: Duration, _job: JobRef| {
            recorded.lock().unwrap().push(delay);
        })));

    scheduler
        .enqueue_with_delay(Duration::from_millis(42), JobRef::new(JobPriority::Default, |_| {}))
        .unwrap();

    assert_eq!(*delays.lock().unwrap(), vec![Duration::from_millis(42)]);
    assert!(scheduler.executor().is_idle());
}
