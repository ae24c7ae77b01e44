use std::collections::BTreeMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use jobgrid::{CooperativeExecutor, ExecutorRef, GlobalExecutor, JobPriority, JobRef, Scheduler};
use jobgrid_core::{BackendKind, ConcurrentConfig, JobgridConfig};

/// How many synthetic jobs of each kind to submit.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Immediate jobs, cycling through every priority.
    pub jobs: usize,
    /// Delayed jobs; the n-th waits `n * delay_ms`.
    pub delayed: usize,
    pub delay_ms: u64,
    /// Jobs for the designated serial context.
    pub main: usize,
}

impl Plan {
    fn total(&self) -> usize {
        self.jobs + self.delayed + self.main
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Backend name as reported by the executor.
    pub backend: &'static str,
    pub submitted: usize,
    /// Jobs that reported back before the run ended.
    pub completed: usize,
    /// Wall time from first submission to the last completion collected.
    pub elapsed_ms: u128,
    /// Job labels in the order they finished.
    pub order: Vec<String>,
    /// Completed jobs per priority name.
    pub by_priority: BTreeMap<&'static str, usize>,
    /// Completed jobs that ran with the main token.
    pub on_main: usize,
}

/// A finished job, as reported back by the job itself.
struct Completion {
    label: String,
    priority: JobPriority,
    executor: ExecutorRef,
}

fn synthetic(label: String, priority: JobPriority, done: &Sender<Completion>) -> JobRef {
    let done = done.clone();
    JobRef::new(priority, move |executor| {
        // The receiver only goes away once the run has given up waiting.
        let _ = done.send(Completion {
            label,
            priority,
            executor,
        });
    })
}

fn submit<E: GlobalExecutor>(
    scheduler: &Scheduler<E>,
    plan: &Plan,
    done: &Sender<Completion>,
) -> anyhow::Result<()> {
    let mut priorities = JobPriority::ALL.iter().copied().cycle();
    let mut next_priority = || priorities.next().unwrap_or_default();

    for n in 0..plan.jobs {
        let priority = next_priority();
        scheduler.enqueue(synthetic(format!("job-{n}"), priority, done))?;
    }
    for n in 0..plan.delayed {
        let priority = next_priority();
        let delay = Duration::from_millis(plan.delay_ms.saturating_mul(n as u64 + 1));
        scheduler.enqueue_with_delay(delay, synthetic(format!("delayed-{n}"), priority, done))?;
    }
    for n in 0..plan.main {
        scheduler.enqueue_main(synthetic(format!("main-{n}"), JobPriority::UserInteractive, done))?;
    }
    info!(total = plan.total(), backend = scheduler.backend_name(), "submitted synthetic jobs");
    Ok(())
}

fn collect(
    backend: &'static str,
    plan: &Plan,
    started: Instant,
    completions: impl IntoIterator<Item = Completion>,
) -> RunReport {
    let mut report = RunReport {
        backend,
        submitted: plan.total(),
        completed: 0,
        elapsed_ms: 0,
        order: Vec::new(),
        by_priority: BTreeMap::new(),
        on_main: 0,
    };
    for completion in completions {
        report.completed += 1;
        *report.by_priority.entry(completion.priority.name()).or_default() += 1;
        if completion.executor.is_main() {
            report.on_main += 1;
        }
        report.order.push(completion.label);
    }
    report.elapsed_ms = started.elapsed().as_millis();
    report
}

fn run_cooperative(plan: &Plan) -> anyhow::Result<RunReport> {
    let scheduler = Scheduler::<CooperativeExecutor>::cooperative();
    let (tx, rx) = mpsc::channel();
    let started = Instant::now();

    submit(&scheduler, plan, &tx)?;
    let summary = scheduler.donate_until(|| false);
    info!(jobs_run = summary.jobs_run, outcome = ?summary.outcome, "donation finished");

    drop(tx);
    Ok(collect(scheduler.backend_name(), plan, started, rx.try_iter()))
}

fn wait_for(rx: &Receiver<Completion>, total: usize, deadline: Duration) -> Vec<Completion> {
    let give_up = Instant::now() + deadline;
    let mut completions = Vec::with_capacity(total);
    while completions.len() < total {
        let remaining = give_up.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(completion) => completions.push(completion),
            Err(_) => break,
        }
    }
    completions
}

fn run_concurrent(config: &ConcurrentConfig, plan: &Plan) -> anyhow::Result<RunReport> {
    let scheduler = Scheduler::concurrent(config)?;
    let (tx, rx) = mpsc::channel();
    let started = Instant::now();

    submit(&scheduler, plan, &tx)?;
    let longest_delay = Duration::from_millis(plan.delay_ms.saturating_mul(plan.delayed as u64));
    let completions = wait_for(&rx, plan.total(), longest_delay + Duration::from_secs(30));
    scheduler.shutdown();

    let report = collect(scheduler.backend_name(), plan, started, completions);
    if report.completed < report.submitted {
        anyhow::bail!(
            "only {} of {} jobs completed before timing out",
            report.completed,
            report.submitted
        );
    }
    Ok(report)
}

/// Drive `plan` through the selected backend and return the run report.
pub fn execute(backend: BackendKind, config: &JobgridConfig, plan: &Plan) -> anyhow::Result<RunReport> {
    match backend {
        BackendKind::Cooperative => run_cooperative(plan),
        BackendKind::Concurrent => run_concurrent(&config.concurrent, plan),
    }
}

pub fn run(config: Option<&Path>, backend: Option<BackendKind>, plan: &Plan) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let backend = backend.unwrap_or(config.scheduler.backend);
    let report = execute(backend, &config, plan)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
