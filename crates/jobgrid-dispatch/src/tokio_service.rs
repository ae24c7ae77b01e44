//! Tokio-backed concurrent service.
//!
//! - Immediate work runs on the runtime's blocking pool, since jobs run
//!   synchronously and must not stall the async workers.
//! - Delayed work sleeps on the runtime's timer, then moves to the
//!   blocking pool.
//! - Main-context work goes through an unbounded channel drained by one
//!   dedicated OS thread, one job at a time, in submission order.
//!
//! Tokio has no notion of scheduling classes. The class is recorded on a
//! tracing span around each job and otherwise only informs the caller.

use std::panic::AssertUnwindSafe;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, trace_span};

use jobgrid_core::{ConcurrentConfig, SchedulerError, SubmitError};

use crate::service::{ConcurrentService, QosClass, Thunk};

/// The designated serial context: a named thread draining a channel.
struct MainContext {
    /// Dropped on close so the thread sees the channel end.
    tx: Option<mpsc::UnboundedSender<Thunk>>,
    /// Joined on close.
    thread: Option<JoinHandle<()>>,
}

impl MainContext {
    fn spawn(name: &str) -> Result<Self, SchedulerError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Thunk>();
        let thread = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Some(work) = rx.blocking_recv() {
                    if std::panic::catch_unwind(AssertUnwindSafe(work)).is_err() {
                        error!("job panicked on main context");
                    }
                }
                debug!("main context drained");
            })
            .map_err(SchedulerError::ServiceStart)?;

        Ok(Self {
            tx: Some(tx),
            thread: Some(thread),
        })
    }

    fn close(&mut self) {
        // Dropping the sender lets the thread finish queued work and exit.
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == std::thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                error!("main context thread panicked");
            }
        }
    }
}

/// A [`ConcurrentService`] over a tokio runtime.
pub struct TokioService {
    /// Where immediate and delayed work is spawned.
    handle: Handle,
    /// Present when the service built its own runtime.
    runtime: Option<Runtime>,
    main: Mutex<MainContext>,
    /// Set once by `shutdown`; checked before every submission.
    shut_down: AtomicBool,
}

impl TokioService {
    /// Build a dedicated multi-thread runtime from `config`.
    pub fn from_config(config: &ConcurrentConfig) -> Result<Self, SchedulerError> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if let Some(workers) = config.worker_threads {
            builder.worker_threads(workers);
        }
        let runtime = builder
            .max_blocking_threads(config.max_blocking_threads)
            .thread_name(config.thread_name.clone())
            .enable_all()
            .build()
            .map_err(SchedulerError::ServiceStart)?;

        let main = MainContext::spawn(&config.main_thread_name)?;
        info!(
            worker_threads = ?config.worker_threads,
            max_blocking_threads = config.max_blocking_threads,
            "tokio service started"
        );

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
            main: Mutex::new(main),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Run on an existing runtime. The runtime must have its timer enabled.
    pub fn from_handle(handle: Handle, main_thread_name: &str) -> Result<Self, SchedulerError> {
        let main = MainContext::spawn(main_thread_name)?;
        info!("tokio service attached to existing runtime");
        Ok(Self {
            handle,
            runtime: None,
            main: Mutex::new(main),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Stop accepting work and wait for the main context to drain.
    ///
    /// Jobs already handed to the runtime keep running; the owned runtime,
    /// if any, is released when the service is dropped.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.main
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .close();
        info!("tokio service shut down");
    }

    fn ensure_running(&self) -> Result<(), SubmitError> {
        if self.is_shut_down() {
            return Err(SubmitError::Shutdown);
        }
        Ok(())
    }
}

impl ConcurrentService for TokioService {
    fn submit(&self, class: QosClass, work: Thunk) -> Result<(), SubmitError> {
        self.ensure_running()?;
        let span = trace_span!("job", qos = %class);
        self.handle.spawn_blocking(move || span.in_scope(work));
        Ok(())
    }

    fn submit_after(
        &self,
        delay: Duration,
        class: QosClass,
        work: Thunk,
    ) -> Result<(), SubmitError> {
        self.ensure_running()?;
        let span = trace_span!("job", qos = %class, delay_ms = delay.as_millis() as u64);
        let timer_span = span.clone();
        self.handle.spawn(
            async move {
                tokio::time::sleep(delay).await;
                tokio::task::spawn_blocking(move || span.in_scope(work));
            }
            .instrument(timer_span),
        );
        Ok(())
    }

    fn submit_main(&self, work: Thunk) -> Result<(), SubmitError> {
        self.ensure_running()?;
        let main = self
            .main
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let tx = main.tx.as_ref().ok_or(SubmitError::Shutdown)?;
        tx.send(work).map_err(|_| SubmitError::Shutdown)
    }
}

impl Drop for TokioService {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
