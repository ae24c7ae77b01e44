//! jobgrid-core — the vocabulary shared by every jobgrid backend.
//!
//! - [`JobRef`]: the schedulable unit and its intrusive link slot
//! - [`ImmediateQueue`]: the priority list threaded through that slot
//! - [`JobPriority`]: the coarse, totally ordered scheduling weight
//! - [`ExecutorRef`]: the execution-context token a job runs under
//! - [`GlobalExecutor`]: the backend interface both strategies implement
//! - [`JobgridConfig`]: `jobgrid.toml` parsing

pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod priority;
pub mod queue;

pub use config::{BackendKind, ConcurrentConfig, JobgridConfig, SchedulerSection};
pub use error::{SchedulerError, SchedulerResult, SubmitError};
pub use executor::{ExecutorRef, GlobalExecutor};
pub use job::{JobRef, Runnable};
pub use priority::JobPriority;
pub use queue::ImmediateQueue;
