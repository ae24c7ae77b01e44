//! jobgrid-dispatch — hand jobs to an external concurrent service.
//!
//! The adapter ([`ConcurrentExecutor`]) does no ordering of its own. It maps
//! each job's priority to a [`QosClass`], wraps the job in a thunk that runs
//! it under the right [`ExecutorRef`](jobgrid_core::ExecutorRef), and submits
//! the thunk to a [`ConcurrentService`].
//!
//! [`TokioService`] is the stock service: a tokio runtime whose blocking
//! pool runs jobs and whose timer drives delayed submission, plus one
//! dedicated thread acting as the designated serial (main) context.

pub mod adapter;
pub mod service;
pub mod tokio_service;

pub use adapter::ConcurrentExecutor;
pub use service::{ConcurrentService, QosClass, Thunk};
pub use tokio_service::TokioService;
