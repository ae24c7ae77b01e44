//! Scheduler error types.

use thiserror::Error;

/// Failure reported by an external concurrent service when it refuses a
/// submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("service has shut down")]
    Shutdown,

    #[error("submission rejected: {0}")]
    Rejected(String),
}

/// Errors that can occur while enqueueing work.
///
/// Cooperative enqueue never fails; every variant comes from the external
/// service path or from process-wide initialization.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("failed to start service: {0}")]
    ServiceStart(#[source] std::io::Error),

    #[error("global scheduler already initialized")]
    AlreadyInitialized,
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_errors_pass_through_unmodified() {
        let err: SchedulerError = SubmitError::Rejected("queue full".into()).into();
        assert_eq!(err.to_string(), "submission rejected: queue full");
        assert!(matches!(
            err,
            SchedulerError::Submit(SubmitError::Rejected(_))
        ));
    }

    #[test]
    fn shutdown_display() {
        let err = SchedulerError::from(SubmitError::Shutdown);
        assert_eq!(err.to_string(), "service has shut down");
    }
}
