//! Adapter from the global executor interface to a concurrent service.

use std::time::Duration;

use tracing::{trace, warn};

use jobgrid_core::{ExecutorRef, GlobalExecutor, JobRef, SchedulerResult};

use crate::service::{ConcurrentService, QosClass};

/// Global executor that delegates every job to a [`ConcurrentService`].
///
/// Holds nothing but the service handle; safe to share across threads.
pub struct ConcurrentExecutor<S> {
    service: S,
}

impl<S: ConcurrentService> ConcurrentExecutor<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

fn thunk(job: JobRef, executor: ExecutorRef) -> crate::service::Thunk {
    Box::new(move || job.run(executor))
}

impl<S: ConcurrentService> GlobalExecutor for ConcurrentExecutor<S> {
    fn enqueue(&self, job: JobRef) -> SchedulerResult<()> {
        let class = QosClass::from(job.priority());
        trace!(%class, label = ?job.label(), "submitting job");
        self.service
            .submit(class, thunk(job, ExecutorRef::Generic))
            .inspect_err(|e| warn!(%class, error = %e, "job submission failed"))?;
        Ok(())
    }

    fn enqueue_with_delay(&self, delay: Duration, job: JobRef) -> SchedulerResult<()> {
        let class = QosClass::from(job.priority());
        trace!(%class, delay_ms = delay.as_millis() as u64, "submitting delayed job");
        self.service
            .submit_after(delay, class, thunk(job, ExecutorRef::Generic))
            .inspect_err(|e| warn!(%class, error = %e, "delayed job submission failed"))?;
        Ok(())
    }

    fn enqueue_main(&self, job: JobRef) -> SchedulerResult<()> {
        trace!(label = ?job.label(), "submitting job to main context");
        self.service
            .submit_main(thunk(job, ExecutorRef::Main))
            .inspect_err(|e| warn!(error = %e, "main job submission failed"))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "concurrent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Thunk;
    use jobgrid_core::{JobPriority, SchedulerError, SubmitError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Route {
        Now(QosClass),
        After(Duration, QosClass),
        Main,
    }

    /// Records submissions and holds thunks until the test runs them.
    #[derive(Default)]
    struct RecordingService {
        submitted: Mutex<Vec<(Route, Thunk)>>,
        refuse: AtomicBool,
    }

    impl RecordingService {
        fn push(&self, route: Route, work: Thunk) -> Result<(), SubmitError> {
            if self.refuse.load(Ordering::SeqCst) {
                return Err(SubmitError::Rejected("pool exhausted".into()));
            }
            self.submitted.lock().unwrap().push((route, work));
            Ok(())
        }

        fn run_all(&self) -> Vec<Route> {
            let drained: Vec<_> = self.submitted.lock().unwrap().drain(..).collect();
            drained
                .into_iter()
                .map(|(route, work)| {
                    work();
                    route
                })
                .collect()
        }
    }

    impl ConcurrentService for RecordingService {
        fn submit(&self, class: QosClass, work: Thunk) -> Result<(), SubmitError> {
            self.push(Route::Now(class), work)
        }

        fn submit_after(
            &self,
            delay: Duration,
            class: QosClass,
            work: Thunk,
        ) -> Result<(), SubmitError> {
            self.push(Route::After(delay, class), work)
        }

        fn submit_main(&self, work: Thunk) -> Result<(), SubmitError> {
            self.push(Route::Main, work)
        }
    }

    fn recording_job(seen: &Arc<Mutex<Vec<ExecutorRef>>>, priority: JobPriority) -> JobRef {
        let seen = seen.clone();
        JobRef::new(priority, move |executor| seen.lock().unwrap().push(executor))
    }

    #[test]
    fn immediate_submission_uses_priority_class() {
        let executor = ConcurrentExecutor::new(RecordingService::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        executor
            .enqueue(recording_job(&seen, JobPriority::UserInitiated))
            .unwrap();

        let routes = executor.service().run_all();
        assert_eq!(routes, vec![Route::Now(QosClass::UserInitiated)]);
        assert_eq!(*seen.lock().unwrap(), vec![ExecutorRef::Generic]);
    }

    #[test]
    fn delayed_submission_passes_delay_through() {
        let executor = ConcurrentExecutor::new(RecordingService::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        executor
            .enqueue_with_delay(
                Duration::from_millis(250),
                recording_job(&seen, JobPriority::Background),
            )
            .unwrap();

        let routes = executor.service().run_all();
        assert_eq!(
            routes,
            vec![Route::After(Duration::from_millis(250), QosClass::Background)]
        );
        assert_eq!(*seen.lock().unwrap(), vec![ExecutorRef::Generic]);
    }

    #[test]
    fn main_submission_runs_with_main_token() {
        let executor = ConcurrentExecutor::new(RecordingService::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        executor
            .enqueue_main(recording_job(&seen, JobPriority::Default))
            .unwrap();

        assert_eq!(executor.service().run_all(), vec![Route::Main]);
        assert_eq!(*seen.lock().unwrap(), vec![ExecutorRef::Main]);
    }

    #[test]
    fn service_failure_is_propagated_unmodified() {
        let service = RecordingService::default();
        service.refuse.store(true, Ordering::SeqCst);
        let executor = ConcurrentExecutor::new(service);

        let err = executor
            .enqueue(JobRef::new(JobPriority::Default, |_| {}))
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Submit(SubmitError::Rejected(ref msg)) if msg == "pool exhausted"
        ));
    }

    #[test]
    fn works_through_a_shared_service() {
        let service = Arc::new(RecordingService::default());
        let executor = ConcurrentExecutor::new(service.clone());
        executor
            .enqueue(JobRef::new(JobPriority::Utility, |_| {}))
            .unwrap();

        assert_eq!(service.run_all(), vec![Route::Now(QosClass::Utility)]);
        assert_eq!(executor.name(), "concurrent");
    }
}
