//! # Observation Hooks
//!
//! Side-effect-only callbacks around an engine invocation. Errors and panics
//! raised by an observer are logged and discarded; they never change an
//! outcome or the control flow of the engine.

use crate::logging;
use crate::processing::errors::{HandlerError, RecordError};
use crate::processing::result::ProcessingResult;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

/// Called once for every record whose handler failed
pub trait FailureObserver<R>: Send + Sync {
    fn on_record_failure(&self, record: &R, error: &RecordError) -> Result<(), HandlerError>;
}

impl<R, F> FailureObserver<R> for F
where
    F: Fn(&R, &RecordError) -> Result<(), HandlerError> + Send + Sync,
{
    fn on_record_failure(&self, record: &R, error: &RecordError) -> Result<(), HandlerError> {
        self(record, error)
    }
}

/// Called once when an invocation produces a result
pub trait CompletionObserver<R>: Send + Sync {
    fn on_batch_completed(&self, result: &ProcessingResult<R>) -> Result<(), HandlerError>;
}

impl<R, F> CompletionObserver<R> for F
where
    F: Fn(&ProcessingResult<R>) -> Result<(), HandlerError> + Send + Sync,
{
    fn on_batch_completed(&self, result: &ProcessingResult<R>) -> Result<(), HandlerError> {
        self(result)
    }
}

pub(crate) fn notify_failure<R>(
    observer: Option<&dyn FailureObserver<R>>,
    record: &R,
    error: &RecordError,
) {
    let Some(observer) = observer else {
        return;
    };
    let outcome = catch_unwind(AssertUnwindSafe(|| observer.on_record_failure(record, error)));
    report("failure_observer", error.record_id(), outcome);
}

pub(crate) fn notify_completion<R>(
    observer: Option<&dyn CompletionObserver<R>>,
    result: &ProcessingResult<R>,
) {
    let Some(observer) = observer else {
        return;
    };
    let outcome = catch_unwind(AssertUnwindSafe(|| observer.on_batch_completed(result)));
    report("completion_observer", "batch", outcome);
}

fn report(
    component: &str,
    subject: &str,
    outcome: std::thread::Result<Result<(), HandlerError>>,
) {
    match outcome {
        Ok(Ok(())) => debug!(component = component, subject = subject, "observer notified"),
        Ok(Err(error)) => logging::log_observer_failure(component, subject, &error.to_string()),
        Err(_) => logging::log_observer_failure(component, subject, "observer panicked"),
    }
}
