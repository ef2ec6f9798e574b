//! # Parallel Dispatch
//!
//! Spawns one runtime task per record, with at most `concurrency` of them
//! holding a permit at any time. Handlers that block or burn CPU therefore
//! occupy separate worker threads instead of serializing on the invoking
//! task. Outcomes land in a shared outcome table keyed by batch position, so
//! the final response keeps batch order whatever the completion order was.
//!
//! Under a stop policy the first failure to trip the breaker is reported as
//! circuit broken. Records that had not been dispatched by then never start
//! and stay unprocessed; records already in flight run to completion and keep
//! their own outcome.

use crate::extractor::BatchRecord;
use crate::logging;
use crate::processing::aggregator::OutcomeTable;
use crate::processing::cancellation::CancellationSignal;
use crate::processing::engine::invoke_handler;
use crate::processing::errors::RecordError;
use crate::processing::handler::{RecordContext, RecordHandler};
use crate::processing::hooks::{self, FailureObserver};
use crate::processing::policy::ErrorHandlingPolicy;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, Instrument};

pub(crate) async fn run<R, H>(
    records: Arc<Vec<BatchRecord<R>>>,
    handler: Arc<H>,
    policy: ErrorHandlingPolicy,
    concurrency: usize,
    observer: Option<Arc<dyn FailureObserver<R>>>,
) -> OutcomeTable
where
    R: Send + Sync + 'static,
    H: RecordHandler<R> + ?Sized + 'static,
{
    let batch_size = records.len();
    let table = Arc::new(Mutex::new(OutcomeTable::new(batch_size)));
    let signal = CancellationSignal::new();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut workers = JoinSet::new();

    debug!(batch_size, concurrency, "dispatching records in parallel");

    for position in 0..batch_size {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        // Checked after the permit: a slot frees up only once its record
        // finished, so a failure that trips the breaker is visible here
        if policy.stops_on_failure() && signal.is_cancelled() {
            debug!(
                record_id = %records[position].record_id,
                position,
                not_dispatched = batch_size - position,
                "batch already stopped"
            );
            break;
        }

        let records = Arc::clone(&records);
        let handler = Arc::clone(&handler);
        let table = Arc::clone(&table);
        let signal = signal.clone();
        let observer = observer.clone();

        workers.spawn(
            async move {
                let _permit = permit;
                let batch_record = &records[position];
                let context = RecordContext::with_signal(
                    batch_record.record_id.as_str(),
                    position,
                    batch_size,
                    policy,
                    signal.clone(),
                );

                match invoke_handler(handler.as_ref(), &batch_record.record, &context).await {
                    Ok(result) => table.lock().record_success(position, result.data),
                    Err(error) => {
                        let error =
                            RecordError::handler_failed(batch_record.record_id.as_str(), error);
                        logging::log_record_failure(&error, position);
                        hooks::notify_failure(observer.as_deref(), &batch_record.record, &error);

                        let mut table = table.lock();
                        table.record_failure(position, error);
                        if policy.stops_on_failure() && signal.cancel() {
                            table.mark_circuit_broken(position);
                            logging::log_circuit_broken(&batch_record.record_id, position, None);
                        }
                    }
                }
            }
            .in_current_span(),
        );
    }

    while let Some(joined) = workers.join_next().await {
        // Handler panics are caught in invoke_handler; the slot of a worker
        // lost here stays unprocessed
        if let Err(join_error) = joined {
            error!(error = %join_error, "record worker task failed");
        }
    }

    let mut table = table.lock();
    std::mem::take(&mut *table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::errors::{FailureKind, HandlerError};
    use crate::processing::handler::RecordHandlerResult;
    use crate::processing::policy::ErrorHandlingPolicy::{ContinueOnFailure, StopOnFirstFailure};
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Record payload: (delay in ms, fails)
    type Job = (u64, bool);

    fn records(jobs: &[Job]) -> Arc<Vec<BatchRecord<Job>>> {
        Arc::new(
            jobs.iter()
                .enumerate()
                .map(|(i, job)| BatchRecord::new(format!("r{i}"), *job))
                .collect(),
        )
    }

    struct SleepyHandler {
        started: AtomicUsize,
        peak: AtomicUsize,
        in_flight: AtomicUsize,
    }

    impl SleepyHandler {
        fn new() -> Self {
            Self {
                started: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl RecordHandler<Job> for SleepyHandler {
        async fn handle(
            &self,
            record: &Job,
            _context: &RecordContext,
        ) -> Result<RecordHandlerResult, HandlerError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(record.0)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if record.1 {
                bail!("failed after {}ms", record.0);
            }
            Ok(RecordHandlerResult::none())
        }
    }

    fn kinds(
        table: OutcomeTable,
        batch: &[BatchRecord<Job>],
        policy: ErrorHandlingPolicy,
    ) -> Vec<Option<FailureKind>> {
        let result = table.into_result(batch.to_vec(), policy);
        let mut kinds = vec![None; result.batch_size()];
        for failure in result.failures() {
            kinds[failure.position] = Some(failure.kind());
        }
        kinds
    }

    #[tokio::test]
    async fn test_continue_dispatches_everything_with_bounded_concurrency() {
        let batch = records(&[(30, false), (5, true), (10, false), (1, true), (20, false)]);
        let handler = Arc::new(SleepyHandler::new());

        let table = run(batch.clone(), handler.clone(), ContinueOnFailure, 2, None).await;

        assert_eq!(handler.started.load(Ordering::SeqCst), 5);
        assert!(handler.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(
            kinds(table, &batch, ContinueOnFailure),
            vec![
                None,
                Some(FailureKind::HandlerFailed),
                None,
                Some(FailureKind::HandlerFailed),
                None
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_leaves_undispatched_records_unprocessed() {
        // With two slots, r0 and r1 start together. r1 fails quickly while
        // r0 is still running; r2 and r3 are never started.
        let batch = records(&[(50, false), (5, true), (1, false), (1, false)]);
        let handler = Arc::new(SleepyHandler::new());

        let table = run(batch.clone(), handler.clone(), StopOnFirstFailure, 2, None).await;

        assert_eq!(handler.started.load(Ordering::SeqCst), 2);
        assert_eq!(
            kinds(table, &batch, StopOnFirstFailure),
            vec![
                None,
                Some(FailureKind::CircuitBroken),
                Some(FailureKind::Unprocessed),
                Some(FailureKind::Unprocessed)
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_keeps_in_flight_failures_as_handler_failed() {
        // r1 trips the breaker; r0 fails later while in flight and keeps its
        // own handler failure.
        let batch = records(&[(40, true), (5, true), (1, false)]);
        let handler = Arc::new(SleepyHandler::new());

        let table = run(batch.clone(), handler.clone(), StopOnFirstFailure, 2, None).await;

        assert_eq!(table.success_count(), 0);
        assert_eq!(
            kinds(table, &batch, StopOnFirstFailure),
            vec![
                Some(FailureKind::HandlerFailed),
                Some(FailureKind::CircuitBroken),
                Some(FailureKind::Unprocessed)
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let handler = Arc::new(SleepyHandler::new());
        let table = run(records(&[]), handler, StopOnFirstFailure, 4, None).await;
        assert!(table.is_empty());
    }

    struct BlockingHandler;

    #[async_trait::async_trait]
    impl RecordHandler<Job> for BlockingHandler {
        async fn handle(
            &self,
            record: &Job,
            _context: &RecordContext,
        ) -> Result<RecordHandlerResult, HandlerError> {
            std::thread::sleep(Duration::from_millis(record.0));
            Ok(RecordHandlerResult::none())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_blocking_handlers_run_on_separate_workers() {
        let batch = records(&[(100, false); 4]);

        let started = std::time::Instant::now();
        let table = run(batch, Arc::new(BlockingHandler), ContinueOnFailure, 4, None).await;
        let elapsed = started.elapsed();

        assert_eq!(table.success_count(), 4);
        assert!(
            elapsed < Duration::from_millis(300),
            "4 x 100ms blocking handlers at degree 4 took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_failure_observer_is_notified_from_workers() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let observer: Arc<dyn FailureObserver<Job>> = Arc::new(
            move |_: &Job, _: &RecordError| -> Result<(), HandlerError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );
        let batch = records(&[(1, true), (1, false), (1, true)]);

        let table = run(
            batch,
            Arc::new(SleepyHandler::new()),
            ContinueOnFailure,
            3,
            Some(observer),
        )
        .await;

        assert_eq!(table.success_count(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
