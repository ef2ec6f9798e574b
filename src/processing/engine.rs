//! # Batch Processing Engine
//!
//! Runs a [`RecordHandler`] over every record of a batch event and reduces the
//! outcomes to a [`ProcessingResult`].
//!
//! Every record starts out unprocessed. Records are attempted in delivery
//! order (or concurrently, see [`parallel`](super::parallel)); a success or
//! failure replaces the record's slot. Under
//! [`ErrorHandlingPolicy::StopOnFirstFailure`] the first failure trips the
//! breaker: that record is reported as circuit broken and the remaining ones
//! stay unprocessed so the platform redelivers them in order.
//!
//! When nothing succeeded under a stop policy the engine returns
//! [`BatchError::ProcessingError`] instead of a result, signalling that the
//! whole batch must be retried.

use crate::config::BatchConfig;
use crate::constants::operations;
use crate::error::{BatchError, Result};
use crate::extractor::{BatchRecord, RecordExtractor};
use crate::logging;
use crate::processing::aggregator::OutcomeTable;
use crate::processing::cancellation::CancellationSignal;
use crate::processing::errors::{HandlerError, RecordError};
use crate::processing::handler::{RecordContext, RecordHandler, RecordHandlerResult};
use crate::processing::hooks::{self, CompletionObserver, FailureObserver};
use crate::processing::options::ProcessingOptions;
use crate::processing::parallel;
use crate::processing::policy::ErrorHandlingPolicy;
use crate::processing::result::{PartialFailureResponse, ProcessingResult};
use anyhow::anyhow;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct BatchProcessor<X: RecordExtractor> {
    extractor: X,
    options: ProcessingOptions,
    failure_observer: Option<Arc<dyn FailureObserver<X::Record>>>,
    completion_observer: Option<Arc<dyn CompletionObserver<X::Record>>>,
}

impl<X: RecordExtractor> BatchProcessor<X> {
    pub fn new(extractor: X) -> Self {
        Self {
            extractor,
            options: ProcessingOptions::default(),
            failure_observer: None,
            completion_observer: None,
        }
    }

    pub fn from_config(extractor: X, config: &BatchConfig) -> Self {
        Self::new(extractor).with_options(ProcessingOptions::from_config(config))
    }

    /// Options used by [`process`](Self::process)
    pub fn with_options(mut self, options: ProcessingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_failure_observer<O>(mut self, observer: O) -> Self
    where
        O: FailureObserver<X::Record> + 'static,
    {
        self.failure_observer = Some(Arc::new(observer));
        self
    }

    pub fn with_completion_observer<O>(mut self, observer: O) -> Self
    where
        O: CompletionObserver<X::Record> + 'static,
    {
        self.completion_observer = Some(Arc::new(observer));
        self
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    /// Processes the batch with the configured options.
    ///
    /// The handler is shared with the worker tasks spawned in parallel mode.
    pub async fn process<H>(
        &self,
        event: &X::Event,
        handler: &Arc<H>,
    ) -> Result<ProcessingResult<X::Record>>
    where
        H: RecordHandler<X::Record> + ?Sized + 'static,
    {
        self.process_with_options(event, handler, &self.options).await
    }

    /// Processes the batch and returns only the partial failure response
    pub async fn process_to_response<H>(
        &self,
        event: &X::Event,
        handler: &Arc<H>,
    ) -> Result<PartialFailureResponse>
    where
        H: RecordHandler<X::Record> + ?Sized + 'static,
    {
        Ok(self.process(event, handler).await?.into_response())
    }

    #[instrument(skip_all, fields(source = self.extractor.source_name(), parallel = options.parallel_enabled))]
    pub async fn process_with_options<H>(
        &self,
        event: &X::Event,
        handler: &Arc<H>,
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult<X::Record>>
    where
        H: RecordHandler<X::Record> + ?Sized + 'static,
    {
        let records = self.extractor.extract(event)?;
        let policy = options.resolve_policy(self.extractor.ordering(event));
        let concurrency = options.concurrency_for(records.len());

        logging::log_batch_operation(
            operations::BATCH_STARTED,
            self.extractor.source_name(),
            records.len(),
            policy,
            "started",
            None,
        );

        let (records, table) = if options.parallel_enabled {
            let records = Arc::new(records);
            let table = parallel::run(
                Arc::clone(&records),
                Arc::clone(handler),
                policy,
                concurrency,
                self.failure_observer.clone(),
            )
            .await;
            // Every worker has been joined, so this is the only reference left
            let records = Arc::try_unwrap(records).unwrap_or_else(|shared| shared.as_ref().clone());
            (records, table)
        } else {
            let table = self.run_sequential(&records, handler.as_ref(), policy).await;
            (records, table)
        };

        self.finalize(records, table, policy, options)
    }

    async fn run_sequential<H>(
        &self,
        records: &[BatchRecord<X::Record>],
        handler: &H,
        policy: ErrorHandlingPolicy,
    ) -> OutcomeTable
    where
        H: RecordHandler<X::Record> + ?Sized,
    {
        let mut table = OutcomeTable::new(records.len());
        let signal = CancellationSignal::new();

        for (position, batch_record) in records.iter().enumerate() {
            let context = RecordContext::with_signal(
                batch_record.record_id.as_str(),
                position,
                records.len(),
                policy,
                signal.clone(),
            );

            match invoke_handler(handler, &batch_record.record, &context).await {
                Ok(result) => {
                    debug!(record_id = %batch_record.record_id, position, "record processed");
                    table.record_success(position, result.data);
                }
                Err(error) => {
                    let error = RecordError::handler_failed(batch_record.record_id.as_str(), error);
                    logging::log_record_failure(&error, position);
                    hooks::notify_failure(
                        self.failure_observer.as_deref(),
                        &batch_record.record,
                        &error,
                    );
                    table.record_failure(position, error);

                    if policy.stops_on_failure() {
                        signal.cancel();
                        table.mark_circuit_broken(position);
                        logging::log_circuit_broken(
                            &batch_record.record_id,
                            position,
                            Some(records.len() - position - 1),
                        );
                        break;
                    }
                }
            }
        }

        table
    }

    fn finalize(
        &self,
        records: Vec<BatchRecord<X::Record>>,
        table: OutcomeTable,
        policy: ErrorHandlingPolicy,
        options: &ProcessingOptions,
    ) -> Result<ProcessingResult<X::Record>> {
        let source = self.extractor.source_name();

        if !table.is_empty()
            && table.success_count() == 0
            && policy.stops_on_failure()
            && options.throw_on_full_batch_failure
        {
            let aggregate = table.into_aggregate_error(&records);
            logging::log_batch_escalated(source, &aggregate);
            return Err(BatchError::ProcessingError(aggregate));
        }

        let result = table.into_result(records, policy);
        logging::log_batch_completed(source, policy, &result.summary());
        hooks::notify_completion(self.completion_observer.as_deref(), &result);
        Ok(result)
    }
}

/// Invokes the handler, converting a panic into a handler error
pub(crate) async fn invoke_handler<R, H>(
    handler: &H,
    record: &R,
    context: &RecordContext,
) -> std::result::Result<RecordHandlerResult, HandlerError>
where
    R: Send + Sync,
    H: RecordHandler<R> + ?Sized,
{
    match AssertUnwindSafe(handler.handle(record, context))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic) => Err(anyhow!(
            "record handler panicked: {}",
            panic_message(panic.as_ref())
        )),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
