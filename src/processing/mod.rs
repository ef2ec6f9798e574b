//! # Batch Processing
//!
//! The engine and everything a caller plugs into it: record handlers, the
//! error handling policy, per-invocation options, observers and the result
//! types handed back to the platform.

pub(crate) mod aggregator;
pub mod cancellation;
pub mod engine;
pub mod errors;
pub mod handler;
pub mod hooks;
pub mod options;
pub mod outcome;
pub(crate) mod parallel;
pub mod policy;
pub mod result;

pub use cancellation::CancellationSignal;
pub use engine::BatchProcessor;
pub use errors::{AggregateProcessingError, FailureKind, HandlerError, RecordError};
pub use handler::{
    handler_fn, DeserializingHandler, HandlerFn, RecordContext, RecordHandler,
    RecordHandlerResult, TypedRecordHandler,
};
pub use hooks::{CompletionObserver, FailureObserver};
pub use options::ProcessingOptions;
pub use outcome::{RecordFailure, RecordOutcome, RecordSuccess};
pub use policy::{ErrorHandlingPolicy, PolicySelection, SourceOrdering};
pub use result::{BatchItemFailure, BatchSummary, PartialFailureResponse, ProcessingResult};
