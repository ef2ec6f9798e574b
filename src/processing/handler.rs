//! # Record Handlers
//!
//! The extension point of the engine. A [`RecordHandler`] attempts to process
//! a single record and either completes, optionally returning auxiliary data,
//! or fails with a [`HandlerError`].
//!
//! ```rust
//! use batch_core::processing::{handler_fn, RecordContext, RecordHandlerResult};
//! use batch_core::models::SqsMessage;
//!
//! let handler = handler_fn(|message: SqsMessage, _ctx: RecordContext| async move {
//!     if message.body.is_empty() {
//!         anyhow::bail!("empty body");
//!     }
//!     Ok(RecordHandlerResult::none())
//! });
//! # let _ = handler;
//! ```

use crate::models::RecordBody;
use crate::processing::cancellation::CancellationSignal;
use crate::processing::errors::HandlerError;
use crate::processing::policy::ErrorHandlingPolicy;
use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Value a handler returns for a successfully processed record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordHandlerResult {
    /// Auxiliary data exposed on the success outcome
    pub data: Option<serde_json::Value>,
}

impl RecordHandlerResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_data(data: serde_json::Value) -> Self {
        Self { data: Some(data) }
    }
}

/// Per-record information passed to the handler
#[derive(Debug, Clone)]
pub struct RecordContext {
    /// Identifier of the record within the batch
    pub record_id: String,

    /// Zero-based position in delivery order
    pub position: usize,

    /// Number of records in the batch
    pub batch_size: usize,

    /// Policy in effect for this invocation
    pub policy: ErrorHandlingPolicy,

    cancellation: CancellationSignal,
}

impl RecordContext {
    pub fn new(
        record_id: impl Into<String>,
        position: usize,
        batch_size: usize,
        policy: ErrorHandlingPolicy,
    ) -> Self {
        Self::with_signal(
            record_id,
            position,
            batch_size,
            policy,
            CancellationSignal::new(),
        )
    }

    pub(crate) fn with_signal(
        record_id: impl Into<String>,
        position: usize,
        batch_size: usize,
        policy: ErrorHandlingPolicy,
        cancellation: CancellationSignal,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            position,
            batch_size,
            policy,
            cancellation,
        }
    }

    /// `true` once an earlier failure stopped the batch.
    ///
    /// Only meaningful in parallel mode; sequential processing never starts a
    /// record after the breaker tripped.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }
}

/// Processing logic for a single record
#[async_trait::async_trait]
pub trait RecordHandler<R>: Send + Sync
where
    R: Send + Sync,
{
    async fn handle(
        &self,
        record: &R,
        context: &RecordContext,
    ) -> Result<RecordHandlerResult, HandlerError>;
}

#[async_trait::async_trait]
impl<R, H> RecordHandler<R> for Arc<H>
where
    R: Send + Sync,
    H: RecordHandler<R> + ?Sized,
{
    async fn handle(
        &self,
        record: &R,
        context: &RecordContext,
    ) -> Result<RecordHandlerResult, HandlerError> {
        (**self).handle(record, context).await
    }
}

/// Adapter turning an async closure into a [`RecordHandler`].
///
/// The closure receives an owned copy of the record.
pub struct HandlerFn<F> {
    f: F,
}

pub fn handler_fn<R, F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(R, RecordContext) -> Fut,
    Fut: Future<Output = Result<RecordHandlerResult, HandlerError>>,
{
    HandlerFn { f }
}

#[async_trait::async_trait]
impl<R, F, Fut> RecordHandler<R> for HandlerFn<F>
where
    R: Clone + Send + Sync,
    F: Fn(R, RecordContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RecordHandlerResult, HandlerError>> + Send + 'static,
{
    async fn handle(
        &self,
        record: &R,
        context: &RecordContext,
    ) -> Result<RecordHandlerResult, HandlerError> {
        (self.f)(record.clone(), context.clone()).await
    }
}

/// Handler operating on the deserialized body of a record
#[async_trait::async_trait]
pub trait TypedRecordHandler<T>: Send + Sync
where
    T: Send + 'static,
{
    async fn handle(
        &self,
        payload: T,
        context: &RecordContext,
    ) -> Result<RecordHandlerResult, HandlerError>;
}

/// Decodes each record's body into `T` before calling a [`TypedRecordHandler`].
///
/// A body that fails to decode is reported as a handler failure for that
/// record.
pub struct DeserializingHandler<H, T> {
    inner: H,
    _payload: PhantomData<fn() -> T>,
}

impl<H, T> DeserializingHandler<H, T> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _payload: PhantomData,
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<R, H, T> RecordHandler<R> for DeserializingHandler<H, T>
where
    R: RecordBody + Send + Sync,
    H: TypedRecordHandler<T>,
    T: DeserializeOwned + Send + 'static,
{
    async fn handle(
        &self,
        record: &R,
        context: &RecordContext,
    ) -> Result<RecordHandlerResult, HandlerError> {
        let payload: T = record.deserialize_body().with_context(|| {
            format!("failed to deserialize body of record {}", context.record_id)
        })?;
        self.inner.handle(payload, context).await
    }
}
