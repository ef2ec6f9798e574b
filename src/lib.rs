#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Core
//!
//! Batch record-processing engine for serverless functions invoked with a
//! batch of queue or stream records.
//!
//! ## Overview
//!
//! The engine runs a user-supplied handler once per record, isolates
//! per-record failures and reports back exactly which records must be
//! redelivered, in the partial batch failure format the platform understands.
//! Sources that guarantee ordering (FIFO queues, streams) stop at the first
//! failure so that redelivery preserves order.
//!
//! ## Module Organization
//!
//! - [`models`] - Serde shapes of queue, stream and table change events
//! - [`extractor`] - Turns an event into ordered `(record id, record)` pairs
//! - [`processing`] - The engine, handlers, policies and results
//! - [`config`] - Environment driven configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured JSON logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_core::extractor::SqsExtractor;
//! use batch_core::models::{SqsEvent, SqsMessage};
//! use batch_core::processing::{handler_fn, RecordContext, RecordHandlerResult};
//! use batch_core::{BatchConfig, BatchProcessor};
//! use std::sync::Arc;
//!
//! # async fn example(event: SqsEvent) -> Result<(), Box<dyn std::error::Error>> {
//! batch_core::logging::init_structured_logging();
//!
//! let config = BatchConfig::from_env()?;
//! let processor = BatchProcessor::from_config(SqsExtractor, &config);
//!
//! let handler = Arc::new(handler_fn(|message: SqsMessage, _ctx: RecordContext| async move {
//!     if message.body.is_empty() {
//!         anyhow::bail!("empty message body");
//!     }
//!     Ok(RecordHandlerResult::none())
//! }));
//!
//! let response = processor.process_to_response(&event, &handler).await?;
//! println!("{}", serde_json::to_string(&response)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod models;
pub mod processing;

pub use config::BatchConfig;
pub use error::{BatchError, Result};
pub use extractor::{BatchRecord, RecordExtractor};
pub use processing::{
    AggregateProcessingError, BatchProcessor, ErrorHandlingPolicy, PartialFailureResponse,
    ProcessingOptions, ProcessingResult, RecordContext, RecordError, RecordHandler,
    RecordHandlerResult,
};
