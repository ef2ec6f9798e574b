//! # System Constants
//!
//! Environment variable names, defaults and structured log operation names
//! shared across the batch processing engine.

/// Prefix for every environment variable read by [`crate::config::BatchConfig`].
pub const ENV_PREFIX: &str = "BATCH";

/// Environment variables understood by the configuration loader
pub mod env_vars {
    pub const PARALLEL_ENABLED: &str = "BATCH_PARALLEL_ENABLED";
    pub const MAX_DEGREE_OF_PARALLELISM: &str = "BATCH_MAX_DEGREE_OF_PARALLELISM";
    pub const ERROR_HANDLING_POLICY: &str = "BATCH_ERROR_HANDLING_POLICY";
    pub const THROW_ON_FULL_BATCH_FAILURE: &str = "BATCH_THROW_ON_FULL_BATCH_FAILURE";

    // Deployment environment, used to pick the default log level
    pub const ENVIRONMENT: &str = "BATCH_ENV";
    pub const APP_ENVIRONMENT: &str = "APP_ENV";
}

pub mod defaults {
    pub const PARALLEL_ENABLED: bool = false;
    pub const THROW_ON_FULL_BATCH_FAILURE: bool = true;
    pub const ERROR_HANDLING_POLICY: &str = "derive_from_event";
    pub const ENVIRONMENT: &str = "development";
}

/// Event source identifiers as they appear in the `eventSource` field
pub mod event_sources {
    pub const SQS: &str = "aws:sqs";
    pub const KINESIS: &str = "aws:kinesis";
    pub const DYNAMODB: &str = "aws:dynamodb";

    /// Queue ARNs ending with this suffix deliver in order
    pub const FIFO_SUFFIX: &str = ".fifo";
}

/// Operation names used in structured log lines
pub mod operations {
    pub const BATCH_STARTED: &str = "batch.started";
    pub const BATCH_COMPLETED: &str = "batch.completed";
    pub const BATCH_ESCALATED: &str = "batch.escalated";
    pub const RECORD_FAILED: &str = "record.failed";
    pub const CIRCUIT_BROKEN: &str = "record.circuit_broken";
    pub const OBSERVER_FAILED: &str = "observer.failed";
}
