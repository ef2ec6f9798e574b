use crate::config::BatchConfig;
use crate::processing::policy::{ErrorHandlingPolicy, PolicySelection, SourceOrdering};
use serde::{Deserialize, Serialize};

/// Configuration snapshot for one engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// How the error handling policy is chosen
    pub policy: PolicySelection,

    /// Dispatch records concurrently instead of strictly in order
    pub parallel_enabled: bool,

    /// Upper bound on records in flight in parallel mode. `None` lets every
    /// record of the batch run at once.
    pub max_degree_of_parallelism: Option<usize>,

    /// Raise an aggregate error when nothing succeeded under a
    /// stop-on-first-failure policy. When disabled, a result reporting every
    /// record as failed is returned instead.
    pub throw_on_full_batch_failure: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            policy: PolicySelection::DeriveFromEvent,
            parallel_enabled: false,
            max_degree_of_parallelism: None,
            throw_on_full_batch_failure: true,
        }
    }
}

impl ProcessingOptions {
    pub fn from_config(config: &BatchConfig) -> Self {
        Self {
            policy: config.error_handling_policy,
            parallel_enabled: config.parallel_enabled,
            max_degree_of_parallelism: config.max_degree_of_parallelism,
            throw_on_full_batch_failure: config.throw_on_full_batch_failure,
        }
    }

    pub fn with_policy(mut self, policy: impl Into<PolicySelection>) -> Self {
        self.policy = policy.into();
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel_enabled = enabled;
        self
    }

    pub fn with_max_degree_of_parallelism(mut self, max: usize) -> Self {
        self.max_degree_of_parallelism = Some(max.max(1));
        self
    }

    pub fn with_throw_on_full_batch_failure(mut self, enabled: bool) -> Self {
        self.throw_on_full_batch_failure = enabled;
        self
    }

    pub fn resolve_policy(&self, ordering: SourceOrdering) -> ErrorHandlingPolicy {
        self.policy.resolve(ordering)
    }

    /// Number of records that may be in flight at once for a batch of
    /// `batch_size` records. Always at least one.
    pub fn concurrency_for(&self, batch_size: usize) -> usize {
        if !self.parallel_enabled {
            return 1;
        }
        let limit = self.max_degree_of_parallelism.unwrap_or(batch_size);
        limit.min(batch_size).max(1)
    }
}
