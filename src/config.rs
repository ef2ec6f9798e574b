//! # Batch Configuration
//!
//! Process-level settings read once at cold start from `BATCH_*` environment
//! variables and layered over built-in defaults.

use crate::constants::{defaults, ENV_PREFIX};
use crate::error::{BatchError, Result};
use crate::processing::policy::PolicySelection;
use ::config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// `BATCH_PARALLEL_ENABLED`
    pub parallel_enabled: bool,
    /// `BATCH_MAX_DEGREE_OF_PARALLELISM`, unset for no limit
    pub max_degree_of_parallelism: Option<usize>,
    /// `BATCH_ERROR_HANDLING_POLICY`
    pub error_handling_policy: PolicySelection,
    /// `BATCH_THROW_ON_FULL_BATCH_FAILURE`
    pub throw_on_full_batch_failure: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel_enabled: defaults::PARALLEL_ENABLED,
            max_degree_of_parallelism: None,
            error_handling_policy: PolicySelection::DeriveFromEvent,
            throw_on_full_batch_failure: defaults::THROW_ON_FULL_BATCH_FAILURE,
        }
    }
}

impl BatchConfig {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(Self::environment())
    }

    /// Loads configuration from an explicit set of variables instead of the
    /// process environment
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Self::environment().source(Some(vars)))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX).try_parsing(true)
    }

    fn load(environment: Environment) -> Result<Self> {
        let config: BatchConfig = Config::builder()
            .set_default("parallel_enabled", defaults::PARALLEL_ENABLED)?
            .set_default(
                "throw_on_full_batch_failure",
                defaults::THROW_ON_FULL_BATCH_FAILURE,
            )?
            .set_default("error_handling_policy", defaults::ERROR_HANDLING_POLICY)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(config = ?config, "batch configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_degree_of_parallelism == Some(0) {
            return Err(BatchError::ConfigurationError(
                "max_degree_of_parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
