//! # Error Handling Policy
//!
//! Decides whether processing continues after a record failure or stops the
//! remainder of the batch. Sources with order-dependent delivery default to
//! stopping: processing record N+1 after record N failed would break ordering
//! once the platform redelivers from the failure point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery guarantee of the source a batch came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrdering {
    /// Shard or partition ordered streams, FIFO queues
    Ordered,
    /// Standard queues
    Unordered,
}

impl SourceOrdering {
    pub fn is_ordered(self) -> bool {
        self == SourceOrdering::Ordered
    }
}

/// What the engine does once a record handler fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandlingPolicy {
    /// Attempt every record; report every failure
    ContinueOnFailure,
    /// Halt at the first failure; everything not yet attempted is reported
    /// as unprocessed
    StopOnFirstFailure,
}

impl ErrorHandlingPolicy {
    /// Default policy for a source with the given ordering guarantee
    pub fn for_ordering(ordering: SourceOrdering) -> Self {
        match ordering {
            SourceOrdering::Ordered => ErrorHandlingPolicy::StopOnFirstFailure,
            SourceOrdering::Unordered => ErrorHandlingPolicy::ContinueOnFailure,
        }
    }

    pub fn stops_on_failure(self) -> bool {
        self == ErrorHandlingPolicy::StopOnFirstFailure
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorHandlingPolicy::ContinueOnFailure => "continue_on_failure",
            ErrorHandlingPolicy::StopOnFirstFailure => "stop_on_first_failure",
        }
    }
}

impl fmt::Display for ErrorHandlingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the policy for one invocation is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PolicySelection {
    /// Pick the policy from the ordering guarantee of the event's source
    #[default]
    DeriveFromEvent,
    /// Always use the given policy
    Explicit(ErrorHandlingPolicy),
}

impl PolicySelection {
    pub fn resolve(self, ordering: SourceOrdering) -> ErrorHandlingPolicy {
        match self {
            PolicySelection::DeriveFromEvent => ErrorHandlingPolicy::for_ordering(ordering),
            PolicySelection::Explicit(policy) => policy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicySelection::DeriveFromEvent => "derive_from_event",
            PolicySelection::Explicit(policy) => policy.as_str(),
        }
    }
}

impl From<ErrorHandlingPolicy> for PolicySelection {
    fn from(policy: ErrorHandlingPolicy) -> Self {
        PolicySelection::Explicit(policy)
    }
}

impl FromStr for PolicySelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "derive_from_event" | "derive" => Ok(PolicySelection::DeriveFromEvent),
            "stop_on_first_failure" | "stop" => Ok(PolicySelection::Explicit(
                ErrorHandlingPolicy::StopOnFirstFailure,
            )),
            "continue_on_failure" | "continue" => Ok(PolicySelection::Explicit(
                ErrorHandlingPolicy::ContinueOnFailure,
            )),
            other => Err(format!("Unknown error handling policy: {other}")),
        }
    }
}

impl TryFrom<String> for PolicySelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PolicySelection> for String {
    fn from(selection: PolicySelection) -> Self {
        selection.as_str().to_string()
    }
}

impl fmt::Display for PolicySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
