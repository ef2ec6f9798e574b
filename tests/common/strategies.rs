use proptest::prelude::*;

/// Strategy for generating per-record failure flags, in batch order
pub fn failure_pattern_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.3), 0..24)
}

/// Strategy for generating failure flags together with handler latencies
pub fn timed_failure_pattern_strategy() -> impl Strategy<Value = Vec<(bool, u64)>> {
    prop::collection::vec((prop::bool::weighted(0.3), 0u64..4), 0..16)
}

/// Strategy for generating a bounded degree of parallelism
pub fn parallelism_strategy() -> impl Strategy<Value = usize> {
    1usize..8
}

/// Strategy for generating policy names as they appear in configuration
pub fn policy_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("derive_from_event".to_string()),
        Just("stop_on_first_failure".to_string()),
        Just("continue_on_failure".to_string()),
        Just("Stop-On-First-Failure".to_string()),
        Just("CONTINUE".to_string()),
    ]
}
