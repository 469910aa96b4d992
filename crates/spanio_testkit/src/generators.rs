//! Property-based test generators using proptest.
//!
//! Provides strategies for generating payload sequences and segment
//! quotas for span writer tests.

use proptest::prelude::*;

/// Strategy for a single payload of up to `max_len` bytes.
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for a sequence of payloads, each at most `max_len` bytes.
pub fn payload_sequence_strategy(
    max_len: usize,
    max_count: usize,
) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(max_len), 1..=max_count)
}

/// Strategy for a quota together with payloads that all fit in it.
pub fn fitting_payloads_strategy(
    max_quota: u64,
    max_count: usize,
) -> impl Strategy<Value = (u64, Vec<Vec<u8>>)> {
    (1..=max_quota).prop_flat_map(move |quota| {
        (
            Just(quota),
            payload_sequence_strategy(quota as usize, max_count),
        )
    })
}

/// Strategy for a quota together with payloads of any size up to twice the quota.
pub fn mixed_payloads_strategy(
    max_quota: u64,
    max_count: usize,
) -> impl Strategy<Value = (u64, Vec<Vec<u8>>)> {
    (1..=max_quota).prop_flat_map(move |quota| {
        (
            Just(quota),
            payload_sequence_strategy(quota as usize * 2, max_count),
        )
    })
}

/// Case and shrink budgets for the span writer property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Generated cases per property.
    pub cases: u32,
    /// Upper bound on shrinking steps after a failure.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// A small budget for properties that run in every test pass.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Builds the proptest runner configuration.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn fitting_payloads_fit(input in fitting_payloads_strategy(64, 16)) {
            let (quota, payloads) = input;
            prop_assert!(!payloads.is_empty());
            for payload in &payloads {
                prop_assert!(payload.len() as u64 <= quota);
            }
        }

        #[test]
        fn payloads_respect_length(payload in payload_strategy(8)) {
            prop_assert!(payload.len() <= 8);
        }
    }
}
