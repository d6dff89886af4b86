// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::time::Duration;

use super::{
    evaluate_with_backoff, RetryContext, RetryInfo, RetryPolicy, RetryState,
    DEFAULT_CLIENT_BACKOFF, DEFAULT_CLIENT_RETRY_COUNT, DEFAULT_MAX_BACKOFF, DEFAULT_MIN_BACKOFF,
};
use crate::operation::OperationContext;

/// Waits the same delta before every retry, clamped to
/// `[min_backoff, max_backoff]` (3s and 90s by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearRetry {
    delta_backoff: Duration,
    maximum_attempts: u32,
    min_backoff: Duration,
    max_backoff: Duration,
}

impl Default for LinearRetry {
    fn default() -> Self {
        Self {
            delta_backoff: DEFAULT_CLIENT_BACKOFF,
            maximum_attempts: DEFAULT_CLIENT_RETRY_COUNT,
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl LinearRetry {
    /// Create with the given delta and maximum number of retries.
    pub fn new(delta_backoff: Duration, maximum_attempts: u32) -> Self {
        Self {
            delta_backoff,
            maximum_attempts,
            ..Self::default()
        }
    }

    /// Set the shortest allowed wait.
    pub fn with_min_backoff(mut self, min_backoff: Duration) -> Self {
        self.min_backoff = min_backoff;
        self
    }

    /// Set the longest allowed wait.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// The delta backoff.
    pub fn delta_backoff(&self) -> Duration {
        self.delta_backoff
    }

    /// Maximum number of retries.
    pub fn maximum_attempts(&self) -> u32 {
        self.maximum_attempts
    }

    /// The shortest allowed wait.
    pub fn min_backoff(&self) -> Duration {
        self.min_backoff
    }

    /// The longest allowed wait.
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Raw interval before any retry.
    pub fn backoff(&self) -> Duration {
        // The cap wins over the floor when they cross.
        self.delta_backoff
            .max(self.min_backoff)
            .min(self.max_backoff)
    }
}

impl RetryPolicy for LinearRetry {
    fn evaluate(
        &self,
        state: &mut RetryState,
        ctx: &RetryContext<'_>,
        op: &OperationContext,
    ) -> Option<RetryInfo> {
        evaluate_with_backoff(state, ctx, op, self.maximum_attempts, |_| self.backoff())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationMode, StorageLocation};
    use crate::operation::RequestResult;
    use test_case::test_case;

    #[test_case(Duration::from_millis(10) => Duration::from_secs(3))]
    #[test_case(Duration::from_secs(30) => Duration::from_secs(30))]
    #[test_case(Duration::from_secs(600) => Duration::from_secs(90))]
    fn test_backoff_is_clamped(delta: Duration) -> Duration {
        LinearRetry::new(delta, 3).backoff()
    }

    #[test_case(Duration::from_millis(10) => Duration::from_millis(500); "raised to floor")]
    #[test_case(Duration::from_secs(30) => Duration::from_secs(10); "capped")]
    #[test_case(Duration::from_secs(2) => Duration::from_secs(2); "within bounds")]
    fn test_backoff_custom_bounds(delta: Duration) -> Duration {
        LinearRetry::new(delta, 3)
            .with_min_backoff(Duration::from_millis(500))
            .with_max_backoff(Duration::from_secs(10))
            .backoff()
    }

    #[test]
    fn test_crossed_bounds_use_the_cap() {
        let policy = LinearRetry::default()
            .with_min_backoff(Duration::from_secs(20))
            .with_max_backoff(Duration::from_secs(5));
        assert_eq!(policy.backoff(), Duration::from_secs(5));
    }

    #[test_case(400)]
    #[test_case(403)]
    #[test_case(404)]
    #[test_case(409)]
    #[test_case(412)]
    #[test_case(501)]
    #[test_case(505)]
    #[test_case(306)]
    fn test_fast_fail_statuses(status: u16) {
        let policy = LinearRetry::default();
        let mut state = RetryState::new();
        let last = RequestResult::new(StorageLocation::Primary).with_status(status);
        let ctx = RetryContext::new(0, &last, StorageLocation::Primary, LocationMode::PrimaryOnly);
        assert_eq!(policy.evaluate(&mut state, &ctx, &OperationContext::new()), None);
    }

    #[test]
    fn test_network_failure_is_retried() {
        let policy = LinearRetry::default();
        let mut state = RetryState::new();
        let last = RequestResult::new(StorageLocation::Primary);
        let ctx = RetryContext::new(0, &last, StorageLocation::Primary, LocationMode::PrimaryOnly);
        let info = policy.evaluate(&mut state, &ctx, &OperationContext::new());
        assert!(info.is_some());
        assert!(state.last_attempt(StorageLocation::Primary).is_some());
    }

    #[test]
    fn test_secondary_not_found_redirects_to_primary() {
        let policy = LinearRetry::default();
        let mut state = RetryState::new();
        let last = RequestResult::new(StorageLocation::Secondary).with_status(404);
        let ctx = RetryContext::new(
            0,
            &last,
            StorageLocation::Primary,
            LocationMode::SecondaryThenPrimary,
        );

        let info = policy
            .evaluate(&mut state, &ctx, &OperationContext::new())
            .unwrap();
        assert_eq!(info.target_location(), StorageLocation::Primary);
        assert_eq!(info.updated_location_mode(), LocationMode::PrimaryOnly);
        // The primary was never attempted in this operation.
        assert_eq!(info.retry_interval(), Duration::ZERO);
    }

    #[test]
    fn test_secondary_not_found_is_retried_even_in_secondary_only_mode() {
        let policy = LinearRetry::default();
        let mut state = RetryState::new();
        let last = RequestResult::new(StorageLocation::Secondary).with_status(404);
        let ctx = RetryContext::new(
            0,
            &last,
            StorageLocation::Secondary,
            LocationMode::SecondaryOnly,
        );

        let info = policy
            .evaluate(&mut state, &ctx, &OperationContext::new())
            .unwrap();
        assert_eq!(info.target_location(), StorageLocation::Secondary);
        assert_eq!(info.updated_location_mode(), LocationMode::SecondaryOnly);
    }

    #[test]
    fn test_policies_do_not_share_state_between_operations() {
        let policy = LinearRetry::default();
        let last = RequestResult::new(StorageLocation::Primary).with_status(500);
        let ctx = RetryContext::new(0, &last, StorageLocation::Primary, LocationMode::PrimaryOnly);

        let mut first = RetryState::new();
        policy.evaluate(&mut first, &ctx, &OperationContext::new());
        let second = RetryState::new();
        assert!(first.last_attempt(StorageLocation::Primary).is_some());
        assert!(second.last_attempt(StorageLocation::Primary).is_none());
    }
}
