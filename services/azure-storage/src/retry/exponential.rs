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

use rand::Rng;

use super::{
    evaluate_with_backoff, RetryContext, RetryInfo, RetryPolicy, RetryState,
    DEFAULT_CLIENT_BACKOFF, DEFAULT_CLIENT_RETRY_COUNT, DEFAULT_MAX_BACKOFF, DEFAULT_MIN_BACKOFF,
};
use crate::operation::OperationContext;

// 2^20 deltas already exceed any sane maximum backoff.
const MAX_EXPONENT: u32 = 20;

/// Backs off exponentially with jitter between retries.
///
/// The wait before retry `n` (starting from zero) is
/// `min(min_backoff + (2^n - 1) * delta * U[0.8, 1.2), max_backoff)`,
/// with the bounds defaulting to 3s and 90s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialRetry {
    delta_backoff: Duration,
    maximum_attempts: u32,
    min_backoff: Duration,
    max_backoff: Duration,
}

impl Default for ExponentialRetry {
    fn default() -> Self {
        Self {
            delta_backoff: DEFAULT_CLIENT_BACKOFF,
            maximum_attempts: DEFAULT_CLIENT_RETRY_COUNT,
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl ExponentialRetry {
    /// Create with the given delta and maximum number of retries.
    pub fn new(delta_backoff: Duration, maximum_attempts: u32) -> Self {
        Self {
            delta_backoff,
            maximum_attempts,
            ..Self::default()
        }
    }

    /// Set the wait before the first retry.
    pub fn with_min_backoff(mut self, min_backoff: Duration) -> Self {
        self.min_backoff = min_backoff;
        self
    }

    /// Set the cap on any single wait.
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

    /// The wait before the first retry.
    pub fn min_backoff(&self) -> Duration {
        self.min_backoff
    }

    /// The cap on any single wait.
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Raw interval before retry `current_retry_count`, before elapsed time
    /// is taken into account.
    pub fn backoff(&self, current_retry_count: u32) -> Duration {
        let factor = rand::thread_rng().gen_range(0.8..1.2);
        self.backoff_with_factor(current_retry_count, factor)
    }

    fn backoff_with_factor(&self, current_retry_count: u32, factor: f64) -> Duration {
        let exp = current_retry_count.min(MAX_EXPONENT);
        let increment = ((1u64 << exp) - 1) as f64 * self.delta_backoff.as_secs_f64() * factor;
        let interval = self.min_backoff.as_secs_f64() + increment;

        // The cap wins over the floor when they cross.
        if !interval.is_finite() || interval >= self.max_backoff.as_secs_f64() {
            self.max_backoff
        } else {
            Duration::from_secs_f64(interval)
        }
    }
}

impl RetryPolicy for ExponentialRetry {
    fn evaluate(
        &self,
        state: &mut RetryState,
        ctx: &RetryContext<'_>,
        op: &OperationContext,
    ) -> Option<RetryInfo> {
        evaluate_with_backoff(state, ctx, op, self.maximum_attempts, |n| self.backoff(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationMode, StorageLocation};
    use crate::operation::RequestResult;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let policy = ExponentialRetry::default();
        assert_eq!(policy.delta_backoff(), Duration::from_secs(30));
        assert_eq!(policy.maximum_attempts(), 3);
        assert_eq!(policy.min_backoff(), Duration::from_secs(3));
        assert_eq!(policy.max_backoff(), Duration::from_secs(90));
    }

    #[test]
    fn test_custom_max_backoff_caps_every_retry() {
        let policy = ExponentialRetry::new(Duration::from_secs(30), 5)
            .with_max_backoff(Duration::from_secs(10));
        for n in 0..8 {
            assert!(policy.backoff(n) <= Duration::from_secs(10), "retry {n}");
        }
        assert_eq!(policy.backoff(4), Duration::from_secs(10));
    }

    #[test_case(0 => Duration::from_secs(5); "floor only")]
    #[test_case(1 => Duration::from_secs(7); "floor plus one delta")]
    #[test_case(3 => Duration::from_secs(12); "capped")]
    fn test_custom_bounds(n: u32) -> Duration {
        ExponentialRetry::new(Duration::from_secs(2), 5)
            .with_min_backoff(Duration::from_secs(5))
            .with_max_backoff(Duration::from_secs(12))
            .backoff_with_factor(n, 1.0)
    }

    #[test_case(0, 1.0 => Duration::from_secs(3); "first retry waits the minimum")]
    #[test_case(1, 1.0 => Duration::from_secs(5); "one delta")]
    #[test_case(2, 1.0 => Duration::from_secs(9); "three deltas")]
    #[test_case(10, 1.0 => Duration::from_secs(90); "capped at maximum")]
    #[test_case(u32::MAX, 1.2 => Duration::from_secs(90); "huge retry count")]
    fn test_backoff_with_factor(n: u32, factor: f64) -> Duration {
        ExponentialRetry::new(Duration::from_secs(2), 3).backoff_with_factor(n, factor)
    }

    #[test]
    fn test_backoff_within_bounds() {
        let policy = ExponentialRetry::new(Duration::from_secs(2), 10);
        for _ in 0..200 {
            let b = policy.backoff(2);
            // 3s + 3 * 2s * [0.8, 1.2)
            assert!(b >= Duration::from_secs_f64(7.8), "{b:?}");
            assert!(b < Duration::from_secs_f64(10.2), "{b:?}");
        }
        for n in 0..40 {
            let b = policy.backoff(n);
            assert!(b >= Duration::from_secs(3));
            assert!(b <= Duration::from_secs(90));
        }
    }

    #[test]
    fn test_evaluate_stops_at_maximum_attempts() {
        let policy = ExponentialRetry::new(Duration::from_millis(10), 2);
        let op = OperationContext::new();
        let mut state = RetryState::new();
        let last = RequestResult::new(StorageLocation::Primary).with_status(503);

        for n in 0..2 {
            let ctx = RetryContext::new(n, &last, StorageLocation::Primary, LocationMode::PrimaryOnly);
            assert!(policy.evaluate(&mut state, &ctx, &op).is_some());
        }
        let ctx = RetryContext::new(2, &last, StorageLocation::Primary, LocationMode::PrimaryOnly);
        assert_eq!(policy.evaluate(&mut state, &ctx, &op), None);
    }

    #[test]
    fn test_first_retry_on_server_error() {
        let policy = ExponentialRetry::default();
        let op = OperationContext::new();
        let mut state = RetryState::new();
        let last = RequestResult::new(StorageLocation::Primary).with_status(500);
        let ctx = RetryContext::new(0, &last, StorageLocation::Primary, LocationMode::PrimaryOnly);

        let info = policy.evaluate(&mut state, &ctx, &op).unwrap();
        assert_eq!(info.target_location(), StorageLocation::Primary);
        assert_eq!(info.updated_location_mode(), LocationMode::PrimaryOnly);
        assert!(info.retry_interval() <= Duration::from_secs(3));
    }

    #[test]
    fn test_evaluate_waits_at_most_the_backoff() {
        let policy = ExponentialRetry::default();
        let op = OperationContext::new();
        let mut state = RetryState::new();
        let last = RequestResult::new(StorageLocation::Primary).with_status(500);
        let ctx = RetryContext::new(1, &last, StorageLocation::Primary, LocationMode::PrimaryOnly);

        let info = policy.evaluate(&mut state, &ctx, &op).unwrap();
        assert_eq!(info.target_location(), StorageLocation::Primary);
        // 3s + 30s * [0.8, 1.2), minus the few microseconds since the attempt.
        assert!(info.retry_interval() <= Duration::from_secs(39));
        assert!(info.retry_interval() >= Duration::from_secs(26));
    }
}
