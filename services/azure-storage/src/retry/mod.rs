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

//! Retry and geo-failover decisions.
//!
//! A [`RetryPolicy`] looks at the last failed attempt of an operation and
//! decides whether to try again, on which location, and after how long.
//! Policies are plain configuration. Everything that changes while an
//! operation runs lives in a [`RetryState`] that the caller creates per
//! operation and threads through every call to [`RetryPolicy::evaluate`].

use std::fmt::Debug;
use std::time::Duration;

use azstore_core::time::{now, DateTime};
use log::debug;

use crate::constants::*;
use crate::location::{LocationMode, StorageLocation};
use crate::operation::{OperationContext, RequestResult};

mod exponential;
pub use exponential::ExponentialRetry;

mod linear;
pub use linear::LinearRetry;

mod no_retry;
pub use no_retry::NoRetry;

/// Default delta backoff of the built-in policies.
pub const DEFAULT_CLIENT_BACKOFF: Duration = Duration::from_secs(30);
/// Default maximum number of retries of the built-in policies.
pub const DEFAULT_CLIENT_RETRY_COUNT: u32 = 3;
/// Lower bound of every computed backoff.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(3);
/// Upper bound of every computed backoff.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(90);

/// Inputs of one retry decision.
#[derive(Debug, Clone, Copy)]
pub struct RetryContext<'a> {
    current_retry_count: u32,
    last_request_result: &'a RequestResult,
    next_location: StorageLocation,
    location_mode: LocationMode,
}

impl<'a> RetryContext<'a> {
    /// Build the context for the decision after `last_request_result`.
    pub fn new(
        current_retry_count: u32,
        last_request_result: &'a RequestResult,
        next_location: StorageLocation,
        location_mode: LocationMode,
    ) -> Self {
        Self {
            current_retry_count,
            last_request_result,
            next_location,
            location_mode,
        }
    }

    /// Number of retries made so far, `0` before the first retry.
    pub fn current_retry_count(&self) -> u32 {
        self.current_retry_count
    }

    /// The attempt that just failed.
    pub fn last_request_result(&self) -> &'a RequestResult {
        self.last_request_result
    }

    /// The location the next attempt would use if nothing changes.
    pub fn next_location(&self) -> StorageLocation {
        self.next_location
    }

    /// The location mode in effect.
    pub fn location_mode(&self) -> LocationMode {
        self.location_mode
    }
}

/// Output of a positive retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryInfo {
    target_location: StorageLocation,
    updated_location_mode: LocationMode,
    retry_interval: Duration,
}

impl Default for RetryInfo {
    fn default() -> Self {
        Self {
            target_location: StorageLocation::Primary,
            updated_location_mode: LocationMode::PrimaryOnly,
            retry_interval: DEFAULT_MIN_BACKOFF,
        }
    }
}

impl RetryInfo {
    /// Primary location, primary-only mode, default interval.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the target and mode from the context.
    pub fn from_context(ctx: &RetryContext<'_>) -> Self {
        Self {
            target_location: ctx.next_location(),
            updated_location_mode: ctx.location_mode(),
            ..Self::default()
        }
    }

    /// Where the next attempt goes.
    pub fn target_location(&self) -> StorageLocation {
        self.target_location
    }

    /// Location mode for the rest of the operation.
    pub fn updated_location_mode(&self) -> LocationMode {
        self.updated_location_mode
    }

    /// How long to wait before the next attempt.
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Set the target location.
    pub fn set_target_location(&mut self, location: StorageLocation) {
        self.target_location = location;
    }

    /// Set the location mode.
    pub fn set_updated_location_mode(&mut self, mode: LocationMode) {
        self.updated_location_mode = mode;
    }

    /// Set the interval in milliseconds, negative values become zero.
    pub fn set_retry_interval_ms(&mut self, ms: i64) {
        self.retry_interval = Duration::from_millis(ms.max(0) as u64);
    }
}

/// Bookkeeping of one operation's retry sequence.
///
/// Holds when each location was last attempted, so that time already spent
/// talking to the other location counts toward the wait before returning to
/// this one. Create one per operation and never share it between operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    last_primary_attempt: Option<DateTime>,
    last_secondary_attempt: Option<DateTime>,
}

impl RetryState {
    /// Fresh state for a new operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// When `location` was last attempted in this operation.
    pub fn last_attempt(&self, location: StorageLocation) -> Option<DateTime> {
        match location {
            StorageLocation::Primary => self.last_primary_attempt,
            StorageLocation::Secondary => self.last_secondary_attempt,
        }
    }

    /// Record the stop time of the last attempt against its location.
    ///
    /// Returns true if the last attempt was a 404 from the secondary.
    pub fn record_last_attempt(&mut self, ctx: &RetryContext<'_>) -> bool {
        let last = ctx.last_request_result();
        match last.target_location {
            StorageLocation::Primary => self.last_primary_attempt = Some(last.stop_time),
            StorageLocation::Secondary => self.last_secondary_attempt = Some(last.stop_time),
        }

        last.target_location == StorageLocation::Secondary && last.status_code == HTTP_NOT_FOUND
    }

    /// Turn a computed backoff into the final [`RetryInfo`].
    pub fn evaluate_retry_info(
        &self,
        ctx: &RetryContext<'_>,
        secondary_not_found: bool,
        retry_interval: Duration,
    ) -> RetryInfo {
        self.evaluate_retry_info_at(ctx, secondary_not_found, retry_interval, now())
    }

    pub(crate) fn evaluate_retry_info_at(
        &self,
        ctx: &RetryContext<'_>,
        secondary_not_found: bool,
        retry_interval: Duration,
        now: DateTime,
    ) -> RetryInfo {
        let mut info = RetryInfo::from_context(ctx);

        // A secondary that answers 404 is most likely still replicating,
        // the primary has a better chance of holding the resource.
        if secondary_not_found && ctx.location_mode() != LocationMode::SecondaryOnly {
            info.set_updated_location_mode(LocationMode::PrimaryOnly);
            info.set_target_location(StorageLocation::Primary);
        }

        // Only wait for what is left of the interval since the last attempt
        // to the target. A location never attempted before is used at once.
        info.retry_interval = match self.last_attempt(info.target_location) {
            Some(last) => {
                let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
                retry_interval.saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        };

        info
    }
}

/// Decides whether and how a failed attempt is retried.
pub trait RetryPolicy: Debug + Send + Sync {
    /// Evaluate the last attempt, `None` means give up and surface the failure.
    ///
    /// `state` belongs to the operation being retried and is updated as a
    /// side effect.
    fn evaluate(
        &self,
        state: &mut RetryState,
        ctx: &RetryContext<'_>,
        op: &OperationContext,
    ) -> Option<RetryInfo>;
}

/// Creates the retry policy of each new operation.
pub trait RetryPolicyFactory: Debug + Send + Sync {
    /// A policy for the operation described by `op`.
    fn create_instance(&self, op: &OperationContext) -> Box<dyn RetryPolicy>;
}

impl<T: RetryPolicy + Clone + 'static> RetryPolicyFactory for T {
    fn create_instance(&self, _: &OperationContext) -> Box<dyn RetryPolicy> {
        Box::new(self.clone())
    }
}

/// Whether a failure with `status` is worth another attempt.
///
/// 4xx are caller errors, except a 404 from the secondary which is
/// explained by replication lag.
pub fn is_retryable_status(status: u16, secondary_not_found: bool) -> bool {
    if (400..500).contains(&status) && !secondary_not_found {
        return false;
    }

    !matches!(
        status,
        HTTP_NOT_IMPLEMENTED | HTTP_VERSION_NOT_SUPPORTED | HTTP_CLIENT_EXCEPTION
    )
}

/// The decision flow shared by the backoff policies, `backoff` computes the
/// raw interval for the current retry count.
pub(crate) fn evaluate_with_backoff(
    state: &mut RetryState,
    ctx: &RetryContext<'_>,
    op: &OperationContext,
    maximum_attempts: u32,
    backoff: impl FnOnce(u32) -> Duration,
) -> Option<RetryInfo> {
    let secondary_not_found = state.record_last_attempt(ctx);
    let status = ctx.last_request_result().status_code;

    if ctx.current_retry_count() >= maximum_attempts {
        debug!(
            "operation {}: giving up after {} retries, last status {status}",
            op.client_request_id(),
            ctx.current_retry_count()
        );
        return None;
    }

    if !is_retryable_status(status, secondary_not_found) {
        debug!(
            "operation {}: status {status} is not retryable",
            op.client_request_id()
        );
        return None;
    }

    let interval = backoff(ctx.current_retry_count());
    let info = state.evaluate_retry_info(ctx, secondary_not_found, interval);
    debug!(
        "operation {}: retry {} on {} in {:?} (mode {:?})",
        op.client_request_id(),
        ctx.current_retry_count() + 1,
        info.target_location(),
        info.retry_interval(),
        info.updated_location_mode()
    );
    Some(info)
}
