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

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use azstore_core::time::{now, DateTime};
use http::Uri;

use crate::constants::{HTTP_CLIENT_EXCEPTION, HTTP_NO_RESPONSE};
use crate::location::{LocationMode, StorageLocation};
use crate::retry::{ExponentialRetry, RetryInfo, RetryPolicyFactory};

/// What happened during one attempt of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResult {
    /// HTTP status of the response.
    ///
    /// [`HTTP_NO_RESPONSE`] when the transport failed, [`HTTP_CLIENT_EXCEPTION`]
    /// when the attempt never left the client.
    pub status_code: u16,
    /// When the attempt started.
    pub start_time: DateTime,
    /// When the attempt finished.
    pub stop_time: DateTime,
    /// Location the attempt was sent to.
    pub target_location: StorageLocation,
    /// `x-ms-request-id` returned by the service.
    pub service_request_id: Option<String>,
    /// `ETag` returned by the service.
    pub etag: Option<String>,
    /// Message of the error captured for this attempt.
    pub error: Option<String>,
}

impl RequestResult {
    /// A result for an attempt against `target_location` that starts now.
    pub fn new(target_location: StorageLocation) -> Self {
        let t = now();
        Self {
            status_code: HTTP_NO_RESPONSE,
            start_time: t,
            stop_time: t,
            target_location,
            service_request_id: None,
            etag: None,
            error: None,
        }
    }

    /// Set the status code.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Set the stop time.
    pub fn with_stop_time(mut self, stop_time: DateTime) -> Self {
        self.stop_time = stop_time;
        self
    }

    /// Record the captured error.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Whether the attempt produced a usable response.
    pub fn is_success(&self) -> bool {
        self.status_code != HTTP_NO_RESPONSE
            && self.status_code != HTTP_CLIENT_EXCEPTION
            && self.status_code < 400
    }
}

/// Events fired while an operation runs.
#[derive(Debug)]
pub enum OperationEvent<'a> {
    /// A signed request is about to be handed to the transport.
    SendingRequest {
        /// Client request id of the operation.
        client_request_id: &'a str,
        /// Target location.
        location: StorageLocation,
        /// Target URI.
        uri: &'a Uri,
    },
    /// The transport returned, with or without a response.
    ResponseReceived(&'a RequestResult),
    /// The retry policy scheduled another attempt.
    Retrying {
        /// The failed attempt.
        result: &'a RequestResult,
        /// Where and when the next attempt happens.
        info: &'a RetryInfo,
    },
    /// The operation is over, successfully or not.
    RequestCompleted(&'a RequestResult),
}

/// Receives [`OperationEvent`]s of the operations it is registered on.
pub trait OperationListener: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &OperationEvent<'_>);
}

/// Per-operation state: the client request id, every attempt made so far and
/// the listeners to notify.
///
/// Listeners are registered on the context explicitly, there is no global
/// registry.
pub struct OperationContext {
    client_request_id: String,
    request_results: Vec<RequestResult>,
    listeners: Vec<Arc<dyn OperationListener>>,
}

impl Debug for OperationContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationContext")
            .field("client_request_id", &self.client_request_id)
            .field("request_results", &self.request_results)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationContext {
    /// A new context with a random client request id.
    pub fn new() -> Self {
        Self {
            client_request_id: uuid::Uuid::new_v4().to_string(),
            request_results: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Use a caller supplied client request id.
    pub fn with_client_request_id(mut self, id: impl Into<String>) -> Self {
        self.client_request_id = id.into();
        self
    }

    /// Register a listener.
    pub fn with_listener(mut self, listener: impl OperationListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// The client request id, sent as `x-ms-client-request-id`.
    pub fn client_request_id(&self) -> &str {
        &self.client_request_id
    }

    /// Every attempt made so far, oldest first.
    pub fn request_results(&self) -> &[RequestResult] {
        &self.request_results
    }

    /// The most recent attempt.
    pub fn last_result(&self) -> Option<&RequestResult> {
        self.request_results.last()
    }

    pub(crate) fn push_result(&mut self, result: RequestResult) {
        self.request_results.push(result);
    }

    pub(crate) fn fire(&self, event: OperationEvent<'_>) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

/// Knobs for a single operation.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Locations the operation may use.
    pub location_mode: LocationMode,
    /// Produces the retry policy of each operation.
    pub retry_policy_factory: Arc<dyn RetryPolicyFactory>,
    /// Timeout of a single attempt.
    pub timeout_interval: Option<Duration>,
    /// Wall clock budget of the whole operation, retries included.
    pub maximum_execution_time: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            location_mode: LocationMode::PrimaryOnly,
            retry_policy_factory: Arc::new(ExponentialRetry::default()),
            timeout_interval: None,
            maximum_execution_time: None,
        }
    }
}

impl RequestOptions {
    /// Set the location mode.
    pub fn with_location_mode(mut self, mode: LocationMode) -> Self {
        self.location_mode = mode;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, factory: impl RetryPolicyFactory + 'static) -> Self {
        self.retry_policy_factory = Arc::new(factory);
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout_interval(mut self, timeout: Duration) -> Self {
        self.timeout_interval = Some(timeout);
        self
    }

    /// Set the operation deadline.
    pub fn with_maximum_execution_time(mut self, budget: Duration) -> Self {
        self.maximum_execution_time = Some(budget);
        self
    }
}
