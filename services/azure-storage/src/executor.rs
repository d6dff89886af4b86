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

//! Runs a storage operation: signs, sends and retries it across locations.

use azstore_core::time::now;
use azstore_core::utils::redact_query;
use azstore_core::{Error, RequestTimeout, Result, Signer};
use bytes::Bytes;
use http::header::{HeaderValue, ETAG};
use http::{Request, Response, Uri};
use log::{debug, info, warn};
use tokio::time::Instant;

use crate::constants::{
    HTTP_CLIENT_EXCEPTION, SIGNATURE, X_MS_CLIENT_REQUEST_ID, X_MS_REQUEST_ID,
};
use crate::credential::Credential;
use crate::location::{StorageLocation, StorageUri};
use crate::operation::{OperationContext, OperationEvent, RequestOptions, RequestResult};
use crate::retry::{RetryContext, RetryState};

/// Executes operations against a storage account.
///
/// Every attempt is signed with the [`Signer`] and sent through the HTTP
/// transport of its context. Failed attempts are handed to the retry policy
/// of the operation, which picks the location and the delay of the next one.
#[derive(Debug, Clone)]
pub struct Executor {
    signer: Signer<Credential>,
}

impl Executor {
    /// Create an executor signing with `signer`.
    pub fn new(signer: Signer<Credential>) -> Self {
        Self { signer }
    }

    /// The signer in use.
    pub fn signer(&self) -> &Signer<Credential> {
        &self.signer
    }

    /// Run one operation.
    ///
    /// `build` creates the request for the URI of the location being tried,
    /// it is called once per attempt. The attempts are recorded in `op`.
    pub async fn execute<F>(
        &self,
        build: F,
        storage_uri: &StorageUri,
        options: &RequestOptions,
        op: &mut OperationContext,
    ) -> Result<Response<Bytes>>
    where
        F: Fn(&Uri) -> Result<Request<Bytes>> + Send + Sync,
    {
        storage_uri.validate_location_mode(options.location_mode)?;

        let policy = options.retry_policy_factory.create_instance(op);
        let mut state = RetryState::new();
        let deadline = options.maximum_execution_time.map(|d| Instant::now() + d);

        let mut mode = options.location_mode;
        let mut location = mode.initial_location();
        let mut retry_count = 0;

        loop {
            let mut result = RequestResult::new(location);

            let req = match self.prepare(&build, storage_uri, location, options, op).await {
                Ok(req) => req,
                Err(err) => {
                    // Nothing was sent, there is no point retrying.
                    result.status_code = HTTP_CLIENT_EXCEPTION;
                    result.error = Some(err.to_string());
                    result.stop_time = now();
                    return Err(self.complete(op, result, err));
                }
            };

            let uri = redact_query(&req.uri().to_string(), SIGNATURE);
            op.fire(OperationEvent::SendingRequest {
                client_request_id: op.client_request_id(),
                location,
                uri: req.uri(),
            });
            debug!(
                "operation {}: sending attempt {} to {location}: {} {uri}",
                op.client_request_id(),
                retry_count + 1,
                req.method(),
            );

            let resp = match self.signer.context().http_send(req).await {
                Ok(resp) => {
                    result.status_code = resp.status().as_u16();
                    result.service_request_id =
                        header_string(resp.headers().get(X_MS_REQUEST_ID));
                    result.etag = header_string(resp.headers().get(ETAG));
                    Some(resp)
                }
                Err(err) => {
                    warn!(
                        "operation {}: no response from {location}: {err}",
                        op.client_request_id()
                    );
                    result.error = Some(err.to_string());
                    None
                }
            };
            result.stop_time = now();
            op.fire(OperationEvent::ResponseReceived(&result));

            if let Some(resp) = resp.filter(|_| result.is_success()) {
                op.push_result(result);
                if let Some(last) = op.last_result() {
                    op.fire(OperationEvent::RequestCompleted(last));
                }
                return Ok(resp);
            }

            let status = result.status_code;
            op.push_result(result);

            if deadline.is_some_and(|d| Instant::now() >= d) {
                let err = Error::timeout("operation exceeded its maximum execution time");
                return Err(self.fail(op, err.with_status(status)));
            }

            let info = {
                let Some(last) = op.last_result() else {
                    return Err(Error::unexpected("attempt was not recorded"));
                };
                let next = mode.next_location(location);
                let ctx = RetryContext::new(retry_count, last, next, mode);
                match policy.evaluate(&mut state, &ctx, op) {
                    Some(info) => {
                        op.fire(OperationEvent::Retrying {
                            result: last,
                            info: &info,
                        });
                        info
                    }
                    None => {
                        let message = match &last.error {
                            Some(err) => format!("request failed with status {status}: {err}"),
                            None => format!("request failed with status {status}"),
                        };
                        let err = Error::request_failed(message).with_status(status);
                        return Err(self.fail(op, err));
                    }
                }
            };

            if deadline.is_some_and(|d| Instant::now() + info.retry_interval() > d) {
                let err = Error::timeout("next retry would exceed the maximum execution time");
                return Err(self.fail(op, err.with_status(status)));
            }

            if info.target_location() != location {
                info!(
                    "operation {}: switching from {location} to {}",
                    op.client_request_id(),
                    info.target_location()
                );
            }

            tokio::time::sleep(info.retry_interval()).await;
            mode = info.updated_location_mode();
            location = info.target_location();
            retry_count += 1;
        }
    }

    async fn prepare<F>(
        &self,
        build: &F,
        storage_uri: &StorageUri,
        location: StorageLocation,
        options: &RequestOptions,
        op: &OperationContext,
    ) -> Result<Request<Bytes>>
    where
        F: Fn(&Uri) -> Result<Request<Bytes>> + Send + Sync,
    {
        let uri = storage_uri.uri_for(location).ok_or_else(|| {
            Error::request_invalid(format!("no {location} endpoint is configured"))
        })?;

        let (mut parts, body) = build(uri)?.into_parts();
        // Stamped before signing: every x-ms-* header is covered by Shared Key.
        parts.headers.insert(
            X_MS_CLIENT_REQUEST_ID,
            HeaderValue::from_str(op.client_request_id())?,
        );
        if let Some(timeout) = options.timeout_interval {
            parts.extensions.insert(RequestTimeout(timeout));
        }

        self.signer.sign(&mut parts, None).await?;
        Ok(Request::from_parts(parts, body))
    }

    fn complete(&self, op: &mut OperationContext, result: RequestResult, err: Error) -> Error {
        op.push_result(result);
        self.fail(op, err)
    }

    fn fail(&self, op: &OperationContext, err: Error) -> Error {
        if let Some(last) = op.last_result() {
            op.fire(OperationEvent::RequestCompleted(last));
        }
        warn!("operation {} failed: {err}", op.client_request_id());
        err
    }
}

fn header_string(value: Option<&HeaderValue>) -> Option<String> {
    value.and_then(|v| v.to_str().ok()).map(str::to_string)
}
