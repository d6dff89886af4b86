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

//! Drives the executor against a scripted transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use azstore_azure_storage::retry::is_retryable_status;
use azstore_azure_storage::{
    AccessCondition, Config, Executor, LocationMode, OperationContext, OperationEvent,
    OperationListener, RequestOptions, RequestSigner, RetryContext, RetryInfo, RetryPolicy,
    RetryState, Service, StaticCredentialProvider, StorageLocation,
};
use azstore_core::{Context, Error, ErrorKind, HttpSend, Result, Signer};
use bytes::Bytes;
use http::{Request, Response, Uri};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, Default)]
struct ScriptedHttpSend {
    statuses: Arc<Mutex<VecDeque<u16>>>,
    requests: Arc<Mutex<Vec<http::request::Parts>>>,
}

impl ScriptedHttpSend {
    fn new(statuses: &[u16]) -> Self {
        Self {
            statuses: Arc::new(Mutex::new(statuses.iter().copied().collect())),
            requests: Arc::default(),
        }
    }
}

#[async_trait]
impl HttpSend for ScriptedHttpSend {
    async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        self.requests.lock().unwrap().push(req.into_parts().0);
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::unexpected("script exhausted"))?;
        Ok(Response::builder()
            .status(status)
            .header("etag", "\"0x8D\"")
            .body(Bytes::new())?)
    }
}

/// Retries every retryable failure right away, on the next location.
#[derive(Debug, Clone)]
struct Immediate {
    attempts: u32,
}

impl RetryPolicy for Immediate {
    fn evaluate(
        &self,
        state: &mut RetryState,
        ctx: &RetryContext<'_>,
        _: &OperationContext,
    ) -> Option<RetryInfo> {
        let secondary_not_found = state.record_last_attempt(ctx);
        if ctx.current_retry_count() >= self.attempts
            || !is_retryable_status(ctx.last_request_result().status_code, secondary_not_found)
        {
            return None;
        }

        let mut info = state.evaluate_retry_info(ctx, secondary_not_found, Duration::ZERO);
        info.set_retry_interval_ms(0);
        Some(info)
    }
}

/// Records the target location of every scheduled retry.
#[derive(Debug, Clone, Default)]
struct RetriesListener(Arc<Mutex<Vec<StorageLocation>>>);

impl OperationListener for RetriesListener {
    fn on_event(&self, event: &OperationEvent<'_>) {
        if let OperationEvent::Retrying { info, .. } = event {
            self.0.lock().unwrap().push(info.target_location());
        }
    }
}

fn executor(http: &ScriptedHttpSend) -> (Executor, Config) {
    let config =
        Config::from_connection_string("UseDevelopmentStorage=true", Service::Blob).unwrap();
    let credential = config.credential().unwrap().unwrap();
    let signer = Signer::new(
        Context::new().with_http_send(http.clone()),
        StaticCredentialProvider::new(credential),
        RequestSigner::new(),
    );
    (Executor::new(signer), config)
}

fn put_blob(condition: AccessCondition) -> impl Fn(&Uri) -> Result<Request<Bytes>> + Send + Sync {
    move |uri| {
        let mut req = Request::put(uri.clone())
            .header("x-ms-blob-type", "BlockBlob")
            .body(Bytes::from_static(b"hello"))?;
        condition.apply_condition_to_request(req.headers_mut())?;
        Ok(req)
    }
}

#[tokio::test]
async fn test_failover_with_custom_policy() {
    let _ = env_logger::builder().is_test(true).try_init();

    let http = ScriptedHttpSend::new(&[500, 503, 200]);
    let (executor, config) = executor(&http);
    let uri = config.storage_uri().unwrap().join("c/blob.txt").unwrap();
    let retries = RetriesListener::default();
    let options = RequestOptions::default()
        .with_location_mode(LocationMode::PrimaryThenSecondary)
        .with_retry_policy(Immediate { attempts: 5 });
    let mut op = OperationContext::new().with_listener(retries.clone());

    let resp = executor
        .execute(
            put_blob(AccessCondition::generate_if_not_exists_condition()),
            &uri,
            &options,
            &mut op,
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        *retries.0.lock().unwrap(),
        vec![StorageLocation::Secondary, StorageLocation::Primary]
    );
    assert_eq!(op.last_result().unwrap().etag.as_deref(), Some("\"0x8D\""));

    let requests = http.requests.lock().unwrap();
    let paths: Vec<_> = requests.iter().map(|p| p.uri.path().to_string()).collect();
    assert_eq!(
        paths,
        vec![
            "/devstoreaccount1/c/blob.txt",
            "/devstoreaccount1-secondary/c/blob.txt",
            "/devstoreaccount1/c/blob.txt",
        ]
    );
    for parts in requests.iter() {
        assert_eq!(parts.headers["if-none-match"], "*");
        assert_eq!(
            parts.headers["x-ms-client-request-id"],
            op.client_request_id()
        );
    }
}

#[tokio::test]
async fn test_precondition_failure_is_final() {
    let http = ScriptedHttpSend::new(&[412, 200]);
    let (executor, config) = executor(&http);
    let uri = config.storage_uri().unwrap().join("c/blob.txt").unwrap();
    let options = RequestOptions::default().with_retry_policy(Immediate { attempts: 5 });
    let mut op = OperationContext::new();

    let err = executor
        .execute(
            put_blob(AccessCondition::generate_if_match_condition("0x8C")),
            &uri,
            &options,
            &mut op,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestFailed);
    assert_eq!(err.status(), Some(412));
    assert_eq!(http.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_source_lease_is_rejected_before_sending() {
    let http = ScriptedHttpSend::new(&[202]);
    let (executor, config) = executor(&http);
    let uri = config.storage_uri().unwrap().join("c/copy.txt").unwrap();
    let source = AccessCondition::generate_lease_condition("lease-1");
    let mut op = OperationContext::new();

    let err = executor
        .execute(
            |uri: &Uri| {
                let mut req = Request::put(uri.clone()).body(Bytes::new())?;
                source.apply_source_condition_to_request(req.headers_mut())?;
                Ok(req)
            },
            &uri,
            &RequestOptions::default(),
            &mut op,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert_eq!(op.request_results().len(), 1);
    assert!(http.requests.lock().unwrap().is_empty());
}
