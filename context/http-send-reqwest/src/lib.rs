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

//! [`HttpSend`] backed by `reqwest`.

use async_trait::async_trait;
use azstore_core::{Error, HttpSend, RequestTimeout, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use log::debug;
use reqwest::{Client, Request};

/// Sends storage requests through a shared `reqwest::Client`.
///
/// A [`RequestTimeout`] found in the request extensions becomes the
/// timeout of that single attempt.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let timeout = req.extensions().get::<RequestTimeout>().copied();

        let mut req = Request::try_from(req)
            .map_err(|e| Error::request_invalid("failed to convert request").with_source(e))?;
        if let Some(RequestTimeout(d)) = timeout {
            *req.timeout_mut() = Some(d);
        }

        debug!("sending {} {}", req.method(), req.url().path());
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::unexpected("failed to send request").with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::unexpected("failed to read response body").with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let send = ReqwestHttpSend::default();
        let mut req = http::Request::get("http://127.0.0.1:1/devstoreaccount1")
            .body(Bytes::new())
            .unwrap();
        req.extensions_mut()
            .insert(RequestTimeout(Duration::from_secs(1)));

        let err = send.http_send(req).await.unwrap_err();
        assert_eq!(err.kind(), azstore_core::ErrorKind::Unexpected);
    }
}
