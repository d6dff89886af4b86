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

//! Azure Storage support for azstore.
//!
//! This crate covers what every Azure Storage client needs before it talks
//! about blobs, files, queues or tables:
//!
//! - [`Credential`] and [`StorageKey`]: Shared Key, SAS and anonymous access
//! - [`RequestSigner`]: signs requests with a credential
//! - [`AccessCondition`]: conditional headers and their local evaluation
//! - [`sas`]: account shared access signatures
//! - [`retry`] and [`Executor`]: geo-aware retries across primary and secondary
//!
//! ## Example
//!
//! ```no_run
//! use azstore_azure_storage::{
//!     Config, Executor, LocationMode, OperationContext, RequestOptions, RequestSigner, Service,
//!     StaticCredentialProvider,
//! };
//! use azstore_core::{Context, Error, OsEnv, Result, Signer};
//! use azstore_http_send_reqwest::ReqwestHttpSend;
//! use bytes::Bytes;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new()
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     let config = Config::new(Service::Blob).from_env(&ctx)?;
//!     let credential = config
//!         .credential()?
//!         .ok_or_else(|| Error::config_invalid("no credential configured"))?;
//!     let signer = Signer::new(
//!         ctx,
//!         StaticCredentialProvider::new(credential),
//!         RequestSigner::new(),
//!     );
//!
//!     let uri = config.storage_uri()?.join("container?restype=container")?;
//!     let options = RequestOptions::default().with_location_mode(LocationMode::PrimaryThenSecondary);
//!     let mut op = OperationContext::new();
//!
//!     let resp = Executor::new(signer)
//!         .execute(
//!             |uri| Ok(http::Request::get(uri.clone()).body(Bytes::new())?),
//!             &uri,
//!             &options,
//!             &mut op,
//!         )
//!         .await?;
//!     println!("{} after {} attempts", resp.status(), op.request_results().len());
//!
//!     Ok(())
//! }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;
pub use constants::{HTTP_CLIENT_EXCEPTION, HTTP_NO_RESPONSE};

mod location;
pub use location::{LocationMode, StorageLocation, StorageUri};

mod operation;
pub use operation::{
    OperationContext, OperationEvent, OperationListener, RequestOptions, RequestResult,
};

pub mod retry;
pub use retry::{
    ExponentialRetry, LinearRetry, NoRetry, RetryContext, RetryInfo, RetryPolicy,
    RetryPolicyFactory, RetryState,
};

mod access_condition;
pub use access_condition::{normalize_etag, AccessCondition};

mod key;
pub use key::StorageKey;

mod credential;
pub use credential::Credential;

pub mod sas;

mod service;
pub use service::Service;

mod config;
pub use config::*;

mod connection_string;

mod provide_credential;
pub use provide_credential::{EnvCredentialProvider, StaticCredentialProvider};

mod sign_request;
pub use sign_request::RequestSigner;

mod executor;
pub use executor::Executor;
