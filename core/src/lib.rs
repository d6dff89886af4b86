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

//! Core components shared by the azstore crates.
//!
//! This crate holds the service independent pieces:
//!
//! - [`Error`] and [`ErrorKind`]: one error type for every crate in the workspace
//! - [`Context`]: the pluggable HTTP transport ([`HttpSend`]) and environment ([`Env`])
//! - [`ProvideCredential`] and [`SignRequest`]: how credentials are loaded and applied
//! - [`Signer`]: caches a credential and signs requests with it
//! - [`SigningRequest`]: a mutable view over `http::request::Parts` used while signing
//!
//! ## Example
//!
//! ```no_run
//! use azstore_core::{Context, ProvideCredential, Result, SignRequest, Signer, SigningCredential};
//! use async_trait::async_trait;
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug)]
//! struct Token(String);
//!
//! impl SigningCredential for Token {
//!     fn is_valid(&self) -> bool {
//!         !self.0.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Fixed;
//!
//! #[async_trait]
//! impl ProvideCredential for Fixed {
//!     type Credential = Token;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Option<Token>> {
//!         Ok(Some(Token("secret".to_string())))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Bearer;
//!
//! #[async_trait]
//! impl SignRequest for Bearer {
//!     type Credential = Token;
//!
//!     async fn sign_request(
//!         &self,
//!         _: &Context,
//!         req: &mut http::request::Parts,
//!         cred: Option<&Token>,
//!         _: Option<Duration>,
//!     ) -> Result<()> {
//!         if let Some(cred) = cred {
//!             req.headers.insert("authorization", format!("Bearer {}", cred.0).parse()?);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(Context::new(), Fixed, Bearer);
//! let mut parts = http::Request::get("https://example.com").body(())?.into_parts().0;
//! signer.sign(&mut parts, None).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};

mod context;
pub use context::{
    Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, RequestTimeout, StaticEnv,
};

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod request;
pub use request::{SigningMethod, SigningRequest, QUERY_ENCODE_SET};
mod signer;
pub use signer::Signer;
