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

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use azstore_core::time::{format_http_date, now, DateTime};
use azstore_core::{Context, Error, Result, SignRequest, SigningMethod, SigningRequest};
use http::header::{self, HeaderName, HeaderValue};
use http::request::Parts;
use log::debug;

use crate::constants::*;
use crate::credential::Credential;
use crate::key::StorageKey;
use crate::sas::{
    AccountPermissions, AccountResourceTypes, AccountServices, SharedAccessAccountPolicy,
};

/// Signs requests to Azure Storage with a [`Credential`].
///
/// - Shared Key credentials sign the `Authorization` header, or produce an
///   account SAS when an expiry is requested.
/// - SAS credentials append their token to the URI.
/// - Anonymous credentials only set `x-ms-version`.
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer.
    pub fn new() -> Self {
        Self { time: None }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::request_invalid("credential is required"));
        };

        if !req.headers.contains_key(X_MS_VERSION) {
            req.headers.insert(
                X_MS_VERSION,
                HeaderValue::from_static(TARGET_STORAGE_VERSION),
            );
        }

        match cred {
            Credential::Anonymous => Ok(()),
            Credential::SasToken { .. } => {
                req.uri = cred.transform_uri(&req.uri)?;
                Ok(())
            }
            Credential::SharedKey { account_name, key } => {
                let now_time = self.time.unwrap_or_else(now);
                let mut ctx = SigningRequest::build(req)?;

                match SigningMethod::from_expires_in(expires_in) {
                    SigningMethod::Query(d) => {
                        let expiry = now_time
                            + chrono::TimeDelta::from_std(d).map_err(|e| {
                                Error::request_invalid("expires_in is out of range").with_source(e)
                            })?;
                        let token = SharedAccessAccountPolicy::new(
                            AccountPermissions::all(),
                            AccountServices::all(),
                            AccountResourceTypes::all(),
                            expiry,
                        )
                        .generate_sas_token(account_name, key)?;
                        ctx.query_append(&token);
                    }
                    SigningMethod::Header => {
                        ctx.headers
                            .insert(X_MS_DATE, format_http_date(now_time).parse()?);
                        let authorization = shared_key_authorization(&ctx, account_name, key)?;
                        ctx.headers.insert(header::AUTHORIZATION, authorization);
                    }
                }

                ctx.apply(req)
            }
        }
    }
}

fn shared_key_authorization(
    ctx: &SigningRequest,
    account_name: &str,
    key: &StorageKey,
) -> Result<HeaderValue> {
    let string_to_sign = string_to_sign(ctx, account_name)?;
    let signature = key.compute_mac_sha256(&string_to_sign);

    let mut value: HeaderValue = format!("SharedKey {account_name}:{signature}").parse()?;
    value.set_sensitive(true);
    Ok(value)
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// Content-Encoding + "\n" +
/// Content-Language + "\n" +
/// Content-Length + "\n" +
/// Content-MD5 + "\n" +
/// Content-Type + "\n" +
/// Date + "\n" +
/// If-Modified-Since + "\n" +
/// If-Match + "\n" +
/// If-None-Match + "\n" +
/// If-Unmodified-Since + "\n" +
/// Range + "\n" +
/// CanonicalizedHeaders +
/// CanonicalizedResource;
/// ```
///
/// ## Reference
///
/// - [Blob, Queue, and File Services (Shared Key authorization)](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
fn string_to_sign(ctx: &SigningRequest, account_name: &str) -> Result<String> {
    let mut s = String::with_capacity(256);

    writeln!(&mut s, "{}", ctx.method.as_str())?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::CONTENT_ENCODING)?)?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::CONTENT_LANGUAGE)?)?;
    writeln!(&mut s, "{}", {
        // Zero is sent as empty since version 2015-02-21.
        let content_length = ctx.header_get_or_default(&header::CONTENT_LENGTH)?;
        if content_length == "0" {
            ""
        } else {
            content_length
        }
    })?;
    writeln!(
        &mut s,
        "{}",
        ctx.header_get_or_default(&HeaderName::from_static(CONTENT_MD5))?
    )?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::CONTENT_TYPE)?)?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::DATE)?)?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::IF_MODIFIED_SINCE)?)?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::IF_MATCH)?)?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::IF_NONE_MATCH)?)?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::IF_UNMODIFIED_SINCE)?)?;
    writeln!(&mut s, "{}", ctx.header_get_or_default(&header::RANGE)?)?;
    writeln!(&mut s, "{}", canonicalize_header(ctx)?)?;
    write!(&mut s, "{}", canonicalize_resource(ctx, account_name))?;

    debug!("string to sign: {}", &s);

    Ok(s)
}

/// ## Reference
///
/// - [Constructing the canonicalized headers string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-headers-string)
fn canonicalize_header(ctx: &SigningRequest) -> Result<String> {
    Ok(SigningRequest::header_to_string(
        ctx.header_to_vec_with_prefix("x-ms-")?,
        ":",
        "\n",
    ))
}

/// ## Reference
///
/// - [Constructing the canonicalized resource string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-resource-string)
fn canonicalize_resource(ctx: &SigningRequest, account_name: &str) -> String {
    let mut params: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (k, v) in &ctx.query {
        params.entry(k.to_lowercase()).or_default().push(v);
    }

    let mut s = format!("/{}{}", account_name, ctx.path);
    for (k, mut values) in params {
        values.sort_unstable();
        s.push('\n');
        s.push_str(&k);
        s.push(':');
        s.push_str(&values.join(","));
    }
    s
}
