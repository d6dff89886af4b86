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

use std::mem;
use std::str::FromStr;
use std::time::Duration;

use http::header::HeaderName;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::Method;
use http::Uri;
use percent_encoding::utf8_percent_encode;
use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

use crate::{Error, Result};

/// Characters left untouched when query values are written back to the URI.
pub const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signing context for request.
///
/// Query values are kept percent-decoded while the request is being signed
/// and encoded again by [`SigningRequest::apply`]. Entries pushed through
/// [`SigningRequest::query_append`] are written back verbatim.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, still percent-encoded.
    pub path: String,
    /// HTTP query parameters, percent-decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),

            // Taken out to avoid a copy, given back in `apply`.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;

        let mut paq = self.path;
        for (i, (k, v)) in self.query.iter().enumerate() {
            paq.push(if i == 0 { '?' } else { '&' });
            paq.push_str(k);
            if !v.is_empty() {
                paq.push('=');
                paq.extend(utf8_percent_encode(v, QUERY_ENCODE_SET));
            }
        }

        let mut uri_parts = mem::take(&mut parts.uri).into_parts();
        uri_parts.scheme = Some(self.scheme);
        uri_parts.authority = Some(self.authority);
        uri_parts.path_and_query = Some(PathAndQuery::from_str(&paq)?);
        parts.uri = Uri::from_parts(uri_parts)?;

        Ok(())
    }

    /// Push a new query pair into query list. The value is encoded on apply.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Push an already encoded query string, such as a SAS token.
    #[inline]
    pub fn query_append(&mut self, query: &str) {
        let query = query.trim_start_matches('?');
        if !query.is_empty() {
            self.query.push((query.to_string(), String::new()));
        }
    }

    /// Get header value by name.
    ///
    /// Returns empty string if header not found.
    #[inline]
    pub fn header_get_or_default(&self, key: &HeaderName) -> Result<&str> {
        match self.headers.get(key) {
            Some(v) => Ok(v.to_str()?),
            None => Ok(""),
        }
    }

    /// Collect headers whose lowercase name starts with `prefix`, values trimmed.
    pub fn header_to_vec_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut headers = Vec::new();
        for (k, v) in self.headers.iter() {
            if k.as_str().starts_with(prefix) {
                headers.push((k.as_str().to_string(), v.to_str()?.trim().to_string()));
            }
        }
        Ok(headers)
    }

    /// Convert headers into a sorted string.
    ///
    /// ```shell
    /// [(c, d), (a, b)] => "a:b\nc:d"
    /// ```
    pub fn header_to_string(mut headers: Vec<(String, String)>, sep: &str, join: &str) -> String {
        headers.sort();

        headers
            .into_iter()
            .map(|(k, v)| format!("{k}{sep}{v}"))
            .collect::<Vec<_>>()
            .join(join)
    }
}

/// SigningMethod is the method that used in signing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SigningMethod {
    /// Signing with header.
    Header,
    /// Signing with query, valid for the given duration.
    Query(Duration),
}

impl SigningMethod {
    /// Pick the signing method from an optional expiry.
    pub fn from_expires_in(expires_in: Option<Duration>) -> Self {
        match expires_in {
            Some(d) => SigningMethod::Query(d),
            None => SigningMethod::Header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_and_apply() {
        let req = http::Request::get("https://acct.blob.core.windows.net/c/b?comp=list&prefix=a%2Fb")
            .header("x-ms-version", "2019-12-12")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let mut ctx = SigningRequest::build(&mut parts).unwrap();
        assert_eq!(ctx.path, "/c/b");
        assert_eq!(
            ctx.query,
            vec![
                ("comp".to_string(), "list".to_string()),
                ("prefix".to_string(), "a/b".to_string())
            ]
        );
        ctx.query_push("timeout", "30");
        ctx.query_append("?sv=2019-12-12&sig=a%2Bb");
        ctx.apply(&mut parts).unwrap();

        assert_eq!(
            parts.uri.to_string(),
            "https://acct.blob.core.windows.net/c/b?comp=list&prefix=a%2Fb&timeout=30&sv=2019-12-12&sig=a%2Bb"
        );
        assert_eq!(parts.headers["x-ms-version"], "2019-12-12");
    }

    #[test]
    fn test_build_requires_authority() {
        let req = http::Request::get("/relative").body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        assert!(SigningRequest::build(&mut parts).is_err());
    }

    #[test]
    fn test_header_to_string() {
        let s = SigningRequest::header_to_string(
            vec![
                ("x-ms-version".to_string(), "2019-12-12".to_string()),
                ("x-ms-date".to_string(), "now".to_string()),
            ],
            ":",
            "\n",
        );
        assert_eq!(s, "x-ms-date:now\nx-ms-version:2019-12-12");
    }
}
