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

//! Conditional request headers and their client side evaluation.

use azstore_core::time::{format_http_date, DateTime};
use azstore_core::{Error, Result};
use http::header::{self, HeaderName, HeaderValue};
use http::HeaderMap;

use crate::constants::*;

/// A set of conditions a request is made under.
///
/// Every field is optional, an empty condition is always satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessCondition {
    lease_id: Option<String>,
    if_match: Option<String>,
    if_none_match: Option<String>,
    if_modified_since: Option<DateTime>,
    if_unmodified_since: Option<DateTime>,
    if_sequence_number_le: Option<i64>,
    if_sequence_number_lt: Option<i64>,
    if_sequence_number_eq: Option<i64>,
    if_max_size_less_than_or_equal: Option<i64>,
    if_append_position_equal: Option<i64>,
}

/// Quote `etag` unless it is the wildcard or already quoted.
pub fn normalize_etag(etag: &str) -> String {
    if etag == "*" || (etag.len() >= 2 && etag.starts_with('"') && etag.ends_with('"')) {
        etag.to_string()
    } else {
        format!("\"{etag}\"")
    }
}

impl AccessCondition {
    /// An empty condition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the resource's ETag to match `etag`.
    pub fn generate_if_match_condition(etag: &str) -> Self {
        Self::new().with_if_match(etag)
    }

    /// Require the resource's ETag to differ from `etag`.
    pub fn generate_if_none_match_condition(etag: &str) -> Self {
        Self::new().with_if_none_match(etag)
    }

    /// Require the resource to exist.
    pub fn generate_if_exists_condition() -> Self {
        Self::generate_if_match_condition("*")
    }

    /// Require the resource to not exist.
    pub fn generate_if_not_exists_condition() -> Self {
        Self::generate_if_none_match_condition("*")
    }

    /// Require the resource to be modified after `t`.
    pub fn generate_if_modified_since_condition(t: DateTime) -> Self {
        Self::new().with_if_modified_since(t)
    }

    /// Require the resource to be unmodified since `t`.
    pub fn generate_if_not_modified_since_condition(t: DateTime) -> Self {
        Self::new().with_if_unmodified_since(t)
    }

    /// Require the page blob's sequence number to be at most `n`.
    pub fn generate_if_sequence_number_less_than_or_equal_condition(n: i64) -> Self {
        Self {
            if_sequence_number_le: Some(n),
            ..Self::default()
        }
    }

    /// Require the page blob's sequence number to be below `n`.
    pub fn generate_if_sequence_number_less_than_condition(n: i64) -> Self {
        Self {
            if_sequence_number_lt: Some(n),
            ..Self::default()
        }
    }

    /// Require the page blob's sequence number to equal `n`.
    pub fn generate_if_sequence_number_equal_condition(n: i64) -> Self {
        Self {
            if_sequence_number_eq: Some(n),
            ..Self::default()
        }
    }

    /// Require the append blob to stay at most `n` bytes after the append.
    pub fn generate_if_max_size_less_than_or_equal_condition(n: i64) -> Self {
        Self {
            if_max_size_less_than_or_equal: Some(n),
            ..Self::default()
        }
    }

    /// Require the append to happen at offset `n`.
    pub fn generate_if_append_position_equal_condition(n: i64) -> Self {
        Self {
            if_append_position_equal: Some(n),
            ..Self::default()
        }
    }

    /// Require the caller to hold lease `lease_id`.
    pub fn generate_lease_condition(lease_id: &str) -> Self {
        Self::new().with_lease_id(lease_id)
    }

    /// Set the lease id.
    pub fn with_lease_id(mut self, lease_id: &str) -> Self {
        self.lease_id = Some(lease_id.to_string());
        self
    }

    /// Set the `If-Match` ETag.
    pub fn with_if_match(mut self, etag: &str) -> Self {
        self.if_match = Some(normalize_etag(etag));
        self
    }

    /// Set the `If-None-Match` ETag.
    pub fn with_if_none_match(mut self, etag: &str) -> Self {
        self.if_none_match = Some(normalize_etag(etag));
        self
    }

    /// Set the `If-Modified-Since` date.
    pub fn with_if_modified_since(mut self, t: DateTime) -> Self {
        self.if_modified_since = Some(t);
        self
    }

    /// Set the `If-Unmodified-Since` date.
    pub fn with_if_unmodified_since(mut self, t: DateTime) -> Self {
        self.if_unmodified_since = Some(t);
        self
    }

    /// The lease id.
    pub fn lease_id(&self) -> Option<&str> {
        self.lease_id.as_deref()
    }

    /// The normalized `If-Match` ETag.
    pub fn if_match(&self) -> Option<&str> {
        self.if_match.as_deref()
    }

    /// The normalized `If-None-Match` ETag.
    pub fn if_none_match(&self) -> Option<&str> {
        self.if_none_match.as_deref()
    }

    /// The `If-Modified-Since` date.
    pub fn if_modified_since(&self) -> Option<DateTime> {
        self.if_modified_since
    }

    /// The `If-Unmodified-Since` date.
    pub fn if_unmodified_since(&self) -> Option<DateTime> {
        self.if_unmodified_since
    }

    /// Sequence number upper bound, inclusive.
    pub fn if_sequence_number_less_than_or_equal(&self) -> Option<i64> {
        self.if_sequence_number_le
    }

    /// Sequence number upper bound, exclusive.
    pub fn if_sequence_number_less_than(&self) -> Option<i64> {
        self.if_sequence_number_lt
    }

    /// Expected sequence number.
    pub fn if_sequence_number_equal(&self) -> Option<i64> {
        self.if_sequence_number_eq
    }

    /// Maximum blob size after the append.
    pub fn if_max_size_less_than_or_equal(&self) -> Option<i64> {
        self.if_max_size_less_than_or_equal
    }

    /// Expected append offset.
    pub fn if_append_position_equal(&self) -> Option<i64> {
        self.if_append_position_equal
    }

    /// Evaluate the ETag and date conditions against a resource locally.
    ///
    /// `etag` is `None` when the resource doesn't exist. The conditions are
    /// ANDed and unset ones are satisfied.
    pub fn verify_conditional(&self, etag: Option<&str>, last_modified: DateTime) -> bool {
        if let Some(since) = self.if_modified_since {
            if last_modified <= since {
                return false;
            }
        }

        if let Some(since) = self.if_unmodified_since {
            if last_modified > since {
                return false;
            }
        }

        let candidate = etag.map(normalize_etag);

        if let Some(if_match) = &self.if_match {
            if if_match != "*" && candidate.as_deref() != Some(if_match.as_str()) {
                return false;
            }
        }

        if let Some(if_none_match) = &self.if_none_match {
            // The wildcard matches any existing resource.
            let matched = if if_none_match == "*" {
                candidate.is_some()
            } else {
                candidate.as_deref() == Some(if_none_match.as_str())
            };
            if matched {
                return false;
            }
        }

        true
    }

    /// Write the ETag and date conditions and the lease id.
    pub fn apply_condition_to_request(&self, headers: &mut HeaderMap) -> Result<()> {
        insert_opt(headers, header::IF_MATCH, self.if_match.as_deref())?;
        insert_opt(headers, header::IF_NONE_MATCH, self.if_none_match.as_deref())?;
        insert_date(headers, header::IF_MODIFIED_SINCE, self.if_modified_since)?;
        insert_date(headers, header::IF_UNMODIFIED_SINCE, self.if_unmodified_since)?;
        self.apply_lease_condition_to_request(headers)
    }

    /// Write the lease id.
    pub fn apply_lease_condition_to_request(&self, headers: &mut HeaderMap) -> Result<()> {
        insert_opt(
            headers,
            HeaderName::from_static(X_MS_LEASE_ID),
            self.lease_id.as_deref(),
        )
    }

    /// Write the page blob sequence number conditions.
    pub fn apply_sequence_condition_to_request(&self, headers: &mut HeaderMap) -> Result<()> {
        insert_num(headers, X_MS_IF_SEQUENCE_NUMBER_LE, self.if_sequence_number_le)?;
        insert_num(headers, X_MS_IF_SEQUENCE_NUMBER_LT, self.if_sequence_number_lt)?;
        insert_num(headers, X_MS_IF_SEQUENCE_NUMBER_EQ, self.if_sequence_number_eq)
    }

    /// Write the append blob conditions.
    pub fn apply_append_condition_to_request(&self, headers: &mut HeaderMap) -> Result<()> {
        insert_num(
            headers,
            X_MS_BLOB_CONDITION_MAXSIZE,
            self.if_max_size_less_than_or_equal,
        )?;
        insert_num(
            headers,
            X_MS_BLOB_CONDITION_APPENDPOS,
            self.if_append_position_equal,
        )
    }

    /// Write the conditions as the `x-ms-source-if-*` headers of a copy.
    ///
    /// Leases can't be checked on a copy source, a condition carrying a
    /// lease id is rejected.
    pub fn apply_source_condition_to_request(&self, headers: &mut HeaderMap) -> Result<()> {
        if self.lease_id.is_some() {
            return Err(Error::request_invalid(
                "lease condition is not supported on a copy source",
            ));
        }

        insert_opt(
            headers,
            HeaderName::from_static(X_MS_SOURCE_IF_MATCH),
            self.if_match.as_deref(),
        )?;
        insert_opt(
            headers,
            HeaderName::from_static(X_MS_SOURCE_IF_NONE_MATCH),
            self.if_none_match.as_deref(),
        )?;
        insert_date(
            headers,
            HeaderName::from_static(X_MS_SOURCE_IF_MODIFIED_SINCE),
            self.if_modified_since,
        )?;
        insert_date(
            headers,
            HeaderName::from_static(X_MS_SOURCE_IF_UNMODIFIED_SINCE),
            self.if_unmodified_since,
        )
    }
}

fn insert_opt(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) -> Result<()> {
    if let Some(v) = value {
        headers.insert(name, HeaderValue::from_str(v)?);
    }
    Ok(())
}

fn insert_date(headers: &mut HeaderMap, name: HeaderName, value: Option<DateTime>) -> Result<()> {
    insert_opt(headers, name, value.map(format_http_date).as_deref())
}

fn insert_num(headers: &mut HeaderMap, name: &'static str, value: Option<i64>) -> Result<()> {
    insert_opt(
        headers,
        HeaderName::from_static(name),
        value.map(|v| v.to_string()).as_deref(),
    )
}
