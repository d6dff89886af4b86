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

//! Time related utils.

use crate::Error;
use chrono::NaiveDateTime;
use chrono::Utc;

/// DateTime in UTC, the only timezone the storage service speaks.
pub type DateTime = chrono::DateTime<Utc>;

/// Create a new DateTime from now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into HTTP date: "Sun, 06 Nov 1994 08:49:37 GMT"
///
/// Used by `x-ms-date` and the conditional date headers.
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Format time into ISO 8601 without fractional seconds: "2022-03-01T08:12:34Z"
///
/// This is the form shared access signatures expect for `st` and `se`.
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse HTTP date into DateTime.
pub fn parse_http_date(s: &str) -> crate::Result<DateTime> {
    NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S GMT")
        .map(|t| t.and_utc())
        .map_err(|e| Error::unexpected(format!("invalid http date: {s}")).with_source(e))
}

/// Parse a SAS timestamp into DateTime.
///
/// Accepts full RFC 3339 as well as the date-only `YYYY-MM-DD` form the
/// service allows for `st` and `se`.
pub fn parse_iso8601(s: &str) -> crate::Result<DateTime> {
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }

    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| Error::config_invalid(format!("invalid timestamp: {s}")))
}
