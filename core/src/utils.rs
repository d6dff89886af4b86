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

//! Helpers that keep secrets out of `Debug` output and logs.

use std::fmt::{Debug, Formatter};

/// Placeholder written in place of a masked query value.
pub const REDACTED: &str = "REDACTED";

/// Debug wrapper for secrets.
///
/// Values shorter than 12 bytes are fully masked, longer ones keep three
/// characters on each side so two different keys can still be told apart
/// in logs.
pub struct Redact<'a>(Option<&'a str>);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(Some(value))
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(Some(value.as_str()))
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref())
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let v = match self.0 {
            None => return f.write_str("None"),
            Some(v) => v,
        };

        match v.len() {
            0 => f.write_str("EMPTY"),
            n if n < 12 || !v.is_char_boundary(3) || !v.is_char_boundary(n - 3) => {
                f.write_str("***")
            }
            n => write!(f, "{}***{}", &v[..3], &v[n - 3..]),
        }
    }
}

/// Mask the value of every query parameter named `key` in `uri`.
///
/// Used before a signed URI is written to the log, so that SAS `sig`
/// values never leak.
pub fn redact_query(uri: &str, key: &str) -> String {
    let Some((base, query)) = uri.split_once('?') else {
        return uri.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, _)) if k.eq_ignore_ascii_case(key) => format!("{k}={REDACTED}"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{base}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let cases = vec![
            (Some("Short"), "***"),
            (Some("Hello World!"), "Hel***ld!"),
            (Some(""), "EMPTY"),
            (None, "None"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                format!("{:?}", Redact(input)),
                expected,
                "Failed on input: {:?}",
                input
            );
        }
    }

    #[test]
    fn test_redact_query() {
        assert_eq!(
            redact_query("https://a.blob.core.windows.net/c?sv=2019&sig=abc%3D&sp=r", "sig"),
            "https://a.blob.core.windows.net/c?sv=2019&sig=REDACTED&sp=r"
        );
        assert_eq!(
            redact_query("https://a.blob.core.windows.net/c", "sig"),
            "https://a.blob.core.windows.net/c"
        );
    }
}
