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

use std::fmt;

use azstore_core::{Error, Result};
use http::Uri;

/// One of the two geo-redundant endpoints of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageLocation {
    /// The primary, writable location.
    #[default]
    Primary,
    /// The read-only secondary location, which may lag behind the primary.
    Secondary,
}

impl StorageLocation {
    /// The other location.
    pub fn alternate(self) -> Self {
        match self {
            StorageLocation::Primary => StorageLocation::Secondary,
            StorageLocation::Secondary => StorageLocation::Primary,
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::Primary => f.write_str("primary"),
            StorageLocation::Secondary => f.write_str("secondary"),
        }
    }
}

/// Which locations a request may target, and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocationMode {
    /// Only the primary location.
    #[default]
    PrimaryOnly,
    /// Only the secondary location.
    SecondaryOnly,
    /// Start on the primary, alternate with the secondary on retries.
    PrimaryThenSecondary,
    /// Start on the secondary, alternate with the primary on retries.
    SecondaryThenPrimary,
}

impl LocationMode {
    /// Whether requests in this mode may be sent to `location`.
    pub fn can_use(self, location: StorageLocation) -> bool {
        match self {
            LocationMode::PrimaryOnly => location == StorageLocation::Primary,
            LocationMode::SecondaryOnly => location == StorageLocation::Secondary,
            LocationMode::PrimaryThenSecondary | LocationMode::SecondaryThenPrimary => true,
        }
    }

    /// Whether this mode ever targets the secondary location.
    pub fn uses_secondary(self) -> bool {
        self != LocationMode::PrimaryOnly
    }

    /// Location of the first attempt.
    pub fn initial_location(self) -> StorageLocation {
        match self {
            LocationMode::PrimaryOnly | LocationMode::PrimaryThenSecondary => {
                StorageLocation::Primary
            }
            LocationMode::SecondaryOnly | LocationMode::SecondaryThenPrimary => {
                StorageLocation::Secondary
            }
        }
    }

    /// Location to try after an attempt against `current` failed.
    ///
    /// Single-location modes stay put, dual modes alternate.
    pub fn next_location(self, current: StorageLocation) -> StorageLocation {
        match self {
            LocationMode::PrimaryOnly => StorageLocation::Primary,
            LocationMode::SecondaryOnly => StorageLocation::Secondary,
            LocationMode::PrimaryThenSecondary | LocationMode::SecondaryThenPrimary => {
                current.alternate()
            }
        }
    }
}

/// The primary and optional secondary URI of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    primary: Uri,
    secondary: Option<Uri>,
}

impl StorageUri {
    /// A resource that only lives on the primary location.
    pub fn new(primary: Uri) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    /// Attach the secondary URI.
    pub fn with_secondary(mut self, secondary: Uri) -> Self {
        self.secondary = Some(secondary);
        self
    }

    /// The primary URI.
    pub fn primary(&self) -> &Uri {
        &self.primary
    }

    /// The secondary URI, if the account is geo-replicated.
    pub fn secondary(&self) -> Option<&Uri> {
        self.secondary.as_ref()
    }

    /// URI for `location`, `None` if the secondary is requested but unknown.
    pub fn uri_for(&self, location: StorageLocation) -> Option<&Uri> {
        match location {
            StorageLocation::Primary => Some(&self.primary),
            StorageLocation::Secondary => self.secondary.as_ref(),
        }
    }

    /// Fail if `mode` needs a secondary URI this resource doesn't have.
    pub fn validate_location_mode(&self, mode: LocationMode) -> Result<()> {
        if mode.uses_secondary() && self.secondary.is_none() {
            return Err(Error::request_invalid(format!(
                "location mode {mode:?} requires a secondary endpoint"
            )));
        }
        Ok(())
    }

    /// Append `path` to both URIs.
    pub fn join(&self, path: &str) -> Result<Self> {
        Ok(Self {
            primary: join_path(&self.primary, path)?,
            secondary: self
                .secondary
                .as_ref()
                .map(|u| join_path(u, path))
                .transpose()?,
        })
    }
}

fn join_path(base: &Uri, path: &str) -> Result<Uri> {
    let base = base.to_string();
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Ok(joined.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(LocationMode::PrimaryOnly, StorageLocation::Primary, StorageLocation::Primary)]
    #[test_case(LocationMode::SecondaryOnly, StorageLocation::Secondary, StorageLocation::Secondary)]
    #[test_case(LocationMode::PrimaryThenSecondary, StorageLocation::Primary, StorageLocation::Secondary)]
    #[test_case(LocationMode::SecondaryThenPrimary, StorageLocation::Secondary, StorageLocation::Primary)]
    fn test_location_sequence(mode: LocationMode, first: StorageLocation, second: StorageLocation) {
        assert_eq!(mode.initial_location(), first);
        assert_eq!(mode.next_location(first), second);
        assert!(mode.can_use(first));
        assert!(mode.can_use(second));
    }

    #[test]
    fn test_single_location_modes() {
        assert!(!LocationMode::PrimaryOnly.can_use(StorageLocation::Secondary));
        assert!(!LocationMode::SecondaryOnly.can_use(StorageLocation::Primary));
    }

    #[test]
    fn test_storage_uri() {
        let uri = StorageUri::new("https://acct.blob.core.windows.net".parse().unwrap())
            .with_secondary("https://acct-secondary.blob.core.windows.net".parse().unwrap())
            .join("container/blob")
            .unwrap();

        assert_eq!(
            uri.uri_for(StorageLocation::Primary).unwrap().to_string(),
            "https://acct.blob.core.windows.net/container/blob"
        );
        assert_eq!(
            uri.uri_for(StorageLocation::Secondary).unwrap().to_string(),
            "https://acct-secondary.blob.core.windows.net/container/blob"
        );
        assert!(uri
            .validate_location_mode(LocationMode::SecondaryThenPrimary)
            .is_ok());

        let primary_only = StorageUri::new("https://acct.blob.core.windows.net".parse().unwrap());
        assert!(primary_only
            .validate_location_mode(LocationMode::PrimaryThenSecondary)
            .is_err());
        assert!(primary_only.uri_for(StorageLocation::Secondary).is_none());
    }
}
