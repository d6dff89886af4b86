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

use azstore_core::time::{format_iso8601, parse_iso8601, DateTime};
use azstore_core::{Error, Result};
use log::debug;

use super::{AccountPermissions, AccountResourceTypes, AccountServices, IpRange, SharedAccessProtocols};
use crate::constants::*;
use crate::key::StorageKey;

/// The parameters of an account SAS.
///
/// See <https://learn.microsoft.com/en-us/rest/api/storageservices/create-account-sas>.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedAccessAccountPolicy {
    /// `sp`
    pub permissions: AccountPermissions,
    /// `ss`
    pub services: AccountServices,
    /// `srt`
    pub resource_types: AccountResourceTypes,
    /// `st`
    pub start: Option<DateTime>,
    /// `se`
    pub expiry: Option<DateTime>,
    /// `sip`
    pub ip_range: Option<IpRange>,
    /// `spr`
    pub protocols: Option<SharedAccessProtocols>,
}

impl SharedAccessAccountPolicy {
    /// A policy with the mandatory fields set.
    pub fn new(
        permissions: AccountPermissions,
        services: AccountServices,
        resource_types: AccountResourceTypes,
        expiry: DateTime,
    ) -> Self {
        Self {
            permissions,
            services,
            resource_types,
            expiry: Some(expiry),
            ..Self::default()
        }
    }

    /// Set the start time.
    pub fn with_start(mut self, start: DateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Restrict the source addresses.
    pub fn with_ip_range(mut self, ip_range: IpRange) -> Self {
        self.ip_range = Some(ip_range);
        self
    }

    /// Restrict the protocols.
    pub fn with_protocols(mut self, protocols: SharedAccessProtocols) -> Self {
        self.protocols = Some(protocols);
        self
    }

    /// The string signed for `account_name`.
    pub fn string_to_sign(&self, account_name: &str) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
            account_name,
            self.permissions,
            self.services,
            self.resource_types,
            self.start.map(format_iso8601).unwrap_or_default(),
            self.expiry.map(format_iso8601).unwrap_or_default(),
            self.ip_range.map(|v| v.to_string()).unwrap_or_default(),
            self.protocols.map(|v| v.as_str()).unwrap_or_default(),
            TARGET_STORAGE_VERSION,
        )
    }

    /// Sign the policy and return the SAS query string, without leading `?`.
    pub fn generate_sas_token(&self, account_name: &str, key: &StorageKey) -> Result<String> {
        if self.permissions.is_empty()
            || self.services.is_empty()
            || self.resource_types.is_empty()
        {
            return Err(Error::request_invalid(
                "account SAS needs permissions, services and resource types",
            ));
        }
        let Some(expiry) = self.expiry else {
            return Err(Error::request_invalid("account SAS needs an expiry time"));
        };

        let string_to_sign = self.string_to_sign(account_name);
        debug!("account SAS string to sign: {string_to_sign:?}");
        let signature = key.compute_mac_sha256(&string_to_sign);

        let mut elements: Vec<(&str, String)> = vec![
            (SIGNED_VERSION, TARGET_STORAGE_VERSION.to_string()),
            (SIGNED_SERVICES, self.services.to_string()),
            (SIGNED_RESOURCE_TYPES, self.resource_types.to_string()),
            (SIGNED_PERMISSIONS, self.permissions.to_string()),
        ];
        if let Some(start) = self.start {
            elements.push((SIGNED_START, format_iso8601(start)));
        }
        elements.push((SIGNED_EXPIRY, format_iso8601(expiry)));
        if let Some(ip) = self.ip_range {
            elements.push((SIGNED_IP, ip.to_string()));
        }
        if let Some(protocols) = self.protocols {
            elements.push((SIGNED_PROTOCOLS, protocols.to_string()));
        }
        elements.push((SIGNATURE, signature));

        Ok(elements
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoded(v)))
            .collect::<Vec<_>>()
            .join("&"))
    }

    /// Read the policy fields back out of a SAS query string.
    ///
    /// Unknown parameters, including `sv` and `sig`, are ignored.
    pub fn from_query(token: &str) -> Result<Self> {
        let mut policy = Self::default();

        for (k, v) in form_urlencoded::parse(token.trim_start_matches('?').as_bytes()) {
            match k.as_ref() {
                SIGNED_PERMISSIONS => policy.permissions = v.parse()?,
                SIGNED_SERVICES => policy.services = v.parse()?,
                SIGNED_RESOURCE_TYPES => policy.resource_types = v.parse()?,
                SIGNED_START => policy.start = Some(parse_iso8601(&v)?),
                SIGNED_EXPIRY => policy.expiry = Some(parse_iso8601(&v)?),
                SIGNED_IP => policy.ip_range = Some(v.parse()?),
                SIGNED_PROTOCOLS => policy.protocols = Some(v.parse()?),
                _ => {}
            }
        }

        Ok(policy)
    }
}

fn urlencoded(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
