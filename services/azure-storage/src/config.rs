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

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use azstore_core::utils::Redact;
use azstore_core::{Context, Error, Result};
use http::Uri;
use log::debug;

use crate::connection_string;
use crate::constants::*;
use crate::credential::Credential;
use crate::location::StorageUri;
use crate::service::Service;

/// Env var holding a full connection string.
pub const AZURE_STORAGE_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";
/// Env var holding the account name.
pub const AZURE_STORAGE_ACCOUNT_NAME: &str = "AZURE_STORAGE_ACCOUNT_NAME";
/// Env var holding the base64 account key.
pub const AZURE_STORAGE_ACCOUNT_KEY: &str = "AZURE_STORAGE_ACCOUNT_KEY";
/// Env var holding a SAS token.
pub const AZURE_STORAGE_SAS_TOKEN: &str = "AZURE_STORAGE_SAS_TOKEN";
/// Env var holding the primary endpoint.
pub const AZURE_STORAGE_ENDPOINT: &str = "AZURE_STORAGE_ENDPOINT";
/// Env var holding the secondary endpoint.
pub const AZURE_STORAGE_SECONDARY_ENDPOINT: &str = "AZURE_STORAGE_SECONDARY_ENDPOINT";

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Settings of a storage account.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_ACCOUNT_NAME`]
    /// - connection string: `AccountName`
    pub account_name: Option<String>,
    /// `account_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_ACCOUNT_KEY`]
    /// - connection string: `AccountKey`
    pub account_key: Option<String>,
    /// `sas_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_SAS_TOKEN`]
    /// - connection string: `SharedAccessSignature`
    pub sas_token: Option<String>,
    /// Primary endpoint of [`Config::service`].
    ///
    /// Derived from the account name when unset.
    pub endpoint: Option<String>,
    /// Secondary endpoint of [`Config::service`].
    pub secondary_endpoint: Option<String>,
    /// The service the endpoints point at.
    pub service: Service,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_name", &self.account_name)
            .field("account_key", &Redact::from(&self.account_key))
            .field("sas_token", &Redact::from(&self.sas_token))
            .field("endpoint", &self.endpoint)
            .field("secondary_endpoint", &self.secondary_endpoint)
            .field("service", &self.service)
            .finish()
    }
}

impl Config {
    /// An empty config for `service`.
    pub fn new(service: Service) -> Self {
        Self {
            service,
            ..Self::default()
        }
    }

    /// Fill unset fields from the environment.
    ///
    /// [`AZURE_STORAGE_CONNECTION_STRING`] is read first, the individual
    /// variables then take precedence over it. A key or SAS token set on
    /// this config or in its own variable replaces both credentials of the
    /// connection string.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        let envs = ctx.env_vars();

        let mut from_conn = match envs.get(AZURE_STORAGE_CONNECTION_STRING) {
            Some(conn) => Self::from_connection_string(conn, self.service)?,
            None => Self::new(self.service),
        };

        let has_own_secret = self.account_key.is_some()
            || self.sas_token.is_some()
            || envs.contains_key(AZURE_STORAGE_ACCOUNT_KEY)
            || envs.contains_key(AZURE_STORAGE_SAS_TOKEN);
        if has_own_secret {
            from_conn.account_key = None;
            from_conn.sas_token = None;
        }

        let pick = |field: Option<String>, env: &str, conn: Option<String>| {
            field.or_else(|| envs.get(env).cloned()).or(conn)
        };

        self.account_name = pick(
            self.account_name,
            AZURE_STORAGE_ACCOUNT_NAME,
            from_conn.account_name,
        );
        self.account_key = pick(
            self.account_key,
            AZURE_STORAGE_ACCOUNT_KEY,
            from_conn.account_key,
        );
        self.sas_token = pick(self.sas_token, AZURE_STORAGE_SAS_TOKEN, from_conn.sas_token);
        self.endpoint = pick(self.endpoint, AZURE_STORAGE_ENDPOINT, from_conn.endpoint);
        self.secondary_endpoint = pick(
            self.secondary_endpoint,
            AZURE_STORAGE_SECONDARY_ENDPOINT,
            from_conn.secondary_endpoint,
        );

        debug!("loaded config from env: {self:?}");
        Ok(self)
    }

    /// Parses an [Azure connection string][1] into a configuration object.
    ///
    /// The connection string doesn't have to specify all parameters, the
    /// caller can still set them on the returned value. `service` picks the
    /// endpoint fields that are read.
    ///
    /// An example of a connection string looks like:
    ///
    /// ```txt
    /// AccountName=mystorageaccount;
    /// AccountKey=Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==;
    /// BlobEndpoint=https://mystorageaccount.blob.core.windows.net
    /// ```
    ///
    /// [1]: https://learn.microsoft.com/en-us/azure/storage/common/storage-configure-connection-string
    pub fn from_connection_string(conn_str: &str, service: Service) -> Result<Self> {
        connection_string::parse(conn_str, service)
    }

    /// The credential these settings describe, `None` for anonymous access.
    pub fn credential(&self) -> Result<Option<Credential>> {
        let settings: HashMap<String, String> = [
            (ACCOUNT_NAME, &self.account_name),
            (ACCOUNT_KEY, &self.account_key),
            (SHARED_ACCESS_SIGNATURE, &self.sas_token),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k.to_string(), v.clone())))
        .collect();

        Credential::try_parse_credentials(&settings)
    }

    /// Primary and secondary endpoints of the service.
    pub fn storage_uri(&self) -> Result<StorageUri> {
        let (primary, secondary) = match (&self.endpoint, &self.account_name) {
            (Some(endpoint), _) => (endpoint.clone(), self.secondary_endpoint.clone()),
            (None, Some(account)) => {
                let service = self.service.endpoint_name();
                (
                    format!("https://{account}.{service}.{DEFAULT_ENDPOINT_SUFFIX}"),
                    self.secondary_endpoint.clone().or_else(|| {
                        Some(format!(
                            "https://{account}-secondary.{service}.{DEFAULT_ENDPOINT_SUFFIX}"
                        ))
                    }),
                )
            }
            (None, None) => {
                return Err(Error::config_invalid(
                    "either an endpoint or an account name is required",
                ))
            }
        };

        let mut uri = StorageUri::new(parse_endpoint(&primary)?);
        if let Some(secondary) = secondary {
            uri = uri.with_secondary(parse_endpoint(&secondary)?);
        }
        Ok(uri)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Uri> {
    endpoint
        .trim_end_matches('/')
        .parse()
        .map_err(|e| Error::config_invalid(format!("invalid endpoint {endpoint:?}")).with_source(e))
}
