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
use azstore_core::{Error, Result, SigningCredential};
use http::Uri;
use log::warn;

use crate::constants::*;
use crate::key::StorageKey;

/// How requests to an account are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Shared Key authentication with the account key.
    SharedKey {
        /// Azure storage account name.
        account_name: String,
        /// The account key, ready to sign.
        key: StorageKey,
    },
    /// A pre-signed shared access signature.
    SasToken {
        /// SAS token without the leading `?`.
        token: String,
        /// Whether the token only allows HTTPS, read from its `spr` field.
        https_only: bool,
    },
    /// No authentication, for public resources.
    Anonymous,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::SharedKey { account_name, key } => f
                .debug_struct("Credential::SharedKey")
                .field("account_name", account_name)
                .field("key", key)
                .finish(),
            Credential::SasToken { token, https_only } => f
                .debug_struct("Credential::SasToken")
                .field("token", &Redact::from(token))
                .field("https_only", https_only)
                .finish(),
            Credential::Anonymous => f.write_str("Credential::Anonymous"),
        }
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        match self {
            Credential::SharedKey { account_name, .. } => !account_name.is_empty(),
            Credential::SasToken { token, .. } => !token.is_empty(),
            Credential::Anonymous => true,
        }
    }
}

impl Credential {
    /// Shared Key credential.
    pub fn with_shared_key(account_name: &str, key: StorageKey) -> Self {
        Self::SharedKey {
            account_name: account_name.to_string(),
            key,
        }
    }

    /// Shared Key credential from a base64 account key.
    pub fn with_shared_key_base64(account_name: &str, account_key: &str) -> Result<Self> {
        Ok(Self::with_shared_key(
            account_name,
            StorageKey::from_base64(account_key)?,
        ))
    }

    /// SAS credential.
    ///
    /// The protocol restriction is read from the token's `spr` field. The
    /// token is only HTTPS-only when `spr` is exactly `https`; a missing or
    /// unrecognised value is treated as allowing HTTP too.
    pub fn with_sas_token(token: &str) -> Self {
        let token = token.trim_start_matches('?').to_string();
        let https_only = form_urlencoded::parse(token.as_bytes())
            .find(|(k, _)| k == SIGNED_PROTOCOLS)
            .is_some_and(|(_, v)| v == "https");

        Self::SasToken { token, https_only }
    }

    /// The account name, only known for Shared Key credentials.
    pub fn account_name(&self) -> Option<&str> {
        match self {
            Credential::SharedKey { account_name, .. } => Some(account_name),
            _ => None,
        }
    }

    /// Whether requests must use HTTPS.
    pub fn is_https_only(&self) -> bool {
        matches!(self, Credential::SasToken { https_only: true, .. })
    }

    /// Rotate the account key, returning the new credential.
    ///
    /// Only valid for Shared Key credentials.
    pub fn update_key(&self, key: StorageKey) -> Result<Self> {
        match self {
            Credential::SharedKey { account_name, .. } => Ok(Self::SharedKey {
                account_name: account_name.clone(),
                key,
            }),
            _ => Err(Error::credential_invalid(
                "only shared key credentials have a key to update",
            )),
        }
    }

    /// Add the credential to a resource URI.
    ///
    /// SAS credentials append their token and `api-version`, other
    /// credentials return the URI unchanged.
    pub fn transform_uri(&self, uri: &Uri) -> Result<Uri> {
        let Credential::SasToken { token, https_only } = self else {
            return Ok(uri.clone());
        };

        if *https_only && uri.scheme_str() != Some("https") {
            return Err(Error::request_invalid(
                "the SAS token only allows HTTPS but the URI is not HTTPS",
            ));
        }

        let mut s = uri.to_string();
        let mut sep = if uri.query().is_some() { '&' } else { '?' };
        if !token.is_empty() {
            s.push(sep);
            s.push_str(token);
            sep = '&';
        }
        let has_api_version =
            form_urlencoded::parse(token.as_bytes()).any(|(k, _)| k == API_VERSION);
        if !has_api_version {
            s.push(sep);
            s.push_str(API_VERSION);
            s.push('=');
            s.push_str(TARGET_STORAGE_VERSION);
        }

        Ok(s.parse()?)
    }

    /// Connection string fragment for this credential.
    ///
    /// Secrets are hidden unless `export_secrets` is true.
    pub fn to_string(&self, export_secrets: bool) -> String {
        match self {
            Credential::SharedKey { account_name, key } => format!(
                "{ACCOUNT_NAME}={account_name};{ACCOUNT_KEY}={}",
                if export_secrets {
                    key.export_base64()
                } else {
                    "[key hidden]".to_string()
                }
            ),
            Credential::SasToken { token, .. } => format!(
                "{SHARED_ACCESS_SIGNATURE}={}",
                if export_secrets {
                    token.as_str()
                } else {
                    "[signature hidden]"
                }
            ),
            Credential::Anonymous => String::new(),
        }
    }

    /// Pick the credential described by connection string settings.
    ///
    /// Returns `Ok(None)` if the settings carry no credential at all.
    pub fn try_parse_credentials(settings: &HashMap<String, String>) -> Result<Option<Self>> {
        let get = |name: &str| {
            settings
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        };

        match (
            get(ACCOUNT_NAME),
            get(ACCOUNT_KEY),
            get(SHARED_ACCESS_SIGNATURE),
        ) {
            (_, Some(_), Some(_)) => Err(Error::config_invalid(format!(
                "{ACCOUNT_KEY} and {SHARED_ACCESS_SIGNATURE} can't be used together"
            ))),
            (Some(name), Some(key), None) => {
                Ok(Some(Self::with_shared_key_base64(name, key)?))
            }
            (None, Some(_), None) => Err(Error::config_invalid(format!(
                "{ACCOUNT_KEY} requires {ACCOUNT_NAME}"
            ))),
            (_, None, Some(token)) => Ok(Some(Self::with_sas_token(token))),
            (_, None, None) => {
                warn!("no credential found in connection settings");
                Ok(None)
            }
        }
    }
}
