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

use azstore_core::{Error, Result};

use crate::constants::*;
use crate::{Config, Service};

// Storage emulator defaults.
const DEVELOPMENT_STORAGE_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEVELOPMENT_STORAGE_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEVELOPMENT_STORAGE_HOST: &str = "http://127.0.0.1";

/// Parses an [Azure connection string][1].
///
/// Credentials are copied as found, conflicting ones are reported when the
/// credential is built.
///
/// [1]: https://learn.microsoft.com/en-us/azure/storage/common/storage-configure-connection-string
pub(crate) fn parse(conn_str: &str, service: Service) -> Result<Config> {
    let key_values = parse_into_key_values(conn_str)?;

    if let Some(development_config) = collect_development_config(&key_values, service) {
        return Ok(development_config);
    }

    let (endpoint, secondary_endpoint) = collect_endpoints(&key_values, service)?;

    Ok(Config {
        account_name: key_values.get(ACCOUNT_NAME).cloned(),
        account_key: key_values.get(ACCOUNT_KEY).cloned(),
        sas_token: key_values.get(SHARED_ACCESS_SIGNATURE).cloned(),
        endpoint,
        secondary_endpoint,
        service,
    })
}

fn parse_into_key_values(conn_str: &str) -> Result<HashMap<String, String>> {
    conn_str
        .trim()
        .replace('\n', "")
        .split(';')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            let (key, value) = field.split_once('=').ok_or_else(|| {
                Error::config_invalid(format!(
                    "invalid connection string, expected '=' in field: {field}"
                ))
            })?;
            Ok((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn collect_development_config(
    key_values: &HashMap<String, String>,
    service: Service,
) -> Option<Config> {
    if key_values.get("UseDevelopmentStorage").map(String::as_str) != Some("true") {
        return None;
    }
    // Not served by the emulator, treat as a regular connection string.
    let port = service.development_port()?;

    let account_name = key_values
        .get(ACCOUNT_NAME)
        .cloned()
        .unwrap_or(DEVELOPMENT_STORAGE_ACCOUNT_NAME.to_string());
    let account_key = key_values
        .get(ACCOUNT_KEY)
        .cloned()
        .unwrap_or(DEVELOPMENT_STORAGE_ACCOUNT_KEY.to_string());
    let proxy_uri = key_values
        .get("DevelopmentStorageProxyUri")
        .cloned()
        .unwrap_or(format!("{DEVELOPMENT_STORAGE_HOST}:{port}"));

    Some(Config {
        endpoint: Some(format!("{proxy_uri}/{account_name}")),
        secondary_endpoint: Some(format!("{proxy_uri}/{account_name}-secondary")),
        account_name: Some(account_name),
        account_key: Some(account_key),
        sas_token: None,
        service,
    })
}

/// Parses the primary and secondary endpoints if possible.
///
/// Users are still able to set endpoints on the config later, so none of the
/// endpoint fields are enforced.
fn collect_endpoints(
    key_values: &HashMap<String, String>,
    service: Service,
) -> Result<(Option<String>, Option<String>)> {
    if let Some(endpoint) = key_values.get(service.endpoint_key()) {
        return Ok((
            Some(endpoint.clone()),
            key_values.get(service.secondary_endpoint_key()).cloned(),
        ));
    }

    let (account_name, endpoint_suffix) = match (
        key_values.get(ACCOUNT_NAME),
        key_values.get("EndpointSuffix"),
    ) {
        (Some(name), Some(suffix)) => (name, suffix),
        // Can't build an endpoint if one of them is missing.
        _ => return Ok((None, None)),
    };

    let protocol = key_values
        .get("DefaultEndpointsProtocol")
        .map(String::as_str)
        .unwrap_or("https");
    if protocol != "http" && protocol != "https" {
        return Err(Error::config_invalid(format!(
            "invalid DefaultEndpointsProtocol: {protocol}"
        )));
    }

    let name = service.endpoint_name();
    Ok((
        Some(format!("{protocol}://{account_name}.{name}.{endpoint_suffix}")),
        Some(format!(
            "{protocol}://{account_name}-secondary.{name}.{endpoint_suffix}"
        )),
    ))
}
