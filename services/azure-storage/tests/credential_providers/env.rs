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

use azstore_azure_storage::{
    Config, Credential, EnvCredentialProvider, Service, StorageLocation,
    AZURE_STORAGE_ACCOUNT_KEY, AZURE_STORAGE_ACCOUNT_NAME, AZURE_STORAGE_CONNECTION_STRING,
    AZURE_STORAGE_SAS_TOKEN,
};
use azstore_core::{Context, ErrorKind, ProvideCredential, StaticEnv};
use pretty_assertions::assert_eq;

use crate::signing::DEV_KEY;

fn context(envs: &[(&str, &str)]) -> Context {
    Context::new().with_env(StaticEnv {
        envs: envs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    })
}

#[tokio::test]
async fn test_env_provider_shared_key() {
    let ctx = context(&[
        (AZURE_STORAGE_ACCOUNT_NAME, "acct"),
        (AZURE_STORAGE_ACCOUNT_KEY, DEV_KEY),
    ]);

    let cred = EnvCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .unwrap();

    assert_eq!(
        cred,
        Some(Credential::with_shared_key_base64("acct", DEV_KEY).unwrap())
    );
}

#[tokio::test]
async fn test_env_provider_connection_string() {
    let ctx = context(&[(
        AZURE_STORAGE_CONNECTION_STRING,
        "UseDevelopmentStorage=true",
    )]);

    let cred = EnvCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cred.account_name(), Some("devstoreaccount1"));

    let uri = Config::new(Service::Queue)
        .from_env(&ctx)
        .unwrap()
        .storage_uri()
        .unwrap();
    assert_eq!(
        uri.uri_for(StorageLocation::Primary).unwrap().to_string(),
        "http://127.0.0.1:10001/devstoreaccount1"
    );
    assert_eq!(
        uri.uri_for(StorageLocation::Secondary).unwrap().to_string(),
        "http://127.0.0.1:10001/devstoreaccount1-secondary"
    );
}

#[tokio::test]
async fn test_env_provider_conflicting_credentials() {
    let ctx = context(&[
        (AZURE_STORAGE_ACCOUNT_NAME, "acct"),
        (AZURE_STORAGE_ACCOUNT_KEY, DEV_KEY),
        (AZURE_STORAGE_SAS_TOKEN, "sv=2019-12-12&sig=abc"),
    ]);

    let err = EnvCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[tokio::test]
async fn test_env_provider_without_credentials() {
    let cred = EnvCredentialProvider::new()
        .provide_credential(&context(&[]))
        .await
        .unwrap();

    assert_eq!(cred, None);
}
