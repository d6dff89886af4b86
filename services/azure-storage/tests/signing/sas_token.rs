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

use azstore_azure_storage::sas::{
    AccountPermission, AccountPermissions, AccountResourceTypes, AccountServices,
    SharedAccessAccountPolicy, SharedAccessProtocols,
};
use azstore_azure_storage::{RequestSigner, Service, StaticCredentialProvider, StorageKey};
use azstore_core::time::parse_iso8601;
use azstore_core::{Context, ErrorKind, Signer};
use pretty_assertions::assert_eq;

use super::DEV_KEY;

fn policy(protocols: SharedAccessProtocols) -> SharedAccessAccountPolicy {
    SharedAccessAccountPolicy::new(
        AccountPermissions::from([AccountPermission::Read, AccountPermission::List]),
        AccountServices::from([Service::Blob]),
        AccountResourceTypes::all(),
        parse_iso8601("2030-01-01T00:00:00Z").unwrap(),
    )
    .with_protocols(protocols)
}

fn sas_signer(token: &str) -> Signer<azstore_azure_storage::Credential> {
    Signer::new(
        Context::new(),
        StaticCredentialProvider::new_sas_token(token),
        RequestSigner::new(),
    )
}

#[tokio::test]
async fn test_generated_token_signs_requests() {
    let key = StorageKey::from_base64(DEV_KEY).unwrap();
    let token = policy(SharedAccessProtocols::HttpsOnly)
        .generate_sas_token("devstoreaccount1", &key)
        .unwrap();

    let mut parts = http::Request::get("https://devstoreaccount1.blob.core.windows.net/c/b.txt")
        .body(())
        .unwrap()
        .into_parts()
        .0;
    sas_signer(&format!("?{token}"))
        .sign(&mut parts, None)
        .await
        .unwrap();

    assert_eq!(
        parts.uri.to_string(),
        format!("https://devstoreaccount1.blob.core.windows.net/c/b.txt?{token}&api-version=2019-12-12")
    );
    assert_eq!(parts.headers["x-ms-version"], "2019-12-12");

    let parsed = SharedAccessAccountPolicy::from_query(parts.uri.query().unwrap()).unwrap();
    assert_eq!(parsed, policy(SharedAccessProtocols::HttpsOnly));
}

#[tokio::test]
async fn test_https_only_token_rejects_http() {
    let key = StorageKey::from_base64(DEV_KEY).unwrap();
    let token = policy(SharedAccessProtocols::HttpsOnly)
        .generate_sas_token("devstoreaccount1", &key)
        .unwrap();

    let mut parts = http::Request::get("http://127.0.0.1:10000/devstoreaccount1/c")
        .body(())
        .unwrap()
        .into_parts()
        .0;
    let err = sas_signer(&token).sign(&mut parts, None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
}

#[tokio::test]
async fn test_https_http_token_allows_http() {
    let key = StorageKey::from_base64(DEV_KEY).unwrap();
    let token = policy(SharedAccessProtocols::HttpsHttp)
        .generate_sas_token("devstoreaccount1", &key)
        .unwrap();

    let mut parts = http::Request::get("http://127.0.0.1:10000/devstoreaccount1/c?restype=container")
        .body(())
        .unwrap()
        .into_parts()
        .0;
    sas_signer(&token).sign(&mut parts, None).await.unwrap();

    assert_eq!(
        parts.uri.query().unwrap(),
        format!("restype=container&{token}&api-version=2019-12-12")
    );
}
