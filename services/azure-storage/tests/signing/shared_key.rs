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

use std::time::Duration;

use azstore_azure_storage::{
    AccessCondition, Credential, RequestSigner, StaticCredentialProvider, StorageKey,
};
use azstore_core::time::parse_http_date;
use azstore_core::{Context, Signer};
use http::header::AUTHORIZATION;
use pretty_assertions::assert_eq;

use super::DEV_KEY;

fn signer(key: StorageKey) -> Signer<Credential> {
    let time = parse_http_date("Tue, 01 Aug 2023 10:00:00 GMT").unwrap();
    Signer::new(
        Context::new(),
        StaticCredentialProvider::new_shared_key("acct", key),
        RequestSigner::new().with_time(time),
    )
}

fn list_request() -> http::request::Parts {
    http::Request::get("https://acct.blob.core.windows.net/container?restype=container&comp=list")
        .body(())
        .unwrap()
        .into_parts()
        .0
}

#[tokio::test]
async fn test_shared_key_signing_get() {
    let _ = env_logger::builder().is_test(true).try_init();

    let signer = signer(StorageKey::from_base64(DEV_KEY).unwrap());
    let mut parts = list_request();
    signer.sign(&mut parts, None).await.unwrap();

    assert_eq!(
        parts.headers[AUTHORIZATION],
        "SharedKey acct:lagS0ah4OUr1toRSHJa8StIKMjfdiK9mY5gpjhUAWXk="
    );
    assert_eq!(parts.headers["x-ms-date"], "Tue, 01 Aug 2023 10:00:00 GMT");
}

#[tokio::test]
async fn test_explicit_version_is_kept() {
    let signer = signer(StorageKey::from_base64(DEV_KEY).unwrap());
    let mut parts = list_request();
    parts
        .headers
        .insert("x-ms-version", "2023-01-03".parse().unwrap());

    signer.sign(&mut parts, None).await.unwrap();

    assert_eq!(parts.headers["x-ms-version"], "2023-01-03");
}

#[tokio::test]
async fn test_conditions_are_signed() {
    let signer = signer(StorageKey::from_base64(DEV_KEY).unwrap());

    let mut plain = list_request();
    signer.sign(&mut plain, None).await.unwrap();

    let mut conditional = list_request();
    AccessCondition::generate_lease_condition("lease-1")
        .with_if_match("abc")
        .apply_condition_to_request(&mut conditional.headers)
        .unwrap();
    signer.sign(&mut conditional, None).await.unwrap();

    assert_eq!(conditional.headers["if-match"], "\"abc\"");
    assert_eq!(conditional.headers["x-ms-lease-id"], "lease-1");
    assert_ne!(
        plain.headers[AUTHORIZATION],
        conditional.headers[AUTHORIZATION]
    );
}

#[tokio::test]
async fn test_rotated_key_changes_signature() {
    let signer = signer(StorageKey::from_base64(DEV_KEY).unwrap());

    let mut before = list_request();
    signer.sign(&mut before, None).await.unwrap();

    let rotated = Credential::with_shared_key("acct", StorageKey::from_base64(DEV_KEY).unwrap())
        .update_key(StorageKey::new(b"another key".to_vec()))
        .unwrap();
    signer.rotate(rotated);

    let mut after = list_request();
    signer.sign(&mut after, None).await.unwrap();

    assert_ne!(before.headers[AUTHORIZATION], after.headers[AUTHORIZATION]);
    assert!(after.headers[AUTHORIZATION]
        .to_str()
        .unwrap()
        .starts_with("SharedKey acct:"));
}

#[tokio::test]
async fn test_shared_key_signing_query() {
    let signer = signer(StorageKey::from_base64(DEV_KEY).unwrap());
    let mut parts = list_request();

    signer
        .sign(&mut parts, Some(Duration::from_secs(3600)))
        .await
        .unwrap();

    assert!(!parts.headers.contains_key(AUTHORIZATION));
    let query = parts.uri.query().unwrap();
    assert!(query.starts_with("restype=container&comp=list&sv=2019-12-12&ss=bfqt"));
    assert!(query.contains("&se=2023-08-01T11%3A00%3A00Z&"));
    assert!(query.contains("&sig="));
}
