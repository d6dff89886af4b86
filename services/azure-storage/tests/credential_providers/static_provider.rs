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

use azstore_azure_storage::{Credential, StaticCredentialProvider, StorageKey};
use azstore_core::{Context, ProvideCredential};

#[tokio::test]
async fn test_static_provider_shared_key() {
    let key = StorageKey::new(b"secret".to_vec());
    let provider = StaticCredentialProvider::new_shared_key("acct", key.clone());

    let cred = provider
        .provide_credential(&Context::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(cred, Credential::with_shared_key("acct", key));
    assert_eq!(cred.account_name(), Some("acct"));
    assert!(!format!("{cred:?}").contains("c2VjcmV0"));
}

#[tokio::test]
async fn test_static_provider_sas_token() {
    let provider = StaticCredentialProvider::new_sas_token("?sv=2019-12-12&spr=https&sig=abc");

    let cred = provider
        .provide_credential(&Context::new())
        .await
        .unwrap()
        .unwrap();

    assert!(cred.is_https_only());
    assert_eq!(cred.account_name(), None);
}

#[tokio::test]
async fn test_static_provider_anonymous() {
    let cred = StaticCredentialProvider::new_anonymous()
        .provide_credential(&Context::new())
        .await
        .unwrap();

    assert_eq!(cred, Some(Credential::Anonymous));
}
