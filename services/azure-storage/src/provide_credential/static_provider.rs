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

use async_trait::async_trait;
use azstore_core::{Context, ProvideCredential, Result};

use crate::credential::Credential;
use crate::key::StorageKey;

/// Always provides the same credential.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Provide `credential`.
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// Provide a Shared Key credential.
    pub fn new_shared_key(account_name: &str, key: StorageKey) -> Self {
        Self::new(Credential::with_shared_key(account_name, key))
    }

    /// Provide a SAS credential.
    pub fn new_sas_token(sas_token: &str) -> Self {
        Self::new(Credential::with_sas_token(sas_token))
    }

    /// Provide anonymous access.
    pub fn new_anonymous() -> Self {
        Self::new(Credential::Anonymous)
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.credential.clone()))
    }
}
