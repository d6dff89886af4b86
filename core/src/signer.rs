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

use crate::{Context, ProvideCredential, Result, SignRequest, SigningCredential};
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Signer ties a credential provider to a request signer and caches the
/// credential between calls.
///
/// Credentials are immutable values. Rotating a key means building a new
/// credential and handing it to [`Signer::rotate`]; requests signed
/// concurrently see either the old or the new value, never a mix.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            builder: Arc::new(builder),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// The context this signer was built with.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Replace the cached credential, for example after a key rotation.
    pub fn rotate(&self, credential: K) {
        *self.credential.lock().expect("lock poisoned") = Some(credential);
    }

    /// Sign the request.
    pub async fn sign(
        &self,
        req: &mut http::request::Parts,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let cached = self.credential.lock().expect("lock poisoned").clone();
        let credential = if cached.is_valid() {
            cached
        } else {
            debug!("no valid cached credential, loading from provider");
            let loaded = self.provider.provide_credential(&self.ctx).await?;
            *self.credential.lock().expect("lock poisoned") = loaded.clone();
            loaded
        };

        self.builder
            .sign_request(&self.ctx, req, credential.as_ref(), expires_in)
            .await
    }
}
