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

use std::fmt::{Debug, Formatter};

use azstore_core::hash::{base64_decode, base64_encode};
use azstore_core::Result;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};

/// An account key with its MACs prepared up front.
///
/// The key schedules are built once when the key is created and cloned for
/// every signature, so a `StorageKey` can be shared between threads and
/// used concurrently without any locking.
#[derive(Clone)]
pub struct StorageKey {
    key: Vec<u8>,
    hmac_sha256: Hmac<Sha256>,
    hmac_sha512: Hmac<Sha512>,
}

impl Debug for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageKey").field("key", &"[key hidden]").finish()
    }
}

impl PartialEq for StorageKey {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for StorageKey {}

impl StorageKey {
    /// Build from raw key bytes.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        let key = key.into();
        // SAFETY: HMAC's new_from_slice always returns Ok - it handles any key length
        let hmac_sha256 = Hmac::<Sha256>::new_from_slice(&key).unwrap();
        let hmac_sha512 = Hmac::<Sha512>::new_from_slice(&key).unwrap();

        Self {
            key,
            hmac_sha256,
            hmac_sha512,
        }
    }

    /// Build from the base64 form used in connection strings and the portal.
    pub fn from_base64(key: &str) -> Result<Self> {
        Ok(Self::new(base64_decode(key)?))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// The key in base64.
    pub fn export_base64(&self) -> String {
        base64_encode(&self.key)
    }

    /// Base64 HMAC-SHA256 of `string_to_sign`.
    pub fn compute_mac_sha256(&self, string_to_sign: &str) -> String {
        let mut mac = self.hmac_sha256.clone();
        mac.update(string_to_sign.as_bytes());
        base64_encode(&mac.finalize().into_bytes())
    }

    /// Base64 HMAC-SHA512 of `string_to_sign`.
    pub fn compute_mac_sha512(&self, string_to_sign: &str) -> String {
        let mut mac = self.hmac_sha512.clone();
        mac.update(string_to_sign.as_bytes());
        base64_encode(&mac.finalize().into_bytes())
    }
}
