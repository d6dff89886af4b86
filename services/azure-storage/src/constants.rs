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

// Service version sent in `x-ms-version`, `api-version` and `sv`.
pub const TARGET_STORAGE_VERSION: &str = "2019-12-12";

// Headers used in azure services.
pub const X_MS_DATE: &str = "x-ms-date";
pub const X_MS_VERSION: &str = "x-ms-version";
pub const X_MS_CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";
pub const X_MS_REQUEST_ID: &str = "x-ms-request-id";
pub const CONTENT_MD5: &str = "content-md5";

// Conditional headers.
pub const X_MS_LEASE_ID: &str = "x-ms-lease-id";
pub const X_MS_SOURCE_IF_MODIFIED_SINCE: &str = "x-ms-source-if-modified-since";
pub const X_MS_SOURCE_IF_UNMODIFIED_SINCE: &str = "x-ms-source-if-unmodified-since";
pub const X_MS_SOURCE_IF_MATCH: &str = "x-ms-source-if-match";
pub const X_MS_SOURCE_IF_NONE_MATCH: &str = "x-ms-source-if-none-match";
pub const X_MS_IF_SEQUENCE_NUMBER_LE: &str = "x-ms-if-sequence-number-le";
pub const X_MS_IF_SEQUENCE_NUMBER_LT: &str = "x-ms-if-sequence-number-lt";
pub const X_MS_IF_SEQUENCE_NUMBER_EQ: &str = "x-ms-if-sequence-number-eq";
pub const X_MS_BLOB_CONDITION_MAXSIZE: &str = "x-ms-blob-condition-maxsize";
pub const X_MS_BLOB_CONDITION_APPENDPOS: &str = "x-ms-blob-condition-appendpos";

// Query parameters of shared access signatures.
pub const API_VERSION: &str = "api-version";
pub const SIGNED_VERSION: &str = "sv";
pub const SIGNATURE: &str = "sig";
pub const SIGNED_PERMISSIONS: &str = "sp";
pub const SIGNED_RESOURCE_TYPES: &str = "srt";
pub const SIGNED_SERVICES: &str = "ss";
pub const SIGNED_START: &str = "st";
pub const SIGNED_EXPIRY: &str = "se";
pub const SIGNED_IP: &str = "sip";
pub const SIGNED_PROTOCOLS: &str = "spr";

// Connection string keys.
pub const ACCOUNT_NAME: &str = "AccountName";
pub const ACCOUNT_KEY: &str = "AccountKey";
pub const SHARED_ACCESS_SIGNATURE: &str = "SharedAccessSignature";

// Status codes the retry engine treats specially.

/// Sentinel recorded when the attempt failed on the client side before any
/// response existed. Never retried.
pub const HTTP_CLIENT_EXCEPTION: u16 = 306;
/// Recorded when the transport returned no response at all. Retried.
pub const HTTP_NO_RESPONSE: u16 = 0;
pub const HTTP_NOT_FOUND: u16 = 404;
pub const HTTP_NOT_IMPLEMENTED: u16 = 501;
pub const HTTP_VERSION_NOT_SUPPORTED: u16 = 505;
