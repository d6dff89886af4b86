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

use std::fmt::{self, Display};
use std::str::FromStr;

use azstore_core::{Error, Result};

/// Protocols a SAS may be used over, the `spr` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedAccessProtocols {
    /// HTTPS only.
    HttpsOnly,
    /// HTTPS or HTTP.
    HttpsHttp,
}

impl SharedAccessProtocols {
    /// The `spr` encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            SharedAccessProtocols::HttpsOnly => "https",
            SharedAccessProtocols::HttpsHttp => "https,http",
        }
    }
}

impl Display for SharedAccessProtocols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharedAccessProtocols {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "https" => Ok(SharedAccessProtocols::HttpsOnly),
            "https,http" => Ok(SharedAccessProtocols::HttpsHttp),
            _ => Err(Error::config_invalid(format!(
                "invalid shared access protocols {s:?}"
            ))),
        }
    }
}
