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
use std::net::Ipv4Addr;
use std::str::FromStr;

use azstore_core::{Error, Result};

/// IPv4 addresses a SAS accepts requests from, the `sip` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpRange {
    min: Ipv4Addr,
    max: Option<Ipv4Addr>,
}

impl IpRange {
    /// A single address.
    pub fn new(ip: Ipv4Addr) -> Self {
        Self { min: ip, max: None }
    }

    /// An inclusive range, `min` must not be above `max`.
    pub fn with_range(min: Ipv4Addr, max: Ipv4Addr) -> Result<Self> {
        if min > max {
            return Err(Error::config_invalid(format!(
                "invalid ip range: {min} is above {max}"
            )));
        }
        Ok(Self {
            min,
            max: Some(max),
        })
    }

    /// Lowest address.
    pub fn min(&self) -> Ipv4Addr {
        self.min
    }

    /// Highest address, same as `min` for a single address.
    pub fn max(&self) -> Ipv4Addr {
        self.max.unwrap_or(self.min)
    }
}

impl Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{}", self.min, max),
            None => write!(f, "{}", self.min),
        }
    }
}

impl FromStr for IpRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |v: &str| {
            v.trim().parse::<Ipv4Addr>().map_err(|e| {
                Error::config_invalid(format!("invalid ip range {s:?}")).with_source(e)
            })
        };

        match s.split_once('-') {
            Some((min, max)) => Self::with_range(parse(min)?, parse(max)?),
            None => Ok(Self::new(parse(s)?)),
        }
    }
}
