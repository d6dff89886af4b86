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

//! Account shared access signatures.
//!
//! Permissions, services and resource types each have a fixed one character
//! alphabet. Sets of them always print in declaration order, whatever order
//! they were built in, and parsing rejects any character outside the
//! alphabet.

use std::collections::BTreeSet;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use azstore_core::{Error, Result};

mod account;
pub use account::SharedAccessAccountPolicy;

mod ip_range;
pub use ip_range::IpRange;

mod protocols;
pub use protocols::SharedAccessProtocols;

use crate::service::Service;

/// A flag with a single character encoding in SAS tokens.
///
/// The `Ord` implementation must follow declaration order, which derived
/// `Ord` does.
pub trait SasFlag: Copy + Ord + Debug + Send + Sync + 'static {
    /// Every flag, in declaration order.
    const ALL: &'static [Self];
    /// Human readable name of the flag family, used in errors.
    const KIND: &'static str;

    /// The encoding of this flag.
    fn as_char(self) -> char;

    /// The flag encoded as `c`.
    fn from_char(c: char) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_char() == c)
    }
}

/// A set of [`SasFlag`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SasFlags<F: SasFlag>(BTreeSet<F>);

impl<F: SasFlag> Default for SasFlags<F> {
    fn default() -> Self {
        Self(BTreeSet::new())
    }
}

impl<F: SasFlag> SasFlags<F> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every flag of the family.
    pub fn all() -> Self {
        F::ALL.iter().copied().collect()
    }

    /// Add a flag.
    pub fn insert(&mut self, flag: F) -> bool {
        self.0.insert(flag)
    }

    /// Add a flag, builder style.
    pub fn with(mut self, flag: F) -> Self {
        self.0.insert(flag);
        self
    }

    /// Whether `flag` is in the set.
    pub fn contains(&self, flag: F) -> bool {
        self.0.contains(&flag)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of flags in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Flags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        self.0.iter().copied()
    }
}

impl<F: SasFlag> FromIterator<F> for SasFlags<F> {
    fn from_iter<T: IntoIterator<Item = F>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<F: SasFlag, const N: usize> From<[F; N]> for SasFlags<F> {
    fn from(flags: [F; N]) -> Self {
        flags.into_iter().collect()
    }
}

impl<F: SasFlag> Display for SasFlags<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in &self.0 {
            write!(f, "{}", flag.as_char())?;
        }
        Ok(())
    }
}

impl<F: SasFlag> FromStr for SasFlags<F> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.to_lowercase()
            .chars()
            .map(|c| {
                F::from_char(c).ok_or_else(|| {
                    Error::config_invalid(format!(
                        "invalid {} string {s:?}: unknown character {c:?}",
                        F::KIND
                    ))
                })
            })
            .collect()
    }
}

/// Operations an account SAS grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountPermission {
    /// `r`
    Read,
    /// `a`
    Add,
    /// `c`
    Create,
    /// `w`
    Write,
    /// `d`
    Delete,
    /// `l`
    List,
    /// `u`
    Update,
    /// `p`
    ProcessMessages,
}

impl SasFlag for AccountPermission {
    const ALL: &'static [Self] = &[
        Self::Read,
        Self::Add,
        Self::Create,
        Self::Write,
        Self::Delete,
        Self::List,
        Self::Update,
        Self::ProcessMessages,
    ];
    const KIND: &'static str = "permission";

    fn as_char(self) -> char {
        match self {
            Self::Read => 'r',
            Self::Add => 'a',
            Self::Create => 'c',
            Self::Write => 'w',
            Self::Delete => 'd',
            Self::List => 'l',
            Self::Update => 'u',
            Self::ProcessMessages => 'p',
        }
    }
}

/// Resource levels an account SAS reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountResourceType {
    /// Service level APIs, `s`.
    Service,
    /// Containers, shares, queues and tables, `c`.
    Container,
    /// Blobs, files, messages and entities, `o`.
    Object,
}

impl SasFlag for AccountResourceType {
    const ALL: &'static [Self] = &[Self::Service, Self::Container, Self::Object];
    const KIND: &'static str = "resource type";

    fn as_char(self) -> char {
        match self {
            Self::Service => 's',
            Self::Container => 'c',
            Self::Object => 'o',
        }
    }
}

impl SasFlag for Service {
    const ALL: &'static [Self] = &[Self::Blob, Self::File, Self::Queue, Self::Table];
    const KIND: &'static str = "service";

    fn as_char(self) -> char {
        match self {
            Self::Blob => 'b',
            Self::File => 'f',
            Self::Queue => 'q',
            Self::Table => 't',
        }
    }
}

/// `sp` of an account SAS.
pub type AccountPermissions = SasFlags<AccountPermission>;
/// `srt` of an account SAS.
pub type AccountResourceTypes = SasFlags<AccountResourceType>;
/// `ss` of an account SAS.
pub type AccountServices = SasFlags<Service>;
