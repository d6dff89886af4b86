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

/// An Azure Storage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Service {
    /// Blob storage.
    #[default]
    Blob,
    /// File shares.
    File,
    /// Queues.
    Queue,
    /// Tables.
    Table,
}

impl Service {
    /// The service's label in endpoint host names.
    pub fn endpoint_name(self) -> &'static str {
        match self {
            Service::Blob => "blob",
            Service::File => "file",
            Service::Queue => "queue",
            Service::Table => "table",
        }
    }

    /// Connection string key of the service's endpoint.
    pub(crate) fn endpoint_key(self) -> &'static str {
        match self {
            Service::Blob => "BlobEndpoint",
            Service::File => "FileEndpoint",
            Service::Queue => "QueueEndpoint",
            Service::Table => "TableEndpoint",
        }
    }

    /// Connection string key of the service's secondary endpoint.
    pub(crate) fn secondary_endpoint_key(self) -> &'static str {
        match self {
            Service::Blob => "BlobSecondaryEndpoint",
            Service::File => "FileSecondaryEndpoint",
            Service::Queue => "QueueSecondaryEndpoint",
            Service::Table => "TableSecondaryEndpoint",
        }
    }

    /// Port of the service in the local storage emulator, which doesn't
    /// serve files.
    pub(crate) fn development_port(self) -> Option<u16> {
        match self {
            Service::Blob => Some(10000),
            Service::Queue => Some(10001),
            Service::Table => Some(10002),
            Service::File => None,
        }
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint_name())
    }
}
