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

use super::{RetryContext, RetryInfo, RetryPolicy, RetryState};
use crate::operation::OperationContext;

/// Never retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn evaluate(
        &self,
        _: &mut RetryState,
        _: &RetryContext<'_>,
        _: &OperationContext,
    ) -> Option<RetryInfo> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationMode, StorageLocation};
    use crate::operation::RequestResult;
    use crate::retry::RetryPolicyFactory;

    #[test]
    fn test_no_retry() {
        let op = OperationContext::new();
        let policy = NoRetry.create_instance(&op);
        let mut state = RetryState::new();
        let last = RequestResult::new(StorageLocation::Primary).with_status(503);
        let ctx = RetryContext::new(0, &last, StorageLocation::Primary, LocationMode::PrimaryOnly);

        assert!(policy.evaluate(&mut state, &ctx, &op).is_none());
        assert_eq!(state, RetryState::new());
    }
}
