// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use crate::error::{SupervisorError, SupervisorResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A job submitted to the batch compute service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJob {
    pub name: String,
    pub definition: String,
    pub queue: Option<String>,
    pub environment: BTreeMap<String, String>,
}

/// Client of the batch compute service the supervisor delegates to
#[async_trait]
pub trait BatchService: Send + Sync {
    /// Submit `job` and return the identifier the service assigned to it.
    async fn submit_job(&self, job: &BatchJob) -> SupervisorResult<String>;
}

/// Batch service used when no client is wired into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredBatch;

#[async_trait]
impl BatchService for UnconfiguredBatch {
    async fn submit_job(&self, job: &BatchJob) -> SupervisorResult<String> {
        Err(SupervisorError::BatchServiceUnavailable(format!(
            "no batch client configured to submit job '{}'",
            job.name
        )))
    }
}
