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

use crate::storage::StorageError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while supervising a function invocation
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("This binary only works on a Linux platform")]
    InvalidPlatform,

    #[error("No Lambda context was provided to the supervisor")]
    InvalidLambdaContext,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Container timeout expired after {}s", .0.as_secs())]
    ContainerTimeoutExpired(Duration),

    #[error("Container command '{command}' failed ({status}): {stderr}")]
    ContainerCommand {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Batch service unavailable: {0}")]
    BatchServiceUnavailable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for supervisor operations
pub type SupervisorResult<T> = Result<T, SupervisorError>;
