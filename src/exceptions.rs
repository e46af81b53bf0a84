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

//! Top-level error boundary
//!
//! Errors escaping an invocation are classified into an [`ErrorKind`] and the
//! [`DISPOSITIONS`] table decides whether the process logs and carries on or
//! logs and exits with status 1.

use crate::error::{SupervisorError, SupervisorResult};
use std::future::Future;
use tracing::{error, warn};

/// Exit status used for every terminal error
pub const ERROR_EXIT_CODE: i32 = 1;

/// Classification of an error escaping the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised by a storage backend client
    Client,
    /// A supervisor error that ends the invocation
    Domain,
    /// A supervisor condition that is reported but does not end the process
    Warning,
    /// Anything the supervisor does not manage (IO, JSON, ...)
    Unmanaged,
}

/// What the boundary does with an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Exit,
    Continue,
}

pub const DISPOSITIONS: [(ErrorKind, Disposition); 4] = [
    (ErrorKind::Client, Disposition::Exit),
    (ErrorKind::Domain, Disposition::Exit),
    (ErrorKind::Warning, Disposition::Continue),
    (ErrorKind::Unmanaged, Disposition::Exit),
];

impl SupervisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SupervisorError::Storage(e) if e.is_client_error() => ErrorKind::Client,
            SupervisorError::Storage(crate::storage::StorageError::IoError(_)) => {
                ErrorKind::Unmanaged
            }
            SupervisorError::Storage(_) => ErrorKind::Domain,
            SupervisorError::ContainerTimeoutExpired(_) => ErrorKind::Warning,
            SupervisorError::InvalidPlatform
            | SupervisorError::InvalidLambdaContext
            | SupervisorError::ConfigError(_)
            | SupervisorError::ContainerCommand { .. }
            | SupervisorError::BatchServiceUnavailable(_) => ErrorKind::Domain,
            SupervisorError::IoError(_) | SupervisorError::JsonError(_) => ErrorKind::Unmanaged,
        }
    }
}

/// Look up the disposition of an error kind.
pub fn disposition(kind: ErrorKind) -> Disposition {
    DISPOSITIONS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, d)| *d)
        .unwrap_or(Disposition::Exit)
}

/// Log `err`, raised by `operation`, and return what the boundary must do with it.
pub fn translate(operation: &str, err: &SupervisorError) -> Disposition {
    let kind = err.kind();
    match kind {
        ErrorKind::Client => {
            error!("There was an exception in {}: {}", operation, err);
        }
        ErrorKind::Domain => {
            error!("{}", err);
        }
        ErrorKind::Warning => {
            warn!("{}", err);
        }
        ErrorKind::Unmanaged => {
            error!("There was an unmanaged exception in {}: {:?}", operation, err);
        }
    }
    disposition(kind)
}

/// Await `future` inside the error boundary.
///
/// Returns the value on success and `None` for errors that are only reported.
/// Terminal errors end the process with [`ERROR_EXIT_CODE`].
pub async fn guard<F, T>(operation: &str, future: F) -> Option<T>
where
    F: Future<Output = SupervisorResult<T>>,
{
    match future.await {
        Ok(value) => Some(value),
        Err(err) => match translate(operation, &err) {
            Disposition::Continue => None,
            Disposition::Exit => std::process::exit(ERROR_EXIT_CODE),
        },
    }
}
