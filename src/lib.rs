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

//! # FaaS Supervisor
//!
//! A supervisor that runs containerized functions inside AWS Lambda.
//!
//! For every invocation the supervisor downloads the object announced by the
//! event, runs the user function in a udocker container (or delegates it to a
//! batch compute service), uploads whatever the function wrote to its output
//! directory and answers with a base64-encoded response envelope.
//!
//! ## Features
//!
//! - **Storage providers**: AWS S3, Minio, Onedata and the local filesystem
//! - **Execution modes**: `lambda`, `batch` and `lambda-batch` (container first, batch on timeout)
//! - **Typed configuration**: credentials and paths read once from `STORAGE_AUTH_*` / `STORAGE_PATH_*`
//! - **Explicit error boundary**: each error kind maps to "log and exit 1" or "log and continue"
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use faas_supervisor::storage::{self, AuthData, StoragePath, StorageType};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let mut auth = AuthData::new("1", StorageType::Minio);
//! auth.set_credential("USER", "minio");
//! auth.set_credential("PASS", "minio123");
//!
//! let output = StoragePath::new("1", "my-bucket/output");
//! let provider = storage::create_output_provider(Some(&auth), &output);
//! let uploaded = storage::upload_output(provider.as_ref(), Path::new("/tmp/output")).await?;
//! println!("Uploaded {} files", uploaded);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`storage`] - Storage providers, credentials and the input/output transfers
//! - [`supervisor`] - Invocation flow, Lambda dispatch, container runtime and batch service
//! - [`events`] - Classification of the invocation event
//! - [`config`] - Configuration loaded from the environment
//! - [`exceptions`] - Error kind to process exit disposition

pub mod config;
pub mod error;
pub mod events;
pub mod exceptions;
pub mod storage;
pub mod supervisor;

// Re-export commonly used types
pub use config::SupervisorConfig;
pub use error::{SupervisorError, SupervisorResult};
pub use supervisor::{LambdaResponse, Supervisor};
