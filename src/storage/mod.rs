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

//! Storage abstraction layer
//!
//! This module moves the function's input and output between the local
//! filesystem and the configured storage providers (AWS S3, Minio, Onedata,
//! Local filesystem).
//!
//! Transfers use the `object_store` crate for every remote backend, so each
//! provider only decides how its store is built and where keys land.

pub mod auth;
pub mod config;
pub mod error;
pub mod factory;
pub mod object_store;
pub mod provider;
pub mod providers;

// Public exports
pub use auth::{AuthData, StorageAuth};
pub use config::{StorageObject, StoragePath, StorageType};
pub use error::{StorageError, StorageResult};
pub use factory::{create_output_provider, create_provider};
pub use provider::StorageProvider;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Download the invocation input through `provider`.
///
/// This is a pass-through to [`StorageProvider::download_file`].
pub async fn download_input(
    provider: &dyn StorageProvider,
    object: &StorageObject,
    target_dir: &Path,
) -> StorageResult<PathBuf> {
    info!(
        "Downloading input bucket={}, key={} with {} provider",
        object.bucket,
        object.key,
        provider.get_type()
    );
    provider.download_file(object, target_dir).await
}

/// Upload every file below `source_dir` through `provider`.
///
/// Each file is uploaded once, keyed by its `/`-separated path relative to
/// `source_dir`. Files are uploaded in the order the directory walk yields them.
///
/// # Returns
///
/// The number of uploaded files. A missing `source_dir` uploads nothing.
pub async fn upload_output(provider: &dyn StorageProvider, source_dir: &Path) -> StorageResult<usize> {
    if !tokio::fs::try_exists(source_dir).await? {
        warn!("Output folder {} does not exist", source_dir.display());
        return Ok(0);
    }

    let files = self::object_store::list_local_files(source_dir).await?;
    info!(
        "Uploading count={} output files with {} provider",
        files.len(),
        provider.get_type()
    );
    for (absolute, key) in &files {
        provider.upload_file(absolute, key).await?;
    }
    Ok(files.len())
}

/// Output paths from `STORAGE_PATH_OUTPUT_<N>` variables, ascending by `N`.
pub fn get_output_paths(vars: &HashMap<String, String>) -> Vec<StoragePath> {
    config::read_storage_paths(vars, config::OUTPUT_PATH_PREFIX)
}

/// Input paths from `STORAGE_PATH_INPUT_<N>` variables, ascending by `N`.
pub fn get_input_paths(vars: &HashMap<String, String>) -> Vec<StoragePath> {
    config::read_storage_paths(vars, config::INPUT_PATH_PREFIX)
}
