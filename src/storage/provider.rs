// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use super::config::{StorageObject, StoragePath, StorageType};
use super::error::{StorageError, StorageResult};

/// Generic trait for storage providers
///
/// This trait provides a uniform upload/download contract over the supported
/// backends (AWS S3, Minio, Onedata, Local filesystem).
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Download an object into a local directory.
    ///
    /// # Arguments
    ///
    /// * `object` - The object announced by the invocation event
    /// * `target_dir` - Directory that receives the file (created if missing)
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(PathBuf)` - Path of the downloaded file, named after the object key
    /// * `Err(StorageError)` - If the object cannot be fetched or written
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * Credentials are invalid or expired
    /// * The object does not exist
    /// * The target directory is not writable
    async fn download_file(
        &self,
        object: &StorageObject,
        target_dir: &Path,
    ) -> StorageResult<PathBuf>;

    /// Upload a local file under `key`, relative to the provider's output path.
    ///
    /// # Arguments
    ///
    /// * `source` - Absolute path of the local file
    /// * `key` - Destination key, `/`-separated, relative to the output path
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The provider has no output path bound and needs one
    /// * The source file cannot be read
    /// * The backend rejects the write
    async fn upload_file(&self, source: &Path, key: &str) -> StorageResult<()>;

    /// Get the discriminator this provider was selected with.
    fn get_type(&self) -> StorageType;

    /// Get the output path uploads are written under, if one is bound.
    fn output_path(&self) -> Option<&StoragePath>;
}

impl Debug for dyn StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.output_path() {
            Some(output) => write!(
                f,
                "StorageProvider(type={}, output={})",
                self.get_type(),
                output.path
            ),
            None => write!(f, "StorageProvider(type={})", self.get_type()),
        }
    }
}

/// Output bucket and full object key for an upload of `key`.
pub(crate) fn output_location<'a>(
    provider: &'a dyn StorageProvider,
    key: &str,
) -> StorageResult<(&'a str, String)> {
    let output = provider.output_path().ok_or_else(|| {
        StorageError::ConfigError(format!(
            "{} provider has no output path to upload '{}' to",
            provider.get_type(),
            key
        ))
    })?;
    let (bucket, prefix) = output.bucket_and_prefix()?;
    Ok((bucket, join_key(prefix, key)))
}

/// Join a prefix and a relative key with a single `/`.
pub(crate) fn join_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}
