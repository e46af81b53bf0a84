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

use super::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Environment prefix of the output storage paths (`STORAGE_PATH_OUTPUT_<N>`)
pub const OUTPUT_PATH_PREFIX: &str = "STORAGE_PATH_OUTPUT_";

/// Environment prefix of the input storage paths (`STORAGE_PATH_INPUT_<N>`)
pub const INPUT_PATH_PREFIX: &str = "STORAGE_PATH_INPUT_";

/// Storage provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    /// AWS S3 storage
    S3,
    /// Minio, S3-compatible storage behind a custom endpoint
    Minio,
    /// Onedata spaces accessed through a Oneprovider CDMI endpoint
    Onedata,
    /// Local filesystem storage
    Local,
}

impl StorageType {
    /// Get the storage type discriminator.
    ///
    /// # Returns
    ///
    /// A string slice with the uppercase discriminator ("S3", "MINIO", "ONEDATA" or "LOCAL").
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::S3 => "S3",
            StorageType::Minio => "MINIO",
            StorageType::Onedata => "ONEDATA",
            StorageType::Local => "LOCAL",
        }
    }
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        match s.to_uppercase().as_str() {
            "S3" => Ok(StorageType::S3),
            "MINIO" => Ok(StorageType::Minio),
            "ONEDATA" => Ok(StorageType::Onedata),
            "LOCAL" => Ok(StorageType::Local),
            _ => Err(StorageError::InvalidStorageProvider(s.to_string())),
        }
    }
}

impl Display for StorageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A configured storage path, correlated with its credentials through `id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePath {
    pub id: String,
    pub path: String,
}

impl StoragePath {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// Split the path into its bucket (or space) and the prefix inside it.
    ///
    /// `"bucket/out/files"` gives `("bucket", "out/files")`, `"bucket"` gives
    /// `("bucket", "")`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidStoragePath` when the path has no bucket segment.
    pub fn bucket_and_prefix(&self) -> StorageResult<(&str, &str)> {
        let trimmed = self.path.trim_matches('/');
        let (bucket, prefix) = trimmed.split_once('/').unwrap_or((trimmed, ""));
        if bucket.is_empty() {
            return Err(StorageError::InvalidStoragePath(self.path.clone()));
        }
        Ok((bucket, prefix.trim_matches('/')))
    }
}

/// The object a storage event points at.
///
/// For S3 and Minio `bucket` is the bucket name, for Onedata it is the space.
/// Local objects have an empty bucket and a filesystem path as key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    pub bucket: String,
    pub key: String,
}

impl StorageObject {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Last segment of the key, used as the local file name.
    pub fn file_name(&self) -> StorageResult<&str> {
        self.key
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .ok_or_else(|| StorageError::InvalidStoragePath(self.key.clone()))
    }
}

/// Read every variable named `<prefix><ID>` into a sorted list of storage paths.
///
/// Numeric ids are ordered numerically and come first; any other id is
/// ordered lexicographically after them.
pub(crate) fn read_storage_paths(vars: &HashMap<String, String>, prefix: &str) -> Vec<StoragePath> {
    let mut paths: Vec<StoragePath> = vars
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(prefix)
                .filter(|id| !id.is_empty())
                .map(|id| StoragePath::new(id, value.as_str()))
        })
        .collect();

    paths.sort_by(|a, b| path_order(&a.id).cmp(&path_order(&b.id)));
    paths
}

fn path_order(id: &str) -> (bool, u64, &str) {
    match id.parse::<u64>() {
        Ok(n) => (false, n, id),
        Err(_) => (true, 0, id),
    }
}
