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

use crate::storage::auth::AuthData;
use crate::storage::config::{StorageObject, StoragePath, StorageType};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::object_store::{build_connection_options, download_to_dir, upload_from_file};
use crate::storage::provider::{output_location, StorageProvider};
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use std::path::{Path, PathBuf};
use url::Url;

/// Endpoint of the Minio service deployed next to the functions
pub const DEFAULT_MINIO_ENDPOINT: &str = "http://minio-service.minio:9000";

const MINIO_REGION: &str = "us-east-1";

/// Minio provider, an S3-compatible store behind a custom endpoint
///
/// Credentials: `USER`, `PASS` and the optional `ENDPOINT`.
#[derive(Debug, Clone)]
pub struct Minio {
    auth: AuthData,
    output: Option<StoragePath>,
}

impl Minio {
    pub fn new(auth: AuthData) -> Self {
        Self { auth, output: None }
    }

    /// Bind the output path uploads are written under.
    pub fn with_output_path(mut self, output: StoragePath) -> Self {
        self.output = Some(output);
        self
    }

    pub fn endpoint(&self) -> &str {
        self.auth
            .credential("ENDPOINT")
            .unwrap_or(DEFAULT_MINIO_ENDPOINT)
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let endpoint = Url::parse(self.endpoint())?;
        AmazonS3Builder::new()
            .with_endpoint(endpoint.as_str().trim_end_matches('/'))
            .with_allow_http(endpoint.scheme() == "http")
            .with_virtual_hosted_style_request(false)
            .with_region(MINIO_REGION)
            .with_bucket_name(bucket)
            .with_access_key_id(self.auth.get_credential("USER"))
            .with_secret_access_key(self.auth.get_credential("PASS"))
            .with_client_options(build_connection_options(&self.auth))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create Minio store: {}", e)))
    }
}

#[async_trait]
impl StorageProvider for Minio {
    async fn download_file(
        &self,
        object: &StorageObject,
        target_dir: &Path,
    ) -> StorageResult<PathBuf> {
        let store = self.build_store(&object.bucket)?;
        download_to_dir(&store, &object.key, object.file_name()?, target_dir).await
    }

    async fn upload_file(&self, source: &Path, key: &str) -> StorageResult<()> {
        let (bucket, full_key) = output_location(self, key)?;
        let store = self.build_store(bucket)?;
        upload_from_file(&store, source, &full_key).await
    }

    fn get_type(&self) -> StorageType {
        StorageType::Minio
    }

    fn output_path(&self) -> Option<&StoragePath> {
        self.output.as_ref()
    }
}
