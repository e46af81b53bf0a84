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

/// AWS S3 provider
///
/// Credentials default to the ones the Lambda role exposes through the
/// `AWS_*` environment variables. The optional `ACCESS_KEY`, `SECRET_KEY`,
/// `SESSION_TOKEN`, `REGION` and `ENDPOINT` credentials override them.
#[derive(Debug, Clone)]
pub struct S3 {
    auth: AuthData,
    output: Option<StoragePath>,
}

impl S3 {
    pub fn new(auth: AuthData) -> Self {
        Self { auth, output: None }
    }

    /// Bind the output path uploads are written under.
    pub fn with_output_path(mut self, output: StoragePath) -> Self {
        self.output = Some(output);
        self
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_client_options(build_connection_options(&self.auth));

        for (key, value) in self.auth.creds() {
            match key.as_str() {
                "ACCESS_KEY" => builder = builder.with_access_key_id(value),
                "SECRET_KEY" => builder = builder.with_secret_access_key(value),
                "SESSION_TOKEN" => builder = builder.with_token(value),
                "REGION" => builder = builder.with_region(value),
                "ENDPOINT" => builder = builder.with_endpoint(value),
                // Already handled by `build_connection_options`
                "TIMEOUT" | "CONNECT_TIMEOUT" => (),
                _ => {
                    tracing::warn!("Unknown S3 credential: {}", key);
                }
            }
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create S3 store: {}", e)))
    }
}

#[async_trait]
impl StorageProvider for S3 {
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
        StorageType::S3
    }

    fn output_path(&self) -> Option<&StoragePath> {
        self.output.as_ref()
    }
}
