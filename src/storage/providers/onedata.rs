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
use crate::storage::provider::{join_key, StorageProvider};
use async_trait::async_trait;
use http::{HeaderMap, HeaderValue};
use object_store::http::{HttpBuilder, HttpStore};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Space used when the credentials do not name one
pub const DEFAULT_ONEDATA_SPACE: &str = "onedata_space";

const CDMI_PATH: &str = "cdmi";
const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Onedata provider, talking CDMI to a Oneprovider host
///
/// Credentials: `ONEPROVIDER_HOST`, `TOKEN` and the optional `SPACE`.
/// Output paths are folders inside the configured space.
#[derive(Debug, Clone)]
pub struct Onedata {
    auth: AuthData,
    output: Option<StoragePath>,
    oneprovider_host: String,
    access_token: String,
    space: String,
}

impl Onedata {
    pub fn new(auth: AuthData) -> Self {
        let mut provider = Self {
            auth,
            output: None,
            oneprovider_host: String::new(),
            access_token: String::new(),
            space: String::new(),
        };
        provider.set_onedata_environment();
        provider
    }

    /// Bind the output path uploads are written under.
    pub fn with_output_path(mut self, output: StoragePath) -> Self {
        self.output = Some(output);
        self
    }

    /// Resolve the Oneprovider host, access token and space from the credentials.
    fn set_onedata_environment(&mut self) {
        let host = self.auth.get_credential("ONEPROVIDER_HOST");
        self.oneprovider_host = host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        self.access_token = self.auth.get_credential("TOKEN").to_string();
        self.space = self
            .auth
            .credential("SPACE")
            .unwrap_or(DEFAULT_ONEDATA_SPACE)
            .to_string();
        debug!(
            "Onedata environment set: host={}, space={}",
            self.oneprovider_host, self.space
        );
    }

    pub fn oneprovider_host(&self) -> &str {
        &self.oneprovider_host
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    /// CDMI endpoint of `space`.
    pub fn space_url(&self, space: &str) -> StorageResult<Url> {
        if self.oneprovider_host.is_empty() {
            return Err(StorageError::ConfigError(
                "Onedata requires the 'ONEPROVIDER_HOST' credential".to_string(),
            ));
        }
        let url = Url::parse(&format!(
            "https://{}/{}/{}",
            self.oneprovider_host,
            CDMI_PATH,
            space.trim_matches('/')
        ))?;
        Ok(url)
    }

    /// Key of an upload inside the configured space.
    ///
    /// The whole output path is a folder of the space, it carries no space
    /// segment of its own.
    pub fn upload_key(&self, key: &str) -> StorageResult<String> {
        let folder = self.output.as_ref().map(|o| o.path.as_str()).ok_or_else(|| {
            StorageError::ConfigError(format!(
                "ONEDATA provider has no output path to upload '{}' to",
                key
            ))
        })?;
        Ok(join_key(folder, key))
    }

    fn build_store(&self, space: &str) -> StorageResult<HttpStore> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&self.access_token).map_err(|e| {
            StorageError::ConfigError(format!("Invalid Onedata access token: {}", e))
        })?;
        headers.insert(AUTH_TOKEN_HEADER, token);

        HttpBuilder::new()
            .with_url(self.space_url(space)?.as_str())
            .with_client_options(build_connection_options(&self.auth).with_default_headers(headers))
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to create Onedata store: {}", e))
            })
    }
}

#[async_trait]
impl StorageProvider for Onedata {
    async fn download_file(
        &self,
        object: &StorageObject,
        target_dir: &Path,
    ) -> StorageResult<PathBuf> {
        let space = if object.bucket.is_empty() {
            self.space.as_str()
        } else {
            object.bucket.as_str()
        };
        let store = self.build_store(space)?;
        download_to_dir(&store, &object.key, object.file_name()?, target_dir).await
    }

    async fn upload_file(&self, source: &Path, key: &str) -> StorageResult<()> {
        let full_key = self.upload_key(key)?;
        let store = self.build_store(&self.space)?;
        upload_from_file(&store, source, &full_key).await
    }

    fn get_type(&self) -> StorageType {
        StorageType::Onedata
    }

    fn output_path(&self) -> Option<&StoragePath> {
        self.output.as_ref()
    }
}
