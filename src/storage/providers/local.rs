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

use crate::storage::config::{StorageObject, StoragePath, StorageType};
use crate::storage::error::StorageResult;
use crate::storage::object_store::object_path;
use crate::storage::provider::StorageProvider;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Local filesystem provider
///
/// Downloads copy the file named by the object key into the target
/// directory. Uploads copy into the bound output directory, and are skipped
/// when no output directory is bound.
#[derive(Debug, Clone, Default)]
pub struct Local {
    output: Option<StoragePath>,
}

impl Local {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the output directory uploads are copied to.
    pub fn with_output_path(mut self, output: StoragePath) -> Self {
        self.output = Some(output);
        self
    }
}

#[async_trait]
impl StorageProvider for Local {
    async fn download_file(
        &self,
        object: &StorageObject,
        target_dir: &Path,
    ) -> StorageResult<PathBuf> {
        let source = Path::new(&object.bucket).join(&object.key);
        let target = target_dir.join(object.file_name()?);
        if source == target {
            return Ok(target);
        }

        tokio::fs::create_dir_all(target_dir).await?;
        tokio::fs::copy(&source, &target).await?;
        info!(
            "Copied local input {} to {}",
            source.display(),
            target.display()
        );
        Ok(target)
    }

    async fn upload_file(&self, source: &Path, key: &str) -> StorageResult<()> {
        let Some(output) = self.output.as_ref() else {
            info!("No local output directory, keeping {}", source.display());
            return Ok(());
        };

        let target = object_path(key)?
            .parts()
            .fold(PathBuf::from(&output.path), |path, part| {
                let segment: &str = part.as_ref();
                path.join(segment)
            });
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source, &target).await?;
        info!(
            "Copied local output {} to {}",
            source.display(),
            target.display()
        );
        Ok(())
    }

    fn get_type(&self) -> StorageType {
        StorageType::Local
    }

    fn output_path(&self) -> Option<&StoragePath> {
        self.output.as_ref()
    }
}
