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

//! Transfers between the local filesystem and any `object_store` backend.

use super::auth::AuthData;
use super::error::{StorageError, StorageResult};
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStore, PutPayload};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 1200;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Build connection options from the provider credentials.
///
/// `TIMEOUT` and `CONNECT_TIMEOUT` (seconds, `0` or `disabled` to turn off)
/// override the defaults.
pub(crate) fn build_connection_options(auth: &AuthData) -> ClientOptions {
    let mut client_options = ClientOptions::default();
    match auth.credential("TIMEOUT") {
        Some("0") | Some("disabled") => {
            client_options = client_options.with_timeout_disabled();
        }
        Some(timeout_str) => {
            let sec = timeout_str.parse::<u64>().unwrap_or_else(|_| {
                warn!("Invalid TIMEOUT '{}', using {}s", timeout_str, DEFAULT_TIMEOUT_SECS);
                DEFAULT_TIMEOUT_SECS
            });
            client_options = client_options.with_timeout(Duration::from_secs(sec));
        }
        None => {
            client_options =
                client_options.with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        }
    }
    match auth.credential("CONNECT_TIMEOUT") {
        Some("0") | Some("disabled") => {
            client_options = client_options.with_connect_timeout_disabled();
        }
        Some(connect_timeout_str) => {
            let sec = connect_timeout_str
                .parse::<u64>()
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
            client_options = client_options.with_connect_timeout(Duration::from_secs(sec));
        }
        None => {
            client_options = client_options
                .with_connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));
        }
    }
    client_options
}

/// Fetch `key` from `store` and write it to `target_dir/<file_name>`.
pub(crate) async fn download_to_dir(
    store: &dyn ObjectStore,
    key: &str,
    file_name: &str,
    target_dir: &Path,
) -> StorageResult<PathBuf> {
    tokio::fs::create_dir_all(target_dir).await?;
    let target = target_dir.join(file_name);

    let data = store.get(&object_path(key)?).await?.bytes().await?;
    tokio::fs::write(&target, &data).await?;

    info!(
        "Downloaded key={} to path={}, size={}",
        key,
        target.display(),
        data.len()
    );
    Ok(target)
}

/// Read `source` and write it to `store` under `key`.
pub(crate) async fn upload_from_file(
    store: &dyn ObjectStore,
    source: &Path,
    key: &str,
) -> StorageResult<()> {
    let data = tokio::fs::read(source).await?;
    let size = data.len();
    store
        .put(&object_path(key)?, PutPayload::from(data))
        .await?;

    info!(
        "Uploaded path={} to key={}, size={}",
        source.display(),
        key,
        size
    );
    Ok(())
}

/// Object location for a raw key.
///
/// Keys are kept as written, reserved characters (`#`, `[`, `%`, ...) are not
/// percent-encoded.
pub(crate) fn object_path(key: &str) -> StorageResult<ObjectPath> {
    ObjectPath::parse(key)
        .map_err(|e| StorageError::InvalidStoragePath(format!("{}: {}", key, e)))
}

/// Every regular file under `dir`, paired with its `/`-separated key relative to `dir`.
pub(crate) async fn list_local_files(dir: &Path) -> StorageResult<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let key = relative_key(dir, &path)?;
                files.push((path, key));
            }
        }
    }
    Ok(files)
}

fn relative_key(dir: &Path, path: &Path) -> StorageResult<String> {
    let relative = path
        .strip_prefix(dir)
        .map_err(|_| StorageError::InvalidStoragePath(path.display().to_string()))?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}
