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

//! Invocation configuration, loaded once from the environment
//!
//! # Examples
//!
//! ```
//! use faas_supervisor::config::{ExecutionMode, SupervisorConfig};
//!
//! let config = SupervisorConfig::from_vars([
//!     ("EXECUTION_MODE", "lambda-batch"),
//!     ("STORAGE_AUTH_MINIO_USER_1", "minio"),
//!     ("STORAGE_PATH_OUTPUT_1", "bucket/output"),
//! ])
//! .unwrap();
//!
//! assert_eq!(config.execution_mode, ExecutionMode::LambdaBatch);
//! assert_eq!(config.output_paths[0].path, "bucket/output");
//! ```

use crate::error::{SupervisorError, SupervisorResult};
use crate::storage::{StorageAuth, StoragePath, get_input_paths, get_output_paths};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_INPUT_DIR: &str = "/tmp/input";
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp/output";
pub const DEFAULT_TIMEOUT_THRESHOLD_SECS: u64 = 10;
pub const DEFAULT_UDOCKER_BIN: &str = "udocker";
pub const DEFAULT_UDOCKER_DIR: &str = "/tmp/shared/udocker";
pub const DEFAULT_CONTAINER_NAME: &str = "udocker_container";

/// Where the function runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Run the container inside the Lambda invocation
    #[default]
    Lambda,
    /// Always delegate to the batch service
    Batch,
    /// Run inside Lambda and delegate to batch when the container times out
    LambdaBatch,
}

impl ExecutionMode {
    /// Parse an `EXECUTION_MODE` value; anything unrecognised runs in Lambda.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("batch") => ExecutionMode::Batch,
            Some("lambda-batch") => ExecutionMode::LambdaBatch,
            _ => ExecutionMode::Lambda,
        }
    }
}

/// udocker runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdockerConfig {
    pub bin: String,
    pub dir: PathBuf,
    pub image_id: Option<String>,
    pub image_file: Option<PathBuf>,
    pub container_name: String,
    pub script: Option<PathBuf>,
}

impl Default for UdockerConfig {
    fn default() -> Self {
        Self {
            bin: DEFAULT_UDOCKER_BIN.to_string(),
            dir: PathBuf::from(DEFAULT_UDOCKER_DIR),
            image_id: None,
            image_file: None,
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            script: None,
        }
    }
}

/// Everything one invocation needs from the environment
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub execution_mode: ExecutionMode,
    pub storage_auth: StorageAuth,
    pub input_paths: Vec<StoragePath>,
    pub output_paths: Vec<StoragePath>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub timeout_threshold: Duration,
    pub udocker: UdockerConfig,
    pub batch_job_queue: Option<String>,
}

impl SupervisorConfig {
    /// Load the configuration from the process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_env() -> SupervisorResult<Self> {
        Self::from_vars(utf8_vars(std::env::vars_os()))
    }

    /// Load the configuration from `(name, value)` pairs.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * A storage credential names an unknown provider type
    /// * `TIMEOUT_THRESHOLD` is not a number of seconds
    pub fn from_vars<I, K, V>(vars: I) -> SupervisorResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |key: &str| vars.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let timeout_threshold = match get("TIMEOUT_THRESHOLD") {
            Some(value) => value.parse::<u64>().map_err(|_| {
                SupervisorError::ConfigError(format!(
                    "TIMEOUT_THRESHOLD must be a number of seconds, got '{}'",
                    value
                ))
            })?,
            None => DEFAULT_TIMEOUT_THRESHOLD_SECS,
        };

        let udocker = UdockerConfig {
            bin: get("UDOCKER_BIN").unwrap_or(DEFAULT_UDOCKER_BIN).to_string(),
            dir: PathBuf::from(get("UDOCKER_DIR").unwrap_or(DEFAULT_UDOCKER_DIR)),
            image_id: get("IMAGE_ID").map(str::to_string),
            image_file: get("IMAGE_FILE").map(PathBuf::from),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            script: get("SCRIPT").map(PathBuf::from),
        };

        Ok(Self {
            execution_mode: ExecutionMode::from_env_value(get("EXECUTION_MODE")),
            storage_auth: StorageAuth::from_vars(&vars)?,
            input_paths: get_input_paths(&vars),
            output_paths: get_output_paths(&vars),
            input_dir: PathBuf::from(get("TMP_INPUT_DIR").unwrap_or(DEFAULT_INPUT_DIR)),
            output_dir: PathBuf::from(get("TMP_OUTPUT_DIR").unwrap_or(DEFAULT_OUTPUT_DIR)),
            timeout_threshold: Duration::from_secs(timeout_threshold),
            udocker,
            batch_job_queue: get("BATCH_JOB_QUEUE").map(str::to_string),
        })
    }
}

fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter().filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
        (Ok(key), Ok(value)) => Some((key, value)),
        (key, _) => {
            warn!("Skipping environment variable that is not valid UTF-8: {:?}", key);
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, StorageType};

    #[test]
    fn test_execution_mode_parsing() {
        assert_eq!(ExecutionMode::from_env_value(Some("batch")), ExecutionMode::Batch);
        assert_eq!(
            ExecutionMode::from_env_value(Some("lambda-batch")),
            ExecutionMode::LambdaBatch
        );
        assert_eq!(ExecutionMode::from_env_value(Some("lambda")), ExecutionMode::Lambda);
        assert_eq!(ExecutionMode::from_env_value(Some("BATCH")), ExecutionMode::Lambda);
        assert_eq!(ExecutionMode::from_env_value(None), ExecutionMode::Lambda);
    }

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.execution_mode, ExecutionMode::Lambda);
        assert!(config.storage_auth.is_empty());
        assert!(config.output_paths.is_empty());
        assert_eq!(config.input_dir, PathBuf::from(DEFAULT_INPUT_DIR));
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.timeout_threshold, Duration::from_secs(10));
        assert_eq!(config.udocker, UdockerConfig::default());
        assert_eq!(config.batch_job_queue, None);
    }

    #[test]
    fn test_from_vars() {
        let config = SupervisorConfig::from_vars([
            ("EXECUTION_MODE", "batch"),
            ("STORAGE_AUTH_S3_USER_1", "u1"),
            ("STORAGE_PATH_INPUT_1", "bucket/input"),
            ("STORAGE_PATH_OUTPUT_1", "bucket/output"),
            ("TMP_OUTPUT_DIR", "/tmp/out"),
            ("TIMEOUT_THRESHOLD", "20"),
            ("IMAGE_ID", "alpine:3.20"),
            ("SCRIPT", "/var/task/script.sh"),
            ("BATCH_JOB_QUEUE", "scar-queue"),
        ])
        .unwrap();

        assert_eq!(config.execution_mode, ExecutionMode::Batch);
        assert_eq!(config.storage_auth.auth_id.get("1"), Some(&StorageType::S3));
        assert_eq!(config.input_paths, vec![StoragePath::new("1", "bucket/input")]);
        assert_eq!(config.output_paths, vec![StoragePath::new("1", "bucket/output")]);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.timeout_threshold, Duration::from_secs(20));
        assert_eq!(config.udocker.image_id.as_deref(), Some("alpine:3.20"));
        assert_eq!(
            config.udocker.script,
            Some(PathBuf::from("/var/task/script.sh"))
        );
        assert_eq!(config.batch_job_queue.as_deref(), Some("scar-queue"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_variables_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("EXECUTION_MODE"), OsString::from("batch")),
            (
                OsString::from("STORAGE_PATH_OUTPUT_1"),
                OsString::from_vec(vec![0x62, 0xff, 0x2f, 0x6f]),
            ),
            (OsString::from_vec(vec![0xfe, 0x41]), OsString::from("x")),
        ];
        let config = SupervisorConfig::from_vars(utf8_vars(vars)).unwrap();

        assert_eq!(config.execution_mode, ExecutionMode::Batch);
        assert!(config.output_paths.is_empty());
    }

    #[test]
    fn test_invalid_timeout_threshold() {
        let err = SupervisorConfig::from_vars([("TIMEOUT_THRESHOLD", "soon")]).unwrap_err();
        assert!(matches!(err, SupervisorError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_storage_provider() {
        let err = SupervisorConfig::from_vars([("STORAGE_AUTH_FTP_USER_1", "u")]).unwrap_err();
        assert!(matches!(
            err,
            SupervisorError::Storage(StorageError::InvalidStorageProvider(_))
        ));
    }
}
