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

//! Invocation supervisor
//!
//! ## Modules
//!
//! - [`lambda`] - Batch or local dispatch and the response envelopes
//! - [`udocker`] - Container runtime running the user function
//! - [`batch`] - Batch service the function can be delegated to

pub mod batch;
pub mod lambda;
pub mod udocker;

pub use batch::{BatchJob, BatchService, UnconfiguredBatch};
pub use lambda::{LambdaInstance, LambdaResponse, LambdaSupervisor};
pub use udocker::{ContainerEnv, ContainerRuntime, Udocker};

use crate::config::SupervisorConfig;
use crate::error::SupervisorResult;
use crate::events::{Event, parse_event};
use crate::storage::{
    self, AuthData, StorageObject, StorageType, create_output_provider, create_provider,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Handles one invocation from event to response envelope
pub struct Supervisor {
    config: SupervisorConfig,
    lambda: LambdaSupervisor,
}

impl Supervisor {
    /// # Errors
    ///
    /// Returns `SupervisorError::InvalidLambdaContext` when `instance` is `None`.
    pub fn new(
        config: SupervisorConfig,
        instance: Option<LambdaInstance>,
        runtime: Box<dyn ContainerRuntime>,
        batch: Box<dyn BatchService>,
    ) -> SupervisorResult<Self> {
        let lambda = LambdaSupervisor::new(instance, config.execution_mode, runtime, batch)?
            .with_timeout_threshold(config.timeout_threshold)
            .with_batch_job_queue(config.batch_job_queue.clone());
        Ok(Self { config, lambda })
    }

    /// Run the invocation; any error becomes a 500 envelope.
    ///
    /// The input and output directories start empty and are removed when the
    /// run ends, so a warm container never sees files of an earlier invocation.
    pub async fn run(mut self) -> LambdaResponse {
        let response = match self.process().await {
            Ok(()) => self.lambda.create_response(),
            Err(err) => self.lambda.create_error_response(&err),
        };
        self.clean_up().await;
        response
    }

    async fn process(&mut self) -> SupervisorResult<()> {
        reset_dir(&self.config.input_dir).await?;
        reset_dir(&self.config.output_dir).await?;

        let event = parse_event(&self.lambda.instance().event);
        self.prepare_environment(&event)?;
        if let Event::Storage {
            storage_type,
            object,
        } = &event
        {
            let input = self.download_input(*storage_type, object).await?;
            self.lambda
                .set_container_var("INPUT_FILE_PATH", input.to_string_lossy());
        }

        self.lambda.execute_function().await?;
        self.upload_output().await
    }

    fn prepare_environment(&mut self, event: &Event) -> SupervisorResult<()> {
        let request_id = self.lambda.instance().request_id.clone();
        let raw_event = serde_json::to_string(&self.lambda.instance().event)?;
        let output_dir = self.config.output_dir.to_string_lossy().to_string();
        let input_dir = self.config.input_dir.to_string_lossy().to_string();

        self.lambda.set_container_var("REQUEST_ID", request_id);
        self.lambda.set_container_var("TMP_INPUT_DIR", input_dir);
        self.lambda.set_container_var("TMP_OUTPUT_DIR", output_dir);
        if *event == Event::Unknown {
            self.lambda.set_container_var("EVENT", raw_event);
        }
        Ok(())
    }

    /// Credentials for the input object.
    ///
    /// An input path on the same bucket wins, then any storage of the event's
    /// type, then empty credentials of that type.
    fn input_auth(&self, storage_type: StorageType, object: &StorageObject) -> AuthData {
        let auth = &self.config.storage_auth;
        self.config
            .input_paths
            .iter()
            .filter(|path| {
                path.bucket_and_prefix()
                    .is_ok_and(|(bucket, _)| bucket == object.bucket)
            })
            .find_map(|path| auth.get_data_by_stg_id(&path.id))
            .filter(|data| data.storage_type() == storage_type)
            .or_else(|| auth.get_auth_data_by_stg_type(storage_type))
            .cloned()
            .unwrap_or_else(|| AuthData::new("0", storage_type))
    }

    async fn download_input(
        &self,
        storage_type: StorageType,
        object: &StorageObject,
    ) -> SupervisorResult<PathBuf> {
        let auth = self.input_auth(storage_type, object);
        let provider = create_provider(Some(&auth));
        let path = storage::download_input(provider.as_ref(), object, &self.config.input_dir).await?;
        info!("Input file available at {}", path.display());
        Ok(path)
    }

    async fn clean_up(&self) {
        for dir in [&self.config.input_dir, &self.config.output_dir] {
            if let Err(e) = remove_dir(dir).await {
                warn!("Failed to remove {}: {}", dir.display(), e);
            }
        }
    }

    async fn upload_output(&self) -> SupervisorResult<()> {
        for output in &self.config.output_paths {
            let auth = self.config.storage_auth.get_data_by_stg_id(&output.id);
            let provider = create_output_provider(auth, output);
            let count = storage::upload_output(provider.as_ref(), &self.config.output_dir).await?;
            info!(
                "Uploaded count={} files to output id={}, path={}",
                count, output.id, output.path
            );
        }
        Ok(())
    }
}

/// Remove `dir` and everything in it; a missing directory is not an error.
async fn remove_dir(dir: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            debug!("Removed {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

async fn reset_dir(dir: &Path) -> SupervisorResult<()> {
    remove_dir(dir).await?;
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionMode;
    use crate::error::SupervisorError;
    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Writes a result file into the output directory and echoes its environment.
    struct WritingRuntime {
        output_dir: PathBuf,
        seen_env: Arc<Mutex<ContainerEnv>>,
    }

    #[async_trait]
    impl ContainerRuntime for WritingRuntime {
        async fn prepare_container(&self) -> SupervisorResult<()> {
            Ok(())
        }

        async fn launch_container(
            &self,
            env: &ContainerEnv,
            _timeout: Duration,
        ) -> SupervisorResult<Bytes> {
            *self.seen_env.lock().unwrap() = env.clone();
            let input = env.get("INPUT_FILE_PATH").cloned().unwrap_or_default();
            let content = if input.is_empty() {
                "no input".to_string()
            } else {
                std::fs::read_to_string(&input)?.to_uppercase()
            };
            std::fs::create_dir_all(self.output_dir.join("nested"))?;
            std::fs::write(self.output_dir.join("nested").join("result.txt"), &content)?;
            Ok(Bytes::from(content))
        }
    }

    /// Writes `<REQUEST_ID>.txt` into the output directory.
    struct RequestFileRuntime {
        output_dir: PathBuf,
    }

    #[async_trait]
    impl ContainerRuntime for RequestFileRuntime {
        async fn prepare_container(&self) -> SupervisorResult<()> {
            Ok(())
        }

        async fn launch_container(
            &self,
            env: &ContainerEnv,
            _timeout: Duration,
        ) -> SupervisorResult<Bytes> {
            let request_id = env.get("REQUEST_ID").cloned().unwrap_or_default();
            std::fs::write(
                self.output_dir.join(format!("{}.txt", request_id)),
                &request_id,
            )?;
            Ok(Bytes::from(request_id))
        }
    }

    fn instance(event: Value) -> LambdaInstance {
        instance_for("req-7", event)
    }

    fn instance_for(request_id: &str, event: Value) -> LambdaInstance {
        LambdaInstance {
            request_id: request_id.to_string(),
            function_name: "func".to_string(),
            log_group_name: "group".to_string(),
            log_stream_name: "stream".to_string(),
            memory_mb: 512,
            deadline_ms: chrono::Utc::now().timestamp_millis() as u64 + 60_000,
            event,
        }
    }

    fn config(temp_dir: &TempDir, extra: &[(&str, String)]) -> SupervisorConfig {
        let mut vars = vec![
            (
                "TMP_INPUT_DIR".to_string(),
                temp_dir.path().join("input").to_string_lossy().to_string(),
            ),
            (
                "TMP_OUTPUT_DIR".to_string(),
                temp_dir.path().join("output").to_string_lossy().to_string(),
            ),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.clone())));
        SupervisorConfig::from_vars(vars).unwrap()
    }

    fn decode(body: &str) -> String {
        String::from_utf8(STANDARD.decode(body).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_run_uploads_output_to_local_storage() {
        let temp_dir = TempDir::new().unwrap();
        let results_dir = temp_dir.path().join("results");

        let config = config(
            &temp_dir,
            &[
                ("STORAGE_AUTH_LOCAL_USER_1", "unused".to_string()),
                (
                    "STORAGE_PATH_OUTPUT_1",
                    results_dir.to_string_lossy().to_string(),
                ),
            ],
        );
        let seen_env = Arc::new(Mutex::new(ContainerEnv::new()));
        let runtime = WritingRuntime {
            output_dir: config.output_dir.clone(),
            seen_env: Arc::clone(&seen_env),
        };
        let supervisor = Supervisor::new(
            config,
            Some(instance(json!({"body": "plain"}))),
            Box::new(runtime),
            Box::new(UnconfiguredBatch),
        )
        .unwrap();
        let response = supervisor.run().await;

        assert_eq!(response.status_code, 200);
        assert_eq!(decode(&response.body), "no input");
        assert_eq!(
            std::fs::read_to_string(results_dir.join("nested").join("result.txt")).unwrap(),
            "no input"
        );

        let env = seen_env.lock().unwrap();
        assert_eq!(env.get("REQUEST_ID"), Some(&"req-7".to_string()));
        assert_eq!(
            env.get("EVENT"),
            Some(&json!({"body": "plain"}).to_string())
        );
        assert!(!env.contains_key("INPUT_FILE_PATH"));
    }

    #[tokio::test]
    async fn test_warm_invocations_do_not_share_files() {
        let temp_dir = TempDir::new().unwrap();
        let results_dir = temp_dir.path().join("results");
        let config = config(
            &temp_dir,
            &[(
                "STORAGE_PATH_OUTPUT_1",
                results_dir.to_string_lossy().to_string(),
            )],
        );
        std::fs::create_dir_all(&config.input_dir).unwrap();
        std::fs::write(config.input_dir.join("stale.bin"), b"old").unwrap();

        for request_id in ["req-A", "req-B"] {
            let _ = std::fs::remove_dir_all(&results_dir);
            let supervisor = Supervisor::new(
                config.clone(),
                Some(instance_for(request_id, json!({}))),
                Box::new(RequestFileRuntime {
                    output_dir: config.output_dir.clone(),
                }),
                Box::new(UnconfiguredBatch),
            )
            .unwrap();
            let response = supervisor.run().await;
            assert_eq!(response.status_code, 200);
        }

        let mut uploaded: Vec<String> = std::fs::read_dir(&results_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        uploaded.sort();
        assert_eq!(uploaded, vec!["req-B.txt"]);
        assert!(!config.input_dir.exists());
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn test_run_reports_errors_as_500() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir, &[("EXECUTION_MODE", "batch".to_string())]);

        let supervisor = Supervisor::new(
            config,
            Some(instance(json!({}))),
            Box::new(WritingRuntime {
                output_dir: temp_dir.path().join("output"),
                seen_env: Arc::new(Mutex::new(ContainerEnv::new())),
            }),
            Box::new(UnconfiguredBatch),
        )
        .unwrap();
        let response = supervisor.run().await;

        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&decode(&response.body)).unwrap();
        assert!(
            body["exception"]
                .as_str()
                .unwrap()
                .contains("Batch service unavailable")
        );
    }

    #[test]
    fn test_supervisor_requires_context() {
        let temp_dir = TempDir::new().unwrap();
        let result = Supervisor::new(
            config(&temp_dir, &[]),
            None,
            Box::new(WritingRuntime {
                output_dir: temp_dir.path().join("output"),
                seen_env: Arc::new(Mutex::new(ContainerEnv::new())),
            }),
            Box::new(UnconfiguredBatch),
        );
        assert!(matches!(result, Err(SupervisorError::InvalidLambdaContext)));
    }

    #[test]
    fn test_input_auth_selection() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(
            &temp_dir,
            &[
                ("STORAGE_AUTH_MINIO_USER_1", "first".to_string()),
                ("STORAGE_AUTH_MINIO_USER_2", "second".to_string()),
                ("STORAGE_PATH_INPUT_2", "in-bucket/data".to_string()),
            ],
        );
        let supervisor = Supervisor::new(
            config,
            Some(instance(json!({}))),
            Box::new(WritingRuntime {
                output_dir: temp_dir.path().join("output"),
                seen_env: Arc::new(Mutex::new(ContainerEnv::new())),
            }),
            Box::new(UnconfiguredBatch),
        )
        .unwrap();

        let by_path = supervisor.input_auth(
            StorageType::Minio,
            &StorageObject::new("in-bucket", "data/file"),
        );
        assert_eq!(by_path.get_credential("USER"), "second");

        let by_type = supervisor.input_auth(
            StorageType::Minio,
            &StorageObject::new("other-bucket", "file"),
        );
        assert_eq!(by_type.get_credential("USER"), "first");

        let default = supervisor.input_auth(StorageType::S3, &StorageObject::new("b", "k"));
        assert_eq!(default.storage_type(), StorageType::S3);
        assert!(default.creds().is_empty());
    }

    #[test]
    fn test_execution_mode_comes_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let supervisor = Supervisor::new(
            config(&temp_dir, &[("EXECUTION_MODE", "lambda-batch".to_string())]),
            Some(instance(json!({}))),
            Box::new(WritingRuntime {
                output_dir: temp_dir.path().join("output"),
                seen_env: Arc::new(Mutex::new(ContainerEnv::new())),
            }),
            Box::new(UnconfiguredBatch),
        )
        .unwrap();
        assert_eq!(supervisor.lambda.execution_mode(), ExecutionMode::LambdaBatch);
    }
}
