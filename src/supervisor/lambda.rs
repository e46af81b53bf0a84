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

//! AWS Lambda supervisor: batch or local container dispatch and response envelopes.

use super::batch::{BatchJob, BatchService};
use super::udocker::{ContainerEnv, ContainerRuntime};
use crate::config::ExecutionMode;
use crate::error::{SupervisorError, SupervisorResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The invocation as seen by the Lambda runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaInstance {
    pub request_id: String,
    pub function_name: String,
    pub log_group_name: String,
    pub log_stream_name: String,
    pub memory_mb: i32,
    /// Invocation deadline, milliseconds since the Unix epoch
    pub deadline_ms: u64,
    pub event: Value,
}

impl LambdaInstance {
    pub fn from_context(event: Value, context: &lambda_runtime::Context) -> Self {
        Self {
            request_id: context.request_id.clone(),
            function_name: context.env_config.function_name.clone(),
            log_group_name: context.env_config.log_group.clone(),
            log_stream_name: context.env_config.log_stream.clone(),
            memory_mb: context.env_config.memory,
            deadline_ms: context.deadline,
            event,
        }
    }

    /// Time left before the invocation deadline.
    pub fn remaining_time(&self) -> Duration {
        let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        Duration::from_millis(self.deadline_ms.saturating_sub(now_ms))
    }
}

/// Response envelope returned to the Lambda host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaResponse {
    pub status_code: u16,
    pub headers: ResponseHeaders,
    pub body: String,
    pub is_base64_encoded: bool,
}

/// Trace headers attached to every response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeaders {
    #[serde(rename = "amz-lambda-request-id")]
    pub request_id: String,
    #[serde(rename = "amz-log-group-name")]
    pub log_group_name: String,
    #[serde(rename = "amz-log-stream-name")]
    pub log_stream_name: String,
}

/// Runs the function for one Lambda invocation
pub struct LambdaSupervisor {
    instance: LambdaInstance,
    execution_mode: ExecutionMode,
    timeout_threshold: Duration,
    batch_job_queue: Option<String>,
    container_env: ContainerEnv,
    runtime: Box<dyn ContainerRuntime>,
    batch: Box<dyn BatchService>,
    output: Bytes,
}

impl LambdaSupervisor {
    /// # Errors
    ///
    /// Returns `SupervisorError::InvalidLambdaContext` when `instance` is `None`.
    pub fn new(
        instance: Option<LambdaInstance>,
        execution_mode: ExecutionMode,
        runtime: Box<dyn ContainerRuntime>,
        batch: Box<dyn BatchService>,
    ) -> SupervisorResult<Self> {
        let instance = instance.ok_or(SupervisorError::InvalidLambdaContext)?;
        info!("SUPERVISOR: Initializing AWS Lambda supervisor");
        Ok(Self {
            instance,
            execution_mode,
            timeout_threshold: Duration::ZERO,
            batch_job_queue: None,
            container_env: ContainerEnv::new(),
            runtime,
            batch,
            output: Bytes::new(),
        })
    }

    /// Seconds kept back from the invocation deadline for uploading output.
    pub fn with_timeout_threshold(mut self, threshold: Duration) -> Self {
        self.timeout_threshold = threshold;
        self
    }

    pub fn with_batch_job_queue(mut self, queue: Option<String>) -> Self {
        self.batch_job_queue = queue;
        self
    }

    /// Set a variable of the environment passed to the container or batch job.
    pub fn set_container_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.container_env.insert(key.into(), value.into());
    }

    pub fn instance(&self) -> &LambdaInstance {
        &self.instance
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    /// Output of the last execution.
    pub fn output(&self) -> &Bytes {
        &self.output
    }

    /// Run the function in batch or in the local container.
    ///
    /// A container timeout escalates to batch once in `LambdaBatch` mode; in
    /// `Lambda` mode it is returned as `SupervisorError::ContainerTimeoutExpired`.
    pub async fn execute_function(&mut self) -> SupervisorResult<()> {
        match self.execution_mode {
            ExecutionMode::Batch => self.execute_batch().await,
            ExecutionMode::Lambda | ExecutionMode::LambdaBatch => self.execute_udocker().await,
        }
    }

    async fn execute_udocker(&mut self) -> SupervisorResult<()> {
        self.runtime.prepare_container().await?;
        let timeout = self
            .instance
            .remaining_time()
            .saturating_sub(self.timeout_threshold);

        match self
            .runtime
            .launch_container(&self.container_env, timeout)
            .await
        {
            Ok(output) => {
                debug!("CONTAINER OUTPUT:\n {}", String::from_utf8_lossy(&output));
                self.output = output;
                Ok(())
            }
            Err(SupervisorError::ContainerTimeoutExpired(elapsed)) => {
                warn!("Container execution timed out");
                if self.execution_mode == ExecutionMode::LambdaBatch {
                    self.execute_batch().await
                } else {
                    Err(SupervisorError::ContainerTimeoutExpired(elapsed))
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn execute_batch(&mut self) -> SupervisorResult<()> {
        let job = BatchJob {
            name: format!("{}-{}", self.instance.function_name, self.instance.request_id),
            definition: self.instance.function_name.clone(),
            queue: self.batch_job_queue.clone(),
            environment: self.container_env.clone(),
        };
        let job_id = self.batch.submit_job(&job).await?;
        info!("Job {} delegated to batch", job_id);

        self.output = Bytes::from(format!(
            "Job delegated to batch.\nCheck batch logs with:\n  scar log -n {} -ri {}",
            self.instance.function_name, job_id
        ));
        Ok(())
    }

    fn headers(&self) -> ResponseHeaders {
        ResponseHeaders {
            request_id: self.instance.request_id.clone(),
            log_group_name: self.instance.log_group_name.clone(),
            log_stream_name: self.instance.log_stream_name.clone(),
        }
    }

    /// 200 envelope carrying the base64-encoded function output.
    pub fn create_response(&self) -> LambdaResponse {
        LambdaResponse {
            status_code: 200,
            headers: self.headers(),
            body: STANDARD.encode(&self.output),
            is_base64_encoded: true,
        }
    }

    /// 500 envelope carrying `{"exception": <message>}`, base64-encoded.
    pub fn create_error_response(&self, err: &SupervisorError) -> LambdaResponse {
        tracing::error!("Exception launched:\n {}", err);
        let body = json!({ "exception": err.to_string() }).to_string();
        LambdaResponse {
            status_code: 500,
            headers: self.headers(),
            body: STANDARD.encode(body),
            is_base64_encoded: true,
        }
    }
}
