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

//! Userspace container runtime

use crate::config::UdockerConfig;
use crate::error::{SupervisorError, SupervisorResult};
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Environment handed to the function inside the container
pub type ContainerEnv = BTreeMap<String, String>;

const SCRIPT_SHELL: &str = "/bin/sh";

/// Runtime that executes the user function
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Make sure the container exists before it is launched.
    async fn prepare_container(&self) -> SupervisorResult<()>;

    /// Run the function and return its combined stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::ContainerTimeoutExpired` when the function
    /// does not finish within `timeout`; the process is killed.
    async fn launch_container(&self, env: &ContainerEnv, timeout: Duration)
    -> SupervisorResult<Bytes>;
}

/// udocker-backed [`ContainerRuntime`]
#[derive(Debug, Clone)]
pub struct Udocker {
    config: UdockerConfig,
    mounts: Vec<PathBuf>,
}

impl Udocker {
    /// # Arguments
    ///
    /// * `config` - udocker binary, home directory, image and script
    /// * `mounts` - Host directories made visible inside the container
    pub fn new(config: UdockerConfig, mounts: Vec<PathBuf>) -> Self {
        Self { config, mounts }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.bin);
        cmd.env("UDOCKER_DIR", &self.config.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run_checked(&self, args: &[String]) -> SupervisorResult<Output> {
        debug!("Running {} {}", self.config.bin, args.join(" "));
        let output = self.command().args(args).output().await?;
        if !output.status.success() {
            return Err(SupervisorError::ContainerCommand {
                command: format!("{} {}", self.config.bin, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    async fn container_exists(&self) -> SupervisorResult<bool> {
        let output = self.run_checked(&["ps".to_string()]).await?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .any(|word| word == self.config.container_name))
    }

    /// Arguments of the `udocker run` invocation.
    pub fn run_args(&self, env: &ContainerEnv) -> Vec<String> {
        let mut args = vec!["--quiet".to_string(), "run".to_string()];
        for mount in &self.mounts {
            args.push("-v".to_string());
            args.push(mount.to_string_lossy().to_string());
        }
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        match &self.config.script {
            Some(script) => {
                if let Some(dir) = script.parent().filter(|d| !d.as_os_str().is_empty()) {
                    args.push("-v".to_string());
                    args.push(dir.to_string_lossy().to_string());
                }
                args.push(format!("--entrypoint={}", SCRIPT_SHELL));
                args.push(self.config.container_name.clone());
                args.push(script.to_string_lossy().to_string());
            }
            None => args.push(self.config.container_name.clone()),
        }
        args
    }
}

#[async_trait]
impl ContainerRuntime for Udocker {
    async fn prepare_container(&self) -> SupervisorResult<()> {
        if self.container_exists().await? {
            info!("Container {} already available", self.config.container_name);
            return Ok(());
        }

        let image_id = self.config.image_id.as_deref().ok_or_else(|| {
            SupervisorError::ConfigError("IMAGE_ID is required to create the container".to_string())
        })?;
        match &self.config.image_file {
            Some(image_file) => {
                info!("Loading container image from {}", image_file.display());
                self.run_checked(&[
                    "load".to_string(),
                    "-i".to_string(),
                    image_file.to_string_lossy().to_string(),
                ])
                .await?;
            }
            None => {
                info!("Pulling container image {}", image_id);
                self.run_checked(&["pull".to_string(), image_id.to_string()])
                    .await?;
            }
        }

        info!("Creating container {}", self.config.container_name);
        self.run_checked(&[
            "create".to_string(),
            format!("--name={}", self.config.container_name),
            image_id.to_string(),
        ])
        .await?;
        Ok(())
    }

    async fn launch_container(
        &self,
        env: &ContainerEnv,
        timeout: Duration,
    ) -> SupervisorResult<Bytes> {
        let args = self.run_args(env);
        info!(
            "Launching container {} with timeout={}s",
            self.config.container_name,
            timeout.as_secs()
        );

        let mut cmd = self.command();
        cmd.args(&args);
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(output) => output?,
            Err(_) => return Err(SupervisorError::ContainerTimeoutExpired(timeout)),
        };

        if !output.status.success() {
            warn!("Container finished with {}", output.status);
        }
        let mut combined = BytesMut::with_capacity(output.stdout.len() + output.stderr.len());
        combined.put_slice(&output.stdout);
        combined.put_slice(&output.stderr);
        Ok(combined.freeze())
    }
}
